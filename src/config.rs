use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::audio::SampleOrder;
use crate::protocol::{VOICE_FRAME_SIZE, VOICE_PACKET_SIZE};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    pub network: NetworkConfig,
    pub audio: AudioConfig,
    pub stats: StatsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NetworkConfig {
    /// Local address to listen on, "0.0.0.0" for all interfaces
    pub bind_ip: String,
    pub port: u16,
    /// Receive buffer; longer datagrams are truncated by the socket
    pub recv_buffer_size: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AudioConfig {
    /// ALSA playback device name (e.g. "default", "plughw:0,0")
    pub device: String,
    /// Device buffer size in bytes
    pub buffer_size: usize,
    /// ALSA period size in frames (0 = let ALSA decide)
    pub period_size: usize,
    pub sample_order: SampleOrder,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StatsConfig {
    /// Seconds between stats log lines (0 = only at shutdown)
    pub interval_secs: u64,
}

impl Config {
    /// Built-in defaults, read from config.toml at compile time by build.rs.
    pub fn new() -> Result<Self, &'static str> {
        Ok(Self {
            network: NetworkConfig {
                bind_ip: env!("DEFAULT_BIND_IP").to_string(),
                port: env!("DEFAULT_PORT").parse()
                    .map_err(|_| "Failed to parse DEFAULT_PORT")?,
                recv_buffer_size: env!("DEFAULT_RECV_BUFFER_SIZE").parse()
                    .map_err(|_| "Failed to parse DEFAULT_RECV_BUFFER_SIZE")?,
            },
            audio: AudioConfig {
                device: env!("DEFAULT_AUDIO_DEVICE").to_string(),
                buffer_size: env!("DEFAULT_AUDIO_BUFFER_SIZE").parse()
                    .map_err(|_| "Failed to parse DEFAULT_AUDIO_BUFFER_SIZE")?,
                period_size: env!("DEFAULT_AUDIO_PERIOD_SIZE").parse()
                    .map_err(|_| "Failed to parse DEFAULT_AUDIO_PERIOD_SIZE")?,
                sample_order: SampleOrder::parse(env!("DEFAULT_SAMPLE_ORDER"))
                    .ok_or("Failed to parse DEFAULT_SAMPLE_ORDER")?,
            },
            stats: StatsConfig {
                interval_secs: env!("DEFAULT_STATS_INTERVAL_SECS").parse()
                    .map_err(|_| "Failed to parse DEFAULT_STATS_INTERVAL_SECS")?,
            },
        })
    }

    /// Layer an optional runtime TOML file and `USRP_*` environment variables
    /// over the built-in defaults.
    ///
    /// Environment keys use `__` between section and field, e.g.
    /// `USRP_AUDIO__SAMPLE_ORDER=big`.
    pub fn load(path: &Path) -> Result<Self> {
        let defaults = Self::new().map_err(anyhow::Error::msg)?;

        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&defaults)?)
            .add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix("USRP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?;

        settings
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .network
            .bind_ip
            .parse()
            .with_context(|| format!("Invalid bind address '{}'", self.network.bind_ip))?;
        Ok(SocketAddr::new(ip, self.network.port))
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr()?;
        if self.network.recv_buffer_size < VOICE_PACKET_SIZE {
            anyhow::bail!(
                "network.recv_buffer_size {} cannot hold a {}-byte voice packet",
                self.network.recv_buffer_size,
                VOICE_PACKET_SIZE
            );
        }
        if self.audio.buffer_size < VOICE_FRAME_SIZE {
            anyhow::bail!(
                "audio.buffer_size {} is smaller than one {}-byte voice frame",
                self.audio.buffer_size,
                VOICE_FRAME_SIZE
            );
        }
        if self.audio.device.is_empty() {
            anyhow::bail!("audio.device must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn built_in_defaults_match_config_toml() {
        let config = Config::new().expect("defaults must parse");
        assert_eq!(config.network.bind_ip, "0.0.0.0");
        assert_eq!(config.network.port, 1234);
        assert_eq!(config.network.recv_buffer_size, 1024);
        assert_eq!(config.audio.device, "default");
        assert_eq!(config.audio.buffer_size, 4096);
        assert_eq!(config.audio.sample_order, SampleOrder::Little);
        config.validate().expect("defaults must be valid");
    }

    #[test]
    fn missing_runtime_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("usrp_player_no_such_file.toml");
        let _ = std::fs::remove_file(&path);
        let loaded = Config::load(&path).expect("missing file is not an error");
        assert_eq!(loaded.audio, Config::new().unwrap().audio);
        assert_eq!(loaded.network.bind_ip, "0.0.0.0");
    }

    #[test]
    fn runtime_file_overrides_selected_fields() {
        let path = std::env::temp_dir().join(format!(
            "usrp_player_override_{}.toml",
            std::process::id()
        ));
        {
            let mut f = std::fs::File::create(&path).unwrap();
            writeln!(f, "[audio]\nsample_order = \"big\"\nbuffer_size = 8192").unwrap();
        }

        let loaded = Config::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.audio.sample_order, SampleOrder::Big);
        assert_eq!(loaded.audio.buffer_size, 8192);
        assert_eq!(loaded.audio.device, "default");
        assert_eq!(loaded.network.recv_buffer_size, 1024);
    }

    #[test]
    fn validate_rejects_unusable_values() {
        let mut config = Config::new().unwrap();
        config.network.recv_buffer_size = 100;
        assert!(config.validate().is_err());

        let mut config = Config::new().unwrap();
        config.network.bind_ip = "not-an-ip".into();
        assert!(config.validate().is_err());

        let mut config = Config::new().unwrap();
        config.audio.buffer_size = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn bind_addr_combines_ip_and_port() {
        let mut config = Config::new().unwrap();
        config.network.bind_ip = "127.0.0.1".into();
        config.network.port = 40000;
        assert_eq!(config.bind_addr().unwrap(), "127.0.0.1:40000".parse().unwrap());
    }
}
