use std::path::PathBuf;

use clap::Parser;

use crate::audio::SampleOrder;
use crate::config::Config;

/// Play USRP voice packets received over UDP
#[derive(Parser, Debug)]
#[command(name = "usrp_player", version, about)]
pub struct Cli {
    /// UDP port to listen on for USRP packets [config default: 1234]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Local IP address to bind [config default: 0.0.0.0]
    #[arg(short, long)]
    pub bind: Option<String>,

    /// ALSA playback device, e.g. "default" or "plughw:0,0"
    #[arg(short, long)]
    pub device: Option<String>,

    /// Byte order of the 16-bit voice samples
    #[arg(long, value_enum)]
    pub sample_order: Option<SampleOrder>,

    /// ALSA buffer size in bytes (latency vs. underrun tradeoff)
    #[arg(long)]
    pub buffer_size: Option<usize>,

    /// Runtime configuration file, skipped if missing
    #[arg(short, long, default_value = "usrp_player.toml")]
    pub config: PathBuf,
}

impl Cli {
    /// Command-line flags win over every configuration layer.
    pub fn apply(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.network.port = port;
        }
        if let Some(bind) = &self.bind {
            config.network.bind_ip = bind.clone();
        }
        if let Some(device) = &self.device {
            config.audio.device = device.clone();
        }
        if let Some(order) = self.sample_order {
            config.audio.sample_order = order;
        }
        if let Some(size) = self.buffer_size {
            config.audio.buffer_size = size;
        }
    }
}
