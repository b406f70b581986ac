use std::fs;
use std::path::Path;
use serde::Deserialize;

#[derive(Deserialize)]
struct Config {
    network: Network,
    audio: Audio,
    stats: Stats,
}

#[derive(Deserialize)]
struct Network {
    bind_ip: String,
    port: u16,
    recv_buffer_size: usize,
}

#[derive(Deserialize)]
struct Audio {
    device: String,
    buffer_size: usize,
    period_size: usize,
    sample_order: String,
}

#[derive(Deserialize)]
struct Stats {
    interval_secs: u64,
}

// Read config.toml at build time and expose it as compile-time env vars
fn main() {
    println!("cargo:rerun-if-changed=config.toml");

    let config_path = Path::new("config.toml");
    if !config_path.exists() {
        panic!("config.toml not found!");
    }

    let config_str = fs::read_to_string(config_path).expect("Failed to read config.toml");
    let config: Config = toml::from_str(&config_str).expect("Failed to parse config.toml");

    match config.audio.sample_order.as_str() {
        "little" | "big" => {}
        other => panic!("config.toml: audio.sample_order must be \"little\" or \"big\", got {other:?}"),
    }

    // Network
    println!("cargo:rustc-env=DEFAULT_BIND_IP={}", config.network.bind_ip);
    println!("cargo:rustc-env=DEFAULT_PORT={}", config.network.port);
    println!("cargo:rustc-env=DEFAULT_RECV_BUFFER_SIZE={}", config.network.recv_buffer_size);

    // Audio
    println!("cargo:rustc-env=DEFAULT_AUDIO_DEVICE={}", config.audio.device);
    println!("cargo:rustc-env=DEFAULT_AUDIO_BUFFER_SIZE={}", config.audio.buffer_size);
    println!("cargo:rustc-env=DEFAULT_AUDIO_PERIOD_SIZE={}", config.audio.period_size);
    println!("cargo:rustc-env=DEFAULT_SAMPLE_ORDER={}", config.audio.sample_order);

    // Stats
    println!("cargo:rustc-env=DEFAULT_STATS_INTERVAL_SECS={}", config.stats.interval_secs);
}
