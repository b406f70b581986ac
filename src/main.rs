use std::time::Duration;

use clap::Parser;
use tokio::signal;

use usrp_player::audio::{AlsaSink, PcmSink};
use usrp_player::cli::Cli;
use usrp_player::config::Config;
use usrp_player::player;
use usrp_player::protocol::{VOICE_BITS_PER_SAMPLE, VOICE_CHANNELS, VOICE_SAMPLE_RATE};
use usrp_player::usrp_bridge::UsrpBridge;

// Receive, decode and the blocking ALSA write all run on this one thread.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    cli.apply(&mut config);
    config.validate()?;

    // Both are released on drop, including on the early returns below.
    let bridge = UsrpBridge::bind(config.bind_addr()?).await?;
    let mut sink = AlsaSink::open(
        &config.audio,
        VOICE_SAMPLE_RATE,
        VOICE_CHANNELS,
        VOICE_BITS_PER_SAMPLE,
    )?;

    let stats_every = (config.stats.interval_secs > 0)
        .then(|| Duration::from_secs(config.stats.interval_secs));

    let stats = player::run(
        &bridge,
        &mut sink,
        config.network.recv_buffer_size,
        stats_every,
        shutdown_signal(),
    )
    .await;

    log::info!("Final stats: {}", stats);

    if let Err(e) = sink.close() {
        log::warn!("{:#}", e);
    }
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => log::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => log::info!("Received SIGTERM, shutting down..."),
    }
}
