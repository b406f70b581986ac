//! ALSA PCM device wrapper for voice playback.

use alsa::pcm::{Access, Format, HwParams, PCM};
use alsa::{Direction, ValueOr};
use anyhow::{Context, Result};

/// Requested playback parameters.
#[derive(Debug, Clone)]
pub struct PlaybackRequest<'a> {
    pub device: &'a str,
    pub sample_rate: u32,
    pub channels: u32,
    /// Device buffer size in frames (one frame = channels × 2 bytes)
    pub buffer_frames: usize,
    /// Period size in frames, `None` lets ALSA decide
    pub period_frames: Option<usize>,
}

/// Parameters negotiated with the ALSA hardware.
#[derive(Debug, Clone)]
pub struct AlsaParams {
    /// Actual sample rate after negotiation
    pub sample_rate: u32,
    /// Actual number of channels
    pub channels: u32,
    /// Buffer size in frames
    pub buffer_size: usize,
    /// Period size in frames
    pub period_size: usize,
}

/// Open a PCM device for blocking S16 playback.
pub fn open_playback(req: &PlaybackRequest<'_>) -> Result<(PCM, AlsaParams)> {
    let pcm = PCM::new(req.device, Direction::Playback, false)
        .with_context(|| format!("Failed to open PCM device '{}' for Playback", req.device))?;

    // Configure hardware parameters
    {
        let hwp = HwParams::any(&pcm).with_context(|| "Failed to initialize HwParams")?;
        hwp.set_access(Access::RWInterleaved)?;
        hwp.set_format(Format::S16LE)?;
        hwp.set_channels(req.channels)
            .with_context(|| format!("Device '{}' rejects {} channel(s)", req.device, req.channels))?;
        hwp.set_rate_near(req.sample_rate, ValueOr::Nearest)?;
        if let Some(ps) = req.period_frames {
            hwp.set_period_size_near(ps as alsa::pcm::Frames, ValueOr::Nearest)?;
        }
        hwp.set_buffer_size_near(req.buffer_frames as alsa::pcm::Frames)?;
        pcm.hw_params(&hwp)?;
    }

    // Read back actual negotiated parameters
    let params = {
        let hwp = pcm.hw_params_current()?;
        AlsaParams {
            sample_rate: hwp.get_rate()?,
            channels: hwp.get_channels()?,
            buffer_size: hwp.get_buffer_size()? as usize,
            period_size: hwp.get_period_size()? as usize,
        }
    };

    if params.sample_rate != req.sample_rate {
        log::warn!(
            "ALSA Playback: device '{}' runs at {} Hz instead of {} Hz, audio will be off-pitch (try a plughw: device)",
            req.device,
            params.sample_rate,
            req.sample_rate,
        );
    }

    log::info!(
        "ALSA Playback: device={}, rate={}, channels={}, buffer_size={}, period_size={}",
        req.device,
        params.sample_rate,
        params.channels,
        params.buffer_size,
        params.period_size,
    );

    Ok((pcm, params))
}
