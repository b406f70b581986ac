use anyhow::{Context, Result};

use super::alsa_device::{self, PlaybackRequest};
use super::sample::SampleOrder;
use crate::config::AudioConfig;

/// XRUN recoveries allowed for one frame before it is dropped.
const MAX_RECOVERY_RETRIES: u32 = 3;

/// Destination for decoded voice frames.
///
/// `write` may block while the device buffer is full; that is the only
/// backpressure the receive loop sees.
pub trait PcmSink {
    /// Queue one frame of raw PCM bytes for playback.
    fn write(&mut self, frame: &[u8]) -> Result<()>;

    /// Flush queued audio before shutdown. Dropping the sink releases the
    /// device without flushing.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Blocking ALSA playback sink.
pub struct AlsaSink {
    pcm: alsa::PCM,
    channels: usize,
    order: SampleOrder,
    samples: Vec<i16>,
}

impl AlsaSink {
    /// Open the configured playback device for the given stream format.
    pub fn open(
        config: &AudioConfig,
        sample_rate: u32,
        channels: u32,
        bits_per_sample: u32,
    ) -> Result<Self> {
        if bits_per_sample != 16 {
            anyhow::bail!("Unsupported sample width: {} bits (only 16-bit PCM)", bits_per_sample);
        }

        let bytes_per_frame = channels as usize * 2;
        let buffer_frames = (config.buffer_size / bytes_per_frame).max(1);
        let period_frames = if config.period_size > 0 {
            Some(config.period_size)
        } else {
            None
        };

        let (pcm, params) = alsa_device::open_playback(&PlaybackRequest {
            device: &config.device,
            sample_rate,
            channels,
            buffer_frames,
            period_frames,
        })?;

        log::info!(
            "Playback sink ready: sample_order={}, buffer={} bytes ({} frames)",
            config.sample_order,
            params.buffer_size * bytes_per_frame,
            params.buffer_size,
        );

        Ok(Self {
            pcm,
            channels: params.channels as usize,
            order: config.sample_order,
            samples: Vec::with_capacity(params.period_size.max(160) * params.channels as usize),
        })
    }
}

impl PcmSink for AlsaSink {
    fn write(&mut self, frame: &[u8]) -> Result<()> {
        self.order.decode_into(frame, &mut self.samples);

        let io = self.pcm.io_i16().context("PCM is not configured for i16 samples")?;

        // Retry short writes and recover from XRUN without losing frames.
        let total_frames = self.samples.len() / self.channels;
        let mut frames_written = 0;
        let mut retry_count = 0u32;

        while frames_written < total_frames {
            let offset = frames_written * self.channels;
            match io.writei(&self.samples[offset..]) {
                Ok(n) => {
                    frames_written += n;
                    retry_count = 0;
                }
                Err(e) => {
                    retry_count += 1;
                    if retry_count > MAX_RECOVERY_RETRIES {
                        anyhow::bail!(
                            "ALSA write failed after {} recoveries, dropping {} of {} frames: {}",
                            MAX_RECOVERY_RETRIES,
                            total_frames - frames_written,
                            total_frames,
                            e
                        );
                    }
                    // Underruns are routine between transmissions.
                    log::debug!("ALSA XRUN or error: {}, recovering...", e);
                    self.pcm
                        .prepare()
                        .context("Failed to recover PCM playback")?;
                }
            }
        }

        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.pcm.drain().context("Failed to drain PCM playback")?;
        log::info!("Playback stopped");
        Ok(())
    }
}
