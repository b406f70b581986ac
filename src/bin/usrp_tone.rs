//! Send a sine tone as a USRP voice stream, for checking a player's sample
//! byte order and device setup end to end.

use std::f32::consts::TAU;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::net::UdpSocket;

use usrp_player::audio::SampleOrder;
use usrp_player::protocol::{
    SAMPLES_PER_FRAME, UsrpHeader, VOICE_FRAME_SIZE, VOICE_SAMPLE_RATE, encode_voice,
};

/// One voice frame is 160 samples at 8 kHz.
const FRAME_DURATION: Duration = Duration::from_millis(20);

#[derive(Parser, Debug)]
#[command(name = "usrp_tone", version, about = "Send a test tone as USRP voice packets")]
struct Args {
    /// Player address
    #[arg(short, long, default_value = "127.0.0.1:1234")]
    target: SocketAddr,

    /// Tone frequency in Hz
    #[arg(short, long, default_value_t = 440.0)]
    freq: f32,

    /// Length of the transmission in seconds
    #[arg(short, long, default_value_t = 3.0)]
    seconds: f32,

    /// Peak level, 0.0 to 1.0
    #[arg(short, long, default_value_t = 0.3)]
    amplitude: f32,

    /// Talkgroup written into every header
    #[arg(long, default_value_t = 0)]
    talkgroup: u32,

    /// Byte order used for the samples
    #[arg(long, value_enum, default_value_t = SampleOrder::Little)]
    sample_order: SampleOrder,
}

/// Phase-continuous sine generator producing one frame at a time.
struct Tone {
    phase: f32,
    step: f32,
    amplitude: f32,
}

impl Tone {
    fn new(freq: f32, amplitude: f32) -> Self {
        Self {
            phase: 0.0,
            step: TAU * freq / VOICE_SAMPLE_RATE as f32,
            amplitude: amplitude.clamp(0.0, 1.0),
        }
    }

    fn next_frame(&mut self, out: &mut [i16; SAMPLES_PER_FRAME]) {
        for s in out.iter_mut() {
            *s = (self.phase.sin() * self.amplitude * i16::MAX as f32) as i16;
            self.phase = (self.phase + self.step) % TAU;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let bind_addr: SocketAddr = if args.target.is_ipv4() {
        "0.0.0.0:0".parse()?
    } else {
        "[::]:0".parse()?
    };
    let socket = UdpSocket::bind(bind_addr)
        .await
        .context("Failed to bind sending socket")?;

    let frames = (args.seconds.max(0.0) * 1000.0 / FRAME_DURATION.as_millis() as f32) as u32;
    log::info!(
        "Sending {} Hz tone to {} for {} frames, sample_order={}",
        args.freq,
        args.target,
        frames,
        args.sample_order,
    );

    let mut tone = Tone::new(args.freq, args.amplitude);
    let mut samples = [0i16; SAMPLES_PER_FRAME];
    let mut bytes = Vec::with_capacity(VOICE_FRAME_SIZE);
    let mut frame = [0u8; VOICE_FRAME_SIZE];
    let mut ticker = tokio::time::interval(FRAME_DURATION);

    for seq in 0..frames {
        ticker.tick().await;
        tone.next_frame(&mut samples);
        args.sample_order.encode_into(&samples, &mut bytes);
        frame.copy_from_slice(&bytes);

        let packet = encode_voice(&UsrpHeader::voice(seq, true, args.talkgroup), &frame);
        socket
            .send_to(&packet, args.target)
            .await
            .with_context(|| format!("Failed to send frame {}", seq))?;
    }

    // Unkey with one frame of silence.
    ticker.tick().await;
    let unkey = encode_voice(
        &UsrpHeader::voice(frames, false, args.talkgroup),
        &[0u8; VOICE_FRAME_SIZE],
    );
    socket.send_to(&unkey, args.target).await?;

    log::info!("Done, sent {} voice frames", frames + 1);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_stays_within_amplitude() {
        let mut tone = Tone::new(1000.0, 0.5);
        let mut samples = [0i16; SAMPLES_PER_FRAME];
        tone.next_frame(&mut samples);
        let limit = (0.5 * i16::MAX as f32) as i16 + 1;
        assert!(samples.iter().all(|s| s.abs() <= limit));
        assert!(samples.iter().any(|&s| s != 0));
    }

    #[test]
    fn tone_is_phase_continuous_across_frames() {
        // 400 Hz at 8 kHz repeats every 20 samples, so 160-sample frames are identical.
        let mut tone = Tone::new(400.0, 1.0);
        let mut a = [0i16; SAMPLES_PER_FRAME];
        let mut b = [0i16; SAMPLES_PER_FRAME];
        tone.next_frame(&mut a);
        tone.next_frame(&mut b);
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((*x as i32 - *y as i32).abs() <= 32, "{x} vs {y}");
        }
    }
}
