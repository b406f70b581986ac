//! audio - PCM playback for received voice frames
//!
//! ALSA is driven in blocking mode from the receive loop itself; there is no
//! separate audio thread or intermediate queue.

mod alsa_device;
mod sample;
mod sink;

pub use sample::SampleOrder;
pub use sink::{AlsaSink, PcmSink};
