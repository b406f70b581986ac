//! Receive → decode → play loop.
//!
//! One datagram is handled at a time: receive, decode, then a blocking write
//! to the sink. Frames are played in the order they arrive; sequence numbers
//! are not used for reordering.

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::time::{Instant, interval_at};

use crate::audio::PcmSink;
use crate::protocol::{self, DecodeError, Decoded};
use crate::usrp_bridge::DatagramSource;

/// Running totals for one playback session.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PlayerStats {
    pub received: u64,
    pub played: u64,
    pub non_voice: u64,
    pub too_short: u64,
    pub bad_signature: u64,
    pub incomplete: u64,
    pub receive_errors: u64,
    pub write_failures: u64,
}

impl PlayerStats {
    /// Datagrams discarded as malformed.
    pub fn rejected(&self) -> u64 {
        self.too_short + self.bad_signature + self.incomplete
    }

    fn record_rejection(&mut self, err: &DecodeError) {
        match err {
            DecodeError::TooShortForHeader { .. } => self.too_short += 1,
            DecodeError::BadSignature { .. } => self.bad_signature += 1,
            DecodeError::IncompletePayload { .. } => self.incomplete += 1,
        }
    }
}

impl fmt::Display for PlayerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "received={} played={} non_voice={} rejected={} (short={} signature={} incomplete={}) recv_errors={} write_failures={}",
            self.received,
            self.played,
            self.non_voice,
            self.rejected(),
            self.too_short,
            self.bad_signature,
            self.incomplete,
            self.receive_errors,
            self.write_failures,
        )
    }
}

/// What happened to one datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Played,
    NonVoice,
    Rejected(DecodeError),
    WriteFailed,
}

/// Decode one datagram and, if it carries voice, hand the frame to the sink.
pub fn process_datagram<K>(
    datagram: &[u8],
    peer: SocketAddr,
    sink: &mut K,
    stats: &mut PlayerStats,
) -> Outcome
where
    K: PcmSink + ?Sized,
{
    match protocol::decode(datagram) {
        Ok(Decoded::Voice(packet)) => match sink.write(packet.payload) {
            Ok(()) => {
                stats.played += 1;
                Outcome::Played
            }
            Err(e) => {
                stats.write_failures += 1;
                log::warn!(
                    "Error writing audio data from {} (seq {}): {:#}",
                    peer,
                    packet.header.sequence,
                    e
                );
                Outcome::WriteFailed
            }
        },
        Ok(Decoded::NonVoice(header)) => {
            stats.non_voice += 1;
            log::trace!(
                "Ignoring {:?} packet from {} (seq {})",
                header.kind(),
                peer,
                header.sequence
            );
            Outcome::NonVoice
        }
        Err(err) => {
            stats.record_rejection(&err);
            log::warn!("Dropped {}-byte packet from {}: {}", datagram.len(), peer, err);
            Outcome::Rejected(err)
        }
    }
}

/// Run the playback loop until `shutdown` resolves.
///
/// The receive buffer is allocated once and reused; only the bytes returned
/// by each receive are decoded. A stats line is logged every `stats_every`
/// if set, and the final totals are returned.
pub async fn run<S, K, F>(
    source: &S,
    sink: &mut K,
    recv_buffer_size: usize,
    stats_every: Option<Duration>,
    shutdown: F,
) -> PlayerStats
where
    S: DatagramSource + ?Sized,
    K: PcmSink + ?Sized,
    F: Future<Output = ()>,
{
    let mut stats = PlayerStats::default();
    let mut buf = vec![0u8; recv_buffer_size];

    let report = stats_every.is_some();
    let period = stats_every.unwrap_or(Duration::from_secs(60));
    let mut ticker = interval_at(Instant::now() + period, period);

    tokio::pin!(shutdown);

    loop {
        let (len, peer) = tokio::select! {
            biased;

            _ = &mut shutdown => {
                log::info!("Shutdown requested, leaving receive loop");
                break;
            }

            _ = ticker.tick(), if report => {
                log::info!("Stats: {}", stats);
                continue;
            }

            res = source.receive(&mut buf) => match res {
                Ok(received) => received,
                Err(e) => {
                    stats.receive_errors += 1;
                    log::warn!("Error reading UDP packet: {}", e);
                    continue;
                }
            },
        };

        stats.received += 1;
        process_datagram(&buf[..len], peer, sink, &mut stats);
    }

    stats
}
