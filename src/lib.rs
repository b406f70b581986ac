//! usrp_player - play USRP voice streams from a radio gateway
//!
//! Receives USRP datagrams over UDP, validates the 32-byte header and writes
//! each 8 kHz mono voice frame to an ALSA playback device.

pub mod audio;
pub mod cli;
pub mod config;
pub mod player;
pub mod protocol;
pub mod usrp_bridge;
