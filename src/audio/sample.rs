//! Byte order of the 16-bit PCM samples inside a voice frame.
//!
//! USRP headers are big-endian, but the samples are written in whatever order
//! the producing gateway uses, so this is configured rather than assumed.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SampleOrder {
    #[default]
    Little,
    Big,
}

impl SampleOrder {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "little" => Some(Self::Little),
            "big" => Some(Self::Big),
            _ => None,
        }
    }

    /// Decode raw sample bytes into `out`, replacing its contents.
    /// A trailing odd byte is ignored.
    pub fn decode_into(self, bytes: &[u8], out: &mut Vec<i16>) {
        out.clear();
        out.extend(bytes.chunks_exact(2).map(|pair| match self {
            Self::Little => i16::from_le_bytes([pair[0], pair[1]]),
            Self::Big => i16::from_be_bytes([pair[0], pair[1]]),
        }));
    }

    /// Encode samples into raw bytes in this order.
    pub fn encode_into(self, samples: &[i16], out: &mut Vec<u8>) {
        out.clear();
        for &s in samples {
            let pair = match self {
                Self::Little => s.to_le_bytes(),
                Self::Big => s.to_be_bytes(),
            };
            out.extend_from_slice(&pair);
        }
    }
}

impl std::fmt::Display for SampleOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Little => f.write_str("little"),
            Self::Big => f.write_str("big"),
        }
    }
}
