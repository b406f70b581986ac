//! USRP wire format: 32-byte big-endian header, optionally followed by one
//! 20 ms frame of 8 kHz mono 16-bit PCM.
//!
//! ```text
//! Offset  Len  Field
//! ------  ---  -----
//!  0       4   "USRP"
//!  4       4   sequence
//!  8       4   memory
//! 12       4   keyup
//! 16       4   talkgroup
//! 20       4   type (0 = voice, 1 = DTMF, 2 = text)
//! 24       4   mpxid
//! 28       4   reserved
//! 32     320   voice frame (type 0 only)
//! ```

use thiserror::Error;

pub const SIGNATURE: [u8; 4] = *b"USRP";
pub const HEADER_SIZE: usize = 32;

pub const SAMPLES_PER_FRAME: usize = 160;
pub const BYTES_PER_SAMPLE: usize = 2;
pub const VOICE_FRAME_SIZE: usize = SAMPLES_PER_FRAME * BYTES_PER_SAMPLE;
pub const VOICE_PACKET_SIZE: usize = HEADER_SIZE + VOICE_FRAME_SIZE;

/// Fixed audio format of the voice payload.
pub const VOICE_SAMPLE_RATE: u32 = 8000;
pub const VOICE_CHANNELS: u32 = 1;
pub const VOICE_BITS_PER_SAMPLE: u32 = 16;

/// Payload type carried in the header's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadType {
    Voice,
    Dtmf,
    Text,
    Other(u32),
}

impl PayloadType {
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => Self::Voice,
            1 => Self::Dtmf,
            2 => Self::Text,
            other => Self::Other(other),
        }
    }

    pub fn as_u32(self) -> u32 {
        match self {
            Self::Voice => 0,
            Self::Dtmf => 1,
            Self::Text => 2,
            Self::Other(value) => value,
        }
    }
}

/// Decoded USRP header. All fields except `payload_type` are passed through
/// untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsrpHeader {
    pub sequence: u32,
    pub memory: u32,
    pub keyup: u32,
    pub talkgroup: u32,
    pub payload_type: u32,
    pub mpx_id: u32,
    pub reserved: u32,
}

impl UsrpHeader {
    /// Header for one voice frame.
    pub fn voice(sequence: u32, keyup: bool, talkgroup: u32) -> Self {
        Self {
            sequence,
            memory: 0,
            keyup: keyup as u32,
            talkgroup,
            payload_type: PayloadType::Voice.as_u32(),
            mpx_id: 0,
            reserved: 0,
        }
    }

    pub fn kind(&self) -> PayloadType {
        PayloadType::from_u32(self.payload_type)
    }

    /// Serialize into the 32-byte wire header (network byte order).
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&SIGNATURE);
        buf[4..8].copy_from_slice(&self.sequence.to_be_bytes());
        buf[8..12].copy_from_slice(&self.memory.to_be_bytes());
        buf[12..16].copy_from_slice(&self.keyup.to_be_bytes());
        buf[16..20].copy_from_slice(&self.talkgroup.to_be_bytes());
        buf[20..24].copy_from_slice(&self.payload_type.to_be_bytes());
        buf[24..28].copy_from_slice(&self.mpx_id.to_be_bytes());
        buf[28..32].copy_from_slice(&self.reserved.to_be_bytes());
        buf
    }

    /// Caller guarantees `buf.len() >= HEADER_SIZE`.
    fn parse_fields(buf: &[u8]) -> Self {
        let field = |offset: usize| {
            u32::from_be_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
        };
        Self {
            sequence: field(4),
            memory: field(8),
            keyup: field(12),
            talkgroup: field(16),
            payload_type: field(20),
            mpx_id: field(24),
            reserved: field(28),
        }
    }
}

/// A voice packet borrowing its frame from the receive buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoicePacket<'a> {
    pub header: UsrpHeader,
    /// Exactly `VOICE_FRAME_SIZE` bytes.
    pub payload: &'a [u8],
}

/// Successful decode outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded<'a> {
    Voice(VoicePacket<'a>),
    /// Valid header with a payload type we do not play. Not an error.
    NonVoice(UsrpHeader),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("datagram too short for header: {len} bytes (need {})", HEADER_SIZE)]
    TooShortForHeader { len: usize },

    #[error("bad signature {found:02x?} (expected \"USRP\")")]
    BadSignature { found: [u8; 4] },

    #[error("incomplete voice payload: {payload_len} bytes (need {})", VOICE_FRAME_SIZE)]
    IncompletePayload { payload_len: usize },
}

/// Validate and parse one datagram.
///
/// Checks run in a fixed order: header length, signature, payload type, then
/// payload length. Bytes past the voice frame are ignored.
pub fn decode(buf: &[u8]) -> Result<Decoded<'_>, DecodeError> {
    if buf.len() < HEADER_SIZE {
        return Err(DecodeError::TooShortForHeader { len: buf.len() });
    }

    if buf[0..4] != SIGNATURE {
        return Err(DecodeError::BadSignature {
            found: [buf[0], buf[1], buf[2], buf[3]],
        });
    }

    let header = UsrpHeader::parse_fields(buf);

    if header.kind() != PayloadType::Voice {
        return Ok(Decoded::NonVoice(header));
    }

    let payload_len = buf.len() - HEADER_SIZE;
    if payload_len < VOICE_FRAME_SIZE {
        return Err(DecodeError::IncompletePayload { payload_len });
    }

    Ok(Decoded::Voice(VoicePacket {
        header,
        payload: &buf[HEADER_SIZE..VOICE_PACKET_SIZE],
    }))
}

/// Build a complete voice datagram from a header and one PCM frame.
pub fn encode_voice(header: &UsrpHeader, frame: &[u8; VOICE_FRAME_SIZE]) -> Vec<u8> {
    let mut packet = Vec::with_capacity(VOICE_PACKET_SIZE);
    packet.extend_from_slice(&header.encode());
    packet.extend_from_slice(frame);
    packet
}
