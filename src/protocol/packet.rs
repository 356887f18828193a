//! VISCA-over-IP packet envelope
//!
//! Every datagram exchanged with a camera carries an 8-byte header followed
//! by the raw VISCA payload:
//!
//! ```text
//! ┌──────────────┬───────────────┬───────────┬──────────────┬─────────────┐
//! │ payload type │ payload length│ reserved  │ sequence no. │   payload   │
//! │   (1 byte)   │ (2 bytes, BE) │ (1 byte)  │ (4 bytes, BE)│    (var)    │
//! └──────────────┴───────────────┴───────────┴──────────────┴─────────────┘
//! ```
//!
//! The payload is the vendor-documented VISCA byte sequence, terminated by
//! the 0xFF end-of-message byte.

use crate::error::{CameraError, Result};
use bytes::{BufMut, Bytes, BytesMut};

/// Size of the VISCA-over-IP header in bytes
pub const HEADER_SIZE: usize = 8;

/// VISCA end-of-message terminator byte
pub const TERMINATOR: u8 = 0xFF;

/// Payload type byte in the VISCA-over-IP header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadType {
    /// Command or inquiry sent to the camera
    Command,
    /// Reply returned by the camera
    Reply,
}

impl PayloadType {
    /// Convert to the wire-format byte value
    pub fn as_u8(&self) -> u8 {
        match self {
            PayloadType::Command => 0x01,
            PayloadType::Reply => 0x11,
        }
    }

    /// Parse from the wire-format byte value
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            // Some firmware echoes 0x01 on replies instead of 0x11; both are
            // accepted since the sequence number carries the correlation.
            0x01 => Ok(PayloadType::Command),
            0x11 => Ok(PayloadType::Reply),
            other => Err(CameraError::protocol(format!(
                "unknown payload type byte 0x{other:02X}"
            ))),
        }
    }
}

/// A VISCA-over-IP packet: typed envelope plus raw VISCA payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViscaPacket {
    /// Payload type (command vs. reply)
    pub payload_type: PayloadType,
    /// Sequence number, unique among in-flight queries on one endpoint
    pub sequence: u32,
    /// Raw VISCA payload bytes, 0xFF-terminated
    pub payload: Bytes,
}

impl ViscaPacket {
    /// Create a command packet
    pub fn command(sequence: u32, payload: impl Into<Bytes>) -> Self {
        Self {
            payload_type: PayloadType::Command,
            sequence,
            payload: payload.into(),
        }
    }

    /// Serialize to wire format
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE + self.payload.len());
        buf.put_u8(self.payload_type.as_u8());
        buf.put_u16(self.payload.len() as u16);
        buf.put_u8(0x00); // reserved
        buf.put_u32(self.sequence);
        buf.put_slice(&self.payload);
        buf.freeze()
    }

    /// Parse from wire format
    ///
    /// # Errors
    ///
    /// Returns [`CameraError::ProtocolViolation`] when the datagram is
    /// shorter than the header, carries an unknown type byte, or declares a
    /// payload length that disagrees with the datagram size.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(CameraError::protocol(format!(
                "datagram too short: {} bytes",
                data.len()
            )));
        }

        let payload_type = PayloadType::from_u8(data[0])?;
        let declared_len = u16::from_be_bytes([data[1], data[2]]) as usize;
        let sequence = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        let payload = &data[HEADER_SIZE..];

        if payload.len() != declared_len {
            return Err(CameraError::protocol(format!(
                "declared payload length {} but got {} bytes",
                declared_len,
                payload.len()
            )));
        }

        Ok(Self {
            payload_type,
            sequence,
            payload: Bytes::copy_from_slice(payload),
        })
    }

    /// True when the payload carries the 0xFF end-of-message terminator
    pub fn is_terminated(&self) -> bool {
        self.payload.last() == Some(&TERMINATOR)
    }
}
