//! VISCA-over-IP protocol layer
//!
//! Everything that touches camera wire bytes lives here:
//! - [`packet`]: the 8-byte VISCA-over-IP envelope
//! - [`command`]: VISCA payload builders and reply parsers
//! - [`quirks`]: vendor reply-value normalization
//! - [`client`]: the per-endpoint UDP client (send / query)
//!
//! Layers above this one deal in typed modes and values; raw byte sequences
//! never escape the protocol module.

pub mod client;
pub mod command;
pub mod packet;
pub mod quirks;

pub use client::{ViscaClient, QUERY_TIMEOUT, SEQUENCE_WRAP};
pub use command::{ExposureMode, FocusMode, PanTiltDirection, WhiteBalanceMode};
pub use packet::{PayloadType, ViscaPacket};
pub use quirks::QuirkPolicy;

/// Default VISCA-over-IP command port
pub const VISCA_DEFAULT_PORT: u16 = 52381;
