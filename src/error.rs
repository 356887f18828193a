//! Error types for ptz-control-core

use std::io;
use thiserror::Error;

/// Result type alias using CameraError
pub type Result<T> = std::result::Result<T, CameraError>;

/// Camera error types
///
/// All errors that can surface from the protocol client, the connection
/// state machine, the preset registry and the video reception workers.
/// Transient network errors (`Io`, `SendFailed`, `Timeout`) may be retried
/// at the caller's discretion; the protocol client never retries on its own.
#[derive(Debug, Error)]
pub enum CameraError {
    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Datagram could not be handed to the network stack
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// Query received no matching reply within the timeout
    #[error("Query timed out")]
    Timeout,

    /// Malformed or unrecognized reply from the device
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// Command attempted while the camera is not in the Connected state
    #[error("Camera not connected (state: {0})")]
    NotConnected(String),

    /// Camera is already connected or connecting
    #[error("Camera already connected: {0}")]
    AlreadyConnected(String),

    /// Named video source never produced a first frame
    #[error("Video stream unavailable: {0}")]
    StreamUnavailable(String),

    /// Video stream failed after it had been established
    #[error("Video stream error: {0}")]
    Stream(String),

    /// No free preset slot remains on the device
    #[error("Preset slots exhausted (capacity {0})")]
    SlotExhausted(u16),

    /// Unknown camera id or video source
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid argument supplied by the caller
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Persisted configuration could not be read or written
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl CameraError {
    /// Create a SendFailed error
    pub fn send_failed(msg: impl Into<String>) -> Self {
        Self::SendFailed(msg.into())
    }

    /// Create a ProtocolViolation error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::ProtocolViolation(msg.into())
    }

    /// Create a Stream error
    pub fn stream(msg: impl Into<String>) -> Self {
        Self::Stream(msg.into())
    }

    /// Create a NotConnected error
    pub fn not_connected(msg: impl Into<String>) -> Self {
        Self::NotConnected(msg.into())
    }

    /// Create a NotFound error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an InvalidArgument error
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// True for errors the caller may reasonably retry (transient network)
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CameraError::Io(_) | CameraError::SendFailed(_) | CameraError::Timeout
        )
    }
}
