//! Video transport capability seam
//!
//! The core consumes a frame transport (NDI or compatible) through these
//! traits instead of talking to a vendor SDK directly. The contract is the
//! minimal capability set the reception worker needs: enumerate sources,
//! open a receive handle, poll frames with a bounded wait, release every
//! polled frame back, and close the handle.
//!
//! ## Ownership rule
//!
//! Every [`TransportFrame`] returned by [`StreamHandle::poll`] is owned by
//! the transport and must be given back through [`StreamHandle::release`]
//! exactly once, whatever its kind and whether or not the payload was used.

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::time::Duration;

/// Receive quality requested when opening a stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bandwidth {
    /// Full-fidelity stream
    #[default]
    High,
    /// Reduced-bitrate stream for constrained links
    Low,
}

/// Pixel layout requested from, or delivered by, the transport
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelLayout {
    /// Packed 4:2:2, two bytes per pixel (U Y0 V Y1 macropixels)
    #[default]
    Uyvy422,
    /// Packed full-color RGB, three bytes per pixel
    Rgb888,
}

impl PixelLayout {
    /// Buffer size in bytes for a frame of the given dimensions
    pub fn buffer_size(&self, width: u32, height: u32) -> usize {
        let pixels = width as usize * height as usize;
        match self {
            PixelLayout::Uyvy422 => pixels * 2,
            PixelLayout::Rgb888 => pixels * 3,
        }
    }
}

/// A video source on the network, or a literal name to bypass discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Source name as advertised or as configured literally
    pub name: String,
    /// Resolved network address, absent for literal (discovery-bypass) names
    pub address: Option<String>,
}

impl SourceDescriptor {
    /// Descriptor for an exact, un-discovered source name
    pub fn literal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: None,
        }
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Kind of a multiplexed stream unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Video,
    Audio,
    Metadata,
}

/// One unit polled from a stream; owned by the transport until released
#[derive(Debug, Clone)]
pub struct TransportFrame {
    pub kind: FrameKind,
    /// Pixel dimensions; zero for non-video kinds
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    pub timestamp_us: i64,
    pub data: Bytes,
}

impl TransportFrame {
    pub fn is_video(&self) -> bool {
        self.kind == FrameKind::Video
    }
}

/// Factory side of the transport capability
#[async_trait]
pub trait VideoTransport: Send + Sync {
    /// List currently visible sources
    async fn enumerate(&self) -> Result<Vec<SourceDescriptor>>;

    /// Open a receive handle against one source
    async fn open(
        &self,
        source: &SourceDescriptor,
        bandwidth: Bandwidth,
        layout: PixelLayout,
    ) -> Result<Box<dyn StreamHandle>>;
}

/// An open receive stream
///
/// Handles are owned by exactly one reception worker and are not shared.
#[async_trait]
pub trait StreamHandle: Send {
    /// Wait up to `timeout` for the next unit; `Ok(None)` on timeout
    async fn poll(&mut self, timeout: Duration) -> Result<Option<TransportFrame>>;

    /// Return a polled unit to the transport; infallible by contract
    async fn release(&mut self, frame: TransportFrame);

    /// Close the stream; poll must not be called afterwards
    async fn close(&mut self);
}
