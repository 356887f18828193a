//! Video reception pipeline
//!
//! One reception worker per camera pulls frames from a consumed transport
//! capability, converts and optionally analyzes them, and delivers the
//! result through a one-slot lossy channel.
//!
//! ## Architecture
//!
//! ```text
//! transport (NDI or compatible)
//!        │ poll / release
//!        ▼
//! VideoWorker ── UYVY→RGB ── scope rendering (optional)
//!        │
//!        ▼
//! FrameSlot (one slot, overwrite on full) ──▶ consumer
//! ```
//!
//! The worker never blocks on the consumer and never keeps transport buffers
//! beyond the loop iteration that polled them.

pub mod convert;
pub mod delivery;
pub mod receiver;
pub mod scope;
pub mod transport;

pub use convert::UyvyConverter;
pub use delivery::{FrameReceiver, FrameSlot, VideoFrame};
pub use receiver::{VideoConfig, VideoWorker, FIRST_FRAME_TIMEOUT, POLL_TIMEOUT};
pub use scope::{ScopeMode, ScopeRenderer};
pub use transport::{
    Bandwidth, FrameKind, PixelLayout, SourceDescriptor, StreamHandle, TransportFrame,
    VideoTransport,
};
