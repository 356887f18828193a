//! Frame delivery channel
//!
//! One slot per camera, overwrite on full: if the consumer has not picked up
//! the previous frame, the new one replaces it. Publishing never blocks the
//! reception worker and nothing is ever queued. Built on `tokio::sync::watch`,
//! which has exactly these semantics and gives the consumer a change
//! notification for free.

use crate::video::transport::PixelLayout;
use bytes::Bytes;
use tokio::sync::watch;

/// A decoded frame as handed to the consumer
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    pub timestamp_us: i64,
    pub data: Bytes,
}

/// Consumer side of the slot; `borrow`/`changed` via the inner watch receiver
pub type FrameReceiver = watch::Receiver<Option<VideoFrame>>;

/// Producer side of the one-slot channel
#[derive(Debug, Clone)]
pub struct FrameSlot {
    tx: watch::Sender<Option<VideoFrame>>,
}

impl FrameSlot {
    /// Create an empty slot and its consumer handle
    pub fn new() -> (Self, FrameReceiver) {
        let (tx, rx) = watch::channel(None);
        (Self { tx }, rx)
    }

    /// Replace the slot contents; never blocks, never queues
    pub fn publish(&self, frame: VideoFrame) {
        // A closed receiver just means nobody is watching; frames are lossy
        // by design, so this is not an error.
        self.tx.send_replace(Some(frame));
    }

    /// Empty the slot (worker stopped or camera disconnected)
    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    /// A fresh consumer handle for the same slot
    pub fn subscribe(&self) -> FrameReceiver {
        self.tx.subscribe()
    }
}
