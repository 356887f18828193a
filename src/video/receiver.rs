//! Video reception worker
//!
//! One worker task per camera with video enabled. The loop polls the stream
//! handle with a bounded wait, decodes video units, and publishes the result
//! into the camera's [`FrameSlot`]. Non-video units (audio, metadata) ride
//! the same stream and are polled too; every polled unit of any kind is
//! released back to the transport exactly once, on every path, including
//! decode failures.
//!
//! A source that never produces a first frame is fatal after 5 seconds
//! (misconfigured or missing source). Once a frame has arrived, gaps are
//! treated as network jitter and tolerated indefinitely.
//!
//! Stopping is deterministic: the stop flag is observed within one loop
//! iteration, the handle is closed before the task finishes, and
//! [`VideoWorker::stop`] awaits that completion, so a replacement worker can
//! start immediately without racing the old handle.

use crate::error::{CameraError, Result};
use crate::video::convert::UyvyConverter;
use crate::video::delivery::{FrameSlot, VideoFrame};
use crate::video::scope::{ScopeMode, ScopeRenderer};
use crate::video::transport::{
    Bandwidth, PixelLayout, SourceDescriptor, TransportFrame, VideoTransport,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, info, warn};

/// Bounded wait per poll iteration
pub const POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// A source that produces nothing for this long has never existed
pub const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-camera video configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoConfig {
    pub source: SourceDescriptor,
    pub bandwidth: Bandwidth,
    /// Layout requested from the transport; UYVY is converted by the worker
    pub layout: PixelLayout,
    /// Deliver every (frame_skip + 1)th video frame; 0 delivers all
    pub frame_skip: u32,
    /// Active analysis rendering, if any
    pub scope: Option<ScopeMode>,
}

impl VideoConfig {
    pub fn new(source: SourceDescriptor) -> Self {
        Self {
            source,
            bandwidth: Bandwidth::default(),
            layout: PixelLayout::default(),
            frame_skip: 0,
            scope: None,
        }
    }
}

/// Handle to a running reception worker
pub struct VideoWorker {
    camera: String,
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl VideoWorker {
    /// Start a worker; fatal errors are delivered once on the returned channel
    ///
    /// The channel closes without a value when the worker stops normally.
    pub fn spawn(
        camera: impl Into<String>,
        transport: Arc<dyn VideoTransport>,
        config: VideoConfig,
        slot: FrameSlot,
    ) -> (Self, oneshot::Receiver<CameraError>) {
        let camera = camera.into();
        let (stop_tx, stop_rx) = watch::channel(false);
        let (fatal_tx, fatal_rx) = oneshot::channel();

        let name = camera.clone();
        let task = tokio::spawn(async move {
            if let Err(e) = run(&name, transport, config, slot, stop_rx).await {
                warn!(camera = %name, error = %e, "video worker terminated");
                let _ = fatal_tx.send(e);
            }
        });

        (
            Self {
                camera,
                stop_tx,
                task,
            },
            fatal_rx,
        )
    }

    /// Stop the worker and wait until its handle is closed
    ///
    /// Safe to call on a worker that already terminated on its own.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.task.await {
            if e.is_panic() {
                warn!(camera = %self.camera, "video worker panicked");
            }
        }
        debug!(camera = %self.camera, "video worker stopped");
    }
}

async fn run(
    camera: &str,
    transport: Arc<dyn VideoTransport>,
    config: VideoConfig,
    slot: FrameSlot,
    stop_rx: watch::Receiver<bool>,
) -> Result<()> {
    let mut handle = transport
        .open(&config.source, config.bandwidth, config.layout)
        .await?;
    info!(camera, source = %config.source, "video stream opened");

    let mut converter = UyvyConverter::new();
    let mut renderer = ScopeRenderer::new();
    let mut any_frame = false;
    let mut idle = Duration::ZERO;
    let mut video_count: u64 = 0;

    let outcome = loop {
        if *stop_rx.borrow() {
            break Ok(());
        }
        match handle.poll(POLL_TIMEOUT).await {
            Ok(None) => {
                if !any_frame {
                    idle += POLL_TIMEOUT;
                    if idle >= FIRST_FRAME_TIMEOUT {
                        break Err(CameraError::StreamUnavailable(config.source.name.clone()));
                    }
                }
                // Gaps after the first frame are jitter, not failure
            }
            Ok(Some(frame)) => {
                any_frame = true;
                let deliver = frame.is_video() && {
                    video_count += 1;
                    should_deliver(video_count, config.frame_skip)
                };
                if deliver {
                    match decode(&frame, config.scope, &mut converter, &mut renderer) {
                        Ok(decoded) => slot.publish(decoded),
                        Err(e) => warn!(camera, error = %e, "frame decode failed"),
                    }
                }
                handle.release(frame).await;
            }
            Err(e) => break Err(e),
        }
    };

    // Close before completion is observable, on every exit path
    handle.close().await;
    outcome
}

/// Decimation: with skip n, deliver the 1st of every n+1 video frames
fn should_deliver(video_count: u64, frame_skip: u32) -> bool {
    (video_count - 1) % (frame_skip as u64 + 1) == 0
}

fn decode(
    frame: &TransportFrame,
    scope: Option<ScopeMode>,
    converter: &mut UyvyConverter,
    renderer: &mut ScopeRenderer,
) -> Result<VideoFrame> {
    let rgb: &[u8] = match frame.layout {
        PixelLayout::Rgb888 => {
            let expected = PixelLayout::Rgb888.buffer_size(frame.width, frame.height);
            if frame.data.len() != expected {
                return Err(CameraError::stream(format!(
                    "RGB frame is {} bytes, expected {expected}",
                    frame.data.len()
                )));
            }
            &frame.data
        }
        PixelLayout::Uyvy422 => converter.convert(&frame.data, frame.width, frame.height)?,
    };

    match scope {
        None => Ok(VideoFrame {
            width: frame.width,
            height: frame.height,
            layout: PixelLayout::Rgb888,
            timestamp_us: frame.timestamp_us,
            data: Bytes::copy_from_slice(rgb),
        }),
        Some(mode) => {
            let (pixels, width, height) = renderer.render(mode, rgb, frame.width, frame.height)?;
            Ok(VideoFrame {
                width,
                height,
                layout: PixelLayout::Rgb888,
                timestamp_us: frame.timestamp_us,
                data: Bytes::copy_from_slice(pixels),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::transport::StreamHandle;
    use async_trait::async_trait;

    struct SilentHandle;

    #[async_trait]
    impl StreamHandle for SilentHandle {
        async fn poll(&mut self, timeout: Duration) -> Result<Option<TransportFrame>> {
            tokio::time::sleep(timeout).await;
            Ok(None)
        }
        async fn release(&mut self, _frame: TransportFrame) {}
        async fn close(&mut self) {}
    }

    struct SilentTransport;

    #[async_trait]
    impl VideoTransport for SilentTransport {
        async fn enumerate(&self) -> Result<Vec<SourceDescriptor>> {
            Ok(Vec::new())
        }
        async fn open(
            &self,
            _source: &SourceDescriptor,
            _bandwidth: Bandwidth,
            _layout: PixelLayout,
        ) -> Result<Box<dyn StreamHandle>> {
            Ok(Box::new(SilentHandle))
        }
    }

    #[test]
    fn test_decimation_delivers_first_of_each_group() {
        // No skip: everything
        assert!(should_deliver(1, 0));
        assert!(should_deliver(2, 0));
        // Skip 2: every third
        assert!(should_deliver(1, 2));
        assert!(!should_deliver(2, 2));
        assert!(!should_deliver(3, 2));
        assert!(should_deliver(4, 2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_source_without_frames_is_fatal_at_deadline() {
        let (slot, rx) = FrameSlot::new();
        let config = VideoConfig::new(SourceDescriptor::literal("NO-SUCH-SOURCE"));
        let (worker, fatal_rx) = VideoWorker::spawn("cam", Arc::new(SilentTransport), config, slot);

        let err = fatal_rx.await.unwrap();
        assert!(matches!(err, CameraError::StreamUnavailable(_)));
        assert!(rx.borrow().is_none());
        worker.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_before_first_frame_is_clean() {
        let (slot, _rx) = FrameSlot::new();
        let config = VideoConfig::new(SourceDescriptor::literal("CAM"));
        let (worker, fatal_rx) = VideoWorker::spawn("cam", Arc::new(SilentTransport), config, slot);

        tokio::time::sleep(Duration::from_millis(250)).await;
        worker.stop().await;
        // No fatal error was reported
        assert!(fatal_rx.await.is_err());
    }
}
