//! Shared test doubles: a scripted loopback VISCA camera and a scripted
//! video transport with poll/release accounting.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use ptz_control_core::error::Result;
use ptz_control_core::protocol::packet::ViscaPacket;
use ptz_control_core::video::transport::{
    Bandwidth, FrameKind, PixelLayout, SourceDescriptor, StreamHandle, TransportFrame,
    VideoTransport,
};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::Mutex;
use tokio::time::Duration;

/// Route test logs through the captured test writer; `RUST_LOG` filters
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Loopback UDP camera that answers VISCA inquiries from a fixed value table
///
/// Fire-and-forget commands are recorded but never answered, matching real
/// device behavior for this protocol profile.
pub struct ScriptedCamera {
    pub addr: SocketAddr,
    answering: Arc<AtomicBool>,
    reply_budget: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<Bytes>>>,
}

impl ScriptedCamera {
    /// Camera that answers every inquiry
    pub async fn responsive() -> Self {
        Self::spawn(true, usize::MAX).await
    }

    /// Camera that receives but never answers
    pub async fn silent() -> Self {
        Self::spawn(false, usize::MAX).await
    }

    /// Camera that answers the first `budget` inquiries, then goes dead
    pub async fn with_reply_budget(budget: usize) -> Self {
        Self::spawn(true, budget).await
    }

    async fn spawn(answering: bool, budget: usize) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let answering = Arc::new(AtomicBool::new(answering));
        let reply_budget = Arc::new(AtomicUsize::new(budget));
        let received: Arc<Mutex<Vec<Bytes>>> = Arc::new(Mutex::new(Vec::new()));

        let answering_task = Arc::clone(&answering);
        let budget_task = Arc::clone(&reply_budget);
        let received_task = Arc::clone(&received);
        tokio::spawn(async move {
            let mut buf = [0u8; 1024];
            loop {
                let (len, peer) = match socket.recv_from(&mut buf).await {
                    Ok(v) => v,
                    Err(_) => return,
                };
                let request = match ViscaPacket::from_bytes(&buf[..len]) {
                    Ok(p) => p,
                    Err(_) => continue,
                };
                received_task.lock().await.push(request.payload.clone());

                if !answering_task.load(Ordering::Relaxed) {
                    continue;
                }
                // Only inquiries get replies
                if request.payload.len() < 5 || request.payload[1] != 0x09 {
                    continue;
                }
                let Some(body) = inquiry_reply(request.payload[3]) else {
                    continue;
                };
                let spent = budget_task
                    .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |b| b.checked_sub(1))
                    .is_ok();
                if !spent {
                    continue;
                }
                let reply = ViscaPacket::command(request.sequence, body);
                let _ = socket.send_to(&reply.to_bytes(), peer).await;
            }
        });

        Self {
            addr,
            answering,
            reply_budget,
            received,
        }
    }

    /// Flip whether the camera answers inquiries
    pub fn set_answering(&self, on: bool) {
        self.answering.store(on, Ordering::Relaxed);
    }

    /// Every VISCA payload received so far, in arrival order
    pub async fn received_payloads(&self) -> Vec<Bytes> {
        self.received.lock().await.clone()
    }
}

/// Reply bodies for the inquiry set the core issues
fn inquiry_reply(command: u8) -> Option<Vec<u8>> {
    Some(match command {
        0x38 => vec![0x90, 0x50, 0x02, 0xFF],                         // focus: auto
        0x39 => vec![0x90, 0x50, 0x00, 0xFF],                         // exposure: auto
        0x35 => vec![0x90, 0x50, 0x02, 0xFF],                         // WB: outdoor
        0x33 => vec![0x90, 0x50, 0x03, 0xFF],                         // backlight: off
        0x4B => vec![0x90, 0x50, 0x00, 0x00, 0x00, 0x08, 0xFF],       // iris 8
        0x4A => vec![0x90, 0x50, 0x00, 0x00, 0x01, 0x00, 0xFF],       // shutter 16
        0x4C => vec![0x90, 0x50, 0x00, 0x00, 0x00, 0x03, 0xFF],       // gain 3
        0x4D => vec![0x90, 0x50, 0x00, 0x00, 0x01, 0x04, 0xFF],       // brightness 20
        0x43 => vec![0x90, 0x50, 0x00, 0x00, 0x08, 0x00, 0xFF],       // red gain 128
        0x44 => vec![0x90, 0x50, 0x00, 0x00, 0x07, 0x0F, 0xFF],       // blue gain 127
        _ => return None,
    })
}

/// Poll/release/close accounting shared between a transport and its test
#[derive(Debug, Default)]
pub struct StreamStats {
    pub polled: AtomicUsize,
    pub released: AtomicUsize,
    pub closed: AtomicUsize,
}

impl StreamStats {
    pub fn polled(&self) -> usize {
        self.polled.load(Ordering::Relaxed)
    }
    pub fn released(&self) -> usize {
        self.released.load(Ordering::Relaxed)
    }
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::Relaxed)
    }
}

/// Transport whose first opened stream serves a scripted frame sequence
pub struct ScriptedTransport {
    frames: Mutex<Option<VecDeque<TransportFrame>>>,
    pub stats: Arc<StreamStats>,
}

impl ScriptedTransport {
    pub fn new(frames: Vec<TransportFrame>) -> Self {
        Self {
            frames: Mutex::new(Some(frames.into())),
            stats: Arc::new(StreamStats::default()),
        }
    }
}

#[async_trait]
impl VideoTransport for ScriptedTransport {
    async fn enumerate(&self) -> Result<Vec<SourceDescriptor>> {
        Ok(Vec::new())
    }

    async fn open(
        &self,
        _source: &SourceDescriptor,
        _bandwidth: Bandwidth,
        _layout: PixelLayout,
    ) -> Result<Box<dyn StreamHandle>> {
        // A second open (worker restart) gets an empty, silent stream
        let frames = self.frames.lock().await.take().unwrap_or_default();
        Ok(Box::new(ScriptedHandle {
            frames,
            stats: Arc::clone(&self.stats),
        }))
    }
}

struct ScriptedHandle {
    frames: VecDeque<TransportFrame>,
    stats: Arc<StreamStats>,
}

#[async_trait]
impl StreamHandle for ScriptedHandle {
    async fn poll(&mut self, timeout: Duration) -> Result<Option<TransportFrame>> {
        match self.frames.pop_front() {
            Some(frame) => {
                self.stats.polled.fetch_add(1, Ordering::Relaxed);
                Ok(Some(frame))
            }
            None => {
                tokio::time::sleep(timeout).await;
                Ok(None)
            }
        }
    }

    async fn release(&mut self, _frame: TransportFrame) {
        self.stats.released.fetch_add(1, Ordering::Relaxed);
    }

    async fn close(&mut self) {
        self.stats.closed.fetch_add(1, Ordering::Relaxed);
    }
}

/// A well-formed 4x2 UYVY video frame
pub fn video_frame(stamp: i64) -> TransportFrame {
    TransportFrame {
        kind: FrameKind::Video,
        width: 4,
        height: 2,
        layout: PixelLayout::Uyvy422,
        timestamp_us: stamp,
        data: Bytes::from(vec![128u8; 4 * 2 * 2]),
    }
}

/// A video frame whose buffer size disagrees with its dimensions
pub fn malformed_video_frame(stamp: i64) -> TransportFrame {
    TransportFrame {
        kind: FrameKind::Video,
        width: 4,
        height: 2,
        layout: PixelLayout::Uyvy422,
        timestamp_us: stamp,
        data: Bytes::from_static(&[1, 2, 3]),
    }
}

pub fn audio_frame(stamp: i64) -> TransportFrame {
    TransportFrame {
        kind: FrameKind::Audio,
        width: 0,
        height: 0,
        layout: PixelLayout::Uyvy422,
        timestamp_us: stamp,
        data: Bytes::from(vec![0u8; 64]),
    }
}

pub fn metadata_frame(stamp: i64) -> TransportFrame {
    TransportFrame {
        kind: FrameKind::Metadata,
        width: 0,
        height: 0,
        layout: PixelLayout::Uyvy422,
        timestamp_us: stamp,
        data: Bytes::from_static(b"<meta/>"),
    }
}
