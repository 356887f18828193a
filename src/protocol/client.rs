//! VISCA-over-IP protocol client
//!
//! One client owns one UDP socket per camera endpoint. Two modes of
//! operation:
//!
//! - [`ViscaClient::send`] — fire-and-forget: returns once the datagram is
//!   handed to the network stack, never waits for a reply.
//! - [`ViscaClient::query`] — blocks the calling task until a reply with a
//!   matching sequence number arrives or the fixed 1 second timeout elapses.
//!
//! Replies are correlated by sequence number through a background reader
//! task; a reply bearing an unknown or stale sequence number is discarded
//! rather than misattributed. The client holds no device-lifecycle state and
//! never retries on its own.

use crate::error::{CameraError, Result};
use crate::protocol::command::{self, ExposureMode, FocusMode, WhiteBalanceMode};
use crate::protocol::packet::ViscaPacket;
use crate::protocol::quirks::{self, QuirkPolicy};
use bytes::Bytes;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

/// Fixed query timeout; not configurable per call
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(1);

/// Sequence numbers wrap before reaching this value
pub const SEQUENCE_WRAP: u32 = 99_999_990;

type PendingMap = Arc<Mutex<HashMap<u32, oneshot::Sender<Bytes>>>>;

/// VISCA protocol client for a single camera endpoint
pub struct ViscaClient {
    addr: SocketAddr,
    socket: Arc<UdpSocket>,
    sequence: AtomicU32,
    pending: PendingMap,
    quirks: QuirkPolicy,
    reader: JoinHandle<()>,
}

impl ViscaClient {
    /// Create a client for the given endpoint address
    ///
    /// Binds an ephemeral local UDP socket and spawns the reply reader task.
    pub async fn new(addr: SocketAddr, quirks: QuirkPolicy) -> Result<Self> {
        let socket = Arc::new(UdpSocket::bind("0.0.0.0:0").await?);
        socket.connect(addr).await?;
        debug!(%addr, "VISCA client socket bound");

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let reader = tokio::spawn(Self::read_replies(
            Arc::clone(&socket),
            Arc::clone(&pending),
            addr,
        ));

        Ok(Self {
            addr,
            socket,
            sequence: AtomicU32::new(0),
            pending,
            quirks,
            reader,
        })
    }

    /// The endpoint address this client talks to
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Allocate the next sequence number, atomically, wrapping before
    /// [`SEQUENCE_WRAP`]
    fn next_sequence(&self) -> u32 {
        self.sequence
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |s| {
                Some((s + 1) % SEQUENCE_WRAP)
            })
            .unwrap_or(0)
    }

    /// Send a VISCA command without waiting for a reply
    ///
    /// Returns once the datagram is handed to the network stack.
    pub async fn send(&self, payload: Bytes) -> Result<()> {
        let seq = self.next_sequence();
        let packet = ViscaPacket::command(seq, payload);
        self.socket
            .send(&packet.to_bytes())
            .await
            .map_err(|e| CameraError::send_failed(e.to_string()))?;
        debug!(addr = %self.addr, seq, "command sent");
        Ok(())
    }

    /// Send a VISCA inquiry and wait for the correlated reply body
    ///
    /// The returned bytes are the VISCA reply with the 8-byte envelope
    /// already stripped.
    ///
    /// # Errors
    ///
    /// [`CameraError::Timeout`] when no matching reply arrives within
    /// [`QUERY_TIMEOUT`]; [`CameraError::SendFailed`] when the datagram
    /// cannot be sent.
    pub async fn query(&self, payload: Bytes) -> Result<Bytes> {
        let seq = self.next_sequence();
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(seq, tx);

        let packet = ViscaPacket::command(seq, payload);
        if let Err(e) = self.socket.send(&packet.to_bytes()).await {
            self.pending.lock().await.remove(&seq);
            return Err(CameraError::send_failed(e.to_string()));
        }

        match timeout(QUERY_TIMEOUT, rx).await {
            Ok(Ok(body)) => Ok(body),
            // Sender dropped: reader task is gone
            Ok(Err(_)) => Err(CameraError::protocol("reply channel closed")),
            Err(_) => {
                // Deregister so a late reply is discarded, not misattributed
                self.pending.lock().await.remove(&seq);
                warn!(addr = %self.addr, seq, "query timed out");
                Err(CameraError::Timeout)
            }
        }
    }

    /// Background task: parse incoming datagrams and route reply bodies to
    /// the pending query with the matching sequence number
    async fn read_replies(socket: Arc<UdpSocket>, pending: PendingMap, addr: SocketAddr) {
        let mut buf = [0u8; 1024];
        loop {
            let len = match socket.recv(&mut buf).await {
                Ok(len) => len,
                Err(e) => {
                    warn!(%addr, error = %e, "VISCA reply socket error");
                    break;
                }
            };

            let packet = match ViscaPacket::from_bytes(&buf[..len]) {
                Ok(packet) => packet,
                Err(e) => {
                    debug!(%addr, error = %e, "discarding malformed reply");
                    continue;
                }
            };

            match pending.lock().await.remove(&packet.sequence) {
                Some(tx) => {
                    // Waiter may have just timed out; nothing left to do
                    let _ = tx.send(packet.payload);
                }
                None => {
                    debug!(%addr, seq = packet.sequence, "discarding stale reply");
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Typed inquiries
    // -----------------------------------------------------------------------

    /// Query the current focus mode
    pub async fn query_focus_mode(&self) -> Result<FocusMode> {
        let body = self.query(command::inq_focus_mode()).await?;
        command::parse_focus_mode_reply(&body)
    }

    /// Query the current exposure mode, normalizing vendor deviations
    pub async fn query_exposure_mode(&self) -> Result<ExposureMode> {
        let body = self.query(command::inq_exposure_mode()).await?;
        let raw = command::parse_value_reply(&body)?;
        quirks::normalize_exposure_mode(raw)
    }

    /// Query the current white balance mode, normalizing vendor deviations
    pub async fn query_white_balance_mode(&self) -> Result<WhiteBalanceMode> {
        let body = self.query(command::inq_white_balance_mode()).await?;
        let raw = command::parse_value_reply(&body)?;
        quirks::normalize_white_balance_mode(raw, &self.quirks)
    }

    /// Query the iris value (0–17)
    pub async fn query_iris(&self) -> Result<u16> {
        let body = self.query(command::inq_iris()).await?;
        command::parse_nibble_reply(&body)
    }

    /// Query the shutter value (0–21)
    pub async fn query_shutter(&self) -> Result<u16> {
        let body = self.query(command::inq_shutter()).await?;
        command::parse_nibble_reply(&body)
    }

    /// Query the gain value (0–15)
    pub async fn query_gain(&self) -> Result<u16> {
        let body = self.query(command::inq_gain()).await?;
        command::parse_nibble_reply(&body)
    }

    /// Query the brightness value (0–41)
    pub async fn query_brightness(&self) -> Result<u16> {
        let body = self.query(command::inq_brightness()).await?;
        command::parse_nibble_reply(&body)
    }

    /// Query the red gain value (0–255)
    pub async fn query_red_gain(&self) -> Result<u16> {
        let body = self.query(command::inq_red_gain()).await?;
        command::parse_nibble_reply(&body)
    }

    /// Query the blue gain value (0–255)
    pub async fn query_blue_gain(&self) -> Result<u16> {
        let body = self.query(command::inq_blue_gain()).await?;
        command::parse_nibble_reply(&body)
    }

    /// Query whether backlight compensation is enabled
    pub async fn query_backlight(&self) -> Result<bool> {
        let body = self.query(command::inq_backlight()).await?;
        command::parse_backlight_reply(&body)
    }
}

impl Drop for ViscaClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
