//! Per-camera connection state machine
//!
//! One [`CameraConnection`] supervises one camera. It is the single writer
//! of that camera's [`ConnectionRecord`]: the watchdog task, the video
//! worker and the protocol client all report outcomes through its methods
//! and never touch the record directly.
//!
//! ## Connect sequence
//!
//! 1. `Idle`/`Failed` → `Connecting`, watchdog armed (15 s)
//! 2. Reachability probe: a focus-mode inquiry round-trip, up to 3 attempts
//! 3. Settings synchronization (partial results tolerated, empty is fatal)
//! 4. `Connecting` → `Connected`
//!
//! Any failure along the way lands in `Failed` with the reason recorded.
//! Commands are accepted only in `Connected`; everything else is rejected
//! with [`CameraError::NotConnected`] so callers can tell "camera
//! disconnected" apart from a command that reached the wire and failed.

use crate::error::{CameraError, Result};
use crate::protocol::client::ViscaClient;
use crate::protocol::command;
use crate::protocol::quirks::QuirkPolicy;
use crate::settings::{DeviceStateSnapshot, SettingsSync};
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Duration;
use tracing::{debug, info, warn};

use super::state::{ConnectionRecord, ConnectionState};

/// How long `Connecting` may last before the watchdog forces `Failed`
pub const WATCHDOG_TIMEOUT: Duration = Duration::from_secs(15);

/// Reachability probe attempts per connect
pub const MAX_PROBE_ATTEMPTS: u32 = 3;

/// Supervised connection to a single camera
pub struct CameraConnection {
    name: String,
    client: Arc<ViscaClient>,
    record: Arc<Mutex<ConnectionRecord>>,
    settings: SettingsSync,
}

impl CameraConnection {
    /// Create a connection in `Idle` for the given endpoint
    pub async fn new(name: impl Into<String>, addr: SocketAddr, quirks: QuirkPolicy) -> Result<Self> {
        let client = Arc::new(ViscaClient::new(addr, quirks).await?);
        Ok(Self {
            name: name.into(),
            client,
            record: Arc::new(Mutex::new(ConnectionRecord::default())),
            settings: SettingsSync::new(),
        })
    }

    /// Camera name used in logs
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle state
    pub async fn state(&self) -> ConnectionState {
        self.record.lock().await.state
    }

    /// Reason for the most recent failure, if any
    pub async fn last_error(&self) -> Option<String> {
        self.record.lock().await.last_error.clone()
    }

    /// The most recently synchronized settings snapshot
    pub async fn snapshot(&self) -> DeviceStateSnapshot {
        self.settings.snapshot().await
    }

    /// Drive the connection from `Idle` or `Failed` to `Connected`
    ///
    /// # Errors
    ///
    /// [`CameraError::AlreadyConnected`] when a connection is established or
    /// an attempt is already in progress; otherwise the error that moved the
    /// machine to `Failed`.
    pub async fn connect(&self) -> Result<()> {
        let generation = {
            let mut rec = self.record.lock().await;
            match rec.state {
                ConnectionState::Connected | ConnectionState::Connecting => {
                    return Err(CameraError::AlreadyConnected(self.name.clone()));
                }
                ConnectionState::Idle | ConnectionState::Failed => {}
            }
            rec.state = ConnectionState::Connecting;
            rec.last_error = None;
            rec.retry_count = 0;
            rec.generation += 1;
            rec.generation
        };
        info!(camera = %self.name, addr = %self.client.addr(), "connecting");
        self.spawn_watchdog(generation);

        match self.establish(generation).await {
            Ok(()) => {
                info!(camera = %self.name, "connected");
                Ok(())
            }
            Err(e) => {
                self.fail_if_generation(generation, &e).await;
                Err(e)
            }
        }
    }

    /// Explicit reconnect after failure
    ///
    /// Permitted only from `Failed`; use [`Self::connect`] from `Idle`.
    pub async fn reconnect(&self) -> Result<()> {
        let state = self.state().await;
        if state != ConnectionState::Failed {
            return Err(CameraError::invalid(format!(
                "reconnect requires failed state, camera '{}' is {state}",
                self.name
            )));
        }
        self.connect().await
    }

    /// Tear down to `Idle`; idempotent
    ///
    /// Sends a best-effort motion stop when the camera was being driven. The
    /// caller is responsible for stopping the video worker first.
    pub async fn disconnect(&self) {
        let was_driving = {
            let mut rec = self.record.lock().await;
            if rec.state == ConnectionState::Idle {
                return;
            }
            let driving = rec.driving;
            rec.state = ConnectionState::Idle;
            rec.last_error = None;
            rec.driving = false;
            rec.retry_count = 0;
            // Cancels any armed watchdog
            rec.generation += 1;
            driving
        };
        if was_driving {
            if let Err(e) = self.client.send(command::pan_tilt_stop()).await {
                warn!(camera = %self.name, error = %e, "motion stop on disconnect failed");
            }
        }
        self.settings.clear().await;
        info!(camera = %self.name, "disconnected");
    }

    /// Record a failure reported from the video worker or a command path
    ///
    /// Moves `Connecting`/`Connected` to `Failed`; no-op in other states.
    pub async fn fail(&self, reason: &CameraError) {
        let was_driving = {
            let mut rec = self.record.lock().await;
            match rec.state {
                ConnectionState::Connecting | ConnectionState::Connected => {}
                _ => return,
            }
            rec.state = ConnectionState::Failed;
            rec.last_error = Some(reason.to_string());
            let driving = rec.driving;
            rec.driving = false;
            rec.generation += 1;
            driving
        };
        warn!(camera = %self.name, error = %reason, "connection failed");
        if was_driving {
            let _ = self.client.send(command::pan_tilt_stop()).await;
        }
    }

    /// Error unless the connection is `Connected`
    pub async fn ensure_connected(&self) -> Result<()> {
        let state = self.state().await;
        if state.is_connected() {
            Ok(())
        } else {
            Err(CameraError::not_connected(format!(
                "camera '{}' is {state}",
                self.name
            )))
        }
    }

    /// Send a fire-and-forget command; requires `Connected`
    pub async fn send(&self, payload: Bytes) -> Result<()> {
        self.ensure_connected().await?;
        self.client.send(payload).await
    }

    /// Send a motion command and track whether the device is being driven
    ///
    /// `moving` is true for a motion start and false for its stop, so a
    /// later disconnect or failure knows whether a runaway-stop is needed.
    pub async fn send_motion(&self, payload: Bytes, moving: bool) -> Result<()> {
        self.ensure_connected().await?;
        self.client.send(payload).await?;
        self.record.lock().await.driving = moving;
        Ok(())
    }

    /// Send an inquiry and wait for its reply; requires `Connected`
    pub async fn query(&self, payload: Bytes) -> Result<Bytes> {
        self.ensure_connected().await?;
        self.client.query(payload).await
    }

    /// Re-run the settings batch and publish a fresh snapshot
    pub async fn refresh_settings(&self) -> Result<DeviceStateSnapshot> {
        self.ensure_connected().await?;
        Ok(self.settings.refresh(&self.client).await)
    }

    /// Probe, synchronize, then commit `Connected`
    async fn establish(&self, generation: u64) -> Result<()> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            {
                let mut rec = self.record.lock().await;
                if rec.generation != generation || rec.state != ConnectionState::Connecting {
                    return Err(CameraError::not_connected("connection attempt superseded"));
                }
                rec.retry_count = attempt;
            }
            match self.client.query_focus_mode().await {
                Ok(_) => break,
                Err(e) if e.is_transient() && attempt < MAX_PROBE_ATTEMPTS => {
                    debug!(camera = %self.name, attempt, error = %e, "reachability probe retry");
                }
                Err(e) => return Err(e),
            }
        }

        let snapshot = self.settings.refresh(&self.client).await;
        if snapshot.is_empty() {
            return Err(CameraError::Timeout);
        }

        let mut rec = self.record.lock().await;
        if rec.generation != generation || rec.state != ConnectionState::Connecting {
            return Err(CameraError::not_connected("connection attempt superseded"));
        }
        rec.state = ConnectionState::Connected;
        rec.last_error = None;
        Ok(())
    }

    /// Arm the stall watchdog for one connect attempt
    ///
    /// Fires after [`WATCHDOG_TIMEOUT`]; forces `Failed` only when the same
    /// attempt is still in `Connecting`.
    fn spawn_watchdog(&self, generation: u64) {
        let record = Arc::clone(&self.record);
        let name = self.name.clone();
        tokio::spawn(async move {
            tokio::time::sleep(WATCHDOG_TIMEOUT).await;
            let mut rec = record.lock().await;
            if rec.generation == generation && rec.state == ConnectionState::Connecting {
                rec.state = ConnectionState::Failed;
                rec.last_error = Some("connection watchdog expired".into());
                warn!(camera = %name, "watchdog forced failed state");
            }
        });
    }

    /// Move to `Failed` unless the attempt was superseded in the meantime
    async fn fail_if_generation(&self, generation: u64, reason: &CameraError) {
        let mut rec = self.record.lock().await;
        if rec.generation != generation {
            return;
        }
        if rec.state == ConnectionState::Connecting || rec.state == ConnectionState::Connected {
            rec.state = ConnectionState::Failed;
            rec.last_error = Some(reason.to_string());
            warn!(camera = %self.name, error = %reason, "connect failed");
        }
    }
}
