//! Camera manager facade
//!
//! The single entry point the consuming layer talks to. One
//! [`CameraManager`] owns every registered camera: its connection state
//! machine, preset registry, frame slot, and (while video is enabled) its
//! reception worker. Every operation is per camera; a failure on one camera
//! never blocks another.

use crate::config::CameraConfig;
use crate::connection::{CameraConnection, ConnectionState};
use crate::error::{CameraError, Result};
use crate::presets::PresetRegistry;
use crate::protocol::command::{self, PanTiltDirection};
use crate::settings::DeviceStateSnapshot;
use crate::video::delivery::{FrameReceiver, FrameSlot};
use crate::video::receiver::{VideoConfig, VideoWorker};
use crate::video::transport::{SourceDescriptor, VideoTransport};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

/// Everything the manager holds for one camera
struct ManagedCamera {
    connection: Arc<CameraConnection>,
    presets: Mutex<PresetRegistry>,
    /// Persisted video preference from registration, if any
    video: Option<VideoConfig>,
    slot: FrameSlot,
    frames: FrameReceiver,
    worker: Mutex<Option<VideoWorker>>,
}

/// Facade over all registered cameras
pub struct CameraManager {
    transport: Arc<dyn VideoTransport>,
    cameras: RwLock<HashMap<String, Arc<ManagedCamera>>>,
}

impl CameraManager {
    /// Create a manager over the given video transport
    pub fn new(transport: Arc<dyn VideoTransport>) -> Self {
        Self {
            transport,
            cameras: RwLock::new(HashMap::new()),
        }
    }

    /// Register a camera from persisted configuration; starts in `Idle`
    ///
    /// # Errors
    ///
    /// [`CameraError::AlreadyConnected`] when the name is taken;
    /// [`CameraError::InvalidArgument`] when persisted preset slots exceed
    /// the device range.
    pub async fn register(&self, config: CameraConfig) -> Result<()> {
        let mut cameras = self.cameras.write().await;
        if cameras.contains_key(&config.name) {
            return Err(CameraError::AlreadyConnected(config.name));
        }

        let addr = config.resolve_addr().await?;
        let connection =
            Arc::new(CameraConnection::new(config.name.clone(), addr, config.quirks).await?);
        let presets =
            PresetRegistry::with_slots(config.device_class, config.presets.iter().copied())?;
        let (slot, frames) = FrameSlot::new();

        info!(camera = %config.name, %addr, "camera registered");
        cameras.insert(
            config.name,
            Arc::new(ManagedCamera {
                connection,
                presets: Mutex::new(presets),
                video: config.video,
                slot,
                frames,
                worker: Mutex::new(None),
            }),
        );
        Ok(())
    }

    /// Remove a camera entirely, stopping video and disconnecting first
    pub async fn remove(&self, name: &str) -> Result<()> {
        let camera = {
            let mut cameras = self.cameras.write().await;
            cameras
                .remove(name)
                .ok_or_else(|| CameraError::not_found(format!("camera '{name}'")))?
        };
        Self::teardown(&camera).await;
        info!(camera = %name, "camera removed");
        Ok(())
    }

    /// Registered camera names
    pub async fn names(&self) -> Vec<String> {
        self.cameras.read().await.keys().cloned().collect()
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Connect a registered camera (probe + settings sync)
    pub async fn connect(&self, name: &str) -> Result<()> {
        self.camera(name).await?.connection.connect().await
    }

    /// Disconnect: stop video, best-effort motion stop, back to `Idle`
    pub async fn disconnect(&self, name: &str) -> Result<()> {
        let camera = self.camera(name).await?;
        Self::teardown(&camera).await;
        Ok(())
    }

    /// Explicit reconnect after failure
    pub async fn reconnect(&self, name: &str) -> Result<()> {
        self.camera(name).await?.connection.reconnect().await
    }

    pub async fn state(&self, name: &str) -> Result<ConnectionState> {
        Ok(self.camera(name).await?.connection.state().await)
    }

    pub async fn last_error(&self, name: &str) -> Result<Option<String>> {
        Ok(self.camera(name).await?.connection.last_error().await)
    }

    pub async fn snapshot(&self, name: &str) -> Result<DeviceStateSnapshot> {
        Ok(self.camera(name).await?.connection.snapshot().await)
    }

    /// Re-run the settings batch for a connected camera
    pub async fn refresh_settings(&self, name: &str) -> Result<DeviceStateSnapshot> {
        self.camera(name).await?.connection.refresh_settings().await
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Fire-and-forget raw command; requires `Connected`
    pub async fn send(&self, name: &str, payload: Bytes) -> Result<()> {
        self.camera(name).await?.connection.send(payload).await
    }

    /// Raw inquiry; blocks up to the query timeout
    pub async fn query(&self, name: &str, payload: Bytes) -> Result<Bytes> {
        self.camera(name).await?.connection.query(payload).await
    }

    /// Start pan/tilt motion; speeds are 0.0–1.0 per axis
    pub async fn pan_tilt(
        &self,
        name: &str,
        direction: PanTiltDirection,
        pan_speed: f32,
        tilt_speed: f32,
    ) -> Result<()> {
        self.camera(name)
            .await?
            .connection
            .send_motion(command::pan_tilt(direction, pan_speed, tilt_speed), true)
            .await
    }

    /// Stop pan/tilt motion
    pub async fn pan_tilt_stop(&self, name: &str) -> Result<()> {
        self.camera(name)
            .await?
            .connection
            .send_motion(command::pan_tilt_stop(), false)
            .await
    }

    pub async fn zoom_in(&self, name: &str, speed: f32) -> Result<()> {
        self.camera(name)
            .await?
            .connection
            .send_motion(command::zoom_in(speed), true)
            .await
    }

    pub async fn zoom_out(&self, name: &str, speed: f32) -> Result<()> {
        self.camera(name)
            .await?
            .connection
            .send_motion(command::zoom_out(speed), true)
            .await
    }

    pub async fn zoom_stop(&self, name: &str) -> Result<()> {
        self.camera(name)
            .await?
            .connection
            .send_motion(command::zoom_stop(), false)
            .await
    }

    // -----------------------------------------------------------------------
    // Presets
    // -----------------------------------------------------------------------

    /// Allocate the lowest free preset slot
    pub async fn allocate_preset(&self, name: &str) -> Result<u8> {
        self.camera(name).await?.presets.lock().await.allocate()
    }

    /// Return a preset slot to the free pool
    pub async fn free_preset(&self, name: &str, slot: u8) -> Result<()> {
        self.camera(name).await?.presets.lock().await.free(slot)
    }

    /// Store the current position into an allocated slot; fire-and-forget
    pub async fn store_preset(&self, name: &str, slot: u8) -> Result<()> {
        let camera = self.camera(name).await?;
        Self::ensure_allocated(&camera, slot).await?;
        camera.connection.send(command::store_preset(slot)).await
    }

    /// Recall an allocated slot; fire-and-forget
    pub async fn recall_preset(&self, name: &str, slot: u8) -> Result<()> {
        let camera = self.camera(name).await?;
        Self::ensure_allocated(&camera, slot).await?;
        camera.connection.send(command::recall_preset(slot)).await
    }

    /// Allocated slots in ascending order, for persistence
    pub async fn preset_slots(&self, name: &str) -> Result<Vec<u8>> {
        Ok(self.camera(name).await?.presets.lock().await.slots())
    }

    // -----------------------------------------------------------------------
    // Video
    // -----------------------------------------------------------------------

    /// Start (or restart) the reception worker for a connected camera
    ///
    /// With `None` the persisted video preference from registration is used;
    /// an explicit config overrides it for this session. A worker that later
    /// dies fatally moves the camera to `Failed`.
    pub async fn start_video(&self, name: &str, config: Option<VideoConfig>) -> Result<()> {
        let camera = self.camera(name).await?;
        let config = config.or_else(|| camera.video.clone()).ok_or_else(|| {
            CameraError::invalid(format!("camera '{name}' has no video configuration"))
        })?;
        camera.connection.ensure_connected().await?;

        let mut worker = camera.worker.lock().await;
        if let Some(previous) = worker.take() {
            previous.stop().await;
        }

        let (spawned, fatal_rx) = VideoWorker::spawn(
            name,
            Arc::clone(&self.transport),
            config,
            camera.slot.clone(),
        );
        *worker = Some(spawned);

        // Escalate a fatal worker error into a lifecycle transition
        let connection = Arc::clone(&camera.connection);
        tokio::spawn(async move {
            if let Ok(error) = fatal_rx.await {
                connection.fail(&error).await;
            }
        });
        Ok(())
    }

    /// Stop the reception worker; idempotent, returns once it has exited
    pub async fn stop_video(&self, name: &str) -> Result<()> {
        let camera = self.camera(name).await?;
        Self::stop_worker(&camera).await;
        Ok(())
    }

    /// Consumer handle for the camera's frame slot
    pub async fn frames(&self, name: &str) -> Result<FrameReceiver> {
        Ok(self.camera(name).await?.frames.clone())
    }

    /// Video sources currently visible to the transport
    ///
    /// Cameras on restrictive networks can skip discovery entirely by
    /// configuring a literal source name instead.
    pub async fn enumerate_sources(&self) -> Result<Vec<SourceDescriptor>> {
        self.transport.enumerate().await
    }

    // -----------------------------------------------------------------------

    async fn camera(&self, name: &str) -> Result<Arc<ManagedCamera>> {
        self.cameras
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| CameraError::not_found(format!("camera '{name}'")))
    }

    async fn ensure_allocated(camera: &ManagedCamera, slot: u8) -> Result<()> {
        let presets = camera.presets.lock().await;
        presets.validate(slot)?;
        if !presets.is_allocated(slot) {
            return Err(CameraError::not_found(format!(
                "preset slot {slot} is not allocated"
            )));
        }
        Ok(())
    }

    async fn stop_worker(camera: &ManagedCamera) {
        let mut worker = camera.worker.lock().await;
        if let Some(running) = worker.take() {
            running.stop().await;
            camera.slot.clear();
        }
    }

    /// Video down first, then the connection, so the stream never outlives
    /// the lifecycle state
    async fn teardown(camera: &ManagedCamera) {
        Self::stop_worker(camera).await;
        camera.connection.disconnect().await;
    }
}
