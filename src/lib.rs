//! ptz-control-core
//!
//! PTZ camera control core: VISCA-over-IP command/query protocol, per-camera
//! connection supervision, settings synchronization, preset slot management,
//! and a lossy one-slot video reception pipeline. Presentation is out of
//! scope; a UI layer consumes this crate through [`CameraManager`].
//!
//! ### Modules
//!
//! - `protocol`: VISCA-over-IP envelope, payload builders, quirks, UDP client
//! - `connection`: per-camera lifecycle state machine with stall watchdog
//! - `settings`: device settings synchronization snapshots
//! - `presets`: preset slot registry (lowest-free allocation)
//! - `video`: transport seam, reception worker, conversion, scopes, delivery
//! - `manager`: the consuming-layer facade
//! - `config`: persisted per-camera configuration
//!
//! ## Example
//!
//! ```rust,ignore
//! use ptz_control_core::{CameraConfig, CameraManager};
//!
//! # async fn example(transport: std::sync::Arc<dyn ptz_control_core::VideoTransport>) -> ptz_control_core::Result<()> {
//! let manager = CameraManager::new(transport);
//! manager.register(CameraConfig::new("stage-left", "192.168.1.50")).await?;
//! manager.connect("stage-left").await?;
//!
//! let slot = manager.allocate_preset("stage-left").await?;
//! manager.store_preset("stage-left", slot).await?;
//! # Ok(())
//! # }
//! ```

// Re-export commonly used types
pub use config::{CameraConfig, ControlConfig};
pub use connection::{CameraConnection, ConnectionState};
pub use error::{CameraError, Result};
pub use manager::CameraManager;
pub use presets::{DeviceClass, PresetRegistry};
pub use protocol::{QuirkPolicy, ViscaClient, VISCA_DEFAULT_PORT};
pub use settings::DeviceStateSnapshot;
pub use video::{
    Bandwidth, FrameReceiver, PixelLayout, ScopeMode, SourceDescriptor, StreamHandle, VideoConfig,
    VideoFrame, VideoTransport,
};

// Public modules
pub mod config;
pub mod connection;
pub mod error;
pub mod manager;
pub mod presets;
pub mod protocol;
pub mod settings;
pub mod video;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
