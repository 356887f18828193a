//! Persisted per-camera configuration
//!
//! The consuming application stores one [`CameraConfig`] per camera and
//! hands them back at startup. The core only defines the serializable shape;
//! reading and writing the actual file belongs to the consuming layer.

use crate::error::{CameraError, Result};
use crate::presets::DeviceClass;
use crate::protocol::quirks::QuirkPolicy;
use crate::protocol::VISCA_DEFAULT_PORT;
use crate::video::receiver::VideoConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Everything the core needs to know about one camera across restarts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Unique camera name; also the manager lookup key
    pub name: String,
    /// Hostname or IP of the command endpoint
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub device_class: DeviceClass,
    #[serde(default)]
    pub quirks: QuirkPolicy,
    /// Preset slots in use, as last persisted
    #[serde(default)]
    pub presets: Vec<u8>,
    /// Video reception preferences; absent for control-only cameras
    #[serde(default)]
    pub video: Option<VideoConfig>,
}

fn default_port() -> u16 {
    VISCA_DEFAULT_PORT
}

impl CameraConfig {
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port: VISCA_DEFAULT_PORT,
            device_class: DeviceClass::default(),
            quirks: QuirkPolicy::default(),
            presets: Vec::new(),
            video: None,
        }
    }

    /// Resolve the command endpoint address
    ///
    /// Hostname lookups go through the async resolver, so a slow DNS server
    /// never stalls the runtime.
    pub async fn resolve_addr(&self) -> Result<SocketAddr> {
        tokio::net::lookup_host((self.host.as_str(), self.port))
            .await?
            .next()
            .ok_or_else(|| {
                CameraError::not_found(format!("host '{}' did not resolve", self.host))
            })
    }
}

/// Full persisted state: every configured camera
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlConfig {
    #[serde(default)]
    pub cameras: Vec<CameraConfig>,
}

impl ControlConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
