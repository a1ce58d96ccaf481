//! Value types shared by the catalog, stream, torch and session modules.

use crate::classify::ErrorCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A video-input device as listed by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub label: String,
}

impl Device {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }

    /// Label suitable for a device picker.
    ///
    /// Labels stay empty until camera permission has been granted, so fall
    /// back to a positional name (1-based).
    pub fn display_label(&self, index: usize) -> String {
        let label = self.label.trim();
        if label.is_empty() {
            format!("Camera {}", index + 1)
        } else {
            label.to_string()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceKind {
    VideoInput,
    AudioInput,
    AudioOutput,
}

/// Record produced by the generic (all kinds) device enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDeviceInfo {
    pub id: String,
    pub label: String,
    pub kind: DeviceKind,
}

impl MediaDeviceInfo {
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
        }
    }
}

impl From<MediaDeviceInfo> for Device {
    fn from(info: MediaDeviceInfo) -> Self {
        Device {
            id: info.id,
            label: info.label,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    Environment,
    User,
}

impl FacingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacingMode::Environment => "environment",
            FacingMode::User => "user",
        }
    }
}

/// Stream request built once per `start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Constraints {
    /// Exact device id to pin, when a device is selected.
    pub device_id: Option<String>,
    /// Preferred camera direction, used only without a device id.
    pub facing_mode: Option<FacingMode>,
    pub target_width: u32,
    pub target_height: u32,
}

impl Constraints {
    /// Build constraints for the current selection.
    ///
    /// A selected device is pinned exactly; otherwise the preferred facing
    /// direction is requested. Both carry the same resolution hint.
    pub fn for_selection(
        selected_device_id: Option<&str>,
        facing_mode: FacingMode,
        target_width: u32,
        target_height: u32,
    ) -> Self {
        match selected_device_id.filter(|id| !id.is_empty()) {
            Some(id) => Self {
                device_id: Some(id.to_string()),
                facing_mode: None,
                target_width,
                target_height,
            },
            None => Self {
                device_id: None,
                facing_mode: Some(facing_mode),
                target_width,
                target_height,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BarcodeFormat {
    QrCode,
    DataMatrix,
    Aztec,
    Pdf417,
    Code128,
    Ean13,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Idle,
    Scanning,
    Stopped,
    Error,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Scanning => "scanning",
            SessionState::Stopped => "stopped",
            SessionState::Error => "error",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TorchCapability {
    pub supported: bool,
    pub on: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    pub text: String,
    pub scanned_at: DateTime<Utc>,
}

impl ScanResult {
    pub fn from_payload(payload: &str) -> Self {
        Self {
            text: payload.trim().to_string(),
            scanned_at: Utc::now(),
        }
    }
}

/// Everything the hosting UI observes about a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanSnapshot {
    pub state: SessionState,
    pub scanning: bool,
    pub devices: Vec<Device>,
    pub selected_device_id: Option<String>,
    pub result_text: Option<String>,
    pub error_message: Option<String>,
    pub error_category: Option<ErrorCategory>,
    pub catalog_error: Option<String>,
    pub torch_supported: bool,
    pub torch_on: bool,
}

impl Default for ScanSnapshot {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
            scanning: false,
            devices: Vec::new(),
            selected_device_id: None,
            result_text: None,
            error_message: None,
            error_category: None,
            catalog_error: None,
            torch_supported: false,
            torch_on: false,
        }
    }
}
