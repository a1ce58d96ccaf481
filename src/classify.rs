//! Mapping from raw capability errors to the user-visible categories.

use crate::errors::DeviceError;
use serde::Serialize;

/// User-visible failure categories. Anything outside this set is treated as
/// transient noise and never reaches the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCategory {
    PermissionDenied,
    DeviceNotFound,
    DeviceUnavailable,
    ConstraintsUnsupported,
    SecurityError,
}

impl ErrorCategory {
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCategory::PermissionDenied => {
                "Camera permission was denied. Allow camera access and try again."
            }
            ErrorCategory::DeviceNotFound => "No camera was found on this device.",
            ErrorCategory::DeviceUnavailable => {
                "The camera is already in use by another application."
            }
            ErrorCategory::ConstraintsUnsupported => {
                "The selected camera does not support the requested settings."
            }
            ErrorCategory::SecurityError => {
                "Camera access is blocked by the current security settings."
            }
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Classify a raw error by its kind identifier.
///
/// Returns `None` for anything that should not be shown to the user, which
/// includes every per-frame decode failure.
pub fn classify(error: &DeviceError) -> Option<ErrorCategory> {
    match error.name.as_str() {
        "NotAllowedError" | "PermissionDeniedError" => Some(ErrorCategory::PermissionDenied),
        "NotFoundError" | "DevicesNotFoundError" => Some(ErrorCategory::DeviceNotFound),
        "NotReadableError" | "TrackStartError" => Some(ErrorCategory::DeviceUnavailable),
        "OverconstrainedError" | "ConstraintNotSatisfiedError" => {
            Some(ErrorCategory::ConstraintsUnsupported)
        }
        "SecurityError" => Some(ErrorCategory::SecurityError),
        _ => None,
    }
}
