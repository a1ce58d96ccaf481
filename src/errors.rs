use std::fmt;

/// Raw error reported by a media capability (device listing, stream
/// acquisition, track constraints, or a single decode attempt).
///
/// `name` is the kind identifier the platform attaches to the failure
/// (`"NotAllowedError"`, `"NotFoundException"`, ...). It is what
/// [`crate::classify::classify`] inspects; `message` is free-form detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceError {
    pub name: String,
    pub message: String,
}

impl DeviceError {
    pub const NOT_ALLOWED: &'static str = "NotAllowedError";
    pub const NOT_FOUND: &'static str = "NotFoundError";
    pub const NOT_READABLE: &'static str = "NotReadableError";
    pub const OVERCONSTRAINED: &'static str = "OverconstrainedError";
    pub const SECURITY: &'static str = "SecurityError";
    /// Emitted by decoders for every frame without a readable symbol.
    pub const NO_SYMBOL: &'static str = "NotFoundException";

    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(Self::NOT_ALLOWED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Self::NOT_FOUND, message)
    }

    pub fn not_readable(message: impl Into<String>) -> Self {
        Self::new(Self::NOT_READABLE, message)
    }

    pub fn overconstrained(message: impl Into<String>) -> Self {
        Self::new(Self::OVERCONSTRAINED, message)
    }

    pub fn security(message: impl Into<String>) -> Self {
        Self::new(Self::SECURITY, message)
    }

    /// Transient "no symbol in this frame" failure.
    pub fn no_symbol() -> Self {
        Self::new(Self::NO_SYMBOL, "no barcode found in frame")
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}: {}", self.name, self.message)
        }
    }
}

impl std::error::Error for DeviceError {}

/// Crate-level errors for everything outside the live session
/// (configuration loading and validation).
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_name_and_message() {
        let error = DeviceError::permission_denied("user dismissed prompt");
        assert_eq!(error.to_string(), "NotAllowedError: user dismissed prompt");
    }

    #[test]
    fn test_display_without_message() {
        let error = DeviceError::new("SecurityError", "");
        assert_eq!(error.to_string(), "SecurityError");
    }

    #[test]
    fn test_scan_error_display() {
        let error = ScanError::Config("target width must be non-zero".to_string());
        assert_eq!(
            error.to_string(),
            "Configuration error: target width must be non-zero"
        );
    }
}
