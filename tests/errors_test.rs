#[cfg(test)]
mod error_tests {
    use crabscan::errors::{DeviceError, ScanError};
    use std::error::Error;

    #[test]
    fn test_device_error_constructors_set_kind() {
        assert_eq!(DeviceError::permission_denied("x").name, "NotAllowedError");
        assert_eq!(DeviceError::not_found("x").name, "NotFoundError");
        assert_eq!(DeviceError::not_readable("x").name, "NotReadableError");
        assert_eq!(DeviceError::overconstrained("x").name, "OverconstrainedError");
        assert_eq!(DeviceError::security("x").name, "SecurityError");
        assert_eq!(DeviceError::no_symbol().name, "NotFoundException");
    }

    #[test]
    fn test_device_error_display_trait() {
        let error = DeviceError::not_readable("Could not start video source");
        assert_eq!(
            format!("{}", error),
            "NotReadableError: Could not start video source"
        );
    }

    #[test]
    fn test_device_error_debug_format() {
        let error = DeviceError::security("Debug test");
        let debug_str = format!("{:?}", error);
        assert!(debug_str.contains("SecurityError"));
        assert!(debug_str.contains("Debug test"));
    }

    #[test]
    fn test_device_error_implements_error_trait() {
        let error = DeviceError::permission_denied("Error trait test");
        let _error_trait: &dyn Error = &error;
        assert!(error.source().is_none());
    }

    #[test]
    fn test_scan_error_wraps_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let error = ScanError::from(io);
        assert!(error.to_string().starts_with("IO error"));
        assert!(error.source().is_some());
    }

    #[test]
    fn test_scan_error_wraps_parse() {
        let parse = toml::from_str::<toml::Value>("= broken").unwrap_err();
        let error = ScanError::from(parse);
        assert!(error.to_string().contains("Failed to parse config file"));
    }
}
