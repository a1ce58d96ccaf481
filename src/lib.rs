//! CrabScan: live camera barcode/QR scanning session controller
//!
//! This crate drives a camera-based scanning session: it lists capture
//! devices, opens a stream under the chosen constraints, pumps decoder events
//! until a payload or a user-visible failure arrives, exposes torch control
//! when the track supports it, and tears everything down on stop, on
//! backgrounding, or on a device switch.
//!
//! Hardware and the decoding algorithm are reached through the capability
//! traits in [`media`]; the crate itself holds only the state machine and
//! resource lifecycle.
//!
//! # Usage
//! ```rust,ignore
//! use crabscan::{Capabilities, ScanSession, ScannerConfig};
//!
//! let session = ScanSession::new(ScannerConfig::load_or_default(), capabilities);
//! session.initialize();
//! session.start(Some("cam-2")).await;
//! let mut updates = session.subscribe();
//! while updates.changed().await.is_ok() {
//!     if let Some(text) = &updates.borrow().result_text {
//!         println!("scanned {text}");
//!     }
//! }
//! ```
pub mod catalog;
pub mod classify;
pub mod config;
pub mod errors;
pub mod links;
pub mod media;
pub mod session;
pub mod types;
pub mod visibility;

// Testing utilities - in-memory capabilities for offline testing
pub mod testing;

// Re-exports for convenience
pub use catalog::DeviceCatalog;
pub use classify::{classify, ErrorCategory};
pub use config::ScannerConfig;
pub use errors::{DeviceError, ScanError};
pub use links::is_link_like;
pub use session::{Capabilities, ScanSession};
pub use types::{
    BarcodeFormat, Constraints, Device, FacingMode, ScanResult, ScanSnapshot, SessionState,
    TorchCapability,
};
pub use visibility::{Visibility, VisibilityGuard};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Initialize logging for the scanner
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "crabscan=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}
