//! Configuration management for CrabScan
//!
//! Provides loading, saving and validation of the stream hints, decoder
//! format allow-list and device-catalog refresh timing.

use crate::errors::ScanError;
use crate::types::{BarcodeFormat, FacingMode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerConfig {
    pub stream: StreamConfig,
    pub decoder: DecoderConfig,
    pub catalog: CatalogConfig,
}

/// Stream request hints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Target resolution width; kept modest to keep decode latency low
    pub target_width: u32,
    /// Target resolution height
    pub target_height: u32,
    /// Camera direction requested when no device is selected
    pub facing_mode: FacingMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Symbologies handed to the decoder
    pub formats: Vec<BarcodeFormat>,
}

/// Device catalog refresh timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Delay before the refresh scheduled on initialization, in milliseconds
    pub initial_refresh_delay_ms: u64,
    /// Delay before the refresh scheduled after each start, in milliseconds
    pub post_start_refresh_delay_ms: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            stream: StreamConfig {
                target_width: 640,
                target_height: 480,
                facing_mode: FacingMode::Environment,
            },
            decoder: DecoderConfig {
                formats: vec![BarcodeFormat::QrCode],
            },
            catalog: CatalogConfig {
                initial_refresh_delay_ms: 100,
                post_start_refresh_delay_ms: 500,
            },
        }
    }
}

impl CatalogConfig {
    pub fn initial_refresh_delay(&self) -> Duration {
        Duration::from_millis(self.initial_refresh_delay_ms)
    }

    pub fn post_start_refresh_delay(&self) -> Duration {
        Duration::from_millis(self.post_start_refresh_delay_ms)
    }
}

impl ScannerConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScanError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let config: ScannerConfig = toml::from_str(&contents)?;
        config.validate()?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ScanError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        fs::write(path, toml_string)?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("crabscan.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.stream.target_width == 0 || self.stream.target_height == 0 {
            return Err(ScanError::Config("Invalid target resolution".to_string()));
        }
        if self.stream.target_width > 7680 || self.stream.target_height > 4320 {
            return Err(ScanError::Config(
                "Target resolution must not exceed 7680x4320".to_string(),
            ));
        }
        if self.decoder.formats.is_empty() {
            return Err(ScanError::Config(
                "Decoder format list must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
