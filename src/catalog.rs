//! Video-input device catalog
//!
//! Lists capture devices through the primary listing capability, falls back
//! to the generic enumeration (filtered to video inputs) when the primary
//! listing comes back empty, and tracks the selected device.

use crate::lock;
use crate::media::MediaDevices;
use crate::types::{Device, DeviceKind};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Message surfaced when the listing capability fails.
pub const CATALOG_ERROR_MESSAGE: &str = "Cannot access camera devices";

#[derive(Debug, Default)]
struct CatalogState {
    devices: Vec<Device>,
    selected: Option<String>,
    last_error: Option<String>,
}

pub struct DeviceCatalog {
    media: Arc<dyn MediaDevices>,
    state: Mutex<CatalogState>,
}

impl DeviceCatalog {
    pub fn new(media: Arc<dyn MediaDevices>) -> Self {
        Self {
            media,
            state: Mutex::new(CatalogState::default()),
        }
    }

    /// Re-list devices and update the catalog.
    ///
    /// Never fails: a listing error is logged, recorded as
    /// [`CATALOG_ERROR_MESSAGE`] and an empty list is returned while the
    /// previous list and selection are kept.
    pub async fn refresh(&self) -> Vec<Device> {
        let listed = match self.list().await {
            Ok(devices) => devices,
            Err(e) => {
                log::error!("Failed to list camera devices: {}", e);
                lock(&self.state).last_error = Some(CATALOG_ERROR_MESSAGE.to_string());
                return Vec::new();
            }
        };

        let devices = dedup_by_id(listed);

        let mut state = lock(&self.state);
        let keep_selection = state
            .selected
            .as_ref()
            .is_some_and(|id| devices.iter().any(|d| &d.id == id));
        if !keep_selection {
            if let Some(previous) = state.selected.take() {
                log::info!("Selected camera {} is no longer listed", previous);
            }
            state.selected = devices.first().map(|d| d.id.clone());
        }
        state.devices = devices.clone();
        state.last_error = None;

        log::debug!(
            "Camera catalog refreshed: {} device(s), selected {:?}",
            devices.len(),
            state.selected
        );
        devices
    }

    async fn list(&self) -> Result<Vec<Device>, crate::errors::DeviceError> {
        let primary = self.media.list_video_inputs().await?;
        if !primary.is_empty() {
            return Ok(primary);
        }

        match self.media.enumerate_devices().await {
            Some(all) => {
                let video: Vec<Device> = all?
                    .into_iter()
                    .filter(|d| d.kind == DeviceKind::VideoInput)
                    .map(Device::from)
                    .collect();
                log::debug!(
                    "Primary camera listing empty, fallback enumeration found {}",
                    video.len()
                );
                Ok(video)
            }
            None => Ok(primary),
        }
    }

    pub fn devices(&self) -> Vec<Device> {
        lock(&self.state).devices.clone()
    }

    pub fn selected(&self) -> Option<String> {
        lock(&self.state).selected.clone()
    }

    /// Set the selected device id. Not validated against the list: the
    /// platform may know devices the last refresh did not see yet.
    pub fn select(&self, device_id: Option<String>) {
        lock(&self.state).selected = device_id.filter(|id| !id.is_empty());
    }

    pub fn last_error(&self) -> Option<String> {
        lock(&self.state).last_error.clone()
    }
}

fn dedup_by_id(devices: Vec<Device>) -> Vec<Device> {
    let mut seen = HashSet::new();
    devices
        .into_iter()
        .filter(|d| seen.insert(d.id.clone()))
        .collect()
}
