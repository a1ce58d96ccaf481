//! Testing utilities for CrabScan
//!
//! Provides in-memory capabilities so the session can be exercised offline,
//! plus a small harness wiring them into a [`ScanSession`].

pub mod fakes;

pub use fakes::{
    FakeMediaDevices, FakeStream, FakeStreamProvider, FakeTrack, RecordingSink, ScriptedDecoder,
    TrackProfile,
};

use crate::config::ScannerConfig;
use crate::session::{Capabilities, ScanSession};
use crate::types::{Device, ScanSnapshot};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// A session wired to fakes, with the fakes kept at hand for assertions.
pub struct Harness {
    pub session: ScanSession,
    pub devices: Arc<FakeMediaDevices>,
    pub provider: Arc<FakeStreamProvider>,
    pub sink: Arc<RecordingSink>,
    pub decoder: Arc<ScriptedDecoder>,
}

impl Harness {
    pub fn new(devices: Vec<Device>, profile: TrackProfile) -> Self {
        Self::with_config(ScannerConfig::default(), FakeMediaDevices::new(devices), profile)
    }

    pub fn with_config(
        config: ScannerConfig,
        devices: FakeMediaDevices,
        profile: TrackProfile,
    ) -> Self {
        let devices = Arc::new(devices);
        let provider = Arc::new(FakeStreamProvider::new(profile));
        let sink = Arc::new(RecordingSink::new());
        let decoder = Arc::new(ScriptedDecoder::new());

        let session = ScanSession::new(
            config,
            Capabilities {
                devices: devices.clone(),
                streams: provider.clone(),
                sink: sink.clone(),
                decoder: decoder.clone(),
            },
        );

        Self {
            session,
            devices,
            provider,
            sink,
            decoder,
        }
    }
}

/// Two cameras, `cam-1` and `cam-2`.
pub fn two_cameras() -> Vec<Device> {
    vec![
        Device::new("cam-1", "Front Camera"),
        Device::new("cam-2", "Back Camera"),
    ]
}

/// Let spawned tasks (decode loop, guards) run to quiescence.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

/// Wait until a published snapshot satisfies `predicate`.
///
/// Returns `None` if it does not happen within `timeout`.
pub async fn wait_for<F>(
    updates: &mut watch::Receiver<ScanSnapshot>,
    timeout: Duration,
    mut predicate: F,
) -> Option<ScanSnapshot>
where
    F: FnMut(&ScanSnapshot) -> bool,
{
    let waited = tokio::time::timeout(timeout, updates.wait_for(|s| predicate(s))).await;
    match waited {
        Ok(Ok(snapshot)) => Some(snapshot.clone()),
        _ => None,
    }
}
