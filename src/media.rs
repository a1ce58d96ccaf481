//! Capability interfaces consumed by the session.
//!
//! The platform (browser bridge, native camera stack, or the in-memory fakes
//! in [`crate::testing`]) implements these traits; nothing in this crate
//! talks to hardware directly.

use crate::errors::DeviceError;
use crate::types::{BarcodeFormat, Constraints, Device, MediaDeviceInfo};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Device enumeration.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Primary listing of video-input devices.
    async fn list_video_inputs(&self) -> Result<Vec<Device>, DeviceError>;

    /// Generic enumeration of every media device.
    ///
    /// `None` means the platform does not offer it.
    async fn enumerate_devices(&self) -> Option<Result<Vec<MediaDeviceInfo>, DeviceError>> {
        None
    }
}

#[async_trait]
pub trait StreamProvider: Send + Sync {
    async fn open_stream(
        &self,
        constraints: &Constraints,
    ) -> Result<Arc<dyn MediaStream>, DeviceError>;
}

pub trait MediaStream: Send + Sync {
    fn id(&self) -> &str;
    fn video_tracks(&self) -> Vec<Arc<dyn VideoTrack>>;
}

/// Capabilities reported by a video track.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackCapabilities {
    pub torch: bool,
}

/// Partial constraint set applied to a live track.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackConstraints {
    pub advanced: Vec<AdvancedConstraint>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvancedConstraint {
    pub torch: Option<bool>,
}

impl TrackConstraints {
    pub fn torch(on: bool) -> Self {
        Self {
            advanced: vec![AdvancedConstraint { torch: Some(on) }],
        }
    }
}

#[async_trait]
pub trait VideoTrack: Send + Sync {
    fn stop(&self);

    fn capabilities(&self) -> Result<TrackCapabilities, DeviceError>;

    async fn apply_constraints(&self, constraints: &TrackConstraints) -> Result<(), DeviceError>;
}

/// Where frames are rendered and read by the decoder.
pub trait VideoSink: Send + Sync {
    fn attach(&self, stream: Arc<dyn MediaStream>);
    fn detach(&self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeEvent {
    Decoded(String),
    Failed(DeviceError),
}

/// Cancellation handle for a running decode loop.
pub trait DecodeControls: Send + Sync {
    /// Permanently silence the loop. Must be idempotent.
    fn stop(&self);
}

/// A running decode loop: its event stream plus the handle that ends it.
pub struct DecodeLoop {
    pub events: mpsc::UnboundedReceiver<DecodeEvent>,
    pub controls: Box<dyn DecodeControls>,
}

impl std::fmt::Debug for DecodeLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeLoop").finish_non_exhaustive()
    }
}

pub trait Decoder: Send + Sync {
    /// Attach to `sink` and start producing one event per decode attempt.
    fn decode_continuously(
        &self,
        sink: Arc<dyn VideoSink>,
        constraints: &Constraints,
        formats: &[BarcodeFormat],
    ) -> DecodeLoop;
}
