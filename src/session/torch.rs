use crate::errors::DeviceError;
use crate::lock;
use crate::media::{MediaStream, TrackConstraints, VideoTrack};
use crate::types::TorchCapability;
use std::sync::{Arc, Mutex};

/// A video track known to accept the torch constraint.
#[derive(Clone)]
pub struct TorchHandle {
    track: Arc<dyn VideoTrack>,
}

impl TorchHandle {
    /// Probe the first video track of `stream` for torch support.
    ///
    /// Missing tracks, unavailable capabilities and probe errors all count as
    /// "no torch".
    pub fn probe(stream: &dyn MediaStream) -> Option<Self> {
        let track = stream.video_tracks().into_iter().next()?;
        match track.capabilities() {
            Ok(caps) if caps.torch => Some(Self { track }),
            Ok(_) => None,
            Err(e) => {
                log::debug!("Torch capability probe failed on {}: {}", stream.id(), e);
                None
            }
        }
    }

    pub async fn set(&self, on: bool) -> Result<(), DeviceError> {
        self.track
            .apply_constraints(&TrackConstraints::torch(on))
            .await
    }
}

#[derive(Default)]
struct TorchState {
    capability: TorchCapability,
    handle: Option<TorchHandle>,
    // bumped on reset so an in-flight toggle cannot write into a new run
    epoch: u64,
}

#[derive(Default)]
pub struct TorchController {
    state: Mutex<TorchState>,
}

impl TorchController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute torch support for `stream`. Losing support forces `on` off.
    pub fn detect(&self, stream: &dyn MediaStream) -> bool {
        let handle = TorchHandle::probe(stream);
        let mut state = lock(&self.state);
        let supported = handle.is_some();
        state.capability.supported = supported;
        if !supported {
            state.capability.on = false;
        }
        state.handle = handle;
        supported
    }

    /// Flip the torch. Returns the resulting `on` flag.
    ///
    /// No-op when unsupported. A failed apply marks the torch as lost:
    /// both `supported` and `on` drop to false.
    pub async fn toggle(&self) -> bool {
        let (handle, desired, epoch) = {
            let state = lock(&self.state);
            match (&state.handle, state.capability.supported) {
                (Some(handle), true) => (handle.clone(), !state.capability.on, state.epoch),
                _ => return state.capability.on,
            }
        };

        let outcome = handle.set(desired).await;

        let mut state = lock(&self.state);
        if state.epoch != epoch {
            return state.capability.on;
        }
        match outcome {
            Ok(()) => {
                state.capability.on = desired;
                log::info!("Torch turned {}", if desired { "on" } else { "off" });
            }
            Err(e) => {
                log::warn!("Torch toggle failed, disabling torch: {}", e);
                state.capability = TorchCapability::default();
                state.handle = None;
            }
        }
        state.capability.on
    }

    pub fn reset(&self) {
        let mut state = lock(&self.state);
        state.capability = TorchCapability::default();
        state.handle = None;
        state.epoch = state.epoch.wrapping_add(1);
    }

    pub fn capability(&self) -> TorchCapability {
        lock(&self.state).capability
    }
}
