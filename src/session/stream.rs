use crate::errors::DeviceError;
use crate::lock;
use crate::media::{MediaStream, StreamProvider, VideoSink};
use crate::types::Constraints;
use std::sync::{Arc, Mutex};

/// Owner of the single active media stream.
pub struct StreamController {
    provider: Arc<dyn StreamProvider>,
    sink: Arc<dyn VideoSink>,
    active: Mutex<Option<Arc<dyn MediaStream>>>,
}

impl StreamController {
    pub fn new(provider: Arc<dyn StreamProvider>, sink: Arc<dyn VideoSink>) -> Self {
        Self {
            provider,
            sink,
            active: Mutex::new(None),
        }
    }

    /// Open a stream for `constraints`, attach it to the sink and make it the
    /// active stream. Any previously active stream is released first.
    pub async fn acquire(
        &self,
        constraints: &Constraints,
    ) -> Result<Arc<dyn MediaStream>, DeviceError> {
        self.release();
        let stream = self.open(constraints).await?;
        self.install(stream.clone());
        Ok(stream)
    }

    /// Open a stream without making it active.
    ///
    /// The caller either hands it to [`StreamController::install`] or, when
    /// the stream is no longer wanted, to [`StreamController::discard`].
    pub async fn open(
        &self,
        constraints: &Constraints,
    ) -> Result<Arc<dyn MediaStream>, DeviceError> {
        log::debug!("Opening camera stream with {:?}", constraints);
        self.provider.open_stream(constraints).await
    }

    /// Make `stream` the active stream and attach it to the sink.
    pub fn install(&self, stream: Arc<dyn MediaStream>) {
        let displaced = lock(&self.active).replace(stream.clone());
        if let Some(displaced) = displaced {
            log::warn!("Stream {} displaced by stream {}", displaced.id(), stream.id());
            stop_tracks(displaced.as_ref());
        }
        self.sink.attach(stream.clone());

        log::info!("Camera stream {} acquired", stream.id());
    }

    /// Stop the tracks of a stream that never became active.
    ///
    /// Leaves the active stream and the sink untouched.
    pub fn discard(&self, stream: &dyn MediaStream) {
        stop_tracks(stream);
        log::info!("Camera stream {} discarded", stream.id());
    }

    /// Stop every track of the active stream and detach the sink.
    ///
    /// Returns `false` when there was nothing to release.
    pub fn release(&self) -> bool {
        let Some(stream) = lock(&self.active).take() else {
            return false;
        };

        stop_tracks(stream.as_ref());
        self.sink.detach();
        log::info!("Camera stream {} released", stream.id());
        true
    }

    /// Release `stream` only if it is still the active one.
    ///
    /// Used for a run abandoned mid-acquisition, whose stream may already
    /// have been displaced by a newer run.
    pub fn release_stream(&self, stream: &dyn MediaStream) -> bool {
        let is_active = lock(&self.active)
            .as_ref()
            .is_some_and(|active| active.id() == stream.id());
        is_active && self.release()
    }

    pub fn active(&self) -> Option<Arc<dyn MediaStream>> {
        lock(&self.active).clone()
    }

    pub fn is_active(&self) -> bool {
        lock(&self.active).is_some()
    }

    pub fn sink(&self) -> Arc<dyn VideoSink> {
        self.sink.clone()
    }
}

fn stop_tracks(stream: &dyn MediaStream) {
    for track in stream.video_tracks() {
        track.stop();
    }
}
