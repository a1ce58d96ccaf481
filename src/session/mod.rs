//! Scanning-session state machine
//!
//! `ScanSession` coordinates the device catalog, the stream controller, the
//! decoder event loop and torch detection. The lifecycle is
//! `Idle -> Scanning -> {Stopped | Error}`; only an explicit [`ScanSession::start`]
//! leaves `Stopped` or `Error`.
//!
//! Each start opens a new *run* identified by a generation number. The decode
//! loop task carries the generation of the run it was spawned for and drops
//! any event once that run is no longer current, so late events from a
//! released stream never reach the session state.

pub mod stream;
pub mod torch;

pub use stream::StreamController;
pub use torch::{TorchController, TorchHandle};

use crate::catalog::DeviceCatalog;
use crate::classify::{classify, ErrorCategory};
use crate::config::ScannerConfig;
use crate::errors::DeviceError;
use crate::lock;
use crate::media::{
    DecodeControls, DecodeEvent, DecodeLoop, Decoder, MediaDevices, StreamProvider, VideoSink,
};
use crate::types::{
    Constraints, Device, ScanResult, ScanSnapshot, SessionState, TorchCapability,
};
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Shown when stream acquisition fails with an error outside the known
/// categories.
pub const ACQUISITION_FAILED_MESSAGE: &str = "Unable to start the camera";

/// The platform capabilities a session is built on.
#[derive(Clone)]
pub struct Capabilities {
    pub devices: Arc<dyn MediaDevices>,
    pub streams: Arc<dyn StreamProvider>,
    pub sink: Arc<dyn VideoSink>,
    pub decoder: Arc<dyn Decoder>,
}

struct RunState {
    state: SessionState,
    generation: u64,
    run_id: Uuid,
    result: Option<ScanResult>,
    error_message: Option<String>,
    error_category: Option<ErrorCategory>,
    controls: Option<Box<dyn DecodeControls>>,
    cancel: Option<CancellationToken>,
}

impl RunState {
    fn new() -> Self {
        Self {
            state: SessionState::Idle,
            generation: 0,
            run_id: Uuid::nil(),
            result: None,
            error_message: None,
            error_category: None,
            controls: None,
            cancel: None,
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation == generation && self.state == SessionState::Scanning
    }

    /// Detach the loop handles so they can be stopped outside the lock.
    fn take_handles(&mut self) -> RunHandles {
        RunHandles {
            controls: self.controls.take(),
            cancel: self.cancel.take(),
        }
    }
}

struct RunHandles {
    controls: Option<Box<dyn DecodeControls>>,
    cancel: Option<CancellationToken>,
}

impl RunHandles {
    fn stop(self) {
        if let Some(controls) = self.controls {
            controls.stop();
        }
        if let Some(cancel) = self.cancel {
            cancel.cancel();
        }
    }
}

struct Inner {
    config: ScannerConfig,
    catalog: DeviceCatalog,
    streams: StreamController,
    torch: TorchController,
    decoder: Arc<dyn Decoder>,
    run: Mutex<RunState>,
    updates: watch::Sender<ScanSnapshot>,
}

/// Handle to a scanning session. Clones share the same session.
#[derive(Clone)]
pub struct ScanSession {
    inner: Arc<Inner>,
}

impl ScanSession {
    pub fn new(config: ScannerConfig, capabilities: Capabilities) -> Self {
        let (updates, _) = watch::channel(ScanSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                catalog: DeviceCatalog::new(capabilities.devices),
                streams: StreamController::new(capabilities.streams, capabilities.sink),
                torch: TorchController::new(),
                decoder: capabilities.decoder,
                run: Mutex::new(RunState::new()),
                updates,
                config,
            }),
        }
    }

    /// Schedule the initial device-catalog refresh.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn initialize(&self) {
        self.schedule_refresh(self.inner.config.catalog.initial_refresh_delay());
    }

    /// Start scanning with `device_id` pinned, or with the preferred facing
    /// direction when `None`.
    ///
    /// A running session is stopped first. Returns the state of this run
    /// once the stream is attached or acquisition has failed: `Stopped` when
    /// the run was stopped or superseded by a newer start before it got
    /// going, whatever state the newer run is in.
    pub async fn start(&self, device_id: Option<&str>) -> SessionState {
        let inner = &self.inner;

        if self.is_scanning() {
            log::info!("Restarting scan: stopping the current run first");
            self.stop();
        }
        if let Some(id) = device_id {
            inner.catalog.select(Some(id.to_string()));
        }

        let generation = {
            let mut run = lock(&inner.run);
            run.generation = run.generation.wrapping_add(1);
            run.state = SessionState::Scanning;
            run.run_id = Uuid::new_v4();
            run.result = None;
            run.error_message = None;
            run.error_category = None;
            run.cancel = Some(CancellationToken::new());
            log::info!("Scan run {} starting", run.run_id);
            run.generation
        };
        inner.torch.reset();
        inner.publish();

        let stream_config = &inner.config.stream;
        let constraints = Constraints::for_selection(
            device_id,
            stream_config.facing_mode,
            stream_config.target_width,
            stream_config.target_height,
        );

        self.schedule_refresh(inner.config.catalog.post_start_refresh_delay());

        let stream = match inner.streams.open(&constraints).await {
            Ok(stream) => stream,
            Err(e) => return inner.fail_acquisition(generation, &e),
        };

        {
            let run = lock(&inner.run);
            if !run.is_current(generation) {
                drop(run);
                log::info!("Scan run abandoned while the camera was opening");
                inner.streams.discard(stream.as_ref());
                return SessionState::Stopped;
            }
            inner.streams.install(stream.clone());
        }

        let DecodeLoop { events, controls } = inner.decoder.decode_continuously(
            inner.streams.sink(),
            &constraints,
            &inner.config.decoder.formats,
        );

        let cancel = {
            let mut run = lock(&inner.run);
            if run.is_current(generation) {
                run.controls = Some(controls);
                inner.torch.detect(stream.as_ref());
                run.cancel.clone()
            } else {
                drop(run);
                controls.stop();
                inner.streams.release_stream(stream.as_ref());
                return SessionState::Stopped;
            }
        };
        inner.publish();

        let cancel = cancel.unwrap_or_default();
        tokio::spawn(drive(Arc::downgrade(inner), generation, cancel, events));

        let run = lock(&inner.run);
        if run.generation == generation {
            run.state
        } else {
            SessionState::Stopped
        }
    }

    /// Start with the catalog's current selection.
    pub async fn start_selected(&self) -> SessionState {
        let selected = self.inner.catalog.selected();
        self.start(selected.as_deref()).await
    }

    /// Stop scanning and release the camera.
    ///
    /// Idempotent and callable from any state or from inside a decode
    /// event. Only a `Scanning` session changes state (to `Stopped`).
    pub fn stop(&self) {
        self.inner.stop();
    }

    /// Select another camera. A running scan is stopped, never restarted.
    pub fn on_device_change(&self, device_id: &str) {
        log::info!("Camera selection changed to {}", device_id);
        self.inner.catalog.select(Some(device_id.to_string()));
        if self.is_scanning() {
            self.inner.stop();
        } else {
            self.inner.publish();
        }
    }

    /// Toggle the torch. Returns whether it is on afterwards.
    pub async fn toggle_torch(&self) -> bool {
        let on = self.inner.torch.toggle().await;
        self.inner.publish();
        on
    }

    pub async fn refresh_devices(&self) -> Vec<Device> {
        let devices = self.inner.catalog.refresh().await;
        self.inner.publish();
        devices
    }

    pub fn clear_result(&self) {
        lock(&self.inner.run).result = None;
        self.inner.publish();
    }

    pub fn state(&self) -> SessionState {
        lock(&self.inner.run).state
    }

    pub fn is_scanning(&self) -> bool {
        self.state() == SessionState::Scanning
    }

    pub fn result(&self) -> Option<ScanResult> {
        lock(&self.inner.run).result.clone()
    }

    pub fn error_message(&self) -> Option<String> {
        lock(&self.inner.run).error_message.clone()
    }

    pub fn error_category(&self) -> Option<ErrorCategory> {
        lock(&self.inner.run).error_category
    }

    pub fn torch(&self) -> TorchCapability {
        self.inner.torch.capability()
    }

    pub fn devices(&self) -> Vec<Device> {
        self.inner.catalog.devices()
    }

    pub fn selected_device(&self) -> Option<String> {
        self.inner.catalog.selected()
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.inner.config
    }

    pub fn snapshot(&self) -> ScanSnapshot {
        self.inner.snapshot()
    }

    /// Receive a fresh snapshot after every observable change.
    pub fn subscribe(&self) -> watch::Receiver<ScanSnapshot> {
        self.inner.updates.subscribe()
    }

    fn schedule_refresh(&self, delay: Duration) {
        let inner = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(inner) = inner.upgrade() else {
                return;
            };
            inner.catalog.refresh().await;
            inner.publish();
        });
    }
}

impl Inner {
    fn stop(&self) {
        let (handles, was_scanning) = {
            let mut run = lock(&self.run);
            let was_scanning = run.state == SessionState::Scanning;
            if was_scanning {
                run.state = SessionState::Stopped;
            }
            (run.take_handles(), was_scanning)
        };

        handles.stop();
        let released = self.streams.release();
        self.torch.reset();

        if was_scanning || released {
            log::info!("Scan stopped");
            self.publish();
        }
    }

    fn fail_acquisition(&self, generation: u64, error: &DeviceError) -> SessionState {
        let category = classify(error);
        log::warn!("Failed to open camera stream: {} ({:?})", error, category);

        let handles = {
            let mut run = lock(&self.run);
            if !run.is_current(generation) {
                return SessionState::Stopped;
            }
            run.state = SessionState::Error;
            run.error_category = category;
            run.error_message = Some(
                category
                    .map(|c| c.message())
                    .unwrap_or(ACQUISITION_FAILED_MESSAGE)
                    .to_string(),
            );
            run.take_handles()
        };

        handles.stop();
        self.torch.reset();
        self.publish();
        SessionState::Error
    }

    fn handle_event(&self, generation: u64, event: DecodeEvent) -> ControlFlow<()> {
        let mut run = lock(&self.run);
        if !run.is_current(generation) {
            return ControlFlow::Break(());
        }

        if let Some(stream) = self.streams.active() {
            self.torch.detect(stream.as_ref());
        }

        match event {
            DecodeEvent::Decoded(payload) => {
                let result = ScanResult::from_payload(&payload);
                log::info!("Scan run {} decoded {} bytes", run.run_id, result.text.len());
                run.result = Some(result);
                run.state = SessionState::Stopped;
            }
            DecodeEvent::Failed(error) => match classify(&error) {
                Some(category) => {
                    log::warn!("Scan run {} failed: {}", run.run_id, error);
                    run.error_category = Some(category);
                    run.error_message = Some(category.message().to_string());
                    run.state = SessionState::Error;
                }
                None => {
                    log::trace!("Transient decode failure: {}", error);
                    drop(run);
                    self.publish();
                    return ControlFlow::Continue(());
                }
            },
        }

        let handles = run.take_handles();
        drop(run);

        handles.stop();
        self.streams.release();
        self.torch.reset();
        self.publish();
        ControlFlow::Break(())
    }

    fn snapshot(&self) -> ScanSnapshot {
        let run = lock(&self.run);
        let torch = self.torch.capability();
        ScanSnapshot {
            state: run.state,
            scanning: run.state == SessionState::Scanning,
            devices: self.catalog.devices(),
            selected_device_id: self.catalog.selected(),
            result_text: run.result.as_ref().map(|r| r.text.clone()),
            error_message: run.error_message.clone(),
            error_category: run.error_category,
            catalog_error: self.catalog.last_error(),
            torch_supported: torch.supported,
            torch_on: torch.on,
        }
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        self.updates.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let run = self
            .run
            .get_mut()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        run.take_handles().stop();
        self.streams.release();
    }
}

/// Pump decoder events into the session until the run ends.
async fn drive(
    inner: Weak<Inner>,
    generation: u64,
    cancel: CancellationToken,
    mut events: mpsc::UnboundedReceiver<DecodeEvent>,
) {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.recv() => event,
        };

        let Some(event) = event else {
            log::warn!("Decoder event stream closed without a result");
            break;
        };
        let Some(inner) = inner.upgrade() else {
            break;
        };
        if inner.handle_event(generation, event).is_break() {
            break;
        }
    }
}
