//! In-memory implementations of every media capability.
//!
//! They record what the session does to them (opened streams, stopped
//! tracks, applied constraints, decoder starts) so tests can assert on
//! resource lifecycle without a camera.

use crate::errors::DeviceError;
use crate::media::{
    DecodeControls, DecodeEvent, DecodeLoop, Decoder, MediaDevices, MediaStream, StreamProvider,
    TrackCapabilities, TrackConstraints, VideoSink, VideoTrack,
};
use crate::types::{BarcodeFormat, Constraints, Device, MediaDeviceInfo};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Notify};

use crate::lock;

/// Device listing backed by fixed lists.
pub struct FakeMediaDevices {
    primary: Mutex<Result<Vec<Device>, DeviceError>>,
    fallback: Mutex<Option<Result<Vec<MediaDeviceInfo>, DeviceError>>>,
    list_calls: AtomicUsize,
}

impl FakeMediaDevices {
    pub fn new(devices: Vec<Device>) -> Self {
        Self {
            primary: Mutex::new(Ok(devices)),
            fallback: Mutex::new(None),
            list_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_fallback(self, all: Vec<MediaDeviceInfo>) -> Self {
        *lock(&self.fallback) = Some(Ok(all));
        self
    }

    pub fn set_devices(&self, devices: Vec<Device>) {
        *lock(&self.primary) = Ok(devices);
    }

    pub fn fail_with(&self, error: DeviceError) {
        *lock(&self.primary) = Err(error);
    }

    pub fn fail_fallback_with(&self, error: DeviceError) {
        *lock(&self.fallback) = Some(Err(error));
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaDevices for FakeMediaDevices {
    async fn list_video_inputs(&self) -> Result<Vec<Device>, DeviceError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.primary).clone()
    }

    async fn enumerate_devices(&self) -> Option<Result<Vec<MediaDeviceInfo>, DeviceError>> {
        lock(&self.fallback).clone()
    }
}

pub struct FakeTrack {
    torch: bool,
    capabilities_error: bool,
    apply_fails: AtomicBool,
    stops: AtomicUsize,
    applied: Mutex<Vec<TrackConstraints>>,
}

impl FakeTrack {
    pub fn new(torch: bool) -> Self {
        Self {
            torch,
            capabilities_error: false,
            apply_fails: AtomicBool::new(false),
            stops: AtomicUsize::new(0),
            applied: Mutex::new(Vec::new()),
        }
    }

    /// A track whose capability probe itself errors.
    pub fn without_capabilities() -> Self {
        Self {
            capabilities_error: true,
            ..Self::new(false)
        }
    }

    pub fn fail_apply(&self, fail: bool) {
        self.apply_fails.store(fail, Ordering::SeqCst);
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_count() > 0
    }

    pub fn applied(&self) -> Vec<TrackConstraints> {
        lock(&self.applied).clone()
    }
}

#[async_trait]
impl VideoTrack for FakeTrack {
    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn capabilities(&self) -> Result<TrackCapabilities, DeviceError> {
        if self.capabilities_error {
            return Err(DeviceError::new("TypeError", "getCapabilities is not a function"));
        }
        Ok(TrackCapabilities { torch: self.torch })
    }

    async fn apply_constraints(&self, constraints: &TrackConstraints) -> Result<(), DeviceError> {
        if self.apply_fails.load(Ordering::SeqCst) {
            return Err(DeviceError::overconstrained("torch"));
        }
        lock(&self.applied).push(constraints.clone());
        Ok(())
    }
}

pub struct FakeStream {
    id: String,
    tracks: Vec<Arc<FakeTrack>>,
}

impl FakeStream {
    pub fn new(id: impl Into<String>, tracks: Vec<Arc<FakeTrack>>) -> Self {
        Self {
            id: id.into(),
            tracks,
        }
    }

    pub fn tracks(&self) -> &[Arc<FakeTrack>] {
        &self.tracks
    }

    /// Open means at least one track has not been stopped.
    pub fn is_open(&self) -> bool {
        self.tracks.iter().any(|t| !t.is_stopped())
    }
}

impl MediaStream for FakeStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn video_tracks(&self) -> Vec<Arc<dyn VideoTrack>> {
        self.tracks
            .iter()
            .map(|t| t.clone() as Arc<dyn VideoTrack>)
            .collect()
    }
}

/// How newly opened streams are shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackProfile {
    Torch,
    NoTorch,
    NoCapabilities,
    NoTracks,
}

pub struct FakeStreamProvider {
    profile: Mutex<TrackProfile>,
    failure: Mutex<Option<DeviceError>>,
    gate: Mutex<Option<Arc<Notify>>>,
    queued_gates: Mutex<VecDeque<Arc<Notify>>>,
    opened: Mutex<Vec<(Constraints, Arc<FakeStream>)>>,
}

impl FakeStreamProvider {
    pub fn new(profile: TrackProfile) -> Self {
        Self {
            profile: Mutex::new(profile),
            failure: Mutex::new(None),
            gate: Mutex::new(None),
            queued_gates: Mutex::new(VecDeque::new()),
            opened: Mutex::new(Vec::new()),
        }
    }

    pub fn set_profile(&self, profile: TrackProfile) {
        *lock(&self.profile) = profile;
    }

    /// Make every subsequent open fail with `error` (or succeed on `None`).
    pub fn fail_with(&self, error: Option<DeviceError>) {
        *lock(&self.failure) = error;
    }

    /// Hold every subsequent open until the returned `Notify` is signalled.
    pub fn hold_opens(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *lock(&self.gate) = Some(notify.clone());
        notify
    }

    /// Hold the next open that is not already gated until the returned
    /// `Notify` is signalled. Each call gates one more open, in call order,
    /// so tests can complete concurrent opens out of order.
    pub fn hold_next_open(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        lock(&self.queued_gates).push_back(notify.clone());
        notify
    }

    pub fn opened(&self) -> Vec<(Constraints, Arc<FakeStream>)> {
        lock(&self.opened).clone()
    }

    pub fn open_count(&self) -> usize {
        lock(&self.opened).len()
    }

    /// Streams with at least one live track.
    pub fn live_count(&self) -> usize {
        lock(&self.opened).iter().filter(|(_, s)| s.is_open()).count()
    }

    pub fn last_stream(&self) -> Option<Arc<FakeStream>> {
        lock(&self.opened).last().map(|(_, s)| s.clone())
    }

    pub fn last_constraints(&self) -> Option<Constraints> {
        lock(&self.opened).last().map(|(c, _)| c.clone())
    }
}

#[async_trait]
impl StreamProvider for FakeStreamProvider {
    async fn open_stream(
        &self,
        constraints: &Constraints,
    ) -> Result<Arc<dyn MediaStream>, DeviceError> {
        let queued = lock(&self.queued_gates).pop_front();
        let gate = queued.or_else(|| lock(&self.gate).clone());
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if let Some(error) = lock(&self.failure).clone() {
            return Err(error);
        }

        let tracks = match *lock(&self.profile) {
            TrackProfile::Torch => vec![Arc::new(FakeTrack::new(true))],
            TrackProfile::NoTorch => vec![Arc::new(FakeTrack::new(false))],
            TrackProfile::NoCapabilities => vec![Arc::new(FakeTrack::without_capabilities())],
            TrackProfile::NoTracks => Vec::new(),
        };

        let mut opened = lock(&self.opened);
        let stream = Arc::new(FakeStream::new(format!("stream-{}", opened.len() + 1), tracks));
        opened.push((constraints.clone(), stream.clone()));
        Ok(stream)
    }
}

/// Sink that remembers which stream it shows.
#[derive(Default)]
pub struct RecordingSink {
    attached: Mutex<Option<String>>,
    attaches: AtomicUsize,
    detaches: AtomicUsize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attached(&self) -> Option<String> {
        lock(&self.attached).clone()
    }

    pub fn attach_count(&self) -> usize {
        self.attaches.load(Ordering::SeqCst)
    }

    pub fn detach_count(&self) -> usize {
        self.detaches.load(Ordering::SeqCst)
    }
}

impl VideoSink for RecordingSink {
    fn attach(&self, stream: Arc<dyn MediaStream>) {
        self.attaches.fetch_add(1, Ordering::SeqCst);
        *lock(&self.attached) = Some(stream.id().to_string());
    }

    fn detach(&self) {
        self.detaches.fetch_add(1, Ordering::SeqCst);
        *lock(&self.attached) = None;
    }
}

type EventSlot = Arc<Mutex<Option<mpsc::UnboundedSender<DecodeEvent>>>>;

/// Decoder driven by the test: events are pushed with [`ScriptedDecoder::emit`].
#[derive(Default)]
pub struct ScriptedDecoder {
    current: EventSlot,
    script: Mutex<Vec<DecodeEvent>>,
    starts: AtomicUsize,
    stops: Arc<AtomicUsize>,
    formats: Mutex<Vec<BarcodeFormat>>,
}

impl ScriptedDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events delivered immediately by the next loop that starts.
    pub fn script(&self, events: Vec<DecodeEvent>) {
        *lock(&self.script) = events;
    }

    /// Push an event into the running loop. `false` once it has been stopped.
    pub fn emit(&self, event: DecodeEvent) -> bool {
        match lock(&self.current).as_ref() {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    pub fn emit_payload(&self, payload: &str) -> bool {
        self.emit(DecodeEvent::Decoded(payload.to_string()))
    }

    pub fn emit_error(&self, error: DeviceError) -> bool {
        self.emit(DecodeEvent::Failed(error))
    }

    pub fn is_running(&self) -> bool {
        lock(&self.current).is_some()
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn formats(&self) -> Vec<BarcodeFormat> {
        lock(&self.formats).clone()
    }
}

struct ScriptedControls {
    slot: EventSlot,
    sender: mpsc::UnboundedSender<DecodeEvent>,
    stops: Arc<AtomicUsize>,
}

impl DecodeControls for ScriptedControls {
    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        let mut slot = lock(&self.slot);
        if slot.as_ref().is_some_and(|tx| tx.same_channel(&self.sender)) {
            *slot = None;
        }
    }
}

impl Decoder for ScriptedDecoder {
    fn decode_continuously(
        &self,
        _sink: Arc<dyn VideoSink>,
        _constraints: &Constraints,
        formats: &[BarcodeFormat],
    ) -> DecodeLoop {
        self.starts.fetch_add(1, Ordering::SeqCst);
        *lock(&self.formats) = formats.to_vec();

        let (tx, rx) = mpsc::unbounded_channel();
        for event in lock(&self.script).drain(..) {
            let _ = tx.send(event);
        }
        *lock(&self.current) = Some(tx.clone());

        DecodeLoop {
            events: rx,
            controls: Box::new(ScriptedControls {
                slot: self.current.clone(),
                sender: tx,
                stops: self.stops.clone(),
            }),
        }
    }
}
