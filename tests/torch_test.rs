#[cfg(test)]
mod torch_tests {
    use crabscan::media::TrackConstraints;
    use crabscan::session::{TorchController, TorchHandle};
    use crabscan::testing::{settle, two_cameras, FakeStream, FakeTrack, Harness, TrackProfile};
    use crabscan::types::{SessionState, TorchCapability};
    use crabscan::errors::DeviceError;
    use std::sync::Arc;

    fn stream_with(track: FakeTrack) -> (FakeStream, Arc<FakeTrack>) {
        let track = Arc::new(track);
        (FakeStream::new("s", vec![track.clone()]), track)
    }

    #[test]
    fn test_probe_requires_torch_capability() {
        let (with_torch, _) = stream_with(FakeTrack::new(true));
        let (without_torch, _) = stream_with(FakeTrack::new(false));
        let (broken, _) = stream_with(FakeTrack::without_capabilities());
        let empty = FakeStream::new("empty", Vec::new());

        assert!(TorchHandle::probe(&with_torch).is_some());
        assert!(TorchHandle::probe(&without_torch).is_none());
        assert!(TorchHandle::probe(&broken).is_none());
        assert!(TorchHandle::probe(&empty).is_none());
    }

    #[tokio::test]
    async fn test_toggle_flips_and_applies_constraint() {
        let controller = TorchController::new();
        let (stream, track) = stream_with(FakeTrack::new(true));
        assert!(controller.detect(&stream));

        assert!(controller.toggle().await);
        assert_eq!(
            controller.capability(),
            TorchCapability { supported: true, on: true }
        );
        assert!(!controller.toggle().await);

        assert_eq!(
            track.applied(),
            vec![TrackConstraints::torch(true), TrackConstraints::torch(false)]
        );
    }

    #[tokio::test]
    async fn test_toggle_unsupported_is_noop() {
        let controller = TorchController::new();
        let (stream, track) = stream_with(FakeTrack::new(false));
        assert!(!controller.detect(&stream));

        assert!(!controller.toggle().await);
        assert_eq!(controller.capability(), TorchCapability::default());
        assert!(track.applied().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_failure_disables_torch() {
        let controller = TorchController::new();
        let (stream, track) = stream_with(FakeTrack::new(true));
        controller.detect(&stream);
        assert!(controller.toggle().await);

        track.fail_apply(true);
        assert!(!controller.toggle().await);
        assert_eq!(controller.capability(), TorchCapability::default());

        // Lost for good until the next detection
        track.fail_apply(false);
        assert!(!controller.toggle().await);
        assert_eq!(track.applied().len(), 1);
    }

    #[tokio::test]
    async fn test_losing_support_turns_torch_off() {
        let controller = TorchController::new();
        let (lit, _) = stream_with(FakeTrack::new(true));
        controller.detect(&lit);
        controller.toggle().await;

        let (dark, _) = stream_with(FakeTrack::new(false));
        assert!(!controller.detect(&dark));
        assert_eq!(controller.capability(), TorchCapability::default());
    }

    #[tokio::test]
    async fn test_session_detects_torch_on_start() {
        let h = Harness::new(two_cameras(), TrackProfile::Torch);
        h.session.start(None).await;

        let torch = h.session.torch();
        assert!(torch.supported);
        assert!(!torch.on);
        assert!(h.session.snapshot().torch_supported);
    }

    #[tokio::test]
    async fn test_session_without_capabilities_keeps_scanning() {
        let h = Harness::new(two_cameras(), TrackProfile::NoCapabilities);
        h.session.start(None).await;
        h.decoder.emit_error(DeviceError::no_symbol());
        settle().await;

        assert_eq!(h.session.state(), SessionState::Scanning);
        assert!(!h.session.torch().supported);
    }

    #[tokio::test]
    async fn test_session_without_tracks_reports_no_torch() {
        let h = Harness::new(two_cameras(), TrackProfile::NoTracks);
        h.session.start(None).await;
        assert!(!h.session.torch().supported);
        assert!(!h.session.toggle_torch().await);
    }

    #[tokio::test]
    async fn test_session_toggle_and_failure() {
        let h = Harness::new(two_cameras(), TrackProfile::Torch);
        h.session.start(None).await;

        assert!(h.session.toggle_torch().await);
        assert!(h.session.snapshot().torch_on);

        let stream = h.provider.last_stream().unwrap();
        stream.tracks()[0].fail_apply(true);
        assert!(!h.session.toggle_torch().await);

        let snapshot = h.session.snapshot();
        assert!(!snapshot.torch_on);
        assert!(!snapshot.torch_supported);
        assert_eq!(snapshot.state, SessionState::Scanning);
        assert_eq!(snapshot.error_message, None);
    }

    #[tokio::test]
    async fn test_restart_resets_torch() {
        let h = Harness::new(two_cameras(), TrackProfile::Torch);
        h.session.start(None).await;
        h.session.toggle_torch().await;

        h.session.stop();
        assert_eq!(h.session.torch(), TorchCapability::default());

        h.session.start(None).await;
        let torch = h.session.torch();
        assert!(torch.supported);
        assert!(!torch.on);
    }

    #[tokio::test]
    async fn test_torch_redetected_per_device() {
        let h = Harness::new(two_cameras(), TrackProfile::Torch);
        h.session.start(Some("cam-1")).await;
        assert!(h.session.torch().supported);

        h.provider.set_profile(TrackProfile::NoTorch);
        h.session.start(Some("cam-2")).await;
        assert!(!h.session.torch().supported);
    }
}
