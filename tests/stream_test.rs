#[cfg(test)]
mod stream_tests {
    use crabscan::errors::DeviceError;
    use crabscan::media::MediaStream;
    use crabscan::session::StreamController;
    use crabscan::testing::{FakeStreamProvider, RecordingSink, TrackProfile};
    use crabscan::types::{Constraints, FacingMode};
    use std::sync::Arc;

    fn controller() -> (StreamController, Arc<FakeStreamProvider>, Arc<RecordingSink>) {
        let provider = Arc::new(FakeStreamProvider::new(TrackProfile::NoTorch));
        let sink = Arc::new(RecordingSink::new());
        (
            StreamController::new(provider.clone(), sink.clone()),
            provider,
            sink,
        )
    }

    fn constraints() -> Constraints {
        Constraints::for_selection(Some("cam-1"), FacingMode::Environment, 640, 480)
    }

    #[tokio::test]
    async fn test_acquire_attaches_sink() {
        let (streams, provider, sink) = controller();

        let stream = streams.acquire(&constraints()).await.unwrap();

        assert_eq!(stream.id(), "stream-1");
        assert!(streams.is_active());
        assert_eq!(sink.attached().as_deref(), Some("stream-1"));
        assert_eq!(provider.last_constraints(), Some(constraints()));
    }

    #[tokio::test]
    async fn test_acquire_releases_previous_stream() {
        let (streams, provider, sink) = controller();
        streams.acquire(&constraints()).await.unwrap();
        streams.acquire(&constraints()).await.unwrap();

        let opened = provider.opened();
        assert!(!opened[0].1.is_open());
        assert!(opened[1].1.is_open());
        assert_eq!(sink.attached().as_deref(), Some("stream-2"));
        assert_eq!(sink.detach_count(), 1);
    }

    #[tokio::test]
    async fn test_release_without_stream_is_noop() {
        let (streams, _, sink) = controller();
        assert!(!streams.release());
        assert!(!streams.release());
        assert_eq!(sink.detach_count(), 0);
    }

    #[tokio::test]
    async fn test_release_stops_tracks_once() {
        let (streams, provider, sink) = controller();
        streams.acquire(&constraints()).await.unwrap();

        assert!(streams.release());
        assert!(!streams.release());

        let stream = provider.last_stream().unwrap();
        assert_eq!(stream.tracks()[0].stop_count(), 1);
        assert_eq!(sink.attached(), None);
        assert!(streams.active().is_none());
    }

    #[tokio::test]
    async fn test_failed_acquire_leaves_nothing_active() {
        let (streams, provider, sink) = controller();
        provider.fail_with(Some(DeviceError::overconstrained("width")));

        let error = streams.acquire(&constraints()).await.err().unwrap();

        assert_eq!(error.name, DeviceError::OVERCONSTRAINED);
        assert!(!streams.is_active());
        assert_eq!(sink.attach_count(), 0);
    }

    #[tokio::test]
    async fn test_release_stream_ignores_displaced_stream() {
        let (streams, _, _) = controller();
        let first = streams.acquire(&constraints()).await.unwrap();
        let second = streams.acquire(&constraints()).await.unwrap();

        assert!(!streams.release_stream(first.as_ref()));
        assert!(streams.is_active());
        assert!(streams.release_stream(second.as_ref()));
        assert!(!streams.is_active());
    }

    #[tokio::test]
    async fn test_discard_leaves_active_stream_and_sink() {
        let (streams, _, sink) = controller();
        let active = streams.acquire(&constraints()).await.unwrap();
        let unwanted = streams.open(&constraints()).await.unwrap();

        streams.discard(unwanted.as_ref());

        assert_eq!(streams.active().unwrap().id(), active.id());
        assert_eq!(sink.attached().as_deref(), Some(active.id()));
        assert_eq!(sink.attach_count(), 1);
        assert_eq!(sink.detach_count(), 0);
    }
}
