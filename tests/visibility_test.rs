#[cfg(test)]
mod visibility_tests {
    use crabscan::errors::DeviceError;
    use crabscan::testing::{settle, two_cameras, wait_for, Harness, TrackProfile};
    use crabscan::types::SessionState;
    use crabscan::visibility::{Visibility, VisibilityGuard};
    use std::time::Duration;
    use tokio::sync::watch;

    #[tokio::test]
    async fn test_hidden_while_scanning_stops_session() {
        let h = Harness::new(two_cameras(), TrackProfile::Torch);
        let (visibility, rx) = watch::channel(Visibility::Visible);
        let _guard = VisibilityGuard::attach(h.session.clone(), rx);
        let mut updates = h.session.subscribe();

        h.session.start(None).await;
        visibility.send(Visibility::Hidden).unwrap();

        let snapshot = wait_for(&mut updates, Duration::from_secs(2), |s| {
            s.state == SessionState::Stopped
        })
        .await
        .expect("hidden should stop the scan");

        assert!(!snapshot.torch_supported);
        assert_eq!(h.provider.live_count(), 0);
        assert!(!h.decoder.is_running());
    }

    #[tokio::test]
    async fn test_hidden_while_idle_has_no_effect() {
        let h = Harness::new(two_cameras(), TrackProfile::NoTorch);
        let (visibility, rx) = watch::channel(Visibility::Visible);
        let _guard = VisibilityGuard::attach(h.session.clone(), rx);

        visibility.send(Visibility::Hidden).unwrap();
        settle().await;

        assert_eq!(h.session.state(), SessionState::Idle);
        assert_eq!(h.sink.detach_count(), 0);
    }

    #[tokio::test]
    async fn test_hidden_after_error_keeps_error() {
        let h = Harness::new(two_cameras(), TrackProfile::NoTorch);
        let (visibility, rx) = watch::channel(Visibility::Visible);
        let _guard = VisibilityGuard::attach(h.session.clone(), rx);

        h.provider.fail_with(Some(DeviceError::permission_denied("")));
        h.session.start(None).await;
        visibility.send(Visibility::Hidden).unwrap();
        settle().await;

        assert_eq!(h.session.state(), SessionState::Error);
    }

    #[tokio::test]
    async fn test_visible_again_does_not_restart() {
        let h = Harness::new(two_cameras(), TrackProfile::NoTorch);
        let (visibility, rx) = watch::channel(Visibility::Visible);
        let _guard = VisibilityGuard::attach(h.session.clone(), rx);

        h.session.start(None).await;
        visibility.send(Visibility::Hidden).unwrap();
        settle().await;
        visibility.send(Visibility::Visible).unwrap();
        settle().await;

        assert_eq!(h.session.state(), SessionState::Stopped);
        assert_eq!(h.provider.open_count(), 1);
    }

    #[tokio::test]
    async fn test_detached_guard_no_longer_stops() {
        let h = Harness::new(two_cameras(), TrackProfile::NoTorch);
        let (visibility, rx) = watch::channel(Visibility::Visible);
        let mut guard = VisibilityGuard::attach(h.session.clone(), rx);
        settle().await;
        assert!(guard.is_attached());

        guard.detach();
        assert!(!guard.is_attached());
        settle().await;

        h.session.start(None).await;
        let _ = visibility.send(Visibility::Hidden);
        settle().await;

        assert_eq!(h.session.state(), SessionState::Scanning);
    }

    #[tokio::test]
    async fn test_dropped_guard_unsubscribes() {
        let h = Harness::new(two_cameras(), TrackProfile::NoTorch);
        let (visibility, rx) = watch::channel(Visibility::Visible);
        drop(VisibilityGuard::attach(h.session.clone(), rx));
        settle().await;

        h.session.start(None).await;
        let _ = visibility.send(Visibility::Hidden);
        settle().await;

        assert_eq!(h.session.state(), SessionState::Scanning);
    }
}
