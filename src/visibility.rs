//! Stop scanning when the hosting application is backgrounded.

use crate::session::ScanSession;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Subscription to visibility changes, alive as long as the guard is.
///
/// Going hidden while scanning stops the session. Becoming visible again
/// does nothing; restarting is left to the caller.
pub struct VisibilityGuard {
    task: Option<JoinHandle<()>>,
}

impl VisibilityGuard {
    /// Must be called from within a Tokio runtime.
    pub fn attach(session: ScanSession, mut visibility: watch::Receiver<Visibility>) -> Self {
        let task = tokio::spawn(async move {
            while visibility.changed().await.is_ok() {
                let current = *visibility.borrow_and_update();
                if current == Visibility::Hidden && session.is_scanning() {
                    log::info!("Application hidden, stopping scan");
                    session.stop();
                }
            }
            log::debug!("Visibility source closed");
        });

        Self { task: Some(task) }
    }

    pub fn is_attached(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Unsubscribe. Also happens on drop.
    pub fn detach(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for VisibilityGuard {
    fn drop(&mut self) {
        self.detach();
    }
}
