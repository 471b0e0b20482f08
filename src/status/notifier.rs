// ABOUTME: Timer-driven visibility policy for the status overlay
// A status shows for a fixed window, then expires unless dismissed or replaced earlier

use super::store::{Status, StatusStore};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Default visible window.
pub const DEFAULT_DISPLAY_DURATION: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    Visible,
}

#[derive(Debug)]
struct NotifierState {
    visibility: Visibility,
    shown: Option<Status>,
    // At most one pending expiry
    timer: Option<JoinHandle<()>>,
}

#[derive(Debug)]
struct Shared {
    store: StatusStore,
    display_duration: Duration,
    state: Mutex<NotifierState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, NotifierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(self: &Arc<Self>, value: Option<Status>) {
        let mut state = self.lock();
        match value {
            Some(status) => {
                if state.shown.as_ref().map(|s| s.sequence) == Some(status.sequence) {
                    return;
                }
                if let Some(timer) = state.timer.take() {
                    timer.abort();
                }

                let sequence = status.sequence;
                debug!(sequence, "status visible for {:?}", self.display_duration);
                state.shown = Some(status);
                state.visibility = Visibility::Visible;

                let shared = Arc::clone(self);
                state.timer = Some(tokio::spawn(async move {
                    tokio::time::sleep(shared.display_duration).await;
                    shared.expire(sequence);
                }));
            }
            None => {
                if let Some(timer) = state.timer.take() {
                    timer.abort();
                }
                state.shown = None;
                state.visibility = Visibility::Hidden;
            }
        }
    }

    fn expire(&self, sequence: u64) {
        {
            let mut state = self.lock();
            if state.shown.as_ref().map(|s| s.sequence) != Some(sequence) {
                // Superseded while the timer was firing
                return;
            }
            state.shown = None;
            state.visibility = Visibility::Hidden;
            state.timer = None;
        }
        debug!(sequence, "status expired");
        self.store.clear_if(sequence);
    }
}

/// Watches a [`StatusStore`] and exposes what the overlay should show.
///
/// Must be created inside a tokio runtime. Dropping the notifier stops the
/// watcher and any pending expiry.
#[derive(Debug)]
pub struct StatusNotifier {
    shared: Arc<Shared>,
    watcher: JoinHandle<()>,
}

impl StatusNotifier {
    pub fn spawn(store: StatusStore, display_duration: Duration) -> Self {
        let shared = Arc::new(Shared {
            store: store.clone(),
            display_duration,
            state: Mutex::new(NotifierState {
                visibility: Visibility::Hidden,
                shown: None,
                timer: None,
            }),
        });

        let mut rx = store.subscribe();
        let watched = Arc::clone(&shared);
        let watcher = tokio::spawn(async move {
            loop {
                let value = rx.borrow_and_update().clone();
                watched.apply(value);
                if rx.changed().await.is_err() {
                    break;
                }
            }
        });

        Self { shared, watcher }
    }

    pub fn visibility(&self) -> Visibility {
        self.shared.lock().visibility
    }

    /// The status to render, or `None` while hidden.
    pub fn visible(&self) -> Option<Status> {
        let state = self.shared.lock();
        match state.visibility {
            Visibility::Visible => state.shown.clone(),
            Visibility::Hidden => None,
        }
    }

    /// Hides the overlay now and cancels the pending expiry. The store is
    /// cleared only if it still holds the dismissed status; a newer one that
    /// has not been shown yet survives.
    pub fn dismiss(&self) {
        let dismissed = {
            let mut state = self.shared.lock();
            if let Some(timer) = state.timer.take() {
                timer.abort();
            }
            state.visibility = Visibility::Hidden;
            state.shown.take()
        };
        if let Some(status) = dismissed {
            debug!(sequence = status.sequence, "status dismissed");
            self.shared.store.clear_if(status.sequence);
        }
    }

    pub fn display_duration(&self) -> Duration {
        self.shared.display_duration
    }

    pub fn store(&self) -> &StatusStore {
        &self.shared.store
    }
}

impl Drop for StatusNotifier {
    fn drop(&mut self) {
        self.watcher.abort();
        if let Some(timer) = self.shared.lock().timer.take() {
            timer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::store::{StatusCode, StatusKind};
    use tokio::time::sleep;

    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    fn notifier() -> (StatusStore, StatusNotifier) {
        let store = StatusStore::new();
        let notifier = StatusNotifier::spawn(store.clone(), DEFAULT_DISPLAY_DURATION);
        (store, notifier)
    }

    #[tokio::test(start_paused = true)]
    async fn test_starts_hidden() {
        let (_store, notifier) = notifier();
        settle().await;
        assert_eq!(notifier.visibility(), Visibility::Hidden);
        assert!(notifier.visible().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_expires_after_window() {
        let (store, notifier) = notifier();
        settle().await;

        store.report_success("Successfully loaded 5 guarantors", Some(200.into()));
        settle().await;
        assert_eq!(notifier.visibility(), Visibility::Visible);
        let shown = notifier.visible().unwrap();
        assert_eq!(shown.kind, StatusKind::Success);
        assert_eq!(shown.message, "Successfully loaded 5 guarantors");

        sleep(Duration::from_millis(4_900)).await;
        assert_eq!(notifier.visibility(), Visibility::Visible);
        assert!(store.current().is_some());

        sleep(Duration::from_millis(200)).await;
        assert_eq!(notifier.visibility(), Visibility::Hidden);
        assert!(notifier.visible().is_none());
        assert!(store.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_replacement_restarts_window() {
        let (store, notifier) = notifier();
        settle().await;

        store.report_info("first", None);
        settle().await;
        sleep(Duration::from_secs(3)).await;

        store.report_error(
            "Failed to fetch loans. Make sure the backend is running.",
            Some(StatusCode::NetworkError),
        );
        settle().await;

        // Past the first status' deadline: the old timer must not fire
        sleep(Duration::from_secs(3)).await;
        let shown = notifier.visible().unwrap();
        assert_eq!(shown.kind, StatusKind::Error);
        assert_eq!(shown.code, Some(StatusCode::NetworkError));

        sleep(Duration::from_millis(2_100)).await;
        assert_eq!(notifier.visibility(), Visibility::Hidden);
        assert!(store.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_cancels_expiry() {
        let (store, notifier) = notifier();
        settle().await;

        store.report_success("Loan deleted successfully", Some(200.into()));
        settle().await;
        assert_eq!(notifier.visibility(), Visibility::Visible);

        notifier.dismiss();
        assert_eq!(notifier.visibility(), Visibility::Hidden);
        assert!(store.current().is_none());

        // A status reported right after the dismissal gets its own full window
        sleep(Duration::from_secs(2)).await;
        store.report_info("Found 1 loans with status: PENDING", Some(200.into()));
        settle().await;
        sleep(Duration::from_millis(4_000)).await;
        assert_eq!(notifier.visibility(), Visibility::Visible);
        assert_eq!(
            notifier.visible().map(|s| s.message),
            Some("Found 1 loans with status: PENDING".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_keeps_unseen_status() {
        let (store, notifier) = notifier();
        settle().await;

        store.report_success("Loan created successfully", Some(201.into()));
        settle().await;

        // Reported after the watcher last ran, so never on screen yet
        store.report_error("Failed to fetch loans", Some(StatusCode::NetworkError));
        notifier.dismiss();
        assert_eq!(
            store.current().map(|s| s.message),
            Some("Failed to fetch loans".to_string())
        );

        settle().await;
        assert_eq!(notifier.visibility(), Visibility::Visible);
        assert_eq!(
            notifier.visible().map(|s| s.message),
            Some("Failed to fetch loans".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_when_hidden_is_noop() {
        let (store, notifier) = notifier();
        settle().await;
        notifier.dismiss();
        assert_eq!(notifier.visibility(), Visibility::Hidden);
        assert!(store.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_external_clear_hides() {
        let (store, notifier) = notifier();
        settle().await;

        store.report_info("Showing page 1 of 2", Some(200.into()));
        settle().await;
        store.clear();
        settle().await;
        assert_eq!(notifier.visibility(), Visibility::Hidden);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_present_before_spawn_is_shown() {
        let store = StatusStore::new();
        store.report_error("Failed to save loan", Some(StatusCode::Http(400)));
        let notifier = StatusNotifier::spawn(store.clone(), Duration::from_secs(1));
        settle().await;

        assert_eq!(notifier.visibility(), Visibility::Visible);
        sleep(Duration::from_millis(1_100)).await;
        assert_eq!(notifier.visibility(), Visibility::Hidden);
        assert!(store.current().is_none());
    }
}
