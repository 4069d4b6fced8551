// Debounced auto-save task
use crate::application::dashboard_repository::DashboardRepository;
use crate::application::notifications::{NotificationHub, NotificationKind};
use crate::domain::layout::DashboardLayout;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};

pub const DEFAULT_QUIESCENCE_WINDOW: Duration = Duration::from_millis(2000);

/// Owns the single auto-save task of an editor session.
///
/// Snapshots go through a `watch` channel, so only the newest one is ever
/// pending. The task saves once the window passes without a newer snapshot.
/// Dropping the handle (or calling [`AutoSaveHandle::cancel`]) fires the
/// cancellation token: a pending save is dropped and a save already in
/// flight is abandoned without reporting its result.
pub struct AutoSaveHandle {
    snapshots: watch::Sender<Option<DashboardLayout>>,
    cancel: Option<oneshot::Sender<()>>,
}

impl AutoSaveHandle {
    pub fn spawn(
        window: Duration,
        repository: Arc<dyn DashboardRepository>,
        notifications: NotificationHub,
    ) -> Self {
        let (snapshots, rx) = watch::channel(None);
        let (cancel, cancelled) = oneshot::channel();
        tokio::spawn(run(window, rx, cancelled, repository, notifications));
        Self {
            snapshots,
            cancel: Some(cancel),
        }
    }

    /// Replaces any pending snapshot and restarts the quiescence window.
    pub fn schedule(&self, snapshot: DashboardLayout) {
        if self.snapshots.send(Some(snapshot)).is_err() {
            tracing::debug!("auto-save task already stopped; snapshot dropped");
        }
    }

    pub fn cancel(mut self) {
        self.fire_cancel();
    }

    fn fire_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }
}

impl Drop for AutoSaveHandle {
    fn drop(&mut self) {
        self.fire_cancel();
    }
}

async fn run(
    window: Duration,
    mut snapshots: watch::Receiver<Option<DashboardLayout>>,
    mut cancelled: oneshot::Receiver<()>,
    repository: Arc<dyn DashboardRepository>,
    notifications: NotificationHub,
) {
    loop {
        // Idle until the first mutation of a burst
        tokio::select! {
            _ = &mut cancelled => return,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    return;
                }
            }
        }

        // Each newer snapshot restarts the window
        loop {
            tokio::select! {
                _ = &mut cancelled => return,
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                _ = tokio::time::sleep(window) => break,
            }
        }

        let Some(layout) = snapshots.borrow_and_update().clone() else {
            continue;
        };

        tokio::select! {
            _ = &mut cancelled => {
                tracing::debug!(dashboard = %layout.id, "auto-save abandoned on cancel");
                return;
            }
            result = repository.auto_save_dashboard(&layout) => {
                match result {
                    Ok(()) => {
                        tracing::debug!(dashboard = %layout.id, version = layout.metadata.version, "auto-saved");
                        notifications.info(&layout.id, NotificationKind::Saved, "Dashboard auto-saved");
                    }
                    Err(e) => {
                        tracing::error!(dashboard = %layout.id, "auto-save failed: {:#}", e);
                        notifications.error(
                            &layout.id,
                            NotificationKind::PersistenceFailure,
                            format!("Auto-save failed: {}", e),
                        );
                    }
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::application::notifications::NotificationLevel;
    use crate::domain::layout::DashboardSummary;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Records saved versions; can be switched to fail every call.
    #[derive(Default)]
    pub(crate) struct RecordingRepository {
        pub saves: Mutex<Vec<u64>>,
        pub auto_saves: Mutex<Vec<u64>>,
        pub fail: AtomicBool,
    }

    impl RecordingRepository {
        pub fn failing() -> Self {
            let repo = Self::default();
            repo.fail.store(true, Ordering::SeqCst);
            repo
        }

        pub fn saved_versions(&self) -> Vec<u64> {
            self.saves.lock().unwrap().clone()
        }

        pub fn auto_saved_versions(&self) -> Vec<u64> {
            self.auto_saves.lock().unwrap().clone()
        }

        fn check(&self) -> anyhow::Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                anyhow::bail!("backend unavailable");
            }
            Ok(())
        }
    }

    #[async_trait]
    impl DashboardRepository for RecordingRepository {
        async fn list_dashboards(&self) -> anyhow::Result<Vec<DashboardSummary>> {
            Ok(Vec::new())
        }

        async fn load_dashboard(&self, _id: &str) -> anyhow::Result<Option<DashboardLayout>> {
            Ok(None)
        }

        async fn save_dashboard(&self, layout: &DashboardLayout) -> anyhow::Result<()> {
            self.check()?;
            self.saves.lock().unwrap().push(layout.metadata.version);
            Ok(())
        }

        async fn auto_save_dashboard(&self, layout: &DashboardLayout) -> anyhow::Result<()> {
            self.check()?;
            self.auto_saves.lock().unwrap().push(layout.metadata.version);
            Ok(())
        }

        async fn delete_dashboard(&self, _id: &str) -> anyhow::Result<bool> {
            Ok(false)
        }
    }

    fn window() -> Duration {
        Duration::from_secs(2)
    }

    #[tokio::test(start_paused = true)]
    async fn test_quick_mutations_coalesce_into_one_save() {
        let repo = Arc::new(RecordingRepository::default());
        let handle = AutoSaveHandle::spawn(window(), repo.clone(), NotificationHub::new());
        let mut layout = DashboardLayout::new("Coalesce");

        for _ in 0..3 {
            layout.touch();
            handle.schedule(layout.clone());
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        assert!(repo.auto_saved_versions().is_empty());

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(repo.auto_saved_versions(), vec![3]);
        assert!(repo.saved_versions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_save_separately() {
        let repo = Arc::new(RecordingRepository::default());
        let handle = AutoSaveHandle::spawn(window(), repo.clone(), NotificationHub::new());
        let mut layout = DashboardLayout::new("Bursts");

        layout.touch();
        handle.schedule(layout.clone());
        tokio::time::sleep(Duration::from_secs(3)).await;
        layout.touch();
        handle.schedule(layout.clone());
        tokio::time::sleep(Duration::from_secs(3)).await;

        assert_eq!(repo.auto_saved_versions(), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_save() {
        let repo = Arc::new(RecordingRepository::default());
        let handle = AutoSaveHandle::spawn(window(), repo.clone(), NotificationHub::new());
        let mut layout = DashboardLayout::new("Unmount");
        layout.touch();
        handle.schedule(layout);

        tokio::time::sleep(Duration::from_millis(500)).await;
        handle.cancel();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(repo.auto_saved_versions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_reported_not_raised() {
        let repo = Arc::new(RecordingRepository::failing());
        let hub = NotificationHub::new();
        let mut rx = hub.subscribe();
        let handle = AutoSaveHandle::spawn(window(), repo.clone(), hub);
        let mut layout = DashboardLayout::new("Offline");
        layout.touch();
        handle.schedule(layout.clone());

        tokio::time::sleep(Duration::from_secs(3)).await;

        let notification = rx.try_recv().unwrap();
        assert_eq!(notification.kind, NotificationKind::PersistenceFailure);
        assert_eq!(notification.level, NotificationLevel::Error);
        assert_eq!(notification.dashboard_id, layout.id);

        // The task keeps going after a failure
        layout.touch();
        handle.schedule(layout.clone());
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(rx.try_recv().unwrap().kind, NotificationKind::PersistenceFailure);
    }
}
