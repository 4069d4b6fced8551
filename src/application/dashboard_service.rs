// Dashboard service - Use cases for opening, editing and saving dashboards
use crate::application::autosave::AutoSaveHandle;
use crate::application::block_factory::BlockFactory;
use crate::application::dashboard_repository::DashboardRepository;
use crate::application::editor_session::EditorSession;
use crate::application::layout_editor::LayoutEditor;
use crate::application::notifications::NotificationHub;
use crate::domain::layout::{DashboardLayout, DashboardSummary};
use crate::domain::template::TemplateRegistry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

#[derive(Debug, Clone)]
pub struct EditorOptions {
    /// `None` disables auto-save.
    pub autosave_window: Option<Duration>,
}

#[derive(Clone)]
pub struct DashboardService {
    repository: Arc<dyn DashboardRepository>,
    factory: BlockFactory,
    notifications: NotificationHub,
    options: EditorOptions,
    sessions: Arc<RwLock<HashMap<String, Arc<Mutex<EditorSession>>>>>,
}

impl DashboardService {
    pub fn new(
        repository: Arc<dyn DashboardRepository>,
        factory: BlockFactory,
        notifications: NotificationHub,
        options: EditorOptions,
    ) -> Self {
        Self {
            repository,
            factory,
            notifications,
            options,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn templates(&self) -> &TemplateRegistry {
        self.factory.registry()
    }

    pub fn notifications(&self) -> &NotificationHub {
        &self.notifications
    }

    fn start_session(&self, layout: DashboardLayout) -> EditorSession {
        let autosave = self.options.autosave_window.map(|window| {
            AutoSaveHandle::spawn(window, self.repository.clone(), self.notifications.clone())
        });
        EditorSession::new(
            LayoutEditor::new(layout, self.factory.clone()),
            autosave,
            self.repository.clone(),
            self.notifications.clone(),
        )
    }

    /// New empty dashboard, opened for editing. Nothing is stored until the
    /// first save or auto-save.
    pub async fn create_dashboard(&self, name: &str) -> Arc<Mutex<EditorSession>> {
        let layout = DashboardLayout::new(name);
        let id = layout.id.clone();
        let session = Arc::new(Mutex::new(self.start_session(layout)));

        self.sessions.write().await.insert(id.clone(), session.clone());
        tracing::info!(dashboard = %id, "dashboard created");
        session
    }

    /// The open session for `id`, hydrating it from the repository if needed.
    pub async fn open_dashboard(&self, id: &str) -> anyhow::Result<Option<Arc<Mutex<EditorSession>>>> {
        if let Some(session) = self.sessions.read().await.get(id) {
            return Ok(Some(session.clone()));
        }

        let Some(layout) = self.repository.load_dashboard(id).await? else {
            return Ok(None);
        };

        let mut sessions = self.sessions.write().await;
        // Another request may have opened it while we were loading
        let session = sessions
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(self.start_session(layout))))
            .clone();
        tracing::debug!(dashboard = id, "dashboard opened");
        Ok(Some(session))
    }

    /// Closes the session, cancelling its pending auto-save.
    pub async fn close_dashboard(&self, id: &str) -> bool {
        let Some(session) = self.sessions.write().await.remove(id) else {
            return false;
        };
        session.lock().await.close();
        true
    }

    pub async fn list_dashboards(&self) -> anyhow::Result<Vec<DashboardSummary>> {
        let mut summaries = self.repository.list_dashboards().await?;

        // Open sessions may hold unsaved dashboards or newer edits
        let open: Vec<_> = self.sessions.read().await.values().cloned().collect();
        for session in open {
            let session = session.lock().await;
            let summary = DashboardSummary::from(session.layout());
            match summaries.iter_mut().find(|s| s.id == summary.id) {
                Some(existing) => *existing = summary,
                None => summaries.push(summary),
            }
        }
        summaries.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(summaries)
    }

    pub async fn delete_dashboard(&self, id: &str) -> anyhow::Result<bool> {
        let was_open = self.close_dashboard(id).await;
        let was_stored = self.repository.delete_dashboard(id).await?;
        Ok(was_open || was_stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::block_factory::Placement;
    use crate::application::block_factory::tests::test_factory;
    use crate::infrastructure::memory_repository::InMemoryDashboardRepository;

    fn service(repo: Arc<InMemoryDashboardRepository>) -> DashboardService {
        DashboardService::new(
            repo,
            test_factory(),
            NotificationHub::new(),
            EditorOptions { autosave_window: None },
        )
    }

    #[tokio::test]
    async fn test_create_edit_save_reopen() {
        let repo = Arc::new(InMemoryDashboardRepository::default());
        let service = service(repo.clone());

        let session = service.create_dashboard("Edge routers").await;
        let id = {
            let mut session = session.lock().await;
            session.add_from_template("line-chart", Placement::at(0, 0)).unwrap();
            session.save().await.unwrap();
            session.dashboard_id().to_string()
        };

        assert!(service.close_dashboard(&id).await);
        assert!(!service.close_dashboard(&id).await);

        let reopened = service.open_dashboard(&id).await.unwrap().unwrap();
        let reopened = reopened.lock().await;
        assert_eq!(reopened.layout().name, "Edge routers");
        assert_eq!(reopened.layout().blocks.len(), 1);
    }

    #[tokio::test]
    async fn test_open_unknown_dashboard() {
        let service = service(Arc::new(InMemoryDashboardRepository::default()));
        assert!(service.open_dashboard("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_includes_unsaved_sessions() {
        let repo = Arc::new(InMemoryDashboardRepository::default());
        repo.save_dashboard(&DashboardLayout::new("Stored")).await.unwrap();
        let service = service(repo);

        service.create_dashboard("Draft").await;
        let names: Vec<_> = service
            .list_dashboards()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();

        assert_eq!(names, vec!["Draft".to_string(), "Stored".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_closes_and_removes() {
        let repo = Arc::new(InMemoryDashboardRepository::default());
        let service = service(repo.clone());
        let session = service.create_dashboard("Temp").await;
        let id = {
            let session = session.lock().await;
            session.save().await.unwrap();
            session.dashboard_id().to_string()
        };

        assert!(service.delete_dashboard(&id).await.unwrap());
        assert!(repo.load_dashboard(&id).await.unwrap().is_none());
        assert!(service.open_dashboard(&id).await.unwrap().is_none());
        assert!(!service.close_dashboard(&id).await);
        drop(session);
    }

    #[tokio::test]
    async fn test_list_waiting_on_busy_session_does_not_block_create() {
        let service = service(Arc::new(InMemoryDashboardRepository::default()));
        let busy = service.create_dashboard("Busy").await;
        let guard = busy.lock().await;

        let listing = service.list_dashboards();
        tokio::pin!(listing);
        assert!(futures::poll!(&mut listing).is_pending());

        let created = tokio::time::timeout(Duration::from_secs(1), service.create_dashboard("Other")).await;
        assert!(created.is_ok());

        drop(guard);
        let names: Vec<_> = listing.await.unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Busy".to_string()]);
    }
}
