// In-memory repository for ephemeral mode and tests
use crate::application::dashboard_repository::DashboardRepository;
use crate::domain::layout::{DashboardLayout, DashboardSummary};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct InMemoryDashboardRepository {
    dashboards: RwLock<HashMap<String, DashboardLayout>>,
}

#[async_trait]
impl DashboardRepository for InMemoryDashboardRepository {
    async fn list_dashboards(&self) -> Result<Vec<DashboardSummary>> {
        let dashboards = self.dashboards.read().await;
        Ok(dashboards.values().map(DashboardSummary::from).collect())
    }

    async fn load_dashboard(&self, id: &str) -> Result<Option<DashboardLayout>> {
        Ok(self.dashboards.read().await.get(id).cloned())
    }

    async fn save_dashboard(&self, layout: &DashboardLayout) -> Result<()> {
        self.dashboards
            .write()
            .await
            .insert(layout.id.clone(), layout.clone());
        Ok(())
    }

    async fn delete_dashboard(&self, id: &str) -> Result<bool> {
        Ok(self.dashboards.write().await.remove(id).is_some())
    }
}
