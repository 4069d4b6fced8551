// Repository trait for dashboard persistence
use crate::domain::layout::{DashboardLayout, DashboardSummary};
use async_trait::async_trait;

/// Storage the editor saves into. Implementations decide where layouts live;
/// the editor only hands them snapshots.
#[async_trait]
pub trait DashboardRepository: Send + Sync {
    /// List stored dashboards
    async fn list_dashboards(&self) -> anyhow::Result<Vec<DashboardSummary>>;

    /// Load one dashboard, `None` when it does not exist
    async fn load_dashboard(&self, id: &str) -> anyhow::Result<Option<DashboardLayout>>;

    /// Explicit save from the user
    async fn save_dashboard(&self, layout: &DashboardLayout) -> anyhow::Result<()>;

    /// Debounced background save; stores the same way as an explicit save
    /// unless the backend distinguishes the two
    async fn auto_save_dashboard(&self, layout: &DashboardLayout) -> anyhow::Result<()> {
        self.save_dashboard(layout).await
    }

    /// Delete a dashboard, returning whether it existed
    async fn delete_dashboard(&self, id: &str) -> anyhow::Result<bool>;
}
