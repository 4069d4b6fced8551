// REST repository - Dashboards stored by a remote backend service
use crate::application::dashboard_repository::DashboardRepository;
use crate::domain::layout::{DashboardLayout, DashboardSummary};
use crate::infrastructure::layout_document::LayoutDocument;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RestDashboardRepository {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl RestDashboardRepository {
    pub fn new(base_url: String, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client,
        })
    }

    fn dashboard_url(&self, id: &str) -> String {
        format!("{}/dashboards/{}", self.base_url, urlencoding::encode(id))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request.header("Accept", "application/json");
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn put_layout(&self, layout: &DashboardLayout, autosave: bool) -> Result<()> {
        let mut url = self.dashboard_url(&layout.id);
        if autosave {
            url.push_str("?autosave=true");
        }

        let response = self
            .authorize(self.client.put(&url))
            .json(&LayoutDocument::from(layout))
            .send()
            .await
            .context("Failed to send dashboard to backend")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Dashboard save failed with status {}: {}", status, body);
        }
        Ok(())
    }
}

#[async_trait]
impl DashboardRepository for RestDashboardRepository {
    async fn list_dashboards(&self) -> Result<Vec<DashboardSummary>> {
        let url = format!("{}/dashboards", self.base_url);
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .context("Failed to list dashboards")?;

        if !response.status().is_success() {
            anyhow::bail!("Dashboard listing failed with status {}", response.status());
        }

        response
            .json::<Vec<DashboardSummary>>()
            .await
            .context("Failed to parse dashboard listing")
    }

    async fn load_dashboard(&self, id: &str) -> Result<Option<DashboardLayout>> {
        let response = self
            .authorize(self.client.get(self.dashboard_url(id)))
            .send()
            .await
            .context("Failed to fetch dashboard")?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Dashboard fetch failed with status {}: {}", status, body);
        }

        let document = response
            .json::<LayoutDocument>()
            .await
            .context("Failed to parse dashboard document")?;
        Ok(Some(document.into_layout()?))
    }

    async fn save_dashboard(&self, layout: &DashboardLayout) -> Result<()> {
        self.put_layout(layout, false).await
    }

    async fn auto_save_dashboard(&self, layout: &DashboardLayout) -> Result<()> {
        self.put_layout(layout, true).await
    }

    async fn delete_dashboard(&self, id: &str) -> Result<bool> {
        let response = self
            .authorize(self.client.delete(self.dashboard_url(id)))
            .send()
            .await
            .context("Failed to delete dashboard")?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => anyhow::bail!("Dashboard delete failed with status {}", status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_url_encodes_id() {
        let repo =
            RestDashboardRepository::new("http://backend:8000/api/".to_string(), None, Duration::from_secs(5)).unwrap();
        assert_eq!(repo.dashboard_url("ops board"), "http://backend:8000/api/dashboards/ops%20board");
    }
}
