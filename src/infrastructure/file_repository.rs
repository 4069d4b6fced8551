// File-backed repository: one JSON document per dashboard
use crate::application::dashboard_repository::DashboardRepository;
use crate::domain::layout::{DashboardLayout, DashboardSummary};
use crate::infrastructure::layout_document::{export_json, import_json};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct FileDashboardRepository {
    dir: PathBuf,
}

impl FileDashboardRepository {
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create dashboard directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Only ids made of ASCII alphanumerics, `-` and `_` map to files, so an
    /// id can never point outside the directory.
    fn path_for(&self, id: &str) -> Result<PathBuf> {
        let valid = !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            anyhow::bail!("Invalid dashboard id `{}`", id);
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }

    async fn read_layout(path: &Path) -> Result<DashboardLayout> {
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        import_json(&json).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

#[async_trait]
impl DashboardRepository for FileDashboardRepository {
    async fn list_dashboards(&self) -> Result<Vec<DashboardSummary>> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .with_context(|| format!("Failed to list {}", self.dir.display()))?;

        let mut summaries = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read_layout(&path).await {
                Ok(layout) => summaries.push(DashboardSummary::from(&layout)),
                Err(e) => tracing::warn!("Skipping unreadable dashboard file: {:#}", e),
            }
        }
        Ok(summaries)
    }

    async fn load_dashboard(&self, id: &str) -> Result<Option<DashboardLayout>> {
        let path = self.path_for(id)?;
        if !tokio::fs::try_exists(&path).await? {
            return Ok(None);
        }
        Self::read_layout(&path).await.map(Some)
    }

    async fn save_dashboard(&self, layout: &DashboardLayout) -> Result<()> {
        let path = self.path_for(&layout.id)?;
        // Unique per write: concurrent saves of one dashboard must not share a temp file
        let tmp = path.with_extension(format!("json.{}.tmp", Uuid::new_v4().simple()));

        // Write then rename so a crash never leaves a half-written document
        tokio::fs::write(&tmp, export_json(layout))
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e).with_context(|| format!("Failed to replace {}", path.display()));
        }

        tracing::debug!(dashboard = %layout.id, path = %path.display(), "dashboard written");
        Ok(())
    }

    async fn delete_dashboard(&self, id: &str) -> Result<bool> {
        let path = self.path_for(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to delete {}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::block::{BlockType, DashboardBlock, GridPosition};
    use crate::domain::block_config::BlockConfig;

    #[tokio::test]
    async fn test_save_load_list_delete() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileDashboardRepository::new(dir.path().join("dashboards")).await.unwrap();

        let mut layout = DashboardLayout::new("Storage");
        layout.blocks.push(DashboardBlock::new(
            "disk".to_string(),
            GridPosition::new(0, 0, 4, 3),
            BlockConfig::default_for(BlockType::Gauge),
        ));
        layout.touch();

        repo.save_dashboard(&layout).await.unwrap();
        let loaded = repo.load_dashboard(&layout.id).await.unwrap().unwrap();
        assert_eq!(loaded, layout);

        let listed = repo.list_dashboards().await.unwrap();
        assert_eq!(listed, vec![DashboardSummary::from(&layout)]);

        assert!(repo.delete_dashboard(&layout.id).await.unwrap());
        assert!(!repo.delete_dashboard(&layout.id).await.unwrap());
        assert!(repo.load_dashboard(&layout.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_saves_of_one_dashboard() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileDashboardRepository::new(dir.path()).await.unwrap();

        let mut first = DashboardLayout::new("Racy");
        first.touch();
        let mut second = first.clone();
        second.touch();

        let (a, b) = tokio::join!(repo.save_dashboard(&first), repo.save_dashboard(&second));
        a.unwrap();
        b.unwrap();

        let loaded = repo.load_dashboard(&first.id).await.unwrap().unwrap();
        assert!(loaded == first || loaded == second);

        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec![format!("{}.json", first.id)]);
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileDashboardRepository::new(dir.path()).await.unwrap();
        assert!(repo.load_dashboard("../etc/passwd").await.is_err());
    }

    #[tokio::test]
    async fn test_list_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileDashboardRepository::new(dir.path()).await.unwrap();
        tokio::fs::write(dir.path().join("broken.json"), "{").await.unwrap();
        tokio::fs::write(dir.path().join("notes.txt"), "hello").await.unwrap();

        assert!(repo.list_dashboards().await.unwrap().is_empty());
    }
}
