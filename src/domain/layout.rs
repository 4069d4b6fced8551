// Dashboard layout domain model
use super::block::DashboardBlock;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_COLUMNS: u32 = 12;
pub const MAX_COLUMNS: u32 = 64;
/// Every block lies within rows `0..MAX_ROWS`.
pub const MAX_ROWS: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompactType {
    #[default]
    Vertical,
    Horizontal,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridConfig {
    pub cols: u32,
    pub row_height: u32,
    pub gap: u32,
    pub compact_type: CompactType,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cols: DEFAULT_COLUMNS,
            row_height: 60,
            gap: 16,
            compact_type: CompactType::Vertical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutMetadata {
    pub version: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardLayout {
    pub id: String,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub blocks: Vec<DashboardBlock>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub grid_config: GridConfig,
    pub metadata: LayoutMetadata,
}

impl DashboardLayout {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: format!("dashboard-{}", Uuid::new_v4().simple()),
            name: name.into(),
            description: String::new(),
            tags: Vec::new(),
            blocks: Vec::new(),
            created_at: now,
            updated_at: now,
            grid_config: GridConfig::default(),
            metadata: LayoutMetadata::default(),
        }
    }

    pub fn block(&self, id: &str) -> Option<&DashboardBlock> {
        self.blocks.iter().find(|b| b.id() == id)
    }

    pub fn block_mut(&mut self, id: &str) -> Option<&mut DashboardBlock> {
        self.blocks.iter_mut().find(|b| b.id() == id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.blocks.iter().position(|b| b.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    /// Records a mutation: bumps the version and refreshes `updated_at`
    /// without letting it go backwards.
    pub fn touch(&mut self) {
        self.metadata.version += 1;
        self.updated_at = Utc::now().max(self.updated_at);
    }
}

/// Listing entry for stored dashboards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub id: String,
    pub name: String,
    pub block_count: usize,
    pub updated_at: DateTime<Utc>,
}

impl From<&DashboardLayout> for DashboardSummary {
    fn from(layout: &DashboardLayout) -> Self {
        Self {
            id: layout.id.clone(),
            name: layout.name.clone(),
            block_count: layout.blocks.len(),
            updated_at: layout.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_layout_is_empty() {
        let layout = DashboardLayout::new("Infra overview");
        assert!(layout.blocks.is_empty());
        assert_eq!(layout.metadata.version, 0);
        assert_eq!(layout.grid_config.cols, 12);
        assert!(layout.id.starts_with("dashboard-"));
    }

    #[test]
    fn test_touch_never_goes_back_in_time() {
        let mut layout = DashboardLayout::new("Clock skew");
        let future = Utc::now() + Duration::hours(1);
        layout.updated_at = future;

        layout.touch();

        assert_eq!(layout.metadata.version, 1);
        assert_eq!(layout.updated_at, future);
    }
}
