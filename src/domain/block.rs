// Dashboard block domain model
use super::block_config::BlockConfig;
use super::layout::MAX_ROWS;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockType {
    LineChart,
    BarChart,
    PieChart,
    Gauge,
    Metric,
    Table,
    Text,
    Status,
    AlertList,
}

impl BlockType {
    pub const ALL: [BlockType; 9] = [
        BlockType::LineChart,
        BlockType::BarChart,
        BlockType::PieChart,
        BlockType::Gauge,
        BlockType::Metric,
        BlockType::Table,
        BlockType::Text,
        BlockType::Status,
        BlockType::AlertList,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::LineChart => "line-chart",
            BlockType::BarChart => "bar-chart",
            BlockType::PieChart => "pie-chart",
            BlockType::Gauge => "gauge",
            BlockType::Metric => "metric",
            BlockType::Table => "table",
            BlockType::Text => "text",
            BlockType::Status => "status",
            BlockType::AlertList => "alert-list",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown block type `{}`", s))
    }
}

/// Grid coordinates in cell units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl GridPosition {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h)
    }

    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.w)
    }

    /// Whether the rectangle fits a `cols`-wide grid of `MAX_ROWS` rows.
    pub fn within(&self, cols: u32) -> bool {
        self.w > 0 && self.h > 0 && self.right() <= cols && self.bottom() <= MAX_ROWS
    }

    /// Shrinks and shifts the rectangle until it is `within(cols)`.
    pub fn clamped(self, cols: u32) -> Self {
        let cols = cols.max(1);
        let w = self.w.clamp(1, cols);
        let h = self.h.clamp(1, MAX_ROWS);
        Self {
            x: self.x.min(cols - w),
            y: self.y.min(MAX_ROWS - h),
            w,
            h,
        }
    }

    pub fn overlaps(&self, other: &GridPosition) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DataSourceKind {
    Static { data: Value },
    Api { url: String },
    Prometheus { query: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    #[serde(flatten)]
    pub kind: DataSourceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_interval: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardBlock {
    id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub position: GridPosition,
    pub config: BlockConfig,
    pub data_source: Option<DataSource>,
    pub style: Option<BlockStyle>,
}

impl DashboardBlock {
    pub fn new(id: String, position: GridPosition, config: BlockConfig) -> Self {
        Self {
            id,
            title: None,
            description: None,
            position,
            config,
            data_source: None,
            style: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn block_type(&self) -> BlockType {
        self.config.block_type()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Copy of this block under a new id. Only paste and duplicate use this.
    pub(crate) fn clone_with_id(&self, id: String) -> Self {
        Self {
            id,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_block_type_names() {
        assert_eq!(BlockType::AlertList.to_string(), "alert-list");
        assert_eq!("line-chart".parse::<BlockType>(), Ok(BlockType::LineChart));
        assert!("heatmap".parse::<BlockType>().is_err());
        assert_eq!(serde_json::to_value(BlockType::PieChart).unwrap(), json!("pie-chart"));
    }

    #[test]
    fn test_overlap() {
        let a = GridPosition::new(0, 0, 4, 3);
        assert!(a.overlaps(&GridPosition::new(3, 2, 4, 3)));
        assert!(!a.overlaps(&GridPosition::new(4, 0, 4, 3)));
        assert!(!a.overlaps(&GridPosition::new(0, 3, 4, 3)));
    }

    #[test]
    fn test_far_edges_saturate_and_clamp() {
        let far = GridPosition::new(u32::MAX - 1, u32::MAX - 1, 3, 2);
        assert_eq!(far.bottom(), u32::MAX);
        assert_eq!(far.right(), u32::MAX);
        assert!(!far.within(12));

        let clamped = far.clamped(12);
        assert_eq!(clamped, GridPosition::new(9, MAX_ROWS - 2, 3, 2));
        assert!(clamped.within(12));
        assert_eq!(GridPosition::new(0, 0, 0, 0).clamped(12), GridPosition::new(0, 0, 1, 1));
    }

    #[test]
    fn test_data_source_wire_shape() {
        let source = DataSource {
            kind: DataSourceKind::Prometheus {
                query: "rate(http_requests_total[5m])".to_string(),
            },
            refresh_interval: Some(30),
        };
        let value = serde_json::to_value(&source).unwrap();
        assert_eq!(
            value,
            json!({"type": "prometheus", "query": "rate(http_requests_total[5m])", "refreshInterval": 30})
        );
        let back: DataSource = serde_json::from_value(value).unwrap();
        assert_eq!(back, source);
    }
}
