// JSON document format for saving, exporting and importing layouts
use crate::domain::block::{BlockStyle, BlockType, DashboardBlock, DataSource, GridPosition};
use crate::domain::block_config::BlockConfig;
use crate::domain::layout::{DashboardLayout, GridConfig, LayoutMetadata, MAX_COLUMNS, MAX_ROWS};
use crate::domain::template::MIN_BLOCK_SIZE;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ImportError {
    #[error("invalid file: not valid JSON ({0})")]
    Parse(String),

    #[error("invalid file: {0}")]
    Invalid(String),
}

/// Persisted layout. `name`/`title`, `position`/`layout` and
/// `dataSource`/`datasource` are synonyms: either is accepted, both are
/// written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDocument {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub blocks: Vec<BlockDocument>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub grid_config: GridConfig,
    #[serde(default)]
    pub metadata: LayoutMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockDocument {
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<GridPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<GridPosition>,
    #[serde(default)]
    pub config: Value,
    #[serde(default, rename = "dataSource", skip_serializing_if = "Option::is_none")]
    pub data_source: Option<DataSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasource: Option<DataSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<BlockStyle>,
}

impl From<&DashboardBlock> for BlockDocument {
    fn from(block: &DashboardBlock) -> Self {
        Self {
            id: block.id().to_string(),
            block_type: block.block_type(),
            title: block.title.clone(),
            description: block.description.clone(),
            position: Some(block.position),
            layout: Some(block.position),
            config: Value::Object(block.config.to_map()),
            data_source: block.data_source.clone(),
            datasource: block.data_source.clone(),
            style: block.style.clone(),
        }
    }
}

impl From<&DashboardLayout> for LayoutDocument {
    fn from(layout: &DashboardLayout) -> Self {
        Self {
            id: Some(layout.id.clone()),
            name: Some(layout.name.clone()),
            title: Some(layout.name.clone()),
            description: layout.description.clone(),
            tags: layout.tags.clone(),
            blocks: layout.blocks.iter().map(BlockDocument::from).collect(),
            created_at: Some(layout.created_at),
            updated_at: Some(layout.updated_at),
            grid_config: layout.grid_config,
            metadata: layout.metadata,
        }
    }
}

impl BlockDocument {
    pub fn into_block(self) -> Result<DashboardBlock, ImportError> {
        let position = self
            .position
            .or(self.layout)
            .ok_or_else(|| ImportError::Invalid(format!("block `{}` has no position", self.id)))?;
        if position.w < MIN_BLOCK_SIZE.w || position.h < MIN_BLOCK_SIZE.h {
            return Err(ImportError::Invalid(format!(
                "block `{}` is smaller than {}x{}",
                self.id, MIN_BLOCK_SIZE.w, MIN_BLOCK_SIZE.h
            )));
        }
        if position.bottom() > MAX_ROWS {
            return Err(ImportError::Invalid(format!(
                "block `{}` extends past row {}",
                self.id, MAX_ROWS
            )));
        }
        let config = BlockConfig::from_value(self.block_type, self.config)
            .map_err(|e| ImportError::Invalid(format!("block `{}`: {}", self.id, e)))?;

        let mut block = DashboardBlock::new(self.id, position, config);
        block.title = self.title;
        block.description = self.description;
        block.data_source = self.data_source.or(self.datasource);
        block.style = self.style;
        Ok(block)
    }
}

impl LayoutDocument {
    pub fn into_layout(self) -> Result<DashboardLayout, ImportError> {
        if self.grid_config.cols == 0 || self.grid_config.cols > MAX_COLUMNS {
            return Err(ImportError::Invalid(format!(
                "gridConfig.cols must be between 1 and {}",
                MAX_COLUMNS
            )));
        }

        let blocks = self
            .blocks
            .into_iter()
            .map(BlockDocument::into_block)
            .collect::<Result<Vec<_>, _>>()?;

        let mut layout = DashboardLayout::new(
            self.name
                .or(self.title)
                .unwrap_or_else(|| "Untitled dashboard".to_string()),
        );
        if let Some(id) = self.id {
            layout.id = id;
        }
        layout.description = self.description;
        layout.tags = self.tags;
        layout.blocks = blocks;
        if let Some(created_at) = self.created_at {
            layout.created_at = created_at;
        }
        if let Some(updated_at) = self.updated_at {
            layout.updated_at = updated_at;
        }
        layout.grid_config = self.grid_config;
        layout.metadata = self.metadata;
        Ok(layout)
    }
}

/// Pretty-printed document for a layout.
pub fn export_json(layout: &DashboardLayout) -> String {
    // The document holds only strings, numbers, maps and timestamps
    serde_json::to_string_pretty(&LayoutDocument::from(layout)).unwrap_or_else(|e| {
        tracing::error!("layout serialization failed: {}", e);
        String::from("{}")
    })
}

/// Parses and validates a document. Shape problems are reported before any
/// typed decoding so the error names the offending part.
pub fn import_json(json: &str) -> Result<DashboardLayout, ImportError> {
    let value: Value = serde_json::from_str(json).map_err(|e| ImportError::Parse(e.to_string()))?;
    check_shape(&value)?;

    let document: LayoutDocument =
        serde_json::from_value(value).map_err(|e| ImportError::Invalid(e.to_string()))?;
    document.into_layout()
}

fn check_shape(value: &Value) -> Result<(), ImportError> {
    let object = value
        .as_object()
        .ok_or_else(|| ImportError::Invalid("document must be a JSON object".to_string()))?;
    let blocks = object
        .get("blocks")
        .and_then(Value::as_array)
        .ok_or_else(|| ImportError::Invalid("`blocks` must be an array".to_string()))?;

    for (i, block) in blocks.iter().enumerate() {
        if block.get("id").and_then(Value::as_str).is_none() {
            return Err(ImportError::Invalid(format!("block #{} has no string id", i)));
        }
        let type_name = block
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| ImportError::Invalid(format!("block #{} has no type", i)))?;
        type_name
            .parse::<BlockType>()
            .map_err(|e| ImportError::Invalid(format!("block #{}: {}", i, e)))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::block::DataSourceKind;
    use serde_json::json;

    fn sample_layout() -> DashboardLayout {
        let mut layout = DashboardLayout::new("Production");
        layout.tags = vec!["prod".to_string()];
        let mut cpu = DashboardBlock::new(
            "cpu".to_string(),
            GridPosition::new(0, 0, 6, 4),
            BlockConfig::default_for(BlockType::LineChart),
        )
        .with_title("CPU");
        cpu.data_source = Some(DataSource {
            kind: DataSourceKind::Prometheus {
                query: "avg(node_cpu_seconds_total)".to_string(),
            },
            refresh_interval: Some(15),
        });
        layout.blocks.push(cpu);
        layout.blocks.push(DashboardBlock::new(
            "mem".to_string(),
            GridPosition::new(6, 0, 3, 3),
            BlockConfig::default_for(BlockType::Gauge),
        ));
        layout.touch();
        layout
    }

    #[test]
    fn test_round_trip() {
        let layout = sample_layout();
        let restored = import_json(&export_json(&layout)).unwrap();
        assert_eq!(restored, layout);
    }

    #[test]
    fn test_export_emits_both_synonyms() {
        let value: Value = serde_json::from_str(&export_json(&sample_layout())).unwrap();
        assert_eq!(value["name"], value["title"]);
        let block = &value["blocks"][0];
        assert_eq!(block["position"], block["layout"]);
        assert_eq!(block["dataSource"], block["datasource"]);
        assert_eq!(block["type"], json!("line-chart"));
    }

    #[test]
    fn test_import_accepts_alternate_field_names() {
        let doc = json!({
            "id": "legacy",
            "title": "Legacy board",
            "blocks": [{
                "id": "t1",
                "type": "text",
                "layout": {"x": 0, "y": 1, "w": 4, "h": 2},
                "config": {"content": "hello"},
                "datasource": {"type": "api", "url": "/api/notes"}
            }]
        });
        let layout = import_json(&doc.to_string()).unwrap();

        assert_eq!(layout.id, "legacy");
        assert_eq!(layout.name, "Legacy board");
        let block = &layout.blocks[0];
        assert_eq!(block.position, GridPosition::new(0, 1, 4, 2));
        assert_eq!(
            block.data_source.as_ref().map(|d| &d.kind),
            Some(&DataSourceKind::Api { url: "/api/notes".to_string() })
        );
        assert_eq!(layout.grid_config, GridConfig::default());
    }

    #[test]
    fn test_rejects_malformed_documents() {
        assert!(matches!(import_json("{not json"), Err(ImportError::Parse(_))));
        assert!(matches!(
            import_json(r#"{"blocks": "not-an-array"}"#),
            Err(ImportError::Invalid(_))
        ));
        assert!(matches!(
            import_json(r#"{"blocks": [{"id": "x", "type": "heatmap", "position": {"x":0,"y":0,"w":2,"h":2}}]}"#),
            Err(ImportError::Invalid(_))
        ));
        assert!(matches!(
            import_json(r#"{"blocks": [{"id": "x", "type": "gauge"}]}"#),
            Err(ImportError::Invalid(_))
        ));
        assert!(matches!(
            import_json(r#"{"blocks": [{"type": "gauge", "position": {"x":0,"y":0,"w":2,"h":2}}]}"#),
            Err(ImportError::Invalid(_))
        ));
        assert!(matches!(
            import_json(r#"{"blocks": [{"id": "x", "type": "gauge", "position": {"x":-1,"y":0,"w":2,"h":2}}]}"#),
            Err(ImportError::Invalid(_))
        ));
        assert!(matches!(
            import_json(r#"{"blocks": [{"id": "x", "type": "gauge", "position": {"x":0,"y":0,"w":0,"h":0}}]}"#),
            Err(ImportError::Invalid(_))
        ));
        assert!(matches!(
            import_json(r#"{"blocks": [{"id": "x", "type": "text", "position": {"x":0,"y":4294967294,"w":4,"h":2}}]}"#),
            Err(ImportError::Invalid(_))
        ));
    }
}
