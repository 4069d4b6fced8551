// Typed per-block configuration
use super::block::BlockType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("config for {block_type} must be a JSON object")]
    NotAnObject { block_type: BlockType },

    #[error("field `{field}` of {block_type}: {reason}")]
    InvalidField {
        block_type: BlockType,
        field: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusDisplay {
    #[default]
    Grid,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityFilter {
    #[default]
    All,
    Critical,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LineChartConfig {
    pub time_range: String,
    pub show_legend: bool,
    pub show_grid: bool,
    pub smooth: bool,
    pub color: String,
    pub unit: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for LineChartConfig {
    fn default() -> Self {
        Self {
            time_range: "1h".to_string(),
            show_legend: true,
            show_grid: true,
            smooth: true,
            color: "#3b82f6".to_string(),
            unit: String::new(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BarChartConfig {
    pub orientation: Orientation,
    pub stacked: bool,
    pub show_legend: bool,
    pub show_values: bool,
    pub color: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for BarChartConfig {
    fn default() -> Self {
        Self {
            orientation: Orientation::Vertical,
            stacked: false,
            show_legend: true,
            show_values: false,
            color: "#10b981".to_string(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PieChartConfig {
    pub donut: bool,
    pub show_legend: bool,
    pub show_percentages: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for PieChartConfig {
    fn default() -> Self {
        Self {
            donut: false,
            show_legend: true,
            show_percentages: true,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GaugeConfig {
    pub min: f64,
    pub max: f64,
    pub unit: String,
    pub warning_threshold: f64,
    pub critical_threshold: f64,
    pub show_value: bool,
    pub color: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for GaugeConfig {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 100.0,
            unit: "%".to_string(),
            warning_threshold: 70.0,
            critical_threshold: 90.0,
            show_value: true,
            color: "#22c55e".to_string(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetricConfig {
    pub unit: String,
    pub decimals: u32,
    pub prefix: String,
    pub show_trend: bool,
    pub color: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self {
            unit: String::new(),
            decimals: 2,
            prefix: String::new(),
            show_trend: true,
            color: "#6366f1".to_string(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableConfig {
    pub page_size: u32,
    pub show_header: bool,
    pub sortable: bool,
    pub striped: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            show_header: true,
            sortable: true,
            striped: false,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextConfig {
    pub content: String,
    pub font_size: u32,
    pub align: TextAlign,
    pub markdown: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            content: String::new(),
            font_size: 14,
            align: TextAlign::Left,
            markdown: true,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatusConfig {
    pub display: StatusDisplay,
    pub show_uptime: bool,
    pub show_details: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            display: StatusDisplay::Grid,
            show_uptime: true,
            show_details: false,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlertListConfig {
    pub max_items: u32,
    pub severity: SeverityFilter,
    pub show_acknowledged: bool,
    pub show_timestamps: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for AlertListConfig {
    fn default() -> Self {
        Self {
            max_items: 10,
            severity: SeverityFilter::All,
            show_acknowledged: false,
            show_timestamps: true,
            extra: Map::new(),
        }
    }
}

/// Block configuration, one arm per block type.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockConfig {
    LineChart(LineChartConfig),
    BarChart(BarChartConfig),
    PieChart(PieChartConfig),
    Gauge(GaugeConfig),
    Metric(MetricConfig),
    Table(TableConfig),
    Text(TextConfig),
    Status(StatusConfig),
    AlertList(AlertListConfig),
}

impl BlockConfig {
    pub fn default_for(block_type: BlockType) -> Self {
        match block_type {
            BlockType::LineChart => Self::LineChart(LineChartConfig::default()),
            BlockType::BarChart => Self::BarChart(BarChartConfig::default()),
            BlockType::PieChart => Self::PieChart(PieChartConfig::default()),
            BlockType::Gauge => Self::Gauge(GaugeConfig::default()),
            BlockType::Metric => Self::Metric(MetricConfig::default()),
            BlockType::Table => Self::Table(TableConfig::default()),
            BlockType::Text => Self::Text(TextConfig::default()),
            BlockType::Status => Self::Status(StatusConfig::default()),
            BlockType::AlertList => Self::AlertList(AlertListConfig::default()),
        }
    }

    pub fn block_type(&self) -> BlockType {
        match self {
            Self::LineChart(_) => BlockType::LineChart,
            Self::BarChart(_) => BlockType::BarChart,
            Self::PieChart(_) => BlockType::PieChart,
            Self::Gauge(_) => BlockType::Gauge,
            Self::Metric(_) => BlockType::Metric,
            Self::Table(_) => BlockType::Table,
            Self::Text(_) => BlockType::Text,
            Self::Status(_) => BlockType::Status,
            Self::AlertList(_) => BlockType::AlertList,
        }
    }

    /// Builds the typed config for `block_type` from a JSON object. Missing
    /// keys take their defaults; unknown keys are kept in `extra`.
    pub fn from_map(block_type: BlockType, map: Map<String, Value>) -> Result<Self, ConfigError> {
        let value = Value::Object(map);
        let config = match block_type {
            BlockType::LineChart => Self::LineChart(typed(block_type, value)?),
            BlockType::BarChart => Self::BarChart(typed(block_type, value)?),
            BlockType::PieChart => Self::PieChart(typed(block_type, value)?),
            BlockType::Gauge => Self::Gauge(typed(block_type, value)?),
            BlockType::Metric => Self::Metric(typed(block_type, value)?),
            BlockType::Table => Self::Table(typed(block_type, value)?),
            BlockType::Text => Self::Text(typed(block_type, value)?),
            BlockType::Status => Self::Status(typed(block_type, value)?),
            BlockType::AlertList => Self::AlertList(typed(block_type, value)?),
        };
        Ok(config)
    }

    pub fn from_value(block_type: BlockType, value: Value) -> Result<Self, ConfigError> {
        match value {
            Value::Object(map) => Self::from_map(block_type, map),
            Value::Null => Ok(Self::default_for(block_type)),
            _ => Err(ConfigError::NotAnObject { block_type }),
        }
    }

    pub fn to_map(&self) -> Map<String, Value> {
        let value = match self {
            Self::LineChart(c) => serde_json::to_value(c),
            Self::BarChart(c) => serde_json::to_value(c),
            Self::PieChart(c) => serde_json::to_value(c),
            Self::Gauge(c) => serde_json::to_value(c),
            Self::Metric(c) => serde_json::to_value(c),
            Self::Table(c) => serde_json::to_value(c),
            Self::Text(c) => serde_json::to_value(c),
            Self::Status(c) => serde_json::to_value(c),
            Self::AlertList(c) => serde_json::to_value(c),
        };
        // Plain structs of strings, numbers and maps always serialize to objects
        match value {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Merges `patch` key by key over the current values.
    pub fn merged(&self, patch: &Map<String, Value>) -> Result<Self, ConfigError> {
        let mut map = self.to_map();
        for (key, value) in patch {
            map.insert(key.clone(), value.clone());
        }
        Self::from_map(self.block_type(), map)
    }
}

fn typed<T: serde::de::DeserializeOwned>(block_type: BlockType, value: Value) -> Result<T, ConfigError> {
    serde_json::from_value(value).map_err(|e| ConfigError::InvalidField {
        block_type,
        field: "config".to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_keys_take_defaults() {
        let map = json!({"max": 200.0}).as_object().cloned().unwrap();
        let config = BlockConfig::from_map(BlockType::Gauge, map).unwrap();

        match config {
            BlockConfig::Gauge(gauge) => {
                assert_eq!(gauge.max, 200.0);
                assert_eq!(gauge.min, 0.0);
                assert_eq!(gauge.unit, "%");
            }
            other => panic!("unexpected config {:?}", other),
        }
    }

    #[test]
    fn test_unknown_keys_are_preserved() {
        let map = json!({"content": "# Ops", "legacyTheme": "dark"})
            .as_object()
            .cloned()
            .unwrap();
        let config = BlockConfig::from_map(BlockType::Text, map).unwrap();
        let back = config.to_map();

        assert_eq!(back.get("legacyTheme"), Some(&json!("dark")));
        assert_eq!(back.get("content"), Some(&json!("# Ops")));
    }

    #[test]
    fn test_wrong_value_type_is_rejected() {
        let map = json!({"pageSize": "ten"}).as_object().cloned().unwrap();
        let err = BlockConfig::from_map(BlockType::Table, map).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidField { block_type: BlockType::Table, .. }));
    }

    #[test]
    fn test_merge_keeps_other_fields() {
        let config = BlockConfig::default_for(BlockType::BarChart);
        let patch = json!({"stacked": true, "orientation": "horizontal"})
            .as_object()
            .cloned()
            .unwrap();

        let merged = config.merged(&patch).unwrap();
        match merged {
            BlockConfig::BarChart(bar) => {
                assert!(bar.stacked);
                assert_eq!(bar.orientation, Orientation::Horizontal);
                assert!(bar.show_legend);
            }
            other => panic!("unexpected config {:?}", other),
        }
    }

    #[test]
    fn test_null_config_means_defaults() {
        let config = BlockConfig::from_value(BlockType::Status, Value::Null).unwrap();
        assert_eq!(config, BlockConfig::default_for(BlockType::Status));
        assert!(BlockConfig::from_value(BlockType::Status, json!([1, 2])).is_err());
    }
}
