// Block template catalog
use super::block::BlockType;
use super::block_config::{BlockConfig, ConfigError};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateCategory {
    Charts,
    Metrics,
    Data,
    Content,
    Monitoring,
}

impl TemplateCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateCategory::Charts => "charts",
            TemplateCategory::Metrics => "metrics",
            TemplateCategory::Data => "data",
            TemplateCategory::Content => "content",
            TemplateCategory::Monitoring => "monitoring",
        }
    }
}

impl fmt::Display for TemplateCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "charts" => Ok(TemplateCategory::Charts),
            "metrics" => Ok(TemplateCategory::Metrics),
            "data" => Ok(TemplateCategory::Data),
            "content" => Ok(TemplateCategory::Content),
            "monitoring" => Ok(TemplateCategory::Monitoring),
            other => Err(format!("unknown template category `{}`", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Select,
    Color,
}

/// Panel section a config field is shown under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldCategory {
    General,
    Display,
    Thresholds,
    Data,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigField {
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub label: String,
    pub default: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    pub category: FieldCategory,
}

impl ConfigField {
    fn new(kind: FieldKind, label: &str, category: FieldCategory) -> Self {
        Self {
            kind,
            label: label.to_string(),
            default: Value::Null,
            description: None,
            options: None,
            min: None,
            max: None,
            step: None,
            category,
        }
    }

    fn string(label: &str, category: FieldCategory) -> Self {
        Self::new(FieldKind::String, label, category)
    }

    fn boolean(label: &str, category: FieldCategory) -> Self {
        Self::new(FieldKind::Boolean, label, category)
    }

    fn color(label: &str) -> Self {
        Self::new(FieldKind::Color, label, FieldCategory::Display)
    }

    fn number(label: &str, category: FieldCategory, min: Option<f64>, max: Option<f64>, step: f64) -> Self {
        Self {
            min,
            max,
            step: Some(step),
            ..Self::new(FieldKind::Number, label, category)
        }
    }

    fn select(label: &str, category: FieldCategory, options: &[&str]) -> Self {
        Self {
            options: Some(options.iter().map(|o| o.to_string()).collect()),
            ..Self::new(FieldKind::Select, label, category)
        }
    }

    fn describe(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    fn check(&self, value: &Value) -> Result<(), String> {
        match self.kind {
            FieldKind::String => value
                .is_string()
                .then_some(())
                .ok_or_else(|| "expected a string".to_string()),
            FieldKind::Boolean => value
                .is_boolean()
                .then_some(())
                .ok_or_else(|| "expected a boolean".to_string()),
            FieldKind::Number => {
                let n = value.as_f64().ok_or_else(|| "expected a number".to_string())?;
                if let Some(min) = self.min {
                    if n < min {
                        return Err(format!("{} is below the minimum {}", n, min));
                    }
                }
                if let Some(max) = self.max {
                    if n > max {
                        return Err(format!("{} is above the maximum {}", n, max));
                    }
                }
                Ok(())
            }
            FieldKind::Select => {
                let s = value.as_str().ok_or_else(|| "expected a string".to_string())?;
                let options = self.options.as_deref().unwrap_or_default();
                if options.iter().any(|o| o == s) {
                    Ok(())
                } else {
                    Err(format!("`{}` is not one of {}", s, options.join(", ")))
                }
            }
            FieldKind::Color => {
                let s = value.as_str().ok_or_else(|| "expected a color string".to_string())?;
                if is_hex_color(s) {
                    Ok(())
                } else {
                    Err(format!("`{}` is not a #rgb or #rrggbb color", s))
                }
            }
        }
    }
}

fn is_hex_color(s: &str) -> bool {
    match s.strip_prefix('#') {
        Some(hex) => (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockSize {
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub category: TemplateCategory,
    pub icon: String,
    pub default_size: BlockSize,
    pub min_size: BlockSize,
    pub config_schema: BTreeMap<String, ConfigField>,
    #[serde(serialize_with = "serialize_config")]
    pub default_config: BlockConfig,
}

fn serialize_config<S: serde::Serializer>(config: &BlockConfig, serializer: S) -> Result<S::Ok, S::Error> {
    config.to_map().serialize(serializer)
}

pub const MIN_BLOCK_SIZE: BlockSize = BlockSize { w: 2, h: 2 };

/// Read-only catalog of block templates, keyed by template id.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: Vec<BlockTemplate>,
    index: HashMap<String, usize>,
}

impl TemplateRegistry {
    pub fn new(templates: Vec<BlockTemplate>) -> Self {
        let index = templates
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), i))
            .collect();
        Self { templates, index }
    }

    /// The built-in catalog, one template per block type.
    pub fn builtin() -> Self {
        Self::new(BlockType::ALL.into_iter().map(builtin_template).collect())
    }

    pub fn get(&self, id: &str) -> Option<&BlockTemplate> {
        self.index.get(id).map(|&i| &self.templates[i])
    }

    pub fn for_type(&self, block_type: BlockType) -> Option<&BlockTemplate> {
        self.templates.iter().find(|t| t.block_type == block_type)
    }

    pub fn by_category(&self, category: TemplateCategory) -> Vec<&BlockTemplate> {
        self.templates.iter().filter(|t| t.category == category).collect()
    }

    pub fn all(&self) -> &[BlockTemplate] {
        &self.templates
    }

    /// Checks the schema-declared keys of `config`. Keys the schema does not
    /// declare are left alone.
    pub fn validate_config(&self, block_type: BlockType, config: &Map<String, Value>) -> Result<(), ConfigError> {
        let Some(template) = self.for_type(block_type) else {
            return Ok(());
        };
        for (key, field) in &template.config_schema {
            if let Some(value) = config.get(key) {
                field.check(value).map_err(|reason| ConfigError::InvalidField {
                    block_type,
                    field: key.clone(),
                    reason,
                })?;
            }
        }
        Ok(())
    }
}

fn builtin_template(block_type: BlockType) -> BlockTemplate {
    use FieldCategory::{Data, Display, General, Thresholds};

    let (name, description, category, icon, (w, h), fields): (_, _, _, _, _, Vec<(&str, ConfigField)>) =
        match block_type {
            BlockType::LineChart => (
                "Line Chart",
                "Time series rendered as one or more lines",
                TemplateCategory::Charts,
                "chart-line",
                (6, 4),
                vec![
                    ("timeRange", ConfigField::select("Time range", Data, &["15m", "1h", "6h", "24h", "7d"])),
                    ("showLegend", ConfigField::boolean("Show legend", Display)),
                    ("showGrid", ConfigField::boolean("Show grid", Display)),
                    ("smooth", ConfigField::boolean("Smooth lines", Display)),
                    ("color", ConfigField::color("Line color")),
                    ("unit", ConfigField::string("Unit", General)),
                ],
            ),
            BlockType::BarChart => (
                "Bar Chart",
                "Categorical comparison as bars",
                TemplateCategory::Charts,
                "chart-bar",
                (6, 4),
                vec![
                    ("orientation", ConfigField::select("Orientation", Display, &["vertical", "horizontal"])),
                    ("stacked", ConfigField::boolean("Stacked", Display)),
                    ("showLegend", ConfigField::boolean("Show legend", Display)),
                    ("showValues", ConfigField::boolean("Show values", Display)),
                    ("color", ConfigField::color("Bar color")),
                ],
            ),
            BlockType::PieChart => (
                "Pie Chart",
                "Share of a whole",
                TemplateCategory::Charts,
                "chart-pie",
                (4, 4),
                vec![
                    ("donut", ConfigField::boolean("Donut", Display)),
                    ("showLegend", ConfigField::boolean("Show legend", Display)),
                    ("showPercentages", ConfigField::boolean("Show percentages", Display)),
                ],
            ),
            BlockType::Gauge => (
                "Gauge",
                "Single value against a range with thresholds",
                TemplateCategory::Metrics,
                "gauge",
                (3, 3),
                vec![
                    ("min", ConfigField::number("Minimum", General, None, None, 1.0)),
                    ("max", ConfigField::number("Maximum", General, None, None, 1.0)),
                    ("unit", ConfigField::string("Unit", General)),
                    (
                        "warningThreshold",
                        ConfigField::number("Warning threshold", Thresholds, None, None, 1.0)
                            .describe("Value from which the gauge turns amber"),
                    ),
                    (
                        "criticalThreshold",
                        ConfigField::number("Critical threshold", Thresholds, None, None, 1.0)
                            .describe("Value from which the gauge turns red"),
                    ),
                    ("showValue", ConfigField::boolean("Show value", Display)),
                    ("color", ConfigField::color("Color")),
                ],
            ),
            BlockType::Metric => (
                "Metric",
                "Big number with optional trend",
                TemplateCategory::Metrics,
                "hash",
                (3, 2),
                vec![
                    ("unit", ConfigField::string("Unit", General)),
                    ("decimals", ConfigField::number("Decimals", Display, Some(0.0), Some(6.0), 1.0)),
                    ("prefix", ConfigField::string("Prefix", General)),
                    ("showTrend", ConfigField::boolean("Show trend", Display)),
                    ("color", ConfigField::color("Color")),
                ],
            ),
            BlockType::Table => (
                "Table",
                "Tabular rows with paging",
                TemplateCategory::Data,
                "table",
                (12, 5),
                vec![
                    ("pageSize", ConfigField::number("Rows per page", Display, Some(1.0), Some(100.0), 1.0)),
                    ("showHeader", ConfigField::boolean("Show header", Display)),
                    ("sortable", ConfigField::boolean("Sortable", General)),
                    ("striped", ConfigField::boolean("Striped rows", Display)),
                ],
            ),
            BlockType::Text => (
                "Text",
                "Free text or markdown notes",
                TemplateCategory::Content,
                "type",
                (4, 2),
                vec![
                    ("content", ConfigField::string("Content", General)),
                    ("fontSize", ConfigField::number("Font size", Display, Some(8.0), Some(72.0), 1.0)),
                    ("align", ConfigField::select("Alignment", Display, &["left", "center", "right"])),
                    ("markdown", ConfigField::boolean("Render markdown", General)),
                ],
            ),
            BlockType::Status => (
                "Service Status",
                "Up/down state of monitored services",
                TemplateCategory::Monitoring,
                "activity",
                (4, 3),
                vec![
                    ("display", ConfigField::select("Display", Display, &["grid", "list"])),
                    ("showUptime", ConfigField::boolean("Show uptime", Display)),
                    ("showDetails", ConfigField::boolean("Show details", Display)),
                ],
            ),
            BlockType::AlertList => (
                "Alert List",
                "Most recent alerts, filtered by severity",
                TemplateCategory::Monitoring,
                "bell",
                (6, 4),
                vec![
                    ("maxItems", ConfigField::number("Max items", General, Some(1.0), Some(100.0), 1.0)),
                    (
                        "severity",
                        ConfigField::select("Severity", Data, &["all", "critical", "warning", "info"]),
                    ),
                    ("showAcknowledged", ConfigField::boolean("Show acknowledged", Data)),
                    ("showTimestamps", ConfigField::boolean("Show timestamps", Display)),
                ],
            ),
        };

    let default_config = BlockConfig::default_for(block_type);
    let defaults = default_config.to_map();
    let config_schema = fields
        .into_iter()
        .map(|(key, mut field)| {
            field.default = defaults.get(key).cloned().unwrap_or(Value::Null);
            (key.to_string(), field)
        })
        .collect();

    BlockTemplate {
        id: block_type.as_str().to_string(),
        name: name.to_string(),
        description: description.to_string(),
        block_type,
        category,
        icon: icon.to_string(),
        default_size: BlockSize { w, h },
        min_size: MIN_BLOCK_SIZE,
        config_schema,
        default_config,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_every_block_type_has_a_template() {
        let registry = TemplateRegistry::builtin();
        for block_type in BlockType::ALL {
            let template = registry.get(block_type.as_str()).expect("template");
            assert_eq!(template.block_type, block_type);
            assert_eq!(template.default_config.block_type(), block_type);
        }
        assert!(registry.get("heatmap").is_none());
    }

    #[test]
    fn test_schema_defaults_match_default_config() {
        let registry = TemplateRegistry::builtin();
        for template in registry.all() {
            let defaults = template.default_config.to_map();
            for (key, field) in &template.config_schema {
                assert_eq!(
                    defaults.get(key),
                    Some(&field.default),
                    "{}.{}",
                    template.id,
                    key
                );
                field.check(&field.default).expect("default passes its own schema");
            }
        }
    }

    #[test]
    fn test_by_category() {
        let registry = TemplateRegistry::builtin();
        let charts: Vec<_> = registry
            .by_category(TemplateCategory::Charts)
            .into_iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(charts, vec!["line-chart", "bar-chart", "pie-chart"]);

        let monitoring = registry.by_category(TemplateCategory::Monitoring);
        assert_eq!(monitoring.len(), 2);
    }

    #[test]
    fn test_validate_config() {
        let registry = TemplateRegistry::builtin();

        let ok = json!({"decimals": 3, "color": "#fff", "whatever": [1]});
        assert!(registry.validate_config(BlockType::Metric, ok.as_object().unwrap()).is_ok());

        let too_many = json!({"decimals": 9});
        let err = registry
            .validate_config(BlockType::Metric, too_many.as_object().unwrap())
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidField { ref field, .. } if field == "decimals"));

        let bad_select = json!({"align": "justify"});
        assert!(registry.validate_config(BlockType::Text, bad_select.as_object().unwrap()).is_err());

        let bad_color = json!({"color": "blue"});
        assert!(registry.validate_config(BlockType::Gauge, bad_color.as_object().unwrap()).is_err());
    }

    #[test]
    fn test_template_serializes_schema_for_config_panel() {
        let registry = TemplateRegistry::builtin();
        let value = serde_json::to_value(registry.get("gauge").unwrap()).unwrap();
        assert_eq!(value["type"], json!("gauge"));
        assert_eq!(value["defaultSize"], json!({"w": 3, "h": 3}));
        assert_eq!(value["configSchema"]["max"]["type"], json!("number"));
        assert_eq!(value["configSchema"]["max"]["default"], json!(100.0));
        assert_eq!(value["defaultConfig"]["unit"], json!("%"));
    }
}
