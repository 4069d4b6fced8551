// Block factory - Instantiates blocks from templates
use crate::domain::block::{DashboardBlock, GridPosition};
use crate::domain::template::TemplateRegistry;
use serde::Deserialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Source of fresh block ids.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// `block-<unix millis>-<counter>-<random>`; the counter keeps ids unique
/// within the process even when the clock does not advance.
#[derive(Debug, Default)]
pub struct TimestampIdGenerator {
    counter: AtomicU64,
}

impl IdGenerator for TimestampIdGenerator {
    fn next_id(&self) -> String {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        let random = Uuid::new_v4().simple().to_string();
        format!(
            "block-{}-{}-{}",
            chrono::Utc::now().timestamp_millis(),
            seq,
            &random[..8]
        )
    }
}

/// Where a new block should go. Width and height fall back to the
/// template's default size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Placement {
    #[serde(default)]
    pub x: u32,
    #[serde(default)]
    pub y: u32,
    #[serde(default)]
    pub w: Option<u32>,
    #[serde(default)]
    pub h: Option<u32>,
}

impl Placement {
    pub fn at(x: u32, y: u32) -> Self {
        Self { x, y, w: None, h: None }
    }
}

#[derive(Clone)]
pub struct BlockFactory {
    registry: Arc<TemplateRegistry>,
    ids: Arc<dyn IdGenerator>,
}

impl BlockFactory {
    pub fn new(registry: Arc<TemplateRegistry>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { registry, ids }
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn next_id(&self) -> String {
        self.ids.next_id()
    }

    /// Returns `None` when no template is registered under `template_id`.
    pub fn create_block(&self, template_id: &str, placement: Placement) -> Option<DashboardBlock> {
        let template = self.registry.get(template_id)?;

        let w = placement.w.unwrap_or(template.default_size.w).max(template.min_size.w);
        let h = placement.h.unwrap_or(template.default_size.h).max(template.min_size.h);
        let position = GridPosition::new(placement.x, placement.y, w, h);

        tracing::debug!(template = template_id, ?position, "instantiating block");

        Some(
            DashboardBlock::new(self.ids.next_id(), position, template.default_config.clone())
                .with_title(template.name.clone()),
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::block::BlockType;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Deterministic ids for tests: `b1`, `b2`, ...
    #[derive(Default)]
    pub(crate) struct SequentialIds {
        next: Mutex<u64>,
    }

    impl IdGenerator for SequentialIds {
        fn next_id(&self) -> String {
            let mut next = self.next.lock().unwrap();
            *next += 1;
            format!("b{}", *next)
        }
    }

    pub(crate) fn test_factory() -> BlockFactory {
        BlockFactory::new(Arc::new(TemplateRegistry::builtin()), Arc::new(SequentialIds::default()))
    }

    #[test]
    fn test_gauge_from_template_uses_defaults() {
        let factory = BlockFactory::new(
            Arc::new(TemplateRegistry::builtin()),
            Arc::new(TimestampIdGenerator::default()),
        );
        let block = factory.create_block("gauge", Placement::at(0, 0)).unwrap();
        let template = factory.registry().get("gauge").unwrap();

        assert_eq!(block.block_type(), BlockType::Gauge);
        assert_eq!(block.position.w, template.default_size.w);
        assert_eq!(block.position.h, template.default_size.h);

        let config = block.config.to_map();
        for key in template.default_config.to_map().keys() {
            assert!(config.contains_key(key), "missing {}", key);
        }
        assert_eq!(block.title.as_deref(), Some("Gauge"));
    }

    #[test]
    fn test_missing_template_returns_none() {
        assert!(test_factory().create_block("sparkline", Placement::at(0, 0)).is_none());
    }

    #[test]
    fn test_explicit_size_is_clamped_to_minimum() {
        let placement = Placement { x: 1, y: 2, w: Some(1), h: Some(8) };
        let block = test_factory().create_block("metric", placement).unwrap();
        assert_eq!(block.position, GridPosition::new(1, 2, 2, 8));
    }

    #[test]
    fn test_timestamp_ids_are_unique() {
        let ids = TimestampIdGenerator::default();
        let generated: HashSet<String> = (0..1000).map(|_| ids.next_id()).collect();
        assert_eq!(generated.len(), 1000);
        assert!(generated.iter().all(|id| id.starts_with("block-")));
    }
}
