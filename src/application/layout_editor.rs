// Layout editor - In-memory mutation engine for one dashboard layout
use crate::application::block_factory::{BlockFactory, Placement};
use crate::application::grid_adapter::GridItem;
use crate::domain::block::{BlockStyle, DashboardBlock, DataSource, GridPosition};
use crate::domain::block_config::ConfigError;
use crate::domain::layout::{DashboardLayout, MAX_ROWS};
use crate::domain::occupancy::OccupancyGrid;
use crate::domain::template::MIN_BLOCK_SIZE;
use crate::infrastructure::layout_document::{self, ImportError};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("no block template named `{0}`")]
    TemplateNotFound(String),

    #[error("a block with id `{0}` already exists in this layout")]
    DuplicateBlockId(String),

    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),

    #[error(transparent)]
    InvalidImport(#[from] ImportError),

    #[error("no room left in the grid for block `{0}`")]
    NoRoom(String),

    #[error("could not save dashboard: {0}")]
    Persistence(String),
}

/// Partial update for a block. Absent fields are left as they are; config
/// keys are merged into the existing config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "layout")]
    pub position: Option<GridPosition>,
    pub config: Option<Map<String, Value>>,
    #[serde(alias = "datasource")]
    pub data_source: Option<DataSource>,
    pub style: Option<BlockStyle>,
}

pub struct LayoutEditor {
    layout: DashboardLayout,
    selected: Option<String>,
    factory: BlockFactory,
}

impl LayoutEditor {
    pub fn new(layout: DashboardLayout, factory: BlockFactory) -> Self {
        Self {
            layout,
            selected: None,
            factory,
        }
    }

    pub fn layout(&self) -> &DashboardLayout {
        &self.layout
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn version(&self) -> u64 {
        self.layout.metadata.version
    }

    fn occupancy_without(&self, skip: Option<&str>) -> OccupancyGrid {
        OccupancyGrid::from_positions(
            self.layout.grid_config.cols,
            self.layout
                .blocks
                .iter()
                .filter(|b| Some(b.id()) != skip)
                .map(|b| &b.position),
        )
    }

    fn check_config(&self, block: &DashboardBlock) -> Result<(), ConfigError> {
        self.factory
            .registry()
            .validate_config(block.block_type(), &block.config.to_map())
    }

    fn min_size(position: GridPosition) -> GridPosition {
        GridPosition {
            w: position.w.max(MIN_BLOCK_SIZE.w),
            h: position.h.max(MIN_BLOCK_SIZE.h),
            ..position
        }
    }

    /// Appends `block`, moving it down to the first free rows at or below
    /// its requested position.
    pub fn add_block(&mut self, mut block: DashboardBlock) -> Result<(), EditorError> {
        if self.layout.contains(block.id()) {
            tracing::warn!(block = block.id(), "rejected block with duplicate id");
            return Err(EditorError::DuplicateBlockId(block.id().to_string()));
        }
        self.check_config(&block)?;

        block.position = self
            .occupancy_without(None)
            .place(Self::min_size(block.position))
            .ok_or_else(|| EditorError::NoRoom(block.id().to_string()))?;
        tracing::debug!(block = block.id(), position = ?block.position, "block added");

        self.layout.blocks.push(block);
        self.layout.touch();
        Ok(())
    }

    pub fn add_from_template(&mut self, template_id: &str, placement: Placement) -> Result<String, EditorError> {
        let block = self
            .factory
            .create_block(template_id, placement)
            .ok_or_else(|| EditorError::TemplateNotFound(template_id.to_string()))?;
        let id = block.id().to_string();
        self.add_block(block)?;
        Ok(id)
    }

    /// Returns `Ok(false)` when no block has `id`; a stale panel may update a
    /// block that was just deleted.
    pub fn update_block(&mut self, id: &str, patch: BlockPatch) -> Result<bool, EditorError> {
        let cols = self.layout.grid_config.cols;
        let registry = self.factory.registry();
        let Some(block) = self.layout.blocks.iter_mut().find(|b| b.id() == id) else {
            tracing::debug!(block = id, "update for unknown block ignored");
            return Ok(false);
        };

        // Validate everything before touching the block
        let config = match &patch.config {
            Some(changes) => {
                registry.validate_config(block.block_type(), changes)?;
                Some(block.config.merged(changes)?)
            }
            None => None,
        };

        if let Some(title) = patch.title {
            block.title = Some(title);
        }
        if let Some(description) = patch.description {
            block.description = Some(description);
        }
        if let Some(position) = patch.position {
            block.position = Self::min_size(position).clamped(cols);
        }
        if let Some(config) = config {
            block.config = config;
        }
        if let Some(data_source) = patch.data_source {
            block.data_source = Some(data_source);
        }
        if let Some(style) = patch.style {
            block.style = Some(style);
        }

        self.layout.touch();
        Ok(true)
    }

    pub fn delete_block(&mut self, id: &str) -> bool {
        let Some(index) = self.layout.index_of(id) else {
            return false;
        };
        self.layout.blocks.remove(index);
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        self.layout.touch();
        tracing::debug!(block = id, "block deleted");
        true
    }

    /// Moves the block at `from` to `to`, then stacks every block under the
    /// previous one, leaving a one-row gap. `x`, `w` and `h` are kept. Nothing
    /// changes when the stack would run past `MAX_ROWS`.
    pub fn reorder_blocks(&mut self, from: usize, to: usize) -> bool {
        let len = self.layout.blocks.len();
        if from >= len || to >= len || from == to {
            return false;
        }

        let mut order: Vec<usize> = (0..len).collect();
        let moved = order.remove(from);
        order.insert(to, moved);

        let mut stacked = Vec::with_capacity(len);
        let mut next_y: u32 = 0;
        for &i in &order {
            let h = self.layout.blocks[i].position.h;
            if next_y.saturating_add(h) > MAX_ROWS {
                tracing::warn!(from, to, "reorder would run past the last grid row");
                return false;
            }
            stacked.push(next_y);
            next_y += h + 1;
        }

        let block = self.layout.blocks.remove(from);
        self.layout.blocks.insert(to, block);
        for (block, y) in self.layout.blocks.iter_mut().zip(stacked) {
            block.position.y = y;
        }

        self.layout.touch();
        tracing::debug!(from, to, "blocks reordered");
        true
    }

    /// Puts one block at `position`. If that collides with other blocks the
    /// moved block goes straight down to the first rows where it fits; no
    /// other block moves, so the outcome does not depend on block order.
    pub fn reposition_block(&mut self, id: &str, position: GridPosition) -> bool {
        if !self.layout.contains(id) {
            return false;
        }
        let Some(placed) = self.occupancy_without(Some(id)).place(Self::min_size(position)) else {
            return false;
        };

        let Some(block) = self.layout.block_mut(id) else {
            return false;
        };
        if block.position == placed {
            return false;
        }
        block.position = placed;
        self.layout.touch();
        tracing::debug!(block = id, position = ?placed, "block repositioned");
        true
    }

    /// Writes back drag/resize results from the canonical breakpoint. Unknown
    /// ids are skipped; all changes land under one version bump.
    pub fn apply_grid_changes(&mut self, items: &[GridItem]) -> bool {
        let cols = self.layout.grid_config.cols;
        let mut changed = false;
        for item in items {
            if let Some(block) = self.layout.block_mut(&item.i) {
                let position = Self::min_size(item.position()).clamped(cols);
                if block.position != position {
                    block.position = position;
                    changed = true;
                }
            }
        }
        if changed {
            self.layout.touch();
        }
        changed
    }

    /// Adds copies of `blocks`. Ids already taken, in the layout or earlier in
    /// the batch, are replaced with fresh ones. Returns the ids as added. The
    /// batch is all or nothing.
    pub fn paste_blocks(&mut self, blocks: Vec<DashboardBlock>) -> Result<Vec<String>, EditorError> {
        if blocks.is_empty() {
            return Ok(Vec::new());
        }
        for block in &blocks {
            self.check_config(block)?;
        }

        let mut taken: HashSet<String> = self.layout.blocks.iter().map(|b| b.id().to_string()).collect();
        let mut grid = self.occupancy_without(None);
        let mut pasted = Vec::with_capacity(blocks.len());

        for block in blocks {
            let mut block = if taken.contains(block.id()) {
                block.clone_with_id(self.factory.next_id())
            } else {
                block
            };
            block.position = grid
                .place(Self::min_size(block.position))
                .ok_or_else(|| EditorError::NoRoom(block.id().to_string()))?;
            grid.occupy(&block.position);
            taken.insert(block.id().to_string());
            pasted.push(block);
        }

        let ids: Vec<String> = pasted.iter().map(|b| b.id().to_string()).collect();
        self.layout.blocks.extend(pasted);
        self.layout.touch();
        tracing::debug!(count = ids.len(), "blocks pasted");
        Ok(ids)
    }

    /// Copies a block under a fresh id, placed below the original. `Ok(None)`
    /// when no block has `id`.
    pub fn duplicate_block(&mut self, id: &str) -> Result<Option<String>, EditorError> {
        let Some(original) = self.layout.block(id) else {
            return Ok(None);
        };
        let mut copy = original.clone_with_id(self.factory.next_id());
        copy.position.y = original.position.bottom();
        copy.position = self
            .occupancy_without(None)
            .place(copy.position)
            .ok_or_else(|| EditorError::NoRoom(copy.id().to_string()))?;

        let copy_id = copy.id().to_string();
        self.layout.blocks.push(copy);
        self.layout.touch();
        Ok(Some(copy_id))
    }

    pub fn update_details(
        &mut self,
        name: Option<String>,
        description: Option<String>,
        tags: Option<Vec<String>>,
    ) -> bool {
        if name.is_none() && description.is_none() && tags.is_none() {
            return false;
        }
        if let Some(name) = name {
            self.layout.name = name;
        }
        if let Some(description) = description {
            self.layout.description = description;
        }
        if let Some(tags) = tags {
            self.layout.tags = tags;
        }
        self.layout.touch();
        true
    }

    /// Selection is UI state only and does not change the version.
    pub fn select_block(&mut self, id: Option<&str>) -> bool {
        match id {
            Some(id) if !self.layout.contains(id) => false,
            _ => {
                self.selected = id.map(str::to_string);
                true
            }
        }
    }

    /// Replaces the whole layout with a parsed document, keeping the id of the
    /// dashboard being edited. On any error the current layout and selection
    /// stay exactly as they were.
    pub fn import_layout(&mut self, json: &str) -> Result<(), EditorError> {
        let mut imported = layout_document::import_json(json).map_err(|e| {
            tracing::warn!("layout import rejected: {}", e);
            e
        })?;
        for block in &imported.blocks {
            self.check_config(block).map_err(|e| {
                tracing::warn!(block = block.id(), "layout import rejected: {}", e);
                ImportError::Invalid(format!("block `{}`: {}", block.id(), e))
            })?;
        }

        let mut seen = HashSet::new();
        for block in &mut imported.blocks {
            if !seen.insert(block.id().to_string()) {
                *block = block.clone_with_id(self.factory.next_id());
                seen.insert(block.id().to_string());
            }
        }

        imported.id = self.layout.id.clone();
        imported.metadata.version = imported.metadata.version.max(self.layout.metadata.version);
        imported.updated_at = imported.updated_at.max(self.layout.updated_at);
        imported.touch();

        tracing::info!(dashboard = %imported.id, blocks = imported.blocks.len(), "layout imported");
        self.layout = imported;
        self.selected = None;
        Ok(())
    }

    pub fn export_layout(&self) -> String {
        layout_document::export_json(&self.layout)
    }
}
