// Editor session - A layout editor wired to persistence and notifications
use crate::application::autosave::AutoSaveHandle;
use crate::application::block_factory::Placement;
use crate::application::dashboard_repository::DashboardRepository;
use crate::application::grid_adapter::{self, Breakpoint, GridItem, ResponsiveGrid};
use crate::application::layout_editor::{BlockPatch, EditorError, LayoutEditor};
use crate::application::notifications::{NotificationHub, NotificationKind};
use crate::domain::block::{DashboardBlock, GridPosition};
use crate::domain::layout::DashboardLayout;
use std::sync::Arc;

/// One open dashboard. Every mutation that changes the layout schedules an
/// auto-save; rejected operations are returned to the caller and published
/// as notifications.
pub struct EditorSession {
    editor: LayoutEditor,
    autosave: Option<AutoSaveHandle>,
    repository: Arc<dyn DashboardRepository>,
    notifications: NotificationHub,
    closed: bool,
}

impl EditorSession {
    pub fn new(
        editor: LayoutEditor,
        autosave: Option<AutoSaveHandle>,
        repository: Arc<dyn DashboardRepository>,
        notifications: NotificationHub,
    ) -> Self {
        Self {
            editor,
            autosave,
            repository,
            notifications,
            closed: false,
        }
    }

    pub fn layout(&self) -> &DashboardLayout {
        self.editor.layout()
    }

    pub fn dashboard_id(&self) -> &str {
        &self.editor.layout().id
    }

    pub fn selected(&self) -> Option<&str> {
        self.editor.selected()
    }

    pub fn version(&self) -> u64 {
        self.editor.version()
    }

    fn changed(&self, changed: bool) -> bool {
        if changed {
            if let Some(autosave) = &self.autosave {
                autosave.schedule(self.editor.layout().clone());
            }
        }
        changed
    }

    fn report<T>(&self, result: Result<T, EditorError>) -> Result<T, EditorError> {
        if let Err(e) = &result {
            let kind = match e {
                EditorError::TemplateNotFound(_) => NotificationKind::TemplateMissing,
                EditorError::DuplicateBlockId(_) => NotificationKind::DuplicateId,
                EditorError::InvalidConfig(_) => NotificationKind::InvalidConfig,
                EditorError::InvalidImport(_) => NotificationKind::InvalidImport,
                EditorError::NoRoom(_) => NotificationKind::GridFull,
                EditorError::Persistence(_) => NotificationKind::PersistenceFailure,
            };
            self.notifications.error(self.dashboard_id(), kind, e.to_string());
        }
        result
    }

    pub fn add_block(&mut self, block: DashboardBlock) -> Result<(), EditorError> {
        let result = self.editor.add_block(block);
        self.changed(result.is_ok());
        self.report(result)
    }

    pub fn add_from_template(&mut self, template_id: &str, placement: Placement) -> Result<String, EditorError> {
        let result = self.editor.add_from_template(template_id, placement);
        self.changed(result.is_ok());
        self.report(result)
    }

    pub fn update_block(&mut self, id: &str, patch: BlockPatch) -> Result<bool, EditorError> {
        let result = self.editor.update_block(id, patch);
        self.changed(matches!(result, Ok(true)));
        self.report(result)
    }

    pub fn delete_block(&mut self, id: &str) -> bool {
        let deleted = self.editor.delete_block(id);
        self.changed(deleted)
    }

    pub fn reorder_blocks(&mut self, from: usize, to: usize) -> bool {
        let moved = self.editor.reorder_blocks(from, to);
        self.changed(moved)
    }

    pub fn reposition_block(&mut self, id: &str, position: GridPosition) -> bool {
        let moved = self.editor.reposition_block(id, position);
        self.changed(moved)
    }

    pub fn paste_blocks(&mut self, blocks: Vec<DashboardBlock>) -> Result<Vec<String>, EditorError> {
        let requested: Vec<String> = blocks.iter().map(|b| b.id().to_string()).collect();
        let pasted = self.editor.paste_blocks(blocks);
        let ids = self.report(pasted)?;

        let renamed = requested.iter().zip(&ids).filter(|(a, b)| a != b).count();
        if renamed > 0 {
            self.notifications.warning(
                self.dashboard_id(),
                NotificationKind::DuplicateId,
                format!("{} pasted block(s) were given new ids", renamed),
            );
        }
        self.changed(!ids.is_empty());
        Ok(ids)
    }

    pub fn duplicate_block(&mut self, id: &str) -> Result<Option<String>, EditorError> {
        let result = self.editor.duplicate_block(id);
        self.changed(matches!(result, Ok(Some(_))));
        self.report(result)
    }

    pub fn update_details(
        &mut self,
        name: Option<String>,
        description: Option<String>,
        tags: Option<Vec<String>>,
    ) -> bool {
        let changed = self.editor.update_details(name, description, tags);
        self.changed(changed)
    }

    pub fn select_block(&mut self, id: Option<&str>) -> bool {
        self.editor.select_block(id)
    }

    pub fn responsive_grid(&self) -> ResponsiveGrid {
        grid_adapter::derive_responsive(self.editor.layout())
    }

    /// Drag/resize results from the grid. Only the canonical breakpoint
    /// changes the stored layout.
    pub fn apply_grid_changes(&mut self, breakpoint: Breakpoint, items: Vec<GridItem>) -> bool {
        let Some(items) = grid_adapter::writeback(breakpoint, items) else {
            return false;
        };
        let changed = self.editor.apply_grid_changes(&items);
        self.changed(changed)
    }

    pub fn import_layout(&mut self, json: &str) -> Result<(), EditorError> {
        let result = self.editor.import_layout(json);
        self.changed(result.is_ok());
        self.report(result)
    }

    pub fn export_layout(&self) -> String {
        self.editor.export_layout()
    }

    /// Explicit save; never debounced or skipped. On failure the in-memory
    /// layout is kept as is and the error is reported.
    pub async fn save(&self) -> Result<(), EditorError> {
        let snapshot = self.editor.layout().clone();
        match self.repository.save_dashboard(&snapshot).await {
            Ok(()) => {
                tracing::info!(dashboard = %snapshot.id, version = snapshot.metadata.version, "dashboard saved");
                if !self.closed {
                    self.notifications.info(&snapshot.id, NotificationKind::Saved, "Dashboard saved");
                }
                Ok(())
            }
            Err(e) => {
                tracing::error!(dashboard = %snapshot.id, "save failed: {:#}", e);
                let error = EditorError::Persistence(e.to_string());
                if self.closed {
                    return Err(error);
                }
                self.report(Err(error))
            }
        }
    }

    /// Cancels any pending auto-save. The session accepts no further
    /// notifications after this.
    pub fn close(&mut self) {
        if let Some(autosave) = self.autosave.take() {
            autosave.cancel();
        }
        self.closed = true;
        tracing::debug!(dashboard = %self.dashboard_id(), "editor session closed");
    }
}
