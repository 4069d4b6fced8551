// Application layer - Editor use cases and ports
pub mod autosave;
pub mod block_factory;
pub mod dashboard_repository;
pub mod dashboard_service;
pub mod editor_session;
pub mod grid_adapter;
pub mod layout_editor;
pub mod notifications;
