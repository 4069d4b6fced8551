// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod event_stream;
pub mod file_repository;
pub mod http_response;
pub mod layout_document;
pub mod memory_repository;
pub mod rest_repository;
