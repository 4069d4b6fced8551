// Domain layer - Dashboard blocks, layouts and templates
pub mod block;
pub mod block_config;
pub mod layout;
pub mod occupancy;
pub mod template;
