use crate::application::autosave::DEFAULT_QUIESCENCE_WINDOW;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub editor: EditorSettings,
    pub storage: StorageSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EditorSettings {
    pub autosave: bool,
    pub autosave_window_ms: u64,
}

impl EditorSettings {
    pub fn autosave_window(&self) -> Option<Duration> {
        self.autosave
            .then(|| Duration::from_millis(self.autosave_window_ms))
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    File,
    Rest,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    pub dir: PathBuf,
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

/// Layered configuration: built-in defaults, then `config/dashboards.*` if
/// present, then `DASHBOARDS__SECTION__KEY` environment variables.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = base_builder()?
        .add_source(config::File::with_name("config/dashboards").required(false))
        .add_source(config::Environment::with_prefix("DASHBOARDS").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

fn base_builder() -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
    Ok(config::Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("editor.autosave", true)?
        .set_default("editor.autosave_window_ms", DEFAULT_QUIESCENCE_WINDOW.as_millis() as u64)?
        .set_default("storage.backend", "file")?
        .set_default("storage.dir", "data/dashboards")?
        .set_default("storage.timeout_secs", 10)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: AppConfig = base_builder().unwrap().build().unwrap().try_deserialize().unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.editor.autosave_window(), Some(Duration::from_secs(2)));
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert!(config.storage.base_url.is_none());
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let toml = r#"
            [editor]
            autosave = false

            [storage]
            backend = "rest"
            base_url = "http://backend:8000/api"
        "#;
        let config: AppConfig = base_builder()
            .unwrap()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.editor.autosave_window(), None);
        assert_eq!(config.storage.backend, StorageBackend::Rest);
        assert_eq!(config.storage.base_url.as_deref(), Some("http://backend:8000/api"));
        assert_eq!(config.editor.autosave_window_ms, 2000);
    }
}
