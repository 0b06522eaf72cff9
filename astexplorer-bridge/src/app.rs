//! Application state and boot logic.

use crate::messages::Message;

use astexplorer_core::{
    ConfigError, EntryPointRegistry, ExplorerConfig, ExplorerEngine, LoadError, ModuleLoader,
};
use astexplorer_host::WasmModuleLoader;

use std::path::PathBuf;
use std::sync::Arc;

use iced::Task;
use iced::widget::text_editor;

// ────────────────────────────────────────────────────────────────
// ExplorerApp
// ────────────────────────────────────────────────────────────────

pub struct ExplorerApp {
    pub engine: ExplorerEngine,
    pub config: ExplorerConfig,

    /// Directory relative artifact paths resolve against.
    pub base_dir: PathBuf,

    /// The source editor (input control).
    pub source: text_editor::Content,

    /// One-line status shown above the panes.
    pub status: String,

    /// Set when the config could not be read and the defaults are in use.
    pub config_warning: Option<String>,
}

impl ExplorerApp {
    pub fn new(config: ExplorerConfig, base_dir: PathBuf) -> Self {
        let engine = ExplorerEngine::new(&config, Arc::new(EntryPointRegistry::new()));
        Self {
            engine,
            config,
            base_dir,
            source: text_editor::Content::new(),
            status: String::new(),
            config_warning: None,
        }
    }

    /// `Unloaded -> Loading`, returning the task that resolves the load.
    pub fn start_loading(&mut self) -> Task<Message> {
        if let Err(e) = self.engine.begin_loading() {
            tracing::warn!("Ignoring load request: {}", e);
            return Task::none();
        }
        self.status = format!("⏳ Loading parser from {} …", self.config.artifact);

        let config = self.config.clone();
        let base_dir = self.base_dir.clone();

        Task::perform(
            async move {
                let loader = WasmModuleLoader::from_config(&config, &base_dir)
                    .map_err(|e| LoadError::Instantiate(format!("{:#}", e)))?;
                loader.load().await
            },
            Message::ModuleLoaded,
        )
    }
}

// ────────────────────────────────────────────────────────────────
// Boot
// ────────────────────────────────────────────────────────────────

pub fn boot() -> (ExplorerApp, Task<Message>) {
    let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    boot_with(ExplorerConfig::load(), base_dir)
}

/// Start the app from an already-resolved config. A config error falls back
/// to the defaults and stays visible in the status line.
pub fn boot_with(
    config: Result<ExplorerConfig, ConfigError>,
    base_dir: PathBuf,
) -> (ExplorerApp, Task<Message>) {
    let (config, config_error) = match config {
        Ok(config) => (config, None),
        Err(e) => {
            tracing::warn!("Config error, falling back to defaults: {}", e);
            (ExplorerConfig::default(), Some(e))
        }
    };

    let mut app = ExplorerApp::new(config, base_dir);
    let task = app.start_loading();

    if let Some(e) = config_error {
        let warning = format!("⚠️ Config error: {} (using defaults)", e);
        app.status = format!("{} | {}", warning, app.status);
        app.config_warning = Some(warning);
    }

    (app, task)
}
