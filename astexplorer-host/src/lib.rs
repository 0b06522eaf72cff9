use anyhow::{Context, Result};
use astexplorer_core::{EntryPointRegistry, ExplorerConfig, ParseInvoker, bootstrap};
use std::path::Path;
use std::sync::Arc;

pub mod artifact;
pub mod loader;
pub mod wasm_host;

pub use artifact::ArtifactSource;
pub use loader::WasmModuleLoader;
pub use wasm_host::{WasmHost, WasmParser};

/// Loads the parser module described by `config` and registers it.
///
/// # Arguments
/// * `config` - Artifact location and entry point name.
/// * `base_dir` - Directory that relative artifact paths resolve against.
pub async fn load_parser(config: &ExplorerConfig, base_dir: &Path) -> Result<ParseInvoker> {
    let loader = WasmModuleLoader::from_config(config, base_dir)?;
    let registry = Arc::new(EntryPointRegistry::new());

    let invoker = bootstrap(&loader, registry, &config.entry_point)
        .await
        .with_context(|| format!("Failed to load parser module from {}", loader.source()))?;

    Ok(invoker)
}
