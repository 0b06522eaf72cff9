use crate::artifact::ArtifactSource;
use crate::wasm_host::WasmHost;

use astexplorer_core::{ExplorerConfig, LoadError, ModuleLoader, ParserCapability};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Fetches the parser artifact and brings it up inside a [`WasmHost`].
#[derive(Debug, Clone)]
pub struct WasmModuleLoader {
    host: WasmHost,
    source: ArtifactSource,
    entry_point: String,
}

impl WasmModuleLoader {
    pub fn new(host: WasmHost, source: ArtifactSource, entry_point: impl Into<String>) -> Self {
        Self {
            host,
            source,
            entry_point: entry_point.into(),
        }
    }

    /// Loader for `config`, resolving relative artifact paths against `base_dir`.
    pub fn from_config(config: &ExplorerConfig, base_dir: &Path) -> anyhow::Result<Self> {
        Ok(Self::new(
            WasmHost::new()?,
            ArtifactSource::from_location(&config.artifact, base_dir),
            config.entry_point.clone(),
        ))
    }

    pub fn source(&self) -> &ArtifactSource {
        &self.source
    }
}

#[async_trait]
impl ModuleLoader for WasmModuleLoader {
    async fn load(&self) -> Result<Arc<dyn ParserCapability>, LoadError> {
        tracing::info!("Fetching parser module from {}", self.source);
        let bytes = self.source.fetch().await?;
        tracing::info!("Fetched {} bytes, instantiating", bytes.len());

        // Compilation is CPU bound; keep it off the async workers.
        let host = self.host.clone();
        let entry_point = self.entry_point.clone();
        let parser = tokio::task::spawn_blocking(move || host.instantiate(&bytes, &entry_point))
            .await
            .map_err(|e| LoadError::Instantiate(format!("instantiation task failed: {}", e)))??;

        Ok(Arc::new(parser))
    }
}
