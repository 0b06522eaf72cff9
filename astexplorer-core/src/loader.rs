use crate::capability::ParserCapability;
use crate::error::LoadError;
use crate::invoke::ParseInvoker;
use crate::registry::EntryPointRegistry;

use async_trait::async_trait;
use std::sync::Arc;

/// Anything that can bring the external parser to life.
///
/// The single suspension point of the explorer: implementations fetch and
/// instantiate the module, run its start routine, and hand back the parse
/// capability it provides.
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn ParserCapability>, LoadError>;
}

/// Await `loader`, install its capability under `entry_point`, and return an
/// invoker bound to it.
pub async fn bootstrap(
    loader: &dyn ModuleLoader,
    registry: Arc<EntryPointRegistry>,
    entry_point: &str,
) -> Result<ParseInvoker, LoadError> {
    let capability = loader.load().await?;
    registry.register(entry_point, capability);
    Ok(ParseInvoker::new(registry, entry_point))
}
