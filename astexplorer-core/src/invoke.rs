use crate::capability::ParserCapability;
use crate::error::ParseError;
use crate::registry::EntryPointRegistry;
use crate::result::ParseResult;

use std::sync::Arc;

/// Forward `source` to `capability` and decode what comes back.
///
/// No transformation happens beyond the JSON decode.
pub fn parse_with(capability: &dyn ParserCapability, source: &str) -> Result<ParseResult, ParseError> {
    let raw = capability.parse_raw(source)?;
    let result = ParseResult::decode(&raw)?;
    Ok(result)
}

/// Parse invocation bound to a named entry point in a registry.
#[derive(Debug, Clone)]
pub struct ParseInvoker {
    registry: Arc<EntryPointRegistry>,
    entry_point: String,
}

impl ParseInvoker {
    pub fn new(registry: Arc<EntryPointRegistry>, entry_point: impl Into<String>) -> Self {
        Self {
            registry,
            entry_point: entry_point.into(),
        }
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub fn registry(&self) -> &Arc<EntryPointRegistry> {
        &self.registry
    }

    /// Look up the entry point, call it with `source`, decode the output.
    pub fn parse(&self, source: &str) -> Result<ParseResult, ParseError> {
        let capability = self.registry.lookup(&self.entry_point)?;
        tracing::debug!("Parsing {} bytes via `{}`", source.len(), self.entry_point);
        parse_with(capability.as_ref(), source)
    }
}
