//! The parser as a capability.
//!
//! The external parser is never called directly. Whatever provides it (a
//! loaded WASM module, a test double) implements [`ParserCapability`] and is
//! handed around as `Arc<dyn ParserCapability>`.

use crate::error::InvokeError;
use std::fmt;

/// One operation: turn source text into the parser's serialized result.
pub trait ParserCapability: Send + Sync + fmt::Debug {
    fn parse_raw(&self, source: &str) -> Result<String, InvokeError>;
}

/// Adapts a plain closure into a [`ParserCapability`].
pub struct FnCapability<F> {
    label: &'static str,
    func: F,
}

impl<F> FnCapability<F>
where
    F: Fn(&str) -> Result<String, InvokeError> + Send + Sync,
{
    pub fn new(label: &'static str, func: F) -> Self {
        Self { label, func }
    }
}

impl<F> fmt::Debug for FnCapability<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCapability")
            .field("label", &self.label)
            .finish()
    }
}

impl<F> ParserCapability for FnCapability<F>
where
    F: Fn(&str) -> Result<String, InvokeError> + Send + Sync,
{
    fn parse_raw(&self, source: &str) -> Result<String, InvokeError> {
        (self.func)(source)
    }
}
