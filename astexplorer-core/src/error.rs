use thiserror::Error;

use crate::state_machine::LoadState;

/// Failure raised by a parser capability while producing its serialized output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvokeError {
    /// The module trapped or a host call into it failed.
    #[error("entry point trapped: {0}")]
    Trap(String),

    /// The module handed back a buffer outside its own memory.
    #[error("memory access failed: {0}")]
    Memory(String),

    /// The serialized output was not UTF-8.
    #[error("entry point returned non UTF-8 output")]
    InvalidUtf8,

    /// The source is larger than the module's address space can hold.
    #[error("source too large for module memory ({0} bytes)")]
    SourceTooLarge(usize),

    /// A previous call panicked while holding the module.
    #[error("module state poisoned")]
    Poisoned,
}

/// Failure of a single parse invocation.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Nothing is registered under the entry point name (module not loaded).
    #[error("entry point `{name}` is not registered")]
    EntryPointNotRegistered { name: String },

    /// The entry point itself failed.
    #[error(transparent)]
    Invocation(#[from] InvokeError),

    /// The entry point returned text that is not valid JSON.
    #[error("malformed parse result: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Failure to fetch, instantiate or start the parser module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("failed to fetch `{location}`: {reason}")]
    Fetch { location: String, reason: String },

    #[error("failed to instantiate module: {0}")]
    Instantiate(String),

    #[error("module does not export `{name}`")]
    MissingExport { name: String },
}

/// Rejected state machine transition. The state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot move from {from} to {to}")]
pub struct TransitionError {
    pub from: LoadState,
    pub to: &'static str,
}

/// Failure while assembling the explorer configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Invalid {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}
