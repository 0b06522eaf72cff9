pub mod capability;
pub mod config;
pub mod engine;
pub mod error;
pub mod invoke;
pub mod loader;
pub mod registry;
pub mod result;
pub mod state_machine;

// Re-export the main struct so users can just use `astexplorer_core::ExplorerEngine`
pub use engine::{ExplorerEngine, InputOutcome};

// Re-export the simpler types for the UI and the host
pub use capability::{FnCapability, ParserCapability};
pub use config::ExplorerConfig;
pub use error::{ConfigError, InvokeError, LoadError, ParseError, TransitionError};
pub use invoke::{ParseInvoker, parse_with};
pub use loader::{ModuleLoader, bootstrap};
pub use registry::EntryPointRegistry;
pub use result::ParseResult;
pub use state_machine::LoadState;
