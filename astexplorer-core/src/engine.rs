use crate::capability::ParserCapability;
use crate::config::ExplorerConfig;
use crate::error::{LoadError, ParseError, TransitionError};
use crate::invoke::ParseInvoker;
use crate::loader::ModuleLoader;
use crate::registry::EntryPointRegistry;
use crate::state_machine::{LoadState, StateMachine};

use std::sync::Arc;

/// What happened to one input change.
#[derive(Debug)]
pub enum InputOutcome {
    /// The module is not Ready; the parser was not called.
    NotReady,
    /// The output was replaced with a fresh rendering.
    Rendered,
    /// The parse failed; the previous output is kept.
    Failed(ParseError),
}

/// The UI-independent half of the explorer.
/// The bridge holds one instance of this and forwards input edits to it.
#[derive(Debug)]
pub struct ExplorerEngine {
    machine: StateMachine,
    registry: Arc<EntryPointRegistry>,
    // Only populated once the state machine reaches Ready.
    invoker: Option<ParseInvoker>,
    entry_point: String,
    indent: usize,
    output: String,
    last_error: Option<String>,
    parse_count: usize,
}

impl ExplorerEngine {
    pub fn new(config: &ExplorerConfig, registry: Arc<EntryPointRegistry>) -> Self {
        Self {
            machine: StateMachine::new(),
            registry,
            invoker: None,
            entry_point: config.entry_point.clone(),
            indent: config.indent,
            output: String::new(),
            last_error: None,
            parse_count: 0,
        }
    }

    pub fn state(&self) -> &LoadState {
        self.machine.state()
    }

    pub fn is_ready(&self) -> bool {
        self.machine.state().is_ready()
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Number of times the parser has actually been invoked.
    pub fn parse_count(&self) -> usize {
        self.parse_count
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// `Unloaded -> Loading`.
    pub fn begin_loading(&mut self) -> Result<(), TransitionError> {
        self.machine.begin_loading()?;
        tracing::info!("Loading parser module (entry point `{}`)", self.entry_point);
        Ok(())
    }

    /// Apply the loader's outcome: register and go Ready, or go Failed.
    pub fn finish_loading(
        &mut self,
        outcome: Result<Arc<dyn ParserCapability>, LoadError>,
    ) -> Result<(), TransitionError> {
        match outcome {
            Ok(capability) => {
                self.machine.mark_ready()?;
                self.registry.register(&self.entry_point, capability);
                self.invoker = Some(ParseInvoker::new(
                    self.registry.clone(),
                    self.entry_point.clone(),
                ));
                tracing::info!("Parser module ready");
            }
            Err(e) => {
                self.machine.mark_failed(e.to_string())?;
                tracing::error!("Parser module failed to load: {}", e);
            }
        }
        Ok(())
    }

    /// Run the whole load cycle against `loader`.
    pub async fn boot(&mut self, loader: &dyn ModuleLoader) -> Result<(), TransitionError> {
        self.begin_loading()?;
        let outcome = loader.load().await;
        self.finish_loading(outcome)
    }

    /// Input listener. A no-op until Ready.
    pub fn on_input(&mut self, source: &str) -> InputOutcome {
        let Some(invoker) = self.invoker.as_ref() else {
            return InputOutcome::NotReady;
        };

        self.parse_count += 1;
        match invoker.parse(source) {
            Ok(result) => {
                self.output = result.render(self.indent);
                self.last_error = None;
                InputOutcome::Rendered
            }
            Err(e) => {
                tracing::warn!("Parse failed: {}", e);
                self.last_error = Some(e.to_string());
                InputOutcome::Failed(e)
            }
        }
    }
}
