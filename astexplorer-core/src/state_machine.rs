use crate::error::TransitionError;
use std::fmt;

/// Lifecycle of the parser module as seen by the UI.
///
/// `Unloaded -> Loading -> Ready`, or `Loading -> Failed`. Nothing leaves
/// `Ready` or `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Unloaded,
    Loading,
    Ready,
    Failed(String),
}

impl LoadState {
    pub fn is_ready(&self) -> bool {
        matches!(self, LoadState::Ready)
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoadState::Unloaded => "Unloaded",
            LoadState::Loading => "Loading",
            LoadState::Ready => "Ready",
            LoadState::Failed(_) => "Failed",
        }
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Guards the load lifecycle. Every transition is checked.
#[derive(Debug, Default)]
pub struct StateMachine {
    state: LoadState,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// `Unloaded -> Loading`. Fired once at start-up.
    pub fn begin_loading(&mut self) -> Result<(), TransitionError> {
        self.advance("Loading", |s| matches!(s, LoadState::Unloaded), LoadState::Loading)
    }

    /// `Loading -> Ready`. Fired when the loader resolves.
    pub fn mark_ready(&mut self) -> Result<(), TransitionError> {
        self.advance("Ready", |s| matches!(s, LoadState::Loading), LoadState::Ready)
    }

    /// `Loading -> Failed`. The explorer stays non-interactive.
    pub fn mark_failed(&mut self, reason: impl Into<String>) -> Result<(), TransitionError> {
        self.advance(
            "Failed",
            |s| matches!(s, LoadState::Loading),
            LoadState::Failed(reason.into()),
        )
    }

    fn advance(
        &mut self,
        to: &'static str,
        allowed: impl Fn(&LoadState) -> bool,
        next: LoadState,
    ) -> Result<(), TransitionError> {
        if !allowed(&self.state) {
            return Err(TransitionError {
                from: self.state.clone(),
                to,
            });
        }
        tracing::debug!("Load state {} -> {}", self.state, to);
        self.state = next;
        Ok(())
    }
}
