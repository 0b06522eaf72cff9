//! Update logic — the central message handler.

use crate::app::ExplorerApp;
use crate::messages::Message;

use astexplorer_core::{InputOutcome, LoadState};

use iced::Task;

pub fn update(app: &mut ExplorerApp, message: Message) -> Task<Message> {
    match message {
        // ────────────────────────────────────────────────────
        // Module lifecycle
        // ────────────────────────────────────────────────────

        Message::ModuleLoaded(outcome) => {
            if let Err(e) = app.engine.finish_loading(outcome) {
                tracing::warn!("Dropping load result: {}", e);
                return Task::none();
            }

            app.status = match app.engine.state() {
                LoadState::Ready => format!(
                    "⚡ Parser ready ({}). Start typing.",
                    app.engine.entry_point()
                ),
                LoadState::Failed(reason) => format!("❌ LOAD FAILED: {}", reason),
                other => format!("… {}", other),
            };
            Task::none()
        }

        // ────────────────────────────────────────────────────
        // Input
        // ────────────────────────────────────────────────────

        Message::SourceEdited(action) => {
            // The editor is only wired up once Ready; anything earlier is stale.
            if !app.engine.is_ready() {
                return Task::none();
            }

            let is_edit = action.is_edit();
            app.source.perform(action);

            if is_edit {
                let source = app.source.text();
                apply_source(app, &source);
            }
            Task::none()
        }
    }
}

/// Run one parse for `source` and refresh the status line.
pub fn apply_source(app: &mut ExplorerApp, source: &str) {
    match app.engine.on_input(source) {
        InputOutcome::Rendered => {
            app.status = format!("✅ Parsed {} bytes", source.len());
        }
        InputOutcome::Failed(e) => {
            app.status = format!("❌ {}", e);
        }
        InputOutcome::NotReady => {}
    }
}
