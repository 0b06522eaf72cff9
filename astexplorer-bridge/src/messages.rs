//! Message enum.

use astexplorer_core::{LoadError, ParserCapability};

use std::sync::Arc;

use iced::widget::text_editor;

#[derive(Clone, Debug)]
pub enum Message {
    /// The module loader resolved.
    ModuleLoaded(Result<Arc<dyn ParserCapability>, LoadError>),

    /// Cursor, selection or edit in the source editor.
    SourceEdited(text_editor::Action),
}
