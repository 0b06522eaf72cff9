//! View / UI rendering.
//!
//! Source editor on the left, rendered parse result on the right. The editor
//! only gets an action handler once the module is Ready, so it stays
//! read-only until then.

use crate::app::ExplorerApp;
use crate::messages::Message;

use astexplorer_core::LoadState;

use iced::widget::{column, container, row, scrollable, text, text_editor};
use iced::{Color, Element, Font, Length, Theme};

// ────────────────────────────────────────────────────────────────
// Title & Theme
// ────────────────────────────────────────────────────────────────

pub fn title(app: &ExplorerApp) -> String {
    match app.engine.state() {
        LoadState::Unloaded | LoadState::Loading => "AST Explorer /// Loading...".into(),
        LoadState::Ready => "AST Explorer".into(),
        LoadState::Failed(e) => format!("AST Explorer /// ERROR: {}", truncate(e, 60)),
    }
}

pub fn theme(_: &ExplorerApp) -> Theme {
    Theme::Dark
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ────────────────────────────────────────────────────────────────
// View
// ────────────────────────────────────────────────────────────────

pub fn view(app: &ExplorerApp) -> Element<'_, Message> {
    let status_color = match app.engine.state() {
        LoadState::Failed(_) => Color::from_rgb(1.0, 0.4, 0.4),
        _ if app.engine.last_error().is_some() => Color::from_rgb(1.0, 0.7, 0.3),
        _ => Color::from_rgb(0.5, 0.55, 0.6),
    };

    let mut status_lines = column![];
    if let Some(warning) = &app.config_warning {
        status_lines = status_lines.push(
            text(warning.as_str())
                .font(Font::MONOSPACE)
                .size(12)
                .color(Color::from_rgb(1.0, 0.7, 0.3)),
        );
    }
    status_lines = status_lines.push(
        text(app.status.as_str())
            .font(Font::MONOSPACE)
            .size(12)
            .color(status_color),
    );

    let status_bar = container(status_lines)
        .width(Length::Fill)
        .padding([3.0, 12.0])
        .style(status_bar_style);

    // ── Source editor (input) ──
    let mut editor = text_editor(&app.source)
        .placeholder("Type source code…")
        .font(Font::MONOSPACE)
        .size(14)
        .height(Length::Fill);

    if app.engine.is_ready() {
        editor = editor.on_action(Message::SourceEdited);
    }

    // ── Rendered result (output) ──
    let output = scrollable(
        container(text(app.engine.output()).font(Font::MONOSPACE).size(14))
            .padding([5, 10])
            .width(Length::Fill),
    )
        .height(Length::Fill)
        .width(Length::Fill);

    let panes = row![
        container(editor).width(Length::FillPortion(1)).height(Length::Fill),
        container(output).width(Length::FillPortion(1)).height(Length::Fill),
    ]
        .spacing(10)
        .padding(10)
        .height(Length::Fill);

    column![status_bar, panes]
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

// ────────────────────────────────────────────────────────────────
// Status bar styling
// ────────────────────────────────────────────────────────────────

fn status_bar_style(_theme: &Theme) -> iced::widget::container::Style {
    iced::widget::container::Style {
        background: Some(iced::Background::Color(Color::from_rgba(
            0.08, 0.09, 0.1, 1.0,
        ))),
        border: iced::Border {
            color: Color::from_rgb(0.2, 0.22, 0.25),
            width: 1.0,
            radius: 0.0.into(),
        },
        ..iced::widget::container::Style::default()
    }
}
