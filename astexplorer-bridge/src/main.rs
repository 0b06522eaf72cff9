use astexplorer_bridge::app::boot;
use astexplorer_bridge::update::update;
use astexplorer_bridge::view_ui::{theme, title, view};

use iced::Settings;

pub fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    eprintln!("=== AST Explorer Starting ===");

    let settings = Settings {
        antialiasing: true,
        ..Settings::default()
    };

    iced::application(boot, update, view)
        .title(title)
        .theme(theme)
        .settings(settings)
        .run()
}
