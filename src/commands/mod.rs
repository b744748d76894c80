use clap::ValueEnum;
use std::io::{self, Write};

mod config_cmd;
mod destination;
mod sync_cmd;
mod trip;

pub use config_cmd::ConfigCommand;
pub use destination::DestinationCommand;
pub use sync_cmd::SyncCommand;
pub use trip::TripCommand;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Asks a yes/no question on stdin. Anything but `y` is a no.
fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// Shortens `text` to at most `width` characters, ending in "..." when cut.
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", kept)
}
