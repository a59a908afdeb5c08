//! Control commands read line-by-line from the UI side.

use crate::adapter::Command;

/// Parse one line of control input. Unknown input yields `None`.
#[must_use]
pub fn parse_command(line: &str) -> Option<Command> {
    match line.trim().to_lowercase().as_str() {
        "toggle" | "play-pause" => Some(Command::TogglePlay),
        "next" => Some(Command::NextTrack),
        "previous" | "prev" => Some(Command::PreviousTrack),
        "logout" => Some(Command::LogOut),
        "quit" | "stop" => Some(Command::Stop),
        "" => None,
        other => {
            tracing::debug!(%other, "Ignoring unknown control command");
            None
        }
    }
}
