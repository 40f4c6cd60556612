//! Output formatting for the CLI.

use clap::ValueEnum;

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable key/value lines.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Print a payload as pretty JSON.
pub fn print_json(payload: &impl serde::Serialize) -> crate::error::CliResult<()> {
    println!("{}", serde_json::to_string_pretty(payload)?);
    Ok(())
}
