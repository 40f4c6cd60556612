//! Tool catalog commands.

use clap::Subcommand;

use crate::error::CliResult;
use crate::output::{print_json, OutputFormat};
use crate::registry::ToolRegistry;

/// Tool catalog subcommands.
#[derive(Subcommand)]
pub enum ToolsCommands {
    /// List registered tools
    List,

    /// Show tool details
    Show { tool_id: String },

    /// Show tool health
    Doctor,

    /// Execute a registered tool
    Exec {
        tool_id: String,
        /// Arguments passed through to the tool
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        tool_args: Vec<String>,
    },
}

/// Execute a tools command.
pub fn execute(
    command: ToolsCommands,
    registry: &ToolRegistry,
    format: OutputFormat,
) -> CliResult<i32> {
    match command {
        ToolsCommands::List => {
            let cards = registry.list_cards();
            match format {
                OutputFormat::Json => print_json(&cards)?,
                OutputFormat::Text => {
                    println!("tool_id\tstatus\tcategory\taliases");
                    for card in cards {
                        let aliases = if card.aliases.is_empty() {
                            "-".to_string()
                        } else {
                            card.aliases.join(",")
                        };
                        println!(
                            "{}\t{}\t{}\t{}",
                            card.tool_id, card.status, card.category, aliases
                        );
                    }
                }
            }
            Ok(0)
        }
        ToolsCommands::Show { tool_id } => {
            let card = registry.resolve(&tool_id)?;
            match format {
                OutputFormat::Json => print_json(card)?,
                OutputFormat::Text => {
                    println!("tool_id: {}", card.tool_id);
                    println!("category: {}", card.category);
                    println!("status: {}", card.status);
                    println!("risk_level: {}", card.risk_level);
                    println!("adapter: {}", card.adapter);
                    println!("description: {}", card.description);
                    println!("help_command: {}", card.help_command);
                    let or_dash = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };
                    println!("input_schema_ref: {}", or_dash(&card.input_schema_ref));
                    println!("output_schema_ref: {}", or_dash(&card.output_schema_ref));
                    let aliases = if card.aliases.is_empty() {
                        "-".to_string()
                    } else {
                        card.aliases.join(", ")
                    };
                    println!("aliases: {aliases}");
                    println!("examples:");
                    for example in &card.examples {
                        println!("  - {example}");
                    }
                    if !card.health_reason.is_empty() {
                        println!("health_reason: {}", card.health_reason);
                    }
                }
            }
            Ok(0)
        }
        ToolsCommands::Doctor => {
            let rows = registry.doctor();
            match format {
                OutputFormat::Json => print_json(&rows)?,
                OutputFormat::Text => {
                    println!("tool_id\tstatus\tadapter\trisk_level\thealth_reason");
                    for row in rows {
                        println!(
                            "{}\t{}\t{}\t{}\t{}",
                            row.tool_id, row.status, row.adapter, row.risk_level, row.health_reason
                        );
                    }
                }
            }
            Ok(0)
        }
        ToolsCommands::Exec { tool_id, tool_args } => {
            let card = registry.resolve(&tool_id)?;
            if card.status == "blocked" {
                eprintln!("tool is blocked: {}", card.tool_id);
                return Ok(2);
            }
            // No execution adapters ship with this repo; the catalog exists
            // so operators can see what a full rig would wire in.
            let _ = tool_args;
            eprintln!("tool execution is not wired: {}", card.tool_id);
            Ok(2)
        }
    }
}
