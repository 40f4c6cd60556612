//! Tool catalog: cards describing the external collectors a debugging run
//! can lean on, with alias resolution and health reporting.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from tool registration and lookup.
#[derive(Error, Debug)]
pub enum ToolRegistryError {
    #[error("duplicate tool_id: {0}")]
    DuplicateTool(String),

    #[error("duplicate alias: {alias} -> {tool_id}")]
    DuplicateAlias { alias: String, tool_id: String },

    #[error("unknown tool: {0}")]
    UnknownTool(String),
}

/// Catalog entry for one external tool.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCard {
    pub tool_id: String,
    pub category: String,
    pub description: String,
    pub examples: Vec<String>,
    pub help_command: String,
    pub risk_level: String,
    pub adapter: String,
    #[serde(default)]
    pub input_schema_ref: String,
    #[serde(default)]
    pub output_schema_ref: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub status: String,
    #[serde(default)]
    pub health_reason: String,
}

/// Caller-owned tool catalog with alias resolution.
#[derive(Default)]
pub struct ToolRegistry {
    cards: HashMap<String, ToolCard>,
    aliases: HashMap<String, String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a card; duplicate ids and duplicate aliases are conflicts.
    pub fn register(&mut self, card: ToolCard) -> Result<(), ToolRegistryError> {
        if self.cards.contains_key(&card.tool_id) {
            return Err(ToolRegistryError::DuplicateTool(card.tool_id));
        }
        for alias in &card.aliases {
            if let Some(existing) = self.aliases.get(alias) {
                return Err(ToolRegistryError::DuplicateAlias {
                    alias: alias.clone(),
                    tool_id: existing.clone(),
                });
            }
        }
        for alias in &card.aliases {
            self.aliases.insert(alias.clone(), card.tool_id.clone());
        }
        self.cards.insert(card.tool_id.clone(), card);
        Ok(())
    }

    /// Look up by tool id or alias.
    pub fn resolve(&self, tool_key: &str) -> Result<&ToolCard, ToolRegistryError> {
        let tool_id = self.aliases.get(tool_key).map(String::as_str).unwrap_or(tool_key);
        self.cards
            .get(tool_id)
            .ok_or_else(|| ToolRegistryError::UnknownTool(tool_key.to_string()))
    }

    /// All cards sorted by tool id.
    pub fn list_cards(&self) -> Vec<&ToolCard> {
        let mut ids: Vec<&String> = self.cards.keys().collect();
        ids.sort();
        ids.into_iter().map(|id| &self.cards[id]).collect()
    }

    /// Health rows for `tools doctor`.
    pub fn doctor(&self) -> Vec<DoctorRow> {
        self.list_cards()
            .into_iter()
            .map(|card| DoctorRow {
                tool_id: card.tool_id.clone(),
                status: card.status.clone(),
                adapter: card.adapter.clone(),
                risk_level: card.risk_level.clone(),
                health_reason: if card.health_reason.is_empty() {
                    "-".to_string()
                } else {
                    card.health_reason.clone()
                },
            })
            .collect()
    }
}

/// One row of `tools doctor` output.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DoctorRow {
    pub tool_id: String,
    pub status: String,
    pub adapter: String,
    pub risk_level: String,
    pub health_reason: String,
}

/// The stock cards for the collectors a gateway debugging rig uses.
pub fn default_cards() -> Vec<ToolCard> {
    vec![
        ToolCard {
            tool_id: "syslog.collect".to_string(),
            category: "collector".to_string(),
            description: "Pull the target's syslog ring buffer into the run's event log."
                .to_string(),
            examples: vec![
                "faultline tools exec syslog.collect -- --target board-01".to_string(),
            ],
            help_command: "faultline tools show syslog.collect".to_string(),
            risk_level: "low".to_string(),
            adapter: "external-command".to_string(),
            input_schema_ref: String::new(),
            output_schema_ref: "contracts/event-schema.json".to_string(),
            aliases: vec!["syslog".to_string()],
            status: "healthy".to_string(),
            health_reason: String::new(),
        },
        ToolCard {
            tool_id: "hlapi.discovery".to_string(),
            category: "collector".to_string(),
            description: "Probe the target for supported HLAPI paths and persist discovery records."
                .to_string(),
            examples: vec![
                "faultline tools exec hlapi.discovery -- --target board-01".to_string(),
            ],
            help_command: "faultline tools show hlapi.discovery".to_string(),
            risk_level: "low".to_string(),
            adapter: "external-command".to_string(),
            input_schema_ref: String::new(),
            output_schema_ref: String::new(),
            aliases: vec!["hlapi-scan".to_string(), "discovery".to_string()],
            status: "healthy".to_string(),
            health_reason: String::new(),
        },
    ]
}

/// Registry pre-loaded with the stock cards.
pub fn build_default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    for card in default_cards() {
        // Stock cards are statically consistent; a clash here is a bug in
        // this module, not user input.
        registry
            .register(card)
            .expect("default tool cards must not conflict");
    }
    registry
}
