//! Event shape validation and the in-memory event bus.
//!
//! The schema (required and allowed field sets) is supplied by a
//! collaborator — either the built-in table or a JSON schema file — and the
//! bus checks every published event against it. Events themselves stay
//! schemaless JSON objects; only the field sets are enforced here.

use std::collections::BTreeSet;

use serde_json::Value;
use thiserror::Error;

/// Errors from event validation and schema loading.
#[derive(Error, Debug)]
pub enum EventError {
    #[error("event is not a JSON object")]
    NotAnObject,

    #[error("missing fields: {0}")]
    MissingFields(String),

    #[error("unknown fields: {0}")]
    UnknownFields(String),

    #[error("invalid event schema: {0}")]
    InvalidSchema(String),
}

/// Required and allowed field sets for run events.
#[derive(Clone, Debug)]
pub struct EventSchema {
    required: BTreeSet<String>,
    allowed: BTreeSet<String>,
}

const REQUIRED_FIELDS: [&str; 9] = [
    "event_id",
    "run_id",
    "ts_ns",
    "phase",
    "source",
    "tool",
    "target_id",
    "severity",
    "payload",
];

const OPTIONAL_FIELDS: [&str; 3] = ["semantic_tags", "compression_refs", "links"];

impl EventSchema {
    /// The built-in schema, matching `contracts/event-schema.json`.
    pub fn builtin() -> Self {
        let required: BTreeSet<String> = REQUIRED_FIELDS.iter().map(|s| s.to_string()).collect();
        let mut allowed = required.clone();
        allowed.extend(OPTIONAL_FIELDS.iter().map(|s| s.to_string()));
        Self { required, allowed }
    }

    /// Build a schema from a JSON-schema-shaped document: `required` lists
    /// the mandatory fields, `properties` keys the full allowed set.
    pub fn from_json(document: &Value) -> Result<Self, EventError> {
        let required: BTreeSet<String> = document
            .get("required")
            .and_then(Value::as_array)
            .ok_or_else(|| EventError::InvalidSchema("missing required list".to_string()))?
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();

        let allowed: BTreeSet<String> = document
            .get("properties")
            .and_then(Value::as_object)
            .ok_or_else(|| EventError::InvalidSchema("missing properties table".to_string()))?
            .keys()
            .cloned()
            .collect();

        Ok(Self { required, allowed })
    }

    /// Check an event's field sets against this schema.
    pub fn validate(&self, event: &Value) -> Result<(), EventError> {
        let fields: BTreeSet<String> = event
            .as_object()
            .ok_or(EventError::NotAnObject)?
            .keys()
            .cloned()
            .collect();

        let missing: Vec<&str> = self
            .required
            .difference(&fields)
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(EventError::MissingFields(missing.join(", ")));
        }

        let unknown: Vec<&str> = fields
            .difference(&self.allowed)
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            return Err(EventError::UnknownFields(unknown.join(", ")));
        }

        Ok(())
    }
}

impl Default for EventSchema {
    fn default() -> Self {
        Self::builtin()
    }
}

/// In-memory, caller-owned event buffer with schema validation on publish.
#[derive(Debug, Default)]
pub struct EventBus {
    schema: EventSchema,
    events: Vec<Value>,
}

impl EventBus {
    pub fn new(schema: EventSchema) -> Self {
        Self {
            schema,
            events: Vec::new(),
        }
    }

    /// Validate and buffer an event; rejected events are not buffered.
    pub fn publish(&mut self, event: Value) -> Result<(), EventError> {
        self.schema.validate(&event)?;
        self.events.push(event);
        Ok(())
    }

    pub fn events(&self) -> &[Value] {
        &self.events
    }
}
