//! Semantic-compression lexicon: an ordered table of reversible
//! text-pattern ↔ short-token substitutions.
//!
//! Encoding is plain substring substitution applied in table order, so the
//! ordering of entries is significant when patterns overlap. Decoding
//! applies the inverse substitution in the same order; any line built
//! purely from known patterns round-trips exactly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which pipeline stage an entry's vocabulary belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LexiconTier {
    Summary,
    Semantic,
}

/// One substitution rule.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LexiconEntry {
    pub lexicon_id: String,
    pub token: String,
    pub original_pattern: String,
    /// How to invert the rule; only "token-replace" exists today.
    pub reverse_rule: String,
    pub tier: LexiconTier,
    pub created_at: DateTime<Utc>,
}

/// Versioned, mostly static substitution table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Lexicon {
    version: String,
    entries: Vec<LexiconEntry>,
}

impl Lexicon {
    pub fn new(version: impl Into<String>, entries: Vec<LexiconEntry>) -> Self {
        Self {
            version: version.into(),
            entries,
        }
    }

    /// The built-in vocabulary for debug-run summaries.
    pub fn default_entries() -> Vec<LexiconEntry> {
        let now = Utc::now();
        let entry = |id: &str, token: &str, pattern: &str, tier: LexiconTier| LexiconEntry {
            lexicon_id: id.to_string(),
            token: token.to_string(),
            original_pattern: pattern.to_string(),
            reverse_rule: "token-replace".to_string(),
            tier,
            created_at: now,
        };
        vec![
            entry(
                "lex-001",
                "[rc_ok]",
                "root cause hypothesis accepted",
                LexiconTier::Semantic,
            ),
            entry(
                "lex-002",
                "[blk_evt]",
                "missing evidence trace.captured",
                LexiconTier::Semantic,
            ),
            entry("lex-003", "[wf_run]", "workflow run", LexiconTier::Summary),
        ]
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn entries(&self) -> &[LexiconEntry] {
        &self.entries
    }

    /// Replace every occurrence of each original pattern with its token,
    /// in table order.
    pub fn encode_line(&self, text: &str) -> String {
        let mut output = text.to_string();
        for entry in &self.entries {
            output = output.replace(&entry.original_pattern, &entry.token);
        }
        output
    }

    /// Replace every occurrence of each token with its original pattern,
    /// in table order.
    pub fn decode_line(&self, text: &str) -> String {
        let mut output = text.to_string();
        for entry in &self.entries {
            output = output.replace(&entry.token, &entry.original_pattern);
        }
        output
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::new("0.1.0", Self::default_entries())
    }
}
