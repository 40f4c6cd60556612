//! File-backed, four-tier store for debugging findings.
//!
//! Records are immutable once written. Promotion from `candidate` to `long`
//! is a copy, never a move: the candidate record is retained and a lineage
//! link is appended so lineage queries can walk candidate → long. The store
//! also owns the append-only promotion decision log, which records every
//! attempt whether or not it was approved.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::promotion::PromotionDecision;

/// Durability/trust classification of a finding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryTier {
    Raw,
    Working,
    Candidate,
    Long,
}

impl MemoryTier {
    pub const ALL: [MemoryTier; 4] = [Self::Raw, Self::Working, Self::Candidate, Self::Long];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Working => "working",
            Self::Candidate => "candidate",
            Self::Long => "long",
        }
    }
}

impl std::fmt::Display for MemoryTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MemoryTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw" => Ok(Self::Raw),
            "working" => Ok(Self::Working),
            "candidate" => Ok(Self::Candidate),
            "long" => Ok(Self::Long),
            other => Err(format!("unknown memory tier: {other}")),
        }
    }
}

/// One unit of findings at a given tier.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub memory_id: String,
    pub run_id: String,
    pub memory_tier: MemoryTier,
    pub content: String,
    pub evidence_refs: Vec<String>,
    pub created_at: DateTime<Utc>,
    /// Set only on long records created via promotion.
    #[serde(default)]
    pub promoted_from: String,
}

/// Candidate → long lineage entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LongMemoryLink {
    pub run_id: String,
    pub candidate_memory_id: String,
    pub long_memory_id: String,
    pub linked_at: DateTime<Utc>,
}

/// Errors from memory store operations.
#[derive(Error, Debug)]
pub enum MemoryStoreError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("memory record not found: {0}")]
    RecordNotFound(String),

    #[error("only candidate memory can be promoted: {memory_id} is {tier}")]
    NotCandidate { memory_id: String, tier: MemoryTier },
}

/// Per-run, file-backed tier store.
#[derive(Clone, Debug)]
pub struct MemoryStore {
    run_id: String,
    memory_dir: PathBuf,
    index_dir: PathBuf,
}

fn new_memory_id(tier: MemoryTier) -> String {
    let mut hex = uuid::Uuid::new_v4().simple().to_string();
    hex.truncate(12);
    format!("mem-{tier}-{hex}")
}

fn write_pretty(path: &Path, value: &impl Serialize) -> Result<(), MemoryStoreError> {
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text)?;
    Ok(())
}

impl MemoryStore {
    /// Open (and lay out) the memory area under `run_root/run_id`.
    pub fn open(run_root: &Path, run_id: impl Into<String>) -> Result<Self, MemoryStoreError> {
        let run_id = run_id.into();
        let run_dir = run_root.join(&run_id);
        let memory_dir = run_dir.join("memory");
        let index_dir = run_dir.join("index");
        fs::create_dir_all(&index_dir)?;
        for tier in MemoryTier::ALL {
            fs::create_dir_all(memory_dir.join(tier.as_str()))?;
        }
        Ok(Self {
            run_id,
            memory_dir,
            index_dir,
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    fn tier_dir(&self, tier: MemoryTier) -> PathBuf {
        self.memory_dir.join(tier.as_str())
    }

    fn record_path(&self, tier: MemoryTier, memory_id: &str) -> PathBuf {
        self.tier_dir(tier).join(format!("{memory_id}.json"))
    }

    /// Write a new record into a tier. Records are immutable once written.
    pub fn create_record(
        &self,
        memory_tier: MemoryTier,
        content: impl Into<String>,
        evidence_refs: Vec<String>,
        promoted_from: impl Into<String>,
    ) -> Result<MemoryRecord, MemoryStoreError> {
        let record = MemoryRecord {
            memory_id: new_memory_id(memory_tier),
            run_id: self.run_id.clone(),
            memory_tier,
            content: content.into(),
            evidence_refs,
            created_at: Utc::now(),
            promoted_from: promoted_from.into(),
        };
        write_pretty(&self.record_path(memory_tier, &record.memory_id), &record)?;
        tracing::debug!(
            memory_id = %record.memory_id,
            tier = %memory_tier,
            "Memory record created"
        );
        Ok(record)
    }

    /// Look up a record by id, scanning tiers in order.
    pub fn get_record(&self, memory_id: &str) -> Result<MemoryRecord, MemoryStoreError> {
        for tier in MemoryTier::ALL {
            let path = self.record_path(tier, memory_id);
            if path.exists() {
                let text = fs::read_to_string(path)?;
                return Ok(serde_json::from_str(&text)?);
            }
        }
        Err(MemoryStoreError::RecordNotFound(memory_id.to_string()))
    }

    /// List records in one tier, or across all tiers when `None`.
    pub fn list_records(
        &self,
        memory_tier: Option<MemoryTier>,
    ) -> Result<Vec<MemoryRecord>, MemoryStoreError> {
        let tiers: Vec<MemoryTier> = match memory_tier {
            Some(tier) => vec![tier],
            None => MemoryTier::ALL.to_vec(),
        };
        let mut records = Vec::new();
        for tier in tiers {
            let mut paths: Vec<PathBuf> = fs::read_dir(self.tier_dir(tier))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
                .collect();
            paths.sort();
            for path in paths {
                let text = fs::read_to_string(&path)?;
                records.push(serde_json::from_str(&text)?);
            }
        }
        Ok(records)
    }

    /// Promote a candidate record to the long tier.
    ///
    /// Fails unless the source record's tier is exactly `candidate`.
    /// Creates a brand-new long record carrying the candidate's content and
    /// evidence verbatim, then appends a lineage link. The candidate record
    /// is retained.
    pub fn promote_candidate_to_long(
        &self,
        candidate_memory_id: &str,
    ) -> Result<MemoryRecord, MemoryStoreError> {
        let candidate = self.get_record(candidate_memory_id)?;
        if candidate.memory_tier != MemoryTier::Candidate {
            return Err(MemoryStoreError::NotCandidate {
                memory_id: candidate.memory_id,
                tier: candidate.memory_tier,
            });
        }

        let long_record = self.create_record(
            MemoryTier::Long,
            candidate.content.clone(),
            candidate.evidence_refs.clone(),
            candidate.memory_id.clone(),
        )?;
        self.append_long_memory_link(&candidate.memory_id, &long_record.memory_id)?;

        tracing::info!(
            candidate = %candidate.memory_id,
            long = %long_record.memory_id,
            "Candidate memory promoted to long tier"
        );
        Ok(long_record)
    }

    fn append_long_memory_link(
        &self,
        candidate_id: &str,
        long_id: &str,
    ) -> Result<PathBuf, MemoryStoreError> {
        let path = self.index_dir.join("long-memory-links.json");
        let mut links: Vec<LongMemoryLink> = if path.exists() {
            serde_json::from_str(&fs::read_to_string(&path)?)?
        } else {
            Vec::new()
        };
        links.push(LongMemoryLink {
            run_id: self.run_id.clone(),
            candidate_memory_id: candidate_id.to_string(),
            long_memory_id: long_id.to_string(),
            linked_at: Utc::now(),
        });
        write_pretty(&path, &links)?;
        Ok(path)
    }

    /// Candidate → long lineage entries recorded so far.
    pub fn long_memory_links(&self) -> Result<Vec<LongMemoryLink>, MemoryStoreError> {
        let path = self.index_dir.join("long-memory-links.json");
        if !path.exists() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    /// Append one promotion attempt to the decision log, approved or not.
    pub fn append_promotion_decision(
        &self,
        decision: &PromotionDecision,
    ) -> Result<PathBuf, MemoryStoreError> {
        let path = self.index_dir.join("memory-promotion-decisions.jsonl");
        let mut file = fs::OpenOptions::new().create(true).append(true).open(&path)?;
        let line = serde_json::to_string(decision)?;
        writeln!(file, "{line}")?;
        Ok(path)
    }
}
