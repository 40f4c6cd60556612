//! Tiered findings memory for faultline runs.
//!
//! Findings move through four tiers of increasing trust: raw → working →
//! candidate → long. Only the candidate → long edge is mediated by policy
//! (the dual-gate [`PromotionEngine`]); everything else is plain record
//! creation. The [`CompressionCodec`] squeezes raw event lines before they
//! are summarized into the store.

pub mod codec;
pub mod lexicon;
pub mod promotion;
pub mod store;

pub use codec::{CompressionCodec, CompressionPayload, CompressionStepResult, DedupSegment};
pub use lexicon::{Lexicon, LexiconEntry, LexiconTier};
pub use promotion::{
    GateChecks, PromotionDecision, PromotionEngine, PromotionTarget,
    DEFAULT_CONSENSUS_THRESHOLD,
};
pub use store::{LongMemoryLink, MemoryRecord, MemoryStore, MemoryStoreError, MemoryTier};
