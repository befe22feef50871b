// Copyright (c) 2021 10X Genomics, Inc. All rights reserved.

// Sequence similarity metrics.  Both the lineage grouper and the cluster engine take a
// &dyn Similarity, so the metric can be swapped without touching either.  All metrics return
// a value in [0, 1], with 1 meaning identical.

use bio::alignment::pairwise::Aligner;
use bio::alignment::AlignmentOperation::Match;
use edit_distance::edit_distance;
use std::cmp::{max, min};

pub trait Similarity: Send + Sync {
    fn similarity(&self, a: &str, b: &str) -> f64;

    // Short name of the metric, for logging and for ClusterSet::metric.

    fn name(&self) -> String;
}

impl<F> Similarity for F
where
    F: Fn(&str, &str) -> f64 + Send + Sync,
{
    fn similarity(&self, a: &str, b: &str) -> f64 {
        self(a, b)
    }

    fn name(&self) -> String {
        "custom".to_string()
    }
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

// Identity derived from Levenshtein distance: `1 - d / max(len(a), len(b))`.
//
// This is the CDR3 edit distance used for grouping, rescaled so that a threshold can be
// shared across CDR3 lengths.

#[derive(Clone, Copy, Debug, Default)]
pub struct EditIdentity;

impl Similarity for EditIdentity {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        let n = max(a.chars().count(), b.chars().count());
        if n == 0 {
            return 1.0;
        }
        1.0 - edit_distance(a, b) as f64 / n as f64
    }

    fn name(&self) -> String {
        "edit_identity".to_string()
    }
}

// Positional identity for sequences of equal length.  Sequences of different length have
// identity zero, which makes this the strictest metric (same-length CDR3s only).

#[derive(Clone, Copy, Debug, Default)]
pub struct HammingIdentity;

impl Similarity for HammingIdentity {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        let (a, b) = (a.as_bytes(), b.as_bytes());
        if a.len() != b.len() {
            return 0.0;
        }
        if a.is_empty() {
            return 1.0;
        }
        let same = a.iter().zip(b.iter()).filter(|(x, y)| x == y).count();
        same as f64 / a.len() as f64
    }

    fn name(&self) -> String {
        "hamming_identity".to_string()
    }
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdentityDenominator {
    Shorter,         // CD-HIT convention
    AlignmentLength, // columns of the global alignment, gaps included
}

// Identity from a global alignment: identical aligned residues divided by either the length
// of the shorter sequence or the alignment length.
//
// With the default (`Shorter`) denominator this is the identity CD-HIT thresholds on, so a
// short sequence contained in a longer one scores 1.

#[derive(Clone, Copy, Debug)]
pub struct AlignIdentity {
    pub denominator: IdentityDenominator,
    pub gap_open: i32,
    pub gap_extend: i32,
}

impl Default for AlignIdentity {
    fn default() -> Self {
        AlignIdentity {
            denominator: IdentityDenominator::Shorter,
            gap_open: -5,
            gap_extend: -1,
        }
    }
}

impl Similarity for AlignIdentity {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        let (a, b) = (a.as_bytes(), b.as_bytes());
        if a.is_empty() || b.is_empty() {
            return if a.len() == b.len() { 1.0 } else { 0.0 };
        }
        let score = |x: u8, y: u8| if x == y { 1i32 } else { -1i32 };
        let mut aligner =
            Aligner::with_capacity(a.len(), b.len(), self.gap_open, self.gap_extend, &score);
        let al = aligner.global(a, b);
        let matches = al.operations.iter().filter(|op| **op == Match).count();
        let denom = match self.denominator {
            IdentityDenominator::Shorter => min(a.len(), b.len()),
            IdentityDenominator::AlignmentLength => al.operations.len(),
        };
        (matches as f64 / denom as f64).min(1.0)
    }

    fn name(&self) -> String {
        match self.denominator {
            IdentityDenominator::Shorter => "align_identity".to_string(),
            IdentityDenominator::AlignmentLength => "align_identity_full".to_string(),
        }
    }
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_trace::PrettyTrace;

    fn close(x: f64, y: f64) -> bool {
        (x - y).abs() < 1e-9
    }

    #[test]
    fn test_edit_identity() {
        PrettyTrace::new().on();
        let s = EditIdentity;
        assert!(close(s.similarity("CARDYW", "CARDYW"), 1.0));
        assert!(close(s.similarity("CARDYW", "CARDFW"), 1.0 - 1.0 / 6.0));
        assert!(close(s.similarity("CARDYW", "CARDW"), 1.0 - 1.0 / 6.0));
        assert!(close(s.similarity("", ""), 1.0));
        assert!(close(s.similarity("", "AC"), 0.0));
        assert_eq!(s.name(), "edit_identity");
    }

    #[test]
    fn test_hamming_identity() {
        PrettyTrace::new().on();
        let s = HammingIdentity;
        assert!(close(s.similarity("ACGT", "ACGA"), 0.75));
        assert!(close(s.similarity("ACGT", "ACG"), 0.0));
        assert!(close(s.similarity("", ""), 1.0));
    }

    #[test]
    fn test_align_identity() {
        PrettyTrace::new().on();
        let s = AlignIdentity::default();
        assert!(close(s.similarity("ACGTACGTAC", "ACGTACGTAC"), 1.0));

        // One substitution in ten.

        assert!(close(s.similarity("ACGTACGTAC", "ACGTTCGTAC"), 0.9));

        // A deletion does not count against the shorter sequence.

        assert!(close(s.similarity("ACGTACGTAC", "ACGTCGTAC"), 1.0));
        let full = AlignIdentity {
            denominator: IdentityDenominator::AlignmentLength,
            ..Default::default()
        };
        assert!(close(full.similarity("ACGTACGTAC", "ACGTCGTAC"), 0.9));
        assert!(close(s.similarity("", ""), 1.0));
        assert!(close(s.similarity("ACGT", ""), 0.0));
    }

    #[test]
    fn test_closure_metric() {
        let s = |a: &str, b: &str| if a.len() == b.len() { 1.0 } else { 0.0 };
        assert!(close(s.similarity("AAA", "CCC"), 1.0));
        assert_eq!(Similarity::name(&s), "custom");
    }
}
