// Copyright (c) 2021 10X Genomics, Inc. All rights reserved.

use crate::errors::AbcloneError;
use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

// Chain designation.  Deserialization goes through from_locus, so loci such as IGH/IGK/IGL
// are accepted in any case.  Anything unrecognized becomes Unknown rather than an error.

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Chain {
    Heavy,
    Light,
    Unknown,
}

impl From<String> for Chain {
    fn from(s: String) -> Chain {
        Chain::from_locus(&s)
    }
}

impl Default for Chain {
    fn default() -> Self {
        Chain::Unknown
    }
}

impl Chain {
    pub fn from_locus(s: &str) -> Chain {
        match s.to_ascii_lowercase().as_str() {
            "heavy" | "igh" => Chain::Heavy,
            "light" | "igk" | "igl" | "kappa" | "lambda" => Chain::Light,
            _ => Chain::Unknown,
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Chain::Heavy => "heavy",
            Chain::Light => "light",
            Chain::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

// An annotation value: a number, a string, or a nested map of further values.

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnValue {
    Num(f64),
    Str(String),
    Map(BTreeMap<String, AnnValue>),
}

impl AnnValue {
    pub fn as_num(&self) -> Option<f64> {
        match self {
            AnnValue::Num(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AnnValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, AnnValue>> {
        match self {
            AnnValue::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl From<f64> for AnnValue {
    fn from(x: f64) -> Self {
        AnnValue::Num(x)
    }
}

impl From<&str> for AnnValue {
    fn from(s: &str) -> Self {
        AnnValue::Str(s.to_string())
    }
}

impl From<String> for AnnValue {
    fn from(s: String) -> Self {
        AnnValue::Str(s)
    }
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

// Which sequence of a record a computation runs on.

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeqField {
    Nt,
    Aa,
    Annotation(String),
}

impl fmt::Display for SeqField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeqField::Nt => write!(f, "nt"),
            SeqField::Aa => write!(f, "aa"),
            SeqField::Annotation(path) => write!(f, "{}", path),
        }
    }
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

// A single annotated sequence, as handed over by a loader.
//
// Records are never mutated by the grouping code.  The only sanctioned change is identifier
// normalization, which the caller performs explicitly through the record store.

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceRecord {
    pub id: String,
    #[serde(default)]
    pub chain: Chain,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub nt_seq: String,
    #[serde(default)]
    pub aa_seq: String,
    #[serde(default)]
    pub annotations: BTreeMap<String, AnnValue>,
}

impl SequenceRecord {
    pub fn new(id: &str, chain: Chain, subject: &str) -> SequenceRecord {
        SequenceRecord {
            id: id.to_string(),
            chain,
            subject: subject.to_string(),
            ..Default::default()
        }
    }

    pub fn with_nt(mut self, seq: &str) -> Self {
        self.nt_seq = seq.to_string();
        self
    }

    pub fn with_aa(mut self, seq: &str) -> Self {
        self.aa_seq = seq.to_string();
        self
    }

    // Set an annotation.  A dotted path creates intermediate maps as needed, replacing any
    // non-map value in the way.

    pub fn with_annotation<V: Into<AnnValue>>(mut self, path: &str, value: V) -> Self {
        let fields = path.split('.').collect::<Vec<&str>>();
        let mut m = &mut self.annotations;
        for i in 0..fields.len() - 1 {
            let entry = m
                .entry(fields[i].to_string())
                .or_insert_with(|| AnnValue::Map(BTreeMap::new()));
            if entry.as_map().is_none() {
                *entry = AnnValue::Map(BTreeMap::new());
            }
            m = match entry {
                AnnValue::Map(x) => x,
                _ => unreachable!(),
            };
        }
        m.insert(fields[fields.len() - 1].to_string(), value.into());
        self
    }

    // Look up an annotation by name.  A dotted path such as `v_gene.gene` descends into
    // nested maps.  Returns `None` if any step is absent or is not a map.

    pub fn annotation(&self, path: &str) -> Option<&AnnValue> {
        let mut fields = path.split('.');
        let mut v = self.annotations.get(fields.next()?)?;
        for f in fields {
            v = v.as_map()?.get(f)?;
        }
        Some(v)
    }

    pub fn num(&self, path: &str) -> Option<f64> {
        self.annotation(path)?.as_num()
    }

    pub fn text(&self, path: &str) -> Option<&str> {
        self.annotation(path)?.as_str()
    }

    // Resolve a sequence field.  Empty sequences count as missing.

    pub fn seq(&self, field: &SeqField) -> Option<&str> {
        let s = match field {
            SeqField::Nt => self.nt_seq.as_str(),
            SeqField::Aa => self.aa_seq.as_str(),
            SeqField::Annotation(path) => self.text(path)?,
        };
        if s.is_empty() {
            None
        } else {
            Some(s)
        }
    }
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

// Pairing options.

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairOpt {
    pub delim: String, // pair key is the identifier text before the first delim
}

impl Default for PairOpt {
    fn default() -> Self {
        PairOpt {
            delim: "_".to_string(),
        }
    }
}

// Lineage grouping options.  Two pairs are linked if the designated chain has identical
// germline calls and its region sequences have identity at least `identity`.

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineageOpt {
    pub chain: Chain,
    pub v_field: String,
    pub j_field: String,
    pub match_j: bool,
    pub region: SeqField,
    pub identity: f64,
}

impl Default for LineageOpt {
    fn default() -> Self {
        LineageOpt {
            chain: Chain::Heavy,
            v_field: "v_gene.gene".to_string(),
            j_field: "j_gene.gene".to_string(),
            match_j: true,
            region: SeqField::Annotation("cdr3_aa".to_string()),
            identity: 0.8,
        }
    }
}

// Clustering options.

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterOpt {
    pub threshold: f64,
    pub field: SeqField,
}

impl LineageOpt {
    pub fn check(&self) -> Result<(), AbcloneError> {
        if self.identity > 0.0 && self.identity <= 1.0 {
            Ok(())
        } else {
            Err(AbcloneError::InvalidThreshold(self.identity))
        }
    }
}

impl Default for ClusterOpt {
    fn default() -> Self {
        ClusterOpt {
            threshold: 0.9,
            field: SeqField::Nt,
        }
    }
}

impl ClusterOpt {
    pub fn check(&self) -> Result<(), AbcloneError> {
        if self.threshold > 0.0 && self.threshold <= 1.0 {
            Ok(())
        } else {
            Err(AbcloneError::InvalidThreshold(self.threshold))
        }
    }
}

// Summary options.  By default values are grouped by subject.

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryOpt {
    pub group_field: Option<String>,
}

// Set up control datastructure (EncloneControl-like object).

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbcloneControl {
    pub pair_opt: PairOpt,
    pub lineage_opt: LineageOpt,
    pub cluster_opt: ClusterOpt,
    pub summary_opt: SummaryOpt,
}

impl AbcloneControl {
    pub fn from_json_str(s: &str) -> Result<AbcloneControl, AbcloneError> {
        let ctl: AbcloneControl = serde_json::from_str(s)?;
        ctl.lineage_opt.check()?;
        ctl.cluster_opt.check()?;
        Ok(ctl)
    }

    pub fn from_json_file(path: &str) -> Result<AbcloneControl, AbcloneError> {
        let s = std::fs::read_to_string(path).map_err(|source| AbcloneError::Io {
            path: path.to_string(),
            source,
        })?;
        AbcloneControl::from_json_str(&s)
    }
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_trace::PrettyTrace;

    #[test]
    fn test_annotation_paths() {
        PrettyTrace::new().on();
        let r = SequenceRecord::new("A_1", Chain::Heavy, "d1")
            .with_annotation("v_gene.gene", "IGHV1-2")
            .with_annotation("v_gene.fam", "IGHV1")
            .with_annotation("nt_identity.v", 96.5)
            .with_annotation("mut_count_nt", 7.0);
        assert_eq!(r.text("v_gene.gene"), Some("IGHV1-2"));
        assert_eq!(r.text("v_gene.fam"), Some("IGHV1"));
        assert_eq!(r.num("nt_identity.v"), Some(96.5));
        assert_eq!(r.num("mut_count_nt"), Some(7.0));
        assert!(r.annotation("v_gene.allele").is_none());
        assert!(r.annotation("mut_count_nt.v").is_none());
        assert!(r.text("mut_count_nt").is_none());
        assert!(r.num("v_gene").is_none());
    }

    #[test]
    fn test_record_json() {
        PrettyTrace::new().on();
        let json = r#"{
            "id": "x_1",
            "chain": "IGK",
            "subject": "donor12",
            "aa_seq": "DIQMTQ",
            "annotations": {"cdr3_aa": "QQYNSYPLT", "nt_identity": {"v": 97.2}}
        }"#;
        let r: SequenceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(r.chain, Chain::Light);
        assert_eq!(r.seq(&SeqField::Annotation("cdr3_aa".to_string())), Some("QQYNSYPLT"));
        assert_eq!(r.seq(&SeqField::Aa), Some("DIQMTQ"));
        assert_eq!(r.seq(&SeqField::Nt), None);
        assert_eq!(r.num("nt_identity.v"), Some(97.2));
        let r: SequenceRecord =
            serde_json::from_str(r#"{"id": "y", "chain": "TRB"}"#).unwrap();
        assert_eq!(r.chain, Chain::Unknown);

        // Loci are read the same way from json as by from_locus, in any case.

        let loci = [
            ("igh", Chain::Heavy),
            ("Kappa", Chain::Light),
            ("LIGHT", Chain::Light),
        ];
        for (locus, chain) in loci.iter().copied() {
            let json = format!(r#"{{"id": "z", "chain": "{}"}}"#, locus);
            let r: SequenceRecord = serde_json::from_str(&json).unwrap();
            assert_eq!(r.chain, chain);
            assert_eq!(r.chain, Chain::from_locus(locus));
        }
        let json = serde_json::to_string(&Chain::Heavy).unwrap();
        assert_eq!(json, r#""heavy""#);
    }

    #[test]
    fn test_control_json() {
        PrettyTrace::new().on();
        let ctl = AbcloneControl::from_json_str(
            r#"{"pair_opt": {"delim": "|"}, "cluster_opt": {"threshold": 0.92}}"#,
        )
        .unwrap();
        assert_eq!(ctl.pair_opt.delim, "|");
        assert_eq!(ctl.cluster_opt.threshold, 0.92);
        assert_eq!(ctl.cluster_opt.field, SeqField::Nt);
        assert_eq!(ctl.lineage_opt, LineageOpt::default());
        let ctl = AbcloneControl::from_json_str(
            r#"{"lineage_opt": {"region": {"annotation": "cdr3_nt"}, "match_j": false}}"#,
        )
        .unwrap();
        assert_eq!(
            ctl.lineage_opt.region,
            SeqField::Annotation("cdr3_nt".to_string())
        );
        assert!(!ctl.lineage_opt.match_j);
        let bad = AbcloneControl::from_json_str(r#"{"cluster_opt": {"threshold": 1.5}}"#);
        assert!(matches!(bad, Err(AbcloneError::InvalidThreshold(_))));
        let bad = AbcloneControl::from_json_str(r#"{"lineage_opt": {"identity": 1.5}}"#);
        assert!(matches!(bad, Err(AbcloneError::InvalidThreshold(x)) if x == 1.5));
        let bad = AbcloneControl::from_json_str(r#"{"lineage_opt": {"identity": 0.0}}"#);
        assert!(matches!(bad, Err(AbcloneError::InvalidThreshold(_))));
        let ctl = AbcloneControl::from_json_str(r#"{"lineage_opt": {"chain": "IGK"}}"#).unwrap();
        assert_eq!(ctl.lineage_opt.chain, Chain::Light);
    }

    #[test]
    fn test_from_locus() {
        assert_eq!(Chain::from_locus("IGH"), Chain::Heavy);
        assert_eq!(Chain::from_locus("lambda"), Chain::Light);
        assert_eq!(Chain::from_locus("TRA"), Chain::Unknown);
    }
}
