// Copyright (c) 2021 10X Genomics, Inc. All rights reserved.

// Assign records to pairs.  Records whose identifiers agree up to the first delimiter are
// taken to come from the same droplet, and are split into heavy and light chains.

use abclone_core::defs::{Chain, PairOpt, SequenceRecord};
use abclone_core::errors::AbcloneError;
use log::debug;
use std::collections::HashMap;
use string_utils::TextUtils;
use vector_utils::unique_sort;

// Heavy and light chain records sharing a grouping key.
//
// Any multiplicity is allowed.  Only one heavy plus one light is a true pair.  Records of
// unknown chain are kept in `other` and play no role in Pair::is_pair.

#[derive(Clone, Debug, PartialEq)]
pub struct Pair<'a> {
    pub name: String,
    pub heavy: Vec<&'a SequenceRecord>,
    pub light: Vec<&'a SequenceRecord>,
    pub other: Vec<&'a SequenceRecord>,
}

impl<'a> Pair<'a> {
    pub fn new(name: &str) -> Pair<'a> {
        Pair {
            name: name.to_string(),
            heavy: Vec::new(),
            light: Vec::new(),
            other: Vec::new(),
        }
    }

    pub fn push(&mut self, r: &'a SequenceRecord) {
        match r.chain {
            Chain::Heavy => self.heavy.push(r),
            Chain::Light => self.light.push(r),
            Chain::Unknown => self.other.push(r),
        }
    }

    pub fn is_pair(&self) -> bool {
        self.heavy.len() == 1 && self.light.len() == 1
    }

    pub fn len(&self) -> usize {
        self.heavy.len() + self.light.len() + self.other.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn records(&self) -> impl Iterator<Item = &'a SequenceRecord> + '_ {
        self.heavy
            .iter()
            .chain(self.light.iter())
            .chain(self.other.iter())
            .copied()
    }

    // First record of the given chain, in input order.  If a droplet yielded two heavy chains,
    // this is the one used for lineage assignment.

    pub fn chain(&self, c: Chain) -> Option<&'a SequenceRecord> {
        match c {
            Chain::Heavy => self.heavy.first().copied(),
            Chain::Light => self.light.first().copied(),
            Chain::Unknown => self.other.first().copied(),
        }
    }

    pub fn first_heavy(&self) -> Option<&'a SequenceRecord> {
        self.chain(Chain::Heavy)
    }

    pub fn first_light(&self) -> Option<&'a SequenceRecord> {
        self.chain(Chain::Light)
    }

    // The subject shared by all members.
    //
    // Members disagreeing on subject is a data integrity problem and is returned as
    // `AbcloneError::InconsistentSubject`.  An empty pair has subject "".

    pub fn subject(&self) -> Result<&'a str, AbcloneError> {
        let mut subjects = self.records().map(|r| r.subject.as_str()).collect::<Vec<_>>();
        unique_sort(&mut subjects);
        if subjects.len() > 1 {
            return Err(AbcloneError::InconsistentSubject {
                pair: self.name.clone(),
                subjects: subjects.iter().map(|s| s.to_string()).collect(),
            });
        }
        Ok(subjects.first().copied().unwrap_or(""))
    }
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

// Grouping key of an identifier: the text before the first delim.  An identifier lacking the
// delimiter is its own key.

pub fn pair_key<'s>(id: &'s str, delim: &str) -> &'s str {
    if delim.is_empty() || !id.contains(delim) {
        id
    } else {
        id.before(delim)
    }
}

pub fn assign_pairs<'a, I>(records: I, opt: &PairOpt) -> Vec<Pair<'a>>
where
    I: IntoIterator<Item = &'a SequenceRecord>,
{
    let mut pairs = Vec::<Pair<'a>>::new();
    let mut to_pair = HashMap::<&'a str, usize>::new();
    let mut nrecords = 0;
    for r in records {
        nrecords += 1;
        let key = pair_key(&r.id, &opt.delim);
        let p = *to_pair.entry(key).or_insert_with(|| {
            pairs.push(Pair::new(key));
            pairs.len() - 1
        });
        pairs[p].push(r);
    }
    debug!(
        "assigned {} records to {} pairs, of which {} are true pairs",
        nrecords,
        pairs.len(),
        pairs.iter().filter(|p| p.is_pair()).count()
    );
    pairs
}

pub fn pairs_only<'p, 'a>(pairs: &'p [Pair<'a>]) -> Vec<&'p Pair<'a>> {
    pairs.iter().filter(|p| p.is_pair()).collect()
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_trace::PrettyTrace;

    fn rec(id: &str, chain: Chain) -> SequenceRecord {
        SequenceRecord::new(id, chain, "d1")
    }

    #[test]
    fn test_pair_key() {
        assert_eq!(pair_key("A_1", "_"), "A");
        assert_eq!(pair_key("A_1_x", "_"), "A");
        assert_eq!(pair_key("A1", "_"), "A1");
        assert_eq!(pair_key("_1", "_"), "");
        assert_eq!(pair_key("A_1", ""), "A_1");
    }

    #[test]
    fn test_assign_pairs() {
        PrettyTrace::new().on();
        let records = vec![
            rec("A_1", Chain::Heavy),
            rec("A_2", Chain::Light),
            rec("B_1", Chain::Heavy),
        ];
        let pairs = assign_pairs(&records, &PairOpt::default());
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].name, "A");
        assert_eq!(pairs[0].heavy[0].id, "A_1");
        assert_eq!(pairs[0].light[0].id, "A_2");
        assert!(pairs[0].is_pair());
        assert_eq!(pairs[1].name, "B");
        assert_eq!(pairs[1].heavy.len(), 1);
        assert!(pairs[1].light.is_empty());
        assert!(!pairs[1].is_pair());
        assert_eq!(pairs_only(&pairs).len(), 1);
    }

    #[test]
    fn test_multiplicities() {
        PrettyTrace::new().on();
        let records = vec![
            rec("C_1", Chain::Heavy),
            rec("D_1", Chain::Light),
            rec("C_2", Chain::Heavy),
            rec("C_3", Chain::Light),
            rec("E_1", Chain::Heavy),
            rec("E_2", Chain::Light),
            rec("E_3", Chain::Unknown),
            rec("F", Chain::Light),
        ];
        let pairs = assign_pairs(&records, &PairOpt::default());
        let names = pairs.iter().map(|p| p.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["C", "D", "E", "F"]);

        // Two heavies and a light is not a true pair; the first heavy is the designated one.

        assert!(!pairs[0].is_pair());
        assert_eq!(pairs[0].first_heavy().unwrap().id, "C_1");
        assert!(!pairs[1].is_pair());

        // Unknown chains ride along without spoiling the pair.

        assert!(pairs[2].is_pair());
        assert_eq!(pairs[2].other.len(), 1);
        assert_eq!(pairs[2].len(), 3);

        // A record without the delimiter is a singleton.

        assert_eq!(pairs[3].len(), 1);

        // Totality and disjointness.

        let mut ids = pairs
            .iter()
            .flat_map(|p| p.records().map(|r| r.id.clone()))
            .collect::<Vec<_>>();
        ids.sort();
        let mut expected = records.iter().map(|r| r.id.clone()).collect::<Vec<_>>();
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_subject_consistency() {
        PrettyTrace::new().on();
        let records = vec![
            SequenceRecord::new("A_1", Chain::Heavy, "d1"),
            SequenceRecord::new("A_2", Chain::Light, "d2"),
            SequenceRecord::new("B_1", Chain::Heavy, "d3"),
        ];
        let pairs = assign_pairs(&records, &PairOpt::default());
        match pairs[0].subject() {
            Err(AbcloneError::InconsistentSubject { pair, subjects }) => {
                assert_eq!(pair, "A");
                assert_eq!(subjects, vec!["d1".to_string(), "d2".to_string()]);
            }
            other => panic!("expected inconsistent subject, got {:?}", other),
        }
        assert_eq!(pairs[1].subject().unwrap(), "d3");
        assert_eq!(Pair::new("empty").subject().unwrap(), "");
    }

    #[test]
    fn test_empty_input() {
        let records: Vec<SequenceRecord> = Vec::new();
        assert!(assign_pairs(&records, &PairOpt::default()).is_empty());
    }
}
