// Copyright (c) 2021 10X Genomics, Inc. All rights reserved.

// Group pairs into clonal lineages.
//
// Two pairs are joined if, on the designated chain (heavy by default), their V calls agree,
// their J calls agree (unless turned off), and the identity of their region sequences (CDR3
// amino acids by default) is at least the configured identity.  Joins are closed
// transitively, so this is single linkage clustering: if A joins B and B joins C then A, B
// and C land in one lineage, however far apart A and C are.
//
// Comparisons are only made within a germline bucket, so the quadratic part of the
// computation is over bucket sizes rather than the whole input.

use crate::pair::Pair;
use abclone_core::defs::{Chain, LineageOpt, SequenceRecord};
use abclone_core::errors::AbcloneError;
use abclone_core::similarity::Similarity;
use equiv::EquivRel;
use itertools::Itertools;
use log::{debug, warn};
use std::collections::BTreeMap;
use vector_utils::{next_diff1_2, unique_sort};

// A set of pairs inferred to descend from one ancestral rearrangement.
//
// The name is the smallest member pair name, so it is stable across runs on the same input.

#[derive(Clone, Debug, PartialEq)]
pub struct Lineage<'a> {
    pub name: String,
    pub subject: String,
    pub pairs: Vec<Pair<'a>>,
}

impl<'a> Lineage<'a> {
    // Number of pairs, or with pairs_only, the number of true pairs.

    pub fn size(&self, pairs_only: bool) -> usize {
        if pairs_only {
            self.pairs.iter().filter(|p| p.is_pair()).count()
        } else {
            self.pairs.len()
        }
    }

    pub fn heavies(&self) -> Vec<&'a SequenceRecord> {
        self.pairs.iter().flat_map(|p| p.heavy.iter().copied()).collect()
    }

    pub fn lights(&self) -> Vec<&'a SequenceRecord> {
        self.pairs.iter().flat_map(|p| p.light.iter().copied()).collect()
    }

    pub fn just_pairs(&self) -> Vec<&Pair<'a>> {
        self.pairs.iter().filter(|p| p.is_pair()).collect()
    }

    pub fn heavy_pairs(&self) -> Vec<&Pair<'a>> {
        self.pairs.iter().filter(|p| !p.heavy.is_empty()).collect()
    }

    pub fn pair_names(&self) -> Vec<&str> {
        self.pairs.iter().map(|p| p.name.as_str()).collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnassignedReason {
    NoChain,         // pair lacks the designated chain
    MissingGermline, // V call missing, or J call missing while J matching is on
    MissingRegion,   // region sequence missing or empty
}

#[derive(Clone, Debug, PartialEq)]
pub struct Unassigned<'a> {
    pub pair: Pair<'a>,
    pub reason: UnassignedReason,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LineageAssignment<'a> {
    pub lineages: Vec<Lineage<'a>>,
    pub unassigned: Vec<Unassigned<'a>>,
}

impl<'a> LineageAssignment<'a> {
    pub fn lineage_of(&self, pair_name: &str) -> Option<&Lineage<'a>> {
        self.lineages
            .iter()
            .find(|l| l.pairs.iter().any(|p| p.name == pair_name))
    }

    pub fn npairs(&self) -> usize {
        self.lineages.iter().map(|l| l.size(false)).sum::<usize>() + self.unassigned.len()
    }
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

// Data needed to link one pair.

struct Linkable<'a> {
    germline: (&'a str, &'a str), // (V, J), with J empty if not matched
    region: &'a str,
    index: usize, // index into the input pairs
}

fn linkable<'a>(
    p: &Pair<'a>,
    index: usize,
    opt: &LineageOpt,
) -> Result<Linkable<'a>, UnassignedReason> {
    let r = p.chain(opt.chain).ok_or(UnassignedReason::NoChain)?;
    let v = r
        .text(&opt.v_field)
        .ok_or(UnassignedReason::MissingGermline)?;
    let j = if opt.match_j {
        r.text(&opt.j_field)
            .ok_or(UnassignedReason::MissingGermline)?
    } else {
        ""
    };
    let region = r.seq(&opt.region).ok_or(UnassignedReason::MissingRegion)?;
    Ok(Linkable {
        germline: (v, j),
        region,
        index,
    })
}

// Group the pairs of one subject into lineages.
//
// Pairs from more than one subject are refused with `AbcloneError::MixedSubjects`; use
// group_lineages_by_subject to partition first.  Pairs that cannot be linked are
// returned in `unassigned` together with the reason.

pub fn group_lineages<'a>(
    pairs: &[Pair<'a>],
    opt: &LineageOpt,
    sim: &dyn Similarity,
) -> Result<LineageAssignment<'a>, AbcloneError> {
    opt.check()?;

    // Check subjects.

    let mut subjects = Vec::<&str>::new();
    for p in pairs.iter() {
        subjects.push(p.subject()?);
    }
    unique_sort(&mut subjects);
    if subjects.len() > 1 {
        return Err(AbcloneError::MixedSubjects {
            subjects: subjects.iter().map(|s| s.to_string()).collect(),
        });
    }
    let subject = subjects.first().copied().unwrap_or("");

    // Find the pairs that can be linked, and set aside the rest.

    let mut result = LineageAssignment::default();
    let mut links = Vec::<Linkable<'a>>::new();
    for (i, p) in pairs.iter().enumerate() {
        match linkable(p, i, opt) {
            Ok(x) => links.push(x),
            Err(reason) => result.unassigned.push(Unassigned {
                pair: p.clone(),
                reason,
            }),
        }
    }
    if !result.unassigned.is_empty() {
        warn!(
            "{} of {} pairs of subject {} could not be assigned to a lineage",
            result.unassigned.len(),
            pairs.len(),
            subject
        );
    }

    // Bucket by germline calls, then join within each bucket.

    let mut buckets = links
        .iter()
        .enumerate()
        .map(|(k, x)| (x.germline, k))
        .collect::<Vec<_>>();
    buckets.sort_unstable();
    let mut eq: EquivRel = EquivRel::new(links.len() as i32);
    let mut i = 0;
    while i < buckets.len() {
        let j = next_diff1_2(&buckets, i as i32) as usize;
        for k1 in i..j {
            for k2 in k1 + 1..j {
                let (l1, l2) = (buckets[k1].1, buckets[k2].1);
                if eq.class_id(l1 as i32) == eq.class_id(l2 as i32) {
                    continue;
                }
                if sim.similarity(links[l1].region, links[l2].region) >= opt.identity {
                    eq.join(l1 as i32, l2 as i32);
                }
            }
        }
        i = j;
    }

    // Form the lineages.

    let mut reps = Vec::<i32>::new();
    eq.orbit_reps(&mut reps);
    for r in reps.iter() {
        let mut o = Vec::<i32>::new();
        eq.orbit(*r, &mut o);
        let mut members = o.iter().map(|&k| links[k as usize].index).collect::<Vec<_>>();
        members.sort_unstable();
        let lineage_pairs = members.iter().map(|&m| pairs[m].clone()).collect::<Vec<_>>();
        let name = lineage_pairs
            .iter()
            .map(|p| p.name.as_str())
            .min()
            .unwrap_or("")
            .to_string();
        result.lineages.push(Lineage {
            name,
            subject: subject.to_string(),
            pairs: lineage_pairs,
        });
    }
    result.lineages.sort_by(|a, b| {
        b.size(false)
            .cmp(&a.size(false))
            .then_with(|| a.name.cmp(&b.name))
    });
    debug!(
        "grouped {} pairs of subject {} into {} lineages, {} with more than one pair, using {} \
         at identity {} on {} of the {} chain",
        links.len(),
        subject,
        result.lineages.len(),
        result.lineages.iter().filter(|l| l.size(false) > 1).count(),
        sim.name(),
        opt.identity,
        opt.region,
        opt.chain
    );
    Ok(result)
}

// Partition pairs by subject, in sorted subject order, and group each subject separately.
//
// Lineages never span subjects.  Pairs whose members disagree on subject are still an error.

pub fn group_lineages_by_subject<'a>(
    pairs: &[Pair<'a>],
    opt: &LineageOpt,
    sim: &dyn Similarity,
) -> Result<LineageAssignment<'a>, AbcloneError> {
    opt.check()?;
    let mut by_subject = BTreeMap::<&str, Vec<Pair<'a>>>::new();
    for p in pairs.iter() {
        by_subject.entry(p.subject()?).or_default().push(p.clone());
    }
    if by_subject.len() > 1 {
        debug!(
            "grouping lineages separately for subjects {}",
            by_subject.keys().format(", ")
        );
    }
    let mut result = LineageAssignment::default();
    for x in by_subject.values() {
        let mut r = group_lineages(x, opt, sim)?;
        result.lineages.append(&mut r.lineages);
        result.unassigned.append(&mut r.unassigned);
    }
    Ok(result)
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
