// Copyright (c) 2021 10X Genomics, Inc. All rights reserved.

// Greedy centroid clustering, in the manner of CD-HIT.
//
// Records are sorted by decreasing sequence length and then by identifier.  Walking that
// order, each record not yet clustered becomes the centroid of a new cluster, and takes in
// every later unclustered record whose similarity to it is at least the threshold.  Every
// record therefore lands in exactly one cluster, and every member is within threshold of its
// centroid (but not necessarily of the other members).
//
// The scan against a centroid is done in parallel.  It only reads the assignment state, and
// results are collected in sort order, so the output does not depend on the thread count.

use crate::pair::Pair;
use abclone_core::defs::{Chain, ClusterOpt, SequenceRecord};
use abclone_core::errors::AbcloneError;
use abclone_core::similarity::Similarity;
use log::debug;
use rayon::prelude::*;
use std::cmp::Reverse;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClusterMember<'a> {
    pub record: &'a SequenceRecord,
    pub identity: f64, // similarity to the centroid
}

// One cluster.  The centroid is always the first member, with identity 1.

#[derive(Clone, Debug, PartialEq)]
pub struct Cluster<'a> {
    pub name: String,
    pub centroid: &'a SequenceRecord,
    pub members: Vec<ClusterMember<'a>>,
}

impl<'a> Cluster<'a> {
    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn ids(&self) -> Vec<&'a str> {
        self.members.iter().map(|m| m.record.id.as_str()).collect()
    }

    pub fn records(&self) -> Vec<&'a SequenceRecord> {
        self.members.iter().map(|m| m.record).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.iter().any(|m| m.record.id == id)
    }
}

// All clusters from one run, in order of creation.

#[derive(Clone, Debug, PartialEq)]
pub struct ClusterSet<'a> {
    pub clusters: Vec<Cluster<'a>>,
    pub threshold: f64,
    pub metric: String,
}

impl<'a> ClusterSet<'a> {
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cluster<'a>> {
        self.clusters.iter()
    }

    // Largest cluster; on ties, the one created first.

    pub fn largest_cluster(&self) -> Option<&Cluster<'a>> {
        let mut best: Option<&Cluster<'a>> = None;
        for c in self.clusters.iter() {
            if best.map_or(true, |b| c.size() > b.size()) {
                best = Some(c);
            }
        }
        best
    }

    pub fn cluster_of(&self, id: &str) -> Option<&Cluster<'a>> {
        self.clusters.iter().find(|c| c.contains(id))
    }

    pub fn sizes(&self) -> Vec<usize> {
        self.clusters.iter().map(|c| c.size()).collect()
    }

    pub fn nrecords(&self) -> usize {
        self.clusters.iter().map(|c| c.size()).sum()
    }
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

// Cluster records on `opt.field` at `opt.threshold`, which must lie in (0, 1].
//
// A record lacking the field is clustered as an empty sequence, so it is still placed.

pub fn cluster_records<'a, I>(
    records: I,
    opt: &ClusterOpt,
    sim: &dyn Similarity,
) -> Result<ClusterSet<'a>, AbcloneError>
where
    I: IntoIterator<Item = &'a SequenceRecord>,
{
    opt.check()?;
    let mut recs = records
        .into_iter()
        .map(|r| (r, r.seq(&opt.field).unwrap_or("")))
        .collect::<Vec<_>>();
    let nempty = recs.iter().filter(|x| x.1.is_empty()).count();
    if nempty > 0 {
        debug!("{} records lack {} and are clustered as empty", nempty, opt.field);
    }
    recs.sort_by(|a, b| {
        (Reverse(a.1.len()), &a.0.id).cmp(&(Reverse(b.1.len()), &b.0.id))
    });

    let n = recs.len();
    let mut assigned = vec![false; n];
    let mut clusters = Vec::<Cluster<'a>>::new();
    for i in 0..n {
        if assigned[i] {
            continue;
        }
        assigned[i] = true;
        let (centroid, cseq) = recs[i];
        let hits = {
            let (assigned, recs) = (&assigned, &recs);
            (i + 1..n)
                .into_par_iter()
                .filter(|&k| !assigned[k])
                .map(|k| (k, sim.similarity(cseq, recs[k].1)))
                .filter(|&(_, s)| s >= opt.threshold)
                .collect::<Vec<(usize, f64)>>()
        };
        let mut members = vec![ClusterMember {
            record: centroid,
            identity: 1.0,
        }];
        for (k, s) in hits {
            assigned[k] = true;
            members.push(ClusterMember {
                record: recs[k].0,
                identity: s,
            });
        }
        clusters.push(Cluster {
            name: format!("cluster_{}", clusters.len()),
            centroid,
            members,
        });
    }
    let set = ClusterSet {
        clusters,
        threshold: opt.threshold,
        metric: sim.name(),
    };
    debug!(
        "clustered {} records into {} clusters at {} {}, largest has {} members",
        n,
        set.len(),
        set.metric,
        set.threshold,
        set.largest_cluster().map_or(0, |c| c.size())
    );
    Ok(set)
}

// Cluster pairs by one of their chains, using the first record of that chain.  Pairs lacking
// the chain are skipped.

pub fn cluster_pairs<'a>(
    pairs: &[Pair<'a>],
    chain: Chain,
    opt: &ClusterOpt,
    sim: &dyn Similarity,
) -> Result<ClusterSet<'a>, AbcloneError> {
    let records = pairs.iter().filter_map(|p| p.chain(chain)).collect::<Vec<_>>();
    if records.len() < pairs.len() {
        debug!(
            "{} of {} pairs lack a {} chain and are not clustered",
            pairs.len() - records.len(),
            pairs.len(),
            chain
        );
    }
    cluster_records(records, opt, sim)
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
