// Copyright (c) 2021 10X Genomics, Inc. All rights reserved.

// Project annotation values into (value, group, label) points for downstream plotting, and
// compute per-lineage ranges for bubble plots.  Nothing here assigns colors or draws
// anything: the group key is handed on and presentation is left to the caller.
//
// Records missing what was asked for are dropped and counted, never treated as errors.

use crate::lineage::Lineage;
use crate::pair::Pair;
use abclone_core::defs::{Chain, SequenceRecord, SummaryOpt};
use abclone_core::median::{mean_f64, median_f64, min_max_f64};
use itertools::Itertools;
use log::warn;

#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    pub value: f64,
    pub group: String,
    pub label: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Projection {
    pub points: Vec<Point>,
    pub missing: usize, // records excluded for lack of chain, field or group key
}

impl Projection {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    // Distinct group keys, in sorted order.

    pub fn groups(&self) -> Vec<&str> {
        self.points
            .iter()
            .map(|p| p.group.as_str())
            .sorted()
            .dedup()
            .collect()
    }

    fn add(&mut self, r: &SequenceRecord, field: &str, label: &str, opt: &SummaryOpt) {
        let value = r.num(field);
        let group = match &opt.group_field {
            None => Some(r.subject.clone()),
            Some(g) => group_key(r, g),
        };
        match (value, group) {
            (Some(value), Some(group)) => self.points.push(Point {
                value,
                group,
                label: label.to_string(),
            }),
            _ => self.missing += 1,
        }
    }
}

// A group key may be textual or numeric.

fn group_key(r: &SequenceRecord, field: &str) -> Option<String> {
    if let Some(s) = r.text(field) {
        Some(s.to_string())
    } else {
        r.num(field).map(|x| x.to_string())
    }
}

fn report_missing(p: &Projection, field: &str) {
    if p.missing > 0 {
        warn!(
            "{} records lack {} or a group key and were left out of the projection",
            p.missing, field
        );
    }
}

// Project numeric annotation `field` of each record, labeled by record id.  If chain is
// given, records of any other chain count as missing.

pub fn project_records<'a, I>(
    records: I,
    chain: Option<Chain>,
    field: &str,
    opt: &SummaryOpt,
) -> Projection
where
    I: IntoIterator<Item = &'a SequenceRecord>,
{
    let mut p = Projection::default();
    for r in records {
        match chain {
            Some(c) if r.chain != c => p.missing += 1,
            _ => p.add(r, field, &r.id, opt),
        }
    }
    report_missing(&p, field);
    p
}

// Project numeric annotation `field` of the first `chain` record of each pair, labeled by
// pair name.  Pairs without that chain count as missing.

pub fn project_pairs(pairs: &[Pair], chain: Chain, field: &str, opt: &SummaryOpt) -> Projection {
    let mut p = Projection::default();
    for x in pairs.iter() {
        match x.chain(chain) {
            Some(r) => p.add(r, field, &x.name, opt),
            None => p.missing += 1,
        }
    }
    report_missing(&p, field);
    p
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

#[derive(Clone, Debug, PartialEq)]
pub struct GroupStats {
    pub group: String,
    pub n: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

// Per-group distribution summary of a projection, in sorted group order.

pub fn group_stats(p: &Projection) -> Vec<GroupStats> {
    let mut stats = Vec::<GroupStats>::new();
    let sorted = p
        .points
        .iter()
        .sorted_by(|a, b| a.group.cmp(&b.group))
        .collect::<Vec<_>>();
    for (group, points) in &sorted.into_iter().group_by(|x| x.group.clone()) {
        let values = points.map(|x| x.value).collect::<Vec<_>>();
        if let (Some((min, max)), Some(mean), Some(median)) =
            (min_max_f64(&values), mean_f64(&values), median_f64(&values))
        {
            stats.push(GroupStats {
                group,
                n: values.len(),
                min,
                max,
                mean,
                median,
            });
        }
    }
    stats
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

// A per-record metric: an annotation as is, or its divergence `100 - value` (for percent
// identity to germline, this is percent divergence).

#[derive(Clone, Debug, PartialEq)]
pub enum Metric {
    Field(String),
    Divergence(String),
}

impl Metric {
    pub fn eval(&self, r: &SequenceRecord) -> Option<f64> {
        match self {
            Metric::Field(f) => r.num(f),
            Metric::Divergence(f) => r.num(f).map(|x| 100.0 - x),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LineageRange {
    pub name: String,
    pub subject: String,
    pub min: f64,
    pub max: f64,
    pub size: usize, // number of heavy-bearing pairs, for marker size
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LineageRanges {
    pub ranges: Vec<LineageRange>,
    pub missing: usize, // heavy records lacking the metric
}

// Range of `metric` over the heavy chains of each lineage.
//
// Lineages with at most one heavy-bearing pair are left out, as are lineages in which fewer
// than two heavy chains carry the metric.

pub fn lineage_ranges(lineages: &[Lineage], metric: &Metric) -> LineageRanges {
    let mut out = LineageRanges::default();
    for l in lineages.iter() {
        let heavy_pairs = l.heavy_pairs();
        if heavy_pairs.len() <= 1 {
            continue;
        }
        let mut values = Vec::<f64>::new();
        for p in heavy_pairs.iter() {
            match p.first_heavy().and_then(|r| metric.eval(r)) {
                Some(v) => values.push(v),
                None => out.missing += 1,
            }
        }
        if values.len() < 2 {
            continue;
        }
        if let Some((min, max)) = min_max_f64(&values) {
            out.ranges.push(LineageRange {
                name: l.name.clone(),
                subject: l.subject.clone(),
                min,
                max,
                size: heavy_pairs.len(),
            });
        }
    }
    if out.missing > 0 {
        warn!("{} heavy chains lack {:?}", out.missing, metric);
    }
    out
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
