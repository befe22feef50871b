// Copyright (c) 2021 10X Genomics, Inc. All rights reserved.

// Order statistics for the summary aggregator.  Inputs need not be sorted.  All functions
// return None on empty input.

pub fn median_f64(x: &[f64]) -> Option<f64> {
    if x.is_empty() {
        return None;
    }
    let mut y = x.to_vec();
    y.sort_by(|a, b| a.total_cmp(b));
    let h = y.len() / 2;
    if y.len() % 2 == 1 {
        Some(y[h])
    } else {
        Some((y[h - 1] + y[h]) / 2.0)
    }
}

pub fn mean_f64(x: &[f64]) -> Option<f64> {
    if x.is_empty() {
        None
    } else {
        Some(x.iter().sum::<f64>() / x.len() as f64)
    }
}

pub fn min_max_f64(x: &[f64]) -> Option<(f64, f64)> {
    let mut it = x.iter();
    let first = *it.next()?;
    let (mut lo, mut hi) = (first, first);
    for v in it {
        lo = lo.min(*v);
        hi = hi.max(*v);
    }
    Some((lo, hi))
}
