// Copyright (c) 2021 10X Genomics, Inc. All rights reserved.

// Grouping of annotated antibody sequences: records into droplet pairs, pairs into clonal
// lineages, records into similarity clusters, and projections of annotation values for
// plotting.

pub mod cluster;
pub mod lineage;
pub mod pair;
pub mod summary;

pub use cluster::{cluster_pairs, cluster_records, Cluster, ClusterMember, ClusterSet};
pub use lineage::{
    group_lineages, group_lineages_by_subject, Lineage, LineageAssignment, Unassigned,
    UnassignedReason,
};
pub use pair::{assign_pairs, pair_key, pairs_only, Pair};
pub use summary::{
    group_stats, lineage_ranges, project_pairs, project_records, GroupStats, LineageRange,
    LineageRanges, Metric, Point, Projection,
};
