// Copyright (c) 2021 10X Genomics, Inc. All rights reserved.

// Core types for abclone: annotated sequence records, the record store, control options,
// similarity metrics and errors.  The grouping algorithms live in the abclone crate.

pub mod defs;
pub mod errors;
pub mod median;
pub mod record_store;
pub mod similarity;

pub use defs::{
    AbcloneControl, AnnValue, Chain, ClusterOpt, LineageOpt, PairOpt, SeqField, SequenceRecord,
    SummaryOpt,
};
pub use errors::AbcloneError;
pub use record_store::RecordStore;
pub use similarity::{AlignIdentity, EditIdentity, HammingIdentity, IdentityDenominator, Similarity};
