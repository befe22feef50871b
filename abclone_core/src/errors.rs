// Copyright (c) 2021 10X Genomics, Inc. All rights reserved.

// Errors that surface to the caller.  Recoverable conditions (records lacking a field, pairs
// lacking a chain) are not errors: they are counted and reported alongside the results.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AbcloneError {
    #[error(
        "lineage grouping was given pairs from {} subjects ({}); group each subject \
         separately or call group_lineages_by_subject",
        .subjects.len(),
        .subjects.join(", ")
    )]
    MixedSubjects { subjects: Vec<String> },

    #[error("pair {pair} has members from more than one subject: {}", .subjects.join(", "))]
    InconsistentSubject { pair: String, subjects: Vec<String> },

    #[error("identity threshold must lie in (0, 1], but {0} was given")]
    InvalidThreshold(f64),

    #[error("the record identifier {0} occurs more than once")]
    DuplicateId(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse json: {0}")]
    Json(#[from] serde_json::Error),
}
