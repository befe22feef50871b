// Copyright (c) 2021 10X Genomics, Inc. All rights reserved.

// Holder for the records of one load batch.  Everything downstream (pairs, lineages,
// clusters) borrows from here.

use crate::defs::SequenceRecord;
use crate::errors::AbcloneError;
use log::debug;
use std::collections::HashMap;
use string_utils::TextUtils;
use vector_utils::unique_sort;

#[derive(Clone, Debug, Default)]
pub struct RecordStore {
    records: Vec<SequenceRecord>,
    to_index: HashMap<String, usize>,
}

impl RecordStore {
    pub fn new(records: Vec<SequenceRecord>) -> Result<RecordStore, AbcloneError> {
        let to_index = index_ids(&records)?;
        debug!("loaded {} records", records.len());
        Ok(RecordStore { records, to_index })
    }

    // Load from a json array of records.

    pub fn from_json_str(s: &str) -> Result<RecordStore, AbcloneError> {
        let records: Vec<SequenceRecord> = serde_json::from_str(s)?;
        RecordStore::new(records)
    }

    pub fn from_json_file(path: &str) -> Result<RecordStore, AbcloneError> {
        let s = std::fs::read_to_string(path).map_err(|source| AbcloneError::Io {
            path: path.to_string(),
            source,
        })?;
        RecordStore::from_json_str(&s)
    }

    pub fn records(&self) -> &[SequenceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&SequenceRecord> {
        self.to_index.get(id).map(|&i| &self.records[i])
    }

    pub fn by_subject(&self, subject: &str) -> Vec<&SequenceRecord> {
        self.records.iter().filter(|r| r.subject == subject).collect()
    }

    pub fn subjects(&self) -> Vec<String> {
        let mut s = self
            .records
            .iter()
            .map(|r| r.subject.clone())
            .collect::<Vec<_>>();
        unique_sort(&mut s);
        s
    }

    // Truncate every identifier to at most `n` characters, e.g. to strip a droplet suffix.
    //
    // Fails, leaving the store unchanged, if truncation makes two identifiers collide.

    pub fn truncate_ids(&mut self, n: usize) -> Result<(), AbcloneError> {
        self.normalize_ids(|id| id.chars().take(n).collect())
    }

    // Same, for an arbitrary normalization.

    pub fn normalize_ids<F: Fn(&str) -> String>(&mut self, f: F) -> Result<(), AbcloneError> {
        let mut records = self.records.clone();
        for r in records.iter_mut() {
            r.id = f(&r.id);
        }
        self.to_index = index_ids(&records)?;
        self.records = records;
        Ok(())
    }

    // Strip everything from the first occurrence of delim onward, as loaders that append
    // read-level suffixes require.  An empty delim leaves identifiers unchanged.

    pub fn strip_id_suffix(&mut self, delim: &str) -> Result<(), AbcloneError> {
        self.normalize_ids(|id| {
            if delim.is_empty() || !id.contains(delim) {
                id.to_string()
            } else {
                id.before(delim).to_string()
            }
        })
    }
}

fn index_ids(records: &[SequenceRecord]) -> Result<HashMap<String, usize>, AbcloneError> {
    let mut to_index = HashMap::<String, usize>::with_capacity(records.len());
    for (i, r) in records.iter().enumerate() {
        if to_index.insert(r.id.clone(), i).is_some() {
            return Err(AbcloneError::DuplicateId(r.id.clone()));
        }
    }
    Ok(to_index)
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
