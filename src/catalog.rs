//! The canonical, append-only collection of loaded records.

use crate::config::TOP_TYPES_SHOWN;
use crate::{PokeType, Record, RecordId};
use log::warn;
use std::collections::HashMap;

/// Records ordered strictly ascending by id. Once added, a record is never
/// removed or modified.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    records: Vec<Record>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one batch of fetched records. The batch is sorted by id first, so
    /// completion order never leaks into catalog order. Ids already present are
    /// skipped. Returns how many records were added.
    pub fn append_batch(&mut self, mut batch: Vec<Record>) -> usize {
        batch.sort_by_key(|r| r.id);
        let mut added = 0;
        for record in batch {
            match self.records.binary_search_by_key(&record.id, |r| r.id) {
                Ok(_) => warn!("Ignoring duplicate record {}", record.id),
                Err(pos) => {
                    self.records.insert(pos, record);
                    added += 1;
                }
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.records
            .binary_search_by_key(&id, |r| r.id)
            .ok()
            .map(|pos| &self.records[pos])
    }

    /// Exact name match, as used to resolve evolution-chain species.
    pub fn find_by_name(&self, name: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.name == name)
    }

    /// Record counts per type, most common first; ties keep canonical type order.
    pub fn type_counts(&self) -> Vec<(PokeType, usize)> {
        let mut counts: HashMap<PokeType, usize> = HashMap::new();
        for ty in self.records.iter().flat_map(|r| r.types.iter()) {
            *counts.entry(*ty).or_default() += 1;
        }
        let mut sorted: Vec<(PokeType, usize)> = PokeType::ALL
            .into_iter()
            .filter_map(|ty| counts.get(&ty).map(|&n| (ty, n)))
            .collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted
    }

    pub fn top_types(&self) -> Vec<(PokeType, usize)> {
        let mut counts = self.type_counts();
        counts.truncate(TOP_TYPES_SHOWN);
        counts
    }
}
