// 🗺️ Mapping Tables - Maintained domain/name reference data
//
// Both tables are read-only inputs maintained outside the engine. The
// indexes built from them are the injected lookup caches the pipeline
// components share - keyed by normalized value, safe to reuse across
// partitions because lookups never mutate.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::domain::DomainType;

// ============================================================================
// TABLE ROWS
// ============================================================================

/// One row of the domain mapping table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainMappingEntry {
    #[serde(rename = "Original_Domain")]
    pub original_domain: String,

    #[serde(rename = "Normalized_Domain")]
    pub normalized_domain: String,

    #[serde(rename = "Domain_Type")]
    pub domain_type: DomainType,
}

/// One row of the name mapping table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameMappingEntry {
    #[serde(rename = "Original_Name")]
    pub original_name: String,

    #[serde(rename = "Normalized_Name")]
    pub normalized_name: String,

    #[serde(rename = "Normalization_Type")]
    pub normalization_type: String,
}

// ============================================================================
// DOMAIN INDEX
// ============================================================================

/// Lookup cache over the domain mapping table, keyed by lowercased
/// original domain. Later rows for the same domain win, matching the
/// maintained table's "last correction applies" convention.
#[derive(Debug, Clone, Default)]
pub struct DomainIndex {
    entries: HashMap<String, DomainMappingEntry>,
}

impl DomainIndex {
    pub fn new() -> Self {
        DomainIndex {
            entries: HashMap::new(),
        }
    }

    pub fn from_entries(entries: Vec<DomainMappingEntry>) -> Self {
        let mut index = DomainIndex::new();
        for entry in entries {
            index.insert(entry);
        }
        index
    }

    pub fn insert(&mut self, entry: DomainMappingEntry) {
        self.entries
            .insert(entry.original_domain.trim().to_lowercase(), entry);
    }

    pub fn lookup(&self, domain: &str) -> Option<&DomainMappingEntry> {
        self.entries.get(&domain.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// NAME INDEX
// ============================================================================

/// Lookup cache over the name mapping table, keyed by the uppercased,
/// whitespace-collapsed original name.
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    entries: HashMap<String, NameMappingEntry>,
}

impl NameIndex {
    pub fn new() -> Self {
        NameIndex {
            entries: HashMap::new(),
        }
    }

    pub fn from_entries(entries: Vec<NameMappingEntry>) -> Self {
        let mut index = NameIndex::new();
        for entry in entries {
            index.insert(entry);
        }
        index
    }

    pub fn insert(&mut self, entry: NameMappingEntry) {
        self.entries.insert(name_key(&entry.original_name), entry);
    }

    pub fn lookup(&self, name: &str) -> Option<&NameMappingEntry> {
        self.entries.get(&name_key(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Uppercase + collapse whitespace, so "Acme  corp" and "ACME CORP"
/// hit the same entry
fn name_key(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

// ============================================================================
// CSV LOADERS
// ============================================================================

pub fn load_domain_mappings(csv_path: &Path) -> Result<Vec<DomainMappingEntry>> {
    let mut rdr =
        csv::Reader::from_path(csv_path).context("Failed to open domain mapping CSV")?;

    let mut entries = Vec::new();
    for result in rdr.deserialize() {
        let entry: DomainMappingEntry =
            result.context("Failed to deserialize domain mapping row")?;
        entries.push(entry);
    }

    Ok(entries)
}

pub fn load_name_mappings(csv_path: &Path) -> Result<Vec<NameMappingEntry>> {
    let mut rdr =
        csv::Reader::from_path(csv_path).context("Failed to open name mapping CSV")?;

    let mut entries = Vec::new();
    for result in rdr.deserialize() {
        let entry: NameMappingEntry =
            result.context("Failed to deserialize name mapping row")?;
        entries.push(entry);
    }

    Ok(entries)
}

// ============================================================================
// TESTS
// ============================================================================
