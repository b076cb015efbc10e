use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use serde_json::{Map, Value};

/// Flat key → value dictionary. Iteration follows the source's declared order.
pub type Dictionary = Map<String, Value>;

/// Name of the fallback bucket for unstructured and unrouted keys.
pub const BASE_BUCKET: &str = "base";

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One parsed input dictionary and the identifier it was loaded from.
#[derive(Debug, Clone)]
pub struct SourceDictionary {
    pub source: String,
    pub entries: Dictionary,
}

impl SourceDictionary {
    pub fn new(source: impl Into<String>, entries: Dictionary) -> Self {
        Self {
            source: source.into(),
            entries,
        }
    }
}

/// Input dictionaries in processing order. Order decides which value wins.
#[derive(Debug, Clone, Default)]
pub struct MergeInput {
    pub sources: Vec<SourceDictionary>,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Accumulated output for one bucket.
#[derive(Debug, Clone)]
pub struct OutputBucket {
    pub name: String,
    /// Collection written into final keys. `None` for the base bucket.
    pub collection: Option<String>,
    pub file: String,
    pub entries: Dictionary,
    /// Final key → source that currently holds it.
    pub provenance: HashMap<String, String>,
}

impl OutputBucket {
    pub fn new(name: impl Into<String>, collection: Option<String>, file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collection,
            file: file.into(),
            entries: Dictionary::new(),
            provenance: HashMap::new(),
        }
    }

    pub fn is_base(&self) -> bool {
        self.collection.is_none()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn source_of(&self, key: &str) -> Option<&str> {
        self.provenance.get(key).map(String::as_str)
    }
}

/// One detected collision between two sources on the same final key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictRecord {
    pub bucket: String,
    pub key: String,
    pub kept_value: Value,
    pub dropped_value: Value,
    pub kept_source: String,
    pub dropped_source: String,
}

/// Routing outcomes that are absorbed rather than fatal.
#[derive(Debug, Clone, Default)]
pub struct RoutingTally {
    pub unrouted_keys: usize,
    pub unknown_collections: BTreeSet<String>,
    pub remapped_names: usize,
    pub unmatched_names: usize,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct MergeSummary {
    pub sources: usize,
    pub total_keys: usize,
    pub keys_per_bucket: BTreeMap<String, usize>,
    pub conflicts: usize,
    pub conflicts_per_bucket: BTreeMap<String, usize>,
    pub unrouted_keys: usize,
    pub unknown_collections: Vec<String>,
    pub remapped_names: usize,
    pub unmatched_names: usize,
}

impl MergeSummary {
    pub fn has_conflicts(&self) -> bool {
        self.conflicts > 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MergeMeta {
    pub config_name: String,
    pub policy: String,
    pub target_namespace: String,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MergeResult {
    pub meta: MergeMeta,
    pub summary: MergeSummary,
    /// Configured buckets in name order, base bucket last.
    #[serde(skip)]
    pub buckets: Vec<OutputBucket>,
    pub conflicts: Vec<ConflictRecord>,
}

impl MergeResult {
    pub fn bucket(&self, name: &str) -> Option<&OutputBucket> {
        self.buckets.iter().find(|b| b.name == name)
    }

    pub fn base(&self) -> Option<&OutputBucket> {
        self.buckets.iter().find(|b| b.is_base())
    }
}
