use std::collections::HashMap;

use tracing::debug;

use crate::engine::load_dictionary;
use crate::error::MergeError;
use crate::key::KeyClassifier;
use crate::model::Dictionary;

/// Display name → canonical record id, per `namespace.collection`.
///
/// Built once from the reference dictionary and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct SkeletonIndex {
    names: HashMap<String, HashMap<String, String>>,
}

impl SkeletonIndex {
    /// Index every entry whose field path equals `name_field`.
    ///
    /// A name repeated inside one collection keeps the id seen last.
    pub fn build(reference: &Dictionary, classifier: &KeyClassifier, name_field: &str) -> Self {
        let mut names: HashMap<String, HashMap<String, String>> = HashMap::new();

        for (key, value) in reference {
            let Some(parsed) = classifier.classify(key) else {
                continue;
            };
            if parsed.field_path != name_field {
                continue;
            }
            let Some(name) = value.as_str() else {
                continue;
            };
            names
                .entry(parsed.collection_path())
                .or_default()
                .insert(name.to_string(), parsed.record_id);
        }

        for (collection, entries) in &names {
            debug!(collection = %collection, names = entries.len(), "skeleton collection indexed");
        }

        Self { names }
    }

    /// Parse the reference dictionary and index it. Any parse failure is fatal.
    pub fn from_json(
        source_id: &str,
        text: &str,
        classifier: &KeyClassifier,
        name_field: &str,
    ) -> Result<Self, MergeError> {
        let reference = load_dictionary(source_id, text)?;
        Ok(Self::build(&reference, classifier, name_field))
    }

    pub fn lookup(&self, namespace: &str, collection: &str, name: &str) -> Option<&str> {
        self.names
            .get(&format!("{namespace}.{collection}"))
            .and_then(|m| m.get(name))
            .map(String::as_str)
    }

    /// Total indexed names across all collections.
    pub fn len(&self) -> usize {
        self.names.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Indexed `namespace.collection` paths, sorted.
    pub fn collections(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.names.keys().map(String::as_str).collect();
        out.sort_unstable();
        out
    }
}
