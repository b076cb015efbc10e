use std::collections::{BTreeMap, HashMap};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::MergeConfig;
use crate::error::MergeError;
use crate::evidence::compute_summary;
use crate::key::{KeyClassifier, StructuredKey};
use crate::model::{
    ConflictRecord, Dictionary, MergeInput, MergeMeta, MergeResult, OutputBucket, RoutingTally,
    SourceDictionary, BASE_BUCKET,
};
use crate::normalize::values_equivalent;
use crate::resolver::{ConflictResolver, Resolution};
use crate::router::CategoryRouter;
use crate::skeleton::SkeletonIndex;

/// Merge per config. Returns per-bucket dictionaries, conflicts and summary.
pub fn run(
    config: &MergeConfig,
    skeleton: &SkeletonIndex,
    input: &MergeInput,
) -> Result<MergeResult, MergeError> {
    MergeEngine::new(config)?.merge(skeleton, input)
}

/// Holds everything a merge run reads but never mutates.
#[derive(Debug, Clone)]
pub struct MergeEngine {
    config_name: String,
    classifier: KeyClassifier,
    router: CategoryRouter,
    resolver: ConflictResolver,
    target_namespace: String,
    name_field: String,
    whole_record: bool,
    /// Bucket name → (final collection, output file).
    buckets: BTreeMap<String, (String, String)>,
    base_file: String,
}

/// Where one input entry lands.
struct Placement<'a> {
    bucket: Option<&'a str>,
    key: String,
}

impl MergeEngine {
    pub fn new(config: &MergeConfig) -> Result<Self, MergeError> {
        config.validate()?;

        let buckets = config
            .buckets
            .iter()
            .map(|(name, b)| (name.clone(), (b.collection.clone(), b.file_name(name))))
            .collect();

        Ok(Self {
            config_name: config.name.clone(),
            classifier: KeyClassifier::new(&config.key_prefix)?,
            router: CategoryRouter::from_config(config),
            resolver: ConflictResolver::from_config(&config.policy)?,
            target_namespace: config.target_namespace.clone(),
            name_field: config.name_field.clone(),
            whole_record: config.remap.whole_record,
            buckets,
            base_file: config.output.base_file.clone(),
        })
    }

    pub fn classifier(&self) -> &KeyClassifier {
        &self.classifier
    }

    pub fn resolver(&self) -> &ConflictResolver {
        &self.resolver
    }

    pub fn router(&self) -> &CategoryRouter {
        &self.router
    }

    /// Build the skeleton index with this engine's prefix and name field.
    pub fn index_skeleton(&self, reference: &Dictionary) -> SkeletonIndex {
        SkeletonIndex::build(reference, &self.classifier, &self.name_field)
    }

    /// Merge all sources in the given order.
    pub fn merge(&self, skeleton: &SkeletonIndex, input: &MergeInput) -> Result<MergeResult, MergeError> {
        if input.sources.is_empty() {
            return Err(MergeError::NoInputs);
        }

        let mut outputs: BTreeMap<String, OutputBucket> = self
            .buckets
            .iter()
            .map(|(name, (collection, file))| {
                (name.clone(), OutputBucket::new(name, Some(collection.clone()), file))
            })
            .collect();
        let mut base = OutputBucket::new(BASE_BUCKET, None, &self.base_file);
        let mut conflicts = Vec::new();
        let mut tally = RoutingTally::default();

        for source in &input.sources {
            debug!(source = %source.source, entries = source.entries.len(), "merging source");

            let record_ids = if self.whole_record {
                self.canonical_record_ids(skeleton, source)
            } else {
                HashMap::new()
            };

            for (key, value) in &source.entries {
                let placement = self.place(key, value, skeleton, &record_ids, &mut tally);
                let bucket = match placement.bucket.and_then(|name| outputs.get_mut(name)) {
                    Some(bucket) => bucket,
                    None => &mut base,
                };
                if let Some(record) = self.insert(bucket, placement.key, value, &source.source) {
                    conflicts.push(record);
                }
            }
        }

        let mut buckets: Vec<OutputBucket> = outputs.into_values().collect();
        buckets.push(base);

        let summary = compute_summary(&buckets, &conflicts, &tally, input.sources.len());

        Ok(MergeResult {
            meta: MergeMeta {
                config_name: self.config_name.clone(),
                policy: self.resolver.policy().to_string(),
                target_namespace: self.target_namespace.clone(),
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
                run_at: chrono::Utc::now().to_rfc3339(),
            },
            summary,
            buckets,
            conflicts,
        })
    }

    /// Classify, route and rewrite one key.
    fn place(
        &self,
        key: &str,
        value: &Value,
        skeleton: &SkeletonIndex,
        record_ids: &HashMap<String, String>,
        tally: &mut RoutingTally,
    ) -> Placement<'_> {
        let passthrough = || Placement {
            bucket: None,
            key: key.to_string(),
        };

        let Some(parsed) = self.classifier.classify(key) else {
            return passthrough();
        };

        let Some((bucket, collection)) = self
            .router
            .route(&parsed.namespace, &parsed.collection)
            .and_then(|name| self.buckets.get_key_value(name))
            .map(|(name, (collection, _))| (name.as_str(), collection.as_str()))
        else {
            tally.unrouted_keys += 1;
            let path = parsed.collection_path();
            if !tally.unknown_collections.contains(&path) {
                warn!(collection = %path, "unknown legacy collection, keeping keys in base");
                tally.unknown_collections.insert(path);
            }
            return passthrough();
        };

        let record_id = self.final_record_id(&parsed, value, collection, skeleton, record_ids, tally);

        Placement {
            bucket: Some(bucket),
            key: self.classifier.compose(
                &self.target_namespace,
                collection,
                &record_id,
                &parsed.field_path,
            ),
        }
    }

    fn final_record_id(
        &self,
        parsed: &StructuredKey,
        value: &Value,
        collection: &str,
        skeleton: &SkeletonIndex,
        record_ids: &HashMap<String, String>,
        tally: &mut RoutingTally,
    ) -> String {
        if parsed.field_path == self.name_field {
            if let Some(name) = value.as_str() {
                if let Some(id) = skeleton.lookup(&self.target_namespace, collection, name) {
                    if id != parsed.record_id {
                        tally.remapped_names += 1;
                    }
                    return id.to_string();
                }
                tally.unmatched_names += 1;
                debug!(
                    name = %name,
                    collection = %collection,
                    record_id = %parsed.record_id,
                    "name not in skeleton, keeping record id"
                );
            }
            return parsed.record_id.clone();
        }

        record_ids
            .get(&record_key(parsed))
            .cloned()
            .unwrap_or_else(|| parsed.record_id.clone())
    }

    /// Legacy record → canonical id, from the name fields of one source.
    fn canonical_record_ids(&self, skeleton: &SkeletonIndex, source: &SourceDictionary) -> HashMap<String, String> {
        let mut ids = HashMap::new();
        for (key, value) in &source.entries {
            let Some(parsed) = self.classifier.classify(key) else {
                continue;
            };
            if parsed.field_path != self.name_field {
                continue;
            }
            let Some(name) = value.as_str() else {
                continue;
            };
            let Some((collection, _)) = self
                .router
                .route(&parsed.namespace, &parsed.collection)
                .and_then(|bucket| self.buckets.get(bucket))
            else {
                continue;
            };
            if let Some(id) = skeleton.lookup(&self.target_namespace, collection, name) {
                ids.insert(record_key(&parsed), id.to_string());
            }
        }
        ids
    }

    /// Insert into a bucket, resolving a collision if the key is already held.
    fn insert(
        &self,
        bucket: &mut OutputBucket,
        key: String,
        value: &Value,
        source: &str,
    ) -> Option<ConflictRecord> {
        if !bucket.entries.contains_key(&key) {
            bucket.entries.insert(key.clone(), value.clone());
            bucket.provenance.insert(key, source.to_string());
            return None;
        }

        let existing = bucket.entries[&key].clone();
        if values_equivalent(&existing, value) {
            return None;
        }

        let existing_source = bucket.source_of(&key).unwrap_or_default().to_string();
        let resolution = self.resolver.resolve(&existing, value, &existing_source, source);

        info!(
            bucket = %bucket.name,
            key = %key,
            existing_source = %existing_source,
            incoming_source = %source,
            resolution = %resolution,
            "conflict resolved"
        );

        let record = match resolution {
            Resolution::KeepExisting => ConflictRecord {
                bucket: bucket.name.clone(),
                key,
                kept_value: existing,
                dropped_value: value.clone(),
                kept_source: existing_source,
                dropped_source: source.to_string(),
            },
            Resolution::TakeIncoming => {
                bucket.entries.insert(key.clone(), value.clone());
                bucket.provenance.insert(key.clone(), source.to_string());
                ConflictRecord {
                    bucket: bucket.name.clone(),
                    key,
                    kept_value: value.clone(),
                    dropped_value: existing,
                    kept_source: source.to_string(),
                    dropped_source: existing_source,
                }
            }
        };

        Some(record)
    }
}

/// Identity of a legacy record. Segments never contain dots.
fn record_key(parsed: &StructuredKey) -> String {
    format!("{}.{}.{}", parsed.namespace, parsed.collection, parsed.record_id)
}

/// Parse one dictionary. The top level must be a JSON object.
pub fn load_dictionary(source_id: &str, text: &str) -> Result<Dictionary, MergeError> {
    let value: Value = serde_json::from_str(text).map_err(|e| MergeError::Parse {
        source_id: source_id.to_string(),
        message: e.to_string(),
    })?;

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(MergeError::NotAnObject {
            source_id: source_id.to_string(),
        }),
    }
}

/// Parse one input file into a [`SourceDictionary`].
pub fn load_source(source_id: &str, text: &str) -> Result<SourceDictionary, MergeError> {
    Ok(SourceDictionary::new(source_id, load_dictionary(source_id, text)?))
}
