use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::MergeError;
use crate::model::BASE_BUCKET;
use crate::resolver::compile_rules;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct MergeConfig {
    pub name: String,
    /// Literal first segment of every structured key.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Namespace written into every routed final key.
    pub target_namespace: String,
    /// Field path whose value is looked up in the skeleton.
    #[serde(default = "default_name_field")]
    pub name_field: String,
    pub inputs: InputConfig,
    pub buckets: BTreeMap<String, BucketConfig>,
    /// Legacy `collection` or `namespace.collection` → bucket name.
    #[serde(default)]
    pub routes: HashMap<String, String>,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub remap: RemapConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_key_prefix() -> String {
    "Compendium".into()
}

fn default_name_field() -> String {
    "name".into()
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// Glob patterns, relative to the config file. Expanded in order.
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default = "default_true")]
    pub case_insensitive: bool,
    /// Reference dictionary used to recover canonical record ids.
    pub skeleton: String,
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Buckets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct BucketConfig {
    /// Collection segment of final keys routed into this bucket.
    pub collection: String,
    /// Output file name. Defaults to `<bucket>.json`.
    #[serde(default)]
    pub file: Option<String>,
}

impl BucketConfig {
    pub fn file_name(&self, bucket: &str) -> String {
        self.file.clone().unwrap_or_else(|| format!("{bucket}.json"))
    }
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub strategy: ConflictPolicy,
    /// Ordered source patterns for `priority_ranked`. Earlier = higher priority.
    #[serde(default)]
    pub rules: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    FirstWins,
    #[default]
    LastWins,
    LongestWins,
    PriorityRanked,
}

impl std::fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FirstWins => write!(f, "first_wins"),
            Self::LastWins => write!(f, "last_wins"),
            Self::LongestWins => write!(f, "longest_wins"),
            Self::PriorityRanked => write!(f, "priority_ranked"),
        }
    }
}

impl std::str::FromStr for ConflictPolicy {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.replace('-', "_").as_str() {
            "first_wins" => Ok(Self::FirstWins),
            "last_wins" => Ok(Self::LastWins),
            "longest_wins" => Ok(Self::LongestWins),
            "priority_ranked" => Ok(Self::PriorityRanked),
            other => Err(MergeError::ConfigValidation(format!(
                "unknown conflict policy: \"{other}\""
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Remap + Output
// ---------------------------------------------------------------------------

/// `whole_record`: once a record's name resolves in the skeleton, every field
/// of that record in the same source uses the canonical id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemapConfig {
    #[serde(default)]
    pub whole_record: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
    #[serde(default = "default_base_file")]
    pub base_file: String,
    #[serde(default = "default_conflicts_file")]
    pub conflicts: String,
    #[serde(default)]
    pub json: Option<String>,
}

fn default_output_dir() -> String {
    "lang".into()
}

fn default_base_file() -> String {
    "base.json".into()
}

fn default_conflicts_file() -> String {
    "merge-conflicts.csv".into()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            base_file: default_base_file(),
            conflicts: default_conflicts_file(),
            json: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl MergeConfig {
    pub fn from_toml(input: &str) -> Result<Self, MergeError> {
        let config: MergeConfig =
            toml::from_str(input).map_err(|e| MergeError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MergeError> {
        if self.key_prefix.trim().is_empty() {
            return Err(MergeError::ConfigValidation("key_prefix must not be empty".into()));
        }

        if !is_segment(&self.target_namespace) {
            return Err(MergeError::ConfigValidation(format!(
                "target_namespace must be a single non-empty segment, got \"{}\"",
                self.target_namespace
            )));
        }

        if self.name_field.trim().is_empty() {
            return Err(MergeError::ConfigValidation("name_field must not be empty".into()));
        }

        if self.inputs.patterns.is_empty() {
            return Err(MergeError::ConfigValidation(
                "inputs.patterns must list at least one glob".into(),
            ));
        }

        if self.buckets.is_empty() {
            return Err(MergeError::ConfigValidation(
                "at least 1 bucket is required".into(),
            ));
        }

        for (name, bucket) in &self.buckets {
            if name == BASE_BUCKET {
                return Err(MergeError::ConfigValidation(format!(
                    "bucket name '{BASE_BUCKET}' is reserved for the fallback bucket"
                )));
            }
            if !is_segment(&bucket.collection) {
                return Err(MergeError::ConfigValidation(format!(
                    "bucket '{name}': collection must be a single non-empty segment, got \"{}\"",
                    bucket.collection
                )));
            }
        }

        // Output files share one directory; each name has exactly one owner
        let mut owners: HashMap<String, String> = HashMap::new();
        let files = self
            .buckets
            .iter()
            .map(|(name, bucket)| (format!("bucket '{name}'"), bucket.file_name(name)))
            .chain([
                ("output.base_file".to_string(), self.output.base_file.clone()),
                ("output.conflicts".to_string(), self.output.conflicts.clone()),
            ]);
        for (owner, file) in files {
            if file.trim().is_empty() {
                return Err(MergeError::ConfigValidation(format!("{owner}: file name must not be empty")));
            }
            if let Some(previous) = owners.get(&file) {
                return Err(MergeError::ConfigValidation(format!(
                    "{owner} and {previous} both write \"{file}\""
                )));
            }
            owners.insert(file, owner);
        }

        // Every route must land in a declared bucket
        for (route, bucket) in &self.routes {
            if !self.buckets.contains_key(bucket) {
                return Err(MergeError::UnknownBucket {
                    route: route.clone(),
                    bucket: bucket.clone(),
                });
            }
        }

        compile_rules(&self.policy.rules)?;

        Ok(())
    }
}

/// Non-empty, no dots, no whitespace.
fn is_segment(s: &str) -> bool {
    !s.is_empty() && !s.contains('.') && !s.chars().any(char::is_whitespace)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
