//! `locmerge-merge`: localization dictionary merge engine.
//!
//! Pure engine crate: receives pre-loaded dictionaries, returns per-bucket
//! output maps plus an audit trail of every resolved conflict.
//! No CLI or filesystem-walking dependencies.

pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod key;
pub mod model;
pub mod normalize;
pub mod resolver;
pub mod router;
pub mod skeleton;

pub use config::MergeConfig;
pub use engine::{run, MergeEngine};
pub use error::MergeError;
pub use key::{KeyClassifier, StructuredKey};
pub use model::{ConflictRecord, Dictionary, MergeInput, MergeResult, OutputBucket, SourceDictionary};
pub use resolver::{ConflictResolver, Resolution};
pub use router::CategoryRouter;
pub use skeleton::SkeletonIndex;
