use thiserror::Error;

#[derive(Debug, Error)]
pub enum MergeError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// Config validation error (empty namespace, bad bucket collection, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),

    /// A route points at a bucket that is not declared.
    #[error("route '{route}': unknown bucket '{bucket}'")]
    UnknownBucket { route: String, bucket: String },

    /// A priority rule is not a valid glob pattern.
    #[error("policy rule {index} ('{pattern}'): {message}")]
    InvalidPattern {
        index: usize,
        pattern: String,
        message: String,
    },

    /// A dictionary (input or skeleton) is not valid JSON.
    #[error("{source_id}: invalid JSON: {message}")]
    Parse { source_id: String, message: String },

    /// A dictionary parsed but its top level is not an object.
    #[error("{source_id}: top-level value must be a JSON object")]
    NotAnObject { source_id: String },

    /// No input dictionaries were supplied.
    #[error("no input dictionaries to merge")]
    NoInputs,

    /// Audit log serialization error.
    #[error("audit log error: {0}")]
    Audit(String),
}
