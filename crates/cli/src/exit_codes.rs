//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success (conflicts alone do not fail a run)               |
//! | 1    | General error (unspecified)                               |
//! | 2    | CLI usage error (bad args, reported by clap)              |
//! | 3    | Invalid merge config                                      |
//! | 4    | I/O error (unreadable input, unwritable output)           |
//! | 5    | Parse error (skeleton or input is not a JSON object)      |
//! | 6    | No input dictionaries discovered                          |
//! | 7    | Conflicts found and `--fail-on-conflict` was given        |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use locmerge_merge::MergeError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Config file parses badly or fails validation.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// A file could not be read, or an output could not be written.
pub const EXIT_IO: u8 = 4;

/// Skeleton or input dictionary is not valid JSON / not an object.
pub const EXIT_PARSE: u8 = 5;

/// Input globs matched nothing.
pub const EXIT_NO_INPUTS: u8 = 6;

/// Conflicts were detected and the run was asked to fail on them.
pub const EXIT_CONFLICTS: u8 = 7;

/// Map an engine error to its exit code.
pub fn merge_exit_code(err: &MergeError) -> u8 {
    match err {
        MergeError::ConfigParse(_)
        | MergeError::ConfigValidation(_)
        | MergeError::UnknownBucket { .. }
        | MergeError::InvalidPattern { .. } => EXIT_INVALID_CONFIG,
        MergeError::Parse { .. } | MergeError::NotAnObject { .. } => EXIT_PARSE,
        MergeError::NoInputs => EXIT_NO_INPUTS,
        MergeError::Audit(_) => EXIT_IO,
    }
}
