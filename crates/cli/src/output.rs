//! Writes merged buckets, the conflict audit log and the JSON report.

use std::fs;
use std::path::{Path, PathBuf};

use locmerge_merge::audit::write_conflicts_csv;
use locmerge_merge::model::{ConflictRecord, MergeResult, OutputBucket};
use tracing::debug;

use crate::CliError;

/// Write every bucket (including empty ones) as pretty JSON into `dir`.
/// Files are staged as `<file>.tmp` and renamed into place only after every
/// bucket was written, so a failed write leaves the previous outputs as they were.
/// Returns `(path, key count)` per written file.
pub fn write_buckets(dir: &Path, result: &MergeResult) -> Result<Vec<(PathBuf, usize)>, CliError> {
    fs::create_dir_all(dir)
        .map_err(|e| CliError::io(format!("cannot create {}: {e}", dir.display())))?;

    let mut staged: Vec<(PathBuf, PathBuf, usize)> = Vec::with_capacity(result.buckets.len());
    for bucket in &result.buckets {
        let path = dir.join(&bucket.file);
        let tmp_path = staging_path(&path);
        if let Err(e) = write_bucket(&tmp_path, bucket) {
            discard(&tmp_path);
            for (tmp, _, _) in &staged {
                discard(tmp);
            }
            return Err(e);
        }
        staged.push((tmp_path, path, bucket.len()));
    }

    staged
        .into_iter()
        .map(|(tmp_path, path, keys)| -> Result<(PathBuf, usize), CliError> {
            fs::rename(&tmp_path, &path).map_err(|e| {
                CliError::io(format!("failed to rename tmp to {}: {e}", path.display()))
            })?;
            Ok((path, keys))
        })
        .collect()
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

fn discard(tmp_path: &Path) {
    if let Err(e) = fs::remove_file(tmp_path) {
        debug!(path = %tmp_path.display(), error = %e, "could not remove staged file");
    }
}

fn write_bucket(path: &Path, bucket: &OutputBucket) -> Result<(), CliError> {
    let mut json = serde_json::to_string_pretty(&bucket.entries)
        .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
    json.push('\n');
    fs::write(path, json).map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))
}

/// Write the audit CSV when there are conflicts; otherwise remove a stale one.
/// Returns whether a log now exists at `path`.
pub fn write_conflict_log(path: &Path, conflicts: &[ConflictRecord]) -> Result<bool, CliError> {
    if conflicts.is_empty() {
        if path.exists() {
            fs::remove_file(path)
                .map_err(|e| CliError::io(format!("cannot remove stale {}: {e}", path.display())))?;
        }
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| CliError::io(format!("cannot create {}: {e}", parent.display())))?;
    }
    let tmp_path = staging_path(path);
    let file = fs::File::create(&tmp_path)
        .map_err(|e| CliError::io(format!("cannot write {}: {e}", tmp_path.display())))?;
    if let Err(e) = write_conflicts_csv(file, conflicts) {
        discard(&tmp_path);
        return Err(e.into());
    }
    fs::rename(&tmp_path, path)
        .map_err(|e| CliError::io(format!("failed to rename tmp to {}: {e}", path.display())))?;
    Ok(true)
}

pub fn report_json(result: &MergeResult) -> Result<String, CliError> {
    serde_json::to_string_pretty(result)
        .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))
}

pub fn write_report(path: &Path, json: &str) -> Result<(), CliError> {
    fs::write(path, json).map_err(|e| CliError::io(format!("cannot write output: {e}")))
}
