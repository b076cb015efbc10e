//! Input discovery: expand the configured globs into an ordered file list.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use locmerge_merge::config::InputConfig;
use tracing::debug;

use crate::CliError;

/// One input file and the identifier it is merged and audited under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    /// Path relative to the config directory, `/`-separated.
    pub source_id: String,
}

/// Expand `inputs.patterns` under `base_dir`, in pattern order then glob's
/// sorted order. Duplicates keep their first position; `exclude` is skipped.
pub fn discover_inputs(
    base_dir: &Path,
    inputs: &InputConfig,
    exclude: &[PathBuf],
) -> Result<Vec<DiscoveredFile>, CliError> {
    let options = MatchOptions {
        case_sensitive: !inputs.case_insensitive,
        ..MatchOptions::new()
    };

    let excluded: HashSet<PathBuf> = exclude.iter().map(|p| canonical(p)).collect();
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut files = Vec::new();

    for pattern in &inputs.patterns {
        let pattern_text = pattern.trim_start_matches("./");
        let pattern_text = if inputs.case_insensitive {
            fold_case(pattern_text)
        } else {
            pattern_text.to_string()
        };
        let full = format!("{}/{}", Pattern::escape(&base_dir.to_string_lossy()), pattern_text);
        let entries = glob::glob_with(&full, options).map_err(|e| {
            CliError::config(format!("inputs.patterns: invalid glob \"{pattern}\": {e}"))
        })?;

        let mut matched = 0usize;
        for entry in entries {
            let path = entry.map_err(|e| CliError::io(format!("cannot scan inputs: {e}")))?;
            if !path.is_file() {
                continue;
            }
            let key = canonical(&path);
            if excluded.contains(&key) || !seen.insert(key) {
                continue;
            }
            matched += 1;
            files.push(DiscoveredFile {
                source_id: source_id(base_dir, &path),
                path,
            });
        }
        debug!(pattern = %pattern, matched, "input pattern expanded");
    }

    Ok(files)
}

/// Turn literal letters into `[aA]` classes.
///
/// glob resolves wildcard-free components with a plain filesystem lookup,
/// which ignores `MatchOptions::case_sensitive`.
fn fold_case(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '[' {
            // copy character classes verbatim; `]` right after `[` or `[!` is literal
            out.push(c);
            if let Some(&'!') = chars.peek() {
                out.push('!');
                chars.next();
            }
            if let Some(first) = chars.next() {
                out.push(first);
            }
            for inner in chars.by_ref() {
                out.push(inner);
                if inner == ']' {
                    break;
                }
            }
            continue;
        }

        let mut lower = c.to_lowercase();
        let mut upper = c.to_uppercase();
        match (lower.next(), lower.next(), upper.next(), upper.next()) {
            (Some(l), None, Some(u), None) if l != u => {
                out.push('[');
                out.push(l);
                out.push(u);
                out.push(']');
            }
            _ => out.push(c),
        }
    }

    out
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn source_id(base_dir: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(base_dir).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(patterns: &[&str], case_insensitive: bool) -> InputConfig {
        InputConfig {
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            case_insensitive,
            skeleton: "skeleton.json".into(),
        }
    }

    fn touch(dir: &Path, rel: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "{}").unwrap();
    }

    fn ids(files: &[DiscoveredFile]) -> Vec<&str> {
        files.iter().map(|f| f.source_id.as_str()).collect()
    }

    #[test]
    fn pattern_order_then_sorted() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "Compendium/b.json");
        touch(dir.path(), "Compendium/a.json");
        touch(dir.path(), "Compendium/sub/c.json");
        touch(dir.path(), "extra/z.json");

        let files = discover_inputs(
            dir.path(),
            &inputs(&["extra/*.json", "Compendium/**/*.json"], false),
            &[],
        )
        .unwrap();
        assert_eq!(
            ids(&files),
            vec!["extra/z.json", "Compendium/a.json", "Compendium/b.json", "Compendium/sub/c.json"]
        );
    }

    #[test]
    fn overlapping_patterns_dedupe() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "Compendium/a.json");
        touch(dir.path(), "Compendium/sub/b.json");

        let files = discover_inputs(
            dir.path(),
            &inputs(&["Compendium/*.json", "Compendium/**/*.json"], false),
            &[],
        )
        .unwrap();
        assert_eq!(ids(&files), vec!["Compendium/a.json", "Compendium/sub/b.json"]);
    }

    #[test]
    fn case_insensitive_matching() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "compendium/a.json");

        let strict = discover_inputs(dir.path(), &inputs(&["Compendium/*.json"], false), &[]).unwrap();
        assert!(strict.is_empty());

        let loose = discover_inputs(dir.path(), &inputs(&["Compendium/*.json"], true), &[]).unwrap();
        assert_eq!(ids(&loose), vec!["compendium/a.json"]);
    }

    #[test]
    fn excluded_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "data/a.json");
        touch(dir.path(), "data/skeleton.json");

        let files = discover_inputs(
            dir.path(),
            &inputs(&["data/*.json"], false),
            &[dir.path().join("data/skeleton.json")],
        )
        .unwrap();
        assert_eq!(ids(&files), vec!["data/a.json"]);
    }

    #[test]
    fn directories_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("data/folder.json")).unwrap();
        touch(dir.path(), "data/a.json");

        let files = discover_inputs(dir.path(), &inputs(&["data/*.json"], false), &[]).unwrap();
        assert_eq!(ids(&files), vec!["data/a.json"]);
    }

    #[test]
    fn fold_case_skips_classes_and_symbols() {
        assert_eq!(fold_case("ab/*.j"), "[aA][bB]/*.[jJ]");
        assert_eq!(fold_case("[ab]x"), "[ab][xX]");
        assert_eq!(fold_case("[!]]1"), "[!]]1");
        assert_eq!(fold_case("**/?-_"), "**/?-_");
    }

    #[test]
    fn invalid_pattern_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_inputs(dir.path(), &inputs(&["data/[.json"], false), &[]).unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_INVALID_CONFIG);
    }
}
