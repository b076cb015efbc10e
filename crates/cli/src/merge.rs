//! `locmerge run` / `locmerge validate`: config-driven dictionary merge.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use locmerge_merge::config::ConflictPolicy;
use locmerge_merge::engine::load_source;
use locmerge_merge::model::MergeInput;
use locmerge_merge::{MergeConfig, MergeEngine, SkeletonIndex};
use serde::Serialize;
use tracing::info;

use crate::discover::discover_inputs;
use crate::exit_codes::{EXIT_CONFLICTS, EXIT_NO_INPUTS};
use crate::output::{report_json, write_buckets, write_conflict_log, write_report};
use crate::CliError;

#[derive(Subcommand)]
pub enum MergeCommands {
    /// Merge the configured inputs into bucket files
    #[command(after_help = "\
Examples:
  locmerge run merge.toml
  locmerge run merge.toml --json
  locmerge run merge.toml --policy priority-ranked --fail-on-conflict
  locmerge run merge.toml --dry-run --output report.json")]
    Run {
        /// Path to the merge config (TOML)
        config: PathBuf,

        /// Print the JSON report to stdout instead of the human summary
        #[arg(long)]
        json: bool,

        /// Write the JSON report to file (overrides output.json)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Override policy.strategy from the config
        #[arg(long, value_parser = parse_policy)]
        policy: Option<ConflictPolicy>,

        /// Merge and report without writing bucket files or the audit log
        #[arg(long)]
        dry_run: bool,

        /// Exit with a non-zero code when any conflict was resolved
        #[arg(long)]
        fail_on_conflict: bool,
    },

    /// Validate a merge config without running
    #[command(after_help = "\
Examples:
  locmerge validate merge.toml")]
    Validate {
        /// Path to the merge config (TOML)
        config: PathBuf,
    },
}

fn parse_policy(s: &str) -> Result<ConflictPolicy, String> {
    s.parse().map_err(|e: locmerge_merge::MergeError| e.to_string())
}

pub fn cmd_merge(cmd: MergeCommands, quiet: bool) -> Result<(), CliError> {
    match cmd {
        MergeCommands::Run {
            config,
            json,
            output,
            policy,
            dry_run,
            fail_on_conflict,
        } => cmd_run(RunOptions {
            config_path: config,
            json_output: json,
            output_file: output,
            policy,
            dry_run,
            fail_on_conflict,
            quiet,
        }),
        MergeCommands::Validate { config } => cmd_validate(config),
    }
}

struct RunOptions {
    config_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    policy: Option<ConflictPolicy>,
    dry_run: bool,
    fail_on_conflict: bool,
    quiet: bool,
}

fn load_config(config_path: &Path) -> Result<MergeConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        CliError::io(format!("cannot read config {}: {e}", config_path.display()))
    })?;
    MergeConfig::from_toml(&config_str).map_err(|e| CliError::config(e.to_string()))
}

/// Relative paths in the config resolve against the config file's directory.
fn config_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn cmd_run(opts: RunOptions) -> Result<(), CliError> {
    let mut config = load_config(&opts.config_path)?;
    if let Some(policy) = opts.policy {
        config.policy.strategy = policy;
    }

    let base_dir = config_dir(&opts.config_path);
    let engine = MergeEngine::new(&config)?;

    // Skeleton
    let skeleton_path = base_dir.join(&config.inputs.skeleton);
    let skeleton_str = std::fs::read_to_string(&skeleton_path).map_err(|e| {
        CliError::io(format!("cannot read skeleton {}: {e}", skeleton_path.display()))
    })?;
    let skeleton = SkeletonIndex::from_json(
        &skeleton_path.display().to_string(),
        &skeleton_str,
        engine.classifier(),
        &config.name_field,
    )?;
    info!(names = skeleton.len(), collections = skeleton.collections().len(), "skeleton loaded");

    // Inputs, all parsed before anything is written
    let files = discover_inputs(&base_dir, &config.inputs, &[skeleton_path.clone()])?;
    if files.is_empty() {
        return Err(CliError::new(EXIT_NO_INPUTS, "no input JSON files found")
            .with_hint(format!("inputs.patterns: {}", config.inputs.patterns.join(", "))));
    }
    if !opts.quiet {
        eprintln!("scanning inputs: {} JSON file(s)", files.len());
    }

    let mut sources = Vec::with_capacity(files.len());
    for file in &files {
        let text = std::fs::read_to_string(&file.path).map_err(|e| {
            CliError::io(format!("cannot read {}: {e}", file.path.display()))
        })?;
        let source = load_source(&file.source_id, &text).map_err(|e| {
            CliError::parse(e.to_string())
                .with_hint("every input must be a flat JSON object of string keys")
        })?;
        sources.push(source);
    }

    let result = engine.merge(&skeleton, &MergeInput { sources })?;

    // Output
    let out_dir = base_dir.join(&config.output.dir);
    let conflicts_path = out_dir.join(&config.output.conflicts);
    let mut wrote_log = false;

    if opts.dry_run {
        if !opts.quiet {
            eprintln!("dry run: nothing written");
        }
    } else {
        for (path, keys) in write_buckets(&out_dir, &result)? {
            if !opts.quiet {
                eprintln!("wrote {} ({keys} keys)", path.display());
            }
        }
        wrote_log = write_conflict_log(&conflicts_path, &result.conflicts)?;
    }

    let report_path = opts
        .output_file
        .clone()
        .or_else(|| config.output.json.as_ref().map(|p| base_dir.join(p)));
    if opts.json_output || report_path.is_some() {
        let json_str = report_json(&result)?;
        if let Some(ref path) = report_path {
            write_report(path, &json_str)?;
            if !opts.quiet {
                eprintln!("wrote {}", path.display());
            }
        }
        if opts.json_output {
            println!("{json_str}");
        }
    }

    // Human summary to stderr
    let s = &result.summary;
    if !opts.quiet {
        eprintln!(
            "merged {} source(s) into {} keys ({} policy)",
            s.sources, s.total_keys, result.meta.policy,
        );
        if s.unrouted_keys > 0 {
            eprintln!(
                "{} key(s) from unknown collections kept in base: {}",
                s.unrouted_keys,
                s.unknown_collections.join(", "),
            );
        }
        if s.has_conflicts() {
            let where_ = if wrote_log {
                format!("see {}", conflicts_path.display())
            } else {
                "audit log not written (dry run)".to_string()
            };
            eprintln!("{} conflict(s) resolved, {where_}", s.conflicts);
        } else {
            eprintln!("merge complete, no conflicts");
        }
    }

    if opts.fail_on_conflict && s.has_conflicts() {
        return Err(CliError::new(
            EXIT_CONFLICTS,
            format!("{} conflict(s) found (--fail-on-conflict)", s.conflicts),
        ));
    }

    Ok(())
}

#[derive(Serialize)]
struct ValidateSummary<'a> {
    name: &'a str,
    key_prefix: &'a str,
    target_namespace: &'a str,
    buckets: Vec<&'a str>,
    routes: usize,
    policy: String,
    priority_rules: usize,
}

fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let engine = MergeEngine::new(&config)?;

    let summary = ValidateSummary {
        name: &config.name,
        key_prefix: engine.classifier().prefix(),
        target_namespace: &config.target_namespace,
        buckets: config.buckets.keys().map(String::as_str).collect(),
        routes: engine.router().len(),
        policy: engine.resolver().policy().to_string(),
        priority_rules: config.policy.rules.len(),
    };
    let json = serde_json::to_string(&summary)
        .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
    println!("{json}");
    if engine.router().is_empty() {
        eprintln!("warning: no routes; every structured key will land in the base bucket");
    }
    eprintln!("config ok: {}", config_path.display());
    Ok(())
}
