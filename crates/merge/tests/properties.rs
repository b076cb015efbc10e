// Property-based tests for merge determinism and conflict detection.
// CI: 128 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use proptest::prelude::*;
use serde_json::{json, Map, Value};

use locmerge_merge::config::MergeConfig;
use locmerge_merge::engine::MergeEngine;
use locmerge_merge::model::{MergeInput, SourceDictionary};
use locmerge_merge::SkeletonIndex;

fn config_128() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(128),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

fn engine(extra: &str) -> MergeEngine {
    let toml = format!(
        r#"
name = "Props"
target_namespace = "core"

[inputs]
patterns = ["*.json"]
skeleton = "skeleton.json"

[buckets.actors]
collection = "actors"

[routes]
bestiary = "actors"

{extra}
"#
    );
    MergeEngine::new(&MergeConfig::from_toml(&toml).unwrap()).unwrap()
}

fn source(id: &str, entries: Vec<(String, Value)>) -> SourceDictionary {
    SourceDictionary::new(id, entries.into_iter().collect::<Map<String, Value>>())
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

fn arb_words() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-zA-Zàèìòù]{1,8}", 1..8)
}

fn arb_separator() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(" ".to_string()),
        Just("  ".to_string()),
        Just("\t".to_string()),
        Just("\n".to_string()),
        Just("\r\n".to_string()),
        Just(" \r\n ".to_string()),
    ]
}

/// Join words with arbitrary whitespace and optional padding.
fn arb_layout(words: Vec<String>) -> impl Strategy<Value = String> {
    let n = words.len();
    (
        prop::collection::vec(arb_separator(), n),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(move |(seps, lead, trail)| {
            let mut out = String::new();
            if lead {
                out.push_str(" \n");
            }
            for (i, w) in words.iter().enumerate() {
                if i > 0 {
                    out.push_str(&seps[i]);
                }
                out.push_str(w);
            }
            if trail {
                out.push_str("\r\n ");
            }
            out
        })
}

fn arb_layout_pair() -> impl Strategy<Value = (String, String)> {
    arb_words().prop_flat_map(|words| (arb_layout(words.clone()), arb_layout(words)))
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_128())]

    /// Values differing only in whitespace or line endings never conflict.
    #[test]
    fn formatting_differences_never_conflict((a, b) in arb_layout_pair()) {
        let engine = engine("[policy]\nstrategy = \"last_wins\"");
        let key = "Compendium.legacy.bestiary.R1.description".to_string();
        let input = MergeInput {
            sources: vec![
                source("a.json", vec![(key.clone(), json!(a.clone()))]),
                source("b.json", vec![(key, json!(b))]),
            ],
        };
        let result = engine.merge(&SkeletonIndex::default(), &input).unwrap();
        prop_assert!(result.conflicts.is_empty());
        let actors = result.bucket("actors").unwrap();
        prop_assert_eq!(&actors.entries["Compendium.core.actors.R1.description"], &json!(a));
    }

    /// The highest-priority source wins no matter the processing order.
    #[test]
    fn priority_winner_is_order_independent(
        order in Just((0..5usize).collect::<Vec<_>>()).prop_shuffle()
    ) {
        let rules: Vec<String> = (0..5).map(|r| format!("\"rank{r}/*.json\"")).collect();
        let engine = engine(&format!(
            "[policy]\nstrategy = \"priority_ranked\"\nrules = [{}]",
            rules.join(", ")
        ));
        let key = "Compendium.legacy.bestiary.R1.description".to_string();
        let sources = order
            .iter()
            .map(|r| source(&format!("rank{r}/src.json"), vec![(key.clone(), json!(format!("value {r}")))]))
            .collect();

        let result = engine.merge(&SkeletonIndex::default(), &MergeInput { sources }).unwrap();
        let actors = result.bucket("actors").unwrap();
        let final_key = "Compendium.core.actors.R1.description";
        prop_assert_eq!(&actors.entries[final_key], &json!("value 0"));
        prop_assert_eq!(actors.source_of(final_key), Some("rank0/src.json"));
        // every collision after the first insert is audited
        prop_assert_eq!(result.conflicts.len(), 4);
    }

    /// Name remapping gives the same final ids on every run.
    #[test]
    fn remapping_is_stable(names in prop::collection::btree_set("[A-Z][a-z]{2,8}", 1..10)) {
        let engine = engine("");
        let names: Vec<String> = names.into_iter().collect();

        let reference: Map<String, Value> = names
            .iter()
            .enumerate()
            .map(|(i, n)| (format!("Compendium.core.actors.CANON{i}.name"), json!(n)))
            .collect();
        let skeleton = engine.index_skeleton(&reference);

        let entries: Vec<(String, Value)> = names
            .iter()
            .enumerate()
            .map(|(i, n)| (format!("Compendium.legacy.bestiary.OLD{i}.name"), json!(n)))
            .collect();
        let input = MergeInput { sources: vec![source("a.json", entries)] };

        let first = engine.merge(&skeleton, &input).unwrap();
        let second = engine.merge(&skeleton, &input).unwrap();
        let a = &first.bucket("actors").unwrap().entries;
        let b = &second.bucket("actors").unwrap().entries;
        prop_assert_eq!(a, b);
        for i in 0..names.len() {
            let canonical = format!("Compendium.core.actors.CANON{i}.name");
            prop_assert!(a.contains_key(&canonical));
        }
    }
}
