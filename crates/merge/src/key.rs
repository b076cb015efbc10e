use regex::Regex;

use crate::error::MergeError;

/// A flat key decomposed as `Prefix.<namespace>.<collection>.<record_id>.<field_path>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructuredKey {
    pub namespace: String,
    pub collection: String,
    pub record_id: String,
    /// Everything after the record id. May contain dots.
    pub field_path: String,
}

impl StructuredKey {
    /// `<namespace>.<collection>`, the skeleton and route lookup key.
    pub fn collection_path(&self) -> String {
        format!("{}.{}", self.namespace, self.collection)
    }
}

/// Splits flat keys into [`StructuredKey`]s for one literal prefix.
#[derive(Debug, Clone)]
pub struct KeyClassifier {
    prefix: String,
    pattern: Regex,
}

impl KeyClassifier {
    pub fn new(prefix: &str) -> Result<Self, MergeError> {
        let pattern = Regex::new(&format!(
            r"^{}\.([^.\s]+)\.([^.\s]+)\.([^.\s]+)\.([^\r\n\x{{2028}}\x{{2029}}]+)$",
            regex::escape(prefix)
        ))
        .map_err(|e| MergeError::ConfigValidation(format!("key_prefix \"{prefix}\": {e}")))?;

        Ok(Self {
            prefix: prefix.to_string(),
            pattern,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `None` means the key is unstructured; that is a valid outcome, not an error.
    pub fn classify(&self, key: &str) -> Option<StructuredKey> {
        let caps = self.pattern.captures(key)?;
        Some(StructuredKey {
            namespace: caps[1].to_string(),
            collection: caps[2].to_string(),
            record_id: caps[3].to_string(),
            field_path: caps[4].to_string(),
        })
    }

    pub fn compose(&self, namespace: &str, collection: &str, record_id: &str, field_path: &str) -> String {
        format!("{}.{namespace}.{collection}.{record_id}.{field_path}", self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> KeyClassifier {
        KeyClassifier::new("Compendium").unwrap()
    }

    #[test]
    fn classify_basic() {
        let key = classifier()
            .classify("Compendium.wfrp4e-core.bestiary.abc123.name")
            .unwrap();
        assert_eq!(key.namespace, "wfrp4e-core");
        assert_eq!(key.collection, "bestiary");
        assert_eq!(key.record_id, "abc123");
        assert_eq!(key.field_path, "name");
        assert_eq!(key.collection_path(), "wfrp4e-core.bestiary");
    }

    #[test]
    fn field_path_keeps_dots() {
        let key = classifier()
            .classify("Compendium.core.items.X1.flags.babele.description")
            .unwrap();
        assert_eq!(key.record_id, "X1");
        assert_eq!(key.field_path, "flags.babele.description");
    }

    #[test]
    fn too_few_segments_is_unstructured() {
        let c = classifier();
        assert!(c.classify("Compendium.core.items.X1").is_none());
        assert!(c.classify("Compendium.core.items").is_none());
        assert!(c.classify("WFRP4E.Skills.Athletics").is_none());
    }

    #[test]
    fn prefix_must_match_literally() {
        let c = classifier();
        assert!(c.classify("Journal.core.items.X1.name").is_none());
        assert!(c.classify("CompendiumX.core.items.X1.name").is_none());
        assert!(c.classify("compendium.core.items.X1.name").is_none());
    }

    #[test]
    fn whitespace_and_empty_segments_rejected() {
        let c = classifier();
        assert!(c.classify("Compendium.core.my items.X1.name").is_none());
        assert!(c.classify("Compendium..items.X1.name").is_none());
        assert!(c.classify("Compendium.core.items.X1.").is_none());
    }

    #[test]
    fn line_break_in_key_is_unstructured() {
        let c = classifier();
        assert!(c.classify("Compendium.core.items.X1.name\nsecond line").is_none());
        assert!(c.classify("Compendium.core.items.X1.name\n").is_none());
        assert!(c.classify("Compendium.core.items.X1.results.1\r").is_none());
        assert!(c.classify("Compendium.core.items.X1.a\u{2028}b").is_none());
    }

    #[test]
    fn field_path_may_contain_spaces() {
        let key = classifier()
            .classify("Compendium.core.tables.T1.results.Roll 01")
            .unwrap();
        assert_eq!(key.field_path, "results.Roll 01");
    }

    #[test]
    fn prefix_is_escaped() {
        let c = KeyClassifier::new("Loc+").unwrap();
        assert!(c.classify("Loc+.core.items.X1.name").is_some());
        assert!(c.classify("Locc.core.items.X1.name").is_none());
    }

    #[test]
    fn compose_inverts_classify() {
        let c = classifier();
        let raw = "Compendium.core.items.X1.flags.babele.description";
        let k = c.classify(raw).unwrap();
        assert_eq!(c.compose(&k.namespace, &k.collection, &k.record_id, &k.field_path), raw);
    }
}
