use std::collections::HashMap;

use crate::config::MergeConfig;

/// Maps legacy `(namespace, collection)` pairs onto logical buckets.
#[derive(Debug, Clone, Default)]
pub struct CategoryRouter {
    routes: HashMap<String, String>,
}

impl CategoryRouter {
    pub fn new(routes: HashMap<String, String>) -> Self {
        Self { routes }
    }

    pub fn from_config(config: &MergeConfig) -> Self {
        Self::new(config.routes.clone())
    }

    /// Exact `collection` first, then `namespace.collection`.
    /// `None` sends the key to the base bucket untouched.
    pub fn route(&self, namespace: &str, collection: &str) -> Option<&str> {
        self.routes
            .get(collection)
            .or_else(|| self.routes.get(&format!("{namespace}.{collection}")))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> CategoryRouter {
        CategoryRouter::new(HashMap::from([
            ("bestiary".to_string(), "actors".to_string()),
            ("talents".to_string(), "items".to_string()),
            ("wfrp4e-core.criticals".to_string(), "tables".to_string()),
        ]))
    }

    #[test]
    fn collection_match() {
        let r = router();
        assert_eq!(r.route("wfrp4e-core", "bestiary"), Some("actors"));
        assert_eq!(r.route("anything", "talents"), Some("items"));
    }

    #[test]
    fn qualified_match() {
        let r = router();
        assert_eq!(r.route("wfrp4e-core", "criticals"), Some("tables"));
        assert_eq!(r.route("wfrp4e-rnhd", "criticals"), None);
    }

    #[test]
    fn collection_match_takes_precedence() {
        let r = CategoryRouter::new(HashMap::from([
            ("spells".to_string(), "items".to_string()),
            ("core.spells".to_string(), "journals".to_string()),
        ]));
        assert_eq!(r.route("core", "spells"), Some("items"));
    }

    #[test]
    fn unknown_collection() {
        assert_eq!(router().route("core", "macros"), None);
    }

    #[test]
    fn empty_router_routes_nothing() {
        let r = CategoryRouter::default();
        assert!(r.is_empty());
        assert_eq!(r.route("core", "bestiary"), None);
        assert_eq!(router().len(), 3);
    }
}
