use super::{Document, Variables};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Address of one cached operation result: the document plus its variables
///
/// Two keys are equal iff their canonical serializations are equal. The
/// canonical form is computed once; keys are immutable after creation.
#[derive(Debug, Clone, Serialize)]
pub struct CacheKey {
    query: Document,
    variables: Variables,
    #[serde(skip)]
    canonical: String,
}

impl CacheKey {
    /// Create a new cache key
    pub fn new(query: Document, variables: Variables) -> Self {
        let canonical = canonicalize(&query, &variables);
        Self {
            query,
            variables,
            canonical,
        }
    }

    pub fn query(&self) -> &Document {
        &self.query
    }

    /// Name of the query this key addresses
    pub fn query_name(&self) -> &str {
        self.query.name()
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    /// Canonical serialization used for equality and as a map key
    pub fn canonical(&self) -> &str {
        &self.canonical
    }
}

/// serde_json maps keep their keys sorted, so this string is stable for
/// equal variable sets regardless of insertion order.
fn canonicalize(query: &Document, variables: &Variables) -> String {
    let mut key = Map::new();
    key.insert("query".to_string(), Value::String(query.source().to_string()));
    key.insert("variables".to_string(), Value::Object(variables.clone()));
    Value::Object(key).to_string()
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(value: Value) -> Variables {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_key_equality_ignores_variable_order() {
        let mut first = Variables::new();
        first.insert("status".into(), json!("DONE"));
        first.insert("limit".into(), json!(10));

        let mut second = Variables::new();
        second.insert("limit".into(), json!(10));
        second.insert("status".into(), json!("DONE"));

        let a = CacheKey::new(Document::query("TodoList"), first);
        let b = CacheKey::new(Document::query("TodoList"), second);
        assert_eq!(a, b);
        assert_eq!(a.canonical(), b.canonical());
    }

    #[test]
    fn test_key_distinguishes_variables_and_documents() {
        let done = CacheKey::new(Document::query("TodoList"), vars(json!({ "status": "DONE" })));
        let active = CacheKey::new(Document::query("TodoList"), vars(json!({ "status": "ACTIVE" })));
        let other = CacheKey::new(Document::query("Users"), vars(json!({ "status": "DONE" })));

        assert_ne!(done, active);
        assert_ne!(done, other);
        assert_eq!(done.query_name(), "TodoList");
    }
}
