//! Flat string-keyed query parameters with URL query string semantics, and the
//! mapping contract between typed filters and that representation.

use std::collections::BTreeMap;

use url::form_urlencoded;

/// A flat set of query parameters, as found after the `?` of a shareable URL.
/// Keys are unique; setting a key overwrites it. Iteration order is sorted so
/// the serialized form is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    params: BTreeMap<String, String>,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a query string (with or without a leading `?`). Later duplicate
    /// keys overwrite earlier ones.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = BTreeMap::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            params.insert(key.into_owned(), value.into_owned());
        }
        SearchParams { params }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    pub fn delete(&mut self, key: &str) {
        self.params.remove(key);
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl std::fmt::Display for SearchParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.params {
            serializer.append_pair(key, value);
        }
        write!(f, "{}", serializer.finish())
    }
}

/// A fully-defined filter set that mirrors to and from search params.
///
/// Implementations must be total in both directions: every field has a
/// default, unknown or malformed parameter values resolve to that default,
/// and `from_search_params(f.to_search_params()) == f` for every valid `f`.
pub trait FilterSet: Clone + PartialEq + Default + Send + Sync + 'static {
    fn to_search_params(&self) -> SearchParams;
    fn from_search_params(params: &SearchParams) -> Self;
}
