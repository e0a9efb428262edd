//! Query string parsing
//!
//! Keys keep the order in which they were first seen; a repeated key
//! collapses into a list of its values.

use url::form_urlencoded;

/// A query value: one string, or every value of a repeated key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Single(String),
    Multiple(Vec<String>),
}

impl QueryValue {
    /// First value
    pub fn first(&self) -> &str {
        match self {
            QueryValue::Single(value) => value,
            QueryValue::Multiple(values) => values.first().map(String::as_str).unwrap_or(""),
        }
    }

    /// All values in order of appearance
    pub fn all(&self) -> Vec<&str> {
        match self {
            QueryValue::Single(value) => vec![value.as_str()],
            QueryValue::Multiple(values) => values.iter().map(String::as_str).collect(),
        }
    }

    fn push(&mut self, value: String) {
        match self {
            QueryValue::Single(first) => {
                let first = std::mem::take(first);
                *self = QueryValue::Multiple(vec![first, value]);
            }
            QueryValue::Multiple(values) => values.push(value),
        }
    }
}

/// Parsed query string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    entries: Vec<(String, QueryValue)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value, collapsing repeats of an existing key into a list
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();

        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => existing.push(value),
            None => self.entries.push((key, QueryValue::Single(value))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    /// First value of `key`
    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key).map(QueryValue::first)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Query {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut query = Query::new();
        for (key, value) in iter {
            query.append(key, value);
        }
        query
    }
}

/// Parse the query portion of a request target
///
/// Everything between `?` and an optional `#fragment` is decoded as
/// `application/x-www-form-urlencoded`. A target without `?` yields an empty
/// query.
///
/// # Example
/// ```
/// use rill_router::{extract_query, QueryValue};
///
/// let query = extract_query("/search?q=rust&tag=a&tag=b#top");
/// assert_eq!(query.first("q"), Some("rust"));
/// assert_eq!(
///     query.get("tag"),
///     Some(&QueryValue::Multiple(vec!["a".into(), "b".into()]))
/// );
/// ```
pub fn extract_query(path: &str) -> Query {
    let path = path.split_once('#').map_or(path, |(before, _)| before);

    match path.split_once('?') {
        Some((_, query)) => form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect(),
        None => Query::new(),
    }
}
