//! rill-router: Path pattern matching for the rill dispatch engine
//!
//! Every router level only sees the part of the request path that is still
//! relevant to it. This crate decides whether a pattern matches that path,
//! which parameters it binds, and how much of the path a mount point
//! consumes before a nested router takes over.
//!
//! ## Path Syntax
//! - `/users` - literal segment (must equal the path segment)
//! - `:name` - named parameter (captures one segment)
//! - `**` - wildcard tail (matches the rest of the path, including nothing)
//! - a list of patterns - first matching member wins
//! - a regular expression - numbered groups become params keyed `"1"`, `"2"`,
//!   ...; named groups are additionally keyed by name
//!
//! Empty segments are ignored on both sides, so `/users/` and `/users` are
//! the same pattern and `/` matches every path as a prefix.
//!
//! ## Example
//! ```
//! use rill_router::{match_path, PathPattern};
//!
//! let pattern = PathPattern::from("/users/:id");
//! let params = match_path("/users/42", &pattern, true).unwrap();
//! assert_eq!(params.get("id").map(String::as_str), Some("42"));
//!
//! assert!(match_path("/posts/42", &pattern, true).is_none());
//! ```

mod query;

pub use query::{extract_query, Query, QueryValue};
pub use regex::Regex;

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Parameters bound by a successful match
pub type Params = HashMap<String, String>;

/// Result type alias for pattern operations
pub type Result<T> = std::result::Result<T, PatternError>;

/// Pattern errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// Malformed pattern string
    #[error("Invalid path pattern {pattern:?}: {reason}")]
    Invalid {
        pattern: String,
        reason: &'static str,
    },

    /// A regex pattern cannot tell how much of the path it covers
    #[error("Path reduction is not supported for regex pattern /{pattern}/; mount nested routers under string patterns")]
    UnsupportedReduction { pattern: String },
}

/// A registered path pattern
#[derive(Debug, Clone)]
pub enum PathPattern {
    /// `/`-delimited literal, `:param` and `**` segments
    Path(String),
    /// Ordered alternatives, first match wins
    List(Vec<String>),
    /// Compiled regular expression
    Regex(Regex),
}

impl PathPattern {
    /// Pattern used when a registration omits its path
    pub const WILDCARD: &'static str = "/**";

    /// Full-depth wildcard pattern
    pub fn wildcard() -> Self {
        PathPattern::Path(Self::WILDCARD.to_string())
    }

    /// Check the pattern for malformed segments
    pub fn validate(&self) -> Result<()> {
        match self {
            PathPattern::Path(pattern) => validate_path(pattern),
            PathPattern::List(patterns) => patterns.iter().try_for_each(|p| validate_path(p)),
            PathPattern::Regex(_) => Ok(()),
        }
    }

    /// Whether this is a regex pattern whose source ends with `$`
    pub fn is_anchored(&self) -> bool {
        matches!(self, PathPattern::Regex(re) if re.as_str().ends_with('$'))
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, PathPattern::Regex(_))
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathPattern::Path(pattern) => f.write_str(pattern),
            PathPattern::List(patterns) => write!(f, "[{}]", patterns.join(", ")),
            PathPattern::Regex(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

impl From<&str> for PathPattern {
    fn from(pattern: &str) -> Self {
        PathPattern::Path(pattern.to_string())
    }
}

impl From<String> for PathPattern {
    fn from(pattern: String) -> Self {
        PathPattern::Path(pattern)
    }
}

impl From<Vec<&str>> for PathPattern {
    fn from(patterns: Vec<&str>) -> Self {
        PathPattern::List(patterns.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for PathPattern {
    fn from(patterns: Vec<String>) -> Self {
        PathPattern::List(patterns)
    }
}

impl<const N: usize> From<[&str; N]> for PathPattern {
    fn from(patterns: [&str; N]) -> Self {
        PathPattern::List(patterns.iter().map(|p| p.to_string()).collect())
    }
}

impl From<Regex> for PathPattern {
    fn from(re: Regex) -> Self {
        PathPattern::Regex(re)
    }
}

fn segments(s: &str) -> impl Iterator<Item = &str> {
    s.split('/').filter(|s| !s.is_empty())
}

fn validate_path(pattern: &str) -> Result<()> {
    let invalid = |reason| {
        Err(PatternError::Invalid {
            pattern: pattern.to_string(),
            reason,
        })
    };

    if !pattern.starts_with('/') {
        return invalid("pattern must start with '/'");
    }

    let parts: Vec<&str> = segments(pattern).collect();
    for (i, segment) in parts.iter().enumerate() {
        if *segment == ":" {
            return invalid("parameter segment is missing a name");
        }
        if segment.contains("**") && *segment != "**" {
            return invalid("'**' must be a whole segment");
        }
        if *segment == "**" && i + 1 != parts.len() {
            return invalid("'**' must be the last segment");
        }
    }
    Ok(())
}

/// Match `path` against `pattern`
///
/// Returns the bound parameters, possibly empty, or `None` when the pattern
/// does not match. With `exact`, a string pattern must consume every path
/// segment unless it ends in `**`; without it the pattern only has to match
/// a prefix of the path.
pub fn match_path(path: &str, pattern: &PathPattern, exact: bool) -> Option<Params> {
    match pattern {
        PathPattern::Regex(re) => match_regex(path, re),
        PathPattern::List(patterns) => patterns
            .iter()
            .find_map(|pattern| match_segments(path, pattern, exact)),
        PathPattern::Path(pattern) => match_segments(path, pattern, exact),
    }
}

fn match_regex(path: &str, re: &Regex) -> Option<Params> {
    let captures = re.captures(path)?;
    let mut params = Params::new();

    for (index, group) in captures.iter().enumerate().skip(1) {
        if let Some(group) = group {
            params.insert(index.to_string(), group.as_str().to_string());
        }
    }

    for name in re.capture_names().flatten() {
        if let Some(group) = captures.name(name) {
            params.insert(name.to_string(), group.as_str().to_string());
        }
    }

    Some(params)
}

fn match_segments(path: &str, pattern: &str, exact: bool) -> Option<Params> {
    let path_segments: Vec<&str> = segments(path).collect();
    let mut params = Params::new();
    let mut consumed = 0;

    for (i, expected) in segments(pattern).enumerate() {
        if expected == "**" {
            return Some(params);
        }

        let actual = path_segments.get(i)?;

        if let Some(name) = expected.strip_prefix(':') {
            params.insert(name.to_string(), actual.to_string());
        } else if expected != *actual {
            return None;
        }
        consumed += 1;
    }

    if exact && path_segments.len() > consumed {
        return None;
    }

    Some(params)
}

/// Length of the path prefix consumed by `pattern`
///
/// Walks the pattern against the path segment by segment and stops at the
/// first wildcard or mismatch. Parameter segments consume the matched
/// value. Regex patterns fail with [`PatternError::UnsupportedReduction`];
/// list patterns delegate to the member that matches.
pub fn matched_prefix_len(path: &str, pattern: &PathPattern) -> Result<usize> {
    match pattern {
        PathPattern::Regex(re) => Err(PatternError::UnsupportedReduction {
            pattern: re.as_str().to_string(),
        }),
        PathPattern::List(patterns) => Ok(patterns
            .iter()
            .find(|pattern| match_segments(path, pattern, false).is_some())
            .map_or(0, |pattern| prefix_len(path, pattern))),
        PathPattern::Path(pattern) => Ok(prefix_len(path, pattern)),
    }
}

fn prefix_len(path: &str, pattern: &str) -> usize {
    let mut expected = segments(pattern);
    let mut consumed = 0;
    let mut position = 0;

    for actual in path.split('/') {
        let end = position + actual.len();
        if !actual.is_empty() {
            match expected.next() {
                Some("**") => break,
                Some(segment) if segment.starts_with(':') || segment == actual => consumed = end,
                _ => break,
            }
        }
        position = end + 1;
    }

    consumed
}

/// A path split at a mount point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reduction<'a> {
    /// The prefix consumed by the mount pattern (empty when nothing matched)
    pub consumed: &'a str,
    /// What the nested router sees, never empty
    pub remaining: &'a str,
}

impl Reduction<'_> {
    /// Append the consumed prefix to the path matched by outer levels
    pub fn matched_path(&self, matched_so_far: &str) -> String {
        let joined = format!("{}{}", matched_so_far.trim_end_matches('/'), self.consumed);
        if joined.is_empty() {
            "/".to_string()
        } else {
            joined
        }
    }
}

/// Strip the prefix consumed by `pattern` from `path`
///
/// # Example
/// ```
/// use rill_router::{reduce_path, PathPattern};
///
/// let reduction = reduce_path("/main/sub", &PathPattern::from("/main")).unwrap();
/// assert_eq!(reduction.consumed, "/main");
/// assert_eq!(reduction.remaining, "/sub");
/// assert_eq!(reduction.matched_path("/"), "/main");
/// ```
pub fn reduce_path<'a>(path: &'a str, pattern: &PathPattern) -> Result<Reduction<'a>> {
    let len = matched_prefix_len(path, pattern)?;
    let (consumed, rest) = path.split_at(len);

    Ok(Reduction {
        consumed,
        remaining: if rest.is_empty() { "/" } else { rest },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn re(source: &str) -> PathPattern {
        PathPattern::Regex(Regex::new(source).unwrap())
    }

    #[test]
    fn test_identical_literal_paths() {
        for path in ["/", "/foo", "/foo/bar", "/api/v1/health"] {
            assert_eq!(match_path(path, &path.into(), true), Some(Params::new()));
        }
    }

    #[test]
    fn test_named_param() {
        assert_eq!(
            match_path("/123", &"/:id".into(), true),
            Some(params(&[("id", "123")]))
        );
    }

    #[test]
    fn test_multiple_params() {
        assert_eq!(
            match_path("/foo/123/bar/456", &"/foo/:id/bar/:otherId".into(), true),
            Some(params(&[("id", "123"), ("otherId", "456")]))
        );
    }

    #[test]
    fn test_list_pattern() {
        let pattern = PathPattern::from(["/foo/:id", "/bar/:id"]);

        assert_eq!(
            match_path("/foo/123", &pattern, true),
            Some(params(&[("id", "123")]))
        );
        assert_eq!(
            match_path("/bar/123", &pattern, true),
            Some(params(&[("id", "123")]))
        );
        assert_eq!(match_path("/baz/123", &pattern, true), None);
        assert_eq!(match_path("/foo", &PathPattern::List(vec![]), false), None);
    }

    #[test]
    fn test_regex_pattern() {
        assert_eq!(match_path("/foo", &re(r"/foo"), false), Some(Params::new()));
        assert_eq!(
            match_path("/foo/123", &re(r"/foo/(\d+)"), false),
            Some(params(&[("1", "123")]))
        );
        assert_eq!(match_path("/foo", &re(r"/foo/(\d+)"), false), None);
        assert_eq!(match_path("/foo/123", &re(r"/foo$"), true), None);
    }

    #[test]
    fn test_regex_named_groups_keep_numbered_keys() {
        assert_eq!(
            match_path("/foo/123", &re(r"/foo/(?<id>\d+)"), false),
            Some(params(&[("1", "123"), ("id", "123")]))
        );
    }

    #[test]
    fn test_prefix_vs_exact() {
        let pattern = PathPattern::from("/main");

        assert_eq!(match_path("/main/sub", &pattern, false), Some(Params::new()));
        assert_eq!(match_path("/main/sub", &pattern, true), None);
        assert_eq!(match_path("/", &pattern, false), None);
        assert_eq!(match_path("/other", &pattern, false), None);
    }

    #[test]
    fn test_root_pattern() {
        let root = PathPattern::from("/");

        assert_eq!(match_path("/", &root, true), Some(Params::new()));
        assert_eq!(match_path("/foo", &root, true), None);
        assert_eq!(match_path("/foo", &root, false), Some(Params::new()));
    }

    #[test]
    fn test_wildcard_tail() {
        let all = PathPattern::wildcard();
        assert_eq!(match_path("/", &all, true), Some(Params::new()));
        assert_eq!(match_path("/a/b/c", &all, true), Some(Params::new()));

        let files = PathPattern::from("/files/:kind/**");
        assert_eq!(
            match_path("/files/img/a/b.png", &files, true),
            Some(params(&[("kind", "img")]))
        );
        assert_eq!(match_path("/files", &files, true), None);
    }

    #[test]
    fn test_trailing_slash() {
        assert_eq!(match_path("/users/", &"/users".into(), true), Some(Params::new()));
        assert_eq!(match_path("/users", &"/users/".into(), true), Some(Params::new()));
    }

    #[test]
    fn test_validate() {
        assert!(PathPattern::from("/users/:id").validate().is_ok());
        assert!(PathPattern::wildcard().validate().is_ok());
        assert!(PathPattern::from("users").validate().is_err());
        assert!(PathPattern::from("/users/:").validate().is_err());
        assert!(PathPattern::from("/**/users").validate().is_err());
        assert!(PathPattern::from("/a**").validate().is_err());
        assert!(PathPattern::from(["/ok", "bad"]).validate().is_err());
        assert!(re(r"anything").validate().is_ok());
    }

    #[test]
    fn test_anchored() {
        assert!(re(r"/foo$").is_anchored());
        assert!(!re(r"/foo").is_anchored());
        assert!(!PathPattern::from("/foo$").is_anchored());
    }

    #[test]
    fn test_prefix_len_static() {
        assert_eq!(matched_prefix_len("/main/sub", &"/main".into()), Ok(5));
        assert_eq!(matched_prefix_len("/main", &"/main".into()), Ok(5));
        assert_eq!(matched_prefix_len("/main/sub", &"/".into()), Ok(0));
        assert_eq!(matched_prefix_len("/main/sub", &"/**".into()), Ok(0));
    }

    #[test]
    fn test_prefix_len_wildcard_is_zero_width() {
        assert_eq!(matched_prefix_len("/**/x", &"/**".into()), Ok(0));
        assert_eq!(matched_prefix_len("/api/**/x", &"/api/**".into()), Ok(4));

        let reduction = reduce_path("/**/x", &"/**".into()).unwrap();
        assert_eq!(reduction.remaining, "/**/x");
    }

    #[test]
    fn test_prefix_len_uses_param_value() {
        assert_eq!(matched_prefix_len("/1234/sub", &"/:id".into()), Ok(5));
        assert_eq!(
            matched_prefix_len("/orgs/acme/teams/x", &"/orgs/:org/**".into()),
            Ok(10)
        );
    }

    #[test]
    fn test_prefix_len_list_delegates_to_match() {
        let pattern = PathPattern::from(["/foo/:id", "/barbaz"]);
        assert_eq!(matched_prefix_len("/barbaz/qux", &pattern), Ok(7));
        assert_eq!(matched_prefix_len("/nope", &pattern), Ok(0));
    }

    #[test]
    fn test_prefix_len_regex_fails() {
        assert!(matches!(
            matched_prefix_len("/foo", &re(r"/foo")),
            Err(PatternError::UnsupportedReduction { .. })
        ));
    }

    #[test]
    fn test_reduce_path() {
        let reduction = reduce_path("/1234/sub", &"/:id".into()).unwrap();
        assert_eq!(reduction.consumed, "/1234");
        assert_eq!(reduction.remaining, "/sub");

        let reduction = reduce_path("/main", &"/main".into()).unwrap();
        assert_eq!(reduction.remaining, "/");
        assert_eq!(reduction.matched_path("/api"), "/api/main");
        assert_eq!(reduction.matched_path("/api/"), "/api/main");

        let reduction = reduce_path("/main", &"/**".into()).unwrap();
        assert_eq!(reduction.consumed, "");
        assert_eq!(reduction.remaining, "/main");
        assert_eq!(reduction.matched_path("/"), "/");
    }
}
