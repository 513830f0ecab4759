//! Query parameter matching.
//!
//! # Responsibilities
//! - Parse the raw query string into an ordered multimap
//! - Decide whether a variant's query condition holds for a request
//!
//! # Design Decisions
//! - Only the first occurrence of a parameter is compared
//! - Values compare exactly (case-sensitive, after percent-decoding)
//! - Empty condition semantics are an explicit policy, not an accident

use std::str::FromStr;

use crate::config::QueryMatch;

/// Query parameters of one request, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Parse a raw (still percent-encoded) query string.
    pub fn parse(query: Option<&str>) -> Self {
        let pairs = query
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default();
        Self { pairs }
    }

    /// First value supplied for `name`, if any.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// How a variant with an empty `query` mapping is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyQueryPolicy {
    /// Matches only requests that carry no query parameters at all.
    #[default]
    RequireNone,
    /// Matches every request.
    MatchAny,
}

impl EmptyQueryPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmptyQueryPolicy::RequireNone => "require-none",
            EmptyQueryPolicy::MatchAny => "match-any",
        }
    }
}

impl FromStr for EmptyQueryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "require-none" => Ok(EmptyQueryPolicy::RequireNone),
            "match-any" => Ok(EmptyQueryPolicy::MatchAny),
            other => Err(format!(
                "unknown empty-query policy '{other}' (expected require-none or match-any)"
            )),
        }
    }
}

/// Returns true if `params` satisfies `expected` under `policy`.
pub fn query_matches(expected: &QueryMatch, params: &QueryParams, policy: EmptyQueryPolicy) -> bool {
    if expected.is_empty() {
        return match policy {
            EmptyQueryPolicy::RequireNone => params.is_empty(),
            EmptyQueryPolicy::MatchAny => true,
        };
    }

    expected.iter().all(|(name, value)| match params.first(name) {
        Some(actual) if actual == value => true,
        _ => {
            tracing::trace!(key = %name, expected = %value, "Query parameter did not match");
            false
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expect(pairs: &[(&str, &str)]) -> QueryMatch {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_query_string() {
        let params = QueryParams::parse(Some("type=active&name=a%20b&flag"));
        assert_eq!(params.len(), 3);
        assert_eq!(params.first("type"), Some("active"));
        assert_eq!(params.first("name"), Some("a b"));
        assert_eq!(params.first("flag"), Some(""));
        assert_eq!(params.first("missing"), None);

        assert!(QueryParams::parse(None).is_empty());
        assert!(QueryParams::parse(Some("")).is_empty());
    }

    #[test]
    fn test_first_occurrence_wins() {
        let params = QueryParams::parse(Some("type=inactive&type=active"));
        let cond = expect(&[("type", "active")]);
        assert!(!query_matches(&cond, &params, EmptyQueryPolicy::RequireNone));

        let cond = expect(&[("type", "inactive")]);
        assert!(query_matches(&cond, &params, EmptyQueryPolicy::RequireNone));
    }

    #[test]
    fn test_all_keys_required() {
        let cond = expect(&[("a", "1"), ("b", "2")]);
        let partial: QueryParams = [("a", "1")].into_iter().collect();
        let full: QueryParams = [("b", "2"), ("a", "1"), ("c", "3")].into_iter().collect();

        assert!(!query_matches(&cond, &partial, EmptyQueryPolicy::RequireNone));
        assert!(query_matches(&cond, &full, EmptyQueryPolicy::RequireNone));
    }

    #[test]
    fn test_values_are_case_sensitive() {
        let cond = expect(&[("type", "active")]);
        let params: QueryParams = [("type", "Active")].into_iter().collect();
        assert!(!query_matches(&cond, &params, EmptyQueryPolicy::RequireNone));
    }

    #[test]
    fn test_empty_condition_policies() {
        let cond = QueryMatch::new();
        let none = QueryParams::default();
        let some: QueryParams = [("x", "1")].into_iter().collect();

        assert!(query_matches(&cond, &none, EmptyQueryPolicy::RequireNone));
        assert!(!query_matches(&cond, &some, EmptyQueryPolicy::RequireNone));

        assert!(query_matches(&cond, &none, EmptyQueryPolicy::MatchAny));
        assert!(query_matches(&cond, &some, EmptyQueryPolicy::MatchAny));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("match-any".parse::<EmptyQueryPolicy>(), Ok(EmptyQueryPolicy::MatchAny));
        assert_eq!("require-none".parse::<EmptyQueryPolicy>(), Ok(EmptyQueryPolicy::RequireNone));
        assert!("sometimes".parse::<EmptyQueryPolicy>().is_err());
    }
}
