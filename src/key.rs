//! Cache key derivation
//!
//! Keys look like `sales_report::{"region":"APAC","store":101}`: the
//! function name as namespace, then a compact JSON object with parameter
//! names sorted ascending. Values are rendered by
//! [`DomainValue::to_json`], the only serialization used for keys, so a
//! precomputed combination and a live call carrying the same values
//! always meet on the same key.

use crate::domain::DomainValue;
use std::collections::BTreeMap;
use std::fmt;

/// Separator between namespace and argument object
pub const NAMESPACE_SEPARATOR: &str = "::";

/// Canonical key for one combination of argument values
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Wrap a key read back from the store; callers check it with
    /// [`belongs_to`] first
    pub(crate) fn from_stored(key: String) -> Self {
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Encode a set of `(name, value)` pairs under `namespace`
///
/// The result does not depend on the order of `pairs`. Names are assumed
/// unique; if a name repeats, the last value wins.
pub fn encode<'a, I>(namespace: &str, pairs: I) -> CacheKey
where
    I: IntoIterator<Item = (&'a str, &'a DomainValue)>,
{
    let sorted: BTreeMap<&str, serde_json::Value> = pairs
        .into_iter()
        .map(|(name, value)| (name, value.to_json()))
        .collect();

    // BTreeMap serializes in key order; string keys cannot fail
    let args = serde_json::to_string(&sorted).unwrap_or_default();
    CacheKey(format!("{}{}{}", namespace, NAMESPACE_SEPARATOR, args))
}

/// Encode owned pairs, as carried by a [`Combination`](crate::Combination)
pub fn encode_pairs(namespace: &str, pairs: &[(String, DomainValue)]) -> CacheKey {
    encode(namespace, pairs.iter().map(|(n, v)| (n.as_str(), v)))
}

/// Namespace of a well-formed key
///
/// Returns `None` when the key has no separator or its argument part is not
/// a JSON object of scalar values.
pub fn parse_namespace(key: &str) -> Option<&str> {
    let (namespace, args) = key.split_once(NAMESPACE_SEPARATOR)?;
    if namespace.is_empty() {
        return None;
    }

    let parsed: serde_json::Map<String, serde_json::Value> = serde_json::from_str(args).ok()?;
    if parsed.values().all(|v| DomainValue::from_json(v).is_some()) {
        Some(namespace)
    } else {
        None
    }
}

/// Whether `key` is well formed and belongs to `namespace`
pub fn belongs_to(key: &str, namespace: &str) -> bool {
    parse_namespace(key) == Some(namespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs() -> Vec<(String, DomainValue)> {
        vec![
            ("region".to_string(), "APAC".into()),
            ("store".to_string(), 101.into()),
            ("audited".to_string(), true.into()),
        ]
    }

    #[test]
    fn encode_is_sorted_and_namespaced() {
        let key = encode_pairs("sales", &pairs());
        assert_eq!(
            key.as_str(),
            r#"sales::{"audited":true,"region":"APAC","store":101}"#
        );
    }

    #[test]
    fn encode_ignores_argument_order() {
        let base = encode_pairs("sales", &pairs());
        let mut permuted = pairs();
        permuted.reverse();
        assert_eq!(encode_pairs("sales", &permuted), base);
        permuted.swap(0, 1);
        assert_eq!(encode_pairs("sales", &permuted), base);
    }

    #[test]
    fn encode_distinguishes_values_and_types() {
        let a = encode_pairs("sales", &[("store".to_string(), 101.into())]);
        let b = encode_pairs("sales", &[("store".to_string(), 202.into())]);
        let c = encode_pairs("sales", &[("store".to_string(), "101".into())]);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn encode_distinguishes_namespaces() {
        let a = encode_pairs("sales", &pairs());
        let b = encode_pairs("returns", &pairs());
        assert_ne!(a, b);
    }

    #[test]
    fn separator_inside_values_is_escaped() {
        let tricky = encode_pairs(
            "f",
            &[("a".to_string(), r#"x","b":"y"#.into())],
        );
        let plain = encode_pairs(
            "f",
            &[("a".to_string(), "x".into()), ("b".to_string(), "y".into())],
        );
        assert_ne!(tricky, plain);
        assert_eq!(parse_namespace(tricky.as_str()), Some("f"));
    }

    #[test]
    fn parse_namespace_accepts_own_keys() {
        let key = encode_pairs("sales", &pairs());
        assert_eq!(parse_namespace(key.as_str()), Some("sales"));
        assert!(belongs_to(key.as_str(), "sales"));
        assert!(!belongs_to(key.as_str(), "returns"));
    }

    #[test]
    fn parse_namespace_rejects_malformed() {
        assert_eq!(parse_namespace("no separator"), None);
        assert_eq!(parse_namespace("::{}"), None);
        assert_eq!(parse_namespace("sales::not json"), None);
        assert_eq!(parse_namespace(r#"sales::{"a":[1]}"#), None);
        assert_eq!(parse_namespace(r#"sales::{"a":Region.EMEA}"#), None);
    }
}
