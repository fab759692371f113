//! Ordered query parameters and the default query-string serializer.
//!
//! [`ParamMap`] keeps parameters in insertion order, the way a plain object
//! literal does. [`serialize_params`] renders it into `key=value` pairs using
//! URI-component encoding with a small set of characters left readable.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::kind::Kind;
use crate::value::{ParamValue, SearchParams};

/// Ordered mapping of parameter names to values.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParamMap {
    entries: IndexMap<String, ParamValue>,
}

impl ParamMap {
    /// Create a new, empty map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Build a map from any serializable record.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` does not serialize to a JSON object.
    pub fn from_serialize<T>(value: &T) -> Result<Self>
    where
        T: Serialize + ?Sized,
    {
        match serde_json::to_value(value)? {
            Value::Object(map) => Ok(map
                .into_iter()
                .map(|(key, value)| (key, ParamValue::from(value)))
                .collect()),
            other => Err(Error::InvalidConfig(format!(
                "params must serialize to an object, got {other}"
            ))),
        }
    }

    /// Set `key` to `value`. An existing key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Set `key` to `value`, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert using a mapping function when the value is present.
    pub fn insert_opt_with<T, F>(&mut self, key: impl Into<String>, value: Option<T>, map: F)
    where
        F: FnOnce(T) -> ParamValue,
    {
        if let Some(value) = value {
            self.insert(key, map(value));
        }
    }

    /// Value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
    }

    /// Remove `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.entries.shift_remove(key)
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries, including null ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for ParamMap
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// Query parameters attached to a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    /// Structured parameters, rendered by the default serializer
    Map(ParamMap),
    /// Pre-encoded pairs, rendered verbatim
    Search(SearchParams),
}

impl Params {
    /// Returns true if there is nothing to serialize.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Map(map) => map.is_empty(),
            Self::Search(search) => search.is_empty(),
        }
    }

    /// Convert to a JSON value: maps become objects, search params their
    /// encoded string.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect(),
            ),
            Self::Search(search) => Value::String(search.to_string()),
        }
    }
}

impl From<ParamMap> for Params {
    fn from(map: ParamMap) -> Self {
        Self::Map(map)
    }
}

impl From<SearchParams> for Params {
    fn from(search: SearchParams) -> Self {
        Self::Search(search)
    }
}

/// Characters `encodeURIComponent` leaves alone that `urlencoding` does not.
const UNRESERVED_MARKS: [(&str, &str); 5] = [
    ("%21", "!"),
    ("%2A", "*"),
    ("%27", "'"),
    ("%28", "("),
    ("%29", ")"),
];

/// Escapes put back so query strings stay readable.
const READABLE: [(&str, &str); 7] = [
    ("%3A", ":"),
    ("%24", "$"),
    ("%2C", ","),
    ("%20", "+"),
    ("%5B", "["),
    ("%5D", "]"),
    ("%40", "@"),
];

/// Percent-encode `input` as a URI component, leaving `@ : $ , [ ]` readable
/// and turning spaces into `+`.
///
/// Every `%` in the encoded text starts an escape, so the replacements below
/// never match across two escapes.
#[must_use]
pub fn encode(input: &str) -> String {
    UNRESERVED_MARKS
        .iter()
        .chain(READABLE.iter())
        .fold(urlencoding::encode(input).into_owned(), |text, (escape, raw)| {
            text.replace(*escape, raw)
        })
}

/// Text of one value in the query string.
///
/// Dates use their ISO-8601 form and plain objects their JSON text, as
/// `JSON.stringify` would render them; anything else is stringified.
fn query_text(value: &ParamValue) -> String {
    if value.is_date() || value.is_plain_object() {
        match value.to_json() {
            Value::String(text) => text,
            json => json.to_string(),
        }
    } else {
        value.to_string()
    }
}

/// Render a parameter map with the default algorithm.
///
/// Null values are skipped. Array values repeat the key with a `[]` suffix,
/// one pair per element. Dates and plain objects are stringified before
/// encoding.
#[must_use]
pub fn serialize_params(params: &ParamMap) -> String {
    let mut parts = Vec::new();

    for (key, value) in params.iter() {
        let (key, values) = match value {
            ParamValue::Null => continue,
            ParamValue::Array(items) => (format!("{key}[]"), items.iter().collect::<Vec<_>>()),
            other => (key.to_string(), vec![other]),
        };

        let key = encode(&key);
        for value in values {
            parts.push(format!("{key}={}", encode(&query_text(value))));
        }
    }

    parts.join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn test_insert_keeps_position() {
        let mut params = ParamMap::new();
        params.insert("a", 1);
        params.insert("b", 2);
        params.insert("a", 3);
        let keys: Vec<&str> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(params.get("a"), Some(&ParamValue::from(3)));
    }

    #[test]
    fn test_insert_opt_with_skips_none() {
        let mut params = ParamMap::new();
        params.insert_opt_with("limit", Option::<u32>::None, ParamValue::from);
        assert!(params.is_empty());
        params.insert_opt_with("limit", Some(5u32), |v| ParamValue::from(format!("{v:02}")));
        assert_eq!(params.get("limit"), Some(&ParamValue::from("05")));
    }

    #[test]
    fn test_remove() {
        let mut params = ParamMap::new().with("a", 1).with("b", 2);
        assert_eq!(params.remove("a"), Some(ParamValue::from(1)));
        assert_eq!(params.remove("a"), None);
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_from_serialize() {
        #[derive(Serialize)]
        struct ListParams {
            limit: u32,
            state: Option<String>,
        }

        let params = ParamMap::from_serialize(&ListParams {
            limit: 10,
            state: None,
        })
        .unwrap();
        assert_eq!(serialize_params(&params), "limit=10");
    }

    #[test]
    fn test_from_serialize_rejects_non_objects() {
        let err = ParamMap::from_serialize(&vec![1, 2]).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_encode_keeps_readable_characters() {
        assert_eq!(encode("@:$, "), "@:$,+");
        assert_eq!(encode("[]"), "[]");
        assert_eq!(encode("a/b?c=d&e#f"), "a%2Fb%3Fc%3Dd%26e%23f");
        assert_eq!(encode("-_.!~*'()"), "-_.!~*'()");
        assert_eq!(encode("é"), "%C3%A9");
        assert_eq!(encode("%20"), "%2520");
        assert_eq!(encode("%2C%5B"), "%252C%255B");
        assert_eq!(encode("日本"), "%E6%97%A5%E6%9C%AC");
    }

    #[test]
    fn test_query_text_branches_on_kind() {
        let date = Utc.with_ymd_and_hms(2019, 4, 1, 5, 55, 39).unwrap()
            + chrono::Duration::milliseconds(30);
        assert_eq!(query_text(&ParamValue::from(date)), "2019-04-01T05:55:39.030Z");
        assert_eq!(
            query_text(&ParamValue::from(json!({"bar": "baz", "n": 1}))),
            r#"{"bar":"baz","n":1}"#
        );
        assert_eq!(query_text(&ParamValue::from("2019-04-01")), "2019-04-01");
        assert_eq!(query_text(&ParamValue::from(vec![1, 2])), "1,2");
    }

    #[test]
    fn test_serialize_numbers_like_js() {
        let params = ParamMap::new()
            .with("small", 1e-7)
            .with("large", 1e21)
            .with("zero", -0.0);
        assert_eq!(
            serialize_params(&params),
            "small=1e-7&large=1e%2B21&zero=0"
        );
    }

    #[test]
    fn test_from_iter_overwrites_in_place() {
        let params: ParamMap = (0..1000)
            .map(|i| (format!("k{}", i % 10), i))
            .collect();
        assert_eq!(params.len(), 10);
        let keys: Vec<&str> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys[0], "k0");
        assert_eq!(params.get("k9"), Some(&ParamValue::from(999)));
    }

    #[test]
    fn test_serialize_skips_null() {
        let params = ParamMap::new()
            .with("foo", "bar")
            .with("baz", ParamValue::Null);
        assert_eq!(serialize_params(&params), "foo=bar");
    }

    #[test]
    fn test_serialize_arrays() {
        let params = ParamMap::new().with("foo", vec!["bar", "baz"]);
        assert_eq!(serialize_params(&params), "foo[]=bar&foo[]=baz");

        let single = ParamMap::new().with("foo", vec!["bar"]);
        assert_eq!(serialize_params(&single), "foo[]=bar");
    }

    #[test]
    fn test_serialize_object() {
        let params = ParamMap::new().with("foo", json!({"bar": "baz"}));
        assert_eq!(
            serialize_params(&params),
            "foo=%7B%22bar%22:%22baz%22%7D"
        );
    }

    #[test]
    fn test_serialize_empty_string() {
        let params = ParamMap::new().with("a", "").with("b", false);
        assert_eq!(serialize_params(&params), "a=&b=false");
    }

    #[test]
    fn test_params_to_json() {
        let params = Params::from(ParamMap::new().with("a", vec![1, 2]));
        assert_eq!(params.to_json(), json!({"a": [1, 2]}));
        let search = Params::from(SearchParams::new().with("q", "x y"));
        assert_eq!(search.to_json(), json!("q=x+y"));
    }
}
