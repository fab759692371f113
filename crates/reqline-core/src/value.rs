//! Parameter values and pre-encoded request payload types.
//!
//! [`ParamValue`] is the value type of a parameter map. [`SearchParams`] holds
//! query pairs that are already in their final form and bypass the default
//! serializer. [`FormData`] holds multipart body fields.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};
use std::fmt;
use url::form_urlencoded;

/// A single query parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Absent value; skipped by the serializer
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value
    Number(Number),
    /// String value
    String(String),
    /// Point in time, serialized as an ISO-8601 timestamp
    Date(DateTime<Utc>),
    /// List of values, serialized as repeated `key[]` pairs
    Array(Vec<ParamValue>),
    /// Plain key-value record, serialized as JSON text
    Object(Map<String, Value>),
}

impl ParamValue {
    /// Returns true for the absent value.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Convert to a JSON value. Dates become ISO-8601 strings.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
            Self::Date(date) => Value::String(iso_string(date)),
            Self::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Object(map) => Value::Object(map.clone()),
        }
    }
}

/// Renders the value the way JavaScript's `String(value)` does, with dates in
/// UTC.
impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => f.write_str(&number_text(n)),
            Self::String(s) => f.write_str(s),
            Self::Date(date) => write!(
                f,
                "{}",
                date.format("%a %b %d %Y %H:%M:%S GMT+0000 (Coordinated Universal Time)")
            ),
            Self::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(",")?;
                    }
                    if !item.is_null() {
                        write!(f, "{item}")?;
                    }
                }
                Ok(())
            }
            Self::Object(_) => f.write_str("[object Object]"),
        }
    }
}

/// Format a timestamp the way `Date.prototype.toISOString` does.
fn iso_string(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Shortest round-trip digits; exponent form outside `[1e-6, 1e21)`.
fn number_text(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f == 0.0 => "0".to_string(),
        Some(f) if f.abs() < 1e-6 || f.abs() >= 1e21 => {
            let text = format!("{f:e}");
            match text.split_once('e') {
                Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                    format!("{mantissa}e+{exponent}")
                }
                _ => text,
            }
        }
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

fn non_finite_text(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_sign_negative() {
        "-Infinity".to_string()
    } else {
        "Infinity".to_string()
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ParamValue {
                fn from(value: $ty) -> Self {
                    Self::Number(Number::from(value))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or_else(|| Self::String(non_finite_text(value)), Self::Number)
    }
}

impl From<DateTime<Utc>> for ParamValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Date(value)
    }
}

impl From<Map<String, Value>> for ParamValue {
    fn from(value: Map<String, Value>) -> Self {
        Self::Object(value)
    }
}

impl<T> From<Vec<T>> for ParamValue
where
    T: Into<ParamValue>,
{
    fn from(value: Vec<T>) -> Self {
        Self::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<T> From<Option<T>> for ParamValue
where
    T: Into<ParamValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => Self::Object(map),
        }
    }
}

/// Query pairs that are already in their final form.
///
/// The URL builder uses the `application/x-www-form-urlencoded` rendering of
/// these pairs verbatim instead of running the default serializer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pairs: Vec<(String, String)>,
}

impl SearchParams {
    /// Create an empty set of search params.
    #[must_use]
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Parse a query string. A leading `?` is ignored.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs = form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { pairs }
    }

    /// Append a name/value pair.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    /// Append a name/value pair, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.append(name, value);
        self
    }

    /// First value stored under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over the stored pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of stored pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if no pairs are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl fmt::Display for SearchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish();
        f.write_str(&encoded)
    }
}

/// A single multipart field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    /// Text field
    Text(String),
    /// File upload
    File {
        /// File name reported to the server
        file_name: String,
        /// File contents
        bytes: Vec<u8>,
    },
}

/// Multipart request body fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    parts: Vec<(String, FormPart)>,
}

impl FormData {
    /// Create an empty form.
    #[must_use]
    pub fn new() -> Self {
        Self { parts: Vec::new() }
    }

    /// Append a text field.
    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push((name.into(), FormPart::Text(value.into())));
        self
    }

    /// Append a file field.
    #[must_use]
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        self.parts.push((
            name.into(),
            FormPart::File {
                file_name: file_name.into(),
                bytes: bytes.into(),
            },
        ));
        self
    }

    /// Iterate over the fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormPart)> {
        self.parts.iter().map(|(name, part)| (name.as_str(), part))
    }

    /// Returns true if the form has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_date_text_matches_js_string() {
        let date = Utc.with_ymd_and_hms(2019, 4, 1, 5, 55, 39).unwrap();
        assert_eq!(
            ParamValue::from(date).to_string(),
            "Mon Apr 01 2019 05:55:39 GMT+0000 (Coordinated Universal Time)"
        );
    }

    #[test]
    fn test_object_text() {
        let value = ParamValue::from(json!({"bar": "baz", "n": 1}));
        assert_eq!(value.to_string(), "[object Object]");
    }

    #[test]
    fn test_numbers_print_like_js() {
        assert_eq!(ParamValue::from(1).to_string(), "1");
        assert_eq!(ParamValue::from(1.5).to_string(), "1.5");
        assert_eq!(ParamValue::from(2.0).to_string(), "2");
        assert_eq!(ParamValue::from(0.000_001).to_string(), "0.000001");
        assert_eq!(ParamValue::from(1e-7).to_string(), "1e-7");
        assert_eq!(ParamValue::from(1.5e-7).to_string(), "1.5e-7");
        assert_eq!(ParamValue::from(1e20).to_string(), "100000000000000000000");
        assert_eq!(ParamValue::from(1e21).to_string(), "1e+21");
        assert_eq!(ParamValue::from(-2.5e22).to_string(), "-2.5e+22");
        assert_eq!(ParamValue::from(-0.0).to_string(), "0");
        assert_eq!(ParamValue::from(f64::NAN).to_string(), "NaN");
        assert_eq!(ParamValue::from(f64::NEG_INFINITY).to_string(), "-Infinity");
    }

    #[test]
    fn test_nested_array_joins_with_commas() {
        let date = Utc.with_ymd_and_hms(2019, 4, 1, 5, 55, 39).unwrap();
        let value = ParamValue::Array(vec![
            ParamValue::from("a"),
            ParamValue::Null,
            ParamValue::from(json!({"x": 1})),
            ParamValue::from(date),
        ]);
        assert_eq!(
            value.to_string(),
            "a,,[object Object],Mon Apr 01 2019 05:55:39 GMT+0000 (Coordinated Universal Time)"
        );
    }

    #[test]
    fn test_null_element_text() {
        assert_eq!(ParamValue::Null.to_string(), "null");
    }

    #[test]
    fn test_option_maps_none_to_null() {
        assert!(ParamValue::from(Option::<&str>::None).is_null());
        assert_eq!(ParamValue::from(Some("x")), ParamValue::from("x"));
    }

    #[test]
    fn test_to_json_renders_dates_as_strings() {
        let date = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        let value = ParamValue::from(vec![ParamValue::from(date), ParamValue::from(true)]);
        assert_eq!(value.to_json(), json!(["2020-01-02T03:04:05.000Z", true]));
    }

    #[test]
    fn test_search_params_display_is_form_encoded() {
        let params = SearchParams::new()
            .with("q", "a b")
            .with("tag", "x&y");
        assert_eq!(params.to_string(), "q=a+b&tag=x%26y");
    }

    #[test]
    fn test_search_params_parse() {
        let params = SearchParams::parse("?foo=bar&baz=a+b");
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("baz"), Some("a b"));
        assert_eq!(params.get("missing"), None);
    }

    #[test]
    fn test_form_data_keeps_order() {
        let form = FormData::new()
            .text("name", "value")
            .file("upload", "a.txt", b"hi".to_vec());
        let names: Vec<&str> = form.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["name", "upload"]);
        assert!(!form.is_empty());
    }
}
