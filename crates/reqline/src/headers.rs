//! Header flattening.
//!
//! Configured headers may carry a `common` bucket and one bucket per method.
//! A request only sees the flat result: `common`, then its own method's
//! bucket, then top-level headers, later layers winning.

use reqline_core::config::{METHODS_NO_DATA, METHODS_WITH_DATA};
use reqline_core::{Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};
use tracing::warn;

/// Canonical spelling of the content type header.
pub const CONTENT_TYPE: &str = "Content-Type";

const COMMON_BUCKET: &str = "common";

fn is_bucket(name: &str) -> bool {
    name == COMMON_BUCKET || METHODS_NO_DATA.contains(&name) || METHODS_WITH_DATA.contains(&name)
}

/// Header names differing only in case from `Content-Type` are respelled.
fn canonical_name(name: &str) -> String {
    if name.eq_ignore_ascii_case(CONTENT_TYPE) {
        CONTENT_TYPE.to_string()
    } else {
        name.to_string()
    }
}

fn merge_into(flat: &mut Map<String, Value>, entries: &Map<String, Value>) {
    for (name, value) in entries {
        flat.insert(canonical_name(name), value.clone());
    }
}

/// Flatten the configured header object for a request using `method`.
///
/// Bucket names are dropped from the result; a missing or non-object header
/// value flattens to nothing.
#[must_use]
pub fn flatten_headers(headers: Option<&Value>, method: &str) -> Map<String, Value> {
    let mut flat = Map::new();
    let Some(Value::Object(headers)) = headers else {
        return flat;
    };

    let method = method.to_ascii_lowercase();
    for bucket in [COMMON_BUCKET, method.as_str()] {
        if let Some(Value::Object(entries)) = headers.get(bucket) {
            merge_into(&mut flat, entries);
        }
    }

    let top_level: Map<String, Value> = headers
        .iter()
        .filter(|(name, _)| !is_bucket(name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    merge_into(&mut flat, &top_level);

    flat
}

/// Convert flattened headers into a transport header map.
///
/// Null values are left out; nested objects and arrays are skipped with a
/// warning.
///
/// # Errors
///
/// Returns [`Error::InvalidHeader`] for names or values that are not valid
/// HTTP header tokens.
pub fn to_header_map(headers: &Map<String, Value>) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let text = match value {
            Value::Null => continue,
            Value::String(text) => text.clone(),
            Value::Bool(_) | Value::Number(_) => value.to_string(),
            Value::Array(_) | Value::Object(_) => {
                warn!(header = %name, "skipping non-scalar header value");
                continue;
            }
        };

        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|err| Error::InvalidHeader(format!("{name}: {err}")))?;
        let header_value = HeaderValue::from_str(&text)
            .map_err(|err| Error::InvalidHeader(format!("{name}: {err}")))?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}
