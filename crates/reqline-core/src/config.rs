//! Request configuration.
//!
//! A [`RequestConfig`] is a flat mapping from option name to value. The
//! recognized option names live in [`keys`]; any other name is carried through
//! untouched. Most options are JSON-shaped. Query parameters, multipart form
//! data and custom params serializers have their own [`ConfigValue`] variants
//! because they cannot be expressed as JSON.

use secrecy::SecretString;
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::query::{ParamMap, Params};
use crate::value::{FormData, ParamValue, SearchParams};

/// Recognized option names.
pub mod keys {
    /// Request URL, absolute or relative to `baseURL`
    pub const URL: &str = "url";
    /// HTTP method, lowercase
    pub const METHOD: &str = "method";
    /// Prefix for relative request URLs
    pub const BASE_URL: &str = "baseURL";
    /// Header object; may hold `common` and per-method buckets
    pub const HEADERS: &str = "headers";
    /// Request body
    pub const DATA: &str = "data";
    /// Query parameters
    pub const PARAMS: &str = "params";
    /// Custom query-string serializer
    pub const PARAMS_SERIALIZER: &str = "paramsSerializer";
    /// Timeout in milliseconds; 0 disables it
    pub const TIMEOUT: &str = "timeout";
    /// Basic auth credentials, `{ "username", "password" }`
    pub const AUTH: &str = "auth";
    /// Expected response type
    pub const RESPONSE_TYPE: &str = "responseType";
    /// Send cookies on cross-site requests
    pub const WITH_CREDENTIALS: &str = "withCredentials";
    /// Cookie carrying the XSRF token
    pub const XSRF_COOKIE_NAME: &str = "xsrfCookieName";
    /// Header receiving the XSRF token
    pub const XSRF_HEADER_NAME: &str = "xsrfHeaderName";
}

/// Default `Accept` header sent with every request.
pub const DEFAULT_ACCEPT: &str = "application/json, text/plain, */*";

/// Default content type for methods that carry a body.
pub const DEFAULT_FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Methods whose header bucket starts empty.
pub const METHODS_NO_DATA: [&str; 4] = ["delete", "get", "head", "options"];

/// Methods whose header bucket carries a default content type.
pub const METHODS_WITH_DATA: [&str; 3] = ["post", "put", "patch"];

/// User-supplied query-string serializer.
///
/// Replaces the default serialization algorithm for the requests it is
/// configured on; its output is appended to the URL verbatim.
#[derive(Clone)]
pub struct ParamsSerializer(Arc<dyn Fn(&Params) -> String + Send + Sync>);

impl ParamsSerializer {
    /// Wrap a serializer function.
    pub fn new<F>(serializer: F) -> Self
    where
        F: Fn(&Params) -> String + Send + Sync + 'static,
    {
        Self(Arc::new(serializer))
    }

    /// Serialize `params`.
    #[must_use]
    pub fn serialize(&self, params: &Params) -> String {
        (self.0)(params)
    }
}

impl fmt::Debug for ParamsSerializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ParamsSerializer(..)")
    }
}

impl PartialEq for ParamsSerializer {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Value of a single configuration option.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    /// JSON-shaped option
    Json(Value),
    /// Query parameters
    Params(Params),
    /// Multipart request body
    Form(FormData),
    /// Custom query-string serializer
    Serializer(ParamsSerializer),
}

impl ConfigValue {
    /// Borrow the JSON value, if this option is JSON-shaped.
    #[must_use]
    pub const fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// JSON rendering used when serializing a configuration. Form data and
    /// serializers have none.
    #[must_use]
    pub fn to_json(&self) -> Option<Value> {
        match self {
            Self::Json(value) => Some(value.clone()),
            Self::Params(params) => Some(params.to_json()),
            Self::Form(_) | Self::Serializer(_) => None,
        }
    }
}

impl From<Value> for ConfigValue {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<Params> for ConfigValue {
    fn from(params: Params) -> Self {
        Self::Params(params)
    }
}

impl From<FormData> for ConfigValue {
    fn from(form: FormData) -> Self {
        Self::Form(form)
    }
}

impl From<ParamsSerializer> for ConfigValue {
    fn from(serializer: ParamsSerializer) -> Self {
        Self::Serializer(serializer)
    }
}

/// Basic auth credentials read from the `auth` option.
#[derive(Debug, Clone)]
pub struct BasicAuth {
    /// User name
    pub username: String,
    /// Password
    pub password: SecretString,
}

/// Request configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestConfig {
    entries: BTreeMap<String, ConfigValue>,
}

impl RequestConfig {
    /// Create an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Library defaults: `get`, no timeout, JSON-friendly `Accept`, per-method
    /// header buckets and XSRF names.
    #[must_use]
    pub fn defaults() -> Self {
        let mut headers = Map::new();
        headers.insert("common".to_string(), json!({ "Accept": DEFAULT_ACCEPT }));
        for method in METHODS_NO_DATA {
            headers.insert(method.to_string(), json!({}));
        }
        for method in METHODS_WITH_DATA {
            headers.insert(
                method.to_string(),
                json!({ "Content-Type": DEFAULT_FORM_CONTENT_TYPE }),
            );
        }

        Self::new()
            .with(keys::METHOD, json!("get"))
            .with(keys::TIMEOUT, json!(0))
            .with(keys::HEADERS, Value::Object(headers))
            .with(keys::XSRF_COOKIE_NAME, json!("XSRF-TOKEN"))
            .with(keys::XSRF_HEADER_NAME, json!("X-XSRF-TOKEN"))
    }

    /// Parse a configuration from a JSON object.
    ///
    /// A `params` object becomes a parameter map and a `params` string becomes
    /// pre-encoded search params.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is not a JSON object.
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self::from_json_map(map)),
            other => Err(Error::InvalidConfig(format!(
                "configuration must be an object, got {other}"
            ))),
        }
    }

    fn from_json_map(map: Map<String, Value>) -> Self {
        let entries = map
            .into_iter()
            .map(|(key, value)| {
                let value = match (key.as_str(), value) {
                    (keys::PARAMS, Value::Object(params)) => ConfigValue::Params(Params::Map(
                        params
                            .into_iter()
                            .map(|(k, v)| (k, ParamValue::from(v)))
                            .collect(),
                    )),
                    (keys::PARAMS, Value::String(query)) => {
                        ConfigValue::Params(Params::Search(SearchParams::parse(&query)))
                    }
                    (_, value) => ConfigValue::Json(value),
                };
                (key, value)
            })
            .collect();
        Self { entries }
    }

    /// Render the JSON-shaped options as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .filter_map(|(key, value)| value.to_json().map(|v| (key.clone(), v)))
                .collect(),
        )
    }

    /// Option stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.get(key)
    }

    /// Returns true if `key` is set.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Set an option.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Remove an option, returning its value.
    pub fn unset(&mut self, key: &str) -> Option<ConfigValue> {
        self.entries.remove(key)
    }

    /// Set an option, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Iterate over options in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate over option names in key order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of options set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no options are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Set the request URL.
    #[must_use]
    pub fn with_url(self, url: impl Into<String>) -> Self {
        self.with(keys::URL, Value::String(url.into()))
    }

    /// Set the base URL for relative request URLs.
    #[must_use]
    pub fn with_base_url(self, base_url: impl Into<String>) -> Self {
        self.with(keys::BASE_URL, Value::String(base_url.into()))
    }

    /// Set the HTTP method. Stored lowercase.
    #[must_use]
    pub fn with_method(self, method: impl AsRef<str>) -> Self {
        self.with(keys::METHOD, Value::String(method.as_ref().to_ascii_lowercase()))
    }

    /// Set the whole header object.
    #[must_use]
    pub fn with_headers(self, headers: Value) -> Self {
        self.with(keys::HEADERS, headers)
    }

    /// Set a top-level header.
    #[must_use]
    pub fn with_header(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let (name, value) = (name.into(), value.into());
        self.update_headers(|headers| {
            headers.insert(name, value);
        })
    }

    /// Set a header in the `common` bucket, sent with every method.
    #[must_use]
    pub fn with_common_header(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_bucket_header("common", name, value)
    }

    /// Set a header in the bucket of one method.
    #[must_use]
    pub fn with_method_header(
        self,
        method: &str,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.with_bucket_header(&method.to_ascii_lowercase(), name, value)
    }

    fn with_bucket_header(
        self,
        bucket: &str,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        let (name, value) = (name.into(), value.into());
        self.update_headers(|headers| {
            let mut entries = match headers.remove(bucket) {
                Some(Value::Object(entries)) => entries,
                _ => Map::new(),
            };
            entries.insert(name, value);
            headers.insert(bucket.to_string(), Value::Object(entries));
        })
    }

    // Non-object headers are replaced by an empty object first.
    fn update_headers<F>(mut self, update: F) -> Self
    where
        F: FnOnce(&mut Map<String, Value>),
    {
        let mut headers = match self.entries.remove(keys::HEADERS) {
            Some(ConfigValue::Json(Value::Object(headers))) => headers,
            _ => Map::new(),
        };
        update(&mut headers);
        self.set(keys::HEADERS, Value::Object(headers));
        self
    }

    /// Set the query parameters.
    #[must_use]
    pub fn with_params(self, params: impl Into<Params>) -> Self {
        self.with(keys::PARAMS, ConfigValue::Params(params.into()))
    }

    /// Set a custom query-string serializer.
    #[must_use]
    pub fn with_params_serializer<F>(self, serializer: F) -> Self
    where
        F: Fn(&Params) -> String + Send + Sync + 'static,
    {
        self.with(keys::PARAMS_SERIALIZER, ParamsSerializer::new(serializer))
    }

    /// Set a JSON-shaped request body.
    #[must_use]
    pub fn with_data(self, data: impl Into<Value>) -> Self {
        self.with(keys::DATA, ConfigValue::Json(data.into()))
    }

    /// Set a multipart request body.
    #[must_use]
    pub fn with_form(self, form: FormData) -> Self {
        self.with(keys::DATA, ConfigValue::Form(form))
    }

    /// Set the request timeout. A zero duration disables it.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.with(keys::TIMEOUT, json!(millis))
    }

    /// Set basic auth credentials.
    #[must_use]
    pub fn with_auth(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.with(
            keys::AUTH,
            json!({ "username": username.into(), "password": password.into() }),
        )
    }

    /// Request URL.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.json_str(keys::URL)
    }

    /// Base URL.
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.json_str(keys::BASE_URL)
    }

    /// HTTP method as configured.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        self.json_str(keys::METHOD)
    }

    /// Header object.
    #[must_use]
    pub fn headers(&self) -> Option<&Value> {
        self.get(keys::HEADERS).and_then(ConfigValue::as_json)
    }

    /// Query parameters. A JSON object or string stored with [`Self::set`] is
    /// converted on the fly.
    #[must_use]
    pub fn params(&self) -> Option<Params> {
        match self.get(keys::PARAMS)? {
            ConfigValue::Params(params) => Some(params.clone()),
            ConfigValue::Json(Value::Object(map)) => Some(Params::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), ParamValue::from(v.clone())))
                    .collect::<ParamMap>(),
            )),
            ConfigValue::Json(Value::String(query)) => {
                Some(Params::Search(SearchParams::parse(query)))
            }
            _ => None,
        }
    }

    /// Custom query-string serializer.
    #[must_use]
    pub fn params_serializer(&self) -> Option<&ParamsSerializer> {
        match self.get(keys::PARAMS_SERIALIZER)? {
            ConfigValue::Serializer(serializer) => Some(serializer),
            _ => None,
        }
    }

    /// Request body.
    #[must_use]
    pub fn data(&self) -> Option<&ConfigValue> {
        self.get(keys::DATA)
    }

    /// Timeout. `Some(Duration::ZERO)` means no timeout.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn timeout(&self) -> Option<Duration> {
        let value = self.get(keys::TIMEOUT).and_then(ConfigValue::as_json)?;
        if let Some(millis) = value.as_u64() {
            return Some(Duration::from_millis(millis));
        }
        value
            .as_f64()
            .filter(|millis| millis.is_finite() && *millis >= 0.0)
            .map(|millis| Duration::from_micros((millis * 1000.0).round() as u64))
    }

    /// Basic auth credentials.
    #[must_use]
    pub fn auth(&self) -> Option<BasicAuth> {
        let auth = self.get(keys::AUTH).and_then(ConfigValue::as_json)?;
        let username = auth.get("username")?.as_str()?.to_string();
        let password = auth
            .get("password")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Some(BasicAuth {
            username,
            password: SecretString::from(password.to_string()),
        })
    }

    fn json_str(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(ConfigValue::as_json)
            .and_then(Value::as_str)
    }
}

impl Serialize for RequestConfig {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let rendered: Vec<(&String, Value)> = self
            .entries
            .iter()
            .filter_map(|(key, value)| value.to_json().map(|v| (key, v)))
            .collect();
        let mut map = serializer.serialize_map(Some(rendered.len()))?;
        for (key, value) in &rendered {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RequestConfig {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(value).map_err(D::Error::custom)
    }
}
