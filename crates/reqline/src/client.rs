//! Request preparation client.

use reqline_core::config::keys;
use reqline_core::url::{combine_url, is_absolute_url};
use reqline_core::{build_url, merge_config, Error, RequestConfig, Result};
use reqwest::{Method, Request, Response, Url};
use secrecy::ExposeSecret;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};
use validator::Validate;

use crate::body::{transform_request, RequestBody};
use crate::headers::{flatten_headers, to_header_map};

const USER_AGENT: &str = concat!("reqline/", env!("CARGO_PKG_VERSION"));

/// Longest timeout a client may be configured with, in milliseconds.
pub const MAX_TIMEOUT_MS: u64 = 600_000;

#[derive(Debug, Clone, Validate)]
struct ClientOptions {
    #[validate(url)]
    base_url: Option<String>,

    #[validate(range(max = 600_000))]
    timeout_ms: u64,

    #[validate(length(min = 1))]
    user_agent: String,
}

/// Builder for [`Client`].
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    options: ClientOptions,
    defaults: RequestConfig,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBuilder {
    /// Start from the library defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            options: ClientOptions {
                base_url: None,
                timeout_ms: 0,
                user_agent: USER_AGENT.to_string(),
            },
            defaults: RequestConfig::defaults(),
        }
    }

    /// Prefix for relative request URLs.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.options.base_url = Some(base_url.into());
        self
    }

    /// Default request timeout. Zero disables it.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Header sent with every request.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults = self.defaults.with_common_header(name, value);
        self
    }

    /// Override the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.options.user_agent = user_agent.into();
        self
    }

    /// Configure HTTP basic authentication for every request.
    #[must_use]
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.defaults = self.defaults.with_auth(username, password);
        self
    }

    /// Merge `config` over the current defaults.
    #[must_use]
    pub fn with_defaults(mut self, config: &RequestConfig) -> Self {
        self.defaults = merge_config(&self.defaults, Some(config));
        self
    }

    /// Build the client instance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if the base URL is not a URL, the
    /// timeout exceeds [`MAX_TIMEOUT_MS`], or the user agent is empty.
    pub fn build(self) -> Result<Client> {
        self.options.validate()?;

        let mut defaults = self.defaults;
        if let Some(base_url) = self.options.base_url {
            defaults.set(keys::BASE_URL, Value::String(base_url));
        }
        if self.options.timeout_ms > 0 {
            defaults.set(keys::TIMEOUT, Value::from(self.options.timeout_ms));
        }

        let http = reqwest::Client::builder()
            .user_agent(self.options.user_agent)
            .build()
            .map_err(|err| Error::InvalidConfig(format!("Failed to build HTTP client: {err}")))?;

        Ok(Client { defaults, http })
    }
}

/// Client that merges per-call configuration over its defaults and turns the
/// result into transport requests.
#[derive(Debug, Clone)]
pub struct Client {
    defaults: RequestConfig,
    http: reqwest::Client,
}

impl Client {
    /// Client with the library defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP transport cannot be constructed.
    pub fn new() -> Result<Self> {
        ClientBuilder::new().build()
    }

    /// Start a [`ClientBuilder`].
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Configuration every request starts from.
    #[must_use]
    pub fn defaults(&self) -> &RequestConfig {
        &self.defaults
    }

    /// Merge `config` over the client defaults.
    #[must_use]
    pub fn merged_config(&self, config: Option<&RequestConfig>) -> RequestConfig {
        merge_config(&self.defaults, config)
    }

    /// Final request URL for `config`.
    ///
    /// Relative URLs are joined to `baseURL`; absolute URLs are used as-is.
    /// Query parameters are appended with the configured serializer.
    #[must_use]
    pub fn get_uri(&self, config: Option<&RequestConfig>) -> String {
        uri_for(&self.merged_config(config))
    }

    /// Build the transport request for `config` without sending it.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown method, an unparseable URL, invalid
    /// header names or values, or request data that cannot be encoded.
    pub fn prepare(&self, config: Option<&RequestConfig>) -> Result<Request> {
        let merged = self.merged_config(config);
        let uri = uri_for(&merged);
        let url = Url::parse(&uri)?;

        let method_name = merged.method().unwrap_or("get");
        let method = Method::from_bytes(method_name.to_ascii_uppercase().as_bytes())
            .map_err(|_| Error::InvalidMethod(method_name.to_string()))?;

        let mut headers = flatten_headers(merged.headers(), method_name);
        let body = transform_request(merged.data(), &mut headers)?;
        let header_map = to_header_map(&headers)?;

        let mut request = self.http.request(method.clone(), url).headers(header_map);
        request = match body {
            RequestBody::Empty => request,
            RequestBody::Text(text) => request.body(text),
            RequestBody::Multipart(form) => request.multipart(form),
        };

        if let Some(timeout) = merged.timeout().filter(|timeout| !timeout.is_zero()) {
            request = request.timeout(timeout);
        }

        if let Some(auth) = merged.auth() {
            request = request.basic_auth(auth.username, Some(auth.password.expose_secret()));
        }

        debug!(method = %method, uri = %uri, headers = headers.len(), "prepared request");
        Ok(request.build()?)
    }

    /// Prepare `config` and send it.
    ///
    /// # Errors
    ///
    /// Returns an error if preparation fails or the transport reports one.
    pub async fn send(&self, config: Option<&RequestConfig>) -> Result<Response> {
        let request = self.prepare(config)?;
        let method = request.method().clone();
        let url = request.url().clone();

        info!(method = %method, url = %url, "sending request");
        self.http.execute(request).await.map_err(|err| {
            let err = Error::from(err);
            warn!(method = %method, url = %url, code = err.error_code(), "request failed: {err}");
            err
        })
    }
}

fn uri_for(config: &RequestConfig) -> String {
    let url = config.url().unwrap_or_default();
    let full = match config.base_url() {
        Some(base_url) if !is_absolute_url(url) => combine_url(base_url, Some(url)),
        _ => url.to_string(),
    };
    build_url(&full, config.params().as_ref(), config.params_serializer())
}
