//! URL builder and URL helpers.
//!
//! [`build_url`] appends serialized query parameters to a request URL. The
//! helpers cover absolute-URL detection, base/relative joining and same-origin
//! checks.

use ::url::Url;
use tracing::trace;

use crate::config::ParamsSerializer;
use crate::error::Result;
use crate::query::{serialize_params, Params};

/// Append `params` to `url` as a query string.
///
/// The query string comes from `serializer` when one is given, from the
/// pre-encoded pairs when `params` are search params, and from the default
/// algorithm otherwise. When it is non-empty, any `#fragment` on `url` is
/// dropped and the query is joined with `?`, or with `&` if `url` already has
/// a query. An empty query string leaves `url` untouched.
#[must_use]
pub fn build_url(
    url: &str,
    params: Option<&Params>,
    serializer: Option<&ParamsSerializer>,
) -> String {
    let Some(params) = params.filter(|params| !params.is_empty()) else {
        return url.to_string();
    };

    let serialized = if let Some(serializer) = serializer {
        trace!(url, "serializing params with custom serializer");
        serializer.serialize(params)
    } else {
        match params {
            Params::Search(search) => search.to_string(),
            Params::Map(map) => serialize_params(map),
        }
    };

    if serialized.is_empty() {
        return url.to_string();
    }

    let base = url.find('#').map_or(url, |index| &url[..index]);
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}{serialized}")
}

/// Returns true if `url` starts with `scheme://` or is protocol-relative (`//`).
///
/// The scheme is a letter followed by letters, digits, `+`, `-` or `.`,
/// compared case-insensitively.
#[must_use]
pub fn is_absolute_url(url: &str) -> bool {
    let rest = match url.find(':') {
        Some(colon) if is_scheme(&url[..colon]) => &url[colon + 1..],
        _ => url,
    };
    rest.starts_with("//")
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Join `base_url` and `relative_url` with exactly one `/`.
///
/// Returns `base_url` unchanged when `relative_url` is absent or empty.
#[must_use]
pub fn combine_url(base_url: &str, relative_url: Option<&str>) -> String {
    match relative_url {
        Some(relative) if !relative.is_empty() => format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            relative.trim_start_matches('/')
        ),
        _ => base_url.to_string(),
    }
}

/// Protocol and host of a resolved URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlOrigin {
    /// Scheme followed by `:`, e.g. `https:`
    pub protocol: String,
    /// Host name, followed by `:port` when the port is not the scheme default
    pub host: String,
}

impl UrlOrigin {
    /// Resolve `url` against `current` and extract its origin.
    ///
    /// # Errors
    ///
    /// Returns an error if `url` cannot be resolved.
    pub fn resolve(url: &str, current: &Url) -> Result<Self> {
        let resolved = current.join(url)?;
        Ok(Self::from_url(&resolved))
    }

    /// Origin of an already-parsed URL.
    #[must_use]
    pub fn from_url(url: &Url) -> Self {
        let host = url.host_str().unwrap_or_default();
        let host = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        Self {
            protocol: format!("{}:", url.scheme()),
            host,
        }
    }
}

/// Returns true if `request_url`, resolved against `current`, has the same
/// protocol and host as `current`. Unresolvable URLs are never same-origin.
#[must_use]
pub fn is_url_same_origin(request_url: &str, current: &Url) -> bool {
    let current_origin = UrlOrigin::from_url(current);
    UrlOrigin::resolve(request_url, current).is_ok_and(|origin| origin == current_origin)
}
