//! # reqline-core
//!
//! Request URL construction and configuration merging for HTTP clients.
//!
//! This crate turns a base URL plus structured parameters into a request URL,
//! and folds per-call request configuration over a set of defaults using
//! field-specific merge strategies.
//!
//! ## Modules
//!
//! - [`error`] - Error type and error codes
//! - [`value`] - Parameter values, search params and form data
//! - [`kind`] - Capability predicates used by the serializer and merger
//! - [`query`] - Ordered parameter maps and query-string serialization
//! - [`url`] - URL builder and URL helpers
//! - [`config`] - Request configuration
//! - [`merge`] - Per-field configuration merge strategies

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod kind;
pub mod merge;
pub mod query;
pub mod url;
pub mod value;

// Re-export commonly used types
pub use config::{BasicAuth, ConfigValue, ParamsSerializer, RequestConfig};
pub use error::{Error, Result};
pub use kind::Kind;
pub use merge::{merge_config, MergeStrategy};
pub use query::{ParamMap, Params};
pub use crate::url::build_url;
pub use value::{FormData, ParamValue, SearchParams};
