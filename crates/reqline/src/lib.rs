//! # reqline
//!
//! HTTP request preparation on top of [`reqline_core`].
//!
//! A [`Client`] holds default request configuration. Each call merges its own
//! [`RequestConfig`] over those defaults, builds the final URL, flattens
//! per-method headers, encodes the body, and hands the result to `reqwest`.
//!
//! ## Example
//!
//! ```no_run
//! use reqline::{Client, ParamMap, RequestConfig};
//!
//! # async fn example() -> reqline::Result<()> {
//! let client = Client::builder()
//!     .with_base_url("https://api.example.com")
//!     .with_header("X-Tenant", "acme")
//!     .build()?;
//!
//! let config = RequestConfig::new()
//!     .with_url("/users")
//!     .with_params(ParamMap::new().with("page", 2));
//! let response = client.send(Some(&config)).await?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod body;
pub mod client;
pub mod headers;

pub use client::{Client, ClientBuilder};
pub use reqline_core::{
    build_url, merge_config, ConfigValue, Error, FormData, ParamMap, ParamValue, Params,
    ParamsSerializer, RequestConfig, SearchParams,
};

/// Result type alias using the shared error type.
pub type Result<T> = reqline_core::Result<T>;
