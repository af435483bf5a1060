//! Fluent, synchronous HTTP request building with typed response decoding
//!
//! A [`Client`] is bound to a validated base URL and accumulates request
//! configuration across chained calls: path, method, headers, multi-valued
//! query parameters, basic auth and a typed body. Each verb method fires one
//! blocking request and routes the response into a caller-supplied success or
//! failure target depending on the status class, while the status code itself
//! stays readable on the client.
//!
//! Query parameters live for exactly one request: whatever the outcome, they
//! are cleared when the call returns.
//!
//! ```no_run
//! use reqsmith::{Client, JSON_CONTENT_TYPE};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Default, Deserialize)]
//! struct User {
//!     name: String,
//!     age: u8,
//! }
//!
//! fn main() -> Result<(), reqsmith::Error> {
//!     let mut client = Client::new("https://api.example.org")?;
//!     client.accept(JSON_CONTENT_TYPE);
//!
//!     let mut user = User::default();
//!     client.get("/user/1000", Some(&mut user), None::<&mut ()>)?;
//!     println!("{} is {} years old", user.name, user.age);
//!     Ok(())
//! }
//! ```

use std::time::Duration;

mod client;
mod decoder;
mod error;
mod provider;
mod uri;

pub use client::Client;
pub use decoder::BodyDecoder;
pub use error::{Error, Result};
pub use provider::BodyProvider;
pub use uri::{is_valid_base, is_valid_hostname, is_valid_scheme, normalize_base, resolve_path};

/// MIME type handled by the plain-text provider/decoder pair
pub const TEXT_CONTENT_TYPE: &str = "text/plain";

/// MIME type handled by the JSON provider/decoder pair
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// MIME type handled by the form provider/decoder pair
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Per-request timeout applied by a freshly created [`Client`]
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(4);
