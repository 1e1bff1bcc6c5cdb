//! Blocking client for the WordPress REST API.
//!
//! # Overview
//! Authenticates with the JWT plugin's token endpoint, then lists posts,
//! pages, categories and tags, uploads media, creates and updates posts, and
//! finds-or-creates taxonomy terms by slug.
//!
//! # Design
//! - Requests and responses are plain data (`HttpRequest` / `HttpResponse`).
//!   Every operation has a `build_*` / `parse_*` pair and a `Transport`
//!   executes the round-trip, so the request logic is testable without a
//!   network.
//! - Every operation returns `Result<T, ApiError>`; an unexpected status is
//!   an error carrying the status and body, never a silent empty value.
//! - No global state: endpoint and credentials arrive through `Config`.

pub mod client;
pub mod config;
pub mod error;
pub mod escape;
pub mod http;
mod slug_lock;
pub mod transport;
pub mod types;

pub use client::{build_authenticate, parse_authenticate, WpClient};
pub use config::Config;
pub use error::ApiError;
pub use escape::escape_html;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
pub use types::{Category, Post, Tag};
