//! HTTP downloading with deadlines, cancellation and streaming hashes.
//!
//! # Key Features
//!
//! - **Transport seam**: [`HttpClient`] hides the HTTP stack; tests swap in
//!   an in-memory client.
//! - **Bounded**: every request runs under a [`RequestContext`] carrying a
//!   cancellation token and an absolute deadline, surfacing
//!   [`FetchError::Cancelled`] and [`FetchError::Timeout`] distinctly.
//! - **Single-pass**: file downloads are hashed while streaming to disk.
//! - **Mechanism-only**: no retries; callers own that policy.

mod context;
mod error;
mod fetcher;
mod http;

pub use context::RequestContext;
pub use error::{FetchError, Result};
pub use fetcher::{FetchedFile, Fetcher};
pub use http::{BoxStream, HttpClient, HttpResponse};

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;

pub use tokio_util::sync::CancellationToken;
