//! HTTP fetch substrate
//!
//! The crawling engine underneath the state machine: issues GET requests
//! with automatic retries, exponential backoff, and token-bucket rate
//! limiting. A completed response is always handed back to the caller,
//! whatever its status; the classifier decides what a page means.

mod client;
mod rate_limit;

pub use client::{FetchedPage, HttpClient, HttpClientConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
