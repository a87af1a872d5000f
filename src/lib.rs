//! # Zoho CRM Exporter
//!
//! Incrementally extracts records from the paginated Zoho CRM JSON API,
//! buffers them into module-named local files, splits those files into
//! bounded-size chunks, and uploads the chunks to an object store under a
//! timestamped run directory.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          Crawler                                │
//! │  discover() → [Module]     crawl() → records into ExportSink    │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │  Cursor  │ Classify  │     Sink      │   Split   │   Upload    │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Offset+1 │ Status    │ JSON lines    │ N lines   │ S3 / local  │
//! │ Page 200 │ API error │ Per module    │ per chunk │ Retry       │
//! │ Ceiling  │ No-data   │ Lazy writers  │ Ordered   │ Per-file    │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```
//!
//! Live and deleted records paginate independently per module; a branch
//! that hits a transport error, an API error, or the no-data marker simply
//! stops. The run as a whole always completes with whatever was exported.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the exporter
pub mod error;

/// Core data types: modules, records, run context
pub mod types;

/// Configuration loading and validation
pub mod config;

/// Pagination cursor and request URL building
pub mod request;

/// Response classification predicates
pub mod classify;

/// HTTP client with retry and rate limiting
pub mod http;

/// Crawl orchestration: discovery and per-module cursors
pub mod crawl;

/// Per-module buffered JSON-lines sinks
pub mod sink;

/// Fixed-line-count file splitting
pub mod split;

/// Object-store upload dispatch
pub mod upload;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::{Module, Record, RecordKind, RunContext};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
