//! Crawl orchestration
//!
//! Runs the `DISCOVER_MODULES → {FETCH_LIVE_PAGE, FETCH_DELETED_PAGE}* →
//! DONE` walk. Discovery returns its module list as plain data; each
//! allowed module gets one live cursor and one deleted cursor, spawned as
//! independent tasks. Within a cursor, pages are strictly sequential;
//! across cursors there is no ordering and none is needed, since the sink
//! map is mutex-guarded and keyed by name.
//!
//! A branch that sees a bad status, unparseable JSON, an API error, or the
//! no-data marker stops silently: that is normal termination, not a fault.
//! The crawl as a whole always completes, and the sink is finalized only
//! after every cursor has reached `DONE`.

use crate::classify;
use crate::config::ExportConfig;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::request::{self, ApiMethod, Cursor};
use crate::sink::ExportSink;
use crate::types::{Module, Record, RecordKind};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};


/// Counters for one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Modules returned by discovery
    pub modules_discovered: usize,
    /// Modules that passed the allow-list
    pub modules_crawled: usize,
    /// Pages fetched across all cursors
    pub pages_fetched: u64,
    /// Live records exported
    pub live_records: u64,
    /// Deletion markers exported
    pub deleted_records: u64,
}

/// Per-branch summary returned by a finished cursor task
#[derive(Debug, Clone, Copy, Default)]
struct BranchStats {
    pages: u64,
    records: u64,
}

/// Orchestrates module discovery and per-module pagination
pub struct Crawler {
    client: Arc<HttpClient>,
    config: Arc<ExportConfig>,
}

impl Crawler {
    /// Create a crawler over a client and validated configuration
    pub fn new(client: Arc<HttpClient>, config: Arc<ExportConfig>) -> Self {
        Self { client, config }
    }

    /// `DISCOVER_MODULES`: one request to the module-listing endpoint.
    ///
    /// Unlike cursor branches, discovery failures are surfaced to the
    /// caller; with no module list there is nothing to crawl.
    pub async fn discover(&self) -> Result<Vec<Module>> {
        let auth = self.config.require_auth_token()?;
        let url = request::discovery_url(&self.config.base_url, auth)?;

        let page = self.client.fetch(&url).await?;
        if !classify::is_response_valid(page.status) {
            return Err(Error::http_status(page.status, "module discovery failed"));
        }
        let body: Value = serde_json::from_str(&page.body)?;
        if !classify::is_json_valid(&body) {
            return Err(Error::Other(format!(
                "module discovery returned an API error: {}",
                body["response"]["error"]
            )));
        }

        let modules = parse_modules(&body);
        debug!("Discovered {} module(s)", modules.len());
        Ok(modules)
    }

    /// Run the full crawl, writing every produced record into `sink`.
    ///
    /// Returns once all spawned cursors have terminated. The sink is left
    /// open; the caller finalizes it exactly once afterwards.
    pub async fn crawl(&self, sink: Arc<Mutex<ExportSink>>) -> Result<CrawlStats> {
        let mut stats = CrawlStats::default();

        let modules = match self.discover().await {
            Ok(modules) => modules,
            Err(e) => {
                // A failed discovery still yields a completed (empty) run
                warn!("Module discovery failed, nothing to crawl: {e}");
                return Ok(stats);
            }
        };
        stats.modules_discovered = modules.len();

        let mut tasks: JoinSet<(RecordKind, BranchStats)> = JoinSet::new();
        for module in modules {
            if !self.config.modules.allows(&module.name) {
                debug!("Module {} not in allow-list, skipping", module.name);
                continue;
            }
            stats.modules_crawled += 1;

            for (method, kind, ceiling) in [
                (
                    ApiMethod::GetRecords,
                    RecordKind::Live,
                    self.config.max_records,
                ),
                (
                    ApiMethod::GetDeletedRecordIds,
                    RecordKind::Deleted,
                    self.config.max_deleted_records,
                ),
            ] {
                let client = Arc::clone(&self.client);
                let config = Arc::clone(&self.config);
                let sink = Arc::clone(&sink);
                let cursor = Cursor::first(module.name.clone(), method);
                tasks.spawn(async move {
                    let branch = run_cursor(&client, &config, cursor, kind, ceiling, &sink).await;
                    (kind, branch)
                });
            }
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((kind, branch)) => {
                    stats.pages_fetched += branch.pages;
                    match kind {
                        RecordKind::Live => stats.live_records += branch.records,
                        RecordKind::Deleted => stats.deleted_records += branch.records,
                    }
                }
                Err(e) => warn!("Cursor task panicked: {e}"),
            }
        }

        info!(
            "Crawl complete: {} module(s), {} page(s), {} live record(s), {} deletion(s)",
            stats.modules_crawled,
            stats.pages_fetched,
            stats.live_records,
            stats.deleted_records
        );
        Ok(stats)
    }
}

/// One cursor's walk to `DONE`: fetch, classify, emit, advance.
///
/// Every early return is a silent branch termination per the error
/// policy; sibling cursors are never affected.
async fn run_cursor(
    client: &HttpClient,
    config: &ExportConfig,
    mut cursor: Cursor,
    kind: RecordKind,
    ceiling: Option<u32>,
    sink: &Mutex<ExportSink>,
) -> BranchStats {
    let mut branch = BranchStats::default();
    let Ok(auth) = config.require_auth_token() else {
        return branch;
    };

    loop {
        let url = match request::build_url(
            &config.base_url,
            &cursor,
            auth,
            config.last_modified_time.as_deref(),
        ) {
            Ok(url) => url,
            Err(e) => {
                warn!("Bad request URL for module {}: {e}", cursor.module());
                return branch;
            }
        };

        let page = match client.fetch(&url).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Fetch failed for module {} at {url}: {e}", cursor.module());
                return branch;
            }
        };
        branch.pages += 1;

        if !classify::is_response_valid(page.status) {
            warn!(
                "Module {} returned status {} at {url}, stopping branch",
                cursor.module(),
                page.status
            );
            return branch;
        }

        let body: Value = match serde_json::from_str(&page.body) {
            Ok(body) => body,
            Err(e) => {
                warn!(
                    "Module {} body could not be deserialized at {url}: {e}",
                    cursor.module()
                );
                return branch;
            }
        };

        if !classify::is_json_valid(&body) {
            warn!(
                "Module {} reported an API error at {url}, stopping branch",
                cursor.module()
            );
            return branch;
        }

        if !classify::has_data(&body, kind) {
            debug!(
                "Module {} {} exhausted at offset {}",
                cursor.module(),
                cursor.method(),
                cursor.from_index()
            );
            return branch;
        }

        let records = match kind {
            RecordKind::Live => parse_live_records(&body, cursor.module()),
            RecordKind::Deleted => parse_deleted_ids(&body, cursor.module()),
        };

        // A rowless body can pass every classifier (no nodata marker, no
        // error object); advancing on it would page forever.
        if records.is_empty() {
            debug!(
                "Module {} {} page at offset {} held no records, stopping branch",
                cursor.module(),
                cursor.method(),
                cursor.from_index()
            );
            return branch;
        }

        {
            let mut sink = sink.lock().await;
            for record in &records {
                if let Err(e) = sink.write(record) {
                    warn!("Sink write failed for module {}: {e}", cursor.module());
                    return branch;
                }
            }
        }
        branch.records += records.len() as u64;

        cursor = match cursor.advance(ceiling) {
            Some(next) => next,
            None => {
                debug!(
                    "Module {} {} hit the record ceiling, stopping branch",
                    cursor.module(),
                    cursor.method()
                );
                return branch;
            }
        };
    }
}

// ============================================================================
// Response parsing (pure, unit-testable)
// ============================================================================

/// The API collapses single-element arrays into bare objects; normalize
/// both shapes into a slice-like view.
fn rows_of(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![value],
        _ => Vec::new(),
    }
}

/// Render an id-like value (string or number) as a string
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse the discovery body into modules, tolerating missing structure
pub fn parse_modules(body: &Value) -> Vec<Module> {
    let Some(rows) = body
        .get("response")
        .and_then(|r| r.get("result"))
        .and_then(|r| r.get("row"))
    else {
        return Vec::new();
    };

    rows_of(rows)
        .into_iter()
        .filter_map(|row| {
            let id = row.get("id").and_then(id_string)?;
            let name = row.get("content").and_then(Value::as_str)?;
            let number = row
                .get("no")
                .and_then(id_string)
                .and_then(|n| n.parse().ok())
                .unwrap_or_default();
            Some(Module::new(id, name, number))
        })
        .collect()
}

/// Parse one live page into records, flattening each row's `FL` field
/// list (`{val, content}` pairs) into the record's field map.
pub fn parse_live_records(body: &Value, module: &str) -> Vec<Record> {
    let Some(rows) = body
        .get("response")
        .and_then(|r| r.get("result"))
        .and_then(|r| r.get(module))
        .and_then(|m| m.get("row"))
    else {
        return Vec::new();
    };

    rows_of(rows)
        .into_iter()
        .filter_map(|row| {
            let mut record = Record::live(module);
            for field in rows_of(row.get("FL")?) {
                let Some(key) = field.get("val").and_then(Value::as_str) else {
                    continue;
                };
                let value = field.get("content").cloned().unwrap_or(Value::Null);
                record.insert(key, value);
            }
            if record.is_empty() {
                None
            } else {
                Some(record)
            }
        })
        .collect()
}

/// Parse one deletions page: a comma-separated id list, each id trimmed
/// and emitted as a minimal module+id record.
pub fn parse_deleted_ids(body: &Value, module: &str) -> Vec<Record> {
    let Some(ids) = body
        .get("response")
        .and_then(|r| r.get("result"))
        .and_then(|r| r.get("DeletedIDs"))
        .and_then(Value::as_str)
    else {
        return Vec::new();
    };

    ids.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| Record::deleted(module, id))
        .collect()
}
