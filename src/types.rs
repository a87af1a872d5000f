//! Core data types
//!
//! A [`Record`] is a dynamically-keyed field map rather than a fixed struct:
//! the Zoho API decides the schema per row, so fields are added as they are
//! parsed. `serde_json` is built with `preserve_order` so serialized output
//! keeps the field order the API returned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Suffix appended to a module name to form its deleted-record sink name
pub const DELETED_SUFFIX: &str = "-Deleted";

/// A CRM module discovered from the `Info/getModules` endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    /// Module identifier
    pub id: String,
    /// Display name, also the path segment for record requests
    pub name: String,
    /// Sequence number reported by the API
    pub number: u32,
}

impl Module {
    /// Create a new module
    pub fn new(id: impl Into<String>, name: impl Into<String>, number: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            number,
        }
    }
}

/// Whether a record is a live row or a deletion marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// A full row with API-supplied fields
    Live,
    /// A deletion marker carrying only the record id
    Deleted,
}

/// One row of data belonging to a module, or a deletion marker
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    module: String,
    kind: RecordKind,
    fields: Map<String, Value>,
}

impl Record {
    /// Create an empty live record for a module
    pub fn live(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            kind: RecordKind::Live,
            fields: Map::new(),
        }
    }

    /// Create a deletion marker for a record id
    pub fn deleted(module: impl Into<String>, id: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("id".to_string(), Value::String(id.into()));
        Self {
            module: module.into(),
            kind: RecordKind::Deleted,
            fields,
        }
    }

    /// Add a field, overwriting any previous value for the key
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Look up a field value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The module this record belongs to
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Live row or deletion marker
    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Check if this record is a deletion marker
    pub fn is_deleted(&self) -> bool {
        self.kind == RecordKind::Deleted
    }

    /// Number of fields currently set
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if no fields are set
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Destination sink name: the module name, suffixed for deletions
    pub fn sink_name(&self) -> String {
        match self.kind {
            RecordKind::Live => self.module.clone(),
            RecordKind::Deleted => format!("{}{DELETED_SUFFIX}", self.module),
        }
    }

    /// Serialize to the JSON object written to the sink.
    ///
    /// Live records carry the `module` tag only when `include_module_name`
    /// is set; deletion markers always carry it, since the id alone does not
    /// say what was deleted.
    pub fn to_output(&self, include_module_name: bool) -> Value {
        let mut out = Map::new();
        if include_module_name || self.kind == RecordKind::Deleted {
            out.insert(
                "module".to_string(),
                Value::String(self.module.clone()),
            );
        }
        for (key, value) in &self.fields {
            out.insert(key.clone(), value.clone());
        }
        Value::Object(out)
    }
}

/// A single crawl execution's identity
///
/// Created once at crawl start and read-only thereafter; every output path
/// and remote key for the run is scoped under [`RunContext::dir_name`].
#[derive(Debug, Clone)]
pub struct RunContext {
    started_at: DateTime<Utc>,
}

impl RunContext {
    /// Start a new run, stamped now
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
        }
    }

    /// Create a run context from a fixed instant (tests)
    pub fn at(started_at: DateTime<Utc>) -> Self {
        Self { started_at }
    }

    /// When the run started
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Human-readable start timestamp for logs
    pub fn display_time(&self) -> String {
        self.started_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }

    /// Filesystem-safe concatenated timestamp, used as the run directory
    /// name and the remote key prefix
    pub fn dir_name(&self) -> String {
        self.started_at.format("%Y%m%d%H%M%S").to_string()
    }
}
