//! Configuration for an export run
//!
//! Loaded from a YAML file with serde defaults for everything optional;
//! the auth token may instead come from the `ZOHO_CRM_AUTH_TOKEN`
//! environment variable so it never has to live in the file. Validation
//! is fail-fast: a run refuses to start without credentials and a
//! destination, before any crawl work begins.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable consulted when `auth_token` is absent from the file
pub const AUTH_TOKEN_ENV: &str = "ZOHO_CRM_AUTH_TOKEN";

/// Sentinel allow-list value that matches every module (case-insensitive)
pub const ALL_MODULES: &str = "ALL";

// ============================================================================
// Top-Level Export Config
// ============================================================================

/// Complete configuration for a crawl-export-upload run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    /// Zoho CRM auth token; falls back to `ZOHO_CRM_AUTH_TOKEN`
    #[serde(default)]
    pub auth_token: Option<String>,

    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Which modules to crawl
    #[serde(default)]
    pub modules: ModuleFilter,

    /// Only fetch records created or modified after this time
    /// (format `YYYY-MM-DD HH:MM:SS`)
    #[serde(default)]
    pub last_modified_time: Option<String>,

    /// Ceiling on requested live records per module (unset = all)
    #[serde(default)]
    pub max_records: Option<u32>,

    /// Ceiling on requested deleted-record ids per module (unset = all).
    /// Deliberately separate from `max_records`; the two are never shared.
    #[serde(default)]
    pub max_deleted_records: Option<u32>,

    /// Local parent directory for chunked output
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Extension for output files
    #[serde(default = "default_file_type")]
    pub file_type: String,

    /// Maximum lines per chunk file
    #[serde(default = "default_lines_per_file")]
    pub lines_per_file: usize,

    /// Retain the `module` tag in live-record output
    #[serde(default)]
    pub include_module_name: bool,

    /// Upload destination: `s3://bucket/prefix` or a local path
    #[serde(default)]
    pub destination: Option<String>,

    /// Upload transfer tuning
    #[serde(default)]
    pub upload: UploadConfig,

    /// HTTP client tuning
    #[serde(default)]
    pub http: HttpConfig,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            auth_token: None,
            base_url: default_base_url(),
            modules: ModuleFilter::default(),
            last_modified_time: None,
            max_records: None,
            max_deleted_records: None,
            output_dir: default_output_dir(),
            file_type: default_file_type(),
            lines_per_file: default_lines_per_file(),
            include_module_name: false,
            destination: None,
            upload: UploadConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

fn default_base_url() -> String {
    "https://crm.zoho.com/crm/private/json".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("exports")
}

fn default_file_type() -> String {
    "json".to_string()
}

fn default_lines_per_file() -> usize {
    1000
}

impl ExportConfig {
    /// Load configuration from a YAML file and apply env fallbacks
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let mut config: Self = serde_yaml::from_str(&text)?;
        config.apply_env();
        Ok(config)
    }

    /// Fill secrets from the environment when the file left them out
    pub fn apply_env(&mut self) {
        if self.auth_token.is_none() {
            if let Ok(token) = std::env::var(AUTH_TOKEN_ENV) {
                if !token.is_empty() {
                    self.auth_token = Some(token);
                }
            }
        }
    }

    /// The auth token, or a fail-fast config error
    pub fn require_auth_token(&self) -> Result<&str> {
        self.auth_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::missing_field("auth_token"))
    }

    /// Validate everything a full run needs, before any crawl work
    pub fn validate(&self) -> Result<()> {
        self.require_auth_token()?;

        if self.destination.as_deref().map_or(true, str::is_empty) {
            return Err(Error::missing_field("destination"));
        }
        if self.lines_per_file == 0 {
            return Err(Error::config("lines_per_file must be at least 1"));
        }
        if self.file_type.is_empty() || self.file_type.contains('.') {
            return Err(Error::config(
                "file_type must be a bare extension, e.g. \"json\"",
            ));
        }
        if self.upload.attempts == 0 {
            return Err(Error::config("upload.attempts must be at least 1"));
        }
        Ok(())
    }
}

// ============================================================================
// Module Allow-List
// ============================================================================

/// Module allow-list: the `ALL` sentinel, one name, or a list of names
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModuleFilter {
    /// A single module name, or the `ALL` sentinel
    One(String),
    /// An explicit list of module names
    Many(Vec<String>),
}

impl Default for ModuleFilter {
    fn default() -> Self {
        Self::One(ALL_MODULES.to_string())
    }
}

impl ModuleFilter {
    /// Check whether the filter passes every module
    pub fn is_all(&self) -> bool {
        match self {
            Self::One(name) => name.eq_ignore_ascii_case(ALL_MODULES),
            Self::Many(names) => names
                .iter()
                .any(|n| n.eq_ignore_ascii_case(ALL_MODULES)),
        }
    }

    /// Check whether a module passes the allow-list
    pub fn allows(&self, module: &str) -> bool {
        if self.is_all() {
            return true;
        }
        match self {
            Self::One(name) => name == module,
            Self::Many(names) => names.iter().any(|n| n == module),
        }
    }
}

// ============================================================================
// Upload Config
// ============================================================================

/// Transfer tuning for the upload dispatcher
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UploadConfig {
    /// Attempts per file before it is skipped
    #[serde(default = "default_upload_attempts")]
    pub attempts: u32,

    /// Initial delay between attempts, in milliseconds (doubles each retry)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            attempts: default_upload_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_upload_attempts() -> u32 {
    10
}

fn default_retry_delay_ms() -> u64 {
    500
}

// ============================================================================
// HTTP Config
// ============================================================================

/// Tuning for the HTTP fetch substrate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries per request for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Token-bucket fill rate
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Token-bucket burst size
    #[serde(default = "default_burst_size")]
    pub burst_size: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            requests_per_second: default_requests_per_second(),
            burst_size: default_burst_size(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_requests_per_second() -> u32 {
    10
}

fn default_burst_size() -> u32 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_yaml() -> &'static str {
        r"
auth_token: abc123
destination: s3://zoho-crm-api-dev/exports
"
    }

    #[test]
    fn test_defaults() {
        let config = ExportConfig::default();
        assert_eq!(config.base_url, "https://crm.zoho.com/crm/private/json");
        assert_eq!(config.lines_per_file, 1000);
        assert_eq!(config.file_type, "json");
        assert!(!config.include_module_name);
        assert!(config.max_records.is_none());
        assert!(config.modules.is_all());
        assert_eq!(config.upload.attempts, 10);
        assert_eq!(config.http.max_retries, 3);
    }

    #[test]
    fn test_parse_minimal_yaml() {
        let config: ExportConfig = serde_yaml::from_str(minimal_yaml()).unwrap();
        assert_eq!(config.auth_token.as_deref(), Some("abc123"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_yaml() {
        let yaml = r"
auth_token: abc123
modules: [Contacts, Leads]
last_modified_time: '2016-07-11 00:00:00'
max_records: 750
lines_per_file: 250
include_module_name: true
destination: s3://zoho-crm-api-dev/exports
upload:
  attempts: 5
http:
  max_retries: 1
";
        let config: ExportConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.max_records, Some(750));
        assert!(config.max_deleted_records.is_none());
        assert_eq!(config.lines_per_file, 250);
        assert_eq!(config.upload.attempts, 5);
        assert_eq!(config.http.max_retries, 1);
        assert!(config.modules.allows("Contacts"));
        assert!(!config.modules.allows("Accounts"));
    }

    #[test]
    fn test_validate_requires_auth_and_destination() {
        let mut config = ExportConfig::default();
        assert!(matches!(
            config.validate(),
            Err(Error::MissingConfigField { .. })
        ));

        config.auth_token = Some("abc".to_string());
        assert!(matches!(
            config.validate(),
            Err(Error::MissingConfigField { .. })
        ));

        config.destination = Some("exports-local".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config: ExportConfig = serde_yaml::from_str(minimal_yaml()).unwrap();
        config.lines_per_file = 0;
        assert!(config.validate().is_err());

        let mut config: ExportConfig = serde_yaml::from_str(minimal_yaml()).unwrap();
        config.file_type = ".json".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_module_filter_all_sentinel() {
        let all = ModuleFilter::One("all".to_string());
        assert!(all.is_all());
        assert!(all.allows("Anything"));

        let mixed = ModuleFilter::Many(vec!["Contacts".to_string(), "ALL".to_string()]);
        assert!(mixed.is_all());
    }

    #[test]
    fn test_module_filter_exact_names() {
        let filter = ModuleFilter::Many(vec!["Contacts".to_string()]);
        assert!(filter.allows("Contacts"));
        assert!(!filter.allows("contacts"));
        assert!(!filter.allows("Leads"));

        let one = ModuleFilter::One("Leads".to_string());
        assert!(one.allows("Leads"));
        assert!(!one.allows("Contacts"));
    }
}
