//! Engine configuration
//!
//! Everything the interceptor needs besides the persisted page size: which
//! endpoint is in scope, the enlargement gate, follow-up limits, export
//! settings and transport tuning. Loadable from YAML; every field has a
//! default so an empty document is a valid config.

use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Engine Config
// ============================================================================

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Path segment identifying the list endpoint
    #[serde(default = "default_endpoint_segment")]
    pub endpoint_segment: String,

    /// Page size used when none has been persisted
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,

    /// Desired sizes at or above this enable enlargement
    #[serde(default = "default_enable_threshold")]
    pub enable_threshold: u64,

    /// Follow-up requests allowed per aggregation run
    #[serde(default = "default_max_follow_up_pages")]
    pub max_follow_up_pages: usize,

    /// Unit for synthesized range headers
    #[serde(default = "default_range_unit")]
    pub range_unit: String,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub http: HttpConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint_segment: default_endpoint_segment(),
            default_page_size: default_page_size(),
            enable_threshold: default_enable_threshold(),
            max_follow_up_pages: default_max_follow_up_pages(),
            range_unit: default_range_unit(),
            export: ExportConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

fn default_endpoint_segment() -> String {
    "/_api/transactions".to_string()
}

fn default_page_size() -> u64 {
    50
}

fn default_enable_threshold() -> u64 {
    10_000
}

fn default_max_follow_up_pages() -> usize {
    500
}

fn default_range_unit() -> String {
    "transactions".to_string()
}

impl EngineConfig {
    /// Load a config from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(Error::Io)?;
        Self::from_yaml(&content)
    }

    /// Parse a config from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // an empty document deserializes as unit, not as a map
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.endpoint_segment.trim().is_empty() {
            return Err(Error::invalid_value("endpoint_segment", "must not be empty"));
        }
        if self.default_page_size == 0 {
            return Err(Error::invalid_value("default_page_size", "must be positive"));
        }
        if self.enable_threshold == 0 {
            return Err(Error::invalid_value("enable_threshold", "must be positive"));
        }
        if self.export.page_size == 0 {
            return Err(Error::invalid_value("export.page_size", "must be positive"));
        }
        if self.range_unit.trim().is_empty() {
            return Err(Error::invalid_value("range_unit", "must not be empty"));
        }
        Ok(())
    }

    /// Whether a desired page size turns enlargement on
    pub fn is_enabled_for(&self, desired: u64) -> bool {
        desired >= self.enable_threshold
    }

    /// Matcher for the configured endpoint
    pub fn matcher(&self) -> Result<EndpointMatcher> {
        EndpointMatcher::new(&self.endpoint_segment)
    }
}

// ============================================================================
// Export Config
// ============================================================================

/// Export settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Page size requested while replaying for export
    #[serde(default = "default_export_page_size")]
    pub page_size: u64,

    /// File name prefix
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Name of the appended display-value column; `null` leaves it out
    #[serde(default = "default_derived_column")]
    pub derived_column: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            page_size: default_export_page_size(),
            file_prefix: default_file_prefix(),
            derived_column: default_derived_column(),
        }
    }
}

fn default_export_page_size() -> u64 {
    10_000
}

fn default_file_prefix() -> String {
    "transactions".to_string()
}

fn default_derived_column() -> Option<String> {
    Some("Display Amount".to_string())
}

// ============================================================================
// HTTP Config
// ============================================================================

/// HTTP transport configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum number of retries
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Requests per second, 0 disables rate limiting
    #[serde(default = "default_rps")]
    pub requests_per_second: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            requests_per_second: default_rps(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_rps() -> u32 {
    10
}

impl HttpConfig {
    /// Build the client configuration
    pub fn client_config(&self) -> HttpClientConfig {
        let builder = HttpClientConfig::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .max_retries(self.max_retries);
        let builder = if self.requests_per_second == 0 {
            builder.no_rate_limit()
        } else {
            builder.rate_limit(RateLimiterConfig::new(
                self.requests_per_second,
                self.requests_per_second,
            ))
        };
        builder.build()
    }
}

// ============================================================================
// Endpoint Matcher
// ============================================================================

/// Decides whether a URL targets the list endpoint.
///
/// The segment matches case-insensitively anywhere in the path and must end
/// at a word boundary, so `/_api/transactions/summary` matches but
/// `/_api/transactionsummary` does not.
#[derive(Debug, Clone)]
pub struct EndpointMatcher {
    pattern: Regex,
}

impl EndpointMatcher {
    pub fn new(segment: &str) -> Result<Self> {
        let pattern = RegexBuilder::new(&format!(r"{}\b", regex::escape(segment)))
            .case_insensitive(true)
            .build()?;
        Ok(Self { pattern })
    }

    /// Whether the URL's path is in scope
    pub fn matches(&self, url: &url::Url) -> bool {
        self.pattern.is_match(url.path())
    }
}
