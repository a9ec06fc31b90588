//! Application configuration for billtrack.
//!
//! User config lives at `~/.billtrack/billtrack.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{BilltrackError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "billtrack.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".billtrack";

// ---------------------------------------------------------------------------
// Config structs (matching billtrack.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Upstream catalog location.
    #[serde(default)]
    pub source: SourceSection,

    /// CSS selectors for the listing and detail documents.
    #[serde(default)]
    pub selectors: SelectorConfig,

    /// Fetch behaviour.
    #[serde(default)]
    pub crawl: CrawlSection,

    /// Snapshot location.
    #[serde(default)]
    pub store: StoreSection,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerSection,
}

/// `[source]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSection {
    /// Origin every relative link is resolved against.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the listing document under `base_url`.
    #[serde(default = "default_listing_path")]
    pub listing_path: String,
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            listing_path: default_listing_path(),
        }
    }
}

fn default_base_url() -> String {
    "https://prsindia.org".into()
}
fn default_listing_path() -> String {
    "/billtrack/".into()
}

/// `[selectors]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Repeated row structure inside the listing container.
    #[serde(default = "default_row_selector")]
    pub row: String,

    /// Status node, scoped to a row.
    #[serde(default = "default_status_selector")]
    pub status: String,

    /// Case-sensitive suffix an anchor's href must end with on a detail page.
    #[serde(default = "default_document_suffix")]
    pub document_suffix: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            row: default_row_selector(),
            status: default_status_selector(),
            document_suffix: default_document_suffix(),
        }
    }
}

fn default_row_selector() -> String {
    ".view-content .views-row".into()
}
fn default_status_selector() -> String {
    ".views-field-field-bill-status".into()
}
fn default_document_suffix() -> String {
    ".pdf".into()
}

/// `[crawl]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSection {
    /// Maximum concurrent detail fetches.
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Ask upstream caches not to serve stored responses.
    #[serde(default = "default_true")]
    pub no_cache: bool,
}

impl Default for CrawlSection {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            timeout_secs: default_timeout_secs(),
            no_cache: true,
        }
    }
}

fn default_concurrency() -> u32 {
    4
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_true() -> bool {
    true
}

/// `[store]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSection {
    /// Directory holding the snapshot file.
    #[serde(default = "default_store_dir")]
    pub dir: String,

    /// Fixed snapshot file name, overwritten on every run.
    #[serde(default = "default_snapshot_name")]
    pub snapshot_name: String,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            dir: default_store_dir(),
            snapshot_name: default_snapshot_name(),
        }
    }
}

fn default_store_dir() -> String {
    "var/snapshots".into()
}
fn default_snapshot_name() -> String {
    "bills.json".into()
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    /// Socket address the HTTP server binds to.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".into()
}

// ---------------------------------------------------------------------------
// Runtime configs (validated, derived from AppConfig)
// ---------------------------------------------------------------------------

/// Where to scrape and how to read what comes back.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Origin relative hrefs are resolved against.
    pub origin: Url,
    /// Absolute URL of the listing document.
    pub listing_url: Url,
    /// Selectors used by the extractors.
    pub selectors: SelectorConfig,
}

impl SourceConfig {
    /// Build a source config from a base URL and listing path, with default selectors.
    pub fn new(base_url: &str, listing_path: &str) -> Result<Self> {
        let origin = Url::parse(base_url).map_err(|e| {
            BilltrackError::validation(format!("invalid base_url '{base_url}': {e}"))
        })?;
        if origin.cannot_be_a_base() || !matches!(origin.scheme(), "http" | "https") {
            return Err(BilltrackError::validation(format!(
                "base_url must be an http(s) origin: {base_url}"
            )));
        }
        let listing_url = origin.join(listing_path).map_err(|e| {
            BilltrackError::validation(format!("invalid listing_path '{listing_path}': {e}"))
        })?;

        Ok(Self {
            origin,
            listing_url,
            selectors: SelectorConfig::default(),
        })
    }

    /// Replace the selectors.
    pub fn with_selectors(mut self, selectors: SelectorConfig) -> Self {
        self.selectors = selectors;
        self
    }
}

impl TryFrom<&AppConfig> for SourceConfig {
    type Error = BilltrackError;

    fn try_from(config: &AppConfig) -> Result<Self> {
        Ok(Self::new(&config.source.base_url, &config.source.listing_path)?
            .with_selectors(config.selectors.clone()))
    }
}

/// Runtime fetch configuration.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Worker pool size for the detail phase (always at least 1).
    pub concurrency: usize,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Send no-cache request headers.
    pub no_cache: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        let crawl = CrawlSection::default();
        Self {
            concurrency: crawl.concurrency as usize,
            timeout: Duration::from_secs(crawl.timeout_secs),
            no_cache: crawl.no_cache,
        }
    }
}

impl TryFrom<&AppConfig> for CrawlConfig {
    type Error = BilltrackError;

    /// Concurrency is clamped to at least 1; a zero timeout is rejected.
    fn try_from(config: &AppConfig) -> Result<Self> {
        if config.crawl.timeout_secs == 0 {
            return Err(BilltrackError::validation("crawl.timeout_secs must be at least 1"));
        }

        Ok(Self {
            concurrency: config.crawl.concurrency.max(1) as usize,
            timeout: Duration::from_secs(config.crawl.timeout_secs),
            no_cache: config.crawl.no_cache,
        })
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.billtrack/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| BilltrackError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.billtrack/billtrack.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| BilltrackError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| BilltrackError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| BilltrackError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| BilltrackError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| BilltrackError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("base_url"));
        assert!(toml_str.contains("https://prsindia.org"));
        assert!(toml_str.contains(".view-content .views-row"));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let toml_str = r#"
[source]
base_url = "https://example.org"

[crawl]
concurrency = 8
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.source.base_url, "https://example.org");
        assert_eq!(config.source.listing_path, "/billtrack/");
        assert_eq!(config.crawl.concurrency, 8);
        assert_eq!(config.crawl.timeout_secs, 30);
        assert!(config.crawl.no_cache);
        assert_eq!(config.store.snapshot_name, "bills.json");
    }

    #[test]
    fn source_config_from_defaults() {
        let source = SourceConfig::try_from(&AppConfig::default()).expect("valid defaults");
        assert_eq!(source.origin.as_str(), "https://prsindia.org/");
        assert_eq!(source.listing_url.as_str(), "https://prsindia.org/billtrack/");
        assert_eq!(source.selectors.document_suffix, ".pdf");
    }

    #[test]
    fn source_config_rejects_bad_origin() {
        assert!(SourceConfig::new("not a url", "/billtrack/").is_err());
        assert!(SourceConfig::new("mailto:someone@example.org", "/").is_err());
    }

    #[test]
    fn crawl_config_clamps_concurrency() {
        let mut app = AppConfig::default();
        app.crawl.concurrency = 0;
        let crawl = CrawlConfig::try_from(&app).expect("valid crawl config");
        assert_eq!(crawl.concurrency, 1);
        assert_eq!(crawl.timeout, Duration::from_secs(30));
    }

    #[test]
    fn crawl_config_rejects_zero_timeout() {
        let mut app = AppConfig::default();
        app.crawl.timeout_secs = 0;
        let err = CrawlConfig::try_from(&app).unwrap_err();
        assert!(matches!(err, BilltrackError::Validation { .. }));
    }
}
