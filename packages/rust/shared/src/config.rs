//! Application configuration for docsite.
//!
//! Lookup order: the file passed with `-c/--config`, then `./docsite.toml`,
//! then `~/.docsite/docsite.toml`, then built-in defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocsiteError, Result};
use crate::types::DEFAULT_ID_HASH_THRESHOLD;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "docsite.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docsite";

// ---------------------------------------------------------------------------
// Config structs (matching docsite.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Site rendering settings.
    #[serde(default)]
    pub site: SiteConfig,

    /// TOC normalization and category settings.
    #[serde(default)]
    pub toc: TocConfig,

    /// Fragment extraction settings.
    #[serde(default)]
    pub extract: ExtractConfig,

    /// Search service settings.
    #[serde(default)]
    pub search: SearchConfig,
}

/// `[site]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Label shown when a page belongs to no context.
    #[serde(default = "default_label")]
    pub default_label: String,

    /// Appended to every page `<title>`.
    #[serde(default = "default_title_suffix")]
    pub title_suffix: String,

    /// Pages that are not in the TOC but should look as if they were.
    #[serde(default = "default_pinned")]
    pub pinned: Vec<PinnedPage>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            default_label: default_label(),
            title_suffix: default_title_suffix(),
            pinned: default_pinned(),
        }
    }
}

fn default_label() -> String {
    "Legato Documentation".into()
}
fn default_title_suffix() -> String {
    " - Legato Docs".into()
}
fn default_pinned() -> Vec<PinnedPage> {
    vec![PinnedPage {
        file: "mangohDevelopers.html".into(),
        context: "Build Apps".into(),
        category: String::new(),
    }]
}

/// `[[site.pinned]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinnedPage {
    /// Filename relative to the HTML directory.
    pub file: String,
    /// Context the page is shown under.
    pub context: String,
    /// Category within the context (may be empty).
    #[serde(default)]
    pub category: String,
}

/// `[toc]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TocConfig {
    /// Nodes at this depth or deeper do not extend the breadcrumb path.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Labels ending in this suffix never extend the breadcrumb path.
    #[serde(default = "default_header_suffix")]
    pub header_suffix: String,

    /// Subtree move applied by `docsite toc --relocate`.
    #[serde(default)]
    pub relocation: RelocationConfig,
}

impl Default for TocConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            header_suffix: default_header_suffix(),
            relocation: RelocationConfig::default(),
        }
    }
}

fn default_max_depth() -> usize {
    3
}
fn default_header_suffix() -> String {
    ".h".into()
}

/// `[toc.relocation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelocationConfig {
    /// Label of the node to move.
    pub label: String,
    /// Label path from the root to the node's current parent (empty = root).
    #[serde(default)]
    pub from: Vec<String>,
    /// New label for the moved node.
    pub rename: String,
    /// Label path from the root to the new parent.
    pub to: Vec<String>,
}

impl Default for RelocationConfig {
    fn default() -> Self {
        Self {
            label: "Reference".into(),
            from: Vec::new(),
            rename: "C Prototypes".into(),
            to: vec!["Build Apps".into(), "API Guides".into()],
        }
    }
}

/// `[extract]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Page titles to replace, e.g. `Reference = "C Prototypes"`.
    #[serde(default = "default_title_renames")]
    pub title_renames: BTreeMap<String, String>,

    /// Regex matching the text of copyright paragraphs.
    #[serde(default = "default_copyright_pattern")]
    pub copyright_pattern: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            title_renames: default_title_renames(),
            copyright_pattern: default_copyright_pattern(),
        }
    }
}

fn default_title_renames() -> BTreeMap<String, String> {
    BTreeMap::from([("Reference".to_string(), "C Prototypes".to_string())])
}
fn default_copyright_pattern() -> String {
    r"\s?Copyright \(C\) Sierra Wireless Inc\.( Use of this work is subject to license\.)?\s?"
        .into()
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// HTTP timeout for search service requests.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum number of existing documents fetched when diffing.
    #[serde(default = "default_existing_limit")]
    pub existing_limit: usize,

    /// Filenames longer than this are hashed to form the document id.
    #[serde(default = "default_id_hash_threshold")]
    pub id_hash_threshold: usize,

    /// How many random pages to look up after an upload.
    #[serde(default = "default_self_test_count")]
    pub self_test_count: usize,

    /// Seconds to wait for indexing before the self-test.
    #[serde(default = "default_self_test_delay")]
    pub self_test_delay_secs: u64,

    /// Page (relative to the HTML dir) carrying the `doc-version` marker.
    #[serde(default = "default_version_page")]
    pub version_page: String,

    /// Known search domains and their endpoints.
    #[serde(default)]
    pub domains: Vec<DomainConfig>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            existing_limit: default_existing_limit(),
            id_hash_threshold: default_id_hash_threshold(),
            self_test_count: default_self_test_count(),
            self_test_delay_secs: default_self_test_delay(),
            version_page: default_version_page(),
            domains: Vec::new(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_existing_limit() -> usize {
    600
}
fn default_id_hash_threshold() -> usize {
    DEFAULT_ID_HASH_THRESHOLD
}
fn default_self_test_count() -> usize {
    5
}
fn default_self_test_delay() -> u64 {
    30
}
fn default_version_page() -> String {
    "aboutLegato.html".into()
}

/// `[[search.domains]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Domain name as given on the command line, e.g. `legato-16-04`.
    pub name: String,
    /// Document upload endpoint host (or full base URL).
    pub document_endpoint: String,
    /// Search endpoint host (or full base URL).
    pub search_endpoint: String,
}

impl SearchConfig {
    /// Look up a domain by name.
    pub fn domain(&self, name: &str) -> Result<&DomainConfig> {
        self.domains.iter().find(|d| d.name == name).ok_or_else(|| {
            let known: Vec<&str> = self.domains.iter().map(|d| d.name.as_str()).collect();
            DocsiteError::config(format!(
                "couldn't get endpoints for search domain '{name}' (configured: [{}])",
                known.join(", ")
            ))
        })
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.docsite/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DocsiteError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the user config file (`~/.docsite/docsite.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config.
///
/// An explicit path must exist. Without one, `./docsite.toml` and then the
/// user config file are tried; if neither exists the defaults are used.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        return load_config_from(path);
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return load_config_from(&local);
    }

    let path = config_file_path()?;
    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocsiteError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        DocsiteError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Write a default config file to `path` (or the user config location).
/// Returns the path to the created file.
pub fn init_config(path: Option<&Path>) -> Result<PathBuf> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_file_path()?,
    };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| DocsiteError::io(dir, e))?;
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DocsiteError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocsiteError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
