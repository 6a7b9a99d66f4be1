//! Shared types, error model, and configuration for docsite.
//!
//! This crate is the foundation depended on by all other docsite crates.
//! It provides:
//! - [`DocsiteError`]: the unified error type
//! - Domain types ([`TocNode`], [`CategoryEntry`], [`DocumentRecord`])
//! - Configuration ([`AppConfig`] and its sections, config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DomainConfig, ExtractConfig, PinnedPage, RelocationConfig, SearchConfig,
    SiteConfig, TocConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from,
};
pub use error::{DocsiteError, Result};
pub use types::{
    CategoryEntry, DEFAULT_ID_HASH_THRESHOLD, DocumentRecord, TocDocument, TocNode, document_id,
};
