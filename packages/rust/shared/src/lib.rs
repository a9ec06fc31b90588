//! Shared types, error model, and configuration for billtrack.
//!
//! This crate is the foundation depended on by all other billtrack crates.
//! It provides:
//! - [`BilltrackError`]: the unified error type
//! - Domain types ([`Record`], [`PartialRecord`], [`ResolutionState`])
//! - Configuration ([`AppConfig`], [`SourceConfig`], [`CrawlConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CrawlConfig, CrawlSection, SelectorConfig, ServerSection, SourceConfig,
    SourceSection, StoreSection, config_dir, config_file_path, init_config, load_config,
    load_config_from,
};
pub use error::{BilltrackError, Result};
pub use types::{PartialRecord, Record, ResolutionState};
