//! Configuration module for Normativa-Scraper
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every setting has a built-in default, so the configuration file is optional.
//!
//! # Example
//!
//! ```no_run
//! use normativa_scraper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("normativa.toml")).unwrap();
//! println!("Crawling {} SII categories", config.sii.categories.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, FilterConfig, LeyChileConfig, OutputConfig, SchemaConfig, ScraperConfig,
    SiiCategoryConfig, SiiConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_or_default, load_config_with_hash, parse_config,
};
pub use validation::validate;
