//! Configuration module for YCrawler
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key is optional, so the crawler also runs without a file.
//!
//! # Example
//!
//! ```no_run
//! use ycrawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("ycrawler.toml")).unwrap();
//! println!("Archiving into: {}", config.output.archive_root);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig, DEFAULT_SITE};

// Re-export parser functions
pub use parser::{load_config, load_config_with_hash, parse_config, parse_config_with_hash};
pub use validation::validate;
