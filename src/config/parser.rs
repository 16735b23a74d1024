use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use ycrawler::config::load_config;
///
/// let config = load_config(Path::new("ycrawler.toml")).unwrap();
/// println!("Top stories: {}", config.crawler.top_news_count);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let (config, _) = load_config_with_hash(path)?;
    Ok(config)
}

/// Parses configuration from TOML text without validating it
///
/// Callers that apply command-line overrides validate the merged result.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Reads a configuration file once, returning the unvalidated config and the
/// SHA-256 of its content
///
/// The hash is logged at startup so archives can be matched with the
/// configuration that produced them.
///
/// # Returns
///
/// * `Ok((Config, String))` - Parsed configuration and hex-encoded hash
/// * `Err(ConfigError)` - Failed to read or parse the file
pub fn parse_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, hash_content(&content)))
}

/// Loads and validates a configuration, returning it with its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let (config, hash) = parse_config_with_hash(path)?;
    validate(&config)?;
    Ok((config, hash))
}

fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
