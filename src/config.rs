//! Configuration system
//!
//! Provides configuration management with:
//! - Config file loading (`basic` feature)
//! - Environment variable overrides
//! - Runtime defaults
//! - Validation, including the section catalog overrides
//!
//! The library never reads configuration on its own. The binary loads a
//! [`Config`] once and turns it into a [`Catalog`] and [`ParseOptions`] that
//! are passed to every parser explicitly.

use crate::catalog::{Catalog, SectionKind, SectionOverride};
use crate::extractor::MalformedLinePolicy;
use crate::parser::ParseOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Parsing configuration
    pub parsing: ParsingConfig,

    /// Output configuration
    pub output: OutputConfig,

    /// Paths configuration
    pub paths: PathsConfig,

    /// Per-section pattern replacements, keyed by kind (`CPU`, `MEM`, ...)
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub catalog: BTreeMap<SectionKind, SectionOverride>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingConfig {
    pub buffer_size_kb: usize,
    pub malformed_lines: MalformedLinePolicy,
    pub parallel: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart_marker: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub json_pretty: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub log_directory: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "WARN".to_string(),
                format: "pretty".to_string(),
                output: "console".to_string(),
            },
            parsing: ParsingConfig {
                buffer_size_kb: 64,
                malformed_lines: MalformedLinePolicy::Skip,
                parallel: true,
                restart_marker: None,
            },
            output: OutputConfig { json_pretty: true },
            paths: PathsConfig {
                log_directory: PathBuf::from("logs"),
            },
            catalog: BTreeMap::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Config::default().logging
    }
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Config::default().parsing
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Config::default().output
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Config::default().paths
    }
}

impl Config {
    /// Load configuration from defaults, file and environment, then validate
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        for path in Self::candidate_paths() {
            if path.exists() {
                info!(config_file = %path.display(), "Loading configuration from file");
                config = Self::load_from_file(&path)?;
                break;
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Files checked in order; the first one that exists wins
    pub fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("sar-parser.toml"), PathBuf::from(".sar-parser.toml")];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("sar-parser").join("config.toml"));
        }
        paths
    }

    /// Load configuration from a TOML file
    #[cfg(feature = "basic")]
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    #[cfg(not(feature = "basic"))]
    pub fn load_from_file(path: &Path) -> Result<Self> {
        anyhow::bail!(
            "Config file {} found but config file support is disabled (enable the `basic` feature)",
            path.display()
        )
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        // Logging overrides
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("LOG_OUTPUT") {
            self.logging.output = val;
        }

        // Parsing overrides
        if let Ok(val) = env::var("SAR_PARSER_BUFFER_SIZE_KB") {
            self.parsing.buffer_size_kb = val.parse()
                .context("Invalid SAR_PARSER_BUFFER_SIZE_KB")?;
        }
        if let Ok(val) = env::var("SAR_PARSER_MALFORMED_LINES") {
            self.parsing.malformed_lines = val.parse()
                .map_err(anyhow::Error::msg)
                .context("Invalid SAR_PARSER_MALFORMED_LINES")?;
        }
        if let Ok(val) = env::var("SAR_PARSER_PARALLEL") {
            self.parsing.parallel = val.parse()
                .context("Invalid SAR_PARSER_PARALLEL")?;
        }

        // Path overrides
        if let Ok(val) = env::var("SAR_PARSER_LOG_DIR") {
            self.paths.log_directory = PathBuf::from(val);
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.parsing.buffer_size_kb < 1 || self.parsing.buffer_size_kb > 1024 {
            return Err(anyhow::anyhow!(
                "Buffer size must be between 1KB and 1024KB, got {}KB",
                self.parsing.buffer_size_kb
            ));
        }

        if self.logging.level.trim().is_empty() {
            return Err(anyhow::anyhow!("Log level cannot be empty"));
        }

        // Catalog overrides must compile against the standard sections
        self.catalog().context("Invalid catalog configuration")?;

        Ok(())
    }

    /// Build the section catalog described by this configuration
    pub fn catalog(&self) -> Result<Catalog> {
        let mut catalog = Catalog::standard().with_overrides(&self.catalog)?;
        if let Some(marker) = &self.parsing.restart_marker {
            catalog = catalog.with_restart_marker(marker)?;
        }
        Ok(catalog)
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            buffer_size: self.parsing.buffer_size_kb * 1024,
            malformed_lines: self.parsing.malformed_lines,
            parallel: self.parsing.parallel,
        }
    }

    /// Save current configuration to file
    #[cfg(feature = "basic")]
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_toml()?)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        info!(path = %path.display(), "Configuration saved to file");

        Ok(())
    }

    #[cfg(feature = "basic")]
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "WARN");
        assert_eq!(config.parsing.buffer_size_kb, 64);
        assert_eq!(config.parsing.malformed_lines, MalformedLinePolicy::Skip);
        assert!(config.catalog.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.parsing.buffer_size_kb = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.parsing.restart_marker = Some("(REBOOT".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_options() {
        let mut config = Config::default();
        config.parsing.buffer_size_kb = 8;
        config.parsing.malformed_lines = MalformedLinePolicy::Abort;

        let options = config.parse_options();
        assert_eq!(options.buffer_size, 8192);
        assert_eq!(options.malformed_lines, MalformedLinePolicy::Abort);
    }

    #[cfg(feature = "basic")]
    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
[parsing]
buffer_size_kb = 16
malformed_lines = "abort"
parallel = false

[catalog.TASK.fields]
cswch = "^cswch/s$"
"#,
        )
        .unwrap();

        assert_eq!(config.parsing.buffer_size_kb, 16);
        assert_eq!(config.parsing.malformed_lines, MalformedLinePolicy::Abort);
        assert_eq!(config.logging, LoggingConfig::default());
        assert_eq!(config.catalog[&SectionKind::Task].fields["cswch"], "^cswch/s$");
        assert!(config.catalog().is_ok());
    }
}
