//! Configuration for chisel-sync
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::path::PathBuf;

use chisel_source::config::{ConfigurationError, SourceConfig, DEFAULT_TYPE_NAME};

/// chisel-sync - pull a Chisel site into a JSON node graph
#[derive(Parser, Debug, Clone)]
#[command(name = "chisel-sync")]
#[command(about = "Load a Chisel site's content types and published entries as graph nodes")]
pub struct Args {
    /// YAML config file; command-line values override its settings
    #[arg(long, env = "CHISEL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Parse Server base URL
    #[arg(long, env = "PARSE_SERVER_URL")]
    pub server_url: Option<String>,

    /// Parse application id
    #[arg(long, env = "PARSE_APP_ID")]
    pub app_id: Option<String>,

    /// Parse master key
    #[arg(long, env = "PARSE_MASTER_KEY", hide_env_values = true)]
    pub master_key: Option<String>,

    /// Site to load
    #[arg(long, env = "CHISEL_SITE_ID")]
    pub site_id: Option<String>,

    /// Prefix for canonical type names
    #[arg(long, env = "CHISEL_TYPE_NAME")]
    pub type_name: Option<String>,

    /// Rows requested per page
    #[arg(long, env = "CHISEL_PAGE_SIZE")]
    pub page_size: Option<usize>,

    /// Write the node graph here instead of stdout
    #[arg(long, short, env = "CHISEL_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Merge the config file (if any) with command-line overrides.
    pub fn source_config(&self) -> Result<SourceConfig, ConfigurationError> {
        let mut config = match &self.config {
            Some(path) => {
                let yaml = std::fs::read_to_string(path).map_err(|e| {
                    ConfigurationError::Parse(format!("{}: {}", path.display(), e))
                })?;
                SourceConfig::from_yaml(&yaml)?
            }
            None => SourceConfig::default(),
        };

        if let Some(server_url) = &self.server_url {
            config.server_url = server_url.clone();
        }
        if let Some(app_id) = &self.app_id {
            config.app_id = app_id.clone();
        }
        if let Some(master_key) = &self.master_key {
            config.master_key = master_key.clone();
        }
        if let Some(site_id) = &self.site_id {
            config.site_id = site_id.clone();
        }
        if let Some(type_name) = &self.type_name {
            config.type_name = type_name.clone();
        }
        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
        }
        if config.type_name.trim().is_empty() {
            config.type_name = DEFAULT_TYPE_NAME.to_string();
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Args as if no flag, file or environment variable were set.
    fn bare_args() -> Args {
        Args {
            config: None,
            server_url: None,
            app_id: None,
            master_key: None,
            site_id: None,
            type_name: None,
            page_size: None,
            output: None,
            log_level: "info".to_string(),
        }
    }

    fn credentials() -> Args {
        Args {
            server_url: Some("http://localhost:1337/parse".to_string()),
            app_id: Some("app".to_string()),
            master_key: Some("key".to_string()),
            ..bare_args()
        }
    }

    #[test]
    fn test_flags_are_parsed() {
        let args = Args::try_parse_from([
            "chisel-sync",
            "--server-url",
            "http://localhost:1337/parse",
            "--site-id",
            "site-1",
            "--page-size",
            "50",
        ])
        .unwrap();

        assert_eq!(args.server_url.as_deref(), Some("http://localhost:1337/parse"));
        assert_eq!(args.site_id.as_deref(), Some("site-1"));
        assert_eq!(args.page_size, Some(50));
    }

    #[test]
    fn test_args_build_config() {
        let args = Args {
            site_id: Some("site-1".to_string()),
            ..credentials()
        };

        let config = args.source_config().unwrap();
        assert_eq!(config.site_id, "site-1");
        assert_eq!(config.type_name, "Chisel");
    }

    #[test]
    fn test_blank_type_name_falls_back_to_default() {
        let args = Args {
            site_id: Some("site-1".to_string()),
            type_name: Some("  ".to_string()),
            ..credentials()
        };

        assert_eq!(args.source_config().unwrap().type_name, DEFAULT_TYPE_NAME);
    }

    #[test]
    fn test_missing_credentials_rejected() {
        assert_eq!(
            credentials().source_config(),
            Err(ConfigurationError::Missing("site_id"))
        );
    }
}
