//! Configuration for a Chisel source run.

use serde::{Deserialize, Serialize};

/// Default prefix for canonical type names.
pub const DEFAULT_TYPE_NAME: &str = "Chisel";

/// Missing or invalid settings. The run never starts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    /// A required setting is empty
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    /// A setting has an unusable value
    #[error("Invalid setting {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    /// Config file could not be parsed
    #[error("Failed to parse config: {0}")]
    Parse(String),
}

/// Connection and naming settings for one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Parse Server base URL (e.g. `https://cms.example.com/parse`)
    pub server_url: String,
    /// Parse application id
    pub app_id: String,
    /// Parse master key
    pub master_key: String,
    /// Site whose content is loaded
    pub site_id: String,
    /// Prefix for canonical type names
    pub type_name: String,
    /// Content environment label
    pub environment: String,
    /// Rows requested per page
    pub page_size: usize,
    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            app_id: String::new(),
            master_key: String::new(),
            site_id: String::new(),
            type_name: DEFAULT_TYPE_NAME.to_string(),
            environment: "master".to_string(),
            page_size: 1000,
            request_timeout_secs: 30,
        }
    }
}

impl SourceConfig {
    /// Create a config with connection settings and defaults elsewhere.
    pub fn new(
        server_url: impl Into<String>,
        app_id: impl Into<String>,
        master_key: impl Into<String>,
        site_id: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            app_id: app_id.into(),
            master_key: master_key.into(),
            site_id: site_id.into(),
            ..Default::default()
        }
    }

    /// Builder: set the type name prefix.
    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = type_name.into();
        self
    }

    /// Builder: set the page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigurationError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigurationError::Parse(e.to_string()))
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Check that every required setting is present and usable.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.server_url.trim().is_empty() {
            return Err(ConfigurationError::Missing("server_url"));
        }
        if !self.server_url.starts_with("http://") && !self.server_url.starts_with("https://") {
            return Err(ConfigurationError::Invalid {
                name: "server_url",
                reason: format!("{:?} is not an http(s) URL", self.server_url),
            });
        }
        if self.app_id.trim().is_empty() {
            return Err(ConfigurationError::Missing("app_id"));
        }
        if self.master_key.trim().is_empty() {
            return Err(ConfigurationError::Missing("master_key"));
        }
        if self.site_id.trim().is_empty() {
            return Err(ConfigurationError::Missing("site_id"));
        }
        if self.page_size == 0 {
            return Err(ConfigurationError::Invalid {
                name: "page_size",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = SourceConfig::new("https://cms.example.com/parse", "app", "key", "site-1");
        assert!(config.validate().is_ok());
        assert_eq!(config.type_name, "Chisel");
        assert_eq!(config.page_size, 1000);
    }

    #[test]
    fn test_missing_site_id() {
        let config = SourceConfig::new("https://cms.example.com/parse", "app", "key", "");
        assert_eq!(config.validate(), Err(ConfigurationError::Missing("site_id")));
    }

    #[test]
    fn test_missing_credentials() {
        let config = SourceConfig::new("https://cms.example.com/parse", "", "key", "site");
        assert_eq!(config.validate(), Err(ConfigurationError::Missing("app_id")));

        let config = SourceConfig::new("https://cms.example.com/parse", "app", " ", "site");
        assert_eq!(config.validate(), Err(ConfigurationError::Missing("master_key")));
    }

    #[test]
    fn test_rejects_non_http_url() {
        let config = SourceConfig::new("ftp://cms", "app", "key", "site");
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::Invalid { name: "server_url", .. })
        ));
    }

    #[test]
    fn test_rejects_zero_page_size() {
        let config =
            SourceConfig::new("http://localhost:1337/parse", "app", "key", "site").with_page_size(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::Invalid { name: "page_size", .. })
        ));
    }

    #[test]
    fn test_yaml_fills_defaults() {
        let yaml = r#"
server_url: http://localhost:1337/parse
app_id: app
master_key: key
site_id: site-1
type_name: Site
"#;
        let config = SourceConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.type_name, "Site");
        assert_eq!(config.environment, "master");
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.validate().is_ok());

        let round = SourceConfig::from_yaml(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(round, config);
    }
}
