use crate::error::{PanelError, Result};
use crate::model::NodeType;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

fn default_timeout() -> u64 {
    30
}

/// Connection settings for one node against one panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Panel URL (e.g. https://panel.example.com)
    pub api_host: String,
    pub node_id: i64,
    pub node_type: String,
    /// Shared secret the panel issued for this node.
    pub api_key: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl ClientConfig {
    pub fn new(api_host: impl Into<String>, node_id: i64, node_type: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_host: api_host.into(),
            node_id,
            node_type: node_type.into(),
            api_key: api_key.into(),
            timeout: default_timeout(),
            user_agent: None,
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).map_err(|e| PanelError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.base_url()?;
        if self.node_id <= 0 {
            return Err(PanelError::Config(format!("node_id must be positive, got {}", self.node_id)));
        }
        if self.node_type.trim().is_empty() {
            return Err(PanelError::Config("node_type is empty".to_string()));
        }
        if self.api_key.trim().is_empty() {
            return Err(PanelError::Config("api_key is empty".to_string()));
        }
        if self.timeout == 0 {
            return Err(PanelError::Config("timeout must be at least 1 second".to_string()));
        }
        Ok(())
    }

    /// Panel URL with surrounding whitespace and trailing slashes removed.
    pub fn base_url(&self) -> Result<Url> {
        let host = self.api_host.trim().trim_end_matches('/');
        let url = Url::parse(host).map_err(|e| PanelError::Config(format!("api_host {:?}: {}", self.api_host, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(PanelError::Config(format!(
                "api_host must be http or https, got {}",
                url.scheme()
            )));
        }
        Ok(url)
    }

    pub fn parsed_node_type(&self) -> NodeType {
        NodeType::from(self.node_type.as_str())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}
