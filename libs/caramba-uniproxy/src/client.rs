use crate::config::ClientConfig;
use crate::error::{PanelError, Result};
use crate::model::{NodeInfo, NodeType};
use crate::node::parse_node_info;
use reqwest::header::{ETAG, IF_NONE_MATCH};
use reqwest::{Client, StatusCode};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

pub const CONFIG_PATH: &str = "/api/v1/server/UniProxy/config";

/// Longest response body excerpt kept in a status error.
const ERROR_BODY_LIMIT: usize = 256;

/// Fetches node configuration from a UniProxy-compatible panel.
///
/// The last entity tag is cached on the client and sent back as
/// `If-None-Match`. Fetches on one client are serialized so that the tag
/// always belongs to the most recent successful response.
pub struct UniProxyClient {
    client: Client,
    config_url: Url,
    node_id: i64,
    node_type: NodeType,
    token: String,
    etag: Mutex<String>,
}

impl UniProxyClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut builder = Client::builder().timeout(config.timeout());
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        let client = builder
            .build()
            .map_err(|e| PanelError::Config(format!("failed to build http client: {}", e)))?;
        Self::with_http_client(client, config)
    }

    /// Use a caller-provided HTTP client; its timeout and TLS settings apply.
    pub fn with_http_client(client: Client, config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let node_type = config.parsed_node_type();
        let base = config.base_url()?;

        let mut config_url = Url::parse(&format!("{}{}", base.as_str().trim_end_matches('/'), CONFIG_PATH))
            .map_err(|e| PanelError::Config(format!("config url: {}", e)))?;
        config_url
            .query_pairs_mut()
            .append_pair("node_type", node_type.as_str())
            .append_pair("node_id", &config.node_id.to_string())
            .append_pair("token", &config.api_key);

        Ok(Self {
            client,
            config_url,
            node_id: config.node_id,
            node_type,
            token: config.api_key,
            etag: Mutex::new(String::new()),
        })
    }

    pub fn node_id(&self) -> i64 {
        self.node_id
    }

    pub fn node_type(&self) -> &NodeType {
        &self.node_type
    }

    /// Entity tag of the last successful fetch, empty before the first one.
    pub async fn etag(&self) -> String {
        self.etag.lock().await.clone()
    }

    /// Fetch the node config.
    ///
    /// Returns `Ok(None)` when the panel answers 304 Not Modified. The cached
    /// entity tag only changes after a 2xx response parsed successfully.
    pub async fn get_node_info(&self) -> Result<Option<NodeInfo>> {
        let mut etag = self.etag.lock().await;

        let mut request = self.client.get(self.config_url.clone());
        if !etag.is_empty() {
            request = request.header(IF_NONE_MATCH, etag.as_str());
        }

        debug!("Fetching node {} ({}) config, etag {:?}", self.node_id, self.node_type, *etag);
        // The URL carries the node token, keep it out of errors and logs.
        let response = request.send().await.map_err(|source| PanelError::Transport {
            path: CONFIG_PATH.to_string(),
            source: source.without_url(),
        })?;

        let status = response.status();
        if status == StatusCode::NOT_MODIFIED {
            debug!("Node {} config not modified", self.node_id);
            return Ok(None);
        }

        let new_etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Panel returned {} for node {} config", status, self.node_id);
            return Err(PanelError::Status {
                path: CONFIG_PATH.to_string(),
                status: status.as_u16(),
                body: truncate_body(body.trim()),
            });
        }

        let body = response.bytes().await.map_err(|source| PanelError::Transport {
            path: CONFIG_PATH.to_string(),
            source: source.without_url(),
        })?;

        let node = parse_node_info(self.node_id, self.node_type.clone(), &self.token, &body)?;
        info!(
            "Fetched node {} ({}) config: {}:{}, etag {:?}",
            self.node_id, self.node_type, node.host, node.port, new_etag
        );
        *etag = new_etag;
        Ok(Some(node))
    }
}

fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn config_url_carries_node_identity() {
        let config = ClientConfig::new("https://panel.example.com/", 7, "Vless", "k&y");
        let client = UniProxyClient::with_http_client(Client::new(), config).unwrap();
        assert_eq!(
            client.config_url.as_str(),
            "https://panel.example.com/api/v1/server/UniProxy/config?node_type=vless&node_id=7&token=k%26y"
        );
        assert_eq!(client.node_type(), &NodeType::Vless);
        assert_eq!(client.node_id(), 7);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ClientConfig::new("not a url", 7, "vless", "k");
        let err = UniProxyClient::new(config).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(ERROR_BODY_LIMIT + 10);
        let short = truncate_body(&body);
        assert_eq!(short.len(), ERROR_BODY_LIMIT + 3);
        assert!(short.ends_with("..."));
        assert_eq!(truncate_body("oops"), "oops");
    }

    #[tokio::test]
    async fn etag_starts_empty() {
        let config = ClientConfig::new("http://127.0.0.1:1", 1, "trojan", "k");
        let client = UniProxyClient::with_http_client(Client::new(), config).unwrap();
        assert_eq!(client.etag().await, "");
    }
}
