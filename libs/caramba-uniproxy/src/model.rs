use crate::de::null_as_default;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::value::RawValue;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Node protocol as configured on the caller side.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeType {
    Vmess,
    Vless,
    Shadowsocks,
    Trojan,
    Hysteria,
    /// Any name the panel client does not know how to parse.
    Other(String),
}

impl NodeType {
    pub fn as_str(&self) -> &str {
        match self {
            NodeType::Vmess => "vmess",
            NodeType::Vless => "vless",
            NodeType::Shadowsocks => "shadowsocks",
            NodeType::Trojan => "trojan",
            NodeType::Hysteria => "hysteria",
            NodeType::Other(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, NodeType::Other(_))
    }
}

impl From<&str> for NodeType {
    fn from(value: &str) -> Self {
        let name = value.trim().to_lowercase();
        match name.as_str() {
            "vmess" => NodeType::Vmess,
            "vless" => NodeType::Vless,
            "shadowsocks" => NodeType::Shadowsocks,
            "trojan" => NodeType::Trojan,
            "hysteria" => NodeType::Hysteria,
            _ => NodeType::Other(name),
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NodeType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Normalized node descriptor handed to the proxy engines.
#[derive(Debug, Clone, Serialize)]
pub struct NodeInfo {
    pub id: i64,
    pub node_type: NodeType,
    pub host: String,
    pub port: u16,
    pub server_name: String,
    pub network: String,
    /// Transport settings exactly as the panel sent them.
    pub network_settings: Option<Box<RawValue>>,
    pub tls: bool,
    pub tls_settings: TlsSettings,
    pub extra_config: ExtraConfig,
    pub cipher: String,
    pub server_key: String,
    pub up_mbps: u64,
    pub down_mbps: u64,
    pub hy_obfs: String,
    pub rules: Rules,
    pub raw_dns: RawDns,
    pub push_interval: Duration,
    pub pull_interval: Duration,
}

impl NodeInfo {
    /// Empty descriptor for the given identity; every protocol field at zero.
    pub fn new(id: i64, node_type: NodeType) -> Self {
        Self {
            id,
            node_type,
            host: String::new(),
            port: 0,
            server_name: String::new(),
            network: String::new(),
            network_settings: None,
            tls: false,
            tls_settings: TlsSettings::default(),
            extra_config: ExtraConfig::default(),
            cipher: String::new(),
            server_key: String::new(),
            up_mbps: 0,
            down_mbps: 0,
            hy_obfs: String::new(),
            rules: Rules::default(),
            raw_dns: RawDns::default(),
            push_interval: Duration::ZERO,
            pull_interval: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Rules {
    pub regexp: Vec<String>,
    pub protocol: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsServer {
    pub address: String,
    pub domains: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawDns {
    /// Keyed by the position of the route that produced the entry.
    pub dns_map: HashMap<String, DnsServer>,
    pub dns_json: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsSettings {
    #[serde(deserialize_with = "null_as_default")]
    pub server_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub server_port: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub short_id: String,
}

/// Extra inbound options. Boolean switches stay strings because the
/// engines compare them as `"true"` / `"false"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtraConfig {
    pub enable_vless: String,
    pub flow: String,
    pub enable_reality: String,
    pub reality_config: Option<RealityConfig>,
}

impl Default for ExtraConfig {
    fn default() -> Self {
        Self {
            enable_vless: "false".to_string(),
            flow: String::new(),
            enable_reality: "false".to_string(),
            reality_config: None,
        }
    }
}

impl ExtraConfig {
    pub fn reality_enabled(&self) -> bool {
        self.enable_reality == "true"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct RealityConfig {
    pub dest: String,
    pub xver: String,
    pub server_names: Vec<String>,
    /// base64url without padding, 32 bytes once decoded.
    pub private_key: String,
    pub min_client_ver: String,
    pub max_client_ver: String,
    pub max_time_diff: String,
    pub short_ids: Vec<String>,
}
