use crate::client::CONFIG_PATH;
use crate::de::{null_as_default, present_raw};
use crate::error::{PanelError, Result};
use crate::model::{ExtraConfig, NodeInfo, NodeType, RealityConfig, TlsSettings};
use crate::reality::derive_reality_key;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::value::RawValue;
use tracing::{debug, warn};

/// VLESS `tls` value selecting Reality.
const TLS_REALITY: i64 = 2;

#[derive(Debug, Deserialize)]
struct VmessNodeRsp {
    #[serde(default, deserialize_with = "null_as_default")]
    tls: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    network: String,
    #[serde(default, deserialize_with = "present_raw")]
    network_settings: Option<Box<RawValue>>,
}

#[derive(Debug, Deserialize)]
struct VlessNodeRsp {
    #[serde(default, deserialize_with = "null_as_default")]
    flow: String,
    #[serde(default, deserialize_with = "null_as_default")]
    tls: i64,
    #[serde(default)]
    tls_settings: Option<Box<RawValue>>,
    #[serde(default, deserialize_with = "null_as_default")]
    network: String,
    #[serde(default)]
    network_settings: Option<Box<RawValue>>,
}

#[derive(Debug, Deserialize)]
struct ShadowsocksNodeRsp {
    #[serde(default, deserialize_with = "null_as_default")]
    cipher: String,
    #[serde(default, deserialize_with = "null_as_default")]
    server_key: String,
}

#[derive(Debug, Deserialize)]
struct HysteriaNodeRsp {
    #[serde(default, deserialize_with = "null_as_default")]
    up_mbps: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    down_mbps: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    obfs: String,
}

fn decode<T: DeserializeOwned>(body: &[u8], node_type: &NodeType) -> Result<T> {
    serde_json::from_slice(body).map_err(|source| PanelError::DecodeProtocol {
        path: CONFIG_PATH.to_string(),
        protocol: node_type.to_string(),
        source,
    })
}

/// Fill the protocol-specific fields of `node` from the raw response body.
pub fn apply_protocol(node: &mut NodeInfo, body: &[u8], token: &str) -> Result<()> {
    match node.node_type.clone() {
        NodeType::Vmess => {
            let rsp: VmessNodeRsp = decode(body, &node.node_type)?;
            node.network = rsp.network;
            node.tls = rsp.tls == 1;
            node.extra_config = decode_extra(rsp.network_settings.as_deref())?;
            node.network_settings = rsp.network_settings.filter(|raw| raw.get() != "null");

            if node.extra_config.reality_enabled() {
                match node.extra_config.reality_config.as_mut() {
                    Some(reality) => {
                        reality.private_key = derive_reality_key(node.node_type.as_str(), token);
                    }
                    None => {
                        warn!("Node {} enables reality without reality_config, disabling", node.id);
                        node.extra_config.enable_reality = "false".to_string();
                    }
                }
            }
        }
        NodeType::Vless => {
            let rsp: VlessNodeRsp = decode(body, &node.node_type)?;
            node.network = rsp.network;
            node.network_settings = rsp.network_settings;
            node.tls = rsp.tls != 0;

            if rsp.tls == TLS_REALITY {
                node.tls_settings = decode_tls(rsp.tls_settings.as_deref())?;
                node.extra_config = ExtraConfig {
                    flow: rsp.flow,
                    enable_reality: "true".to_string(),
                    reality_config: Some(RealityConfig {
                        dest: node.tls_settings.server_port.to_string(),
                        server_names: vec![node.tls_settings.server_name.clone()],
                        short_ids: vec![node.tls_settings.short_id.clone()],
                        private_key: derive_reality_key(node.node_type.as_str(), token),
                        ..RealityConfig::default()
                    }),
                    ..ExtraConfig::default()
                };
            }
        }
        NodeType::Shadowsocks => {
            let rsp: ShadowsocksNodeRsp = decode(body, &node.node_type)?;
            node.cipher = rsp.cipher;
            node.server_key = rsp.server_key;
        }
        NodeType::Trojan => {
            node.tls = true;
        }
        NodeType::Hysteria => {
            let rsp: HysteriaNodeRsp = decode(body, &node.node_type)?;
            node.up_mbps = rsp.up_mbps;
            node.down_mbps = rsp.down_mbps;
            node.hy_obfs = rsp.obfs;
        }
        NodeType::Other(name) => {
            debug!("No protocol parser for node type {:?}", name);
        }
    }
    Ok(())
}

/// VMess network settings double as the extra config. An explicit `null`
/// means no extras; a missing key or any other shape fails.
fn decode_extra(raw: Option<&RawValue>) -> Result<ExtraConfig> {
    let result: std::result::Result<ExtraConfig, serde_json::Error> = match raw {
        Some(raw) if raw.get() == "null" => Ok(ExtraConfig::default()),
        Some(raw) => serde_json::from_str(raw.get()),
        None => Err(serde::de::Error::missing_field("network_settings")),
    };
    result.map_err(|source| PanelError::DecodeExtra {
        path: CONFIG_PATH.to_string(),
        source,
    })
}

fn decode_tls(raw: Option<&RawValue>) -> Result<TlsSettings> {
    let text = raw.map(RawValue::get).unwrap_or("null");
    serde_json::from_str(text).map_err(|source| PanelError::DecodeTls {
        path: CONFIG_PATH.to_string(),
        source,
    })
}
