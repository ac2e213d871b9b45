use crate::client::CONFIG_PATH;
use crate::de::null_as_default;
use crate::error::{PanelError, Result};
use crate::interval::interval_to_duration;
use crate::model::{NodeInfo, NodeType};
use crate::protocol::apply_protocol;
use crate::routes::{Route, interpret_routes};
use serde::Deserialize;
use serde_json::Value;

/// Fields every node type shares.
#[derive(Debug, Deserialize)]
struct CommonNodeRsp {
    #[serde(default, deserialize_with = "null_as_default")]
    host: String,
    #[serde(default, deserialize_with = "null_as_default")]
    server_port: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    server_name: String,
    #[serde(default)]
    routes: Option<Vec<Route>>,
    #[serde(default)]
    base_config: Option<BaseConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct BaseConfig {
    #[serde(default)]
    push_interval: Value,
    #[serde(default)]
    pull_interval: Value,
}

/// Build a [`NodeInfo`] from a UniProxy config body.
///
/// The body is decoded twice: once for the common envelope and once for the
/// fields of `node_type`. `token` seeds the Reality key when one is needed.
pub fn parse_node_info(id: i64, node_type: NodeType, token: &str, body: &[u8]) -> Result<NodeInfo> {
    let common: CommonNodeRsp = serde_json::from_slice(body).map_err(|e| PanelError::DecodeCommon {
        path: CONFIG_PATH.to_string(),
        reason: e.to_string(),
    })?;

    let port = u16::try_from(common.server_port)
        .ok()
        .filter(|port| *port != 0)
        .ok_or_else(|| PanelError::DecodeCommon {
            path: CONFIG_PATH.to_string(),
            reason: format!("server_port {} out of range", common.server_port),
        })?;

    let (rules, raw_dns) = interpret_routes(common.routes.as_deref().unwrap_or_default())?;
    let base_config = common.base_config.unwrap_or_default();

    let mut node = NodeInfo::new(id, node_type);
    node.host = common.host;
    node.port = port;
    node.server_name = common.server_name;
    node.rules = rules;
    node.raw_dns = raw_dns;
    node.push_interval = interval_to_duration(&base_config.push_interval);
    node.pull_interval = interval_to_duration(&base_config.pull_interval);

    apply_protocol(&mut node, body, token)?;
    Ok(node)
}
