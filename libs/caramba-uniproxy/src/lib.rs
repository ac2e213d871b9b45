//! Client for the UniProxy node config API exposed by the panel.
//!
//! [`UniProxyClient::get_node_info`] fetches `/api/v1/server/UniProxy/config`
//! and turns the per-protocol response into a [`NodeInfo`].

pub mod client;
pub mod config;
mod de;
pub mod error;
pub mod interval;
pub mod model;
pub mod node;
pub mod protocol;
pub mod reality;
pub mod routes;

pub use client::{CONFIG_PATH, UniProxyClient};
pub use config::ClientConfig;
pub use error::{ErrorKind, PanelError, Result};
pub use model::{DnsServer, ExtraConfig, NodeInfo, NodeType, RawDns, RealityConfig, Rules, TlsSettings};
pub use node::parse_node_info;
pub use reality::{derive_reality_key, derive_x25519, reality_public_key};
