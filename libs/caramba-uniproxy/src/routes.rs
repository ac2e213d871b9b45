use crate::client::CONFIG_PATH;
use crate::de::null_as_default;
use crate::error::{PanelError, Result};
use crate::model::{DnsServer, RawDns, Rules};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

const PROTOCOL_PREFIX: &str = "protocol:";
const REGEXP_PREFIX: &str = "regexp:";
const DNS_MAIN: &str = "main";

#[derive(Debug, Clone, Deserialize)]
pub struct Route {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(default, rename = "match")]
    pub matches: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub action: String,
    #[serde(default)]
    pub action_value: Option<String>,
}

/// The `match` field as the panel may send it.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteMatch {
    /// Comma-separated list in a single string.
    Joined(String),
    List(Vec<Value>),
    Empty,
}

impl From<&Value> for RouteMatch {
    fn from(value: &Value) -> Self {
        match value {
            Value::String(s) => RouteMatch::Joined(s.clone()),
            Value::Array(items) => RouteMatch::List(items.clone()),
            Value::Null => RouteMatch::Empty,
            other => RouteMatch::List(vec![other.clone()]),
        }
    }
}

impl RouteMatch {
    pub fn normalize(&self) -> std::result::Result<Vec<String>, String> {
        match self {
            RouteMatch::Joined(s) => Ok(s.split(',').map(str::to_string).collect()),
            RouteMatch::List(items) => items.iter().map(scalar_to_string).collect(),
            RouteMatch::Empty => Ok(Vec::new()),
        }
    }
}

fn scalar_to_string(value: &Value) -> std::result::Result<String, String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!("match entry {} is not a string", other)),
    }
}

/// Split the panel routes into block rules and DNS overrides.
///
/// A `dns` route whose first match is `main` carries the full DNS JSON in
/// its remaining entries; every route after it is skipped.
pub fn interpret_routes(routes: &[Route]) -> Result<(Rules, RawDns)> {
    let mut rules = Rules::default();
    let mut raw_dns = RawDns::default();

    for (i, route) in routes.iter().enumerate() {
        let matches = RouteMatch::from(&route.matches)
            .normalize()
            .map_err(|reason| PanelError::DecodeCommon {
                path: CONFIG_PATH.to_string(),
                reason: format!("route {} (id {}): {}", i, route.id, reason),
            })?;

        match route.action.as_str() {
            "block" => {
                for m in matches {
                    if let Some(protocol) = m.strip_prefix(PROTOCOL_PREFIX) {
                        rules.protocol.push(protocol.to_string());
                    } else {
                        let pattern = m.strip_prefix(REGEXP_PREFIX).unwrap_or(&m);
                        rules.regexp.push(pattern.to_string());
                    }
                }
            }
            "dns" => {
                if matches.first().map(String::as_str) == Some(DNS_MAIN) {
                    raw_dns.dns_json = matches[1..].concat().into_bytes();
                    debug!("Route {} carries main DNS config, skipping the rest", i);
                    break;
                }
                raw_dns.dns_map.insert(
                    i.to_string(),
                    DnsServer {
                        address: route.action_value.clone().unwrap_or_default(),
                        domains: matches,
                    },
                );
            }
            other => debug!("Ignoring route {} with action {:?}", i, other),
        }
    }

    Ok((rules, raw_dns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn routes(value: Value) -> Vec<Route> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn block_rules_are_partitioned_by_prefix() {
        let routes = routes(json!([{
            "id": 1,
            "match": "regexp:.*\\.ads\\.com,protocol:bittorrent",
            "action": "block",
            "action_value": ""
        }]));
        let (rules, dns) = interpret_routes(&routes).unwrap();
        assert_eq!(rules.regexp, vec![".*\\.ads\\.com"]);
        assert_eq!(rules.protocol, vec!["bittorrent"]);
        assert!(dns.dns_map.is_empty());
    }

    #[test]
    fn unprefixed_block_entries_land_in_regexp() {
        let routes = routes(json!([
            {"id": 1, "match": ["example.com", "protocol:regexp:x", "regexp:protocol:y"], "action": "block"},
            {"id": 2, "match": ["example.com"], "action": "block"}
        ]));
        let (rules, _) = interpret_routes(&routes).unwrap();
        assert_eq!(rules.regexp, vec!["example.com", "protocol:y", "example.com"]);
        assert_eq!(rules.protocol, vec!["regexp:x"]);
    }

    #[test]
    fn dns_routes_are_indexed_by_position_until_main() {
        let routes = routes(json!([
            {"id": 0, "match": ["example.com", "foo.com"], "action": "dns", "action_value": "1.1.1.1"},
            {"id": 5, "match": "geosite:cn", "action": "block"},
            {"id": 1, "match": ["main", "{\"servers\":[]}"], "action": "dns", "action_value": ""},
            {"id": 2, "match": ["late.com"], "action": "dns", "action_value": "8.8.8.8"},
            {"id": 3, "match": "protocol:bittorrent", "action": "block"}
        ]));
        let (rules, dns) = interpret_routes(&routes).unwrap();

        assert_eq!(dns.dns_map.len(), 1);
        assert_eq!(
            dns.dns_map["0"],
            DnsServer {
                address: "1.1.1.1".to_string(),
                domains: vec!["example.com".to_string(), "foo.com".to_string()],
            }
        );
        assert_eq!(dns.dns_json, b"{\"servers\":[]}".to_vec());
        assert_eq!(rules.regexp, vec!["geosite:cn"]);
        assert!(rules.protocol.is_empty());
    }

    #[test]
    fn main_dns_entries_are_joined_without_separator() {
        let routes = routes(json!([
            {"id": 9, "match": "main,{\"a\":1,\"b\":2}", "action": "dns"}
        ]));
        let (_, dns) = interpret_routes(&routes).unwrap();
        assert_eq!(dns.dns_json, b"{\"a\":1\"b\":2}".to_vec());
        assert!(dns.dns_map.is_empty());
    }

    #[test]
    fn scalar_matches_are_coerced() {
        assert_eq!(
            RouteMatch::from(&json!(["a", 53, true])).normalize().unwrap(),
            vec!["a", "53", "true"]
        );
        assert!(RouteMatch::from(&Value::Null).normalize().unwrap().is_empty());
    }

    #[test]
    fn non_scalar_match_fails_decode() {
        let routes = routes(json!([
            {"id": 4, "match": ["ok", {"nested": true}], "action": "block"}
        ]));
        let err = interpret_routes(&routes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeCommon);
        assert!(err.to_string().contains("route 0 (id 4)"));
    }

    #[test]
    fn null_id_and_action_are_tolerated() {
        let routes = routes(json!([
            {"id": null, "match": "a.com", "action": null, "action_value": null},
            {"id": null, "match": "b.com", "action": "block", "action_value": null}
        ]));
        let (rules, _) = interpret_routes(&routes).unwrap();
        assert_eq!(rules.regexp, vec!["b.com"]);
    }

    #[test]
    fn unknown_actions_are_ignored() {
        let routes = routes(json!([
            {"id": 1, "match": "example.com", "action": "direct", "action_value": "x"}
        ]));
        let (rules, dns) = interpret_routes(&routes).unwrap();
        assert_eq!(rules, Rules::default());
        assert_eq!(dns, RawDns::default());
    }
}
