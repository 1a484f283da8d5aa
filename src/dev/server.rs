//! Dev server options and reachable addresses.

use serde_json::{json, Map, Value};
use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use crate::config::defaults::{DEFAULT_PUBLIC_PATH, STATIC_DIR};
use crate::config::ProjectConfig;

use super::port::PortDecision;

/// Section keys consumed by bean itself rather than passed to the server.
const CONSUMED_KEYS: &[&str] = &["https"];

/// Hosts for which a network URL is worth printing.
const LAN_VISIBLE_HOSTS: &[&str] = &["localhost", "127.0.0.1", "::1", "0.0.0.0", "::"];

/// Build the server option record.
///
/// Project overrides are laid over the baseline one key deep, then host and
/// port are pinned back to the negotiated pair.
pub fn server_options(project: &ProjectConfig, host: &str, port: &PortDecision, open: bool) -> Value {
    let static_root = project.root.join(STATIC_DIR);
    let server_type = if project.dev_server.https { "https" } else { "http" };

    let mut options = match json!({
        "host": host,
        "port": port.port,
        "hot": true,
        "open": open,
        "historyApiFallback": true,
        "server": { "type": server_type },
        "static": {
            "directory": static_root.to_string_lossy(),
            "publicPath": DEFAULT_PUBLIC_PATH,
        },
        "client": {
            "overlay": { "errors": true, "warnings": false },
            "progress": true,
        },
        "devMiddleware": { "stats": "none" },
    }) {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    for (key, value) in &project.dev_server.overrides {
        if CONSUMED_KEYS.contains(&key.as_str()) {
            continue;
        }
        options.insert(key.clone(), value.clone());
    }

    options.insert("host".to_string(), Value::from(host));
    options.insert("port".to_string(), Value::from(port.port));
    Value::Object(options)
}

/// Whether the server option record asks for TLS.
pub fn uses_https(options: &Value) -> bool {
    match options.get("server") {
        Some(Value::String(kind)) => kind == "https",
        Some(server) => server.get("type").and_then(Value::as_str) == Some("https"),
        None => false,
    }
}

/// Where a running dev session can be reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionAddress {
    pub https: bool,
    pub host: String,
    pub port: u16,
    /// First non-loopback IPv4 address of this machine.
    pub lan_ip: Option<Ipv4Addr>,
}

impl SessionAddress {
    fn scheme(&self) -> &'static str {
        if self.https {
            "https"
        } else {
            "http"
        }
    }

    pub fn local_url(&self) -> String {
        let host = match self.host.as_str() {
            "0.0.0.0" | "::" => "localhost",
            other => other,
        };
        format!("{}://{}:{}/", self.scheme(), host, self.port)
    }

    /// Only offered for loopback and wildcard hosts.
    pub fn network_url(&self) -> Option<String> {
        if !LAN_VISIBLE_HOSTS.contains(&self.host.as_str()) {
            return None;
        }
        self.lan_ip
            .map(|ip| format!("{}://{}:{}/", self.scheme(), ip, self.port))
    }
}

/// Find the address other machines would use to reach this one.
///
/// Connecting a UDP socket sends nothing; it only asks the OS to pick a
/// route and therefore a source address.
pub fn lan_ipv4() -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect((Ipv4Addr::new(8, 8, 8, 8), 80)).ok()?;
    match socket.local_addr().ok()?.ip() {
        IpAddr::V4(ip) if !ip.is_loopback() && !ip.is_unspecified() => Some(ip),
        _ => None,
    }
}
