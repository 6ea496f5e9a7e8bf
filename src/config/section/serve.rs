//! `[serve]` section configuration.
//!
//! Live reload settings: a WebSocket endpoint for reload pulses and an HTTP
//! proxy in front of the local site that injects the reload client.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! enable = true
//! proxy = "http://localdomain.local"   # Site to proxy (omit to only run the WebSocket endpoint)
//! interface = "127.0.0.1"
//! port = 3000                          # Proxy port
//! ws_port = 35729                      # WebSocket port
//! ```

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Live reload server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Start the live reload servers in watch mode.
    pub enable: bool,

    /// Upstream site the HTTP server proxies to.
    pub proxy: Option<String>,

    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    /// Proxy port number.
    pub port: u16,

    /// WebSocket port for reload pulses.
    pub ws_port: u16,
}

impl ServeConfig {
    pub const PROXY: FieldPath = FieldPath::new("serve.proxy");

    pub(crate) fn validate(&self, diag: &mut ConfigDiagnostics) {
        let Some(proxy) = &self.proxy else { return };

        match url::Url::parse(proxy) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => diag.error(
                Self::PROXY,
                format!("unsupported scheme `{}`", url.scheme()),
            ),
            Err(e) => diag.error_with_hint(
                Self::PROXY,
                format!("invalid url `{proxy}`: {e}"),
                "include the scheme, e.g. http://localdomain.local",
            ),
        }
    }
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            enable: true,
            proxy: Some("http://localdomain.local".into()),
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 3000,
            ws_port: 35729,
        }
    }
}
