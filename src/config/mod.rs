//! Initialization options parsed from the host's `init` call arguments.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BridgeError, BridgeResult};

/// Connection options recognized by `init`. All fields are optional; the
/// underlying client supplies defaults for anything left unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionOptions {
    /// Cluster name (e.g. `eu`).
    pub cluster: Option<String>,
    #[serde(rename = "useTLS")]
    pub use_tls: Option<bool>,
    /// Custom host, overrides the cluster-derived default.
    pub host: Option<String>,
    pub ws_port: Option<u16>,
    pub wss_port: Option<u16>,
    /// Inactivity window in milliseconds before a ping is sent.
    pub activity_timeout: Option<u64>,
    pub pong_timeout: Option<u64>,
    pub max_reconnection_attempts: Option<u32>,
    pub max_reconnect_gap_in_seconds: Option<u32>,
    /// HTTP authorization endpoint; applied before the callback authorizer.
    pub auth_endpoint: Option<String>,
    /// Present when the host wants the callback authorizer installed.
    pub authorizer: Option<Value>,
    /// HTTP proxy in `host:port` form.
    pub proxy: Option<String>,
}

/// Arguments of the `init` call: the api key plus flattened options.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitArgs {
    pub api_key: String,
    #[serde(flatten)]
    pub options: ConnectionOptions,
}

/// A parsed `host:port` proxy address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyAddr {
    pub host: String,
    pub port: u16,
}

impl ConnectionOptions {
    /// Parse the proxy option, if set. Malformed input fails `init`.
    pub fn proxy_addr(&self) -> BridgeResult<Option<ProxyAddr>> {
        let Some(raw) = self.proxy.as_deref() else {
            return Ok(None);
        };
        let (host, port) = raw
            .rsplit_once(':')
            .ok_or_else(|| BridgeError::InvalidOptions(format!("proxy must be host:port, got {raw:?}")))?;
        if host.is_empty() {
            return Err(BridgeError::InvalidOptions(format!(
                "proxy must be host:port, got {raw:?}"
            )));
        }
        let port: u16 = port
            .parse()
            .map_err(|_| BridgeError::InvalidOptions(format!("invalid proxy port in {raw:?}")))?;
        Ok(Some(ProxyAddr {
            host: host.to_string(),
            port,
        }))
    }

    /// Whether the host asked for the callback authorizer. When an HTTP
    /// endpoint is also supplied it is applied first and this flag
    /// overwrites it.
    pub fn wants_callback_authorizer(&self) -> bool {
        self.authorizer.is_some()
    }
}
