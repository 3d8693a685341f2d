//! Network availability check performed before a load starts.

use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::error::ApiError;

pub trait Connectivity: Send + Sync {
    fn is_connected(&self) -> bool;
}

/// Treats the network as always available.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeOnline;

impl Connectivity for AssumeOnline {
    fn is_connected(&self) -> bool {
        true
    }
}

/// Considers the network available when a TCP connection to the API host
/// can be opened within `timeout`.
#[derive(Debug, Clone)]
pub struct HostProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl HostProbe {
    pub fn new(host: &str, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.to_string(),
            port,
            timeout,
        }
    }

    /// Probe the host and port that `url` points at.
    pub fn for_url(url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let parsed = Url::parse(url).map_err(|e| ApiError::InvalidUrl(format!("{url}: {e}")))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| ApiError::InvalidUrl(format!("{url}: no host")))?;
        let port = parsed
            .port_or_known_default()
            .ok_or_else(|| ApiError::InvalidUrl(format!("{url}: no port")))?;
        Ok(Self::new(host, port, timeout))
    }
}

impl Connectivity for HostProbe {
    fn is_connected(&self) -> bool {
        let addrs = match (self.host.as_str(), self.port).to_socket_addrs() {
            Ok(addrs) => addrs,
            Err(e) => {
                debug!(host = %self.host, error = %e, "host did not resolve");
                return false;
            }
        };
        for addr in addrs {
            if TcpStream::connect_timeout(&addr, self.timeout).is_ok() {
                return true;
            }
        }
        debug!(host = %self.host, port = self.port, "host unreachable");
        false
    }
}
