use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::NodeError;

/// A stable (address, port) identity. `address` is a DNS name or IP literal;
/// an unspecified address defaults to `localhost`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Host {
    pub address: String,
    pub port: u16,
}

const DEFAULT_ADDRESS: &str = "localhost";
const PRIVILEGED_PORT_CEILING: u16 = 1024;

impl Host {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Host {
            address: address.into(),
            port,
        }
    }

    /// The port on which this host's bootstrap `Channel` (§4.2) listens,
    /// derived from the gRPC port since the CLI takes a single host:port.
    pub fn bootstrap_port(&self) -> u16 {
        self.port.wrapping_add(1)
    }

    pub fn grpc_authority(&self) -> String {
        format!("http://{}:{}", self.address, self.port)
    }

    pub fn socket_addr_string(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    pub fn warn_if_privileged(&self) {
        if self.port < PRIVILEGED_PORT_CEILING {
            log::warn!(
                "port {} is in the privileged range; binding may require elevated permissions",
                self.port
            );
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Host {
    type Err = NodeError;

    /// Parses `host[:port]`, defaulting the address to `localhost` when a
    /// bare `:port` is given and rejecting anything that isn't a valid port.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (address, port) = match s.rsplit_once(':') {
            Some((addr, port)) => (addr, port),
            None => {
                return Err(NodeError::InvalidInput(format!(
                    "missing port in host spec '{s}'"
                )))
            }
        };
        let address = if address.is_empty() {
            DEFAULT_ADDRESS
        } else {
            address
        };
        let port: u16 = port
            .parse()
            .map_err(|_| NodeError::InvalidInput(format!("invalid port in host spec '{s}'")))?;
        Ok(Host::new(address, port))
    }
}
