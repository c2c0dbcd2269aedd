use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod utils;

/// A network location in `host:port` form.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Node {
    pub addr: String,
    pub port: u16,
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.addr, self.port)
    }
}

#[derive(Debug, Error)]
#[error("invalid node address (expect host:port): {0}")]
pub struct ParseNodeError(pub String);

impl std::str::FromStr for Node {
    type Err = ParseNodeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, port) = s.rsplit_once(':').ok_or_else(|| ParseNodeError(s.to_owned()))?;
        let port = port.parse().map_err(|_| ParseNodeError(s.to_owned()))?;
        Ok(Node {
            addr: addr.to_owned(),
            port,
        })
    }
}

impl std::net::ToSocketAddrs for Node {
    type Iter = std::vec::IntoIter<std::net::SocketAddr>;
    fn to_socket_addrs(&self) -> std::io::Result<Self::Iter> {
        (&*self.addr, self.port).to_socket_addrs()
    }
}
