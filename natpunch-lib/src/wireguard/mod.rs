use std::fmt;
use std::fmt::Debug;
use std::net::SocketAddr;
use thiserror::Error;

use crate::exec;
use crate::key::Key;
use crate::peer::Peer;

pub mod parse;
mod tooling;

pub use parse::ParseError;
pub use tooling::{Tooling, WG};

#[derive(Error, Debug)]
pub enum Error {
    #[error("wireguard execution failed: {0}")]
    ExecutionFailed(#[from] exec::Error),
    #[error("failed parsing {query} of interface {interface}: {source}")]
    ParseFailed {
        query: Query,
        interface: String,
        #[source]
        source: ParseError,
    },
    #[error("peer {peer} not found in endpoints of interface {interface}")]
    NotFound { peer: String, interface: String },
}

/// Values `wg show <interface>` can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    ListenPort,
    Peers,
    Endpoints,
    PublicKey,
    PrivateKey,
}

impl Query {
    pub fn as_arg(&self) -> &'static str {
        match self {
            Query::ListenPort => "listen-port",
            Query::Peers => "peers",
            Query::Endpoints => "endpoints",
            Query::PublicKey => "public-key",
            Query::PrivateKey => "private-key",
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_arg())
    }
}

impl Error {
    /// Lookup misses are expected while a peer has not been reached yet.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

/// Live configuration access of a WireGuard interface.
///
/// Every call queries the interface anew, nothing is cached between calls.
pub trait WireGuard: Debug {
    fn listen_port(&self, interface: &str) -> Result<u16, Error>;

    /// Public keys of all configured peers in the order `wg` lists them.
    fn peers(&self, interface: &str) -> Result<Vec<String>, Error>;

    fn peer_endpoint(&self, peer: &str, interface: &str) -> Result<SocketAddr, Error>;

    fn public_key(&self, interface: &str) -> Result<Key, Error>;

    fn private_key(&self, interface: &str) -> Result<Key, Error>;

    /// Points `peer` at its current address and sets its persistent keepalive in seconds.
    fn set_peer(&self, peer: &Peer, keepalive: u16, interface: &str) -> Result<(), Error>;

    fn peer_keys(&self, interface: &str) -> Result<Vec<Key>, Error> {
        self.peers(interface)?
            .iter()
            .map(|p| {
                parse::key(p).map_err(|source| Error::ParseFailed {
                    query: Query::Peers,
                    interface: interface.to_string(),
                    source,
                })
            })
            .collect()
    }
}
