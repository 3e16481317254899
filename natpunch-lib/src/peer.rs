use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::key::Key;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    pub public_key: Key,
    pub ip: IpAddr,
    pub port: u16,
}

impl Peer {
    pub fn new(public_key: Key, ip: IpAddr, port: u16) -> Self {
        Peer { public_key, ip, port }
    }

    pub fn endpoint(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}@{}", self.public_key, self.endpoint())
    }
}
