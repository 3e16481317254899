//! Parsers for the plain text `wg show` prints.
use std::net::{SocketAddr, ToSocketAddrs};
use std::num::ParseIntError;
use thiserror::Error;

use crate::key;
use crate::key::Key;

/// `wg show <interface> endpoints` prints this for peers without a known address.
pub const NO_ENDPOINT: &str = "(none)";

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("not a decimal number: {0:?}")]
    NotDecimal(String),
    #[error("invalid port: {0}")]
    Port(#[from] ParseIntError),
    #[error("invalid key: {0}")]
    Key(#[from] key::Error),
    #[error("unable to resolve endpoint {addr}: {source}")]
    Resolve {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("endpoint {0} resolved to no address")]
    NoAddress(String),
}

#[derive(Debug, PartialEq, Eq)]
pub enum EndpointEntry<'a> {
    Address(&'a str),
    Unset,
    Missing,
}

pub fn port(text: &str) -> Result<u16, ParseError> {
    let text = text.trim();
    if !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::NotDecimal(text.to_string()));
    }
    Ok(text.parse::<u16>()?)
}

/// Splits a newline separated listing, skipping blank lines.
pub fn peers(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Finds the entry of `peer` in the `<key>\t<host:port>` endpoint table.
pub fn endpoint<'a>(text: &'a str, peer: &str) -> EndpointEntry<'a> {
    let found = text
        .lines()
        .find_map(|line| line.strip_prefix(peer).and_then(|rest| rest.strip_prefix('\t')));
    match found.map(str::trim) {
        Some(NO_ENDPOINT) => EndpointEntry::Unset,
        Some(addr) => EndpointEntry::Address(addr),
        None => EndpointEntry::Missing,
    }
}

/// Resolves `host:port` into a UDP socket address, taking the first result.
pub fn resolve(addr: &str) -> Result<SocketAddr, ParseError> {
    let mut addrs = addr.to_socket_addrs().map_err(|source| ParseError::Resolve {
        addr: addr.to_string(),
        source,
    })?;
    addrs.next().ok_or_else(|| ParseError::NoAddress(addr.to_string()))
}

pub fn key(text: &str) -> Result<Key, ParseError> {
    Ok(text.parse::<Key>()?)
}
