use std::net::SocketAddr;
use tracing::Level;

use crate::exec;
use crate::exec::{Executor, System};
use crate::key::Key;
use crate::peer::Peer;
use crate::wireguard::parse::EndpointEntry;
use crate::wireguard::{parse, Error, ParseError, Query, WireGuard};

/// Name of the WireGuard control utility, resolved through `PATH`.
pub const WG: &str = "wg";

/// Drives a WireGuard interface through the `wg` command line utility.
#[derive(Debug)]
pub struct Tooling<E = System> {
    executor: E,
}

impl Tooling<System> {
    pub fn new() -> Self {
        Tooling { executor: System::new() }
    }
}

impl Default for Tooling<System> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Executor> Tooling<E> {
    pub fn with_executor(executor: E) -> Self {
        Tooling { executor }
    }

    pub fn available(&self) -> bool {
        match self.executor.execute("which", &[WG]) {
            Ok(_) => true,
            Err(exec::Error::ExitStatus { .. }) => false,
            Err(e) => {
                tracing::warn!(warn = ?e, "failed checking for wg");
                false
            }
        }
    }

    fn show(&self, interface: &str, query: Query) -> Result<String, Error> {
        let output = self.executor.execute(WG, &["show", interface, query.as_arg()])?;
        Ok(output)
    }
}

fn parse_failed(query: Query, interface: &str) -> impl FnOnce(ParseError) -> Error + '_ {
    move |source| Error::ParseFailed {
        query,
        interface: interface.to_string(),
        source,
    }
}

impl<E: Executor> WireGuard for Tooling<E> {
    #[tracing::instrument(skip(self), level = Level::DEBUG)]
    fn listen_port(&self, interface: &str) -> Result<u16, Error> {
        let output = self.show(interface, Query::ListenPort)?;
        parse::port(&output).map_err(parse_failed(Query::ListenPort, interface))
    }

    #[tracing::instrument(skip(self), level = Level::DEBUG)]
    fn peers(&self, interface: &str) -> Result<Vec<String>, Error> {
        let output = self.show(interface, Query::Peers)?;
        Ok(parse::peers(&output))
    }

    #[tracing::instrument(skip(self), level = Level::DEBUG)]
    fn peer_endpoint(&self, peer: &str, interface: &str) -> Result<SocketAddr, Error> {
        let output = self.show(interface, Query::Endpoints)?;
        match parse::endpoint(&output, peer) {
            EndpointEntry::Address(addr) => parse::resolve(addr).map_err(parse_failed(Query::Endpoints, interface)),
            EndpointEntry::Unset | EndpointEntry::Missing => Err(Error::NotFound {
                peer: peer.to_string(),
                interface: interface.to_string(),
            }),
        }
    }

    #[tracing::instrument(skip(self), level = Level::DEBUG)]
    fn public_key(&self, interface: &str) -> Result<Key, Error> {
        let output = self.show(interface, Query::PublicKey)?;
        parse::key(&output).map_err(parse_failed(Query::PublicKey, interface))
    }

    #[tracing::instrument(skip(self), level = Level::DEBUG)]
    fn private_key(&self, interface: &str) -> Result<Key, Error> {
        let output = self.show(interface, Query::PrivateKey)?;
        parse::key(&output).map_err(parse_failed(Query::PrivateKey, interface))
    }

    #[tracing::instrument(skip(self), level = Level::DEBUG)]
    fn set_peer(&self, peer: &Peer, keepalive: u16, interface: &str) -> Result<(), Error> {
        let key = peer.public_key.to_base64();
        let keepalive = keepalive.to_string();
        let endpoint = peer.endpoint().to_string();
        self.executor.execute(
            WG,
            &[
                "set",
                interface,
                "peer",
                &key,
                "persistent-keepalive",
                &keepalive,
                "endpoint",
                &endpoint,
            ],
        )?;
        tracing::debug!(%peer, %keepalive, "updated peer");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

    use super::*;
    use crate::exec::fake::Fake;
    use crate::key::KEY_LEN;

    const KEY_A: &str = "xTIBA5rboUvnH4htodjb6e697QjLERt1NAB4mZqp8Dg=";
    const KEY_B: &str = "TrMvSoP4jYQlY6RIzBgbssQqY3vxI2Pi+y71lOWWXX0=";

    fn show_call(interface: &str, what: &str) -> Vec<String> {
        ["wg", "show", interface, what].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn queries_listen_port() -> anyhow::Result<()> {
        let wg = Tooling::with_executor(Fake::returning("51820\n"));
        assert_eq!(wg.listen_port("wg0")?, 51820);
        assert_eq!(wg.executor.calls(), vec![show_call("wg0", "listen-port")]);
        Ok(())
    }

    #[test]
    fn invalid_listen_port_is_parse_failure() {
        let wg = Tooling::with_executor(Fake::returning("70000\n"));
        let res = wg.listen_port("wg0");
        assert!(matches!(
            res,
            Err(Error::ParseFailed {
                query: Query::ListenPort,
                ..
            })
        ));
    }

    #[test]
    fn queries_peers_in_order() -> anyhow::Result<()> {
        let wg = Tooling::with_executor(Fake::returning("keyA\nkeyB\nkeyC\n"));
        assert_eq!(wg.peers("wg1")?, vec!["keyA", "keyB", "keyC"]);
        assert_eq!(wg.executor.calls(), vec![show_call("wg1", "peers")]);
        Ok(())
    }

    #[test]
    fn interface_without_peers_has_empty_list() -> anyhow::Result<()> {
        let wg = Tooling::with_executor(Fake::returning(""));
        assert!(wg.peers("wg0")?.is_empty());
        Ok(())
    }

    #[test]
    fn decodes_peer_keys() -> anyhow::Result<()> {
        let wg = Tooling::with_executor(Fake::returning(&format!("{KEY_A}\n{KEY_B}\n")));
        let keys = wg.peer_keys("wg0")?;
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].to_string(), KEY_A);
        assert_eq!(keys[1].to_string(), KEY_B);
        Ok(())
    }

    #[test]
    fn undecodable_peer_key_is_parse_failure() {
        let wg = Tooling::with_executor(Fake::returning("keyA\n"));
        assert!(matches!(
            wg.peer_keys("wg0"),
            Err(Error::ParseFailed { query: Query::Peers, .. })
        ));
    }

    #[test]
    fn finds_peer_endpoint() -> anyhow::Result<()> {
        let table = format!("{KEY_A}\t198.51.100.7:51820\n{KEY_B}\t203.0.113.5:4500\n");
        let wg = Tooling::with_executor(Fake::returning(&table));
        let addr = wg.peer_endpoint(KEY_B, "wg0")?;
        assert_eq!(addr, SocketAddr::new(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 5)), 4500));
        assert_eq!(wg.executor.calls(), vec![show_call("wg0", "endpoints")]);
        Ok(())
    }

    #[test]
    fn unknown_peer_is_not_found() {
        let table = format!("{KEY_A}\t198.51.100.7:51820\n");
        let wg = Tooling::with_executor(Fake::returning(&table));
        let res = wg.peer_endpoint(KEY_B, "wg0");
        assert!(matches!(&res, Err(e) if e.is_not_found()));
    }

    #[test]
    fn peer_without_endpoint_is_not_found() {
        let table = format!("{KEY_A}\t(none)\n");
        let wg = Tooling::with_executor(Fake::returning(&table));
        assert!(matches!(wg.peer_endpoint(KEY_A, "wg0"), Err(Error::NotFound { .. })));
    }

    #[test]
    fn malformed_endpoint_is_parse_failure() {
        let table = format!("{KEY_A}\tnot-an-endpoint\n");
        let wg = Tooling::with_executor(Fake::returning(&table));
        assert!(matches!(
            wg.peer_endpoint(KEY_A, "wg0"),
            Err(Error::ParseFailed {
                query: Query::Endpoints,
                ..
            })
        ));
    }

    #[test]
    fn queries_keys() -> anyhow::Result<()> {
        let wg = Tooling::with_executor(Fake::returning(&format!("{KEY_A}\n")));
        assert_eq!(wg.public_key("wg0")?.to_string(), KEY_A);
        assert_eq!(wg.private_key("wg0")?.to_string(), KEY_A);
        assert_eq!(
            wg.executor.calls(),
            vec![show_call("wg0", "public-key"), show_call("wg0", "private-key")]
        );
        Ok(())
    }

    #[test]
    fn empty_key_output_is_rejected() {
        let wg = Tooling::with_executor(Fake::returning("\n"));
        assert!(matches!(
            wg.public_key("wg0"),
            Err(Error::ParseFailed {
                query: Query::PublicKey,
                ..
            })
        ));
        assert!(matches!(
            wg.private_key("wg0"),
            Err(Error::ParseFailed {
                query: Query::PrivateKey,
                ..
            })
        ));
    }

    #[test]
    fn failing_command_is_execution_failure() {
        let wg = Tooling::with_executor(Fake::failing());
        assert!(matches!(wg.listen_port("wg9"), Err(Error::ExecutionFailed(_))));
        assert!(matches!(wg.peers("wg9"), Err(Error::ExecutionFailed(_))));
        assert!(matches!(wg.peer_endpoint(KEY_A, "wg9"), Err(Error::ExecutionFailed(_))));
        assert!(matches!(wg.public_key("wg9"), Err(Error::ExecutionFailed(_))));
        assert!(matches!(wg.private_key("wg9"), Err(Error::ExecutionFailed(_))));
    }

    #[test]
    fn execution_failure_names_command() {
        let wg = Tooling::with_executor(Fake::failing());
        let msg = match wg.listen_port("wg9") {
            Err(e) => e.to_string(),
            Ok(_) => String::new(),
        };
        assert!(msg.contains("wg show wg9 listen-port"), "{}", msg);
    }

    #[test]
    fn sets_peer_endpoint_and_keepalive() -> anyhow::Result<()> {
        let key = Key::from_bytes([7u8; KEY_LEN]);
        let peer = Peer::new(key, IpAddr::V4(Ipv4Addr::new(203, 0, 113, 5)), 51820);
        let wg = Tooling::with_executor(Fake::returning(""));
        wg.set_peer(&peer, 25, "wg0")?;

        let expected: Vec<String> = [
            "wg",
            "set",
            "wg0",
            "peer",
            "BwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwc=",
            "persistent-keepalive",
            "25",
            "endpoint",
            "203.0.113.5:51820",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(wg.executor.calls(), vec![expected]);
        Ok(())
    }

    #[test]
    fn sets_ipv6_peer_endpoint_bracketed() -> anyhow::Result<()> {
        let key = Key::from_bytes([7u8; KEY_LEN]);
        let ip = IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1));
        let wg = Tooling::with_executor(Fake::returning(""));
        wg.set_peer(&Peer::new(key, ip, 4500), 0, "wg0")?;
        let calls = wg.executor.calls();
        assert_eq!(calls[0][6], "0");
        assert_eq!(calls[0][8], "[2001:db8::1]:4500");
        Ok(())
    }

    #[test]
    fn set_peer_surfaces_execution_failure() {
        let key = Key::from_bytes([7u8; KEY_LEN]);
        let peer = Peer::new(key, IpAddr::V4(Ipv4Addr::LOCALHOST), 51820);
        let wg = Tooling::with_executor(Fake::failing());
        assert!(matches!(wg.set_peer(&peer, 25, "wg0"), Err(Error::ExecutionFailed(_))));
    }

    #[test]
    fn probes_for_wg_binary() {
        let wg = Tooling::with_executor(Fake::returning("/usr/bin/wg\n"));
        assert!(wg.available());
        assert_eq!(wg.executor.calls(), vec![vec!["which".to_string(), "wg".to_string()]]);
        assert!(!Tooling::with_executor(Fake::failing()).available());
    }
}
