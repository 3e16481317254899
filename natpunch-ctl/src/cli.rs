use bpaf::Bpaf;
use natpunch_lib::config;
use natpunch_lib::key::Key;
use std::net::IpAddr;
use std::path::PathBuf;

/// Inspects and updates the live configuration of a WireGuard interface.
#[derive(Debug, Clone, Bpaf)]
#[bpaf(options)]
pub struct Cli {
    /// Configuration file
    #[bpaf(short, long, argument("PATH"), fallback(config::path()))]
    pub config: PathBuf,
    /// WireGuard interface, overrides the configured one
    #[bpaf(short, long, argument("IFACE"))]
    pub interface: Option<String>,
    #[bpaf(external(command))]
    pub command: Command,
}

#[derive(Debug, Clone, Bpaf)]
pub enum Command {
    /// Displays the UDP port the interface listens on
    #[bpaf(command)]
    ListenPort,
    /// Lists the public keys of all configured peers
    #[bpaf(command)]
    Peers,
    /// Displays the last known endpoint of a peer
    #[bpaf(command)]
    Endpoint {
        /// Public key of the peer
        #[bpaf(short, long)]
        peer: String,
    },
    /// Displays the public key of the interface
    #[bpaf(command)]
    PublicKey,
    /// Displays the private key of the interface
    #[bpaf(command)]
    PrivateKey,
    /// Points a peer at a new endpoint and sets its persistent keepalive
    #[bpaf(command)]
    SetPeer {
        /// Public key of the peer
        #[bpaf(short, long)]
        peer: Key,
        /// IP address the peer is reachable at
        #[bpaf(long)]
        ip: IpAddr,
        /// UDP port the peer is reachable at
        #[bpaf(long)]
        port: u16,
        /// Persistent keepalive in seconds, defaults to the configured value
        #[bpaf(short, long)]
        keepalive: Option<u16>,
    },
}
