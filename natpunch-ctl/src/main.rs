use anyhow::Context;
use natpunch_lib::config;
use natpunch_lib::log_output;
use natpunch_lib::peer::Peer;
use natpunch_lib::wireguard::{Error as WgError, Tooling, WireGuard};
use std::process;

mod cli;

fn run(options: &cli::Cli, config: &config::Config, wg: &impl WireGuard) -> anyhow::Result<Option<String>> {
    let interface = options
        .interface
        .as_deref()
        .unwrap_or(config.wireguard.interface.as_str());

    let output = match &options.command {
        cli::Command::ListenPort => {
            let port = wg
                .listen_port(interface)
                .with_context(|| "unable to query listen port")?;
            Some(port.to_string())
        }
        cli::Command::Peers => {
            let peers = wg.peers(interface).with_context(|| "unable to query peers")?;
            Some(log_output::serialize(&peers))
        }
        cli::Command::Endpoint { peer } => {
            let addr = wg
                .peer_endpoint(peer, interface)
                .with_context(|| format!("unable to query endpoint of {}", peer))?;
            Some(addr.to_string())
        }
        cli::Command::PublicKey => {
            let key = wg.public_key(interface).with_context(|| "unable to query public key")?;
            Some(key.to_string())
        }
        cli::Command::PrivateKey => {
            let key = wg
                .private_key(interface)
                .with_context(|| "unable to query private key")?;
            Some(key.to_string())
        }
        cli::Command::SetPeer {
            peer,
            ip,
            port,
            keepalive,
        } => {
            let peer = Peer::new(*peer, *ip, *port);
            let keepalive = keepalive.unwrap_or(config.wireguard.persistent_keepalive);
            wg.set_peer(&peer, keepalive, interface)
                .with_context(|| format!("unable to update peer {}", peer))?;
            tracing::info!(%peer, keepalive, %interface, "peer updated");
            None
        }
    };
    Ok(output)
}

fn exit_code(err: &anyhow::Error) -> exitcode::ExitCode {
    match err.downcast_ref::<WgError>() {
        Some(WgError::ExecutionFailed(_)) => exitcode::UNAVAILABLE,
        Some(WgError::ParseFailed { .. }) => exitcode::DATAERR,
        Some(WgError::NotFound { .. }) => exitcode::NOINPUT,
        None => exitcode::SOFTWARE,
    }
}

fn main() {
    // install global collector configured based on RUST_LOG env var.
    tracing_subscriber::fmt::init();

    let options = cli::cli().run();

    tracing::debug!(?options, "Options parsed");

    let config = match config::read(&options.config) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, path = %options.config.display(), "error reading config");
            process::exit(exitcode::CONFIG);
        }
    };

    let wg = Tooling::new();
    if !wg.available() {
        tracing::error!("wg not found, install wireguard-tools");
        process::exit(exitcode::UNAVAILABLE);
    }

    match run(&options, &config, &wg) {
        Ok(Some(output)) => println!("{}", output),
        Ok(None) => (),
        Err(e) => {
            // Log the error and its chain in one line
            let error_chain: Vec<String> = e.chain().map(|cause| cause.to_string()).collect();
            tracing::error!(?error_chain, "command failed");
            process::exit(exit_code(&e));
        }
    }
}
