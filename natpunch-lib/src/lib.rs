pub mod config;
pub mod exec;
pub mod key;
pub mod log_output;
pub mod peer;
pub mod wireguard;
