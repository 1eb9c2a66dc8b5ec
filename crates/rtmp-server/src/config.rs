//! Command line configuration.

use std::net::SocketAddr;

use clap::Parser;

/// A pure Rust RTMP ingest and fan-out server.
#[derive(Debug, Parser)]
#[command(name = "rtmp-server", version, about)]
pub struct Config {
    /// Address to listen for incoming RTMP connections on.
    #[arg(long, default_value = "0.0.0.0:1935")]
    pub bind: SocketAddr,

    /// Log filter directives, e.g. `rtmp_server=debug,rtmp=info`.
    #[arg(long, env = "RTMP_SERVER_LOG", default_value = "rtmp_server=info,rtmp=info")]
    pub log: String,
}
