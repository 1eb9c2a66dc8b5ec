//! RTMP ingest and fan-out server.

mod config;
mod registry;

use clap::Parser;
use registry::StreamRegistry;
use rtmp::Session;
use tokio::net::{TcpListener, TcpStream};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    tracing_subscriber::fmt().with_env_filter(config.log.as_str()).init();

    let listener = TcpListener::bind(config.bind).await?;
    tracing::info!(addr = %config.bind, "listening for rtmp connections");

    let registry = StreamRegistry::new();

    loop {
        let (socket, peer_addr) = listener.accept().await?;
        socket.set_nodelay(true).ok();

        let registry = registry.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_connection(socket, registry).await {
                tracing::warn!(%peer_addr, error = %err, "rtmp session ended with an error");
            } else {
                tracing::debug!(%peer_addr, "rtmp session ended");
            }
        });
    }
}

async fn handle_connection(socket: TcpStream, registry: StreamRegistry) -> Result<(), rtmp::SessionError> {
    let mut session = Session::new(socket, registry);
    session.run().await?;
    Ok(())
}
