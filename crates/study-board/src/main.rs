mod config;
mod error;
mod server;

use std::sync::Arc;

use rmcp::{ServiceExt, transport::stdio};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use server::StudyBoardServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries MCP JSON-RPC, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting study-board MCP server");

    let config = Config::from_env()?;
    info!(
        content = ?config.content_path,
        profile = ?config.profile,
        base_path = %config.base_path,
        reduced_motion = config.reduced_motion,
        "configuration loaded"
    );

    let store = Arc::new(config.load_content()?);
    info!(
        chapters = store.len(),
        cards = store.card_count(),
        "content loaded"
    );

    let tcp_listen_addr = config.tcp_listen_addr.clone();
    let server = StudyBoardServer::new(store, config);

    if let Some(addr) = tcp_listen_addr {
        let listener = TcpListener::bind(&addr).await?;
        info!(listen_addr = %addr, "MCP server ready, serving on TCP");
        loop {
            let (stream, peer) = listener.accept().await?;
            let server = server.fresh_session();
            tokio::spawn(async move {
                tracing::info!(peer = %peer, "MCP client connected");
                let service = server.serve(stream).await.inspect_err(|e| {
                    tracing::error!(error = %e, "MCP server error");
                })?;
                service.waiting().await?;
                tracing::info!(peer = %peer, "MCP client disconnected");
                Ok::<(), anyhow::Error>(())
            });
        }
    } else {
        info!("MCP server ready, serving on stdio");
        let service = server.serve(stdio()).await.inspect_err(|e| {
            tracing::error!(error = %e, "MCP server error");
        })?;
        service.waiting().await?;
        info!("MCP server shut down");
    }
    Ok(())
}
