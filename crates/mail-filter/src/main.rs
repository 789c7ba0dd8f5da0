//! Milter content filter entry point
//!
//! Binds a unix or tcp socket, registers the milter callbacks in
//! `session`, and runs until the MTA closes the listener or the process
//! receives a shutdown signal.

mod config;
mod error;
mod session;

use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use indymilter::Callbacks;
use mime_rewrite::{Allowlist, RewriterContext};
use tokio::net::{TcpListener, UnixListener};

use config::{Cli, Protocol};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut allowlist = Allowlist::with_proxy_host(&cli.proxy_host);
    allowlist.add_suffixes(cli.allow_suffixes.clone());
    allowlist.add_exact(cli.allow_exact.clone());
    let rewriter = Arc::new(RewriterContext::new(cli.proxy_host.clone(), allowlist));

    let callbacks = build_callbacks(rewriter);

    match cli.proto {
        Protocol::Unix => run_unix(&cli.addr, callbacks).await?,
        Protocol::Tcp => run_tcp(&cli.addr, callbacks).await?,
    }

    Ok(())
}

fn build_callbacks(rewriter: Arc<RewriterContext>) -> Callbacks<session::FilterContext> {
    Callbacks::new()
        .on_negotiate(|context, _, _| Box::pin(session::on_negotiate(context)))
        .on_header(|context, name, value| Box::pin(session::on_header(context, name, value)))
        .on_eoh(|context| Box::pin(session::on_eoh(context)))
        .on_body(|context, data| Box::pin(session::on_body(context, data)))
        .on_eom(move |context| Box::pin(session::on_eom(context, Arc::clone(&rewriter))))
}

/// Bind a unix domain socket, removing any stale socket file first and
/// setting mode `0660` so both the MTA and this process can use it.
/// Removed again on graceful shutdown.
async fn run_unix(addr: &str, callbacks: Callbacks<session::FilterContext>) -> std::io::Result<()> {
    let path = Path::new(addr);
    if path.exists() {
        std::fs::remove_file(path)?;
    }

    let listener = UnixListener::bind(path)?;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o660))?;

    tracing::info!(socket = addr, "mail-filter listening on unix socket");

    tokio::select! {
        result = indymilter::run(listener, callbacks, indymilter::Config::default()) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "milter server exited with error");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    let _ = std::fs::remove_file(path);
    Ok(())
}

async fn run_tcp(addr: &str, callbacks: Callbacks<session::FilterContext>) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr, "mail-filter listening on tcp socket");

    tokio::select! {
        result = indymilter::run(listener, callbacks, indymilter::Config::default()) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "milter server exited with error");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    Ok(())
}
