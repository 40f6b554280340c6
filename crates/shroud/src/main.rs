mod cli;
mod server;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use eyre::{eyre, WrapErr};

use shroud_core::cache::PayloadCache;
use shroud_core::ptm::{HttpManager, ManagerHandle, PrivateTransactionManager};
use shroud_core::PrivacyResolver;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .init();

    // Generate a random API token for this server session.
    let api_token = {
        use rand::Rng;
        let bytes: [u8; 16] = rand::thread_rng().r#gen();
        hex::encode(bytes)
    };

    // Without a manager URL the node serves every transaction as public.
    let handle = match &args.ptm_url {
        Some(url) => {
            let manager = HttpManager::connect(
                url,
                Duration::from_secs(args.ptm_timeout_secs),
                args.ptm_requests_per_second,
            )
            .await
            .map_err(|err| {
                eyre!(format_ptm_connect_error(url, &error_chain(&err)))
                    .wrap_err("while attempting to connect to the private transaction manager")
            })?;
            ManagerHandle::new(manager)
        }
        None => {
            tracing::info!(
                "no private transaction manager configured; private payloads will not be resolved"
            );
            ManagerHandle::not_configured()
        }
    };

    {
        let manager = handle.current();
        tracing::info!(
            backend = manager.name(),
            features = ?manager.features(),
            "private transaction manager ready"
        );
    }

    let mut resolver = PrivacyResolver::new(handle);
    if args.payload_cache_cap > 0 {
        resolver = resolver.with_cache(Arc::new(PayloadCache::with_capacity(
            args.payload_cache_cap,
        )));
    }
    if let Some(ms) = args.lookup_timeout_ms {
        resolver = resolver.with_lookup_timeout(Duration::from_millis(ms));
    }

    let state = server::AppState {
        resolver,
        api_token: api_token.clone(),
        resolve_concurrency: args.resolve_concurrency.max(1),
    };

    let bind_addr = format!("{}:{}", args.bind, args.port);
    let origin = format!("http://{}:{}", args.bind, args.port);
    let router = server::build_router(state, &origin).context("build HTTP router")?;

    if args.bind == "0.0.0.0" {
        tracing::warn!("server is bound to 0.0.0.0; it is accessible from the network");
    }

    println!();
    println!("  Shroud is running:");
    println!("    URL:       http://{bind_addr}");
    println!("    API token: {api_token}");
    println!();

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .context("bind TCP listener")?;

    tracing::info!("listening on {bind_addr}");
    axum::serve(listener, router)
        .await
        .context("run HTTP server")?;

    Ok(())
}

/// Render `err` with every message down its `source()` chain, so causes
/// buried below the top-level message (DNS, TLS) can be matched on.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let message = cause.to_string();
        if !rendered.contains(&message) {
            rendered.push_str(": ");
            rendered.push_str(&message);
        }
        source = cause.source();
    }
    rendered
}

fn format_ptm_connect_error(url: &str, source_error: &str) -> String {
    let mut lines = vec![
        format!("could not connect to private transaction manager `{url}`"),
        format!("error: {source_error}"),
    ];

    if source_error.contains("dns error") {
        lines.push(
            "hint: hostname resolution failed; verify the manager hostname and your DNS/network"
                .into(),
        );
    } else if source_error.contains("certificate") || source_error.contains("tls") {
        lines.push(
            "hint: TLS handshake failed; verify certificate trust and that the manager serves HTTPS"
                .into(),
        );
    } else if source_error.contains("upcheck endpoint not found") {
        lines.push(
            "hint: the URL must point at the manager's third-party API, not its peer-to-peer API"
                .into(),
        );
    } else if source_error.contains("error sending request for url") {
        lines.push("hint: request could not be sent; verify the URL, the manager process, and network access".into());
    }

    lines.join("\n")
}
