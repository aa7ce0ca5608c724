//! Headless host bridge binary for stdin/stdout JSON communication.
//!
//! Reads `HostInput` messages as newline-delimited JSON from stdin, drives a
//! settings session, and writes `HostOutput` messages (including outbound
//! room commands) to stdout.
//!
//! All tracing/diagnostic output goes to stderr so that stdout remains a
//! clean JSON protocol channel.

use roomsync::config::ClientConfig;
use roomsync::host::stdio::run_stdio_bridge;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise tracing to stderr only (stdout is reserved for the JSON
    // protocol).
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args_os()
        .nth(1)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(ClientConfig::default_config_path);
    let config = ClientConfig::load_or_default(&config_path)
        .map_err(|e| anyhow::anyhow!("cannot load {}: {e}", config_path.display()))?;

    tracing::info!(
        config = %config_path.display(),
        server = %config.server.base_url,
        "roomsync-host starting"
    );

    run_stdio_bridge(&config).await.map_err(|e| {
        tracing::error!(error = %e, "roomsync-host exited with error");
        anyhow::anyhow!("roomsync-host failed: {e}")
    })?;

    tracing::info!("roomsync-host shut down cleanly");
    Ok(())
}
