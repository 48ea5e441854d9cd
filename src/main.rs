use anyhow::{bail, Context, Result};
use tokio::io::BufReader;

use logvault::config::{self, Config};
use logvault::export::{deliver, Delivery};
use logvault::logging::{self, pipe_engine_stream};
use logvault::storage::FileBackend;
use logvault::LogVault;

#[tokio::main]
async fn main() -> Result<()> {
    // Ensure config directory exists
    config::ensure_directories()?;
    let config = Config::load()?;

    // Initialize diagnostics BEFORE any tracing calls
    logging::init_diagnostics(logging::DEFAULT_FILTER)?;

    let vault = LogVault::open(&config).await?;

    match std::env::args().nth(1).as_deref() {
        None | Some("run") => run(&vault).await,
        Some("export") => {
            let archive = vault.export().await?;
            match deliver(&archive, None, &config.export_dir).await? {
                Delivery::Downloaded(path) => println!("{}", path.display()),
                Delivery::Shared => println!("shared {}", archive.file_name),
            }
            Ok(())
        }
        Some("clear") => {
            vault
                .store()
                .clear_all_sessions()
                .await
                .context("Failed to clear stored sessions")?;
            Ok(())
        }
        Some(other) => bail!("Unknown command: {} (expected run, export or clear)", other),
    }
}

/// Capture engine records from stdin until EOF or Ctrl-C
async fn run(vault: &LogVault<FileBackend>) -> Result<()> {
    if let Some(id) = vault.start().await {
        tracing::info!("Recording session {}", id);
    }

    let reader = BufReader::new(tokio::io::stdin());
    tokio::select! {
        result = pipe_engine_stream(reader, vault.logger()) => {
            match result {
                Ok(count) => tracing::info!("Engine stream closed after {} records", count),
                Err(e) => tracing::warn!("Engine stream failed: {}", e),
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, closing session");
        }
    }

    vault.shutdown().await;
    Ok(())
}
