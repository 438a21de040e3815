//! The `image-share run` and `image-share process-once` commands.

use image_share_core::{Config, ImageShare};
use tokio_util::sync::CancellationToken;

/// Execute the run command: poll until Ctrl-C or SIGTERM.
pub async fn execute(config: Config) -> anyhow::Result<()> {
    let share = ImageShare::new(config);
    share.ensure_storage()?;

    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            cancel.cancel();
        })
    };

    share.run(cancel).await;
    watcher.abort();

    tracing::info!("Photo processor stopped");
    Ok(())
}

/// Execute one poll cycle and print its report to stdout as JSON.
pub async fn execute_once(config: Config) -> anyhow::Result<()> {
    let share = ImageShare::new(config);
    share.ensure_storage()?;

    let report = share.poll_once().await?;
    tracing::info!(
        "Cycle finished: {} discovered, {} succeeded, {} failed",
        report.discovered,
        report.succeeded,
        report.failed
    );
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
