//! Sync subcommand for the remote document store.

use std::time::Duration;

use clap::Subcommand;
use studydesk_core::HttpRemoteStore;

use super::open_tracker;

#[derive(Subcommand)]
pub enum SyncAction {
    /// Drain pending writes to the configured endpoint and merge today's records
    Run,
    /// Show pending writes and connectivity
    Status,
}

pub fn run(action: SyncAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut tracker = open_tracker()?;

    match action {
        SyncAction::Run => {
            let Some(endpoint) = tracker.config().sync.endpoint.clone() else {
                return Err("no sync endpoint configured (set sync.endpoint)".into());
            };
            let timeout = Duration::from_secs(tracker.config().sync.timeout_secs);
            let remote = HttpRemoteStore::new(&endpoint, timeout)?;

            let runtime = tokio::runtime::Runtime::new()?;
            let report = runtime.block_on(async {
                let report = tracker.on_reconnect(&remote).await;
                if report.is_complete() {
                    if let Err(err) = tracker.reconcile_today(&remote).await {
                        tracing::warn!(error = %err, "could not merge today's records");
                    }
                }
                report
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            if let Some(err) = report.error {
                return Err(format!("sync stopped with {} writes pending: {err}", report.remaining).into());
            }
        }
        SyncAction::Status => {
            let mut status = tracker.sync_status();
            status.online = tracker.config().sync.endpoint.is_some();
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }
    Ok(())
}
