//! Replay account lifecycle events through the mirror hook.
//!
//! Events are read as JSON lines, e.g.
//! `{"event":"renamed","old":"alice","new":"alicia"}`. Each event is handed to
//! the mirror hook, which only submits background work; the command then waits
//! for every submitted operation and reports how it ended.

use std::io::{BufRead, BufReader};

use kbmirror::sync::{AccountEvent, MirrorHook, SyncRunner, SyncStatus};

use crate::cli::EventsArgs;
use crate::output::{OutputFormat, UnitReport, print_reports};
use crate::store::Store;

/// Run the events command
pub async fn run(
    store: &Store,
    args: &EventsArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let reader: Box<dyn BufRead> = match &args.file {
        Some(path) => Box::new(BufReader::new(std::fs::File::open(path)?)),
        None => Box::new(BufReader::new(std::io::stdin())),
    };

    let hook = MirrorHook::new(SyncRunner::new(store.mirror.clone())?);
    let mut submitted = Vec::new();

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event: AccountEvent = serde_json::from_str(&line)
            .map_err(|e| format!("line {}: invalid event: {e}", number + 1))?;
        match hook.submit(&event) {
            Ok(handle) => submitted.push(handle),
            Err(e) => tracing::warn!("Skipping event on line {}: {e}", number + 1),
        }
    }

    let mut reports = Vec::new();
    let mut results = Vec::new();
    for handle in submitted {
        let status = handle.wait().await;
        let detail = match &status {
            SyncStatus::Succeeded { outcome } => serde_json::to_string(outcome)?,
            SyncStatus::Failed { error } => error.clone(),
            other => format!("{other:?}"),
        };
        reports.push(UnitReport {
            id: handle.id().to_string(),
            operation: handle.operation().to_string(),
            succeeded: status.is_success(),
            detail,
        });
        results.push(serde_json::json!({
            "id": handle.id().to_string(),
            "operation": handle.operation(),
            "status": status,
        }));
    }

    match format {
        OutputFormat::Human => {
            print_reports(&reports);
            if let Some(requests) = store.dry_run_requests() {
                println!("(dry run: {requests} request(s) sent)");
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(&results)?),
    }

    Ok(())
}
