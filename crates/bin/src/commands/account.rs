//! Single-account commands: exists, create, delete, rename.

use crate::cli::{RenameArgs, UsernameArgs};
use crate::output::OutputFormat;
use crate::store::Store;

/// Run the exists command
pub async fn exists(
    store: &Store,
    args: &UsernameArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let found = store.mirror.exists(&args.username).await?;

    match format {
        OutputFormat::Human => {
            let state = if found { "mirrored" } else { "not mirrored" };
            println!("{}: {state}", args.username);
        }
        OutputFormat::Json => {
            let value = serde_json::json!({
                "username": args.username,
                "exists": found,
            });
            println!("{}", serde_json::to_string(&value)?);
        }
    }
    report_dry_run(store, format);
    Ok(())
}

/// Run the create command
pub async fn create(
    store: &Store,
    args: &UsernameArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let addrs = store.mirror.create(&args.username).await?;

    match format {
        OutputFormat::Human => {
            let rendered: Vec<String> = addrs.iter().map(ToString::to_string).collect();
            println!("Created {}: {}", args.username, rendered.join(" "));
        }
        OutputFormat::Json => {
            let value = serde_json::json!({
                "username": args.username,
                "created": addrs,
            });
            println!("{}", serde_json::to_string(&value)?);
        }
    }
    report_dry_run(store, format);
    Ok(())
}

/// Run the delete command
pub async fn delete(
    store: &Store,
    args: &UsernameArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let count = store.mirror.delete(&args.username).await?;

    match format {
        OutputFormat::Human => println!("Deleted {count} identity subgraph(s) for {}", args.username),
        OutputFormat::Json => {
            let value = serde_json::json!({
                "username": args.username,
                "deleted": count,
            });
            println!("{}", serde_json::to_string(&value)?);
        }
    }
    report_dry_run(store, format);
    Ok(())
}

/// Run the rename command
pub async fn rename(
    store: &Store,
    args: &RenameArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let count = store
        .mirror
        .rename(&args.username, &args.new_username)
        .await?;

    match format {
        OutputFormat::Human => println!(
            "Renamed {count} login link(s) from {} to {}",
            args.username, args.new_username
        ),
        OutputFormat::Json => {
            let value = serde_json::json!({
                "username": args.username,
                "new_username": args.new_username,
                "renamed": count,
            });
            println!("{}", serde_json::to_string(&value)?);
        }
    }
    report_dry_run(store, format);
    Ok(())
}

fn report_dry_run(store: &Store, format: OutputFormat) {
    if let (Some(requests), OutputFormat::Human) = (store.dry_run_requests(), format) {
        println!("(dry run against {}: {requests} request(s) sent)", store.label());
    }
}
