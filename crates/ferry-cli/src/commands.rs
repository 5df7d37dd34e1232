//! Subcommand implementations.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use ferry_core::app::snapshot;
use ferry_core::domain::scan_paths;
use ferry_core::impls::{FileBlobStorage, FsByteReader, HttpIngest, TracingGateway};
use ferry_core::ports::BlobStorage;
use ferry_core::{
    FerryConfig, IngestQueue, IngestQueueBuilder, ItemId, LoadOutcome, QueueStats, QueuedItem,
};
use serde_json::json;
use tokio::sync::Notify;
use tracing::{info, warn};

fn open_queue(config: &FerryConfig) -> anyhow::Result<IngestQueue> {
    let ingest = HttpIngest::from_config(&config.remote).context("cannot build HTTP client")?;
    let queue = IngestQueueBuilder::new()
        .byte_reader(Arc::new(FsByteReader::new()))
        .remote_ingest(Arc::new(ingest))
        .storage(Arc::new(FileBlobStorage::new(&config.storage.state_dir)))
        .gateway(Arc::new(TracingGateway))
        .config(config.queue.clone())
        .build()?;
    Ok(queue)
}

async fn load(queue: &IngestQueue) {
    match queue.load_from_storage().await {
        LoadOutcome::Restored(count) => info!(count, "resuming stored queue"),
        LoadOutcome::DiscardedCorrupt | LoadOutcome::DiscardedDeprecated => {
            warn!("stored queue was unreadable and has been reset")
        }
        LoadOutcome::Unavailable => warn!("state directory unreadable; starting with an empty queue"),
        LoadOutcome::Empty | LoadOutcome::AlreadyLoaded => {}
    }
}

pub async fn ingest(config: &FerryConfig, paths: Vec<PathBuf>) -> anyhow::Result<()> {
    let given = paths.len();
    let entries = scan_paths(paths, &config.scan.extensions);
    if entries.is_empty() {
        bail!("none of the {given} path(s) has a supported extension");
    }
    if entries.len() < given {
        warn!(skipped = given - entries.len(), "unsupported files skipped");
    }

    let queue = open_queue(config)?;
    load(&queue).await;
    let ids = queue.enqueue(entries);
    info!(count = ids.len(), "files queued");
    drive(&queue).await
}

pub async fn resume(config: &FerryConfig) -> anyhow::Result<()> {
    let queue = open_queue(config)?;
    load(&queue).await;
    drive(&queue).await
}

pub async fn status(config: &FerryConfig, as_json: bool) -> anyhow::Result<()> {
    let storage = FileBlobStorage::new(&config.storage.state_dir);
    let raw = storage
        .get_blob(&config.queue.storage_key)
        .await
        .with_context(|| format!("cannot read {}", storage.dir().display()))?;
    let items = match raw {
        Some(raw) => snapshot::decode(&raw).context("stored queue is unreadable")?,
        None => Vec::new(),
    };
    let stats = QueueStats::from_items(&items);

    if as_json {
        let report = json!({
            "stats": stats,
            "items": items.iter().map(item_json).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for item in &items {
        let error = item.last_error.as_deref().unwrap_or("");
        println!(
            "{:<31} {:<10} {:>2}  {}  {}",
            item.id,
            format!("{:?}", item.status).to_lowercase(),
            item.retry_count,
            item.display_name,
            error
        );
    }
    print_stats(&stats);
    Ok(())
}

pub async fn prune(config: &FerryConfig) -> anyhow::Result<()> {
    let queue = open_queue(config)?;
    load(&queue).await;
    let removed = queue.remove_completed();
    println!("removed {removed} finished item(s)");
    drive(&queue).await
}

pub async fn retry(config: &FerryConfig, id: &str) -> anyhow::Result<()> {
    let id: ItemId = id.parse().with_context(|| format!("`{id}` is not an item id"))?;
    let queue = open_queue(config)?;
    load(&queue).await;
    queue.retry(id)?;
    drive(&queue).await
}

/// Report progress until the queue is idle, then save and summarize.
///
/// Ctrl-C saves the queue and exits; an item that was in flight is picked up
/// again by the next `resume`.
async fn drive(queue: &IngestQueue) -> anyhow::Result<()> {
    let changed = Arc::new(Notify::new());
    let signal = Arc::clone(&changed);
    let subscription = queue.subscribe(move || signal.notify_one());

    let mut last = queue.stats();
    let interrupted = loop {
        tokio::select! {
            _ = queue.wait_idle() => break false,
            _ = changed.notified() => {
                let stats = queue.stats();
                if stats != last {
                    info!(
                        pending = stats.pending,
                        completed = stats.completed,
                        failed = stats.failed,
                        "progress"
                    );
                    last = stats;
                }
            }
            result = tokio::signal::ctrl_c() => {
                result.context("cannot listen for ctrl-c")?;
                warn!("interrupted; saving queue");
                break true;
            }
        }
    };

    subscription.unsubscribe();
    queue.flush().await;
    if !interrupted {
        print_stats(&queue.stats());
    }
    Ok(())
}

fn print_stats(stats: &QueueStats) {
    println!(
        "{} completed, {} failed, {} pending ({} total)",
        stats.completed,
        stats.failed,
        stats.pending + stats.processing,
        stats.total
    );
}

fn item_json(item: &QueuedItem) -> serde_json::Value {
    json!({
        "id": item.id.to_string(),
        "sourceRef": item.source_ref.as_str(),
        "displayName": item.display_name,
        "enqueuedAt": item.enqueued_at.to_rfc3339(),
        "status": item.status,
        "retryCount": item.retry_count,
        "lastError": item.last_error,
    })
}
