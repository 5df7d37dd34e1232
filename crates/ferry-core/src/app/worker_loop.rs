//! ProcessingLoop - the single-flight worker.
//!
//! # Flow
//! 1. Claim the next pending item in scan order (marks it processing)
//! 2. ByteReader::read() the source
//! 3. RemoteIngest::submit() the bytes
//! 4. Record success, or apply the retry policy to the failure
//! 5. Schedule a throttled notification and a debounced save
//!
//! When no pending item is left the loop flushes both and goes idle.
//!
//! The `running` watch value is the re-entrancy guard: it flips false -> true
//! at most once per run, however many triggers fire. The store lock is only
//! taken between awaits, never across one.
//!
//! Each attempt runs in its own task. A reader or ingest call that panics is
//! recorded as an aborted (transport) attempt and goes through the retry
//! policy like any other failure.

use std::any::Any;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::{AlertSink, LoopDiagnostics, NotificationBus, PersistenceManager, lock};
use crate::domain::{Alert, IngestError, IngestMetadata, IngestResult};
use crate::ports::{ByteReader, RemoteIngest};
use crate::queue::{Claim, FailureOutcome, QueueStore, RetryPolicy};

pub struct ProcessingLoop {
    store: Arc<Mutex<QueueStore>>,
    reader: Arc<dyn ByteReader>,
    ingest: Arc<dyn RemoteIngest>,
    alerts: AlertSink,
    bus: NotificationBus,
    persistence: PersistenceManager,
    policy: RetryPolicy,
    running: watch::Sender<bool>,
    diagnostics: Mutex<LoopDiagnostics>,
}

impl ProcessingLoop {
    pub(crate) fn new(
        store: Arc<Mutex<QueueStore>>,
        reader: Arc<dyn ByteReader>,
        ingest: Arc<dyn RemoteIngest>,
        alerts: AlertSink,
        bus: NotificationBus,
        persistence: PersistenceManager,
        policy: RetryPolicy,
    ) -> Self {
        let (running, _) = watch::channel(false);
        Self {
            store,
            reader,
            ingest,
            alerts,
            bus,
            persistence,
            policy,
            running,
            diagnostics: Mutex::new(LoopDiagnostics::default()),
        }
    }

    /// Start a run in the background unless one is active.
    ///
    /// Returns true if this call started the run.
    pub fn trigger(self: &Arc<Self>) -> bool {
        if !self.try_begin() {
            return false;
        }
        let this = Arc::clone(self);
        tokio::spawn(async move { this.drain().await });
        true
    }

    /// Run on the caller's task until idle.
    ///
    /// Returns false without doing anything if another run is active.
    pub async fn run_until_idle(&self) -> bool {
        if !self.try_begin() {
            return false;
        }
        self.drain().await;
        true
    }

    pub fn is_running(&self) -> bool {
        *self.running.borrow()
    }

    /// Resolves once no run is active.
    pub async fn wait_idle(&self) {
        let mut rx = self.running.subscribe();
        // the sender lives as long as self, so this cannot fail
        let _ = rx.wait_for(|running| !*running).await;
    }

    pub fn diagnostics(&self) -> LoopDiagnostics {
        *lock(&self.diagnostics)
    }

    fn try_begin(&self) -> bool {
        let started = self.running.send_if_modified(|running| {
            if *running {
                false
            } else {
                *running = true;
                true
            }
        });
        if started {
            lock(&self.diagnostics).runs += 1;
        }
        started
    }

    /// Flip back to idle unless work arrived while we were flushing.
    fn try_finish(&self) -> bool {
        self.running.send_if_modified(|running| {
            if lock(&self.store).has_pending() {
                false
            } else {
                *running = false;
                true
            }
        })
    }

    async fn drain(&self) {
        let _guard = IdleOnUnwind(&self.running);
        info!("ingest queue processing started");
        lock(&self.store).rewind();
        self.bus.schedule_notify();

        loop {
            while let Some(claim) = self.claim_next() {
                self.bus.schedule_notify();
                let outcome = self.attempt(&claim).await;
                self.settle(&claim, outcome).await;
                self.bus.schedule_notify();
                self.persistence.schedule_save();
            }

            self.persistence.flush_save().await;
            if self.try_finish() {
                break;
            }
        }

        self.bus.flush_notify();
        let diagnostics = self.diagnostics();
        let stats = lock(&self.store).stats();
        info!(
            completed = diagnostics.completed,
            failed = diagnostics.failed,
            attempts = diagnostics.attempts,
            queued = stats.total,
            "ingest queue idle"
        );
    }

    fn claim_next(&self) -> Option<Claim> {
        let claim = lock(&self.store).claim_next()?;
        lock(&self.diagnostics).attempts += 1;
        debug!(id = %claim.id, name = %claim.display_name, retry = claim.retry_count, "processing item");
        Some(claim)
    }

    async fn attempt(&self, claim: &Claim) -> Result<IngestResult, IngestError> {
        let reader = Arc::clone(&self.reader);
        let ingest = Arc::clone(&self.ingest);
        let metadata = IngestMetadata {
            id: claim.id,
            source_ref: claim.source_ref.clone(),
            display_name: claim.display_name.clone(),
        };
        let task = tokio::spawn(read_and_submit(reader, ingest, metadata));

        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                let reason = if e.is_panic() {
                    panic_message(e.into_panic())
                } else {
                    "task cancelled".to_string()
                };
                error!(id = %claim.id, %reason, "ingest attempt aborted");
                Err(IngestError::Transport(format!("attempt aborted: {reason}")))
            }
        }
    }

    async fn settle(&self, claim: &Claim, outcome: Result<IngestResult, IngestError>) {
        match outcome {
            Ok(result) => {
                let notable = result.has_notable_content;
                if !lock(&self.store).complete(claim.id, result) {
                    return;
                }
                lock(&self.diagnostics).completed += 1;
                debug!(id = %claim.id, notable, "item completed");
                if notable {
                    self.alerts
                        .send(Alert::notable(claim.id, &claim.display_name))
                        .await;
                }
            }
            Err(error) => {
                let message = error.to_string();
                let transition = lock(&self.store).fail(claim.id, message.clone(), &self.policy);
                match transition {
                    Some(FailureOutcome::Retrying { retry_count }) => {
                        lock(&self.diagnostics).retried += 1;
                        debug!(id = %claim.id, kind = ?error.kind(), retry_count, error = %message, "attempt failed; will retry");
                    }
                    Some(FailureOutcome::Failed) => {
                        lock(&self.diagnostics).failed += 1;
                        warn!(id = %claim.id, kind = ?error.kind(), error = %message, "item failed permanently");
                        self.alerts
                            .send(Alert::failed(claim.id, &claim.display_name, &message))
                            .await;
                    }
                    None => {}
                }
            }
        }
    }
}

/// Marks the loop idle if a run unwinds, so later triggers are not ignored.
struct IdleOnUnwind<'a>(&'a watch::Sender<bool>);

impl Drop for IdleOnUnwind<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.send_replace(false);
        }
    }
}

async fn read_and_submit(
    reader: Arc<dyn ByteReader>,
    ingest: Arc<dyn RemoteIngest>,
    metadata: IngestMetadata,
) -> Result<IngestResult, IngestError> {
    let content = reader.read(&metadata.source_ref).await?;
    ingest.submit(content, &metadata).await?.into_result()
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(_) => "panic".to_string(),
    }
}
