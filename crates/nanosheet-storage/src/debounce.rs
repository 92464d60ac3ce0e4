use crate::snapshot::{Result, SnapshotStore};
use nanosheet_model::SheetDoc;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Tuning for the per-room snapshot debouncer.
#[derive(Clone, Copy, Debug)]
pub struct DebounceConfig {
    /// Quiet period after the last change before a snapshot is written.
    pub save_delay: Duration,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            save_delay: Duration::from_millis(800),
        }
    }
}

/// Coalesces a burst of document changes into one snapshot write.
///
/// Every [`schedule`](Self::schedule) cancels the pending timer, if any,
/// and starts a fresh one; a timer that survives the quiet period persists
/// the document's state at that moment. At most one timer is outstanding
/// per debouncer (= per room). A save that has begun always runs to
/// completion: cancellation can only land on the waiting sleep.
///
/// Save failures are logged, not retried, and do not affect future
/// scheduling.
#[derive(Clone)]
pub struct SnapshotDebouncer {
    shared: Arc<DebounceShared>,
}

struct DebounceShared {
    snapshots: SnapshotStore,
    sheet_id: String,
    doc: SheetDoc,
    save_delay: Duration,
    runtime: tokio::runtime::Handle,
    pending: Mutex<Option<PendingSave>>,
    generation: AtomicU64,
    save_count: AtomicUsize,
}

struct PendingSave {
    generation: u64,
    task: JoinHandle<()>,
}

impl SnapshotDebouncer {
    /// Bind a debouncer to one sheet's document, capturing the current
    /// tokio runtime for timer tasks.
    ///
    /// Panics outside a runtime context; rooms construct their debouncer
    /// during the (async) start sequence.
    pub fn new(
        snapshots: SnapshotStore,
        sheet_id: impl Into<String>,
        doc: SheetDoc,
        config: DebounceConfig,
    ) -> Self {
        Self {
            shared: Arc::new(DebounceShared {
                snapshots,
                sheet_id: sheet_id.into(),
                doc,
                save_delay: config.save_delay,
                runtime: tokio::runtime::Handle::current(),
                pending: Mutex::new(None),
                generation: AtomicU64::new(0),
                save_count: AtomicUsize::new(0),
            }),
        }
    }

    /// Reset the quiet-period timer. Called on every change notification.
    pub fn schedule(&self) {
        let shared = self.shared.clone();
        let generation = shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        log::debug!(
            "sheet {}: snapshot scheduled in {:?}",
            shared.sheet_id,
            shared.save_delay
        );

        let runtime = shared.runtime.clone();
        let task = runtime.spawn(async move {
            tokio::time::sleep(shared.save_delay).await;
            shared.save_now();
            // Only clear the slot if no newer timer replaced this one.
            let mut pending = shared.pending.lock().expect("debounce mutex poisoned");
            if pending
                .as_ref()
                .is_some_and(|p| p.generation == generation)
            {
                *pending = None;
            }
        });

        let mut pending = self.shared.pending.lock().expect("debounce mutex poisoned");
        if let Some(previous) = pending.replace(PendingSave { generation, task }) {
            previous.task.abort();
        }
    }

    /// Cancel any pending timer and, if one was outstanding, save now.
    ///
    /// Unlike the timer path, failures surface to the caller; used at
    /// shutdown and in tests.
    pub async fn flush(&self) -> Result<()> {
        let taken = self
            .shared
            .pending
            .lock()
            .expect("debounce mutex poisoned")
            .take();
        let Some(pending) = taken else {
            return Ok(());
        };

        pending.task.abort();
        match pending.task.await {
            // The timer had already fired; its save ran to completion.
            Ok(()) => return Ok(()),
            Err(err) if err.is_cancelled() => {}
            Err(err) => {
                log::error!(
                    "pending snapshot task failed for sheet {}: {err}",
                    self.shared.sheet_id
                );
            }
        }

        let state = self.shared.doc.export_state();
        self.shared.snapshots.save(&self.shared.sheet_id, &state)?;
        self.shared.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Number of snapshot saves that completed successfully.
    pub fn save_count(&self) -> usize {
        self.shared.save_count.load(Ordering::SeqCst)
    }

    /// Whether a timer is currently outstanding.
    pub fn has_pending(&self) -> bool {
        self.shared
            .pending
            .lock()
            .expect("debounce mutex poisoned")
            .is_some()
    }
}

impl DebounceShared {
    fn save_now(&self) {
        let state = self.doc.export_state();
        match self.snapshots.save(&self.sheet_id, &state) {
            Ok(()) => {
                self.save_count.fetch_add(1, Ordering::SeqCst);
            }
            Err(err) => {
                log::warn!("snapshot save failed for sheet {}: {err}", self.sheet_id);
            }
        }
    }
}

impl fmt::Debug for SnapshotDebouncer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotDebouncer")
            .field("sheet_id", &self.shared.sheet_id)
            .field("save_delay", &self.shared.save_delay)
            .field("save_count", &self.save_count())
            .finish_non_exhaustive()
    }
}
