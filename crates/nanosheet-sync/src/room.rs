use nanosheet_model::SheetDoc;
use nanosheet_storage::{DebounceConfig, SnapshotDebouncer, SnapshotError, SnapshotStore};
use std::fmt;
use std::sync::OnceLock;
use tokio::sync::OnceCell;

/// Live in-memory host for one sheet: the shared document plus its
/// persistence wiring (snapshot load on start, debounced snapshot save on
/// every change).
///
/// Rooms are created by the [`RoomRegistry`](crate::RoomRegistry) on first
/// access and live for the rest of the process; there is no eviction.
pub struct Room {
    sheet_id: String,
    doc: SheetDoc,
    snapshots: Option<SnapshotStore>,
    debounce: DebounceConfig,
    started: OnceCell<()>,
    debouncer: OnceLock<SnapshotDebouncer>,
}

impl Room {
    pub(crate) fn new(
        sheet_id: impl Into<String>,
        snapshots: Option<SnapshotStore>,
        debounce: DebounceConfig,
    ) -> Self {
        Self {
            sheet_id: sheet_id.into(),
            doc: SheetDoc::new(),
            snapshots,
            debounce,
            started: OnceCell::new(),
            debouncer: OnceLock::new(),
        }
    }

    pub fn sheet_id(&self) -> &str {
        &self.sheet_id
    }

    /// The room's document.
    ///
    /// Callers reach rooms through the registry, which always completes the
    /// start sequence first, so persistence wiring is in place by the time
    /// this is mutated.
    pub fn doc(&self) -> &SheetDoc {
        &self.doc
    }

    /// Whether the start sequence has completed.
    pub fn is_ready(&self) -> bool {
        self.started.initialized()
    }

    /// Run the start sequence at most once; concurrent callers await the
    /// same completion.
    ///
    /// An absent or corrupt snapshot leaves the document empty — a room
    /// never hard-fails its start.
    pub async fn ensure_started(&self) {
        self.started.get_or_init(|| async { self.start() }).await;
    }

    fn start(&self) {
        let Some(snapshots) = self.snapshots.clone() else {
            log::warn!(
                "room {}: snapshot persistence not configured, document is in-memory only",
                self.sheet_id
            );
            return;
        };

        if let Some(state) = snapshots.load(&self.sheet_id) {
            self.doc.apply_state(state);
        }

        // Observers attach after the snapshot applies, so loading does not
        // itself schedule a save.
        let debouncer = SnapshotDebouncer::new(
            snapshots,
            self.sheet_id.clone(),
            self.doc.clone(),
            self.debounce,
        );
        let on_change = debouncer.clone();
        self.doc.observe(move |_| on_change.schedule());
        let _ = self.debouncer.set(debouncer);

        log::info!("room {} ready", self.sheet_id);
    }

    /// The room's snapshot debouncer, present once the room has started
    /// with persistence configured.
    pub fn debouncer(&self) -> Option<&SnapshotDebouncer> {
        self.debouncer.get()
    }

    /// Write any pending snapshot now (shutdown/test helper).
    pub async fn flush_snapshot(&self) -> Result<(), SnapshotError> {
        match self.debouncer.get() {
            Some(debouncer) => debouncer.flush().await,
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Room")
            .field("sheet_id", &self.sheet_id)
            .field("ready", &self.is_ready())
            .field("persistent", &self.snapshots.is_some())
            .finish_non_exhaustive()
    }
}
