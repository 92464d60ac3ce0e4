use nanosheet_model::SheetDoc;
use nanosheet_storage::{BlobStore, DebounceConfig, SnapshotDebouncer, SnapshotStore};
use std::io;
use std::time::Duration;

fn debouncer_for(
    snapshots: &SnapshotStore,
    sheet_id: &str,
    delay_ms: u64,
) -> (SheetDoc, SnapshotDebouncer) {
    let doc = SheetDoc::new();
    let debouncer = SnapshotDebouncer::new(
        snapshots.clone(),
        sheet_id,
        doc.clone(),
        DebounceConfig {
            save_delay: Duration::from_millis(delay_ms),
        },
    );
    let wired = debouncer.clone();
    doc.observe(move |_| wired.schedule());
    (doc, debouncer)
}

#[tokio::test(flavor = "current_thread")]
async fn burst_of_mutations_saves_once_after_quiet_period() {
    let snapshots = SnapshotStore::open_in_memory();
    let (doc, debouncer) = debouncer_for(&snapshots, "sheet-1", 200);

    for i in 0..5 {
        doc.transact(|txn| txn.append_row(format!("r-{i}")));
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    // 100ms after the last mutation: still inside the quiet period.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(debouncer.save_count(), 0, "saved before the quiet period");
    assert!(debouncer.has_pending());

    // Well past the quiet period: exactly one save, covering all 5 edits.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(debouncer.save_count(), 1);
    assert!(!debouncer.has_pending());

    let state = snapshots.load("sheet-1").expect("snapshot present");
    assert_eq!(state.row_order.len(), 5);
}

#[tokio::test(flavor = "current_thread")]
async fn rooms_schedule_independently() {
    let snapshots = SnapshotStore::open_in_memory();
    let (doc_a, debouncer_a) = debouncer_for(&snapshots, "sheet-a", 200);
    let (doc_b, debouncer_b) = debouncer_for(&snapshots, "sheet-b", 200);

    doc_a.transact(|txn| txn.append_row("r-a"));
    tokio::time::sleep(Duration::from_millis(150)).await;
    doc_b.transact(|txn| txn.append_row("r-b"));

    // 270ms in: sheet-a's timer (due at 200ms) fired; sheet-b's (due at
    // 350ms) must not have been disturbed or hurried by it.
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(debouncer_a.save_count(), 1);
    assert_eq!(debouncer_b.save_count(), 0);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(debouncer_a.save_count(), 1);
    assert_eq!(debouncer_b.save_count(), 1);

    assert!(snapshots.load("sheet-a").is_some());
    assert!(snapshots.load("sheet-b").is_some());
}

#[tokio::test(flavor = "current_thread")]
async fn flush_persists_pending_changes_immediately() {
    let snapshots = SnapshotStore::open_in_memory();
    let (doc, debouncer) = debouncer_for(&snapshots, "sheet-1", 60_000);

    doc.transact(|txn| txn.append_row("r-0"));
    assert!(debouncer.has_pending());

    debouncer.flush().await.expect("flush");
    assert_eq!(debouncer.save_count(), 1);
    assert!(!debouncer.has_pending());
    assert!(snapshots.load("sheet-1").is_some());

    // Flushing with nothing outstanding is a no-op.
    debouncer.flush().await.expect("idle flush");
    assert_eq!(debouncer.save_count(), 1);
}

/// Blob store whose writes always fail, for exercising the save-failure
/// path.
#[derive(Debug, Default)]
struct BrokenBlobStore;

impl BlobStore for BrokenBlobStore {
    fn read(&self, _path: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(None)
    }

    fn write(&self, _path: &str, _bytes: &[u8]) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Other, "write refused"))
    }

    fn delete(&self, _path: &str) -> io::Result<()> {
        Ok(())
    }

    fn list(&self, _prefix: &str) -> io::Result<Vec<String>> {
        Ok(Vec::new())
    }
}

#[tokio::test(flavor = "current_thread")]
async fn save_failure_is_tolerated_and_does_not_block_rescheduling() {
    let snapshots = SnapshotStore::new(std::sync::Arc::new(BrokenBlobStore));
    let (doc, debouncer) = debouncer_for(&snapshots, "sheet-1", 50);

    doc.transact(|txn| txn.append_row("r-0"));
    tokio::time::sleep(Duration::from_millis(150)).await;

    // The timer fired, the save failed, nothing panicked or retried.
    assert_eq!(debouncer.save_count(), 0);
    assert!(!debouncer.has_pending());

    // A later mutation schedules a fresh cycle as usual.
    doc.transact(|txn| txn.append_row("r-1"));
    assert!(debouncer.has_pending());
}
