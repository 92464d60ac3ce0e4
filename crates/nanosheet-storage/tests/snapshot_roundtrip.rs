use nanosheet_model::{CardFields, CellEntry, FieldValue, SheetDoc};
use nanosheet_storage::SnapshotStore;

fn populated_state() -> nanosheet_model::SheetState {
    let doc = SheetDoc::new();
    doc.transact(|txn| {
        for row in ["r-0", "r-1", "r-2"] {
            txn.append_row(row);
        }
        for lane in ["c-0", "c-1"] {
            txn.append_col(lane);
        }
        txn.set_cell("r-1", "c-0", Some("card-a"));
        txn.put_cell_entry("r-2", "c-1", CellEntry::loading("card-b"));
        txn.upsert_card(
            "card-a",
            [
                ("title".to_string(), FieldValue::from("Teal")),
                ("color".to_string(), FieldValue::from("#4ECDC4")),
                ("number".to_string(), FieldValue::from(12i64)),
            ]
            .into_iter()
            .collect(),
        );
        txn.upsert_card("card-b", CardFields::new());
    });
    doc.export_state()
}

#[test]
fn save_then_load_reproduces_state_in_memory() {
    let snapshots = SnapshotStore::open_in_memory();
    let state = populated_state();

    snapshots.save("sheet-1", &state).expect("save");
    let loaded = snapshots.load("sheet-1").expect("snapshot present");

    assert_eq!(loaded, state);
    // Sequence order survives the codec, not just membership.
    assert_eq!(loaded.row_order, vec!["r-0", "r-1", "r-2"]);
    assert_eq!(loaded.col_order, vec!["c-0", "c-1"]);
}

#[test]
fn save_then_load_reproduces_state_on_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = populated_state();

    {
        let snapshots = SnapshotStore::open_local(dir.path());
        snapshots.save("sheet-1", &state).expect("save");
    }

    // A fresh store over the same directory simulates a process restart.
    let snapshots = SnapshotStore::open_local(dir.path());
    let loaded = snapshots.load("sheet-1").expect("snapshot present");
    assert_eq!(loaded, state);
}

#[test]
fn missing_snapshot_loads_as_absent() {
    let snapshots = SnapshotStore::open_in_memory();
    assert!(snapshots.load("never-saved").is_none());
}

#[test]
fn save_overwrites_previous_snapshot() {
    let snapshots = SnapshotStore::open_in_memory();
    let first = populated_state();
    snapshots.save("sheet-1", &first).expect("first save");

    let doc = SheetDoc::new();
    doc.apply_state(first);
    doc.transact(|txn| {
        txn.append_row("r-3");
        txn.set_cell("r-3", "c-0", Some("card-c"));
    });
    let second = doc.export_state();

    snapshots.save("sheet-1", &second).expect("second save");
    assert_eq!(snapshots.load("sheet-1").expect("present"), second);
}
