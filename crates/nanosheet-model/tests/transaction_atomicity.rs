use nanosheet_model::SheetDoc;
use std::thread;

/// A clear-then-repopulate transaction (the full-sheet regeneration shape)
/// must never expose an intermediate state, e.g. lanes present while rows
/// are absent, to a concurrent reader.
#[test]
fn clear_and_repopulate_never_exposes_partial_state() {
    let doc = SheetDoc::new();
    populate(&doc, 0);

    let writer_doc = doc.clone();
    let writer = thread::spawn(move || {
        for generation in 1..200u32 {
            writer_doc.transact(|txn| {
                txn.clear_all();
                for lane in 0..4 {
                    txn.append_col(format!("c-{lane}"));
                }
                for row in 0..3 {
                    txn.append_row(format!("r-{generation}-{row}"));
                }
                let first_row = format!("r-{generation}-0");
                for lane in 0..4 {
                    txn.set_cell(&first_row, &format!("c-{lane}"), Some("card"));
                }
            });
        }
    });

    for _ in 0..2000 {
        let state = doc.export_state();
        // Lanes and rows appear and disappear together.
        assert_eq!(
            state.col_order.is_empty(),
            state.row_order.is_empty(),
            "reader saw lanes without rows (or rows without lanes)"
        );
        // Every occupied cell references a live row and lane.
        for key in state.cells.keys() {
            let (row_id, lane_id) = nanosheet_model::split_cell_key(key).expect("well-formed key");
            assert!(state.row_order.iter().any(|r| r == row_id));
            assert!(state.col_order.iter().any(|c| c == lane_id));
        }
    }

    writer.join().expect("writer thread");
}

fn populate(doc: &SheetDoc, generation: u32) {
    doc.transact(|txn| {
        for lane in 0..4 {
            txn.append_col(format!("c-{lane}"));
        }
        for row in 0..3 {
            txn.append_row(format!("r-{generation}-{row}"));
        }
    });
}
