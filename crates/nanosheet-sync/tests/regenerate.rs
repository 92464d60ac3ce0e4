use nanosheet_storage::DebounceConfig;
use nanosheet_sync::{RegenerateSummary, RoomRegistry, SheetSync};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn sync() -> SheetSync {
    SheetSync::new(Arc::new(RoomRegistry::new(None, DebounceConfig::default())))
}

fn lane(cards: &[&str]) -> Vec<String> {
    cards.iter().map(|c| c.to_string()).collect()
}

#[tokio::test(flavor = "current_thread")]
async fn variable_occupancy_lanes_fill_from_row_zero() {
    let sync = sync();

    let summary = sync
        .regenerate_sheet(
            "sheet-1",
            &[
                lane(&["a0", "a1"]),
                lane(&["b0", "b1", "b2", "b3"]),
                lane(&["c0"]),
            ],
        )
        .await;

    assert_eq!(
        summary,
        RegenerateSummary {
            rows: 4,
            lanes: 3,
            cards: 7,
        }
    );

    let room = sync.registry().get("sheet-1").expect("room");
    let state = room.doc().export_state();

    assert_eq!(state.col_order, vec!["c-0", "c-1", "c-2"]);
    assert_eq!(state.row_order.len(), 4);

    // Generated row ids are fresh and distinct.
    let distinct: HashSet<&String> = state.row_order.iter().collect();
    assert_eq!(distinct.len(), 4);
    assert!(state.row_order.iter().all(|r| r.starts_with("r-")));

    // Bulk layout is absolute: lane i's cards sit at row indices 0..n with
    // no header offset.
    let rows = &state.row_order;
    let card_at = |row: usize, lane: &str| {
        state.cell(&rows[row], lane).map(|c| c.card_id.clone())
    };
    assert_eq!(card_at(0, "c-0"), Some("a0".into()));
    assert_eq!(card_at(1, "c-0"), Some("a1".into()));
    assert_eq!(card_at(2, "c-0"), None);
    assert_eq!(card_at(3, "c-1"), Some("b3".into()));
    assert_eq!(card_at(0, "c-2"), Some("c0".into()));
    assert_eq!(card_at(1, "c-2"), None);
    assert_eq!(state.cells.len(), 7);
}

#[tokio::test(flavor = "current_thread")]
async fn regenerate_replaces_previous_contents() {
    let sync = sync();

    sync.regenerate_sheet("sheet-1", &[lane(&["old-0", "old-1"])])
        .await;
    let room = sync.registry().get("sheet-1").expect("room");
    let old_rows = room.doc().row_order();

    sync.regenerate_sheet("sheet-1", &[lane(&["new-0"]), lane(&["new-1"])])
        .await;
    let state = room.doc().export_state();

    assert_eq!(state.col_order, vec!["c-0", "c-1"]);
    assert_eq!(state.row_order.len(), 1);
    assert!(state.row_order.iter().all(|r| !old_rows.contains(r)));
    let occupants: HashSet<String> =
        state.cells.values().map(|c| c.card_id.clone()).collect();
    assert_eq!(
        occupants,
        HashSet::from(["new-0".to_string(), "new-1".to_string()])
    );
}

#[tokio::test(flavor = "current_thread")]
async fn regenerate_is_one_transaction() {
    let sync = sync();

    // Materialize the room first so the observer sees only the regenerate.
    let room = sync.registry().get_or_create("sheet-1").await;
    let notifications = Arc::new(AtomicUsize::new(0));
    let seen = notifications.clone();
    room.doc().observe(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    });

    sync.regenerate_sheet("sheet-1", &[lane(&["a", "b"]), lane(&["c"])])
        .await;

    assert_eq!(notifications.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn empty_plan_clears_the_sheet() {
    let sync = sync();

    sync.regenerate_sheet("sheet-1", &[lane(&["a"])]).await;
    let summary = sync.regenerate_sheet("sheet-1", &[]).await;

    assert_eq!(
        summary,
        RegenerateSummary {
            rows: 0,
            lanes: 0,
            cards: 0,
        }
    );
    let room = sync.registry().get("sheet-1").expect("room");
    assert!(room.doc().export_state().is_empty());
}
