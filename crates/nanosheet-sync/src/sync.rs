use crate::registry::RoomRegistry;
use nanosheet_model::{CardFields, FieldValue, LaneInsertError};
use std::sync::Arc;
use uuid::Uuid;

/// Outcome of a full-sheet regeneration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegenerateSummary {
    pub rows: usize,
    pub lanes: usize,
    pub cards: usize,
}

/// Mirror-side operation surface consumed by the card/media API.
///
/// The system-of-record database remains the source of truth for card
/// entities; these operations keep live documents in step for connected
/// clients. Each one resolves the target room through the registry
/// (creating and starting it if needed) and runs a single transaction
/// against its document.
///
/// Ordering contract for callers: write card metadata before, or together
/// with, the cell placement that references it, so clients never render a
/// cell with no card behind it.
#[derive(Clone, Debug)]
pub struct SheetSync {
    rooms: Arc<RoomRegistry>,
}

impl SheetSync {
    pub fn new(rooms: Arc<RoomRegistry>) -> Self {
        Self { rooms }
    }

    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.rooms
    }

    /// Create or update a card's metadata, merging `fields` into any
    /// existing map.
    pub async fn upsert_card(&self, sheet_id: &str, card_id: &str, fields: CardFields) {
        let room = self.rooms.get_or_create(sheet_id).await;
        room.doc().transact(|txn| txn.upsert_card(card_id, fields));
        log::debug!("synced card {card_id} to sheet {sheet_id}");
    }

    /// Set a single card field, or delete it with `None`. The card map is
    /// created if it does not yet exist.
    pub async fn set_card_field(
        &self,
        sheet_id: &str,
        card_id: &str,
        field: &str,
        value: Option<FieldValue>,
    ) {
        let room = self.rooms.get_or_create(sheet_id).await;
        room.doc()
            .transact(|txn| txn.set_card_field(card_id, field, value));
    }

    /// Drop a card's metadata map. Removing an unknown card is a logged
    /// no-op. Cells referencing the card are left alone; clear them with
    /// [`set_cell`](Self::set_cell).
    pub async fn remove_card(&self, sheet_id: &str, card_id: &str) -> bool {
        let room = self.rooms.get_or_create(sheet_id).await;
        let removed = room.doc().transact(|txn| txn.remove_card(card_id));
        if removed {
            log::debug!("removed card {card_id} from sheet {sheet_id}");
        } else {
            log::warn!("card {card_id} not found in sheet {sheet_id}");
        }
        removed
    }

    /// Assign a card to a cell, or clear the cell with `None`.
    pub async fn set_cell(
        &self,
        sheet_id: &str,
        row_id: &str,
        lane_id: &str,
        card_id: Option<&str>,
    ) {
        let room = self.rooms.get_or_create(sheet_id).await;
        room.doc()
            .transact(|txn| txn.set_cell(row_id, lane_id, card_id));
    }

    /// Append a row, or insert it at `position`.
    pub async fn add_row(&self, sheet_id: &str, row_id: &str, position: Option<usize>) {
        let room = self.rooms.get_or_create(sheet_id).await;
        room.doc().transact(|txn| match position {
            Some(at) => txn.insert_row(at, row_id),
            None => txn.append_row(row_id),
        });
    }

    /// Append a lane, or insert it at `position`.
    pub async fn add_column(&self, sheet_id: &str, lane_id: &str, position: Option<usize>) {
        let room = self.rooms.get_or_create(sheet_id).await;
        room.doc().transact(|txn| match position {
            Some(at) => txn.insert_col(at, lane_id),
            None => txn.append_col(lane_id),
        });
    }

    /// Insert a card at the front of a lane (row index `1 + offset`, after
    /// the frozen header row), shifting existing occupants one row down.
    pub async fn insert_card_at_front_of_lane(
        &self,
        sheet_id: &str,
        lane_id: &str,
        card_id: &str,
        offset: usize,
    ) -> Result<(), LaneInsertError> {
        let room = self.rooms.get_or_create(sheet_id).await;
        let result = room
            .doc()
            .insert_card_at_front_of_lane(lane_id, card_id, offset);
        match &result {
            Ok(()) => log::debug!("inserted card {card_id} into lane {lane_id} of {sheet_id}"),
            Err(err) => log::warn!("sheet {sheet_id}: {err}"),
        }
        result
    }

    /// Delete the whole sheet's contents in one transaction.
    pub async fn clear_sheet(&self, sheet_id: &str) {
        let room = self.rooms.get_or_create(sheet_id).await;
        room.doc().transact(|txn| txn.clear_all());
        log::info!("cleared sheet {sheet_id}");
    }

    /// Rebuild a sheet from scratch in one transaction: clear all state,
    /// create lanes `c-0..`, create as many rows as the fullest lane needs,
    /// then fill lane `i` with `cards_per_lane[i]` in row order starting at
    /// row index 0.
    ///
    /// Bulk layout uses absolute row positions — no header offset — unlike
    /// the interactive front-of-lane insert; the header row convention only
    /// applies once users start dropping cards into a populated sheet.
    pub async fn regenerate_sheet(
        &self,
        sheet_id: &str,
        cards_per_lane: &[Vec<String>],
    ) -> RegenerateSummary {
        let room = self.rooms.get_or_create(sheet_id).await;

        let row_count = cards_per_lane.iter().map(Vec::len).max().unwrap_or(0);
        let row_ids: Vec<String> = (0..row_count)
            .map(|_| format!("r-{}", Uuid::new_v4()))
            .collect();
        let card_count: usize = cards_per_lane.iter().map(Vec::len).sum();

        room.doc().transact(|txn| {
            txn.clear_all();
            for lane_index in 0..cards_per_lane.len() {
                txn.append_col(format!("c-{lane_index}"));
            }
            for row_id in &row_ids {
                txn.append_row(row_id.clone());
            }
            for (lane_index, lane_cards) in cards_per_lane.iter().enumerate() {
                let lane_id = format!("c-{lane_index}");
                for (row_index, card_id) in lane_cards.iter().enumerate() {
                    txn.set_cell(&row_ids[row_index], &lane_id, Some(card_id));
                }
            }
        });

        let summary = RegenerateSummary {
            rows: row_count,
            lanes: cards_per_lane.len(),
            cards: card_count,
        };
        log::info!(
            "regenerated sheet {sheet_id}: {} lanes, {} rows, {} cards",
            summary.lanes,
            summary.rows,
            summary.cards
        );
        summary
    }
}
