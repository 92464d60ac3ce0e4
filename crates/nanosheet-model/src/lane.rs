use crate::cell::{cell_key, CellEntry};
use crate::doc::SheetDoc;
use thiserror::Error;

/// Error returned by [`SheetDoc::insert_card_at_front_of_lane`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LaneInsertError {
    /// The target slot, or the shift it requires, falls past the last row.
    #[error(
        "lane {lane_id}: target position {target_position} needs more rows (sheet has {row_count})"
    )]
    RowCapacityExhausted {
        lane_id: String,
        target_position: usize,
        row_count: usize,
    },
}

impl SheetDoc {
    /// Insert `card_id` near the top of `lane_id`, shifting existing
    /// occupants one row down.
    ///
    /// Row index 0 is the frozen header row; the card lands at row index
    /// `1 + offset`. The offset is caller-supplied so a batch of
    /// near-simultaneous inserts into one lane keeps its relative order.
    ///
    /// Fails without mutating when the target position is past the last
    /// row, or when the lane's bottom-most occupant has no row left to
    /// shift into; growing the sheet is the caller's job. Cells outside
    /// `lane_id` are never touched.
    pub fn insert_card_at_front_of_lane(
        &self,
        lane_id: &str,
        card_id: &str,
        offset: usize,
    ) -> Result<(), LaneInsertError> {
        self.transact(|txn| {
            let rows = txn.state().row_order.clone();
            let target_position = 1 + offset;
            let out_of_capacity = || LaneInsertError::RowCapacityExhausted {
                lane_id: lane_id.to_string(),
                target_position,
                row_count: rows.len(),
            };

            if target_position >= rows.len() {
                return Err(out_of_capacity());
            }

            // Occupied cells of this lane at or after the target, in row order.
            let mut occupants: Vec<(usize, CellEntry)> = Vec::new();
            for (index, row_id) in rows.iter().enumerate().skip(target_position) {
                if let Some(entry) = txn.state().cells.get(&cell_key(row_id, lane_id)) {
                    occupants.push((index, entry.clone()));
                }
            }

            // An occupant in the last row has nowhere to shift into.
            if occupants
                .last()
                .is_some_and(|&(index, _)| index + 1 >= rows.len())
            {
                return Err(out_of_capacity());
            }

            // All checks passed; every edit below lands. Shift bottom-up so a
            // not-yet-moved occupant is never overwritten.
            for (index, entry) in occupants.into_iter().rev() {
                txn.take_cell_entry(&rows[index], lane_id);
                txn.put_cell_entry(&rows[index + 1], lane_id, entry);
            }

            txn.set_cell(&rows[target_position], lane_id, Some(card_id));
            Ok(())
        })
    }
}
