use crate::cell::{cell_key, CellEntry};
use crate::value::CardFields;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Full serializable state of one sheet document.
///
/// This is the snapshot payload persisted by the storage layer and the unit
/// applied to a fresh document on room start. `Default` is the empty
/// document.
///
/// Ids within `row_order` and `col_order` are expected pairwise distinct;
/// callers own id generation and the model does not deduplicate.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetState {
    /// Row ids in display order.
    pub row_order: Vec<String>,
    /// Lane (column) ids in display order.
    pub col_order: Vec<String>,
    /// Sparse cell occupancy, keyed by [`cell_key`].
    pub cells: BTreeMap<String, CellEntry>,
    /// Per-card metadata, keyed by card id.
    pub cards: BTreeMap<String, CardFields>,
}

impl SheetState {
    pub fn is_empty(&self) -> bool {
        self.row_order.is_empty()
            && self.col_order.is_empty()
            && self.cells.is_empty()
            && self.cards.is_empty()
    }

    /// Occupancy of `(row, lane)`, if any.
    pub fn cell(&self, row_id: &str, lane_id: &str) -> Option<&CellEntry> {
        self.cells.get(&cell_key(row_id, lane_id))
    }
}
