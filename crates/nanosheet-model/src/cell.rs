use serde::{Deserialize, Serialize};

/// Occupancy record for one grid cell.
///
/// Absence of a key in the cells map means the cell is empty. `loading`
/// marks a placeholder whose card media is still being produced; the lane
/// inserter moves whole entries so the flag travels with the card.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellEntry {
    pub card_id: String,
    #[serde(default)]
    pub loading: bool,
}

impl CellEntry {
    pub fn new(card_id: impl Into<String>) -> Self {
        Self {
            card_id: card_id.into(),
            loading: false,
        }
    }

    /// A placeholder entry for a card whose media is still in flight.
    pub fn loading(card_id: impl Into<String>) -> Self {
        Self {
            card_id: card_id.into(),
            loading: true,
        }
    }
}

/// Compose the cells-map key for `(row, lane)`: `"{row_id}:{lane_id}"`.
///
/// This is the addressing scheme shared with clients and the card API.
pub fn cell_key(row_id: &str, lane_id: &str) -> String {
    format!("{row_id}:{lane_id}")
}

/// Split a cells-map key back into `(row_id, lane_id)`.
///
/// Row ids must not contain `:`; the split is on the first separator so a
/// key decomposes into exactly one row id and one lane id.
pub fn split_cell_key(key: &str) -> Option<(&str, &str)> {
    key.split_once(':')
}
