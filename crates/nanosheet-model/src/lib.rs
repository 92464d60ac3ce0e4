//! `nanosheet-model` defines the shared in-memory grid document backing one
//! collaborative sheet: ordered row/lane ids, sparse cell occupancy, and
//! per-card metadata, mutated only through atomic transactions.
//!
//! The crate is intentionally self-contained so it can be reused by:
//! - the snapshot/persistence layer ([`SheetState`] is the snapshot payload)
//! - the room/sync layer that hosts one document per sheet

mod cell;
mod doc;
mod lane;
mod state;
mod value;

pub use cell::{cell_key, split_cell_key, CellEntry};
pub use doc::{ChangeSummary, DocTxn, SheetDoc};
pub use lane::LaneInsertError;
pub use state::SheetState;
pub use value::{CardFields, FieldValue};
