use crate::cell::{cell_key, CellEntry};
use crate::state::SheetState;
use crate::value::{CardFields, FieldValue};
use std::collections::btree_map::Entry;
use std::sync::{Arc, Mutex};

/// Which parts of the document a transaction touched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChangeSummary {
    pub row_order: bool,
    pub col_order: bool,
    pub cells: bool,
    pub cards: bool,
}

impl ChangeSummary {
    pub fn any(self) -> bool {
        self.row_order || self.col_order || self.cells || self.cards
    }
}

type Observer = Box<dyn Fn(ChangeSummary) + Send + Sync>;

/// Shared, mutable grid state for one sheet.
///
/// `SheetDoc` is a cheap-to-clone handle; all clones view the same document.
/// Every mutation happens inside [`SheetDoc::transact`], which holds the
/// document lock for the whole closure: readers never observe a
/// partially-applied transaction, and mutations on one document are
/// serialized in lock-acquisition order.
#[derive(Clone, Default)]
pub struct SheetDoc {
    shared: Arc<DocShared>,
}

#[derive(Default)]
struct DocShared {
    state: Mutex<SheetState>,
    observers: Mutex<Vec<Observer>>,
}

impl SheetDoc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a change observer.
    ///
    /// Observers run after the transaction lock is released and are invoked
    /// exactly once per transaction that performed at least one edit,
    /// regardless of how many edits it batched.
    pub fn observe(&self, observer: impl Fn(ChangeSummary) + Send + Sync + 'static) {
        self.shared
            .observers
            .lock()
            .expect("observer mutex poisoned")
            .push(Box::new(observer));
    }

    /// Run `f` as one atomic transaction over the document.
    ///
    /// All edits made through the [`DocTxn`] become visible together. The
    /// closure must not block on other documents or I/O; it runs under the
    /// document lock.
    pub fn transact<T>(&self, f: impl FnOnce(&mut DocTxn<'_>) -> T) -> T {
        let (out, changes) = {
            let mut state = self.shared.state.lock().expect("document mutex poisoned");
            let mut txn = DocTxn {
                state: &mut state,
                changes: ChangeSummary::default(),
            };
            let out = f(&mut txn);
            (out, txn.changes)
        };

        if changes.any() {
            let observers = self.shared.observers.lock().expect("observer mutex poisoned");
            for observer in observers.iter() {
                observer(changes);
            }
        }
        out
    }

    pub fn row_order(&self) -> Vec<String> {
        self.lock_state().row_order.clone()
    }

    pub fn col_order(&self) -> Vec<String> {
        self.lock_state().col_order.clone()
    }

    /// Occupancy of `(row, lane)`, if any.
    pub fn cell(&self, row_id: &str, lane_id: &str) -> Option<CellEntry> {
        self.lock_state().cell(row_id, lane_id).cloned()
    }

    /// Metadata fields for `card_id`, if the card map exists.
    pub fn card(&self, card_id: &str) -> Option<CardFields> {
        self.lock_state().cards.get(card_id).cloned()
    }

    /// A consistent copy of the whole document.
    pub fn export_state(&self) -> SheetState {
        self.lock_state().clone()
    }

    /// Replace the whole document in one transaction (snapshot load path).
    pub fn apply_state(&self, state: SheetState) {
        self.transact(|txn| txn.replace(state));
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SheetState> {
        self.shared.state.lock().expect("document mutex poisoned")
    }
}

impl std::fmt::Debug for SheetDoc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock_state();
        f.debug_struct("SheetDoc")
            .field("rows", &state.row_order.len())
            .field("lanes", &state.col_order.len())
            .field("cells", &state.cells.len())
            .field("cards", &state.cards.len())
            .finish()
    }
}

/// Edit handle passed to [`SheetDoc::transact`] closures.
///
/// Each primitive records which document part it touched; the owning
/// transaction reports the merged summary once on commit.
pub struct DocTxn<'a> {
    state: &'a mut SheetState,
    changes: ChangeSummary,
}

impl DocTxn<'_> {
    /// Read view of the in-transaction state.
    pub fn state(&self) -> &SheetState {
        self.state
    }

    pub fn append_row(&mut self, row_id: impl Into<String>) {
        self.state.row_order.push(row_id.into());
        self.changes.row_order = true;
    }

    /// Insert a row id at `position` (clamped to the current length).
    pub fn insert_row(&mut self, position: usize, row_id: impl Into<String>) {
        let at = position.min(self.state.row_order.len());
        self.state.row_order.insert(at, row_id.into());
        self.changes.row_order = true;
    }

    pub fn append_col(&mut self, lane_id: impl Into<String>) {
        self.state.col_order.push(lane_id.into());
        self.changes.col_order = true;
    }

    /// Insert a lane id at `position` (clamped to the current length).
    pub fn insert_col(&mut self, position: usize, lane_id: impl Into<String>) {
        let at = position.min(self.state.col_order.len());
        self.state.col_order.insert(at, lane_id.into());
        self.changes.col_order = true;
    }

    /// Place `card_id` in the cell, or clear the cell with `None`.
    ///
    /// Clearing an already-empty cell is a no-op and does not count as an
    /// edit.
    pub fn set_cell(&mut self, row_id: &str, lane_id: &str, card_id: Option<&str>) {
        let key = cell_key(row_id, lane_id);
        match card_id {
            Some(card_id) => {
                self.state.cells.insert(key, CellEntry::new(card_id));
                self.changes.cells = true;
            }
            None => {
                if self.state.cells.remove(&key).is_some() {
                    self.changes.cells = true;
                }
            }
        }
    }

    /// Remove and return the whole entry at `(row, lane)`.
    pub fn take_cell_entry(&mut self, row_id: &str, lane_id: &str) -> Option<CellEntry> {
        let taken = self.state.cells.remove(&cell_key(row_id, lane_id));
        if taken.is_some() {
            self.changes.cells = true;
        }
        taken
    }

    /// Store a whole entry at `(row, lane)`, replacing any occupant.
    pub fn put_cell_entry(&mut self, row_id: &str, lane_id: &str, entry: CellEntry) {
        self.state.cells.insert(cell_key(row_id, lane_id), entry);
        self.changes.cells = true;
    }

    /// Set one field on a card, or delete it with `None`.
    ///
    /// The card map is created if it does not yet exist, for both branches.
    pub fn set_card_field(&mut self, card_id: &str, field: &str, value: Option<FieldValue>) {
        let created = !self.state.cards.contains_key(card_id);
        let fields = self.state.cards.entry(card_id.to_string()).or_default();
        match value {
            Some(value) => {
                fields.insert(field.to_string(), value);
                self.changes.cards = true;
            }
            None => {
                let removed = fields.remove(field).is_some();
                if created || removed {
                    self.changes.cards = true;
                }
            }
        }
    }

    /// Merge `fields` into the card map, creating it if absent.
    ///
    /// Existing fields not named in `fields` survive.
    pub fn upsert_card(&mut self, card_id: &str, fields: CardFields) {
        match self.state.cards.entry(card_id.to_string()) {
            Entry::Occupied(mut existing) => {
                if fields.is_empty() {
                    return;
                }
                existing.get_mut().extend(fields);
                self.changes.cards = true;
            }
            Entry::Vacant(vacant) => {
                vacant.insert(fields);
                self.changes.cards = true;
            }
        }
    }

    /// Remove a card's metadata map. Returns false (no edit) when absent.
    pub fn remove_card(&mut self, card_id: &str) -> bool {
        let removed = self.state.cards.remove(card_id).is_some();
        if removed {
            self.changes.cards = true;
        }
        removed
    }

    /// Delete the entire row order, lane order, all cells and all card
    /// metadata. Used by full-sheet regeneration before repopulating.
    pub fn clear_all(&mut self) {
        if !self.state.row_order.is_empty() {
            self.state.row_order.clear();
            self.changes.row_order = true;
        }
        if !self.state.col_order.is_empty() {
            self.state.col_order.clear();
            self.changes.col_order = true;
        }
        if !self.state.cells.is_empty() {
            self.state.cells.clear();
            self.changes.cells = true;
        }
        if !self.state.cards.is_empty() {
            self.state.cards.clear();
            self.changes.cards = true;
        }
    }

    pub(crate) fn replace(&mut self, state: SheetState) {
        *self.state = state;
        self.changes = ChangeSummary {
            row_order: true,
            col_order: true,
            cells: true,
            cards: true,
        };
    }
}
