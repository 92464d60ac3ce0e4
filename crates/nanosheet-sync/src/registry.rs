use crate::room::Room;
use nanosheet_storage::{DebounceConfig, SnapshotStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Process-wide directory of live rooms, keyed by sheet id.
///
/// This is the explicit context object owning persistence configuration:
/// construct one at service startup and share it with every connection
/// handler and API surface. Rooms are never evicted; a sheet id once seen
/// stays resident for the process lifetime.
pub struct RoomRegistry {
    snapshots: Option<SnapshotStore>,
    debounce: DebounceConfig,
    rooms: Mutex<HashMap<String, Arc<Room>>>,
}

impl RoomRegistry {
    /// `snapshots: None` disables persistence; rooms still serve documents,
    /// they just start empty and never save.
    pub fn new(snapshots: Option<SnapshotStore>, debounce: DebounceConfig) -> Self {
        Self {
            snapshots,
            debounce,
            rooms: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch the room for `sheet_id`, creating and starting it on first
    /// access.
    ///
    /// Exactly one room ever exists per sheet id, under any concurrency:
    /// the map insert is atomic, and the returned room has completed (or
    /// joined) its at-most-once start sequence.
    pub async fn get_or_create(&self, sheet_id: &str) -> Arc<Room> {
        let room = {
            let mut rooms = self.rooms.lock().expect("registry mutex poisoned");
            rooms
                .entry(sheet_id.to_string())
                .or_insert_with(|| {
                    Arc::new(Room::new(sheet_id, self.snapshots.clone(), self.debounce))
                })
                .clone()
        };
        room.ensure_started().await;
        room
    }

    /// Peek at an existing room without creating or starting one.
    pub fn get(&self, sheet_id: &str) -> Option<Arc<Room>> {
        self.rooms
            .lock()
            .expect("registry mutex poisoned")
            .get(sheet_id)
            .cloned()
    }

    /// Number of resident rooms.
    pub fn len(&self) -> usize {
        self.rooms.lock().expect("registry mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for RoomRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomRegistry")
            .field("rooms", &self.len())
            .field("persistent", &self.snapshots.is_some())
            .finish_non_exhaustive()
    }
}
