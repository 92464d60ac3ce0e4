//! Room lifecycle and the sheet-level synchronization surface.
//!
//! One [`Room`] hosts one sheet's shared document plus its persistence
//! wiring; the [`RoomRegistry`] hands out rooms by sheet id, creating and
//! starting them on first access; [`SheetSync`] is the operation surface
//! the card/media API calls to mirror card state into live documents.

mod registry;
mod room;
mod sync;

pub use registry::RoomRegistry;
pub use room::Room;
pub use sync::{RegenerateSummary, SheetSync};
