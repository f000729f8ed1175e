pub mod events;
pub mod ocr;
pub mod page;
pub mod selection;

pub use events::{InputEvent, KeyCode};
pub use page::{OverlayBusy, OverlayLease, PageContext};
pub use selection::{CancelReason, Rect, SELECTION_MIN_SIZE};
