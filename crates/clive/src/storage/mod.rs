//! Persistent record of clips already relayed.

mod clips;

pub use clips::{ClaimGuard, ClipRecord, ClipStore};
