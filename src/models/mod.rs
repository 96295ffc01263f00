//! Allocation domain models.
//!
//! Provides the data types shared by the allocators and the scheduling
//! operations.
//!
//! # Domain Mappings
//!
//! | u-due | Spaced repetition host |
//! |-------|------------------------|
//! | Item | Card being rescheduled |
//! | GroupMember::Anchor | Most recent sibling review |
//! | DayLoad | Cards due per day per preset |
//! | PreferenceWeights | Easy/free/busy day settings |
//! | Assignment | New due days to write back |

mod assignment;
mod calendar;
mod card;
mod item;
mod load;

pub use assignment::Assignment;
pub use calendar::{DayPreference, PreferenceWeights, Timeline};
pub use card::{Card, CardQueue, CardUpdate, MemoryState, ENGINE_TAG};
pub use item::{CardId, DayRange, GroupMember, Item, NoteId, PresetId};
pub use load::DayLoad;
