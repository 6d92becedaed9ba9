//! Local playback queue.
//!
//! The controller is the single writer of queue and playback state. Other
//! parts of the engine follow it through [`PlaybackEvent`]s.

mod controller;
mod events;
mod shuffle;
mod types;

pub use controller::QueueController;
pub use events::{Outgoing, PlaybackEvent, Subscription};
pub use shuffle::{IndexPicker, RandomPicker};
pub use types::*;
