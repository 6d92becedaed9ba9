//! Playback queue, continuation and source-switch engine for media server
//! clients.
//!
//! The crate is organised around a few independent pieces:
//!
//! - [`catalog`]: remote item model and the [`catalog::Catalog`] client seam.
//! - [`continuation`]: merged "continue watching" list.
//! - [`navigation`]: previous/next sibling lookup for episodic items.
//! - [`playback`]: the queue controller and its change events.
//! - [`source`]: media element seam, stream URLs and in-place source switching.
//! - [`reporter`]: best-effort start, stop and progress reports.
//! - [`engine`]: wires the above into one playback surface.
//! - [`media_session`]: OS media controls over MPRIS.

pub mod catalog;
pub mod config;
pub mod continuation;
pub mod engine;
pub mod error;
pub mod media_session;
pub mod navigation;
pub mod playback;
pub mod reporter;
pub mod source;

#[cfg(test)]
mod testing;

pub use catalog::{Catalog, CatalogItem, ItemId, Ticks};
pub use config::Settings;
pub use engine::PlayerEngine;
pub use playback::{PlaybackEvent, PlaybackState, QueueController, QueueSnapshot, Track};
pub use source::{MediaElement, SourceDescriptor, SourceSwitchCoordinator, SwitchOutcome};
