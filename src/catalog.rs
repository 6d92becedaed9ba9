//! Catalog types and the remote catalog collaborator.
//!
//! The playback core never owns catalog data; it reads the few fields it
//! needs for ordering, de-duplication and adjacency.

mod client;
mod model;

pub use client::Catalog;
pub use model::*;
