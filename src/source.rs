//! Media sources and the live element they are bound to.

mod endpoint;
mod switch;

use async_trait::async_trait;

use crate::catalog::Ticks;
use crate::error::MediaResult;

pub use endpoint::{StreamEndpoint, VideoRequest};
pub use switch::{LogObserver, SourceSwitchCoordinator, SwitchObserver, SwitchOutcome};

/// The stream currently bound to a live element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub uri: String,
    /// MIME type hint for the element, when the URI alone is ambiguous.
    pub container_type: Option<String>,
    /// Human-readable quality or version, e.g. `1080p`.
    pub quality_label: Option<String>,
}

impl SourceDescriptor {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            container_type: None,
            quality_label: None,
        }
    }

    pub fn with_container(mut self, container_type: impl Into<String>) -> Self {
        self.container_type = Some(container_type.into());
        self
    }

    pub fn with_quality(mut self, quality_label: impl Into<String>) -> Self {
        self.quality_label = Some(quality_label.into());
        self
    }
}

/// A live, already initialized player instance.
///
/// Implementations wrap whatever renders the media (an audio sink, a video
/// element). Only `load` and `play` may suspend.
#[async_trait(?Send)]
pub trait MediaElement {
    /// Position reported by the element's own clock.
    fn position(&self) -> Ticks;

    fn is_playing(&self) -> bool;

    fn pause(&self);

    /// Replace the bound source. Takes effect on the next `load`.
    fn bind_source(&self, source: &SourceDescriptor);

    /// Drop the bound source and release its transport. The element stays
    /// usable for a later `bind_source`.
    fn clear_source(&self);

    /// Reload transport state for the bound source.
    async fn load(&self) -> MediaResult<()>;

    fn seek(&self, position: Ticks);

    /// Start or resume playback. May be refused by the environment.
    async fn play(&self) -> MediaResult<()>;
}
