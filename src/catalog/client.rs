use async_trait::async_trait;

use crate::error::CatalogResult;

use super::model::{CatalogItem, ItemId, SessionId, Ticks};

/// The remote catalog collaborator.
///
/// Every method is one request and one typed response. Implementations own
/// transport, authentication and timeouts; the playback core only decides
/// what to do with the answers (and with failures).
///
/// Futures are not required to be `Send`: the engine runs on a single
/// cooperative thread.
#[async_trait(?Send)]
pub trait Catalog {
    /// Items the user has started but not finished.
    async fn fetch_resume_items(&self, user_id: &str, limit: usize)
    -> CatalogResult<Vec<CatalogItem>>;

    /// The next unwatched item of each series the user is following.
    async fn fetch_next_up_items(
        &self,
        user_id: &str,
        limit: usize,
    ) -> CatalogResult<Vec<CatalogItem>>;

    /// An ordered slice of the series around `current_item_id`.
    async fn fetch_adjacent_window(
        &self,
        series_id: &ItemId,
        current_item_id: &ItemId,
        window_size: usize,
    ) -> CatalogResult<Vec<CatalogItem>>;

    /// The session currently playing `item_id`, if the server knows one.
    async fn find_session_for_item(&self, item_id: &ItemId) -> CatalogResult<Option<SessionId>>;

    /// The session this client plays in. Start reports are addressed to
    /// it, since no other session knows the item yet.
    async fn current_session(&self) -> CatalogResult<Option<SessionId>> {
        Ok(None)
    }

    /// Announce that `item_id` started playing at `position`. This is what
    /// makes the session show up in later lookups.
    async fn report_playback_start(
        &self,
        _session_id: &SessionId,
        _item_id: &ItemId,
        _position: Ticks,
    ) -> CatalogResult<()> {
        Ok(())
    }

    async fn report_stop_position(
        &self,
        session_id: &SessionId,
        item_id: &ItemId,
        position: Ticks,
    ) -> CatalogResult<()>;

    /// Periodic or pause-time progress. Servers that only track stops can
    /// keep the default.
    async fn report_progress(
        &self,
        _session_id: &SessionId,
        _item_id: &ItemId,
        _position: Ticks,
        _paused: bool,
    ) -> CatalogResult<()> {
        Ok(())
    }
}
