//! Best-effort playback reports to the remote session tracker.
//!
//! Session discovery on the server is eventually consistent, so a missing
//! session is "nothing to report" rather than an error. Nothing here is
//! retried and nothing is surfaced to playback controls.

use std::rc::Rc;

use tracing::{debug, warn};

use crate::catalog::{Catalog, ItemId, SessionId, Ticks};
use crate::error::CatalogResult;

/// What happened to a single report.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    /// Delivered to the session hosting the item.
    Sent,
    /// No session plays the item; nothing was sent.
    NoSession,
    /// Lookup or delivery failed; the failure was logged and dropped.
    Failed,
}

/// A report waiting to be delivered.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Start {
        item_id: ItemId,
        position: Ticks,
    },
    Stop {
        item_id: ItemId,
        position: Ticks,
    },
    Progress {
        item_id: ItemId,
        position: Ticks,
        paused: bool,
    },
}

impl Report {
    pub fn item_id(&self) -> &ItemId {
        match self {
            Report::Start { item_id, .. }
            | Report::Stop { item_id, .. }
            | Report::Progress { item_id, .. } => item_id,
        }
    }
}

pub struct SessionReporter<C: Catalog> {
    catalog: Rc<C>,
}

impl<C: Catalog> SessionReporter<C> {
    pub fn new(catalog: Rc<C>) -> Self {
        Self { catalog }
    }

    /// Announce playback of `item_id` in this client's session.
    pub async fn report_start(&self, item_id: &ItemId, position: Ticks) -> ReportOutcome {
        let session = match self.catalog.current_session().await {
            Ok(Some(session)) => session,
            Ok(None) => {
                debug!(item = %item_id, "no client session yet, skipping start report");
                return ReportOutcome::NoSession;
            }
            Err(e) => {
                warn!(item = %item_id, "client session lookup failed: {e}");
                return ReportOutcome::Failed;
            }
        };
        let result = self
            .catalog
            .report_playback_start(&session, item_id, position)
            .await;
        settle("start", item_id, result)
    }

    /// Report where playback of `item_id` stopped.
    pub async fn report_stop(&self, item_id: &ItemId, position: Ticks) -> ReportOutcome {
        let session = match self.lookup(item_id).await {
            Ok(session) => session,
            Err(outcome) => return outcome,
        };
        let result = self
            .catalog
            .report_stop_position(&session, item_id, position)
            .await;
        settle("stop", item_id, result)
    }

    /// Report the current position of `item_id`.
    pub async fn report_progress(
        &self,
        item_id: &ItemId,
        position: Ticks,
        paused: bool,
    ) -> ReportOutcome {
        let session = match self.lookup(item_id).await {
            Ok(session) => session,
            Err(outcome) => return outcome,
        };
        let result = self
            .catalog
            .report_progress(&session, item_id, position, paused)
            .await;
        settle("progress", item_id, result)
    }

    pub async fn send(&self, report: &Report) -> ReportOutcome {
        match report {
            Report::Start { item_id, position } => self.report_start(item_id, *position).await,
            Report::Stop { item_id, position } => self.report_stop(item_id, *position).await,
            Report::Progress {
                item_id,
                position,
                paused,
            } => self.report_progress(item_id, *position, *paused).await,
        }
    }

    async fn lookup(&self, item_id: &ItemId) -> Result<SessionId, ReportOutcome> {
        match self.catalog.find_session_for_item(item_id).await {
            Ok(Some(session)) => Ok(session),
            Ok(None) => {
                debug!(item = %item_id, "no session plays this item, skipping report");
                Err(ReportOutcome::NoSession)
            }
            Err(e) => {
                warn!(item = %item_id, "session lookup failed: {e}");
                Err(ReportOutcome::Failed)
            }
        }
    }
}

fn settle(kind: &str, item_id: &ItemId, result: CatalogResult<()>) -> ReportOutcome {
    match result {
        Ok(()) => {
            debug!(item = %item_id, kind, "report sent");
            ReportOutcome::Sent
        }
        Err(e) => {
            warn!(item = %item_id, kind, "report dropped: {e}");
            ReportOutcome::Failed
        }
    }
}
