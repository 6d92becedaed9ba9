//! "Continue watching": resume and next-up items merged into one list.
//!
//! The two inputs are fetched independently and often overlap (an episode
//! that is half watched is also the next one up). The merge keeps one entry
//! per item, most recently played first.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, warn};

use crate::catalog::{Catalog, CatalogItem, ItemId};
use crate::config::{ContinuationSettings, Settings};
use crate::navigation::{adjacent_items, window_size};

/// Merge resume and next-up items into one de-duplicated list.
///
/// - Items without an id are dropped.
/// - An id seen in both lists is kept once; the first occurrence (resume
///   list first) provides every field except the last-played date, which is
///   the most recent one seen for that id.
/// - Output is sorted by last-played date, newest first. Undated items come
///   last, in the order they were encountered.
pub fn merge_continuation(resume: &[CatalogItem], next_up: &[CatalogItem]) -> Vec<CatalogItem> {
    let mut entries: Vec<(Option<DateTime<Utc>>, CatalogItem)> = Vec::new();
    let mut positions: HashMap<&ItemId, usize> = HashMap::new();

    for item in resume.iter().chain(next_up) {
        let Some(id) = item.identity() else {
            continue;
        };
        match positions.get(id) {
            Some(&pos) => {
                let entry = &mut entries[pos];
                entry.0 = entry.0.max(item.last_played());
            }
            None => {
                positions.insert(id, entries.len());
                entries.push((item.last_played(), item.clone()));
            }
        }
    }

    // Stable: equal keys (including "undated") keep encounter order.
    entries.sort_by(|a, b| b.0.cmp(&a.0));

    entries
        .into_iter()
        .map(|(last_played, mut item)| {
            if let Some(at) = last_played {
                item.set_last_played(at);
            }
            item
        })
        .collect()
}

/// Fetches and merges the continuation list for a user.
pub struct ContinuationService<'a, C: Catalog> {
    catalog: &'a C,
    settings: ContinuationSettings,
    window_size: usize,
}

impl<'a, C: Catalog> ContinuationService<'a, C> {
    pub fn new(catalog: &'a C, settings: &Settings) -> Self {
        Self {
            catalog,
            settings: settings.continuation.clone(),
            window_size: window_size(&settings.navigation),
        }
    }

    /// The merged, ordered continuation list, at most `limit` items long.
    ///
    /// A failed fetch contributes nothing; this never fails.
    pub async fn merged_list(&self, user_id: &str) -> Vec<CatalogItem> {
        let limit = self.settings.limit;
        let resume_limit = limit.saturating_mul(self.settings.resume_limit_factor.max(1));

        let (resume, next_up) = futures::join!(
            self.catalog.fetch_resume_items(user_id, resume_limit),
            self.catalog.fetch_next_up_items(user_id, limit),
        );

        let mut resume = resume.unwrap_or_else(|e| {
            warn!("resume items unavailable, continuing without them: {e}");
            Vec::new()
        });
        let mut next_up = next_up.unwrap_or_else(|e| {
            warn!("next-up items unavailable, continuing without them: {e}");
            Vec::new()
        });

        if self.settings.infer_last_played {
            self.infer_last_played(&mut resume, &mut next_up).await;
        }

        let mut merged = merge_continuation(&resume, &next_up);
        merged.truncate(limit);
        debug!(user_id, count = merged.len(), "continuation list merged");
        merged
    }

    /// Give undated episodes the last-played date of the episode before
    /// them, so a freshly finished episode's successor sorts near the top.
    async fn infer_last_played(&self, resume: &mut [CatalogItem], next_up: &mut [CatalogItem]) {
        let targets: Vec<(usize, usize, ItemId, ItemId)> = [&*resume, &*next_up]
            .into_iter()
            .enumerate()
            .flat_map(|(list, items)| {
                items.iter().enumerate().filter_map(move |(idx, item)| {
                    if !item.is_episode() || item.last_played().is_some() {
                        return None;
                    }
                    item.index_number.filter(|&n| n > 0)?;
                    let id = item.identity()?.clone();
                    let series = item.series_id.clone()?;
                    Some((list, idx, id, series))
                })
            })
            .collect();

        if targets.is_empty() {
            return;
        }

        let windows = join_all(targets.iter().map(|(_, _, id, series)| {
            self.catalog
                .fetch_adjacent_window(series, id, self.window_size)
        }))
        .await;

        for ((list, idx, _, _), window) in targets.into_iter().zip(windows) {
            let window = match window {
                Ok(w) => w,
                Err(e) => {
                    debug!("adjacent window unavailable, keeping item undated: {e}");
                    continue;
                }
            };
            let items = if list == 0 { &mut *resume } else { &mut *next_up };
            let current = &mut items[idx];
            let inferred = adjacent_items(current, &window)
                .previous_item
                .and_then(|prev| prev.last_played());
            if let Some(at) = inferred {
                current.set_last_played(at);
            }
        }
    }
}
