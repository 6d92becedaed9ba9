//! Previous/next item resolution inside a series.
//!
//! Only a small window of siblings around the current item is ever fetched;
//! the full series is never loaded.

use tracing::debug;

use crate::catalog::{Catalog, CatalogItem};
use crate::config::{NavigationSettings, Settings};

/// Narrowest window that can contain previous, current and next.
pub const MIN_WINDOW_SIZE: usize = 3;

/// Immediate neighbours of an item. Either side is `None` at a boundary or
/// when the item could not be located.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdjacentItems {
    pub previous_item: Option<CatalogItem>,
    pub next_item: Option<CatalogItem>,
}

/// Locate `current` in `window` by id and return its neighbours.
pub fn adjacent_items(current: &CatalogItem, window: &[CatalogItem]) -> AdjacentItems {
    let Some(id) = current.identity() else {
        return AdjacentItems::default();
    };
    let Some(pos) = window.iter().position(|w| w.identity() == Some(id)) else {
        return AdjacentItems::default();
    };

    AdjacentItems {
        previous_item: pos.checked_sub(1).and_then(|p| window.get(p)).cloned(),
        next_item: window.get(pos + 1).cloned(),
    }
}

pub(crate) fn window_size(settings: &NavigationSettings) -> usize {
    settings.window_size.max(MIN_WINDOW_SIZE)
}

/// Fetches sibling windows and resolves neighbours from them.
pub struct Navigator<'a, C: Catalog> {
    catalog: &'a C,
    window_size: usize,
}

impl<'a, C: Catalog> Navigator<'a, C> {
    pub fn new(catalog: &'a C, settings: &Settings) -> Self {
        Self {
            catalog,
            window_size: window_size(&settings.navigation),
        }
    }

    /// Neighbours of `current` within its series.
    ///
    /// Items outside a series (or without an id) resolve to no neighbours
    /// without a request; a failed fetch does the same.
    pub async fn fetch_adjacent(&self, current: &CatalogItem) -> AdjacentItems {
        let (Some(id), Some(series_id)) = (current.identity(), current.series_id.as_ref()) else {
            return AdjacentItems::default();
        };

        match self
            .catalog
            .fetch_adjacent_window(series_id, id, self.window_size)
            .await
        {
            Ok(window) => adjacent_items(current, &window),
            Err(e) => {
                debug!(item = %id, "adjacent window unavailable: {e}");
                AdjacentItems::default()
            }
        }
    }

    /// The item that follows `current`, e.g. for an "up next" prompt.
    pub async fn next_item(&self, current: &CatalogItem) -> Option<CatalogItem> {
        self.fetch_adjacent(current).await.next_item
    }
}
