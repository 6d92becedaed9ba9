//! Catalog value types.
//!
//! Field names follow the media server's JSON (`PascalCase`) so responses
//! can be deserialized directly.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier of a catalog item (movie, episode, track, series...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier of a remote playback session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Media server time unit: 10,000,000 ticks per second.
///
/// Signed so that out-of-range requests (a negative seek) can be expressed
/// and clamped instead of wrapping.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Ticks(i64);

impl Ticks {
    pub const PER_SECOND: i64 = 10_000_000;
    pub const ZERO: Ticks = Ticks(0);

    pub const fn new(ticks: i64) -> Self {
        Self(ticks)
    }

    pub const fn from_secs(secs: i64) -> Self {
        Self(secs.saturating_mul(Self::PER_SECOND))
    }

    pub fn from_secs_f64(secs: f64) -> Self {
        if !secs.is_finite() {
            return Self::ZERO;
        }
        Self((secs * Self::PER_SECOND as f64) as i64)
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / Self::PER_SECOND as f64
    }

    /// Convert to a `Duration`; negative values map to zero.
    pub fn as_duration(self) -> Duration {
        let nanos = self.0.max(0) as u128 * 100;
        Duration::from_nanos(nanos.min(u64::MAX as u128) as u64)
    }

    pub fn saturating_add(self, other: Ticks) -> Ticks {
        Ticks(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Ticks) -> Ticks {
        Ticks(self.0.saturating_sub(other.0))
    }

    /// Clamp into `[Ticks::ZERO, max]`. A negative `max` is treated as zero.
    pub fn clamp_to(self, max: Ticks) -> Ticks {
        let max = max.0.max(0);
        Ticks(self.0.clamp(0, max))
    }
}

impl From<Duration> for Ticks {
    fn from(d: Duration) -> Self {
        let ticks = d.as_nanos() / 100;
        Ticks(ticks.min(i64::MAX as u128) as i64)
    }
}

impl fmt::Display for Ticks {
    /// `m:ss`, or `h:mm:ss` past the hour.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.0.max(0) / Self::PER_SECOND;
        let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
        if h > 0 {
            write!(f, "{h}:{m:02}:{s:02}")
        } else {
            write!(f, "{m}:{s:02}")
        }
    }
}

/// Kind of a catalog item, as reported by the server's `Type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Movie,
    Episode,
    Series,
    Season,
    Audio,
    MusicAlbum,
    #[serde(other)]
    Other,
}

/// Per-user state attached to an item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct UserData {
    pub last_played_date: Option<DateTime<Utc>>,
    pub playback_position_ticks: Ticks,
    pub played: bool,
}

/// A catalog item as seen by the playback core.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CatalogItem {
    pub id: Option<ItemId>,
    pub name: Option<String>,
    #[serde(rename = "Type")]
    pub kind: Option<ItemKind>,
    pub series_id: Option<ItemId>,
    pub index_number: Option<u32>,
    pub run_time_ticks: Option<Ticks>,
    pub user_data: Option<UserData>,
}

impl CatalogItem {
    pub fn new(id: impl Into<ItemId>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn with_last_played(mut self, at: DateTime<Utc>) -> Self {
        self.set_last_played(at);
        self
    }

    pub fn with_series(mut self, series_id: impl Into<ItemId>) -> Self {
        self.series_id = Some(series_id.into());
        self
    }

    pub fn with_kind(mut self, kind: ItemKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// The item's identity, if it has a usable one.
    pub fn identity(&self) -> Option<&ItemId> {
        self.id.as_ref().filter(|id| !id.is_empty())
    }

    pub fn last_played(&self) -> Option<DateTime<Utc>> {
        self.user_data.as_ref().and_then(|u| u.last_played_date)
    }

    pub fn set_last_played(&mut self, at: DateTime<Utc>) {
        self.user_data.get_or_insert_with(UserData::default).last_played_date = Some(at);
    }

    pub fn is_episode(&self) -> bool {
        self.kind == Some(ItemKind::Episode)
    }
}
