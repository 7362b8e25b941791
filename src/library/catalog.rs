//! Catalog arrangement: duration filter plus a stable sort.

use std::cmp::Ordering;

use serde::Deserialize;
use tracing::{info, warn};

use super::display::display_title;
use super::error::LibraryError;
use super::model::Track;
use super::scan::TrackSource;

pub const DEFAULT_MIN_DURATION_MS: u64 = 60_000;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOption {
    /// Title (or file name) A–Z, case-insensitive.
    #[default]
    #[serde(alias = "alphabetical", alias = "a-z", alias = "title")]
    Alphabetical,
    #[serde(alias = "newest", alias = "date-added-desc")]
    DateAddedNewest,
    #[serde(alias = "oldest", alias = "date-added-asc")]
    DateAddedOldest,
    #[serde(alias = "longest", alias = "duration-desc")]
    DurationLongest,
    #[serde(alias = "shortest", alias = "duration-asc")]
    DurationShortest,
}

impl SortOption {
    pub const ALL: [SortOption; 5] = [
        SortOption::Alphabetical,
        SortOption::DateAddedNewest,
        SortOption::DateAddedOldest,
        SortOption::DurationLongest,
        SortOption::DurationShortest,
    ];

    /// Stable key used when persisting the option.
    pub fn key(self) -> &'static str {
        match self {
            SortOption::Alphabetical => "alphabetical",
            SortOption::DateAddedNewest => "date-added-newest",
            SortOption::DateAddedOldest => "date-added-oldest",
            SortOption::DurationLongest => "duration-longest",
            SortOption::DurationShortest => "duration-shortest",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|o| o.key() == key)
    }

    pub fn label(self) -> &'static str {
        match self {
            SortOption::Alphabetical => "Alphabetical",
            SortOption::DateAddedNewest => "Date added (newest)",
            SortOption::DateAddedOldest => "Date added (oldest)",
            SortOption::DurationLongest => "Duration (longest)",
            SortOption::DurationShortest => "Duration (shortest)",
        }
    }

    /// Next option in settings-cycling order, wrapping around.
    pub fn cycle(self) -> Self {
        let pos = Self::ALL.iter().position(|&o| o == self).unwrap_or(0);
        Self::ALL[(pos + 1) % Self::ALL.len()]
    }

    fn compare(self, a: &Track, b: &Track) -> Ordering {
        match self {
            SortOption::Alphabetical => display_title(a)
                .to_lowercase()
                .cmp(&display_title(b).to_lowercase()),
            SortOption::DateAddedNewest => b.date_added_ms.cmp(&a.date_added_ms),
            SortOption::DateAddedOldest => a.date_added_ms.cmp(&b.date_added_ms),
            SortOption::DurationLongest => b.duration_ms.cmp(&a.duration_ms),
            SortOption::DurationShortest => a.duration_ms.cmp(&b.duration_ms),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CatalogFilter {
    pub filter_short_tracks: bool,
    pub min_duration_ms: u64,
}

impl Default for CatalogFilter {
    fn default() -> Self {
        Self {
            filter_short_tracks: false,
            min_duration_ms: DEFAULT_MIN_DURATION_MS,
        }
    }
}

impl CatalogFilter {
    pub fn keeps(&self, track: &Track) -> bool {
        !self.filter_short_tracks || track.duration_ms >= self.min_duration_ms
    }
}

/// Apply `filter`, then sort stably by `sort`.
pub fn arrange(tracks: &[Track], filter: CatalogFilter, sort: SortOption) -> Vec<Track> {
    let mut out: Vec<Track> = tracks.iter().filter(|t| filter.keeps(t)).cloned().collect();
    out.sort_by(|a, b| sort.compare(a, b));
    out
}

/// Scanned rows plus their arranged view.
#[derive(Debug, Default)]
pub struct Catalog {
    raw: Vec<Track>,
    arranged: Vec<Track>,
    filter: CatalogFilter,
    sort: SortOption,
}

impl Catalog {
    pub fn new(filter: CatalogFilter, sort: SortOption) -> Self {
        Self {
            raw: Vec::new(),
            arranged: Vec::new(),
            filter,
            sort,
        }
    }

    /// Replace the catalog with a fresh query. On failure the previous
    /// contents stay in place.
    pub fn rescan(&mut self, source: &dyn TrackSource) -> Result<usize, LibraryError> {
        match source.query() {
            Ok(rows) => {
                self.raw = rows;
                self.rearrange();
                info!(
                    scanned = self.raw.len(),
                    visible = self.arranged.len(),
                    "catalog replaced"
                );
                Ok(self.arranged.len())
            }
            Err(e) => {
                warn!(error = %e, "scan failed, keeping existing catalog");
                Err(e)
            }
        }
    }

    pub fn set_sort(&mut self, sort: SortOption) {
        self.sort = sort;
        self.rearrange();
    }

    pub fn set_filter(&mut self, filter: CatalogFilter) {
        self.filter = filter;
        self.rearrange();
    }

    pub fn sort(&self) -> SortOption {
        self.sort
    }

    pub fn filter(&self) -> CatalogFilter {
        self.filter
    }

    pub fn tracks(&self) -> &[Track] {
        &self.arranged
    }

    pub fn scanned_len(&self) -> usize {
        self.raw.len()
    }

    fn rearrange(&mut self) {
        self.arranged = arrange(&self.raw, self.filter, self.sort);
    }
}
