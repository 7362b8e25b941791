//! Track catalog: scanning a source, then filtering and sorting the rows.

mod catalog;
mod display;
mod error;
mod model;
mod scan;

pub use catalog::{Catalog, CatalogFilter, DEFAULT_MIN_DURATION_MS, SortOption, arrange};
pub use display::{display_artist, display_title, format_mmss};
pub use error::LibraryError;
pub use model::{Locator, Track};
pub use scan::{DirectorySource, TrackSource};
