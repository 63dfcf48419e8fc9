//! Gallery Index - media gallery aggregation core
//!
//! This library turns a flat, queryable media index into the data a
//! gallery UI consumes:
//! - Typed media records classified from raw index rows
//! - Virtual album buckets (Favorites, Trash, Photos, Videos, real folders)
//! - Date-sectioned timelines with local calendar-day headers
//! - Live snapshot streams that re-run the pipeline on index changes
//! - Keyed snapshot diffing for minimal list updates
//! - Bounded reverse-geocoding for location groups
//!
//! The content index is consumed through the [`index::ContentIndex`]
//! trait; [`index::fs::FsIndex`] is a filesystem-backed implementation
//! used by the CLI and tests.

pub mod album;
pub mod classify;
pub mod config;
pub mod diff;
pub mod error;
pub mod geocode;
pub mod i18n;
pub mod index;
pub mod live;
pub mod predicate;
pub mod record;
pub mod section;

pub use album::{Album, Aggregator};
pub use classify::{classify_row, classify_rows};
pub use config::IndexConfig;
pub use diff::{ListOp, diff};
pub use error::{Error, Result};
pub use geocode::{Geocoder, Place, PlaceResolver};
pub use index::fs::FsIndex;
pub use index::{ContentIndex, QuerySpec, Row, Uri, Value};
pub use live::{LiveQuery, MediaLibrary, Snapshot, observe};
pub use predicate::{Predicate, Selection};
pub use record::{BucketId, MediaKind, MediaRecord, SectionEntry};
pub use section::section_by_day;
