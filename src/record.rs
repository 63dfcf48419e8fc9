//! Core value types: media records, bucket identifiers, section entries
//!
//! Records are immutable snapshots of one content-index row. They are
//! rebuilt wholesale on every classification pass; nothing in this module
//! mutates after construction.

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Kind of a media record
///
/// The content index encodes the kind as an integer; only the image and
/// video codes are valid input, everything else is rejected by the
/// classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Media-type code used by the content index for images
    pub const IMAGE_CODE: i64 = 1;
    /// Media-type code used by the content index for videos
    pub const VIDEO_CODE: i64 = 3;

    /// Map a content-index media-type code to a kind
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            Self::IMAGE_CODE => Some(MediaKind::Image),
            Self::VIDEO_CODE => Some(MediaKind::Video),
            _ => None,
        }
    }
}

/// Grouping key for media: a real folder or a synthetic category
///
/// The synthetic variants form a closed set disjoint from real folder ids,
/// which the content index assigns as arbitrary integers. `Placeholder`
/// exists for list slots that have no backing bucket yet and never matches
/// any record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "id")]
pub enum BucketId {
    Favorites,
    Trash,
    Photos,
    Videos,
    /// Every non-trashed record regardless of folder
    All,
    Placeholder,
    /// A real folder bucket, identified by the content index's folder id
    Folder(i64),
}

impl BucketId {
    /// Whether `record` belongs to this bucket
    ///
    /// Trashed media belongs to the Trash bucket and nothing else; the
    /// other buckets only ever see non-trashed records.
    pub fn contains(&self, record: &MediaRecord) -> bool {
        match self {
            BucketId::Trash => record.trashed,
            BucketId::Placeholder => false,
            _ if record.trashed => false,
            BucketId::Favorites => record.favorite,
            BucketId::Photos => record.kind == MediaKind::Image,
            BucketId::Videos => record.kind == MediaKind::Video,
            BucketId::All => true,
            BucketId::Folder(id) => record.bucket_id == *id,
        }
    }

    /// Whether this is one of the synthetic category buckets
    pub fn is_synthetic(&self) -> bool {
        !matches!(self, BucketId::Folder(_))
    }
}

/// One classified media item
///
/// Timestamps are milliseconds since the Unix epoch; the content index
/// stores seconds and the classifier performs the conversion. The folder
/// name and coordinates are carried for album naming and location grouping
/// but do not participate in equality or ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaRecord {
    /// Content-index row id
    pub id: i64,
    /// Real folder bucket id assigned by the content index
    pub bucket_id: i64,
    /// File display name
    pub display_name: String,
    /// Folder display name, when the index exposes one
    pub folder_name: Option<String>,
    pub favorite: bool,
    pub trashed: bool,
    pub kind: MediaKind,
    /// MIME type as reported by the index
    pub mime: String,
    /// Added timestamp, epoch milliseconds
    pub added_ms: i64,
    /// Modified timestamp, epoch milliseconds
    pub modified_ms: i64,
    pub width: u32,
    pub height: u32,
    /// Rotation in degrees (0, 90, 180, 270)
    pub orientation: u16,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl MediaRecord {
    /// Ordering key: (id, bucket, favorite, trashed, kind, mime, added,
    /// modified, width, height, orientation)
    ///
    /// Display name, folder name and coordinates are presentation detail
    /// and stay out of the key.
    fn sort_key(&self) -> (i64, i64, bool, bool, MediaKind, &str, i64, i64, u32, u32, u16) {
        (
            self.id,
            self.bucket_id,
            self.favorite,
            self.trashed,
            self.kind,
            self.mime.as_str(),
            self.added_ms,
            self.modified_ms,
            self.width,
            self.height,
            self.orientation,
        )
    }

    /// Added timestamp as a local calendar date
    ///
    /// Sectioning compares these dates directly, so a midnight crossing
    /// starts a new section even when only minutes apart.
    pub fn added_date(&self) -> NaiveDate {
        DateTime::from_timestamp_millis(self.added_ms)
            .unwrap_or(DateTime::UNIX_EPOCH)
            .with_timezone(&Local)
            .date_naive()
    }

    /// Coordinates, when the index supplied both halves
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

impl PartialEq for MediaRecord {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl Eq for MediaRecord {}

impl PartialOrd for MediaRecord {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MediaRecord {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

/// One entry of a date-sectioned media list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "entry")]
pub enum SectionEntry {
    /// Section break: the local calendar day of the records that follow
    Header { date: NaiveDate },
    Media { record: MediaRecord },
}

impl SectionEntry {
    pub fn is_header(&self) -> bool {
        matches!(self, SectionEntry::Header { .. })
    }
}
