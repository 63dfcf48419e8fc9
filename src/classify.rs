//! Media classifier: raw content-index rows into typed [`MediaRecord`]s
//!
//! The column set is a contract with the index; a missing required column
//! means the projection and this module disagree and is surfaced as a
//! fatal error rather than papered over. Kind codes other than the two
//! known ones are likewise fatal — callers must not silently default.

use crate::error::{Error, Result};
use crate::index::Row;
use crate::record::{MediaKind, MediaRecord};
use tracing::trace;

/// Column names of the shared media collection
pub mod columns {
    pub const ID: &str = "_id";
    pub const BUCKET_ID: &str = "bucket_id";
    /// Folder display name; optional, some indexes omit it
    pub const BUCKET_DISPLAY_NAME: &str = "bucket_display_name";
    pub const DISPLAY_NAME: &str = "_display_name";
    pub const IS_FAVORITE: &str = "is_favorite";
    pub const IS_TRASHED: &str = "is_trashed";
    pub const MEDIA_TYPE: &str = "media_type";
    pub const MIME_TYPE: &str = "mime_type";
    /// Epoch seconds
    pub const DATE_ADDED: &str = "date_added";
    /// Epoch seconds
    pub const DATE_MODIFIED: &str = "date_modified";
    pub const WIDTH: &str = "width";
    pub const HEIGHT: &str = "height";
    pub const ORIENTATION: &str = "orientation";
    /// Optional GPS coordinates
    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";
}

/// Every column the classifier requires plus the optional extras; used as
/// the default projection for media queries.
pub const PROJECTION: &[&str] = &[
    columns::ID,
    columns::BUCKET_ID,
    columns::BUCKET_DISPLAY_NAME,
    columns::DISPLAY_NAME,
    columns::IS_FAVORITE,
    columns::IS_TRASHED,
    columns::MEDIA_TYPE,
    columns::MIME_TYPE,
    columns::DATE_ADDED,
    columns::DATE_MODIFIED,
    columns::WIDTH,
    columns::HEIGHT,
    columns::ORIENTATION,
    columns::LATITUDE,
    columns::LONGITUDE,
];

/// The index stores timestamps in epoch seconds; the domain model uses
/// milliseconds. The conversion is an exact multiply — getting this wrong
/// is the classic off-by-1000x date bug, so it lives in one place.
fn seconds_to_millis(seconds: i64) -> Result<i64> {
    seconds
        .checked_mul(1000)
        .ok_or(Error::TimestampRange { seconds })
}

/// Convert one raw row into a [`MediaRecord`]
pub fn classify_row(row: &Row) -> Result<MediaRecord> {
    let kind_code = row.require_i64(columns::MEDIA_TYPE)?;
    let kind = MediaKind::from_code(kind_code).ok_or(Error::UnrecognizedKind { code: kind_code })?;

    let record = MediaRecord {
        id: row.require_i64(columns::ID)?,
        bucket_id: row.require_i64(columns::BUCKET_ID)?,
        display_name: row.require_str(columns::DISPLAY_NAME)?.to_string(),
        folder_name: row.opt_str(columns::BUCKET_DISPLAY_NAME).map(str::to_string),
        favorite: row.require_i64(columns::IS_FAVORITE)? != 0,
        trashed: row.require_i64(columns::IS_TRASHED)? != 0,
        kind,
        mime: row.require_str(columns::MIME_TYPE)?.to_string(),
        added_ms: seconds_to_millis(row.require_i64(columns::DATE_ADDED)?)?,
        modified_ms: seconds_to_millis(row.require_i64(columns::DATE_MODIFIED)?)?,
        width: row.require_i64(columns::WIDTH)?.max(0) as u32,
        height: row.require_i64(columns::HEIGHT)?.max(0) as u32,
        orientation: row.require_i64(columns::ORIENTATION)?.max(0) as u16,
        latitude: row.opt_f64(columns::LATITUDE),
        longitude: row.opt_f64(columns::LONGITUDE),
    };
    trace!(id = record.id, kind = ?record.kind, "Classified row");
    Ok(record)
}

/// Classify a whole rowset, preserving row order
pub fn classify_rows(rows: &[Row]) -> Result<Vec<MediaRecord>> {
    rows.iter().map(classify_row).collect()
}


#[cfg(test)]
mod tests {
    use super::test_rows::media_row;
    use super::*;
    use crate::index::Value;

    #[test]
    fn test_classify_complete_row() {
        let record = classify_row(&media_row(7, MediaKind::IMAGE_CODE, 1_700_000_000)).unwrap();
        assert_eq!(record.id, 7);
        assert_eq!(record.bucket_id, 42);
        assert_eq!(record.kind, MediaKind::Image);
        assert_eq!(record.folder_name.as_deref(), Some("Camera"));
        assert!(!record.favorite);
        assert!(!record.trashed);
    }

    #[test]
    fn test_seconds_become_exact_milliseconds() {
        let record = classify_row(&media_row(1, MediaKind::IMAGE_CODE, 1_700_000_000)).unwrap();
        assert_eq!(record.added_ms, 1_700_000_000_000);
        assert_eq!(record.modified_ms, 1_700_000_000_000);
    }

    #[test]
    fn test_timestamp_overflow_is_fatal() {
        let row = media_row(1, MediaKind::IMAGE_CODE, i64::MAX / 500);
        assert!(matches!(
            classify_row(&row),
            Err(Error::TimestampRange { .. })
        ));
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let row = media_row(1, MediaKind::IMAGE_CODE, 100).project(&[columns::ID]);
        let err = classify_row(&row).unwrap_err();
        assert!(matches!(err, Error::MissingColumn { .. }));
    }

    #[test]
    fn test_unrecognized_kind_is_fatal() {
        // 2 is the platform's audio code; this gallery handles images and
        // videos only and must not default it to either.
        let err = classify_row(&media_row(1, 2, 100)).unwrap_err();
        assert!(matches!(err, Error::UnrecognizedKind { code: 2 }));
    }

    #[test]
    fn test_optional_columns_absent() {
        let projection: Vec<&str> = PROJECTION
            .iter()
            .copied()
            .filter(|c| *c != columns::BUCKET_DISPLAY_NAME)
            .collect();
        let row = media_row(1, MediaKind::VIDEO_CODE, 100).project(&projection);
        let record = classify_row(&row).unwrap();
        assert_eq!(record.folder_name, None);
        assert_eq!(record.latitude, None);
    }

    #[test]
    fn test_gps_columns_flow_through() {
        let row = media_row(1, MediaKind::IMAGE_CODE, 100)
            .set(columns::LATITUDE, Value::Real(48.8584))
            .set(columns::LONGITUDE, Value::Real(2.2945));
        let record = classify_row(&row).unwrap();
        assert_eq!(record.coordinates(), Some((48.8584, 2.2945)));
    }

    #[test]
    fn test_classify_rows_preserves_order() {
        let rows = vec![
            media_row(3, MediaKind::IMAGE_CODE, 300),
            media_row(1, MediaKind::VIDEO_CODE, 100),
            media_row(2, MediaKind::IMAGE_CODE, 200),
        ];
        let records = classify_rows(&rows).unwrap();
        assert_eq!(
            records.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![3, 1, 2]
        );
    }
}
