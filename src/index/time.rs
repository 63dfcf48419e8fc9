//! Capture-time and EXIF attribute extraction for the filesystem index
//!
//! Extraction ladder for a file's added timestamp:
//! 1. EXIF metadata (images)
//! 2. Filename patterns
//! 3. File system modification time (applied by the caller)

use chrono::NaiveDateTime;
use exif::{In, Reader, Tag};
use regex::Regex;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::OnceLock;
use tracing::trace;

/// EXIF tags to try for date extraction, in priority order
const DATE_TAGS: &[Tag] = &[Tag::DateTimeOriginal, Tag::DateTimeDigitized, Tag::DateTime];

/// EXIF attributes the index projects into row columns
#[derive(Debug, Clone, Default)]
pub struct ExifSummary {
    pub taken: Option<NaiveDateTime>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Rotation in degrees (0, 90, 180, 270)
    pub orientation: u16,
    pub gps: Option<(f64, f64)>,
}

/// Read the EXIF attributes this index cares about; `None` when the file
/// has no parseable EXIF container
pub fn read_exif(path: &Path) -> Option<ExifSummary> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let exif = Reader::new().read_from_container(&mut reader).ok()?;

    let taken = DATE_TAGS.iter().find_map(|tag| {
        exif.get_field(*tag, In::PRIMARY)
            .and_then(|field| parse_exif_datetime(&field.display_value().to_string()))
    });

    let summary = ExifSummary {
        taken,
        width: exif_uint(&exif, Tag::PixelXDimension),
        height: exif_uint(&exif, Tag::PixelYDimension),
        orientation: orientation_degrees(exif_uint(&exif, Tag::Orientation).unwrap_or(1)),
        gps: exif_gps(&exif),
    };
    trace!(?path, taken = ?summary.taken, "Read EXIF attributes");
    Some(summary)
}

fn exif_uint(exif: &exif::Exif, tag: Tag) -> Option<u32> {
    exif.get_field(tag, In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
}

/// EXIF orientation code to rotation degrees; mirrored variants map to
/// their rotation, unknown codes to 0
fn orientation_degrees(code: u32) -> u16 {
    match code {
        3 | 4 => 180,
        5 | 6 => 90,
        7 | 8 => 270,
        _ => 0,
    }
}

fn exif_gps(exif: &exif::Exif) -> Option<(f64, f64)> {
    let lat = exif_coordinate(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, b'S')?;
    let lon = exif_coordinate(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, b'W')?;
    Some((lat, lon))
}

fn exif_coordinate(exif: &exif::Exif, tag: Tag, ref_tag: Tag, negative_ref: u8) -> Option<f64> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let degrees = match &field.value {
        exif::Value::Rational(parts) if parts.len() >= 3 => {
            dms_to_degrees(parts[0].to_f64(), parts[1].to_f64(), parts[2].to_f64())
        }
        _ => return None,
    };
    let negative = matches!(
        exif.get_field(ref_tag, In::PRIMARY).map(|f| &f.value),
        Some(exif::Value::Ascii(parts)) if parts.first().and_then(|p| p.first()) == Some(&negative_ref)
    );
    Some(if negative { -degrees } else { degrees })
}

fn dms_to_degrees(degrees: f64, minutes: f64, seconds: f64) -> f64 {
    degrees + minutes / 60.0 + seconds / 3600.0
}

/// Parse EXIF datetime string format: "YYYY:MM:DD HH:MM:SS"
fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim().trim_matches('"');

    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y:%m:%d %H:%M:%S") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y:%m:%d %H:%M:%S%.f") {
        return Some(dt);
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    None
}

/// Pattern: YYYYMMDD_HHmmss or YYYYMMDD-HHmmss, with or without a
/// IMG/VID/DSC-style camera prefix
fn pattern_compact() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{4})(\d{2})(\d{2})[_\-](\d{2})(\d{2})(\d{2})").unwrap())
}

/// Pattern: YYYY-MM-DD_HH-mm-ss or similar with separators
fn pattern_separated() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d{4})[-_](\d{2})[-_](\d{2})[-_\s](\d{2})[-_](\d{2})[-_](\d{2})").unwrap()
    })
}

/// Pattern: Unix timestamp (10 or 13 digits)
fn pattern_unix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Longer alternative first so a millisecond value is not cut at ten digits.
    RE.get_or_init(|| Regex::new(r"(\d{13}|\d{10})").unwrap())
}

/// Parse a capture timestamp from common camera filename patterns
pub fn parse_filename_time(filename: &str) -> Option<NaiveDateTime> {
    let name = filename.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(filename);

    if let Some(caps) = pattern_compact().captures(name) {
        trace!(filename, "Matched compact pattern");
        return build_datetime(&caps);
    }
    if let Some(caps) = pattern_separated().captures(name) {
        trace!(filename, "Matched separated pattern");
        return build_datetime(&caps);
    }
    if let Some(caps) = pattern_unix().captures(name) {
        let raw: i64 = caps.get(1)?.as_str().parse().ok()?;
        let seconds = if caps.get(1)?.as_str().len() == 13 {
            raw / 1000
        } else {
            raw
        };
        // Reasonable timestamp range (1990-2100)
        if (631_152_000..=4_102_444_800).contains(&seconds) {
            trace!(filename, "Matched Unix timestamp pattern");
            return chrono::DateTime::from_timestamp(seconds, 0).map(|dt| dt.naive_utc());
        }
    }
    None
}

fn build_datetime(caps: &regex::Captures<'_>) -> Option<NaiveDateTime> {
    let year: i32 = caps.get(1)?.as_str().parse().ok()?;
    let month: u32 = caps.get(2)?.as_str().parse().ok()?;
    let day: u32 = caps.get(3)?.as_str().parse().ok()?;
    let hour: u32 = caps.get(4)?.as_str().parse().ok()?;
    let minute: u32 = caps.get(5)?.as_str().parse().ok()?;
    let second: u32 = caps.get(6)?.as_str().parse().ok()?;

    if !(1990..=2100).contains(&year) {
        return None;
    }
    chrono::NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_compact_format() {
        let dt = parse_filename_time("IMG_20240115_143000.jpg").unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.day(), 15);
        assert_eq!(dt.hour(), 14);
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn test_separated_format() {
        let dt = parse_filename_time("2024-01-15_14-30-00.jpg").unwrap();
        assert_eq!(dt.year(), 2024);
    }

    #[test]
    fn test_unix_timestamp() {
        // 2024-01-15 14:30:00 UTC
        let dt = parse_filename_time("photo_1705329000.jpg").unwrap();
        assert_eq!(dt.year(), 2024);

        let dt = parse_filename_time("photo_1705329000000.jpg").unwrap();
        assert_eq!(dt.year(), 2024);
    }

    #[test]
    fn test_invalid_formats() {
        assert!(parse_filename_time("random_file.jpg").is_none());
        assert!(parse_filename_time("photo.jpg").is_none());
        assert!(parse_filename_time("19800101_000000.jpg").is_none()); // Too old
    }

    #[test]
    fn test_parse_exif_datetime() {
        let dt = parse_exif_datetime("2024:01:15 14:30:00").unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.hour(), 14);

        let dt = parse_exif_datetime("\"2024:01:15 14:30:00\"").unwrap();
        assert_eq!(dt.year(), 2024);

        assert!(parse_exif_datetime("invalid").is_none());
    }

    #[test]
    fn test_orientation_degrees() {
        assert_eq!(orientation_degrees(1), 0);
        assert_eq!(orientation_degrees(3), 180);
        assert_eq!(orientation_degrees(6), 90);
        assert_eq!(orientation_degrees(8), 270);
        assert_eq!(orientation_degrees(99), 0);
    }

    #[test]
    fn test_dms_conversion() {
        let deg = dms_to_degrees(48.0, 51.0, 29.6);
        assert!((deg - 48.858_222).abs() < 1e-4);
    }
}
