//! Date-header sectioning for flat media lists
//!
//! Turns a date-descending record sequence into the display sequence a
//! list view consumes, inserting a header whenever the local calendar day
//! changes. The comparison is calendar-date equality, not a 24-hour
//! delta: two records three minutes apart on either side of midnight get
//! separate sections, two records 23 hours apart within one day do not.
//! This also holds across month and year rollovers.

use crate::record::{MediaRecord, SectionEntry};

/// Interleave date headers into a date-descending record sequence
///
/// Relative record order is preserved. Empty input produces empty output;
/// otherwise the first entry is always a header.
pub fn section_by_day(records: &[MediaRecord]) -> Vec<SectionEntry> {
    let mut entries = Vec::with_capacity(records.len() + records.len() / 8 + 1);
    let mut current_day = None;

    for record in records {
        let day = record.added_date();
        if current_day != Some(day) {
            entries.push(SectionEntry::Header { date: day });
            current_day = Some(day);
        }
        entries.push(SectionEntry::Media {
            record: record.clone(),
        });
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{MediaKind, MediaRecord};
    use chrono::{DateTime, Local, TimeZone};

    fn record_at(id: i64, added: DateTime<Local>) -> MediaRecord {
        MediaRecord {
            id,
            bucket_id: 1,
            display_name: format!("f{id}"),
            folder_name: None,
            favorite: false,
            trashed: false,
            kind: MediaKind::Image,
            mime: "image/jpeg".to_string(),
            added_ms: added.timestamp_millis(),
            modified_ms: added.timestamp_millis(),
            width: 10,
            height: 10,
            orientation: 0,
            latitude: None,
            longitude: None,
        }
    }

    fn headers(entries: &[SectionEntry]) -> usize {
        entries.iter().filter(|e| e.is_header()).count()
    }

    #[test]
    fn test_empty_input() {
        assert!(section_by_day(&[]).is_empty());
    }

    #[test]
    fn test_single_record() {
        let r = record_at(1, Local.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap());
        let entries = section_by_day(std::slice::from_ref(&r));
        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_header());
        assert_eq!(entries[1], SectionEntry::Media { record: r });
    }

    #[test]
    fn test_first_entry_is_always_header() {
        let records = vec![
            record_at(1, Local.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap()),
            record_at(2, Local.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap()),
        ];
        let entries = section_by_day(&records);
        assert!(entries[0].is_header());
        assert_eq!(headers(&entries), 1);
    }

    #[test]
    fn test_midnight_crossing_splits_despite_minutes_apart() {
        let records = vec![
            record_at(1, Local.with_ymd_and_hms(2024, 3, 16, 0, 1, 0).unwrap()),
            record_at(2, Local.with_ymd_and_hms(2024, 3, 15, 23, 59, 0).unwrap()),
        ];
        let entries = section_by_day(&records);
        assert_eq!(headers(&entries), 2);
    }

    #[test]
    fn test_same_day_23_hours_apart_stays_together() {
        let records = vec![
            record_at(1, Local.with_ymd_and_hms(2024, 3, 15, 23, 30, 0).unwrap()),
            record_at(2, Local.with_ymd_and_hms(2024, 3, 15, 0, 30, 0).unwrap()),
        ];
        let entries = section_by_day(&records);
        assert_eq!(headers(&entries), 1);
    }

    #[test]
    fn test_year_rollover_splits() {
        // Same day-of-month either side of new year; the calendar-date
        // comparison must still split these.
        let records = vec![
            record_at(1, Local.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()),
            record_at(2, Local.with_ymd_and_hms(2023, 12, 15, 10, 0, 0).unwrap()),
        ];
        let entries = section_by_day(&records);
        assert_eq!(headers(&entries), 2);
    }

    #[test]
    fn test_header_count_equals_boundaries_plus_one() {
        let records = vec![
            record_at(1, Local.with_ymd_and_hms(2024, 3, 17, 9, 0, 0).unwrap()),
            record_at(2, Local.with_ymd_and_hms(2024, 3, 17, 8, 0, 0).unwrap()),
            record_at(3, Local.with_ymd_and_hms(2024, 3, 16, 9, 0, 0).unwrap()),
            record_at(4, Local.with_ymd_and_hms(2024, 3, 14, 9, 0, 0).unwrap()),
            record_at(5, Local.with_ymd_and_hms(2024, 3, 14, 8, 0, 0).unwrap()),
        ];
        let entries = section_by_day(&records);
        // boundaries: 17→16 and 16→14
        assert_eq!(headers(&entries), 3);
        assert_eq!(entries.len(), records.len() + 3);
    }

    #[test]
    fn test_relative_record_order_preserved() {
        let records = vec![
            record_at(1, Local.with_ymd_and_hms(2024, 3, 17, 9, 0, 0).unwrap()),
            record_at(2, Local.with_ymd_and_hms(2024, 3, 16, 9, 0, 0).unwrap()),
            record_at(3, Local.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap()),
        ];
        let ids: Vec<i64> = section_by_day(&records)
            .into_iter()
            .filter_map(|e| match e {
                SectionEntry::Media { record } => Some(record.id),
                SectionEntry::Header { .. } => None,
            })
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_header_carries_the_day_of_its_records() {
        let day = Local.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();
        let entries = section_by_day(&[record_at(1, day)]);
        assert_eq!(
            entries[0],
            SectionEntry::Header {
                date: day.date_naive()
            }
        );
    }
}
