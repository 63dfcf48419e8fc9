//! Album aggregation: classified records into virtual buckets
//!
//! One pass over the record set builds every album a "show all albums"
//! view needs. A record can land in several buckets at once (its real
//! folder, All, Photos or Videos, and Favorites), so the per-folder
//! buckets are the only disjoint partition; the synthetic buckets overlay
//! them. The mutable album map never escapes one [`Aggregator::albums`]
//! call — the result is an immutable snapshot.

use crate::i18n::Strings;
use crate::record::{BucketId, MediaKind, MediaRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// One album of a gallery view
///
/// `count` always equals the number of records mapped to `bucket` in the
/// snapshot it was built from; `thumbnail` is the first record the
/// aggregation pass saw for the bucket, so it follows the rowset's own
/// sort order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub bucket: BucketId,
    pub name: String,
    pub thumbnail: Option<MediaRecord>,
    pub count: usize,
}

/// Builds album snapshots from classified records
#[derive(Debug, Clone)]
pub struct Aggregator {
    /// Name used for real folders the index reports no display name for
    device_label: String,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(Strings::unknown_folder())
    }
}

impl Aggregator {
    pub fn new(device_label: impl Into<String>) -> Self {
        Aggregator {
            device_label: device_label.into(),
        }
    }

    /// Aggregate a full record set into the album list
    ///
    /// Albums appear in order of first occurrence, following the rowset's
    /// sort order; no re-sort happens here. Trashed records feed only the
    /// Trash bucket. An empty record set is a valid empty snapshot.
    pub fn albums(&self, records: &[MediaRecord]) -> Vec<Album> {
        let mut albums: Vec<Album> = Vec::new();
        let mut index: HashMap<BucketId, usize> = HashMap::new();

        for record in records {
            for bucket in Self::memberships(record) {
                match index.get(&bucket) {
                    Some(&slot) => albums[slot].count += 1,
                    None => {
                        index.insert(bucket, albums.len());
                        albums.push(Album {
                            name: self.resolve_name(&bucket, record),
                            thumbnail: Some(record.clone()),
                            count: 1,
                            bucket,
                        });
                    }
                }
            }
        }

        debug!(
            records = records.len(),
            albums = albums.len(),
            "Aggregated album snapshot"
        );
        albums
    }

    /// Records belonging to one bucket, in input order
    ///
    /// Drives the single-album view; the same trash rule as album
    /// aggregation applies, so targeting the Trash bucket is the only way
    /// to see trashed media.
    pub fn members(records: &[MediaRecord], bucket: &BucketId) -> Vec<MediaRecord> {
        records
            .iter()
            .filter(|r| bucket.contains(r))
            .cloned()
            .collect()
    }

    /// Every bucket a record contributes to
    fn memberships(record: &MediaRecord) -> Vec<BucketId> {
        if record.trashed {
            return vec![BucketId::Trash];
        }
        let mut buckets = vec![
            BucketId::Folder(record.bucket_id),
            BucketId::All,
            match record.kind {
                MediaKind::Image => BucketId::Photos,
                MediaKind::Video => BucketId::Videos,
            },
        ];
        if record.favorite {
            buckets.push(BucketId::Favorites);
        }
        buckets
    }

    /// Bucket display name: localized for synthetic buckets, the index's
    /// folder name for real ones, degrading to the device label when the
    /// folder-name column was absent.
    fn resolve_name(&self, bucket: &BucketId, first: &MediaRecord) -> String {
        match bucket {
            BucketId::Folder(_) => first
                .folder_name
                .clone()
                .unwrap_or_else(|| self.device_label.clone()),
            synthetic => Strings::bucket_name(synthetic).to_string(),
        }
    }
}
