//! Live query streams: whole-snapshot subscriptions over a content index
//!
//! A [`LiveQuery`] wraps one query against the index in a background
//! worker task that re-runs the full classify/aggregate pipeline whenever
//! the index reports a change, and publishes the result through a watch
//! channel. Subscribers always observe either the old or the new complete
//! snapshot, never a partial one; the latest snapshot replays to anyone
//! who subscribes late. Dropping the last handle closes the channel,
//! which cancels any in-flight query and stops the worker.

use crate::album::{Aggregator, Album};
use crate::classify::{classify_rows, columns};
use crate::error::Result;
use crate::index::{ContentIndex, QuerySpec, Row};
use crate::predicate::Predicate;
use crate::record::{BucketId, MediaKind, MediaRecord, SectionEntry};
use crate::section::section_by_day;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, error, warn};

/// One complete result set of a live query
#[derive(Debug)]
pub enum Snapshot<T> {
    /// The first query has not completed yet
    Loading,
    /// A complete, immutable result set
    Ready(Arc<Vec<T>>),
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        match self {
            Snapshot::Loading => Snapshot::Loading,
            Snapshot::Ready(items) => Snapshot::Ready(Arc::clone(items)),
        }
    }
}

impl<T> Snapshot<T> {
    pub fn items(&self) -> Option<&Arc<Vec<T>>> {
        match self {
            Snapshot::Loading => None,
            Snapshot::Ready(items) => Some(items),
        }
    }
}

/// Handle to a live query; cloning the receiver adds a subscriber
///
/// The handle itself counts as a subscriber: the worker keeps running
/// until the handle and every receiver obtained from [`LiveQuery::subscribe`]
/// are gone.
#[derive(Debug)]
pub struct LiveQuery<T> {
    rx: watch::Receiver<Snapshot<T>>,
}

impl<T> LiveQuery<T> {
    /// Latest snapshot without waiting
    pub fn latest(&self) -> Snapshot<T> {
        self.rx.borrow().clone()
    }

    /// A new subscriber replaying the latest snapshot
    pub fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.rx.clone()
    }

    /// Snapshot stream view for `Stream`-based consumers
    pub fn stream(&self) -> WatchStream<Snapshot<T>>
    where
        T: Send + Sync + 'static,
    {
        WatchStream::new(self.rx.clone())
    }

    /// Wait until the first complete snapshot is available
    pub async fn ready(&mut self) -> Result<Arc<Vec<T>>> {
        loop {
            if let Snapshot::Ready(items) = &*self.rx.borrow_and_update() {
                return Ok(Arc::clone(items));
            }
            self.rx
                .changed()
                .await
                .map_err(|_| crate::error::Error::Index {
                    message: "live query worker stopped before first snapshot".to_string(),
                })?;
        }
    }
}

/// Start a live query: run `spec` now and after every change to its URI,
/// passing the rowset through `transform` and publishing the result
///
/// The query and the transform both run on the worker task, never on a
/// subscriber's thread. A burst of change notifications arriving while a
/// query is in flight coalesces into a single follow-up query. A
/// transient query failure keeps the previous snapshot in place; a
/// contract violation stops the stream, since retrying a code/schema
/// mismatch cannot succeed.
pub fn observe<T, F>(index: Arc<dyn ContentIndex>, spec: QuerySpec, transform: F) -> LiveQuery<T>
where
    T: Send + Sync + 'static,
    F: Fn(Vec<Row>) -> Result<Vec<T>> + Send + 'static,
{
    let (tx, rx) = watch::channel(Snapshot::Loading);

    tokio::spawn(async move {
        // Subscribe before the first query so no change slips between them.
        let mut changes = index.changes(&spec.uri);
        loop {
            let result = tokio::select! {
                biased;
                _ = tx.closed() => break,
                result = index.query(&spec) => result,
            };

            match result.and_then(|rows| transform(rows)) {
                Ok(items) => {
                    debug!(uri = %spec.uri, items = items.len(), "Publishing snapshot");
                    if tx.send(Snapshot::Ready(Arc::new(items))).is_err() {
                        break;
                    }
                }
                Err(e) if e.is_transient() => {
                    warn!(uri = %spec.uri, error = %e, "Query failed, keeping previous snapshot");
                }
                Err(e) => {
                    error!(uri = %spec.uri, error = %e, "Contract violation, stopping live query");
                    break;
                }
            }

            tokio::select! {
                biased;
                _ = tx.closed() => break,
                received = changes.recv() => match received {
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {
                        // Coalesce a burst into one follow-up query.
                        while changes.try_recv().is_ok() {}
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
        debug!(uri = %spec.uri, "Live query worker stopped");
    });

    LiveQuery { rx }
}

/// Gallery facade: the three live views a UI consumes
#[derive(Clone)]
pub struct MediaLibrary {
    index: Arc<dyn ContentIndex>,
    aggregator: Aggregator,
}

impl MediaLibrary {
    pub fn new(index: Arc<dyn ContentIndex>) -> Self {
        MediaLibrary {
            index,
            aggregator: Aggregator::default(),
        }
    }

    /// Use `label` for folders the index reports no display name for
    pub fn with_device_label(index: Arc<dyn ContentIndex>, label: impl Into<String>) -> Self {
        MediaLibrary {
            index,
            aggregator: Aggregator::new(label),
        }
    }

    /// Live album list, including the Trash bucket
    pub fn observe_albums(&self) -> LiveQuery<Album> {
        let aggregator = self.aggregator.clone();
        observe(
            Arc::clone(&self.index),
            QuerySpec::media_newest_first().with_trashed(),
            move |rows| {
                let records = classify_rows(&rows)?;
                Ok(aggregator.albums(&records))
            },
        )
    }

    /// Live date-sectioned timeline of all non-trashed media
    pub fn observe_timeline(&self) -> LiveQuery<SectionEntry> {
        observe(
            Arc::clone(&self.index),
            QuerySpec::media_newest_first(),
            |rows| {
                let records = classify_rows(&rows)?;
                Ok(section_by_day(&records))
            },
        )
    }

    /// Live single-album view
    pub fn observe_bucket(&self, bucket: BucketId) -> LiveQuery<MediaRecord> {
        let spec = Self::bucket_query(&bucket);
        observe(Arc::clone(&self.index), spec, move |rows| {
            let records = classify_rows(&rows)?;
            Ok(Aggregator::members(&records, &bucket))
        })
    }

    /// Push as much bucket filtering as possible into the index query;
    /// [`Aggregator::members`] re-checks membership on the way out.
    fn bucket_query(bucket: &BucketId) -> QuerySpec {
        let base = QuerySpec::media_newest_first();
        match bucket {
            BucketId::Favorites => base.with_selection(Predicate::eq(columns::IS_FAVORITE, 1i64)),
            BucketId::Trash => base
                .with_trashed()
                .with_selection(Predicate::eq(columns::IS_TRASHED, 1i64)),
            BucketId::Photos => {
                base.with_selection(Predicate::eq(columns::MEDIA_TYPE, MediaKind::IMAGE_CODE))
            }
            BucketId::Videos => {
                base.with_selection(Predicate::eq(columns::MEDIA_TYPE, MediaKind::VIDEO_CODE))
            }
            BucketId::Folder(id) => base.with_selection(Predicate::eq(columns::BUCKET_ID, *id)),
            BucketId::All | BucketId::Placeholder => base,
        }
    }
}
