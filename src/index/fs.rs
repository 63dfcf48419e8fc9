//! Filesystem-backed content index
//!
//! Serves a directory tree as media rows: stable ids from path hashes
//! (folder bucket ids are hashes of the parent directory, the way the
//! platform index derives them), capture time from EXIF then filename
//! patterns then file mtime, dimensions/orientation/GPS from EXIF.
//! Favorite and trash state live in memory and survive rescans; every
//! mutation broadcasts a change event, which is what drives live streams.

use crate::classify::columns;
use crate::config::{ConfigError, IndexConfig};
use crate::error::Result;
use crate::index::time::{parse_filename_time, read_exif};
use crate::index::{ChangeEvent, ContentIndex, QuerySpec, Row, Uri, Value};
use crate::record::MediaKind;
use async_trait::async_trait;
use chrono::{Local, TimeZone};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use xxhash_rust::xxh3::xxh3_64;

/// One scanned media file
#[derive(Debug, Clone)]
struct MediaFile {
    id: i64,
    bucket_id: i64,
    bucket_name: String,
    display_name: String,
    kind: MediaKind,
    mime: String,
    added_s: i64,
    modified_s: i64,
    width: u32,
    height: u32,
    orientation: u16,
    gps: Option<(f64, f64)>,
    favorite: bool,
    trashed: bool,
}

/// In-process [`ContentIndex`] over configured directory roots
pub struct FsIndex {
    config: IndexConfig,
    files: RwLock<HashMap<i64, MediaFile>>,
    changes: broadcast::Sender<ChangeEvent>,
}

impl FsIndex {
    pub fn new(config: IndexConfig) -> std::result::Result<Self, ConfigError> {
        if config.roots.is_empty() {
            return Err(ConfigError::NoRoots);
        }
        Ok(FsIndex {
            config,
            files: RwLock::new(HashMap::new()),
            changes: broadcast::channel(64).0,
        })
    }

    /// Walk the roots and rebuild the row set, preserving favorite/trash
    /// state for files that are still present. Returns the file count.
    pub fn scan(&self) -> Result<usize> {
        let mut candidates: Vec<PathBuf> = Vec::new();
        for root in &self.config.roots {
            let walker = WalkDir::new(root)
                .follow_links(false)
                .into_iter()
                .filter_entry(|e| !e.file_type().is_dir() || !self.config.is_excluded(e.path()));
            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!(error = %e, "Skipping unreadable entry");
                        continue;
                    }
                };
                if entry.file_type().is_file() && self.kind_of(entry.path()).is_some() {
                    candidates.push(entry.into_path());
                }
            }
        }

        let scan_one = |path: &PathBuf| self.inspect(path);
        let mut scanned: Vec<MediaFile> = if self.config.threads > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.threads)
                .build()
                .map_err(|e| crate::error::Error::Index {
                    message: format!("failed to build scan pool: {e}"),
                })?
                .install(|| candidates.par_iter().filter_map(scan_one).collect())
        } else {
            candidates.par_iter().filter_map(scan_one).collect()
        };

        let mut files = self.files.write().expect("index state poisoned");
        for file in &mut scanned {
            if let Some(previous) = files.get(&file.id) {
                file.favorite = previous.favorite;
                file.trashed = previous.trashed;
            }
        }
        *files = scanned.into_iter().map(|f| (f.id, f)).collect();
        let count = files.len();
        drop(files);

        info!(count, "Scan complete");
        self.notify();
        Ok(count)
    }

    /// Media kind by extension, `None` for files this index ignores
    fn kind_of(&self, path: &Path) -> Option<MediaKind> {
        let ext = path.extension()?.to_str()?;
        if self.config.is_image(ext) {
            Some(MediaKind::Image)
        } else if self.config.is_video(ext) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    /// Build one row's worth of metadata for a file
    fn inspect(&self, path: &PathBuf) -> Option<MediaFile> {
        let kind = self.kind_of(path)?;
        let display_name = path.file_name()?.to_str()?.to_string();
        let parent = path.parent()?;
        let bucket_name = parent
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(?path, error = %e, "Skipping unreadable file");
                return None;
            }
        };
        let mtime_s = metadata
            .modified()
            .ok()
            .map(|t| chrono::DateTime::<chrono::Utc>::from(t).timestamp())
            .unwrap_or_default();

        let exif = if kind == MediaKind::Image {
            read_exif(path)
        } else {
            None
        };
        let exif = exif.unwrap_or_default();

        // Extraction ladder: EXIF, filename, then fs mtime.
        let added_s = exif
            .taken
            .map(local_timestamp)
            .or_else(|| parse_filename_time(&display_name).map(local_timestamp))
            .unwrap_or(mtime_s);

        Some(MediaFile {
            id: path_id(path),
            bucket_id: path_id(parent),
            bucket_name,
            display_name,
            kind,
            mime: mime_for(kind, path),
            added_s,
            modified_s: mtime_s,
            width: exif.width.unwrap_or(0),
            height: exif.height.unwrap_or(0),
            orientation: exif.orientation,
            gps: exif.gps,
            favorite: false,
            trashed: false,
        })
    }

    /// Mark or unmark a favorite; false when the id is unknown
    pub fn set_favorite(&self, id: i64, favorite: bool) -> bool {
        self.mutate(id, |f| f.favorite = favorite)
    }

    /// Move a file to the trash bucket; false when the id is unknown
    pub fn trash(&self, id: i64) -> bool {
        self.mutate(id, |f| f.trashed = true)
    }

    /// Restore a file from the trash bucket; false when the id is unknown
    pub fn restore(&self, id: i64) -> bool {
        self.mutate(id, |f| f.trashed = false)
    }

    fn mutate(&self, id: i64, apply: impl FnOnce(&mut MediaFile)) -> bool {
        let found = {
            let mut files = self.files.write().expect("index state poisoned");
            match files.get_mut(&id) {
                Some(file) => {
                    apply(file);
                    true
                }
                None => false,
            }
        };
        if found {
            self.notify();
        } else {
            debug!(id, "Mutation on unknown media id ignored");
        }
        found
    }

    fn notify(&self) {
        let _ = self.changes.send(ChangeEvent { uri: Uri::media() });
    }

    fn row_of(file: &MediaFile) -> Row {
        let mut row = Row::new()
            .set(columns::ID, file.id)
            .set(columns::BUCKET_ID, file.bucket_id)
            .set(columns::BUCKET_DISPLAY_NAME, file.bucket_name.clone())
            .set(columns::DISPLAY_NAME, file.display_name.clone())
            .set(columns::IS_FAVORITE, file.favorite)
            .set(columns::IS_TRASHED, file.trashed)
            .set(
                columns::MEDIA_TYPE,
                match file.kind {
                    MediaKind::Image => MediaKind::IMAGE_CODE,
                    MediaKind::Video => MediaKind::VIDEO_CODE,
                },
            )
            .set(columns::MIME_TYPE, file.mime.clone())
            .set(columns::DATE_ADDED, file.added_s)
            .set(columns::DATE_MODIFIED, file.modified_s)
            .set(columns::WIDTH, file.width as i64)
            .set(columns::HEIGHT, file.height as i64)
            .set(columns::ORIENTATION, file.orientation as i64);
        if let Some((lat, lon)) = file.gps {
            row = row
                .set(columns::LATITUDE, Value::Real(lat))
                .set(columns::LONGITUDE, Value::Real(lon));
        }
        row
    }
}

#[async_trait]
impl ContentIndex for FsIndex {
    async fn query(&self, spec: &QuerySpec) -> Result<Vec<Row>> {
        let files = self.files.read().expect("index state poisoned");
        let mut rows: Vec<Row> = files
            .values()
            .filter(|f| spec.flags.include_trashed || !f.trashed)
            .map(Self::row_of)
            .filter(|row| spec.selection.as_ref().is_none_or(|p| p.matches(row)))
            .collect();
        drop(files);

        if let Some(sort) = &spec.sort {
            rows.sort_by(|a, b| {
                let ordering = match (a.get(&sort.column), b.get(&sort.column)) {
                    (Some(va), Some(vb)) => va.compare(vb),
                    _ => std::cmp::Ordering::Equal,
                };
                let ordering = if sort.descending {
                    ordering.reverse()
                } else {
                    ordering
                };
                // Stable tie-break on id so snapshots are reproducible.
                ordering.then_with(|| {
                    let ida = a.get(columns::ID).cloned();
                    let idb = b.get(columns::ID).cloned();
                    match (ida, idb) {
                        (Some(va), Some(vb)) => va.compare(&vb),
                        _ => std::cmp::Ordering::Equal,
                    }
                })
            });
        }

        if let Some(projection) = &spec.projection {
            rows = rows
                .into_iter()
                .map(|row| row.project(projection))
                .collect();
        }
        Ok(rows)
    }

    fn changes(&self, _uri: &Uri) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }
}

/// Stable id for a path: xxh3 of the lowercased path string, matching the
/// platform's hash-derived bucket ids
fn path_id(path: &Path) -> i64 {
    xxh3_64(path.to_string_lossy().to_lowercase().as_bytes()) as i64
}

/// Timestamp for a camera-local naive datetime
fn local_timestamp(naive: chrono::NaiveDateTime) -> i64 {
    Local
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.timestamp())
        .unwrap_or_else(|| naive.and_utc().timestamp())
}

fn mime_for(kind: MediaKind, path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();
    match (kind, ext.as_str()) {
        (MediaKind::Image, "jpg" | "jpeg") => "image/jpeg".to_string(),
        (MediaKind::Image, "heic" | "heif") => "image/heif".to_string(),
        (MediaKind::Image, "tif" | "tiff") => "image/tiff".to_string(),
        (MediaKind::Image, other) => format!("image/{other}"),
        (MediaKind::Video, "mov") => "video/quicktime".to_string(),
        (MediaKind::Video, "mkv") => "video/x-matroska".to_string(),
        (MediaKind::Video, other) => format!("video/{other}"),
    }
}
