//! Configuration for the filesystem-backed content index

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration load/parse errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("No scan roots configured")]
    NoRoots,
}

fn default_image_extensions() -> Vec<String> {
    [
        "jpg", "jpeg", "png", "gif", "bmp", "webp", "heic", "heif", "tiff", "tif", "dng", "arw",
        "cr2", "cr3", "nef", "orf", "raf",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_video_extensions() -> Vec<String> {
    ["mp4", "mov", "avi", "mkv", "webm", "m4v", "3gp", "mts", "mpg"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Configuration for [`FsIndex`](crate::index::fs::FsIndex)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Directory roots to scan for media files
    pub roots: Vec<PathBuf>,

    /// Directories to exclude from scanning (absolute paths or folder names)
    #[serde(default)]
    pub exclude_dirs: Vec<PathBuf>,

    /// File extensions treated as images (lowercase, no dot)
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,

    /// File extensions treated as videos (lowercase, no dot)
    #[serde(default = "default_video_extensions")]
    pub video_extensions: Vec<String>,

    /// Number of threads for parallel scanning (0 = auto)
    #[serde(default)]
    pub threads: usize,

    /// Name used for folders with no usable display name
    #[serde(default)]
    pub device_label: Option<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            roots: Vec::new(),
            exclude_dirs: Vec::new(),
            image_extensions: default_image_extensions(),
            video_extensions: default_video_extensions(),
            threads: 0,
            device_label: None,
        }
    }
}

impl IndexConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Whether an extension (without dot) counts as an image
    pub fn is_image(&self, ext: &str) -> bool {
        let ext = ext.to_lowercase();
        self.image_extensions.iter().any(|e| e == &ext)
    }

    /// Whether an extension (without dot) counts as a video
    pub fn is_video(&self, ext: &str) -> bool {
        let ext = ext.to_lowercase();
        self.video_extensions.iter().any(|e| e == &ext)
    }

    /// Whether a directory should be skipped during scanning
    pub fn is_excluded(&self, dir: &Path) -> bool {
        self.exclude_dirs.iter().any(|excluded| {
            if excluded.is_absolute() {
                dir.starts_with(excluded)
            } else {
                dir.file_name() == Some(excluded.as_os_str())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_extension_classification() {
        let config = IndexConfig::default();
        assert!(config.is_image("jpg"));
        assert!(config.is_image("JPG"));
        assert!(config.is_image("heic"));
        assert!(config.is_video("mp4"));
        assert!(!config.is_image("mp4"));
        assert!(!config.is_video("txt"));
    }

    #[test]
    fn test_exclusion_by_name_and_path() {
        let config = IndexConfig {
            exclude_dirs: vec![PathBuf::from(".thumbnails"), PathBuf::from("/tmp/cache")],
            ..IndexConfig::default()
        };
        assert!(config.is_excluded(Path::new("/photos/.thumbnails")));
        assert!(config.is_excluded(Path::new("/tmp/cache/deep")));
        assert!(!config.is_excluded(Path::new("/photos/Camera")));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "roots = [\"/photos\"]\ndevice_label = \"Pixel 5\"\nthreads = 2"
        )
        .unwrap();
        file.flush().unwrap();

        let config = IndexConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.roots, vec![PathBuf::from("/photos")]);
        assert_eq!(config.device_label.as_deref(), Some("Pixel 5"));
        assert_eq!(config.threads, 2);
        // defaults still apply for omitted keys
        assert!(config.is_image("jpg"));
    }

    #[test]
    fn test_parse_error_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "roots = not-a-list").unwrap();
        file.flush().unwrap();
        assert!(matches!(
            IndexConfig::load_from_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }
}
