//! Internationalization (i18n) module
//!
//! Provides language detection and the localized display names of the
//! synthetic album buckets, plus the handful of labels the CLI prints.
//! Supports English and Chinese Simplified.
//! Note: Log messages remain in English for consistency.

use crate::record::BucketId;
use std::sync::OnceLock;

/// Supported languages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    ChineseSimplified,
}

/// Global language instance
static LANGUAGE: OnceLock<Language> = OnceLock::new();

/// Initialize and get the current language based on system locale
pub fn get_language() -> Language {
    *LANGUAGE.get_or_init(detect_language)
}

/// Detect system language, preferring the platform locale API over raw
/// environment variables
fn detect_language() -> Language {
    let locale = sys_locale::get_locale()
        .or_else(|| std::env::var("LANG").ok())
        .or_else(|| std::env::var("LC_ALL").ok())
        .unwrap_or_default()
        .to_lowercase();

    if locale.starts_with("zh") || locale.contains("hans") || locale.contains("chinese") {
        return Language::ChineseSimplified;
    }

    Language::English
}

/// Localized strings
pub struct Strings;

impl Strings {
    /// Display name of a synthetic bucket
    ///
    /// Real folder buckets take their name from the content index, not
    /// from here; callers resolve those before falling back to
    /// [`Strings::unknown_folder`].
    pub fn bucket_name(bucket: &BucketId) -> &'static str {
        match get_language() {
            Language::English => match bucket {
                BucketId::Favorites => "Favorites",
                BucketId::Trash => "Trash",
                BucketId::Photos => "Photos",
                BucketId::Videos => "Videos",
                BucketId::All => "All media",
                BucketId::Placeholder => "…",
                BucketId::Folder(_) => "",
            },
            Language::ChineseSimplified => match bucket {
                BucketId::Favorites => "收藏",
                BucketId::Trash => "回收站",
                BucketId::Photos => "照片",
                BucketId::Videos => "视频",
                BucketId::All => "全部媒体",
                BucketId::Placeholder => "…",
                BucketId::Folder(_) => "",
            },
        }
    }

    /// Fallback name for a real folder the index reports no name for
    pub fn unknown_folder() -> &'static str {
        match get_language() {
            Language::English => "Unknown",
            Language::ChineseSimplified => "未知",
        }
    }

    pub fn albums_heading() -> &'static str {
        match get_language() {
            Language::English => "Albums:",
            Language::ChineseSimplified => "相册：",
        }
    }

    pub fn timeline_heading() -> &'static str {
        match get_language() {
            Language::English => "Timeline:",
            Language::ChineseSimplified => "时间线：",
        }
    }

    pub fn no_media() -> &'static str {
        match get_language() {
            Language::English => "No media found.",
            Language::ChineseSimplified => "未找到媒体文件。",
        }
    }

    pub fn items_suffix() -> &'static str {
        match get_language() {
            Language::English => "items",
            Language::ChineseSimplified => "项",
        }
    }
}
