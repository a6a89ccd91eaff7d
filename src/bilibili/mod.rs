// src/bilibili/mod.rs

pub mod cache;
pub mod cookies;
pub mod download;
pub mod extractor;
pub mod models;
pub mod page;
pub mod patch;
pub mod rename;
pub mod streams;
pub mod vid;

pub use cache::{CacheEntry, EntryMeta};
pub use cookies::CookieSource;
pub use download::{DownloadOptions, download};
pub use extractor::BilibiliExtractor;
pub use vid::VideoId;
