// src/lib.rs

//! # moefile
//!
//! A read-only file server that exposes a directory tree over HTTP.
//! Features include:
//!
//! - S3-style XML bucket listings for directories
//! - Raw file serving with range and conditional requests
//! - A player page that finds subtitle and danmaku files next to a video
//! - Embedded UI assets
//!
//! ## Architecture
//!
//! - `url`: request path cleaning and traversal checks
//! - `router`: picks the handler that answers a request
//! - `handlers`: player page, assets, listings and raw files
//! - `directory_browser`: bucket listing documents
//! - `companion`: subtitle and danmaku discovery
//! - `language`: language code lookup for subtitles
//! - `middleware` and `routes`: header handling and app wiring

pub mod assets;
pub mod companion;
pub mod config;
pub mod directory_browser;
pub mod error;
pub mod language;
pub mod middleware;
pub mod root_fs;
pub mod router;
pub mod routes;
pub mod url;

pub mod handlers {
    pub mod asset;
    pub mod file;
    pub mod listing;
    pub mod player;
    pub mod types;
}
