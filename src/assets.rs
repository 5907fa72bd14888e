// src/assets.rs

//! Read-only UI assets compiled into the binary.
//!
//! Served under the `?_/` query route and used as templates for the player
//! page and the listing stylesheet.

use std::{
    borrow::Cow,
    time::{SystemTime, UNIX_EPOCH},
};

use actix_files::HttpRange;
use actix_web::{
    http::{
        header::{self, HttpDate},
        StatusCode,
    },
    HttpMessage, HttpRequest, HttpResponse,
};
use once_cell::sync::Lazy;
use rust_embed::RustEmbed;
use thiserror::Error;

use crate::url;

pub const PLAYER_TEMPLATE: &str = "player.html";
pub const LISTING_TEMPLATE: &str = "listing.xsl";
pub const LISTING_BODY: &str = "index.html";

const LISTING_BODY_PLACEHOLDER: &str = "{{INDEX}}";

#[derive(RustEmbed)]
#[folder = "assets/"]
struct EmbeddedAssets;

/// Reported as `Last-Modified` for every asset; assets cannot change while
/// the process runs.
static LOADED_AT: Lazy<SystemTime> = Lazy::new(SystemTime::now);

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("embedded asset <{0}> not found")]
    Missing(String),
    #[error("embedded asset <{0}> is not valid UTF-8")]
    NotUtf8(String),
}

pub struct Asset {
    pub key: String,
    pub data: Cow<'static, [u8]>,
    pub sha256: [u8; 32],
}

impl Asset {
    fn etag(&self) -> String {
        let hex: String = self.sha256.iter().map(|b| format!("{:02x}", b)).collect();
        format!("\"{}\"", hex)
    }
}

/// Looks up an asset by its logical path. Keys go through the same lexical
/// cleaning as request paths.
pub fn get(key: &str) -> Option<Asset> {
    let resolved = url::resolve(key);
    if !resolved.valid || resolved.relative_path == url::ROOT_RELATIVE {
        return None;
    }
    let file = EmbeddedAssets::get(&resolved.relative_path)?;
    Some(Asset {
        key: resolved.relative_path,
        sha256: file.metadata.sha256_hash(),
        data: file.data,
    })
}

pub fn read_text(key: &str) -> Result<String, AssetError> {
    let asset = get(key).ok_or_else(|| AssetError::Missing(key.to_string()))?;
    String::from_utf8(asset.data.into_owned()).map_err(|_| AssetError::NotUtf8(key.to_string()))
}

/// The `<xsl:stylesheet>` element embedded into listings, with the listing
/// page body interpolated.
pub fn listing_stylesheet() -> Result<String, AssetError> {
    let template = read_text(LISTING_TEMPLATE)?;
    let body = read_text(LISTING_BODY)?;
    Ok(template.replace(LISTING_BODY_PLACEHOLDER, &body))
}

/// Builds the response for an asset, honouring conditional and range
/// requests.
pub fn respond(req: &HttpRequest, asset: Asset) -> HttpResponse {
    let etag = asset.etag();
    let last_modified = *LOADED_AT;
    let mime = mime_guess::from_path(&asset.key).first_or_octet_stream();

    let not_modified = is_not_modified(req, &etag, last_modified);
    let mut builder = if not_modified {
        HttpResponse::NotModified()
    } else {
        HttpResponse::Ok()
    };
    builder
        .insert_header(header::LastModified(HttpDate::from(last_modified)))
        .insert_header((header::ETAG, etag))
        .insert_header((header::ACCEPT_RANGES, "bytes"));

    if not_modified {
        return builder.finish();
    }
    builder.content_type(mime.essence_str());

    let total = asset.data.len() as u64;
    let Some(range) = req
        .headers()
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok())
    else {
        return builder.body(asset.data.into_owned());
    };

    match HttpRange::parse(range, total) {
        Ok(ranges) if !ranges.is_empty() => {
            let range = &ranges[0];
            let start = range.start as usize;
            let end = (range.start + range.length) as usize;
            builder
                .status(StatusCode::PARTIAL_CONTENT)
                .insert_header((
                    header::CONTENT_RANGE,
                    format!("bytes {}-{}/{}", range.start, end.saturating_sub(1), total),
                ))
                .body(asset.data[start..end].to_vec())
        }
        _ => builder
            .status(StatusCode::RANGE_NOT_SATISFIABLE)
            .insert_header((header::CONTENT_RANGE, format!("bytes */{}", total)))
            .finish(),
    }
}

fn is_not_modified(req: &HttpRequest, etag: &str, last_modified: SystemTime) -> bool {
    if let Some(value) = req
        .headers()
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
    {
        return value
            .split(',')
            .map(str::trim)
            .any(|candidate| candidate == "*" || candidate == etag || candidate.trim_start_matches("W/") == etag);
    }

    match req.get_header::<header::IfModifiedSince>() {
        Some(header::IfModifiedSince(since)) => {
            unix_secs(last_modified) <= unix_secs(SystemTime::from(since))
        }
        None => false,
    }
}

fn unix_secs(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
