// src/directory_browser.rs

//! S3-style bucket listings for a single directory.
//!
//! A listing covers the immediate children of one directory and is rebuilt
//! from a fresh scan on every request. Each entry carries a cheap fingerprint
//! derived from its prefix, name, size and modification time (never the file
//! content) so clients get a stable per-entry token.

use std::{fmt::Write as _, io, time::SystemTime};

use chrono::{DateTime, Local, SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::root_fs::RootFs;

pub const STORAGE_CLASS: &str = "STANDARD";
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
pub const STYLESHEET_ID: &str = "moefile-xslt";

const ROOT_TAG: &str = "ListBucketResult";
const FINGERPRINT_SEED_HI: u64 = 0x66cc_ff99_2012_0712;
const FINGERPRINT_SEED_LO: u64 = 0x1145_1419_0d00_0721;

/// What the listing needs to know about a directory entry. Implemented by
/// real disk entries and by plain in-memory fixtures alike.
pub trait EntryMetadata {
    fn name(&self) -> &str;
    fn size(&self) -> u64;
    fn is_dir(&self) -> bool;
    fn modified(&self) -> SystemTime;
}

/// An entry that exists only in memory.
#[derive(Debug, Clone)]
pub struct StaticEntry {
    pub name: String,
    pub size: u64,
    pub is_dir: bool,
    pub modified: SystemTime,
}

impl EntryMetadata for StaticEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn is_dir(&self) -> bool {
        self.is_dir
    }

    fn modified(&self) -> SystemTime {
        self.modified
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Owner {
    #[serde(rename = "ID")]
    pub id: &'static str,
    #[serde(rename = "DisplayName")]
    pub display_name: &'static str,
}

pub const DEFAULT_OWNER: Owner = Owner {
    id: "0",
    display_name: "root",
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingEntry {
    #[serde(rename = "FileName")]
    pub name: String,
    #[serde(rename = "IsDirectory")]
    pub is_directory: bool,
    #[serde(rename = "Key")]
    pub full_path: String,
    #[serde(rename = "LastModified")]
    pub last_modified: String,
    #[serde(rename = "LastModifiedUnix")]
    pub last_modified_unix: i64,
    #[serde(rename = "ETag")]
    pub identifier: String,
    /// Always 0 for directories.
    #[serde(rename = "Size")]
    pub size: u64,
    #[serde(rename = "StorageClass")]
    pub storage_class: &'static str,
    #[serde(rename = "Owner")]
    pub owner: Owner,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryListing {
    pub bucket_name: String,
    /// Listed path without the leading slash; empty at the root.
    pub path_prefix: String,
    /// No pagination yet, so this is always false.
    pub truncated: bool,
    pub entries: Vec<ListingEntry>,
}

#[derive(Serialize)]
struct ListBucketResult<'a> {
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Prefix")]
    prefix: &'a str,
    #[serde(rename = "IsTruncated")]
    is_truncated: bool,
    #[serde(rename = "Contents")]
    contents: &'a [ListingEntry],
    #[serde(rename = "ServerTimezoneOffset")]
    server_timezone_offset: String,
}

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("unable to marshal ListBucketResult: {0}")]
    Marshal(String),
    #[error("serialised listing has no closing root tag")]
    MissingRoot,
}

/// How a listing is turned into bytes.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub indent: bool,
    /// Complete `<xsl:stylesheet>` element to embed, if any.
    pub stylesheet: Option<String>,
}

impl DirectoryListing {
    pub fn new(bucket_name: &str, path_prefix: &str) -> Self {
        Self {
            bucket_name: bucket_name.to_string(),
            path_prefix: path_prefix.to_string(),
            truncated: false,
            entries: Vec::new(),
        }
    }

    pub fn add_entry(&mut self, entry: &impl EntryMetadata) {
        let name = entry.name();
        let is_directory = entry.is_dir();
        // stat reports a block size for directories; listings show 0
        let size = if is_directory { 0 } else { entry.size() };
        let modified: DateTime<Utc> = entry.modified().into();
        let modified_nanos = modified.timestamp_nanos_opt().unwrap_or_default();

        let full_path = if self.path_prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.path_prefix.trim_end_matches('/'), name)
        };

        let identifier = fingerprint(
            format!("{} {} {} {}", self.path_prefix, name, size, modified_nanos).as_bytes(),
        );

        self.entries.push(ListingEntry {
            name: name.to_string(),
            is_directory,
            full_path,
            last_modified: modified.to_rfc3339_opts(SecondsFormat::Secs, true),
            last_modified_unix: modified.timestamp(),
            identifier,
            size,
            storage_class: STORAGE_CLASS,
            owner: DEFAULT_OWNER,
        });
    }

    /// Serialises the listing as a complete XML document. Either the whole
    /// document is produced or an error; never a partial body.
    pub fn to_xml(&self, options: &RenderOptions) -> Result<String, ListingError> {
        let result = ListBucketResult {
            name: &self.bucket_name,
            prefix: &self.path_prefix,
            is_truncated: self.truncated,
            contents: &self.entries,
            server_timezone_offset: Local::now().format("%:z").to_string(),
        };

        let mut body = String::new();
        let mut serializer = quick_xml::se::Serializer::with_root(&mut body, Some(ROOT_TAG))
            .map_err(|e| ListingError::Marshal(e.to_string()))?;
        if options.indent {
            serializer.indent('\t', 1);
        }
        result
            .serialize(serializer)
            .map_err(|e| ListingError::Marshal(e.to_string()))?;

        let mut document = String::with_capacity(body.len() + 128);
        document.push_str(XML_DECLARATION);
        document.push('\n');

        match &options.stylesheet {
            Some(stylesheet) => {
                let _ = writeln!(
                    document,
                    r##"<?xml-stylesheet type="text/xsl" href="#{}"?>"##,
                    STYLESHEET_ID
                );
                let closing = format!("</{}>", ROOT_TAG);
                let at = body.rfind(&closing).ok_or(ListingError::MissingRoot)?;
                document.push_str(&body[..at]);
                document.push_str(stylesheet);
                document.push_str(&body[at..]);
            }
            None => document.push_str(&body),
        }

        Ok(document)
    }
}

/// Lists the immediate children of `relative_path`, which the caller has
/// already confirmed is a directory.
///
/// Blocks on the filesystem; async callers run it through `web::block`.
///
/// # Arguments
/// * `root` - The served directory tree
/// * `bucket_name` - Reported as `Name`
/// * `canonical_url` - Canonical URL of the directory, used as `Prefix`
/// * `relative_path` - The same directory relative to `root`
///
/// # Returns
/// * `Ok(DirectoryListing)` - One entry per readable child
/// * `Err(io::Error)` - The directory itself could not be read
pub fn build_listing(
    root: &RootFs,
    bucket_name: &str,
    canonical_url: &str,
    relative_path: &str,
) -> io::Result<DirectoryListing> {
    let mut listing = DirectoryListing::new(bucket_name, canonical_url.trim_start_matches('/'));
    for entry in root.read_dir(relative_path)? {
        listing.add_entry(&entry);
    }
    Ok(listing)
}

/// Fast non-cryptographic fingerprint, rendered as 32 lowercase hex digits.
///
/// Two xorshift-mixed lanes absorb one byte at a time. Deterministic, and
/// any changed input byte almost certainly changes the output, but it is not
/// collision resistant and must not be used for anything security related.
pub fn fingerprint(input: &[u8]) -> String {
    let mut hi = FINGERPRINT_SEED_HI;
    let mut lo = FINGERPRINT_SEED_LO;
    for &byte in input {
        hi ^= u64::from(byte);
        hi ^= hi << 13;
        hi ^= lo >> 7;
        hi ^= hi << 17;
        lo ^= hi;
        lo ^= hi << 19;
        lo ^= lo >> 5;
        lo ^= hi << 11;
    }
    format!("{:016x}{:016x}", hi, lo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn entry(name: &str, size: u64, is_dir: bool, secs: u64) -> StaticEntry {
        StaticEntry {
            name: name.to_string(),
            size,
            is_dir,
            modified: SystemTime::UNIX_EPOCH + Duration::from_secs(secs),
        }
    }

    #[test]
    fn fingerprint_is_deterministic_and_sensitive() {
        let a = fingerprint(b"movies a.mp4 10 1000");
        assert_eq!(a, fingerprint(b"movies a.mp4 10 1000"));
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

        assert_ne!(a, fingerprint(b"movies b.mp4 10 1000"));
        assert_ne!(a, fingerprint(b"movies a.mp4 11 1000"));
        assert_ne!(a, fingerprint(b"movies a.mp4 10 1001"));
        assert_ne!(a, fingerprint(b"series a.mp4 10 1000"));
    }

    #[test]
    fn fingerprint_of_empty_input_is_the_seed() {
        assert_eq!(
            fingerprint(b""),
            "66ccff9920120712114514190d000721"
        );
    }

    #[test]
    fn entry_identifier_tracks_metadata() {
        let mut listing = DirectoryListing::new("bucket", "movies");
        listing.add_entry(&entry("a.mp4", 10, false, 100));
        listing.add_entry(&entry("a.mp4", 10, false, 100));
        listing.add_entry(&entry("a.mp4", 11, false, 100));
        listing.add_entry(&entry("a.mp4", 10, false, 101));

        let ids: Vec<&str> = listing.entries.iter().map(|e| e.identifier.as_str()).collect();
        assert_eq!(ids[0], ids[1]);
        assert_ne!(ids[0], ids[2]);
        assert_ne!(ids[0], ids[3]);
        assert_eq!(
            ids[0],
            fingerprint(format!("movies a.mp4 10 {}", 100_000_000_000u64).as_bytes())
        );
    }

    #[test]
    fn directories_report_zero_size() {
        let mut listing = DirectoryListing::new("bucket", "");
        listing.add_entry(&entry("sub", 4096, true, 0));
        listing.add_entry(&entry("file.bin", 4096, false, 0));

        assert_eq!(listing.entries[0].size, 0);
        assert!(listing.entries[0].is_directory);
        assert_eq!(listing.entries[1].size, 4096);
    }

    #[test]
    fn keys_join_prefix_and_name() {
        let mut root = DirectoryListing::new("bucket", "");
        root.add_entry(&entry("a.txt", 1, false, 0));
        assert_eq!(root.entries[0].full_path, "a.txt");

        let mut nested = DirectoryListing::new("bucket", "movies/2024");
        nested.add_entry(&entry("a.txt", 1, false, 0));
        assert_eq!(nested.entries[0].full_path, "movies/2024/a.txt");
    }

    #[test]
    fn timestamps_are_rfc3339_utc() {
        let mut listing = DirectoryListing::new("bucket", "");
        listing.add_entry(&entry("a.txt", 1, false, 1_700_000_000));
        assert_eq!(listing.entries[0].last_modified, "2023-11-14T22:13:20Z");
        assert_eq!(listing.entries[0].last_modified_unix, 1_700_000_000);
    }

    #[test]
    fn xml_document_shape() {
        let mut listing = DirectoryListing::new("moefile", "movies");
        listing.add_entry(&entry("a & b.mp4", 42, false, 0));
        listing.add_entry(&entry("extras", 4096, true, 0));

        let xml = listing.to_xml(&RenderOptions::default()).unwrap();
        assert!(xml.starts_with(XML_DECLARATION));
        assert!(xml.contains("<ListBucketResult>"));
        assert!(xml.contains("<Name>moefile</Name>"));
        assert!(xml.contains("<Prefix>movies</Prefix>"));
        assert!(xml.contains("<IsTruncated>false</IsTruncated>"));
        assert_eq!(xml.matches("<Contents>").count(), 2);
        assert!(xml.contains("<FileName>a &amp; b.mp4</FileName>"));
        assert!(xml.contains("<Key>movies/extras</Key>"));
        assert!(xml.contains("<StorageClass>STANDARD</StorageClass>"));
        assert!(xml.contains("<Owner><ID>0</ID><DisplayName>root</DisplayName></Owner>"));
        assert!(xml.contains("<ServerTimezoneOffset>"));
        assert!(!xml.contains("xml-stylesheet"));
    }

    #[test]
    fn xml_embeds_stylesheet_inside_root() {
        let listing = DirectoryListing::new("moefile", "");
        let options = RenderOptions {
            indent: true,
            stylesheet: Some("<xsl:stylesheet id=\"moefile-xslt\"/>".to_string()),
        };
        let xml = listing.to_xml(&options).unwrap();

        assert!(xml.contains(r##"<?xml-stylesheet type="text/xsl" href="#moefile-xslt"?>"##));
        let sheet = xml.find("<xsl:stylesheet").unwrap();
        let close = xml.rfind("</ListBucketResult>").unwrap();
        assert!(sheet < close);
        assert!(xml.trim_end().ends_with("</ListBucketResult>"));
    }
}
