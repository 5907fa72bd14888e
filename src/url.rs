// src/url.rs

//! Request path resolution.
//!
//! Every request path goes through [`resolve`] before anything touches the
//! disk. The steps run in a fixed order: lexical cleaning against a virtual
//! root, then localisation into a platform-safe relative path, then
//! re-rooting for the canonical URL. Only [`ResolvedUrl::relative_path`] is
//! ever joined onto the root directory.

use log::{debug, warn};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use thiserror::Error;

/// Relative path used for the root directory itself.
pub const ROOT_RELATIVE: &str = ".";

/// Characters escaped when a canonical URL is sent back to the client.
const PATH_ESCAPES: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUrl {
    /// Always starts with `/` and never contains `.` or `..` segments.
    pub canonical_url: String,
    /// Safe to join onto the root directory; `.` for the root.
    pub relative_path: String,
    pub valid: bool,
}

impl ResolvedUrl {
    fn invalid() -> Self {
        Self {
            canonical_url: String::new(),
            relative_path: String::new(),
            valid: false,
        }
    }

    pub fn is_root(&self) -> bool {
        self.valid && self.canonical_url == "/"
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
enum LocalizeError {
    #[error("path escapes the root")]
    Escapes,
    #[error("path contains a NUL byte")]
    NulByte,
    #[error("path contains a volume or drive separator")]
    VolumeSeparator,
    #[error("path names a reserved device <{0}>")]
    ReservedName(String),
}

/// Resolves an already percent-decoded request path.
pub fn resolve(raw: &str) -> ResolvedUrl {
    debug!("HTTP_URL_REQUEST:  {}", raw);

    let clean = clean_lexically(raw);
    debug!(" ->  URL_CLEAN:    {}", clean);

    let relative_path = match localize(&clean, cfg!(windows)) {
        Ok(path) => path,
        Err(e) => {
            warn!("Invalid URL in request <{}>: {}", raw, e);
            return ResolvedUrl::invalid();
        }
    };

    let canonical_url = if relative_path == ROOT_RELATIVE {
        "/".to_string()
    } else {
        format!("/{}", relative_path)
    };
    debug!(" ->  URL_REAL:     {}", canonical_url);

    ResolvedUrl {
        canonical_url,
        relative_path,
        valid: true,
    }
}

/// Percent-encodes a canonical URL for use in a `Location` header.
pub fn encode_path(canonical_url: &str) -> String {
    utf8_percent_encode(canonical_url, PATH_ESCAPES).to_string()
}

/// Purely lexical cleaning relative to a virtual root. Repeated separators and
/// `.` segments collapse; `..` pops a previous segment when there is one and
/// is otherwise kept so that localisation can reject it.
fn clean_lexically(raw: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in raw.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        ROOT_RELATIVE.to_string()
    } else {
        segments.join("/")
    }
}

fn localize(clean: &str, windows: bool) -> Result<String, LocalizeError> {
    if clean == ROOT_RELATIVE {
        return Ok(clean.to_string());
    }

    for segment in clean.split('/') {
        if segment == ".." {
            return Err(LocalizeError::Escapes);
        }
        if segment.contains('\0') {
            return Err(LocalizeError::NulByte);
        }
        if windows {
            if segment.contains(':') || segment.contains('\\') {
                return Err(LocalizeError::VolumeSeparator);
            }
            if is_reserved_device_name(segment) {
                return Err(LocalizeError::ReservedName(segment.to_string()));
            }
        }
    }

    Ok(clean.to_string())
}

fn is_reserved_device_name(segment: &str) -> bool {
    let stem = segment.split('.').next().unwrap_or(segment).trim_end_matches(' ');
    let upper = stem.to_ascii_uppercase();
    match upper.as_str() {
        "CON" | "PRN" | "AUX" | "NUL" | "CONIN$" | "CONOUT$" => true,
        _ => {
            let bytes = upper.as_bytes();
            bytes.len() == 4
                && (upper.starts_with("COM") || upper.starts_with("LPT"))
                && (b'1'..=b'9').contains(&bytes[3])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_slash_resolve_to_root() {
        for raw in ["", "/", "//", "/./", "."] {
            let url = resolve(raw);
            assert!(url.valid, "{raw:?} should be valid");
            assert_eq!(url.canonical_url, "/");
            assert_eq!(url.relative_path, ".");
            assert!(url.is_root());
        }
    }

    #[test]
    fn collapses_separators_and_dots() {
        let url = resolve("/movies//2024/./show/");
        assert!(url.valid);
        assert_eq!(url.canonical_url, "/movies/2024/show");
        assert_eq!(url.relative_path, "movies/2024/show");
    }

    #[test]
    fn inner_parent_segments_stay_inside() {
        let url = resolve("/a/b/../../c");
        assert!(url.valid);
        assert_eq!(url.canonical_url, "/c");
        assert_eq!(url.relative_path, "c");
    }

    #[test]
    fn escaping_the_root_is_invalid() {
        for raw in ["/..", "/../etc/passwd", "/a/../../b", "..", "/a/b/../../../../x"] {
            let url = resolve(raw);
            assert!(!url.valid, "{raw:?} should be rejected");
            assert!(url.relative_path.is_empty());
        }
    }

    #[test]
    fn valid_results_never_contain_parent_segments() {
        let inputs = [
            "/a/../b/..", "/.../x", "/a/..b/c", "/a/b../c", "/x/./../y/./z/..",
        ];
        for raw in inputs {
            let url = resolve(raw);
            if url.valid {
                assert!(url.canonical_url.starts_with('/'));
                assert!(!url.relative_path.split('/').any(|s| s == ".."));
                assert!(!url.relative_path.starts_with('/'));
            }
        }
    }

    #[test]
    fn nul_byte_is_invalid() {
        assert!(!resolve("/a\0b").valid);
    }

    #[test]
    fn windows_rules_reject_volumes_and_devices() {
        assert_eq!(localize("c:/windows", true), Err(LocalizeError::VolumeSeparator));
        assert_eq!(localize("a\\..\\b", true), Err(LocalizeError::VolumeSeparator));
        assert!(matches!(localize("dir/CON", true), Err(LocalizeError::ReservedName(_))));
        assert!(matches!(localize("lpt1.txt", true), Err(LocalizeError::ReservedName(_))));
        assert_eq!(localize("lpt10.txt", true), Ok("lpt10.txt".to_string()));
        assert_eq!(localize("console/a.txt", true), Ok("console/a.txt".to_string()));
    }

    #[test]
    fn encode_path_escapes_reserved_characters() {
        assert_eq!(encode_path("/movies/a b#1?.mp4"), "/movies/a%20b%231%3F.mp4");
        assert_eq!(encode_path("/动画/100%"), "/%E5%8A%A8%E7%94%BB/100%25");
    }

    #[test]
    fn unix_rules_allow_colons() {
        assert_eq!(localize("12:00.mp4", false), Ok("12:00.mp4".to_string()));
    }
}
