// src/companion.rs

//! Companion file discovery for the player page.
//!
//! Given the media file a player page was requested for, looks at its sibling
//! files and picks out a danmaku comment track and any `.srt` subtitles by
//! file name. Discovery never fails: anything that goes wrong just leaves the
//! bundle emptier.

use log::debug;
use serde::{Serialize, Serializer};

use crate::{
    directory_browser::EntryMetadata,
    language::{LanguageInfo, LanguageResolver},
    root_fs::RootFs,
    url::{ResolvedUrl, ROOT_RELATIVE},
};

const DANMAKU_SUFFIXES: &[&str] = &[
    ".danmaku.xml",
    ".danmuku.xml",
    ".comment.xml",
    ".comments.xml",
    ".xml",
];
const DANMAKU_NAMES: &[&str] = &["danmaku.xml", "danmuku.xml", "comment.xml", "comments.xml"];
const SUBTITLE_SUFFIX: &str = ".srt";

const UNDETERMINED_TAG: &str = "und";
const UNDETERMINED_DISPLAY: &str = "CC";

/// Characters dropped from a subtitle language code.
const LANG_CODE_FILTER: &[char] = &[
    '?', '@', '|', ' ', '[', ']', '(', ')', '{', '}', '<', '>', '？', '｜', '【', '】', '（', '）',
    '「', '」', '『', '』',
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtitleRef {
    /// BCP-47 tag, or `und` when the language is unknown.
    #[serde(rename = "lang")]
    pub language_tag: String,
    #[serde(rename = "lang_name")]
    pub display_name: String,
    #[serde(rename = "lang_info")]
    pub language_info: LanguageInfo,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlayerBundle {
    #[serde(rename = "danmaku", serialize_with = "empty_when_absent")]
    pub danmaku_url: Option<String>,
    pub subtitles: Vec<SubtitleRef>,
}

fn empty_when_absent<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(value.as_deref().unwrap_or_default())
}

/// Which rule matched a danmaku candidate. Lower tiers win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum DanmakuTier {
    FullName,
    BaseName,
    Literal,
}

/// Scans the directory containing `target` for companions.
///
/// # Arguments
/// * `root` - The served directory tree
/// * `target` - Resolved URL of the media file the player was opened for
/// * `languages` - Resolver used to label subtitle languages
///
/// # Returns
/// * `PlayerBundle` - The danmaku track and subtitles found; empty when the
///   target is the root or its directory cannot be read
pub fn discover(root: &RootFs, target: &ResolvedUrl, languages: &impl LanguageResolver) -> PlayerBundle {
    if !target.valid || target.relative_path == ROOT_RELATIVE {
        return PlayerBundle::default();
    }

    let dir_path = target
        .relative_path
        .rsplit_once('/')
        .map(|(dir, _)| dir)
        .unwrap_or(ROOT_RELATIVE);

    let entries = match root.read_dir(dir_path) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Unable to list <{}> for companions: {}", dir_path, e);
            return PlayerBundle::default();
        }
    };

    let bundle = match_companions(&target.canonical_url, &entries, languages);
    debug!("PlayerData for <{}>: {:?}", target.canonical_url, bundle);
    bundle
}

/// Picks companions for `canonical_url` out of its sibling `entries`, in the
/// order given. Within a danmaku tier the earliest entry wins.
pub fn match_companions(
    canonical_url: &str,
    entries: &[impl EntryMetadata],
    languages: &impl LanguageResolver,
) -> PlayerBundle {
    let mut bundle = PlayerBundle::default();
    let (url_dir, file_name) = canonical_url.rsplit_once('/').unwrap_or(("", canonical_url));
    if file_name.is_empty() {
        return bundle;
    }
    let base_name = strip_extension(file_name);

    let mut danmaku: Option<(DanmakuTier, String)> = None;
    for entry in entries.iter().filter(|e| !e.is_dir()) {
        let name = entry.name();
        if name == file_name {
            continue;
        }
        let entry_url = format!("{}/{}", url_dir, name);

        if let Some(tier) = danmaku_tier(name, file_name, base_name) {
            if danmaku.as_ref().map_or(true, |(best, _)| tier < *best) {
                danmaku = Some((tier, entry_url));
            }
            continue;
        }

        if !name.ends_with(SUBTITLE_SUFFIX) {
            continue;
        }
        let prefix = if name.starts_with(file_name) {
            file_name
        } else if name.starts_with(base_name) {
            base_name
        } else {
            continue;
        };
        bundle.subtitles.push(subtitle_ref(prefix, name, entry_url, languages));
    }

    bundle.danmaku_url = danmaku.map(|(_, url)| url);
    bundle
}

fn strip_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(dot) if dot > 0 => &file_name[..dot],
        _ => file_name,
    }
}

fn danmaku_tier(name: &str, file_name: &str, base_name: &str) -> Option<DanmakuTier> {
    let has_suffix = DANMAKU_SUFFIXES.iter().any(|suffix| name.ends_with(suffix));
    if has_suffix && name.starts_with(file_name) {
        Some(DanmakuTier::FullName)
    } else if has_suffix && name.starts_with(base_name) {
        Some(DanmakuTier::BaseName)
    } else if DANMAKU_NAMES.contains(&name) {
        Some(DanmakuTier::Literal)
    } else {
        None
    }
}

/// Pulls the language part out of a subtitle name, e.g. `en` from
/// `Show.S01E01.en.srt` with prefix `Show.S01E01`.
pub fn subtitle_language_code(prefix: &str, name: &str) -> String {
    let rest = name.strip_prefix(prefix).unwrap_or(name);
    let rest = rest.strip_suffix(SUBTITLE_SUFFIX).unwrap_or(rest);
    let rest = rest.trim_matches(|c| matches!(c, '.' | '-' | ' '));

    let code: String = rest
        .chars()
        .map(|c| if c == '.' || c == '_' { '-' } else { c })
        .filter(|c| !LANG_CODE_FILTER.contains(c))
        .collect();
    code.trim_matches(' ').to_string()
}

fn subtitle_ref(prefix: &str, name: &str, url: String, languages: &impl LanguageResolver) -> SubtitleRef {
    let code = subtitle_language_code(prefix, name);
    let resolved = if code.is_empty() {
        None
    } else {
        languages.resolve(&code)
    };

    match resolved {
        Some(info) => {
            let display = if info.has_valid_win_id() {
                info.win_id
            } else {
                info.iso639_3
            };
            SubtitleRef {
                language_tag: info.bcp47.to_string(),
                display_name: display.to_uppercase(),
                language_info: info,
                url,
            }
        }
        None => SubtitleRef {
            language_tag: UNDETERMINED_TAG.to_string(),
            display_name: UNDETERMINED_DISPLAY.to_string(),
            language_info: LanguageInfo::UNDETERMINED,
            url,
        },
    }
}
