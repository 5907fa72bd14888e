// src/language.rs

//! Subtitle language lookup.
//!
//! Maps free-text codes found in subtitle file names (`en`, `eng`, `chs`,
//! `zh-TW`, `日本語`, ...) onto a language descriptor. A small table of
//! common subtitle languages carries Windows ids, regional variants and
//! aliases; any other ISO 639-1 or 639-3 code falls through to `isolang`.

use std::collections::HashMap;

use isolang::Language;
use once_cell::sync::Lazy;
use serde::Serialize;

/// Everything known about one language or regional variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LanguageInfo {
    pub name: &'static str,
    pub bcp47: &'static str,
    /// Three-letter Windows language id (`ENU`, `CHS`, ...), or empty.
    pub win_id: &'static str,
    pub iso639_1: &'static str,
    pub iso639_2: &'static str,
    pub iso639_3: &'static str,
}

impl LanguageInfo {
    pub const UNDETERMINED: LanguageInfo = LanguageInfo {
        name: "und",
        bcp47: "zz",
        win_id: "ZZZ",
        iso639_1: "zz",
        iso639_2: "und",
        iso639_3: "und",
    };

    pub fn has_valid_win_id(&self) -> bool {
        self.win_id.len() == 3
            && self.win_id.bytes().all(|b| b.is_ascii_alphabetic())
            && !self.win_id.eq_ignore_ascii_case("ZZZ")
    }
}

/// Something that can turn a free-text code into a language.
pub trait LanguageResolver {
    fn resolve(&self, code: &str) -> Option<LanguageInfo>;
}

struct Row {
    info: LanguageInfo,
    aliases: &'static [&'static str],
}

const fn row(
    bcp47: &'static str,
    win_id: &'static str,
    iso639_1: &'static str,
    iso639_2: &'static str,
    iso639_3: &'static str,
    name: &'static str,
    aliases: &'static [&'static str],
) -> Row {
    Row {
        info: LanguageInfo {
            name,
            bcp47,
            win_id,
            iso639_1,
            iso639_2,
            iso639_3,
        },
        aliases,
    }
}

// Generic entries come before regional ones so that shared codes (`en`,
// `eng`, `zh`) land on the generic language.
static LANGUAGES: &[Row] = &[
    row("en", "ENU", "en", "eng", "eng", "English", &["english", "英语", "英文", "英語"]),
    row("en-US", "ENU", "en", "eng", "eng", "English (United States)", &["us"]),
    row("en-GB", "ENG", "en", "eng", "eng", "English (United Kingdom)", &["uk-en", "british"]),
    row("zh", "", "zh", "chi", "zho", "Chinese", &["chinese", "中文", "汉语", "漢語"]),
    row(
        "zh-Hans",
        "CHS",
        "zh",
        "chi",
        "zho",
        "Chinese (Simplified)",
        &["chs", "sc", "gb", "cn", "zhs", "zh-cn", "zh-sg", "zh-hans-cn", "简体", "简中", "简体中文", "简"],
    ),
    row(
        "zh-Hant",
        "CHT",
        "zh",
        "chi",
        "zho",
        "Chinese (Traditional)",
        &["cht", "tc", "big5", "zht", "zh-tw", "zh-hant-tw", "繁体", "繁體", "繁中", "繁体中文", "繁體中文", "繁"],
    ),
    row("zh-HK", "ZHH", "zh", "chi", "zho", "Chinese (Hong Kong)", &["hk", "zh-hant-hk"]),
    row("yue", "", "", "", "yue", "Cantonese", &["cantonese", "粤语", "粵語"]),
    row("ja", "JPN", "ja", "jpn", "jpn", "Japanese", &["japanese", "jp", "jap", "日本語", "日语", "日文"]),
    row("ko", "KOR", "ko", "kor", "kor", "Korean", &["korean", "kr", "한국어", "韩语", "韓語"]),
    row("fr", "FRA", "fr", "fre", "fra", "French", &["french", "français", "francais", "法语"]),
    row("fr-CA", "FRC", "fr", "fre", "fra", "French (Canada)", &[]),
    row("de", "DEU", "de", "ger", "deu", "German", &["german", "deutsch", "德语"]),
    row("es", "ESN", "es", "spa", "spa", "Spanish", &["spanish", "esp", "español", "espanol", "西班牙语"]),
    row("es-MX", "ESM", "es", "spa", "spa", "Spanish (Mexico)", &["es-419", "latino"]),
    row("it", "ITA", "it", "ita", "ita", "Italian", &["italian", "italiano"]),
    row("pt", "PTG", "pt", "por", "por", "Portuguese", &["portuguese", "português"]),
    row("pt-BR", "PTB", "pt", "por", "por", "Portuguese (Brazil)", &["br", "pob"]),
    row("ru", "RUS", "ru", "rus", "rus", "Russian", &["russian", "русский", "俄语"]),
    row("uk", "UKR", "uk", "ukr", "ukr", "Ukrainian", &["ukrainian"]),
    row("pl", "PLK", "pl", "pol", "pol", "Polish", &["polish", "polski"]),
    row("cs", "CSY", "cs", "cze", "ces", "Czech", &["czech"]),
    row("sk", "SKY", "sk", "slo", "slk", "Slovak", &["slovak"]),
    row("sl", "SLV", "sl", "slv", "slv", "Slovenian", &["slovenian"]),
    row("hr", "HRV", "hr", "hrv", "hrv", "Croatian", &["croatian"]),
    row("sr", "SRB", "sr", "srp", "srp", "Serbian", &["serbian"]),
    row("bg", "BGR", "bg", "bul", "bul", "Bulgarian", &["bulgarian"]),
    row("ro", "ROM", "ro", "rum", "ron", "Romanian", &["romanian"]),
    row("hu", "HUN", "hu", "hun", "hun", "Hungarian", &["hungarian", "magyar"]),
    row("el", "ELL", "el", "gre", "ell", "Greek", &["greek"]),
    row("tr", "TRK", "tr", "tur", "tur", "Turkish", &["turkish", "türkçe"]),
    row("nl", "NLD", "nl", "dut", "nld", "Dutch", &["dutch", "nederlands"]),
    row("sv", "SVE", "sv", "swe", "swe", "Swedish", &["swedish", "svenska"]),
    row("nb", "NOR", "nb", "nob", "nob", "Norwegian Bokmål", &["no", "nor", "norwegian"]),
    row("da", "DAN", "da", "dan", "dan", "Danish", &["danish", "dansk"]),
    row("fi", "FIN", "fi", "fin", "fin", "Finnish", &["finnish", "suomi"]),
    row("et", "ETI", "et", "est", "est", "Estonian", &["estonian"]),
    row("lv", "LVI", "lv", "lav", "lav", "Latvian", &["latvian"]),
    row("lt", "LTH", "lt", "lit", "lit", "Lithuanian", &["lithuanian"]),
    row("he", "HEB", "he", "heb", "heb", "Hebrew", &["hebrew", "iw"]),
    row("ar", "ARA", "ar", "ara", "ara", "Arabic", &["arabic"]),
    row("fa", "FAR", "fa", "per", "fas", "Persian", &["persian", "farsi"]),
    row("ur", "URD", "ur", "urd", "urd", "Urdu", &["urdu"]),
    row("hi", "HIN", "hi", "hin", "hin", "Hindi", &["hindi"]),
    row("bn", "BNB", "bn", "ben", "ben", "Bangla", &["bengali", "bangla"]),
    row("ta", "TAI", "ta", "tam", "tam", "Tamil", &["tamil"]),
    row("te", "TEL", "te", "tel", "tel", "Telugu", &["telugu"]),
    row("th", "THA", "th", "tha", "tha", "Thai", &["thai", "泰语"]),
    row("vi", "VIT", "vi", "vie", "vie", "Vietnamese", &["vietnamese", "tiếng việt", "越南语"]),
    row("id", "IND", "id", "ind", "ind", "Indonesian", &["indonesian", "bahasa"]),
    row("ms", "MSL", "ms", "may", "msa", "Malay", &["malay"]),
    row("fil", "FPO", "", "fil", "fil", "Filipino", &["filipino", "tagalog", "tl"]),
    row("la", "", "la", "lat", "lat", "Latin", &["latin"]),
];

static INDEX: Lazy<HashMap<String, usize>> = Lazy::new(|| {
    let mut index = HashMap::new();
    for (position, row) in LANGUAGES.iter().enumerate() {
        let info = &row.info;
        let keys = [
            info.bcp47,
            info.win_id,
            info.iso639_1,
            info.iso639_2,
            info.iso639_3,
            info.name,
        ];
        for key in keys.iter().chain(row.aliases.iter()) {
            if key.is_empty() {
                continue;
            }
            index.entry(key.to_lowercase()).or_insert(position);
        }
    }
    index
});

/// The bundled language table.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinLanguages;

impl BuiltinLanguages {
    fn lookup(key: &str) -> Option<LanguageInfo> {
        INDEX
            .get(key)
            .map(|&position| LANGUAGES[position].info)
            .or_else(|| iso_lookup(key))
    }
}

/// Plain ISO 639 lookup for codes the table does not know. These carry no
/// Windows id.
fn iso_lookup(key: &str) -> Option<LanguageInfo> {
    if !key.bytes().all(|b| b.is_ascii_lowercase()) {
        return None;
    }
    let language = match key.len() {
        2 => Language::from_639_1(key)?,
        3 => Language::from_639_3(key)?,
        _ => return None,
    };

    let iso639_3 = language.to_639_3();
    let iso639_1 = language.to_639_1().unwrap_or("");
    Some(LanguageInfo {
        name: language.to_name(),
        bcp47: if iso639_1.is_empty() { iso639_3 } else { iso639_1 },
        win_id: "",
        iso639_1,
        iso639_2: iso639_3,
        iso639_3,
    })
}

impl LanguageResolver for BuiltinLanguages {
    /// Tries the whole code, then shorter `-` prefixes (`zh-hans-xx` →
    /// `zh-hans` → `zh`), then each segment on its own (`chs-eng` → `chs`).
    fn resolve(&self, code: &str) -> Option<LanguageInfo> {
        let code = code.trim().to_lowercase();
        if code.is_empty() {
            return None;
        }
        if let Some(info) = Self::lookup(&code) {
            return Some(info);
        }

        let parts: Vec<&str> = code.split('-').filter(|p| !p.is_empty()).collect();
        for len in (1..parts.len()).rev() {
            if let Some(info) = Self::lookup(&parts[..len].join("-")) {
                return Some(info);
            }
        }
        parts.iter().find_map(|part| Self::lookup(part))
    }
}
