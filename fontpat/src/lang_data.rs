//! Built-in orthography tables.
//!
//! [`LANG_DATA`] maps each known language tag to the codepoint coverage its
//! orthography requires, expressed as inclusive ranges. The table is sorted
//! by tag so lookups can binary-search inside a per-first-letter bucket.
//! Coverage here is a distillation; a font scanner compares font charsets
//! against these sets to decide which languages a font supports.

use std::sync::LazyLock;

use crate::charset::CharSet;

/// One orthography: tag plus required coverage.
pub struct LangDef {
    pub tag: &'static str,
    pub ranges: &'static [(u32, u32)],
}

/// Upper bound on table size; the langset bitmap is sized to this.
pub const MAX_LANGS: usize = 256;

// script blocks shared by many orthographies
const LATIN: &[(u32, u32)] = &[(0x41, 0x5A), (0x61, 0x7A)];
const LATIN_EXT: &[(u32, u32)] = &[
    (0x41, 0x5A),
    (0x61, 0x7A),
    (0xC0, 0xD6),
    (0xD8, 0xF6),
    (0xF8, 0xFF),
];
const LATIN_EXT_A: &[(u32, u32)] = &[
    (0x41, 0x5A),
    (0x61, 0x7A),
    (0xC0, 0xD6),
    (0xD8, 0xF6),
    (0xF8, 0x17F),
];
const CYRILLIC: &[(u32, u32)] = &[(0x410, 0x44F)];
const CYRILLIC_EXT: &[(u32, u32)] = &[(0x400, 0x45F), (0x490, 0x4FF)];
const GREEK: &[(u32, u32)] = &[(0x386, 0x386), (0x388, 0x3CE)];
const ARABIC: &[(u32, u32)] = &[(0x621, 0x63A), (0x641, 0x655), (0x660, 0x669)];
const HEBREW: &[(u32, u32)] = &[(0x5D0, 0x5EA)];
const DEVANAGARI: &[(u32, u32)] = &[(0x901, 0x939), (0x93C, 0x94D), (0x950, 0x952), (0x966, 0x96F)];
const BENGALI: &[(u32, u32)] = &[(0x981, 0x983), (0x985, 0x9B9), (0x9BC, 0x9CD), (0x9E6, 0x9EF)];
const GURMUKHI: &[(u32, u32)] = &[(0xA01, 0xA39), (0xA3C, 0xA4D), (0xA66, 0xA74)];
const GUJARATI: &[(u32, u32)] = &[(0xA81, 0xAB9), (0xABC, 0xACD), (0xAE6, 0xAEF)];
const ORIYA: &[(u32, u32)] = &[(0xB01, 0xB39), (0xB3C, 0xB4D), (0xB66, 0xB6F)];
const TAMIL: &[(u32, u32)] = &[(0xB82, 0xBB9), (0xBBE, 0xBCD), (0xBE6, 0xBEF)];
const TELUGU: &[(u32, u32)] = &[(0xC01, 0xC39), (0xC3E, 0xC4D), (0xC66, 0xC6F)];
const KANNADA: &[(u32, u32)] = &[(0xC82, 0xCB9), (0xCBE, 0xCCD), (0xCE6, 0xCEF)];
const MALAYALAM: &[(u32, u32)] = &[(0xD02, 0xD39), (0xD3E, 0xD4D), (0xD66, 0xD6F)];
const SINHALA: &[(u32, u32)] = &[(0xD82, 0xDC6), (0xDCF, 0xDDF)];
const THAI: &[(u32, u32)] = &[(0xE01, 0xE3A), (0xE40, 0xE5B)];
const LAO: &[(u32, u32)] = &[(0xE81, 0xEC6), (0xEC8, 0xECD), (0xED0, 0xED9)];
const TIBETAN: &[(u32, u32)] = &[(0xF00, 0xF6A), (0xF71, 0xF8B), (0xF90, 0xFBC)];
const MYANMAR: &[(u32, u32)] = &[(0x1000, 0x1049)];
const GEORGIAN: &[(u32, u32)] = &[(0x10D0, 0x10F0)];
const ETHIOPIC: &[(u32, u32)] = &[(0x1200, 0x1256), (0x1260, 0x12B5), (0x12C0, 0x135A)];
const CHEROKEE: &[(u32, u32)] = &[(0x13A0, 0x13F4)];
const CANADIAN: &[(u32, u32)] = &[(0x1401, 0x1676)];
const KHMER: &[(u32, u32)] = &[(0x1780, 0x17D3), (0x17E0, 0x17E9)];
const MONGOLIAN: &[(u32, u32)] = &[(0x1820, 0x1877), (0x1880, 0x18A9)];
const HAN_SIMPLIFIED: &[(u32, u32)] = &[(0x3001, 0x3011), (0x4E00, 0x9FA5)];
const HAN_TRADITIONAL: &[(u32, u32)] = &[(0x3001, 0x3011), (0x3105, 0x3129), (0x4E00, 0x9FA5)];
const KANA_AND_KANJI: &[(u32, u32)] = &[
    (0x3001, 0x3011),
    (0x3041, 0x3096),
    (0x30A1, 0x30FA),
    (0x4E00, 0x9FA5),
];
const HANGUL: &[(u32, u32)] = &[(0x3001, 0x3011), (0xAC00, 0xD7A3)];

macro_rules! lang {
    ($tag:literal, $ranges:expr) => {
        LangDef {
            tag: $tag,
            ranges: $ranges,
        }
    };
}

/// Known orthographies, sorted ascending by tag (ASCII, lowercase).
pub static LANG_DATA: &[LangDef] = &[
    lang!("aa", LATIN),
    lang!("ab", CYRILLIC_EXT),
    lang!("af", LATIN_EXT),
    lang!("ak", LATIN_EXT_A),
    lang!("am", ETHIOPIC),
    lang!("an", LATIN_EXT),
    lang!("ar", ARABIC),
    lang!("as", BENGALI),
    lang!("ast", LATIN_EXT),
    lang!("av", CYRILLIC),
    lang!("ay", LATIN_EXT),
    lang!("az-az", LATIN_EXT_A),
    lang!("az-ir", ARABIC),
    lang!("ba", CYRILLIC_EXT),
    lang!("be", CYRILLIC_EXT),
    lang!("bg", CYRILLIC),
    lang!("bh", DEVANAGARI),
    lang!("bho", DEVANAGARI),
    lang!("bi", LATIN),
    lang!("bin", LATIN_EXT),
    lang!("bm", LATIN_EXT_A),
    lang!("bn", BENGALI),
    lang!("bo", TIBETAN),
    lang!("br", LATIN_EXT),
    lang!("bs", LATIN_EXT_A),
    lang!("bua", CYRILLIC_EXT),
    lang!("byn", ETHIOPIC),
    lang!("ca", LATIN_EXT),
    lang!("ce", CYRILLIC),
    lang!("ch", LATIN_EXT),
    lang!("chm", CYRILLIC),
    lang!("chr", CHEROKEE),
    lang!("co", LATIN_EXT),
    lang!("crh", LATIN_EXT_A),
    lang!("cs", LATIN_EXT_A),
    lang!("csb", LATIN_EXT_A),
    lang!("cu", CYRILLIC_EXT),
    lang!("cv", CYRILLIC_EXT),
    lang!("cy", LATIN_EXT_A),
    lang!("da", LATIN_EXT),
    lang!(
        "de",
        &[
            (0x41, 0x5A),
            (0x61, 0x7A),
            (0xC4, 0xC4),
            (0xD6, 0xD6),
            (0xDC, 0xDC),
            (0xDF, 0xDF),
            (0xE4, 0xE4),
            (0xF6, 0xF6),
            (0xFC, 0xFC),
        ]
    ),
    lang!("doi", DEVANAGARI),
    lang!("dv", &[(0x780, 0x7B1)]),
    lang!("dz", TIBETAN),
    lang!("ee", LATIN_EXT_A),
    lang!("el", GREEK),
    lang!("en", LATIN),
    lang!("eo", LATIN_EXT_A),
    lang!("es", LATIN_EXT),
    lang!("et", LATIN_EXT_A),
    lang!("eu", LATIN_EXT),
    lang!("fa", ARABIC),
    lang!("fat", LATIN_EXT_A),
    lang!("ff", LATIN_EXT_A),
    lang!("fi", LATIN_EXT),
    lang!("fil", LATIN),
    lang!("fj", LATIN),
    lang!("fo", LATIN_EXT),
    lang!(
        "fr",
        &[
            (0x41, 0x5A),
            (0x61, 0x7A),
            (0xC0, 0xC2),
            (0xC7, 0xCB),
            (0xCE, 0xCF),
            (0xD4, 0xD4),
            (0xD9, 0xDB),
            (0xE0, 0xE2),
            (0xE7, 0xEB),
            (0xEE, 0xEF),
            (0xF4, 0xF4),
            (0xF9, 0xFB),
            (0x152, 0x153),
        ]
    ),
    lang!("fur", LATIN_EXT),
    lang!("fy", LATIN_EXT),
    lang!("ga", LATIN_EXT),
    lang!("gd", LATIN_EXT),
    lang!("gez", ETHIOPIC),
    lang!("gl", LATIN_EXT),
    lang!("gn", LATIN_EXT),
    lang!("gu", GUJARATI),
    lang!("gv", LATIN_EXT),
    lang!("ha", LATIN_EXT_A),
    lang!("haw", LATIN_EXT_A),
    lang!("he", HEBREW),
    lang!("hi", DEVANAGARI),
    lang!("hne", DEVANAGARI),
    lang!("ho", LATIN),
    lang!("hr", LATIN_EXT_A),
    lang!("hsb", LATIN_EXT_A),
    lang!("ht", LATIN_EXT),
    lang!("hu", LATIN_EXT_A),
    lang!("hy", &[(0x531, 0x556), (0x561, 0x586)]),
    lang!("ia", LATIN),
    lang!("id", LATIN),
    lang!("ie", LATIN),
    lang!("ig", LATIN_EXT_A),
    lang!("ii", &[(0xA000, 0xA48C)]),
    lang!("ik", LATIN_EXT_A),
    lang!("io", LATIN),
    lang!("is", LATIN_EXT),
    lang!("it", LATIN_EXT),
    lang!("iu", CANADIAN),
    lang!("ja", KANA_AND_KANJI),
    lang!("jv", LATIN),
    lang!("ka", GEORGIAN),
    lang!("kaa", CYRILLIC_EXT),
    lang!("kab", LATIN_EXT_A),
    lang!("ki", LATIN_EXT_A),
    lang!("kk", CYRILLIC_EXT),
    lang!("kl", LATIN_EXT),
    lang!("km", KHMER),
    lang!("kn", KANNADA),
    lang!("ko", HANGUL),
    lang!("kok", DEVANAGARI),
    lang!("ks", ARABIC),
    lang!("ku-am", CYRILLIC_EXT),
    lang!("ku-iq", ARABIC),
    lang!("ku-ir", ARABIC),
    lang!("ku-tr", LATIN_EXT_A),
    lang!("kum", CYRILLIC),
    lang!("kv", CYRILLIC_EXT),
    lang!("kw", LATIN_EXT),
    lang!("ky", CYRILLIC_EXT),
    lang!("la", LATIN_EXT),
    lang!("lah", ARABIC),
    lang!("lb", LATIN_EXT),
    lang!("lez", CYRILLIC),
    lang!("lg", LATIN_EXT_A),
    lang!("li", LATIN_EXT),
    lang!("ln", LATIN_EXT_A),
    lang!("lo", LAO),
    lang!("lt", LATIN_EXT_A),
    lang!("lv", LATIN_EXT_A),
    lang!("mai", DEVANAGARI),
    lang!("mg", LATIN_EXT),
    lang!("mh", LATIN_EXT_A),
    lang!("mi", LATIN_EXT_A),
    lang!("mk", CYRILLIC_EXT),
    lang!("ml", MALAYALAM),
    lang!("mn-cn", MONGOLIAN),
    lang!("mn-mn", CYRILLIC_EXT),
    lang!("mni", BENGALI),
    lang!("mo", CYRILLIC_EXT),
    lang!("mr", DEVANAGARI),
    lang!("ms", LATIN),
    lang!("mt", LATIN_EXT_A),
    lang!("my", MYANMAR),
    lang!("na", LATIN),
    lang!("nb", LATIN_EXT),
    lang!("nds", LATIN_EXT),
    lang!("ne", DEVANAGARI),
    lang!("nl", LATIN_EXT),
    lang!("nn", LATIN_EXT),
    lang!("no", LATIN_EXT),
    lang!("nqo", &[(0x7C0, 0x7FA)]),
    lang!("nr", LATIN),
    lang!("nso", LATIN_EXT_A),
    lang!("nv", LATIN_EXT_A),
    lang!("ny", LATIN_EXT),
    lang!("oc", LATIN_EXT),
    lang!("om", LATIN),
    lang!("or", ORIYA),
    lang!("os", CYRILLIC),
    lang!("pa", GURMUKHI),
    lang!("pa-pk", ARABIC),
    lang!("pl", LATIN_EXT_A),
    lang!("ps-af", ARABIC),
    lang!("ps-pk", ARABIC),
    lang!("pt", LATIN_EXT),
    lang!("qu", LATIN_EXT),
    lang!("rm", LATIN_EXT),
    lang!("rn", LATIN),
    lang!("ro", LATIN_EXT_A),
    lang!(
        "ru",
        &[(0x401, 0x401), (0x410, 0x44F), (0x451, 0x451)]
    ),
    lang!("rw", LATIN),
    lang!("sa", DEVANAGARI),
    lang!("sah", CYRILLIC_EXT),
    lang!("sat", DEVANAGARI),
    lang!("sc", LATIN_EXT),
    lang!("sco", LATIN_EXT),
    lang!("sd", ARABIC),
    lang!("se", LATIN_EXT_A),
    lang!("sg", LATIN_EXT),
    lang!("sh", LATIN_EXT_A),
    lang!("shs", LATIN_EXT_A),
    lang!("si", SINHALA),
    lang!("sid", ETHIOPIC),
    lang!("sk", LATIN_EXT_A),
    lang!("sl", LATIN_EXT_A),
    lang!("sm", LATIN),
    lang!("sma", LATIN_EXT),
    lang!("smj", LATIN_EXT),
    lang!("smn", LATIN_EXT_A),
    lang!("sms", LATIN_EXT_A),
    lang!("sn", LATIN),
    lang!("so", LATIN),
    lang!("sq", LATIN_EXT),
    lang!("sr", CYRILLIC),
    lang!("ss", LATIN),
    lang!("st", LATIN),
    lang!("su", LATIN),
    lang!("sv", LATIN_EXT),
    lang!("sw", LATIN),
    lang!("syr", &[(0x710, 0x72C)]),
    lang!("ta", TAMIL),
    lang!("te", TELUGU),
    lang!("tg", CYRILLIC_EXT),
    lang!("th", THAI),
    lang!("ti-er", ETHIOPIC),
    lang!("ti-et", ETHIOPIC),
    lang!("tig", ETHIOPIC),
    lang!("tk", LATIN_EXT_A),
    lang!("tl", LATIN),
    lang!("tn", LATIN_EXT),
    lang!("to", LATIN),
    lang!("tr", LATIN_EXT_A),
    lang!("ts", LATIN),
    lang!("tt", CYRILLIC_EXT),
    lang!("tw", LATIN_EXT_A),
    lang!("ty", LATIN_EXT),
    lang!("tyv", CYRILLIC_EXT),
    lang!("ug", ARABIC),
    lang!("uk", CYRILLIC_EXT),
    lang!(
        "und-zmth",
        &[(0x2200, 0x22FF), (0x27C0, 0x27EF), (0x1D400, 0x1D7FF)]
    ),
    lang!(
        "und-zsye",
        &[(0x2600, 0x27BF), (0x1F300, 0x1F64F), (0x1F900, 0x1F9FF)]
    ),
    lang!("ur", ARABIC),
    lang!("uz", CYRILLIC_EXT),
    lang!("ve", LATIN_EXT_A),
    lang!("vi", &[(0x41, 0x5A), (0x61, 0x7A), (0xC0, 0xFF), (0x102, 0x103), (0x1A0, 0x1B0), (0x1EA0, 0x1EF9)]),
    lang!("vo", LATIN_EXT),
    lang!("vot", LATIN_EXT_A),
    lang!("wa", LATIN_EXT),
    lang!("wal", ETHIOPIC),
    lang!("wen", LATIN_EXT_A),
    lang!("wo", LATIN_EXT_A),
    lang!("xh", LATIN),
    lang!("yap", LATIN),
    lang!("yi", HEBREW),
    lang!("yo", LATIN_EXT_A),
    lang!("za", LATIN),
    lang!("zh-cn", HAN_SIMPLIFIED),
    lang!("zh-hk", HAN_TRADITIONAL),
    lang!("zh-mo", HAN_TRADITIONAL),
    lang!("zh-sg", HAN_SIMPLIFIED),
    lang!("zh-tw", HAN_TRADITIONAL),
    lang!("zu", LATIN),
];

/// `[start, end)` index ranges into [`LANG_DATA`] for each first letter,
/// `a` through `z`.
pub static FIRST_LETTER_BUCKETS: LazyLock<[(u16, u16); 26]> = LazyLock::new(|| {
    let mut buckets = [(0u16, 0u16); 26];
    for letter in 0..26u8 {
        let first = (b'a' + letter) as char;
        let start = LANG_DATA.partition_point(|def| def.tag.as_bytes()[0] < first as u8);
        let end = LANG_DATA.partition_point(|def| def.tag.as_bytes()[0] <= first as u8);
        buckets[letter as usize] = (start as u16, end as u16);
    }
    buckets
});

/// Charset for each entry of [`LANG_DATA`], same order.
pub static LANG_CHARSETS: LazyLock<Vec<CharSet>> = LazyLock::new(|| {
    LANG_DATA
        .iter()
        .map(|def| CharSet::from_ranges(def.ranges.iter().copied()))
        .collect()
});

/// Han-script regions whose coverage distinguishes otherwise-overlapping
/// fonts. A font scanner claims at most one of these per codepage.
pub static CODEPAGE_EXCLUSIVE: &[&str] =
    &["ja", "ko", "zh-cn", "zh-hk", "zh-mo", "zh-sg", "zh-tw"];

/// Is this tag one of the codepage-exclusive Han regions?
pub fn is_exclusive_lang(tag: &str) -> bool {
    CODEPAGE_EXCLUSIVE
        .iter()
        .any(|t| t.eq_ignore_ascii_case(tag))
}

/// Coverage for a codepage-exclusive tag.
pub fn exclusive_charset(tag: &str) -> Option<&'static CharSet> {
    if !is_exclusive_lang(tag) {
        return None;
    }
    LANG_DATA
        .iter()
        .position(|def| def.tag.eq_ignore_ascii_case(tag))
        .map(|idx| &LANG_CHARSETS[idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted_and_lowercase() {
        for pair in LANG_DATA.windows(2) {
            assert!(
                pair[0].tag < pair[1].tag,
                "{} !< {}",
                pair[0].tag,
                pair[1].tag
            );
        }
        for def in LANG_DATA {
            assert_eq!(def.tag, def.tag.to_ascii_lowercase());
            assert!(!def.ranges.is_empty(), "{} has no coverage", def.tag);
        }
    }

    #[test]
    fn table_fits_bitmap() {
        assert!(LANG_DATA.len() <= MAX_LANGS);
    }

    #[test]
    fn buckets_cover_table() {
        let mut seen = 0;
        for (start, end) in FIRST_LETTER_BUCKETS.iter() {
            assert!(start <= end);
            seen += end - start;
        }
        assert_eq!(seen as usize, LANG_DATA.len());
    }

    #[test]
    fn exclusive_tags_are_in_table() {
        for tag in CODEPAGE_EXCLUSIVE {
            assert!(
                LANG_DATA.iter().any(|def| def.tag == *tag),
                "{tag} missing from LANG_DATA"
            );
            assert!(exclusive_charset(tag).is_some());
        }
        assert!(exclusive_charset("en").is_none());
    }

    #[test]
    fn han_regions_differ() {
        let cn = exclusive_charset("zh-cn").unwrap();
        let tw = exclusive_charset("zh-tw").unwrap();
        let ja = exclusive_charset("ja").unwrap();
        assert!(cn.is_subset(tw));
        assert!(!tw.is_subset(cn));
        assert!(!ja.is_subset(cn));
    }
}
