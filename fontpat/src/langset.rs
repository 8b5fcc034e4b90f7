//! Sets of BCP-47-style language tags.
//!
//! Tags known to the built-in orthography table live in a fixed bitmap;
//! anything else goes to a string fallback. Set comparison reports how
//! closely two sets agree: same tag, same language with a different
//! territory, or different languages entirely.

use std::{collections::BTreeSet, fmt::Display, sync::LazyLock};

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::lang_data::{FIRST_LETTER_BUCKETS, LANG_DATA, MAX_LANGS};

const MAP_WORDS: usize = MAX_LANGS / 32;

/// Outcome of comparing two languages or language sets, best first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LangResult {
    Equal,
    DifferentTerritory,
    DifferentLang,
}

fn lang_end(c: Option<u8>) -> bool {
    matches!(c, None | Some(b'-'))
}

/// Compare two tags character by character, case-insensitively.
///
/// An `und` left-hand side is a wildcard primary: it never reports
/// [`LangResult::DifferentTerritory`].
pub fn lang_compare(s1: &str, s2: &str) -> LangResult {
    let b1 = s1.as_bytes();
    let is_und = b1.len() >= 3
        && b1[..3].eq_ignore_ascii_case(b"und")
        && (b1.len() == 3 || b1[3] == b'-');

    let mut a = b1.iter().map(u8::to_ascii_lowercase);
    let mut b = s2.bytes().map(|c| c.to_ascii_lowercase());
    let mut result = LangResult::DifferentLang;
    loop {
        let c1 = a.next();
        let c2 = b.next();
        if c1 != c2 {
            if !is_und && lang_end(c1) && lang_end(c2) {
                result = LangResult::DifferentTerritory;
            }
            return result;
        }
        match c1 {
            None => {
                return if is_und {
                    result
                } else {
                    LangResult::Equal
                }
            }
            Some(b'-') if !is_und => result = LangResult::DifferentTerritory,
            _ => (),
        }
    }
}

/// Does `superset` cover `sub`? A tag without territory contains every
/// territory variant of the same primary.
pub fn lang_contains(superset: &str, sub: &str) -> bool {
    let mut a = superset.bytes().map(|c| c.to_ascii_lowercase());
    let mut b = sub.bytes().map(|c| c.to_ascii_lowercase());
    loop {
        let c1 = a.next();
        let c2 = b.next();
        if c1 != c2 {
            // super lacking a territory contains sub with one, not vice versa
            return c1.is_none() && c2 == Some(b'-');
        }
        if c1.is_none() {
            return true;
        }
    }
}

/// Index of `tag` in the orthography table, or the insertion point.
pub fn lang_index(tag: &str) -> Result<usize, usize> {
    let Some(first) = tag.bytes().next() else {
        return Err(0);
    };
    let first = first.to_ascii_lowercase();
    if !first.is_ascii_lowercase() {
        return Err(if first < b'a' { 0 } else { LANG_DATA.len() });
    }
    let (start, end) = FIRST_LETTER_BUCKETS[(first - b'a') as usize];
    let (start, end) = (start as usize, end as usize);
    LANG_DATA[start..end]
        .binary_search_by(|def| {
            def.tag
                .bytes()
                .map(|c| c.to_ascii_lowercase())
                .cmp(tag.bytes().map(|c| c.to_ascii_lowercase()))
        })
        .map(|i| i + start)
        .map_err(|i| i + start)
}

fn valid_part(part: &str, max: usize, allow_synthetic: bool) -> bool {
    if allow_synthetic && part.len() <= 4 && part.starts_with(['z', 'Z']) {
        return part.bytes().all(|c| c.is_ascii_alphabetic());
    }
    (2..=max).contains(&part.len()) && part.bytes().all(|c| c.is_ascii_alphabetic())
}

/// Normalise a locale-style string (`pt_BR.UTF-8@latin`) to a bare tag.
///
/// Strips `@modifier`, `.encoding` and the territory in that order, mapping
/// the C locales to `en`. Returns the most specific candidate found in the
/// orthography table, or the stripped tag itself when unknown. `None` means
/// the string is not a language at all.
pub fn normalize(tag: &str) -> Option<SmolStr> {
    let tag = tag.split('@').next().unwrap_or(tag);
    let tag = tag.split('.').next().unwrap_or(tag);
    let lower = tag.to_ascii_lowercase();
    if lower.is_empty() {
        return None;
    }
    if lower == "c" || lower == "posix" {
        return Some(SmolStr::new("en"));
    }

    let (primary, territory) = match lower.split_once(['_', '-']) {
        Some((p, t)) => (p, Some(t)),
        None => (lower.as_str(), None),
    };
    if !valid_part(primary, 3, false) {
        return None;
    }
    if let Some(territory) = territory {
        if !valid_part(territory, 3, true) {
            return None;
        }
        let full = format!("{primary}-{territory}");
        if lang_index(&full).is_ok() {
            return Some(SmolStr::new(full));
        }
    }
    if lang_index(primary).is_ok() {
        return Some(SmolStr::new(primary));
    }
    match territory {
        Some(territory) => Some(SmolStr::new(format!("{primary}-{territory}"))),
        None => Some(SmolStr::new(primary)),
    }
}

/// A set of language tags.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LangSet {
    map: [u32; MAP_WORDS],
    extras: BTreeSet<SmolStr>,
}

// groups of table indices sharing a primary language, for the
// different-territory set comparison; `und` is a wildcard, not a language
static COUNTRY_SETS: LazyLock<Vec<[u32; MAP_WORDS]>> = LazyLock::new(|| {
    let mut sets: Vec<(&str, [u32; MAP_WORDS])> = Vec::new();
    for (idx, def) in LANG_DATA.iter().enumerate() {
        let Some((primary, _)) = def.tag.split_once('-') else {
            continue;
        };
        if primary == "und" {
            continue;
        }
        let entry = match sets.iter_mut().find(|(p, _)| *p == primary) {
            Some((_, map)) => map,
            None => {
                sets.push((primary, [0; MAP_WORDS]));
                &mut sets.last_mut().unwrap().1
            }
        };
        entry[idx >> 5] |= 1 << (idx & 31);
        // the bare primary, if known, belongs to the same group
        if let Ok(pidx) = lang_index(primary) {
            entry[pidx >> 5] |= 1 << (pidx & 31);
        }
    }
    sets.into_iter().map(|(_, map)| map).collect()
});

impl LangSet {
    pub fn new() -> LangSet {
        LangSet::default()
    }

    /// Add one tag; unknown tags land in the extras set.
    pub fn add(&mut self, tag: &str) {
        match lang_index(tag) {
            Ok(idx) => self.map[idx >> 5] |= 1 << (idx & 31),
            Err(_) => {
                self.extras.insert(SmolStr::new(tag.to_ascii_lowercase()));
            }
        }
    }

    pub fn from_tags<'a, I: IntoIterator<Item = &'a str>>(tags: I) -> LangSet {
        let mut set = LangSet::new();
        for tag in tags {
            set.add(tag);
        }
        set
    }

    /// Parse the `aa|bb|cc` textual form.
    pub fn parse(s: &str) -> LangSet {
        LangSet::from_tags(s.split('|').map(str::trim).filter(|t| !t.is_empty()))
    }

    pub fn is_empty(&self) -> bool {
        self.map.iter().all(|w| *w == 0) && self.extras.is_empty()
    }

    fn bitmap_tags<'a>(&'a self) -> impl Iterator<Item = &'static str> + 'a {
        (0..LANG_DATA.len())
            .filter(|idx| self.map[idx >> 5] & (1 << (idx & 31)) != 0)
            .map(|idx| LANG_DATA[idx].tag)
    }

    /// Iterate member tags, table members first.
    pub fn langs<'a>(&'a self) -> impl Iterator<Item = &'a str> + 'a {
        self.bitmap_tags()
            .map(|s| s as &'a str)
            .chain(self.extras.iter().map(|s| s.as_str()))
    }

    /// Best comparison between any member and `lang`.
    pub fn has_lang(&self, lang: &str) -> LangResult {
        if let Ok(idx) = lang_index(lang) {
            if self.map[idx >> 5] & (1 << (idx & 31)) != 0 {
                return LangResult::Equal;
            }
        }
        let mut best = LangResult::DifferentLang;
        for tag in self.langs() {
            best = best.min(lang_compare(tag, lang));
            if best == LangResult::Equal {
                break;
            }
        }
        best
    }

    /// Every language of `other` is covered by some member of `self`.
    pub fn contains(&self, other: &LangSet) -> bool {
        for (word, (mine, theirs)) in self.map.iter().zip(other.map.iter()).enumerate() {
            let mut missing = theirs & !mine;
            while missing != 0 {
                let bit = missing.trailing_zeros() as usize;
                missing &= missing - 1;
                let tag = LANG_DATA[(word << 5) + bit].tag;
                if !self.contains_lang(tag) {
                    return false;
                }
            }
        }
        other.extras.iter().all(|tag| self.contains_lang(tag))
    }

    fn contains_lang(&self, tag: &str) -> bool {
        self.langs().any(|mine| lang_contains(mine, tag))
    }

    /// Strongest relation between the two sets.
    pub fn compare(&self, other: &LangSet) -> LangResult {
        if self
            .map
            .iter()
            .zip(other.map.iter())
            .any(|(a, b)| a & b != 0)
        {
            return LangResult::Equal;
        }
        let mut best = LangResult::DifferentLang;
        for country in COUNTRY_SETS.iter() {
            let a_in = self.map.iter().zip(country.iter()).any(|(a, c)| a & c != 0);
            let b_in = other
                .map
                .iter()
                .zip(country.iter())
                .any(|(b, c)| b & c != 0);
            if a_in && b_in {
                best = LangResult::DifferentTerritory;
                break;
            }
        }
        for extra in &self.extras {
            best = best.min(other.has_lang(extra));
            if best == LangResult::Equal {
                return best;
            }
        }
        for extra in &other.extras {
            best = best.min(self.has_lang(extra));
            if best == LangResult::Equal {
                return best;
            }
        }
        best
    }

    pub fn union(&self, other: &LangSet) -> LangSet {
        let mut map = self.map;
        for (w, o) in map.iter_mut().zip(other.map.iter()) {
            *w |= o;
        }
        LangSet {
            map,
            extras: self.extras.union(&other.extras).cloned().collect(),
        }
    }

    pub fn subtract(&self, other: &LangSet) -> LangSet {
        let mut map = self.map;
        for (w, o) in map.iter_mut().zip(other.map.iter()) {
            *w &= !o;
        }
        LangSet {
            map,
            extras: self.extras.difference(&other.extras).cloned().collect(),
        }
    }
}

impl Display for LangSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, tag) in self.langs().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            f.write_str(tag)?;
        }
        Ok(())
    }
}

impl From<&str> for LangSet {
    fn from(tag: &str) -> Self {
        let mut set = LangSet::new();
        set.add(tag);
        set
    }
}
