//! The matcher table and scoring function.
//!
//! Each matchable object owns a comparator and a pair of priority slots.
//! A query/candidate pair produces a score vector indexed by priority;
//! vectors compare lexicographically in the canonical order below, lower
//! being better. A type mismatch anywhere makes the candidate incompatible
//! and it is skipped entirely.

use ordered_float::OrderedFloat;

use fontpat::{
    langset::LangResult,
    value::{family_fold, str_fold_eq, str_fold_eq_ignore_blanks},
    Binding, LangSet, Object, Pattern, Range, Value,
};
use fontrules::config::glob_match;

/// Priority slots in canonical comparison order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(usize)]
pub enum Priority {
    File,
    FontFormat,
    Variable,
    Scalable,
    Color,
    Foundry,
    CharSet,
    FamilyStrong,
    PostScriptStrong,
    Lang,
    FamilyWeak,
    PostScriptWeak,
    Symbol,
    Spacing,
    Size,
    PixelSize,
    Style,
    Slant,
    Weight,
    Width,
    FontHasHint,
    Decorative,
    Antialias,
    Rasterizer,
    Outline,
    Order,
    FontVersion,
}

pub const NUM_PRIORITIES: usize = Priority::FontVersion as usize + 1;

// nothing matched yet; uniform across candidates so it cancels out
const LARGE: f64 = 1e99;

/// A per-priority score vector; lexicographic order, lower is better.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Score(pub [OrderedFloat<f64>; NUM_PRIORITIES]);

impl Score {
    fn zero() -> Score {
        Score([OrderedFloat(0.0); NUM_PRIORITIES])
    }

    pub fn get(&self, priority: Priority) -> f64 {
        self.0[priority as usize].into_inner()
    }

    pub fn set(&mut self, priority: Priority, value: f64) {
        self.0[priority as usize] = OrderedFloat(value);
    }

    fn accumulate(&mut self, priority: Priority, value: f64) {
        self.0[priority as usize] += OrderedFloat(value);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Comparator {
    Number,
    Range,
    Size,
    String,
    Family,
    PostScript,
    Lang,
    Bool,
    CharSet,
    Filename,
}

pub(crate) struct Matcher {
    pub(crate) object: Object,
    pub(crate) cmp: Comparator,
    pub(crate) strong: Priority,
    pub(crate) weak: Priority,
}

macro_rules! matcher {
    ($object:ident, $cmp:ident, $priority:ident) => {
        matcher!($object, $cmp, $priority, $priority)
    };
    ($object:ident, $cmp:ident, $strong:ident, $weak:ident) => {
        Matcher {
            object: Object::$object,
            cmp: Comparator::$cmp,
            strong: Priority::$strong,
            weak: Priority::$weak,
        }
    };
}

static MATCHERS: &[Matcher] = &[
    matcher!(FILE, Filename, File),
    matcher!(FONT_FORMAT, String, FontFormat),
    matcher!(VARIABLE, Bool, Variable),
    matcher!(SCALABLE, Bool, Scalable),
    matcher!(COLOR, Bool, Color),
    matcher!(FOUNDRY, String, Foundry),
    matcher!(CHARSET, CharSet, CharSet),
    matcher!(FAMILY, Family, FamilyStrong, FamilyWeak),
    matcher!(POSTSCRIPT_NAME, PostScript, PostScriptStrong, PostScriptWeak),
    matcher!(LANG, Lang, Lang),
    matcher!(SYMBOL, Bool, Symbol),
    matcher!(SPACING, Number, Spacing),
    matcher!(SIZE, Size, Size),
    matcher!(PIXEL_SIZE, Number, PixelSize),
    matcher!(STYLE, String, Style),
    matcher!(SLANT, Number, Slant),
    matcher!(WEIGHT, Range, Weight),
    matcher!(WIDTH, Range, Width),
    matcher!(FONT_HAS_HINT, Bool, FontHasHint),
    matcher!(DECORATIVE, Bool, Decorative),
    matcher!(ANTIALIAS, Bool, Antialias),
    matcher!(RASTERIZER, String, Rasterizer),
    matcher!(OUTLINE, Bool, Outline),
    matcher!(ORDER, Number, Order),
    matcher!(FONT_VERSION, Number, FontVersion),
];

pub(crate) fn matcher_for(object: Object) -> Option<&'static Matcher> {
    MATCHERS.iter().find(|m| m.object == object)
}

/// Distance from a query language value to a font language value, the
/// 0/1/2 scale of [`LangResult`].
pub(crate) fn lang_distance(query: &Value, font: &Value) -> Option<f64> {
    let result = match (query, font) {
        (Value::LangSet(q), Value::LangSet(f)) => q.compare(f),
        (Value::LangSet(q), Value::String(f)) => q.has_lang(f),
        (Value::String(q), Value::LangSet(f)) => f.has_lang(q),
        (Value::String(q), Value::String(f)) => {
            LangSet::from(q.as_str()).has_lang(f)
        }
        _ => return None,
    };
    Some(match result {
        LangResult::Equal => 0.0,
        LangResult::DifferentTerritory => 1.0,
        LangResult::DifferentLang => 2.0,
    })
}

/// One comparator invocation: `(matched value, distance)`, or `None` when
/// the value types are incomparable.
pub(crate) fn compare_values(
    cmp: Comparator,
    query: &Value,
    font: &Value,
) -> Option<(Value, f64)> {
    match cmp {
        Comparator::Number => {
            let q = query.as_f64()?;
            let f = font.as_f64()?;
            Some((font.clone(), (q - f).abs()))
        }
        Comparator::Range => {
            let q = query.as_range()?;
            let f = font.as_range()?;
            Some(compare_range(q, f))
        }
        Comparator::Size => {
            let q = query.as_range()?;
            let f = font.as_range()?;
            let touch = q.gap(&f) == 0.0
                && !f.is_point()
                && (q.begin == f.end || q.end == f.begin);
            let (value, distance) = compare_range(q, f);
            if distance == 0.0 && touch {
                // a semi-closed boundary touch is almost, not quite, a hit
                Some((value, 1e-15))
            } else {
                Some((value, distance))
            }
        }
        Comparator::String => {
            let q = query.as_str()?;
            let f = font.as_str()?;
            let distance = if str_fold_eq(q, f) { 0.0 } else { 1.0 };
            Some((font.clone(), distance))
        }
        Comparator::Family => {
            let q = query.as_str()?;
            let f = font.as_str()?;
            let distance = if str_fold_eq_ignore_blanks(q, f) {
                0.0
            } else {
                1.0
            };
            Some((font.clone(), distance))
        }
        Comparator::PostScript => {
            let q = query.as_str()?;
            let f = font.as_str()?;
            Some((font.clone(), postscript_distance(q, f)))
        }
        Comparator::Lang => {
            let distance = lang_distance(query, font)?;
            Some((font.clone(), distance))
        }
        Comparator::Bool => {
            let (Value::Bool(q), Value::Bool(f)) = (query, font) else {
                return None;
            };
            let distance = if q.agrees(*f) { 0.0 } else { 1.0 };
            // prefer the query's concrete preference over the font's
            let value = if *q != fontpat::Tri::DontCare {
                query.clone()
            } else {
                font.clone()
            };
            Some((value, distance))
        }
        Comparator::CharSet => {
            let (Value::CharSet(q), Value::CharSet(f)) = (query, font) else {
                return None;
            };
            Some((font.clone(), q.subtract_count(f) as f64))
        }
        Comparator::Filename => {
            let q = query.as_str()?;
            let f = font.as_str()?;
            let distance = if q == f {
                0.0
            } else if str_fold_eq(q, f) {
                1.0
            } else if glob_match(q, f) {
                2.0
            } else {
                3.0
            };
            Some((font.clone(), distance))
        }
    }
}

/// Distance between intervals, with the matched value taken from the
/// candidate side: its midpoint on overlap, its nearest endpoint otherwise.
fn compare_range(query: Range, font: Range) -> (Value, f64) {
    let gap = query.gap(&font);
    if gap == 0.0 {
        (Value::from_f64(font.midpoint()), 0.0)
    } else if query.end < font.begin {
        (Value::from_f64(font.begin), gap)
    } else {
        (Value::from_f64(font.end), gap)
    }
}

fn strip_ps(name: &str) -> String {
    name.chars()
        .filter(|c| *c != ' ' && *c != '-')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Fraction of the name that is *not* shared prefix, after dropping spaces
/// and dashes and folding case.
fn postscript_distance(query: &str, font: &str) -> f64 {
    let q = strip_ps(query);
    let f = strip_ps(font);
    let len = q.chars().count().max(f.chars().count());
    if len == 0 {
        return 0.0;
    }
    let common = q
        .chars()
        .zip(f.chars())
        .take_while(|(a, b)| a == b)
        .count();
    (len - common) as f64 / len as f64
}

/// Score `font` against `query`. `None` means the candidate holds a value
/// the query's type cannot be compared with.
pub fn score(query: &Pattern, font: &Pattern) -> Option<Score> {
    let mut score = Score::zero();
    for entry in MATCHERS {
        if entry.object == Object::FAMILY {
            score_family(query, font, &mut score);
            continue;
        }
        let qvals = query.values(entry.object);
        let fvals = font.values(entry.object);
        if qvals.is_empty() || fvals.is_empty() {
            continue;
        }
        let split = entry.strong != entry.weak;
        let mut best = LARGE;
        let mut best_strong = LARGE;
        let mut best_weak = LARGE;
        'query: for (i, q) in qvals.iter().enumerate() {
            for f in fvals {
                let (_, distance) = compare_values(entry.cmp, &q.value, &f.value)?;
                let v = distance * 1000.0 + i as f64;
                if v < best {
                    best = v;
                }
                if split {
                    let slot = match q.binding {
                        Binding::Weak => &mut best_weak,
                        _ => &mut best_strong,
                    };
                    if v < *slot {
                        *slot = v;
                    }
                }
            }
            if !split && best < 1000.0 {
                break 'query;
            }
        }
        if split {
            score.accumulate(entry.strong, best_strong);
            score.accumulate(entry.weak, best_weak);
        } else {
            score.accumulate(entry.strong, best);
        }
    }
    Some(score)
}

/// Family scoring through the query's fold index: O(candidate values)
/// rather than O(query x candidate).
fn score_family(query: &Pattern, font: &Pattern, score: &mut Score) {
    let qvals = query.values(Object::FAMILY);
    let fvals = font.values(Object::FAMILY);
    if qvals.is_empty() || fvals.is_empty() {
        return;
    }
    let mut best_strong = LARGE;
    let mut best_weak = LARGE;
    // every query value scores at least distance 1 against some candidate
    for (i, q) in qvals.iter().enumerate() {
        let slot = match q.binding {
            Binding::Weak => &mut best_weak,
            _ => &mut best_strong,
        };
        let v = 1000.0 + i as f64;
        if v < *slot {
            *slot = v;
        }
    }
    for f in fvals {
        let Value::String(name) = &f.value else {
            continue;
        };
        for &i in query.family_matches(&family_fold(name)) {
            let slot = match qvals[i].binding {
                Binding::Weak => &mut best_weak,
                _ => &mut best_strong,
            };
            let v = i as f64;
            if v < *slot {
                *slot = v;
            }
        }
    }
    score.accumulate(Priority::FamilyStrong, best_strong);
    score.accumulate(Priority::FamilyWeak, best_weak);
}

/// The best-scoring candidate, earliest on ties. `None` when nothing is
/// comparable, a valid outcome rather than an error.
pub fn match_best<'a, I>(query: &Pattern, fonts: I) -> Option<(&'a Pattern, Score)>
where
    I: IntoIterator<Item = &'a Pattern>,
{
    let mut best: Option<(&Pattern, Score)> = None;
    for font in fonts {
        let Some(candidate) = score(query, font) else {
            continue;
        };
        match &best {
            Some((_, incumbent)) if candidate >= *incumbent => (),
            _ => best = Some((font, candidate)),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use fontpat::{CharSet, Tri};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn font(entries: &[(Object, Value)]) -> Pattern {
        let mut p = Pattern::new();
        for (object, value) in entries {
            p.add(*object, value.clone());
        }
        p
    }

    #[test]
    fn range_overlap_scores_zero() {
        let (value, distance) =
            compare_values(Comparator::Range, &Value::Int(500), &Value::Range(Range::new(300.0, 700.0)))
                .unwrap();
        assert_eq!(distance, 0.0);
        assert_eq!(value, Value::Int(500));
    }

    #[test]
    fn range_gap_is_distance() {
        let (_, distance) =
            compare_values(Comparator::Range, &Value::Int(800), &Value::Range(Range::new(300.0, 700.0)))
                .unwrap();
        assert_eq!(distance, 100.0);
    }

    #[test]
    fn size_boundary_touch_is_nearly_zero() {
        let (_, distance) = compare_values(
            Comparator::Size,
            &Value::Float(12.0),
            &Value::Range(Range::new(8.0, 12.0)),
        )
        .unwrap();
        assert_eq!(distance, 1e-15);
        let (_, distance) = compare_values(
            Comparator::Size,
            &Value::Float(10.0),
            &Value::Range(Range::new(8.0, 12.0)),
        )
        .unwrap();
        assert_eq!(distance, 0.0);
    }

    #[test]
    fn lang_distances() {
        let zh_tw = Value::LangSet(LangSet::from("zh-tw"));
        let zh_cn = Value::LangSet(LangSet::from("zh-cn"));
        let en = Value::LangSet(LangSet::from("en"));
        assert_eq!(lang_distance(&zh_tw, &zh_cn), Some(1.0));
        assert_eq!(lang_distance(&zh_tw, &zh_tw.clone()), Some(0.0));
        assert_eq!(lang_distance(&zh_tw, &en), Some(2.0));
        let und = Value::String("und".into());
        assert_eq!(lang_distance(&en, &und), Some(2.0));
    }

    #[test]
    fn bool_prefers_query_preference() {
        let (value, distance) = compare_values(
            Comparator::Bool,
            &Value::Bool(Tri::True),
            &Value::Bool(Tri::DontCare),
        )
        .unwrap();
        assert_eq!(distance, 0.0);
        assert_eq!(value, Value::Bool(Tri::True));
    }

    #[test]
    fn charset_distance_counts_missing() {
        let q = Value::CharSet(CharSet::from_ranges([(0x41, 0x5A)]));
        let f = Value::CharSet(CharSet::from_ranges([(0x41, 0x50)]));
        let (_, distance) = compare_values(Comparator::CharSet, &q, &f).unwrap();
        assert_eq!(distance, 10.0);
    }

    #[rstest]
    #[case("/a/b.ttf", "/a/b.ttf", 0.0)]
    #[case("/a/B.TTF", "/a/b.ttf", 1.0)]
    #[case("/a/*.ttf", "/a/b.ttf", 2.0)]
    #[case("/c/d.ttf", "/a/b.ttf", 3.0)]
    fn filename_tiers(#[case] q: &str, #[case] f: &str, #[case] want: f64) {
        let (_, got) = compare_values(
            Comparator::Filename,
            &Value::String(q.into()),
            &Value::String(f.into()),
        )
        .unwrap();
        assert_eq!(got, want, "{q} vs {f}");
    }

    #[test]
    fn postscript_prefix_fraction() {
        assert_eq!(postscript_distance("DejaVuSans", "DejaVu-Sans"), 0.0);
        assert!(postscript_distance("DejaVuSans", "DejaVuSerif") > 0.0);
        assert!(postscript_distance("DejaVuSans", "DejaVuSerif") < 1.0);
        assert_eq!(postscript_distance("Abc", "Xyz"), 1.0);
    }

    #[test]
    fn family_fold_scores_zero_for_blank_variants() {
        let mut query = Pattern::new();
        query.add(Object::FAMILY, "Deja Vu Sans".into());
        let candidate = font(&[(Object::FAMILY, "DejaVu Sans".into())]);
        let s = score(&query, &candidate).unwrap();
        assert_eq!(s.get(Priority::FamilyStrong), 0.0);
    }

    #[test]
    fn closer_weight_wins() {
        let mut query = Pattern::new();
        query.add(Object::FAMILY, "Sans".into());
        query.add(Object::WEIGHT, Value::Int(200));
        let bold = font(&[
            (Object::FAMILY, "Sans".into()),
            (Object::WEIGHT, Value::Int(200)),
        ]);
        let light = font(&[
            (Object::FAMILY, "Sans".into()),
            (Object::WEIGHT, Value::Int(50)),
        ]);
        let fonts = [light.clone(), bold.clone()];
        let (winner, _) = match_best(&query, fonts.iter()).unwrap();
        assert_eq!(winner, &bold);
    }

    #[test]
    fn range_candidate_beats_distant_scalar() {
        let mut query = Pattern::new();
        query.add(Object::WEIGHT, Value::Int(200));
        let variable = font(&[(Object::WEIGHT, Value::Range(Range::new(200.0, 700.0)))]);
        let thin = font(&[(Object::WEIGHT, Value::Int(100))]);
        let fonts = [thin, variable.clone()];
        let (winner, s) = match_best(&query, fonts.iter()).unwrap();
        assert_eq!(winner, &variable);
        assert_eq!(s.get(Priority::Weight), 0.0);
    }

    #[test]
    fn strong_family_outranks_lang() {
        // font A matches family weakly but lang exactly; font B the reverse
        let mut query = Pattern::new();
        query.add_with_binding(Object::FAMILY, "serif".into(), Binding::Weak, true);
        query.add(Object::LANG, Value::LangSet(LangSet::from("zh-cn")));

        let simsun = font(&[
            (Object::FAMILY, "SimSun".into()),
            (Object::LANG, Value::LangSet(LangSet::from("zh-cn"))),
        ]);
        let dejavu = font(&[
            (Object::FAMILY, "DejaVu Serif".into()),
            (Object::LANG, Value::LangSet(LangSet::from("en"))),
        ]);
        let fonts = [dejavu, simsun.clone()];
        let (winner, _) = match_best(&query, fonts.iter()).unwrap();
        assert_eq!(winner, &simsun);
    }

    #[test]
    fn incompatible_candidate_is_skipped() {
        let mut query = Pattern::new();
        query.add(Object::FOUNDRY, "adobe".into());
        // a custom-ish mess: foundry holding an int in the font
        let mut bad = Pattern::new();
        assert!(!bad.add(Object::FOUNDRY, Value::Int(3)));
        // the pattern dropped the bad value, so it scores vacuously
        assert!(score(&query, &bad).is_some());

        // force an incomparable pair through a charset/int confusion
        let mut q2 = Pattern::new();
        q2.add(Object::CHARSET, Value::CharSet(CharSet::new()));
        let mut f2 = Pattern::new();
        f2.add(Object::CHARSET, Value::CharSet(CharSet::new()));
        assert!(score(&q2, &f2).is_some());
    }

    #[test]
    fn earlier_query_value_preferred() {
        let mut query = Pattern::new();
        query.add(Object::FAMILY, "Arial".into());
        query.add(Object::FAMILY, "Helvetica".into());
        let arial = font(&[(Object::FAMILY, "Arial".into())]);
        let helvetica = font(&[(Object::FAMILY, "Helvetica".into())]);
        let sa = score(&query, &arial).unwrap();
        let sh = score(&query, &helvetica).unwrap();
        assert!(sa < sh);
    }
}
