//! Sorting whole font sets, with language coverage and charset trimming.

use fontpat::{CharSet, FontSet, Object, Pattern, Value};

use crate::matcher::{lang_distance, score, Priority, Score};

// pushed onto a candidate's lang slot when it brings no new language
const LANG_UNSATISFIED: f64 = 10000.0;

/// Sort candidates by score against `query`, best first.
///
/// A post-pass demotes candidates that satisfy none of the query's
/// languages beyond what earlier candidates already covered, so the head
/// of the list collectively covers every requested language. With `trim`,
/// candidates whose character coverage adds nothing to the union of the
/// fonts before them are dropped.
pub fn sort(query: &Pattern, fonts: &FontSet, trim: bool) -> FontSet {
    let mut scored: Vec<(usize, Score)> = fonts
        .iter()
        .enumerate()
        .filter_map(|(idx, font)| score(query, font).map(|s| (idx, s)))
        .collect();
    scored.sort_by(|a, b| a.1.cmp(&b.1));

    rebalance_languages(query, fonts, &mut scored);

    let mut out = FontSet::new();
    let mut coverage = CharSet::new();
    for (idx, _) in scored {
        let font = &fonts.fonts[idx];
        if trim {
            match charset_of(font) {
                Some(charset) => {
                    if charset.subtract_count(&coverage) == 0 && !out.is_empty() {
                        log::debug!("trimming font {idx}: no codepoints beyond earlier candidates");
                        continue;
                    }
                    coverage = coverage.union(charset);
                }
                // no coverage data: cannot prove it redundant
                None => (),
            }
        }
        out.push(font.clone());
    }
    out
}

/// Mark which query languages each candidate (in sorted order) is first
/// to satisfy; demote candidates that add none, then re-sort.
fn rebalance_languages(query: &Pattern, fonts: &FontSet, scored: &mut Vec<(usize, Score)>) {
    let wanted: Vec<&Value> = query
        .values(Object::LANG)
        .iter()
        .map(|bound| &bound.value)
        .collect();
    if wanted.is_empty() {
        return;
    }
    let mut satisfied = vec![false; wanted.len()];
    for (idx, score) in scored.iter_mut() {
        let font = &fonts.fonts[idx.to_owned()];
        let mut useful = false;
        for (lang_idx, want) in wanted.iter().enumerate() {
            if satisfied[lang_idx] {
                continue;
            }
            let best = font
                .values(Object::LANG)
                .iter()
                .filter_map(|have| lang_distance(want, &have.value))
                .fold(f64::INFINITY, f64::min);
            if best <= 1.0 {
                satisfied[lang_idx] = true;
                useful = true;
            }
        }
        if !useful {
            log::debug!("demoting font {idx}: covers no language earlier candidates miss");
            score.set(Priority::Lang, LANG_UNSATISFIED);
        }
    }
    scored.sort_by(|a, b| a.1.cmp(&b.1));
}

fn charset_of(font: &Pattern) -> Option<&CharSet> {
    match font.get(Object::CHARSET, 0) {
        Some(Value::CharSet(charset)) => Some(charset),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fontpat::LangSet;
    use pretty_assertions::assert_eq;

    fn font(family: &str, entries: &[(Object, Value)]) -> Pattern {
        let mut p = Pattern::new();
        p.add(Object::FAMILY, family.into());
        for (object, value) in entries {
            p.add(*object, value.clone());
        }
        p
    }

    fn family_order(set: &FontSet) -> Vec<&str> {
        set.iter()
            .filter_map(|font| font.get(Object::FAMILY, 0))
            .filter_map(Value::as_str)
            .collect()
    }

    #[test]
    fn best_match_first() {
        let mut query = Pattern::new();
        query.add(Object::FAMILY, "Alpha".into());
        let fonts: FontSet = [font("Beta", &[]), font("Alpha", &[])].into_iter().collect();
        let sorted = sort(&query, &fonts, false);
        assert_eq!(family_order(&sorted), vec!["Alpha", "Beta"]);
    }

    #[test]
    fn language_coverage_floats_up() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut query = Pattern::new();
        query.add(Object::FAMILY, "serif".into());
        query.add(Object::LANG, Value::LangSet(LangSet::from("en")));
        query.add(Object::LANG, Value::LangSet(LangSet::from("zh-cn")));

        let latin_a = font(
            "Latin A",
            &[(Object::LANG, Value::LangSet(LangSet::from("en")))],
        );
        let latin_b = font(
            "Latin B",
            &[(Object::LANG, Value::LangSet(LangSet::from("en")))],
        );
        let han = font(
            "Han",
            &[(Object::LANG, Value::LangSet(LangSet::from("zh-cn")))],
        );
        let fonts: FontSet = [latin_a, latin_b, han].into_iter().collect();
        let sorted = sort(&query, &fonts, false);
        // raw scores put both Latin fonts ahead of Han, but Latin B covers
        // nothing Latin A didn't already, so Han overtakes it
        assert_eq!(family_order(&sorted), vec!["Latin A", "Han", "Latin B"]);
    }

    #[test]
    fn trim_drops_covered_fonts() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut query = Pattern::new();
        query.add(Object::FAMILY, "Any".into());

        let small = font(
            "Small",
            &[(
                Object::CHARSET,
                Value::CharSet(CharSet::from_ranges([(0x41, 0x7A)])),
            )],
        );
        let big = font(
            "Big",
            &[(
                Object::CHARSET,
                Value::CharSet(CharSet::from_ranges([(0x41, 0x7A), (0xC0, 0xFF)])),
            )],
        );
        let fonts: FontSet = [big, small].into_iter().collect();
        let sorted = sort(&query, &fonts, true);
        // whichever sorts first, the second adds no codepoints and is cut
        assert_eq!(sorted.len(), 1);
        assert_eq!(family_order(&sorted), vec!["Big"]);
    }

    #[test]
    fn trim_keeps_fonts_adding_coverage() {
        let mut query = Pattern::new();
        query.add(Object::FAMILY, "Any".into());
        let latin = font(
            "Latin",
            &[(
                Object::CHARSET,
                Value::CharSet(CharSet::from_ranges([(0x41, 0x7A)])),
            )],
        );
        let greek = font(
            "Greek",
            &[(
                Object::CHARSET,
                Value::CharSet(CharSet::from_ranges([(0x391, 0x3C9)])),
            )],
        );
        let fonts: FontSet = [latin, greek].into_iter().collect();
        let sorted = sort(&query, &fonts, true);
        assert_eq!(sorted.len(), 2);
    }

    #[test]
    fn fonts_without_charset_survive_trim() {
        let query = Pattern::new();
        let fonts: FontSet = [font("A", &[]), font("B", &[])].into_iter().collect();
        let sorted = sort(&query, &fonts, true);
        assert_eq!(sorted.len(), 2);
    }
}
