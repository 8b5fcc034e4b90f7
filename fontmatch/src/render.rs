//! Composing the pattern handed to a rasterizer from a query and the
//! font that won the match.

use fontpat::{Binding, BoundValue, Object, Pattern, Tri, Value};
use fontrules::{Config, MatchKind};

use crate::{
    matcher::{compare_values, lang_distance, matcher_for},
    weight::weight_to_opentype,
};

// name lists whose order follows the query's language preference
const NAMED: &[(Object, Object)] = &[
    (Object::FAMILY, Object::FAMILY_LANG),
    (Object::STYLE, Object::STYLE_LANG),
    (Object::FULLNAME, Object::FULLNAME_LANG),
];

/// Merge `font` (the chosen candidate) with `query` into the pattern a
/// rasterizer consumes.
///
/// Values present on both sides resolve through the object's matcher;
/// font-only values copy across weakly so later substitution can still
/// override them; query-only values keep their bindings. Variable axes
/// materialise a `fontvariations` string. The config's font-kind rules run
/// over the result.
pub fn prepare_render(config: &Config, query: &Pattern, font: &Pattern) -> Pattern {
    let mut out = Pattern::new();

    for object in font.objects() {
        if let Some((name_obj, lang_obj)) = NAMED
            .iter()
            .find(|(name, lang)| object == *name || object == *lang)
        {
            // handled once, when the name object comes by
            if object == *lang_obj && font.has(*name_obj) {
                continue;
            }
            add_named(&mut out, query, font, *name_obj, *lang_obj);
            continue;
        }
        if query.has(object) {
            if let Some(matcher) = matcher_for(object) {
                let value = best_matched(
                    matcher.cmp,
                    query.values(object),
                    font.values(object),
                );
                if let Some(value) = value {
                    out.add(object, value);
                    continue;
                }
            }
            copy_values(&mut out, font, object, None);
        } else {
            copy_values(&mut out, font, object, Some(Binding::Weak));
        }
    }

    for object in query.objects() {
        if !font.has(object) && !out.has(object) {
            copy_values(&mut out, query, object, None);
        }
    }

    add_variations(&mut out, query, font);

    config.substitute(&mut out, Some(query), MatchKind::Font);
    out
}

fn copy_values(out: &mut Pattern, from: &Pattern, object: Object, force: Option<Binding>) {
    for bound in from.values(object) {
        out.add_with_binding(
            object,
            bound.value.clone(),
            force.unwrap_or(bound.binding),
            true,
        );
    }
}

/// The matched value over all (query, font) value pairs, smallest
/// `distance * 1000 + query index` first. Falls back to the font's first
/// value when nothing is comparable.
fn best_matched(
    cmp: crate::matcher::Comparator,
    qvals: &[BoundValue],
    fvals: &[BoundValue],
) -> Option<Value> {
    let mut best: Option<(f64, Value)> = None;
    for (i, q) in qvals.iter().enumerate() {
        for f in fvals {
            let Some((value, distance)) = compare_values(cmp, &q.value, &f.value) else {
                continue;
            };
            let v = distance * 1000.0 + i as f64;
            if best.as_ref().is_none_or(|(bv, _)| v < *bv) {
                best = Some((v, value));
            }
        }
    }
    best.map(|(_, value)| value)
        .or_else(|| fvals.first().map(|bound| bound.value.clone()))
}

/// Copy the font's name and name-language lists, rotated so the entry
/// best matching the query's language preference comes first.
fn add_named(out: &mut Pattern, query: &Pattern, font: &Pattern, name_obj: Object, lang_obj: Object) {
    let rotation = if font.has(lang_obj) && query.has(lang_obj) {
        best_lang_index(query.values(lang_obj), font.values(lang_obj))
    } else {
        0
    };
    copy_rotated(out, font, name_obj, rotation);
    copy_rotated(out, font, lang_obj, rotation);
}

fn copy_rotated(out: &mut Pattern, font: &Pattern, object: Object, rotation: usize) {
    let values = font.values(object);
    if values.is_empty() {
        return;
    }
    let rotation = rotation % values.len();
    for bound in values[rotation..].iter().chain(values[..rotation].iter()) {
        out.add_with_binding(object, bound.value.clone(), bound.binding, true);
    }
}

/// Index of the font-side language value closest to the query's
/// preferences.
fn best_lang_index(qvals: &[BoundValue], fvals: &[BoundValue]) -> usize {
    let mut best = (f64::INFINITY, 0);
    for (i, q) in qvals.iter().enumerate() {
        for (j, f) in fvals.iter().enumerate() {
            let Some(distance) = lang_distance(&q.value, &f.value) else {
                continue;
            };
            let v = distance * 1000.0 + i as f64;
            if v < best.0 {
                best = (v, j);
            }
        }
    }
    best.1
}

/// For a variable font, pin each ranged axis to the query's value and
/// record the result as `tag=value` pairs on `fontvariations`. Weight
/// values travel through the OpenType axis mapping.
fn add_variations(out: &mut Pattern, query: &Pattern, font: &Pattern) {
    if !matches!(font.get(Object::VARIABLE, 0), Some(Value::Bool(Tri::True))) {
        return;
    }
    let mut parts = Vec::new();
    for (object, tag) in [
        (Object::WEIGHT, "wght"),
        (Object::WIDTH, "wdth"),
        (Object::SIZE, "opsz"),
    ] {
        let Some(Value::Range(range)) = font.get(object, 0) else {
            continue;
        };
        let Some(wanted) = query.get(object, 0).and_then(Value::as_f64) else {
            continue;
        };
        let pinned = wanted.clamp(range.begin, range.end);
        let axis_value = if object == Object::WEIGHT {
            weight_to_opentype(pinned)
        } else {
            pinned
        };
        parts.push(format!("{tag}={axis_value}"));
    }
    if parts.is_empty() {
        return;
    }
    let emitted = parts.join(",");
    let value = match out.get(Object::FONT_VARIATIONS, 0).and_then(Value::as_str) {
        Some(existing) if !existing.is_empty() => format!("{existing},{emitted}"),
        _ => emitted,
    };
    out.del(Object::FONT_VARIATIONS);
    out.add(Object::FONT_VARIATIONS, Value::String(value.into()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use fontpat::{LangSet, Range};
    use pretty_assertions::assert_eq;

    fn render(query: &Pattern, font: &Pattern) -> Pattern {
        prepare_render(&Config::default(), query, font)
    }

    #[test]
    fn variable_weight_materialises() {
        let mut query = Pattern::new();
        query.add(Object::FAMILY, "Var Sans".into());
        query.add(Object::WEIGHT, Value::Int(200));

        let mut font = Pattern::new();
        font.add(Object::FAMILY, "Var Sans".into());
        font.add(Object::WEIGHT, Value::Range(Range::new(200.0, 700.0)));
        font.add(Object::VARIABLE, Value::Bool(Tri::True));

        let out = render(&query, &font);
        // matched value is the candidate range's midpoint
        assert_eq!(out.get(Object::WEIGHT, 0), Some(&Value::Int(450)));
        // the axis pin maps the internal bold code to OpenType 700
        assert_eq!(
            out.get(Object::FONT_VARIATIONS, 0),
            Some(&Value::String("wght=700".into()))
        );
    }

    #[test]
    fn existing_variations_are_prepended() {
        let mut query = Pattern::new();
        query.add(Object::WEIGHT, Value::Int(200));
        query.add(Object::FONT_VARIATIONS, "slnt=-10".into());

        let mut font = Pattern::new();
        font.add(Object::WEIGHT, Value::Range(Range::new(80.0, 215.0)));
        font.add(Object::VARIABLE, Value::Bool(Tri::True));

        let out = render(&query, &font);
        assert_eq!(
            out.get(Object::FONT_VARIATIONS, 0),
            Some(&Value::String("slnt=-10,wght=700".into()))
        );
    }

    #[test]
    fn static_font_emits_no_variations() {
        let mut query = Pattern::new();
        query.add(Object::WEIGHT, Value::Int(200));
        let mut font = Pattern::new();
        font.add(Object::WEIGHT, Value::Int(200));
        let out = render(&query, &font);
        assert!(!out.has(Object::FONT_VARIATIONS));
    }

    #[test]
    fn font_only_objects_copy_weakly() {
        let query = Pattern::new();
        let mut font = Pattern::new();
        font.add(Object::FOUNDRY, "adobe".into());
        let out = render(&query, &font);
        assert_eq!(out.get(Object::FOUNDRY, 0), Some(&"adobe".into()));
        assert_eq!(out.values(Object::FOUNDRY)[0].binding, Binding::Weak);
    }

    #[test]
    fn query_only_objects_keep_bindings() {
        let mut query = Pattern::new();
        query.add_with_binding(Object::DPI, Value::Float(96.0), Binding::Strong, true);
        let font = Pattern::new();
        let out = render(&query, &font);
        assert_eq!(out.get(Object::DPI, 0), Some(&Value::Float(96.0)));
        assert_eq!(out.values(Object::DPI)[0].binding, Binding::Strong);
    }

    #[test]
    fn shared_objects_resolve_through_matcher() {
        let mut query = Pattern::new();
        query.add(Object::ANTIALIAS, Value::Bool(Tri::True));
        let mut font = Pattern::new();
        font.add(Object::ANTIALIAS, Value::Bool(Tri::DontCare));
        let out = render(&query, &font);
        // bool matcher prefers the query's concrete preference
        assert_eq!(out.get(Object::ANTIALIAS, 0), Some(&Value::Bool(Tri::True)));
    }

    #[test]
    fn name_lists_rotate_to_preferred_language() {
        let mut query = Pattern::new();
        query.add(Object::FAMILY, "Gothic".into());
        query.add(Object::FAMILY_LANG, Value::LangSet(LangSet::from("ja")));

        let mut font = Pattern::new();
        font.add(Object::FAMILY, "Gothic".into());
        font.add(Object::FAMILY, "ゴシック".into());
        font.add(Object::FAMILY_LANG, Value::LangSet(LangSet::from("en")));
        font.add(Object::FAMILY_LANG, Value::LangSet(LangSet::from("ja")));

        let out = render(&query, &font);
        assert_eq!(out.get(Object::FAMILY, 0), Some(&"ゴシック".into()));
        assert_eq!(out.get(Object::FAMILY, 1), Some(&"Gothic".into()));
        let Some(Value::LangSet(first_lang)) = out.get(Object::FAMILY_LANG, 0) else {
            panic!("familylang should rotate with family");
        };
        assert_eq!(
            first_lang.has_lang("ja"),
            fontpat::langset::LangResult::Equal
        );
    }

    #[test]
    fn unrotated_names_copy_verbatim() {
        let query = Pattern::new();
        let mut font = Pattern::new();
        font.add(Object::FAMILY, "First".into());
        font.add(Object::FAMILY, "Second".into());
        let out = render(&query, &font);
        assert_eq!(out.get(Object::FAMILY, 0), Some(&"First".into()));
    }
}
