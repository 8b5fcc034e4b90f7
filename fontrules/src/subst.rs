//! Applies rule sets to a pattern, in registration order.
//!
//! Each directive runs its tests against the pattern (or the query
//! companion during font matching), recording the position of the value
//! each test matched; edits then splice their values relative to those
//! positions. A directive is atomic: if any test fails its edits are
//! skipped.

use std::collections::HashMap;

use fontpat::{
    langset::lang_contains,
    value::family_fold,
    Binding, BoundValue, LangSet, Object, Pattern, Value,
};

use crate::{
    config::Config,
    expr::{compare_value, BinaryOp},
    rules::{Directive, EditOp, MatchKind, Qualifier, Test, TestKind},
};

// per-object outcome of the test phase
#[derive(Clone, Copy, Debug, Default)]
struct TestState {
    // index of the matched value, when one matched in the edited pattern
    value_pos: Option<usize>,
    // object was tested but absent (qual="all" vacuous pass)
    vacuous: bool,
}

enum Outcome {
    Keep,
    SkipDirective,
    AbortRuleSet,
}

/// Rewrite `pattern` through every enabled rule set of `config`.
///
/// For [`MatchKind::Font`], `companion` is the query pattern that tests
/// with `target="pattern"` read. For [`MatchKind::Pattern`], process
/// defaults (language, program name) are injected first.
pub fn substitute(
    config: &Config,
    pattern: &mut Pattern,
    companion: Option<&Pattern>,
    kind: MatchKind,
) {
    if kind == MatchKind::Pattern {
        add_pattern_defaults(config, pattern);
    }

    for rule_set in &config.rule_sets {
        if !rule_set.enabled {
            continue;
        }
        log::trace!("applying rule set '{}'", rule_set.name);
        'directives: for directive in rule_set.directives(kind) {
            let mut state: HashMap<Object, TestState> =
                HashMap::with_capacity(Object::builtin_count() + config.max_objects + 2);
            for test in &directive.tests {
                match run_test(pattern, companion, kind, test, &mut state) {
                    Outcome::Keep => (),
                    Outcome::SkipDirective => continue 'directives,
                    Outcome::AbortRuleSet => break 'directives,
                }
            }
            for edit in &directive.edits {
                let values: Vec<BoundValue> = edit
                    .expr
                    .evaluate_list(pattern, companion, kind)
                    .into_iter()
                    .map(|value| BoundValue {
                        value,
                        binding: edit.binding,
                    })
                    .collect();
                apply_edit(pattern, edit.object, edit.op, values, &mut state);
                pattern.canonicalize(edit.object);
            }
        }
    }
}

fn run_test(
    pattern: &Pattern,
    companion: Option<&Pattern>,
    kind: MatchKind,
    test: &Test,
    state: &mut HashMap<Object, TestState>,
) -> Outcome {
    // font-kind directives may test the original query instead
    let subject = match (kind, test.kind) {
        (MatchKind::Font, TestKind::Pattern) => match companion {
            Some(companion) => companion,
            None => return Outcome::SkipDirective,
        },
        _ => pattern,
    };
    let entry = state.entry(test.object).or_default();

    if !subject.has(test.object) {
        if test.qual == Qualifier::All {
            // absent object trivially satisfies "all"
            entry.vacuous = true;
            return Outcome::Keep;
        }
        return Outcome::SkipDirective;
    }

    let matched = match_value_list(subject, companion, kind, test);
    let passed = match test.qual {
        Qualifier::Any | Qualifier::All => matched.is_some(),
        Qualifier::First => matched == Some(0),
        Qualifier::NotFirst => matched.is_some_and(|idx| idx > 0),
    };
    if !passed {
        return if test.qual == Qualifier::All {
            Outcome::AbortRuleSet
        } else {
            Outcome::SkipDirective
        };
    }
    // positions recorded against the pattern being edited only
    if std::ptr::eq(subject, pattern) && entry.value_pos.is_none() && !entry.vacuous {
        entry.value_pos = matched;
    }
    Outcome::Keep
}

/// Index of the first value satisfying the test, `None` when nothing
/// matches or an `all`-qualified test sees any mismatch.
fn match_value_list(
    subject: &Pattern,
    companion: Option<&Pattern>,
    kind: MatchKind,
    test: &Test,
) -> Option<usize> {
    let Some(want) = test.expr.evaluate(subject, companion, kind) else {
        return None;
    };

    // the family fold index answers equality tests without scanning
    if test.object == Object::FAMILY {
        if let Value::String(name) = &want {
            let positions = subject.family_matches(&family_fold(name));
            match (test.op, test.qual) {
                (BinaryOp::Equal | BinaryOp::Listing, _) => {
                    return positions.first().copied();
                }
                (BinaryOp::NotEqual, Qualifier::All) => {
                    return if positions.is_empty() { Some(0) } else { None };
                }
                _ => (),
            }
        }
    }

    let mut first = None;
    for (idx, bound) in subject.values(test.object).iter().enumerate() {
        if compare_value(test.op, &bound.value, &want, test.ignore_blanks) {
            if first.is_none() {
                first = Some(idx);
            }
            if test.qual != Qualifier::All {
                break;
            }
        } else if test.qual == Qualifier::All {
            return None;
        }
    }
    first
}

fn apply_edit(
    pattern: &mut Pattern,
    object: Object,
    op: EditOp,
    values: Vec<BoundValue>,
    state: &mut HashMap<Object, TestState>,
) {
    let pos = state.get(&object).and_then(|s| s.value_pos);
    match op {
        EditOp::Assign => match pos {
            Some(pos) => {
                // swap the matched value for the new list, in place
                pattern.del_at(object, pos);
                pattern.insert(object, pos, false, values);
                clear_pos(state, object);
            }
            // no test captured a position: same as assign_replace
            None => apply_edit(pattern, object, EditOp::AssignReplace, values, state),
        },
        EditOp::AssignReplace => {
            pattern.del(object);
            pattern.insert(object, 0, true, values);
            clear_pos(state, object);
        }
        EditOp::Prepend => match pos {
            Some(pos) => {
                pattern.insert(object, pos, false, values);
            }
            None => apply_edit(pattern, object, EditOp::PrependFirst, values, state),
        },
        EditOp::PrependFirst => {
            pattern.insert(object, 0, false, values);
        }
        EditOp::Append => match pos {
            Some(pos) => {
                pattern.insert(object, pos, true, values);
            }
            None => apply_edit(pattern, object, EditOp::AppendLast, values, state),
        },
        EditOp::AppendLast => {
            let at = pattern.values(object).len();
            pattern.insert(object, at, false, values);
        }
        EditOp::Delete => match pos {
            Some(pos) => {
                pattern.del_at(object, pos);
                clear_pos(state, object);
            }
            None => apply_edit(pattern, object, EditOp::DeleteAll, values, state),
        },
        EditOp::DeleteAll => {
            pattern.del(object);
            clear_pos(state, object);
        }
    }
}

fn clear_pos(state: &mut HashMap<Object, TestState>, object: Object) {
    if let Some(entry) = state.get_mut(&object) {
        entry.value_pos = None;
    }
}

/// Query patterns pick up process defaults before any rules run: at least
/// one usable language, and the program name.
fn add_pattern_defaults(config: &Config, pattern: &mut Pattern) {
    for lang in &config.env.default_langs {
        if lang_already_covered(pattern, lang) {
            continue;
        }
        pattern.add_with_binding(
            Object::LANG,
            Value::LangSet(LangSet::from(lang.as_str())),
            Binding::Weak,
            true,
        );
    }
    if !pattern.has(Object::PRGNAME) {
        if let Some(prgname) = &config.env.prgname {
            pattern.add_with_binding(
                Object::PRGNAME,
                Value::String(prgname.clone()),
                Binding::Weak,
                true,
            );
        }
    }
}

fn lang_already_covered(pattern: &Pattern, lang: &str) -> bool {
    pattern.values(Object::LANG).iter().any(|bound| {
        match &bound.value {
            Value::String(have) => {
                lang_contains(have, lang) || lang_contains(lang, have)
            }
            Value::LangSet(have) => {
                let incoming = LangSet::from(lang);
                have.contains(&incoming) || incoming.contains(have)
            }
            _ => false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        expr::Expr,
        rules::{Edit, RuleSet, Test},
    };
    use fontpat::Tri;
    use pretty_assertions::assert_eq;

    fn family_test(op: BinaryOp, qual: Qualifier, name: &str) -> Test {
        Test {
            kind: TestKind::Default,
            qual,
            object: Object::FAMILY,
            op,
            ignore_blanks: false,
            expr: Expr::literal(name),
        }
    }

    fn edit(object: Object, op: EditOp, expr: Expr, binding: Binding) -> Edit {
        Edit {
            object,
            op,
            expr,
            binding,
        }
    }

    fn config_with(kind: MatchKind, directive: Directive) -> Config {
        let mut rule_set = RuleSet::new("test");
        rule_set.add(kind, directive);
        let mut config = Config::default();
        config.add_rule_set(rule_set);
        config
    }

    fn families(pattern: &Pattern) -> Vec<&str> {
        pattern
            .values(Object::FAMILY)
            .iter()
            .filter_map(|b| b.value.as_str())
            .collect()
    }

    #[test]
    fn alias_prepends_before_match() {
        // the directive an <alias><prefer> expands to
        let directive = Directive {
            tests: vec![family_test(BinaryOp::Equal, Qualifier::Any, "Helvetica")],
            edits: vec![edit(
                Object::FAMILY,
                EditOp::Prepend,
                Expr::literal("Arial"),
                Binding::Strong,
            )],
        };
        let config = config_with(MatchKind::Pattern, directive);
        let mut p = Pattern::new();
        p.add(Object::FAMILY, "Helvetica".into());
        substitute(&config, &mut p, None, MatchKind::Pattern);
        assert_eq!(families(&p), vec!["Arial", "Helvetica"]);
    }

    #[test]
    fn failed_test_skips_edits() {
        let directive = Directive {
            tests: vec![family_test(BinaryOp::Equal, Qualifier::Any, "Times")],
            edits: vec![edit(
                Object::FAMILY,
                EditOp::Prepend,
                Expr::literal("Liberation Serif"),
                Binding::Strong,
            )],
        };
        let config = config_with(MatchKind::Pattern, directive);
        let mut p = Pattern::new();
        p.add(Object::FAMILY, "Helvetica".into());
        substitute(&config, &mut p, None, MatchKind::Pattern);
        assert_eq!(families(&p), vec!["Helvetica"]);
    }

    #[test]
    fn assign_replaces_matched_value() {
        let directive = Directive {
            tests: vec![family_test(BinaryOp::Equal, Qualifier::Any, "Helvetica")],
            edits: vec![edit(
                Object::FAMILY,
                EditOp::Assign,
                Expr::literal("Arial"),
                Binding::Same,
            )],
        };
        let config = config_with(MatchKind::Pattern, directive);
        let mut p = Pattern::new();
        p.add(Object::FAMILY, "Sans".into());
        p.add(Object::FAMILY, "Helvetica".into());
        substitute(&config, &mut p, None, MatchKind::Pattern);
        assert_eq!(families(&p), vec!["Sans", "Arial"]);
    }

    #[test]
    fn assign_without_test_replaces_all() {
        let directive = Directive {
            tests: vec![],
            edits: vec![edit(
                Object::WEIGHT,
                EditOp::Assign,
                Expr::literal(Value::Int(200)),
                Binding::Strong,
            )],
        };
        let config = config_with(MatchKind::Pattern, directive);
        let mut p = Pattern::new();
        p.add(Object::WEIGHT, Value::Int(80));
        p.add(Object::WEIGHT, Value::Int(100));
        substitute(&config, &mut p, None, MatchKind::Pattern);
        assert_eq!(p.values(Object::WEIGHT).len(), 1);
        assert_eq!(p.get(Object::WEIGHT, 0), Some(&Value::Int(200)));
    }

    #[test]
    fn delete_all_clears_object() {
        let directive = Directive {
            tests: vec![],
            edits: vec![edit(
                Object::ANTIALIAS,
                EditOp::DeleteAll,
                Expr::literal(Value::Bool(Tri::True)),
                Binding::Strong,
            )],
        };
        let config = config_with(MatchKind::Pattern, directive);
        let mut p = Pattern::new();
        p.add(Object::ANTIALIAS, Value::Bool(Tri::False));
        substitute(&config, &mut p, None, MatchKind::Pattern);
        assert!(!p.has(Object::ANTIALIAS));
    }

    #[test]
    fn absent_object_satisfies_all() {
        let directive = Directive {
            tests: vec![Test {
                kind: TestKind::Default,
                qual: Qualifier::All,
                object: Object::OUTLINE,
                op: BinaryOp::Equal,
                ignore_blanks: false,
                expr: Expr::literal(Value::Bool(Tri::True)),
            }],
            edits: vec![edit(
                Object::FAMILY,
                EditOp::AppendLast,
                Expr::literal("Fallback"),
                Binding::Weak,
            )],
        };
        let config = config_with(MatchKind::Pattern, directive);
        let mut p = Pattern::new();
        substitute(&config, &mut p, None, MatchKind::Pattern);
        assert_eq!(families(&p), vec!["Fallback"]);
    }

    #[test]
    fn failed_all_on_present_object_aborts_rule_set() {
        let _ = env_logger::builder().is_test(true).try_init();
        let failing = Directive {
            tests: vec![family_test(BinaryOp::NotEqual, Qualifier::All, "Helvetica")],
            edits: vec![edit(
                Object::FAMILY,
                EditOp::AppendLast,
                Expr::literal("NeverAdded"),
                Binding::Weak,
            )],
        };
        let after = Directive {
            tests: vec![],
            edits: vec![edit(
                Object::FAMILY,
                EditOp::AppendLast,
                Expr::literal("AlsoNeverAdded"),
                Binding::Weak,
            )],
        };
        let mut rule_set = RuleSet::new("abort");
        rule_set.add(MatchKind::Pattern, failing);
        rule_set.add(MatchKind::Pattern, after);
        let mut config = Config::default();
        config.add_rule_set(rule_set);

        let mut p = Pattern::new();
        p.add(Object::FAMILY, "Helvetica".into());
        substitute(&config, &mut p, None, MatchKind::Pattern);
        assert_eq!(families(&p), vec!["Helvetica"]);
    }

    #[test]
    fn qualifier_first_and_not_first() {
        let not_first = Directive {
            tests: vec![family_test(BinaryOp::Equal, Qualifier::NotFirst, "Arial")],
            edits: vec![edit(
                Object::FOUNDRY,
                EditOp::AssignReplace,
                Expr::literal("seen"),
                Binding::Strong,
            )],
        };
        let config = config_with(MatchKind::Pattern, not_first);

        let mut first_pos = Pattern::new();
        first_pos.add(Object::FAMILY, "Arial".into());
        substitute(&config, &mut first_pos, None, MatchKind::Pattern);
        assert!(!first_pos.has(Object::FOUNDRY));

        let mut second_pos = Pattern::new();
        second_pos.add(Object::FAMILY, "Helvetica".into());
        second_pos.add(Object::FAMILY, "Arial".into());
        substitute(&config, &mut second_pos, None, MatchKind::Pattern);
        assert!(second_pos.has(Object::FOUNDRY));
    }

    #[test]
    fn font_kind_tests_read_query() {
        let directive = Directive {
            tests: vec![Test {
                kind: TestKind::Pattern,
                qual: Qualifier::Any,
                object: Object::LANG,
                op: BinaryOp::Contains,
                ignore_blanks: false,
                expr: Expr::literal("ja"),
            }],
            edits: vec![edit(
                Object::EMBEDDED_BITMAP,
                EditOp::AssignReplace,
                Expr::literal(Value::Bool(Tri::False)),
                Binding::Strong,
            )],
        };
        let config = config_with(MatchKind::Font, directive);

        let mut query = Pattern::new();
        query.add(Object::LANG, Value::LangSet(LangSet::from("ja")));
        let mut font = Pattern::new();
        font.add(Object::FAMILY, "Gothic".into());
        substitute(&config, &mut font, Some(&query), MatchKind::Font);
        assert_eq!(
            font.get(Object::EMBEDDED_BITMAP, 0),
            Some(&Value::Bool(Tri::False))
        );
    }

    #[test]
    fn pattern_defaults_add_lang_and_prgname() {
        let mut config = Config::default();
        config.env.default_langs = vec!["de".into()];
        config.env.prgname = Some("editor".into());
        let mut p = Pattern::new();
        substitute(&config, &mut p, None, MatchKind::Pattern);

        let Some(Value::LangSet(langs)) = p.get(Object::LANG, 0) else {
            panic!("lang default missing");
        };
        assert_eq!(
            langs.has_lang("de"),
            fontpat::langset::LangResult::Equal
        );
        assert_eq!(p.values(Object::LANG)[0].binding, Binding::Weak);
        assert_eq!(p.get(Object::PRGNAME, 0), Some(&"editor".into()));
    }

    #[test]
    fn lang_default_not_duplicated() {
        let mut config = Config::default();
        config.env.default_langs = vec!["de".into()];
        let mut p = Pattern::new();
        p.add(Object::LANG, Value::LangSet(LangSet::from("de")));
        substitute(&config, &mut p, None, MatchKind::Pattern);
        assert_eq!(p.values(Object::LANG).len(), 1);
    }

    #[test]
    fn substitute_twice_is_idempotent_for_assigns() {
        let directive = Directive {
            tests: vec![family_test(BinaryOp::Equal, Qualifier::Any, "serif")],
            edits: vec![edit(
                Object::WEIGHT,
                EditOp::AssignReplace,
                Expr::literal(Value::Int(80)),
                Binding::Strong,
            )],
        };
        let config = config_with(MatchKind::Pattern, directive);
        let mut p = Pattern::new();
        p.add(Object::FAMILY, "serif".into());
        substitute(&config, &mut p, None, MatchKind::Pattern);
        let once = p.clone();
        substitute(&config, &mut p, None, MatchKind::Pattern);
        assert_eq!(once, p);
    }
}
