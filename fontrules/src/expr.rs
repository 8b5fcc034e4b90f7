//! Expressions attached to rule tests and edits, and their evaluation.
//!
//! Evaluation never fails: ill-typed operations log and yield `None`, which
//! callers treat as "no value". Binary operands are promoted pairwise (ints
//! to floats, numbers to ranges, strings to langsets) before dispatch.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use fontpat::{
    name::lookup_constant,
    value::{str_fold_contains, str_fold_eq, str_fold_eq_ignore_blanks},
    CharSet, LangSet, Matrix, Object, Pattern, Range, Tri, TypeMask, Value,
};

use crate::{
    error::Error,
    rules::{MatchKind, TestKind},
};

/// Binary operator tags, comparisons and arithmetic alike.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    And,
    Or,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    More,
    MoreEqual,
    Contains,
    NotContains,
    Listing,
    Plus,
    Minus,
    Times,
    Divide,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::Less
                | BinaryOp::LessEqual
                | BinaryOp::More
                | BinaryOp::MoreEqual
                | BinaryOp::Contains
                | BinaryOp::NotContains
                | BinaryOp::Listing
        )
    }

    /// Parse a `compare` attribute value.
    pub fn parse_compare(s: &str) -> Result<BinaryOp, Error> {
        match s {
            "eq" => Ok(BinaryOp::Equal),
            "not_eq" => Ok(BinaryOp::NotEqual),
            "less" => Ok(BinaryOp::Less),
            "less_eq" => Ok(BinaryOp::LessEqual),
            "more" => Ok(BinaryOp::More),
            "more_eq" => Ok(BinaryOp::MoreEqual),
            "contains" => Ok(BinaryOp::Contains),
            "not_contains" => Ok(BinaryOp::NotContains),
            _ => Err(Error::BadCompare(s.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Floor,
    Ceil,
    Round,
    Trunc,
}

/// An expression tree node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Literal(Value),
    /// Read the first value of an object from the pattern or its companion.
    Field { object: Object, target: TestKind },
    /// A named constant from the builtin table.
    Const(SmolStr),
    Cond {
        test: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        arg: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        ignore_blanks: bool,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    MatrixOf {
        xx: Box<Expr>,
        xy: Box<Expr>,
        yx: Box<Expr>,
        yy: Box<Expr>,
    },
    /// Comma-joined values for edit lists.
    List(Vec<Expr>),
}

impl Expr {
    pub fn literal(value: impl Into<Value>) -> Expr {
        Expr::Literal(value.into())
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            ignore_blanks: false,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Evaluate against `p`, reading pattern-target fields from `p_pat`
    /// when substituting with [`MatchKind::Font`].
    pub fn evaluate(&self, p: &Pattern, p_pat: Option<&Pattern>, kind: MatchKind) -> Option<Value> {
        match self {
            Expr::Literal(value) => Some(value.clone()),
            Expr::Field { object, target } => {
                let value = match (kind, target) {
                    (MatchKind::Font, TestKind::Pattern) => p_pat?.get(*object, 0),
                    (MatchKind::Pattern, TestKind::Font) => {
                        log::warn!("<name> target=\"font\" inside match target=\"pattern\"");
                        None
                    }
                    _ => p.get(*object, 0),
                };
                value.cloned()
            }
            Expr::Const(name) => match lookup_constant(name) {
                Some(constant) => Some(Value::Int(constant.value)),
                None => {
                    log::warn!("unknown constant '{name}'");
                    None
                }
            },
            Expr::Cond {
                test,
                then,
                otherwise,
            } => {
                let cond = test.evaluate(p, p_pat, kind);
                match cond {
                    Some(Value::Bool(b)) => {
                        if b != Tri::False {
                            then.evaluate(p, p_pat, kind)
                        } else {
                            otherwise.evaluate(p, p_pat, kind)
                        }
                    }
                    _ => {
                        log::warn!("conditional did not evaluate to bool");
                        None
                    }
                }
            }
            Expr::Unary { op, arg } => {
                let value = arg.evaluate(p, p_pat, kind)?;
                evaluate_unary(*op, value)
            }
            Expr::Binary {
                op,
                ignore_blanks,
                lhs,
                rhs,
            } => {
                let lhs = lhs.evaluate(p, p_pat, kind);
                let rhs = rhs.evaluate(p, p_pat, kind);
                evaluate_binary(*op, lhs, rhs, *ignore_blanks)
            }
            Expr::MatrixOf { xx, xy, yx, yy } => {
                let xx = xx.evaluate(p, p_pat, kind)?.as_f64()?;
                let xy = xy.evaluate(p, p_pat, kind)?.as_f64()?;
                let yx = yx.evaluate(p, p_pat, kind)?.as_f64()?;
                let yy = yy.evaluate(p, p_pat, kind)?.as_f64()?;
                Some(Value::Matrix(Matrix { xx, xy, yx, yy }))
            }
            Expr::List(_) => {
                log::warn!("value list used where a single value is expected");
                None
            }
        }
    }

    /// Evaluate to a flat list of values, splitting top-level commas.
    pub fn evaluate_list(
        &self,
        p: &Pattern,
        p_pat: Option<&Pattern>,
        kind: MatchKind,
    ) -> Vec<Value> {
        match self {
            Expr::List(items) => items
                .iter()
                .flat_map(|item| item.evaluate_list(p, p_pat, kind))
                .collect(),
            other => other.evaluate(p, p_pat, kind).into_iter().collect(),
        }
    }

    /// Types this expression can produce, for config typechecking.
    /// `None` means "anything" (e.g. a field of a custom object).
    pub fn inferred_types(&self) -> Option<TypeMask> {
        match self {
            Expr::Literal(value) => Some(value.type_mask()),
            Expr::Field { object, .. } => object.types(),
            Expr::Const(name) => lookup_constant(name)
                .map(|c| c.object.types().unwrap_or(TypeMask::INT))
                .or(Some(TypeMask::INT)),
            Expr::Cond { then, otherwise, .. } => {
                match (then.inferred_types(), otherwise.inferred_types()) {
                    (Some(a), Some(b)) => Some(a | b),
                    _ => None,
                }
            }
            Expr::Unary { op: UnaryOp::Not, .. } => Some(TypeMask::BOOL),
            Expr::Unary { .. } => Some(TypeMask::NUMBER),
            Expr::Binary { op, lhs, rhs, .. } => {
                if op.is_comparison() || matches!(op, BinaryOp::And | BinaryOp::Or) {
                    Some(TypeMask::BOOL)
                } else {
                    match (lhs.inferred_types(), rhs.inferred_types()) {
                        (Some(a), Some(b)) => Some(a | b),
                        _ => None,
                    }
                }
            }
            Expr::MatrixOf { .. } => Some(TypeMask::MATRIX),
            Expr::List(items) => {
                let mut mask = TypeMask::empty();
                for item in items {
                    mask |= item.inferred_types()?;
                }
                Some(mask)
            }
        }
    }
}

fn evaluate_unary(op: UnaryOp, value: Value) -> Option<Value> {
    match op {
        UnaryOp::Not => match value {
            Value::Bool(Tri::False) => Some(Value::Bool(Tri::True)),
            Value::Bool(_) => Some(Value::Bool(Tri::False)),
            other => {
                log::warn!("not applied to {}", other.type_name());
                None
            }
        },
        UnaryOp::Floor => Some(Value::from_f64(value.as_f64()?.floor())),
        UnaryOp::Ceil => Some(Value::from_f64(value.as_f64()?.ceil())),
        UnaryOp::Round => Some(Value::from_f64(value.as_f64()?.round())),
        UnaryOp::Trunc => Some(Value::from_f64(value.as_f64()?.trunc())),
    }
}

/// Promote `value` so it can meet `other` in a binary op. Missing values
/// become the op-appropriate identity where one exists.
fn promote(value: Option<Value>, other: &Option<Value>) -> Option<Value> {
    match (value, other) {
        (None, Some(Value::Matrix(_))) => Some(Value::Matrix(Matrix::IDENTITY)),
        (None, Some(Value::CharSet(_))) => Some(Value::CharSet(CharSet::new())),
        (None, Some(Value::LangSet(_))) => Some(Value::LangSet(LangSet::new())),
        (Some(Value::Int(v)), Some(Value::Range(_))) => Some(Value::Range(Range::point(v as f64))),
        (Some(Value::Int(v)), Some(Value::Float(_))) => Some(Value::Float(v as f64)),
        (Some(Value::Float(v)), Some(Value::Range(_))) => Some(Value::Range(Range::point(v))),
        (Some(Value::String(s)), Some(Value::LangSet(_))) => {
            Some(Value::LangSet(LangSet::parse(&s)))
        }
        (value, _) => value,
    }
}

fn evaluate_binary(
    op: BinaryOp,
    lhs: Option<Value>,
    rhs: Option<Value>,
    ignore_blanks: bool,
) -> Option<Value> {
    let rhs_promoted = promote(rhs, &lhs);
    let lhs = promote(lhs, &rhs_promoted)?;
    let rhs = rhs_promoted?;

    if op.is_comparison() {
        return Some(Value::Bool(
            compare_value(op, &lhs, &rhs, ignore_blanks).into(),
        ));
    }

    match op {
        BinaryOp::And | BinaryOp::Or => match (lhs, rhs) {
            (Value::Bool(a), Value::Bool(b)) => {
                let a = a != Tri::False;
                let b = b != Tri::False;
                let out = if op == BinaryOp::And { a && b } else { a || b };
                Some(Value::Bool(out.into()))
            }
            _ => {
                log::warn!("boolean op on non-bool operands");
                None
            }
        },
        BinaryOp::Plus => match (lhs, rhs) {
            (Value::CharSet(a), Value::CharSet(b)) => Some(Value::CharSet(a.union(&b))),
            (Value::LangSet(a), Value::LangSet(b)) => Some(Value::LangSet(a.union(&b))),
            (a, b) => numeric(a, b, |x, y| x + y),
        },
        BinaryOp::Minus => match (lhs, rhs) {
            (Value::CharSet(a), Value::CharSet(b)) => Some(Value::CharSet(a.subtract(&b))),
            (Value::LangSet(a), Value::LangSet(b)) => Some(Value::LangSet(a.subtract(&b))),
            (a, b) => numeric(a, b, |x, y| x - y),
        },
        BinaryOp::Times => match (lhs, rhs) {
            (Value::Matrix(a), Value::Matrix(b)) => Some(Value::Matrix(a.multiply(&b))),
            (a, b) => numeric(a, b, |x, y| x * y),
        },
        BinaryOp::Divide => match (lhs, rhs) {
            (a, b) => {
                let y = b.as_f64()?;
                if y == 0.0 {
                    log::warn!("division by zero");
                    return None;
                }
                Some(Value::from_f64(a.as_f64()? / y))
            }
        },
        _ => unreachable!("comparisons handled above"),
    }
}

fn numeric(a: Value, b: Value, op: impl Fn(f64, f64) -> f64) -> Option<Value> {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => Some(Value::from_f64(op(x, y))),
        _ => {
            log::warn!(
                "arithmetic on incompatible types {} and {}",
                a.type_name(),
                b.type_name()
            );
            None
        }
    }
}

/// Compare two values under a relational op, promoting cross-type pairs
/// (number vs range, string vs langset) first. Types that still mismatch
/// satisfy only `NotEqual`/`NotContains`.
pub fn compare_value(op: BinaryOp, lhs: &Value, rhs: &Value, ignore_blanks: bool) -> bool {
    use BinaryOp::*;
    match (lhs, rhs) {
        (Value::Int(_) | Value::Float(_), Value::Range(_)) => {
            let promoted = Value::Range(Range::point(lhs.as_f64().unwrap()));
            return compare_value(op, &promoted, rhs, ignore_blanks);
        }
        (Value::Range(_), Value::Int(_) | Value::Float(_)) => {
            let promoted = Value::Range(Range::point(rhs.as_f64().unwrap()));
            return compare_value(op, lhs, &promoted, ignore_blanks);
        }
        (Value::String(s), Value::LangSet(_)) => {
            let promoted = Value::LangSet(LangSet::parse(s));
            return compare_value(op, &promoted, rhs, ignore_blanks);
        }
        (Value::LangSet(_), Value::String(s)) => {
            let promoted = Value::LangSet(LangSet::parse(s));
            return compare_value(op, lhs, &promoted, ignore_blanks);
        }
        _ => (),
    }
    match (lhs, rhs) {
        (Value::Int(_), Value::Int(_))
        | (Value::Int(_), Value::Float(_))
        | (Value::Float(_), Value::Int(_))
        | (Value::Float(_), Value::Float(_)) => {
            let a = lhs.as_f64().unwrap();
            let b = rhs.as_f64().unwrap();
            match op {
                Equal | Contains | Listing => a == b,
                NotEqual | NotContains => a != b,
                Less => a < b,
                LessEqual => a <= b,
                More => a > b,
                MoreEqual => a >= b,
                _ => false,
            }
        }
        (Value::Range(a), Value::Range(b)) => match op {
            Equal => a.begin == b.begin && a.end == b.end,
            NotEqual => a.begin != b.begin || a.end != b.end,
            Contains | Listing => a.contains(b),
            NotContains => !a.contains(b),
            Less => a.end < b.begin,
            LessEqual => a.end <= b.begin,
            More => a.begin > b.end,
            MoreEqual => a.begin >= b.end,
            _ => false,
        },
        (Value::String(a), Value::String(b)) => {
            let eq = if ignore_blanks {
                str_fold_eq_ignore_blanks(a, b)
            } else {
                str_fold_eq(a, b)
            };
            match op {
                Equal | Listing => eq,
                NotEqual => !eq,
                Contains => str_fold_contains(a, b),
                NotContains => !str_fold_contains(a, b),
                _ => false,
            }
        }
        (Value::Bool(a), Value::Bool(b)) => match op {
            Equal | Contains | Listing => a.agrees(*b),
            NotEqual | NotContains => !a.agrees(*b),
            _ => false,
        },
        (Value::CharSet(a), Value::CharSet(b)) => match op {
            Equal => a == b,
            NotEqual => a != b,
            Contains | Listing => b.is_subset(a),
            NotContains => !b.is_subset(a),
            _ => false,
        },
        (Value::LangSet(a), Value::LangSet(b)) => match op {
            Equal => a == b,
            NotEqual => a != b,
            Contains | Listing => a.contains(b),
            NotContains => !a.contains(b),
            _ => false,
        },
        (Value::Matrix(a), Value::Matrix(b)) => match op {
            Equal | Contains | Listing => a.nearly_equal(b),
            NotEqual | NotContains => !a.nearly_equal(b),
            _ => false,
        },
        _ => matches!(op, NotEqual | NotContains),
    }
}
