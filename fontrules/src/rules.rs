//! Tests, edits, directives and rule sets.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use fontpat::{Binding, Object};

use crate::{error::Error, expr::Expr};

/// Which phase of processing a rule set bucket applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchKind {
    Pattern,
    Font,
    Scan,
}

impl MatchKind {
    pub const ALL: [MatchKind; 3] = [MatchKind::Pattern, MatchKind::Font, MatchKind::Scan];

    pub fn index(self) -> usize {
        match self {
            MatchKind::Pattern => 0,
            MatchKind::Font => 1,
            MatchKind::Scan => 2,
        }
    }
}

impl FromStr for MatchKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pattern" => Ok(MatchKind::Pattern),
            "font" => Ok(MatchKind::Font),
            "scan" => Ok(MatchKind::Scan),
            _ => Err(Error::BadMatchKind(s.to_string())),
        }
    }
}

/// Where a test (or a `<name>` reference) reads its values from.
/// `Default` resolves to the enclosing directive's kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestKind {
    #[default]
    Default,
    Pattern,
    Font,
    Scan,
}

impl FromStr for TestKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(TestKind::Default),
            "pattern" => Ok(TestKind::Pattern),
            "font" => Ok(TestKind::Font),
            "scan" => Ok(TestKind::Scan),
            _ => Err(Error::BadMatchKind(s.to_string())),
        }
    }
}

/// How many of an object's values a test must satisfy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Qualifier {
    #[default]
    Any,
    All,
    First,
    NotFirst,
}

impl FromStr for Qualifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any" => Ok(Qualifier::Any),
            "all" => Ok(Qualifier::All),
            "first" => Ok(Qualifier::First),
            "not_first" => Ok(Qualifier::NotFirst),
            _ => Err(Error::BadQualifier(s.to_string())),
        }
    }
}

/// How an edit combines its values with the existing list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditOp {
    #[default]
    Assign,
    AssignReplace,
    Prepend,
    PrependFirst,
    Append,
    AppendLast,
    Delete,
    DeleteAll,
}

impl FromStr for EditOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "assign" => Ok(EditOp::Assign),
            "assign_replace" => Ok(EditOp::AssignReplace),
            "prepend" => Ok(EditOp::Prepend),
            "prepend_first" => Ok(EditOp::PrependFirst),
            "append" => Ok(EditOp::Append),
            "append_last" => Ok(EditOp::AppendLast),
            "delete" => Ok(EditOp::Delete),
            "delete_all" => Ok(EditOp::DeleteAll),
            _ => Err(Error::BadEditOp(s.to_string())),
        }
    }
}

/// Parse a `binding` attribute value.
pub fn parse_binding(s: &str) -> Result<Binding, Error> {
    match s {
        "weak" => Ok(Binding::Weak),
        "strong" => Ok(Binding::Strong),
        "same" => Ok(Binding::Same),
        _ => Err(Error::BadBinding(s.to_string())),
    }
}

/// One comparison against an object's value list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Test {
    pub kind: TestKind,
    pub qual: Qualifier,
    pub object: Object,
    pub op: crate::expr::BinaryOp,
    pub ignore_blanks: bool,
    pub expr: Expr,
}

/// One mutation of an object's value list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edit {
    pub object: Object,
    pub op: EditOp,
    pub expr: Expr,
    pub binding: Binding,
}

/// Tests followed by edits; the edits run only if every test passes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Directive {
    pub tests: Vec<Test>,
    pub edits: Vec<Edit>,
}

/// Directives from one config file, bucketed by match kind.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub name: SmolStr,
    pub description: Option<SmolStr>,
    pub domain: Option<SmolStr>,
    pub enabled: bool,
    directives: [Vec<Directive>; 3],
}

impl RuleSet {
    pub fn new(name: impl Into<SmolStr>) -> RuleSet {
        RuleSet {
            name: name.into(),
            description: None,
            domain: None,
            enabled: true,
            directives: Default::default(),
        }
    }

    pub fn add(&mut self, kind: MatchKind, directive: Directive) {
        self.directives[kind.index()].push(directive);
    }

    pub fn directives(&self, kind: MatchKind) -> &[Directive] {
        &self.directives[kind.index()]
    }

    pub fn is_empty(&self) -> bool {
        self.directives.iter().all(Vec::is_empty)
    }

    /// Largest number of tests any directive carries, for scratch sizing.
    pub fn max_tests(&self) -> usize {
        self.directives
            .iter()
            .flatten()
            .map(|d| d.tests.len())
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attr_spellings_parse() {
        assert_eq!("pattern".parse::<MatchKind>().unwrap(), MatchKind::Pattern);
        assert_eq!("not_first".parse::<Qualifier>().unwrap(), Qualifier::NotFirst);
        assert_eq!("append_last".parse::<EditOp>().unwrap(), EditOp::AppendLast);
        assert_eq!(parse_binding("same").unwrap(), Binding::Same);
        assert!("sideways".parse::<MatchKind>().is_err());
        assert!(parse_binding("loose").is_err());
    }

    #[test]
    fn rule_set_buckets() {
        let mut set = RuleSet::new("test");
        set.add(MatchKind::Pattern, Directive::default());
        set.add(MatchKind::Font, Directive::default());
        assert_eq!(set.directives(MatchKind::Pattern).len(), 1);
        assert_eq!(set.directives(MatchKind::Scan).len(), 0);
        assert!(!set.is_empty());
    }
}
