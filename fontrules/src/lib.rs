//! Rule-based pattern rewriting: expressions, rule sets, the substitution
//! engine and the config state they hang off.

pub mod config;
pub mod error;
pub mod expr;
pub mod rules;
pub mod subst;

pub use config::Config;
pub use error::Error;
pub use expr::{BinaryOp, Expr, UnaryOp};
pub use rules::{Directive, Edit, EditOp, MatchKind, Qualifier, RuleSet, Test, TestKind};
pub use subst::substitute;
