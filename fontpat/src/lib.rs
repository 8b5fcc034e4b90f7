//! Pattern data model shared by the config, substitution and match layers.

pub mod charset;
pub mod error;
pub mod lang_data;
pub mod langset;
pub mod name;
pub mod object;
pub mod pattern;
pub mod value;

pub use charset::CharSet;
pub use error::Error;
pub use langset::{LangResult, LangSet};
pub use object::{Object, TypeMask};
pub use pattern::{Binding, BoundValue, FontSet, Pattern};
pub use value::{Matrix, Range, Tri, Value};
