//! Object identifiers: the closed set of attribute slots a pattern can carry.
//!
//! Builtin objects have a declared type mask used by the config typechecker
//! and by [`Pattern::add`](crate::Pattern::add) validation. Custom objects
//! are allocated above [`Object::FIRST_CUSTOM`] by the config parser and
//! carry no declared type.

use std::fmt::{Debug, Display};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::Error;

bitflags! {
    /// Which value variants an object accepts.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TypeMask: u16 {
        const INT = 1 << 0;
        const FLOAT = 1 << 1;
        const STRING = 1 << 2;
        const BOOL = 1 << 3;
        const MATRIX = 1 << 4;
        const RANGE = 1 << 5;
        const CHARSET = 1 << 6;
        const LANGSET = 1 << 7;

        /// Int and Float interconvert everywhere.
        const NUMBER = Self::INT.bits() | Self::FLOAT.bits();
        /// Numbers promote to ranges during comparison.
        const NUM_OR_RANGE = Self::NUMBER.bits() | Self::RANGE.bits();
    }
}

impl TypeMask {
    /// True if a value of type `other` can be stored under this mask,
    /// counting Int/Float as interchangeable.
    pub fn admits(self, other: TypeMask) -> bool {
        let mut widened = self;
        if self.intersects(TypeMask::NUMBER) {
            widened |= TypeMask::NUMBER;
        }
        widened.intersects(other)
    }
}

/// Identifier of one attribute slot within a pattern.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Object(u16);

/// Name and declared types of one builtin object.
struct ObjectDef {
    name: &'static str,
    types: TypeMask,
}

const S: TypeMask = TypeMask::STRING;
const I: TypeMask = TypeMask::INT;
const F: TypeMask = TypeMask::FLOAT;
const B: TypeMask = TypeMask::BOOL;

/// Builtin objects, in canonical id order. `Object(n)` for builtin n is
/// `BUILTINS[n - 1]`.
static BUILTINS: &[ObjectDef] = &[
    ObjectDef { name: "family", types: S },
    ObjectDef { name: "familylang", types: S },
    ObjectDef { name: "style", types: S },
    ObjectDef { name: "stylelang", types: S },
    ObjectDef { name: "fullname", types: S },
    ObjectDef { name: "fullnamelang", types: S },
    ObjectDef { name: "slant", types: TypeMask::INT },
    ObjectDef { name: "weight", types: TypeMask::NUM_OR_RANGE },
    ObjectDef { name: "width", types: TypeMask::NUM_OR_RANGE },
    ObjectDef { name: "size", types: TypeMask::NUM_OR_RANGE },
    ObjectDef { name: "aspect", types: F },
    ObjectDef { name: "pixelsize", types: TypeMask::NUMBER },
    ObjectDef { name: "spacing", types: I },
    ObjectDef { name: "foundry", types: S },
    ObjectDef { name: "antialias", types: B },
    ObjectDef { name: "hintstyle", types: I },
    ObjectDef { name: "hinting", types: B },
    ObjectDef { name: "verticallayout", types: B },
    ObjectDef { name: "autohint", types: B },
    ObjectDef { name: "file", types: S },
    ObjectDef { name: "index", types: I },
    ObjectDef { name: "rasterizer", types: S },
    ObjectDef { name: "outline", types: B },
    ObjectDef { name: "scalable", types: B },
    ObjectDef { name: "dpi", types: F },
    ObjectDef { name: "rgba", types: I },
    ObjectDef { name: "scale", types: F },
    ObjectDef { name: "minspace", types: B },
    ObjectDef { name: "charwidth", types: I },
    ObjectDef { name: "charheight", types: I },
    ObjectDef { name: "matrix", types: TypeMask::MATRIX },
    ObjectDef {
        name: "charset",
        types: TypeMask::CHARSET,
    },
    ObjectDef {
        name: "lang",
        types: TypeMask::LANGSET.union(TypeMask::STRING),
    },
    ObjectDef { name: "fontversion", types: I },
    ObjectDef { name: "capability", types: S },
    ObjectDef { name: "fontformat", types: S },
    ObjectDef { name: "embolden", types: B },
    ObjectDef { name: "embeddedbitmap", types: B },
    ObjectDef { name: "decorative", types: B },
    ObjectDef { name: "lcdfilter", types: I },
    ObjectDef { name: "namelang", types: S },
    ObjectDef { name: "fontfeatures", types: S },
    ObjectDef { name: "prgname", types: S },
    ObjectDef { name: "hash", types: S },
    ObjectDef { name: "postscriptname", types: S },
    ObjectDef { name: "color", types: B },
    ObjectDef { name: "symbol", types: B },
    ObjectDef { name: "fontvariations", types: S },
    ObjectDef { name: "variable", types: B },
    ObjectDef { name: "fonthashint", types: B },
    ObjectDef { name: "order", types: I },
];

impl Object {
    pub const FAMILY: Object = Object(1);
    pub const FAMILY_LANG: Object = Object(2);
    pub const STYLE: Object = Object(3);
    pub const STYLE_LANG: Object = Object(4);
    pub const FULLNAME: Object = Object(5);
    pub const FULLNAME_LANG: Object = Object(6);
    pub const SLANT: Object = Object(7);
    pub const WEIGHT: Object = Object(8);
    pub const WIDTH: Object = Object(9);
    pub const SIZE: Object = Object(10);
    pub const ASPECT: Object = Object(11);
    pub const PIXEL_SIZE: Object = Object(12);
    pub const SPACING: Object = Object(13);
    pub const FOUNDRY: Object = Object(14);
    pub const ANTIALIAS: Object = Object(15);
    pub const HINT_STYLE: Object = Object(16);
    pub const HINTING: Object = Object(17);
    pub const VERTICAL_LAYOUT: Object = Object(18);
    pub const AUTOHINT: Object = Object(19);
    pub const FILE: Object = Object(20);
    pub const INDEX: Object = Object(21);
    pub const RASTERIZER: Object = Object(22);
    pub const OUTLINE: Object = Object(23);
    pub const SCALABLE: Object = Object(24);
    pub const DPI: Object = Object(25);
    pub const RGBA: Object = Object(26);
    pub const SCALE: Object = Object(27);
    pub const MINSPACE: Object = Object(28);
    pub const CHAR_WIDTH: Object = Object(29);
    pub const CHAR_HEIGHT: Object = Object(30);
    pub const MATRIX: Object = Object(31);
    pub const CHARSET: Object = Object(32);
    pub const LANG: Object = Object(33);
    pub const FONT_VERSION: Object = Object(34);
    pub const CAPABILITY: Object = Object(35);
    pub const FONT_FORMAT: Object = Object(36);
    pub const EMBOLDEN: Object = Object(37);
    pub const EMBEDDED_BITMAP: Object = Object(38);
    pub const DECORATIVE: Object = Object(39);
    pub const LCD_FILTER: Object = Object(40);
    pub const NAME_LANG: Object = Object(41);
    pub const FONT_FEATURES: Object = Object(42);
    pub const PRGNAME: Object = Object(43);
    pub const HASH: Object = Object(44);
    pub const POSTSCRIPT_NAME: Object = Object(45);
    pub const COLOR: Object = Object(46);
    pub const SYMBOL: Object = Object(47);
    pub const FONT_VARIATIONS: Object = Object(48);
    pub const VARIABLE: Object = Object(49);
    pub const FONT_HAS_HINT: Object = Object(50);
    pub const ORDER: Object = Object(51);

    /// Ids at and above this are custom objects from a config registry.
    pub const FIRST_CUSTOM: Object = Object(0x100);

    /// Number of builtin objects.
    pub fn builtin_count() -> usize {
        BUILTINS.len()
    }

    /// All builtin objects in id order.
    pub fn builtins() -> impl Iterator<Item = Object> {
        (1..=BUILTINS.len() as u16).map(Object)
    }

    /// Look up a builtin object by its config name.
    pub fn builtin_from_name(name: &str) -> Option<Object> {
        BUILTINS
            .iter()
            .position(|def| def.name == name)
            .map(|idx| Object(idx as u16 + 1))
    }

    pub fn from_name(name: &str) -> Result<Object, Error> {
        Object::builtin_from_name(name).ok_or_else(|| Error::UnknownObject(SmolStr::new(name)))
    }

    /// The nth custom object id.
    pub fn custom(n: usize) -> Object {
        Object(Object::FIRST_CUSTOM.0 + n as u16)
    }

    pub fn is_custom(self) -> bool {
        self >= Object::FIRST_CUSTOM
    }

    /// Config name for builtin objects; custom names live in the registry
    /// that allocated them.
    pub fn name(self) -> Option<&'static str> {
        self.def().map(|def| def.name)
    }

    /// Declared types, `None` for custom objects (which accept anything).
    pub fn types(self) -> Option<TypeMask> {
        self.def().map(|def| def.types)
    }

    pub fn raw(self) -> u16 {
        self.0
    }

    fn def(self) -> Option<&'static ObjectDef> {
        if self.is_custom() || self.0 == 0 {
            return None;
        }
        BUILTINS.get(self.0 as usize - 1)
    }
}

impl Debug for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "custom#{}", self.0),
        }
    }
}

impl Display for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_names_round_trip() {
        for object in Object::builtins() {
            let name = object.name().unwrap();
            assert_eq!(Some(object), Object::builtin_from_name(name), "{name}");
        }
    }

    #[test]
    fn ids_are_stable() {
        assert_eq!(Object::builtin_from_name("family"), Some(Object::FAMILY));
        assert_eq!(Object::builtin_from_name("lang"), Some(Object::LANG));
        assert_eq!(Object::builtin_from_name("order"), Some(Object::ORDER));
        assert_eq!(Object::builtin_from_name("globaladvance"), None);
    }

    #[test]
    fn custom_ids_do_not_collide() {
        assert!(Object::custom(0).is_custom());
        assert!(Object::custom(0) > Object::ORDER);
        assert_eq!(Object::custom(3).name(), None);
    }

    #[test]
    fn weight_admits_numbers_and_ranges() {
        let types = Object::WEIGHT.types().unwrap();
        assert!(types.admits(TypeMask::INT));
        assert!(types.admits(TypeMask::FLOAT));
        assert!(types.admits(TypeMask::RANGE));
        assert!(!types.admits(TypeMask::STRING));
    }

    #[test]
    fn int_slot_admits_float() {
        let types = Object::SLANT.types().unwrap();
        assert!(types.admits(TypeMask::FLOAT));
        assert!(!types.admits(TypeMask::BOOL));
    }
}
