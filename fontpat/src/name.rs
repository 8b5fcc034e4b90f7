//! Textual pattern form: `Family1,Family2-12:weight=bold:slant=0`.
//!
//! Families come first, then optional comma-separated sizes after a `-`,
//! then `:`-separated `object=value` assignments. A bare word after a `:`
//! is looked up in the constant table (`bold`, `italic`, `mono`, ...).
//! `\` escapes the delimiters inside strings.

use smol_str::SmolStr;

use crate::{
    charset::CharSet,
    error::Error,
    langset::LangSet,
    object::{Object, TypeMask},
    pattern::Pattern,
    value::{Matrix, Range, Tri, Value},
};

/// A named integer constant usable wherever its object expects a number.
pub struct NameConstant {
    pub name: &'static str,
    pub object: Object,
    pub value: i32,
}

macro_rules! consts {
    ($($name:literal => $object:ident, $value:expr;)*) => {
        &[$(NameConstant {
            name: $name,
            object: Object::$object,
            value: $value,
        }),*]
    };
}

/// Builtin constants, weight codes first.
pub static NAME_CONSTANTS: &[NameConstant] = consts![
    "thin" => WEIGHT, 0;
    "extralight" => WEIGHT, 40;
    "ultralight" => WEIGHT, 40;
    "light" => WEIGHT, 50;
    "demilight" => WEIGHT, 55;
    "semilight" => WEIGHT, 55;
    "book" => WEIGHT, 75;
    "regular" => WEIGHT, 80;
    "medium" => WEIGHT, 100;
    "demibold" => WEIGHT, 180;
    "semibold" => WEIGHT, 180;
    "bold" => WEIGHT, 200;
    "extrabold" => WEIGHT, 205;
    "ultrabold" => WEIGHT, 205;
    "black" => WEIGHT, 210;
    "heavy" => WEIGHT, 210;
    "extrablack" => WEIGHT, 215;
    "ultrablack" => WEIGHT, 215;
    "roman" => SLANT, 0;
    "italic" => SLANT, 100;
    "oblique" => SLANT, 110;
    "ultracondensed" => WIDTH, 50;
    "extracondensed" => WIDTH, 63;
    "condensed" => WIDTH, 75;
    "semicondensed" => WIDTH, 87;
    "normal" => WIDTH, 100;
    "semiexpanded" => WIDTH, 113;
    "expanded" => WIDTH, 125;
    "extraexpanded" => WIDTH, 150;
    "ultraexpanded" => WIDTH, 200;
    "proportional" => SPACING, 0;
    "dual" => SPACING, 90;
    "mono" => SPACING, 100;
    "charcell" => SPACING, 110;
    "unknown" => RGBA, 0;
    "rgb" => RGBA, 1;
    "bgr" => RGBA, 2;
    "vrgb" => RGBA, 3;
    "vbgr" => RGBA, 4;
    "none" => RGBA, 5;
    "hintnone" => HINT_STYLE, 0;
    "hintslight" => HINT_STYLE, 1;
    "hintmedium" => HINT_STYLE, 2;
    "hintfull" => HINT_STYLE, 3;
    "lcdnone" => LCD_FILTER, 0;
    "lcddefault" => LCD_FILTER, 1;
    "lcdlight" => LCD_FILTER, 2;
    "lcdlegacy" => LCD_FILTER, 3;
];

/// Look up a constant by name, case-insensitively.
pub fn lookup_constant(name: &str) -> Option<&'static NameConstant> {
    NAME_CONSTANTS
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name))
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(s: &'a str) -> Lexer<'a> {
        Lexer {
            chars: s.chars().peekable(),
        }
    }

    /// Read until an unescaped delimiter (consumed) or end of input.
    fn token(&mut self, delims: &[char]) -> (String, Option<char>) {
        let mut out = String::new();
        while let Some(c) = self.chars.next() {
            if c == '\\' {
                if let Some(escaped) = self.chars.next() {
                    out.push(escaped);
                }
                continue;
            }
            if delims.contains(&c) {
                return (out, Some(c));
            }
            out.push(c);
        }
        (out, None)
    }
}

/// Parse the textual form into a pattern.
pub fn parse_name(name: &str) -> Result<Pattern, Error> {
    let mut pattern = Pattern::new();
    let mut lex = Lexer::new(name);

    // families
    let mut delim = loop {
        let (token, delim) = lex.token(&[',', '-', ':']);
        if !token.is_empty() {
            pattern.add(Object::FAMILY, Value::String(SmolStr::new(token)));
        }
        match delim {
            Some(',') => continue,
            other => break other,
        }
    };

    if delim == Some('-') {
        delim = loop {
            let (token, delim) = lex.token(&[',', ':']);
            if !token.is_empty() {
                let size: f64 = token
                    .parse()
                    .map_err(|_| Error::BadName(token.clone()))?;
                pattern.add(Object::SIZE, Value::from_f64(size));
            }
            match delim {
                Some(',') => continue,
                other => break other,
            }
        };
    }

    while delim == Some(':') {
        let (token, d) = lex.token(&['=', ':']);
        if d == Some('=') {
            let object = Object::from_name(&token)?;
            loop {
                let (raw, d) = lex.token(&[',', ':']);
                let value = convert_value(object, &raw)?;
                pattern.add(object, value);
                if d != Some(',') {
                    delim = d;
                    break;
                }
            }
        } else {
            if !token.is_empty() {
                let constant = lookup_constant(&token)
                    .ok_or_else(|| Error::UnknownConstant(SmolStr::new(&token)))?;
                pattern.add(constant.object, Value::Int(constant.value));
            }
            delim = d;
        }
    }
    Ok(pattern)
}

/// Convert one textual value according to the object's declared type.
fn convert_value(object: Object, raw: &str) -> Result<Value, Error> {
    let bad = || Error::BadValue {
        object: SmolStr::new(format!("{object}")),
        value: raw.to_string(),
    };
    let types = match object.types() {
        // custom objects get strings
        None => return Ok(Value::String(SmolStr::new(raw))),
        Some(types) => types,
    };

    if types.contains(TypeMask::RANGE) && raw.starts_with('[') {
        let inner = raw
            .trim_start_matches('[')
            .trim_end_matches(']')
            .trim();
        let mut parts = inner.split_ascii_whitespace();
        let begin: f64 = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
        let end: f64 = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
        if parts.next().is_some() {
            return Err(bad());
        }
        return Ok(Value::Range(Range::new(begin, end)));
    }
    if types.intersects(TypeMask::NUMBER) {
        if let Some(constant) = lookup_constant(raw) {
            if constant.object == object {
                return Ok(Value::Int(constant.value));
            }
        }
        if let Ok(v) = raw.parse::<f64>() {
            return if types.contains(TypeMask::INT) {
                Ok(Value::from_f64(v))
            } else {
                Ok(Value::Float(v))
            };
        }
        return Err(bad());
    }
    if types.contains(TypeMask::BOOL) {
        return Tri::parse(raw).map(Value::Bool).ok_or_else(bad);
    }
    if types.contains(TypeMask::MATRIX) {
        let mut parts = raw.split_ascii_whitespace();
        let mut get = || -> Result<f64, Error> {
            parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())
        };
        let matrix = Matrix {
            xx: get()?,
            xy: get()?,
            yx: get()?,
            yy: get()?,
        };
        return Ok(Value::Matrix(matrix));
    }
    if types.contains(TypeMask::CHARSET) {
        return CharSet::parse(raw).map(Value::CharSet);
    }
    if types.contains(TypeMask::LANGSET) {
        return Ok(Value::LangSet(LangSet::parse(raw)));
    }
    Ok(Value::String(SmolStr::new(raw)))
}

fn escape(s: &str, out: &mut String) {
    for c in s.chars() {
        if matches!(c, '\\' | '-' | ':' | ',') {
            out.push('\\');
        }
        out.push(c);
    }
}

fn unparse_value(value: &Value, out: &mut String) {
    match value {
        Value::Int(v) => out.push_str(&v.to_string()),
        Value::Float(v) => out.push_str(&v.to_string()),
        Value::Bool(v) => out.push_str(&v.to_string()),
        Value::String(s) => escape(s, out),
        Value::Matrix(m) => {
            out.push_str(&format!("{} {} {} {}", m.xx, m.xy, m.yx, m.yy));
        }
        Value::Range(r) => out.push_str(&format!("[{} {}]", r.begin, r.end)),
        Value::CharSet(cs) => out.push_str(&cs.to_string()),
        Value::LangSet(ls) => out.push_str(&ls.to_string()),
    }
}

/// Render a pattern in the textual form [`parse_name`] reads.
pub fn unparse_name(pattern: &Pattern) -> String {
    let mut out = String::new();
    for (i, bound) in pattern.values(Object::FAMILY).iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if let Value::String(name) = &bound.value {
            escape(name, &mut out);
        }
    }
    let sizes = pattern.values(Object::SIZE);
    if !sizes.is_empty() {
        out.push('-');
        for (i, bound) in sizes.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            unparse_value(&bound.value, &mut out);
        }
    }
    for object in pattern.objects() {
        if object == Object::FAMILY || object == Object::SIZE {
            continue;
        }
        let name = match object.name() {
            Some(name) => name,
            // custom objects cannot round-trip through the name form
            None => continue,
        };
        out.push(':');
        out.push_str(name);
        out.push('=');
        for (i, bound) in pattern.values(object).iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            unparse_value(&bound.value, &mut out);
        }
    }
    out
}
