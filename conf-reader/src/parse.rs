//! The streaming XML parser.
//!
//! Open tags push a frame holding attributes, text and the values produced
//! by child elements; closing a tag folds its frame into a node pushed onto
//! the parent. Config-level elements (`<dir>`, `<match>`, `<alias>`, ...)
//! act on the config directly instead of producing a node.

use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use quick_xml::{events::Event, Reader};
use smol_str::SmolStr;

use fontpat::{
    CharSet, LangSet, Object, Pattern, Range, Tri, TypeMask, Value,
};
use fontrules::{
    config::{Config, FontDir, RemapDir},
    rules::parse_binding,
    BinaryOp, Directive, Edit, EditOp, Expr, MatchKind, Qualifier, RuleSet, Test, TestKind,
    UnaryOp,
};

use crate::{error::ConfError, include};

struct Frame {
    tag: SmolStr,
    attrs: Vec<(SmolStr, String)>,
    text: String,
    children: Vec<Node>,
}

impl Frame {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn required_attr(&self, name: &'static str) -> Result<&str, ConfError> {
        self.attr(name).ok_or(ConfError::MissingAttribute {
            element: self.tag.clone(),
            attr: name,
        })
    }

    fn exprs(self) -> Vec<Expr> {
        self.children
            .into_iter()
            .filter_map(|node| match node {
                Node::Expr(expr) => Some(expr),
                _ => None,
            })
            .collect()
    }
}

enum Node {
    Expr(Expr),
    Test(Test),
    Edit(Edit),
    Prefer(Vec<Expr>),
    Accept(Vec<Expr>),
    Default(Vec<Expr>),
    Glob(String),
    Pat(Pattern),
    PatElt(Object, Value),
}

const KNOWN_TAGS: &[&str] = &[
    "fontconfig", "description", "dir", "remap-dir", "cachedir", "include", "config", "rescan",
    "selectfont", "acceptfont", "rejectfont", "glob", "pattern", "patelt", "match", "test", "edit",
    "alias", "prefer", "accept", "default", "family", "int", "double", "bool", "string", "const",
    "name", "matrix", "range", "charset", "langset", "or", "and", "eq", "not_eq", "less",
    "less_eq", "more", "more_eq", "contains", "not_contains", "plus", "minus", "times", "divide",
    "not", "if", "floor", "ceil", "round", "trunc", "reset-dirs",
];

pub(crate) struct Parser<'a> {
    pub(crate) config: &'a mut Config,
    rule_set: RuleSet,
    path_display: String,
    base_dir: PathBuf,
    stack: Vec<Frame>,
    // depth inside an ignored its:* subtree
    skip_depth: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(
        config: &'a mut Config,
        name: &str,
        path_display: String,
        base_dir: PathBuf,
    ) -> Parser<'a> {
        Parser {
            config,
            rule_set: RuleSet::new(name),
            path_display,
            base_dir,
            stack: Vec::new(),
            skip_depth: 0,
        }
    }

    pub(crate) fn run(mut self, xml: &str) -> Result<(), ConfError> {
        let mut reader = Reader::from_str(xml);
        loop {
            let event = reader.read_event().map_err(|source| ConfError::Xml {
                path: self.path_display.clone(),
                source,
            })?;
            match event {
                Event::Start(start) => {
                    if self.skip_depth > 0 {
                        self.skip_depth += 1;
                        continue;
                    }
                    self.open(&start)?;
                }
                Event::Empty(start) => {
                    if self.skip_depth > 0 {
                        continue;
                    }
                    if self.open(&start)? {
                        self.close()?;
                    } else {
                        // a self-closing its: element is over already
                        self.skip_depth = 0;
                    }
                }
                Event::End(_) => {
                    if self.skip_depth > 0 {
                        self.skip_depth -= 1;
                        continue;
                    }
                    self.close()?;
                }
                Event::Text(text) => {
                    if self.skip_depth > 0 {
                        continue;
                    }
                    let text = text.unescape().map_err(|source| ConfError::Xml {
                        path: self.path_display.clone(),
                        source,
                    })?;
                    if let Some(frame) = self.stack.last_mut() {
                        frame.text.push_str(&text);
                    }
                }
                Event::CData(data) => {
                    if let Some(frame) = self.stack.last_mut() {
                        frame.text.push_str(&String::from_utf8_lossy(&data));
                    }
                }
                Event::Comment(_) | Event::Decl(_) | Event::DocType(_) | Event::PI(_) => (),
                Event::Eof => break,
            }
        }
        if !self.rule_set.is_empty() || self.rule_set.description.is_some() {
            let rule_set = std::mem::replace(&mut self.rule_set, RuleSet::new(""));
            self.config.add_rule_set(rule_set);
        }
        Ok(())
    }

    /// Push a frame for this element; false when the element opens an
    /// ignored `its:` subtree instead.
    fn open(&mut self, start: &quick_xml::events::BytesStart) -> Result<bool, ConfError> {
        let name = start.name();
        let tag = String::from_utf8_lossy(name.as_ref()).into_owned();
        if tag.starts_with("its:") {
            self.skip_depth = 1;
            return Ok(false);
        }
        if !KNOWN_TAGS.contains(&tag.as_str()) {
            return Err(ConfError::UnknownElement {
                element: SmolStr::new(tag),
                path: self.path_display.clone(),
            });
        }
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|source| ConfError::XmlAttribute {
                path: self.path_display.clone(),
                source,
            })?;
            let value = attr.unescape_value().map_err(|source| ConfError::Xml {
                path: self.path_display.clone(),
                source,
            })?;
            attrs.push((
                SmolStr::new(String::from_utf8_lossy(attr.key.as_ref())),
                value.into_owned(),
            ));
        }
        self.stack.push(Frame {
            tag: SmolStr::new(tag),
            attrs,
            text: String::new(),
            children: Vec::new(),
        });
        Ok(true)
    }

    fn close(&mut self) -> Result<(), ConfError> {
        let frame = match self.stack.pop() {
            Some(frame) => frame,
            None => return Ok(()),
        };
        let produced = self.handle(frame)?;
        if let (Some(node), Some(parent)) = (produced, self.stack.last_mut()) {
            parent.children.push(node);
        }
        Ok(())
    }

    fn parent_tag(&self) -> SmolStr {
        self.stack
            .last()
            .map(|frame| frame.tag.clone())
            .unwrap_or_else(|| SmolStr::new("fontconfig"))
    }

    fn handle(&mut self, frame: Frame) -> Result<Option<Node>, ConfError> {
        match frame.tag.as_str() {
            "fontconfig" | "config" | "selectfont" => Ok(None),
            "description" => {
                self.rule_set.domain = frame.attr("domain").map(SmolStr::new);
                self.rule_set.description = Some(SmolStr::new(frame.text.trim()));
                Ok(None)
            }
            "dir" => {
                let path = self.resolve_dir_path(&frame, self.config.env.xdg_data_home.clone());
                let salt = frame.attr("salt").map(SmolStr::new);
                self.config.font_dirs.push(FontDir { path, salt });
                Ok(None)
            }
            "remap-dir" => {
                let as_path = PathBuf::from(frame.required_attr("as-path")?);
                let path = self.resolve_dir_path(&frame, self.config.env.xdg_data_home.clone());
                let salt = frame.attr("salt").map(SmolStr::new);
                self.config.remap_dirs.push(RemapDir {
                    path,
                    as_path,
                    salt,
                });
                Ok(None)
            }
            "cachedir" => {
                let path = self.resolve_dir_path(&frame, self.config.env.xdg_cache_home.clone());
                self.config.cache_dirs.push(path);
                Ok(None)
            }
            "reset-dirs" => {
                self.config.font_dirs.clear();
                Ok(None)
            }
            "include" => {
                self.handle_include(&frame)?;
                Ok(None)
            }
            "rescan" => {
                let exprs = frame.exprs();
                if let Some(Expr::Literal(Value::Int(seconds))) = exprs.first() {
                    self.config.rescan_interval = Some((*seconds).max(0) as u32);
                }
                Ok(None)
            }
            "acceptfont" | "rejectfont" => {
                if self.parent_tag() != "selectfont" {
                    return Err(ConfError::Misplaced {
                        element: frame.tag.clone(),
                        parent: self.parent_tag(),
                    });
                }
                let accept = frame.tag == "acceptfont";
                for node in frame.children {
                    match (accept, node) {
                        (true, Node::Glob(glob)) => self.config.accept_globs.push(glob),
                        (false, Node::Glob(glob)) => self.config.reject_globs.push(glob),
                        (true, Node::Pat(pattern)) => self.config.accept_patterns.push(pattern),
                        (false, Node::Pat(pattern)) => self.config.reject_patterns.push(pattern),
                        _ => (),
                    }
                }
                Ok(None)
            }
            "glob" => Ok(Some(Node::Glob(frame.text.trim().to_string()))),
            "pattern" => {
                let mut pattern = Pattern::new();
                for node in frame.children {
                    if let Node::PatElt(object, value) = node {
                        pattern.add(object, value);
                    }
                }
                Ok(Some(Node::Pat(pattern)))
            }
            "patelt" => {
                let object = self.object_for(frame.required_attr("name")?)?;
                let exprs = frame.exprs();
                let value = match exprs.as_slice() {
                    [Expr::Literal(value)] => value.clone(),
                    other => {
                        return Err(ConfError::WrongArgCount {
                            element: SmolStr::new("patelt"),
                            expected: 1,
                            got: other.len(),
                        })
                    }
                };
                Ok(Some(Node::PatElt(object, value)))
            }
            "match" => self.handle_match(frame).map(|_| None),
            "test" => self.handle_test(frame).map(Some),
            "edit" => self.handle_edit(frame).map(Some),
            "alias" => self.handle_alias(frame).map(|_| None),
            "prefer" => Ok(Some(Node::Prefer(frame.exprs()))),
            "accept" => Ok(Some(Node::Accept(frame.exprs()))),
            "default" => Ok(Some(Node::Default(frame.exprs()))),
            "family" | "string" => Ok(Some(Node::Expr(Expr::Literal(Value::String(
                SmolStr::new(frame.text.trim()),
            ))))),
            "int" => {
                let text = frame.text.trim();
                let value: i32 = text.parse().map_err(|_| ConfError::BadValue {
                    element: frame.tag.clone(),
                    text: text.to_string(),
                })?;
                Ok(Some(Node::Expr(Expr::Literal(Value::Int(value)))))
            }
            "double" => {
                let text = frame.text.trim();
                let value: f64 = text.parse().map_err(|_| ConfError::BadValue {
                    element: frame.tag.clone(),
                    text: text.to_string(),
                })?;
                Ok(Some(Node::Expr(Expr::Literal(Value::Float(value)))))
            }
            "bool" => {
                let text = frame.text.trim();
                let value = Tri::parse(text).ok_or_else(|| ConfError::BadValue {
                    element: frame.tag.clone(),
                    text: text.to_string(),
                })?;
                Ok(Some(Node::Expr(Expr::Literal(Value::Bool(value)))))
            }
            "const" => Ok(Some(Node::Expr(Expr::Const(SmolStr::new(
                frame.text.trim(),
            ))))),
            "name" => {
                let target = match frame.attr("target") {
                    Some(raw) => TestKind::from_str(raw).map_err(|source| {
                        ConfError::BadAttribute {
                            element: frame.tag.clone(),
                            source,
                        }
                    })?,
                    None => TestKind::Default,
                };
                let object = self.object_for(frame.text.trim())?;
                Ok(Some(Node::Expr(Expr::Field { object, target })))
            }
            "matrix" => {
                let exprs = frame.exprs();
                let [xx, xy, yx, yy]: [Expr; 4] =
                    exprs.try_into().map_err(|bad: Vec<Expr>| {
                        ConfError::WrongArgCount {
                            element: SmolStr::new("matrix"),
                            expected: 4,
                            got: bad.len(),
                        }
                    })?;
                Ok(Some(Node::Expr(Expr::MatrixOf {
                    xx: Box::new(xx),
                    xy: Box::new(xy),
                    yx: Box::new(yx),
                    yy: Box::new(yy),
                })))
            }
            "range" => {
                let exprs = frame.exprs();
                let bounds: Vec<f64> = exprs
                    .iter()
                    .filter_map(|expr| match expr {
                        Expr::Literal(value) => value.as_f64(),
                        _ => None,
                    })
                    .collect();
                if bounds.len() != 2 {
                    return Err(ConfError::WrongArgCount {
                        element: SmolStr::new("range"),
                        expected: 2,
                        got: bounds.len(),
                    });
                }
                Ok(Some(Node::Expr(Expr::Literal(Value::Range(Range::new(
                    bounds[0], bounds[1],
                ))))))
            }
            "charset" => {
                let text = frame.text.trim().to_string();
                let mut set = CharSet::new();
                for expr in frame.exprs() {
                    if let Expr::Literal(Value::Int(cp)) = expr {
                        if cp >= 0 {
                            set.add(cp as u32);
                        }
                    }
                }
                if !text.is_empty() {
                    set = set.union(&CharSet::parse(&text)?);
                }
                Ok(Some(Node::Expr(Expr::Literal(Value::CharSet(set)))))
            }
            "langset" => {
                let text = frame.text.trim().to_string();
                let mut set = LangSet::new();
                for expr in frame.exprs() {
                    if let Expr::Literal(Value::String(tag)) = expr {
                        set.add(&tag);
                    }
                }
                if !text.is_empty() {
                    set = set.union(&LangSet::parse(&text));
                }
                Ok(Some(Node::Expr(Expr::Literal(Value::LangSet(set)))))
            }
            "or" => self.fold_binary(frame, BinaryOp::Or).map(Some),
            "and" => self.fold_binary(frame, BinaryOp::And).map(Some),
            "plus" => self.fold_binary(frame, BinaryOp::Plus).map(Some),
            "minus" => self.fold_binary(frame, BinaryOp::Minus).map(Some),
            "times" => self.fold_binary(frame, BinaryOp::Times).map(Some),
            "divide" => self.fold_binary(frame, BinaryOp::Divide).map(Some),
            "eq" => self.exact_binary(frame, BinaryOp::Equal).map(Some),
            "not_eq" => self.exact_binary(frame, BinaryOp::NotEqual).map(Some),
            "less" => self.exact_binary(frame, BinaryOp::Less).map(Some),
            "less_eq" => self.exact_binary(frame, BinaryOp::LessEqual).map(Some),
            "more" => self.exact_binary(frame, BinaryOp::More).map(Some),
            "more_eq" => self.exact_binary(frame, BinaryOp::MoreEqual).map(Some),
            "contains" => self.exact_binary(frame, BinaryOp::Contains).map(Some),
            "not_contains" => self.exact_binary(frame, BinaryOp::NotContains).map(Some),
            "if" => self.cond(frame).map(Some),
            "not" => self.unary(frame, UnaryOp::Not).map(Some),
            "floor" => self.unary(frame, UnaryOp::Floor).map(Some),
            "ceil" => self.unary(frame, UnaryOp::Ceil).map(Some),
            "round" => self.unary(frame, UnaryOp::Round).map(Some),
            "trunc" => self.unary(frame, UnaryOp::Trunc).map(Some),
            other => Err(ConfError::UnknownElement {
                element: SmolStr::new(other),
                path: self.path_display.clone(),
            }),
        }
    }

    fn fold_binary(&self, frame: Frame, op: BinaryOp) -> Result<Node, ConfError> {
        let tag = frame.tag.clone();
        let mut exprs = frame.exprs().into_iter();
        let first = exprs.next().ok_or(ConfError::WrongArgCount {
            element: tag,
            expected: 2,
            got: 0,
        })?;
        let folded = exprs.fold(first, |lhs, rhs| Expr::binary(op, lhs, rhs));
        Ok(Node::Expr(folded))
    }

    fn exact_binary(&self, frame: Frame, op: BinaryOp) -> Result<Node, ConfError> {
        let tag = frame.tag.clone();
        let exprs = frame.exprs();
        let [lhs, rhs]: [Expr; 2] = exprs.try_into().map_err(|bad: Vec<Expr>| {
            ConfError::WrongArgCount {
                element: tag,
                expected: 2,
                got: bad.len(),
            }
        })?;
        Ok(Node::Expr(Expr::binary(op, lhs, rhs)))
    }

    fn unary(&self, frame: Frame, op: UnaryOp) -> Result<Node, ConfError> {
        let tag = frame.tag.clone();
        let exprs = frame.exprs();
        let [arg]: [Expr; 1] = exprs.try_into().map_err(|bad: Vec<Expr>| {
            ConfError::WrongArgCount {
                element: tag,
                expected: 1,
                got: bad.len(),
            }
        })?;
        Ok(Node::Expr(Expr::Unary {
            op,
            arg: Box::new(arg),
        }))
    }

    fn cond(&self, frame: Frame) -> Result<Node, ConfError> {
        let exprs = frame.exprs();
        let [test, then, otherwise]: [Expr; 3] =
            exprs.try_into().map_err(|bad: Vec<Expr>| {
                ConfError::WrongArgCount {
                    element: SmolStr::new("if"),
                    expected: 3,
                    got: bad.len(),
                }
            })?;
        Ok(Node::Expr(Expr::Cond {
            test: Box::new(test),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }))
    }

    fn handle_test(&mut self, frame: Frame) -> Result<Node, ConfError> {
        let bad_attr = |source| ConfError::BadAttribute {
            element: SmolStr::new("test"),
            source,
        };
        let object = self.object_for(frame.required_attr("name")?)?;
        let qual = match frame.attr("qual") {
            Some(raw) => Qualifier::from_str(raw).map_err(bad_attr)?,
            None => Qualifier::Any,
        };
        let op = match frame.attr("compare") {
            Some(raw) => BinaryOp::parse_compare(raw).map_err(bad_attr)?,
            None => BinaryOp::Equal,
        };
        let kind = match frame.attr("target") {
            Some(raw) => TestKind::from_str(raw).map_err(bad_attr)?,
            None => TestKind::Default,
        };
        let ignore_blanks = matches!(frame.attr("ignore-blanks"), Some("true" | "yes" | "1"));
        let exprs = frame.exprs();
        let [expr]: [Expr; 1] = exprs.try_into().map_err(|bad: Vec<Expr>| {
            ConfError::WrongArgCount {
                element: SmolStr::new("test"),
                expected: 1,
                got: bad.len(),
            }
        })?;
        self.typecheck(object, &expr);
        Ok(Node::Test(Test {
            kind,
            qual,
            object,
            op,
            ignore_blanks,
            expr,
        }))
    }

    fn handle_edit(&mut self, frame: Frame) -> Result<Node, ConfError> {
        let bad_attr = |source| ConfError::BadAttribute {
            element: SmolStr::new("edit"),
            source,
        };
        let object = self.object_for(frame.required_attr("name")?)?;
        let op = match frame.attr("mode") {
            Some(raw) => EditOp::from_str(raw).map_err(bad_attr)?,
            None => EditOp::Assign,
        };
        let binding = match frame.attr("binding") {
            Some(raw) => parse_binding(raw).map_err(bad_attr)?,
            None => fontpat::Binding::Weak,
        };
        let mut exprs = frame.exprs();
        let expr = match exprs.len() {
            0 => Expr::List(Vec::new()),
            1 => exprs.remove(0),
            _ => Expr::List(exprs),
        };
        self.typecheck(object, &expr);
        Ok(Node::Edit(Edit {
            object,
            op,
            expr,
            binding,
        }))
    }

    fn handle_match(&mut self, frame: Frame) -> Result<(), ConfError> {
        let kind = match frame.attr("target") {
            Some(raw) => MatchKind::from_str(raw).map_err(|source| ConfError::BadAttribute {
                element: SmolStr::new("match"),
                source,
            })?,
            None => MatchKind::Pattern,
        };
        let mut directive = Directive::default();
        for node in frame.children {
            match node {
                Node::Test(test) => directive.tests.push(test),
                Node::Edit(edit) => {
                    if kind == MatchKind::Scan && edit.object.is_custom() {
                        let object = self
                            .config
                            .object_name(edit.object)
                            .unwrap_or("?")
                            .into();
                        return Err(ConfError::ScanCustomEdit { object });
                    }
                    directive.edits.push(edit);
                }
                _ => (),
            }
        }
        self.rule_set.add(kind, directive);
        Ok(())
    }

    fn handle_alias(&mut self, frame: Frame) -> Result<(), ConfError> {
        let binding = match frame.attr("binding") {
            Some(raw) => parse_binding(raw).map_err(|source| ConfError::BadAttribute {
                element: SmolStr::new("alias"),
                source,
            })?,
            None => fontpat::Binding::Weak,
        };
        let mut family = None;
        let mut prefer = Vec::new();
        let mut accept = Vec::new();
        let mut fallback = Vec::new();
        for node in frame.children {
            match node {
                Node::Expr(expr) => {
                    if family.is_some() {
                        log::warn!("<alias> with multiple families; extra ones ignored");
                    } else {
                        family = Some(expr);
                    }
                }
                Node::Prefer(exprs) => prefer = exprs,
                Node::Accept(exprs) => accept = exprs,
                Node::Default(exprs) => fallback = exprs,
                _ => (),
            }
        }
        let Some(family) = family else {
            return Err(ConfError::MissingAttribute {
                element: SmolStr::new("alias"),
                attr: "family",
            });
        };

        let mut directive = Directive {
            tests: vec![Test {
                kind: TestKind::Default,
                qual: Qualifier::Any,
                object: Object::FAMILY,
                op: BinaryOp::Equal,
                ignore_blanks: true,
                expr: family,
            }],
            edits: Vec::new(),
        };
        for (exprs, op) in [
            (prefer, EditOp::Prepend),
            (accept, EditOp::Append),
            (fallback, EditOp::AppendLast),
        ] {
            if exprs.is_empty() {
                continue;
            }
            directive.edits.push(Edit {
                object: Object::FAMILY,
                op,
                expr: Expr::List(exprs),
                binding,
            });
        }
        if !directive.edits.is_empty() {
            self.rule_set.add(MatchKind::Pattern, directive);
        }
        Ok(())
    }

    fn handle_include(&mut self, frame: &Frame) -> Result<(), ConfError> {
        let ignore_missing = matches!(frame.attr("ignore_missing"), Some("yes" | "true" | "1"));
        let raw = frame.text.trim();
        let path = self.resolve_include_path(raw, frame.attr("prefix"));
        include::load(self.config, &path, ignore_missing)
    }

    /// Resolve a `<dir>`-style path against its prefix.
    fn resolve_dir_path(&self, frame: &Frame, xdg_base: Option<PathBuf>) -> PathBuf {
        let raw = frame.text.trim();
        let path = match frame.attr("prefix") {
            Some("xdg") => match xdg_base {
                Some(base) => base.join(raw),
                None => PathBuf::from(raw),
            },
            Some("relative") => self.base_dir.join(raw),
            Some("cwd") => PathBuf::from(raw),
            _ => self
                .config
                .env
                .expand_home(Path::new(raw))
                .unwrap_or_else(|| PathBuf::from(raw)),
        };
        self.config.env.apply_sysroot(&path)
    }

    fn resolve_include_path(&self, raw: &str, prefix: Option<&str>) -> PathBuf {
        let path = match prefix {
            Some("xdg") => match &self.config.env.xdg_config_home {
                Some(base) => base.join(raw),
                None => PathBuf::from(raw),
            },
            Some("cwd") => PathBuf::from(raw),
            _ => match self.config.env.expand_home(Path::new(raw)) {
                Some(expanded) if raw.starts_with('~') => expanded,
                _ if Path::new(raw).is_absolute() => PathBuf::from(raw),
                // bare relative includes resolve against the including file
                _ => self.base_dir.join(raw),
            },
        };
        self.config.env.apply_sysroot(&path)
    }

    fn object_for(&mut self, name: &str) -> Result<Object, ConfError> {
        Ok(self.config.register_custom(name)?)
    }

    /// Warn (never fail) when an expression cannot produce a type the
    /// object accepts. Int and Float interconvert, numbers promote to
    /// ranges, strings to langsets and back.
    fn typecheck(&self, object: Object, expr: &Expr) {
        let Some(declared) = object.types() else {
            return;
        };
        let Some(inferred) = expr.inferred_types() else {
            return;
        };
        if inferred.is_empty() {
            return;
        }
        let mut widened = declared;
        if declared.intersects(TypeMask::NUMBER) {
            widened |= TypeMask::NUMBER;
        }
        if declared.contains(TypeMask::RANGE) {
            widened |= TypeMask::NUMBER;
        }
        if declared.contains(TypeMask::LANGSET) {
            widened |= TypeMask::STRING;
        }
        if declared.contains(TypeMask::STRING) {
            widened |= TypeMask::LANGSET;
        }
        if !widened.intersects(inferred) {
            log::warn!(
                "{}: expression for '{object}' produces {inferred:?}, wants {declared:?}",
                self.path_display
            );
        }
    }
}
