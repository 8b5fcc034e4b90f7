//! Patterns: multi-valued typed maps keyed by object id.
//!
//! Slots are kept in a BTreeMap so iteration order is the object id order,
//! which makes serialisation and hashing deterministic. Family values are
//! additionally indexed by their canonical fold for the matcher and for
//! rule tests over `family`.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::{
    object::Object,
    value::{family_fold, Value},
};

/// How strongly a value participates in scoring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Binding {
    Weak,
    Strong,
    /// Inherit from the neighbouring value at the insertion point.
    Same,
}

/// One value plus its binding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundValue {
    pub value: Value,
    pub binding: Binding,
}

impl BoundValue {
    pub fn weak(value: Value) -> BoundValue {
        BoundValue {
            value,
            binding: Binding::Weak,
        }
    }

    pub fn strong(value: Value) -> BoundValue {
        BoundValue {
            value,
            binding: Binding::Strong,
        }
    }
}

/// A bag of typed attributes describing a font or a query.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(from = "PatternSerdeRepr", into = "PatternSerdeRepr")]
pub struct Pattern {
    elts: BTreeMap<Object, Vec<BoundValue>>,
    // folded family name -> indices into the family value list
    family_index: HashMap<String, Vec<usize>>,
}

impl Pattern {
    pub fn new() -> Pattern {
        Pattern::default()
    }

    /// Append a value with a strong binding. Returns false (and drops the
    /// value) if it does not fit the object's declared type.
    pub fn add(&mut self, object: Object, value: Value) -> bool {
        self.add_with_binding(object, value, Binding::Strong, true)
    }

    /// Prepend or append one value. `Binding::Same` inherits from the value
    /// currently at the insertion end, defaulting to weak in an empty list.
    pub fn add_with_binding(
        &mut self,
        object: Object,
        value: Value,
        binding: Binding,
        append: bool,
    ) -> bool {
        if !self.value_fits(object, &value) {
            return false;
        }
        let list = self.elts.entry(object).or_default();
        let neighbour = if append { list.last() } else { list.first() };
        let binding = resolve_binding(binding, neighbour);
        let bound = BoundValue { value, binding };
        if append {
            list.push(bound);
        } else {
            list.insert(0, bound);
        }
        if object == Object::FAMILY {
            self.rebuild_family_index();
        }
        true
    }

    /// Insert a run of values at `position` (after it when `append`).
    /// Out-of-range positions clamp to the list ends.
    pub fn insert(
        &mut self,
        object: Object,
        position: usize,
        append: bool,
        values: Vec<BoundValue>,
    ) -> bool {
        if values.iter().any(|v| !self.value_fits(object, &v.value)) {
            return false;
        }
        let list = self.elts.entry(object).or_default();
        let at = if list.is_empty() {
            0
        } else if append {
            (position + 1).min(list.len())
        } else {
            position.min(list.len())
        };
        let neighbour = if at > 0 {
            list.get(at - 1)
        } else {
            list.first()
        };
        let neighbour_binding = resolve_binding(Binding::Same, neighbour);
        for (offset, mut bound) in values.into_iter().enumerate() {
            if bound.binding == Binding::Same {
                bound.binding = neighbour_binding;
            }
            list.insert(at + offset, bound);
        }
        if object == Object::FAMILY {
            self.rebuild_family_index();
        }
        true
    }

    /// Replace the value at `index` in place, keeping position.
    pub fn set_at(
        &mut self,
        object: Object,
        index: usize,
        value: Value,
        binding: Binding,
    ) -> bool {
        if !self.value_fits(object, &value) {
            return false;
        }
        let Some(list) = self.elts.get_mut(&object) else {
            return false;
        };
        let Some(slot) = list.get_mut(index) else {
            return false;
        };
        let binding = match binding {
            Binding::Same => slot.binding,
            other => other,
        };
        *slot = BoundValue { value, binding };
        if object == Object::FAMILY {
            self.rebuild_family_index();
        }
        true
    }

    /// Remove every value for `object`.
    pub fn del(&mut self, object: Object) -> bool {
        let had = self.elts.remove(&object).is_some();
        if had && object == Object::FAMILY {
            self.family_index.clear();
        }
        had
    }

    /// Remove the value at `index`, dropping the slot once empty.
    pub fn del_at(&mut self, object: Object, index: usize) -> bool {
        let Some(list) = self.elts.get_mut(&object) else {
            return false;
        };
        if index >= list.len() {
            return false;
        }
        list.remove(index);
        self.canonicalize(object);
        if object == Object::FAMILY {
            self.rebuild_family_index();
        }
        true
    }

    /// Drop the slot entirely if edits left it empty.
    pub fn canonicalize(&mut self, object: Object) {
        if self.elts.get(&object).is_some_and(|list| list.is_empty()) {
            self.elts.remove(&object);
        }
    }

    pub fn get(&self, object: Object, index: usize) -> Option<&Value> {
        self.elts
            .get(&object)
            .and_then(|list| list.get(index))
            .map(|bound| &bound.value)
    }

    pub fn values(&self, object: Object) -> &[BoundValue] {
        self.elts.get(&object).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, object: Object) -> bool {
        self.elts.contains_key(&object)
    }

    /// Objects present, in stable id order.
    pub fn objects(&self) -> impl Iterator<Item = Object> + '_ {
        self.elts.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.elts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elts.is_empty()
    }

    /// A new pattern holding only the listed objects.
    pub fn filter(&self, objects: &[Object]) -> Pattern {
        let mut out = Pattern::new();
        for object in objects {
            if let Some(list) = self.elts.get(object) {
                out.elts.insert(*object, list.clone());
            }
        }
        out.rebuild_family_index();
        out
    }

    /// Indices into the family list whose folded name equals `folded`.
    pub fn family_matches(&self, folded: &str) -> &[usize] {
        self.family_index
            .get(folded)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of distinct folded family names.
    pub fn family_count(&self) -> usize {
        self.family_index.len()
    }

    /// Deterministic hash over the listed objects (all objects when None),
    /// folding per-value byte representations in iteration order.
    pub fn hash(&self, objects: Option<&[Object]>) -> u64 {
        let mut hasher = Fnv1a::new();
        match objects {
            Some(objects) => {
                let mut objects: Vec<Object> = objects.to_vec();
                objects.sort();
                for object in objects {
                    if let Some(list) = self.elts.get(&object) {
                        hash_slot(&mut hasher, object, list);
                    }
                }
            }
            None => {
                for (object, list) in &self.elts {
                    hash_slot(&mut hasher, *object, list);
                }
            }
        }
        hasher.finish()
    }

    fn value_fits(&self, object: Object, value: &Value) -> bool {
        match object.types() {
            // custom objects carry no declared type
            None => true,
            Some(types) => {
                if types.admits(value.type_mask()) {
                    true
                } else {
                    log::warn!(
                        "dropping {} value for '{object}' (accepts {types:?})",
                        value.type_name()
                    );
                    false
                }
            }
        }
    }

    fn rebuild_family_index(&mut self) {
        self.family_index.clear();
        let entries: Vec<(usize, String)> = self
            .values(Object::FAMILY)
            .iter()
            .enumerate()
            .filter_map(|(idx, bound)| match &bound.value {
                Value::String(name) => Some((idx, family_fold(name))),
                _ => None,
            })
            .collect();
        for (idx, folded) in entries {
            self.family_index.entry(folded).or_default().push(idx);
        }
    }
}

fn resolve_binding(binding: Binding, neighbour: Option<&BoundValue>) -> Binding {
    match binding {
        Binding::Same => neighbour.map(|b| b.binding).unwrap_or(Binding::Weak),
        other => other,
    }
}

impl Clone for Pattern {
    fn clone(&self) -> Self {
        let mut out = Pattern {
            elts: self.elts.clone(),
            family_index: HashMap::new(),
        };
        out.rebuild_family_index();
        out
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Pattern) -> bool {
        self.elts == other.elts
    }
}

#[derive(Serialize, Deserialize)]
struct PatternSerdeRepr {
    elts: BTreeMap<Object, Vec<BoundValue>>,
}

impl From<PatternSerdeRepr> for Pattern {
    fn from(repr: PatternSerdeRepr) -> Pattern {
        let mut pattern = Pattern {
            elts: repr.elts,
            family_index: HashMap::new(),
        };
        pattern.rebuild_family_index();
        pattern
    }
}

impl From<Pattern> for PatternSerdeRepr {
    fn from(pattern: Pattern) -> PatternSerdeRepr {
        PatternSerdeRepr { elts: pattern.elts }
    }
}

struct Fnv1a(u64);

impl Fnv1a {
    fn new() -> Fnv1a {
        Fnv1a(0xcbf2_9ce4_8422_2325)
    }

    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.0 ^= *byte as u64;
            self.0 = self.0.wrapping_mul(0x100_0000_01b3);
        }
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

fn hash_slot(hasher: &mut Fnv1a, object: Object, list: &[BoundValue]) {
    hasher.write(&object.raw().to_le_bytes());
    hasher.write(&(list.len() as u32).to_le_bytes());
    for bound in list {
        hash_value(hasher, &bound.value);
    }
}

fn hash_value(hasher: &mut Fnv1a, value: &Value) {
    hasher.write(&[value.type_mask().bits() as u8]);
    match value {
        Value::Int(v) => hasher.write(&v.to_le_bytes()),
        Value::Float(v) => hasher.write(&v.to_bits().to_le_bytes()),
        Value::Bool(v) => hasher.write(&[*v as u8]),
        Value::String(s) => hasher.write(s.as_bytes()),
        Value::Matrix(m) => {
            for v in [m.xx, m.xy, m.yx, m.yy] {
                hasher.write(&v.to_bits().to_le_bytes());
            }
        }
        Value::Range(r) => {
            hasher.write(&r.begin.to_bits().to_le_bytes());
            hasher.write(&r.end.to_bits().to_le_bytes());
        }
        Value::CharSet(cs) => {
            for (first, last) in cs.ranges() {
                hasher.write(&first.to_le_bytes());
                hasher.write(&last.to_le_bytes());
            }
        }
        Value::LangSet(ls) => {
            for tag in ls.langs() {
                hasher.write(tag.as_bytes());
                hasher.write(&[b'|']);
            }
        }
    }
}

/// An ordered collection of font patterns.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FontSet {
    pub fonts: Vec<Pattern>,
}

impl FontSet {
    pub fn new() -> FontSet {
        FontSet::default()
    }

    pub fn push(&mut self, font: Pattern) {
        self.fonts.push(font);
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.fonts.iter()
    }
}

impl FromIterator<Pattern> for FontSet {
    fn from_iter<T: IntoIterator<Item = Pattern>>(iter: T) -> Self {
        FontSet {
            fonts: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Tri;
    use pretty_assertions::assert_eq;

    #[test]
    fn add_and_get() {
        let mut p = Pattern::new();
        assert!(p.add(Object::FAMILY, "DejaVu Sans".into()));
        assert!(p.add(Object::WEIGHT, Value::Int(200)));
        assert_eq!(p.get(Object::FAMILY, 0), Some(&"DejaVu Sans".into()));
        assert_eq!(p.get(Object::WEIGHT, 0), Some(&Value::Int(200)));
        assert_eq!(p.get(Object::WEIGHT, 1), None);
    }

    #[test]
    fn invalid_values_are_dropped() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut p = Pattern::new();
        assert!(!p.add(Object::FAMILY, Value::Int(12)));
        assert!(!p.has(Object::FAMILY));
        // weight takes ints, floats and ranges but not bools
        assert!(!p.add(Object::WEIGHT, Value::Bool(Tri::True)));
        assert!(p.add(Object::WEIGHT, Value::Float(80.0)));
    }

    #[test]
    fn custom_objects_take_anything() {
        let mut p = Pattern::new();
        assert!(p.add(Object::custom(0), Value::Bool(Tri::True)));
        assert!(p.add(Object::custom(0), "text".into()));
    }

    #[test]
    fn same_binding_inherits() {
        let mut p = Pattern::new();
        p.add_with_binding(Object::FAMILY, "A".into(), Binding::Weak, true);
        p.add_with_binding(Object::FAMILY, "B".into(), Binding::Same, true);
        assert_eq!(p.values(Object::FAMILY)[1].binding, Binding::Weak);

        let mut q = Pattern::new();
        q.add_with_binding(Object::FAMILY, "A".into(), Binding::Same, true);
        assert_eq!(q.values(Object::FAMILY)[0].binding, Binding::Weak);
    }

    #[test]
    fn prepend_goes_first() {
        let mut p = Pattern::new();
        p.add(Object::FAMILY, "Helvetica".into());
        p.add_with_binding(Object::FAMILY, "Arial".into(), Binding::Strong, false);
        assert_eq!(p.get(Object::FAMILY, 0), Some(&"Arial".into()));
        assert_eq!(p.get(Object::FAMILY, 1), Some(&"Helvetica".into()));
    }

    #[test]
    fn del_and_canonicalize() {
        let mut p = Pattern::new();
        p.add(Object::FAMILY, "A".into());
        p.add(Object::FAMILY, "B".into());
        assert!(p.del_at(Object::FAMILY, 0));
        assert_eq!(p.values(Object::FAMILY).len(), 1);
        assert!(p.del_at(Object::FAMILY, 0));
        assert!(!p.has(Object::FAMILY));
        assert!(!p.del(Object::FAMILY));
    }

    #[test]
    fn family_index_folds() {
        let mut p = Pattern::new();
        p.add(Object::FAMILY, "Deja Vu Sans".into());
        p.add(Object::FAMILY, "DejaVu Serif".into());
        assert_eq!(p.family_matches("dejavusans"), &[0]);
        assert_eq!(p.family_matches("dejavuserif"), &[1]);
        assert!(p.family_matches("arial").is_empty());
        assert_eq!(p.family_count(), 2);
    }

    #[test]
    fn family_index_survives_clone() {
        let mut p = Pattern::new();
        p.add(Object::FAMILY, "Arial".into());
        let q = p.clone();
        assert_eq!(q.family_matches("arial"), &[0]);
    }

    #[test]
    fn hash_is_stable_across_clones() {
        let mut p = Pattern::new();
        p.add(Object::FAMILY, "Arial".into());
        p.add(Object::WEIGHT, Value::Int(80));
        p.add(Object::LANG, Value::LangSet("en".into()));
        let q = p.clone();
        assert_eq!(p.hash(None), q.hash(None));
    }

    #[test]
    fn hash_selector_ignores_other_objects() {
        let mut p = Pattern::new();
        p.add(Object::FAMILY, "Arial".into());
        p.add(Object::WEIGHT, Value::Int(80));
        let mut q = Pattern::new();
        q.add(Object::FAMILY, "Arial".into());
        q.add(Object::WEIGHT, Value::Int(200));
        let selector = [Object::FAMILY];
        assert_eq!(p.hash(Some(&selector)), q.hash(Some(&selector)));
        assert_ne!(p.hash(None), q.hash(None));
    }

    #[test]
    fn serde_rebuilds_family_index() {
        let mut p = Pattern::new();
        p.add(Object::FAMILY, "DejaVu Sans".into());
        p.add(Object::SIZE, Value::Float(12.5));
        let bin = bincode::serialize(&p).unwrap();
        let q: Pattern = bincode::deserialize(&bin).unwrap();
        assert_eq!(p, q);
        assert_eq!(q.family_matches("dejavusans"), &[0]);
    }

    #[test]
    fn font_sets_round_trip_through_yaml() {
        let mut font = Pattern::new();
        font.add(Object::FAMILY, "DejaVu Sans".into());
        font.add(Object::WEIGHT, Value::Int(80));
        font.add(
            Object::CHARSET,
            Value::CharSet(crate::CharSet::from_ranges([(0x41, 0x5A)])),
        );
        font.add(Object::LANG, Value::LangSet("en".into()));
        let set: FontSet = [font].into_iter().collect();
        let yaml = serde_yaml::to_string(&set).unwrap();
        let back: FontSet = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(set, back);
    }

    #[test]
    fn filter_keeps_selected_objects() {
        let mut p = Pattern::new();
        p.add(Object::FAMILY, "Arial".into());
        p.add(Object::WEIGHT, Value::Int(80));
        let f = p.filter(&[Object::FAMILY]);
        assert!(f.has(Object::FAMILY));
        assert!(!f.has(Object::WEIGHT));
        assert_eq!(f.family_matches("arial"), &[0]);
    }
}
