//! Structural conformance of JSON fixtures against declared shapes.
//!
//! A fixture conforms when every required field is present with a value of
//! the declared type. Types that are referenced but not declared in the
//! module are opaque and accept any value.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

use crate::ast::{
    Declaration, EnumValue, Interface, Keyword, Member, Module, Property, TsType, TypeRef,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationKind {
    MissingField,
    TypeMismatch { expected: String, found: String },
    UnknownField,
    UnknownType { name: String },
    NotInUnion { expected: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// JSON pointer to the offending value; empty for the root.
    pub path: String,
    #[serde(flatten)]
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        match &self.kind {
            ViolationKind::MissingField => write!(f, "{path}: missing required field"),
            ViolationKind::TypeMismatch { expected, found } => {
                write!(f, "{path}: expected {expected}, found {found}")
            }
            ViolationKind::UnknownField => write!(f, "{path}: unknown field"),
            ViolationKind::UnknownType { name } => write!(f, "unknown type '{name}'"),
            ViolationKind::NotInUnion { expected } => {
                write!(f, "{path}: value does not match {expected}")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Report fields that the declared shape does not list.
    pub deny_unknown_fields: bool,
}

pub fn check_value(module: &Module, type_name: &str, value: &Value) -> Vec<Violation> {
    check_value_with(module, type_name, value, Options::default())
}

pub fn check_value_with(
    module: &Module,
    type_name: &str,
    value: &Value,
    options: Options,
) -> Vec<Violation> {
    let mut checker = Checker {
        module,
        options,
        violations: Vec::new(),
    };
    if module.find(type_name).is_none() {
        checker.push(
            String::new(),
            ViolationKind::UnknownType {
                name: type_name.to_string(),
            },
        );
    } else {
        checker.reference(&TsType::reference(type_name), value, "", &[]);
    }
    debug!(
        type_name,
        violations = checker.violations.len(),
        "conformance check finished"
    );
    checker.violations
}

struct Checker<'a> {
    module: &'a Module,
    options: Options,
    violations: Vec<Violation>,
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn child_path(path: &str, key: &str) -> String {
    format!("{path}/{}", key.replace('~', "~0").replace('/', "~1"))
}

fn admits(ty: &TsType, kw: Keyword) -> bool {
    matches!(ty, TsType::Union(v) if v.contains(&TsType::Keyword(kw)))
}

impl Checker<'_> {
    fn push(&mut self, path: String, kind: ViolationKind) {
        self.violations.push(Violation { path, kind });
    }

    fn mismatch(&mut self, path: &str, expected: impl Into<String>, value: &Value) {
        self.push(
            path.to_string(),
            ViolationKind::TypeMismatch {
                expected: expected.into(),
                found: kind_of(value).to_string(),
            },
        );
    }

    fn check(&mut self, ty: &TsType, value: &Value, path: &str, generics: &[String]) {
        match ty {
            TsType::Keyword(kw) => {
                let ok = match kw {
                    Keyword::String => value.is_string(),
                    Keyword::Number => value.is_number(),
                    Keyword::Boolean => value.is_boolean(),
                    Keyword::BigInt => value.is_i64() || value.is_u64() || value.is_string(),
                    Keyword::Any | Keyword::Unknown => true,
                    Keyword::Null | Keyword::Undefined | Keyword::Void => value.is_null(),
                    Keyword::Object => value.is_object() || value.is_array(),
                };
                if !ok {
                    self.mismatch(path, kw.as_str(), value);
                }
            }
            TsType::Reference(_) => self.reference(ty, value, path, generics),
            TsType::Array(inner) => match value.as_array() {
                Some(items) => {
                    for (i, item) in items.iter().enumerate() {
                        self.check(inner, item, &child_path(path, &i.to_string()), generics);
                    }
                }
                None => self.mismatch(path, ty.to_string(), value),
            },
            TsType::Literal(members) => {
                if value.is_object() {
                    let known = literal_fields(members);
                    self.members(members, value, path, generics, known);
                } else {
                    self.mismatch(path, "object", value);
                }
            }
            TsType::StringLiteral(s) => {
                if value.as_str() != Some(s.as_str()) {
                    self.mismatch(path, ty.to_string(), value);
                }
            }
            TsType::NumberLiteral(n) => {
                if value.as_f64() != Some(*n) {
                    self.mismatch(path, ty.to_string(), value);
                }
            }
            TsType::BooleanLiteral(b) => {
                if value.as_bool() != Some(*b) {
                    self.mismatch(path, ty.to_string(), value);
                }
            }
            TsType::Unsupported(_) => {}
            TsType::Union(variants) => {
                let matched = variants.iter().any(|variant| {
                    let mut trial = Checker {
                        module: self.module,
                        options: self.options,
                        violations: Vec::new(),
                    };
                    trial.check(variant, value, path, generics);
                    trial.violations.is_empty()
                });
                if !matched {
                    self.push(
                        path.to_string(),
                        ViolationKind::NotInUnion {
                            expected: ty.to_string(),
                        },
                    );
                }
            }
        }
    }

    fn reference(&mut self, ty: &TsType, value: &Value, path: &str, generics: &[String]) {
        let TsType::Reference(TypeRef { name, args }) = ty else {
            return self.check(ty, value, path, generics);
        };
        if generics.iter().any(|g| g == name) {
            return;
        }
        match (name.as_str(), args.as_slice()) {
            ("BigNumber", []) => {
                if !(value.is_string() || value.is_number()) {
                    self.mismatch(path, "BigNumber", value);
                }
                return;
            }
            ("Promise", [inner]) => return self.check(inner, value, path, generics),
            ("Record" | "Map", [_, inner]) => {
                match value.as_object() {
                    Some(obj) => {
                        for (key, item) in obj {
                            self.check(inner, item, &child_path(path, key), generics);
                        }
                    }
                    None => self.mismatch(path, ty.to_string(), value),
                }
                return;
            }
            _ => {}
        }

        let module = self.module;
        match module.find(name) {
            Some(Declaration::Interface(i)) => self.interface(i, value, path),
            Some(Declaration::Enum(e)) => {
                let values = e.numeric_values().unwrap_or_else(|err| {
                    debug!(%err, "enum values unresolved; matching by name");
                    vec![None; e.members.len()]
                });
                let ok = e
                    .members
                    .iter()
                    .zip(values)
                    .any(|(m, n)| match (&m.value, n) {
                        (Some(EnumValue::String(s)), _) => value.as_str() == Some(s.as_str()),
                        (_, Some(n)) => value.as_i64() == Some(n),
                        (_, None) => value.as_str() == Some(m.name.as_str()),
                    });
                if !ok {
                    self.push(
                        path.to_string(),
                        ViolationKind::NotInUnion {
                            expected: e.name.clone(),
                        },
                    );
                }
            }
            Some(Declaration::Alias(a)) => self.check(&a.ty, value, path, &a.generics),
            // Classes and undeclared references are opaque.
            Some(Declaration::Class(_)) | None => {}
        }
    }

    fn interface(&mut self, i: &Interface, value: &Value, path: &str) {
        if !value.is_object() {
            self.mismatch(path, i.name.clone(), value);
            return;
        }
        let module = self.module;
        let mut visited = HashSet::from([i.name.clone()]);
        for base in &i.extends {
            match module.find(&base.name) {
                Some(Declaration::Interface(b)) => self.inherited(b, value, path, &mut visited),
                Some(Declaration::Alias(a)) => match &a.ty {
                    TsType::Literal(members) => {
                        self.members(members, value, path, &a.generics, None)
                    }
                    other => self.check(other, value, path, &a.generics),
                },
                _ => {}
            }
        }
        let known = interface_fields(module, i, &mut HashSet::new());
        self.members(&i.members, value, path, &i.generics, known);
    }

    /// Checks the own members of a base interface without the unknown-field
    /// pass; the derived interface does that with the full field set.
    fn inherited(
        &mut self,
        i: &Interface,
        value: &Value,
        path: &str,
        visited: &mut HashSet<String>,
    ) {
        if !visited.insert(i.name.clone()) {
            return;
        }
        let module = self.module;
        for base in &i.extends {
            if let Some(Declaration::Interface(b)) = module.find(&base.name) {
                self.inherited(b, value, path, visited);
            }
        }
        self.members(&i.members, value, path, &i.generics, None);
    }

    fn members(
        &mut self,
        members: &[Member],
        value: &Value,
        path: &str,
        generics: &[String],
        known: Option<HashSet<String>>,
    ) {
        let Some(obj) = value.as_object() else {
            return;
        };
        let mut index_value: Option<&TsType> = None;
        for member in members {
            match member {
                Member::Property(p) => self.property(p, obj.get(&p.name), path, generics),
                Member::Index(index) => index_value = Some(&index.value_ty),
            }
        }

        let declared: HashSet<&str> = members
            .iter()
            .filter_map(|m| match m {
                Member::Property(p) => Some(p.name.as_str()),
                Member::Index(_) => None,
            })
            .collect();

        if let Some(value_ty) = index_value {
            for (key, item) in obj {
                if !declared.contains(key.as_str()) {
                    self.check(value_ty, item, &child_path(path, key), generics);
                }
            }
            return;
        }

        if self.options.deny_unknown_fields {
            if let Some(known) = known {
                for key in obj.keys() {
                    if !known.contains(key) {
                        self.push(child_path(path, key), ViolationKind::UnknownField);
                    }
                }
            }
        }
    }

    fn property(&mut self, p: &Property, value: Option<&Value>, path: &str, generics: &[String]) {
        let field_path = child_path(path, &p.name);
        let may_be_absent = p.optional || admits(&p.ty, Keyword::Undefined);
        match value {
            None if may_be_absent => {}
            None => self.push(field_path, ViolationKind::MissingField),
            Some(Value::Null) if admits(&p.ty, Keyword::Null) => {}
            Some(v @ Value::Null) => {
                let expected = p.ty.without_nullish().to_string();
                self.mismatch(&field_path, expected, v);
            }
            Some(v) => {
                let ty = p.ty.without_nullish();
                self.check(&ty, v, &field_path, generics);
            }
        }
    }
}

/// Every field name an interface accepts, including inherited ones. `None`
/// when an opaque base or an index signature makes the set open.
fn interface_fields(
    module: &Module,
    i: &Interface,
    visited: &mut HashSet<String>,
) -> Option<HashSet<String>> {
    if !visited.insert(i.name.clone()) {
        return Some(HashSet::new());
    }
    let mut fields = literal_fields(&i.members)?;
    for base in &i.extends {
        match module.find(&base.name) {
            Some(Declaration::Interface(b)) => fields.extend(interface_fields(module, b, visited)?),
            Some(Declaration::Alias(a)) => match &a.ty {
                TsType::Literal(members) => fields.extend(literal_fields(members)?),
                _ => return None,
            },
            _ => return None,
        }
    }
    Some(fields)
}

fn literal_fields(members: &[Member]) -> Option<HashSet<String>> {
    let mut fields = HashSet::new();
    for member in members {
        match member {
            Member::Property(p) => {
                fields.insert(p.name.clone());
            }
            Member::Index(_) => return None,
        }
    }
    Some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_module;
    use serde_json::json;

    const SHAPES: &str = r#"
export interface Base { id: string }
export interface Child extends Base {
  count: number
  tags?: string[]
  note: string | null
  mode: 'a' | 'b'
}
export enum Color { Red = 'red', Blue = 'blue' }
export interface Painted { color: Color; extra: Opaque }
export interface Bag { [key: string]: number }
export enum Mixed { A = 'a', B = 1, C }
export interface Tagged { tag: Mixed; hook: (x: number) => void }
"#;

    fn module() -> Module {
        parse_module(SHAPES).unwrap()
    }

    #[test]
    fn conforming_child_including_inherited_fields() {
        let v = json!({ "id": "x", "count": 1, "note": null, "mode": "a" });
        assert!(check_value(&module(), "Child", &v).is_empty());
    }

    #[test]
    fn inherited_field_is_required() {
        let v = json!({ "count": 1, "note": "n", "mode": "b" });
        let violations = check_value(&module(), "Child", &v);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "/id");
        assert_eq!(violations[0].kind, ViolationKind::MissingField);
    }

    #[test]
    fn optional_field_present_as_null_is_rejected() {
        let v = json!({ "id": "x", "count": 1, "note": null, "mode": "a", "tags": null });
        let violations = check_value(&module(), "Child", &v);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].to_string(), "/tags: expected string[], found null");
    }

    #[test]
    fn union_and_array_element_errors() {
        let v = json!({ "id": "x", "count": 1, "note": 3, "mode": "c", "tags": ["ok", 2] });
        let paths: Vec<_> = check_value(&module(), "Child", &v)
            .into_iter()
            .map(|v| v.path)
            .collect();
        assert_eq!(paths, vec!["/tags/1", "/note", "/mode"]);
    }

    #[test]
    fn unknown_fields_only_in_strict_mode() {
        let v = json!({ "id": "x", "count": 1, "note": null, "mode": "a", "zzz": true });
        assert!(check_value(&module(), "Child", &v).is_empty());
        let strict = Options {
            deny_unknown_fields: true,
        };
        let violations = check_value_with(&module(), "Child", &v, strict);
        assert_eq!(violations[0].path, "/zzz");
        assert_eq!(violations[0].kind, ViolationKind::UnknownField);
    }

    #[test]
    fn enums_and_opaque_references() {
        let ok = json!({ "color": "red", "extra": [1, 2, { "any": "thing" }] });
        assert!(check_value(&module(), "Painted", &ok).is_empty());
        let bad = json!({ "color": "green", "extra": "anything" });
        let violations = check_value(&module(), "Painted", &bad);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "/color");
    }

    #[test]
    fn index_signatures_check_every_value() {
        let v = json!({ "a": 1, "b": "two" });
        let violations = check_value(&module(), "Bag", &v);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "/b");
    }

    #[test]
    fn mixed_enum_numbers_match_by_value() {
        for ok in [json!("a"), json!(1), json!(2)] {
            let v = json!({ "tag": ok, "hook": "fn" });
            assert!(check_value(&module(), "Tagged", &v).is_empty(), "{v}");
        }
        for bad in [json!("B"), json!("C"), json!(0)] {
            let v = json!({ "tag": bad, "hook": "fn" });
            let violations = check_value(&module(), "Tagged", &v);
            assert_eq!(violations.len(), 1, "{v}");
            assert_eq!(violations[0].path, "/tag");
        }
    }

    #[test]
    fn unknown_root_type() {
        let violations = check_value(&module(), "Nope", &json!({}));
        assert_eq!(violations[0].to_string(), "unknown type 'Nope'");
    }
}
