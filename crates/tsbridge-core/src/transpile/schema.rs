//! JSON Schema (draft 2020-12) backend. One document per module, with one
//! `$defs` entry per declaration.

use serde_json::{json, Map, Value};
use tracing::debug;

use super::{Body, Output, Reporter, Transpiler};
use crate::ast::{Declaration, Enum, EnumValue, Keyword, Member, Module, TsType, TypeRef};
use crate::config::Config;
use crate::errors::TranspileError;

pub const DIALECT: &str = "https://json-schema.org/draft/2020-12/schema";

pub struct SchemaTranspiler {
    config: Config,
}

impl SchemaTranspiler {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl Transpiler for SchemaTranspiler {
    fn transpile(&self, module: &Module) -> Result<Output, TranspileError> {
        let mut reporter = Reporter::new(self.config.strict);
        let mut defs = Map::new();
        for decl in &module.declarations {
            debug!(name = decl.name(), "emitting schema");
            let schema = match decl {
                Declaration::Interface(i) => {
                    let scope = Scope {
                        module,
                        generics: &i.generics,
                    };
                    let own = scope.object(&i.members, i.extends.is_empty());
                    if i.extends.is_empty() {
                        own
                    } else {
                        let mut all_of: Vec<Value> =
                            i.extends.iter().map(|b| scope.reference(b)).collect();
                        all_of.push(own);
                        json!({ "allOf": all_of })
                    }
                }
                Declaration::Enum(e) => enumeration(e)?,
                Declaration::Alias(a) => Scope {
                    module,
                    generics: &a.generics,
                }
                .ty(&a.ty),
                Declaration::Class(c) => {
                    reporter.unsupported(
                        &c.name,
                        "classes have no JSON Schema equivalent; skipped",
                    )?;
                    continue;
                }
            };
            defs.insert(decl.name().to_string(), schema);
        }

        let doc = json!({
            "$schema": DIALECT,
            "$defs": defs,
        });
        Ok(reporter.finish(Body::Json(doc)))
    }
}

struct Scope<'a> {
    module: &'a Module,
    generics: &'a [String],
}

impl Scope<'_> {
    fn object(&self, members: &[Member], closed: bool) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        let mut additional: Option<Value> = None;

        for member in members {
            match member {
                Member::Property(p) => {
                    let ty = if p.ty.is_optional_union() {
                        strip_undefined(&p.ty)
                    } else {
                        p.ty.clone()
                    };
                    properties.insert(p.name.clone(), self.ty(&ty));
                    let optional = p.optional || may_be_undefined(&p.ty);
                    if !optional {
                        required.push(Value::String(p.name.clone()));
                    }
                }
                Member::Index(index) => additional = Some(self.ty(&index.value_ty)),
            }
        }

        let mut schema = Map::new();
        schema.insert("type".into(), json!("object"));
        schema.insert("properties".into(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".into(), Value::Array(required));
        }
        match additional {
            Some(value) => {
                schema.insert("additionalProperties".into(), value);
            }
            None if closed => {
                schema.insert("additionalProperties".into(), json!(false));
            }
            None => {}
        }
        Value::Object(schema)
    }

    fn reference(&self, r: &TypeRef) -> Value {
        let name = r.name.as_str();
        if self.generics.iter().any(|g| g == name) {
            return json!({});
        }
        match (name, r.args.as_slice()) {
            ("BigNumber", []) => return json!({ "type": ["string", "number"] }),
            ("Promise", [inner]) => return self.ty(inner),
            ("Record" | "Map", [_, value]) => {
                return json!({ "type": "object", "additionalProperties": self.ty(value) })
            }
            _ => {}
        }
        if self.module.is_declared(name) {
            json!({ "$ref": format!("#/$defs/{name}") })
        } else {
            // Opaque: declared elsewhere, so any value is accepted.
            json!({})
        }
    }

    fn ty(&self, ty: &TsType) -> Value {
        match ty {
            TsType::Keyword(kw) => match kw {
                Keyword::String => json!({ "type": "string" }),
                Keyword::Number => json!({ "type": "number" }),
                Keyword::Boolean => json!({ "type": "boolean" }),
                Keyword::BigInt => json!({ "type": "integer" }),
                Keyword::Object => json!({ "type": "object" }),
                Keyword::Null => json!({ "type": "null" }),
                Keyword::Any | Keyword::Unknown | Keyword::Undefined | Keyword::Void => json!({}),
            },
            TsType::Reference(r) => self.reference(r),
            TsType::Array(inner) => json!({ "type": "array", "items": self.ty(inner) }),
            TsType::Literal(members) => self.object(members, true),
            TsType::StringLiteral(s) => json!({ "const": s }),
            TsType::NumberLiteral(n) => json!({ "const": n }),
            TsType::BooleanLiteral(b) => json!({ "const": b }),
            TsType::Union(variants) => {
                if let Some(values) = ty.string_literal_union() {
                    return json!({ "type": "string", "enum": values });
                }
                let any_of: Vec<Value> = variants.iter().map(|v| self.ty(v)).collect();
                json!({ "anyOf": any_of })
            }
            TsType::Unsupported(_) => json!({}),
        }
    }
}

fn may_be_undefined(ty: &TsType) -> bool {
    matches!(ty, TsType::Union(v) if v.contains(&TsType::Keyword(Keyword::Undefined)))
}

fn strip_undefined(ty: &TsType) -> TsType {
    match ty {
        TsType::Union(variants) => {
            let mut rest: Vec<TsType> = variants
                .iter()
                .filter(|v| !matches!(v, TsType::Keyword(Keyword::Undefined)))
                .cloned()
                .collect();
            if rest.len() == 1 {
                rest.remove(0)
            } else {
                TsType::Union(rest)
            }
        }
        other => other.clone(),
    }
}

fn enumeration(e: &Enum) -> Result<Value, TranspileError> {
    let values: Vec<Value> = e
        .members
        .iter()
        .zip(e.numeric_values()?)
        .map(|(m, n)| match (&m.value, n) {
            (Some(EnumValue::String(s)), _) => Value::from(s.as_str()),
            (_, Some(n)) => Value::from(n),
            (_, None) => Value::from(m.name.as_str()),
        })
        .collect();
    Ok(json!({ "enum": values }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_module;

    fn defs(src: &str) -> Value {
        let module = parse_module(src).unwrap();
        let out = SchemaTranspiler::new(Config::default())
            .transpile(&module)
            .unwrap();
        match out.body {
            Body::Json(doc) => doc["$defs"].clone(),
            Body::Items(_) => panic!("expected json body"),
        }
    }

    #[test]
    fn required_and_optional_properties() {
        let d = defs(
            "export interface A { a: string; b?: number; c: boolean | undefined; d: string | null }",
        );
        assert_eq!(d["A"]["required"], json!(["a", "d"]));
        assert_eq!(d["A"]["additionalProperties"], json!(false));
        assert_eq!(d["A"]["properties"]["c"], json!({ "type": "boolean" }));
        assert_eq!(
            d["A"]["properties"]["d"]["anyOf"][1],
            json!({ "type": "null" })
        );
    }

    #[test]
    fn extends_uses_all_of_and_opaque_bases() {
        let d = defs(
            "export interface Child extends Parent { x: Local }\nexport interface Local { y: string }",
        );
        assert_eq!(d["Child"]["allOf"][0], json!({}));
        assert_eq!(
            d["Child"]["allOf"][1]["properties"]["x"],
            json!({ "$ref": "#/$defs/Local" })
        );
        assert!(d["Child"]["allOf"][1].get("additionalProperties").is_none());
    }

    #[test]
    fn enums_and_string_unions() {
        let d = defs("export enum E { A = 'a', B = 'b' }\nexport type K = 'x' | 'y'");
        assert_eq!(d["E"], json!({ "enum": ["a", "b"] }));
        assert_eq!(d["K"], json!({ "type": "string", "enum": ["x", "y"] }));
    }

    #[test]
    fn mixed_enum_lists_resolved_numbers() {
        let d = defs("export enum Mixed { A = 'a', B = 1, C }");
        assert_eq!(d["Mixed"], json!({ "enum": ["a", 1, 2] }));
    }
}
