//! Declaration model produced by the parser.
//!
//! Only the declaration-level subset of TypeScript is represented: interfaces,
//! enums, type aliases and RPC client classes. Expressions are not modelled
//! beyond the single `return await x.call('rpc', [...])` shape that class
//! methods use.

use serde::Serialize;
use std::fmt;

use crate::errors::TranspileError;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Module {
    pub declarations: Vec<Declaration>,
}

impl Module {
    pub fn find(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.name() == name)
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.find(name).is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Declaration {
    Interface(Interface),
    Enum(Enum),
    Class(Class),
    Alias(Alias),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Interface(i) => &i.name,
            Declaration::Enum(e) => &e.name,
            Declaration::Class(c) => &c.name,
            Declaration::Alias(a) => &a.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interface {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub generics: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extends: Vec<TypeRef>,
    pub members: Vec<Member>,
}

impl Interface {
    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.members.iter().filter_map(|m| match m {
            Member::Property(p) => Some(p),
            Member::Index(_) => None,
        })
    }

    pub fn index_signature(&self) -> Option<&IndexSignature> {
        self.members.iter().find_map(|m| match m {
            Member::Index(i) => Some(i),
            Member::Property(_) => None,
        })
    }

    /// An interface whose whole body is `[key: K]: V`.
    pub fn is_map(&self) -> bool {
        self.members.len() == 1 && self.index_signature().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "member", rename_all = "snake_case")]
pub enum Member {
    Property(Property),
    Index(IndexSignature),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    pub name: String,
    pub optional: bool,
    pub readonly: bool,
    pub ty: TsType,
}

impl Property {
    /// Optional either by `?` or by a `| undefined` / `| null` union.
    pub fn is_nullable(&self) -> bool {
        self.optional || self.ty.is_optional_union()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexSignature {
    pub key_name: String,
    pub key_ty: TsType,
    pub value_ty: TsType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeRef {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<TsType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Keyword {
    String,
    Number,
    Boolean,
    BigInt,
    Any,
    Unknown,
    Null,
    Undefined,
    Void,
    Object,
}

impl Keyword {
    pub fn from_ident(ident: &str) -> Option<Self> {
        Some(match ident {
            "string" => Keyword::String,
            "number" => Keyword::Number,
            "boolean" => Keyword::Boolean,
            "bigint" => Keyword::BigInt,
            "any" => Keyword::Any,
            "unknown" => Keyword::Unknown,
            "null" => Keyword::Null,
            "undefined" => Keyword::Undefined,
            "void" => Keyword::Void,
            "object" => Keyword::Object,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::String => "string",
            Keyword::Number => "number",
            Keyword::Boolean => "boolean",
            Keyword::BigInt => "bigint",
            Keyword::Any => "any",
            Keyword::Unknown => "unknown",
            Keyword::Null => "null",
            Keyword::Undefined => "undefined",
            Keyword::Void => "void",
            Keyword::Object => "object",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "of", rename_all = "snake_case")]
pub enum TsType {
    Keyword(Keyword),
    Reference(TypeRef),
    Array(Box<TsType>),
    Literal(Vec<Member>),
    Union(Vec<TsType>),
    StringLiteral(String),
    NumberLiteral(f64),
    BooleanLiteral(bool),
    /// A type the model has no shape for (functions, tuples, intersections,
    /// mapped types, ...), kept as its source text.
    Unsupported(String),
}

impl TsType {
    pub fn reference(name: impl Into<String>) -> Self {
        TsType::Reference(TypeRef {
            name: name.into(),
            args: Vec::new(),
        })
    }

    fn is_nullish(&self) -> bool {
        matches!(
            self,
            TsType::Keyword(Keyword::Undefined) | TsType::Keyword(Keyword::Null)
        )
    }

    /// `T | undefined` or `T | null`.
    pub fn is_optional_union(&self) -> bool {
        match self {
            TsType::Union(variants) => variants.iter().any(TsType::is_nullish),
            _ => false,
        }
    }

    /// Strips `undefined`/`null` from a union. A union that collapses to a
    /// single variant is returned as that variant.
    pub fn without_nullish(&self) -> TsType {
        match self {
            TsType::Union(variants) => {
                let mut rest: Vec<TsType> = variants
                    .iter()
                    .filter(|v| !v.is_nullish())
                    .cloned()
                    .collect();
                match rest.len() {
                    0 => TsType::Keyword(Keyword::Undefined),
                    1 => rest.remove(0),
                    _ => TsType::Union(rest),
                }
            }
            other => other.clone(),
        }
    }

    /// `Promise<T>` → `T`.
    pub fn unwrap_promise(&self) -> &TsType {
        match self {
            TsType::Reference(TypeRef { name, args }) if name == "Promise" && args.len() == 1 => {
                &args[0]
            }
            other => other,
        }
    }

    /// Returns the string values when every variant is a string literal.
    pub fn string_literal_union(&self) -> Option<Vec<&str>> {
        match self {
            TsType::Union(variants) => variants
                .iter()
                .map(|v| match v {
                    TsType::StringLiteral(s) => Some(s.as_str()),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }
}

/// Renders the type back in TypeScript syntax, for messages.
impl fmt::Display for TsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TsType::Keyword(k) => f.write_str(k.as_str()),
            TsType::Reference(r) => {
                f.write_str(&r.name)?;
                if !r.args.is_empty() {
                    let args: Vec<String> = r.args.iter().map(ToString::to_string).collect();
                    write!(f, "<{}>", args.join(", "))?;
                }
                Ok(())
            }
            TsType::Array(inner) => match inner.as_ref() {
                TsType::Union(_) => write!(f, "({inner})[]"),
                _ => write!(f, "{inner}[]"),
            },
            TsType::Literal(_) => f.write_str("object"),
            TsType::Union(variants) => {
                let parts: Vec<String> = variants.iter().map(ToString::to_string).collect();
                f.write_str(&parts.join(" | "))
            }
            TsType::StringLiteral(s) => write!(f, "'{s}'"),
            TsType::NumberLiteral(n) => write!(f, "{n}"),
            TsType::BooleanLiteral(b) => write!(f, "{b}"),
            TsType::Unsupported(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Enum {
    pub name: String,
    pub members: Vec<EnumMember>,
}

impl Enum {
    /// No string initialisers; members without one count up from the
    /// previous value.
    pub fn is_numeric(&self) -> bool {
        !self.members.is_empty()
            && self
                .members
                .iter()
                .all(|m| !matches!(m.value, Some(EnumValue::String(_))))
    }

    /// Numeric value of each member. A member without an initialiser is one
    /// more than the member before it, or zero when it comes first. String
    /// members, and uninitialised members that follow one, have none.
    pub fn numeric_values(&self) -> Result<Vec<Option<i64>>, TranspileError> {
        let mut values: Vec<Option<i64>> = Vec::with_capacity(self.members.len());
        for m in &self.members {
            let value = match &m.value {
                Some(EnumValue::Number(n)) => Some(*n),
                Some(EnumValue::String(_)) => None,
                None => match values.last() {
                    None => Some(0),
                    Some(None) => None,
                    Some(Some(prev)) => Some(prev.checked_add(1).ok_or_else(|| {
                        TranspileError::EnumOverflow {
                            declaration: self.name.clone(),
                            member: m.name.clone(),
                        }
                    })?),
                },
            };
            values.push(value);
        }
        Ok(values)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumMember {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<EnumValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EnumValue {
    String(String),
    Number(i64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Class {
    pub name: String,
    pub methods: Vec<Method>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Method {
    pub name: String,
    pub params: Vec<Param>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<TsType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call: Option<RpcCall>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ty: Option<TsType>,
    pub optional: bool,
    pub has_default: bool,
}

/// `return await this.client.call('getvault', [id, options.verbose], 'number')`
/// is recorded as `method = "getvault"`, `args = [["id"], ["options", "verbose"]]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcCall {
    pub method: String,
    pub args: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alias {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub generics: Vec<String>,
    pub ty: TsType,
}
