//! Rust backend: serde structs and enums, plus async RPC client methods for
//! classes.

use std::collections::HashSet;
use std::fmt::Write as _;
use tracing::debug;

use super::{Body, Output, Reporter, Transpiler};
use crate::ast::{
    Alias, Class, Declaration, Enum, EnumValue, Interface, Keyword, Member, Method, Module,
    Property, TsType, TypeRef,
};
use crate::config::Config;
use crate::errors::TranspileError;
use crate::naming::{pascal, rust_field, rust_variant};

const INDENT: &str = "    ";

pub struct RustTranspiler {
    config: Config,
}

impl RustTranspiler {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl Transpiler for RustTranspiler {
    fn transpile(&self, module: &Module) -> Result<Output, TranspileError> {
        let mut emitter = Emitter {
            config: &self.config,
            reporter: Reporter::new(self.config.strict),
            items: Vec::new(),
            uses_hashmap: false,
            uses_serde_repr: false,
        };
        for decl in &module.declarations {
            debug!(name = decl.name(), "emitting rust");
            match decl {
                Declaration::Interface(i) => emitter.interface(i)?,
                Declaration::Enum(e) => emitter.enumeration(e)?,
                Declaration::Alias(a) => emitter.alias(a)?,
                Declaration::Class(c) => emitter.class(c)?,
            }
        }

        let mut items = vec![emitter.preamble()];
        items.append(&mut emitter.items);
        Ok(emitter.reporter.finish(Body::Items(items)))
    }
}

struct Emitter<'a> {
    config: &'a Config,
    reporter: Reporter,
    items: Vec<String>,
    uses_hashmap: bool,
    uses_serde_repr: bool,
}

impl Emitter<'_> {
    fn preamble(&self) -> String {
        let mut out = String::new();
        if self.uses_hashmap {
            out.push_str("use std::collections::HashMap;\n\n");
        }
        out.push_str("use serde::{Deserialize, Serialize};\n");
        if self.uses_serde_repr {
            out.push_str("use serde_repr::{Deserialize_repr, Serialize_repr};\n");
        }
        out
    }

    fn derive_line(&self) -> String {
        format!("#[derive({})]\n", self.config.rust.derives.join(", "))
    }

    fn interface(&mut self, i: &Interface) -> Result<(), TranspileError> {
        let name = with_generics(&i.name, &i.generics);
        if i.is_map() && i.extends.is_empty() {
            let map = self.index_map(&i.name, i)?;
            let mut out = self.derive_line();
            let _ = writeln!(out, "pub struct {name}(pub {map});");
            self.items.push(out);
            return Ok(());
        }
        self.structure(&i.name, &name, &i.extends, &i.members)
    }

    fn index_map(&mut self, owner: &str, i: &Interface) -> Result<String, TranspileError> {
        let Some(index) = i.index_signature() else {
            return Ok("serde_json::Value".into());
        };
        let key = self.map_key(owner, &index.key_ty)?;
        let value = self.map_type(owner, &index.key_name, &index.value_ty)?;
        self.uses_hashmap = true;
        Ok(format!("HashMap<{key}, {value}>"))
    }

    fn map_key(&self, owner: &str, key_ty: &TsType) -> Result<String, TranspileError> {
        match key_ty {
            TsType::Keyword(Keyword::String) => Ok("String".to_string()),
            TsType::Keyword(Keyword::Number) => Ok(self.config.rust.number_type.clone()),
            other => Err(TranspileError::InvalidMapKey {
                declaration: owner.to_string(),
                key: other.to_string(),
            }),
        }
    }

    /// Emits `pub struct` for an interface body or an inline object literal.
    /// Nested items are pushed before the struct itself.
    fn structure(
        &mut self,
        owner: &str,
        display_name: &str,
        extends: &[TypeRef],
        members: &[Member],
    ) -> Result<(), TranspileError> {
        let mut fields = String::new();
        let mut used = HashSet::new();

        for base in extends {
            let ty = self.reference(owner, "base", base)?;
            let field = unique_field(
                &mut used,
                rust_field(base.name.rsplit('.').next().unwrap_or(&base.name)),
            );
            let _ = writeln!(fields, "{INDENT}#[serde(flatten)]");
            let _ = writeln!(fields, "{INDENT}pub {field}: {ty},");
        }

        for member in members {
            match member {
                Member::Property(p) => {
                    let field = self.field(owner, p, &mut used)?;
                    fields.push_str(&field);
                }
                Member::Index(index) => {
                    let key = self.map_key(owner, &index.key_ty)?;
                    let value = self.map_type(owner, &index.key_name, &index.value_ty)?;
                    self.uses_hashmap = true;
                    let field = unique_field(&mut used, rust_field(&index.key_name));
                    let _ = writeln!(fields, "{INDENT}#[serde(flatten)]");
                    let _ = writeln!(fields, "{INDENT}pub {field}: HashMap<{key}, {value}>,");
                }
            }
        }

        let mut out = self.derive_line();
        if fields.is_empty() {
            let _ = writeln!(out, "pub struct {display_name} {{}}");
        } else {
            let _ = writeln!(out, "pub struct {display_name} {{");
            out.push_str(&fields);
            out.push_str("}\n");
        }
        self.items.push(out);
        Ok(())
    }

    fn field(
        &mut self,
        owner: &str,
        p: &Property,
        used: &mut HashSet<String>,
    ) -> Result<String, TranspileError> {
        let ident = unique_field(used, rust_field(&p.name));
        let nullable = p.is_nullable();
        let ty = if nullable {
            let inner = self.map_type(owner, &p.name, &p.ty.without_nullish())?;
            format!("Option<{inner}>")
        } else {
            self.map_type(owner, &p.name, &p.ty)?
        };

        let mut attrs = Vec::new();
        if ident.trim_start_matches("r#") != p.name {
            attrs.push(format!("rename = {:?}", p.name));
        }
        if nullable {
            attrs.push("default".to_string());
            attrs.push("skip_serializing_if = \"Option::is_none\"".to_string());
        }

        let mut out = String::new();
        if !attrs.is_empty() {
            let _ = writeln!(out, "{INDENT}#[serde({})]", attrs.join(", "));
        }
        let _ = writeln!(out, "{INDENT}pub {ident}: {ty},");
        Ok(out)
    }

    fn reference(
        &mut self,
        owner: &str,
        hint: &str,
        r: &TypeRef,
    ) -> Result<String, TranspileError> {
        let name = r.name.rsplit('.').next().unwrap_or(&r.name);
        match (name, r.args.as_slice()) {
            ("BigNumber", []) => return Ok(self.config.rust.decimal_type.clone()),
            ("Promise", [inner]) => return self.map_type(owner, hint, inner),
            ("Record" | "Map", [key, value]) => {
                let key = self.map_type(owner, hint, key)?;
                let value = self.map_type(owner, hint, value)?;
                self.uses_hashmap = true;
                return Ok(format!("HashMap<{key}, {value}>"));
            }
            _ => {}
        }
        if r.args.is_empty() {
            return Ok(name.to_string());
        }
        let args = r
            .args
            .iter()
            .map(|a| self.map_type(owner, hint, a))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(format!("{name}<{}>", args.join(", ")))
    }

    fn map_type(
        &mut self,
        owner: &str,
        hint: &str,
        ty: &TsType,
    ) -> Result<String, TranspileError> {
        Ok(match ty {
            TsType::Keyword(kw) => match kw {
                Keyword::String => "String".into(),
                Keyword::Number => self.config.rust.number_type.clone(),
                Keyword::Boolean => "bool".into(),
                Keyword::BigInt => "i128".into(),
                Keyword::Any | Keyword::Unknown | Keyword::Object => "serde_json::Value".into(),
                Keyword::Null | Keyword::Undefined | Keyword::Void => "()".into(),
            },
            TsType::Reference(r) => self.reference(owner, hint, r)?,
            TsType::Array(inner) => format!("Vec<{}>", self.map_type(owner, hint, inner)?),
            TsType::Literal(members) => {
                let nested = format!("{owner}{}", pascal(hint));
                self.structure(&nested, &nested, &[], members)?;
                nested
            }
            TsType::StringLiteral(_) => "String".into(),
            TsType::NumberLiteral(_) => self.config.rust.number_type.clone(),
            TsType::BooleanLiteral(_) => "bool".into(),
            TsType::Union(variants) => {
                if ty.is_optional_union() {
                    let inner = self.map_type(owner, hint, &ty.without_nullish())?;
                    return Ok(format!("Option<{inner}>"));
                }
                if let Some(values) = ty.string_literal_union() {
                    let nested = format!("{owner}{}", pascal(hint));
                    self.string_enum(&nested, &values);
                    return Ok(nested);
                }
                if variants.iter().all(|v| matches!(v, TsType::BooleanLiteral(_))) {
                    return Ok("bool".into());
                }
                if variants.iter().all(|v| matches!(v, TsType::NumberLiteral(_))) {
                    return Ok(self.config.rust.number_type.clone());
                }
                self.reporter.unsupported(
                    owner,
                    format!("union type of '{hint}' mapped to serde_json::Value"),
                )?;
                "serde_json::Value".into()
            }
            TsType::Unsupported(text) => {
                self.reporter.unsupported(
                    owner,
                    format!("type `{text}` of '{hint}' mapped to serde_json::Value"),
                )?;
                "serde_json::Value".into()
            }
        })
    }

    fn string_enum(&mut self, name: &str, values: &[&str]) {
        let mut out = self.derive_line();
        let _ = writeln!(out, "pub enum {name} {{");
        for value in values {
            let variant = rust_variant(value);
            let _ = writeln!(out, "{INDENT}#[serde(rename = {value:?})]");
            let _ = writeln!(out, "{INDENT}{variant},");
        }
        out.push_str("}\n");
        self.items.push(out);
    }

    fn enumeration(&mut self, e: &Enum) -> Result<(), TranspileError> {
        let values = e.numeric_values()?;
        if e.is_numeric() {
            self.uses_serde_repr = true;
            let derives: Vec<&str> = self
                .config
                .rust
                .derives
                .iter()
                .map(String::as_str)
                .filter(|d| *d != "Serialize" && *d != "Deserialize")
                .chain(["Serialize_repr", "Deserialize_repr"])
                .collect();
            let mut out = format!("#[derive({})]\n#[repr(i64)]\n", derives.join(", "));
            let _ = writeln!(out, "pub enum {} {{", e.name);
            for (member, value) in e.members.iter().zip(values) {
                if let Some(value) = value {
                    let _ = writeln!(out, "{INDENT}{} = {value},", rust_variant(&member.name));
                }
            }
            out.push_str("}\n");
            self.items.push(out);
            return Ok(());
        }

        let mut out = self.derive_line();
        let _ = writeln!(out, "pub enum {} {{", e.name);
        for member in &e.members {
            let variant = rust_variant(&member.name);
            let wire = match &member.value {
                Some(EnumValue::String(s)) => s.clone(),
                _ => member.name.clone(),
            };
            if wire != variant {
                let _ = writeln!(out, "{INDENT}#[serde(rename = {wire:?})]");
            }
            let _ = writeln!(out, "{INDENT}{variant},");
        }
        out.push_str("}\n");
        self.items.push(out);
        Ok(())
    }

    fn alias(&mut self, a: &Alias) -> Result<(), TranspileError> {
        match &a.ty {
            TsType::Literal(members) => {
                let display = with_generics(&a.name, &a.generics);
                self.structure(&a.name, &display, &[], members)
            }
            ty if ty.string_literal_union().is_some() => {
                let values = ty.string_literal_union().unwrap_or_default();
                self.string_enum(&a.name, &values);
                Ok(())
            }
            ty => {
                let mapped = self.map_type(&a.name, "", ty)?;
                let display = with_generics(&a.name, &a.generics);
                self.items.push(format!("pub type {display} = {mapped};\n"));
                Ok(())
            }
        }
    }

    fn class(&mut self, c: &Class) -> Result<(), TranspileError> {
        let mut methods = Vec::new();
        for method in &c.methods {
            if method.call.is_none() {
                self.reporter.unsupported(
                    &c.name,
                    format!("method '{}' has no recognised RPC call; skipped", method.name),
                )?;
                continue;
            }
            methods.push(self.method(&c.name, method)?);
        }
        if methods.is_empty() {
            return Ok(());
        }
        let mut out = format!("impl {} {{\n", c.name);
        out.push_str(&methods.join("\n"));
        out.push_str("}\n");
        self.items.push(out);
        Ok(())
    }

    fn method(&mut self, class: &str, m: &Method) -> Result<String, TranspileError> {
        let Some(call) = &m.call else {
            return Ok(String::new());
        };
        let owner = format!("{class}{}", pascal(&m.name));

        let mut signature = format!("{INDENT}pub async fn {}(&self", rust_field(&m.name));
        let mut defaults = Vec::new();
        for p in &m.params {
            let ty = match &p.ty {
                Some(ty) if p.optional || p.has_default || ty.is_optional_union() => {
                    let inner = self.map_type(&owner, &p.name, &ty.without_nullish())?;
                    format!("Option<{inner}>")
                }
                Some(ty) => self.map_type(&owner, &p.name, ty)?,
                None if p.optional || p.has_default => "Option<serde_json::Value>".into(),
                None => "serde_json::Value".into(),
            };
            let ident = rust_field(&p.name);
            if p.has_default {
                defaults.push(ident.clone());
            }
            let _ = write!(signature, ", {ident}: {ty}");
        }

        let ret = match m.return_type.as_ref().map(TsType::unwrap_promise) {
            None => "()".to_string(),
            Some(ty) => self.map_type(&owner, "result", ty)?,
        };
        let _ = writeln!(
            signature,
            ") -> {}<{ret}> {{",
            self.config.rust.client_error_type
        );

        for ident in defaults {
            let _ = writeln!(
                signature,
                "{INDENT}{INDENT}let {ident} = {ident}.unwrap_or_default();"
            );
        }

        let args: Vec<String> = call
            .args
            .iter()
            .map(|path| {
                let path: Vec<String> = path.iter().map(|seg| rust_field(seg)).collect();
                format!("{}.into()", path.join("."))
            })
            .collect();
        let _ = writeln!(
            signature,
            "{INDENT}{INDENT}self.call({:?}, &[{}]).await",
            call.method,
            args.join(", ")
        );
        let _ = writeln!(signature, "{INDENT}}}");
        Ok(signature)
    }
}

/// Two TypeScript names can map to the same snake_case field (`fooBar` and
/// `foo_bar`); later ones get a numeric suffix.
fn unique_field(used: &mut HashSet<String>, ident: String) -> String {
    if used.insert(ident.clone()) {
        return ident;
    }
    let base = ident.trim_start_matches("r#").to_string();
    let mut n = 2;
    loop {
        let candidate = format!("{base}_{n}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

fn with_generics(name: &str, generics: &[String]) -> String {
    if generics.is_empty() {
        name.to_string()
    } else {
        format!("{name}<{}>", generics.join(", "))
    }
}
