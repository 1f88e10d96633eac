//! Protocol Buffers (proto3) backend.

use std::fmt::Write as _;
use tracing::debug;

use super::{Body, Output, Reporter, Transpiler};
use crate::ast::{
    Alias, Declaration, Enum, Interface, Keyword, Member, Module, Property, TsType, TypeRef,
};
use crate::config::Config;
use crate::errors::TranspileError;
use crate::naming::{pascal, snake, upper_snake};

const INDENT: &str = "  ";
const DYNAMIC_VALUE: &str = "google.protobuf.Value";

pub struct ProtoTranspiler {
    config: Config,
}

impl ProtoTranspiler {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl Transpiler for ProtoTranspiler {
    fn transpile(&self, module: &Module) -> Result<Output, TranspileError> {
        let mut emitter = Emitter {
            config: &self.config,
            reporter: Reporter::new(self.config.strict),
            uses_struct: false,
        };
        let mut items = Vec::new();
        for decl in &module.declarations {
            debug!(name = decl.name(), "emitting proto");
            let block = match decl {
                Declaration::Interface(i) => Some(Block::Message(emitter.interface(i)?)),
                Declaration::Enum(e) => Some(Block::Enum(emitter.enumeration(e)?)),
                Declaration::Alias(a) => emitter.alias(a)?,
                Declaration::Class(c) => {
                    emitter
                        .reporter
                        .unsupported(&c.name, "classes have no protobuf equivalent; skipped")?;
                    None
                }
            };
            if let Some(block) = block {
                items.push(block.render(0));
            }
        }

        let mut preamble = String::from("syntax = \"proto3\";\n");
        if let Some(package) = &self.config.proto.package {
            let _ = write!(preamble, "\npackage {package};\n");
        }
        if emitter.uses_struct {
            preamble.push_str("\nimport \"google/protobuf/struct.proto\";\n");
        }
        items.insert(0, preamble);
        Ok(emitter.reporter.finish(Body::Items(items)))
    }
}

#[derive(Debug)]
struct Message {
    name: String,
    nested: Vec<Block>,
    fields: Vec<String>,
}

#[derive(Debug)]
struct EnumBlock {
    name: String,
    values: Vec<(String, i64)>,
}

#[derive(Debug)]
enum Block {
    Message(Message),
    Enum(EnumBlock),
}

impl Block {
    fn render(&self, depth: usize) -> String {
        let pad = INDENT.repeat(depth);
        let mut out = String::new();
        match self {
            Block::Message(m) => {
                let _ = writeln!(out, "{pad}message {} {{", m.name);
                for nested in &m.nested {
                    out.push_str(&nested.render(depth + 1));
                }
                for field in &m.fields {
                    let _ = writeln!(out, "{pad}{INDENT}{field}");
                }
                let _ = writeln!(out, "{pad}}}");
            }
            Block::Enum(e) => {
                let _ = writeln!(out, "{pad}enum {} {{", e.name);
                for (name, value) in &e.values {
                    let _ = writeln!(out, "{pad}{INDENT}{name} = {value};");
                }
                let _ = writeln!(out, "{pad}}}");
            }
        }
        out
    }
}

enum FieldType {
    Scalar(String),
    Repeated(String),
    Map(String, String),
}

struct Emitter<'a> {
    config: &'a Config,
    reporter: Reporter,
    uses_struct: bool,
}

impl Emitter<'_> {
    fn interface(&mut self, i: &Interface) -> Result<Message, TranspileError> {
        let mut message = Message {
            name: i.name.clone(),
            nested: Vec::new(),
            fields: Vec::new(),
        };
        for base in &i.extends {
            let ty = self.reference(&mut message, "base", base)?;
            let name = snake(base.name.rsplit('.').next().unwrap_or(&base.name));
            let number = message.fields.len() + 1;
            message.fields.push(format!("{ty} {name} = {number};"));
        }
        self.members(&mut message, &i.members)?;
        Ok(message)
    }

    fn members(&mut self, message: &mut Message, members: &[Member]) -> Result<(), TranspileError> {
        for member in members {
            match member {
                Member::Property(p) => self.property(message, p)?,
                Member::Index(index) => {
                    let key = self.map_key(&message.name, &index.key_ty)?;
                    let value = self.element(message, &index.key_name, &index.value_ty)?;
                    let number = message.fields.len() + 1;
                    message.fields.push(format!(
                        "map<{key}, {value}> {} = {number};",
                        field_name(&index.key_name)
                    ));
                }
            }
        }
        Ok(())
    }

    fn property(&mut self, message: &mut Message, p: &Property) -> Result<(), TranspileError> {
        let nullable = p.is_nullable();
        let ty = if nullable {
            p.ty.without_nullish()
        } else {
            p.ty.clone()
        };
        let number = message.fields.len() + 1;
        let name = field_name(&p.name);
        let line = match self.field_type(message, &p.name, &ty)? {
            FieldType::Scalar(t) if nullable => format!("optional {t} {name} = {number};"),
            FieldType::Scalar(t) => format!("{t} {name} = {number};"),
            FieldType::Repeated(t) => format!("repeated {t} {name} = {number};"),
            FieldType::Map(k, v) => format!("map<{k}, {v}> {name} = {number};"),
        };
        message.fields.push(line);
        Ok(())
    }

    fn map_key(&mut self, owner: &str, ty: &TsType) -> Result<String, TranspileError> {
        match ty {
            TsType::Keyword(Keyword::String) => Ok("string".into()),
            TsType::Keyword(Keyword::Number) => Ok(self.config.proto.number_type.clone()),
            TsType::Keyword(Keyword::Boolean) => Ok("bool".into()),
            other => Err(TranspileError::InvalidMapKey {
                declaration: owner.to_string(),
                key: other.to_string(),
            }),
        }
    }

    fn field_type(
        &mut self,
        message: &mut Message,
        hint: &str,
        ty: &TsType,
    ) -> Result<FieldType, TranspileError> {
        match ty {
            TsType::Array(inner) => {
                let elem = self.element(message, hint, inner)?;
                Ok(FieldType::Repeated(elem))
            }
            TsType::Reference(TypeRef { name, args })
                if matches!(name.as_str(), "Record" | "Map") && args.len() == 2 =>
            {
                let key = self.map_key(&message.name, &args[0])?;
                let value = self.element(message, hint, &args[1])?;
                Ok(FieldType::Map(key, value))
            }
            TsType::Reference(TypeRef { name, args }) if name == "Promise" && args.len() == 1 => {
                self.field_type(message, hint, &args[0])
            }
            other => Ok(FieldType::Scalar(self.element(message, hint, other)?)),
        }
    }

    /// Type usable as a single field value, map value or repeated element.
    fn element(
        &mut self,
        message: &mut Message,
        hint: &str,
        ty: &TsType,
    ) -> Result<String, TranspileError> {
        Ok(match ty {
            TsType::Keyword(kw) => match kw {
                Keyword::String => "string".into(),
                Keyword::Number => self.config.proto.number_type.clone(),
                Keyword::Boolean => "bool".into(),
                Keyword::BigInt => "int64".into(),
                Keyword::Any | Keyword::Unknown | Keyword::Object => self.dynamic(),
                Keyword::Null | Keyword::Undefined | Keyword::Void => {
                    self.reporter.unsupported(
                        &message.name,
                        format!("'{hint}' has type {}", kw.as_str()),
                    )?;
                    self.dynamic()
                }
            },
            TsType::Reference(r) => self.reference(message, hint, r)?,
            TsType::Array(_) => {
                self.reporter.unsupported(
                    &message.name,
                    format!("nested array in '{hint}' mapped to {DYNAMIC_VALUE}"),
                )?;
                self.dynamic()
            }
            TsType::Literal(members) => {
                let mut nested = Message {
                    name: pascal(hint),
                    nested: Vec::new(),
                    fields: Vec::new(),
                };
                self.members(&mut nested, members)?;
                let name = nested.name.clone();
                message.nested.push(Block::Message(nested));
                name
            }
            TsType::StringLiteral(_) => "string".into(),
            TsType::NumberLiteral(_) => self.config.proto.number_type.clone(),
            TsType::BooleanLiteral(_) => "bool".into(),
            TsType::Union(variants) => {
                if let Some(values) = ty.string_literal_union() {
                    let name = pascal(hint);
                    let prefix = upper_snake(&name);
                    let mut block = EnumBlock {
                        name: name.clone(),
                        values: vec![(format!("{prefix}_UNSPECIFIED"), 0)],
                    };
                    for (i, value) in values.iter().enumerate() {
                        block
                            .values
                            .push((format!("{prefix}_{}", upper_snake(value)), i as i64 + 1));
                    }
                    message.nested.push(Block::Enum(block));
                    return Ok(name);
                }
                if variants.iter().all(|v| matches!(v, TsType::BooleanLiteral(_))) {
                    return Ok("bool".into());
                }
                if variants.iter().all(|v| matches!(v, TsType::NumberLiteral(_))) {
                    return Ok(self.config.proto.number_type.clone());
                }
                self.reporter.unsupported(
                    &message.name,
                    format!("union type of '{hint}' mapped to {DYNAMIC_VALUE}"),
                )?;
                self.dynamic()
            }
            TsType::Unsupported(text) => {
                self.reporter.unsupported(
                    &message.name,
                    format!("type `{text}` of '{hint}' mapped to {DYNAMIC_VALUE}"),
                )?;
                self.dynamic()
            }
        })
    }

    fn reference(
        &mut self,
        message: &mut Message,
        hint: &str,
        r: &TypeRef,
    ) -> Result<String, TranspileError> {
        let name = r.name.rsplit('.').next().unwrap_or(&r.name);
        match name {
            "BigNumber" => return Ok("string".into()),
            "Promise" if r.args.len() == 1 => return self.element(message, hint, &r.args[0]),
            "Record" | "Map" => {
                self.reporter.unsupported(
                    &message.name,
                    format!("map inside repeated or map value '{hint}' mapped to {DYNAMIC_VALUE}"),
                )?;
                return Ok(self.dynamic());
            }
            _ => {}
        }
        if !r.args.is_empty() {
            self.reporter.unsupported(
                &message.name,
                format!("type arguments of '{name}' dropped in '{hint}'"),
            )?;
        }
        Ok(name.to_string())
    }

    fn dynamic(&mut self) -> String {
        self.uses_struct = true;
        DYNAMIC_VALUE.to_string()
    }

    fn enumeration(&mut self, e: &Enum) -> Result<EnumBlock, TranspileError> {
        let prefix = upper_snake(&e.name);
        let mut block = EnumBlock {
            name: e.name.clone(),
            values: Vec::new(),
        };

        let numeric: Vec<i64> = e.numeric_values()?.into_iter().flatten().collect();
        let mut sorted = numeric.clone();
        sorted.sort_unstable();
        sorted.dedup();
        let keep_values =
            e.is_numeric() && sorted.len() == e.members.len() && sorted.iter().all(|v| *v >= 0);

        if keep_values {
            if !numeric.contains(&0) {
                block.values.push((format!("{prefix}_UNSPECIFIED"), 0));
            }
            for (member, value) in e.members.iter().zip(numeric) {
                block
                    .values
                    .push((format!("{prefix}_{}", upper_snake(&member.name)), value));
            }
            return Ok(block);
        }

        if e.is_numeric() {
            self.reporter.unsupported(
                &e.name,
                "negative or duplicate enum values renumbered for proto3",
            )?;
        }
        block.values.push((format!("{prefix}_UNSPECIFIED"), 0));
        for (i, member) in e.members.iter().enumerate() {
            block.values.push((
                format!("{prefix}_{}", upper_snake(&member.name)),
                i as i64 + 1,
            ));
        }
        Ok(block)
    }

    fn alias(&mut self, a: &Alias) -> Result<Option<Block>, TranspileError> {
        match &a.ty {
            TsType::Literal(members) => {
                let mut message = Message {
                    name: a.name.clone(),
                    nested: Vec::new(),
                    fields: Vec::new(),
                };
                self.members(&mut message, members)?;
                Ok(Some(Block::Message(message)))
            }
            ty if ty.string_literal_union().is_some() => {
                let values = ty.string_literal_union().unwrap_or_default();
                let prefix = upper_snake(&a.name);
                let mut block = EnumBlock {
                    name: a.name.clone(),
                    values: vec![(format!("{prefix}_UNSPECIFIED"), 0)],
                };
                for (i, value) in values.iter().enumerate() {
                    block
                        .values
                        .push((format!("{prefix}_{}", upper_snake(value)), i as i64 + 1));
                }
                Ok(Some(Block::Enum(block)))
            }
            _ => {
                self.reporter
                    .unsupported(&a.name, "type aliases have no protobuf equivalent; skipped")?;
                Ok(None)
            }
        }
    }
}

/// TypeScript names are kept when they are valid proto identifiers.
fn field_name(name: &str) -> String {
    let valid = name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        name.to_string()
    } else {
        snake(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_module;

    fn emit_with(src: &str, config: Config) -> Output {
        let module = parse_module(src).unwrap();
        ProtoTranspiler::new(config).transpile(&module).unwrap()
    }

    fn text(src: &str) -> String {
        emit_with(src, Config::default()).render(None)
    }

    #[test]
    fn basic_message_numbering() {
        let out = text("export interface Basic { a: string; b: number; c?: boolean }");
        assert!(out.contains(
            "message Basic {\n  string a = 1;\n  int32 b = 2;\n  optional bool c = 3;\n}\n"
        ));
    }

    #[test]
    fn map_interface_uses_field_number_one() {
        let out = text("export interface MasternodeResult { [id: string]: MasternodeInfo }");
        assert!(out.contains("  map<string, MasternodeInfo> id = 1;"));
    }

    #[test]
    fn enums_get_zero_value() {
        let out = text("export enum VaultState { ACTIVE = 'active', FROZEN = 'frozen' }");
        assert!(out.contains(
            "enum VaultState {\n  VAULT_STATE_UNSPECIFIED = 0;\n  VAULT_STATE_ACTIVE = 1;\n  VAULT_STATE_FROZEN = 2;\n}"
        ));

        let out = text("export enum Code { A = 0, B = 4 }");
        assert!(out.contains("  CODE_A = 0;\n  CODE_B = 4;"));
        assert!(!out.contains("UNSPECIFIED"));
    }

    #[test]
    fn any_pulls_in_struct_import() {
        let out = text("export interface A { meta: any }");
        assert!(out.contains("import \"google/protobuf/struct.proto\";"));
        assert!(out.contains("google.protobuf.Value meta = 1;"));
    }

    #[test]
    fn enum_overflow_is_an_error() {
        let module = crate::ast::Module {
            declarations: vec![Declaration::Enum(Enum {
                name: "Big".into(),
                members: vec![
                    crate::ast::EnumMember {
                        name: "A".into(),
                        value: Some(crate::ast::EnumValue::Number(i64::MAX)),
                    },
                    crate::ast::EnumMember {
                        name: "B".into(),
                        value: None,
                    },
                ],
            })],
        };
        let err = ProtoTranspiler::new(Config::default())
            .transpile(&module)
            .unwrap_err();
        assert!(matches!(err, TranspileError::EnumOverflow { .. }));
    }

    #[test]
    fn tuple_field_is_a_dynamic_value() {
        let out = emit_with(
            "export interface Pair { both: [string, number] }",
            Config::default(),
        );
        assert_eq!(out.warnings.len(), 1);
        assert!(out.render(None).contains("google.protobuf.Value both = 1;"));
    }

    #[test]
    fn package_from_config() {
        let mut config = Config::default();
        config.proto.package = Some("defichain.rpc".into());
        config.proto.number_type = "double".into();
        let out = emit_with("export interface A { x: number }", config).render(None);
        assert!(out.starts_with("syntax = \"proto3\";\n\npackage defichain.rpc;\n"));
        assert!(out.contains("double x = 1;"));
    }

    #[test]
    fn classes_are_skipped_with_warning() {
        let out = emit_with(
            "export class Rpc { async ping (): Promise<void> { return await this.client.call('ping', []) } }",
            Config::default(),
        );
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.items().len(), 1);
    }
}
