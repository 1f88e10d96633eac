//! Code generation backends.
//!
//! Every backend walks the same [`Module`] and produces an [`Output`]. Input
//! the backend cannot express is reported as a [`Diagnostic`]; in strict mode
//! the first one aborts the run instead.

pub mod proto;
pub mod rust;
pub mod schema;

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::ast::Module;
use crate::config::Config;
use crate::errors::TranspileError;

pub use proto::ProtoTranspiler;
pub use rust::RustTranspiler;
pub use schema::SchemaTranspiler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Rust,
    Proto,
    Schema,
}

impl FromStr for Target {
    type Err = TranspileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rust" | "rs" => Ok(Target::Rust),
            "proto" | "protobuf" => Ok(Target::Proto),
            "schema" | "jsonschema" | "json-schema" => Ok(Target::Schema),
            other => Err(TranspileError::UnknownTarget(other.to_string())),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Target::Rust => "rust",
            Target::Proto => "proto",
            Target::Schema => "schema",
        })
    }
}

/// Something a backend could not express faithfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub declaration: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.declaration, self.message)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Source items (structs, messages, impls) in emission order.
    Items(Vec<String>),
    /// A single JSON document.
    Json(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub body: Body,
    pub warnings: Vec<Diagnostic>,
}

impl Output {
    pub fn items(&self) -> &[String] {
        match &self.body {
            Body::Items(items) => items,
            Body::Json(_) => &[],
        }
    }

    /// Final file text. `header` is written as a line comment, or as the
    /// `$comment` key of a JSON document.
    pub fn render(&self, header: Option<&str>) -> String {
        match &self.body {
            Body::Items(items) => {
                let mut out = String::new();
                if let Some(h) = header {
                    out.push_str("// ");
                    out.push_str(h);
                    out.push_str("\n\n");
                }
                out.push_str(&items.join("\n"));
                out
            }
            Body::Json(doc) => {
                let mut doc = doc.clone();
                if let (Some(h), Some(obj)) = (header, doc.as_object_mut()) {
                    obj.insert("$comment".into(), serde_json::Value::String(h.into()));
                }
                let mut text = serde_json::to_string_pretty(&doc).unwrap_or_default();
                text.push('\n');
                text
            }
        }
    }
}

pub trait Transpiler {
    fn transpile(&self, module: &Module) -> Result<Output, TranspileError>;
}

pub fn transpiler_for(target: Target, config: &Config) -> Box<dyn Transpiler> {
    match target {
        Target::Rust => Box::new(RustTranspiler::new(config.clone())),
        Target::Proto => Box::new(ProtoTranspiler::new(config.clone())),
        Target::Schema => Box::new(SchemaTranspiler::new(config.clone())),
    }
}

/// Collects warnings, or fails on the first one in strict mode.
#[derive(Debug, Default)]
pub(crate) struct Reporter {
    strict: bool,
    warnings: Vec<Diagnostic>,
}

impl Reporter {
    pub(crate) fn new(strict: bool) -> Self {
        Self {
            strict,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn unsupported(
        &mut self,
        declaration: &str,
        detail: impl Into<String>,
    ) -> Result<(), TranspileError> {
        let detail = detail.into();
        if self.strict {
            return Err(TranspileError::Unsupported {
                declaration: declaration.to_string(),
                detail,
            });
        }
        warn!(declaration, "{detail}");
        self.warnings.push(Diagnostic {
            declaration: declaration.to_string(),
            message: detail,
        });
        Ok(())
    }

    pub(crate) fn finish(self, body: Body) -> Output {
        Output {
            body,
            warnings: self.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_parsing_ignores_case() {
        assert_eq!("Proto".parse::<Target>().unwrap(), Target::Proto);
        assert_eq!("RUST".parse::<Target>().unwrap(), Target::Rust);
        assert_eq!("json-schema".parse::<Target>().unwrap(), Target::Schema);
        assert!("kotlin".parse::<Target>().is_err());
    }

    #[test]
    fn factory_picks_backend_per_target() {
        let module = crate::parse_module("export interface Ping { height: number }").unwrap();
        let config = Config::default();

        let rust = transpiler_for(Target::Rust, &config).transpile(&module).unwrap();
        assert!(rust.items().iter().any(|i| i.contains("pub struct Ping {")));
        let proto = transpiler_for(Target::Proto, &config).transpile(&module).unwrap();
        assert!(proto.items().iter().any(|i| i.contains("message Ping {")));
        let schema = transpiler_for(Target::Schema, &config).transpile(&module).unwrap();
        assert!(matches!(schema.body, Body::Json(_)));
        assert!(schema.items().is_empty());
    }

    #[test]
    fn strict_reporter_fails_fast() {
        let mut r = Reporter::new(true);
        assert!(r.unsupported("X", "nope").is_err());
        let mut r = Reporter::new(false);
        r.unsupported("X", "nope").unwrap();
        let out = r.finish(Body::Items(vec![]));
        assert_eq!(out.warnings[0].to_string(), "X: nope");
    }

    #[test]
    fn render_places_header_per_body_kind() {
        let out = Output {
            body: Body::Items(vec!["a".into(), "b".into()]),
            warnings: vec![],
        };
        assert_eq!(out.render(Some("hdr")), "// hdr\n\na\nb");
        assert_eq!(out.render(None), "a\nb");

        let json = Output {
            body: Body::Json(serde_json::json!({ "type": "object" })),
            warnings: vec![],
        };
        let text = json.render(Some("hdr"));
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["$comment"], "hdr");
    }
}
