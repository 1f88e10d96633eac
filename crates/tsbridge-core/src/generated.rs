//! Generated-file header, source digest and staleness detection.

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::config::Config;
use crate::errors::{Error, Result};
use crate::syntax::parse_module;
use crate::transpile::{transpiler_for, Diagnostic, Target};

const MARKER: &str = "@generated by tsbridge";
const DIGEST_PREFIX: &str = "source sha256: ";

pub fn sha256_hex(s: &str) -> String {
    let mut h = Sha256::new();
    h.update(s.as_bytes());
    hex::encode(h.finalize())
}

pub fn header_line(source_name: &str, digest: &str) -> String {
    format!(
        "{MARKER} {} from {source_name}; {DIGEST_PREFIX}{digest}",
        env!("CARGO_PKG_VERSION")
    )
}

/// Source digest recorded in a generated file's header, if any.
pub fn extract_digest(text: &str) -> Option<&str> {
    let line = text.lines().find(|l| l.contains(MARKER))?;
    let start = line.find(DIGEST_PREFIX)? + DIGEST_PREFIX.len();
    let digest = line.get(start..start + 64)?;
    digest
        .bytes()
        .all(|b| b.is_ascii_hexdigit())
        .then_some(digest)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    pub text: String,
    pub digest: String,
    pub warnings: Vec<Diagnostic>,
    pub declarations: usize,
}

/// Parses `source`, runs the backend for `target` and renders the result,
/// with a header unless the config turns it off. `source_name` is used for
/// error messages and the header.
pub fn generate(
    source_name: &str,
    source: &str,
    target: Target,
    config: &Config,
) -> Result<Generated> {
    let module = parse_module(source).map_err(|e| Error::Parse {
        path: source_name.to_string(),
        source: e,
    })?;
    let output = transpiler_for(target, config).transpile(&module)?;
    let digest = sha256_hex(source);
    let header = config.header.then(|| header_line(source_name, &digest));
    let text = output.render(header.as_deref());

    info!(
        %target,
        declarations = module.declarations.len(),
        warnings = output.warnings.len(),
        "generated {source_name}"
    );
    Ok(Generated {
        text,
        digest,
        warnings: output.warnings,
        declarations: module.declarations.len(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
    UpToDate,
    /// The header digest does not match the current source.
    SourceChanged,
    /// The digest matches (or is absent) but the body differs from a fresh run.
    ContentChanged,
}

impl Staleness {
    pub fn is_stale(self) -> bool {
        self != Staleness::UpToDate
    }
}

/// Compares an existing generated file against a fresh generation. Header
/// lines are ignored when comparing bodies so a generator version bump alone
/// does not count as stale.
pub fn staleness(existing: &str, fresh: &Generated) -> Staleness {
    if let Some(recorded) = extract_digest(existing) {
        if recorded != fresh.digest {
            debug!(recorded, current = %fresh.digest, "source digest changed");
            return Staleness::SourceChanged;
        }
    }
    if strip_header(existing) != strip_header(&fresh.text) {
        return Staleness::ContentChanged;
    }
    Staleness::UpToDate
}

fn strip_header(text: &str) -> String {
    text.lines()
        .filter(|l| !l.contains(MARKER))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: &str = "export interface A { id: string }\n";

    #[test]
    fn header_round_trips_digest() {
        let digest = sha256_hex(SRC);
        let header = header_line("a.ts", &digest);
        assert!(header.starts_with("@generated by tsbridge "));
        assert!(header.contains(" from a.ts; "));
        assert_eq!(extract_digest(&format!("// {header}\n")), Some(digest.as_str()));
    }

    #[test]
    fn extract_digest_rejects_garbage() {
        assert_eq!(extract_digest("no header here"), None);
        assert_eq!(
            extract_digest("// @generated by tsbridge 0.1 from a.ts; source sha256: xyz"),
            None
        );
    }

    #[test]
    fn generate_adds_header_only_when_configured() {
        let out = generate("a.ts", SRC, Target::Rust, &Config::default()).unwrap();
        assert!(out.text.starts_with("// @generated by tsbridge"));
        assert_eq!(out.declarations, 1);

        let config = Config {
            header: false,
            ..Config::default()
        };
        let out = generate("a.ts", SRC, Target::Rust, &config).unwrap();
        assert!(!out.text.contains(MARKER));
    }

    #[test]
    fn schema_header_lives_in_comment_key() {
        let out = generate("a.ts", SRC, Target::Schema, &Config::default()).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&out.text).unwrap();
        let comment = doc["$comment"].as_str().unwrap();
        assert_eq!(extract_digest(comment), Some(out.digest.as_str()));
    }

    #[test]
    fn staleness_detects_source_and_content_drift() {
        let config = Config::default();
        let fresh = generate("a.ts", SRC, Target::Proto, &config).unwrap();
        assert_eq!(staleness(&fresh.text, &fresh), Staleness::UpToDate);

        let edited = generate("a.ts", "export interface A { id: number }\n", Target::Proto, &config)
            .unwrap();
        assert_eq!(staleness(&edited.text, &fresh), Staleness::SourceChanged);

        let tampered = fresh.text.replace("string id", "bytes id");
        assert_eq!(staleness(&tampered, &fresh), Staleness::ContentChanged);
        assert!(staleness(&tampered, &fresh).is_stale());
    }

    #[test]
    fn parse_errors_name_the_source() {
        let err = generate("bad.ts", "export interface {", Target::Rust, &Config::default())
            .unwrap_err();
        assert!(err.to_string().starts_with("parse error in bad.ts:1:"));
    }
}
