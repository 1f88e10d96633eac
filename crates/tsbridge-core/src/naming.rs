use convert_case::{Case, Casing};

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern", "false",
    "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref",
    "return", "static", "struct", "trait", "true", "type", "unsafe", "use", "where", "while",
    "abstract", "become", "box", "do", "final", "gen", "macro", "override", "priv", "try",
    "typeof", "unsized", "virtual", "yield",
];

/// Keywords that cannot be raw identifiers.
const RUST_RESERVED: &[&str] = &["self", "Self", "super", "crate"];

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Case conversion drops leading underscores, so the guard for names that
/// start with a digit goes on afterwards.
fn identifier(converted: String) -> String {
    if converted.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{converted}")
    } else {
        converted
    }
}

pub fn snake(name: &str) -> String {
    identifier(sanitize(name).to_case(Case::Snake))
}

pub fn pascal(name: &str) -> String {
    identifier(sanitize(name).to_case(Case::Pascal))
}

/// Proto enum values are written as `<PREFIX>_<NAME>`, so no leading-digit guard.
pub fn upper_snake(name: &str) -> String {
    sanitize(name).to_case(Case::UpperSnake)
}

/// snake_case field or function name, escaped when it collides with a keyword.
pub fn rust_field(name: &str) -> String {
    let s = snake(name);
    if RUST_RESERVED.contains(&s.as_str()) {
        format!("{s}_")
    } else if RUST_KEYWORDS.contains(&s.as_str()) {
        format!("r#{s}")
    } else {
        s
    }
}

pub fn rust_variant(name: &str) -> String {
    let p = pascal(name);
    if p == "Self" {
        "Self_".to_string()
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_field_names() {
        assert_eq!(rust_field("scriptPubKey"), "script_pub_key");
        assert_eq!(rust_field("witness_version"), "witness_version");
        assert_eq!(rust_field("isscript"), "isscript");
        assert_eq!(rust_field("liquidationHeight"), "liquidation_height");
    }

    #[test]
    fn keywords_are_escaped() {
        assert_eq!(rust_field("type"), "r#type");
        assert_eq!(rust_field("self"), "self_");
        assert_eq!(rust_field("match"), "r#match");
    }

    #[test]
    fn quoted_keys_become_identifiers() {
        assert_eq!(rust_field("content-type"), "content_type");
        assert_eq!(pascal("in-liquidation"), "InLiquidation");
    }

    #[test]
    fn enum_member_names() {
        assert_eq!(rust_variant("IN_LIQUIDATION"), "InLiquidation");
        assert_eq!(upper_snake("VaultState"), "VAULT_STATE");
    }

    #[test]
    fn digit_leading_names_stay_identifiers() {
        assert_eq!(rust_variant("1d"), "_1D");
        assert_eq!(rust_variant("1w"), "_1W");
        assert!(rust_field("1d").starts_with("_1"));
    }
}
