//! The annotation surface: the codegen marker and per-declaration directives
//! read from doc comments of the analyzed sources.

use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

/// Marker that opts a declaration into code generation. Matched
/// case-insensitively against whole trimmed doc lines.
pub const CODEGEN_MARKER: &str = "tabletop:codegen";

static TRANSFORM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^transform\s*:\s*(upper|lower|none)\s*$").unwrap());

static DISPLAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^display\s*:\s*"((?:[^"\\]|\\.)*)"\s*$"#).unwrap());

static COMBINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^combine\s*:\s*([A-Za-z][A-Za-z0-9_]*)\s*$").unwrap());

/// Emission level requested by a reader marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EmitLevel {
    Reader,
    ReadSetter,
    ReadSetConfigurer,
}

/// Case transform applied to derived display values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transform {
    #[default]
    None,
    Upper,
    Lower,
}

impl Transform {
    pub fn apply(&self, display: &str) -> String {
        match self {
            Transform::None => display.to_string(),
            Transform::Upper => display.to_uppercase(),
            Transform::Lower => display.to_lowercase(),
        }
    }
}

/// Collects the trimmed text lines of a declaration's doc comments.
pub fn doc_lines(attrs: &[syn::Attribute]) -> Vec<String> {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            syn::Meta::NameValue(nv) => match &nv.value {
                syn::Expr::Lit(expr_lit) => match &expr_lit.lit {
                    syn::Lit::Str(s) => Some(s.value().trim().to_string()),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        })
        .collect()
}

/// Finds the codegen marker among doc lines and returns its qualifier, if any.
///
/// `Some(None)` means the bare marker; `Some(Some(q))` carries the lowercased
/// qualifier word. `None` means the declaration is unannotated.
pub fn find_marker(lines: &[String]) -> Option<Option<String>> {
    for line in lines {
        let lowered = line.to_lowercase();
        if let Some(rest) = lowered.strip_prefix(CODEGEN_MARKER) {
            let qualifier = rest.trim();
            if qualifier.is_empty() {
                return Some(None);
            }
            return Some(Some(qualifier.to_string()));
        }
    }
    None
}

/// Resolves a reader marker qualifier into an emission level.
///
/// The bare marker, `all`, and `configurer` request the full surface;
/// `readsetter` stops at the setter; `reader` emits the reader alone. An
/// unrecognized qualifier is reported and treated as the full surface.
pub fn emit_level(qualifier: Option<&str>) -> EmitLevel {
    match qualifier {
        None => EmitLevel::ReadSetConfigurer,
        Some("all") | Some("configurer") => EmitLevel::ReadSetConfigurer,
        Some("readsetter") => EmitLevel::ReadSetter,
        Some("reader") => EmitLevel::Reader,
        Some(other) => {
            warn!(qualifier = %other, "Unrecognized codegen marker qualifier; emitting full surface");
            EmitLevel::ReadSetConfigurer
        }
    }
}

/// Parses a `transform:` directive from one doc line.
pub fn parse_transform(line: &str) -> Option<Transform> {
    TRANSFORM_RE.captures(line).map(|caps| {
        match caps.get(1).map(|m| m.as_str().to_lowercase()).as_deref() {
            Some("upper") => Transform::Upper,
            Some("lower") => Transform::Lower,
            _ => Transform::None,
        }
    })
}

/// Parses a `display:"…"` directive from one doc line. The quoted string may
/// be empty and may contain escaped quotes and backslashes.
pub fn parse_display(line: &str) -> Option<String> {
    DISPLAY_RE
        .captures(line)
        .map(|caps| unescape(caps.get(1).map_or("", |m| m.as_str())))
}

/// Parses a `combine: Name` directive from one doc line.
pub fn parse_combine(line: &str) -> Option<String> {
    COMBINE_RE
        .captures(line)
        .map(|caps| caps.get(1).map_or("", |m| m.as_str()).to_string())
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push(c),
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc_lines_of(source: &str) -> Vec<String> {
        let file = syn::parse_file(source).expect("parse");
        match &file.items[0] {
            syn::Item::Struct(item) => doc_lines(&item.attrs),
            syn::Item::Const(item) => doc_lines(&item.attrs),
            _ => panic!("unexpected item"),
        }
    }

    #[test]
    fn test_find_marker_bare() {
        let lines = doc_lines_of("/// tabletop:codegen\npub struct S;\n");
        assert_eq!(find_marker(&lines), Some(None));
    }

    #[test]
    fn test_find_marker_case_insensitive_with_qualifier() {
        let lines = doc_lines_of("/// Tabletop:Codegen READER\npub struct S;\n");
        assert_eq!(find_marker(&lines), Some(Some("reader".to_string())));
    }

    #[test]
    fn test_find_marker_absent() {
        let lines = doc_lines_of("/// Plain documentation.\npub struct S;\n");
        assert_eq!(find_marker(&lines), None);
    }

    #[test]
    fn test_emit_levels() {
        assert_eq!(emit_level(None), EmitLevel::ReadSetConfigurer);
        assert_eq!(emit_level(Some("all")), EmitLevel::ReadSetConfigurer);
        assert_eq!(emit_level(Some("configurer")), EmitLevel::ReadSetConfigurer);
        assert_eq!(emit_level(Some("readsetter")), EmitLevel::ReadSetter);
        assert_eq!(emit_level(Some("reader")), EmitLevel::Reader);
    }

    #[test]
    fn test_parse_transform() {
        assert_eq!(parse_transform("transform: upper"), Some(Transform::Upper));
        assert_eq!(parse_transform("Transform: LOWER"), Some(Transform::Lower));
        assert_eq!(parse_transform("transform:none"), Some(Transform::None));
        assert_eq!(parse_transform("transform: sideways"), None);
    }

    #[test]
    fn test_parse_display_plain_and_empty() {
        assert_eq!(
            parse_display(r#"display:"cerulean""#),
            Some("cerulean".to_string())
        );
        assert_eq!(parse_display(r#"display:"""#), Some(String::new()));
    }

    #[test]
    fn test_parse_display_escaped_quotes() {
        assert_eq!(
            parse_display(r#"display:"say \"hi\" now""#),
            Some(r#"say "hi" now"#.to_string())
        );
    }

    #[test]
    fn test_parse_combine() {
        assert_eq!(parse_combine("combine: AllColors"), Some("AllColors".to_string()));
        assert_eq!(parse_combine("combine AllColors"), None);
    }

    #[test]
    fn test_transform_apply() {
        assert_eq!(Transform::Upper.apply("Red"), "RED");
        assert_eq!(Transform::Lower.apply("Red"), "red");
        assert_eq!(Transform::None.apply("Red"), "Red");
    }
}
