//! Enum records: marked constant groups with display-name derivation.

use crate::error::{CodegenError, Result};
use crate::loader::PackageAst;
use crate::markers::{self, Transform, doc_lines, find_marker};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, trace, warn};

/// Delimiter spelled inside identifiers to force a tree break. A digit run
/// keeps identifiers lint-clean and is unlikely inside real names.
pub const EXPLICIT_DELIMITER: &str = "000";

/// Delimiter joining path segments of display values during tree processing.
pub const NODE_DELIMITER: &str = " > ";

/// One enum under construction: an ordered key list, display derivation
/// state, and (for tree enums) the parent chain.
#[derive(Debug, Clone, Default)]
pub struct EnumRecord {
    pub(crate) keys: Vec<String>,
    pub(crate) prefix: String,
    pub(crate) display: BTreeMap<String, String>,
    pub(crate) parents: BTreeMap<String, String>,
    pub(crate) synthesized: Vec<String>,
    values: HashMap<String, i64>,
    overrides: HashMap<String, String>,
    transforms: HashMap<String, Transform>,
    default_transform: Transform,
    combine_group: Option<String>,
    baked: bool,
    processed: bool,
}

impl EnumRecord {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard_unbaked(&self) -> Result<()> {
        if self.baked {
            return Err(CodegenError::EnumAlreadyBaked(self.prefix.clone()));
        }
        Ok(())
    }

    pub fn add_member(&mut self, key: impl Into<String>, value: i64) -> Result<()> {
        self.guard_unbaked()?;
        let key = key.into();
        self.values.insert(key.clone(), value);
        self.keys.push(key);
        Ok(())
    }

    pub fn set_override(&mut self, key: &str, display: impl Into<String>) -> Result<()> {
        self.guard_unbaked()?;
        self.overrides.insert(key.to_string(), display.into());
        Ok(())
    }

    pub fn set_transform(&mut self, key: &str, transform: Transform) -> Result<()> {
        self.guard_unbaked()?;
        self.transforms.insert(key.to_string(), transform);
        Ok(())
    }

    pub fn set_default_transform(&mut self, transform: Transform) -> Result<()> {
        self.guard_unbaked()?;
        self.default_transform = transform;
        Ok(())
    }

    pub fn set_combine_group(&mut self, name: impl Into<String>) {
        self.combine_group = Some(name.into());
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn display(&self) -> &BTreeMap<String, String> {
        &self.display
    }

    pub fn display_of(&self, key: &str) -> Option<&str> {
        self.display.get(key).map(|s| s.as_str())
    }

    pub fn parents(&self) -> &BTreeMap<String, String> {
        &self.parents
    }

    pub fn synthesized(&self) -> &[String] {
        &self.synthesized
    }

    pub fn combine_group(&self) -> Option<&str> {
        self.combine_group.as_deref()
    }

    pub fn value_of(&self, key: &str) -> Option<i64> {
        self.values.get(key).copied()
    }

    /// A tree enum is one whose prefix key is itself a member and bakes to
    /// the empty display value.
    pub fn is_tree(&self) -> bool {
        self.baked
            && self.keys.iter().any(|k| k == &self.prefix)
            && self.display.get(&self.prefix).is_some_and(|d| d.is_empty())
    }

    /// Runs legality checks, bakes display values, and derives tree
    /// structure when the enum is a tree enum.
    pub fn process(&mut self) -> Result<()> {
        self.bake()?;
        if self.is_tree() {
            trace!(prefix = %self.prefix, "Deriving tree structure");
            super::tree::derive(self)?;
        }
        self.processed = true;
        Ok(())
    }

    fn bake(&mut self) -> Result<()> {
        self.guard_unbaked()?;
        self.legality_pre()?;

        self.prefix = longest_common_prefix(&self.keys);
        if self.prefix.is_empty() {
            return Err(CodegenError::illegal_enum(
                self.keys[0].clone(),
                "keys share no common prefix",
            ));
        }

        for key in &self.keys {
            let display = match self.overrides.get(key) {
                Some(explicit) => explicit.clone(),
                None => {
                    let transform = self
                        .transforms
                        .get(key)
                        .copied()
                        .unwrap_or(self.default_transform);
                    transform.apply(&derive_display(key, &self.prefix))
                }
            };
            self.display.insert(key.clone(), display);
        }

        self.legality_post()?;
        self.baked = true;

        debug!(
            prefix = %self.prefix,
            keys = self.keys.len(),
            "Enum baked"
        );
        Ok(())
    }

    fn legality_pre(&self) -> Result<()> {
        if self.keys.is_empty() {
            return Err(CodegenError::illegal_enum("<unnamed>", "no keys in group"));
        }

        for key in &self.keys {
            if key.contains('_') {
                return Err(CodegenError::illegal_enum(
                    key.clone(),
                    format!(
                        "key `{key}` uses the retired `_` tree delimiter; spell the break as `{EXPLICIT_DELIMITER}` instead"
                    ),
                ));
            }
        }

        Ok(())
    }

    fn legality_post(&self) -> Result<()> {
        for (key, display) in &self.display {
            if display.contains(EXPLICIT_DELIMITER) {
                return Err(CodegenError::illegal_enum(
                    self.prefix.clone(),
                    format!("display value `{display}` for `{key}` contains the `{EXPLICIT_DELIMITER}` delimiter"),
                ));
            }

            for other in &self.keys {
                if other == key {
                    continue;
                }
                if self.display.get(other) == Some(display) && other > key {
                    return Err(CodegenError::illegal_enum(
                        self.prefix.clone(),
                        format!("keys `{key}` and `{other}` share the display value `{display}`"),
                    ));
                }
                if display == other {
                    return Err(CodegenError::illegal_enum(
                        self.prefix.clone(),
                        format!("display value for `{key}` collides with the key `{other}`"),
                    ));
                }
                if let Some(value) = self.values.get(other)
                    && display == &value.to_string()
                {
                    return Err(CodegenError::illegal_enum(
                        self.prefix.clone(),
                        format!(
                            "display value `{display}` for `{key}` collides with the value of `{other}`"
                        ),
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Derives a display value from a key: strip the prefix, turn explicit
/// delimiters into node breaks, and expand title-case boundaries to spaces.
fn derive_display(key: &str, prefix: &str) -> String {
    let stripped = key.strip_prefix(prefix).unwrap_or(key);

    stripped
        .split(EXPLICIT_DELIMITER)
        .map(|segment| {
            expand_title_case(segment)
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(NODE_DELIMITER)
}

/// Inserts a space wherever an uppercase letter follows a lowercase letter
/// or digit. Characters keep their case.
fn expand_title_case(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len() + 4);
    let mut prev: Option<char> = None;
    for c in segment.chars() {
        if let Some(p) = prev
            && c.is_uppercase()
            && (p.is_lowercase() || p.is_ascii_digit())
        {
            out.push(' ');
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

fn longest_common_prefix(keys: &[String]) -> String {
    let Some(first) = keys.first() else {
        return String::new();
    };
    let mut len = first.len();
    for key in &keys[1..] {
        len = len.min(
            first
                .bytes()
                .zip(key.bytes())
                .take_while(|(a, b)| a == b)
                .count(),
        );
    }
    first[..len].to_string()
}

/// Scans the package for marked constant groups and processes each into an
/// [`EnumRecord`]. A group is a run of consecutive `const` items anchored by
/// a marker-bearing const; the run ends at the first non-const item or at a
/// const carrying its own marker.
///
/// Illegal enums are reported and omitted; the remainder still emit.
pub fn collect_enums(pkg: &PackageAst) -> (Vec<EnumRecord>, Vec<CodegenError>) {
    let mut records = Vec::new();
    let mut failures = Vec::new();

    for file in pkg.authored_files() {
        let items = &file.ast.items;
        let mut idx = 0;

        while idx < items.len() {
            let syn::Item::Const(anchor) = &items[idx] else {
                idx += 1;
                continue;
            };
            let anchor_lines = doc_lines(&anchor.attrs);
            if find_marker(&anchor_lines).is_none() {
                idx += 1;
                continue;
            }

            debug!(anchor = %anchor.ident, "Found marked constant group");

            let mut record = EnumRecord::new();
            let mut build = || -> Result<()> {
                let first_key = anchor.ident.to_string();
                record.add_member(first_key.clone(), const_value(anchor, 0))?;

                // Group-level directives live in the marker block; a display
                // override there applies to the anchor member.
                for line in &anchor_lines {
                    if let Some(transform) = markers::parse_transform(line) {
                        record.set_default_transform(transform)?;
                    }
                    if let Some(name) = markers::parse_combine(line) {
                        record.set_combine_group(name);
                    }
                    if let Some(display) = markers::parse_display(line) {
                        record.set_override(&first_key, display)?;
                    }
                }

                let mut position = 1;
                idx += 1;
                while idx < items.len() {
                    let syn::Item::Const(member) = &items[idx] else {
                        break;
                    };
                    let member_lines = doc_lines(&member.attrs);
                    if find_marker(&member_lines).is_some() {
                        break;
                    }

                    let key = member.ident.to_string();
                    record.add_member(key.clone(), const_value(member, position))?;
                    for line in &member_lines {
                        if let Some(transform) = markers::parse_transform(line) {
                            record.set_transform(&key, transform)?;
                        }
                        if let Some(display) = markers::parse_display(line) {
                            record.set_override(&key, display)?;
                        }
                    }

                    position += 1;
                    idx += 1;
                }

                record.process()
            };

            match build() {
                Ok(()) => records.push(record),
                Err(e) => {
                    warn!(error = %e, "Enum omitted");
                    failures.push(e);
                }
            }
        }
    }

    (records, failures)
}

/// Integer value of a const member: its literal initializer when present,
/// otherwise its position inside the group.
fn const_value(item: &syn::ItemConst, position: usize) -> i64 {
    match &*item.expr {
        syn::Expr::Lit(expr_lit) => match &expr_lit.lit {
            syn::Lit::Int(lit) => lit.base10_parse().unwrap_or(position as i64),
            _ => position as i64,
        },
        syn::Expr::Unary(unary) if matches!(unary.op, syn::UnOp::Neg(_)) => {
            match &*unary.expr {
                syn::Expr::Lit(expr_lit) => match &expr_lit.lit {
                    syn::Lit::Int(lit) => -lit.base10_parse().unwrap_or(0),
                    _ => position as i64,
                },
                _ => position as i64,
            }
        }
        _ => position as i64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_package;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn collect(source: &str) -> (Vec<EnumRecord>, Vec<CodegenError>) {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("consts.rs"), source).expect("write source");
        let pkg = load_package(dir.path()).expect("load");
        collect_enums(&pkg)
    }

    fn single(source: &str) -> EnumRecord {
        let (mut records, failures) = collect(source);
        assert!(failures.is_empty(), "unexpected failures: {failures:?}");
        assert_eq!(records.len(), 1);
        records.pop().unwrap()
    }

    #[test]
    fn test_flat_enum_with_transform_and_override() {
        let record = single(
            r#"
/// tabletop:codegen
/// transform: upper
pub const ColorRed: i64 = 0;
/// display:"cerulean"
pub const ColorBlue: i64 = 1;
pub const ColorGreen: i64 = 2;
"#,
        );

        assert_eq!(record.prefix(), "Color");
        assert!(!record.is_tree());
        assert_eq!(record.display_of("ColorRed"), Some("RED"));
        assert_eq!(record.display_of("ColorBlue"), Some("cerulean"));
        assert_eq!(record.display_of("ColorGreen"), Some("GREEN"));
    }

    #[test]
    fn test_member_transform_overrides_group_default() {
        let record = single(
            r#"
/// tabletop:codegen
/// transform: upper
pub const CardAce: i64 = 0;
/// transform: lower
pub const CardKing: i64 = 1;
"#,
        );

        assert_eq!(record.display_of("CardAce"), Some("ACE"));
        assert_eq!(record.display_of("CardKing"), Some("king"));
    }

    #[test]
    fn test_combine_directive() {
        let record = single(
            r#"
/// tabletop:codegen
/// combine: AllCards
pub const SuitHearts: i64 = 0;
pub const SuitSpades: i64 = 1;
"#,
        );

        assert_eq!(record.combine_group(), Some("AllCards"));
    }

    #[test]
    fn test_group_ends_at_non_const_item() {
        let (records, failures) = collect(
            r#"
/// tabletop:codegen
pub const ColorRed: i64 = 0;
pub const ColorBlue: i64 = 1;

pub struct Unrelated;

pub const Stray: i64 = 9;
"#,
        );

        assert!(failures.is_empty());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].keys().len(), 2);
    }

    #[test]
    fn test_adjacent_marker_starts_new_group() {
        let (records, failures) = collect(
            r#"
/// tabletop:codegen
pub const ColorRed: i64 = 0;
pub const ColorBlue: i64 = 1;
/// tabletop:codegen
pub const SuitHearts: i64 = 0;
pub const SuitSpades: i64 = 1;
"#,
        );

        assert!(failures.is_empty());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].prefix(), "Color");
        assert_eq!(records[1].prefix(), "Suit");
    }

    #[test]
    fn test_retired_underscore_delimiter_is_rejected() {
        let (records, failures) = collect(
            r#"
/// tabletop:codegen
pub const Phase_Red: i64 = 0;
pub const Phase_Blue: i64 = 1;
"#,
        );

        assert!(records.is_empty());
        assert_eq!(failures.len(), 1);
        let message = failures[0].to_string();
        assert!(message.contains("retired"), "got: {message}");
        assert!(message.contains("000"), "got: {message}");
    }

    #[test]
    fn test_missing_shared_prefix_is_rejected() {
        let (records, failures) = collect(
            r#"
/// tabletop:codegen
pub const Alpha: i64 = 0;
pub const Zulu: i64 = 1;
"#,
        );

        assert!(records.is_empty());
        assert!(failures[0].to_string().contains("no common prefix"));
    }

    #[test]
    fn test_display_collision_is_rejected() {
        let (records, failures) = collect(
            r#"
/// tabletop:codegen
pub const ColorRed: i64 = 0;
/// display:"Red"
pub const ColorBlue: i64 = 1;
"#,
        );

        assert!(records.is_empty());
        assert!(failures[0].to_string().contains("share the display value"));
    }

    #[test]
    fn test_display_colliding_with_key_is_rejected() {
        let (records, failures) = collect(
            r#"
/// tabletop:codegen
/// display:"ColorBlue"
pub const ColorRed: i64 = 0;
pub const ColorBlue: i64 = 1;
"#,
        );

        assert!(records.is_empty());
        assert!(failures[0].to_string().contains("collides with the key"));
    }

    #[test]
    fn test_single_member_group() {
        let record = single(
            r#"
/// tabletop:codegen
pub const Solo: i64 = 0;
"#,
        );

        assert_eq!(record.prefix(), "Solo");
        assert_eq!(record.keys().len(), 1);
        assert_eq!(record.display().len(), 1);
    }

    #[test]
    fn test_mutation_after_bake_is_rejected() {
        let mut record = EnumRecord::new();
        record.add_member("ColorRed", 0).unwrap();
        record.add_member("ColorBlue", 1).unwrap();
        record.process().unwrap();

        let err = record.add_member("ColorGreen", 2).unwrap_err();
        assert!(matches!(err, CodegenError::EnumAlreadyBaked(_)));
    }

    #[test]
    fn test_derive_display_splits_title_case_and_delimiters() {
        assert_eq!(derive_display("PhaseBlueGreenOne", "Phase"), "Blue Green One");
        assert_eq!(
            derive_display("ColorBlue000Green", "Color"),
            "Blue > Green"
        );
        assert_eq!(derive_display("Phase", "Phase"), "");
    }

    #[test]
    fn test_longest_common_prefix() {
        let keys = vec![
            "PhaseBlueGreenOne".to_string(),
            "PhaseBlueGreenTwo".to_string(),
            "Phase".to_string(),
        ];
        assert_eq!(longest_common_prefix(&keys), "Phase");
    }
}
