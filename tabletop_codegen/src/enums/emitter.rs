//! Emits the enum registration artifact.

use crate::enums::EnumRecord;
use crate::loader::PackageAst;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace};

/// Seed ordinal for the first synthesized key. Far below zero so
/// author-defined ordinals counting up from zero never collide; later
/// synthesized keys follow by increment.
const SYNTHESIZED_SEED: &str = "-1_000_000";

const ENUM_IMPORTS: &str = "\
use super::*;
use std::sync::LazyLock;
use tabletop::enums;
";

/// Emits the enum artifact body (unformatted, without banner) for the given
/// records. Returns the empty string when no enum was collected.
pub fn emit_enum_file(pkg: &PackageAst, records: &[EnumRecord]) -> String {
    if records.is_empty() {
        return String::new();
    }

    debug!(enums = records.len(), "Emitting enum artifact");

    let mut out = String::new();
    out.push_str("#![allow(dead_code)]\n");
    out.push_str("#![allow(unused_imports)]\n");
    out.push_str("#![allow(non_upper_case_globals)]\n");
    out.push_str("#![allow(clippy::all)]\n\n");
    out.push_str(ENUM_IMPORTS);
    out.push('\n');
    out.push_str("pub static ENUMS: LazyLock<enums::Set> = LazyLock::new(enums::Set::new);\n\n");

    emit_synthesized_consts(&mut out, records);

    for record in records {
        emit_registration(&mut out, record);
    }

    emit_combine_groups(&mut out, records);
    emit_delegate_wiring(&mut out, pkg);

    out
}

/// One `const` run for every synthesized key in the file. The first key
/// anchors the run with the explicit seed; the rest auto-increment off it.
fn emit_synthesized_consts(out: &mut String, records: &[EnumRecord]) {
    let mut previous: Option<&str> = None;

    for record in records {
        for key in record.synthesized() {
            match previous {
                None => out.push_str(&format!("pub const {key}: i64 = {SYNTHESIZED_SEED};\n")),
                Some(prev) => out.push_str(&format!("pub const {key}: i64 = {prev} + 1;\n")),
            }
            previous = Some(key);
        }
    }

    if previous.is_some() {
        out.push('\n');
    }
}

fn emit_registration(out: &mut String, record: &EnumRecord) {
    let prefix = record.prefix();

    let mut keys: Vec<&String> = record.keys().iter().collect();
    keys.sort();

    out.push_str(&format!(
        "pub static {prefix}Enum: LazyLock<enums::Enum> = LazyLock::new(|| {{\n"
    ));

    if record.is_tree() {
        out.push_str(&format!("ENUMS.must_add_tree(\n\"{prefix}\",\n&[\n"));
    } else {
        out.push_str(&format!("ENUMS.must_add(\n\"{prefix}\",\n&[\n"));
    }

    for key in &keys {
        let display = record.display_of(key).unwrap_or_default();
        out.push_str(&format!("({key}, {display:?}),\n"));
    }
    out.push_str("],\n");

    if record.is_tree() {
        out.push_str("&[\n");
        for key in &keys {
            if let Some(parent) = record.parents().get(key.as_str()) {
                out.push_str(&format!("({key}, {parent}),\n"));
            }
        }
        out.push_str("],\n");
    }

    out.push_str(")\n});\n\n");
}

/// Combine groups register after every per-enum block, in lexicographic
/// group order; member enums are sorted by their static name.
fn emit_combine_groups(out: &mut String, records: &[EnumRecord]) {
    let mut groups: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for record in records {
        if let Some(group) = record.combine_group() {
            groups
                .entry(group)
                .or_default()
                .push(format!("{}Enum", record.prefix()));
        }
    }

    for (group, mut members) in groups {
        members.sort();
        trace!(group = %group, members = members.len(), "Emitting combine group");

        let refs: Vec<String> = members.iter().map(|name| format!("&*{name}")).collect();
        out.push_str(&format!(
            "pub static {group}Enum: LazyLock<enums::Enum> = LazyLock::new(|| {{\nENUMS.must_combine(\"{group}\", &[{}])\n}});\n\n",
            refs.join(", ")
        ));
    }
}

/// Wires `configure_enums` onto every structure that declares
/// `configure_moves` without it. Files generated by an earlier run are
/// ignored so their wiring from last time does not suppress this one.
fn emit_delegate_wiring(out: &mut String, pkg: &PackageAst) {
    let mut with_moves = BTreeSet::new();
    let mut with_enums = BTreeSet::new();

    for file in pkg.authored_files() {
        for item in &file.ast.items {
            let syn::Item::Impl(item_impl) = item else {
                continue;
            };
            let Some(name) = impl_self_name(item_impl) else {
                continue;
            };

            for impl_item in &item_impl.items {
                if let syn::ImplItem::Fn(method) = impl_item {
                    if method.sig.ident == "configure_moves" {
                        with_moves.insert(name.clone());
                    } else if method.sig.ident == "configure_enums" {
                        with_enums.insert(name.clone());
                    }
                }
            }
        }
    }

    for name in with_moves.difference(&with_enums) {
        debug!(delegate = %name, "Wiring configure_enums");
        out.push_str(&format!(
            "impl {name} {{\npub fn configure_enums(&self) -> &'static enums::Set {{\n&ENUMS\n}}\n}}\n\n"
        ));
    }
}

fn impl_self_name(item_impl: &syn::ItemImpl) -> Option<String> {
    let syn::Type::Path(type_path) = &*item_impl.self_ty else {
        return None;
    };
    type_path
        .path
        .segments
        .last()
        .map(|segment| segment.ident.to_string())
}
