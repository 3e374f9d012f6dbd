//! Emits the property-reader adapter for each analyzed structure.
//!
//! Every adapter exposes the generic `props`/`prop`/`set_prop`/
//! `configure_prop` surface plus one typed accessor family per property
//! kind. Dispatch arms are sorted by field name so output is deterministic.

use crate::kinds::{Classification, PropertyKind};
use crate::markers::EmitLevel;
use crate::reader::StructRecord;
use tracing::debug;

/// The import block every reader artifact opens with.
const READER_IMPORTS: &str = "\
use super::*;
use std::collections::BTreeMap;
use tabletop::errors::PropertyError;
use tabletop::properties::{
    Board, EnumVal, ImmutableBoard, ImmutableEnumVal, ImmutableStack, ImmutableTimer,
    PlayerIndex, PropertyKind, PropertyReadSetConfigurer, PropertyReadSetter, PropertyReader,
    PropertyValue, Stack, Timer,
};
";

/// Adapter type name for a struct: a capitalized sigil prefix that no
/// hand-written type uses.
pub fn adapter_name(struct_name: &str) -> String {
    format!("Auto{struct_name}Reader")
}

/// Emits the full reader artifact body (unformatted, without banner) for the
/// given records. Returns the empty string when there is nothing to emit.
pub fn emit_reader_file(records: &[StructRecord]) -> String {
    if records.is_empty() {
        return String::new();
    }

    debug!(structs = records.len(), "Emitting reader artifact");

    let mut out = String::new();
    out.push_str("#![allow(dead_code)]\n");
    out.push_str("#![allow(unused_imports)]\n");
    out.push_str("#![allow(unused_variables)]\n");
    out.push_str("#![allow(clippy::all)]\n\n");
    out.push_str(READER_IMPORTS);
    out.push('\n');

    for record in records {
        emit_struct(&mut out, record);
    }

    out
}

fn emit_struct(out: &mut String, record: &StructRecord) {
    let adapter = adapter_name(&record.name);
    let name = &record.name;

    out.push_str(&format!(
        "pub struct {adapter}<'a> {{ data: &'a mut {name} }}\n\n"
    ));
    out.push_str(&format!(
        "impl {name} {{\n    pub fn reader(&mut self) -> {adapter}<'_> {{ {adapter} {{ data: self }} }}\n}}\n\n"
    ));

    emit_reader_impl(out, record, &adapter);
    if record.level >= EmitLevel::ReadSetter {
        emit_setter_impl(out, record, &adapter);
    }
    if record.level >= EmitLevel::ReadSetConfigurer {
        emit_configurer_impl(out, record, &adapter);
    }
}

/// Fields of one kind, already sorted by name via the record's map order.
fn fields_of_kind<'a>(
    record: &'a StructRecord,
    kind: PropertyKind,
) -> impl Iterator<Item = (&'a String, &'a Classification)> {
    record
        .fields
        .iter()
        .filter(move |(_, cls)| cls.kind == kind)
}

/// Expression yielding the immutable facade of a container field.
fn immutable_container_expr(field: &str, cls: &Classification) -> String {
    let base = if cls.mutable {
        format!("self.data.{field}.as_immutable()")
    } else {
        format!("self.data.{field}.clone()")
    };
    if cls.sub_type.is_some() {
        format!("{base}.into()")
    } else {
        base
    }
}

/// Expression yielding a scalar field's value.
fn scalar_expr(field: &str, cls: &Classification) -> String {
    if cls.kind.is_copy() {
        format!("self.data.{field}")
    } else {
        format!("self.data.{field}.clone()")
    }
}

fn emit_reader_impl(out: &mut String, record: &StructRecord, adapter: &str) {
    out.push_str(&format!(
        "impl<'a> PropertyReader for {adapter}<'a> {{\n"
    ));

    // props()
    out.push_str("fn props(&self) -> BTreeMap<&'static str, PropertyKind> {\n");
    if record.fields.is_empty() {
        out.push_str("BTreeMap::new()\n");
    } else {
        out.push_str("let mut props = BTreeMap::new();\n");
        for (field, cls) in &record.fields {
            out.push_str(&format!(
                "props.insert(\"{field}\", {});\n",
                cls.kind.variant_path()
            ));
        }
        out.push_str("props\n");
    }
    out.push_str("}\n\n");

    // prop()
    out.push_str("fn prop(&self, name: &str) -> Result<PropertyValue, PropertyError> {\n");
    out.push_str("match name {\n");
    for (field, cls) in &record.fields {
        let expr = if cls.kind.is_container() {
            immutable_container_expr(field, cls)
        } else {
            scalar_expr(field, cls)
        };
        out.push_str(&format!(
            "\"{field}\" => Ok(PropertyValue::{}({expr})),\n",
            cls.kind.value_variant_immutable()
        ));
    }
    out.push_str("_ => Err(PropertyError::unknown_property(name)),\n}\n}\n\n");

    // Typed getters for every kind.
    for kind in PropertyKind::ALL {
        let key = kind.method_key();
        if kind.is_container() {
            out.push_str(&format!(
                "fn immutable_{key}_prop(&self, name: &str) -> Result<{}, PropertyError> {{\n",
                kind.immutable_label()
            ));
            out.push_str("match name {\n");
            for (field, cls) in fields_of_kind(record, kind) {
                out.push_str(&format!(
                    "\"{field}\" => Ok({}),\n",
                    immutable_container_expr(field, cls)
                ));
            }
        } else {
            out.push_str(&format!(
                "fn {key}_prop(&self, name: &str) -> Result<{}, PropertyError> {{\n",
                kind.immutable_label()
            ));
            out.push_str("match name {\n");
            for (field, cls) in fields_of_kind(record, kind) {
                out.push_str(&format!("\"{field}\" => Ok({}),\n", scalar_expr(field, cls)));
            }
        }
        out.push_str("_ => Err(PropertyError::unknown_property(name)),\n}\n}\n\n");
    }

    out.push_str("}\n\n");
}

fn emit_setter_impl(out: &mut String, record: &StructRecord, adapter: &str) {
    out.push_str(&format!(
        "impl<'a> PropertyReadSetter for {adapter}<'a> {{\n"
    ));

    // prop_mutable()
    out.push_str("fn prop_mutable(&self, name: &str) -> bool {\n");
    out.push_str("match name {\n");
    for (field, cls) in &record.fields {
        out.push_str(&format!("\"{field}\" => {},\n", cls.mutable));
    }
    out.push_str("_ => false,\n}\n}\n\n");

    // set_prop(): scalars type-check and assign; containers always refuse
    // and direct the caller to configure_prop.
    out.push_str(
        "fn set_prop(&mut self, name: &str, value: PropertyValue) -> Result<(), PropertyError> {\n",
    );
    out.push_str("match name {\n");
    for (field, cls) in &record.fields {
        if cls.kind.is_container() {
            out.push_str(&format!(
                "\"{field}\" => Err(PropertyError::immutable_entry_point(name)),\n"
            ));
        } else {
            out.push_str(&format!(
                "\"{field}\" => match value {{\nPropertyValue::{variant}(value) => self.set_{key}_prop(name, value),\n_ => Err(PropertyError::type_mismatch(name)),\n}},\n",
                variant = cls.kind.value_variant_immutable(),
                key = cls.kind.method_key()
            ));
        }
    }
    out.push_str("_ => Err(PropertyError::unknown_property(name)),\n}\n}\n\n");

    // Typed scalar setters.
    for kind in PropertyKind::ALL {
        if kind.is_container() {
            continue;
        }
        out.push_str(&format!(
            "fn set_{}_prop(&mut self, name: &str, value: {}) -> Result<(), PropertyError> {{\n",
            kind.method_key(),
            kind.mutable_label()
        ));
        out.push_str("match name {\n");
        for (field, _) in fields_of_kind(record, kind) {
            out.push_str(&format!(
                "\"{field}\" => {{\nself.data.{field} = value;\nOk(())\n}}\n"
            ));
        }
        out.push_str("_ => Err(PropertyError::unknown_property(name)),\n}\n}\n\n");
    }

    // Mutable container getters.
    for kind in PropertyKind::CONTAINERS {
        let key = kind.method_key();
        out.push_str(&format!(
            "fn {key}_prop(&self, name: &str) -> Result<{}, PropertyError> {{\n",
            kind.mutable_label()
        ));
        out.push_str("match name {\n");
        for (field, cls) in fields_of_kind(record, kind) {
            if cls.mutable {
                let suffix = if cls.sub_type.is_some() { ".into()" } else { "" };
                out.push_str(&format!(
                    "\"{field}\" => Ok(self.data.{field}.clone(){suffix}),\n"
                ));
            } else {
                out.push_str(&format!(
                    "\"{field}\" => Err(PropertyError::property_immutable(name)),\n"
                ));
            }
        }
        out.push_str("_ => Err(PropertyError::unknown_property(name)),\n}\n}\n\n");
    }

    out.push_str("}\n\n");
}

fn emit_configurer_impl(out: &mut String, record: &StructRecord, adapter: &str) {
    out.push_str(&format!(
        "impl<'a> PropertyReadSetConfigurer for {adapter}<'a> {{\n"
    ));

    // configure_prop(): scalars delegate to set_prop; containers accept
    // either facade, consulting the field's mutability.
    out.push_str(
        "fn configure_prop(&mut self, name: &str, value: PropertyValue) -> Result<(), PropertyError> {\n",
    );
    out.push_str("match name {\n");
    for (field, cls) in &record.fields {
        if !cls.kind.is_container() {
            out.push_str(&format!("\"{field}\" => self.set_prop(name, value),\n"));
            continue;
        }
        let key = cls.kind.method_key();
        let mutable_variant = cls.kind.value_variant_mutable();
        let immutable_variant = cls.kind.value_variant_immutable();
        if cls.mutable {
            out.push_str(&format!(
                "\"{field}\" => match value {{\nPropertyValue::{mutable_variant}(value) => self.configure_{key}_prop(name, value),\n_ => Err(PropertyError::type_mismatch(name)),\n}},\n"
            ));
        } else {
            out.push_str(&format!(
                "\"{field}\" => match value {{\nPropertyValue::{mutable_variant}(value) => self.configure_immutable_{key}_prop(name, value.as_immutable()),\nPropertyValue::{immutable_variant}(value) => self.configure_immutable_{key}_prop(name, value),\n_ => Err(PropertyError::type_mismatch(name)),\n}},\n"
            ));
        }
    }
    out.push_str("_ => Err(PropertyError::unknown_property(name)),\n}\n}\n\n");

    // Typed configurers per container kind, mutable then immutable facade.
    for kind in PropertyKind::CONTAINERS {
        let key = kind.method_key();

        out.push_str(&format!(
            "fn configure_{key}_prop(&mut self, name: &str, value: {}) -> Result<(), PropertyError> {{\n",
            kind.mutable_label()
        ));
        out.push_str("match name {\n");
        for (field, cls) in fields_of_kind(record, kind) {
            if !cls.mutable {
                out.push_str(&format!(
                    "\"{field}\" => Err(PropertyError::property_immutable(name)),\n"
                ));
                continue;
            }
            match cls.sub_type.and_then(|sub| sub.mutable_coercion()) {
                Some(coercion) => out.push_str(&format!(
                    "\"{field}\" => match value.{coercion}() {{\nSome(value) => {{\nself.data.{field} = value;\nOk(())\n}}\nNone => Err(PropertyError::coercion_failed(name)),\n}},\n"
                )),
                None => out.push_str(&format!(
                    "\"{field}\" => {{\nself.data.{field} = value;\nOk(())\n}}\n"
                )),
            }
        }
        out.push_str("_ => Err(PropertyError::unknown_property(name)),\n}\n}\n\n");

        out.push_str(&format!(
            "fn configure_immutable_{key}_prop(&mut self, name: &str, value: {}) -> Result<(), PropertyError> {{\n",
            kind.immutable_label()
        ));
        out.push_str("match name {\n");
        for (field, cls) in fields_of_kind(record, kind) {
            if cls.mutable {
                out.push_str(&format!(
                    "\"{field}\" => Err(PropertyError::property_not_immutable(name)),\n"
                ));
                continue;
            }
            match cls.sub_type.map(|sub| sub.immutable_coercion()) {
                Some(coercion) => out.push_str(&format!(
                    "\"{field}\" => match value.{coercion}() {{\nSome(value) => {{\nself.data.{field} = value;\nOk(())\n}}\nNone => Err(PropertyError::coercion_failed(name)),\n}},\n"
                )),
                None => out.push_str(&format!(
                    "\"{field}\" => {{\nself.data.{field} = value;\nOk(())\n}}\n"
                )),
            }
        }
        out.push_str("_ => Err(PropertyError::unknown_property(name)),\n}\n}\n\n");
    }

    out.push_str("}\n\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::{SubType, classify_label};
    use std::collections::BTreeMap;

    fn record(level: EmitLevel, fields: &[(&str, &str)]) -> StructRecord {
        let fields: BTreeMap<String, Classification> = fields
            .iter()
            .map(|(name, label)| {
                (
                    name.to_string(),
                    classify_label(label).expect("known label"),
                )
            })
            .collect();
        StructRecord {
            name: "GameState".to_string(),
            level,
            in_test: false,
            fields,
        }
    }

    #[test]
    fn test_emit_empty_records() {
        assert_eq!(emit_reader_file(&[]), String::new());
    }

    #[test]
    fn test_output_is_parseable_rust() {
        let record = record(
            EmitLevel::ReadSetConfigurer,
            &[
                ("count", "i64"),
                ("name", "String"),
                ("busted", "bool"),
                ("hand", "ImmutableStack"),
                ("discard", "Stack"),
                ("draw", "SizedStack"),
                ("phase", "ImmutableRangeVal"),
            ],
        );
        let source = emit_reader_file(&[record]);
        syn::parse_file(&source).expect("generated reader must parse");
    }

    #[test]
    fn test_scalar_arms_and_props() {
        let record = record(
            EmitLevel::ReadSetConfigurer,
            &[("count", "i64"), ("busted", "bool")],
        );
        let source = emit_reader_file(&[record]);

        assert!(source.contains("props.insert(\"busted\", PropertyKind::Bool);"));
        assert!(source.contains("props.insert(\"count\", PropertyKind::Int);"));
        assert!(source.contains("\"count\" => Ok(PropertyValue::Int(self.data.count)),"));
        assert!(source.contains("PropertyValue::Int(value) => self.set_int_prop(name, value),"));
    }

    #[test]
    fn test_container_set_prop_always_refuses() {
        let record = record(EmitLevel::ReadSetConfigurer, &[("discard", "Stack")]);
        let source = emit_reader_file(&[record]);

        // Mutable or not, set_prop refuses containers.
        assert!(source.contains("\"discard\" => Err(PropertyError::immutable_entry_point(name)),"));
        assert!(source.contains("\"discard\" => true,"));
    }

    #[test]
    fn test_immutable_field_configure_accepts_both_facades() {
        let record = record(EmitLevel::ReadSetConfigurer, &[("hand", "ImmutableStack")]);
        let source = emit_reader_file(&[record]);

        assert!(source.contains(
            "PropertyValue::Stack(value) => self.configure_immutable_stack_prop(name, value.as_immutable()),"
        ));
        assert!(source.contains(
            "PropertyValue::ImmutableStack(value) => self.configure_immutable_stack_prop(name, value),"
        ));
        // Mutable entry point rejects the immutable field.
        assert!(source.contains("\"hand\" => Err(PropertyError::property_immutable(name)),"));
    }

    #[test]
    fn test_sub_type_coercion_in_configurer() {
        let record = record(EmitLevel::ReadSetConfigurer, &[("draw", "SizedStack")]);
        let cls = record.fields["draw"];
        assert_eq!(cls.sub_type, Some(SubType::Sized));

        let source = emit_reader_file(&[record]);
        assert!(source.contains("\"draw\" => match value.as_sized() {"));
        assert!(source.contains("None => Err(PropertyError::coercion_failed(name)),"));
    }

    #[test]
    fn test_levels_gate_trait_impls() {
        let reader_only = record(EmitLevel::Reader, &[("count", "i64")]);
        let source = emit_reader_file(&[reader_only]);
        assert!(source.contains("impl<'a> PropertyReader for"));
        assert!(!source.contains("impl<'a> PropertyReadSetter for"));
        assert!(!source.contains("impl<'a> PropertyReadSetConfigurer for"));

        let setter = record(EmitLevel::ReadSetter, &[("count", "i64")]);
        let source = emit_reader_file(&[setter]);
        assert!(source.contains("impl<'a> PropertyReadSetter for"));
        assert!(!source.contains("impl<'a> PropertyReadSetConfigurer for"));
    }

    #[test]
    fn test_zero_field_struct_surface() {
        let record = record(EmitLevel::ReadSetConfigurer, &[]);
        let source = emit_reader_file(&[record]);

        assert!(source.contains("BTreeMap::new()"));
        syn::parse_file(&source).expect("generated reader must parse");
    }

    #[test]
    fn test_arms_sorted_by_field_name() {
        let record = record(
            EmitLevel::Reader,
            &[("zebra", "i64"), ("apple", "i64"), ("mango", "i64")],
        );
        let source = emit_reader_file(&[record]);

        let apple = source.find("\"apple\" => Ok(self.data.apple)").unwrap();
        let mango = source.find("\"mango\" => Ok(self.data.mango)").unwrap();
        let zebra = source.find("\"zebra\" => Ok(self.data.zebra)").unwrap();
        assert!(apple < mango && mango < zebra);
    }
}
