//! Struct analysis: classifies every exported field of an annotated
//! structure, merging fields inherited through one level of embedding.

use crate::error::{CodegenError, Result};
use crate::kinds::{Classification, classify_label};
use crate::loader::{self, PackageAst};
use crate::markers::{EmitLevel, doc_lines, emit_level, find_marker};
use convert_case::{Case, Casing};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex};
use tracing::{debug, trace, warn};

/// Cross-package embedded-struct analyses, memoized for the process
/// lifetime. Write-once per `(package directory, type name)`, no eviction.
static EMBED_CACHE: LazyLock<Mutex<HashMap<(PathBuf, String), BTreeMap<String, Classification>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// A structure that carries the codegen marker.
pub struct AnnotatedStruct<'a> {
    pub item: &'a syn::ItemStruct,
    pub level: EmitLevel,
    pub in_test: bool,
}

/// Analysis result for one annotated structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructRecord {
    pub name: String,
    pub level: EmitLevel,
    pub in_test: bool,
    /// Exported field name to classification, iterated in sorted order.
    pub fields: BTreeMap<String, Classification>,
}

/// Returns every top-level structure whose doc block carries the marker.
pub fn find_annotated_structs(pkg: &PackageAst) -> Vec<AnnotatedStruct<'_>> {
    let mut found = Vec::new();

    for file in pkg.authored_files() {
        for item in &file.ast.items {
            if let syn::Item::Struct(item_struct) = item {
                let lines = doc_lines(&item_struct.attrs);
                if let Some(qualifier) = find_marker(&lines) {
                    debug!(
                        struct_name = %item_struct.ident,
                        qualifier = ?qualifier,
                        "Found annotated struct"
                    );
                    found.push(AnnotatedStruct {
                        item: item_struct,
                        level: emit_level(qualifier.as_deref()),
                        in_test: file.is_test,
                    });
                }
            }
        }
    }

    found
}

/// Classifies every field of one annotated structure.
///
/// Per-field classification failures drop the field; only failures that make
/// the whole structure unusable abort the record.
pub fn analyze_struct(
    pkg: &PackageAst,
    dir: &Path,
    annotated: &AnnotatedStruct<'_>,
) -> Result<StructRecord> {
    let name = annotated.item.ident.to_string();
    trace!(struct_name = %name, "Analyzing struct fields");

    let fields = classify_struct_fields(pkg, dir, annotated.item, true)?;

    debug!(
        struct_name = %name,
        fields = fields.len(),
        "Struct analysis complete"
    );

    Ok(StructRecord {
        name,
        level: annotated.level,
        in_test: annotated.in_test,
        fields,
    })
}

/// Classifies fields in declaration order; later entries overwrite earlier
/// ones on name collision, so a structure's own fields shadow inherited ones.
fn classify_struct_fields(
    pkg: &PackageAst,
    dir: &Path,
    item: &syn::ItemStruct,
    allow_embedding: bool,
) -> Result<BTreeMap<String, Classification>> {
    let struct_name = item.ident.to_string();
    let mut out = BTreeMap::new();

    let syn::Fields::Named(named) = &item.fields else {
        return Ok(out);
    };

    for field in &named.named {
        let Some(ident) = &field.ident else { continue };
        let field_name = ident.to_string();

        if !matches!(field.vis, syn::Visibility::Public(_)) {
            trace!(field = %field_name, "Skipping non-public field");
            continue;
        }

        if let Some(label) = type_label(&field.ty)
            && let Some(classification) = classify_label(&label)
        {
            out.insert(field_name, classification);
            continue;
        }

        if allow_embedding && is_embedded_field(&field_name, &field.ty) {
            match resolve_embedded(pkg, dir, &field.ty) {
                Ok(Some(embedded)) => {
                    trace!(
                        field = %field_name,
                        inherited = embedded.len(),
                        "Merged embedded struct fields"
                    );
                    out.extend(embedded);
                }
                Ok(None) => {
                    trace!(field = %field_name, "Skipping framework base embed");
                }
                Err(e) => {
                    warn!(
                        struct_name = %struct_name,
                        field = %field_name,
                        error = %e,
                        "Could not analyze embedded struct; field dropped"
                    );
                }
            }
            continue;
        }

        let label = type_label(&field.ty).unwrap_or_else(|| "<unlabeled>".to_string());
        warn!(
            "{}",
            CodegenError::unknown_field_type(&struct_name, &field_name, label)
        );
    }

    Ok(out)
}

/// An embedded field is named after its type: the declared type's last path
/// segment converted to snake case.
fn is_embedded_field(field_name: &str, ty: &syn::Type) -> bool {
    match path_segments(ty) {
        Some(segments) => segments
            .last()
            .is_some_and(|last| last.to_case(Case::Snake) == field_name),
        None => false,
    }
}

/// Resolves an embedded struct to its classified fields.
///
/// Same-package types are searched among this package's declarations.
/// Path-qualified types resolve the package as the sibling directory named
/// by the qualifier, parsed on disk and memoized for the process lifetime.
/// Framework base types (`tabletop::…`) contribute no exported fields.
fn resolve_embedded(
    pkg: &PackageAst,
    dir: &Path,
    ty: &syn::Type,
) -> Result<Option<BTreeMap<String, Classification>>> {
    let segments = path_segments(ty).unwrap_or_default();

    match segments.as_slice() {
        [type_name] => {
            let Some(target) = find_struct(pkg, type_name) else {
                return Err(CodegenError::unknown_field_type(
                    type_name.as_str(),
                    "<embedded>",
                    type_name.as_str(),
                ));
            };
            classify_struct_fields(pkg, dir, target, false).map(Some)
        }
        [qualifier, type_name] if qualifier == "tabletop" => {
            trace!(type_name = %type_name, "Ignoring host framework base type");
            Ok(None)
        }
        [qualifier, type_name] => {
            cross_package_fields(dir, qualifier, type_name).map(Some)
        }
        _ => Err(CodegenError::unknown_field_type(
            "<embedded>",
            "<embedded>",
            segments.join("::"),
        )),
    }
}

fn cross_package_fields(
    dir: &Path,
    package: &str,
    type_name: &str,
) -> Result<BTreeMap<String, Classification>> {
    let sibling = dir
        .parent()
        .map(|parent| parent.join(package))
        .unwrap_or_else(|| PathBuf::from(package));

    let cache_key = (sibling.clone(), type_name.to_string());

    if let Some(cached) = EMBED_CACHE.lock().unwrap().get(&cache_key) {
        trace!(package = %package, type_name = %type_name, "Embedded analysis cache hit");
        return Ok(cached.clone());
    }

    if !sibling.is_dir() {
        return Err(CodegenError::embedded_package_unresolved(package, sibling));
    }

    debug!(
        package = %package,
        type_name = %type_name,
        dir = %sibling.display(),
        "Parsing sibling package for embedded struct"
    );

    let other = loader::load_package(&sibling)?;
    let Some(target) = find_struct(&other, type_name) else {
        return Err(CodegenError::embedded_package_unresolved(
            format!("{package}::{type_name}"),
            sibling,
        ));
    };

    let fields = classify_struct_fields(&other, &sibling, target, false)?;

    EMBED_CACHE
        .lock()
        .unwrap()
        .insert(cache_key, fields.clone());

    Ok(fields)
}

fn find_struct<'a>(pkg: &'a PackageAst, name: &str) -> Option<&'a syn::ItemStruct> {
    pkg.authored_files()
        .flat_map(|file| file.ast.items.iter())
        .find_map(|item| match item {
            syn::Item::Struct(item_struct) if item_struct.ident == name => Some(item_struct),
            _ => None,
        })
}

/// Canonical label of a declared field type: the path's last segment, with
/// `Vec<…>` recognized as the slice qualifier.
fn type_label(ty: &syn::Type) -> Option<String> {
    let syn::Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    let ident = segment.ident.to_string();

    if ident == "Vec" {
        if let syn::PathArguments::AngleBracketed(args) = &segment.arguments
            && let Some(syn::GenericArgument::Type(inner)) = args.args.first()
        {
            return type_label(inner).map(|inner| format!("Vec<{inner}>"));
        }
        return None;
    }

    if !matches!(segment.arguments, syn::PathArguments::None) {
        return None;
    }

    Some(ident)
}

fn path_segments(ty: &syn::Type) -> Option<Vec<String>> {
    let syn::Type::Path(type_path) = ty else {
        return None;
    };
    Some(
        type_path
            .path
            .segments
            .iter()
            .map(|segment| segment.ident.to_string())
            .collect(),
    )
}
