//! Code-generation engine for the tabletop board-game framework.
//!
//! Game packages hand-write their state structures and enum constants; this
//! crate analyzes a package directory and produces the companion files the
//! framework expects:
//!
//! - a property-reader adapter exposing each exported field of marked
//!   structures through a typed, string-keyed getter/setter/configurer
//!   surface (plus a separate artifact for structures declared in test
//!   files), and
//! - an enum descriptor materializing marked constant groups into runtime
//!   enum registrations, with display-name derivation and implicit
//!   parent/child tree structure.
//!
//! The generator reads its annotations from doc comments adjacent to the
//! declarations under analysis, so the author's source stays the single
//! source of truth. It returns artifact buffers; callers decide where (and
//! whether) to write them.

pub mod config;
pub mod enums;
pub mod error;
pub mod format;
pub mod kinds;
pub mod loader;
pub mod markers;
pub mod reader;

pub use config::CodegenConfig;
pub use error::{CodegenError, Result};
pub use loader::GENERATED_BANNER;

use std::path::Path;
use tracing::{debug, info, warn};

/// Options threaded through one generator invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodegenOptions {
    /// Surface unformatted output when the formatter gate rejects a buffer.
    pub save_unformatted: bool,
}

/// The two reader artifact buffers. Either may be empty, which callers
/// interpret as "do not write".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderArtifacts {
    pub main: String,
    pub test: String,
}

/// Runs the reader pipeline over one package directory and returns the main
/// and in-test artifact buffers.
pub fn process_readers(dir: impl AsRef<Path>, opts: &CodegenOptions) -> Result<ReaderArtifacts> {
    let dir = dir.as_ref();
    let pkg = loader::load_package(dir)?;

    let annotated = reader::find_annotated_structs(&pkg);
    info!(
        package = %pkg.name,
        structs = annotated.len(),
        "Reader analysis starting"
    );

    let mut main_records = Vec::new();
    let mut test_records = Vec::new();
    let mut failures = Vec::new();

    for candidate in &annotated {
        match reader::analyze_struct(&pkg, dir, candidate) {
            Ok(record) if record.in_test => test_records.push(record),
            Ok(record) => main_records.push(record),
            Err(e) => {
                warn!(
                    struct_name = %candidate.item.ident,
                    error = %e,
                    "Struct skipped"
                );
                failures.push(e);
            }
        }
    }

    let main = finish_artifact(reader::emit_reader_file(&main_records), opts)?;
    let test = finish_artifact(reader::emit_reader_file(&test_records), opts)?;

    if main.is_empty() && test.is_empty() && !failures.is_empty() {
        return Err(CodegenError::nothing_produced(
            failures
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        ));
    }

    debug!(
        main_bytes = main.len(),
        test_bytes = test.len(),
        "Reader artifacts ready"
    );

    Ok(ReaderArtifacts { main, test })
}

/// Runs the enum pipeline over one package directory and returns the enum
/// artifact buffer.
pub fn process_enums(dir: impl AsRef<Path>, opts: &CodegenOptions) -> Result<String> {
    let dir = dir.as_ref();
    let pkg = loader::load_package(dir)?;

    let (records, failures) = enums::collect_enums(&pkg);
    info!(
        package = %pkg.name,
        enums = records.len(),
        skipped = failures.len(),
        "Enum analysis complete"
    );

    let artifact = finish_artifact(enums::emit_enum_file(&pkg, &records), opts)?;

    if artifact.is_empty() && !failures.is_empty() {
        return Err(CodegenError::nothing_produced(
            failures
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        ));
    }

    Ok(artifact)
}

/// Formats a non-empty buffer and prepends the generated-file banner. The
/// banner goes on after the gate because the formatter does not carry plain
/// comments through.
fn finish_artifact(body: String, opts: &CodegenOptions) -> Result<String> {
    if body.is_empty() {
        return Ok(body);
    }
    let formatted = format::format_source(&body, opts.save_unformatted)?;
    Ok(format!("{GENERATED_BANNER}\n\n{formatted}"))
}
