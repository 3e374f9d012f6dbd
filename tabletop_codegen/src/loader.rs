//! Package loading: parses every source file in a game-package directory.

use crate::error::{CodegenError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Opening line of every generated artifact. Files that begin with this line
/// are recognized as output of an earlier run and excluded from delegate
/// wiring, so regeneration converges.
pub const GENERATED_BANNER: &str = "// Code generated by tabletop-util codegen. DO NOT EDIT.";

/// Suffix tagging files whose structures route to the in-test reader artifact.
pub const TEST_FILE_SUFFIX: &str = "_test.rs";

/// One parsed source file of the analyzed package.
#[derive(Debug)]
pub struct SourceFile {
    pub path: PathBuf,
    pub ast: syn::File,
    /// File name ends in [`TEST_FILE_SUFFIX`].
    pub is_test: bool,
    /// File opens with [`GENERATED_BANNER`].
    pub is_generated: bool,
}

/// The parsed package: every `.rs` file directly inside one directory.
#[derive(Debug)]
pub struct PackageAst {
    /// Package name, taken from the directory name.
    pub name: String,
    pub files: Vec<SourceFile>,
}

impl PackageAst {
    /// Iterates files that were written by hand (not by an earlier run).
    pub fn authored_files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter().filter(|f| !f.is_generated)
    }
}

/// Parses every `.rs` file directly inside `dir` (no recursion).
///
/// Doc comments survive parsing as `#[doc]` attributes, which is where the
/// annotation surface lives. Any file `syn` rejects aborts the load.
pub fn load_package(dir: &Path) -> Result<PackageAst> {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| ".".to_string());

    debug!(package = %name, dir = %dir.display(), "Loading package sources");

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "rs"))
        .collect();
    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let content = fs::read_to_string(&path)?;

        let ast = syn::parse_file(&content)
            .map_err(|e| CodegenError::source_parse(&path, e.to_string()))?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let is_test = file_name.ends_with(TEST_FILE_SUFFIX);
        let is_generated = content
            .lines()
            .next()
            .is_some_and(|first| first.trim_end() == GENERATED_BANNER);

        trace!(
            file = %file_name,
            items = ast.items.len(),
            is_test,
            is_generated,
            "Parsed source file"
        );

        files.push(SourceFile {
            path,
            ast,
            is_test,
            is_generated,
        });
    }

    debug!(package = %name, files = files.len(), "Package loaded");

    Ok(PackageAst { name, files })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn stage(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        for (name, content) in files {
            fs::write(dir.path().join(name), content).expect("write source");
        }
        dir
    }

    #[test]
    fn test_load_package_tags_test_files() {
        let dir = stage(&[
            ("state.rs", "pub struct GameState { pub count: i64 }\n"),
            ("state_test.rs", "pub struct TestState { pub count: i64 }\n"),
        ]);

        let pkg = load_package(dir.path()).expect("load");
        assert_eq!(pkg.files.len(), 2);
        assert!(!pkg.files[0].is_test);
        assert!(pkg.files[1].is_test);
    }

    #[test]
    fn test_load_package_tags_generated_files() {
        let source = format!("{GENERATED_BANNER}\n\npub struct Leftover;\n");
        let dir = stage(&[("auto_enum.rs", &source), ("state.rs", "pub struct S;\n")]);

        let pkg = load_package(dir.path()).expect("load");
        assert!(pkg.files[0].is_generated);
        assert!(!pkg.files[1].is_generated);
        assert_eq!(pkg.authored_files().count(), 1);
    }

    #[test]
    fn test_load_package_rejects_unparseable_source() {
        let dir = stage(&[("broken.rs", "pub struct {\n")]);

        let err = load_package(dir.path()).expect_err("should fail");
        assert!(matches!(err, CodegenError::SourceParse { .. }));
    }

    #[test]
    fn test_load_package_ignores_non_rust_files() {
        let dir = stage(&[("notes.txt", "not rust"), ("state.rs", "pub struct S;\n")]);

        let pkg = load_package(dir.path()).expect("load");
        assert_eq!(pkg.files.len(), 1);
    }
}
