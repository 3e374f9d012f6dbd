//! Toolchain configuration loaded from `tabletop.toml`.

use crate::error::{CodegenError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings for one generator invocation.
///
/// The `[codegen]` table of `tabletop.toml` carries the artifact file names
/// and the formatter-gate debug switch. Command-line flags override whatever
/// the file supplies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodegenConfig {
    /// File name for the main reader artifact.
    pub reader_output: String,

    /// File name for the in-test reader artifact.
    pub reader_test_output: String,

    /// File name for the enum artifact.
    pub enum_output: String,

    /// Surface unformatted output when the formatter gate rejects a buffer.
    /// Development affordance for template authoring; off by default.
    pub save_unformatted: bool,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            reader_output: "auto_reader.rs".to_string(),
            reader_test_output: "auto_reader_test.rs".to_string(),
            enum_output: "auto_enum.rs".to_string(),
            save_unformatted: false,
        }
    }
}

impl CodegenConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a specific `tabletop.toml` file.
    pub fn from_toml_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Searches for `tabletop.toml` starting from the given directory and
    /// walking upward. Absence is not an error; defaults apply.
    pub fn from_toml_search(start_dir: &Path) -> Result<Self> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join("tabletop.toml");
            if config_path.exists() {
                return Self::from_toml_path(&config_path);
            }

            if !current.pop() {
                return Ok(Self::default());
            }
        }
    }

    fn parse_toml(content: &str) -> Result<Self> {
        let value: toml::Value =
            toml::from_str(content).map_err(|e| CodegenError::config(e.to_string()))?;

        let mut config = Self::default();

        if let Some(codegen) = value.get("codegen").and_then(|v| v.as_table()) {
            if let Some(name) = codegen.get("reader_output").and_then(|v| v.as_str()) {
                config.reader_output = name.to_string();
            }

            if let Some(name) = codegen.get("reader_test_output").and_then(|v| v.as_str()) {
                config.reader_test_output = name.to_string();
            }

            if let Some(name) = codegen.get("enum_output").and_then(|v| v.as_str()) {
                config.enum_output = name.to_string();
            }

            if let Some(v) = codegen.get("save_unformatted") {
                config.save_unformatted = v.as_bool().unwrap_or(false);
            }
        }

        Ok(config)
    }
}
