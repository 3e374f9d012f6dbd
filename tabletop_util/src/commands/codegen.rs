//! The `codegen` subcommand: runs the generator over a package directory
//! and writes whichever artifacts came back non-empty.

use crate::cli::CodegenArgs;
use std::fs;
use std::path::{Path, PathBuf};
use tabletop_codegen::{CodegenConfig, CodegenOptions, Result, process_enums, process_readers};
use tracing::{debug, info};

pub fn run(args: &CodegenArgs, config_path: Option<&Path>) -> Result<()> {
    let dir = args.dir.clone().unwrap_or_else(|| PathBuf::from("."));

    let mut config = match config_path {
        Some(path) => CodegenConfig::from_toml_path(path)?,
        None => CodegenConfig::from_toml_search(&dir)?,
    };
    apply_overrides(&mut config, args);

    // Neither selector means both pipelines.
    let run_readers = args.readers || !args.enums;
    let run_enums = args.enums || !args.readers;

    let opts = CodegenOptions {
        save_unformatted: config.save_unformatted,
    };

    info!(dir = %dir.display(), readers = run_readers, enums = run_enums, "Running codegen");

    // Generate everything before writing anything, so a failing pipeline
    // leaves no partial artifacts behind.
    let reader_artifacts = if run_readers {
        Some(process_readers(&dir, &opts)?)
    } else {
        None
    };
    let enum_artifact = if run_enums {
        Some(process_enums(&dir, &opts)?)
    } else {
        None
    };

    if let Some(artifacts) = reader_artifacts {
        write_artifact(&dir, &config.reader_output, &artifacts.main)?;
        write_artifact(&dir, &config.reader_test_output, &artifacts.test)?;
    }
    if let Some(artifact) = enum_artifact {
        write_artifact(&dir, &config.enum_output, &artifact)?;
    }

    Ok(())
}

fn apply_overrides(config: &mut CodegenConfig, args: &CodegenArgs) {
    if let Some(name) = &args.reader_output {
        config.reader_output = name.clone();
    }
    if let Some(name) = &args.reader_test_output {
        config.reader_test_output = name.clone();
    }
    if let Some(name) = &args.enum_output {
        config.enum_output = name.clone();
    }
    if args.save_unformatted {
        config.save_unformatted = true;
    }
}

/// Writes a non-empty artifact into the package directory. Empty buffers
/// mean the pipeline found nothing to generate.
fn write_artifact(dir: &Path, name: &str, content: &str) -> Result<()> {
    if content.is_empty() {
        debug!(artifact = %name, "Nothing to write");
        return Ok(());
    }

    let path = dir.join(name);
    fs::write(&path, content)?;
    info!(path = %path.display(), bytes = content.len(), "Artifact written");
    Ok(())
}
