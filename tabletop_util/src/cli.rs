//! Command-line interface definitions for tabletop-util.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// tabletop-util - toolchain for the tabletop board-game framework
#[derive(Parser, Debug)]
#[command(name = "tabletop-util")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to tabletop.toml configuration file
    #[arg(short, long, global = true, env = "TABLETOP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output (-v, -vv for increasing verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate property readers and enum registrations for a game package
    Codegen(CodegenArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CodegenArgs {
    /// Package directory to analyze (default: current directory)
    pub dir: Option<PathBuf>,

    /// Generate only the reader artifacts
    #[arg(long)]
    pub readers: bool,

    /// Generate only the enum artifact
    #[arg(long, conflicts_with = "readers")]
    pub enums: bool,

    /// File name for the main reader artifact (default: auto_reader.rs)
    #[arg(long)]
    pub reader_output: Option<String>,

    /// File name for the in-test reader artifact (default: auto_reader_test.rs)
    #[arg(long)]
    pub reader_test_output: Option<String>,

    /// File name for the enum artifact (default: auto_enum.rs)
    #[arg(long)]
    pub enum_output: Option<String>,

    /// Surface unformatted output when the formatter rejects a buffer
    /// (template debugging only)
    #[arg(long)]
    pub save_unformatted: bool,
}
