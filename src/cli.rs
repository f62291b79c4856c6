//! The entire configuration surface for this tool: command-line arguments,
//! with no separate config file format.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "denox-codegen",
    about = "Generates a host compute-graph C module from a compiled DNX artifact"
)]
pub struct Args {
    /// Path to the compiled DNX artifact. Must exist and be a regular file.
    pub dnx: PathBuf,

    #[arg(long = "src-dir")]
    pub src_dir: PathBuf,

    #[arg(long = "shader-dir")]
    pub shader_dir: PathBuf,

    #[arg(long = "weight-dir")]
    pub weight_dir: PathBuf,

    #[arg(long = "module-name")]
    pub module_name: String,

    /// Used to compute the weight path relative to the host binary
    /// directory inside the emitted `denox_read_source`.
    #[arg(long = "bin-dir")]
    pub bin_dir: Option<PathBuf>,

    /// Create missing output directories, including parents.
    #[arg(short = 'p', long = "mkdir")]
    pub mkdir: bool,
}
