//! spirvcruncher - SPIR-V shader packing tool for size-coded executables
//!
//! Compresses a SPIR-V binary with the SMOL-V codec and emits a single
//! self-contained C header carrying the compressed payload plus a
//! `decrunch` function specialized for that one shader: the tool decodes
//! its own output once with an instrumented decoder, records which
//! decode paths the shader exercises, and drops every decoder section
//! the shader never touches from the generated source.
//!
//! # Usage
//!
//! ```bash
//! # Pack a shader with the defaults
//! spirvcruncher -i shader.spv
//!
//! # Custom output path and array name, debug info stripped
//! spirvcruncher -i shader.spv -o player.h -n playershader -d
//! ```
//!
//! The generated header declares `const uint8_t NAME[]`,
//! `NAME_encoded_sizeInBytes`, `NAME_sizeInBytes` and
//! `void decrunch(uint8_t*)`, and is meant to be fed to an executable
//! packer such as Crinkler afterwards.

mod crunch;
mod payload;
mod template;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

/// Pack a SPIR-V shader into a C header with a specialized decoder
#[derive(Parser)]
#[command(name = "spirvcruncher")]
#[command(about = "Pack a SPIR-V shader into a C header with a specialized decoder")]
#[command(version)]
pub struct Cli {
    /// Input SPIR-V binary
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output header file
    #[arg(short, long, default_value = "spirvcrunchedshader.h")]
    pub output: PathBuf,

    /// Name of the embedded byte array and its linker section
    #[arg(short, long, default_value = "spirvcrunchedshader")]
    pub name: String,

    /// Strip debug info (OpSource*, OpName, OpLine, ...) while encoding
    #[arg(short = 'd', long)]
    pub stripdebuginfo: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub silent: bool,

    /// Decoder template file to expand instead of the built-in one
    #[arg(short, long)]
    pub template: Option<PathBuf>,
}

fn main() -> Result<()> {
    crunch::execute(&Cli::parse())
}
