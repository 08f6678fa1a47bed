//! Crunch pipeline: load, encode, analyse, expand, write
//!
//! Runs the whole packing flow for one shader. The instrumented decode
//! in the middle is not optional: it both produces the usage analysis
//! that drives template pruning and proves the encoder's output decodes
//! back to the input before anything is written to disk.

use anyhow::{bail, ensure, Context, Result};
use std::fmt::Write as _;
use std::fs;

use smolv::ENCODE_FLAG_STRIP_DEBUG_INFO;

use crate::template;
use crate::Cli;

pub fn execute(args: &Cli) -> Result<()> {
    ensure!(
        is_c_identifier(&args.name),
        "array name {:?} is not a valid C identifier",
        args.name
    );

    let spirv = fs::read(&args.input)
        .with_context(|| format!("Failed to read input: {}", args.input.display()))?;
    ensure!(
        !spirv.is_empty(),
        "input file is empty: {}",
        args.input.display()
    );

    if !args.silent {
        println!("Running spirvcruncher for: {}", args.input.display());
    }

    let flags = if args.stripdebuginfo {
        ENCODE_FLAG_STRIP_DEBUG_INFO
    } else {
        0
    };
    let encoded = smolv::encode(&spirv, flags)
        .with_context(|| format!("Failed to encode: {}", args.input.display()))?;

    // Instrumented decode of our own output: yields the usage analysis
    // and doubles as a round-trip check.
    let (decoded, analysis) =
        smolv::decode_analyzed(&encoded).context("Failed to decode the encoded stream")?;
    if flags == 0 && decoded != spirv {
        bail!("round trip mismatch, refusing to emit a broken header");
    }
    let decoded_size = smolv::decoded_size(&encoded)?;

    if !args.silent {
        println!(
            "Compressed to size: {} Expected to decode to: {} Original size: {}",
            encoded.len(),
            decoded_size,
            spirv.len()
        );
    }

    let template_text = match &args.template {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read template: {}", path.display()))?,
        None => template::DEFAULT_TEMPLATE.to_string(),
    };

    let mut header = String::new();
    writeln!(
        header,
        "// Generated with spirvcruncher {} on {}",
        env!("CARGO_PKG_VERSION"),
        chrono::Utc::now().to_rfc3339()
    )?;
    writeln!(
        header,
        "// Input: {} ({} bytes) -> {} bytes encoded",
        args.input.display(),
        spirv.len(),
        encoded.len()
    )?;
    writeln!(header)?;
    header.push_str(&template::expand(&template_text, &args.name, &encoded, &analysis)?);

    fs::write(&args.output, header)
        .with_context(|| format!("Failed to write output: {}", args.output.display()))?;

    if !args.silent {
        println!("{} include file created", args.output.display());
    }
    Ok(())
}

/// Whether `name` can be used as-is for the array identifier and the
/// derived `_sizeInBytes` constants.
fn is_c_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
