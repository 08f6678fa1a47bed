//! Embedded payload emission
//!
//! Formats the compressed shader as C source: the byte array (in its
//! own linker section, so the packer can reorder it freely) and the two
//! size constants the generated decoder refers to.

use anyhow::Result;
use std::fmt::Write as _;

/// Bytes per row in the emitted array literal.
const BYTES_PER_LINE: usize = 12;

/// Append the payload array and its size constants to `out`.
pub fn write_shader_block(
    out: &mut String,
    name: &str,
    payload: &[u8],
    decoded_size: u32,
) -> Result<()> {
    writeln!(out, "#pragma data_seg(\".{}\")", name)?;
    writeln!(out, "const uint8_t {}[] = {{", name)?;
    for chunk in payload.chunks(BYTES_PER_LINE) {
        let row: Vec<String> = chunk.iter().map(|b| format!("0x{:02x}", b)).collect();
        writeln!(out, "    {},", row.join(", "))?;
    }
    writeln!(out, "}};")?;
    writeln!(out)?;
    writeln!(out, "const size_t {}_encoded_sizeInBytes = {};", name, payload.len())?;
    writeln!(out, "const size_t {}_sizeInBytes = {};", name, decoded_size)?;
    Ok(())
}
