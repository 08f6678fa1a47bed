//! SMOL-V: a compact encoding of SPIR-V shader binaries
//!
//! SPIR-V is a verbose word-granular format: every operand is a full
//! 32-bit word, and the SSA result ids grow without bound, which plain
//! data compressors dislike. This crate re-encodes a module into a
//! byte stream that is both smaller and far more compressible:
//!
//! - words that are usually small are written as 1-5 byte varints
//! - result ids and decoration targets are delta-encoded against the
//!   previously seen ones (zigzag for the signed deltas)
//! - the dozen most common opcodes are swapped into the `0..16` range
//!   so the packed length+opcode word fits a single varint byte
//! - a couple of instruction shapes get dedicated compact forms
//!   (single-byte `VectorShuffle` swizzles, batched `MemberDecorate`
//!   runs)
//!
//! Decoding reverses the transform bit-exactly. Optionally the encoder
//! strips debug information instead of round-tripping it.
//!
//! **This is a pure codec** - no file I/O. The caller hands byte
//! slices in and gets `Vec<u8>` back. The decoder also exposes an
//! instrumented mode ([`decode_analyzed`]) that reports which decode
//! paths and opcodes a particular stream exercised; the `spirvcruncher`
//! tool uses that to prune the decoder it embeds in generated headers.
//!
//! # Usage
//!
//! ```
//! // A minimal valid module: header plus OpMemoryModel Logical GLSL450
//! let mut spirv = Vec::new();
//! for w in [0x0723_0203u32, 0x0001_0000, 0, 8, 0, 0x0003_000E, 0, 1] {
//!     spirv.extend_from_slice(&w.to_le_bytes());
//! }
//!
//! let encoded = smolv::encode(&spirv, 0).unwrap();
//! assert!(encoded.len() < spirv.len());
//! assert_eq!(smolv::decode(&encoded).unwrap(), spirv);
//! ```

mod decode;
mod encode;
mod opdata;
#[cfg(test)]
mod testutil;
mod varint;

pub use decode::{decode, decode_analyzed, DecodeAnalysis};
pub use encode::encode;
pub use opdata::{
    decode_len, decoration_extra_words, encode_len, is_debug_op, is_line_op, remap_op, OpData,
    KNOWN_OPS_COUNT, LAST_KNOWN_OP, OPDATA,
};
pub use varint::{read_varint, write_varint, zig_decode, zig_encode};

use thiserror::Error;

// =============================================================================
// Wire Constants
// =============================================================================

/// SPIR-V module magic, first word of every module.
pub const SPIRV_MAGIC: u32 = 0x0723_0203;

/// SMOL-V stream magic, `"SMOL"` read as a little-endian word.
pub const SMOLV_MAGIC: u32 = 0x534D_4F4C;

/// SPIR-V header length in words (magic, version, generator, bound,
/// schema).
pub const SPIRV_HEADER_WORDS: usize = 5;

/// SMOL-V header length in bytes: the five SPIR-V header words (with
/// encoder flags packed into the version word's top byte) plus the
/// decoded-size word.
pub const SMOLV_HEADER_SIZE: usize = 24;

// =============================================================================
// Encoder Flags
// =============================================================================

/// Drop all debug instructions (`OpSource*`, `OpName`, `OpMemberName`,
/// `OpString`, `OpLine`, `OpNoLine`, `OpModuleProcessed`) from the
/// encoded stream.
pub const ENCODE_FLAG_STRIP_DEBUG_INFO: u8 = 1 << 0;

/// Drop only `OpLine`/`OpNoLine` from the encoded stream.
pub const ENCODE_FLAG_STRIP_ONLY_LINES: u8 = 1 << 1;

// =============================================================================
// Error Type
// =============================================================================

/// Errors reported by the encoder and the (checking) decoder.
///
/// The codec assumes well-formed little-endian input; these errors are
/// gatekeeping for truncated or corrupt data, not a validator.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SmolvError {
    /// Input length is not a multiple of the 32-bit word size
    #[error("input is {0} bytes, not a multiple of 4")]
    UnalignedInput(usize),

    /// Missing or wrong magic word at the start of the stream
    #[error("bad magic word (not a SPIR-V/SMOL-V stream)")]
    InvalidMagic,

    /// An instruction declared a word count of zero
    #[error("instruction with zero length word")]
    ZeroLengthInstruction,

    /// An instruction ran past the end of the module
    #[error("truncated instruction")]
    TruncatedInstruction,

    /// An instruction is shorter than its mandatory operands
    #[error("instruction too short for opcode {0}")]
    InstructionTooShort(u16),

    /// Opcode outside the known metadata table
    #[error("unknown opcode {0}")]
    UnknownOpcode(u16),

    /// The stream ended in the middle of an encoded value
    #[error("unexpected end of stream")]
    UnexpectedEnd,

    /// A member decoration's length contradicts its decoration value
    #[error("member decoration {dec} has {words} operand words")]
    DecorationLengthMismatch { dec: u32, words: u32 },

    /// Decoded output does not match the size recorded in the header
    #[error("decoded {got} bytes, header promised {expected}")]
    DecodedSizeMismatch { expected: u32, got: u32 },
}

// =============================================================================
// Header Helpers
// =============================================================================

/// Read the decoded SPIR-V byte size out of a SMOL-V header, for sizing
/// the destination buffer before decoding.
pub fn decoded_size(smolv: &[u8]) -> Result<usize, SmolvError> {
    let mut pos = 0;
    if varint::read_u32(smolv, &mut pos)? != SMOLV_MAGIC {
        return Err(SmolvError::InvalidMagic);
    }
    pos = SMOLV_HEADER_SIZE - 4;
    Ok(varint::read_u32(smolv, &mut pos)? as usize)
}

/// Which ops a given flag combination removes from the stream.
pub(crate) fn strips_op(op: u16, flags: u8) -> bool {
    if flags & ENCODE_FLAG_STRIP_DEBUG_INFO != 0 && is_debug_op(op) {
        return true;
    }
    if flags & ENCODE_FLAG_STRIP_ONLY_LINES != 0 && is_line_op(op) {
        return true;
    }
    false
}
