//! SMOL-V decoder and decode-path analysis
//!
//! A straight inversion of the encoder: the same delta registers are
//! maintained on this side and updated after each decoded word, so the
//! reconstructed ids match bit-exactly. Unlike the pruned decoders the
//! cruncher emits into headers, this decoder bounds-checks every read
//! and reports corruption as errors; it is the gatekeeper that runs
//! before any header is generated.
//!
//! Decoding can be instrumented: [`decode_analyzed`] additionally
//! returns a [`DecodeAnalysis`] recording how often each conditional
//! decode path ran and which opcodes were dispatched. Path names match
//! the section tags in the decoder template, which is how the template
//! driver knows which sections a given shader can live without.

use std::collections::BTreeMap;

use crate::opdata::{
    decoration_extra_words, DECORATION_OFFSET, KNOWN_OPS_COUNT, LEN_BIAS, OPDATA, OP_DECORATE,
    OP_MEMBER_DECORATE, OP_VECTOR_SHUFFLE, OP_VECTOR_SHUFFLE_COMPACT, REMAP_SWAPS,
};
use crate::varint::{read_u32, read_varint, write_u32, zig_decode};
use crate::{SmolvError, SMOLV_MAGIC, SPIRV_MAGIC};

// Template section tags, one per remap pair, in REMAP_SWAPS order.
const REMAP_TAGS: [&str; 12] = [
    "SMOLSWAP_SpvOpDecorate",
    "SMOLSWAP_SpvOpLoad",
    "SMOLSWAP_SpvOpStore",
    "SMOLSWAP_SpvOpAccessChain",
    "SMOLSWAP_SpvOpVectorShuffle",
    "SMOLSWAP_SpvOpMemberDecorate",
    "SMOLSWAP_SpvOpLabel",
    "SMOLSWAP_SpvOpVariable",
    "SMOLSWAP_SpvOpFMul",
    "SMOLSWAP_SpvOpFAdd",
    "SMOLSWAP_SpvOpTypePointer",
    "SMOLSWAP_SpvOpFNegate",
];

// Tags for the length-bias corrections, in LEN_BIAS order.
const LEN_BIAS_TAGS: [&str; 5] = [
    "DecodeLen_SpvOpVectorShuffle1",
    "DecodeLen_SpvOpVectorShuffleCompact",
    "DecodeLen_SpvOpDecorate",
    "DecodeLen_SpvOpLoad",
    "DecodeLen_SpvOpAccessChain",
];

// Tags for the four conditional swizzle selector writes.
const SWIZZLE_TAGS: [&str; 4] = [
    "wasSizzleInstrLen9_5",
    "wasSizzleInstrLen9_6",
    "wasSizzleInstrLen9_7",
    "wasSizzleInstrLen9_8",
];

/// Usage histogram of one instrumented decode.
///
/// `blocks` counts how often each tagged decoder section ran; `ops`
/// counts dispatched opcodes (post-remap, i.e. the values actually used
/// to index the op metadata table). The template driver consumes this
/// read-only: sections and table rows that never fired are pruned from
/// the generated header.
#[derive(Debug, Default, Clone)]
pub struct DecodeAnalysis {
    blocks: BTreeMap<&'static str, u32>,
    spv_ops: BTreeMap<u16, u32>,
}

impl DecodeAnalysis {
    fn hit_block(&mut self, tag: &'static str) {
        *self.blocks.entry(tag).or_insert(0) += 1;
    }

    fn hit_op(&mut self, op: u16) {
        *self.spv_ops.entry(op).or_insert(0) += 1;
    }

    /// Whether the tagged decoder section ran at least once.
    pub fn block_used(&self, tag: &str) -> bool {
        self.blocks.get(tag).is_some_and(|&n| n > 0)
    }

    /// Hit count for a tagged decoder section (0 if it never ran).
    pub fn block_count(&self, tag: &str) -> u32 {
        self.blocks.get(tag).copied().unwrap_or(0)
    }

    /// Whether the opcode was dispatched at least once.
    pub fn op_used(&self, op: u16) -> bool {
        self.spv_ops.get(&op).is_some_and(|&n| n > 0)
    }

    /// All sections that ran, with hit counts.
    pub fn blocks(&self) -> impl Iterator<Item = (&'static str, u32)> + '_ {
        self.blocks.iter().map(|(&tag, &n)| (tag, n))
    }

    /// All dispatched opcodes, with hit counts.
    pub fn ops(&self) -> impl Iterator<Item = (u16, u32)> + '_ {
        self.spv_ops.iter().map(|(&op, &n)| (op, n))
    }
}

/// Decode a SMOL-V stream back into a SPIR-V module.
pub fn decode(smolv: &[u8]) -> Result<Vec<u8>, SmolvError> {
    let mut analysis = DecodeAnalysis::default();
    decode_inner(smolv, &mut analysis)
}

/// Decode a SMOL-V stream, also reporting which decode paths it
/// exercised.
pub fn decode_analyzed(smolv: &[u8]) -> Result<(Vec<u8>, DecodeAnalysis), SmolvError> {
    let mut analysis = DecodeAnalysis::default();
    let spirv = decode_inner(smolv, &mut analysis)?;
    Ok((spirv, analysis))
}

/// Read one packed instruction word and undo the shuffling: unpack,
/// remap the opcode back, and re-add the length bias.
fn read_length_op(
    data: &[u8],
    pos: &mut usize,
    analysis: &mut DecodeAnalysis,
) -> Result<(u16, usize), SmolvError> {
    let val = read_varint(data, pos)?;
    let mut len = ((val >> 20) << 4) | ((val >> 4) & 0xF);
    let mut op = (((val >> 4) & 0xFFF0) | (val & 0xF)) as u16;

    for (i, &(a, b)) in REMAP_SWAPS.iter().enumerate() {
        if op == a || op == b {
            analysis.hit_block(REMAP_TAGS[i]);
            op = if op == a { b } else { a };
            break;
        }
    }

    len += 1;
    for (i, &(bias_op, bias)) in LEN_BIAS.iter().enumerate() {
        if op == bias_op {
            analysis.hit_block(LEN_BIAS_TAGS[i]);
            len += bias;
        }
    }
    Ok((op, len as usize))
}

fn decode_inner(smolv: &[u8], analysis: &mut DecodeAnalysis) -> Result<Vec<u8>, SmolvError> {
    let mut pos = 0;
    if read_u32(smolv, &mut pos)? != SMOLV_MAGIC {
        return Err(SmolvError::InvalidMagic);
    }
    let version = read_u32(smolv, &mut pos)? & 0x00FF_FFFF; // flags byte masked off
    let generator = read_u32(smolv, &mut pos)?;
    let bound = read_u32(smolv, &mut pos)?;
    let schema = read_u32(smolv, &mut pos)?;
    let expected_size = read_u32(smolv, &mut pos)?;

    let mut out = Vec::with_capacity(expected_size as usize);
    write_u32(&mut out, SPIRV_MAGIC);
    write_u32(&mut out, version);
    write_u32(&mut out, generator);
    write_u32(&mut out, bound);
    write_u32(&mut out, schema);

    let mut prev_result: u32 = 0;
    let mut prev_decorate: u32 = 0;

    while pos < smolv.len() {
        let (op, len) = read_length_op(smolv, &mut pos, analysis)?;

        // The compact form exists only on the wire; it turns back into
        // a plain VectorShuffle before the header word is written, so
        // the decoded module never contains opcode 13.
        let was_swizzle = op == OP_VECTOR_SHUFFLE_COMPACT;
        let op = if was_swizzle {
            analysis.hit_block("wasSwizzleVectorSuffle");
            OP_VECTOR_SHUFFLE
        } else {
            op
        };
        if op as usize >= KNOWN_OPS_COUNT {
            return Err(SmolvError::UnknownOpcode(op));
        }
        analysis.hit_op(op);
        write_u32(&mut out, ((len as u32) << 16) | op as u32);

        let data = &OPDATA[op as usize];
        let mut ioffs = 1;

        if data.has_type {
            analysis.hit_block("smolv_OpHasType");
            let v = read_varint(smolv, &mut pos)?;
            write_u32(&mut out, v);
            ioffs += 1;
        }
        if data.has_result {
            analysis.hit_block("smolv_OpHasResult");
            let v = prev_result.wrapping_add(zig_decode(read_varint(smolv, &mut pos)?) as u32);
            write_u32(&mut out, v);
            prev_result = v;
            ioffs += 1;
        }
        if op == OP_DECORATE || op == OP_MEMBER_DECORATE {
            analysis.hit_block("SpvDecorate");
            let v = prev_decorate.wrapping_add(zig_decode(read_varint(smolv, &mut pos)?) as u32);
            write_u32(&mut out, v);
            prev_decorate = v;
            ioffs += 1;
        }

        if op == OP_MEMBER_DECORATE {
            analysis.hit_block("SpvMemberDecorate");
            decode_member_decorate_run(smolv, &mut pos, &mut out, prev_decorate, analysis)?;
            continue;
        }

        let mut relative = data.delta_from_result as usize;
        while relative > 0 && ioffs < len {
            let v = zig_decode(read_varint(smolv, &mut pos)?);
            write_u32(&mut out, prev_result.wrapping_sub(v as u32));
            relative -= 1;
            ioffs += 1;
        }

        if was_swizzle && len <= 9 {
            let swizzle = *smolv.get(pos).ok_or(SmolvError::UnexpectedEnd)?;
            pos += 1;
            if len > 5 {
                analysis.hit_block(SWIZZLE_TAGS[0]);
                write_u32(&mut out, ((swizzle >> 6) & 3) as u32);
            }
            if len > 6 {
                analysis.hit_block(SWIZZLE_TAGS[1]);
                write_u32(&mut out, ((swizzle >> 4) & 3) as u32);
            }
            if len > 7 {
                analysis.hit_block(SWIZZLE_TAGS[2]);
                write_u32(&mut out, ((swizzle >> 2) & 3) as u32);
            }
            if len > 8 {
                analysis.hit_block(SWIZZLE_TAGS[3]);
                write_u32(&mut out, (swizzle & 3) as u32);
            }
        } else if data.varrest {
            if ioffs < len {
                analysis.hit_block("OpvarRest");
            }
            while ioffs < len {
                write_u32(&mut out, read_varint(smolv, &mut pos)?);
                ioffs += 1;
            }
        } else {
            if ioffs < len {
                analysis.hit_block("RestWithoutAnyEncoding");
            }
            while ioffs < len {
                let v = read_u32(smolv, &mut pos)?;
                write_u32(&mut out, v);
                ioffs += 1;
            }
        }
    }

    if out.len() as u32 != expected_size {
        return Err(SmolvError::DecodedSizeMismatch {
            expected: expected_size,
            got: out.len() as u32,
        });
    }
    Ok(out)
}

/// Expand one `MemberDecorate` packet back into full instructions.
///
/// The packet's first member reuses the header word and target id the
/// caller already wrote; each further member gets a freshly synthesized
/// header and target.
fn decode_member_decorate_run(
    smolv: &[u8],
    pos: &mut usize,
    out: &mut Vec<u8>,
    target: u32,
    analysis: &mut DecodeAnalysis,
) -> Result<(), SmolvError> {
    let count = *smolv.get(*pos).ok_or(SmolvError::UnexpectedEnd)?;
    *pos += 1;

    let mut prev_index: u32 = 0;
    let mut prev_offset: u32 = 0;
    for m in 0..count {
        let member_index = prev_index.wrapping_add(read_varint(smolv, pos)?);
        prev_index = member_index;

        let member_dec = read_varint(smolv, pos)?;
        let member_len = match decoration_extra_words(member_dec) {
            None => {
                analysis.hit_block("BlockInBlock_knownExtraOpsCondition");
                read_varint(smolv, pos)? + 4
            }
            Some(known) => 4 + known,
        };

        if m != 0 {
            write_u32(out, (member_len << 16) | OP_MEMBER_DECORATE as u32);
            write_u32(out, target);
        }
        write_u32(out, member_index);
        write_u32(out, member_dec);

        if member_dec == DECORATION_OFFSET {
            analysis.hit_block("BlockInBlock_OffsetDecoration");
            let v = prev_offset.wrapping_add(read_varint(smolv, pos)?);
            write_u32(out, v);
            prev_offset = v;
        } else {
            for _ in 4..member_len {
                write_u32(out, read_varint(smolv, pos)?);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode;
    use crate::testutil::{instr, module};
    use crate::{decoded_size, ENCODE_FLAG_STRIP_DEBUG_INFO, ENCODE_FLAG_STRIP_ONLY_LINES};

    /// A structurally representative module: types, constants,
    /// decorations (incl. a member-decorate run), a function body with
    /// loads, stores, access chains, shuffles and branches.
    fn representative_module() -> Vec<u8> {
        module(&[
            &instr(17, &[1]),                        // Capability Shader
            &instr(11, &[1, 0x2E64_7473, 0]),        // ExtInstImport
            &instr(14, &[0, 1]),                     // MemoryModel Logical GLSL450
            &instr(15, &[4, 12, 0x6E69_616D, 0]),    // EntryPoint
            &instr(5, &[15, 0x6E69_616D, 0]),        // Name
            &instr(8, &[1, 7, 2]),                   // Line
            &instr(71, &[9, 34, 0]),                 // Decorate DescriptorSet
            &instr(71, &[9, 33, 0]),                 // Decorate Binding
            &instr(72, &[3, 0, 35, 0]),              // MemberDecorate Offset 0
            &instr(72, &[3, 1, 35, 16]),             // MemberDecorate Offset 16
            &instr(72, &[3, 2, 0]),                  // MemberDecorate RelaxedPrecision
            &instr(72, &[3, 3, 6, 8]),               // MemberDecorate ArrayStride
            &instr(72, &[4, 0, 35, 32]),             // new target, new run
            &instr(19, &[2]),                        // TypeVoid
            &instr(21, &[6, 32, 0]),                 // TypeInt
            &instr(22, &[7, 32]),                    // TypeFloat
            &instr(23, &[8, 7, 4]),                  // TypeVector
            &instr(32, &[9, 7, 8]),                  // TypePointer
            &instr(43, &[7, 10, 0x3F80_0000]),       // Constant 1.0
            &instr(54, &[2, 12, 0, 2]),              // Function
            &instr(248, &[13]),                      // Label
            &instr(59, &[9, 14, 7]),                 // Variable
            &instr(61, &[8, 15, 14]),                // Load
            &instr(65, &[9, 19, 14, 10]),            // AccessChain
            &instr(79, &[8, 16, 15, 15, 0, 1, 2, 3]), // compact shuffle shape
            &instr(79, &[8, 17, 15, 15, 4, 4]),      // selectors >3, stays plain
            &instr(129, &[7, 18, 10, 10]),           // FAdd
            &instr(133, &[7, 20, 18, 18]),           // FMul
            &instr(127, &[7, 21, 20]),               // FNegate
            &instr(62, &[14, 18]),                   // Store
            &instr(249, &[13]),                      // Branch
            &instr(253, &[]),                        // Return
            &instr(56, &[]),                         // FunctionEnd
        ])
    }

    #[test]
    fn test_minimal_module_roundtrip() {
        let spirv = module(&[&instr(14, &[0, 1])]);
        let encoded = encode(&spirv, 0).unwrap();
        assert!(encoded.len() < spirv.len());
        assert_eq!(decode(&encoded).unwrap(), spirv);
    }

    #[test]
    fn test_representative_roundtrip() {
        let spirv = representative_module();
        let encoded = encode(&spirv, 0).unwrap();
        assert!(encoded.len() < spirv.len());
        assert_eq!(decoded_size(&encoded), Ok(spirv.len()));
        assert_eq!(decode(&encoded).unwrap(), spirv);
    }

    #[test]
    fn test_compact_shuffle_swizzle_byte() {
        let spirv = module(&[&instr(79, &[8, 16, 2, 3, 0, 1, 2, 3])]);
        let encoded = encode(&spirv, 0).unwrap();
        // selectors 0,1,2,3 pack to (0<<6)|(1<<4)|(2<<2)|3, the stream's
        // last byte
        assert_eq!(*encoded.last().unwrap(), 0x1B);
        let (decoded, analysis) = decode_analyzed(&encoded).unwrap();
        assert_eq!(decoded, spirv);
        assert!(analysis.block_used("wasSwizzleVectorSuffle"));
        assert_eq!(analysis.block_count("wasSizzleInstrLen9_8"), 1);
        assert!(analysis.op_used(79));
        assert!(!analysis.op_used(13)); // rewritten before table dispatch
    }

    #[test]
    fn test_partial_swizzle_roundtrip() {
        // two selectors only (length 7)
        let spirv = module(&[&instr(79, &[8, 16, 2, 3, 3, 0])]);
        let encoded = encode(&spirv, 0).unwrap();
        let (decoded, analysis) = decode_analyzed(&encoded).unwrap();
        assert_eq!(decoded, spirv);
        assert!(analysis.block_used("wasSizzleInstrLen9_5"));
        assert!(analysis.block_used("wasSizzleInstrLen9_6"));
        assert!(!analysis.block_used("wasSizzleInstrLen9_7"));
        assert!(!analysis.block_used("wasSizzleInstrLen9_8"));
    }

    #[test]
    fn test_member_decorate_run_roundtrip() {
        let spirv = module(&[
            &instr(72, &[3, 0, 35, 0]),
            &instr(72, &[3, 1, 35, 16]),
            &instr(72, &[3, 2, 6, 4]),
            &instr(72, &[5, 0, 0]),
        ]);
        let encoded = encode(&spirv, 0).unwrap();
        let (decoded, analysis) = decode_analyzed(&encoded).unwrap();
        assert_eq!(decoded, spirv);
        // two packets: one three-member run, one single-member run
        assert_eq!(analysis.block_count("SpvMemberDecorate"), 2);
        assert_eq!(analysis.block_count("BlockInBlock_OffsetDecoration"), 2);
        assert!(analysis.block_used("BlockInBlock_knownExtraOpsCondition"));
    }

    #[test]
    fn test_long_member_decorate_run_splits() {
        // 300 members on one target: must split into a 255 packet and a
        // 45 packet
        let instrs: Vec<Vec<u32>> = (0..300u32).map(|m| instr(72, &[3, m, 0])).collect();
        let refs: Vec<&[u32]> = instrs.iter().map(|v| v.as_slice()).collect();
        let spirv = module(&refs);
        let encoded = encode(&spirv, 0).unwrap();
        let (decoded, analysis) = decode_analyzed(&encoded).unwrap();
        assert_eq!(decoded, spirv);
        assert_eq!(analysis.block_count("SpvMemberDecorate"), 2);
    }

    #[test]
    fn test_strip_debug_info_roundtrip() {
        let spirv = representative_module();
        let stripped_source = module(&[
            &instr(17, &[1]),
            &instr(11, &[1, 0x2E64_7473, 0]),
            &instr(14, &[0, 1]),
            &instr(15, &[4, 12, 0x6E69_616D, 0]),
            &instr(71, &[9, 34, 0]),
            &instr(71, &[9, 33, 0]),
            &instr(72, &[3, 0, 35, 0]),
            &instr(72, &[3, 1, 35, 16]),
            &instr(72, &[3, 2, 0]),
            &instr(72, &[3, 3, 6, 8]),
            &instr(72, &[4, 0, 35, 32]),
            &instr(19, &[2]),
            &instr(21, &[6, 32, 0]),
            &instr(22, &[7, 32]),
            &instr(23, &[8, 7, 4]),
            &instr(32, &[9, 7, 8]),
            &instr(43, &[7, 10, 0x3F80_0000]),
            &instr(54, &[2, 12, 0, 2]),
            &instr(248, &[13]),
            &instr(59, &[9, 14, 7]),
            &instr(61, &[8, 15, 14]),
            &instr(65, &[9, 19, 14, 10]),
            &instr(79, &[8, 16, 15, 15, 0, 1, 2, 3]),
            &instr(79, &[8, 17, 15, 15, 4, 4]),
            &instr(129, &[7, 18, 10, 10]),
            &instr(133, &[7, 20, 18, 18]),
            &instr(127, &[7, 21, 20]),
            &instr(62, &[14, 18]),
            &instr(249, &[13]),
            &instr(253, &[]),
            &instr(56, &[]),
        ]);
        let encoded = encode(&spirv, ENCODE_FLAG_STRIP_DEBUG_INFO).unwrap();
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded, stripped_source);
        assert_eq!(decoded_size(&encoded), Ok(stripped_source.len()));
    }

    #[test]
    fn test_strip_only_lines() {
        let spirv = module(&[
            &instr(8, &[1, 7, 2]),  // Line, stripped
            &instr(5, &[15, 0]),    // Name, kept
            &instr(14, &[0, 1]),
            &instr(317, &[]),       // NoLine, stripped
        ]);
        let expected = module(&[&instr(5, &[15, 0]), &instr(14, &[0, 1])]);
        let encoded = encode(&spirv, ENCODE_FLAG_STRIP_ONLY_LINES).unwrap();
        assert_eq!(decode(&encoded).unwrap(), expected);
    }

    #[test]
    fn test_analysis_blocks_for_representative_module() {
        let spirv = representative_module();
        let encoded = encode(&spirv, 0).unwrap();
        let (_, analysis) = decode_analyzed(&encoded).unwrap();

        for tag in [
            "smolv_OpHasType",
            "smolv_OpHasResult",
            "SpvDecorate",
            "SpvMemberDecorate",
            "OpvarRest",
            "RestWithoutAnyEncoding",
            "SMOLSWAP_SpvOpDecorate",
            "SMOLSWAP_SpvOpMemberDecorate",
            "SMOLSWAP_SpvOpLoad",
            "SMOLSWAP_SpvOpStore",
            "SMOLSWAP_SpvOpAccessChain",
            "SMOLSWAP_SpvOpVectorShuffle",
            "SMOLSWAP_SpvOpLabel",
            "SMOLSWAP_SpvOpVariable",
            "SMOLSWAP_SpvOpFMul",
            "SMOLSWAP_SpvOpFAdd",
            "SMOLSWAP_SpvOpTypePointer",
            "SMOLSWAP_SpvOpFNegate",
            "DecodeLen_SpvOpVectorShuffle1",
            "DecodeLen_SpvOpVectorShuffleCompact",
            "DecodeLen_SpvOpDecorate",
            "DecodeLen_SpvOpLoad",
            "DecodeLen_SpvOpAccessChain",
            "wasSwizzleVectorSuffle",
        ] {
            assert!(analysis.block_used(tag), "expected block {}", tag);
        }

        // Decorate fires for both Decorate and MemberDecorate targets
        assert_eq!(analysis.block_count("SpvDecorate"), 4);
        // one Line + one Name dispatched, debug ops not stripped here
        assert!(analysis.op_used(5));
        assert!(analysis.op_used(8));
        // unassigned table rows never dispatch
        assert!(!analysis.op_used(9));
    }

    #[test]
    fn test_rejects_bad_magic() {
        assert_eq!(decode(&[0u8; 24]), Err(SmolvError::InvalidMagic));
    }

    #[test]
    fn test_rejects_truncated_stream() {
        let spirv = module(&[&instr(14, &[0, 1])]);
        let encoded = encode(&spirv, 0).unwrap();
        assert_eq!(
            decode(&encoded[..encoded.len() - 1]),
            Err(SmolvError::UnexpectedEnd)
        );
    }

    #[test]
    fn test_rejects_size_mismatch() {
        let spirv = module(&[&instr(14, &[0, 1])]);
        let mut encoded = encode(&spirv, 0).unwrap();
        // corrupt the decoded-size field
        encoded[20..24].copy_from_slice(&999u32.to_le_bytes());
        assert!(matches!(
            decode(&encoded),
            Err(SmolvError::DecodedSizeMismatch { expected: 999, .. })
        ));
    }
}
