//! Template-driven decoder generation
//!
//! The decoder the generated header carries is written once, as an
//! annotated C source template: conditional sections are fenced with
//! `SPIRVCRUNCHER` marker comments, each keyed by the tag the decoder's
//! analysis pass records when the matching code path runs. Expansion is
//! two-phase: the template is parsed into a node tree, then emitted
//! against a [`DecodeAnalysis`] - a section survives only if its tag
//! fired for the shader being packed, and op-metadata rows for opcodes
//! the shader never dispatches collapse to a zero placeholder (position
//! preserved, and all-zero rows pack to almost nothing downstream).
//!
//! Marker lines recognized, by textual match:
//!
//! - `Block Start >>>>> TAG` / `Block End >>>>> TAG` - conditional
//!   section
//! - `BlockInBlock Start/End >>>>> TAG` - same, nested one level inside
//!   a block
//! - `Spv Start` / `Spv End` - the op metadata table, one row per line,
//!   row index = opcode
//! - `Remove on build start`/`end` - never emitted (template-only
//!   scaffolding such as the opcode name enum)
//! - `... skip on build` anywhere in a line - that line is dropped
//! - `Decrunch Segment` - replaced by the generated payload-bound
//!   prologue
//! - `Shaderblock` - replaced by the payload array and size constants

use anyhow::{bail, ensure, Result};
use std::fmt::Write as _;

use smolv::{DecodeAnalysis, KNOWN_OPS_COUNT, SMOLV_HEADER_SIZE, SMOLV_MAGIC, SPIRV_MAGIC};

use crate::payload::write_shader_block;

/// The decoder template compiled into the tool.
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/decrunch.h");

const MARK_SKIP: &str = "SPIRVCRUNCHER skip on build";
const MARK_REMOVE_START: &str = "SPIRVCRUNCHER Remove on build start";
const MARK_REMOVE_END: &str = "SPIRVCRUNCHER Remove on build end";
const MARK_INNER_START: &str = "SPIRVCRUNCHER BlockInBlock Start";
const MARK_INNER_END: &str = "SPIRVCRUNCHER BlockInBlock End";
const MARK_BLOCK_START: &str = "SPIRVCRUNCHER Block Start";
const MARK_BLOCK_END: &str = "SPIRVCRUNCHER Block End";
const MARK_SPV_START: &str = "SPIRVCRUNCHER Spv Start";
const MARK_SPV_END: &str = "SPIRVCRUNCHER Spv End";
const MARK_DECRUNCH: &str = "SPIRVCRUNCHER Decrunch Segment";
const MARK_SHADERBLOCK: &str = "SPIRVCRUNCHER Shaderblock";

/// Emitted in place of an op-table row whose opcode never fired.
const PLACEHOLDER_ROW: &str = "\t{0, 0, 0, 0},";

#[derive(Debug)]
enum Node {
    /// One line copied through untouched.
    Verbatim(String),
    /// Conditional section; `body` may contain one level of nested
    /// blocks.
    Block { tag: String, body: Vec<Node> },
    /// The op metadata table, one row line per opcode.
    OpTable { rows: Vec<String> },
    /// Pivot replaced by the generated decode prologue.
    DecrunchSegment,
    /// Pivot replaced by the payload array.
    Shaderblock,
}

/// What kind of section the parser is currently inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    TopLevel,
    Block,
    Inner,
}

/// Expand `template` into the final header source for one shader.
///
/// `payload` is the complete SMOL-V stream (its header supplies the
/// hard-coded version/bound words and the decoded size); `analysis`
/// is the instrumented decode of that same payload.
pub fn expand(
    template: &str,
    name: &str,
    payload: &[u8],
    analysis: &DecodeAnalysis,
) -> Result<String> {
    ensure!(
        payload.len() >= SMOLV_HEADER_SIZE,
        "payload too small for a SMOL-V header ({} bytes)",
        payload.len()
    );
    ensure!(
        read_word(payload, 0) == SMOLV_MAGIC,
        "payload does not start with the SMOL-V magic"
    );

    let lines: Vec<&str> = template.lines().collect();
    let mut pos = 0;
    let nodes = parse_nodes(&lines, &mut pos, Scope::TopLevel, "")?;

    let mut out = String::new();
    emit_nodes(&mut out, &nodes, name, payload, analysis)?;
    Ok(out)
}

fn read_word(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Tag text after the last `>>>>>` of a marker line.
fn tag_of(line: &str) -> Result<&str> {
    let tag = line.rsplit(">>>>>").next().unwrap_or("").trim();
    ensure!(!tag.is_empty(), "section marker without a tag: {:?}", line);
    Ok(tag)
}

/// Parse lines into nodes until the closing marker of `scope` (or EOF
/// at top level). `open_tag` is the tag the closing marker must repeat.
fn parse_nodes(
    lines: &[&str],
    pos: &mut usize,
    scope: Scope,
    open_tag: &str,
) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();

    while *pos < lines.len() {
        let line = lines[*pos];
        *pos += 1;

        if line.contains(MARK_SKIP) {
            continue;
        }
        if line.contains(MARK_REMOVE_START) {
            loop {
                ensure!(
                    *pos < lines.len(),
                    "unterminated 'Remove on build' section"
                );
                let inner = lines[*pos];
                *pos += 1;
                if inner.contains(MARK_REMOVE_END) {
                    break;
                }
            }
            continue;
        }
        if line.contains(MARK_REMOVE_END) {
            bail!("'Remove on build end' without a matching start");
        }
        if line.contains(MARK_DECRUNCH) {
            nodes.push(Node::DecrunchSegment);
            continue;
        }
        if line.contains(MARK_SHADERBLOCK) {
            nodes.push(Node::Shaderblock);
            continue;
        }
        if line.contains(MARK_SPV_START) {
            ensure!(
                scope == Scope::TopLevel,
                "op table section inside a conditional section"
            );
            let mut rows = Vec::new();
            loop {
                ensure!(*pos < lines.len(), "unterminated op table section");
                let row = lines[*pos];
                *pos += 1;
                if row.contains(MARK_SPV_END) {
                    break;
                }
                rows.push(row.to_string());
            }
            nodes.push(Node::OpTable { rows });
            continue;
        }
        if line.contains(MARK_SPV_END) {
            bail!("op table end without a matching start");
        }

        // BlockInBlock markers contain the Block marker text, so they
        // must be tested first.
        if line.contains(MARK_INNER_START) {
            ensure!(
                scope == Scope::Block,
                "nested section {:?} outside a section",
                tag_of(line)?
            );
            let tag = tag_of(line)?.to_string();
            let body = parse_nodes(lines, pos, Scope::Inner, &tag)?;
            nodes.push(Node::Block { tag, body });
            continue;
        }
        if line.contains(MARK_INNER_END) {
            ensure!(
                scope == Scope::Inner,
                "nested section end without a matching start"
            );
            let tag = tag_of(line)?;
            ensure!(
                tag == open_tag,
                "nested section end tag {:?} does not match start tag {:?}",
                tag,
                open_tag
            );
            return Ok(nodes);
        }
        if line.contains(MARK_BLOCK_START) {
            ensure!(
                scope == Scope::TopLevel,
                "section {:?} nested deeper than one level",
                tag_of(line)?
            );
            let tag = tag_of(line)?.to_string();
            let body = parse_nodes(lines, pos, Scope::Block, &tag)?;
            nodes.push(Node::Block { tag, body });
            continue;
        }
        if line.contains(MARK_BLOCK_END) {
            ensure!(
                scope == Scope::Block,
                "section end without a matching start"
            );
            let tag = tag_of(line)?;
            ensure!(
                tag == open_tag,
                "section end tag {:?} does not match start tag {:?}",
                tag,
                open_tag
            );
            return Ok(nodes);
        }

        nodes.push(Node::Verbatim(line.to_string()));
    }

    ensure!(
        scope == Scope::TopLevel,
        "unterminated section {:?} at end of template",
        open_tag
    );
    Ok(nodes)
}

fn emit_nodes(
    out: &mut String,
    nodes: &[Node],
    name: &str,
    payload: &[u8],
    analysis: &DecodeAnalysis,
) -> Result<()> {
    for node in nodes {
        match node {
            Node::Verbatim(line) => {
                out.push_str(line);
                out.push('\n');
            }
            Node::Block { tag, body } => {
                if analysis.block_used(tag) {
                    emit_nodes(out, body, name, payload, analysis)?;
                }
            }
            Node::OpTable { rows } => {
                ensure!(
                    rows.len() == KNOWN_OPS_COUNT,
                    "op table section has {} rows, expected {}",
                    rows.len(),
                    KNOWN_OPS_COUNT
                );
                for (op, row) in rows.iter().enumerate() {
                    if analysis.op_used(op as u16) {
                        out.push_str(row);
                    } else {
                        out.push_str(PLACEHOLDER_ROW);
                    }
                    out.push('\n');
                }
            }
            Node::DecrunchSegment => emit_decrunch_segment(out, name, payload)?,
            Node::Shaderblock => {
                let decoded_size = read_word(payload, SMOLV_HEADER_SIZE - 4);
                write_shader_block(out, name, payload, decoded_size)?;
            }
        }
    }
    Ok(())
}

/// The generated decode prologue: payload bounds, then the SPIR-V
/// header words the decoder would otherwise have to read out of the
/// compressed stream, baked in as immediates. Generator and schema are
/// skipped, not written - the packed executable does not care.
fn emit_decrunch_segment(out: &mut String, name: &str, payload: &[u8]) -> Result<()> {
    let version = read_word(payload, 4) & 0x00FF_FFFF;
    let bound = read_word(payload, 12);

    writeln!(out, "\tconst uint8_t* bytes = {} + {};", name, SMOLV_HEADER_SIZE)?;
    writeln!(out, "\tconst uint8_t* bytesEnd = {} + {}_encoded_sizeInBytes;", name, name)?;
    writeln!(out)?;
    writeln!(out, "\t*(uint32_t*)spirvCode = 0x{:08x}; // SPIR-V magic", SPIRV_MAGIC)?;
    writeln!(out, "\tspirvCode += 4;")?;
    writeln!(out, "\t*(uint32_t*)spirvCode = 0x{:08x}; // version", version)?;
    writeln!(out, "\tspirvCode += 8; // generator stays untouched")?;
    writeln!(out, "\t*(uint32_t*)spirvCode = 0x{:08x}; // id bound", bound)?;
    writeln!(out, "\tspirvCode += 8; // schema stays untouched")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Header + OpMemoryModel, enough to drive a real expansion.
    fn minimal_spirv() -> Vec<u8> {
        let words = [SPIRV_MAGIC, 0x0001_0500, 0x0008_0001, 54, 0, 0x0003_000E, 0, 1];
        let mut bytes = Vec::new();
        for w in words {
            bytes.extend_from_slice(&w.to_le_bytes());
        }
        bytes
    }

    fn minimal_payload_and_analysis() -> (Vec<u8>, DecodeAnalysis) {
        let encoded = smolv::encode(&minimal_spirv(), 0).unwrap();
        let (_, analysis) = smolv::decode_analyzed(&encoded).unwrap();
        (encoded, analysis)
    }

    #[test]
    fn test_block_filtering() {
        let template = "\
first
// >>>>> SPIRVCRUNCHER Block Start >>>>> OpvarRest
kept line
// >>>>> SPIRVCRUNCHER Block End >>>>> OpvarRest
// >>>>> SPIRVCRUNCHER Block Start >>>>> SpvMemberDecorate
dropped line
// >>>>> SPIRVCRUNCHER Block End >>>>> SpvMemberDecorate
last
";
        let (payload, analysis) = minimal_payload_and_analysis();
        let out = expand(template, "s", &payload, &analysis).unwrap();
        assert_eq!(out, "first\nkept line\nlast\n");
    }

    #[test]
    fn test_skip_and_remove_lines() {
        let template = "\
kept
gone // SPIRVCRUNCHER skip on build
// >>>>> SPIRVCRUNCHER Remove on build start
scaffolding
// >>>>> SPIRVCRUNCHER Remove on build end
also kept
";
        let (payload, analysis) = minimal_payload_and_analysis();
        let out = expand(template, "s", &payload, &analysis).unwrap();
        assert_eq!(out, "kept\nalso kept\n");
    }

    #[test]
    fn test_unterminated_block_fails() {
        let template = "// >>>>> SPIRVCRUNCHER Block Start >>>>> smolv_OpHasType\nbody\n";
        let (payload, analysis) = minimal_payload_and_analysis();
        let err = expand(template, "s", &payload, &analysis).unwrap_err();
        assert!(err.to_string().contains("unterminated section"));
    }

    #[test]
    fn test_mismatched_end_tag_fails() {
        let template = "\
// >>>>> SPIRVCRUNCHER Block Start >>>>> smolv_OpHasType
// >>>>> SPIRVCRUNCHER Block End >>>>> smolv_OpHasResult
";
        let (payload, analysis) = minimal_payload_and_analysis();
        let err = expand(template, "s", &payload, &analysis).unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn test_nested_block_outside_section_fails() {
        let template = "\
// >>>>> SPIRVCRUNCHER BlockInBlock Start >>>>> BlockInBlock_OffsetDecoration
// >>>>> SPIRVCRUNCHER BlockInBlock End >>>>> BlockInBlock_OffsetDecoration
";
        let (payload, analysis) = minimal_payload_and_analysis();
        assert!(expand(template, "s", &payload, &analysis).is_err());
    }

    #[test]
    fn test_decrunch_segment_substitution() {
        let template = "// >>>>> SPIRVCRUNCHER Decrunch Segment\n";
        let (payload, analysis) = minimal_payload_and_analysis();
        let out = expand(template, "demo", &payload, &analysis).unwrap();
        assert!(out.contains("const uint8_t* bytes = demo + 24;"));
        assert!(out.contains("bytesEnd = demo + demo_encoded_sizeInBytes;"));
        assert!(out.contains("0x07230203; // SPIR-V magic"));
        assert!(out.contains("0x00010500; // version")); // flags byte masked off
        assert!(out.contains("0x00000036; // id bound"));
    }

    #[test]
    fn test_shaderblock_substitution() {
        let template = "// >>>>> SPIRVCRUNCHER Shaderblock\n";
        let (payload, analysis) = minimal_payload_and_analysis();
        let out = expand(template, "demo", &payload, &analysis).unwrap();
        assert!(out.contains("#pragma data_seg(\".demo\")"));
        assert!(out.contains("const uint8_t demo[] = {"));
        assert!(out.contains(&format!(
            "const size_t demo_encoded_sizeInBytes = {};",
            payload.len()
        )));
        assert!(out.contains(&format!(
            "const size_t demo_sizeInBytes = {};",
            minimal_spirv().len()
        )));
    }

    #[test]
    fn test_rejects_undersized_payload() {
        let (_, analysis) = minimal_payload_and_analysis();
        assert!(expand("x\n", "s", &[0u8; 8], &analysis).is_err());
    }

    #[test]
    fn test_embedded_template_rows_match_opdata() {
        // The template's op table is a copy of the codec's; this locks
        // the two together row by row.
        let lines: Vec<&str> = DEFAULT_TEMPLATE.lines().collect();
        let mut pos = 0;
        let nodes = parse_nodes(&lines, &mut pos, Scope::TopLevel, "").unwrap();
        let rows = nodes
            .iter()
            .find_map(|n| match n {
                Node::OpTable { rows } => Some(rows),
                _ => None,
            })
            .expect("template has an op table section");
        assert_eq!(rows.len(), KNOWN_OPS_COUNT);

        for (op, row) in rows.iter().enumerate() {
            let body = row
                .split_once('{')
                .and_then(|(_, r)| r.split_once('}'))
                .map(|(b, _)| b)
                .unwrap_or_else(|| panic!("row {} is not a table row: {:?}", op, row));
            let fields: Vec<u8> = body
                .split(',')
                .map(|f| f.trim().parse().unwrap())
                .collect();
            assert_eq!(fields.len(), 4, "row {}", op);
            let data = &smolv::OPDATA[op];
            assert_eq!(fields[0] != 0, data.has_result, "row {} hasResult", op);
            assert_eq!(fields[1] != 0, data.has_type, "row {} hasType", op);
            assert_eq!(fields[2], data.delta_from_result, "row {} delta", op);
            assert_eq!(fields[3] != 0, data.varrest, "row {} varrest", op);
        }
    }

    #[test]
    fn test_full_template_expansion_minimal_shader() {
        let (payload, analysis) = minimal_payload_and_analysis();
        let out = expand(DEFAULT_TEMPLATE, "demo", &payload, &analysis).unwrap();

        // no marker survives expansion
        assert!(!out.contains("SPIRVCRUNCHER"));
        // payload, table and decoder are all present
        assert!(out.contains("const uint8_t demo[] = {"));
        assert!(out.contains("void decrunch(uint8_t* spirvCode)"));
        assert!(out.contains("static const OpData kSpirvOpData[]"));
        // MemoryModel dispatches varint-encoded trailing operands, so
        // the varrest loop and the TypePointer swap pair survive
        assert!(out.contains("kSpirvOpData[op].varrest"));
        assert!(out.contains("_SMOLV_SWAP_OP((SpvOp)32, (SpvOp)14);"));
        // nothing in this shader decorates, shuffles or loads
        assert!(!out.contains("int count = *bytes++;"));
        assert!(!out.contains("_SMOLV_SWAP_OP((SpvOp)71, (SpvOp)0);"));
        assert!(!out.contains("_SMOLV_SWAP_OP((SpvOp)61, (SpvOp)1);"));
        assert!(!out.contains("(swizzle >> 6)"));
        // the opcode name enum is template-only scaffolding
        assert!(!out.contains("enum SpvOp"));
        assert!(!out.contains("SpvOpMemoryModel"));

        // row 14 (MemoryModel) survives, row 71 (Decorate) is zeroed
        let rows: Vec<&str> = out
            .lines()
            .skip_while(|l| !l.contains("kSpirvOpData[] ="))
            .skip(2)
            .take(KNOWN_OPS_COUNT)
            .collect();
        assert_eq!(rows.len(), KNOWN_OPS_COUNT);
        assert!(rows[14].contains("MemoryModel"));
        assert_eq!(rows[71], PLACEHOLDER_ROW);
        assert_eq!(rows[9], PLACEHOLDER_ROW);
    }

    #[test]
    fn test_expansion_is_deterministic() {
        let (payload, analysis) = minimal_payload_and_analysis();
        let a = expand(DEFAULT_TEMPLATE, "demo", &payload, &analysis).unwrap();
        let b = expand(DEFAULT_TEMPLATE, "demo", &payload, &analysis).unwrap();
        assert_eq!(a, b);
    }
}
