//! Per-opcode metadata driving the SMOL-V transform
//!
//! The codec never interprets SPIR-V beyond what this module describes:
//! a fixed table of per-opcode encoding traits, the opcode remap that
//! moves the most frequent instructions into the single-byte varint
//! range, and the per-opcode length bias. Encoder and decoder consult
//! the exact same data; a mismatch between the two sides makes the
//! stream undefined, so everything here is `const`.

/// Opcode of the last known instruction, `GroupNonUniformQuadSwap`.
pub const LAST_KNOWN_OP: u16 = 366;

/// Number of rows in [`OPDATA`] (opcodes `0..=LAST_KNOWN_OP`).
pub const KNOWN_OPS_COUNT: usize = LAST_KNOWN_OP as usize + 1;

// Opcodes the codec treats specially. Everything else is handled purely
// through its OPDATA row.
pub const OP_SOURCE_CONTINUED: u16 = 2;
pub const OP_SOURCE: u16 = 3;
pub const OP_SOURCE_EXTENSION: u16 = 4;
pub const OP_NAME: u16 = 5;
pub const OP_MEMBER_NAME: u16 = 6;
pub const OP_STRING: u16 = 7;
pub const OP_LINE: u16 = 8;
/// Not a real SPIR-V opcode: slot 13 is unused, and the encoder parks
/// the compact-swizzle form of `VectorShuffle` there.
pub const OP_VECTOR_SHUFFLE_COMPACT: u16 = 13;
pub const OP_TYPE_POINTER: u16 = 32;
pub const OP_VARIABLE: u16 = 59;
pub const OP_LOAD: u16 = 61;
pub const OP_STORE: u16 = 62;
pub const OP_ACCESS_CHAIN: u16 = 65;
pub const OP_DECORATE: u16 = 71;
pub const OP_MEMBER_DECORATE: u16 = 72;
pub const OP_VECTOR_SHUFFLE: u16 = 79;
pub const OP_F_NEGATE: u16 = 127;
pub const OP_F_ADD: u16 = 129;
pub const OP_F_MUL: u16 = 133;
pub const OP_LABEL: u16 = 248;
pub const OP_NO_LINE: u16 = 317;
pub const OP_MODULE_PROCESSED: u16 = 330;

/// The `Offset` member decoration, whose value is delta-compressed
/// against the previous offset in the same decoration run.
pub const DECORATION_OFFSET: u32 = 35;

/// Encoding traits of one opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpData {
    /// Instruction produces a result id.
    pub has_result: bool,
    /// Instruction carries a type id right before the result id slot.
    pub has_type: bool,
    /// How many operand words after type+result are stored as zigzagged
    /// deltas against the previous result id (0..=9).
    pub delta_from_result: u8,
    /// Remaining operand words are varint-encoded; otherwise they are
    /// copied as raw 32-bit words.
    pub varrest: bool,
}

const fn op(has_result: u8, has_type: u8, delta_from_result: u8, varrest: u8) -> OpData {
    OpData {
        has_result: has_result != 0,
        has_type: has_type != 0,
        delta_from_result,
        varrest: varrest != 0,
    }
}

/// Encoding traits for every known opcode, indexed by opcode value.
///
/// Unassigned opcode slots (`#9`, `#18`, ...) carry a `(1, 1, 0, 0)`
/// filler row so indexing stays direct.
pub const OPDATA: [OpData; KNOWN_OPS_COUNT] = [
    op(0, 0, 0, 0), // Nop
    op(1, 1, 0, 0), // Undef
    op(0, 0, 0, 0), // SourceContinued
    op(0, 0, 0, 1), // Source
    op(0, 0, 0, 0), // SourceExtension
    op(0, 0, 0, 0), // Name
    op(0, 0, 0, 0), // MemberName
    op(0, 0, 0, 0), // String
    op(0, 0, 0, 1), // Line
    op(1, 1, 0, 0), // #9
    op(0, 0, 0, 0), // Extension
    op(1, 0, 0, 0), // ExtInstImport
    op(1, 1, 0, 1), // ExtInst
    op(1, 1, 2, 1), // VectorShuffleCompact
    op(0, 0, 0, 1), // MemoryModel
    op(0, 0, 0, 1), // EntryPoint
    op(0, 0, 0, 1), // ExecutionMode
    op(0, 0, 0, 1), // Capability
    op(1, 1, 0, 0), // #18
    op(1, 0, 0, 1), // TypeVoid
    op(1, 0, 0, 1), // TypeBool
    op(1, 0, 0, 1), // TypeInt
    op(1, 0, 0, 1), // TypeFloat
    op(1, 0, 0, 1), // TypeVector
    op(1, 0, 0, 1), // TypeMatrix
    op(1, 0, 0, 1), // TypeImage
    op(1, 0, 0, 1), // TypeSampler
    op(1, 0, 0, 1), // TypeSampledImage
    op(1, 0, 0, 1), // TypeArray
    op(1, 0, 0, 1), // TypeRuntimeArray
    op(1, 0, 0, 1), // TypeStruct
    op(1, 0, 0, 1), // TypeOpaque
    op(1, 0, 0, 1), // TypePointer
    op(1, 0, 0, 1), // TypeFunction
    op(1, 0, 0, 1), // TypeEvent
    op(1, 0, 0, 1), // TypeDeviceEvent
    op(1, 0, 0, 1), // TypeReserveId
    op(1, 0, 0, 1), // TypeQueue
    op(1, 0, 0, 1), // TypePipe
    op(0, 0, 0, 1), // TypeForwardPointer
    op(1, 1, 0, 0), // #40
    op(1, 1, 0, 0), // ConstantTrue
    op(1, 1, 0, 0), // ConstantFalse
    op(1, 1, 0, 0), // Constant
    op(1, 1, 9, 0), // ConstantComposite
    op(1, 1, 0, 1), // ConstantSampler
    op(1, 1, 0, 0), // ConstantNull
    op(1, 1, 0, 0), // #47
    op(1, 1, 0, 0), // SpecConstantTrue
    op(1, 1, 0, 0), // SpecConstantFalse
    op(1, 1, 0, 0), // SpecConstant
    op(1, 1, 9, 0), // SpecConstantComposite
    op(1, 1, 0, 0), // SpecConstantOp
    op(1, 1, 0, 0), // #53
    op(1, 1, 0, 1), // Function
    op(1, 1, 0, 0), // FunctionParameter
    op(0, 0, 0, 0), // FunctionEnd
    op(1, 1, 9, 0), // FunctionCall
    op(1, 1, 0, 0), // #58
    op(1, 1, 0, 1), // Variable
    op(1, 1, 0, 0), // ImageTexelPointer
    op(1, 1, 1, 1), // Load
    op(0, 0, 2, 1), // Store
    op(0, 0, 0, 0), // CopyMemory
    op(0, 0, 0, 0), // CopyMemorySized
    op(1, 1, 0, 1), // AccessChain
    op(1, 1, 0, 0), // InBoundsAccessChain
    op(1, 1, 0, 0), // PtrAccessChain
    op(1, 1, 0, 0), // ArrayLength
    op(1, 1, 0, 0), // GenericPtrMemSemantics
    op(1, 1, 0, 0), // InBoundsPtrAccessChain
    op(0, 0, 0, 1), // Decorate
    op(0, 0, 0, 1), // MemberDecorate
    op(1, 0, 0, 0), // DecorationGroup
    op(0, 0, 0, 0), // GroupDecorate
    op(0, 0, 0, 0), // GroupMemberDecorate
    op(1, 1, 0, 0), // #76
    op(1, 1, 1, 1), // VectorExtractDynamic
    op(1, 1, 2, 1), // VectorInsertDynamic
    op(1, 1, 2, 1), // VectorShuffle
    op(1, 1, 9, 0), // CompositeConstruct
    op(1, 1, 1, 1), // CompositeExtract
    op(1, 1, 2, 1), // CompositeInsert
    op(1, 1, 1, 0), // CopyObject
    op(1, 1, 0, 0), // Transpose
    op(1, 1, 0, 0), // #85
    op(1, 1, 0, 0), // SampledImage
    op(1, 1, 2, 1), // ImageSampleImplicitLod
    op(1, 1, 2, 1), // ImageSampleExplicitLod
    op(1, 1, 3, 1), // ImageSampleDrefImplicitLod
    op(1, 1, 3, 1), // ImageSampleDrefExplicitLod
    op(1, 1, 2, 1), // ImageSampleProjImplicitLod
    op(1, 1, 2, 1), // ImageSampleProjExplicitLod
    op(1, 1, 3, 1), // ImageSampleProjDrefImplicitLod
    op(1, 1, 3, 1), // ImageSampleProjDrefExplicitLod
    op(1, 1, 2, 1), // ImageFetch
    op(1, 1, 3, 1), // ImageGather
    op(1, 1, 3, 1), // ImageDrefGather
    op(1, 1, 2, 1), // ImageRead
    op(0, 0, 3, 1), // ImageWrite
    op(1, 1, 1, 0), // Image
    op(1, 1, 1, 0), // ImageQueryFormat
    op(1, 1, 1, 0), // ImageQueryOrder
    op(1, 1, 2, 0), // ImageQuerySizeLod
    op(1, 1, 1, 0), // ImageQuerySize
    op(1, 1, 2, 0), // ImageQueryLod
    op(1, 1, 1, 0), // ImageQueryLevels
    op(1, 1, 1, 0), // ImageQuerySamples
    op(1, 1, 0, 0), // #108
    op(1, 1, 1, 0), // ConvertFToU
    op(1, 1, 1, 0), // ConvertFToS
    op(1, 1, 1, 0), // ConvertSToF
    op(1, 1, 1, 0), // ConvertUToF
    op(1, 1, 1, 0), // UConvert
    op(1, 1, 1, 0), // SConvert
    op(1, 1, 1, 0), // FConvert
    op(1, 1, 1, 0), // QuantizeToF16
    op(1, 1, 1, 0), // ConvertPtrToU
    op(1, 1, 1, 0), // SatConvertSToU
    op(1, 1, 1, 0), // SatConvertUToS
    op(1, 1, 1, 0), // ConvertUToPtr
    op(1, 1, 1, 0), // PtrCastToGeneric
    op(1, 1, 1, 0), // GenericCastToPtr
    op(1, 1, 1, 1), // GenericCastToPtrExplicit
    op(1, 1, 1, 0), // Bitcast
    op(1, 1, 0, 0), // #125
    op(1, 1, 1, 0), // SNegate
    op(1, 1, 1, 0), // FNegate
    op(1, 1, 2, 0), // IAdd
    op(1, 1, 2, 0), // FAdd
    op(1, 1, 2, 0), // ISub
    op(1, 1, 2, 0), // FSub
    op(1, 1, 2, 0), // IMul
    op(1, 1, 2, 0), // FMul
    op(1, 1, 2, 0), // UDiv
    op(1, 1, 2, 0), // SDiv
    op(1, 1, 2, 0), // FDiv
    op(1, 1, 2, 0), // UMod
    op(1, 1, 2, 0), // SRem
    op(1, 1, 2, 0), // SMod
    op(1, 1, 2, 0), // FRem
    op(1, 1, 2, 0), // FMod
    op(1, 1, 2, 0), // VectorTimesScalar
    op(1, 1, 2, 0), // MatrixTimesScalar
    op(1, 1, 2, 0), // VectorTimesMatrix
    op(1, 1, 2, 0), // MatrixTimesVector
    op(1, 1, 2, 0), // MatrixTimesMatrix
    op(1, 1, 2, 0), // OuterProduct
    op(1, 1, 2, 0), // Dot
    op(1, 1, 2, 0), // IAddCarry
    op(1, 1, 2, 0), // ISubBorrow
    op(1, 1, 2, 0), // UMulExtended
    op(1, 1, 2, 0), // SMulExtended
    op(1, 1, 0, 0), // #153
    op(1, 1, 1, 0), // Any
    op(1, 1, 1, 0), // All
    op(1, 1, 1, 0), // IsNan
    op(1, 1, 1, 0), // IsInf
    op(1, 1, 1, 0), // IsFinite
    op(1, 1, 1, 0), // IsNormal
    op(1, 1, 1, 0), // SignBitSet
    op(1, 1, 2, 0), // LessOrGreater
    op(1, 1, 2, 0), // Ordered
    op(1, 1, 2, 0), // Unordered
    op(1, 1, 2, 0), // LogicalEqual
    op(1, 1, 2, 0), // LogicalNotEqual
    op(1, 1, 2, 0), // LogicalOr
    op(1, 1, 2, 0), // LogicalAnd
    op(1, 1, 1, 0), // LogicalNot
    op(1, 1, 3, 0), // Select
    op(1, 1, 2, 0), // IEqual
    op(1, 1, 2, 0), // INotEqual
    op(1, 1, 2, 0), // UGreaterThan
    op(1, 1, 2, 0), // SGreaterThan
    op(1, 1, 2, 0), // UGreaterThanEqual
    op(1, 1, 2, 0), // SGreaterThanEqual
    op(1, 1, 2, 0), // ULessThan
    op(1, 1, 2, 0), // SLessThan
    op(1, 1, 2, 0), // ULessThanEqual
    op(1, 1, 2, 0), // SLessThanEqual
    op(1, 1, 2, 0), // FOrdEqual
    op(1, 1, 2, 0), // FUnordEqual
    op(1, 1, 2, 0), // FOrdNotEqual
    op(1, 1, 2, 0), // FUnordNotEqual
    op(1, 1, 2, 0), // FOrdLessThan
    op(1, 1, 2, 0), // FUnordLessThan
    op(1, 1, 2, 0), // FOrdGreaterThan
    op(1, 1, 2, 0), // FUnordGreaterThan
    op(1, 1, 2, 0), // FOrdLessThanEqual
    op(1, 1, 2, 0), // FUnordLessThanEqual
    op(1, 1, 2, 0), // FOrdGreaterThanEqual
    op(1, 1, 2, 0), // FUnordGreaterThanEqual
    op(1, 1, 0, 0), // #192
    op(1, 1, 0, 0), // #193
    op(1, 1, 2, 0), // ShiftRightLogical
    op(1, 1, 2, 0), // ShiftRightArithmetic
    op(1, 1, 2, 0), // ShiftLeftLogical
    op(1, 1, 2, 0), // BitwiseOr
    op(1, 1, 2, 0), // BitwiseXor
    op(1, 1, 2, 0), // BitwiseAnd
    op(1, 1, 1, 0), // Not
    op(1, 1, 4, 0), // BitFieldInsert
    op(1, 1, 3, 0), // BitFieldSExtract
    op(1, 1, 3, 0), // BitFieldUExtract
    op(1, 1, 1, 0), // BitReverse
    op(1, 1, 1, 0), // BitCount
    op(1, 1, 0, 0), // #206
    op(1, 1, 0, 0), // DPdx
    op(1, 1, 0, 0), // DPdy
    op(1, 1, 0, 0), // Fwidth
    op(1, 1, 0, 0), // DPdxFine
    op(1, 1, 0, 0), // DPdyFine
    op(1, 1, 0, 0), // FwidthFine
    op(1, 1, 0, 0), // DPdxCoarse
    op(1, 1, 0, 0), // DPdyCoarse
    op(1, 1, 0, 0), // FwidthCoarse
    op(1, 1, 0, 0), // #216
    op(1, 1, 0, 0), // #217
    op(0, 0, 0, 0), // EmitVertex
    op(0, 0, 0, 0), // EndPrimitive
    op(0, 0, 0, 0), // EmitStreamVertex
    op(0, 0, 0, 0), // EndStreamPrimitive
    op(1, 1, 0, 0), // #222
    op(1, 1, 0, 0), // #223
    op(0, 0, 3, 0), // ControlBarrier
    op(0, 0, 2, 0), // MemoryBarrier
    op(1, 1, 0, 0), // #226
    op(1, 1, 0, 0), // AtomicLoad
    op(0, 0, 0, 0), // AtomicStore
    op(1, 1, 0, 0), // AtomicExchange
    op(1, 1, 0, 0), // AtomicCompareExchange
    op(1, 1, 0, 0), // AtomicCompareExchangeWeak
    op(1, 1, 0, 0), // AtomicIIncrement
    op(1, 1, 0, 0), // AtomicIDecrement
    op(1, 1, 0, 0), // AtomicIAdd
    op(1, 1, 0, 0), // AtomicISub
    op(1, 1, 0, 0), // AtomicSMin
    op(1, 1, 0, 0), // AtomicUMin
    op(1, 1, 0, 0), // AtomicSMax
    op(1, 1, 0, 0), // AtomicUMax
    op(1, 1, 0, 0), // AtomicAnd
    op(1, 1, 0, 0), // AtomicOr
    op(1, 1, 0, 0), // AtomicXor
    op(1, 1, 0, 0), // #243
    op(1, 1, 0, 0), // #244
    op(1, 1, 0, 0), // Phi
    op(0, 0, 2, 1), // LoopMerge
    op(0, 0, 1, 1), // SelectionMerge
    op(1, 0, 0, 0), // Label
    op(0, 0, 1, 0), // Branch
    op(0, 0, 3, 1), // BranchConditional
    op(0, 0, 0, 0), // Switch
    op(0, 0, 0, 0), // Kill
    op(0, 0, 0, 0), // Return
    op(0, 0, 0, 0), // ReturnValue
    op(0, 0, 0, 0), // Unreachable
    op(0, 0, 0, 0), // LifetimeStart
    op(0, 0, 0, 0), // LifetimeStop
    op(1, 1, 0, 0), // #258
    op(1, 1, 0, 0), // GroupAsyncCopy
    op(0, 0, 0, 0), // GroupWaitEvents
    op(1, 1, 0, 0), // GroupAll
    op(1, 1, 0, 0), // GroupAny
    op(1, 1, 0, 0), // GroupBroadcast
    op(1, 1, 0, 0), // GroupIAdd
    op(1, 1, 0, 0), // GroupFAdd
    op(1, 1, 0, 0), // GroupFMin
    op(1, 1, 0, 0), // GroupUMin
    op(1, 1, 0, 0), // GroupSMin
    op(1, 1, 0, 0), // GroupFMax
    op(1, 1, 0, 0), // GroupUMax
    op(1, 1, 0, 0), // GroupSMax
    op(1, 1, 0, 0), // #272
    op(1, 1, 0, 0), // #273
    op(1, 1, 0, 0), // ReadPipe
    op(1, 1, 0, 0), // WritePipe
    op(1, 1, 0, 0), // ReservedReadPipe
    op(1, 1, 0, 0), // ReservedWritePipe
    op(1, 1, 0, 0), // ReserveReadPipePackets
    op(1, 1, 0, 0), // ReserveWritePipePackets
    op(0, 0, 0, 0), // CommitReadPipe
    op(0, 0, 0, 0), // CommitWritePipe
    op(1, 1, 0, 0), // IsValidReserveId
    op(1, 1, 0, 0), // GetNumPipePackets
    op(1, 1, 0, 0), // GetMaxPipePackets
    op(1, 1, 0, 0), // GroupReserveReadPipePackets
    op(1, 1, 0, 0), // GroupReserveWritePipePackets
    op(0, 0, 0, 0), // GroupCommitReadPipe
    op(0, 0, 0, 0), // GroupCommitWritePipe
    op(1, 1, 0, 0), // #289
    op(1, 1, 0, 0), // #290
    op(1, 1, 0, 0), // EnqueueMarker
    op(1, 1, 0, 0), // EnqueueKernel
    op(1, 1, 0, 0), // GetKernelNDrangeSubGroupCount
    op(1, 1, 0, 0), // GetKernelNDrangeMaxSubGroupSize
    op(1, 1, 0, 0), // GetKernelWorkGroupSize
    op(1, 1, 0, 0), // GetKernelPreferredWorkGroupSizeMultiple
    op(0, 0, 0, 0), // RetainEvent
    op(0, 0, 0, 0), // ReleaseEvent
    op(1, 1, 0, 0), // CreateUserEvent
    op(1, 1, 0, 0), // IsValidEvent
    op(0, 0, 0, 0), // SetUserEventStatus
    op(0, 0, 0, 0), // CaptureEventProfilingInfo
    op(1, 1, 0, 0), // GetDefaultQueue
    op(1, 1, 0, 0), // BuildNDRange
    op(1, 1, 2, 1), // ImageSparseSampleImplicitLod
    op(1, 1, 2, 1), // ImageSparseSampleExplicitLod
    op(1, 1, 3, 1), // ImageSparseSampleDrefImplicitLod
    op(1, 1, 3, 1), // ImageSparseSampleDrefExplicitLod
    op(1, 1, 2, 1), // ImageSparseSampleProjImplicitLod
    op(1, 1, 2, 1), // ImageSparseSampleProjExplicitLod
    op(1, 1, 3, 1), // ImageSparseSampleProjDrefImplicitLod
    op(1, 1, 3, 1), // ImageSparseSampleProjDrefExplicitLod
    op(1, 1, 2, 1), // ImageSparseFetch
    op(1, 1, 3, 1), // ImageSparseGather
    op(1, 1, 3, 1), // ImageSparseDrefGather
    op(1, 1, 1, 0), // ImageSparseTexelsResident
    op(0, 0, 0, 0), // NoLine
    op(1, 1, 0, 0), // AtomicFlagTestAndSet
    op(0, 0, 0, 0), // AtomicFlagClear
    op(1, 1, 0, 0), // ImageSparseRead
    op(1, 1, 0, 0), // SizeOf
    op(1, 1, 0, 0), // TypePipeStorage
    op(1, 1, 0, 0), // ConstantPipeStorage
    op(1, 1, 0, 0), // CreatePipeFromPipeStorage
    op(1, 1, 0, 0), // GetKernelLocalSizeForSubgroupCount
    op(1, 1, 0, 0), // GetKernelMaxNumSubgroups
    op(1, 1, 0, 0), // TypeNamedBarrier
    op(1, 1, 0, 1), // NamedBarrierInitialize
    op(0, 0, 2, 1), // MemoryNamedBarrier
    op(1, 1, 0, 0), // ModuleProcessed
    op(0, 0, 0, 1), // ExecutionModeId
    op(0, 0, 0, 1), // DecorateId
    op(1, 1, 1, 1), // GroupNonUniformElect
    op(1, 1, 1, 1), // GroupNonUniformAll
    op(1, 1, 1, 1), // GroupNonUniformAny
    op(1, 1, 1, 1), // GroupNonUniformAllEqual
    op(1, 1, 1, 1), // GroupNonUniformBroadcast
    op(1, 1, 1, 1), // GroupNonUniformBroadcastFirst
    op(1, 1, 1, 1), // GroupNonUniformBallot
    op(1, 1, 1, 1), // GroupNonUniformInverseBallot
    op(1, 1, 1, 1), // GroupNonUniformBallotBitExtract
    op(1, 1, 1, 1), // GroupNonUniformBallotBitCount
    op(1, 1, 1, 1), // GroupNonUniformBallotFindLSB
    op(1, 1, 1, 1), // GroupNonUniformBallotFindMSB
    op(1, 1, 1, 1), // GroupNonUniformShuffle
    op(1, 1, 1, 1), // GroupNonUniformShuffleXor
    op(1, 1, 1, 1), // GroupNonUniformShuffleUp
    op(1, 1, 1, 1), // GroupNonUniformShuffleDown
    op(1, 1, 1, 1), // GroupNonUniformIAdd
    op(1, 1, 1, 1), // GroupNonUniformFAdd
    op(1, 1, 1, 1), // GroupNonUniformIMul
    op(1, 1, 1, 1), // GroupNonUniformFMul
    op(1, 1, 1, 1), // GroupNonUniformSMin
    op(1, 1, 1, 1), // GroupNonUniformUMin
    op(1, 1, 1, 1), // GroupNonUniformFMin
    op(1, 1, 1, 1), // GroupNonUniformSMax
    op(1, 1, 1, 1), // GroupNonUniformUMax
    op(1, 1, 1, 1), // GroupNonUniformFMax
    op(1, 1, 1, 1), // GroupNonUniformBitwiseAnd
    op(1, 1, 1, 1), // GroupNonUniformBitwiseOr
    op(1, 1, 1, 1), // GroupNonUniformBitwiseXor
    op(1, 1, 1, 1), // GroupNonUniformLogicalAnd
    op(1, 1, 1, 1), // GroupNonUniformLogicalOr
    op(1, 1, 1, 1), // GroupNonUniformLogicalXor
    op(1, 1, 1, 1), // GroupNonUniformQuadBroadcast
    op(1, 1, 1, 1), // GroupNonUniformQuadSwap
];

/// The twelve high-frequency opcodes swapped into the `0..16` range,
/// paired with the low-value opcodes they displace. Applying the swap
/// twice yields the original opcode, so encoder and decoder share one
/// function.
pub const REMAP_SWAPS: [(u16, u16); 12] = [
    (OP_DECORATE, 0),                  // Nop
    (OP_LOAD, 1),                      // Undef
    (OP_STORE, OP_SOURCE_CONTINUED),   // 2
    (OP_ACCESS_CHAIN, OP_SOURCE),      // 3
    (OP_VECTOR_SHUFFLE, OP_SOURCE_EXTENSION), // 4
    (OP_MEMBER_DECORATE, OP_STRING),   // 7
    (OP_LABEL, OP_LINE),               // 8
    (OP_VARIABLE, 9),                  // unassigned slot
    (OP_F_MUL, 10),                    // Extension
    (OP_F_ADD, 11),                    // ExtInstImport
    (OP_TYPE_POINTER, 14),             // MemoryModel
    (OP_F_NEGATE, 15),                 // EntryPoint
];

/// Swap an opcode through the remap table. Involution: `remap_op` is
/// its own inverse.
pub fn remap_op(op: u16) -> u16 {
    for &(a, b) in &REMAP_SWAPS {
        if op == a {
            return b;
        }
        if op == b {
            return a;
        }
    }
    op
}

/// Opcodes with a known minimum length above 1, and how much of that
/// minimum the wire format shaves off so the common case fits in the
/// packed word's low length bits.
pub const LEN_BIAS: [(u16, u32); 5] = [
    (OP_VECTOR_SHUFFLE, 4),
    (OP_VECTOR_SHUFFLE_COMPACT, 4),
    (OP_DECORATE, 2),
    (OP_LOAD, 3),
    (OP_ACCESS_CHAIN, 3),
];

/// Bias an instruction length before encoding (minimum length is 1, so
/// at least 1 is always subtracted).
pub fn encode_len(op: u16, len: u32) -> u32 {
    let mut len = len - 1;
    for &(bias_op, bias) in &LEN_BIAS {
        if op == bias_op {
            len -= bias;
        }
    }
    len
}

/// Undo [`encode_len`].
pub fn decode_len(op: u16, len: u32) -> u32 {
    let mut len = len + 1;
    for &(bias_op, bias) in &LEN_BIAS {
        if op == bias_op {
            len += bias;
        }
    }
    len
}

/// Extra operand words carried by a member decoration, when knowable
/// from the decoration value alone: 0 for `RelaxedPrecision` and
/// `Block..=ColMajor`, 1 for `Stream..=XfbStride`, and `None` when the
/// word count must be encoded explicitly.
pub fn decoration_extra_words(dec: u32) -> Option<u32> {
    match dec {
        0 | 2..=5 => Some(0),
        29..=37 => Some(1),
        _ => None,
    }
}

/// Debug-information opcodes removed by the strip-debug-info encoder
/// flag.
pub fn is_debug_op(op: u16) -> bool {
    matches!(
        op,
        OP_SOURCE_CONTINUED
            | OP_SOURCE
            | OP_SOURCE_EXTENSION
            | OP_NAME
            | OP_MEMBER_NAME
            | OP_STRING
            | OP_LINE
            | OP_NO_LINE
            | OP_MODULE_PROCESSED
    )
}

/// Line-debug opcodes removed by the strip-only-lines encoder flag.
pub fn is_line_op(op: u16) -> bool {
    op == OP_LINE || op == OP_NO_LINE
}
