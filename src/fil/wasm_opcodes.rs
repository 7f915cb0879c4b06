//! The WebAssembly half of the FIL opcode catalogue.
//!
//! Numeric opcodes are grouped by operand type with a sub-operator enum;
//! each group computes its encoding byte from a base offset so the byte
//! tables stay next to the operators they encode.
//!
//! Operand conventions:
//! - Module-level entities (functions, globals, tables, memories, tags,
//!   segments, user-defined types) are referenced through input variables;
//!   the binary lifter resolves them to index-space slots.
//! - Block labels are inner outputs of block-starting opcodes and are
//!   passed back in as the first input of branch opcodes.
//! - Where an instruction consumes both block arguments and a condition,
//!   the condition is the last input (top of stack).

use crate::wasm::types::{
    BranchHint, HeapType, Limits, Signature, TableElementType, ValueType, WasmGlobalValue,
};

/// Binary operators shared by i32 and i64.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegerBinaryOp {
    Add,
    Sub,
    Mul,
    DivS,
    DivU,
    RemS,
    RemU,
    And,
    Or,
    Xor,
    Shl,
    ShrS,
    ShrU,
    Rotl,
    Rotr,
}

impl IntegerBinaryOp {
    fn offset(self) -> u8 {
        self as u8
    }

    pub fn opcode_i32(self) -> u8 {
        0x6A + self.offset()
    }

    pub fn opcode_i64(self) -> u8 {
        0x7C + self.offset()
    }
}

/// Comparison operators shared by i32 and i64. Signed/unsigned variants use
/// adjacent opcode bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegerCompareOp {
    Eq,
    Ne,
    LtS,
    LtU,
    GtS,
    GtU,
    LeS,
    LeU,
    GeS,
    GeU,
}

impl IntegerCompareOp {
    pub fn opcode_i32(self) -> u8 {
        0x46 + self as u8
    }

    pub fn opcode_i64(self) -> u8 {
        0x51 + self as u8
    }
}

/// Unary operators shared by i32 and i64.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegerUnaryOp {
    Clz,
    Ctz,
    Popcnt,
}

impl IntegerUnaryOp {
    pub fn opcode_i32(self) -> u8 {
        0x67 + self as u8
    }

    pub fn opcode_i64(self) -> u8 {
        0x79 + self as u8
    }
}

/// Binary operators shared by f32 and f64.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatBinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Min,
    Max,
    Copysign,
}

impl FloatBinaryOp {
    pub fn opcode_f32(self) -> u8 {
        0x92 + self as u8
    }

    pub fn opcode_f64(self) -> u8 {
        0xA0 + self as u8
    }
}

/// Unary operators shared by f32 and f64.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatUnaryOp {
    Abs,
    Neg,
    Ceil,
    Floor,
    Trunc,
    Nearest,
    Sqrt,
}

impl FloatUnaryOp {
    pub fn opcode_f32(self) -> u8 {
        0x8B + self as u8
    }

    pub fn opcode_f64(self) -> u8 {
        0x99 + self as u8
    }
}

/// Comparison operators shared by f32 and f64.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatCompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl FloatCompareOp {
    pub fn opcode_f32(self) -> u8 {
        0x5B + self as u8
    }

    pub fn opcode_f64(self) -> u8 {
        0x61 + self as u8
    }
}

/// Encoding of a numeric opcode: a plain byte, or a prefix byte followed by
/// a ULEB128 sub-opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericEncoding {
    Single(u8),
    Prefixed(u8, u32),
}

/// Conversion opcodes between the numeric types, including the saturating
/// truncations behind the 0xFC numeric prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionOp {
    I32WrapI64,
    I32TruncF32S,
    I32TruncF32U,
    I32TruncF64S,
    I32TruncF64U,
    I64ExtendI32S,
    I64ExtendI32U,
    I64TruncF32S,
    I64TruncF32U,
    I64TruncF64S,
    I64TruncF64U,
    F32ConvertI32S,
    F32ConvertI32U,
    F32ConvertI64S,
    F32ConvertI64U,
    F32DemoteF64,
    F64ConvertI32S,
    F64ConvertI32U,
    F64ConvertI64S,
    F64ConvertI64U,
    F64PromoteF32,
    I32ReinterpretF32,
    I64ReinterpretF64,
    F32ReinterpretI32,
    F64ReinterpretI64,
    I32Extend8S,
    I32Extend16S,
    I64Extend8S,
    I64Extend16S,
    I64Extend32S,
    I32TruncSatF32S,
    I32TruncSatF32U,
    I32TruncSatF64S,
    I32TruncSatF64U,
    I64TruncSatF32S,
    I64TruncSatF32U,
    I64TruncSatF64S,
    I64TruncSatF64U,
}

impl ConversionOp {
    pub fn encoding(self) -> NumericEncoding {
        use ConversionOp::*;
        use NumericEncoding::*;
        match self {
            I32WrapI64 => Single(0xA7),
            I32TruncF32S => Single(0xA8),
            I32TruncF32U => Single(0xA9),
            I32TruncF64S => Single(0xAA),
            I32TruncF64U => Single(0xAB),
            I64ExtendI32S => Single(0xAC),
            I64ExtendI32U => Single(0xAD),
            I64TruncF32S => Single(0xAE),
            I64TruncF32U => Single(0xAF),
            I64TruncF64S => Single(0xB0),
            I64TruncF64U => Single(0xB1),
            F32ConvertI32S => Single(0xB2),
            F32ConvertI32U => Single(0xB3),
            F32ConvertI64S => Single(0xB4),
            F32ConvertI64U => Single(0xB5),
            F32DemoteF64 => Single(0xB6),
            F64ConvertI32S => Single(0xB7),
            F64ConvertI32U => Single(0xB8),
            F64ConvertI64S => Single(0xB9),
            F64ConvertI64U => Single(0xBA),
            F64PromoteF32 => Single(0xBB),
            I32ReinterpretF32 => Single(0xBC),
            I64ReinterpretF64 => Single(0xBD),
            F32ReinterpretI32 => Single(0xBE),
            F64ReinterpretI64 => Single(0xBF),
            I32Extend8S => Single(0xC0),
            I32Extend16S => Single(0xC1),
            I64Extend8S => Single(0xC2),
            I64Extend16S => Single(0xC3),
            I64Extend32S => Single(0xC4),
            I32TruncSatF32S => Prefixed(0xFC, 0),
            I32TruncSatF32U => Prefixed(0xFC, 1),
            I32TruncSatF64S => Prefixed(0xFC, 2),
            I32TruncSatF64U => Prefixed(0xFC, 3),
            I64TruncSatF32S => Prefixed(0xFC, 4),
            I64TruncSatF32U => Prefixed(0xFC, 5),
            I64TruncSatF64S => Prefixed(0xFC, 6),
            I64TruncSatF64U => Prefixed(0xFC, 7),
        }
    }
}

/// Plain memory load shapes. The natural alignment is the access width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryLoadKind {
    I32Load,
    I64Load,
    F32Load,
    F64Load,
    I32Load8S,
    I32Load8U,
    I32Load16S,
    I32Load16U,
    I64Load8S,
    I64Load8U,
    I64Load16S,
    I64Load16U,
    I64Load32S,
    I64Load32U,
}

impl MemoryLoadKind {
    pub fn opcode(self) -> u8 {
        0x28 + self as u8
    }

    pub fn natural_alignment_log2(self) -> u32 {
        use MemoryLoadKind::*;
        match self {
            I32Load | F32Load | I64Load32S | I64Load32U => 2,
            I64Load | F64Load => 3,
            I32Load8S | I32Load8U | I64Load8S | I64Load8U => 0,
            I32Load16S | I32Load16U | I64Load16S | I64Load16U => 1,
        }
    }
}

/// Plain memory store shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryStoreKind {
    I32Store,
    I64Store,
    F32Store,
    F64Store,
    I32Store8,
    I32Store16,
    I64Store8,
    I64Store16,
    I64Store32,
}

impl MemoryStoreKind {
    pub fn opcode(self) -> u8 {
        0x36 + self as u8
    }

    pub fn natural_alignment_log2(self) -> u32 {
        use MemoryStoreKind::*;
        match self {
            I32Store | I64Store32 => 2,
            I64Store | F64Store => 3,
            F32Store => 2,
            I32Store8 | I64Store8 => 0,
            I32Store16 | I64Store16 => 1,
        }
    }
}

/// Atomic access widths. The alignment constraint always matches the access
/// width exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomicWidth {
    I32,
    I64,
    I32As8U,
    I32As16U,
    I64As8U,
    I64As16U,
    I64As32U,
}

impl AtomicWidth {
    fn row_offset(self) -> u32 {
        self as u32
    }

    pub fn alignment_log2(self) -> u32 {
        use AtomicWidth::*;
        match self {
            I32 | I64As32U => 2,
            I64 => 3,
            I32As8U | I64As8U => 0,
            I32As16U | I64As16U => 1,
        }
    }
}

/// Atomic load shapes (0xFE prefix).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtomicLoadKind {
    pub width: AtomicWidth,
}

impl AtomicLoadKind {
    pub fn sub_opcode(self) -> u32 {
        0x10 + self.width.row_offset()
    }
}

/// Atomic store shapes (0xFE prefix).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtomicStoreKind {
    pub width: AtomicWidth,
}

impl AtomicStoreKind {
    pub fn sub_opcode(self) -> u32 {
        0x17 + self.width.row_offset()
    }
}

/// Atomic read-modify-write operators (0xFE prefix). Each operator owns a
/// row of seven width variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomicRmwOp {
    Add,
    Sub,
    And,
    Or,
    Xor,
    Xchg,
    Cmpxchg,
}

impl AtomicRmwOp {
    fn row_base(self) -> u32 {
        match self {
            AtomicRmwOp::Add => 0x1E,
            AtomicRmwOp::Sub => 0x25,
            AtomicRmwOp::And => 0x2C,
            AtomicRmwOp::Or => 0x33,
            AtomicRmwOp::Xor => 0x3A,
            AtomicRmwOp::Xchg => 0x41,
            AtomicRmwOp::Cmpxchg => 0x48,
        }
    }

    pub fn sub_opcode(self, width: AtomicWidth) -> u32 {
        self.row_base() + width.row_offset()
    }
}

/// SIMD lane interpretations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimdLaneKind {
    I8x16,
    I16x8,
    I32x4,
    I64x2,
    F32x4,
    F64x2,
}

impl SimdLaneKind {
    pub fn splat_sub_opcode(self) -> u32 {
        0x0F + self as u32
    }

    pub fn lane_count(self) -> u8 {
        match self {
            SimdLaneKind::I8x16 => 16,
            SimdLaneKind::I16x8 => 8,
            SimdLaneKind::I32x4 => 4,
            SimdLaneKind::I64x2 => 2,
            SimdLaneKind::F32x4 => 4,
            SimdLaneKind::F64x2 => 2,
        }
    }

    /// Sub-opcode for extract_lane. Packed shapes pick signed or unsigned.
    pub fn extract_sub_opcode(self, signed: bool) -> u32 {
        match self {
            SimdLaneKind::I8x16 => {
                if signed {
                    0x15
                } else {
                    0x16
                }
            }
            SimdLaneKind::I16x8 => {
                if signed {
                    0x18
                } else {
                    0x19
                }
            }
            SimdLaneKind::I32x4 => 0x1B,
            SimdLaneKind::I64x2 => 0x1D,
            SimdLaneKind::F32x4 => 0x1F,
            SimdLaneKind::F64x2 => 0x21,
        }
    }

    pub fn replace_sub_opcode(self) -> u32 {
        match self {
            SimdLaneKind::I8x16 => 0x17,
            SimdLaneKind::I16x8 => 0x1A,
            SimdLaneKind::I32x4 => 0x1C,
            SimdLaneKind::I64x2 => 0x1E,
            SimdLaneKind::F32x4 => 0x20,
            SimdLaneKind::F64x2 => 0x22,
        }
    }
}

/// Curated set of v128 binary operators (0xFD prefix).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimdBinaryOp {
    V128And,
    V128Or,
    V128Xor,
    I8x16Add,
    I8x16Sub,
    I16x8Add,
    I16x8Sub,
    I16x8Mul,
    I32x4Add,
    I32x4Sub,
    I32x4Mul,
    I64x2Add,
    I64x2Sub,
    I64x2Mul,
    F32x4Add,
    F32x4Sub,
    F32x4Mul,
    F32x4Div,
    F64x2Add,
    F64x2Sub,
    F64x2Mul,
    F64x2Div,
}

impl SimdBinaryOp {
    pub fn sub_opcode(self) -> u32 {
        use SimdBinaryOp::*;
        match self {
            V128And => 0x4E,
            V128Or => 0x50,
            V128Xor => 0x51,
            I8x16Add => 0x6E,
            I8x16Sub => 0x71,
            I16x8Add => 0x8E,
            I16x8Sub => 0x91,
            I16x8Mul => 0x95,
            I32x4Add => 0xAE,
            I32x4Sub => 0xB1,
            I32x4Mul => 0xB5,
            I64x2Add => 0xCE,
            I64x2Sub => 0xD1,
            I64x2Mul => 0xD5,
            F32x4Add => 0xE4,
            F32x4Sub => 0xE5,
            F32x4Mul => 0xE6,
            F32x4Div => 0xE7,
            F64x2Add => 0xF0,
            F64x2Sub => 0xF1,
            F64x2Mul => 0xF2,
            F64x2Div => 0xF3,
        }
    }
}

/// Target of a reference cast/test/null. `TypeDef` consumes the last input
/// variable, which must be a type-definition variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastTarget {
    Abstract(HeapType),
    TypeDef,
}

/// Access mode for struct/array getters of possibly-packed fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcGetMode {
    Plain,
    Signed,
    Unsigned,
}

/// Catch clause kinds of a `try_table` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatchKind {
    Catch,
    CatchRef,
    CatchAll,
    CatchAllRef,
}

impl CatchKind {
    pub fn encoding_byte(self) -> u8 {
        match self {
            CatchKind::Catch => 0x00,
            CatchKind::CatchRef => 0x01,
            CatchKind::CatchAll => 0x02,
            CatchKind::CatchAllRef => 0x03,
        }
    }

    pub fn needs_tag(self) -> bool {
        matches!(self, CatchKind::Catch | CatchKind::CatchRef)
    }
}

/// The WebAssembly opcode catalogue.
#[derive(Debug, Clone, PartialEq)]
pub enum WasmOp {
    // ----- functions and structured control -----
    /// Inner outputs: the parameters in signature order. The JS-level
    /// output is the function object bound after instantiation.
    BeginFunction { signature: Signature },
    /// Inputs: the function's final result values.
    EndFunction,
    /// Inputs: the return values.
    Return,
    /// Inputs: block arguments; inner outputs: [label, parameters...].
    BeginBlock { signature: Signature },
    /// Inputs: the block's result values; outputs: the results, re-bound
    /// for code after the block.
    EndBlock,
    BeginLoop { signature: Signature },
    EndLoop,
    /// Inputs: [arguments..., condition].
    BeginIf { signature: Signature, hint: Option<BranchHint> },
    /// Inputs: the true branch's result values.
    BeginElse,
    /// Inputs: the taken branch's result values; outputs: the results.
    EndIf,
    BeginTry { signature: Signature },
    /// Inputs: [tag]; inner outputs: [label, exception parameters...].
    BeginCatch,
    BeginCatchAll,
    /// Inputs: result values; outputs: the results.
    EndTry,
    /// Inputs: [arguments..., clause tags..., clause labels...] with one
    /// tag per tag-carrying clause and one label per clause.
    BeginTryTable { signature: Signature, catches: Vec<CatchKind> },
    EndTryTable,
    /// Inputs: [tag, arguments...].
    Throw,
    /// Inputs: [label of the catch block to rethrow from].
    Rethrow,
    /// Inputs: [exception reference].
    ThrowRef,

    // ----- branches -----
    /// Inputs: [label, arguments...].
    Branch,
    /// Inputs: [label, arguments..., condition].
    BranchIf { hint: Option<BranchHint> },
    /// Inputs: [index, default label, case labels...].
    BranchTable,
    /// Inputs: [label, reference]; output: the non-null reference.
    BrOnNull,
    BrOnNonNull,
    /// Inputs: [label, reference] plus a trailing type-definition input
    /// when the target is `TypeDef`.
    BrOnCast { target: CastTarget, input_nullable: bool, result_nullable: bool },
    BrOnCastFail { target: CastTarget, input_nullable: bool, result_nullable: bool },

    // ----- calls -----
    /// Inputs: [function, arguments...].
    Call,
    /// Inputs: [table, element index, arguments...].
    CallIndirect { signature: Signature },
    ReturnCall,
    ReturnCallIndirect { signature: Signature },
    /// Inputs: [function reference, arguments...].
    CallRef { signature: Signature },
    /// Inputs: [JavaScript function, arguments...]. Becomes a function
    /// import with this call-site signature.
    JsCall { signature: Signature },

    // ----- parametric -----
    Unreachable,
    Nop,
    Drop,
    /// Inputs: [a, b, condition]. Typed form when `ty` is present.
    Select { ty: Option<ValueType> },

    // ----- constants and numerics -----
    Consti32 { value: i32 },
    Consti64 { value: i64 },
    Constf32 { value: f32 },
    Constf64 { value: f64 },
    ConstSimd128 { value: [u8; 16] },
    I32Binary { op: IntegerBinaryOp },
    I64Binary { op: IntegerBinaryOp },
    F32Binary { op: FloatBinaryOp },
    F64Binary { op: FloatBinaryOp },
    I32Compare { op: IntegerCompareOp },
    I64Compare { op: IntegerCompareOp },
    F32Compare { op: FloatCompareOp },
    F64Compare { op: FloatCompareOp },
    I32Unary { op: IntegerUnaryOp },
    I64Unary { op: IntegerUnaryOp },
    F32Unary { op: FloatUnaryOp },
    F64Unary { op: FloatUnaryOp },
    I32Eqz,
    I64Eqz,
    Convert { op: ConversionOp },

    // ----- reference types and GC -----
    RefNull { target: CastTarget },
    RefIsNull,
    /// Inputs: [wasm function].
    RefFunc,
    RefEq,
    RefAsNonNull,
    AnyConvertExtern,
    ExternConvertAny,
    RefI31,
    I31Get { signed: bool },
    /// Inputs: [type definition, field values...].
    StructNew,
    StructNewDefault,
    /// Inputs: [type definition, struct reference].
    StructGet { field_index: u32, mode: GcGetMode },
    /// Inputs: [type definition, struct reference, value].
    StructSet { field_index: u32 },
    /// Inputs: [type definition, elements...].
    ArrayNewFixed,
    /// Inputs: [type definition, length].
    ArrayNewDefault,
    /// Inputs: [type definition, array reference, index].
    ArrayGet { mode: GcGetMode },
    ArraySet,
    ArrayLen,
    RefTest { target: CastTarget, nullable: bool },
    RefCast { target: CastTarget, nullable: bool },

    // ----- globals -----
    DefineGlobal { value: WasmGlobalValue, mutable: bool },
    /// Inputs: [global].
    GlobalGet,
    /// Inputs: [global, value].
    GlobalSet,
    /// Inputs: [destination, value]. Neither spills an output nor emits
    /// default operand loads; the lifter resolves the destination to a
    /// local slot or a global index explicitly.
    Reassign,

    // ----- memories -----
    DefineMemory { limits: Limits, shared: bool },
    /// Inputs: [memory, address].
    MemoryLoad { kind: MemoryLoadKind, offset: u32 },
    /// Inputs: [memory, address, value].
    MemoryStore { kind: MemoryStoreKind, offset: u32 },
    MemorySize,
    /// Inputs: [memory, delta].
    MemoryGrow,
    /// Inputs: [memory, destination, value, count].
    MemoryFill,
    /// Inputs: [destination memory, source memory, destination, source, count].
    MemoryCopy,
    /// Inputs: [memory, data segment, destination, source, count].
    MemoryInit,
    /// Inputs: [data segment].
    DataDrop,
    AtomicLoad { kind: AtomicLoadKind, offset: u32 },
    AtomicStore { kind: AtomicStoreKind, offset: u32 },
    /// Inputs: [memory, address, operand] (`Cmpxchg` takes two operands).
    AtomicRmw { op: AtomicRmwOp, width: AtomicWidth, offset: u32 },
    AtomicFence,

    // ----- tables -----
    DefineTable { element: TableElementType, limits: Limits },
    /// Inputs: [table, index].
    TableGet,
    /// Inputs: [table, index, value].
    TableSet,
    TableSize,
    /// Inputs: [table, initial value, delta].
    TableGrow,
    /// Inputs: [table, start, value, count].
    TableFill,
    /// Inputs: [table, element segment, destination, source, count].
    TableInit,
    /// Inputs: [element segment].
    ElemDrop,

    // ----- tags and segments -----
    DefineTag { parameters: Vec<ValueType> },
    /// Active segments (`offset` present) take [table, functions...];
    /// passive segments take [functions...].
    DefineElementSegment { offset: Option<u32> },
    DefineDataSegment { bytes: Vec<u8> },

    // ----- SIMD -----
    SimdSplat { kind: SimdLaneKind },
    /// Inputs: [vector]. `signed` only matters for packed shapes.
    SimdExtractLane { kind: SimdLaneKind, lane: u8, signed: bool },
    /// Inputs: [vector, scalar].
    SimdReplaceLane { kind: SimdLaneKind, lane: u8 },
    SimdBinary { op: SimdBinaryOp },
    /// Inputs: [memory, address].
    SimdLoad { offset: u32 },
    /// Inputs: [memory, address, vector].
    SimdStore { offset: u32 },
}

impl WasmOp {
    pub fn name(&self) -> &'static str {
        match self {
            WasmOp::BeginFunction { .. } => "WasmBeginFunction",
            WasmOp::EndFunction => "WasmEndFunction",
            WasmOp::Return => "WasmReturn",
            WasmOp::BeginBlock { .. } => "WasmBeginBlock",
            WasmOp::EndBlock => "WasmEndBlock",
            WasmOp::BeginLoop { .. } => "WasmBeginLoop",
            WasmOp::EndLoop => "WasmEndLoop",
            WasmOp::BeginIf { .. } => "WasmBeginIf",
            WasmOp::BeginElse => "WasmBeginElse",
            WasmOp::EndIf => "WasmEndIf",
            WasmOp::BeginTry { .. } => "WasmBeginTry",
            WasmOp::BeginCatch => "WasmBeginCatch",
            WasmOp::BeginCatchAll => "WasmBeginCatchAll",
            WasmOp::EndTry => "WasmEndTry",
            WasmOp::BeginTryTable { .. } => "WasmBeginTryTable",
            WasmOp::EndTryTable => "WasmEndTryTable",
            WasmOp::Throw => "WasmThrow",
            WasmOp::Rethrow => "WasmRethrow",
            WasmOp::ThrowRef => "WasmThrowRef",
            WasmOp::Branch => "WasmBranch",
            WasmOp::BranchIf { .. } => "WasmBranchIf",
            WasmOp::BranchTable => "WasmBranchTable",
            WasmOp::BrOnNull => "WasmBrOnNull",
            WasmOp::BrOnNonNull => "WasmBrOnNonNull",
            WasmOp::BrOnCast { .. } => "WasmBrOnCast",
            WasmOp::BrOnCastFail { .. } => "WasmBrOnCastFail",
            WasmOp::Call => "WasmCall",
            WasmOp::CallIndirect { .. } => "WasmCallIndirect",
            WasmOp::ReturnCall => "WasmReturnCall",
            WasmOp::ReturnCallIndirect { .. } => "WasmReturnCallIndirect",
            WasmOp::CallRef { .. } => "WasmCallRef",
            WasmOp::JsCall { .. } => "WasmJsCall",
            WasmOp::Unreachable => "WasmUnreachable",
            WasmOp::Nop => "WasmNop",
            WasmOp::Drop => "WasmDrop",
            WasmOp::Select { .. } => "WasmSelect",
            WasmOp::Consti32 { .. } => "WasmConsti32",
            WasmOp::Consti64 { .. } => "WasmConsti64",
            WasmOp::Constf32 { .. } => "WasmConstf32",
            WasmOp::Constf64 { .. } => "WasmConstf64",
            WasmOp::ConstSimd128 { .. } => "WasmConstSimd128",
            WasmOp::I32Binary { .. } => "WasmI32Binary",
            WasmOp::I64Binary { .. } => "WasmI64Binary",
            WasmOp::F32Binary { .. } => "WasmF32Binary",
            WasmOp::F64Binary { .. } => "WasmF64Binary",
            WasmOp::I32Compare { .. } => "WasmI32Compare",
            WasmOp::I64Compare { .. } => "WasmI64Compare",
            WasmOp::F32Compare { .. } => "WasmF32Compare",
            WasmOp::F64Compare { .. } => "WasmF64Compare",
            WasmOp::I32Unary { .. } => "WasmI32Unary",
            WasmOp::I64Unary { .. } => "WasmI64Unary",
            WasmOp::F32Unary { .. } => "WasmF32Unary",
            WasmOp::F64Unary { .. } => "WasmF64Unary",
            WasmOp::I32Eqz => "WasmI32Eqz",
            WasmOp::I64Eqz => "WasmI64Eqz",
            WasmOp::Convert { .. } => "WasmConvert",
            WasmOp::RefNull { .. } => "WasmRefNull",
            WasmOp::RefIsNull => "WasmRefIsNull",
            WasmOp::RefFunc => "WasmRefFunc",
            WasmOp::RefEq => "WasmRefEq",
            WasmOp::RefAsNonNull => "WasmRefAsNonNull",
            WasmOp::AnyConvertExtern => "WasmAnyConvertExtern",
            WasmOp::ExternConvertAny => "WasmExternConvertAny",
            WasmOp::RefI31 => "WasmRefI31",
            WasmOp::I31Get { .. } => "WasmI31Get",
            WasmOp::StructNew => "WasmStructNew",
            WasmOp::StructNewDefault => "WasmStructNewDefault",
            WasmOp::StructGet { .. } => "WasmStructGet",
            WasmOp::StructSet { .. } => "WasmStructSet",
            WasmOp::ArrayNewFixed => "WasmArrayNewFixed",
            WasmOp::ArrayNewDefault => "WasmArrayNewDefault",
            WasmOp::ArrayGet { .. } => "WasmArrayGet",
            WasmOp::ArraySet => "WasmArraySet",
            WasmOp::ArrayLen => "WasmArrayLen",
            WasmOp::RefTest { .. } => "WasmRefTest",
            WasmOp::RefCast { .. } => "WasmRefCast",
            WasmOp::DefineGlobal { .. } => "WasmDefineGlobal",
            WasmOp::GlobalGet => "WasmGlobalGet",
            WasmOp::GlobalSet => "WasmGlobalSet",
            WasmOp::Reassign => "WasmReassign",
            WasmOp::DefineMemory { .. } => "WasmDefineMemory",
            WasmOp::MemoryLoad { .. } => "WasmMemoryLoad",
            WasmOp::MemoryStore { .. } => "WasmMemoryStore",
            WasmOp::MemorySize => "WasmMemorySize",
            WasmOp::MemoryGrow => "WasmMemoryGrow",
            WasmOp::MemoryFill => "WasmMemoryFill",
            WasmOp::MemoryCopy => "WasmMemoryCopy",
            WasmOp::MemoryInit => "WasmMemoryInit",
            WasmOp::DataDrop => "WasmDataDrop",
            WasmOp::AtomicLoad { .. } => "WasmAtomicLoad",
            WasmOp::AtomicStore { .. } => "WasmAtomicStore",
            WasmOp::AtomicRmw { .. } => "WasmAtomicRmw",
            WasmOp::AtomicFence => "WasmAtomicFence",
            WasmOp::DefineTable { .. } => "WasmDefineTable",
            WasmOp::TableGet => "WasmTableGet",
            WasmOp::TableSet => "WasmTableSet",
            WasmOp::TableSize => "WasmTableSize",
            WasmOp::TableGrow => "WasmTableGrow",
            WasmOp::TableFill => "WasmTableFill",
            WasmOp::TableInit => "WasmTableInit",
            WasmOp::ElemDrop => "WasmElemDrop",
            WasmOp::DefineTag { .. } => "WasmDefineTag",
            WasmOp::DefineElementSegment { .. } => "WasmDefineElementSegment",
            WasmOp::DefineDataSegment { .. } => "WasmDefineDataSegment",
            WasmOp::SimdSplat { .. } => "WasmSimdSplat",
            WasmOp::SimdExtractLane { .. } => "WasmSimdExtractLane",
            WasmOp::SimdReplaceLane { .. } => "WasmSimdReplaceLane",
            WasmOp::SimdBinary { .. } => "WasmSimdBinary",
            WasmOp::SimdLoad { .. } => "WasmSimdLoad",
            WasmOp::SimdStore { .. } => "WasmSimdStore",
        }
    }

    pub fn is_block_start(&self) -> bool {
        matches!(
            self,
            WasmOp::BeginFunction { .. }
                | WasmOp::BeginBlock { .. }
                | WasmOp::BeginLoop { .. }
                | WasmOp::BeginIf { .. }
                | WasmOp::BeginElse
                | WasmOp::BeginTry { .. }
                | WasmOp::BeginCatch
                | WasmOp::BeginCatchAll
                | WasmOp::BeginTryTable { .. }
        )
    }

    pub fn is_block_end(&self) -> bool {
        matches!(
            self,
            WasmOp::EndFunction
                | WasmOp::EndBlock
                | WasmOp::EndLoop
                | WasmOp::BeginElse
                | WasmOp::EndIf
                | WasmOp::BeginCatch
                | WasmOp::BeginCatchAll
                | WasmOp::EndTry
                | WasmOp::EndTryTable
        )
    }

    /// Opcodes that resolve their operands themselves instead of receiving
    /// the default operand-load emission.
    pub fn skips_default_operand_loads(&self) -> bool {
        matches!(self, WasmOp::Reassign)
    }

    /// Whether the instruction mutates state or transfers control. Used as
    /// the barrier test when deciding if a producer's bytes may be deferred
    /// to its single consumer instead of being spilled to a local.
    pub fn has_side_effects(&self) -> bool {
        if self.is_block_start() || self.is_block_end() {
            return true;
        }
        matches!(
            self,
            WasmOp::Return
                | WasmOp::Throw
                | WasmOp::Rethrow
                | WasmOp::ThrowRef
                | WasmOp::Branch
                | WasmOp::BranchIf { .. }
                | WasmOp::BranchTable
                | WasmOp::BrOnNull
                | WasmOp::BrOnNonNull
                | WasmOp::BrOnCast { .. }
                | WasmOp::BrOnCastFail { .. }
                | WasmOp::Call
                | WasmOp::CallIndirect { .. }
                | WasmOp::ReturnCall
                | WasmOp::ReturnCallIndirect { .. }
                | WasmOp::CallRef { .. }
                | WasmOp::JsCall { .. }
                | WasmOp::Unreachable
                | WasmOp::GlobalSet
                | WasmOp::Reassign
                | WasmOp::MemoryStore { .. }
                | WasmOp::MemoryGrow
                | WasmOp::MemoryFill
                | WasmOp::MemoryCopy
                | WasmOp::MemoryInit
                | WasmOp::DataDrop
                | WasmOp::AtomicStore { .. }
                | WasmOp::AtomicRmw { .. }
                | WasmOp::AtomicFence
                | WasmOp::TableSet
                | WasmOp::TableGrow
                | WasmOp::TableFill
                | WasmOp::TableInit
                | WasmOp::ElemDrop
                | WasmOp::SimdStore { .. }
                | WasmOp::StructSet { .. }
                | WasmOp::ArraySet
        )
    }

    /// Module-level definitions that occupy an index space slot in FIL
    /// appearance order.
    pub fn is_module_level_definition(&self) -> bool {
        matches!(
            self,
            WasmOp::DefineGlobal { .. }
                | WasmOp::DefineMemory { .. }
                | WasmOp::DefineTable { .. }
                | WasmOp::DefineTag { .. }
                | WasmOp::DefineElementSegment { .. }
                | WasmOp::DefineDataSegment { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_binary_opcode_bytes() {
        assert_eq!(IntegerBinaryOp::Add.opcode_i32(), 0x6A);
        assert_eq!(IntegerBinaryOp::Rotr.opcode_i32(), 0x78);
        assert_eq!(IntegerBinaryOp::Add.opcode_i64(), 0x7C);
        assert_eq!(IntegerBinaryOp::Rotr.opcode_i64(), 0x8A);
    }

    #[test]
    fn compare_opcode_bytes() {
        assert_eq!(IntegerCompareOp::Eq.opcode_i32(), 0x46);
        assert_eq!(IntegerCompareOp::GeU.opcode_i32(), 0x4F);
        assert_eq!(IntegerCompareOp::Eq.opcode_i64(), 0x51);
        assert_eq!(IntegerCompareOp::GeU.opcode_i64(), 0x5A);
        assert_eq!(FloatCompareOp::Eq.opcode_f32(), 0x5B);
        assert_eq!(FloatCompareOp::Ge.opcode_f64(), 0x66);
    }

    #[test]
    fn float_opcode_bytes() {
        assert_eq!(FloatUnaryOp::Abs.opcode_f32(), 0x8B);
        assert_eq!(FloatUnaryOp::Sqrt.opcode_f32(), 0x91);
        assert_eq!(FloatBinaryOp::Add.opcode_f32(), 0x92);
        assert_eq!(FloatBinaryOp::Copysign.opcode_f64(), 0xA6);
    }

    #[test]
    fn saturating_truncations_use_the_fc_prefix() {
        assert_eq!(
            ConversionOp::I32TruncSatF32S.encoding(),
            NumericEncoding::Prefixed(0xFC, 0)
        );
        assert_eq!(
            ConversionOp::I64TruncSatF64U.encoding(),
            NumericEncoding::Prefixed(0xFC, 7)
        );
        assert_eq!(
            ConversionOp::I32WrapI64.encoding(),
            NumericEncoding::Single(0xA7)
        );
    }

    #[test]
    fn memory_access_natural_alignments() {
        assert_eq!(MemoryLoadKind::I32Load.natural_alignment_log2(), 2);
        assert_eq!(MemoryLoadKind::I64Load.natural_alignment_log2(), 3);
        assert_eq!(MemoryLoadKind::I32Load8U.natural_alignment_log2(), 0);
        assert_eq!(MemoryStoreKind::I64Store32.natural_alignment_log2(), 2);
        assert_eq!(MemoryLoadKind::I32Load.opcode(), 0x28);
        assert_eq!(MemoryStoreKind::I32Store.opcode(), 0x36);
        assert_eq!(MemoryStoreKind::I64Store32.opcode(), 0x3E);
    }

    #[test]
    fn atomic_rmw_rows() {
        assert_eq!(AtomicRmwOp::Add.sub_opcode(AtomicWidth::I32), 0x1E);
        assert_eq!(AtomicRmwOp::Cmpxchg.sub_opcode(AtomicWidth::I64As32U), 0x4E);
        assert_eq!(AtomicLoadKind { width: AtomicWidth::I32 }.sub_opcode(), 0x10);
        assert_eq!(AtomicStoreKind { width: AtomicWidth::I64As32U }.sub_opcode(), 0x1D);
    }
}
