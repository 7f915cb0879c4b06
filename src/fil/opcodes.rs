//! The JavaScript half of the FIL opcode catalogue.
//!
//! The catalogue is closed: lifters dispatch over it with exhaustive
//! matches so adding an opcode fails every lifter build until handled.
//! Embedded WebAssembly instructions are carried by `Op::Wasm`; the
//! `BeginWasmModule` / `EndWasmModule` pair delimits the range handed to the
//! binary lifter.
//!
//! Operand conventions are documented per variant. String payloads (property
//! names, builtin names, patterns) are owned so instructions stay `Clone`
//! without lifetime plumbing.

use crate::fil::wasm_opcodes::WasmOp;
use crate::wasm::types::{Limits, TableElementType, ValueType, WasmGlobalValue};

/// JavaScript binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    Xor,
    LShift,
    RShift,
    UnsignedRShift,
    LogicAnd,
    LogicOr,
    NullCoalesce,
    Exp,
}

impl BinaryOperator {
    pub fn token(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::BitAnd => "&",
            BinaryOperator::BitOr => "|",
            BinaryOperator::Xor => "^",
            BinaryOperator::LShift => "<<",
            BinaryOperator::RShift => ">>",
            BinaryOperator::UnsignedRShift => ">>>",
            BinaryOperator::LogicAnd => "&&",
            BinaryOperator::LogicOr => "||",
            BinaryOperator::NullCoalesce => "??",
            BinaryOperator::Exp => "**",
        }
    }
}

/// JavaScript unary operators, including the increment/decrement family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    PreInc,
    PreDec,
    PostInc,
    PostDec,
    LogicalNot,
    BitwiseNot,
    Plus,
    Minus,
}

impl UnaryOperator {
    pub fn token(self) -> &'static str {
        match self {
            UnaryOperator::PreInc | UnaryOperator::PostInc => "++",
            UnaryOperator::PreDec | UnaryOperator::PostDec => "--",
            UnaryOperator::LogicalNot => "!",
            UnaryOperator::BitwiseNot => "~",
            UnaryOperator::Plus => "+",
            UnaryOperator::Minus => "-",
        }
    }

    pub fn is_postfix(self) -> bool {
        matches!(self, UnaryOperator::PostInc | UnaryOperator::PostDec)
    }
}

/// Comparison operators for the `Compare` opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Equal,
    StrictEqual,
    NotEqual,
    StrictNotEqual,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
}

impl Comparator {
    pub fn token(self) -> &'static str {
        match self {
            Comparator::Equal => "==",
            Comparator::StrictEqual => "===",
            Comparator::NotEqual => "!=",
            Comparator::StrictNotEqual => "!==",
            Comparator::LessThan => "<",
            Comparator::LessOrEqual => "<=",
            Comparator::GreaterThan => ">",
            Comparator::GreaterOrEqual => ">=",
        }
    }
}

/// Storage type of a GC array element / struct field at the FIL level.
///
/// `TypeRef` fields reference another user-defined type through the defining
/// instruction's inputs: the n-th `TypeRef` field (in declaration order)
/// consumes the n-th input variable, which must be a type-definition
/// variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilStorage {
    I8,
    I16,
    Value(ValueType),
    TypeRef { nullable: bool },
}

/// One array-element / struct-field description at the FIL level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilField {
    pub storage: FilStorage,
    pub mutable: bool,
}

/// The JavaScript opcode catalogue plus the `Wasm` bridge variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    // ----- literals and ambient values -----
    LoadInteger { value: i64 },
    LoadBigInt { value: i64 },
    LoadFloat { value: f64 },
    LoadString { value: String },
    LoadBoolean { value: bool },
    LoadUndefined,
    LoadNull,
    LoadThis,
    LoadArguments,
    LoadNewTarget,
    LoadRegExp { pattern: String, flags: String },
    LoadBuiltin { name: String },

    // ----- named bindings outside the numbered variable space -----
    LoadNamedVariable { name: String },
    /// Inputs: [value].
    StoreNamedVariable { name: String },
    /// Inputs: [value].
    DefineNamedVariable { name: String },

    // ----- object and array construction -----
    /// Inputs: one value per property name.
    CreateObject { property_names: Vec<String> },
    /// Inputs: property values first, then the spread sources.
    CreateObjectWithSpread { property_names: Vec<String> },
    /// Inputs: the elements.
    CreateArray,
    /// Inputs: the elements; `spreads[i]` marks input `i` as `...`-expanded.
    CreateArrayWithSpread { spreads: Vec<bool> },
    /// Inputs: the interpolated values; `parts.len() == inputs.len() + 1`.
    CreateTemplateString { parts: Vec<String> },

    // ----- property access -----
    GetProperty { name: String },
    /// Inputs: [object, value].
    SetProperty { name: String },
    /// Inputs: [object, value]; renders `obj.name op= value`.
    UpdateProperty { name: String, op: BinaryOperator },
    DeleteProperty { name: String },
    GetElement { index: i64 },
    SetElement { index: i64 },
    UpdateElement { index: i64, op: BinaryOperator },
    DeleteElement { index: i64 },
    /// Inputs: [object, property].
    GetComputedProperty,
    /// Inputs: [object, property, value].
    SetComputedProperty,
    UpdateComputedProperty { op: BinaryOperator },
    DeleteComputedProperty,
    GetPrivateProperty { name: String },
    SetPrivateProperty { name: String },
    UpdatePrivateProperty { name: String, op: BinaryOperator },
    /// Inputs: [object, arguments...].
    CallPrivateMethod { name: String },
    GetSuperProperty { name: String },
    SetSuperProperty { name: String },
    UpdateSuperProperty { name: String, op: BinaryOperator },
    /// Inputs: the constructor arguments.
    CallSuperConstructor,
    CallSuperMethod { name: String },

    // ----- calls -----
    /// Inputs: [callee, arguments...].
    CallFunction,
    CallFunctionWithSpread { spreads: Vec<bool> },
    Construct,
    ConstructWithSpread { spreads: Vec<bool> },
    /// Inputs: [object, arguments...].
    CallMethod { name: String },
    CallMethodWithSpread { name: String, spreads: Vec<bool> },
    /// Inputs: [object, method, arguments...].
    CallComputedMethod,
    CallComputedMethodWithSpread { spreads: Vec<bool> },

    // ----- operators -----
    UnaryOperation { op: UnaryOperator },
    BinaryOperation { op: BinaryOperator },
    /// Inputs: [condition, then-value, else-value].
    TernaryOperation,
    /// Inputs: [target, value]; renders `target op= value`.
    Update { op: BinaryOperator },
    /// Inputs: [target, value]; renders `target = value`.
    Reassign,
    /// Copies the input into a fresh, reassignable variable.
    Dup,
    Compare { op: Comparator },
    TypeOf,
    /// Inputs: [value, constructor].
    TestInstanceOf,
    /// Inputs: [property, object].
    TestIn,
    /// `{}` placeholders in `code` are substituted by the inputs in order.
    Eval { code: String },

    // ----- destructuring -----
    /// Input: [array]; one output per index, the last one a rest element
    /// when flagged.
    DestructArray { indices: Vec<i64>, has_rest_element: bool },
    /// Inputs: [array, targets...].
    DestructArrayAndReassign { indices: Vec<i64>, has_rest_element: bool },
    DestructObject { property_names: Vec<String>, has_rest_element: bool },
    DestructObjectAndReassign { property_names: Vec<String>, has_rest_element: bool },

    // ----- functions -----
    // Inner outputs model the parameters in order; `has_rest_param`
    // converts the last parameter into a rest form.
    BeginPlainFunction { has_rest_param: bool },
    EndPlainFunction,
    BeginArrowFunction { has_rest_param: bool },
    EndArrowFunction,
    BeginGeneratorFunction { has_rest_param: bool },
    EndGeneratorFunction,
    BeginAsyncFunction { has_rest_param: bool },
    EndAsyncFunction,
    BeginAsyncArrowFunction { has_rest_param: bool },
    EndAsyncArrowFunction,
    BeginAsyncGeneratorFunction { has_rest_param: bool },
    EndAsyncGeneratorFunction,
    BeginConstructor { has_rest_param: bool },
    EndConstructor,
    /// Inputs: [] or [return value].
    Return,
    /// Inputs: [] or [value]; outputs: [sent value].
    Yield,
    /// Inputs: [iterable].
    YieldEach,
    Await,

    // ----- control flow -----
    BeginIf { inverted: bool },
    BeginElse,
    EndIf,
    /// Inputs: [discriminant].
    BeginSwitch,
    /// Inputs: [case value].
    BeginSwitchCase,
    BeginSwitchDefaultCase,
    EndSwitchCase { falls_through: bool },
    EndSwitch,
    SwitchBreak,
    BeginWhileLoopHeader,
    /// Inputs: [condition computed by the header block].
    BeginWhileLoopBody,
    EndWhileLoop,
    BeginDoWhileLoopBody,
    BeginDoWhileLoopHeader,
    /// Inputs: [condition computed by the header block].
    EndDoWhileLoop,
    BeginForLoopInitializer,
    /// Inputs: the initial loop-variable values computed by the
    /// initializer block; inner outputs: the loop variables.
    BeginForLoopCondition,
    /// Inputs: [condition computed by the condition block]; inner outputs:
    /// the loop variables, re-bound.
    BeginForLoopAfterthought,
    /// Inner outputs: the loop variables, re-bound.
    BeginForLoopBody,
    EndForLoop,
    /// Inputs: [object]; inner outputs: [property name variable].
    BeginForInLoop,
    EndForInLoop,
    /// Inputs: [iterable]; inner outputs: [element variable].
    BeginForOfLoop,
    EndForOfLoop,
    /// Inputs: [iterable]; inner outputs: the destructured elements.
    BeginForOfLoopWithDestruct { indices: Vec<i64>, has_rest_element: bool },
    /// Inner outputs: [loop counter] when exposed.
    BeginRepeatLoop { iterations: u64, exposes_loop_counter: bool },
    EndRepeatLoop,
    LoopBreak,
    LoopContinue,
    BeginTry,
    /// Inner outputs: [exception variable].
    BeginCatch,
    BeginFinally,
    EndTryCatchFinally,
    ThrowException,
    /// Inputs: [object].
    BeginWith,
    EndWith,
    BeginBlockStatement,
    EndBlockStatement,
    /// Output: the string variable holding the nested code.
    BeginCodeString,
    EndCodeString,

    // ----- object literals -----
    BeginObjectLiteral,
    /// Inputs: [value].
    ObjectLiteralAddProperty { name: String },
    ObjectLiteralAddElement { index: i64 },
    /// Inputs: [key, value].
    ObjectLiteralAddComputedProperty,
    /// Inputs: [source object]; renders a `...source` entry.
    ObjectLiteralCopyProperties,
    ObjectLiteralSetPrototype,
    /// Inner outputs: [this, parameters...].
    BeginObjectLiteralMethod { name: String, has_rest_param: bool },
    EndObjectLiteralMethod,
    BeginObjectLiteralGetter { name: String },
    EndObjectLiteralGetter,
    /// Inner outputs: [this, new value].
    BeginObjectLiteralSetter { name: String },
    EndObjectLiteralSetter,
    /// Output: the constructed object.
    EndObjectLiteral,

    // ----- class definitions -----
    /// Inputs: [superclass] when flagged; output: the class.
    BeginClassDefinition { has_superclass: bool },
    /// Inner outputs: [this, parameters...].
    BeginClassConstructor { has_rest_param: bool },
    EndClassConstructor,
    /// Inputs: [] or [initial value].
    ClassAddInstanceProperty { name: String },
    ClassAddStaticProperty { name: String },
    ClassAddPrivateInstanceProperty { name: String },
    BeginClassInstanceMethod { name: String, has_rest_param: bool },
    EndClassInstanceMethod,
    BeginClassInstanceGetter { name: String },
    EndClassInstanceGetter,
    BeginClassInstanceSetter { name: String },
    EndClassInstanceSetter,
    BeginClassStaticMethod { name: String, has_rest_param: bool },
    EndClassStaticMethod,
    /// Inner outputs: [this].
    BeginClassStaticInitializer,
    EndClassStaticInitializer,
    BeginClassPrivateInstanceMethod { name: String, has_rest_param: bool },
    EndClassPrivateInstanceMethod,
    EndClassDefinition,

    // ----- runtime-assisted mutators -----
    /// Inputs: [explored value, extra arguments...].
    Explore { id: String, rng_seed: u64 },
    /// Inputs: [probed value].
    Probe { id: String },
    /// Inputs: [acted-on value, extra arguments...].
    Fixup { id: String, action: String, has_output: bool },

    // ----- misc -----
    /// Inputs: [value]; reports through the host print channel.
    Print,
    Nop,

    // ----- Wasm bridge -----
    BeginWasmModule,
    /// Output: the instantiated module's exports object.
    EndWasmModule,
    CreateWasmGlobal { value: WasmGlobalValue, mutable: bool },
    CreateWasmMemory { limits: Limits, shared: bool },
    CreateWasmTable { element: TableElementType, limits: Limits },
    CreateWasmJSTag { parameters: Vec<ValueType> },
    /// Inputs: [function]; wraps it for JS-promise integration imports.
    WrapSuspending,
    BeginWasmTypeGroup,
    EndWasmTypeGroup,
    /// See [`FilStorage::TypeRef`] for how inputs wire type references.
    WasmDefineArrayType { element: FilField },
    WasmDefineStructType { fields: Vec<FilField> },
    WasmDefineSignatureType { params: Vec<ValueType>, results: Vec<ValueType> },
    WasmDefineForwardOrSelfReference,
    /// Inputs: [placeholder type, concrete type].
    WasmResolveForwardReference,

    /// An embedded WebAssembly instruction. Only valid between
    /// `BeginWasmModule` and `EndWasmModule`.
    Wasm(WasmOp),
}

impl Op {
    /// Opcode name as printed by the IL dumper and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Op::LoadInteger { .. } => "LoadInteger",
            Op::LoadBigInt { .. } => "LoadBigInt",
            Op::LoadFloat { .. } => "LoadFloat",
            Op::LoadString { .. } => "LoadString",
            Op::LoadBoolean { .. } => "LoadBoolean",
            Op::LoadUndefined => "LoadUndefined",
            Op::LoadNull => "LoadNull",
            Op::LoadThis => "LoadThis",
            Op::LoadArguments => "LoadArguments",
            Op::LoadNewTarget => "LoadNewTarget",
            Op::LoadRegExp { .. } => "LoadRegExp",
            Op::LoadBuiltin { .. } => "LoadBuiltin",
            Op::LoadNamedVariable { .. } => "LoadNamedVariable",
            Op::StoreNamedVariable { .. } => "StoreNamedVariable",
            Op::DefineNamedVariable { .. } => "DefineNamedVariable",
            Op::CreateObject { .. } => "CreateObject",
            Op::CreateObjectWithSpread { .. } => "CreateObjectWithSpread",
            Op::CreateArray => "CreateArray",
            Op::CreateArrayWithSpread { .. } => "CreateArrayWithSpread",
            Op::CreateTemplateString { .. } => "CreateTemplateString",
            Op::GetProperty { .. } => "GetProperty",
            Op::SetProperty { .. } => "SetProperty",
            Op::UpdateProperty { .. } => "UpdateProperty",
            Op::DeleteProperty { .. } => "DeleteProperty",
            Op::GetElement { .. } => "GetElement",
            Op::SetElement { .. } => "SetElement",
            Op::UpdateElement { .. } => "UpdateElement",
            Op::DeleteElement { .. } => "DeleteElement",
            Op::GetComputedProperty => "GetComputedProperty",
            Op::SetComputedProperty => "SetComputedProperty",
            Op::UpdateComputedProperty { .. } => "UpdateComputedProperty",
            Op::DeleteComputedProperty => "DeleteComputedProperty",
            Op::GetPrivateProperty { .. } => "GetPrivateProperty",
            Op::SetPrivateProperty { .. } => "SetPrivateProperty",
            Op::UpdatePrivateProperty { .. } => "UpdatePrivateProperty",
            Op::CallPrivateMethod { .. } => "CallPrivateMethod",
            Op::GetSuperProperty { .. } => "GetSuperProperty",
            Op::SetSuperProperty { .. } => "SetSuperProperty",
            Op::UpdateSuperProperty { .. } => "UpdateSuperProperty",
            Op::CallSuperConstructor => "CallSuperConstructor",
            Op::CallSuperMethod { .. } => "CallSuperMethod",
            Op::CallFunction => "CallFunction",
            Op::CallFunctionWithSpread { .. } => "CallFunctionWithSpread",
            Op::Construct => "Construct",
            Op::ConstructWithSpread { .. } => "ConstructWithSpread",
            Op::CallMethod { .. } => "CallMethod",
            Op::CallMethodWithSpread { .. } => "CallMethodWithSpread",
            Op::CallComputedMethod => "CallComputedMethod",
            Op::CallComputedMethodWithSpread { .. } => "CallComputedMethodWithSpread",
            Op::UnaryOperation { .. } => "UnaryOperation",
            Op::BinaryOperation { .. } => "BinaryOperation",
            Op::TernaryOperation => "TernaryOperation",
            Op::Update { .. } => "Update",
            Op::Reassign => "Reassign",
            Op::Dup => "Dup",
            Op::Compare { .. } => "Compare",
            Op::TypeOf => "TypeOf",
            Op::TestInstanceOf => "TestInstanceOf",
            Op::TestIn => "TestIn",
            Op::Eval { .. } => "Eval",
            Op::DestructArray { .. } => "DestructArray",
            Op::DestructArrayAndReassign { .. } => "DestructArrayAndReassign",
            Op::DestructObject { .. } => "DestructObject",
            Op::DestructObjectAndReassign { .. } => "DestructObjectAndReassign",
            Op::BeginPlainFunction { .. } => "BeginPlainFunction",
            Op::EndPlainFunction => "EndPlainFunction",
            Op::BeginArrowFunction { .. } => "BeginArrowFunction",
            Op::EndArrowFunction => "EndArrowFunction",
            Op::BeginGeneratorFunction { .. } => "BeginGeneratorFunction",
            Op::EndGeneratorFunction => "EndGeneratorFunction",
            Op::BeginAsyncFunction { .. } => "BeginAsyncFunction",
            Op::EndAsyncFunction => "EndAsyncFunction",
            Op::BeginAsyncArrowFunction { .. } => "BeginAsyncArrowFunction",
            Op::EndAsyncArrowFunction => "EndAsyncArrowFunction",
            Op::BeginAsyncGeneratorFunction { .. } => "BeginAsyncGeneratorFunction",
            Op::EndAsyncGeneratorFunction => "EndAsyncGeneratorFunction",
            Op::BeginConstructor { .. } => "BeginConstructor",
            Op::EndConstructor => "EndConstructor",
            Op::Return => "Return",
            Op::Yield => "Yield",
            Op::YieldEach => "YieldEach",
            Op::Await => "Await",
            Op::BeginIf { .. } => "BeginIf",
            Op::BeginElse => "BeginElse",
            Op::EndIf => "EndIf",
            Op::BeginSwitch => "BeginSwitch",
            Op::BeginSwitchCase => "BeginSwitchCase",
            Op::BeginSwitchDefaultCase => "BeginSwitchDefaultCase",
            Op::EndSwitchCase { .. } => "EndSwitchCase",
            Op::EndSwitch => "EndSwitch",
            Op::SwitchBreak => "SwitchBreak",
            Op::BeginWhileLoopHeader => "BeginWhileLoopHeader",
            Op::BeginWhileLoopBody => "BeginWhileLoopBody",
            Op::EndWhileLoop => "EndWhileLoop",
            Op::BeginDoWhileLoopBody => "BeginDoWhileLoopBody",
            Op::BeginDoWhileLoopHeader => "BeginDoWhileLoopHeader",
            Op::EndDoWhileLoop => "EndDoWhileLoop",
            Op::BeginForLoopInitializer => "BeginForLoopInitializer",
            Op::BeginForLoopCondition => "BeginForLoopCondition",
            Op::BeginForLoopAfterthought => "BeginForLoopAfterthought",
            Op::BeginForLoopBody => "BeginForLoopBody",
            Op::EndForLoop => "EndForLoop",
            Op::BeginForInLoop => "BeginForInLoop",
            Op::EndForInLoop => "EndForInLoop",
            Op::BeginForOfLoop => "BeginForOfLoop",
            Op::EndForOfLoop => "EndForOfLoop",
            Op::BeginForOfLoopWithDestruct { .. } => "BeginForOfLoopWithDestruct",
            Op::BeginRepeatLoop { .. } => "BeginRepeatLoop",
            Op::EndRepeatLoop => "EndRepeatLoop",
            Op::LoopBreak => "LoopBreak",
            Op::LoopContinue => "LoopContinue",
            Op::BeginTry => "BeginTry",
            Op::BeginCatch => "BeginCatch",
            Op::BeginFinally => "BeginFinally",
            Op::EndTryCatchFinally => "EndTryCatchFinally",
            Op::ThrowException => "ThrowException",
            Op::BeginWith => "BeginWith",
            Op::EndWith => "EndWith",
            Op::BeginBlockStatement => "BeginBlockStatement",
            Op::EndBlockStatement => "EndBlockStatement",
            Op::BeginCodeString => "BeginCodeString",
            Op::EndCodeString => "EndCodeString",
            Op::BeginObjectLiteral => "BeginObjectLiteral",
            Op::ObjectLiteralAddProperty { .. } => "ObjectLiteralAddProperty",
            Op::ObjectLiteralAddElement { .. } => "ObjectLiteralAddElement",
            Op::ObjectLiteralAddComputedProperty => "ObjectLiteralAddComputedProperty",
            Op::ObjectLiteralCopyProperties => "ObjectLiteralCopyProperties",
            Op::ObjectLiteralSetPrototype => "ObjectLiteralSetPrototype",
            Op::BeginObjectLiteralMethod { .. } => "BeginObjectLiteralMethod",
            Op::EndObjectLiteralMethod => "EndObjectLiteralMethod",
            Op::BeginObjectLiteralGetter { .. } => "BeginObjectLiteralGetter",
            Op::EndObjectLiteralGetter => "EndObjectLiteralGetter",
            Op::BeginObjectLiteralSetter { .. } => "BeginObjectLiteralSetter",
            Op::EndObjectLiteralSetter => "EndObjectLiteralSetter",
            Op::EndObjectLiteral => "EndObjectLiteral",
            Op::BeginClassDefinition { .. } => "BeginClassDefinition",
            Op::BeginClassConstructor { .. } => "BeginClassConstructor",
            Op::EndClassConstructor => "EndClassConstructor",
            Op::ClassAddInstanceProperty { .. } => "ClassAddInstanceProperty",
            Op::ClassAddStaticProperty { .. } => "ClassAddStaticProperty",
            Op::ClassAddPrivateInstanceProperty { .. } => "ClassAddPrivateInstanceProperty",
            Op::BeginClassInstanceMethod { .. } => "BeginClassInstanceMethod",
            Op::EndClassInstanceMethod => "EndClassInstanceMethod",
            Op::BeginClassInstanceGetter { .. } => "BeginClassInstanceGetter",
            Op::EndClassInstanceGetter => "EndClassInstanceGetter",
            Op::BeginClassInstanceSetter { .. } => "BeginClassInstanceSetter",
            Op::EndClassInstanceSetter => "EndClassInstanceSetter",
            Op::BeginClassStaticMethod { .. } => "BeginClassStaticMethod",
            Op::EndClassStaticMethod => "EndClassStaticMethod",
            Op::BeginClassStaticInitializer => "BeginClassStaticInitializer",
            Op::EndClassStaticInitializer => "EndClassStaticInitializer",
            Op::BeginClassPrivateInstanceMethod { .. } => "BeginClassPrivateInstanceMethod",
            Op::EndClassPrivateInstanceMethod => "EndClassPrivateInstanceMethod",
            Op::EndClassDefinition => "EndClassDefinition",
            Op::Explore { .. } => "Explore",
            Op::Probe { .. } => "Probe",
            Op::Fixup { .. } => "Fixup",
            Op::Print => "Print",
            Op::Nop => "Nop",
            Op::BeginWasmModule => "BeginWasmModule",
            Op::EndWasmModule => "EndWasmModule",
            Op::CreateWasmGlobal { .. } => "CreateWasmGlobal",
            Op::CreateWasmMemory { .. } => "CreateWasmMemory",
            Op::CreateWasmTable { .. } => "CreateWasmTable",
            Op::CreateWasmJSTag { .. } => "CreateWasmJSTag",
            Op::WrapSuspending => "WrapSuspending",
            Op::BeginWasmTypeGroup => "BeginWasmTypeGroup",
            Op::EndWasmTypeGroup => "EndWasmTypeGroup",
            Op::WasmDefineArrayType { .. } => "WasmDefineArrayType",
            Op::WasmDefineStructType { .. } => "WasmDefineStructType",
            Op::WasmDefineSignatureType { .. } => "WasmDefineSignatureType",
            Op::WasmDefineForwardOrSelfReference => "WasmDefineForwardOrSelfReference",
            Op::WasmResolveForwardReference => "WasmResolveForwardReference",
            Op::Wasm(wasm_op) => wasm_op.name(),
        }
    }

    /// True for opcodes that open a nested block (and indent the output).
    pub fn is_block_start(&self) -> bool {
        match self {
            Op::BeginPlainFunction { .. }
            | Op::BeginArrowFunction { .. }
            | Op::BeginGeneratorFunction { .. }
            | Op::BeginAsyncFunction { .. }
            | Op::BeginAsyncArrowFunction { .. }
            | Op::BeginAsyncGeneratorFunction { .. }
            | Op::BeginConstructor { .. }
            | Op::BeginIf { .. }
            | Op::BeginElse
            | Op::BeginSwitch
            | Op::BeginSwitchCase
            | Op::BeginSwitchDefaultCase
            | Op::BeginWhileLoopHeader
            | Op::BeginWhileLoopBody
            | Op::BeginDoWhileLoopBody
            | Op::BeginDoWhileLoopHeader
            | Op::BeginForLoopInitializer
            | Op::BeginForLoopCondition
            | Op::BeginForLoopAfterthought
            | Op::BeginForLoopBody
            | Op::BeginForInLoop
            | Op::BeginForOfLoop
            | Op::BeginForOfLoopWithDestruct { .. }
            | Op::BeginRepeatLoop { .. }
            | Op::BeginTry
            | Op::BeginCatch
            | Op::BeginFinally
            | Op::BeginWith
            | Op::BeginBlockStatement
            | Op::BeginCodeString
            | Op::BeginObjectLiteral
            | Op::BeginObjectLiteralMethod { .. }
            | Op::BeginObjectLiteralGetter { .. }
            | Op::BeginObjectLiteralSetter { .. }
            | Op::BeginClassDefinition { .. }
            | Op::BeginClassConstructor { .. }
            | Op::BeginClassInstanceMethod { .. }
            | Op::BeginClassInstanceGetter { .. }
            | Op::BeginClassInstanceSetter { .. }
            | Op::BeginClassStaticMethod { .. }
            | Op::BeginClassStaticInitializer
            | Op::BeginClassPrivateInstanceMethod { .. }
            | Op::BeginWasmModule
            | Op::BeginWasmTypeGroup => true,
            Op::Wasm(wasm_op) => wasm_op.is_block_start(),
            _ => false,
        }
    }

    /// True for opcodes that close a block. Opcodes like `BeginElse` close
    /// one block and immediately open another, so both predicates hold.
    pub fn is_block_end(&self) -> bool {
        match self {
            Op::EndPlainFunction
            | Op::EndArrowFunction
            | Op::EndGeneratorFunction
            | Op::EndAsyncFunction
            | Op::EndAsyncArrowFunction
            | Op::EndAsyncGeneratorFunction
            | Op::EndConstructor
            | Op::BeginElse
            | Op::EndIf
            | Op::EndSwitchCase { .. }
            | Op::EndSwitch
            | Op::BeginWhileLoopBody
            | Op::EndWhileLoop
            | Op::BeginDoWhileLoopHeader
            | Op::EndDoWhileLoop
            | Op::BeginForLoopCondition
            | Op::BeginForLoopAfterthought
            | Op::BeginForLoopBody
            | Op::EndForLoop
            | Op::EndForInLoop
            | Op::EndForOfLoop
            | Op::EndRepeatLoop
            | Op::BeginCatch
            | Op::BeginFinally
            | Op::EndTryCatchFinally
            | Op::EndWith
            | Op::EndBlockStatement
            | Op::EndCodeString
            | Op::EndObjectLiteralMethod
            | Op::EndObjectLiteralGetter
            | Op::EndObjectLiteralSetter
            | Op::EndObjectLiteral
            | Op::EndClassConstructor
            | Op::EndClassInstanceMethod
            | Op::EndClassInstanceGetter
            | Op::EndClassInstanceSetter
            | Op::EndClassStaticMethod
            | Op::EndClassStaticInitializer
            | Op::EndClassPrivateInstanceMethod
            | Op::EndClassDefinition
            | Op::EndWasmModule
            | Op::EndWasmTypeGroup => true,
            Op::Wasm(wasm_op) => wasm_op.is_block_end(),
            _ => false,
        }
    }

    /// Whether executing this instruction can change observable program
    /// state. Used as the barrier test when deciding if an effectful
    /// expression may be inlined past intervening instructions.
    pub fn has_side_effects(&self) -> bool {
        !matches!(
            self,
            Op::LoadInteger { .. }
                | Op::LoadBigInt { .. }
                | Op::LoadFloat { .. }
                | Op::LoadString { .. }
                | Op::LoadBoolean { .. }
                | Op::LoadUndefined
                | Op::LoadNull
                | Op::LoadThis
                | Op::LoadArguments
                | Op::LoadNewTarget
                | Op::LoadRegExp { .. }
                | Op::LoadBuiltin { .. }
                | Op::Dup
                | Op::TypeOf
                | Op::Nop
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_opcodes_are_both_end_and_start() {
        for op in [
            Op::BeginElse,
            Op::BeginCatch,
            Op::BeginFinally,
            Op::BeginWhileLoopBody,
            Op::BeginDoWhileLoopHeader,
            Op::BeginForLoopCondition,
            Op::BeginForLoopAfterthought,
            Op::BeginForLoopBody,
        ] {
            assert!(op.is_block_start(), "{} should start a block", op.name());
            assert!(op.is_block_end(), "{} should end a block", op.name());
        }
    }

    #[test]
    fn literals_have_no_side_effects() {
        assert!(!Op::LoadInteger { value: 0 }.has_side_effects());
        assert!(!Op::LoadFloat { value: 1.5 }.has_side_effects());
        assert!(Op::CallFunction.has_side_effects());
        assert!(Op::SetProperty { name: "a".into() }.has_side_effects());
    }

    #[test]
    fn postfix_operators_are_flagged() {
        assert!(UnaryOperator::PostInc.is_postfix());
        assert!(UnaryOperator::PostDec.is_postfix());
        assert!(!UnaryOperator::PreInc.is_postfix());
        assert!(!UnaryOperator::LogicalNot.is_postfix());
    }
}
