//! Wasm-level type model shared between the FIL opcode catalogue, the Typer
//! and the binary lifter.
//!
//! User-defined types (arrays, structs, signatures from GC type groups) live
//! in an arena owned by the Typer and are referenced everywhere else through
//! stable [`TypeDefId`] handles. The binary lifter translates those handles
//! into module-local type indices at encoding time, so no type ever owns a
//! direct reference to another and mutually recursive groups need no cycle
//! handling.

use crate::errors::LiftError;
use rustc_hash::FxHashMap;

/// A numeric or reference value type as it appears on the Wasm operand stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    I32,
    I64,
    F32,
    F64,
    V128,
    Ref(RefType),
}

impl ValueType {
    pub const EXTERNREF: ValueType = ValueType::Ref(RefType {
        nullable: true,
        heap: HeapType::Extern,
    });
    pub const FUNCREF: ValueType = ValueType::Ref(RefType {
        nullable: true,
        heap: HeapType::Func,
    });
    pub const EXNREF: ValueType = ValueType::Ref(RefType {
        nullable: true,
        heap: HeapType::Exn,
    });

    /// The name JavaScript-side Wasm APIs use for this type
    /// (`WebAssembly.Global` descriptors, tag parameter lists).
    pub fn js_name(self) -> &'static str {
        match self {
            ValueType::I32 => "i32",
            ValueType::I64 => "i64",
            ValueType::F32 => "f32",
            ValueType::F64 => "f64",
            ValueType::V128 => "v128",
            ValueType::Ref(r) => match r.heap {
                HeapType::Func | HeapType::NoFunc => "anyfunc",
                _ => "externref",
            },
        }
    }
}

/// A reference type: nullability plus the referenced heap type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefType {
    pub nullable: bool,
    pub heap: HeapType,
}

/// Heap types. The abstract variants map to fixed encoding bytes; `Index`
/// carries an arena handle resolved to a module-local index when encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeapType {
    Extern,
    Func,
    Any,
    Eq,
    I31,
    Struct,
    Array,
    Exn,
    NoneType,
    NoExtern,
    NoFunc,
    NoExn,
    Index(TypeDefId),
}

impl HeapType {
    /// Encoding byte for abstract heap types. `Index` has no single byte and
    /// must go through [`encode_ref_type`].
    pub fn abstract_byte(self) -> Option<u8> {
        match self {
            HeapType::Extern => Some(0x6F),
            HeapType::Func => Some(0x70),
            HeapType::Any => Some(0x6E),
            HeapType::Eq => Some(0x6D),
            HeapType::I31 => Some(0x6C),
            HeapType::Struct => Some(0x6B),
            HeapType::Array => Some(0x6A),
            HeapType::Exn => Some(0x69),
            HeapType::NoneType => Some(0x71),
            HeapType::NoExtern => Some(0x72),
            HeapType::NoFunc => Some(0x73),
            HeapType::NoExn => Some(0x74),
            HeapType::Index(_) => None,
        }
    }
}

/// Stable handle into the Typer's arena of user-defined type descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeDefId(pub usize);

/// Storage type of an array element or struct field. Packed types only exist
/// inside GC type definitions, never on the operand stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageType {
    I8,
    I16,
    Val(ValueType),
}

/// One array-element or struct-field description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldDesc {
    pub storage: StorageType,
    pub mutable: bool,
}

/// A Wasm function signature: ordered parameter types to ordered results.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Signature {
    pub params: Vec<ValueType>,
    pub results: Vec<ValueType>,
}

impl Signature {
    pub fn new(params: Vec<ValueType>, results: Vec<ValueType>) -> Signature {
        Signature { params, results }
    }

    /// The `[] -> []` signature used by bare control blocks.
    pub fn empty() -> Signature {
        Signature::default()
    }
}

/// A user-defined type description held in the Typer's arena.
///
/// `Forward` is the placeholder kind for forward-or-self references inside a
/// type group; resolution replaces `resolved` with the concrete handle while
/// the placeholder keeps its own arena slot.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescKind {
    Array(FieldDesc),
    Struct(Vec<FieldDesc>),
    Func(Signature),
    Forward { resolved: Option<TypeDefId> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDesc {
    pub kind: TypeDescKind,
    /// Index of the type group this description was defined in.
    pub group: usize,
}

/// Memory/table size limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Limits {
    pub min: u32,
    pub max: Option<u32>,
}

/// Element type of a defined or JS-created table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableElementType {
    FuncRef,
    ExternRef,
}

impl TableElementType {
    pub fn value_type(self) -> ValueType {
        match self {
            TableElementType::FuncRef => ValueType::FUNCREF,
            TableElementType::ExternRef => ValueType::EXTERNREF,
        }
    }

    /// Name used by the `WebAssembly.Table` JS constructor.
    pub fn js_name(self) -> &'static str {
        match self {
            TableElementType::FuncRef => "anyfunc",
            TableElementType::ExternRef => "externref",
        }
    }
}

/// Initial value of a defined or JS-created Wasm global.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WasmGlobalValue {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    RefNull(HeapType),
}

impl WasmGlobalValue {
    pub fn value_type(self) -> ValueType {
        match self {
            WasmGlobalValue::I32(_) => ValueType::I32,
            WasmGlobalValue::I64(_) => ValueType::I64,
            WasmGlobalValue::F32(_) => ValueType::F32,
            WasmGlobalValue::F64(_) => ValueType::F64,
            WasmGlobalValue::RefNull(heap) => ValueType::Ref(RefType {
                nullable: true,
                heap,
            }),
        }
    }
}

/// Compiled-in branch prediction hint attached to conditional branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchHint {
    Likely,
    Unlikely,
}

impl BranchHint {
    pub fn encoding_byte(self) -> u8 {
        match self {
            BranchHint::Likely => 0x01,
            BranchHint::Unlikely => 0x00,
        }
    }
}

/// Map from arena handles to module-local type indices, built by the index
/// assignment pass of the binary lifter.
pub type TypeIndexMap = FxHashMap<TypeDefId, u32>;

fn resolve_index(indices: &TypeIndexMap, id: TypeDefId) -> Result<u32, LiftError> {
    indices.get(&id).copied().ok_or_else(|| {
        LiftError::failed_index_lookup(format!(
            "user-defined type {:?} has no assigned module-local index",
            id
        ))
    })
}

/// Encodes a value type into `out`.
pub fn encode_value_type(
    out: &mut Vec<u8>,
    value_type: ValueType,
    indices: &TypeIndexMap,
) -> Result<(), LiftError> {
    match value_type {
        ValueType::I32 => out.push(0x7F),
        ValueType::I64 => out.push(0x7E),
        ValueType::F32 => out.push(0x7D),
        ValueType::F64 => out.push(0x7C),
        ValueType::V128 => out.push(0x7B),
        ValueType::Ref(ref_type) => encode_ref_type(out, ref_type, indices)?,
    }
    Ok(())
}

/// Encodes a reference type. Nullable abstract references use the one-byte
/// shorthand; indexed references encode the nullability byte followed by the
/// module-local type index.
pub fn encode_ref_type(
    out: &mut Vec<u8>,
    ref_type: RefType,
    indices: &TypeIndexMap,
) -> Result<(), LiftError> {
    match ref_type.heap.abstract_byte() {
        Some(byte) if ref_type.nullable => out.push(byte),
        Some(byte) => {
            out.push(0x64);
            out.push(byte);
        }
        None => {
            let HeapType::Index(id) = ref_type.heap else {
                unreachable!("non-abstract heap type is always indexed");
            };
            out.push(if ref_type.nullable { 0x63 } else { 0x64 });
            crate::wasm::leb::encode_u32(out, resolve_index(indices, id)?);
        }
    }
    Ok(())
}

/// Encodes a heap type operand (as used by `ref.null` and cast opcodes).
pub fn encode_heap_type(
    out: &mut Vec<u8>,
    heap: HeapType,
    indices: &TypeIndexMap,
) -> Result<(), LiftError> {
    match heap.abstract_byte() {
        Some(byte) => out.push(byte),
        None => {
            let HeapType::Index(id) = heap else {
                unreachable!("non-abstract heap type is always indexed");
            };
            crate::wasm::leb::encode_u32(out, resolve_index(indices, id)?);
        }
    }
    Ok(())
}

/// Encodes a storage type (array element / struct field).
pub fn encode_storage_type(
    out: &mut Vec<u8>,
    storage: StorageType,
    indices: &TypeIndexMap,
) -> Result<(), LiftError> {
    match storage {
        StorageType::I8 => out.push(0x78),
        StorageType::I16 => out.push(0x77),
        StorageType::Val(value_type) => encode_value_type(out, value_type, indices)?,
    }
    Ok(())
}

/// Encodes a field description: storage type followed by the mutability byte.
pub fn encode_field_desc(
    out: &mut Vec<u8>,
    field: FieldDesc,
    indices: &TypeIndexMap,
) -> Result<(), LiftError> {
    encode_storage_type(out, field.storage, indices)?;
    out.push(if field.mutable { 0x01 } else { 0x00 });
    Ok(())
}

/// Encodes limits with the shared flag where requested. Shared limits
/// require a maximum.
pub fn encode_limits(out: &mut Vec<u8>, limits: Limits, shared: bool) -> Result<(), LiftError> {
    let flags = match (limits.max, shared) {
        (None, false) => 0x00,
        (Some(_), false) => 0x01,
        (Some(_), true) => 0x03,
        (None, true) => {
            return Err(LiftError::invalid_input(
                "shared memory limits require a maximum",
            ));
        }
    };
    out.push(flags);
    crate::wasm::leb::encode_u32(out, limits.min);
    if let Some(max) = limits.max {
        crate::wasm::leb::encode_u32(out, max);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abstract_heap_type_bytes_match_the_binary_format() {
        assert_eq!(HeapType::Extern.abstract_byte(), Some(0x6F));
        assert_eq!(HeapType::Func.abstract_byte(), Some(0x70));
        assert_eq!(HeapType::Any.abstract_byte(), Some(0x6E));
        assert_eq!(HeapType::Eq.abstract_byte(), Some(0x6D));
        assert_eq!(HeapType::I31.abstract_byte(), Some(0x6C));
        assert_eq!(HeapType::Struct.abstract_byte(), Some(0x6B));
        assert_eq!(HeapType::Array.abstract_byte(), Some(0x6A));
        assert_eq!(HeapType::Exn.abstract_byte(), Some(0x69));
        assert_eq!(HeapType::NoneType.abstract_byte(), Some(0x71));
        assert_eq!(HeapType::NoExtern.abstract_byte(), Some(0x72));
        assert_eq!(HeapType::NoFunc.abstract_byte(), Some(0x73));
        assert_eq!(HeapType::NoExn.abstract_byte(), Some(0x74));
    }

    #[test]
    fn indexed_ref_encodes_nullability_then_index() {
        let mut indices = TypeIndexMap::default();
        indices.insert(TypeDefId(0), 5);

        let mut out = Vec::new();
        encode_ref_type(
            &mut out,
            RefType {
                nullable: true,
                heap: HeapType::Index(TypeDefId(0)),
            },
            &indices,
        )
        .unwrap();
        assert_eq!(out, vec![0x63, 0x05]);

        out.clear();
        encode_ref_type(
            &mut out,
            RefType {
                nullable: false,
                heap: HeapType::Index(TypeDefId(0)),
            },
            &indices,
        )
        .unwrap();
        assert_eq!(out, vec![0x64, 0x05]);
    }

    #[test]
    fn unresolved_type_index_is_a_failed_lookup() {
        let indices = TypeIndexMap::default();
        let mut out = Vec::new();
        let result = encode_ref_type(
            &mut out,
            RefType {
                nullable: true,
                heap: HeapType::Index(TypeDefId(9)),
            },
            &indices,
        );
        assert!(result.is_err());
    }

    #[test]
    fn shared_limits_need_a_maximum() {
        let mut out = Vec::new();
        assert!(encode_limits(&mut out, Limits { min: 1, max: None }, true).is_err());

        out.clear();
        encode_limits(
            &mut out,
            Limits {
                min: 1,
                max: Some(4),
            },
            true,
        )
        .unwrap();
        assert_eq!(out, vec![0x03, 0x01, 0x04]);
    }
}
