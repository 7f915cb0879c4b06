//! Static type labelling for variables, as consumed by the Wasm binary
//! lifter.
//!
//! The lifter only needs enough type information to classify imports and
//! look up signatures, so the lattice is deliberately small. A variable that
//! gets reassigned in the surrounding JavaScript degrades to `Anything`,
//! which the import analysis later reports as an unknown import type.
//!
//! The Typer also owns the registry of user-defined Wasm types: an arena of
//! type descriptions indexed by stable [`TypeDefId`]s, grouped into type
//! groups in definition order. Forward-or-self references get their own
//! arena slot with a `Forward` placeholder kind; resolution later points the
//! placeholder at the concrete description while uses always encode the
//! resolved target.

use crate::errors::LiftError;
use crate::fil::opcodes::{FilStorage, Op};
use crate::fil::wasm_opcodes::WasmOp;
use crate::fil::{Code, Variable};
use crate::wasm::types::{
    FieldDesc, HeapType, Limits, RefType, Signature, StorageType, TableElementType, TypeDefId,
    TypeDesc, TypeDescKind, ValueType,
};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

/// The static type of a JavaScript-level variable.
#[derive(Debug, Clone, PartialEq)]
pub enum JsType {
    Anything,
    Integer,
    Float,
    BigInt,
    Boolean,
    StringValue,
    Undefined,
    Object,
    /// A plain JavaScript function. Call-site signatures for Wasm imports
    /// come from the `JsCall` opcode, not from here.
    Function,
    WasmGlobal { value_type: ValueType, mutable: bool },
    WasmMemory { limits: Limits, shared: bool },
    WasmTable { element: TableElementType, limits: Limits },
    WasmTag { parameters: Vec<ValueType> },
    WasmSuspendingObject,
    WasmTypeDef { id: TypeDefId },
    /// A function defined inside a Wasm module, with its signature.
    WasmFunction { signature: Signature },
    /// The exports object of an instantiated module.
    WasmModuleExports,
    /// A data or element segment handle.
    WasmDataSegment,
    WasmElementSegment,
}

impl JsType {
    /// Short name used by type dumps and reports.
    pub fn display_name(&self) -> &'static str {
        match self {
            JsType::Anything => "Anything",
            JsType::Integer => "Integer",
            JsType::Float => "Float",
            JsType::BigInt => "BigInt",
            JsType::Boolean => "Boolean",
            JsType::StringValue => "String",
            JsType::Undefined => "Undefined",
            JsType::Object => "Object",
            JsType::Function => "Function",
            JsType::WasmGlobal { .. } => "WasmGlobal",
            JsType::WasmMemory { .. } => "WasmMemory",
            JsType::WasmTable { .. } => "WasmTable",
            JsType::WasmTag { .. } => "WasmTag",
            JsType::WasmSuspendingObject => "WasmSuspendingObject",
            JsType::WasmTypeDef { .. } => "WasmTypeDef",
            JsType::WasmFunction { .. } => "WasmFunction",
            JsType::WasmModuleExports => "WasmModuleExports",
            JsType::WasmDataSegment => "WasmDataSegment",
            JsType::WasmElementSegment => "WasmElementSegment",
        }
    }
}

/// Result of the type labelling pass.
#[derive(Debug, Default)]
pub struct Typer {
    types: FxHashMap<Variable, JsType>,

    type_defs: Vec<TypeDesc>,
    type_def_by_variable: FxHashMap<Variable, TypeDefId>,
    /// Concrete (non-forward) definitions per group, in definition order.
    groups: Vec<Vec<TypeDefId>>,
}

impl Typer {
    /// Labels every variable of `code` and collects the type registry.
    pub fn analyze(code: &Code) -> Result<Typer, LiftError> {
        let mut typer = Typer::default();
        let mut open_group: Option<usize> = None;

        for instruction in code {
            match &instruction.op {
                Op::BeginWasmTypeGroup => {
                    typer.groups.push(Vec::new());
                    open_group = Some(typer.groups.len() - 1);
                }
                Op::EndWasmTypeGroup => {
                    open_group = None;
                }
                Op::WasmDefineArrayType { element } => {
                    let group = require_group(open_group, instruction.index)?;
                    let field =
                        typer.lower_field(*element, &instruction.inputs, &mut 0, instruction.index)?;
                    typer.define_type(
                        instruction.outputs[0],
                        TypeDescKind::Array(field),
                        group,
                        true,
                    );
                }
                Op::WasmDefineStructType { fields } => {
                    let group = require_group(open_group, instruction.index)?;
                    let mut ref_cursor = 0usize;
                    let fields = fields
                        .iter()
                        .map(|field| {
                            typer.lower_field(
                                *field,
                                &instruction.inputs,
                                &mut ref_cursor,
                                instruction.index,
                            )
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    typer.define_type(
                        instruction.outputs[0],
                        TypeDescKind::Struct(fields),
                        group,
                        true,
                    );
                }
                Op::WasmDefineSignatureType { params, results } => {
                    let group = require_group(open_group, instruction.index)?;
                    typer.define_type(
                        instruction.outputs[0],
                        TypeDescKind::Func(Signature::new(params.clone(), results.clone())),
                        group,
                        true,
                    );
                }
                Op::WasmDefineForwardOrSelfReference => {
                    let group = require_group(open_group, instruction.index)?;
                    typer.define_type(
                        instruction.outputs[0],
                        TypeDescKind::Forward { resolved: None },
                        group,
                        false,
                    );
                }
                Op::WasmResolveForwardReference => {
                    let placeholder = typer
                        .type_def_of(instruction.input(0))
                        .ok_or_else(|| missing_type_def(instruction.input(0), instruction.index))?;
                    let concrete = typer
                        .type_def_of(instruction.input(1))
                        .ok_or_else(|| missing_type_def(instruction.input(1), instruction.index))?;
                    match &mut typer.type_defs[placeholder.0].kind {
                        TypeDescKind::Forward { resolved } => *resolved = Some(concrete),
                        _ => {
                            return Err(LiftError::invalid_input(format!(
                                "{} does not name a forward reference",
                                instruction.input(0)
                            ))
                            .at(instruction.index));
                        }
                    }
                }
                _ => {}
            }

            for variable in instruction.all_outputs() {
                let ty = match typer.type_def_of(variable) {
                    Some(id) => JsType::WasmTypeDef { id },
                    None => typer.type_of_definition(&instruction.op),
                };
                typer.types.insert(variable, ty);
            }

            // A reassignment makes the static type unreliable.
            if matches!(instruction.op, Op::Reassign | Op::Update { .. }) {
                typer.types.insert(instruction.input(0), JsType::Anything);
            }
        }

        Ok(typer)
    }

    pub fn type_of(&self, variable: Variable) -> &JsType {
        self.types.get(&variable).unwrap_or(&JsType::Anything)
    }

    pub fn type_def_of(&self, variable: Variable) -> Option<TypeDefId> {
        self.type_def_by_variable.get(&variable).copied()
    }

    pub fn type_desc(&self, id: TypeDefId) -> &TypeDesc {
        &self.type_defs[id.0]
    }

    /// Follows forward placeholders to the concrete description they were
    /// resolved to. Unresolved placeholders are a type-information error.
    pub fn effective_type_def(&self, id: TypeDefId) -> Result<TypeDefId, LiftError> {
        match &self.type_defs[id.0].kind {
            TypeDescKind::Forward { resolved: Some(target) } => self.effective_type_def(*target),
            TypeDescKind::Forward { resolved: None } => Err(LiftError::missing_type_information(
                format!("forward type reference {:?} was never resolved", id),
            )),
            _ => Ok(id),
        }
    }

    pub fn group_of(&self, id: TypeDefId) -> usize {
        self.type_defs[id.0].group
    }

    /// Concrete definitions of one group, in definition order.
    pub fn group_members(&self, group: usize) -> &[TypeDefId] {
        &self.groups[group]
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Expands a set of referenced groups with every group reachable
    /// through type references.
    pub fn group_dependency_closure(&self, groups: &BTreeSet<usize>) -> BTreeSet<usize> {
        let mut closure = groups.clone();
        let mut work: Vec<usize> = groups.iter().copied().collect();

        while let Some(group) = work.pop() {
            for &member in &self.groups[group] {
                for referenced in self.referenced_type_defs(member) {
                    let dep_group = self.group_of(referenced);
                    if closure.insert(dep_group) {
                        work.push(dep_group);
                    }
                }
            }
        }

        closure
    }

    fn referenced_type_defs(&self, id: TypeDefId) -> Vec<TypeDefId> {
        fn refs_of_field(field: &FieldDesc, out: &mut Vec<TypeDefId>) {
            if let StorageType::Val(ValueType::Ref(RefType {
                heap: HeapType::Index(id),
                ..
            })) = field.storage
            {
                out.push(id);
            }
        }

        let mut out = Vec::new();
        match &self.type_defs[id.0].kind {
            TypeDescKind::Array(field) => refs_of_field(field, &mut out),
            TypeDescKind::Struct(fields) => {
                for field in fields {
                    refs_of_field(field, &mut out);
                }
            }
            TypeDescKind::Func(signature) => {
                for value_type in signature.params.iter().chain(&signature.results) {
                    if let ValueType::Ref(RefType {
                        heap: HeapType::Index(id),
                        ..
                    }) = value_type
                    {
                        out.push(*id);
                    }
                }
            }
            TypeDescKind::Forward { resolved } => {
                if let Some(target) = resolved {
                    out.push(*target);
                }
            }
        }
        out
    }

    fn define_type(
        &mut self,
        variable: Variable,
        kind: TypeDescKind,
        group: usize,
        concrete: bool,
    ) -> TypeDefId {
        let id = TypeDefId(self.type_defs.len());
        self.type_defs.push(TypeDesc { kind, group });
        self.type_def_by_variable.insert(variable, id);
        if concrete {
            self.groups[group].push(id);
        }
        id
    }

    fn lower_field(
        &self,
        field: crate::fil::opcodes::FilField,
        inputs: &[Variable],
        ref_cursor: &mut usize,
        instruction_index: usize,
    ) -> Result<FieldDesc, LiftError> {
        let storage = match field.storage {
            FilStorage::I8 => StorageType::I8,
            FilStorage::I16 => StorageType::I16,
            FilStorage::Value(value_type) => StorageType::Val(value_type),
            FilStorage::TypeRef { nullable } => {
                let variable = inputs.get(*ref_cursor).copied().ok_or_else(|| {
                    LiftError::invalid_input("type reference field without a type input")
                        .at(instruction_index)
                })?;
                *ref_cursor += 1;
                let id = self
                    .type_def_of(variable)
                    .ok_or_else(|| missing_type_def(variable, instruction_index))?;
                StorageType::Val(ValueType::Ref(RefType {
                    nullable,
                    heap: HeapType::Index(id),
                }))
            }
        };
        Ok(FieldDesc {
            storage,
            mutable: field.mutable,
        })
    }

    fn type_of_definition(&self, op: &Op) -> JsType {
        match op {
            Op::LoadInteger { .. } => JsType::Integer,
            Op::LoadBigInt { .. } => JsType::BigInt,
            Op::LoadFloat { .. } => JsType::Float,
            Op::LoadString { .. } | Op::CreateTemplateString { .. } => JsType::StringValue,
            Op::LoadBoolean { .. } | Op::Compare { .. } | Op::TestIn | Op::TestInstanceOf => {
                JsType::Boolean
            }
            Op::LoadUndefined => JsType::Undefined,
            Op::CreateObject { .. }
            | Op::CreateObjectWithSpread { .. }
            | Op::CreateArray
            | Op::CreateArrayWithSpread { .. }
            | Op::EndObjectLiteral
            | Op::LoadRegExp { .. } => JsType::Object,
            Op::BeginPlainFunction { .. }
            | Op::BeginArrowFunction { .. }
            | Op::BeginGeneratorFunction { .. }
            | Op::BeginAsyncFunction { .. }
            | Op::BeginAsyncArrowFunction { .. }
            | Op::BeginAsyncGeneratorFunction { .. }
            | Op::BeginConstructor { .. }
            | Op::BeginClassDefinition { .. } => JsType::Function,
            Op::CreateWasmGlobal { value, mutable } => JsType::WasmGlobal {
                value_type: value.value_type(),
                mutable: *mutable,
            },
            Op::CreateWasmMemory { limits, shared } => JsType::WasmMemory {
                limits: *limits,
                shared: *shared,
            },
            Op::CreateWasmTable { element, limits } => JsType::WasmTable {
                element: *element,
                limits: *limits,
            },
            Op::CreateWasmJSTag { parameters } => JsType::WasmTag {
                parameters: parameters.clone(),
            },
            Op::WrapSuspending => JsType::WasmSuspendingObject,
            Op::EndWasmModule => JsType::WasmModuleExports,
            Op::Wasm(wasm_op) => match wasm_op {
                WasmOp::BeginFunction { signature } => JsType::WasmFunction {
                    signature: signature.clone(),
                },
                WasmOp::DefineGlobal { value, mutable } => JsType::WasmGlobal {
                    value_type: value.value_type(),
                    mutable: *mutable,
                },
                WasmOp::DefineMemory { limits, shared } => JsType::WasmMemory {
                    limits: *limits,
                    shared: *shared,
                },
                WasmOp::DefineTable { element, limits } => JsType::WasmTable {
                    element: *element,
                    limits: *limits,
                },
                WasmOp::DefineTag { parameters } => JsType::WasmTag {
                    parameters: parameters.clone(),
                },
                WasmOp::DefineDataSegment { .. } => JsType::WasmDataSegment,
                WasmOp::DefineElementSegment { .. } => JsType::WasmElementSegment,
                _ => JsType::Anything,
            },
            _ => JsType::Anything,
        }
    }
}

fn require_group(open_group: Option<usize>, instruction_index: usize) -> Result<usize, LiftError> {
    open_group.ok_or_else(|| {
        LiftError::invalid_input("type definition outside a type group").at(instruction_index)
    })
}

fn missing_type_def(variable: Variable, instruction_index: usize) -> LiftError {
    LiftError::missing_type_information(format!("{} does not name a defined type", variable))
        .at(instruction_index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fil::opcodes::FilField;
    use crate::fil::Instruction;

    fn v(n: u32) -> Variable {
        Variable(n)
    }

    fn i32_field(mutable: bool) -> FilField {
        FilField {
            storage: FilStorage::Value(ValueType::I32),
            mutable,
        }
    }

    #[test]
    fn literals_are_typed() {
        let mut code = Code::new();
        code.push(Instruction::new(Op::LoadInteger { value: 3 }).with_output(v(0)));
        code.push(Instruction::new(Op::LoadString { value: "x".into() }).with_output(v(1)));

        let typer = Typer::analyze(&code).unwrap();
        assert_eq!(*typer.type_of(v(0)), JsType::Integer);
        assert_eq!(*typer.type_of(v(1)), JsType::StringValue);
        assert_eq!(*typer.type_of(v(9)), JsType::Anything);
    }

    #[test]
    fn reassignment_degrades_the_type() {
        let mut code = Code::new();
        code.push(Instruction::new(Op::LoadInteger { value: 3 }).with_output(v(0)));
        code.push(Instruction::new(Op::LoadString { value: "x".into() }).with_output(v(1)));
        code.push(Instruction::new(Op::Reassign).with_inputs(vec![v(0), v(1)]));

        let typer = Typer::analyze(&code).unwrap();
        assert_eq!(*typer.type_of(v(0)), JsType::Anything);
    }

    #[test]
    fn type_groups_collect_members_in_order() {
        let mut code = Code::new();
        code.push(Instruction::new(Op::BeginWasmTypeGroup));
        code.push(
            Instruction::new(Op::WasmDefineArrayType {
                element: i32_field(true),
            })
            .with_output(v(0)),
        );
        code.push(
            Instruction::new(Op::WasmDefineStructType {
                fields: vec![i32_field(false)],
            })
            .with_output(v(1)),
        );
        code.push(Instruction::new(Op::EndWasmTypeGroup));

        let typer = Typer::analyze(&code).unwrap();
        let array_id = typer.type_def_of(v(0)).unwrap();
        let struct_id = typer.type_def_of(v(1)).unwrap();
        assert_eq!(typer.group_members(0), &[array_id, struct_id]);
        assert!(matches!(
            typer.type_desc(array_id).kind,
            TypeDescKind::Array(_)
        ));
    }

    #[test]
    fn forward_references_resolve_to_concrete_types() {
        let mut code = Code::new();
        code.push(Instruction::new(Op::BeginWasmTypeGroup));
        code.push(Instruction::new(Op::WasmDefineForwardOrSelfReference).with_output(v(0)));
        code.push(
            Instruction::new(Op::WasmDefineStructType {
                fields: vec![FilField {
                    storage: FilStorage::TypeRef { nullable: true },
                    mutable: true,
                }],
            })
            .with_inputs(vec![v(0)])
            .with_output(v(1)),
        );
        code.push(Instruction::new(Op::WasmResolveForwardReference).with_inputs(vec![v(0), v(1)]));
        code.push(Instruction::new(Op::EndWasmTypeGroup));

        let typer = Typer::analyze(&code).unwrap();
        let placeholder = typer.type_def_of(v(0)).unwrap();
        let concrete = typer.type_def_of(v(1)).unwrap();
        assert_eq!(typer.effective_type_def(placeholder).unwrap(), concrete);
        // Placeholders are not emitted, so the group holds only the struct.
        assert_eq!(typer.group_members(0), &[concrete]);
    }

    #[test]
    fn unresolved_forward_reference_is_missing_type_information() {
        let mut code = Code::new();
        code.push(Instruction::new(Op::BeginWasmTypeGroup));
        code.push(Instruction::new(Op::WasmDefineForwardOrSelfReference).with_output(v(0)));
        code.push(Instruction::new(Op::EndWasmTypeGroup));

        let typer = Typer::analyze(&code).unwrap();
        let placeholder = typer.type_def_of(v(0)).unwrap();
        assert!(typer.effective_type_def(placeholder).is_err());
    }

    #[test]
    fn dependency_closure_follows_cross_group_references() {
        let mut code = Code::new();
        // Group 0: a plain struct.
        code.push(Instruction::new(Op::BeginWasmTypeGroup));
        code.push(
            Instruction::new(Op::WasmDefineStructType {
                fields: vec![i32_field(true)],
            })
            .with_output(v(0)),
        );
        code.push(Instruction::new(Op::EndWasmTypeGroup));
        // Group 1: an array of references to the group-0 struct.
        code.push(Instruction::new(Op::BeginWasmTypeGroup));
        code.push(
            Instruction::new(Op::WasmDefineArrayType {
                element: FilField {
                    storage: FilStorage::TypeRef { nullable: true },
                    mutable: true,
                },
            })
            .with_inputs(vec![v(0)])
            .with_output(v(1)),
        );
        code.push(Instruction::new(Op::EndWasmTypeGroup));

        let typer = Typer::analyze(&code).unwrap();
        let mut referenced = BTreeSet::new();
        referenced.insert(1usize);
        let closure = typer.group_dependency_closure(&referenced);
        assert!(closure.contains(&0));
        assert!(closure.contains(&1));
    }
}
