//! The WebAssembly binary lifter.
//!
//! Compiles the instruction range between `BeginWasmModule` and
//! `EndWasmModule` into a valid `.wasm` byte stream in four stages:
//!
//! 1. **Import analysis**: every input defined outside the module range is
//!    classified by its static type and recorded as an import (de-duplicated
//!    per variable, and per signature for function-like imports, since the
//!    same JavaScript function may be called with different signatures from
//!    different sites). Module-level definitions claim their index-space
//!    slots in appearance order. Referenced type groups are collected with
//!    their transitive dependency closure.
//! 2. **Index assignment**: module-local indices for every user-defined
//!    type, group by group in ascending group order, then one signature
//!    index per distinct signature encountered.
//! 3. **Per-instruction emission**: function bodies with local allocation,
//!    operand inlining/spilling, and label resolution.
//! 4. **Section assembly** in the binary format's order.
//!
//! Operand discipline: each value-producing instruction assembles its bytes
//! (spliced operand loads plus its own encoding). A pure, single-output
//! producer whose only use follows with no intervening effectful
//! instruction hands its bytes to the consumer through the expression
//! writer; everything else commits its bytes and spills its outputs to
//! fresh locals in reverse declaration order, publishing `local.get`
//! sequences for later uses.

use crate::errors::LiftError;
use crate::fil::analysis::{DefUseAnalyzer, WasmScopeTracker};
use crate::fil::typer::{JsType, Typer};
use crate::fil::wasm_opcodes::{CastTarget, ConversionOp, GcGetMode, WasmOp};
use crate::fil::{Code, Instruction, Op, Variable};
use crate::wasm::leb;
use crate::wasm::module_builder::ModuleBuilder;
use crate::wasm::types::{
    encode_field_desc, encode_heap_type, encode_limits, encode_ref_type, encode_value_type,
    BranchHint, HeapType, RefType, Signature, StorageType, TypeDefId, TypeDescKind, TypeIndexMap,
    ValueType,
};
use crate::{return_fatal_error, return_invalid_input_error, wasm_log};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;
use std::ops::Range;

/// Entity kinds that occupy module index spaces. Suspending objects are
/// imported through the function index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Function,
    Table,
    Memory,
    Global,
    Tag,
    SuspendingObject,
}

impl EntityKind {
    fn index_space(self) -> EntityKind {
        match self {
            EntityKind::SuspendingObject => EntityKind::Function,
            other => other,
        }
    }
}

/// An import entry: the inner kind, the JavaScript-side source variable and
/// (for function-like and tag imports) the signature. An import can never
/// wrap another import; the type rules this out.
#[derive(Debug, Clone)]
pub struct ImportEntry {
    pub kind: EntityKind,
    pub variable: Variable,
    pub signature: Option<Signature>,
}

/// One slot in the module's ordered entity list: an import, or an entity
/// defined by a FIL instruction.
#[derive(Debug)]
enum ModuleEntity {
    Import(ImportEntry),
    /// Ordinal into the defined-function list.
    Function { ordinal: usize },
    Table { instr: usize, variable: Variable },
    Memory { instr: usize, variable: Variable },
    Global { instr: usize, variable: Variable },
    Tag { instr: usize, variable: Variable },
}

/// A defined function being (or already) emitted.
#[derive(Debug)]
struct FunctionInfo {
    signature: Signature,
    body: Vec<u8>,
    /// Local slot table: parameters first, then spilled values. A slot
    /// never changes its variable or type once assigned.
    locals: Vec<(Variable, ValueType)>,
    local_slots: FxHashMap<Variable, u32>,
    /// (hint, offset of the hinted opcode within `body`).
    branch_hints: Vec<(BranchHint, usize)>,
    output_variable: Variable,
    /// Signatures of currently open blocks, innermost last.
    open_blocks: Vec<Signature>,
}

impl FunctionInfo {
    fn new(signature: Signature, parameters: &[Variable], output_variable: Variable) -> Self {
        let mut info = FunctionInfo {
            signature: signature.clone(),
            body: Vec::new(),
            locals: Vec::new(),
            local_slots: FxHashMap::default(),
            branch_hints: Vec::new(),
            output_variable,
            open_blocks: Vec::new(),
        };
        for (variable, value_type) in parameters.iter().zip(&signature.params) {
            info.add_local(*variable, *value_type);
        }
        info
    }

    fn add_local(&mut self, variable: Variable, value_type: ValueType) -> u32 {
        let slot = self.locals.len() as u32;
        self.locals.push((variable, value_type));
        self.local_slots.entry(variable).or_insert(slot);
        slot
    }

    fn local_slot(&self, variable: Variable) -> Option<u32> {
        self.local_slots.get(&variable).copied()
    }
}

/// Name and source variable of one import, in import-section order.
/// Serializable so hosts can persist the binding list next to a sample.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ImportBinding {
    pub name: String,
    pub variable: Variable,
}

/// Result of lifting one embedded module.
#[derive(Debug)]
pub struct WasmLiftResult {
    pub bytes: Vec<u8>,
    /// The host must bind these, in order, as the module's imports.
    pub imports: Vec<ImportBinding>,
    /// JavaScript-side variables of defined entities and the export names
    /// they are reachable under.
    pub entity_bindings: Vec<(Variable, String)>,
}

impl WasmLiftResult {
    /// The ordered source-variable list of the public interface.
    pub fn imported_variables(&self) -> Vec<Variable> {
        self.imports.iter().map(|binding| binding.variable).collect()
    }
}

/// Convenience entry point: runs the analyses and lifts `code`, which must
/// be a single Wasm module (with or without the surrounding
/// `BeginWasmModule` / `EndWasmModule` pair).
pub fn lift_wasm(code: &Code) -> Result<(Vec<u8>, Vec<Variable>), LiftError> {
    let typer = Typer::analyze(code)?;
    let analyzer = DefUseAnalyzer::analyze(code);

    let mut range = 0..code.len();
    for (index, instruction) in code.iter().enumerate() {
        if matches!(instruction.op, Op::BeginWasmModule) {
            let end = code
                .block_end_index(index)
                .ok_or_else(|| LiftError::invalid_input("unterminated Wasm module").at(index))?;
            range = index + 1..end;
            break;
        }
    }

    let result = WasmLifter::lift_range(code, range, &typer, &analyzer)?;
    let variables = result.imported_variables();
    Ok((result.bytes, variables))
}

pub struct WasmLifter<'a> {
    code: &'a Code,
    range: Range<usize>,
    typer: &'a Typer,
    analyzer: &'a DefUseAnalyzer,

    entities: Vec<ModuleEntity>,
    /// (defining instruction, JS-level output variable, signature) per
    /// defined function, in appearance order.
    function_metas: Vec<(usize, Variable, Signature)>,
    passive_element_segments: Vec<usize>,
    active_element_segments: Vec<usize>,
    data_segments: Vec<usize>,

    referenced_groups: BTreeSet<usize>,
    group_closure: Vec<usize>,
    type_indices: TypeIndexMap,
    signature_indices: FxHashMap<Signature, u32>,
    signature_order: Vec<Signature>,
    next_type_index: u32,

    functions: Vec<FunctionInfo>,
    current: Option<FunctionInfo>,
    scope: WasmScopeTracker,
    expr_writer: FxHashMap<Variable, Vec<u8>>,
    value_types: FxHashMap<Variable, ValueType>,
}

impl<'a> WasmLifter<'a> {
    pub fn lift_range(
        code: &'a Code,
        range: Range<usize>,
        typer: &'a Typer,
        analyzer: &'a DefUseAnalyzer,
    ) -> Result<WasmLiftResult, LiftError> {
        let mut lifter = WasmLifter {
            code,
            range,
            typer,
            analyzer,
            entities: Vec::new(),
            function_metas: Vec::new(),
            passive_element_segments: Vec::new(),
            active_element_segments: Vec::new(),
            data_segments: Vec::new(),
            referenced_groups: BTreeSet::new(),
            group_closure: Vec::new(),
            type_indices: TypeIndexMap::default(),
            signature_indices: FxHashMap::default(),
            signature_order: Vec::new(),
            next_type_index: 0,
            functions: Vec::new(),
            current: None,
            scope: WasmScopeTracker::new(),
            expr_writer: FxHashMap::default(),
            value_types: FxHashMap::default(),
        };

        lifter.analyze_module()?;
        lifter.assign_indices()?;
        lifter.emit_instructions()?;
        lifter.assemble()
    }

    // ------------------------------------------------------------------
    // Pass 1: import analysis and entity collection
    // ------------------------------------------------------------------

    fn defined_outside(&self, variable: Variable) -> bool {
        match self.analyzer.definition_index(variable) {
            Some(definition) => !self.range.contains(&definition),
            None => true,
        }
    }

    fn analyze_module(&mut self) -> Result<(), LiftError> {
        let mut seen_imports: FxHashSet<(Variable, Option<Signature>)> = FxHashSet::default();

        for index in self.range.clone() {
            let instruction = &self.code[index];
            let Op::Wasm(op) = &instruction.op else {
                return_invalid_input_error!(
                    index;
                    "JavaScript opcode {} inside a Wasm module",
                    instruction.op.name()
                );
            };

            // Defined entities claim their slots in appearance order.
            match op {
                WasmOp::BeginFunction { signature } => {
                    let ordinal = self.function_metas.len();
                    self.function_metas.push((
                        index,
                        instruction.outputs[0],
                        signature.clone(),
                    ));
                    self.entities.push(ModuleEntity::Function { ordinal });
                }
                WasmOp::DefineTable { .. } => self.entities.push(ModuleEntity::Table {
                    instr: index,
                    variable: instruction.outputs[0],
                }),
                WasmOp::DefineMemory { .. } => self.entities.push(ModuleEntity::Memory {
                    instr: index,
                    variable: instruction.outputs[0],
                }),
                WasmOp::DefineGlobal { .. } => self.entities.push(ModuleEntity::Global {
                    instr: index,
                    variable: instruction.outputs[0],
                }),
                WasmOp::DefineTag { .. } => self.entities.push(ModuleEntity::Tag {
                    instr: index,
                    variable: instruction.outputs[0],
                }),
                WasmOp::DefineElementSegment { offset } => {
                    if offset.is_some() {
                        self.active_element_segments.push(index);
                    } else {
                        self.passive_element_segments.push(index);
                    }
                }
                WasmOp::DefineDataSegment { .. } => self.data_segments.push(index),
                _ => {}
            }

            for (input_position, &input) in instruction.inputs.iter().enumerate() {
                if !self.defined_outside(input) {
                    continue;
                }
                if let Some(id) = self.typer.type_def_of(input) {
                    self.referenced_groups.insert(self.typer.group_of(id));
                    continue;
                }
                let entry = self.classify_import(instruction, op, input_position, input)?;
                let key = (entry.variable, entry.signature.clone());
                if seen_imports.insert(key) {
                    wasm_log!("import {:?} for {}", entry.kind, entry.variable);
                    self.entities.push(ModuleEntity::Import(entry));
                }
            }
        }

        // Imports occupy the low indices: stable-partition them in front of
        // the defined entities while preserving both relative orders.
        self.entities
            .sort_by_key(|entity| !matches!(entity, ModuleEntity::Import(_)));

        Ok(())
    }

    fn classify_import(
        &self,
        instruction: &Instruction,
        op: &WasmOp,
        input_position: usize,
        input: Variable,
    ) -> Result<ImportEntry, LiftError> {
        let entry = |kind, signature| ImportEntry {
            kind,
            variable: input,
            signature,
        };
        match self.typer.type_of(input) {
            JsType::WasmGlobal { .. } => Ok(entry(EntityKind::Global, None)),
            JsType::WasmMemory { .. } => Ok(entry(EntityKind::Memory, None)),
            JsType::WasmTable { .. } => Ok(entry(EntityKind::Table, None)),
            JsType::WasmTag { parameters } => Ok(entry(
                EntityKind::Tag,
                Some(Signature::new(parameters.clone(), Vec::new())),
            )),
            JsType::WasmFunction { signature } => {
                Ok(entry(EntityKind::Function, Some(signature.clone())))
            }
            JsType::Function => match op {
                WasmOp::JsCall { signature } if input_position == 0 => {
                    Ok(entry(EntityKind::Function, Some(signature.clone())))
                }
                _ => Err(LiftError::missing_type_information(format!(
                    "no call-site signature for JavaScript function {}",
                    input
                ))
                .at(instruction.index)),
            },
            JsType::WasmSuspendingObject => match op {
                WasmOp::JsCall { signature } if input_position == 0 => Ok(entry(
                    EntityKind::SuspendingObject,
                    Some(signature.clone()),
                )),
                _ => Err(LiftError::missing_type_information(format!(
                    "suspending object {} used outside a call", input
                ))
                .at(instruction.index)),
            },
            other => Err(LiftError::unknown_import_type(format!(
                "{} has type {} which is not Wasm-importable",
                input,
                other.display_name()
            ))
            .at(instruction.index)),
        }
    }

    // ------------------------------------------------------------------
    // Pass 2: type and signature index assignment
    // ------------------------------------------------------------------

    fn register_signature(&mut self, signature: &Signature) {
        if self.signature_indices.contains_key(signature) {
            return;
        }
        self.signature_indices
            .insert(signature.clone(), self.next_type_index);
        self.signature_order.push(signature.clone());
        self.next_type_index += 1;
    }

    fn assign_indices(&mut self) -> Result<(), LiftError> {
        let closure = self.typer.group_dependency_closure(&self.referenced_groups);
        self.group_closure = closure.iter().copied().collect();

        for &group in &self.group_closure {
            for &member in self.typer.group_members(group) {
                self.type_indices.insert(member, self.next_type_index);
                self.next_type_index += 1;
            }
        }

        // Import signatures, in import order.
        let import_signatures: Vec<Signature> = self
            .entities
            .iter()
            .filter_map(|entity| match entity {
                ModuleEntity::Import(entry) => entry.signature.clone(),
                _ => None,
            })
            .collect();
        for signature in &import_signatures {
            self.register_signature(signature);
        }

        // Defined tag signatures, then defined function signatures.
        let mut tag_signatures = Vec::new();
        for entity in &self.entities {
            if let ModuleEntity::Tag { instr, .. } = entity {
                let Op::Wasm(WasmOp::DefineTag { parameters }) = &self.code[*instr].op else {
                    return_fatal_error!(*instr; "tag entity does not name a tag definition");
                };
                tag_signatures.push(Signature::new(parameters.clone(), Vec::new()));
            }
        }
        for signature in &tag_signatures {
            self.register_signature(signature);
        }
        let function_signatures: Vec<Signature> = self
            .function_metas
            .iter()
            .map(|(_, _, signature)| signature.clone())
            .collect();
        for signature in &function_signatures {
            self.register_signature(signature);
        }

        // Block, loop, try and call-site signatures, in instruction order.
        for index in self.range.clone() {
            if let Op::Wasm(op) = &self.code[index].op {
                match op {
                    WasmOp::BeginBlock { signature }
                    | WasmOp::BeginLoop { signature }
                    | WasmOp::BeginIf { signature, .. }
                    | WasmOp::BeginTry { signature }
                    | WasmOp::BeginTryTable { signature, .. }
                    | WasmOp::CallIndirect { signature }
                    | WasmOp::ReturnCallIndirect { signature }
                    | WasmOp::CallRef { signature } => {
                        self.register_signature(&signature.clone());
                    }
                    _ => {}
                }
            }
        }

        Ok(())
    }

    fn signature_index(&self, signature: &Signature, at: usize) -> Result<u32, LiftError> {
        self.signature_indices.get(signature).copied().ok_or_else(|| {
            LiftError::failed_signature_lookup(format!(
                "signature {:?} was never registered",
                signature
            ))
            .at(at)
        })
    }

    // ------------------------------------------------------------------
    // Entity resolution
    // ------------------------------------------------------------------

    /// Index of the first `kind`-matching slot referencing `variable`:
    /// imports first, then defined entities, both in recorded order.
    fn resolve_index(
        &self,
        kind: EntityKind,
        variable: Variable,
        signature: Option<&Signature>,
        at: usize,
    ) -> Result<u32, LiftError> {
        let space = kind.index_space();
        let mut index = 0u32;
        for entity in &self.entities {
            let ModuleEntity::Import(entry) = entity else {
                continue;
            };
            if entry.kind.index_space() != space {
                continue;
            }
            if entry.variable == variable
                && (signature.is_none() || entry.signature.as_ref() == signature)
            {
                return Ok(index);
            }
            index += 1;
        }
        for entity in &self.entities {
            let matches = match (entity, space) {
                (ModuleEntity::Function { ordinal }, EntityKind::Function) => {
                    self.function_metas[*ordinal].1 == variable
                }
                (ModuleEntity::Table { variable: v, .. }, EntityKind::Table) => *v == variable,
                (ModuleEntity::Memory { variable: v, .. }, EntityKind::Memory) => *v == variable,
                (ModuleEntity::Global { variable: v, .. }, EntityKind::Global) => *v == variable,
                (ModuleEntity::Tag { variable: v, .. }, EntityKind::Tag) => *v == variable,
                _ => continue,
            };
            if matches {
                return Ok(index);
            }
            index += 1;
        }

        if matches!(self.typer.type_of(variable), JsType::Anything) {
            return Err(LiftError::unknown_import_type(format!(
                "{} was reassigned to a value that is no longer importable",
                variable
            ))
            .at(at));
        }
        Err(LiftError::failed_index_lookup(format!(
            "no {:?} slot references {}",
            space, variable
        ))
        .at(at))
    }

    /// Resolves a function-space input and returns its signature as well.
    fn resolve_function(
        &self,
        variable: Variable,
        signature: Option<&Signature>,
        at: usize,
    ) -> Result<(u32, Signature), LiftError> {
        let index = self.resolve_index(EntityKind::Function, variable, signature, at)?;
        if let Some(signature) = signature {
            return Ok((index, signature.clone()));
        }
        // Recover the signature from the slot we just resolved.
        let mut current = 0u32;
        for entity in &self.entities {
            if let ModuleEntity::Import(entry) = entity {
                if entry.kind.index_space() != EntityKind::Function {
                    continue;
                }
                if current == index {
                    let signature = entry.signature.clone().ok_or_else(|| {
                        LiftError::missing_type_information(format!(
                            "function import {} has no signature",
                            variable
                        ))
                        .at(at)
                    })?;
                    return Ok((index, signature));
                }
                current += 1;
            }
        }
        for entity in &self.entities {
            if let ModuleEntity::Function { ordinal } = entity {
                if current == index {
                    return Ok((index, self.function_metas[*ordinal].2.clone()));
                }
                current += 1;
            }
        }
        Err(LiftError::failed_index_lookup(format!("function slot {} vanished", index)).at(at))
    }

    fn element_segment_index(&self, variable: Variable, at: usize) -> Result<u32, LiftError> {
        // Passive segments come first so they retain the low indices.
        for (position, instr) in self
            .passive_element_segments
            .iter()
            .chain(&self.active_element_segments)
            .enumerate()
        {
            if self.code[*instr].outputs.first() == Some(&variable) {
                return Ok(position as u32);
            }
        }
        Err(
            LiftError::failed_index_lookup(format!("no element segment defines {}", variable))
                .at(at),
        )
    }

    fn data_segment_index(&self, variable: Variable, at: usize) -> Result<u32, LiftError> {
        for (position, instr) in self.data_segments.iter().enumerate() {
            if self.code[*instr].outputs.first() == Some(&variable) {
                return Ok(position as u32);
            }
        }
        Err(LiftError::failed_index_lookup(format!("no data segment defines {}", variable)).at(at))
    }

    // ------------------------------------------------------------------
    // Pass 3: per-instruction emission
    // ------------------------------------------------------------------

    fn current_mut(&mut self, at: usize) -> Result<&mut FunctionInfo, LiftError> {
        self.current
            .as_mut()
            .ok_or_else(|| LiftError::invalid_input("instruction outside a function body").at(at))
    }

    fn body_len(&self) -> usize {
        self.current.as_ref().map_or(0, |function| function.body.len())
    }

    fn value_type_of(&self, variable: Variable, at: usize) -> Result<ValueType, LiftError> {
        self.value_types.get(&variable).copied().ok_or_else(|| {
            LiftError::invalid_input(format!("{} has no Wasm value type", variable)).at(at)
        })
    }

    /// Splices the producer bytes of input `i` into `out`, or loads it from
    /// its local slot.
    fn load_input(
        &mut self,
        instruction: &Instruction,
        i: usize,
        out: &mut Vec<u8>,
    ) -> Result<(), LiftError> {
        let variable = instruction.input(i);
        if let Some(bytes) = self.expr_writer.remove(&variable) {
            out.extend_from_slice(&bytes);
            return Ok(());
        }
        let slot = self
            .current
            .as_ref()
            .and_then(|function| function.local_slot(variable));
        match slot {
            Some(slot) => {
                out.push(0x20);
                leb::encode_u32(out, slot);
                Ok(())
            }
            None => Err(LiftError::invalid_input(format!(
                "{} is not available as a Wasm operand",
                variable
            ))
            .at(instruction.index)),
        }
    }

    fn load_inputs(
        &mut self,
        instruction: &Instruction,
        indices: Range<usize>,
        out: &mut Vec<u8>,
    ) -> Result<(), LiftError> {
        for i in indices {
            self.load_input(instruction, i, out)?;
        }
        Ok(())
    }

    /// Spills `variables` to fresh locals in reverse declaration order and
    /// publishes their `local.get` sequences.
    fn spill(
        &mut self,
        variables: &[Variable],
        types: &[ValueType],
        at: usize,
    ) -> Result<(), LiftError> {
        if variables.len() != types.len() {
            return_fatal_error!(at; "output arity mismatch: {} variables, {} types",
                variables.len(), types.len());
        }
        for (&variable, &value_type) in variables.iter().zip(types).rev() {
            let function = self.current_mut(at)?;
            let slot = function.add_local(variable, value_type);
            function.body.push(0x21);
            leb::encode_u32(&mut function.body, slot);

            let mut getter = vec![0x20];
            leb::encode_u32(&mut getter, slot);
            self.expr_writer.insert(variable, getter);
            self.value_types.insert(variable, value_type);
        }
        Ok(())
    }

    /// Commits or defers one value-producing instruction's bytes.
    fn finish_value_instruction(
        &mut self,
        instruction: &Instruction,
        pure: bool,
        bytes: Vec<u8>,
        types: Vec<ValueType>,
    ) -> Result<(), LiftError> {
        if pure && instruction.outputs.len() == 1 && self.may_defer(instruction) {
            let output = instruction.outputs[0];
            self.value_types.insert(output, types[0]);
            self.expr_writer.insert(output, bytes);
            return Ok(());
        }
        self.current_mut(instruction.index)?.body.extend_from_slice(&bytes);
        let outputs = instruction.outputs.clone();
        self.spill(&outputs, &types, instruction.index)
    }

    /// A producer may hand its bytes to its consumer when it has exactly
    /// one use, later in the stream, with no effectful instruction between.
    fn may_defer(&self, instruction: &Instruction) -> bool {
        let uses = self.analyzer.uses(instruction.outputs[0]);
        if uses.len() != 1 || uses[0] <= instruction.index {
            return false;
        }
        self.code.instructions()[instruction.index + 1..uses[0]]
            .iter()
            .all(|between| match &between.op {
                Op::Wasm(op) => !op.has_side_effects(),
                _ => false,
            })
    }

    /// Appends the memory immediate: a single alignment byte for memory 0,
    /// or `(align | 0x40)` plus the memory index otherwise; then the static
    /// offset.
    fn encode_mem_arg(
        out: &mut Vec<u8>,
        align_log2: u32,
        offset: u32,
        memory_index: u32,
    ) {
        if memory_index == 0 {
            leb::encode_u32(out, align_log2);
        } else {
            leb::encode_u32(out, align_log2 | 0x40);
            leb::encode_u32(out, memory_index);
        }
        leb::encode_u32(out, offset);
    }

    /// Encodes the block type as a signature index.
    fn encode_block_type(&self, out: &mut Vec<u8>, signature: &Signature, at: usize) -> Result<(), LiftError> {
        let index = self.signature_index(signature, at)?;
        leb::encode_i64(out, i64::from(index));
        Ok(())
    }

    /// The heap type of a cast target, reading the trailing type-definition
    /// input when the target is `TypeDef`.
    fn cast_heap_type(
        &self,
        instruction: &Instruction,
        target: CastTarget,
    ) -> Result<HeapType, LiftError> {
        match target {
            CastTarget::Abstract(heap) => Ok(heap),
            CastTarget::TypeDef => {
                let variable = *instruction.inputs.last().ok_or_else(|| {
                    LiftError::invalid_input("cast target without a type input")
                        .at(instruction.index)
                })?;
                let id = self.typer.type_def_of(variable).ok_or_else(|| {
                    LiftError::missing_type_information(format!(
                        "{} does not name a defined type",
                        variable
                    ))
                    .at(instruction.index)
                })?;
                Ok(HeapType::Index(self.typer.effective_type_def(id)?))
            }
        }
    }

    fn type_def_input(
        &self,
        instruction: &Instruction,
        i: usize,
    ) -> Result<TypeDefId, LiftError> {
        let variable = instruction.input(i);
        let id = self.typer.type_def_of(variable).ok_or_else(|| {
            LiftError::missing_type_information(format!(
                "{} does not name a defined type",
                variable
            ))
            .at(instruction.index)
        })?;
        self.typer.effective_type_def(id)
    }

    fn type_index_of(&self, id: TypeDefId, at: usize) -> Result<u32, LiftError> {
        self.type_indices.get(&id).copied().ok_or_else(|| {
            LiftError::failed_index_lookup(format!("type {:?} has no module-local index", id))
                .at(at)
        })
    }

    fn label_depth(&self, instruction: &Instruction, i: usize) -> Result<u32, LiftError> {
        self.scope
            .branch_depth_for(instruction.input(i), instruction.index)
    }

    fn emit_instructions(&mut self) -> Result<(), LiftError> {
        for index in self.range.clone() {
            let instruction = &self.code[index];
            let Op::Wasm(op) = &instruction.op else {
                return_invalid_input_error!(index; "JavaScript opcode inside a Wasm module");
            };
            self.emit_instruction(instruction, op)?;
        }
        if self.current.is_some() {
            return Err(LiftError::invalid_input("unterminated Wasm function"));
        }
        Ok(())
    }

    #[allow(clippy::too_many_lines)]
    fn emit_instruction(
        &mut self,
        instr: &Instruction,
        op: &WasmOp,
    ) -> Result<(), LiftError> {
        use WasmOp::*;

        let at = instr.index;
        match op {
            // ----- module-level definitions: handled by the other passes --
            DefineGlobal { .. } | DefineMemory { .. } | DefineTable { .. } | DefineTag { .. }
            | DefineElementSegment { .. } | DefineDataSegment { .. } => {}

            // ----- functions ---------------------------------------------
            BeginFunction { signature } => {
                if self.current.is_some() {
                    return_invalid_input_error!(at; "nested Wasm function definition");
                }
                self.scope.enter_function();
                let info = FunctionInfo::new(
                    signature.clone(),
                    &instr.inner_outputs,
                    instr.outputs[0],
                );
                for (variable, value_type) in instr.inner_outputs.iter().zip(&signature.params) {
                    self.value_types.insert(*variable, *value_type);
                }
                self.current = Some(info);
            }
            EndFunction => {
                let mut bytes = Vec::new();
                self.load_inputs(instr, 0..instr.inputs.len(), &mut bytes)?;
                let mut function = self.current.take().ok_or_else(|| {
                    LiftError::invalid_input("function end without a function").at(at)
                })?;
                function.body.extend_from_slice(&bytes);
                if !function.open_blocks.is_empty() {
                    return_invalid_input_error!(at; "function ended with open blocks");
                }
                self.functions.push(function);
            }
            Return => {
                let mut bytes = Vec::new();
                self.load_inputs(instr, 0..instr.inputs.len(), &mut bytes)?;
                bytes.push(0x0F);
                self.current_mut(at)?.body.extend_from_slice(&bytes);
            }

            // ----- structured control ------------------------------------
            BeginBlock { signature } | BeginLoop { signature } => {
                let opcode = if matches!(op, BeginBlock { .. }) { 0x02 } else { 0x03 };
                let mut bytes = Vec::new();
                self.load_inputs(instr, 0..instr.inputs.len(), &mut bytes)?;
                bytes.push(opcode);
                self.encode_block_type(&mut bytes, signature, at)?;
                self.current_mut(at)?.body.extend_from_slice(&bytes);
                self.scope.process(op, instr.inner_outputs.first().copied());
                let params = signature.params.clone();
                let inner = instr.inner_outputs[1..].to_vec();
                self.spill(&inner, &params, at)?;
                self.current_mut(at)?.open_blocks.push(signature.clone());
            }
            BeginIf { signature, hint } => {
                let mut bytes = Vec::new();
                self.load_inputs(instr, 0..instr.inputs.len(), &mut bytes)?;
                if let Some(hint) = hint {
                    let offset = self.body_len() + bytes.len();
                    self.current_mut(at)?.branch_hints.push((*hint, offset));
                }
                bytes.push(0x04);
                self.encode_block_type(&mut bytes, signature, at)?;
                self.current_mut(at)?.body.extend_from_slice(&bytes);
                self.scope.process(op, instr.inner_outputs.first().copied());
                let params = signature.params.clone();
                let inner = instr.inner_outputs[1..].to_vec();
                self.spill(&inner, &params, at)?;
                self.current_mut(at)?.open_blocks.push(signature.clone());
            }
            BeginElse => {
                let mut bytes = Vec::new();
                self.load_inputs(instr, 0..instr.inputs.len(), &mut bytes)?;
                bytes.push(0x05);
                self.current_mut(at)?.body.extend_from_slice(&bytes);
                self.scope.process(op, instr.inner_outputs.first().copied());
                let params = self
                    .current_mut(at)?
                    .open_blocks
                    .last()
                    .map(|signature| signature.params.clone())
                    .unwrap_or_default();
                let inner = instr.inner_outputs[1..].to_vec();
                self.spill(&inner, &params, at)?;
            }
            EndBlock | EndLoop | EndIf | EndTry | EndTryTable => {
                let mut bytes = Vec::new();
                self.load_inputs(instr, 0..instr.inputs.len(), &mut bytes)?;
                bytes.push(0x0B);
                self.current_mut(at)?.body.extend_from_slice(&bytes);
                self.scope.process(op, None);
                let results = self
                    .current_mut(at)?
                    .open_blocks
                    .pop()
                    .map(|signature| signature.results)
                    .unwrap_or_default();
                let outputs = instr.outputs.clone();
                self.spill(&outputs, &results, at)?;
            }
            BeginTry { signature } => {
                let mut bytes = Vec::new();
                self.load_inputs(instr, 0..instr.inputs.len(), &mut bytes)?;
                bytes.push(0x06);
                self.encode_block_type(&mut bytes, signature, at)?;
                self.current_mut(at)?.body.extend_from_slice(&bytes);
                self.scope.process(op, instr.inner_outputs.first().copied());
                let params = signature.params.clone();
                let inner = instr.inner_outputs[1..].to_vec();
                self.spill(&inner, &params, at)?;
                self.current_mut(at)?.open_blocks.push(signature.clone());
            }
            BeginCatch => {
                let tag = instr.input(0);
                let tag_index = self.resolve_index(EntityKind::Tag, tag, None, at)?;
                let mut bytes = vec![0x07];
                leb::encode_u32(&mut bytes, tag_index);
                self.current_mut(at)?.body.extend_from_slice(&bytes);
                self.scope.process(op, instr.inner_outputs.first().copied());
                let JsType::WasmTag { parameters } = self.typer.type_of(tag) else {
                    return Err(LiftError::missing_type_information(format!(
                        "{} is not a tag", tag
                    ))
                    .at(at));
                };
                let params = parameters.clone();
                let inner = instr.inner_outputs[1..].to_vec();
                self.spill(&inner, &params, at)?;
            }
            BeginCatchAll => {
                self.current_mut(at)?.body.push(0x19);
                self.scope.process(op, instr.inner_outputs.first().copied());
            }
            BeginTryTable { signature, catches } => {
                let argument_count = signature.params.len();
                let tag_count = catches.iter().filter(|kind| kind.needs_tag()).count();
                let mut bytes = Vec::new();
                self.load_inputs(instr, 0..argument_count, &mut bytes)?;

                // Clause labels are resolved relative to the blocks
                // enclosing the try_table itself.
                let mut clause_bytes = Vec::new();
                leb::encode_usize(&mut clause_bytes, catches.len());
                let mut tag_cursor = argument_count;
                let label_base = argument_count + tag_count;
                for (clause, kind) in catches.iter().enumerate() {
                    clause_bytes.push(kind.encoding_byte());
                    if kind.needs_tag() {
                        let tag = instr.input(tag_cursor);
                        tag_cursor += 1;
                        let tag_index = self.resolve_index(EntityKind::Tag, tag, None, at)?;
                        leb::encode_u32(&mut clause_bytes, tag_index);
                    }
                    let depth = self.label_depth(instr, label_base + clause)?;
                    leb::encode_u32(&mut clause_bytes, depth);
                }

                bytes.push(0x1F);
                self.encode_block_type(&mut bytes, signature, at)?;
                bytes.extend_from_slice(&clause_bytes);
                self.current_mut(at)?.body.extend_from_slice(&bytes);
                self.scope.process(op, instr.inner_outputs.first().copied());
                let params = signature.params.clone();
                let inner = instr.inner_outputs[1..].to_vec();
                self.spill(&inner, &params, at)?;
                self.current_mut(at)?.open_blocks.push(signature.clone());
            }
            Throw => {
                let tag = instr.input(0);
                let tag_index = self.resolve_index(EntityKind::Tag, tag, None, at)?;
                let mut bytes = Vec::new();
                self.load_inputs(instr, 1..instr.inputs.len(), &mut bytes)?;
                bytes.push(0x08);
                leb::encode_u32(&mut bytes, tag_index);
                self.current_mut(at)?.body.extend_from_slice(&bytes);
            }
            Rethrow => {
                let depth = self.label_depth(instr, 0)?;
                let mut bytes = vec![0x09];
                leb::encode_u32(&mut bytes, depth);
                self.current_mut(at)?.body.extend_from_slice(&bytes);
            }
            ThrowRef => {
                let mut bytes = Vec::new();
                self.load_input(instr, 0, &mut bytes)?;
                bytes.push(0x0A);
                self.current_mut(at)?.body.extend_from_slice(&bytes);
            }

            // ----- branches ----------------------------------------------
            Branch => {
                let depth = self.label_depth(instr, 0)?;
                let mut bytes = Vec::new();
                self.load_inputs(instr, 1..instr.inputs.len(), &mut bytes)?;
                bytes.push(0x0C);
                leb::encode_u32(&mut bytes, depth);
                self.current_mut(at)?.body.extend_from_slice(&bytes);
            }
            BranchIf { hint } => {
                if instr.inputs.len() < 2 {
                    return_invalid_input_error!(at; "conditional branch without a condition");
                }
                let depth = self.label_depth(instr, 0)?;
                let mut bytes = Vec::new();
                self.load_inputs(instr, 1..instr.inputs.len(), &mut bytes)?;
                if let Some(hint) = hint {
                    let offset = self.body_len() + bytes.len();
                    self.current_mut(at)?.branch_hints.push((*hint, offset));
                }
                bytes.push(0x0D);
                leb::encode_u32(&mut bytes, depth);
                self.current_mut(at)?.body.extend_from_slice(&bytes);
                // The fallthrough re-binds the argument values.
                let types = instr.inputs[1..instr.inputs.len() - 1]
                    .iter()
                    .map(|&argument| self.value_type_of(argument, at))
                    .collect::<Result<Vec<_>, _>>()?;
                let outputs = instr.outputs.clone();
                self.spill(&outputs, &types[..outputs.len().min(types.len())], at)?;
            }
            BranchTable => {
                let mut bytes = Vec::new();
                self.load_input(instr, 0, &mut bytes)?;
                bytes.push(0x0E);
                let case_count = instr.inputs.len().saturating_sub(2);
                leb::encode_usize(&mut bytes, case_count);
                for case in 0..case_count {
                    let depth = self.label_depth(instr, 2 + case)?;
                    leb::encode_u32(&mut bytes, depth);
                }
                let default_depth = self.label_depth(instr, 1)?;
                leb::encode_u32(&mut bytes, default_depth);
                self.current_mut(at)?.body.extend_from_slice(&bytes);
            }
            BrOnNull => {
                let depth = self.label_depth(instr, 0)?;
                let mut bytes = Vec::new();
                self.load_input(instr, 1, &mut bytes)?;
                bytes.push(0xD5);
                leb::encode_u32(&mut bytes, depth);
                self.current_mut(at)?.body.extend_from_slice(&bytes);
                let fallthrough = non_null(self.value_type_of(instr.input(1), at)?);
                let outputs = instr.outputs.clone();
                self.spill(&outputs, &[fallthrough][..outputs.len().min(1)], at)?;
            }
            BrOnNonNull => {
                let depth = self.label_depth(instr, 0)?;
                let mut bytes = Vec::new();
                self.load_input(instr, 1, &mut bytes)?;
                bytes.push(0xD6);
                leb::encode_u32(&mut bytes, depth);
                self.current_mut(at)?.body.extend_from_slice(&bytes);
            }
            BrOnCast {
                target,
                input_nullable,
                result_nullable,
            }
            | BrOnCastFail {
                target,
                input_nullable,
                result_nullable,
            } => {
                let is_fail = matches!(op, BrOnCastFail { .. });
                let depth = self.label_depth(instr, 0)?;
                let source_type = self.value_type_of(instr.input(1), at)?;
                let ValueType::Ref(source_ref) = source_type else {
                    return_invalid_input_error!(at; "cast source is not a reference");
                };
                let target_heap = self.cast_heap_type(instr, *target)?;

                let mut bytes = Vec::new();
                self.load_input(instr, 1, &mut bytes)?;
                bytes.push(0xFB);
                leb::encode_u32(&mut bytes, if is_fail { 0x19 } else { 0x18 });
                let flags =
                    u8::from(*input_nullable) | (u8::from(*result_nullable) << 1);
                bytes.push(flags);
                leb::encode_u32(&mut bytes, depth);
                encode_heap_type(&mut bytes, source_ref.heap, &self.type_indices)?;
                encode_heap_type(&mut bytes, target_heap, &self.type_indices)?;
                self.current_mut(at)?.body.extend_from_slice(&bytes);

                let fallthrough = if is_fail {
                    ValueType::Ref(RefType {
                        nullable: *result_nullable,
                        heap: target_heap,
                    })
                } else {
                    source_type
                };
                let outputs = instr.outputs.clone();
                self.spill(&outputs, &[fallthrough][..outputs.len().min(1)], at)?;
            }

            // ----- calls -------------------------------------------------
            Call | ReturnCall => {
                let callee = instr.input(0);
                let (index, signature) = self.resolve_function(callee, None, at)?;
                let mut bytes = Vec::new();
                self.load_inputs(instr, 1..instr.inputs.len(), &mut bytes)?;
                bytes.push(if matches!(op, Call) { 0x10 } else { 0x12 });
                leb::encode_u32(&mut bytes, index);
                self.current_mut(at)?.body.extend_from_slice(&bytes);
                if matches!(op, Call) {
                    let outputs = instr.outputs.clone();
                    self.spill(&outputs, &signature.results, at)?;
                }
            }
            JsCall { signature } => {
                let callee = instr.input(0);
                let (index, _) = self.resolve_function(callee, Some(signature), at)?;
                let mut bytes = Vec::new();
                self.load_inputs(instr, 1..instr.inputs.len(), &mut bytes)?;
                bytes.push(0x10);
                leb::encode_u32(&mut bytes, index);
                self.current_mut(at)?.body.extend_from_slice(&bytes);
                let outputs = instr.outputs.clone();
                self.spill(&outputs, &signature.results, at)?;
            }
            CallIndirect { signature } | ReturnCallIndirect { signature } => {
                let table = instr.input(0);
                let table_index = self.resolve_index(EntityKind::Table, table, None, at)?;
                let signature_index = self.signature_index(signature, at)?;
                let mut bytes = Vec::new();
                self.load_inputs(instr, 2..instr.inputs.len(), &mut bytes)?;
                self.load_input(instr, 1, &mut bytes)?;
                bytes.push(if matches!(op, CallIndirect { .. }) { 0x11 } else { 0x13 });
                leb::encode_u32(&mut bytes, signature_index);
                leb::encode_u32(&mut bytes, table_index);
                self.current_mut(at)?.body.extend_from_slice(&bytes);
                if matches!(op, CallIndirect { .. }) {
                    let outputs = instr.outputs.clone();
                    self.spill(&outputs, &signature.results, at)?;
                }
            }
            CallRef { signature } => {
                let signature_index = self.signature_index(signature, at)?;
                let mut bytes = Vec::new();
                self.load_inputs(instr, 1..instr.inputs.len(), &mut bytes)?;
                self.load_input(instr, 0, &mut bytes)?;
                bytes.push(0x14);
                leb::encode_u32(&mut bytes, signature_index);
                self.current_mut(at)?.body.extend_from_slice(&bytes);
                let outputs = instr.outputs.clone();
                self.spill(&outputs, &signature.results, at)?;
            }

            // ----- parametric --------------------------------------------
            Unreachable => self.current_mut(at)?.body.push(0x00),
            Nop => self.current_mut(at)?.body.push(0x01),
            Drop => {
                let mut bytes = Vec::new();
                self.load_input(instr, 0, &mut bytes)?;
                bytes.push(0x1A);
                self.current_mut(at)?.body.extend_from_slice(&bytes);
            }
            Select { ty } => {
                let result_type = match ty {
                    Some(value_type) => *value_type,
                    None => self.value_type_of(instr.input(0), at)?,
                };
                let mut bytes = Vec::new();
                self.load_inputs(instr, 0..3, &mut bytes)?;
                match ty {
                    Some(value_type) => {
                        bytes.push(0x1C);
                        leb::encode_usize(&mut bytes, 1);
                        encode_value_type(&mut bytes, *value_type, &self.type_indices)?;
                    }
                    None => bytes.push(0x1B),
                }
                self.finish_value_instruction(instr, true, bytes, vec![result_type])?;
            }

            // ----- constants and numerics --------------------------------
            Consti32 { value } => {
                let mut bytes = vec![0x41];
                leb::encode_i32(&mut bytes, *value);
                self.finish_value_instruction(instr, true, bytes, vec![ValueType::I32])?;
            }
            Consti64 { value } => {
                let mut bytes = vec![0x42];
                leb::encode_i64(&mut bytes, *value);
                self.finish_value_instruction(instr, true, bytes, vec![ValueType::I64])?;
            }
            Constf32 { value } => {
                let mut bytes = vec![0x43];
                bytes.extend_from_slice(&value.to_le_bytes());
                self.finish_value_instruction(instr, true, bytes, vec![ValueType::F32])?;
            }
            Constf64 { value } => {
                let mut bytes = vec![0x44];
                bytes.extend_from_slice(&value.to_le_bytes());
                self.finish_value_instruction(instr, true, bytes, vec![ValueType::F64])?;
            }
            ConstSimd128 { value } => {
                let mut bytes = vec![0xFD];
                leb::encode_u32(&mut bytes, 0x0C);
                bytes.extend_from_slice(value);
                self.finish_value_instruction(instr, true, bytes, vec![ValueType::V128])?;
            }
            I32Binary { op: binary } => {
                self.simple_numeric(instr, binary.opcode_i32(), ValueType::I32)?;
            }
            I64Binary { op: binary } => {
                self.simple_numeric(instr, binary.opcode_i64(), ValueType::I64)?;
            }
            F32Binary { op: binary } => {
                self.simple_numeric(instr, binary.opcode_f32(), ValueType::F32)?;
            }
            F64Binary { op: binary } => {
                self.simple_numeric(instr, binary.opcode_f64(), ValueType::F64)?;
            }
            I32Compare { op: compare } => {
                self.simple_numeric(instr, compare.opcode_i32(), ValueType::I32)?;
            }
            I64Compare { op: compare } => {
                self.simple_numeric(instr, compare.opcode_i64(), ValueType::I32)?;
            }
            F32Compare { op: compare } => {
                self.simple_numeric(instr, compare.opcode_f32(), ValueType::I32)?;
            }
            F64Compare { op: compare } => {
                self.simple_numeric(instr, compare.opcode_f64(), ValueType::I32)?;
            }
            I32Unary { op: unary } => {
                self.simple_numeric(instr, unary.opcode_i32(), ValueType::I32)?;
            }
            I64Unary { op: unary } => {
                self.simple_numeric(instr, unary.opcode_i64(), ValueType::I64)?;
            }
            F32Unary { op: unary } => {
                self.simple_numeric(instr, unary.opcode_f32(), ValueType::F32)?;
            }
            F64Unary { op: unary } => {
                self.simple_numeric(instr, unary.opcode_f64(), ValueType::F64)?;
            }
            I32Eqz => self.simple_numeric(instr, 0x45, ValueType::I32)?,
            I64Eqz => self.simple_numeric(instr, 0x50, ValueType::I32)?,
            Convert { op: conversion } => {
                let mut bytes = Vec::new();
                self.load_inputs(instr, 0..instr.inputs.len(), &mut bytes)?;
                match conversion.encoding() {
                    crate::fil::wasm_opcodes::NumericEncoding::Single(byte) => bytes.push(byte),
                    crate::fil::wasm_opcodes::NumericEncoding::Prefixed(prefix, sub) => {
                        bytes.push(prefix);
                        leb::encode_u32(&mut bytes, sub);
                    }
                }
                let result = conversion_result_type(*conversion);
                self.finish_value_instruction(instr, true, bytes, vec![result])?;
            }

            // ----- reference types and GC --------------------------------
            RefNull { target } => {
                let heap = self.cast_heap_type(instr, *target)?;
                let mut bytes = vec![0xD0];
                encode_heap_type(&mut bytes, heap, &self.type_indices)?;
                let result = ValueType::Ref(RefType { nullable: true, heap });
                self.finish_value_instruction(instr, true, bytes, vec![result])?;
            }
            RefIsNull => {
                let mut bytes = Vec::new();
                self.load_input(instr, 0, &mut bytes)?;
                bytes.push(0xD1);
                self.finish_value_instruction(instr, true, bytes, vec![ValueType::I32])?;
            }
            RefFunc => {
                let function = instr.input(0);
                let (index, _) = self.resolve_function(function, None, at)?;
                let mut bytes = vec![0xD2];
                leb::encode_u32(&mut bytes, index);
                let result = ValueType::Ref(RefType {
                    nullable: false,
                    heap: HeapType::Func,
                });
                self.finish_value_instruction(instr, true, bytes, vec![result])?;
            }
            RefEq => {
                let mut bytes = Vec::new();
                self.load_inputs(instr, 0..2, &mut bytes)?;
                bytes.push(0xD3);
                self.finish_value_instruction(instr, true, bytes, vec![ValueType::I32])?;
            }
            RefAsNonNull => {
                let result = non_null(self.value_type_of(instr.input(0), at)?);
                let mut bytes = Vec::new();
                self.load_input(instr, 0, &mut bytes)?;
                bytes.push(0xD4);
                self.finish_value_instruction(instr, true, bytes, vec![result])?;
            }
            AnyConvertExtern | ExternConvertAny => {
                let source = self.value_type_of(instr.input(0), at)?;
                let nullable = matches!(source, ValueType::Ref(r) if r.nullable);
                let heap = if matches!(op, AnyConvertExtern) {
                    HeapType::Any
                } else {
                    HeapType::Extern
                };
                let mut bytes = Vec::new();
                self.load_input(instr, 0, &mut bytes)?;
                bytes.push(0xFB);
                leb::encode_u32(
                    &mut bytes,
                    if matches!(op, AnyConvertExtern) { 0x1A } else { 0x1B },
                );
                let result = ValueType::Ref(RefType { nullable, heap });
                self.finish_value_instruction(instr, true, bytes, vec![result])?;
            }
            RefI31 => {
                let mut bytes = Vec::new();
                self.load_input(instr, 0, &mut bytes)?;
                bytes.push(0xFB);
                leb::encode_u32(&mut bytes, 0x1C);
                let result = ValueType::Ref(RefType {
                    nullable: false,
                    heap: HeapType::I31,
                });
                self.finish_value_instruction(instr, true, bytes, vec![result])?;
            }
            I31Get { signed } => {
                let mut bytes = Vec::new();
                self.load_input(instr, 0, &mut bytes)?;
                bytes.push(0xFB);
                leb::encode_u32(&mut bytes, if *signed { 0x1D } else { 0x1E });
                self.finish_value_instruction(instr, true, bytes, vec![ValueType::I32])?;
            }
            StructNew | StructNewDefault => {
                let id = self.type_def_input(instr, 0)?;
                let type_index = self.type_index_of(id, at)?;
                let mut bytes = Vec::new();
                self.load_inputs(instr, 1..instr.inputs.len(), &mut bytes)?;
                bytes.push(0xFB);
                leb::encode_u32(&mut bytes, if matches!(op, StructNew) { 0x00 } else { 0x01 });
                leb::encode_u32(&mut bytes, type_index);
                let result = ValueType::Ref(RefType {
                    nullable: false,
                    heap: HeapType::Index(id),
                });
                self.finish_value_instruction(instr, true, bytes, vec![result])?;
            }
            StructGet { field_index, mode } => {
                let id = self.type_def_input(instr, 0)?;
                let type_index = self.type_index_of(id, at)?;
                let field = self.struct_field(id, *field_index, at)?;
                let mut bytes = Vec::new();
                self.load_input(instr, 1, &mut bytes)?;
                bytes.push(0xFB);
                leb::encode_u32(
                    &mut bytes,
                    match mode {
                        GcGetMode::Plain => 0x02,
                        GcGetMode::Signed => 0x03,
                        GcGetMode::Unsigned => 0x04,
                    },
                );
                leb::encode_u32(&mut bytes, type_index);
                leb::encode_u32(&mut bytes, *field_index);
                let result = storage_result_type(field);
                self.finish_value_instruction(instr, true, bytes, vec![result])?;
            }
            StructSet { field_index } => {
                let id = self.type_def_input(instr, 0)?;
                let type_index = self.type_index_of(id, at)?;
                let mut bytes = Vec::new();
                self.load_inputs(instr, 1..3, &mut bytes)?;
                bytes.push(0xFB);
                leb::encode_u32(&mut bytes, 0x05);
                leb::encode_u32(&mut bytes, type_index);
                leb::encode_u32(&mut bytes, *field_index);
                self.current_mut(at)?.body.extend_from_slice(&bytes);
            }
            ArrayNewFixed => {
                let id = self.type_def_input(instr, 0)?;
                let type_index = self.type_index_of(id, at)?;
                let element_count = instr.inputs.len() - 1;
                let mut bytes = Vec::new();
                self.load_inputs(instr, 1..instr.inputs.len(), &mut bytes)?;
                bytes.push(0xFB);
                leb::encode_u32(&mut bytes, 0x08);
                leb::encode_u32(&mut bytes, type_index);
                leb::encode_usize(&mut bytes, element_count);
                let result = ValueType::Ref(RefType {
                    nullable: false,
                    heap: HeapType::Index(id),
                });
                self.finish_value_instruction(instr, true, bytes, vec![result])?;
            }
            ArrayNewDefault => {
                let id = self.type_def_input(instr, 0)?;
                let type_index = self.type_index_of(id, at)?;
                let mut bytes = Vec::new();
                self.load_input(instr, 1, &mut bytes)?;
                bytes.push(0xFB);
                leb::encode_u32(&mut bytes, 0x07);
                leb::encode_u32(&mut bytes, type_index);
                let result = ValueType::Ref(RefType {
                    nullable: false,
                    heap: HeapType::Index(id),
                });
                self.finish_value_instruction(instr, true, bytes, vec![result])?;
            }
            ArrayGet { mode } => {
                let id = self.type_def_input(instr, 0)?;
                let type_index = self.type_index_of(id, at)?;
                let element = self.array_element(id, at)?;
                let mut bytes = Vec::new();
                self.load_inputs(instr, 1..3, &mut bytes)?;
                bytes.push(0xFB);
                leb::encode_u32(
                    &mut bytes,
                    match mode {
                        GcGetMode::Plain => 0x0B,
                        GcGetMode::Signed => 0x0C,
                        GcGetMode::Unsigned => 0x0D,
                    },
                );
                leb::encode_u32(&mut bytes, type_index);
                let result = storage_result_type(element);
                self.finish_value_instruction(instr, true, bytes, vec![result])?;
            }
            ArraySet => {
                let id = self.type_def_input(instr, 0)?;
                let type_index = self.type_index_of(id, at)?;
                let mut bytes = Vec::new();
                self.load_inputs(instr, 1..4, &mut bytes)?;
                bytes.push(0xFB);
                leb::encode_u32(&mut bytes, 0x0E);
                leb::encode_u32(&mut bytes, type_index);
                self.current_mut(at)?.body.extend_from_slice(&bytes);
            }
            ArrayLen => {
                let mut bytes = Vec::new();
                self.load_input(instr, 0, &mut bytes)?;
                bytes.push(0xFB);
                leb::encode_u32(&mut bytes, 0x0F);
                self.finish_value_instruction(instr, true, bytes, vec![ValueType::I32])?;
            }
            RefTest { target, nullable } => {
                let heap = self.cast_heap_type(instr, *target)?;
                let mut bytes = Vec::new();
                self.load_input(instr, 0, &mut bytes)?;
                bytes.push(0xFB);
                leb::encode_u32(&mut bytes, if *nullable { 0x15 } else { 0x14 });
                encode_heap_type(&mut bytes, heap, &self.type_indices)?;
                self.finish_value_instruction(instr, true, bytes, vec![ValueType::I32])?;
            }
            RefCast { target, nullable } => {
                let heap = self.cast_heap_type(instr, *target)?;
                let mut bytes = Vec::new();
                self.load_input(instr, 0, &mut bytes)?;
                bytes.push(0xFB);
                leb::encode_u32(&mut bytes, if *nullable { 0x17 } else { 0x16 });
                encode_heap_type(&mut bytes, heap, &self.type_indices)?;
                let result = ValueType::Ref(RefType {
                    nullable: *nullable,
                    heap,
                });
                self.finish_value_instruction(instr, false, bytes, vec![result])?;
            }

            // ----- globals -----------------------------------------------
            GlobalGet => {
                let global = instr.input(0);
                let index = self.resolve_index(EntityKind::Global, global, None, at)?;
                let JsType::WasmGlobal { value_type, .. } = self.typer.type_of(global) else {
                    return Err(LiftError::missing_type_information(format!(
                        "{} is not a global", global
                    ))
                    .at(at));
                };
                let result = *value_type;
                let mut bytes = vec![0x23];
                leb::encode_u32(&mut bytes, index);
                self.finish_value_instruction(instr, true, bytes, vec![result])?;
            }
            GlobalSet => {
                let global = instr.input(0);
                let index = self.resolve_index(EntityKind::Global, global, None, at)?;
                let mut bytes = Vec::new();
                self.load_input(instr, 1, &mut bytes)?;
                bytes.push(0x24);
                leb::encode_u32(&mut bytes, index);
                self.current_mut(at)?.body.extend_from_slice(&bytes);
            }
            Reassign => {
                // Resolves its destination itself: a local slot when the
                // destination was spilled in this function, a global index
                // otherwise.
                let destination = instr.input(0);
                let local_slot = self
                    .current
                    .as_ref()
                    .and_then(|function| function.local_slot(destination));
                let mut bytes = Vec::new();
                self.load_input(instr, 1, &mut bytes)?;
                match local_slot {
                    Some(slot) => {
                        bytes.push(0x21);
                        leb::encode_u32(&mut bytes, slot);
                    }
                    None => {
                        let index =
                            self.resolve_index(EntityKind::Global, destination, None, at)?;
                        bytes.push(0x24);
                        leb::encode_u32(&mut bytes, index);
                    }
                }
                self.current_mut(at)?.body.extend_from_slice(&bytes);
            }

            // ----- memories ----------------------------------------------
            MemoryLoad { kind, offset } => {
                let memory = self.resolve_index(EntityKind::Memory, instr.input(0), None, at)?;
                let mut bytes = Vec::new();
                self.load_input(instr, 1, &mut bytes)?;
                bytes.push(kind.opcode());
                Self::encode_mem_arg(&mut bytes, kind.natural_alignment_log2(), *offset, memory);
                let result = load_result_type(*kind);
                self.finish_value_instruction(instr, true, bytes, vec![result])?;
            }
            MemoryStore { kind, offset } => {
                let memory = self.resolve_index(EntityKind::Memory, instr.input(0), None, at)?;
                let mut bytes = Vec::new();
                self.load_inputs(instr, 1..3, &mut bytes)?;
                bytes.push(kind.opcode());
                Self::encode_mem_arg(&mut bytes, kind.natural_alignment_log2(), *offset, memory);
                self.current_mut(at)?.body.extend_from_slice(&bytes);
            }
            MemorySize => {
                let memory = self.resolve_index(EntityKind::Memory, instr.input(0), None, at)?;
                let mut bytes = vec![0x3F];
                leb::encode_u32(&mut bytes, memory);
                self.finish_value_instruction(instr, true, bytes, vec![ValueType::I32])?;
            }
            MemoryGrow => {
                let memory = self.resolve_index(EntityKind::Memory, instr.input(0), None, at)?;
                let mut bytes = Vec::new();
                self.load_input(instr, 1, &mut bytes)?;
                bytes.push(0x40);
                leb::encode_u32(&mut bytes, memory);
                self.finish_value_instruction(instr, false, bytes, vec![ValueType::I32])?;
            }
            MemoryFill => {
                let memory = self.resolve_index(EntityKind::Memory, instr.input(0), None, at)?;
                let mut bytes = Vec::new();
                self.load_inputs(instr, 1..4, &mut bytes)?;
                bytes.push(0xFC);
                leb::encode_u32(&mut bytes, 11);
                leb::encode_u32(&mut bytes, memory);
                self.current_mut(at)?.body.extend_from_slice(&bytes);
            }
            MemoryCopy => {
                let destination =
                    self.resolve_index(EntityKind::Memory, instr.input(0), None, at)?;
                let source = self.resolve_index(EntityKind::Memory, instr.input(1), None, at)?;
                let mut bytes = Vec::new();
                self.load_inputs(instr, 2..5, &mut bytes)?;
                bytes.push(0xFC);
                leb::encode_u32(&mut bytes, 10);
                leb::encode_u32(&mut bytes, destination);
                leb::encode_u32(&mut bytes, source);
                self.current_mut(at)?.body.extend_from_slice(&bytes);
            }
            MemoryInit => {
                let memory = self.resolve_index(EntityKind::Memory, instr.input(0), None, at)?;
                let segment = self.data_segment_index(instr.input(1), at)?;
                let mut bytes = Vec::new();
                self.load_inputs(instr, 2..5, &mut bytes)?;
                bytes.push(0xFC);
                leb::encode_u32(&mut bytes, 8);
                leb::encode_u32(&mut bytes, segment);
                leb::encode_u32(&mut bytes, memory);
                self.current_mut(at)?.body.extend_from_slice(&bytes);
            }
            DataDrop => {
                let segment = self.data_segment_index(instr.input(0), at)?;
                let mut bytes = vec![0xFC];
                leb::encode_u32(&mut bytes, 9);
                leb::encode_u32(&mut bytes, segment);
                self.current_mut(at)?.body.extend_from_slice(&bytes);
            }
            AtomicLoad { kind, offset } => {
                let memory = self.resolve_index(EntityKind::Memory, instr.input(0), None, at)?;
                let mut bytes = Vec::new();
                self.load_input(instr, 1, &mut bytes)?;
                bytes.push(0xFE);
                leb::encode_u32(&mut bytes, kind.sub_opcode());
                Self::encode_mem_arg(&mut bytes, kind.width.alignment_log2(), *offset, memory);
                let result = atomic_width_type(kind.width);
                self.finish_value_instruction(instr, false, bytes, vec![result])?;
            }
            AtomicStore { kind, offset } => {
                let memory = self.resolve_index(EntityKind::Memory, instr.input(0), None, at)?;
                let mut bytes = Vec::new();
                self.load_inputs(instr, 1..3, &mut bytes)?;
                bytes.push(0xFE);
                leb::encode_u32(&mut bytes, kind.sub_opcode());
                Self::encode_mem_arg(&mut bytes, kind.width.alignment_log2(), *offset, memory);
                self.current_mut(at)?.body.extend_from_slice(&bytes);
            }
            AtomicRmw { op: rmw, width, offset } => {
                let memory = self.resolve_index(EntityKind::Memory, instr.input(0), None, at)?;
                let mut bytes = Vec::new();
                self.load_inputs(instr, 1..instr.inputs.len(), &mut bytes)?;
                bytes.push(0xFE);
                leb::encode_u32(&mut bytes, rmw.sub_opcode(*width));
                Self::encode_mem_arg(&mut bytes, width.alignment_log2(), *offset, memory);
                let result = atomic_width_type(*width);
                self.finish_value_instruction(instr, false, bytes, vec![result])?;
            }
            AtomicFence => {
                let function = self.current_mut(at)?;
                function.body.push(0xFE);
                leb::encode_u32(&mut function.body, 0x03);
                function.body.push(0x00);
            }

            // ----- tables ------------------------------------------------
            TableGet => {
                let table = instr.input(0);
                let index = self.resolve_index(EntityKind::Table, table, None, at)?;
                let JsType::WasmTable { element, .. } = self.typer.type_of(table) else {
                    return Err(LiftError::missing_type_information(format!(
                        "{} is not a table", table
                    ))
                    .at(at));
                };
                let result = element.value_type();
                let mut bytes = Vec::new();
                self.load_input(instr, 1, &mut bytes)?;
                bytes.push(0x25);
                leb::encode_u32(&mut bytes, index);
                self.finish_value_instruction(instr, false, bytes, vec![result])?;
            }
            TableSet => {
                let index = self.resolve_index(EntityKind::Table, instr.input(0), None, at)?;
                let mut bytes = Vec::new();
                self.load_inputs(instr, 1..3, &mut bytes)?;
                bytes.push(0x26);
                leb::encode_u32(&mut bytes, index);
                self.current_mut(at)?.body.extend_from_slice(&bytes);
            }
            TableSize => {
                let index = self.resolve_index(EntityKind::Table, instr.input(0), None, at)?;
                let mut bytes = vec![0xFC];
                leb::encode_u32(&mut bytes, 16);
                leb::encode_u32(&mut bytes, index);
                self.finish_value_instruction(instr, true, bytes, vec![ValueType::I32])?;
            }
            TableGrow => {
                let index = self.resolve_index(EntityKind::Table, instr.input(0), None, at)?;
                let mut bytes = Vec::new();
                self.load_inputs(instr, 1..3, &mut bytes)?;
                bytes.push(0xFC);
                leb::encode_u32(&mut bytes, 15);
                leb::encode_u32(&mut bytes, index);
                self.finish_value_instruction(instr, false, bytes, vec![ValueType::I32])?;
            }
            TableFill => {
                let index = self.resolve_index(EntityKind::Table, instr.input(0), None, at)?;
                let mut bytes = Vec::new();
                self.load_inputs(instr, 1..4, &mut bytes)?;
                bytes.push(0xFC);
                leb::encode_u32(&mut bytes, 17);
                leb::encode_u32(&mut bytes, index);
                self.current_mut(at)?.body.extend_from_slice(&bytes);
            }
            TableInit => {
                let table = self.resolve_index(EntityKind::Table, instr.input(0), None, at)?;
                let segment = self.element_segment_index(instr.input(1), at)?;
                let mut bytes = Vec::new();
                self.load_inputs(instr, 2..5, &mut bytes)?;
                bytes.push(0xFC);
                leb::encode_u32(&mut bytes, 12);
                leb::encode_u32(&mut bytes, segment);
                leb::encode_u32(&mut bytes, table);
                self.current_mut(at)?.body.extend_from_slice(&bytes);
            }
            ElemDrop => {
                let segment = self.element_segment_index(instr.input(0), at)?;
                let mut bytes = vec![0xFC];
                leb::encode_u32(&mut bytes, 13);
                leb::encode_u32(&mut bytes, segment);
                self.current_mut(at)?.body.extend_from_slice(&bytes);
            }

            // ----- SIMD --------------------------------------------------
            SimdSplat { kind } => {
                let mut bytes = Vec::new();
                self.load_input(instr, 0, &mut bytes)?;
                bytes.push(0xFD);
                leb::encode_u32(&mut bytes, kind.splat_sub_opcode());
                self.finish_value_instruction(instr, true, bytes, vec![ValueType::V128])?;
            }
            SimdExtractLane { kind, lane, signed } => {
                let mut bytes = Vec::new();
                self.load_input(instr, 0, &mut bytes)?;
                bytes.push(0xFD);
                leb::encode_u32(&mut bytes, kind.extract_sub_opcode(*signed));
                bytes.push(*lane);
                let result = lane_scalar_type(*kind);
                self.finish_value_instruction(instr, true, bytes, vec![result])?;
            }
            SimdReplaceLane { kind, lane } => {
                let mut bytes = Vec::new();
                self.load_inputs(instr, 0..2, &mut bytes)?;
                bytes.push(0xFD);
                leb::encode_u32(&mut bytes, kind.replace_sub_opcode());
                bytes.push(*lane);
                self.finish_value_instruction(instr, true, bytes, vec![ValueType::V128])?;
            }
            SimdBinary { op: simd } => {
                let mut bytes = Vec::new();
                self.load_inputs(instr, 0..2, &mut bytes)?;
                bytes.push(0xFD);
                leb::encode_u32(&mut bytes, simd.sub_opcode());
                self.finish_value_instruction(instr, true, bytes, vec![ValueType::V128])?;
            }
            SimdLoad { offset } => {
                let memory = self.resolve_index(EntityKind::Memory, instr.input(0), None, at)?;
                let mut bytes = Vec::new();
                self.load_input(instr, 1, &mut bytes)?;
                bytes.push(0xFD);
                leb::encode_u32(&mut bytes, 0x00);
                Self::encode_mem_arg(&mut bytes, 4, *offset, memory);
                self.finish_value_instruction(instr, true, bytes, vec![ValueType::V128])?;
            }
            SimdStore { offset } => {
                let memory = self.resolve_index(EntityKind::Memory, instr.input(0), None, at)?;
                let mut bytes = Vec::new();
                self.load_inputs(instr, 1..3, &mut bytes)?;
                bytes.push(0xFD);
                leb::encode_u32(&mut bytes, 0x0B);
                Self::encode_mem_arg(&mut bytes, 4, *offset, memory);
                self.current_mut(at)?.body.extend_from_slice(&bytes);
            }
        }
        Ok(())
    }

    fn simple_numeric(
        &mut self,
        instr: &Instruction,
        opcode: u8,
        result: ValueType,
    ) -> Result<(), LiftError> {
        let mut bytes = Vec::new();
        self.load_inputs(instr, 0..instr.inputs.len(), &mut bytes)?;
        bytes.push(opcode);
        self.finish_value_instruction(instr, true, bytes, vec![result])
    }

    fn struct_field(
        &self,
        id: TypeDefId,
        field_index: u32,
        at: usize,
    ) -> Result<StorageType, LiftError> {
        match &self.typer.type_desc(id).kind {
            TypeDescKind::Struct(fields) => fields
                .get(field_index as usize)
                .map(|field| field.storage)
                .ok_or_else(|| {
                    LiftError::invalid_input(format!(
                        "struct {:?} has no field {}",
                        id, field_index
                    ))
                    .at(at)
                }),
            _ => Err(LiftError::invalid_input(format!("{:?} is not a struct", id)).at(at)),
        }
    }

    fn array_element(&self, id: TypeDefId, at: usize) -> Result<StorageType, LiftError> {
        match &self.typer.type_desc(id).kind {
            TypeDescKind::Array(field) => Ok(field.storage),
            _ => Err(LiftError::invalid_input(format!("{:?} is not an array", id)).at(at)),
        }
    }

    // ------------------------------------------------------------------
    // Pass 4: section assembly
    // ------------------------------------------------------------------

    fn assemble(self) -> Result<WasmLiftResult, LiftError> {
        let mut builder = ModuleBuilder::new();

        // Type section: referenced groups in ascending order, then the
        // standalone signatures.
        for &group in &self.group_closure {
            let members = self.typer.group_members(group);
            let mut entry = vec![0x4E];
            leb::encode_usize(&mut entry, members.len());
            for &member in members {
                self.encode_type_definition(&mut entry, member)?;
            }
            builder.add_type_entry(entry);
        }
        for signature in &self.signature_order {
            let mut entry = Vec::new();
            self.encode_signature_definition(&mut entry, signature)?;
            builder.add_type_entry(entry);
        }

        // Imports, with their generated names.
        let mut name_counters = NameCounters::default();
        let mut import_bindings = Vec::new();
        for entity in &self.entities {
            let ModuleEntity::Import(entry) = entity else {
                continue;
            };
            let name = name_counters.import_name(entry.kind);
            let mut bytes = Vec::new();
            crate::wasm::module_builder::encode_name(&mut bytes, "imports");
            crate::wasm::module_builder::encode_name(&mut bytes, &name);
            self.encode_import_desc(&mut bytes, entry)?;
            builder.add_import(bytes);
            import_bindings.push(ImportBinding {
                name,
                variable: entry.variable,
            });
        }

        // Function section.
        for (_, _, signature) in &self.function_metas {
            let index = self.signature_index(signature, 0)?;
            builder.add_function(index);
        }

        // Defined tables, memories, tags and globals.
        for entity in &self.entities {
            match entity {
                ModuleEntity::Table { instr, .. } => {
                    let Op::Wasm(WasmOp::DefineTable { element, limits }) = &self.code[*instr].op
                    else {
                        return_fatal_error!(*instr; "table entity without a table definition");
                    };
                    let mut bytes = Vec::new();
                    encode_ref_type(
                        &mut bytes,
                        match element.value_type() {
                            ValueType::Ref(ref_type) => ref_type,
                            _ => unreachable!("table elements are references"),
                        },
                        &self.type_indices,
                    )?;
                    encode_limits(&mut bytes, *limits, false)?;
                    builder.add_table(bytes);
                }
                ModuleEntity::Memory { instr, .. } => {
                    let Op::Wasm(WasmOp::DefineMemory { limits, shared }) = &self.code[*instr].op
                    else {
                        return_fatal_error!(*instr; "memory entity without a memory definition");
                    };
                    let mut bytes = Vec::new();
                    encode_limits(&mut bytes, *limits, *shared)?;
                    builder.add_memory(bytes);
                }
                ModuleEntity::Tag { instr, .. } => {
                    let Op::Wasm(WasmOp::DefineTag { parameters }) = &self.code[*instr].op else {
                        return_fatal_error!(*instr; "tag entity without a tag definition");
                    };
                    let signature = Signature::new(parameters.clone(), Vec::new());
                    let mut bytes = vec![0x00];
                    leb::encode_u32(&mut bytes, self.signature_index(&signature, *instr)?);
                    builder.add_tag(bytes);
                }
                ModuleEntity::Global { instr, .. } => {
                    let Op::Wasm(WasmOp::DefineGlobal { value, mutable }) = &self.code[*instr].op
                    else {
                        return_fatal_error!(*instr; "global entity without a global definition");
                    };
                    let mut bytes = Vec::new();
                    encode_value_type(&mut bytes, value.value_type(), &self.type_indices)?;
                    bytes.push(u8::from(*mutable));
                    self.encode_global_init(&mut bytes, *value)?;
                    builder.add_global(bytes);
                }
                _ => {}
            }
        }

        // Exports: grouped by kind, re-exported imports before defined
        // entities, functions first.
        let mut entity_bindings = Vec::new();
        self.add_exports(&mut builder, &mut entity_bindings)?;

        // Element segments, passive first.
        for &instr in &self.passive_element_segments {
            builder.add_element_segment(self.encode_element_segment(instr, None)?);
        }
        for &instr in &self.active_element_segments {
            let Op::Wasm(WasmOp::DefineElementSegment { offset: Some(offset) }) =
                &self.code[instr].op
            else {
                return_fatal_error!(instr; "active element segment without an offset");
            };
            builder.add_element_segment(self.encode_element_segment(instr, Some(*offset))?);
        }

        // Branch hints, when any function recorded them.
        let hinted: Vec<(usize, &FunctionInfo)> = self
            .functions
            .iter()
            .enumerate()
            .filter(|(_, function)| !function.branch_hints.is_empty())
            .collect();
        if !hinted.is_empty() {
            let import_function_count = self.import_count(EntityKind::Function);
            let mut payload = Vec::new();
            leb::encode_usize(&mut payload, hinted.len());
            for (ordinal, function) in hinted {
                leb::encode_usize(&mut payload, import_function_count + ordinal);
                leb::encode_usize(&mut payload, function.branch_hints.len());
                for (hint, offset) in &function.branch_hints {
                    leb::encode_usize(&mut payload, *offset);
                    payload.push(0x01);
                    payload.push(hint.encoding_byte());
                }
            }
            builder.set_branch_hints(payload);
        }

        // Code section.
        for function in &self.functions {
            let mut body = Vec::new();
            encode_locals(
                &mut body,
                &function.locals[function.signature.params.len()..],
                &self.type_indices,
            )?;
            body.extend_from_slice(&function.body);
            body.push(0x0B);
            builder.add_code_entry(body);
        }

        // Data segments.
        for &instr in &self.data_segments {
            let Op::Wasm(WasmOp::DefineDataSegment { bytes }) = &self.code[instr].op else {
                return_fatal_error!(instr; "data segment entity without a definition");
            };
            builder.add_data_segment(bytes);
        }

        Ok(WasmLiftResult {
            bytes: builder.finish(),
            imports: import_bindings,
            entity_bindings,
        })
    }

    fn import_count(&self, space: EntityKind) -> usize {
        self.entities
            .iter()
            .filter(|entity| {
                matches!(entity, ModuleEntity::Import(entry)
                    if entry.kind.index_space() == space.index_space())
            })
            .count()
    }

    fn encode_type_definition(&self, out: &mut Vec<u8>, id: TypeDefId) -> Result<(), LiftError> {
        match &self.typer.type_desc(id).kind {
            TypeDescKind::Array(field) => {
                out.push(0x5E);
                encode_field_desc(out, *field, &self.type_indices)?;
            }
            TypeDescKind::Struct(fields) => {
                out.push(0x5F);
                leb::encode_usize(out, fields.len());
                for field in fields {
                    encode_field_desc(out, *field, &self.type_indices)?;
                }
            }
            TypeDescKind::Func(signature) => {
                self.encode_signature_definition(out, signature)?;
            }
            TypeDescKind::Forward { .. } => {
                return Err(LiftError::missing_type_information(
                    "forward placeholder cannot be emitted as a type definition",
                ));
            }
        }
        Ok(())
    }

    fn encode_signature_definition(
        &self,
        out: &mut Vec<u8>,
        signature: &Signature,
    ) -> Result<(), LiftError> {
        out.push(0x60);
        leb::encode_usize(out, signature.params.len());
        for &param in &signature.params {
            encode_value_type(out, param, &self.type_indices)?;
        }
        leb::encode_usize(out, signature.results.len());
        for &result in &signature.results {
            encode_value_type(out, result, &self.type_indices)?;
        }
        Ok(())
    }

    fn encode_import_desc(&self, out: &mut Vec<u8>, entry: &ImportEntry) -> Result<(), LiftError> {
        match entry.kind {
            EntityKind::Function | EntityKind::SuspendingObject => {
                let signature = entry.signature.as_ref().ok_or_else(|| {
                    LiftError::missing_type_information(format!(
                        "function import {} has no signature",
                        entry.variable
                    ))
                })?;
                out.push(0x00);
                leb::encode_u32(out, self.signature_index(signature, 0)?);
            }
            EntityKind::Table => {
                let JsType::WasmTable { element, limits } = self.typer.type_of(entry.variable)
                else {
                    return Err(LiftError::failed_retrieval(format!(
                        "table import binding for {} is gone",
                        entry.variable
                    )));
                };
                out.push(0x01);
                match element.value_type() {
                    ValueType::Ref(ref_type) => {
                        encode_ref_type(out, ref_type, &self.type_indices)?;
                    }
                    _ => unreachable!("table elements are references"),
                }
                encode_limits(out, *limits, false)?;
            }
            EntityKind::Memory => {
                let JsType::WasmMemory { limits, shared } = self.typer.type_of(entry.variable)
                else {
                    return Err(LiftError::failed_retrieval(format!(
                        "memory import binding for {} is gone",
                        entry.variable
                    )));
                };
                out.push(0x02);
                encode_limits(out, *limits, *shared)?;
            }
            EntityKind::Global => {
                let JsType::WasmGlobal { value_type, mutable } =
                    self.typer.type_of(entry.variable)
                else {
                    return Err(LiftError::failed_retrieval(format!(
                        "global import binding for {} is gone",
                        entry.variable
                    )));
                };
                out.push(0x03);
                encode_value_type(out, *value_type, &self.type_indices)?;
                out.push(u8::from(*mutable));
            }
            EntityKind::Tag => {
                let signature = entry.signature.as_ref().ok_or_else(|| {
                    LiftError::missing_type_information(format!(
                        "tag import {} has no signature",
                        entry.variable
                    ))
                })?;
                out.push(0x04);
                out.push(0x00);
                leb::encode_u32(out, self.signature_index(signature, 0)?);
            }
        }
        Ok(())
    }

    fn encode_global_init(
        &self,
        out: &mut Vec<u8>,
        value: crate::wasm::types::WasmGlobalValue,
    ) -> Result<(), LiftError> {
        use crate::wasm::types::WasmGlobalValue;
        match value {
            WasmGlobalValue::I32(v) => {
                out.push(0x41);
                leb::encode_i32(out, v);
            }
            WasmGlobalValue::I64(v) => {
                out.push(0x42);
                leb::encode_i64(out, v);
            }
            WasmGlobalValue::F32(v) => {
                out.push(0x43);
                out.extend_from_slice(&v.to_le_bytes());
            }
            WasmGlobalValue::F64(v) => {
                out.push(0x44);
                out.extend_from_slice(&v.to_le_bytes());
            }
            WasmGlobalValue::RefNull(heap) => {
                out.push(0xD0);
                encode_heap_type(out, heap, &self.type_indices)?;
            }
        }
        out.push(0x0B);
        Ok(())
    }

    fn encode_element_segment(
        &self,
        instr: usize,
        offset: Option<u32>,
    ) -> Result<Vec<u8>, LiftError> {
        let instruction = &self.code[instr];
        let mut bytes = Vec::new();
        let function_inputs: &[Variable];
        match offset {
            Some(offset) => {
                let table = self.resolve_index(EntityKind::Table, instruction.input(0), None, instr)?;
                bytes.push(0x02);
                leb::encode_u32(&mut bytes, table);
                bytes.push(0x41);
                leb::encode_i64(&mut bytes, i64::from(offset));
                bytes.push(0x0B);
                bytes.push(0x00);
                function_inputs = &instruction.inputs[1..];
            }
            None => {
                bytes.push(0x01);
                bytes.push(0x00);
                function_inputs = &instruction.inputs[..];
            }
        }
        leb::encode_usize(&mut bytes, function_inputs.len());
        for &function in function_inputs {
            let (index, _) = self.resolve_function(function, None, instr)?;
            leb::encode_u32(&mut bytes, index);
        }
        Ok(bytes)
    }

    fn add_exports(
        &self,
        builder: &mut ModuleBuilder,
        entity_bindings: &mut Vec<(Variable, String)>,
    ) -> Result<(), LiftError> {
        let kinds: [(EntityKind, &str, u8); 5] = [
            (EntityKind::Function, "w", 0x00),
            (EntityKind::Global, "wg", 0x03),
            (EntityKind::Table, "wt", 0x01),
            (EntityKind::Memory, "wm", 0x02),
            (EntityKind::Tag, "wex", 0x04),
        ];
        for (kind, prefix, kind_byte) in kinds {
            let mut index = 0u32;
            // Re-exported imports first: they occupy the low indices.
            for entity in &self.entities {
                if let ModuleEntity::Import(entry) = entity {
                    if entry.kind.index_space() != kind {
                        continue;
                    }
                    builder.add_export(&format!("i{}{}", prefix, index), kind_byte, index);
                    index += 1;
                }
            }
            for entity in &self.entities {
                let variable = match (entity, kind) {
                    (ModuleEntity::Function { ordinal }, EntityKind::Function) => {
                        self.function_metas[*ordinal].1
                    }
                    (ModuleEntity::Global { variable, .. }, EntityKind::Global) => *variable,
                    (ModuleEntity::Table { variable, .. }, EntityKind::Table) => *variable,
                    (ModuleEntity::Memory { variable, .. }, EntityKind::Memory) => *variable,
                    (ModuleEntity::Tag { variable, .. }, EntityKind::Tag) => *variable,
                    _ => continue,
                };
                let name = format!("{}{}", prefix, index);
                builder.add_export(&name, kind_byte, index);
                entity_bindings.push((variable, name));
                index += 1;
            }
        }
        Ok(())
    }
}

/// Per-kind counters for import names. Imports carry the same prefixes as
/// exports with an extra leading `i`.
#[derive(Default)]
struct NameCounters {
    functions: u32,
    globals: u32,
    tables: u32,
    memories: u32,
    tags: u32,
}

impl NameCounters {
    fn import_name(&mut self, kind: EntityKind) -> String {
        let (prefix, counter) = match kind.index_space() {
            EntityKind::Function => ("iw", &mut self.functions),
            EntityKind::Global => ("iwg", &mut self.globals),
            EntityKind::Table => ("iwt", &mut self.tables),
            EntityKind::Memory => ("iwm", &mut self.memories),
            EntityKind::Tag => ("iwex", &mut self.tags),
            EntityKind::SuspendingObject => unreachable!("mapped to the function space"),
        };
        let name = format!("{}{}", prefix, *counter);
        *counter += 1;
        name
    }
}

/// Local declarations: runs of identical types, compressed.
fn encode_locals(
    out: &mut Vec<u8>,
    locals: &[(Variable, ValueType)],
    indices: &TypeIndexMap,
) -> Result<(), LiftError> {
    let mut runs: Vec<(u32, ValueType)> = Vec::new();
    for (_, value_type) in locals {
        match runs.last_mut() {
            Some((count, ty)) if ty == value_type => *count += 1,
            _ => runs.push((1, *value_type)),
        }
    }
    leb::encode_usize(out, runs.len());
    for (count, value_type) in runs {
        leb::encode_u32(out, count);
        encode_value_type(out, value_type, indices)?;
    }
    Ok(())
}

fn non_null(value_type: ValueType) -> ValueType {
    match value_type {
        ValueType::Ref(ref_type) => ValueType::Ref(RefType {
            nullable: false,
            heap: ref_type.heap,
        }),
        other => other,
    }
}

fn storage_result_type(storage: StorageType) -> ValueType {
    match storage {
        StorageType::I8 | StorageType::I16 => ValueType::I32,
        StorageType::Val(value_type) => value_type,
    }
}

fn atomic_width_type(width: crate::fil::wasm_opcodes::AtomicWidth) -> ValueType {
    use crate::fil::wasm_opcodes::AtomicWidth::*;
    match width {
        I32 | I32As8U | I32As16U => ValueType::I32,
        I64 | I64As8U | I64As16U | I64As32U => ValueType::I64,
    }
}

fn load_result_type(kind: crate::fil::wasm_opcodes::MemoryLoadKind) -> ValueType {
    use crate::fil::wasm_opcodes::MemoryLoadKind::*;
    match kind {
        I32Load | I32Load8S | I32Load8U | I32Load16S | I32Load16U => ValueType::I32,
        I64Load | I64Load8S | I64Load8U | I64Load16S | I64Load16U | I64Load32S | I64Load32U => {
            ValueType::I64
        }
        F32Load => ValueType::F32,
        F64Load => ValueType::F64,
    }
}

fn lane_scalar_type(kind: crate::fil::wasm_opcodes::SimdLaneKind) -> ValueType {
    use crate::fil::wasm_opcodes::SimdLaneKind::*;
    match kind {
        I8x16 | I16x8 | I32x4 => ValueType::I32,
        I64x2 => ValueType::I64,
        F32x4 => ValueType::F32,
        F64x2 => ValueType::F64,
    }
}

fn conversion_result_type(op: ConversionOp) -> ValueType {
    use ConversionOp::*;
    match op {
        I32WrapI64 | I32TruncF32S | I32TruncF32U | I32TruncF64S | I32TruncF64U
        | I32ReinterpretF32 | I32Extend8S | I32Extend16S | I32TruncSatF32S | I32TruncSatF32U
        | I32TruncSatF64S | I32TruncSatF64U => ValueType::I32,
        I64ExtendI32S | I64ExtendI32U | I64TruncF32S | I64TruncF32U | I64TruncF64S
        | I64TruncF64U | I64ReinterpretF64 | I64Extend8S | I64Extend16S | I64Extend32S
        | I64TruncSatF32S | I64TruncSatF32U | I64TruncSatF64S | I64TruncSatF64U => ValueType::I64,
        F32ConvertI32S | F32ConvertI32U | F32ConvertI64S | F32ConvertI64U | F32DemoteF64
        | F32ReinterpretI32 => ValueType::F32,
        F64ConvertI32S | F64ConvertI32U | F64ConvertI64S | F64ConvertI64U | F64PromoteF32
        | F64ReinterpretI64 => ValueType::F64,
    }
}
