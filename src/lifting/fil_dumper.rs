//! Flat textual dumper for FIL programs.
//!
//! Emits one line per instruction in the form
//! `<outputs> <- <OpcodeName> <field>, <field>, [<variadic>]`, with inputs
//! rendered as `v<n>`, inline strings quoted, and nested blocks indented.
//! The dumper is purely observational: it round-trips no state and is safe
//! to call on any structurally sound program.

use crate::fil::opcodes::{FilField, FilStorage, Op};
use crate::fil::wasm_opcodes::{CastTarget, CatchKind, WasmOp};
use crate::fil::{Code, Instruction, Program};
use crate::lifting::script_writer::{ScriptWriter, ScriptWriterConfig};
use crate::wasm::types::{
    HeapType, Limits, RefType, Signature, ValueType, WasmGlobalValue,
};

/// Dumps FIL programs as human-readable text.
pub struct FilDumper;

impl FilDumper {
    pub fn lift_program(program: &Program) -> String {
        FilDumper::lift_code(&program.code)
    }

    pub fn lift_code(code: &Code) -> String {
        let mut writer = ScriptWriter::new(ScriptWriterConfig::default());
        for instruction in code {
            if let Some(comment) = &instruction.comment {
                writer.emit_comment(comment);
            }
            if instruction.op.is_block_end() && writer.current_indent() > 0 {
                writer.decrease_indent();
            }
            writer.emit_line(&dump_instruction(instruction));
            if instruction.op.is_block_start() {
                writer.increase_indent();
            }
        }
        writer.into_code()
    }
}

fn dump_instruction(instruction: &Instruction) -> String {
    let mut line = String::new();

    if !instruction.outputs.is_empty() {
        let outputs = instruction
            .outputs
            .iter()
            .map(|variable| variable.identifier())
            .collect::<Vec<_>>()
            .join(", ");
        line.push_str(&outputs);
        line.push_str(" <- ");
    }

    line.push_str(instruction.op.name());

    let fields = operand_fields(instruction);
    if !fields.is_empty() {
        line.push(' ');
        line.push_str(&fields.join(", "));
    }

    if !instruction.inner_outputs.is_empty() {
        let inner = instruction
            .inner_outputs
            .iter()
            .map(|variable| variable.identifier())
            .collect::<Vec<_>>()
            .join(", ");
        line.push_str(&format!(" -> [{}]", inner));
    }

    line
}

fn quoted(text: &str) -> String {
    format!("'{}'", text)
}

fn inputs_of(instruction: &Instruction) -> Vec<String> {
    instruction
        .inputs
        .iter()
        .map(|variable| variable.identifier())
        .collect()
}

fn variadic(entries: &[String]) -> String {
    format!("[{}]", entries.join(", "))
}

fn value_type_text(value_type: ValueType) -> String {
    match value_type {
        ValueType::I32 => "i32".to_owned(),
        ValueType::I64 => "i64".to_owned(),
        ValueType::F32 => "f32".to_owned(),
        ValueType::F64 => "f64".to_owned(),
        ValueType::V128 => "v128".to_owned(),
        ValueType::Ref(ref_type) => ref_type_text(ref_type),
    }
}

fn ref_type_text(ref_type: RefType) -> String {
    let heap = heap_type_text(ref_type.heap);
    if ref_type.nullable {
        format!("(ref null {})", heap)
    } else {
        format!("(ref {})", heap)
    }
}

fn heap_type_text(heap: HeapType) -> String {
    match heap {
        HeapType::Extern => "extern".to_owned(),
        HeapType::Func => "func".to_owned(),
        HeapType::Any => "any".to_owned(),
        HeapType::Eq => "eq".to_owned(),
        HeapType::I31 => "i31".to_owned(),
        HeapType::Struct => "struct".to_owned(),
        HeapType::Array => "array".to_owned(),
        HeapType::Exn => "exn".to_owned(),
        HeapType::NoneType => "none".to_owned(),
        HeapType::NoExtern => "noextern".to_owned(),
        HeapType::NoFunc => "nofunc".to_owned(),
        HeapType::NoExn => "noexn".to_owned(),
        HeapType::Index(id) => format!("$t{}", id.0),
    }
}

fn signature_text(signature: &Signature) -> String {
    let params = signature
        .params
        .iter()
        .map(|value_type| value_type_text(*value_type))
        .collect::<Vec<_>>()
        .join(", ");
    let results = signature
        .results
        .iter()
        .map(|value_type| value_type_text(*value_type))
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{}] => [{}]", params, results)
}

fn limits_text(limits: Limits) -> String {
    match limits.max {
        Some(max) => format!("{}..{}", limits.min, max),
        None => format!("{}..", limits.min),
    }
}

fn global_value_text(value: WasmGlobalValue) -> String {
    match value {
        WasmGlobalValue::I32(v) => format!("i32:{}", v),
        WasmGlobalValue::I64(v) => format!("i64:{}", v),
        WasmGlobalValue::F32(v) => format!("f32:{}", v),
        WasmGlobalValue::F64(v) => format!("f64:{}", v),
        WasmGlobalValue::RefNull(heap) => format!("ref.null:{}", heap_type_text(heap)),
    }
}

fn field_text(field: &FilField) -> String {
    let storage = match field.storage {
        FilStorage::I8 => "i8".to_owned(),
        FilStorage::I16 => "i16".to_owned(),
        FilStorage::Value(value_type) => value_type_text(value_type),
        FilStorage::TypeRef { nullable } => {
            if nullable {
                "(ref null $in)".to_owned()
            } else {
                "(ref $in)".to_owned()
            }
        }
    };
    if field.mutable {
        format!("mut {}", storage)
    } else {
        storage
    }
}

fn cast_target_text(target: CastTarget) -> String {
    match target {
        CastTarget::Abstract(heap) => heap_type_text(heap),
        CastTarget::TypeDef => "$in".to_owned(),
    }
}

fn catch_kind_text(kind: CatchKind) -> &'static str {
    match kind {
        CatchKind::Catch => "catch",
        CatchKind::CatchRef => "catch_ref",
        CatchKind::CatchAll => "catch_all",
        CatchKind::CatchAllRef => "catch_all_ref",
    }
}

#[allow(clippy::too_many_lines)]
fn operand_fields(instruction: &Instruction) -> Vec<String> {
    let inputs = inputs_of(instruction);
    match &instruction.op {
        Op::LoadInteger { value } => vec![value.to_string()],
        Op::LoadBigInt { value } => vec![format!("{}n", value)],
        Op::LoadFloat { value } => vec![value.to_string()],
        Op::LoadString { value } => vec![quoted(value)],
        Op::LoadBoolean { value } => vec![value.to_string()],
        Op::LoadRegExp { pattern, flags } => {
            vec![quoted(pattern), quoted(flags)]
        }
        Op::LoadBuiltin { name }
        | Op::LoadNamedVariable { name }
        | Op::GetPrivateProperty { name }
        | Op::GetSuperProperty { name }
        | Op::GetProperty { name } => {
            let mut fields = vec![quoted(name)];
            fields.splice(0..0, inputs);
            fields
        }
        Op::StoreNamedVariable { name } | Op::DefineNamedVariable { name } => {
            let mut fields = vec![quoted(name)];
            fields.extend(inputs);
            fields
        }
        Op::SetProperty { name }
        | Op::SetPrivateProperty { name }
        | Op::SetSuperProperty { name }
        | Op::DeleteProperty { name } => {
            let mut fields = inputs;
            fields.insert(1.min(fields.len()), quoted(name));
            fields
        }
        Op::UpdateProperty { name, op }
        | Op::UpdatePrivateProperty { name, op }
        | Op::UpdateSuperProperty { name, op } => {
            let mut fields = inputs;
            fields.insert(
                1.min(fields.len()),
                format!("{}, {}", quoted(name), quoted(op.token())),
            );
            fields
        }
        Op::CreateObject { property_names } | Op::CreateObjectWithSpread { property_names } => {
            let names = property_names
                .iter()
                .map(|name| quoted(name))
                .collect::<Vec<_>>();
            vec![variadic(&names), variadic(&inputs)]
        }
        Op::CreateArray | Op::CreateArrayWithSpread { .. } => vec![variadic(&inputs)],
        Op::CreateTemplateString { parts } => {
            let parts = parts.iter().map(|part| quoted(part)).collect::<Vec<_>>();
            vec![variadic(&parts), variadic(&inputs)]
        }
        Op::GetElement { index } | Op::DeleteElement { index } => {
            let mut fields = inputs;
            fields.push(index.to_string());
            fields
        }
        Op::SetElement { index } => {
            let mut fields = inputs;
            fields.insert(1.min(fields.len()), index.to_string());
            fields
        }
        Op::UpdateElement { index, op } => {
            let mut fields = inputs;
            fields.insert(
                1.min(fields.len()),
                format!("{}, {}", index, quoted(op.token())),
            );
            fields
        }
        Op::CallMethod { name } | Op::CallSuperMethod { name } | Op::CallPrivateMethod { name } => {
            let mut fields = inputs;
            fields.insert(1.min(fields.len()), quoted(name));
            fields
        }
        Op::CallMethodWithSpread { name, .. } => {
            let mut fields = inputs;
            fields.insert(1.min(fields.len()), quoted(name));
            fields
        }
        Op::UnaryOperation { op } => {
            let mut fields = vec![quoted(op.token())];
            fields.extend(inputs);
            fields
        }
        Op::BinaryOperation { op } | Op::Update { op } => {
            binary_shaped(&inputs, op.token())
        }
        Op::Compare { op } => binary_shaped(&inputs, op.token()),
        Op::Eval { code } => {
            let mut fields = vec![quoted(code)];
            fields.push(variadic(&inputs));
            fields
        }
        Op::DestructArray {
            indices,
            has_rest_element,
        }
        | Op::DestructArrayAndReassign {
            indices,
            has_rest_element,
        }
        | Op::BeginForOfLoopWithDestruct {
            indices,
            has_rest_element,
        } => {
            let indices = indices
                .iter()
                .map(|index| index.to_string())
                .collect::<Vec<_>>();
            let mut fields = inputs;
            fields.push(variadic(&indices));
            if *has_rest_element {
                fields.push("hasRest".to_owned());
            }
            fields
        }
        Op::DestructObject {
            property_names,
            has_rest_element,
        }
        | Op::DestructObjectAndReassign {
            property_names,
            has_rest_element,
        } => {
            let names = property_names
                .iter()
                .map(|name| quoted(name))
                .collect::<Vec<_>>();
            let mut fields = inputs;
            fields.push(variadic(&names));
            if *has_rest_element {
                fields.push("hasRest".to_owned());
            }
            fields
        }
        Op::BeginPlainFunction { has_rest_param }
        | Op::BeginArrowFunction { has_rest_param }
        | Op::BeginGeneratorFunction { has_rest_param }
        | Op::BeginAsyncFunction { has_rest_param }
        | Op::BeginAsyncArrowFunction { has_rest_param }
        | Op::BeginAsyncGeneratorFunction { has_rest_param }
        | Op::BeginConstructor { has_rest_param } => {
            if *has_rest_param {
                vec!["hasRestParam".to_owned()]
            } else {
                Vec::new()
            }
        }
        Op::BeginIf { inverted } => {
            let mut fields = inputs;
            if *inverted {
                fields.push("inverted".to_owned());
            }
            fields
        }
        Op::EndSwitchCase { falls_through } => {
            if *falls_through {
                vec!["fallsThrough".to_owned()]
            } else {
                Vec::new()
            }
        }
        Op::BeginRepeatLoop { iterations, .. } => vec![iterations.to_string()],
        Op::BeginClassDefinition { has_superclass } => {
            let mut fields = inputs;
            if *has_superclass {
                fields.push("extends".to_owned());
            }
            fields
        }
        Op::BeginClassConstructor { has_rest_param }
        | Op::BeginObjectLiteralMethod {
            has_rest_param, ..
        }
        | Op::BeginClassInstanceMethod {
            has_rest_param, ..
        }
        | Op::BeginClassStaticMethod {
            has_rest_param, ..
        }
        | Op::BeginClassPrivateInstanceMethod {
            has_rest_param, ..
        } => {
            let mut fields = named_payload(&instruction.op);
            if *has_rest_param {
                fields.push("hasRestParam".to_owned());
            }
            fields
        }
        Op::ObjectLiteralAddProperty { name }
        | Op::BeginObjectLiteralGetter { name }
        | Op::BeginObjectLiteralSetter { name }
        | Op::ClassAddInstanceProperty { name }
        | Op::ClassAddStaticProperty { name }
        | Op::ClassAddPrivateInstanceProperty { name }
        | Op::BeginClassInstanceGetter { name }
        | Op::BeginClassInstanceSetter { name } => {
            let mut fields = vec![quoted(name)];
            fields.extend(inputs);
            fields
        }
        Op::ObjectLiteralAddElement { index } => {
            let mut fields = vec![index.to_string()];
            fields.extend(inputs);
            fields
        }
        Op::Explore { id, rng_seed } => {
            let mut fields = vec![quoted(id)];
            fields.extend(inputs);
            fields.push(format!("seed={}", rng_seed));
            fields
        }
        Op::Probe { id } => {
            let mut fields = vec![quoted(id)];
            fields.extend(inputs);
            fields
        }
        Op::Fixup { id, action, .. } => {
            let mut fields = vec![quoted(id), quoted(action)];
            fields.extend(inputs);
            fields
        }
        Op::CreateWasmGlobal { value, mutable } => {
            let mut fields = vec![global_value_text(*value)];
            if *mutable {
                fields.push("mutable".to_owned());
            }
            fields
        }
        Op::CreateWasmMemory { limits, shared } => {
            let mut fields = vec![limits_text(*limits)];
            if *shared {
                fields.push("shared".to_owned());
            }
            fields
        }
        Op::CreateWasmTable { element, limits } => {
            vec![
                value_type_text(element.value_type()),
                limits_text(*limits),
            ]
        }
        Op::CreateWasmJSTag { parameters } => {
            let parameters = parameters
                .iter()
                .map(|value_type| value_type_text(*value_type))
                .collect::<Vec<_>>();
            vec![variadic(&parameters)]
        }
        Op::WasmDefineArrayType { element } => vec![field_text(element)],
        Op::WasmDefineStructType { fields } => {
            let fields = fields.iter().map(field_text).collect::<Vec<_>>();
            vec![variadic(&fields)]
        }
        Op::WasmDefineSignatureType { params, results } => {
            vec![signature_text(&Signature::new(params.clone(), results.clone()))]
        }
        Op::Wasm(wasm_op) => wasm_operand_fields(wasm_op, inputs),
        _ => inputs,
    }
}

fn binary_shaped(inputs: &[String], token: &str) -> Vec<String> {
    match inputs {
        [lhs, rhs] => vec![lhs.clone(), quoted(token), rhs.clone()],
        _ => {
            let mut fields = vec![quoted(token)];
            fields.extend(inputs.iter().cloned());
            fields
        }
    }
}

fn named_payload(op: &Op) -> Vec<String> {
    match op {
        Op::BeginObjectLiteralMethod { name, .. }
        | Op::BeginClassInstanceMethod { name, .. }
        | Op::BeginClassStaticMethod { name, .. }
        | Op::BeginClassPrivateInstanceMethod { name, .. } => vec![quoted(name)],
        _ => Vec::new(),
    }
}

#[allow(clippy::too_many_lines)]
fn wasm_operand_fields(op: &WasmOp, inputs: Vec<String>) -> Vec<String> {
    match op {
        WasmOp::BeginFunction { signature }
        | WasmOp::BeginBlock { signature }
        | WasmOp::BeginLoop { signature }
        | WasmOp::BeginTry { signature } => {
            let mut fields = vec![signature_text(signature)];
            fields.extend(inputs);
            fields
        }
        WasmOp::BeginIf { signature, hint } => {
            let mut fields = vec![signature_text(signature)];
            fields.extend(inputs);
            if let Some(hint) = hint {
                fields.push(format!("hint={:?}", hint));
            }
            fields
        }
        WasmOp::BeginTryTable { signature, catches } => {
            let catches = catches
                .iter()
                .map(|kind| catch_kind_text(*kind).to_owned())
                .collect::<Vec<_>>();
            let mut fields = vec![signature_text(signature), variadic(&catches)];
            fields.extend(inputs);
            fields
        }
        WasmOp::CallIndirect { signature }
        | WasmOp::ReturnCallIndirect { signature }
        | WasmOp::CallRef { signature }
        | WasmOp::JsCall { signature } => {
            let mut fields = vec![signature_text(signature)];
            fields.extend(inputs);
            fields
        }
        WasmOp::BranchIf { hint } => {
            let mut fields = inputs;
            if let Some(hint) = hint {
                fields.push(format!("hint={:?}", hint));
            }
            fields
        }
        WasmOp::Consti32 { value } => vec![value.to_string()],
        WasmOp::Consti64 { value } => vec![value.to_string()],
        WasmOp::Constf32 { value } => vec![value.to_string()],
        WasmOp::Constf64 { value } => vec![value.to_string()],
        WasmOp::ConstSimd128 { value } => {
            let bytes = value
                .iter()
                .map(|byte| byte.to_string())
                .collect::<Vec<_>>();
            vec![variadic(&bytes)]
        }
        WasmOp::I32Binary { op } | WasmOp::I64Binary { op } => {
            binary_shaped(&inputs, &format!("{:?}", op))
        }
        WasmOp::F32Binary { op } | WasmOp::F64Binary { op } => {
            binary_shaped(&inputs, &format!("{:?}", op))
        }
        WasmOp::I32Compare { op } | WasmOp::I64Compare { op } => {
            binary_shaped(&inputs, &format!("{:?}", op))
        }
        WasmOp::F32Compare { op } | WasmOp::F64Compare { op } => {
            binary_shaped(&inputs, &format!("{:?}", op))
        }
        WasmOp::I32Unary { op } | WasmOp::I64Unary { op } => {
            let mut fields = vec![quoted(&format!("{:?}", op))];
            fields.extend(inputs);
            fields
        }
        WasmOp::F32Unary { op } | WasmOp::F64Unary { op } => {
            let mut fields = vec![quoted(&format!("{:?}", op))];
            fields.extend(inputs);
            fields
        }
        WasmOp::Convert { op } => {
            let mut fields = vec![quoted(&format!("{:?}", op))];
            fields.extend(inputs);
            fields
        }
        WasmOp::RefNull { target } => vec![cast_target_text(*target)],
        WasmOp::I31Get { signed } => {
            let mut fields = inputs;
            fields.push(if *signed { "signed" } else { "unsigned" }.to_owned());
            fields
        }
        WasmOp::StructGet { field_index, mode } => {
            let mut fields = inputs;
            fields.push(field_index.to_string());
            fields.push(format!("{:?}", mode));
            fields
        }
        WasmOp::StructSet { field_index } => {
            let mut fields = inputs;
            fields.push(field_index.to_string());
            fields
        }
        WasmOp::ArrayGet { mode } => {
            let mut fields = inputs;
            fields.push(format!("{:?}", mode));
            fields
        }
        WasmOp::RefTest { target, nullable } | WasmOp::RefCast { target, nullable } => {
            let mut fields = inputs;
            fields.push(cast_target_text(*target));
            if *nullable {
                fields.push("null".to_owned());
            }
            fields
        }
        WasmOp::BrOnCast {
            target,
            input_nullable,
            result_nullable,
        }
        | WasmOp::BrOnCastFail {
            target,
            input_nullable,
            result_nullable,
        } => {
            let mut fields = inputs;
            fields.push(cast_target_text(*target));
            fields.push(format!("{}->{}", input_nullable, result_nullable));
            fields
        }
        WasmOp::DefineGlobal { value, mutable } => {
            let mut fields = vec![global_value_text(*value)];
            if *mutable {
                fields.push("mutable".to_owned());
            }
            fields
        }
        WasmOp::DefineMemory { limits, shared } => {
            let mut fields = vec![limits_text(*limits)];
            if *shared {
                fields.push("shared".to_owned());
            }
            fields
        }
        WasmOp::DefineTable { element, limits } => vec![
            value_type_text(element.value_type()),
            limits_text(*limits),
        ],
        WasmOp::DefineTag { parameters } => {
            let parameters = parameters
                .iter()
                .map(|value_type| value_type_text(*value_type))
                .collect::<Vec<_>>();
            vec![variadic(&parameters)]
        }
        WasmOp::DefineElementSegment { offset } => {
            let mut fields = match offset {
                Some(offset) => vec![format!("active@{}", offset)],
                None => vec!["passive".to_owned()],
            };
            fields.push(variadic(&inputs));
            fields
        }
        WasmOp::DefineDataSegment { bytes } => vec![format!("{} bytes", bytes.len())],
        WasmOp::MemoryLoad { kind, offset } => {
            let mut fields = inputs;
            fields.push(format!("{:?}", kind));
            fields.push(format!("offset={}", offset));
            fields
        }
        WasmOp::MemoryStore { kind, offset } => {
            let mut fields = inputs;
            fields.push(format!("{:?}", kind));
            fields.push(format!("offset={}", offset));
            fields
        }
        WasmOp::AtomicLoad { kind, offset } => {
            let mut fields = inputs;
            fields.push(format!("{:?}", kind.width));
            fields.push(format!("offset={}", offset));
            fields
        }
        WasmOp::AtomicStore { kind, offset } => {
            let mut fields = inputs;
            fields.push(format!("{:?}", kind.width));
            fields.push(format!("offset={}", offset));
            fields
        }
        WasmOp::AtomicRmw { op, width, offset } => {
            let mut fields = inputs;
            fields.push(format!("{:?}.{:?}", op, width));
            fields.push(format!("offset={}", offset));
            fields
        }
        WasmOp::SimdSplat { kind } => {
            let mut fields = vec![format!("{:?}", kind)];
            fields.extend(inputs);
            fields
        }
        WasmOp::SimdExtractLane { kind, lane, signed } => {
            let mut fields = inputs;
            fields.push(format!("{:?}[{}]", kind, lane));
            if *signed {
                fields.push("signed".to_owned());
            }
            fields
        }
        WasmOp::SimdReplaceLane { kind, lane } => {
            let mut fields = inputs;
            fields.push(format!("{:?}[{}]", kind, lane));
            fields
        }
        WasmOp::SimdBinary { op } => binary_shaped(&inputs, &format!("{:?}", op)),
        WasmOp::SimdLoad { offset } | WasmOp::SimdStore { offset } => {
            let mut fields = inputs;
            fields.push(format!("offset={}", offset));
            fields
        }
        WasmOp::Select { ty } => {
            let mut fields = inputs;
            if let Some(ty) = ty {
                fields.push(value_type_text(*ty));
            }
            fields
        }
        _ => inputs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fil::opcodes::BinaryOperator;
    use crate::fil::Variable;

    fn v(n: u32) -> Variable {
        Variable(n)
    }

    #[test]
    fn binary_operation_uses_the_documented_shape() {
        let mut code = Code::new();
        code.push(Instruction::new(Op::LoadInteger { value: 1 }).with_output(v(0)));
        code.push(Instruction::new(Op::LoadInteger { value: 2 }).with_output(v(1)));
        code.push(
            Instruction::new(Op::BinaryOperation {
                op: BinaryOperator::Add,
            })
            .with_inputs(vec![v(0), v(1)])
            .with_output(v(2)),
        );

        let dump = FilDumper::lift_code(&code);
        assert!(dump.contains("v0 <- LoadInteger 1"));
        assert!(dump.contains("v2 <- BinaryOperation v0, '+', v1"));
    }

    #[test]
    fn blocks_are_indented() {
        let mut code = Code::new();
        code.push(Instruction::new(Op::LoadBoolean { value: true }).with_output(v(0)));
        code.push(Instruction::new(Op::BeginIf { inverted: false }).with_inputs(vec![v(0)]));
        code.push(Instruction::new(Op::LoadInteger { value: 1 }).with_output(v(1)));
        code.push(Instruction::new(Op::EndIf));

        let dump = FilDumper::lift_code(&code);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines[1], "BeginIf v0");
        assert!(lines[2].starts_with("    "));
        assert_eq!(lines[3], "EndIf");
    }

    #[test]
    fn falls_through_switch_case_trailer() {
        let mut code = Code::new();
        code.push(Instruction::new(Op::LoadInteger { value: 1 }).with_output(v(0)));
        code.push(Instruction::new(Op::BeginSwitch).with_inputs(vec![v(0)]));
        code.push(Instruction::new(Op::BeginSwitchCase).with_inputs(vec![v(0)]));
        code.push(Instruction::new(Op::EndSwitchCase {
            falls_through: true,
        }));
        code.push(Instruction::new(Op::EndSwitch));

        let dump = FilDumper::lift_code(&code);
        assert!(dump.contains("EndSwitchCase fallsThrough"));
    }

    #[test]
    fn inner_outputs_are_listed() {
        let mut code = Code::new();
        code.push(
            Instruction::new(Op::BeginPlainFunction {
                has_rest_param: false,
            })
            .with_output(v(0))
            .with_inner_outputs(vec![v(1), v(2)]),
        );
        code.push(Instruction::new(Op::EndPlainFunction));

        let dump = FilDumper::lift_code(&code);
        assert!(dump.contains("v0 <- BeginPlainFunction -> [v1, v2]"));
    }
}
