//! End-to-end tests for the JavaScript and Wasm lifters.

use fil_lift::fil::opcodes::{BinaryOperator, Op};
use fil_lift::fil::wasm_opcodes::{CastTarget, IntegerBinaryOp, MemoryLoadKind, WasmOp};
use fil_lift::fil::{Code, Instruction, Program, Variable};
use fil_lift::lifting::inliner::InlineOnlyLiterals;
use fil_lift::lifting::{FilDumper, JsLifter, LiftingOptions};
use fil_lift::wasm::types::{BranchHint, Limits, Signature, ValueType, WasmGlobalValue};
use fil_lift::wasm::{lift_wasm, validator};

fn v(n: u32) -> Variable {
    Variable(n)
}

fn lift_js(code: &Code) -> String {
    JsLifter::new().lift_code(code).expect("lifting failed")
}

/// True when `needle` appears as a contiguous byte run inside `haystack`.
fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window == needle)
}

// ---------------------------------------------------------------------
// JavaScript lifting scenarios
// ---------------------------------------------------------------------

#[test]
fn simple_inlining_collapses_to_one_statement() {
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
    code.push(Instruction::new(Op::Return).with_inputs(vec![v(2)]));

    assert_eq!(lift_js(&code), "return 1 + 2;\n");
}

#[test]
fn precedence_forces_parens_on_the_right() {
    let mut code = Code::new();
    code.push(Instruction::new(Op::LoadInteger { value: 1 }).with_output(v(0)));
    code.push(Instruction::new(Op::LoadInteger { value: 2 }).with_output(v(1)));
    code.push(Instruction::new(Op::LoadInteger { value: 3 }).with_output(v(2)));
    code.push(
        Instruction::new(Op::BinaryOperation {
            op: BinaryOperator::Add,
        })
        .with_inputs(vec![v(1), v(2)])
        .with_output(v(3)),
    );
    code.push(
        Instruction::new(Op::BinaryOperation {
            op: BinaryOperator::Mul,
        })
        .with_inputs(vec![v(0), v(3)])
        .with_output(v(4)),
    );
    code.push(Instruction::new(Op::Print).with_inputs(vec![v(4)]));

    assert_eq!(lift_js(&code), "fuzzilli('FUZZILLI_PRINT', 1 * (2 + 3));\n");
}

#[test]
fn array_destructuring_with_rest_and_gap() {
    let mut code = Code::new();
    code.push(Instruction::new(Op::LoadInteger { value: 1 }).with_output(v(4)));
    code.push(
        Instruction::new(Op::CreateArray)
            .with_inputs(vec![v(4)])
            .with_output(v(0)),
    );
    code.push(
        Instruction::new(Op::DestructArray {
            indices: vec![0, 1, 3],
            has_rest_element: true,
        })
        .with_inputs(vec![v(0)])
        .with_outputs(vec![v(1), v(2), v(3)]),
    );

    let output = JsLifter::new()
        .with_inliner(Box::new(InlineOnlyLiterals))
        .lift_code(&code)
        .expect("lifting failed");
    assert!(output.contains("const [v1,v2,,...v3] = v0;"), "was: {output}");
}

#[test]
fn numeric_literal_corner_cases() {
    let mut code = Code::new();
    code.push(Instruction::new(Op::LoadFloat { value: f64::NAN }).with_output(v(0)));
    code.push(Instruction::new(Op::LoadFloat { value: f64::INFINITY }).with_output(v(1)));
    code.push(
        Instruction::new(Op::LoadFloat {
            value: f64::NEG_INFINITY,
        })
        .with_output(v(2)),
    );
    code.push(Instruction::new(Op::LoadBigInt { value: 0 }).with_output(v(3)));
    code.push(
        Instruction::new(Op::CreateArray)
            .with_inputs(vec![v(0), v(1), v(2), v(3)])
            .with_output(v(4)),
    );
    code.push(Instruction::new(Op::Return).with_inputs(vec![v(4)]));

    assert_eq!(lift_js(&code), "return [NaN,Infinity,-Infinity,0n];\n");
}

#[test]
fn effectful_expressions_spill_when_used_twice() {
    let mut code = Code::new();
    code.push(Instruction::new(Op::LoadBuiltin { name: "f".into() }).with_output(v(0)));
    code.push(
        Instruction::new(Op::CallFunction)
            .with_inputs(vec![v(0)])
            .with_output(v(1)),
    );
    code.push(
        Instruction::new(Op::BinaryOperation {
            op: BinaryOperator::Add,
        })
        .with_inputs(vec![v(1), v(1)])
        .with_output(v(2)),
    );
    code.push(Instruction::new(Op::Return).with_inputs(vec![v(2)]));

    let output = lift_js(&code);
    assert!(output.contains("const v1 = f();"), "was: {output}");
    assert!(output.contains("return v1 + v1;"), "was: {output}");
}

#[test]
fn structured_constructs_keep_indentation_balanced() {
    let mut code = Code::new();
    code.push(Instruction::new(Op::LoadBoolean { value: true }).with_output(v(0)));
    code.push(Instruction::new(Op::BeginIf { inverted: false }).with_inputs(vec![v(0)]));
    code.push(Instruction::new(Op::LoadInteger { value: 1 }).with_output(v(1)));
    code.push(Instruction::new(Op::Return).with_inputs(vec![v(1)]));
    code.push(Instruction::new(Op::BeginElse));
    code.push(Instruction::new(Op::LoadInteger { value: 2 }).with_output(v(2)));
    code.push(Instruction::new(Op::Return).with_inputs(vec![v(2)]));
    code.push(Instruction::new(Op::EndIf));

    let output = lift_js(&code);
    assert_eq!(
        output,
        "if (true) {\n    return 1;\n} else {\n    return 2;\n}\n"
    );
}

#[test]
fn functions_render_parameters_and_rest() {
    let mut code = Code::new();
    code.push(
        Instruction::new(Op::BeginPlainFunction {
            has_rest_param: true,
        })
        .with_output(v(0))
        .with_inner_outputs(vec![v(1), v(2), v(3)]),
    );
    code.push(Instruction::new(Op::Return).with_inputs(vec![v(2)]));
    code.push(Instruction::new(Op::EndPlainFunction));

    let output = lift_js(&code);
    assert!(
        output.contains("function v0(v1, v2, ...v3) {"),
        "was: {output}"
    );
}

#[test]
fn explore_emits_its_scaffold_before_the_call() {
    let mut code = Code::new();
    code.push(Instruction::new(Op::LoadInteger { value: 7 }).with_output(v(0)));
    code.push(
        Instruction::new(Op::Explore {
            id: "ex1".into(),
            rng_seed: 42,
        })
        .with_inputs(vec![v(0)]),
    );

    let output = lift_js(&code);
    let scaffold_at = output.find("const explore =").expect("scaffold missing");
    let call_at = output
        .find("explore(\"ex1\", 7, this, [], 42);")
        .expect("call missing");
    assert!(scaffold_at < call_at);
    assert!(output.contains("EXPLORE_ERROR:"));
}

#[test]
fn repeat_loop_and_while_loop_render_headers() {
    let mut code = Code::new();
    code.push(
        Instruction::new(Op::BeginRepeatLoop {
            iterations: 10,
            exposes_loop_counter: true,
        })
        .with_inner_outputs(vec![v(0)]),
    );
    code.push(Instruction::new(Op::LoopBreak));
    code.push(Instruction::new(Op::EndRepeatLoop));

    let output = lift_js(&code);
    assert!(
        output.contains("for (let v0 = 0; v0 < 10; v0++) {"),
        "was: {output}"
    );
}

#[test]
fn while_loop_with_inline_header_condition() {
    let mut code = Code::new();
    code.push(Instruction::new(Op::BeginWhileLoopHeader));
    code.push(Instruction::new(Op::LoadBoolean { value: false }).with_output(v(0)));
    code.push(Instruction::new(Op::BeginWhileLoopBody).with_inputs(vec![v(0)]));
    code.push(Instruction::new(Op::LoopBreak));
    code.push(Instruction::new(Op::EndWhileLoop));

    let output = lift_js(&code);
    assert_eq!(output, "while (false) {\n    break;\n}\n");
}

#[test]
fn for_loop_assembles_all_three_clauses() {
    use fil_lift::fil::opcodes::Comparator;

    let mut code = Code::new();
    code.push(Instruction::new(Op::BeginForLoopInitializer));
    code.push(Instruction::new(Op::LoadInteger { value: 0 }).with_output(v(0)));
    code.push(
        Instruction::new(Op::BeginForLoopCondition)
            .with_inputs(vec![v(0)])
            .with_inner_outputs(vec![v(1)]),
    );
    code.push(Instruction::new(Op::LoadInteger { value: 10 }).with_output(v(2)));
    code.push(
        Instruction::new(Op::Compare {
            op: Comparator::LessThan,
        })
        .with_inputs(vec![v(1), v(2)])
        .with_output(v(3)),
    );
    code.push(
        Instruction::new(Op::BeginForLoopAfterthought)
            .with_inputs(vec![v(3)])
            .with_inner_outputs(vec![v(4)]),
    );
    code.push(Instruction::new(Op::LoadInteger { value: 1 }).with_output(v(5)));
    code.push(
        Instruction::new(Op::Update {
            op: BinaryOperator::Add,
        })
        .with_inputs(vec![v(4), v(5)]),
    );
    code.push(Instruction::new(Op::BeginForLoopBody).with_inner_outputs(vec![v(6)]));
    code.push(Instruction::new(Op::Print).with_inputs(vec![v(6)]));
    code.push(Instruction::new(Op::EndForLoop));

    let output = lift_js(&code);
    assert!(
        output.contains("for (let v1 = 0; v1 < 10; v1 += 1) {"),
        "was: {output}"
    );
    assert!(
        output.contains("fuzzilli('FUZZILLI_PRINT', v1);"),
        "was: {output}"
    );
}

#[test]
fn do_while_condition_comes_from_the_header_block() {
    let mut code = Code::new();
    code.push(Instruction::new(Op::BeginDoWhileLoopBody));
    code.push(Instruction::new(Op::Nop));
    code.push(Instruction::new(Op::BeginDoWhileLoopHeader));
    code.push(Instruction::new(Op::LoadBoolean { value: false }).with_output(v(0)));
    code.push(Instruction::new(Op::EndDoWhileLoop).with_inputs(vec![v(0)]));

    let output = lift_js(&code);
    assert_eq!(output, "do {\n} while (false);\n");
}

#[test]
fn code_strings_escape_nested_backticks() {
    let mut code = Code::new();
    code.push(Instruction::new(Op::BeginCodeString).with_output(v(0)));
    code.push(Instruction::new(Op::BeginCodeString).with_output(v(1)));
    code.push(Instruction::new(Op::LoadInteger { value: 1 }).with_output(v(2)));
    code.push(Instruction::new(Op::Return).with_inputs(vec![v(2)]));
    code.push(Instruction::new(Op::EndCodeString));
    code.push(Instruction::new(Op::EndCodeString));

    let output = lift_js(&code);
    assert!(output.contains("const v0 = `"), "was: {output}");
    assert!(output.contains("const v1 = \\`"), "was: {output}");
}

#[test]
fn lifting_is_deterministic() {
    let mut code = Code::new();
    code.push(Instruction::new(Op::LoadInteger { value: 5 }).with_output(v(0)));
    code.push(
        Instruction::new(Op::CreateObject {
            property_names: vec!["a".into()],
        })
        .with_inputs(vec![v(0)])
        .with_output(v(1)),
    );
    code.push(Instruction::new(Op::Return).with_inputs(vec![v(1)]));
    let program = Program::new(code);

    let lifter = JsLifter::new();
    let first = lifter
        .lift_program(&program, LiftingOptions::empty())
        .unwrap();
    let second = lifter
        .lift_program(&program, LiftingOptions::empty())
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn prefix_suffix_and_collected_types_are_emitted() {
    let mut code = Code::new();
    code.push(Instruction::new(Op::LoadInteger { value: 5 }).with_output(v(0)));
    code.push(Instruction::new(Op::Print).with_inputs(vec![v(0)]));
    let program = Program::new(code);

    let lifter = JsLifter::new()
        .with_prefix("'use strict';")
        .with_suffix("// done");
    let output = lifter
        .lift_program(
            &program,
            LiftingOptions::COLLECT_TYPES | LiftingOptions::INCLUDE_COMMENTS,
        )
        .unwrap();
    assert!(output.starts_with("'use strict';\n"), "was: {output}");
    assert!(output.contains("// TYPES: {\"v0\":\"Integer\"}"), "was: {output}");
}

// ---------------------------------------------------------------------
// IL dumper
// ---------------------------------------------------------------------

#[test]
fn dumper_round_trips_no_state() {
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
    let program = Program::new(code);

    let first = FilDumper::lift_program(&program);
    let second = FilDumper::lift_program(&program);
    assert_eq!(first, second);
    assert!(first.contains("v2 <- BinaryOperation v0, '+', v1"));
}

// ---------------------------------------------------------------------
// Wasm lifting scenarios
// ---------------------------------------------------------------------

fn wasm_module(instructions: Vec<Instruction>) -> Code {
    let mut code = Code::new();
    code.push(Instruction::new(Op::BeginWasmModule));
    for instruction in instructions {
        code.push(instruction);
    }
    code.push(Instruction::new(Op::EndWasmModule).with_output(v(900)));
    code
}

fn void_signature() -> Signature {
    Signature::empty()
}

#[test]
fn const_add_function_body_bytes() {
    let code = wasm_module(vec![
        Instruction::new(Op::Wasm(WasmOp::BeginFunction {
            signature: Signature::new(vec![], vec![ValueType::I32]),
        }))
        .with_output(v(100)),
        Instruction::new(Op::Wasm(WasmOp::Consti32 { value: 41 })).with_output(v(101)),
        Instruction::new(Op::Wasm(WasmOp::Consti32 { value: 1 })).with_output(v(102)),
        Instruction::new(Op::Wasm(WasmOp::I32Binary {
            op: IntegerBinaryOp::Add,
        }))
        .with_inputs(vec![v(101), v(102)])
        .with_output(v(103)),
        Instruction::new(Op::Wasm(WasmOp::EndFunction)).with_inputs(vec![v(103)]),
    ]);

    let (bytes, imports) = lift_wasm(&code).expect("lifting failed");
    assert!(imports.is_empty());
    assert!(
        contains_bytes(&bytes, &[0x41, 0x29, 0x41, 0x01, 0x6A, 0x0B]),
        "bytes: {bytes:02X?}"
    );
    validator::validate_module(&bytes).expect("module must validate");
}

#[test]
fn branch_depth_reaches_the_outer_block() {
    let code = wasm_module(vec![
        Instruction::new(Op::Wasm(WasmOp::BeginFunction {
            signature: void_signature(),
        }))
        .with_output(v(100)),
        Instruction::new(Op::Wasm(WasmOp::BeginBlock {
            signature: void_signature(),
        }))
        .with_inner_outputs(vec![v(101)]),
        Instruction::new(Op::Wasm(WasmOp::BeginBlock {
            signature: void_signature(),
        }))
        .with_inner_outputs(vec![v(102)]),
        Instruction::new(Op::Wasm(WasmOp::Branch)).with_inputs(vec![v(101)]),
        Instruction::new(Op::Wasm(WasmOp::EndBlock)),
        Instruction::new(Op::Wasm(WasmOp::EndBlock)),
        Instruction::new(Op::Wasm(WasmOp::EndFunction)),
    ]);

    let (bytes, _) = lift_wasm(&code).expect("lifting failed");
    assert!(contains_bytes(&bytes, &[0x0C, 0x01]), "bytes: {bytes:02X?}");
    validator::validate_module(&bytes).expect("module must validate");
}

#[test]
fn branch_to_a_closed_block_is_rejected() {
    let code = wasm_module(vec![
        Instruction::new(Op::Wasm(WasmOp::BeginFunction {
            signature: void_signature(),
        }))
        .with_output(v(100)),
        Instruction::new(Op::Wasm(WasmOp::BeginBlock {
            signature: void_signature(),
        }))
        .with_inner_outputs(vec![v(101)]),
        Instruction::new(Op::Wasm(WasmOp::EndBlock)),
        Instruction::new(Op::Wasm(WasmOp::Branch)).with_inputs(vec![v(101)]),
        Instruction::new(Op::Wasm(WasmOp::EndFunction)),
    ]);

    let result = lift_wasm(&code);
    assert!(result.is_err());
}

#[test]
fn struct_type_group_layout() {
    use fil_lift::fil::opcodes::{FilField, FilStorage};

    let mut code = Code::new();
    code.push(Instruction::new(Op::BeginWasmTypeGroup));
    code.push(
        Instruction::new(Op::WasmDefineStructType {
            fields: vec![FilField {
                storage: FilStorage::Value(ValueType::I32),
                mutable: true,
            }],
        })
        .with_output(v(0)),
    );
    code.push(Instruction::new(Op::EndWasmTypeGroup));
    code.push(Instruction::new(Op::BeginWasmModule));
    code.push(
        Instruction::new(Op::Wasm(WasmOp::BeginFunction {
            signature: void_signature(),
        }))
        .with_output(v(100)),
    );
    code.push(
        Instruction::new(Op::Wasm(WasmOp::RefNull {
            target: CastTarget::TypeDef,
        }))
        .with_inputs(vec![v(0)])
        .with_output(v(101)),
    );
    code.push(Instruction::new(Op::Wasm(WasmOp::Drop)).with_inputs(vec![v(101)]));
    code.push(Instruction::new(Op::Wasm(WasmOp::EndFunction)));
    code.push(Instruction::new(Op::EndWasmModule).with_output(v(900)));

    let (bytes, _) = lift_wasm(&code).expect("lifting failed");
    // One recursion group holding one struct with a single mutable i32.
    assert!(
        contains_bytes(&bytes, &[0x4E, 0x01, 0x5F, 0x01, 0x7F, 0x01]),
        "bytes: {bytes:02X?}"
    );
    validator::validate_module(&bytes).expect("module must validate");
}

#[test]
fn memory_immediates_distinguish_memory_zero() {
    let load = |memory: Variable, out: Variable, address: Variable| {
        Instruction::new(Op::Wasm(WasmOp::MemoryLoad {
            kind: MemoryLoadKind::I32Load,
            offset: 4,
        }))
        .with_inputs(vec![memory, address])
        .with_output(out)
    };

    let code = wasm_module(vec![
        Instruction::new(Op::Wasm(WasmOp::DefineMemory {
            limits: Limits { min: 1, max: None },
            shared: false,
        }))
        .with_output(v(100)),
        Instruction::new(Op::Wasm(WasmOp::DefineMemory {
            limits: Limits { min: 1, max: None },
            shared: false,
        }))
        .with_output(v(101)),
        Instruction::new(Op::Wasm(WasmOp::BeginFunction {
            signature: void_signature(),
        }))
        .with_output(v(102)),
        Instruction::new(Op::Wasm(WasmOp::Consti32 { value: 0 })).with_output(v(103)),
        load(v(100), v(104), v(103)),
        Instruction::new(Op::Wasm(WasmOp::Drop)).with_inputs(vec![v(104)]),
        Instruction::new(Op::Wasm(WasmOp::Consti32 { value: 0 })).with_output(v(105)),
        load(v(101), v(106), v(105)),
        Instruction::new(Op::Wasm(WasmOp::Drop)).with_inputs(vec![v(106)]),
        Instruction::new(Op::Wasm(WasmOp::EndFunction)),
    ]);

    let (bytes, _) = lift_wasm(&code).expect("lifting failed");
    // Memory 0: a plain alignment byte. Memory 1: align | 0x40, then the
    // memory index.
    assert!(contains_bytes(&bytes, &[0x28, 0x02, 0x04]), "bytes: {bytes:02X?}");
    assert!(
        contains_bytes(&bytes, &[0x28, 0x42, 0x01, 0x04]),
        "bytes: {bytes:02X?}"
    );
    validator::validate_module(&bytes).expect("module must validate");
}

#[test]
fn imports_take_the_low_indices() {
    let mut code = Code::new();
    code.push(
        Instruction::new(Op::CreateWasmGlobal {
            value: WasmGlobalValue::I32(7),
            mutable: true,
        })
        .with_output(v(0)),
    );
    code.push(Instruction::new(Op::BeginWasmModule));
    code.push(
        Instruction::new(Op::Wasm(WasmOp::DefineGlobal {
            value: WasmGlobalValue::I32(1),
            mutable: true,
        }))
        .with_output(v(100)),
    );
    code.push(
        Instruction::new(Op::Wasm(WasmOp::BeginFunction {
            signature: void_signature(),
        }))
        .with_output(v(101)),
    );
    code.push(
        Instruction::new(Op::Wasm(WasmOp::GlobalGet))
            .with_inputs(vec![v(0)])
            .with_output(v(102)),
    );
    code.push(
        Instruction::new(Op::Wasm(WasmOp::GlobalGet))
            .with_inputs(vec![v(100)])
            .with_output(v(103)),
    );
    code.push(
        Instruction::new(Op::Wasm(WasmOp::I32Binary {
            op: IntegerBinaryOp::Add,
        }))
        .with_inputs(vec![v(102), v(103)])
        .with_output(v(104)),
    );
    code.push(Instruction::new(Op::Wasm(WasmOp::Drop)).with_inputs(vec![v(104)]));
    code.push(Instruction::new(Op::Wasm(WasmOp::EndFunction)));
    code.push(Instruction::new(Op::EndWasmModule).with_output(v(900)));

    let (bytes, imports) = lift_wasm(&code).expect("lifting failed");
    assert_eq!(imports, vec![v(0)]);
    // The imported global resolves to index 0, the defined one to index 1.
    assert!(contains_bytes(&bytes, &[0x23, 0x00]), "bytes: {bytes:02X?}");
    assert!(contains_bytes(&bytes, &[0x23, 0x01]), "bytes: {bytes:02X?}");
    validator::validate_module(&bytes).expect("module must validate");
}

#[test]
fn branch_hints_record_body_offsets() {
    let code = wasm_module(vec![
        Instruction::new(Op::Wasm(WasmOp::BeginFunction {
            signature: void_signature(),
        }))
        .with_output(v(100)),
        Instruction::new(Op::Wasm(WasmOp::Consti32 { value: 1 })).with_output(v(101)),
        Instruction::new(Op::Wasm(WasmOp::BeginIf {
            signature: void_signature(),
            hint: Some(BranchHint::Likely),
        }))
        .with_inputs(vec![v(101)])
        .with_inner_outputs(vec![v(102)]),
        Instruction::new(Op::Wasm(WasmOp::EndIf)),
        Instruction::new(Op::Wasm(WasmOp::EndFunction)),
    ]);

    let (bytes, _) = lift_wasm(&code).expect("lifting failed");
    let name = b"metadata.code.branch_hint";
    assert!(contains_bytes(&bytes, name), "bytes: {bytes:02X?}");
    // One hinted function (index 0), one hint: the `if` opcode sits after
    // the two const bytes, so its offset is 2.
    assert!(
        contains_bytes(&bytes, &[0x00, 0x01, 0x02, 0x01, 0x01]),
        "bytes: {bytes:02X?}"
    );
    validator::validate_module(&bytes).expect("module must validate");
}

#[test]
fn wasm_output_is_deterministic() {
    let build = || {
        wasm_module(vec![
            Instruction::new(Op::Wasm(WasmOp::BeginFunction {
                signature: Signature::new(vec![ValueType::I32], vec![ValueType::I32]),
            }))
            .with_output(v(100))
            .with_inner_outputs(vec![v(101)]),
            Instruction::new(Op::Wasm(WasmOp::Consti32 { value: 3 })).with_output(v(102)),
            Instruction::new(Op::Wasm(WasmOp::I32Binary {
                op: IntegerBinaryOp::Mul,
            }))
            .with_inputs(vec![v(101), v(102)])
            .with_output(v(103)),
            Instruction::new(Op::Wasm(WasmOp::EndFunction)).with_inputs(vec![v(103)]),
        ])
    };

    let (first, _) = lift_wasm(&build()).unwrap();
    let (second, _) = lift_wasm(&build()).unwrap();
    assert_eq!(first, second);
    validator::validate_module(&first).expect("module must validate");
}

#[test]
fn embedded_module_appears_in_javascript_output() {
    let mut code = Code::new();
    code.push(Instruction::new(Op::BeginWasmModule));
    code.push(
        Instruction::new(Op::Wasm(WasmOp::BeginFunction {
            signature: Signature::new(vec![], vec![ValueType::I32]),
        }))
        .with_output(v(0)),
    );
    code.push(Instruction::new(Op::Wasm(WasmOp::Consti32 { value: 7 })).with_output(v(1)));
    code.push(Instruction::new(Op::Wasm(WasmOp::EndFunction)).with_inputs(vec![v(1)]));
    code.push(Instruction::new(Op::EndWasmModule).with_output(v(2)));
    code.push(
        Instruction::new(Op::CallFunction)
            .with_inputs(vec![v(0)])
            .with_output(v(3)),
    );
    code.push(Instruction::new(Op::Print).with_inputs(vec![v(3)]));

    let output = lift_js(&code);
    assert!(
        output.contains("new WebAssembly.Instance(new WebAssembly.Module(new Uint8Array(["),
        "was: {output}"
    );
    assert!(output.contains("const v0 = v2.w0;"), "was: {output}");
    assert!(output.contains("fuzzilli('FUZZILLI_PRINT', v0());"), "was: {output}");
}
