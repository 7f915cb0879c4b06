//! The instruction-dispatched JavaScript lifter.
//!
//! Walks a FIL program in order and emits JavaScript for every opcode. Each
//! value-producing instruction builds an [`Expression`] for its output;
//! depending on the inlining policy and the variable's def-use facts the
//! expression is either held back for inlining into its consumer or spilled
//! to a named temporary. Statement-producing opcodes emit directly through
//! the script writer.
//!
//! Embedded Wasm blocks are handed to the binary lifter; the returned bytes
//! are embedded as a `Uint8Array` literal and instantiated inline, with the
//! module's imports bound from the surrounding JavaScript variables.

use crate::errors::LiftError;
use crate::fil::analysis::DefUseAnalyzer;
use crate::fil::opcodes::{Op, UnaryOperator};
use crate::fil::typer::Typer;
use crate::fil::{Code, Instruction, Program, Variable};
use crate::lifting::expression::{Expression, ExpressionClass};
use crate::lifting::inliner::{InlineSingleUse, Inliner};
use crate::lifting::options::LiftingOptions;
use crate::lifting::scaffolds;
use crate::lifting::script_writer::{ScriptWriter, ScriptWriterConfig};
use crate::wasm::lifter::WasmLifter;
use crate::{lift_log, return_fatal_error};
use crate::wasm::types::WasmGlobalValue;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

use ExpressionClass::*;

/// Lifts FIL programs to JavaScript source text.
pub struct JsLifter {
    /// Emitted ahead of the program, e.g. a harness preamble.
    pub prefix: String,
    /// Emitted after the program.
    pub suffix: String,
    /// Identifier naming the global object in emitted code.
    pub global_object: String,
    inliner: Box<dyn Inliner>,
}

impl Default for JsLifter {
    fn default() -> JsLifter {
        JsLifter::new()
    }
}

impl JsLifter {
    pub fn new() -> JsLifter {
        JsLifter {
            prefix: String::new(),
            suffix: String::new(),
            global_object: "this".to_owned(),
            inliner: Box::new(InlineSingleUse),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_global_object(mut self, name: impl Into<String>) -> Self {
        self.global_object = name.into();
        self
    }

    pub fn with_inliner(mut self, inliner: Box<dyn Inliner>) -> Self {
        self.inliner = inliner;
        self
    }

    /// Lifts a complete program, bracketed by the configured prefix and
    /// suffix.
    pub fn lift_program(
        &self,
        program: &Program,
        options: LiftingOptions,
    ) -> Result<String, LiftError> {
        self.lift_internal(&program.code, options, true)
    }

    /// Lifts a sub-program: no prefix/suffix, default options.
    pub fn lift_code(&self, code: &Code) -> Result<String, LiftError> {
        self.lift_internal(code, LiftingOptions::empty(), false)
    }

    fn lift_internal(
        &self,
        code: &Code,
        options: LiftingOptions,
        with_bracketing: bool,
    ) -> Result<String, LiftError> {
        if !code.is_structurally_sound() {
            return Err(LiftError::invalid_input(
                "program has unbalanced block instructions",
            ));
        }

        let writer_config = ScriptWriterConfig {
            minify: options.contains(LiftingOptions::MINIFY),
            strip_comments: !options.contains(LiftingOptions::INCLUDE_COMMENTS)
                && !options.contains(LiftingOptions::DUMP_TYPES),
            ..ScriptWriterConfig::default()
        };

        let mut lifting = Lifting {
            code,
            options,
            writer: ScriptWriter::new(writer_config.clone()),
            writer_config,
            saved_writers: Vec::new(),
            expressions: FxHashMap::default(),
            bound_names: FxHashMap::default(),
            analyzer: DefUseAnalyzer::analyze(code),
            typer: Typer::analyze(code)?,
            inliner: self.inliner.as_ref(),
            global_object: &self.global_object,
            code_string_depth: 0,
            for_loops: Vec::new(),
            collected_types: BTreeMap::new(),
        };

        lift_log!("lifting {} instructions to JavaScript", code.len());
        if with_bracketing && !self.prefix.is_empty() {
            lifting.writer.emit_block(&self.prefix);
        }
        lifting.emit_scaffolds();
        lifting.run()?;
        if with_bracketing && !self.suffix.is_empty() {
            lifting.writer.emit_block(&self.suffix);
        }

        if options.contains(LiftingOptions::COLLECT_TYPES) {
            let report = serde_json::to_string(&lifting.collected_types)
                .map_err(|e| LiftError::fatal(format!("type report serialization failed: {e}")))?;
            lifting.writer.emit_line(&format!("// TYPES: {}", report));
        }

        debug_assert_eq!(lifting.writer.current_indent(), 0);
        Ok(lifting.writer.into_code())
    }
}

/// A composed expression waiting to be consumed by a later instruction.
struct PendingExpression {
    expression: Expression,
    /// Pure atoms may be inlined at every use; everything else is consumed
    /// by its first (and only) use.
    multi_use: bool,
}

/// Clauses of a `for` loop being assembled across its four header blocks.
struct ForLoopState {
    init_clause: String,
    cond_clause: String,
    loop_variables: Vec<String>,
}

struct Lifting<'a> {
    code: &'a Code,
    options: LiftingOptions,
    writer: ScriptWriter,
    writer_config: ScriptWriterConfig,
    /// Outer writers while a loop header block is buffered.
    saved_writers: Vec<ScriptWriter>,
    expressions: FxHashMap<Variable, PendingExpression>,
    /// Variables bound to a fixed name (`this`, re-bound loop variables).
    bound_names: FxHashMap<Variable, String>,
    analyzer: DefUseAnalyzer,
    typer: Typer,
    inliner: &'a dyn Inliner,
    global_object: &'a str,
    code_string_depth: usize,
    for_loops: Vec<ForLoopState>,
    collected_types: BTreeMap<String, String>,
}

impl<'a> Lifting<'a> {
    fn run(&mut self) -> Result<(), LiftError> {
        let mut index = 0;
        while index < self.code.len() {
            let instruction = &self.code[index];

            if self.options.contains(LiftingOptions::INCLUDE_COMMENTS) {
                if let Some(comment) = &instruction.comment {
                    self.writer.emit_comment(comment);
                }
            }

            if matches!(instruction.op, Op::BeginWasmModule) {
                index = self.lift_wasm_module(index)?;
                continue;
            }

            self.lift_instruction(instruction)?;
            self.note_types(instruction);
            index += 1;
        }
        Ok(())
    }

    /// Emits the runtime-mutator scaffolds needed anywhere in the program,
    /// ahead of their first use.
    fn emit_scaffolds(&mut self) {
        let mut needs_explore = false;
        let mut needs_probe = false;
        let mut needs_fixup = false;
        for instruction in self.code {
            match instruction.op {
                Op::Explore { .. } => needs_explore = true,
                Op::Probe { .. } => needs_probe = true,
                Op::Fixup { .. } => needs_fixup = true,
                _ => {}
            }
        }
        if needs_explore {
            self.writer.emit_block(scaffolds::EXPLORE_SCAFFOLD);
        }
        if needs_probe {
            self.writer.emit_block(scaffolds::PROBE_SCAFFOLD);
        }
        if needs_fixup {
            self.writer.emit_block(scaffolds::FIXUP_SCAFFOLD);
        }
    }

    fn note_types(&mut self, instruction: &Instruction) {
        let wants_dump = self.options.contains(LiftingOptions::DUMP_TYPES);
        let wants_collect = self.options.contains(LiftingOptions::COLLECT_TYPES);
        if !wants_dump && !wants_collect {
            return;
        }
        for variable in instruction.all_outputs() {
            let name = self.typer.type_of(variable).display_name();
            if wants_dump {
                self.writer
                    .emit_comment(&format!("{} : {}", variable, name));
            }
            if wants_collect {
                self.collected_types
                    .insert(variable.identifier(), name.to_owned());
            }
        }
    }

    // ----- expression and operand machinery -------------------------------

    fn identifier_for(&self, variable: Variable) -> Expression {
        match self.bound_names.get(&variable) {
            Some(name) => Expression::new(Identifier, name.clone()),
            None => Expression::new(Identifier, variable.identifier()),
        }
    }

    /// The expression producing input `i`, consuming a pending inline
    /// expression if one exists.
    fn input(&mut self, instruction: &Instruction, i: usize) -> Expression {
        let variable = instruction.input(i);
        match self.expressions.get(&variable) {
            Some(pending) if pending.multi_use => pending.expression.clone(),
            Some(_) => match self.expressions.remove(&variable) {
                Some(pending) => pending.expression,
                None => self.identifier_for(variable),
            },
            None => self.identifier_for(variable),
        }
    }

    fn inputs(&mut self, instruction: &Instruction, from: usize) -> Vec<Expression> {
        (from..instruction.inputs.len())
            .map(|i| self.input(instruction, i))
            .collect()
    }

    fn output(&self, instruction: &Instruction) -> Result<Variable, LiftError> {
        instruction.outputs.first().copied().ok_or_else(|| {
            LiftError::fatal(format!("{} has no output variable", instruction.op.name()))
                .at(instruction.index)
        })
    }

    fn declaration_keyword(&self, variable: Variable) -> &'static str {
        if self.analyzer.is_reassigned(variable) {
            "let"
        } else {
            "const"
        }
    }

    /// Binds `expression` to the instruction's output: either held back for
    /// inlining or spilled to a named temporary.
    fn define(
        &mut self,
        instruction: &Instruction,
        variable: Variable,
        expression: Expression,
    ) -> Result<(), LiftError> {
        if self.may_inline(instruction, variable, &expression) {
            let multi_use = !expression.is_effectful() && is_atom(expression.class());
            self.expressions.insert(
                variable,
                PendingExpression {
                    expression,
                    multi_use,
                },
            );
            return Ok(());
        }

        self.writer.emit_line(&format!(
            "{} {} = {};",
            self.declaration_keyword(variable),
            variable,
            expression.text()
        ));
        Ok(())
    }

    fn may_inline(
        &self,
        instruction: &Instruction,
        variable: Variable,
        expression: &Expression,
    ) -> bool {
        if !self.inliner.should_inline(expression) || self.analyzer.is_reassigned(variable) {
            return false;
        }
        let uses = self.analyzer.uses(variable);
        if uses.is_empty() {
            return false;
        }
        if !expression.is_effectful() {
            // Pure: any single use, or every use for trivial atoms.
            return uses.len() == 1 || is_atom(expression.class());
        }
        // Effectful: exactly one use, after the definition, with no
        // intervening effectful producer that could observe the reordering.
        if uses.len() != 1 || uses[0] <= instruction.index {
            return false;
        }
        self.code.instructions()[instruction.index + 1..uses[0]]
            .iter()
            .all(|between| !between.op.has_side_effects())
    }

    fn emit_statement(&mut self, expression: Expression) {
        self.writer
            .emit_line(&format!("{};", expression.into_text()));
    }

    // ----- small expression builders --------------------------------------

    fn member(&self, object: Expression, name: &str) -> Expression {
        Expression::new(MemberExpression, "")
            .extend(&object)
            .extend_text(&format!(".{}", name))
    }

    fn computed_member(&self, object: Expression, key: &Expression) -> Expression {
        Expression::new(MemberExpression, "")
            .extend(&object)
            .extend_text("[")
            .extend_argument(key)
            .extend_text("]")
    }

    fn element_member(&self, object: Expression, index: i64) -> Expression {
        Expression::new(MemberExpression, "")
            .extend(&object)
            .extend_text(&format!("[{}]", index))
    }

    fn call(&self, callee: Expression, arguments: &[Expression]) -> Expression {
        let mut expression = Expression::new(CallExpression, "").extend(&callee).extend_text("(");
        for (i, argument) in arguments.iter().enumerate() {
            if i > 0 {
                expression = expression.extend_text(", ");
            }
            expression = expression.extend_argument(argument);
        }
        expression.extend_text(")")
    }

    fn call_with_spreads(
        &self,
        callee: Expression,
        arguments: &[Expression],
        spreads: &[bool],
    ) -> Expression {
        let mut expression = Expression::new(CallExpression, "").extend(&callee).extend_text("(");
        for (i, argument) in arguments.iter().enumerate() {
            if i > 0 {
                expression = expression.extend_text(", ");
            }
            if spreads.get(i).copied().unwrap_or(false) {
                expression = expression.extend_text("...");
            }
            expression = expression.extend_argument(argument);
        }
        expression.extend_text(")")
    }

    fn new_expression(
        &self,
        callee: Expression,
        arguments: &[Expression],
        spreads: Option<&[bool]>,
    ) -> Expression {
        let mut expression = Expression::new(NewExpression, "new ");
        // Identifier and member callees bind at least as tightly as `new`;
        // anything else (calls included) must be isolated.
        if matches!(callee.class(), Identifier | MemberExpression) {
            expression = expression.extend_enclosed(&callee);
        } else {
            expression = expression
                .extend_text("(")
                .extend_argument(&callee)
                .extend_text(")");
        }
        expression = expression.extend_text("(");
        for (i, argument) in arguments.iter().enumerate() {
            if i > 0 {
                expression = expression.extend_text(", ");
            }
            if let Some(spreads) = spreads {
                if spreads.get(i).copied().unwrap_or(false) {
                    expression = expression.extend_text("...");
                }
            }
            expression = expression.extend_argument(argument);
        }
        expression.extend_text(")")
    }

    fn binary(&self, lhs: &Expression, token: &str, rhs: &Expression) -> Expression {
        Expression::new(BinaryExpression, "")
            .extend(lhs)
            .extend_text(&format!(" {} ", token))
            .extend(rhs)
    }

    fn assignment_statement(&mut self, target: Expression, token: &str, value: Expression) {
        let expression = Expression::new(AssignmentExpression, "")
            .extend(&target)
            .extend_text(&format!(" {} ", token))
            .extend(&value);
        self.emit_statement(expression);
    }

    fn float_expression(&self, value: f64) -> Expression {
        if value.is_nan() {
            Expression::new(Identifier, "NaN")
        } else if value.is_infinite() {
            if value.is_sign_positive() {
                Expression::new(Identifier, "Infinity")
            } else {
                Expression::new(NegativeNumberLiteral, "-Infinity")
            }
        } else if value < 0.0 || (value == 0.0 && value.is_sign_negative()) {
            Expression::new(NegativeNumberLiteral, format_float(value))
        } else {
            Expression::new(NumberLiteral, format_float(value))
        }
    }

    fn global_value_expression(&self, value: WasmGlobalValue) -> Expression {
        match value {
            WasmGlobalValue::I32(v) => integer_expression(i64::from(v)),
            WasmGlobalValue::I64(v) => {
                let class = if v < 0 { NegativeNumberLiteral } else { NumberLiteral };
                Expression::new(class, format!("{}n", v))
            }
            WasmGlobalValue::F32(v) => self.float_expression(f64::from(v)),
            WasmGlobalValue::F64(v) => self.float_expression(v),
            WasmGlobalValue::RefNull(_) => Expression::new(Literal, "null"),
        }
    }

    // ----- loop header buffering ------------------------------------------

    fn push_buffer(&mut self) {
        let fresh = ScriptWriter::new(self.writer_config.clone());
        let outer = std::mem::replace(&mut self.writer, fresh);
        self.saved_writers.push(outer);
    }

    /// Ends buffering and returns the buffered statements as a single line
    /// (empty when the block emitted nothing).
    fn pop_buffer(&mut self) -> Result<String, LiftError> {
        let outer = self
            .saved_writers
            .pop()
            .ok_or_else(|| LiftError::fatal("loop block ended without a buffered writer"))?;
        let buffered = std::mem::replace(&mut self.writer, outer);
        let joined = buffered
            .code()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Ok(joined)
    }

    fn condition_clause(&self, buffered: String, condition: Option<Expression>) -> String {
        let condition_text = condition
            .map(|expression| expression.into_text())
            .unwrap_or_default();
        if buffered.is_empty() {
            condition_text
        } else if condition_text.is_empty() {
            format!("(() => {{ {} }})()", buffered)
        } else {
            format!("(() => {{ {} return {}; }})()", buffered, condition_text)
        }
    }

    // ----- embedded Wasm modules ------------------------------------------

    /// Lifts the instruction range of one embedded Wasm module and emits the
    /// instantiation plus export bindings. Returns the index just past the
    /// module's end instruction.
    fn lift_wasm_module(&mut self, begin_index: usize) -> Result<usize, LiftError> {
        let end_index = self.code.block_end_index(begin_index).ok_or_else(|| {
            LiftError::invalid_input("unterminated Wasm module").at(begin_index)
        })?;

        let result = WasmLifter::lift_range(
            self.code,
            begin_index + 1..end_index,
            &self.typer,
            &self.analyzer,
        )?;

        lift_log!(
            "embedded wasm module: {} bytes, {} imports",
            result.bytes.len(),
            result.imports.len()
        );

        let end_instruction = &self.code[end_index];
        let exports_variable = self.output(end_instruction)?;

        let bytes_text = result
            .bytes
            .iter()
            .map(|byte| byte.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let imports_text = result
            .imports
            .iter()
            .map(|binding| {
                format!(
                    "{}: {}",
                    binding.name,
                    self.identifier_for(binding.variable).into_text()
                )
            })
            .collect::<Vec<_>>()
            .join(", ");

        self.writer.emit_line(&format!(
            "{} {} = new WebAssembly.Instance(new WebAssembly.Module(new Uint8Array([{}])), {{ imports: {{ {} }} }}).exports;",
            self.declaration_keyword(exports_variable),
            exports_variable,
            bytes_text,
            imports_text
        ));

        for (variable, export_name) in &result.entity_bindings {
            if self.analyzer.num_uses(*variable) == 0 {
                continue;
            }
            self.writer.emit_line(&format!(
                "{} {} = {}.{};",
                self.declaration_keyword(*variable),
                variable,
                exports_variable,
                export_name
            ));
        }

        self.note_types(end_instruction);
        Ok(end_index + 1)
    }

    // ----- the opcode dispatch --------------------------------------------

    #[allow(clippy::too_many_lines)]
    fn lift_instruction(&mut self, instr: &Instruction) -> Result<(), LiftError> {
        match &instr.op {
            Op::LoadInteger { value } => {
                let out = self.output(instr)?;
                self.define(instr, out, integer_expression(*value))?;
            }
            Op::LoadBigInt { value } => {
                let out = self.output(instr)?;
                let class = if *value < 0 { NegativeNumberLiteral } else { NumberLiteral };
                self.define(instr, out, Expression::new(class, format!("{}n", value)))?;
            }
            Op::LoadFloat { value } => {
                let out = self.output(instr)?;
                let expression = self.float_expression(*value);
                self.define(instr, out, expression)?;
            }
            Op::LoadString { value } => {
                let out = self.output(instr)?;
                self.define(instr, out, Expression::new(StringLiteral, escape_js_string(value)))?;
            }
            Op::LoadBoolean { value } => {
                let out = self.output(instr)?;
                self.define(instr, out, Expression::new(Literal, if *value { "true" } else { "false" }))?;
            }
            Op::LoadUndefined => {
                let out = self.output(instr)?;
                self.define(instr, out, Expression::new(Keyword, "undefined"))?;
            }
            Op::LoadNull => {
                let out = self.output(instr)?;
                self.define(instr, out, Expression::new(Literal, "null"))?;
            }
            Op::LoadThis => {
                let out = self.output(instr)?;
                self.define(instr, out, Expression::new(Keyword, "this"))?;
            }
            Op::LoadArguments => {
                let out = self.output(instr)?;
                self.define(instr, out, Expression::new(Identifier, "arguments"))?;
            }
            Op::LoadNewTarget => {
                let out = self.output(instr)?;
                self.define(instr, out, Expression::new(MemberExpression, "new.target"))?;
            }
            Op::LoadRegExp { pattern, flags } => {
                let out = self.output(instr)?;
                self.define(
                    instr,
                    out,
                    Expression::new(RegExpLiteral, format!("/{}/{}", pattern, flags)),
                )?;
            }
            Op::LoadBuiltin { name } => {
                let out = self.output(instr)?;
                self.define(instr, out, Expression::new(Identifier, name.clone()))?;
            }

            Op::LoadNamedVariable { name } => {
                let out = self.output(instr)?;
                self.define(instr, out, Expression::new(Identifier, name.clone()))?;
            }
            Op::StoreNamedVariable { name } => {
                let value = self.input(instr, 0);
                self.assignment_statement(Expression::new(Identifier, name.clone()), "=", value);
            }
            Op::DefineNamedVariable { name } => {
                let value = self.input(instr, 0);
                self.writer
                    .emit_line(&format!("var {} = {};", name, value.text()));
            }

            Op::CreateObject { property_names } => {
                let out = self.output(instr)?;
                let values = self.inputs(instr, 0);
                let mut expression = Expression::new(ObjectLiteral, "{");
                for (i, (name, value)) in property_names.iter().zip(&values).enumerate() {
                    if i > 0 {
                        expression = expression.extend_text(", ");
                    }
                    expression = expression
                        .extend_text(&format!("{}: ", quote_property_name(name)))
                        .extend_argument(value);
                }
                self.define(instr, out, expression.extend_text("}"))?;
            }
            Op::CreateObjectWithSpread { property_names } => {
                let out = self.output(instr)?;
                let values = self.inputs(instr, 0);
                let mut expression = Expression::new(ObjectLiteral, "{");
                let mut first = true;
                for (name, value) in property_names.iter().zip(&values) {
                    if !first {
                        expression = expression.extend_text(", ");
                    }
                    first = false;
                    expression = expression
                        .extend_text(&format!("{}: ", quote_property_name(name)))
                        .extend_argument(value);
                }
                for value in values.iter().skip(property_names.len()) {
                    if !first {
                        expression = expression.extend_text(", ");
                    }
                    first = false;
                    expression = expression.extend_text("...").extend_argument(value);
                }
                self.define(instr, out, expression.extend_text("}"))?;
            }
            Op::CreateArray => {
                let out = self.output(instr)?;
                let values = self.inputs(instr, 0);
                let mut expression = Expression::new(ArrayLiteral, "[");
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        expression = expression.extend_text(",");
                    }
                    expression = expression.extend_argument(value);
                }
                self.define(instr, out, expression.extend_text("]"))?;
            }
            Op::CreateArrayWithSpread { spreads } => {
                let out = self.output(instr)?;
                let values = self.inputs(instr, 0);
                let mut expression = Expression::new(ArrayLiteral, "[");
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        expression = expression.extend_text(",");
                    }
                    if spreads.get(i).copied().unwrap_or(false) {
                        expression = expression.extend_text("...");
                    }
                    expression = expression.extend_argument(value);
                }
                self.define(instr, out, expression.extend_text("]"))?;
            }
            Op::CreateTemplateString { parts } => {
                let out = self.output(instr)?;
                let values = self.inputs(instr, 0);
                let mut expression = Expression::new(TemplateLiteral, "`");
                for (i, part) in parts.iter().enumerate() {
                    expression = expression.extend_text(&escape_template_part(part));
                    if let Some(value) = values.get(i) {
                        expression = expression
                            .extend_text("${")
                            .extend_argument(value)
                            .extend_text("}");
                    }
                }
                self.define(instr, out, expression.extend_text("`"))?;
            }

            Op::GetProperty { name } => {
                let out = self.output(instr)?;
                let object = self.input(instr, 0);
                let expression = self.member(object, name);
                self.define(instr, out, expression)?;
            }
            Op::SetProperty { name } => {
                let object = self.input(instr, 0);
                let value = self.input(instr, 1);
                let target = self.member(object, name);
                self.assignment_statement(target, "=", value);
            }
            Op::UpdateProperty { name, op } => {
                let object = self.input(instr, 0);
                let value = self.input(instr, 1);
                let target = self.member(object, name);
                let token = format!("{}=", op.token());
                self.assignment_statement(target, &token, value);
            }
            Op::DeleteProperty { name } => {
                let out = self.output(instr)?;
                let object = self.input(instr, 0);
                let target = self.member(object, name);
                let expression = Expression::new(UnaryExpression, "delete ").extend(&target);
                self.define(instr, out, expression)?;
            }
            Op::GetElement { index } => {
                let out = self.output(instr)?;
                let object = self.input(instr, 0);
                let expression = self.element_member(object, *index);
                self.define(instr, out, expression)?;
            }
            Op::SetElement { index } => {
                let object = self.input(instr, 0);
                let value = self.input(instr, 1);
                let target = self.element_member(object, *index);
                self.assignment_statement(target, "=", value);
            }
            Op::UpdateElement { index, op } => {
                let object = self.input(instr, 0);
                let value = self.input(instr, 1);
                let target = self.element_member(object, *index);
                let token = format!("{}=", op.token());
                self.assignment_statement(target, &token, value);
            }
            Op::DeleteElement { index } => {
                let out = self.output(instr)?;
                let object = self.input(instr, 0);
                let target = self.element_member(object, *index);
                let expression = Expression::new(UnaryExpression, "delete ").extend(&target);
                self.define(instr, out, expression)?;
            }
            Op::GetComputedProperty => {
                let out = self.output(instr)?;
                let object = self.input(instr, 0);
                let key = self.input(instr, 1);
                let expression = self.computed_member(object, &key);
                self.define(instr, out, expression)?;
            }
            Op::SetComputedProperty => {
                let object = self.input(instr, 0);
                let key = self.input(instr, 1);
                let value = self.input(instr, 2);
                let target = self.computed_member(object, &key);
                self.assignment_statement(target, "=", value);
            }
            Op::UpdateComputedProperty { op } => {
                let object = self.input(instr, 0);
                let key = self.input(instr, 1);
                let value = self.input(instr, 2);
                let target = self.computed_member(object, &key);
                let token = format!("{}=", op.token());
                self.assignment_statement(target, &token, value);
            }
            Op::DeleteComputedProperty => {
                let out = self.output(instr)?;
                let object = self.input(instr, 0);
                let key = self.input(instr, 1);
                let target = self.computed_member(object, &key);
                let expression = Expression::new(UnaryExpression, "delete ").extend(&target);
                self.define(instr, out, expression)?;
            }
            Op::GetPrivateProperty { name } => {
                let out = self.output(instr)?;
                let object = self.input(instr, 0);
                let expression = self.member(object, &format!("#{}", name));
                self.define(instr, out, expression)?;
            }
            Op::SetPrivateProperty { name } => {
                let object = self.input(instr, 0);
                let value = self.input(instr, 1);
                let target = self.member(object, &format!("#{}", name));
                self.assignment_statement(target, "=", value);
            }
            Op::UpdatePrivateProperty { name, op } => {
                let object = self.input(instr, 0);
                let value = self.input(instr, 1);
                let target = self.member(object, &format!("#{}", name));
                let token = format!("{}=", op.token());
                self.assignment_statement(target, &token, value);
            }
            Op::CallPrivateMethod { name } => {
                let out = self.output(instr)?;
                let object = self.input(instr, 0);
                let arguments = self.inputs(instr, 1);
                let callee = self.member(object, &format!("#{}", name));
                let expression = self.call(callee, &arguments);
                self.define(instr, out, expression)?;
            }
            Op::GetSuperProperty { name } => {
                let out = self.output(instr)?;
                let expression = Expression::new(MemberExpression, format!("super.{}", name));
                self.define(instr, out, expression)?;
            }
            Op::SetSuperProperty { name } => {
                let value = self.input(instr, 0);
                let target = Expression::new(MemberExpression, format!("super.{}", name));
                self.assignment_statement(target, "=", value);
            }
            Op::UpdateSuperProperty { name, op } => {
                let value = self.input(instr, 0);
                let target = Expression::new(MemberExpression, format!("super.{}", name));
                let token = format!("{}=", op.token());
                self.assignment_statement(target, &token, value);
            }
            Op::CallSuperConstructor => {
                let arguments = self.inputs(instr, 0);
                let expression = self.call(Expression::new(Keyword, "super"), &arguments);
                self.emit_statement(expression);
            }
            Op::CallSuperMethod { name } => {
                let out = self.output(instr)?;
                let arguments = self.inputs(instr, 0);
                let callee = Expression::new(MemberExpression, format!("super.{}", name));
                let expression = self.call(callee, &arguments);
                self.define(instr, out, expression)?;
            }

            Op::CallFunction => {
                let out = self.output(instr)?;
                let callee = self.input(instr, 0);
                let arguments = self.inputs(instr, 1);
                let expression = self.call(callee, &arguments);
                self.define(instr, out, expression)?;
            }
            Op::CallFunctionWithSpread { spreads } => {
                let out = self.output(instr)?;
                let callee = self.input(instr, 0);
                let arguments = self.inputs(instr, 1);
                let expression = self.call_with_spreads(callee, &arguments, spreads);
                self.define(instr, out, expression)?;
            }
            Op::Construct => {
                let out = self.output(instr)?;
                let callee = self.input(instr, 0);
                let arguments = self.inputs(instr, 1);
                let expression = self.new_expression(callee, &arguments, None);
                self.define(instr, out, expression)?;
            }
            Op::ConstructWithSpread { spreads } => {
                let out = self.output(instr)?;
                let callee = self.input(instr, 0);
                let arguments = self.inputs(instr, 1);
                let expression = self.new_expression(callee, &arguments, Some(spreads));
                self.define(instr, out, expression)?;
            }
            Op::CallMethod { name } => {
                let out = self.output(instr)?;
                let object = self.input(instr, 0);
                let arguments = self.inputs(instr, 1);
                let callee = self.member(object, name);
                let expression = self.call(callee, &arguments);
                self.define(instr, out, expression)?;
            }
            Op::CallMethodWithSpread { name, spreads } => {
                let out = self.output(instr)?;
                let object = self.input(instr, 0);
                let arguments = self.inputs(instr, 1);
                let callee = self.member(object, name);
                let expression = self.call_with_spreads(callee, &arguments, spreads);
                self.define(instr, out, expression)?;
            }
            Op::CallComputedMethod => {
                let out = self.output(instr)?;
                let object = self.input(instr, 0);
                let method = self.input(instr, 1);
                let arguments = self.inputs(instr, 2);
                let callee = self.computed_member(object, &method);
                let expression = self.call(callee, &arguments);
                self.define(instr, out, expression)?;
            }
            Op::CallComputedMethodWithSpread { spreads } => {
                let out = self.output(instr)?;
                let object = self.input(instr, 0);
                let method = self.input(instr, 1);
                let arguments = self.inputs(instr, 2);
                let callee = self.computed_member(object, &method);
                let expression = self.call_with_spreads(callee, &arguments, spreads);
                self.define(instr, out, expression)?;
            }

            Op::UnaryOperation { op } => {
                let operand_variable = instr.input(0);
                if matches!(
                    op,
                    UnaryOperator::PreInc
                        | UnaryOperator::PreDec
                        | UnaryOperator::PostInc
                        | UnaryOperator::PostDec
                ) {
                    // Increment/decrement needs a reference, so the operand
                    // is always addressed by name.
                    let out = self.output(instr)?;
                    let operand = self.identifier_for(operand_variable);
                    let expression = if op.is_postfix() {
                        Expression::new(PostfixExpression, "")
                            .extend(&operand)
                            .extend_text(op.token())
                    } else {
                        Expression::new(UnaryExpression, op.token()).extend(&operand)
                    };
                    self.define(instr, out, expression)?;
                } else {
                    let out = self.output(instr)?;
                    let operand = self.input(instr, 0);
                    let expression = Expression::new(UnaryExpression, op.token()).extend(&operand);
                    self.define(instr, out, expression)?;
                }
            }
            Op::BinaryOperation { op } => {
                let out = self.output(instr)?;
                let lhs = self.input(instr, 0);
                let rhs = self.input(instr, 1);
                let expression = self.binary(&lhs, op.token(), &rhs);
                self.define(instr, out, expression)?;
            }
            Op::TernaryOperation => {
                let out = self.output(instr)?;
                let condition = self.input(instr, 0);
                let then_value = self.input(instr, 1);
                let else_value = self.input(instr, 2);
                let expression = Expression::new(TernaryExpression, "")
                    .extend(&condition)
                    .extend_text(" ? ")
                    .extend(&then_value)
                    .extend_text(" : ")
                    .extend(&else_value);
                self.define(instr, out, expression)?;
            }
            Op::Update { op } => {
                let target = self.identifier_for(instr.input(0));
                let value = self.input(instr, 1);
                let token = format!("{}=", op.token());
                self.assignment_statement(target, &token, value);
            }
            Op::Reassign => {
                let target = self.identifier_for(instr.input(0));
                let value = self.input(instr, 1);
                self.assignment_statement(target, "=", value);
            }
            Op::Dup => {
                let out = self.output(instr)?;
                let value = self.input(instr, 0);
                self.writer.emit_line(&format!(
                    "{} {} = {};",
                    self.declaration_keyword(out),
                    out,
                    value.text()
                ));
            }
            Op::Compare { op } => {
                let out = self.output(instr)?;
                let lhs = self.input(instr, 0);
                let rhs = self.input(instr, 1);
                let expression = self.binary(&lhs, op.token(), &rhs);
                self.define(instr, out, expression)?;
            }
            Op::TypeOf => {
                let out = self.output(instr)?;
                let operand = self.input(instr, 0);
                let expression = Expression::new(UnaryExpression, "typeof ").extend(&operand);
                self.define(instr, out, expression)?;
            }
            Op::TestInstanceOf => {
                let out = self.output(instr)?;
                let lhs = self.input(instr, 0);
                let rhs = self.input(instr, 1);
                let expression = self.binary(&lhs, "instanceof", &rhs);
                self.define(instr, out, expression)?;
            }
            Op::TestIn => {
                let out = self.output(instr)?;
                let lhs = self.input(instr, 0);
                let rhs = self.input(instr, 1);
                let expression = self.binary(&lhs, "in", &rhs);
                self.define(instr, out, expression)?;
            }
            Op::Eval { code } => {
                let mut text = code.clone();
                for i in 0..instr.inputs.len() {
                    let value = self.input(instr, i);
                    text = text.replacen("{}", value.text(), 1);
                }
                self.writer.emit_line(&text);
            }

            Op::DestructArray {
                indices,
                has_rest_element,
            } => {
                let source = self.input(instr, 0);
                let pattern =
                    array_destruct_pattern(indices, &instr.outputs, *has_rest_element);
                let keyword = if instr
                    .outputs
                    .iter()
                    .any(|variable| self.analyzer.is_reassigned(*variable))
                {
                    "let"
                } else {
                    "const"
                };
                self.writer.emit_line(&format!(
                    "{} {} = {};",
                    keyword,
                    pattern,
                    source.text()
                ));
            }
            Op::DestructArrayAndReassign {
                indices,
                has_rest_element,
            } => {
                let source = self.input(instr, 0);
                let pattern =
                    array_destruct_pattern(indices, &instr.inputs[1..], *has_rest_element);
                self.writer
                    .emit_line(&format!("{} = {};", pattern, source.text()));
            }
            Op::DestructObject {
                property_names,
                has_rest_element,
            } => {
                let source = self.input(instr, 0);
                let pattern =
                    object_destruct_pattern(property_names, &instr.outputs, *has_rest_element);
                let keyword = if instr
                    .outputs
                    .iter()
                    .any(|variable| self.analyzer.is_reassigned(*variable))
                {
                    "let"
                } else {
                    "const"
                };
                self.writer.emit_line(&format!(
                    "{} {} = {};",
                    keyword,
                    pattern,
                    source.text()
                ));
            }
            Op::DestructObjectAndReassign {
                property_names,
                has_rest_element,
            } => {
                let source = self.input(instr, 0);
                let pattern =
                    object_destruct_pattern(property_names, &instr.inputs[1..], *has_rest_element);
                // A bare `{` would parse as a block, so the assignment is
                // parenthesized.
                self.writer
                    .emit_line(&format!("({} = {});", pattern, source.text()));
            }

            Op::BeginPlainFunction { has_rest_param } => {
                self.emit_function_header(instr, "function", *has_rest_param, false)?;
            }
            Op::BeginGeneratorFunction { has_rest_param } => {
                self.emit_function_header(instr, "function*", *has_rest_param, false)?;
            }
            Op::BeginAsyncFunction { has_rest_param } => {
                self.emit_function_header(instr, "async function", *has_rest_param, false)?;
            }
            Op::BeginAsyncGeneratorFunction { has_rest_param } => {
                self.emit_function_header(instr, "async function*", *has_rest_param, false)?;
            }
            Op::BeginConstructor { has_rest_param } => {
                self.emit_function_header(instr, "function", *has_rest_param, true)?;
            }
            Op::BeginArrowFunction { has_rest_param } => {
                let out = self.output(instr)?;
                let parameters = parameter_list(&instr.inner_outputs, *has_rest_param);
                self.writer.emit_line(&format!(
                    "{} {} = ({}) => {{",
                    self.declaration_keyword(out),
                    out,
                    parameters
                ));
                self.writer.increase_indent();
            }
            Op::BeginAsyncArrowFunction { has_rest_param } => {
                let out = self.output(instr)?;
                let parameters = parameter_list(&instr.inner_outputs, *has_rest_param);
                self.writer.emit_line(&format!(
                    "{} {} = async ({}) => {{",
                    self.declaration_keyword(out),
                    out,
                    parameters
                ));
                self.writer.increase_indent();
            }
            Op::EndPlainFunction
            | Op::EndGeneratorFunction
            | Op::EndAsyncFunction
            | Op::EndAsyncGeneratorFunction
            | Op::EndConstructor => {
                self.writer.decrease_indent();
                self.writer.emit_line("}");
            }
            Op::EndArrowFunction | Op::EndAsyncArrowFunction => {
                self.writer.decrease_indent();
                self.writer.emit_line("};");
            }
            Op::Return => {
                if instr.inputs.is_empty() {
                    self.writer.emit_line("return;");
                } else {
                    let value = self.input(instr, 0);
                    self.writer.emit_line(&format!("return {};", value.text()));
                }
            }
            Op::Yield => {
                let out = self.output(instr)?;
                let expression = if instr.inputs.is_empty() {
                    Expression::new(YieldExpression, "yield")
                } else {
                    let value = self.input(instr, 0);
                    Expression::new(YieldExpression, "yield ").extend(&value)
                };
                self.define(instr, out, expression)?;
            }
            Op::YieldEach => {
                let value = self.input(instr, 0);
                let expression = Expression::new(YieldExpression, "yield* ").extend(&value);
                self.emit_statement(expression);
            }
            Op::Await => {
                let out = self.output(instr)?;
                let value = self.input(instr, 0);
                let expression = Expression::new(UnaryExpression, "await ").extend(&value);
                self.define(instr, out, expression)?;
            }

            Op::BeginIf { inverted } => {
                let condition = self.input(instr, 0);
                let condition = if *inverted {
                    Expression::new(UnaryExpression, "!").extend(&condition)
                } else {
                    condition
                };
                self.writer
                    .emit_line(&format!("if ({}) {{", condition.text()));
                self.writer.increase_indent();
            }
            Op::BeginElse => {
                self.writer.decrease_indent();
                self.writer.emit_line("} else {");
                self.writer.increase_indent();
            }
            Op::EndIf => {
                self.writer.decrease_indent();
                self.writer.emit_line("}");
            }
            Op::BeginSwitch => {
                let discriminant = self.input(instr, 0);
                self.writer
                    .emit_line(&format!("switch ({}) {{", discriminant.text()));
                self.writer.increase_indent();
            }
            Op::BeginSwitchCase => {
                let value = self.input(instr, 0);
                self.writer.emit_line(&format!("case {}:", value.text()));
                self.writer.increase_indent();
            }
            Op::BeginSwitchDefaultCase => {
                self.writer.emit_line("default:");
                self.writer.increase_indent();
            }
            Op::EndSwitchCase { falls_through } => {
                if !falls_through {
                    self.writer.emit_line("break;");
                }
                self.writer.decrease_indent();
            }
            Op::EndSwitch => {
                self.writer.decrease_indent();
                self.writer.emit_line("}");
            }
            Op::SwitchBreak => {
                self.writer.emit_line("break;");
            }

            Op::BeginWhileLoopHeader => {
                self.push_buffer();
            }
            Op::BeginWhileLoopBody => {
                let condition = self.input(instr, 0);
                let buffered = self.pop_buffer()?;
                let clause = self.condition_clause(buffered, Some(condition));
                self.writer.emit_line(&format!("while ({}) {{", clause));
                self.writer.increase_indent();
            }
            Op::EndWhileLoop => {
                self.writer.decrease_indent();
                self.writer.emit_line("}");
            }
            Op::BeginDoWhileLoopBody => {
                self.writer.emit_line("do {");
                self.writer.increase_indent();
            }
            Op::BeginDoWhileLoopHeader => {
                self.writer.decrease_indent();
                self.push_buffer();
            }
            Op::EndDoWhileLoop => {
                let condition = self.input(instr, 0);
                let buffered = self.pop_buffer()?;
                let clause = self.condition_clause(buffered, Some(condition));
                self.writer.emit_line(&format!("}} while ({});", clause));
            }

            Op::BeginForLoopInitializer => {
                self.push_buffer();
            }
            Op::BeginForLoopCondition => {
                let initial_values = self.inputs(instr, 0);
                let buffered = self.pop_buffer()?;
                let loop_variables: Vec<String> = instr
                    .inner_outputs
                    .iter()
                    .map(|variable| variable.identifier())
                    .collect();
                let init_clause =
                    for_loop_initializer(&loop_variables, &initial_values, &buffered);
                self.for_loops.push(ForLoopState {
                    init_clause,
                    cond_clause: String::new(),
                    loop_variables,
                });
                self.push_buffer();
            }
            Op::BeginForLoopAfterthought => {
                let condition = if instr.inputs.is_empty() {
                    None
                } else {
                    Some(self.input(instr, 0))
                };
                let buffered = self.pop_buffer()?;
                let clause = self.condition_clause(buffered, condition);
                let state = self
                    .for_loops
                    .last_mut()
                    .ok_or_else(|| LiftError::fatal("for-loop afterthought outside a for loop"))?;
                state.cond_clause = clause;
                let names = state.loop_variables.clone();
                self.rebind_loop_variables(&instr.inner_outputs, &names);
                self.push_buffer();
            }
            Op::BeginForLoopBody => {
                let buffered = self.pop_buffer()?;
                let state = self
                    .for_loops
                    .last()
                    .ok_or_else(|| LiftError::fatal("for-loop body outside a for loop"))?;
                let after_clause = afterthought_clause(&buffered);
                let header = format!(
                    "for ({}; {}; {}) {{",
                    state.init_clause, state.cond_clause, after_clause
                );
                let names = state.loop_variables.clone();
                self.rebind_loop_variables(&instr.inner_outputs, &names);
                self.writer.emit_line(&header);
                self.writer.increase_indent();
            }
            Op::EndForLoop => {
                self.for_loops.pop();
                self.writer.decrease_indent();
                self.writer.emit_line("}");
            }

            Op::BeginForInLoop => {
                let object = self.input(instr, 0);
                let variable = instr.inner_outputs[0];
                self.writer.emit_line(&format!(
                    "for ({} {} in {}) {{",
                    self.declaration_keyword(variable),
                    variable,
                    object.text()
                ));
                self.writer.increase_indent();
            }
            Op::EndForInLoop => {
                self.writer.decrease_indent();
                self.writer.emit_line("}");
            }
            Op::BeginForOfLoop => {
                let iterable = self.input(instr, 0);
                let variable = instr.inner_outputs[0];
                self.writer.emit_line(&format!(
                    "for ({} {} of {}) {{",
                    self.declaration_keyword(variable),
                    variable,
                    iterable.text()
                ));
                self.writer.increase_indent();
            }
            Op::BeginForOfLoopWithDestruct {
                indices,
                has_rest_element,
            } => {
                let iterable = self.input(instr, 0);
                let pattern =
                    array_destruct_pattern(indices, &instr.inner_outputs, *has_rest_element);
                self.writer.emit_line(&format!(
                    "for (const {} of {}) {{",
                    pattern,
                    iterable.text()
                ));
                self.writer.increase_indent();
            }
            Op::EndForOfLoop => {
                self.writer.decrease_indent();
                self.writer.emit_line("}");
            }
            Op::BeginRepeatLoop {
                iterations,
                exposes_loop_counter,
            } => {
                let counter = if *exposes_loop_counter {
                    instr.inner_outputs[0].identifier()
                } else {
                    "i".to_owned()
                };
                self.writer.emit_line(&format!(
                    "for (let {0} = 0; {0} < {1}; {0}++) {{",
                    counter, iterations
                ));
                self.writer.increase_indent();
            }
            Op::EndRepeatLoop => {
                self.writer.decrease_indent();
                self.writer.emit_line("}");
            }
            Op::LoopBreak => {
                self.writer.emit_line("break;");
            }
            Op::LoopContinue => {
                self.writer.emit_line("continue;");
            }

            Op::BeginTry => {
                self.writer.emit_line("try {");
                self.writer.increase_indent();
            }
            Op::BeginCatch => {
                self.writer.decrease_indent();
                self.writer
                    .emit_line(&format!("}} catch ({}) {{", instr.inner_outputs[0]));
                self.writer.increase_indent();
            }
            Op::BeginFinally => {
                self.writer.decrease_indent();
                self.writer.emit_line("} finally {");
                self.writer.increase_indent();
            }
            Op::EndTryCatchFinally => {
                self.writer.decrease_indent();
                self.writer.emit_line("}");
            }
            Op::ThrowException => {
                let value = self.input(instr, 0);
                self.writer.emit_line(&format!("throw {};", value.text()));
            }
            Op::BeginWith => {
                let object = self.input(instr, 0);
                self.writer
                    .emit_line(&format!("with ({}) {{", object.text()));
                self.writer.increase_indent();
            }
            Op::EndWith => {
                self.writer.decrease_indent();
                self.writer.emit_line("}");
            }
            Op::BeginBlockStatement => {
                self.writer.emit_line("{");
                self.writer.increase_indent();
            }
            Op::EndBlockStatement => {
                self.writer.decrease_indent();
                self.writer.emit_line("}");
            }

            Op::BeginCodeString => {
                let out = self.output(instr)?;
                let delimiter = code_string_delimiter(self.code_string_depth);
                self.writer.emit_line(&format!(
                    "{} {} = {}",
                    self.declaration_keyword(out),
                    out,
                    delimiter
                ));
                self.writer.increase_indent();
                self.code_string_depth += 1;
            }
            Op::EndCodeString => {
                self.code_string_depth -= 1;
                let delimiter = code_string_delimiter(self.code_string_depth);
                self.writer.decrease_indent();
                self.writer.emit_line(&format!("{};", delimiter));
            }

            Op::BeginObjectLiteral => {
                let end_index = self.code.block_end_index(instr.index).ok_or_else(|| {
                    LiftError::invalid_input("unterminated object literal").at(instr.index)
                })?;
                let out = self.output(&self.code[end_index])?;
                self.writer.emit_line(&format!(
                    "{} {} = {{",
                    self.declaration_keyword(out),
                    out
                ));
                self.writer.increase_indent();
            }
            Op::ObjectLiteralAddProperty { name } => {
                let value = self.input(instr, 0);
                self.writer.emit_line(&format!(
                    "{}: {},",
                    quote_property_name(name),
                    value.text()
                ));
            }
            Op::ObjectLiteralAddElement { index } => {
                let value = self.input(instr, 0);
                self.writer
                    .emit_line(&format!("{}: {},", index, value.text()));
            }
            Op::ObjectLiteralAddComputedProperty => {
                let key = self.input(instr, 0);
                let value = self.input(instr, 1);
                self.writer
                    .emit_line(&format!("[{}]: {},", key.text(), value.text()));
            }
            Op::ObjectLiteralCopyProperties => {
                let source = self.input(instr, 0);
                self.writer.emit_line(&format!("...{},", source.text()));
            }
            Op::ObjectLiteralSetPrototype => {
                let prototype = self.input(instr, 0);
                self.writer
                    .emit_line(&format!("__proto__: {},", prototype.text()));
            }
            Op::BeginObjectLiteralMethod { name, has_rest_param } => {
                self.bind_this(instr);
                let parameters = parameter_list(&instr.inner_outputs[1..], *has_rest_param);
                self.writer.emit_line(&format!(
                    "{}({}) {{",
                    quote_property_name(name),
                    parameters
                ));
                self.writer.increase_indent();
            }
            Op::EndObjectLiteralMethod => {
                self.writer.decrease_indent();
                self.writer.emit_line("},");
            }
            Op::BeginObjectLiteralGetter { name } => {
                self.bind_this(instr);
                self.writer
                    .emit_line(&format!("get {}() {{", quote_property_name(name)));
                self.writer.increase_indent();
            }
            Op::EndObjectLiteralGetter => {
                self.writer.decrease_indent();
                self.writer.emit_line("},");
            }
            Op::BeginObjectLiteralSetter { name } => {
                self.bind_this(instr);
                self.writer.emit_line(&format!(
                    "set {}({}) {{",
                    quote_property_name(name),
                    instr.inner_outputs[1]
                ));
                self.writer.increase_indent();
            }
            Op::EndObjectLiteralSetter => {
                self.writer.decrease_indent();
                self.writer.emit_line("},");
            }
            Op::EndObjectLiteral => {
                self.writer.decrease_indent();
                self.writer.emit_line("};");
            }

            Op::BeginClassDefinition { has_superclass } => {
                let out = self.output(instr)?;
                if *has_superclass {
                    let superclass = self.input(instr, 0);
                    self.writer.emit_line(&format!(
                        "class {} extends {} {{",
                        out,
                        superclass.text()
                    ));
                } else {
                    self.writer.emit_line(&format!("class {} {{", out));
                }
                self.writer.increase_indent();
            }
            Op::BeginClassConstructor { has_rest_param } => {
                self.bind_this(instr);
                let parameters = parameter_list(&instr.inner_outputs[1..], *has_rest_param);
                self.writer
                    .emit_line(&format!("constructor({}) {{", parameters));
                self.writer.increase_indent();
            }
            Op::EndClassConstructor => {
                self.writer.decrease_indent();
                self.writer.emit_line("}");
            }
            Op::ClassAddInstanceProperty { name } => {
                if instr.inputs.is_empty() {
                    self.writer
                        .emit_line(&format!("{};", quote_property_name(name)));
                } else {
                    let value = self.input(instr, 0);
                    self.writer.emit_line(&format!(
                        "{} = {};",
                        quote_property_name(name),
                        value.text()
                    ));
                }
            }
            Op::ClassAddStaticProperty { name } => {
                if instr.inputs.is_empty() {
                    self.writer
                        .emit_line(&format!("static {};", quote_property_name(name)));
                } else {
                    let value = self.input(instr, 0);
                    self.writer.emit_line(&format!(
                        "static {} = {};",
                        quote_property_name(name),
                        value.text()
                    ));
                }
            }
            Op::ClassAddPrivateInstanceProperty { name } => {
                if instr.inputs.is_empty() {
                    self.writer.emit_line(&format!("#{};", name));
                } else {
                    let value = self.input(instr, 0);
                    self.writer
                        .emit_line(&format!("#{} = {};", name, value.text()));
                }
            }
            Op::BeginClassInstanceMethod { name, has_rest_param } => {
                self.bind_this(instr);
                let parameters = parameter_list(&instr.inner_outputs[1..], *has_rest_param);
                self.writer.emit_line(&format!(
                    "{}({}) {{",
                    quote_property_name(name),
                    parameters
                ));
                self.writer.increase_indent();
            }
            Op::EndClassInstanceMethod => {
                self.writer.decrease_indent();
                self.writer.emit_line("}");
            }
            Op::BeginClassInstanceGetter { name } => {
                self.bind_this(instr);
                self.writer
                    .emit_line(&format!("get {}() {{", quote_property_name(name)));
                self.writer.increase_indent();
            }
            Op::EndClassInstanceGetter => {
                self.writer.decrease_indent();
                self.writer.emit_line("}");
            }
            Op::BeginClassInstanceSetter { name } => {
                self.bind_this(instr);
                self.writer.emit_line(&format!(
                    "set {}({}) {{",
                    quote_property_name(name),
                    instr.inner_outputs[1]
                ));
                self.writer.increase_indent();
            }
            Op::EndClassInstanceSetter => {
                self.writer.decrease_indent();
                self.writer.emit_line("}");
            }
            Op::BeginClassStaticMethod { name, has_rest_param } => {
                self.bind_this(instr);
                let parameters = parameter_list(&instr.inner_outputs[1..], *has_rest_param);
                self.writer.emit_line(&format!(
                    "static {}({}) {{",
                    quote_property_name(name),
                    parameters
                ));
                self.writer.increase_indent();
            }
            Op::EndClassStaticMethod => {
                self.writer.decrease_indent();
                self.writer.emit_line("}");
            }
            Op::BeginClassStaticInitializer => {
                self.bind_this(instr);
                self.writer.emit_line("static {");
                self.writer.increase_indent();
            }
            Op::EndClassStaticInitializer => {
                self.writer.decrease_indent();
                self.writer.emit_line("}");
            }
            Op::BeginClassPrivateInstanceMethod { name, has_rest_param } => {
                self.bind_this(instr);
                let parameters = parameter_list(&instr.inner_outputs[1..], *has_rest_param);
                self.writer
                    .emit_line(&format!("#{}({}) {{", name, parameters));
                self.writer.increase_indent();
            }
            Op::EndClassPrivateInstanceMethod => {
                self.writer.decrease_indent();
                self.writer.emit_line("}");
            }
            Op::EndClassDefinition => {
                self.writer.decrease_indent();
                self.writer.emit_line("}");
            }

            Op::Explore { id, rng_seed } => {
                let value = self.input(instr, 0);
                let extra = self.inputs(instr, 1);
                let extra_text = extra
                    .iter()
                    .map(|expression| expression.text().to_owned())
                    .collect::<Vec<_>>()
                    .join(", ");
                self.writer.emit_line(&format!(
                    "explore({}, {}, {}, [{}], {});",
                    escape_js_string(id),
                    value.text(),
                    self.global_object,
                    extra_text,
                    rng_seed
                ));
            }
            Op::Probe { id } => {
                let value = self.input(instr, 0);
                self.writer.emit_line(&format!(
                    "probe({}, {});",
                    escape_js_string(id),
                    value.text()
                ));
            }
            Op::Fixup {
                id,
                action,
                has_output,
            } => {
                let value = self.input(instr, 0);
                let extra = self.inputs(instr, 1);
                let extra_text = extra
                    .iter()
                    .map(|expression| expression.text().to_owned())
                    .collect::<Vec<_>>()
                    .join(", ");
                let call_text = format!(
                    "fixup({}, {}, {}, {}, [{}])",
                    escape_js_string(id),
                    escape_js_string(action),
                    value.text(),
                    self.global_object,
                    extra_text
                );
                if *has_output {
                    let out = self.output(instr)?;
                    let expression = Expression::new(CallExpression, call_text);
                    self.define(instr, out, expression)?;
                } else {
                    self.writer.emit_line(&format!("{};", call_text));
                }
            }

            Op::Print => {
                let value = self.input(instr, 0);
                let expression = self
                    .call(
                        Expression::new(Identifier, "fuzzilli"),
                        &[
                            Expression::new(StringLiteral, "'FUZZILLI_PRINT'"),
                            value,
                        ],
                    );
                self.emit_statement(expression);
            }
            Op::Nop => {}

            Op::CreateWasmGlobal { value, mutable } => {
                let out = self.output(instr)?;
                let descriptor = format!(
                    "{{ value: '{}', mutable: {} }}",
                    value.value_type().js_name(),
                    mutable
                );
                let initial = self.global_value_expression(*value);
                let expression = Expression::new(
                    NewExpression,
                    format!("new WebAssembly.Global({}, ", descriptor),
                )
                .extend_argument(&initial)
                .extend_text(")");
                self.define(instr, out, expression)?;
            }
            Op::CreateWasmMemory { limits, shared } => {
                let out = self.output(instr)?;
                let mut descriptor = format!("{{ initial: {}", limits.min);
                if let Some(max) = limits.max {
                    descriptor.push_str(&format!(", maximum: {}", max));
                }
                if *shared {
                    descriptor.push_str(", shared: true");
                }
                descriptor.push_str(" }");
                let expression = Expression::new(
                    NewExpression,
                    format!("new WebAssembly.Memory({})", descriptor),
                );
                self.define(instr, out, expression)?;
            }
            Op::CreateWasmTable { element, limits } => {
                let out = self.output(instr)?;
                let mut descriptor = format!(
                    "{{ element: '{}', initial: {}",
                    element.js_name(),
                    limits.min
                );
                if let Some(max) = limits.max {
                    descriptor.push_str(&format!(", maximum: {}", max));
                }
                descriptor.push_str(" }");
                let expression = Expression::new(
                    NewExpression,
                    format!("new WebAssembly.Table({})", descriptor),
                );
                self.define(instr, out, expression)?;
            }
            Op::CreateWasmJSTag { parameters } => {
                let out = self.output(instr)?;
                let parameter_names = parameters
                    .iter()
                    .map(|value_type| format!("'{}'", value_type.js_name()))
                    .collect::<Vec<_>>()
                    .join(", ");
                let expression = Expression::new(
                    NewExpression,
                    format!("new WebAssembly.Tag({{ parameters: [{}] }})", parameter_names),
                );
                self.define(instr, out, expression)?;
            }
            Op::WrapSuspending => {
                let out = self.output(instr)?;
                let function = self.input(instr, 0);
                let expression = Expression::new(NewExpression, "new WebAssembly.Suspending(")
                    .extend_argument(&function)
                    .extend_text(")");
                self.define(instr, out, expression)?;
            }

            // Type definitions exist only for the binary lifter; they leave
            // no trace in the JavaScript output.
            Op::BeginWasmTypeGroup
            | Op::EndWasmTypeGroup
            | Op::WasmDefineArrayType { .. }
            | Op::WasmDefineStructType { .. }
            | Op::WasmDefineSignatureType { .. }
            | Op::WasmDefineForwardOrSelfReference
            | Op::WasmResolveForwardReference => {}

            Op::BeginWasmModule | Op::EndWasmModule => {
                return_fatal_error!(
                    instr.index;
                    "{} must be handled by the module embedding path",
                    instr.op.name()
                );
            }
            Op::Wasm(_) => {
                return_fatal_error!(
                    instr.index;
                    "Wasm instruction outside a Wasm module"
                );
            }
        }
        Ok(())
    }

    fn emit_function_header(
        &mut self,
        instr: &Instruction,
        keyword: &str,
        has_rest_param: bool,
        binds_this: bool,
    ) -> Result<(), LiftError> {
        let out = self.output(instr)?;
        let parameters = if binds_this {
            self.bind_this(instr);
            parameter_list(&instr.inner_outputs[1..], has_rest_param)
        } else {
            parameter_list(&instr.inner_outputs, has_rest_param)
        };
        self.writer
            .emit_line(&format!("{} {}({}) {{", keyword, out, parameters));
        self.writer.increase_indent();
        Ok(())
    }

    fn bind_this(&mut self, instr: &Instruction) {
        if let Some(this_variable) = instr.inner_outputs.first() {
            self.bound_names.insert(*this_variable, "this".to_owned());
        }
    }

    fn rebind_loop_variables(&mut self, inner_outputs: &[Variable], names: &[String]) {
        for (variable, name) in inner_outputs.iter().zip(names) {
            self.bound_names.insert(*variable, name.clone());
        }
    }
}

fn is_atom(class: ExpressionClass) -> bool {
    matches!(
        class,
        Identifier | NumberLiteral | NegativeNumberLiteral | StringLiteral | Keyword | Literal
    )
}

fn integer_expression(value: i64) -> Expression {
    if value < 0 {
        Expression::new(NegativeNumberLiteral, value.to_string())
    } else {
        Expression::new(NumberLiteral, value.to_string())
    }
}

/// Shortest decimal form that reads back as the same double.
fn format_float(value: f64) -> String {
    let text = format!("{}", value);
    debug_assert_eq!(text.parse::<f64>().ok(), Some(value));
    text
}

fn parameter_list(parameters: &[Variable], has_rest_param: bool) -> String {
    let mut parts: Vec<String> = parameters
        .iter()
        .map(|variable| variable.identifier())
        .collect();
    if has_rest_param {
        if let Some(last) = parts.last_mut() {
            *last = format!("...{}", last);
        }
    }
    parts.join(", ")
}

/// Renders an array destructuring pattern: `(new-index - last-index)` comma
/// separators per entry, the final entry `...`-prefixed when flagged.
fn array_destruct_pattern(indices: &[i64], targets: &[Variable], has_rest: bool) -> String {
    let mut pattern = String::from("[");
    let mut last_index = 0i64;
    for (position, (&index, target)) in indices.iter().zip(targets).enumerate() {
        for _ in 0..(index - last_index) {
            pattern.push(',');
        }
        if has_rest && position == indices.len() - 1 {
            pattern.push_str("...");
        }
        pattern.push_str(&target.identifier());
        last_index = index;
    }
    pattern.push(']');
    pattern
}

fn object_destruct_pattern(names: &[String], targets: &[Variable], has_rest: bool) -> String {
    let mut parts: Vec<String> = Vec::new();
    let plain_count = if has_rest { targets.len() - 1 } else { targets.len() };
    for (name, target) in names.iter().zip(&targets[..plain_count]) {
        parts.push(format!("{}:{}", quote_property_name(name), target));
    }
    if has_rest {
        parts.push(format!("...{}", targets[targets.len() - 1]));
    }
    format!("{{{}}}", parts.join(","))
}

/// Backtick delimiter for the given code-string nesting level: every level
/// of nesting doubles the escaping so runtime concatenation reconstructs a
/// proper template literal.
fn code_string_delimiter(depth: usize) -> String {
    let backslashes = (1usize << depth) - 1;
    format!("{}`", "\\".repeat(backslashes))
}

fn quote_property_name(name: &str) -> String {
    if is_identifier_name(name) {
        name.to_owned()
    } else {
        escape_js_string(name)
    }
}

fn is_identifier_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || first == '$' || first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|ch| ch == '_' || ch == '$' || ch.is_ascii_alphanumeric())
}

fn escape_js_string(value: &str) -> String {
    let mut escaped = String::from("\"");
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            '\0' => escaped.push_str("\\0"),
            control if control.is_control() => {
                escaped.push_str(&format!("\\u{:04X}", control as u32));
            }
            normal => escaped.push(normal),
        }
    }
    escaped.push('"');
    escaped
}

fn escape_template_part(part: &str) -> String {
    let mut escaped = String::new();
    let mut chars = part.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '`' => escaped.push_str("\\`"),
            '$' if chars.peek() == Some(&'{') => escaped.push_str("\\$"),
            normal => escaped.push(normal),
        }
    }
    escaped
}

/// The initializer clause of a `for` loop header.
fn for_loop_initializer(
    loop_variables: &[String],
    initial_values: &[Expression],
    buffered: &str,
) -> String {
    if loop_variables.is_empty() {
        if buffered.is_empty() {
            return String::new();
        }
        return format!("(() => {{ {} }})()", buffered);
    }

    let values: Vec<&str> = initial_values
        .iter()
        .map(|expression| expression.text())
        .collect();
    if loop_variables.len() == 1 {
        if buffered.is_empty() {
            format!("let {} = {}", loop_variables[0], values[0])
        } else {
            format!(
                "let {} = (() => {{ {} return {}; }})()",
                loop_variables[0], buffered, values[0]
            )
        }
    } else if buffered.is_empty() {
        format!("let [{}] = [{}]", loop_variables.join(", "), values.join(", "))
    } else {
        format!(
            "let [{}] = (() => {{ {} return [{}]; }})()",
            loop_variables.join(", "),
            buffered,
            values.join(", ")
        )
    }
}

/// The afterthought clause: single plain statements drop their semicolon,
/// anything more complex runs inside an arrow IIFE.
fn afterthought_clause(buffered: &str) -> String {
    if buffered.is_empty() {
        return String::new();
    }
    let is_single_statement =
        buffered.ends_with(';') && !buffered[..buffered.len() - 1].contains(';');
    if is_single_statement && !buffered.contains('{') {
        buffered[..buffered.len() - 1].to_owned()
    } else {
        format!("(() => {{ {} }})()", buffered)
    }
}
