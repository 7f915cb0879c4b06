//! Def-use and scope analyses consumed by the lifters.

use crate::errors::LiftError;
use crate::fil::{Code, Instruction, Op, Variable, WasmOp};
use crate::fil::opcodes::UnaryOperator;
use rustc_hash::FxHashMap;

/// Definition and use information for one variable.
#[derive(Debug, Clone, Default)]
pub struct DefUse {
    /// Index of the defining instruction.
    pub definition: usize,
    /// Indices of instructions using the variable as an input, in order.
    pub uses: Vec<usize>,
    /// Number of reassignments after the definition.
    pub assignments: usize,
}

/// Per-variable def-use facts over one program.
///
/// The JavaScript lifter uses these to decide whether a candidate
/// expression may be inlined into its consumer (single use, no intervening
/// effects) and whether a declaration needs `let` instead of `const`.
#[derive(Debug, Default)]
pub struct DefUseAnalyzer {
    info: FxHashMap<Variable, DefUse>,
}

impl DefUseAnalyzer {
    pub fn analyze(code: &Code) -> DefUseAnalyzer {
        let mut analyzer = DefUseAnalyzer::default();

        for instruction in code {
            for variable in instruction.all_outputs() {
                analyzer.info.entry(variable).or_default().definition = instruction.index;
            }
            for &variable in &instruction.inputs {
                analyzer
                    .info
                    .entry(variable)
                    .or_default()
                    .uses
                    .push(instruction.index);
            }
            for variable in reassignment_targets(instruction) {
                analyzer.info.entry(variable).or_default().assignments += 1;
            }
        }

        analyzer
    }

    pub fn uses(&self, variable: Variable) -> &[usize] {
        self.info
            .get(&variable)
            .map(|info| info.uses.as_slice())
            .unwrap_or(&[])
    }

    pub fn num_uses(&self, variable: Variable) -> usize {
        self.uses(variable).len()
    }

    pub fn definition_index(&self, variable: Variable) -> Option<usize> {
        self.info.get(&variable).map(|info| info.definition)
    }

    pub fn is_reassigned(&self, variable: Variable) -> bool {
        self.info
            .get(&variable)
            .is_some_and(|info| info.assignments > 0)
    }
}

/// Variables an instruction reassigns (as opposed to defines).
fn reassignment_targets(instruction: &Instruction) -> Vec<Variable> {
    match &instruction.op {
        Op::Reassign | Op::Update { .. } => vec![instruction.input(0)],
        Op::UnaryOperation { op }
            if matches!(
                op,
                UnaryOperator::PreInc
                    | UnaryOperator::PreDec
                    | UnaryOperator::PostInc
                    | UnaryOperator::PostDec
            ) =>
        {
            vec![instruction.input(0)]
        }
        Op::DestructArrayAndReassign { .. } | Op::DestructObjectAndReassign { .. } => {
            instruction.inputs[1..].to_vec()
        }
        Op::Wasm(WasmOp::Reassign) => vec![instruction.input(0)],
        _ => Vec::new(),
    }
}

/// Tracks block nesting inside one Wasm function and the branch depth each
/// label was recorded at.
///
/// Block-ending parts are processed before block-starting parts, so
/// transition opcodes (`else`, `catch`, `catch_all`) naturally record their
/// label one level below the depth in front of the instruction: the
/// enclosing block has already been conceptually closed.
#[derive(Debug, Default)]
pub struct WasmScopeTracker {
    depth: u32,
    labels: FxHashMap<Variable, u32>,
}

impl WasmScopeTracker {
    pub fn new() -> WasmScopeTracker {
        WasmScopeTracker::default()
    }

    /// Resets all state when entering a new function body.
    pub fn enter_function(&mut self) {
        self.depth = 0;
        self.labels.clear();
    }

    /// Updates nesting for one instruction. The label, when the instruction
    /// introduces one, must be passed by the caller (it is the first inner
    /// output of block-starting opcodes).
    pub fn process(&mut self, op: &WasmOp, label: Option<Variable>) {
        if op.is_block_end() {
            self.depth = self.depth.saturating_sub(1);
        }
        if op.is_block_start() {
            if let Some(label) = label {
                self.labels.insert(label, self.depth);
            }
            self.depth += 1;
        }
    }

    pub fn current_depth(&self) -> u32 {
        self.depth
    }

    /// Branch depth to encode for a branch targeting `label` from the
    /// current position. A target outside the current nesting is a fatal
    /// mutation artifact.
    pub fn branch_depth_for(
        &self,
        label: Variable,
        instruction_index: usize,
    ) -> Result<u32, LiftError> {
        let recorded = *self.labels.get(&label).ok_or_else(|| {
            LiftError::failed_index_lookup(format!("no label recorded for {}", label))
                .at(instruction_index)
        })?;

        // depth - recorded - 1, erroring instead of wrapping.
        if self.depth <= recorded {
            return Err(LiftError::invalid_branch(format!(
                "branch to {} would encode negative depth ({} - {} - 1)",
                label, self.depth, recorded
            ))
            .at(instruction_index));
        }
        Ok(self.depth - recorded - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fil::opcodes::BinaryOperator;
    use crate::wasm::types::Signature;

    fn v(n: u32) -> Variable {
        Variable(n)
    }

    #[test]
    fn def_use_tracks_definitions_and_uses() {
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

        let analyzer = DefUseAnalyzer::analyze(&code);
        assert_eq!(analyzer.definition_index(v(0)), Some(0));
        assert_eq!(analyzer.uses(v(0)), &[2]);
        assert_eq!(analyzer.uses(v(2)), &[3]);
        assert!(!analyzer.is_reassigned(v(0)));
    }

    #[test]
    fn reassignment_is_counted() {
        let mut code = Code::new();
        code.push(Instruction::new(Op::LoadInteger { value: 1 }).with_output(v(0)));
        code.push(Instruction::new(Op::LoadInteger { value: 2 }).with_output(v(1)));
        code.push(Instruction::new(Op::Reassign).with_inputs(vec![v(0), v(1)]));

        let analyzer = DefUseAnalyzer::analyze(&code);
        assert!(analyzer.is_reassigned(v(0)));
        assert!(!analyzer.is_reassigned(v(1)));
    }

    #[test]
    fn increment_counts_as_reassignment() {
        let mut code = Code::new();
        code.push(Instruction::new(Op::LoadInteger { value: 1 }).with_output(v(0)));
        code.push(
            Instruction::new(Op::UnaryOperation {
                op: UnaryOperator::PostInc,
            })
            .with_inputs(vec![v(0)])
            .with_output(v(1)),
        );

        let analyzer = DefUseAnalyzer::analyze(&code);
        assert!(analyzer.is_reassigned(v(0)));
    }

    #[test]
    fn branch_depth_counts_enclosing_blocks() {
        let mut tracker = WasmScopeTracker::new();
        tracker.enter_function();

        let outer = v(10);
        let inner = v(11);
        tracker.process(
            &WasmOp::BeginBlock {
                signature: Signature::empty(),
            },
            Some(outer),
        );
        tracker.process(
            &WasmOp::BeginBlock {
                signature: Signature::empty(),
            },
            Some(inner),
        );

        assert_eq!(tracker.branch_depth_for(inner, 0).unwrap(), 0);
        assert_eq!(tracker.branch_depth_for(outer, 0).unwrap(), 1);
    }

    #[test]
    fn branch_to_closed_block_is_invalid() {
        let mut tracker = WasmScopeTracker::new();
        tracker.enter_function();

        let label = v(10);
        tracker.process(
            &WasmOp::BeginBlock {
                signature: Signature::empty(),
            },
            Some(label),
        );
        tracker.process(&WasmOp::EndBlock, None);

        assert!(tracker.branch_depth_for(label, 3).is_err());
    }

    #[test]
    fn else_records_label_one_level_down() {
        let mut tracker = WasmScopeTracker::new();
        tracker.enter_function();

        tracker.process(
            &WasmOp::BeginIf {
                signature: Signature::empty(),
                hint: None,
            },
            Some(v(10)),
        );
        assert_eq!(tracker.current_depth(), 1);

        tracker.process(&WasmOp::BeginElse, Some(v(11)));
        // The if-block closed and the else re-opened at the same depth.
        assert_eq!(tracker.current_depth(), 1);
        assert_eq!(tracker.branch_depth_for(v(11), 0).unwrap(), 0);
    }
}
