//! Inlining policies.
//!
//! An inliner decides whether an expression *may* be embedded at its use
//! site instead of being bound to a named temporary. The JavaScript lifter
//! combines this verdict with def-use conditions (single use, no intervening
//! effects for effectful expressions), so policies stay stateless and
//! side-effect-free.
//!
//! The legacy model attached a four-level inlineability to every expression
//! (never / only-immediately-following / single-use-only / always). The
//! current model keeps a binary purity on expressions and moves the usage
//! conditions into the lifter, which is what the policies below assume.

use crate::lifting::expression::{Expression, ExpressionClass};

pub trait Inliner {
    fn should_inline(&self, expression: &Expression) -> bool;
}

/// Inlines nothing: every value gets a named temporary.
pub struct InlineNothing;

impl Inliner for InlineNothing {
    fn should_inline(&self, _expression: &Expression) -> bool {
        false
    }
}

/// Inlines only trivially pure atoms: identifiers, number literals,
/// negative number literals, string literals, keywords.
pub struct InlineOnlyLiterals;

impl Inliner for InlineOnlyLiterals {
    fn should_inline(&self, expression: &Expression) -> bool {
        matches!(
            expression.class(),
            ExpressionClass::Identifier
                | ExpressionClass::NumberLiteral
                | ExpressionClass::NegativeNumberLiteral
                | ExpressionClass::StringLiteral
                | ExpressionClass::Keyword
        )
    }
}

/// Permits inlining of any expression class; the lifter's use-count and
/// effect-ordering checks do the gating. This is the default policy.
pub struct InlineSingleUse;

impl Inliner for InlineSingleUse {
    fn should_inline(&self, _expression: &Expression) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_policy_accepts_atoms_only() {
        let policy = InlineOnlyLiterals;
        assert!(policy.should_inline(&Expression::new(ExpressionClass::NumberLiteral, "1")));
        assert!(policy.should_inline(&Expression::new(ExpressionClass::Identifier, "v0")));
        assert!(policy.should_inline(&Expression::new(
            ExpressionClass::NegativeNumberLiteral,
            "-1"
        )));
        assert!(!policy.should_inline(&Expression::new(ExpressionClass::CallExpression, "f()")));
        assert!(!policy.should_inline(&Expression::new(ExpressionClass::BinaryExpression, "1+2")));
    }

    #[test]
    fn nothing_policy_rejects_everything() {
        let policy = InlineNothing;
        assert!(!policy.should_inline(&Expression::new(ExpressionClass::NumberLiteral, "1")));
    }
}
