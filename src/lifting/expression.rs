//! The precedence-aware expression composer.
//!
//! Expressions are immutable value-like records: `extend` returns a new
//! record, so composition is side-effect-free and one consumer's extension
//! can never corrupt another's copy. Parentheses are inserted only where the
//! rendering would otherwise re-parse to different semantics.

/// Associativity of an expression class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    NoAssoc,
    Left,
    Right,
}

/// Whether evaluating an expression can be observed relative to other
/// effects. Composing any effectful part yields an effectful whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purity {
    Pure,
    Effectful,
}

/// The closed set of JavaScript expression classes the lifter composes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionClass {
    Identifier,
    Literal,
    Keyword,
    RegExpLiteral,
    CallExpression,
    MemberExpression,
    NewExpression,
    NumberLiteral,
    NegativeNumberLiteral,
    StringLiteral,
    TemplateLiteral,
    ObjectLiteral,
    ArrayLiteral,
    PostfixExpression,
    UnaryExpression,
    BinaryExpression,
    TernaryExpression,
    AssignmentExpression,
    YieldExpression,
    SpreadExpression,
    CommaExpression,
}

impl ExpressionClass {
    /// Binding strength; larger binds tighter.
    pub fn precedence(self) -> u8 {
        use ExpressionClass::*;
        match self {
            Identifier | Literal | Keyword | RegExpLiteral => 20,
            CallExpression | MemberExpression | NewExpression => 19,
            NumberLiteral | NegativeNumberLiteral | StringLiteral | TemplateLiteral
            | ObjectLiteral | ArrayLiteral => 17,
            PostfixExpression => 16,
            UnaryExpression => 15,
            BinaryExpression => 14,
            TernaryExpression => 4,
            AssignmentExpression => 3,
            YieldExpression | SpreadExpression => 2,
            CommaExpression => 1,
        }
    }

    pub fn associativity(self) -> Associativity {
        use ExpressionClass::*;
        match self {
            CallExpression | MemberExpression | CommaExpression => Associativity::Left,
            UnaryExpression | YieldExpression => Associativity::Right,
            _ => Associativity::NoAssoc,
        }
    }

    /// Purity of a fresh atom of this class. Regexp literals are effectful
    /// since every evaluation yields a fresh object.
    pub fn base_purity(self) -> Purity {
        use ExpressionClass::*;
        match self {
            Identifier | Literal | Keyword | NumberLiteral | NegativeNumberLiteral
            | StringLiteral => Purity::Pure,
            _ => Purity::Effectful,
        }
    }
}

/// Position a child expression is composed into, for same-precedence
/// disambiguation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandPosition {
    Lhs,
    Rhs,
}

/// A composed textual expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    class: ExpressionClass,
    purity: Purity,
    text: String,
    sub_count: usize,
}

impl Expression {
    /// Creates an atom of the given class.
    pub fn new(class: ExpressionClass, text: impl Into<String>) -> Expression {
        Expression {
            class,
            purity: class.base_purity(),
            text: text.into(),
            sub_count: 0,
        }
    }

    pub fn class(&self) -> ExpressionClass {
        self.class
    }

    pub fn precedence(&self) -> u8 {
        self.class.precedence()
    }

    pub fn associativity(&self) -> Associativity {
        self.class.associativity()
    }

    pub fn is_effectful(&self) -> bool {
        self.purity == Purity::Effectful
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// Appends literal text. Sub-expression count and purity are unchanged.
    pub fn extend_text(mut self, suffix: &str) -> Expression {
        self.text.push_str(suffix);
        self
    }

    /// Composes `child` into this expression. The first composed child sits
    /// at the left-hand position, all later ones at the right-hand position.
    pub fn extend(self, child: &Expression) -> Expression {
        let position = if self.sub_count == 0 {
            OperandPosition::Lhs
        } else {
            OperandPosition::Rhs
        };
        self.extend_at(child, position)
    }

    /// Composes `child` at an explicit position.
    pub fn extend_at(mut self, child: &Expression, position: OperandPosition) -> Expression {
        if needs_parens(self.class, child, position) {
            self.text.push('(');
            self.text.push_str(&child.text);
            self.text.push(')');
        } else {
            self.text.push_str(&child.text);
        }
        if child.is_effectful() {
            self.purity = Purity::Effectful;
        }
        self.sub_count += 1;
        self
    }

    /// Composes `child` into a delimiter-enclosed position (call argument,
    /// bracketed index, array element, template interpolation). Only comma
    /// expressions re-parse there, so only they get wrapped.
    pub fn extend_argument(mut self, child: &Expression) -> Expression {
        if child.class == ExpressionClass::CommaExpression {
            self.text.push('(');
            self.text.push_str(&child.text);
            self.text.push(')');
        } else {
            self.text.push_str(&child.text);
        }
        if child.is_effectful() {
            self.purity = Purity::Effectful;
        }
        self.sub_count += 1;
        self
    }

    /// Composes `child` verbatim, without any wrapping. For positions where
    /// the surrounding delimiters already isolate the child completely.
    pub fn extend_enclosed(mut self, child: &Expression) -> Expression {
        self.text.push_str(&child.text);
        if child.is_effectful() {
            self.purity = Purity::Effectful;
        }
        self.sub_count += 1;
        self
    }

    pub fn sub_count(&self) -> usize {
        self.sub_count
    }
}

/// Whether `child` must be parenthesized when composed into an expression
/// of class `parent` at `position`.
fn needs_parens(parent: ExpressionClass, child: &Expression, position: OperandPosition) -> bool {
    let parent_precedence = parent.precedence();
    let child_precedence = child.precedence();

    if child_precedence > parent_precedence {
        return false;
    }
    if child_precedence < parent_precedence {
        return true;
    }

    let parent_associativity = parent.associativity();
    let child_associativity = child.associativity();
    if parent_associativity != child_associativity {
        return true;
    }
    match parent_associativity {
        Associativity::NoAssoc => true,
        Associativity::Left => position == OperandPosition::Rhs,
        Associativity::Right => position == OperandPosition::Lhs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ExpressionClass::*;

    fn number(text: &str) -> Expression {
        Expression::new(NumberLiteral, text)
    }

    fn binary(lhs: &Expression, op: &str, rhs: &Expression) -> Expression {
        Expression::new(BinaryExpression, "")
            .extend(lhs)
            .extend_text(op)
            .extend(rhs)
    }

    #[test]
    fn tighter_children_need_no_parens() {
        let expr = binary(&number("1"), " + ", &number("2"));
        assert_eq!(expr.text(), "1 + 2");
    }

    #[test]
    fn equal_precedence_non_associative_children_are_wrapped() {
        let inner = binary(&number("2"), " + ", &number("3"));
        let outer = binary(&number("1"), " * ", &inner);
        assert_eq!(outer.text(), "1 * (2 + 3)");
    }

    #[test]
    fn looser_children_are_wrapped() {
        let assignment = Expression::new(AssignmentExpression, "a = 1");
        let call = Expression::new(CallExpression, "")
            .extend(&Expression::new(Identifier, "f"))
            .extend_text("(")
            .extend_at(&assignment, OperandPosition::Rhs)
            .extend_text(")");
        assert_eq!(call.text(), "f((a = 1))");
    }

    #[test]
    fn left_associative_chains_skip_parens_on_the_left() {
        let member = Expression::new(MemberExpression, "")
            .extend(&Expression::new(Identifier, "a"))
            .extend_text(".b");
        let chained = Expression::new(MemberExpression, "")
            .extend(&member)
            .extend_text(".c");
        assert_eq!(chained.text(), "a.b.c");
    }

    #[test]
    fn purity_is_the_least_permissive_of_the_parts() {
        let pure = binary(&number("1"), " + ", &number("2"));
        assert!(!pure.is_effectful());

        let call = Expression::new(CallExpression, "f()");
        let tainted = Expression::new(BinaryExpression, "")
            .extend(&call)
            .extend_text(" + ")
            .extend(&number("1"));
        assert!(tainted.is_effectful());
    }

    #[test]
    fn regexp_literals_are_effectful_atoms() {
        assert!(Expression::new(RegExpLiteral, "/a/g").is_effectful());
        assert!(!Expression::new(StringLiteral, "\"a\"").is_effectful());
    }

    #[test]
    fn precedence_table_matches_the_language() {
        assert_eq!(Identifier.precedence(), 20);
        assert_eq!(CallExpression.precedence(), 19);
        assert_eq!(NumberLiteral.precedence(), 17);
        assert_eq!(PostfixExpression.precedence(), 16);
        assert_eq!(UnaryExpression.precedence(), 15);
        assert_eq!(BinaryExpression.precedence(), 14);
        assert_eq!(TernaryExpression.precedence(), 4);
        assert_eq!(AssignmentExpression.precedence(), 3);
        assert_eq!(YieldExpression.precedence(), 2);
        assert_eq!(CommaExpression.precedence(), 1);
    }
}
