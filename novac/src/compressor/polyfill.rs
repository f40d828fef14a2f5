use std::fmt;

use crate::ir::ast::{
    AssignOperator, AssignmentStatement, BinaryOperator, Expression, Operator, Statement, Symbol, UnaryOperator,
};

/// Operators the target dialect has no arithmetic primitive for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UnknownOperator {
    Ternary,      // ?:
    LogicalOr,    // ||
    LogicalAnd,   // &&
    Equal,        // ==
    NotEqual,     // !=
    Greater,      // >
    Less,         // <
    GreaterEqual, // >=
    LessEqual,    // <=
}

impl UnknownOperator {
    pub const ALL: [Self; 9] = [
        Self::Ternary,
        Self::LogicalOr,
        Self::LogicalAnd,
        Self::Equal,
        Self::NotEqual,
        Self::Greater,
        Self::Less,
        Self::GreaterEqual,
        Self::LessEqual,
    ];

    pub fn from_binary(operator: BinaryOperator) -> Option<Self> {
        let unknown = match operator {
            BinaryOperator::LogicalOr => Self::LogicalOr,
            BinaryOperator::LogicalAnd => Self::LogicalAnd,
            BinaryOperator::Equal => Self::Equal,
            BinaryOperator::NotEqual => Self::NotEqual,
            BinaryOperator::Greater => Self::Greater,
            BinaryOperator::Less => Self::Less,
            BinaryOperator::GreaterEqual => Self::GreaterEqual,
            BinaryOperator::LessEqual => Self::LessEqual,
            _ => return None,
        };
        Some(unknown)
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Ternary => "?:",
            Self::LogicalOr => "||",
            Self::LogicalAnd => "&&",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Greater => ">",
            Self::Less => "<",
            Self::GreaterEqual => ">=",
            Self::LessEqual => "<=",
        }
    }

    /// Base of the minted polyfill name, `_<base>_<n>`.
    pub fn base_name(&self) -> &'static str {
        match self {
            Self::Ternary => "ternary",
            Self::LogicalOr => "logicalor",
            Self::LogicalAnd => "logicaland",
            Self::Equal => "equal",
            Self::NotEqual => "notequal",
            Self::Greater => "greaterthan",
            Self::Less => "lessthan",
            Self::GreaterEqual => "greaterthanorequal",
            Self::LessEqual => "lessthanorequal",
        }
    }

    pub fn params(&self) -> &'static [&'static str] {
        match self {
            Self::Ternary => &["c", "a", "b"],
            _ => &["a", "b"],
        }
    }

    /// Function definition implementing the operator with integer
    /// arithmetic only. `a`, `b` (and `c` for the ternary) are its arguments.
    pub fn polyfill(&self, name: &str) -> Statement {
        let a = || Expression::argument("a");
        let b = || Expression::argument("b");
        let one = || Expression::number(1);

        let body = match self {
            // nonzero(c) * a + (1 - nonzero(c)) * b
            Self::Ternary => {
                let nonzero = || {
                    Expression::group(Expression::group(Expression::binary(
                        less_than(Expression::number(0), Expression::argument("c")),
                        BinaryOperator::Add,
                        less_than(Expression::argument("c"), Expression::number(0)),
                    )))
                };
                Expression::binary(
                    Expression::binary(nonzero(), BinaryOperator::Multiply, a()),
                    BinaryOperator::Add,
                    Expression::binary(
                        Expression::group(Expression::binary(one(), BinaryOperator::Subtract, nonzero())),
                        BinaryOperator::Multiply,
                        b(),
                    ),
                )
            }
            // iszero(a) * b + a
            Self::LogicalOr => {
                let iszero = Expression::group(Expression::binary(
                    Expression::binary(one(), BinaryOperator::Subtract, Expression::group(sign_of_nonzero(a()))),
                    BinaryOperator::And,
                    one(),
                ));
                Expression::binary(
                    Expression::binary(iszero, BinaryOperator::Multiply, b()),
                    BinaryOperator::Add,
                    a(),
                )
            }
            // all bits set when a is nonzero, masking b; 0 (== a) otherwise
            Self::LogicalAnd => Expression::binary(
                Expression::group(sign_of_nonzero(a())),
                BinaryOperator::And,
                Expression::binary(
                    Expression::binary(
                        one(),
                        BinaryOperator::Multiply,
                        Expression::group(Expression::binary(b(), BinaryOperator::Subtract, a())),
                    ),
                    BinaryOperator::Add,
                    a(),
                ),
            ),
            Self::Equal => Expression::binary(
                Expression::binary(one(), BinaryOperator::Subtract, less_than(b(), a())),
                BinaryOperator::Subtract,
                less_than(a(), b()),
            ),
            Self::NotEqual => Expression::binary(less_than(b(), a()), BinaryOperator::Add, less_than(a(), b())),
            Self::Greater => less_than(b(), a()),
            Self::Less => less_than(a(), b()),
            Self::GreaterEqual => Expression::binary(one(), BinaryOperator::Subtract, less_than(a(), b())),
            Self::LessEqual => Expression::binary(one(), BinaryOperator::Subtract, less_than(b(), a())),
        };

        Statement::Assignment(AssignmentStatement {
            symbol: Symbol::function(name, self.params()),
            operator: Operator::new(AssignOperator),
            expression: body,
            span: None,
        })
    }
}

impl fmt::Display for UnknownOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glyph())
    }
}

/// `(((x-y)>>31)&1)`: the sign bit of `x - y`, i.e. 1 when x < y.
fn less_than(x: Expression, y: Expression) -> Expression {
    Expression::group(Expression::binary(
        Expression::group(Expression::binary(
            Expression::group(Expression::binary(x, BinaryOperator::Subtract, y)),
            BinaryOperator::ShiftRight,
            Expression::number(31),
        )),
        BinaryOperator::And,
        Expression::number(1),
    ))
}

// (x|(~x+1))>>31 is -1 for any nonzero x and 0 for x == 0
fn sign_of_nonzero(x: Expression) -> Expression {
    let negated = Expression::group(Expression::binary(
        Expression::unary(UnaryOperator::Not, x.clone()),
        BinaryOperator::Add,
        Expression::number(1),
    ));
    Expression::binary(
        Expression::group(Expression::binary(x, BinaryOperator::Or, negated)),
        BinaryOperator::ShiftRight,
        Expression::number(31),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::batch::render;

    fn body(operator: UnknownOperator) -> String {
        let Statement::Assignment(assignment) = operator.polyfill("p") else {
            panic!("polyfill must be an assignment");
        };
        render(&assignment.expression).unwrap()
    }

    #[test]
    fn renders_the_branchless_formulas() {
        assert_eq!(body(UnknownOperator::Less), "(((a-b)>>31)&1)");
        assert_eq!(body(UnknownOperator::Greater), "(((b-a)>>31)&1)");
        assert_eq!(body(UnknownOperator::Equal), "1-(((b-a)>>31)&1)-(((a-b)>>31)&1)");
        assert_eq!(body(UnknownOperator::NotEqual), "(((b-a)>>31)&1)+(((a-b)>>31)&1)");
        assert_eq!(body(UnknownOperator::GreaterEqual), "1-(((a-b)>>31)&1)");
        assert_eq!(body(UnknownOperator::LessEqual), "1-(((b-a)>>31)&1)");
        assert_eq!(body(UnknownOperator::LogicalOr), "(1-((a|(~a+1))>>31)&1)*b+a");
        assert_eq!(body(UnknownOperator::LogicalAnd), "((a|(~a+1))>>31)&1*(b-a)+a");
        assert_eq!(
            body(UnknownOperator::Ternary),
            "(((((0-c)>>31)&1)+(((c-0)>>31)&1)))*a+(1-(((((0-c)>>31)&1)+(((c-0)>>31)&1))))*b"
        );
    }

    #[test]
    fn polyfills_are_generated_function_definitions() {
        for operator in UnknownOperator::ALL {
            let Statement::Assignment(assignment) = operator.polyfill("p") else {
                panic!("polyfill must be an assignment");
            };
            assert!(assignment.is_generated());
            let params = assignment.function().map(|f| f.param_names()).unwrap_or_default();
            assert_eq!(params, operator.params());
        }
    }

    #[test]
    fn maps_only_comparisons_and_logic() {
        assert_eq!(UnknownOperator::from_binary(BinaryOperator::GreaterEqual), Some(UnknownOperator::GreaterEqual));
        assert_eq!(UnknownOperator::from_binary(BinaryOperator::Add), None);
        assert_eq!(UnknownOperator::from_binary(BinaryOperator::And), None);
        assert_eq!(UnknownOperator::LogicalOr.to_string(), "||");
    }
}
