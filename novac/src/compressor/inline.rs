use std::collections::HashMap;
use std::mem;

use tracing::{trace, warn};

use crate::error::CompileError;
use crate::ir::ast::{Expression, FunctionDefinition, IdentifierLiteral, Symbol};
use crate::ir::{Action, Key, NodeMut, visit};

use super::Compressor;

/// A function body as it stood once its own statement was processed.
struct Inlinable {
    definition: FunctionDefinition,
    body: Expression,
}

impl Compressor {
    /// Replaces every call with the callee's body, parameters substituted
    /// by the call's arguments.
    ///
    /// Functions become inlinable in source order, right after their own
    /// statement, so a call to a later (or the same) function sees an
    /// undefined name and turns into `0`.
    pub fn inject(&mut self) -> Result<(), CompileError> {
        let mut functions: HashMap<String, Inlinable> = HashMap::new();

        for assignment in self.program.assignments_mut() {
            visit(NodeMut::Expression(&mut assignment.expression), &mut |node, key| {
                if let NodeMut::Expression(expression) = node {
                    inline_call(expression, key, &functions)?;
                }
                Ok(Action::Keep)
            })?;

            if let Symbol::Function(definition) = &assignment.symbol {
                let inlinable = Inlinable {
                    definition: definition.clone(),
                    body: assignment.expression.clone(),
                };
                functions.insert(definition.name.clone(), inlinable);
            }
        }
        Ok(())
    }
}

fn inline_call(
    expression: &mut Expression,
    key: Key,
    functions: &HashMap<String, Inlinable>,
) -> Result<(), CompileError> {
    let Expression::Call(call) = expression else {
        return Ok(());
    };

    let Some(function) = functions.get(&call.callee.name) else {
        warn!(function = %call.callee.name, "call to undefined function replaced with 0");
        *expression = Expression::number(0);
        return Ok(());
    };

    let expected = function.definition.params.len();
    if call.args.len() != expected {
        return Err(CompileError::Arity {
            function: call.callee.name.clone(),
            expected,
            found: call.args.len(),
        });
    }

    trace!(function = %call.callee.name, "inlining call");
    let mut body = function.body.clone();
    substitute(&mut body, &function.definition, &call.args)?;

    // the whole right-hand side needs no parentheses
    *expression = if body.is_primary() || key == Key::Root {
        body
    } else {
        Expression::group(body)
    };
    Ok(())
}

/// Binds the callee's parameters to `args` inside `body`. Any other name is
/// free in the callee and is pinned to the global scope so that it cannot be
/// captured by a same-named parameter of the caller.
fn substitute(body: &mut Expression, callee: &FunctionDefinition, args: &[Expression]) -> Result<(), CompileError> {
    let slot = |name: &str| callee.params.iter().position(|param| param.name == name);

    visit(NodeMut::Expression(body), &mut |node, _| {
        let NodeMut::Expression(expression) = node else {
            return Ok(Action::Keep);
        };

        let index = match expression {
            Expression::Identifier(ident) => match slot(&ident.name) {
                None => {
                    ident.is_global = true;
                    None
                }
                Some(_) if ident.is_global => None,
                found => found,
            },
            Expression::Argument(arg) => match slot(&arg.name) {
                None => {
                    let name = mem::take(&mut arg.name);
                    let span = arg.span;
                    *expression = Expression::Identifier(IdentifierLiteral { name, is_global: true, span });
                    None
                }
                found => found,
            },
            _ => None,
        };

        if let Some(value) = index.and_then(|i| args.get(i)) {
            *expression = if value.is_primary() {
                value.clone()
            } else {
                Expression::group(value.clone())
            };
        }
        Ok(Action::Keep)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compressor::ReduceOptions;
    use crate::ir::ast::{AssignmentStatement, Program};
    use crate::parser::{Mode, parse};

    // `#` marks global references, `$` function arguments
    fn render(expression: &Expression) -> String {
        match expression {
            Expression::Identifier(ident) if ident.is_global => format!("#{}", ident.name),
            Expression::Identifier(ident) => ident.name.clone(),
            Expression::Argument(arg) => format!("${}", arg.name),
            Expression::Number(number) => number.value.to_string(),
            Expression::Binary(binary) => {
                format!("{}{}{}", render(&binary.left), binary.operator.glyph(), render(&binary.right))
            }
            Expression::Unary(unary) => format!("{}{}", unary.operator.glyph(), render(&unary.operand)),
            Expression::Parenthesized(group) => format!("({})", render(&group.inner)),
            Expression::Call(call) => {
                let args: Vec<_> = call.args.iter().map(render).collect();
                format!("{}({})", call.callee.name, args.join(","))
            }
            Expression::Ternary(ternary) => format!(
                "{}?{}:{}",
                render(&ternary.condition),
                render(&ternary.then_expr),
                render(&ternary.else_expr)
            ),
        }
    }

    fn injected(source: &str) -> Result<Program, CompileError> {
        let mut compressor = Compressor::new(&parse(source, Mode::Strict)?);
        compressor.inject()?;
        Ok(compressor.program())
    }

    fn bodies(program: &Program) -> Vec<(String, String)> {
        program
            .assignments()
            .map(|a: &AssignmentStatement| (a.symbol.name().to_string(), render(&a.expression)))
            .collect()
    }

    #[test]
    fn inlines_with_hygiene() {
        let program = injected(
            "
            max(a, b) = a > b + p * (4 + d)
            out(d) = 4 + max(c, d)
            v = out(15)
            h(c) = out(32)
            f(c) = out(c)
            ",
        )
        .unwrap();

        let expected = [
            ("max", "$a>$b+p*(4+d)"),
            ("out", "4+(c>$d+#p*(4+#d))"),
            ("v", "4+(#c>15+#p*(4+#d))"),
            ("h", "4+(#c>32+#p*(4+#d))"),
            ("f", "4+(#c>$c+#p*(4+#d))"),
        ];
        let expected: Vec<_> = expected.iter().map(|(n, b)| (n.to_string(), b.to_string())).collect();
        assert_eq!(bodies(&program), expected);
    }

    #[test]
    fn parenthesises_compound_arguments_and_bodies() {
        let program = injected("sq(x) = x * x\ny = sq(a + 1) - sq(2)\nz = sq(b)").unwrap();
        let found = bodies(&program);
        assert_eq!(found[1].1, "((a+1)*(a+1))-(2*2)");
        assert_eq!(found[2].1, "b*b");
    }

    #[test]
    fn primary_bodies_are_inlined_bare() {
        let program = injected("id(x) = x\nk = 2 * id(3)").unwrap();
        assert_eq!(bodies(&program)[1].1, "2*3");
    }

    #[test]
    fn undefined_and_recursive_calls_become_zero() {
        let program = injected("x = g(1) + 2\nf(a) = f(a) + 1\ny = later()\nlater() = 5").unwrap();
        let found = bodies(&program);
        assert_eq!(found[0].1, "0+2");
        assert_eq!(found[1].1, "0+1");
        assert_eq!(found[2].1, "0");
    }

    #[test]
    fn argument_count_must_match() {
        let result = injected("f(a) = a\nx = f(1, 2)");
        assert!(matches!(
            result,
            Err(CompileError::Arity { function, expected: 1, found: 2 }) if function == "f"
        ));
    }

    #[test]
    fn nested_calls_are_fully_inlined() {
        let program = injected("inc(n) = n + 1\ntwice(n) = inc(inc(n))\nx = twice(5)").unwrap();
        let found = bodies(&program);
        assert_eq!(found[1].1, "($n+1)+1");
        assert_eq!(found[2].1, "(5+1)+1");
    }

    #[test]
    fn lowering_twice_changes_nothing() {
        let source = "max(a, b) = a > b ? a : b\nx = max(1, 2) || 0";
        let mut first = Compressor::new(&parse(source, Mode::Strict).unwrap());
        first.reduce(&ReduceOptions::default()).unwrap();
        first.inject().unwrap();
        let lowered = first.program();

        let mut second = Compressor::new(&lowered);
        second.reduce(&ReduceOptions::default()).unwrap();
        second.inject().unwrap();
        assert_eq!(second.program(), lowered);
        assert!(second.added_symbols().is_empty());
    }
}
