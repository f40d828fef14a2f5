use std::collections::BTreeSet;
use std::mem;

use tracing::debug;

use crate::error::CompileError;
use crate::ir::ast::{self, Expression, FunctionDefinition, IdentifierLiteral, Statement, Symbol};
use crate::ir::{Action, NodeMut, NodeRef, children, visit};
use crate::session::Session;

use super::Backend;

/// Emits one `set "name=expr"` line per assignment.
///
/// Function definitions become `set "name=(a0,a1,expr)"`, where `a0, a1, ...`
/// replace the declared parameter names and are shared by every function of
/// the program.
#[derive(Default)]
pub struct BatchBackend {
    output: String,
    temporaries: Vec<String>,
}

impl Backend for BatchBackend {
    fn compile(&mut self, program: &ast::Program, session: &Session) -> Result<String, CompileError> {
        self.compile_program(program, session)
    }
}

impl BatchBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compile_program(&mut self, program: &ast::Program, session: &Session) -> Result<String, CompileError> {
        self.output.clear();
        self.temporaries = temporaries(program, session);
        debug!(temporaries = ?self.temporaries, "function parameter names");

        for statement in &program.statements {
            if is_omitted(statement, session) {
                continue;
            }
            self.compile_statement(statement)?;
        }

        Ok(mem::take(&mut self.output))
    }

    fn compile_statement(&mut self, statement: &Statement) -> Result<(), CompileError> {
        match statement {
            Statement::Assignment(assignment) => {
                let line = match &assignment.symbol {
                    Symbol::Variable(variable) => {
                        format!("set \"{}={}\"", variable.name, render(&assignment.expression)?)
                    }
                    Symbol::Function(function) => self.compile_function(function, &assignment.expression)?,
                };
                self.output.push_str(&line);
                self.output.push('\n');
            }
            Statement::Empty { blank_lines, .. } => {
                self.output.push_str(&"\n".repeat((*blank_lines).max(1)));
            }
            Statement::Comment { text, .. } => {
                for line in text.split('\n') {
                    self.output.push_str("rem ");
                    self.output.push_str(line);
                    self.output.push('\n');
                }
            }
        }
        Ok(())
    }

    fn compile_function(&self, function: &FunctionDefinition, body: &Expression) -> Result<String, CompileError> {
        let params: Vec<&str> = self
            .temporaries
            .iter()
            .take(function.params.len())
            .map(String::as_str)
            .collect();

        let mut body = body.clone();
        bind_parameters(&mut body, function, &params)?;
        let body = render(&body)?;

        if params.is_empty() {
            Ok(format!("set \"{}=({})\"", function.name, body))
        } else {
            Ok(format!("set \"{}=({},{})\"", function.name, params.join(","), body))
        }
    }
}

/// Text of a lowered expression. Ternaries and calls must have been
/// compiled away before this point.
pub fn render(expression: &Expression) -> Result<String, CompileError> {
    let mut out = String::new();
    write_expression(&mut out, expression)?;
    Ok(out)
}

fn write_expression(out: &mut String, expression: &Expression) -> Result<(), CompileError> {
    match expression {
        Expression::Identifier(ident) => out.push_str(&ident.name),
        Expression::Argument(arg) => out.push_str(&arg.name),
        Expression::Number(number) => out.push_str(&number.value.to_string()),
        Expression::Binary(binary) => {
            write_expression(out, &binary.left)?;
            out.push_str(binary.operator.glyph());
            write_expression(out, &binary.right)?;
        }
        Expression::Unary(unary) => {
            out.push_str(unary.operator.glyph());
            write_expression(out, &unary.operand)?;
        }
        Expression::Parenthesized(group) => {
            out.push('(');
            write_expression(out, &group.inner)?;
            out.push(')');
        }
        Expression::Call(_) | Expression::Ternary(_) => {
            return Err(CompileError::UnsupportedOperation { node: expression.kind_name() });
        }
    }
    Ok(())
}

// Polyfills are inlined everywhere, their definitions are dead weight.
fn is_omitted(statement: &Statement, session: &Session) -> bool {
    match statement {
        Statement::Assignment(assignment) => assignment.is_generated() && session.is_minted(assignment.symbol.name()),
        _ => false,
    }
}

/// `a0, a1, ...` up to the widest parameter list, skipping every name the
/// program already uses.
fn temporaries(program: &ast::Program, session: &Session) -> Vec<String> {
    let mut taken = BTreeSet::new();
    let mut widest = 0;
    for statement in &program.statements {
        if is_omitted(statement, session) {
            continue;
        }
        if let Statement::Assignment(assignment) = statement {
            if let Symbol::Function(function) = &assignment.symbol {
                widest = widest.max(function.params.len());
            }
        }
        collect_names(NodeRef::Statement(statement), &mut taken);
    }

    let mut names = Vec::with_capacity(widest);
    let mut n = 0;
    while names.len() < widest {
        let candidate = format!("a{}", n);
        n += 1;
        if !taken.contains(&candidate) {
            names.push(candidate);
        }
    }
    names
}

fn collect_names(node: NodeRef<'_>, taken: &mut BTreeSet<String>) {
    match node {
        NodeRef::Symbol(symbol) => {
            taken.insert(symbol.name().to_string());
        }
        NodeRef::Expression(Expression::Identifier(ident)) => {
            taken.insert(ident.name.clone());
        }
        NodeRef::Callee(ident) => {
            taken.insert(ident.name.clone());
        }
        _ => {}
    }
    for child in children(node) {
        collect_names(child, taken);
    }
}

/// Renames the function's own parameters to the shared temporaries.
fn bind_parameters(body: &mut Expression, function: &FunctionDefinition, params: &[&str]) -> Result<(), CompileError> {
    visit(NodeMut::Expression(body), &mut |node, _| {
        let NodeMut::Expression(expression) = node else {
            return Ok(Action::Keep);
        };
        let name = match expression {
            Expression::Argument(arg) => Some(&arg.name),
            Expression::Identifier(ident) if !ident.is_global => Some(&ident.name),
            _ => None,
        };
        let slot = name.and_then(|name| function.params.iter().position(|param| param.name == *name));
        if let Some(temporary) = slot.and_then(|i| params.get(i)) {
            let span = expression.span();
            *expression = Expression::Identifier(IdentifierLiteral {
                name: temporary.to_string(),
                is_global: false,
                span,
            });
        }
        Ok(Action::Keep)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compressor::UnknownOperator;
    use crate::ir::ast::BinaryOperator;
    use crate::parser::{Mode, parse};
    use crate::span::Span;

    fn generate(source: &str) -> Result<String, CompileError> {
        let program = parse(source, Mode::Strict)?;
        BatchBackend::new().compile(&program, &Session::new())
    }

    #[test]
    fn emits_variable_assignments() {
        assert_eq!(generate("hello = 2 + 8 * 5").unwrap(), "set \"hello=2+8*5\"\n");
        assert_eq!(generate("x = -(y % 3) ** ~z >>> 1").unwrap(), "set \"x=-(y%3)**~z>>>1\"\n");
    }

    #[test]
    fn emits_functions_with_shared_temporaries() {
        let output = generate("f(x, y) = x * y + #x\ng(z) = z - 1").unwrap();
        assert_eq!(output, "set \"f=(a0,a1,a0*a1+x)\"\nset \"g=(a0,a0-1)\"\n");
    }

    #[test]
    fn temporaries_avoid_program_symbols() {
        let sum = Expression::binary(Expression::argument("p"), BinaryOperator::Add, Expression::argument("q"));
        let program = ast::Program::new(vec![
            Statement::assign(Symbol::variable("a0"), Expression::number(1)),
            Statement::assign(
                Symbol::function("f", &["p", "q"]),
                Expression::binary(sum, BinaryOperator::Add, Expression::identifier("a2")),
            ),
        ]);
        let output = BatchBackend::new().compile(&program, &Session::new()).unwrap();
        assert_eq!(output, "set \"a0=1\"\nset \"f=(a1,a3,a1+a3+a2)\"\n");
    }

    #[test]
    fn zero_parameter_functions_have_no_temporaries() {
        assert_eq!(generate("k() = 5").unwrap(), "set \"k=(5)\"\n");
    }

    #[test]
    fn keeps_comments_and_blank_lines() {
        let output = generate("; one\nx = 1\n\n\ny = 2").unwrap();
        assert_eq!(output, "rem one\nset \"x=1\"\n\n\nset \"y=2\"\n");

        let program = ast::Program::new(vec![Statement::comment("a\nb"), Statement::empty(0)]);
        let output = BatchBackend::new().compile(&program, &Session::new()).unwrap();
        assert_eq!(output, "rem a\nrem b\n\n");
    }

    #[test]
    fn refuses_unlowered_nodes() {
        let ternary = generate("x = a ? b : c");
        assert!(matches!(ternary, Err(CompileError::UnsupportedOperation { node: "TernaryExpression" })));
        let call = generate("x = 1 + f(2)");
        assert!(matches!(call, Err(CompileError::UnsupportedOperation { node: "CallExpression" })));
    }

    #[test]
    fn omits_generated_definitions_of_minted_names() {
        let program = ast::Program::new(vec![
            UnknownOperator::Less.polyfill("_lessthan_0"),
            Statement::assign(Symbol::variable("x"), Expression::number(1)),
        ]);

        let fresh = BatchBackend::new().compile(&program, &Session::new()).unwrap();
        assert_eq!(fresh, "set \"_lessthan_0=(a0,a1,(((a0-a1)>>31)&1))\"\nset \"x=1\"\n");

        let mut session = Session::new();
        session.record(["_lessthan_0"]);
        let output = BatchBackend::new().compile(&program, &session).unwrap();
        assert_eq!(output, "set \"x=1\"\n");
    }

    #[test]
    fn user_statements_with_minted_names_are_kept() {
        let program = ast::Program::new(vec![
            Statement::assign(Symbol::variable("_lessthan_0"), Expression::number(4)).with_span(Span::default()),
        ]);
        let mut session = Session::new();
        session.record(["_lessthan_0"]);
        let output = BatchBackend::new().compile(&program, &session).unwrap();
        assert_eq!(output, "set \"_lessthan_0=4\"\n");
    }
}
