//! Generic traversal over the program tree.
//!
//! `children` gives a read-only, ordered view of a node's direct children
//! (operators and callees included) and drives the textual outline. `visit`
//! is the mutating post-order walk the compiler passes are written against:
//! the visitor receives each node after its children together with the key
//! it is stored under, may overwrite it in place, and may ask for it to be
//! removed when it lives in an ordered sequence.

use std::fmt;

use crate::error::CompileError;
use crate::span::Span;

use super::ast::{
    Expression, FunctionParameter, IdentifierLiteral, Program, Statement, Symbol,
};

#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Program(&'a Program),
    Statement(&'a Statement),
    Symbol(&'a Symbol),
    Parameter(&'a FunctionParameter),
    Expression(&'a Expression),
    Callee(&'a IdentifierLiteral),
    Operator {
        glyph: &'static str,
        span: Option<Span>,
    },
}

pub enum NodeMut<'a> {
    Program(&'a mut Program),
    Statement(&'a mut Statement),
    Symbol(&'a mut Symbol),
    Expression(&'a mut Expression),
}

/// Where a node is stored in its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Root,
    Field(&'static str),
    Index(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Keep,
    Remove,
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("<root>"),
            Self::Field(name) => f.write_str(name),
            Self::Index(index) => write!(f, "[{}]", index),
        }
    }
}

impl<'a> NodeRef<'a> {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Program(_) => "Program",
            Self::Statement(Statement::Assignment(_)) => "AssignmentStatement",
            Self::Statement(Statement::Empty { .. }) => "EmptyStatement",
            Self::Statement(Statement::Comment { .. }) => "CommentStatement",
            Self::Symbol(Symbol::Variable(_)) => "VariableDefinition",
            Self::Symbol(Symbol::Function(_)) => "FunctionDefinition",
            Self::Parameter(_) => "FunctionParameter",
            Self::Expression(expression) => expression.kind_name(),
            Self::Callee(_) => "IdentifierLiteral",
            Self::Operator { .. } => "Operator",
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Program(program) => program.span,
            Self::Statement(statement) => statement.span(),
            Self::Symbol(symbol) => symbol.span(),
            Self::Parameter(param) => param.span,
            Self::Expression(expression) => expression.span(),
            Self::Callee(callee) => callee.span,
            Self::Operator { span, .. } => *span,
        }
    }

    fn detail(&self) -> Option<String> {
        let detail = match self {
            Self::Statement(Statement::Empty { blank_lines, .. }) => blank_lines.to_string(),
            Self::Statement(Statement::Comment { text, .. }) => format!("{:?}", text),
            Self::Symbol(symbol) => symbol.name().to_string(),
            Self::Parameter(param) => param.name.clone(),
            Self::Callee(callee) => callee.name.clone(),
            Self::Expression(Expression::Identifier(ident)) if ident.is_global => format!("#{}", ident.name),
            Self::Expression(Expression::Identifier(ident)) => ident.name.clone(),
            Self::Expression(Expression::Argument(arg)) => arg.name.clone(),
            Self::Expression(Expression::Number(number)) => number.value.to_string(),
            Self::Operator { glyph, .. } => glyph.to_string(),
            _ => return None,
        };
        Some(detail)
    }
}

/// Immediate children of `node`, in source order of their fields.
pub fn children(node: NodeRef<'_>) -> Vec<NodeRef<'_>> {
    match node {
        NodeRef::Program(program) => program.statements.iter().map(NodeRef::Statement).collect(),
        NodeRef::Statement(Statement::Assignment(assignment)) => vec![
            NodeRef::Symbol(&assignment.symbol),
            operator(assignment.operator.glyph(), assignment.operator.span),
            NodeRef::Expression(&assignment.expression),
        ],
        NodeRef::Statement(_) => Vec::new(),
        NodeRef::Symbol(Symbol::Function(function)) => function.params.iter().map(NodeRef::Parameter).collect(),
        NodeRef::Symbol(Symbol::Variable(_)) => Vec::new(),
        NodeRef::Expression(expression) => match expression {
            Expression::Binary(binary) => vec![
                NodeRef::Expression(&binary.left),
                operator(binary.operator.glyph(), binary.operator.span),
                NodeRef::Expression(&binary.right),
            ],
            Expression::Unary(unary) => vec![
                operator(unary.operator.glyph(), unary.operator.span),
                NodeRef::Expression(&unary.operand),
            ],
            Expression::Parenthesized(group) => vec![NodeRef::Expression(&group.inner)],
            Expression::Call(call) => std::iter::once(NodeRef::Callee(&call.callee))
                .chain(call.args.iter().map(NodeRef::Expression))
                .collect(),
            Expression::Ternary(ternary) => vec![
                NodeRef::Expression(&ternary.condition),
                operator(ternary.question.glyph(), ternary.question.span),
                NodeRef::Expression(&ternary.then_expr),
                operator(ternary.colon.glyph(), ternary.colon.span),
                NodeRef::Expression(&ternary.else_expr),
            ],
            Expression::Identifier(_) | Expression::Argument(_) | Expression::Number(_) => Vec::new(),
        },
        NodeRef::Parameter(_) | NodeRef::Callee(_) | NodeRef::Operator { .. } => Vec::new(),
    }
}

fn operator(glyph: &'static str, span: Option<Span>) -> NodeRef<'static> {
    NodeRef::Operator { glyph, span }
}

/// Indented one-node-per-line dump, children ordered by where they start.
pub fn outline(program: &Program) -> String {
    let mut out = String::new();
    outline_node(NodeRef::Program(program), 0, &mut out);
    out
}

fn outline_node(node: NodeRef<'_>, depth: usize, out: &mut String) {
    out.push_str(&" ".repeat(depth * 2));
    out.push_str(node.kind_name());
    if let Some(span) = node.span() {
        out.push_str(&format!(" {}..{}", span.start, span.end));
    }
    if let Some(detail) = node.detail() {
        out.push(' ');
        out.push_str(&detail);
    }
    out.push('\n');

    let mut kids = children(node);
    kids.sort_by_key(|child| child.span().map_or(0, |span| span.start));
    for child in kids {
        outline_node(child, depth + 1, out);
    }
}

/// Post-order walk. Sequences (statements, call arguments) are walked from
/// the last element to the first so removals do not shift pending indices.
pub fn visit<F>(node: NodeMut<'_>, visitor: &mut F) -> Result<(), CompileError>
where
    F: FnMut(NodeMut<'_>, Key) -> Result<Action, CompileError>,
{
    match walk(node, Key::Root, visitor)? {
        Action::Keep => Ok(()),
        Action::Remove => Err(CompileError::ForbiddenRemoval { key: Key::Root.to_string() }),
    }
}

fn walk<F>(node: NodeMut<'_>, key: Key, visitor: &mut F) -> Result<Action, CompileError>
where
    F: FnMut(NodeMut<'_>, Key) -> Result<Action, CompileError>,
{
    match node {
        NodeMut::Program(program) => {
            walk_sequence(&mut program.statements, |statement| NodeMut::Statement(statement), visitor)?;
            visitor(NodeMut::Program(program), key)
        }
        NodeMut::Statement(statement) => {
            if let Statement::Assignment(assignment) = &mut *statement {
                walk_field(NodeMut::Symbol(&mut assignment.symbol), "symbol", visitor)?;
                walk_field(NodeMut::Expression(&mut assignment.expression), "expression", visitor)?;
            }
            visitor(NodeMut::Statement(statement), key)
        }
        NodeMut::Symbol(symbol) => visitor(NodeMut::Symbol(symbol), key),
        NodeMut::Expression(expression) => {
            match &mut *expression {
                Expression::Binary(binary) => {
                    walk_field(NodeMut::Expression(&mut *binary.left), "left", visitor)?;
                    walk_field(NodeMut::Expression(&mut *binary.right), "right", visitor)?;
                }
                Expression::Unary(unary) => {
                    walk_field(NodeMut::Expression(&mut *unary.operand), "operand", visitor)?;
                }
                Expression::Parenthesized(group) => {
                    walk_field(NodeMut::Expression(&mut *group.inner), "inner", visitor)?;
                }
                Expression::Call(call) => {
                    walk_sequence(&mut call.args, |arg| NodeMut::Expression(arg), visitor)?;
                }
                Expression::Ternary(ternary) => {
                    walk_field(NodeMut::Expression(&mut *ternary.condition), "condition", visitor)?;
                    walk_field(NodeMut::Expression(&mut *ternary.then_expr), "then", visitor)?;
                    walk_field(NodeMut::Expression(&mut *ternary.else_expr), "else", visitor)?;
                }
                Expression::Identifier(_) | Expression::Argument(_) | Expression::Number(_) => {}
            }
            visitor(NodeMut::Expression(expression), key)
        }
    }
}

fn walk_field<F>(node: NodeMut<'_>, name: &'static str, visitor: &mut F) -> Result<(), CompileError>
where
    F: FnMut(NodeMut<'_>, Key) -> Result<Action, CompileError>,
{
    match walk(node, Key::Field(name), visitor)? {
        Action::Keep => Ok(()),
        Action::Remove => Err(CompileError::ForbiddenRemoval { key: name.to_string() }),
    }
}

fn walk_sequence<T, F>(
    items: &mut Vec<T>,
    wrap: fn(&mut T) -> NodeMut<'_>,
    visitor: &mut F,
) -> Result<(), CompileError>
where
    F: FnMut(NodeMut<'_>, Key) -> Result<Action, CompileError>,
{
    for index in (0..items.len()).rev() {
        if walk(wrap(&mut items[index]), Key::Index(index), visitor)? == Action::Remove {
            items.remove(index);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ast::BinaryOperator;

    fn sample() -> Program {
        Program::new(vec![
            Statement::comment("head"),
            Statement::assign(
                Symbol::variable("x"),
                Expression::binary(
                    Expression::identifier("y"),
                    BinaryOperator::Add,
                    Expression::call("f", vec![Expression::number(1), Expression::number(2)]),
                ),
            ),
            Statement::empty(2),
        ])
    }

    #[test]
    fn visits_children_before_parents_and_sequences_backwards() {
        let mut program = sample();
        let mut seen = Vec::new();
        visit(NodeMut::Program(&mut program), &mut |node, key| {
            let name = match node {
                NodeMut::Program(_) => "program".to_string(),
                NodeMut::Statement(_) => "statement".to_string(),
                NodeMut::Symbol(symbol) => symbol.name().to_string(),
                NodeMut::Expression(expression) => expression.kind_name().to_string(),
            };
            seen.push(format!("{}@{}", name, key));
            Ok(Action::Keep)
        })
        .unwrap();

        assert_eq!(
            seen,
            vec![
                "statement@[2]",
                "x@symbol",
                "IdentifierLiteral@left",
                "NumberLiteral@[1]",
                "NumberLiteral@[0]",
                "CallExpression@right",
                "BinaryExpression@expression",
                "statement@[1]",
                "statement@[0]",
                "program@<root>",
            ]
        );
    }

    #[test]
    fn replaces_nodes_in_place() {
        let mut program = sample();
        visit(NodeMut::Program(&mut program), &mut |node, _| {
            if let NodeMut::Expression(expression) = node {
                if let Expression::Call(_) = expression {
                    *expression = Expression::number(0);
                }
            }
            Ok(Action::Keep)
        })
        .unwrap();

        let Statement::Assignment(assignment) = &program.statements[1] else { panic!("expected assignment") };
        assert_eq!(
            assignment.expression,
            Expression::binary(Expression::identifier("y"), BinaryOperator::Add, Expression::number(0))
        );
    }

    #[test]
    fn removes_sequence_members_only() {
        let mut program = sample();
        visit(NodeMut::Program(&mut program), &mut |node, _| match node {
            NodeMut::Statement(Statement::Comment { .. } | Statement::Empty { .. }) => Ok(Action::Remove),
            NodeMut::Expression(Expression::Number(number)) if number.value == 1 => Ok(Action::Remove),
            _ => Ok(Action::Keep),
        })
        .unwrap();
        assert_eq!(program.statements.len(), 1);
        let Statement::Assignment(assignment) = &program.statements[0] else { panic!("expected assignment") };
        let Expression::Binary(binary) = &assignment.expression else { panic!("expected binary") };
        let Expression::Call(call) = &*binary.right else { panic!("expected call") };
        assert_eq!(call.args, vec![Expression::number(2)]);

        let err = visit(NodeMut::Program(&mut program), &mut |node, _| match node {
            NodeMut::Expression(Expression::Identifier(_)) => Ok(Action::Remove),
            _ => Ok(Action::Keep),
        })
        .unwrap_err();
        assert!(matches!(err, CompileError::ForbiddenRemoval { key } if key == "left"));
    }

    #[test]
    fn lists_children_with_operators_and_callee() {
        let program = sample();
        let Statement::Assignment(assignment) = &program.statements[1] else { panic!("expected assignment") };
        let kinds: Vec<_> = children(NodeRef::Expression(&assignment.expression))
            .iter()
            .map(|child| child.kind_name())
            .collect();
        assert_eq!(kinds, vec!["IdentifierLiteral", "Operator", "CallExpression"]);

        let Expression::Binary(binary) = &assignment.expression else { panic!("expected binary") };
        let call_children = children(NodeRef::Expression(&binary.right));
        assert_eq!(call_children.len(), 3);
        assert!(matches!(call_children[0], NodeRef::Callee(callee) if callee.name == "f"));
        assert_eq!(children(NodeRef::Program(&program)).len(), 3);
    }

    #[test]
    fn outlines_the_tree() {
        let program = Program::new(vec![Statement::assign(Symbol::function("f", &["a"]), Expression::argument("a"))]);
        assert_eq!(
            outline(&program),
            "Program\n  AssignmentStatement\n    FunctionDefinition f\n      FunctionParameter a\n    Operator =\n    ArgumentIdentifier a\n"
        );
    }
}
