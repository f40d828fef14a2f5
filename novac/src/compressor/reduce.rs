use std::collections::BTreeSet;
use std::mem;

use tracing::debug;

use crate::error::CompileError;
use crate::ir::ast::{Expression, Statement};
use crate::ir::{Action, NodeMut, visit};

use super::{Compressor, UnknownOperator};

/// `namer(operator, requested_base, solved_name)` returns the name to use.
pub type PolyfillNamer = Box<dyn Fn(UnknownOperator, &str, &str) -> String>;

#[derive(Default)]
pub struct ReduceOptions {
    /// Overrides the minted polyfill names. A name that is already taken
    /// fails the pass.
    pub polyfill_namer: Option<PolyfillNamer>,
}

impl ReduceOptions {
    pub fn with_namer<F>(namer: F) -> Self
    where
        F: Fn(UnknownOperator, &str, &str) -> String + 'static,
    {
        Self { polyfill_namer: Some(Box::new(namer)) }
    }
}

/// Mints one polyfill per distinct operator, in order of first use.
struct Minter<'o> {
    options: &'o ReduceOptions,
    taken: BTreeSet<String>,
    minted: Vec<(UnknownOperator, String)>,
}

impl Minter<'_> {
    fn name_for(&mut self, operator: UnknownOperator) -> Result<String, CompileError> {
        if let Some((_, name)) = self.minted.iter().find(|(known, _)| *known == operator) {
            return Ok(name.clone());
        }

        let base = operator.base_name();
        let mut n = 0;
        while self.taken.contains(&format!("_{}_{}", base, n)) {
            n += 1;
        }
        let solved = format!("_{}_{}", base, n);

        let name = match &self.options.polyfill_namer {
            Some(namer) => {
                let forced = namer(operator, base, &solved);
                if self.taken.contains(&forced) {
                    return Err(CompileError::NameCollision { name: forced });
                }
                forced
            }
            None => solved,
        };

        debug!(%operator, name = %name, "minted polyfill");
        self.taken.insert(name.clone());
        self.minted.push((operator, name.clone()));
        Ok(name)
    }

    fn lower(&mut self, expression: &mut Expression) -> Result<(), CompileError> {
        let operator = match expression {
            Expression::Binary(binary) => UnknownOperator::from_binary(binary.operator.sign),
            Expression::Ternary(_) => Some(UnknownOperator::Ternary),
            _ => None,
        };
        let Some(operator) = operator else {
            return Ok(());
        };
        let name = self.name_for(operator)?;

        let args = match mem::replace(expression, Expression::number(0)) {
            Expression::Binary(binary) => vec![*binary.left, *binary.right],
            Expression::Ternary(ternary) => vec![*ternary.condition, *ternary.then_expr, *ternary.else_expr],
            other => {
                *expression = other;
                return Ok(());
            }
        };
        *expression = Expression::call(name, args);
        Ok(())
    }
}

impl Compressor {
    /// Rewrites `?:`, `||`, `&&` and the comparisons into calls to generated
    /// polyfill functions, which are prepended to the program.
    pub fn reduce(&mut self, options: &ReduceOptions) -> Result<(), CompileError> {
        let mut minter = Minter {
            options,
            taken: self.program.assignments().map(|a| a.symbol.name().to_string()).collect(),
            minted: Vec::new(),
        };

        for statement in &mut self.program.statements {
            if !matches!(statement, Statement::Assignment(_)) {
                continue;
            }
            visit(NodeMut::Statement(statement), &mut |node, _| {
                if let NodeMut::Expression(expression) = node {
                    minter.lower(expression)?;
                }
                Ok(Action::Keep)
            })?;
        }

        if minter.minted.is_empty() {
            return Ok(());
        }
        let mut statements: Vec<Statement> = minter
            .minted
            .iter()
            .map(|(operator, name)| operator.polyfill(name))
            .collect();
        statements.append(&mut self.program.statements);
        self.program.statements = statements;
        self.added.extend(minter.minted.into_iter().map(|(_, name)| name));
        Ok(())
    }
}
