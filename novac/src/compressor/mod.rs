//! Lowers a parsed program into plain arithmetic.
//!
//! `reduce` swaps every operator the target cannot express for a call to a
//! generated polyfill, `inject` then inlines every call.

pub mod inline;
pub mod polyfill;
pub mod reduce;

pub use polyfill::UnknownOperator;
pub use reduce::{PolyfillNamer, ReduceOptions};

use crate::ir::ast::Program;

pub struct Compressor {
    program: Program,
    added: Vec<String>,
}

impl Compressor {
    /// Works on its own copy; the caller's tree is never touched.
    pub fn new(program: &Program) -> Self {
        Self {
            program: program.clone(),
            added: Vec::new(),
        }
    }

    pub fn program(&self) -> Program {
        self.program.clone()
    }

    pub fn into_program(self) -> Program {
        self.program
    }

    /// Names of the polyfills minted so far, in minting order.
    pub fn added_symbols(&self) -> &[String] {
        &self.added
    }
}
