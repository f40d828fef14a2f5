use tracing::debug;

use crate::backends::BackendType;
use crate::compressor::{Compressor, ReduceOptions};
use crate::error::CompileError;
use crate::ir::ast::Program;
use crate::parser::{self, Mode};
use crate::session::Session;

/// Source text in, target script out.
///
/// One instance is one editing session: names minted by earlier
/// compilations stay known to later ones.
pub struct Compiler {
    mode: Mode,
    target: BackendType,
    options: ReduceOptions,
    session: Session,
}

impl Compiler {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            target: BackendType::default(),
            options: ReduceOptions::default(),
            session: Session::new(),
        }
    }

    pub fn with_target(mut self, target: BackendType) -> Self {
        self.target = target;
        self
    }

    pub fn with_reduce_options(mut self, options: ReduceOptions) -> Self {
        self.options = options;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn compile(&mut self, source: &str) -> Result<String, CompileError> {
        let program = parser::parse(source, self.mode)?;
        let lowered = self.lower(&program)?;
        let mut backend = self.target.create();
        backend.compile(&lowered, &self.session)
    }

    /// Runs both compressor passes and records the minted names.
    pub fn lower(&mut self, program: &Program) -> Result<Program, CompileError> {
        let mut compressor = Compressor::new(program);
        compressor.reduce(&self.options)?;
        compressor.inject()?;

        let added = compressor.added_symbols();
        debug!(polyfills = added.len(), target = self.target.name(), "lowered program");
        self.session.record(added.iter().cloned());
        Ok(compressor.into_program())
    }
}

/// Strict one-shot compilation to the default target.
pub fn compile(source: &str) -> Result<String, CompileError> {
    Compiler::new(Mode::Strict).compile(source)
}

/// Best-effort compilation of possibly broken source. Only faults found
/// after parsing (argument count mismatches, naming collisions) surface.
pub fn compile_lenient(source: &str) -> Result<String, CompileError> {
    Compiler::new(Mode::Lenient).compile(source)
}
