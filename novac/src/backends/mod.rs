pub mod batch;

use crate::error::CompileError;
use crate::ir::ast;
use crate::session::Session;

/// Serializes a fully lowered program (no calls, no ternaries).
pub trait Backend {
    fn compile(&mut self, program: &ast::Program, session: &Session) -> Result<String, CompileError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendType {
    #[default]
    Batch,
}

impl BackendType {
    pub fn all() -> Vec<Self> {
        vec![Self::Batch]
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().into_iter().find(|backend| backend.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Batch => "batch",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Batch => "Windows batch script (set assignments)",
        }
    }

    /// Extension of the compiled file, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Batch => "bat",
        }
    }

    pub fn create(&self) -> Box<dyn Backend> {
        match self {
            Self::Batch => Box::new(batch::BatchBackend::new()),
        }
    }
}
