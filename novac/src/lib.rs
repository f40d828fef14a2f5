//! Branchless expression compiler.
//!
//! Comparisons, logic and ternaries are lowered into integer arithmetic so the
//! emitted batch script is made of plain `set` assignments.

pub mod backends;
pub mod compressor;
pub mod driver;
pub mod error;
pub mod ir;
pub mod parser;
pub mod session;
pub mod span;

pub use driver::{Compiler, compile, compile_lenient};
pub use error::CompileError;
pub use parser::Mode;
pub use session::Session;
