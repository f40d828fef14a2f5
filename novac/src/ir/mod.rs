pub mod ast;
pub mod node;

pub use node::{children, outline, visit, Action, Key, NodeMut, NodeRef};
