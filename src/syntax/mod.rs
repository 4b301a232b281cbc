pub mod parser;
pub mod tree;

pub use parser::{JavaParser, SyntaxErrorLine};
pub use tree::{SyntaxNode, SyntaxTree};
