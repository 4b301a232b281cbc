pub mod analyzer;
pub mod config;
pub mod disambig;
pub mod env;
pub mod error;
pub mod hierarchy;
pub mod link;
pub mod logging;
pub mod syntax;
pub mod typeck;
pub mod types;
pub mod weeder;

pub use analyzer::Analyzer;
pub use config::Settings;
pub use env::GlobalEnv;
pub use error::{AnalyzeError, AnalyzeResult, SemanticError, SemanticResult};
pub use types::{Modifiers, NodeId, ScopeId, Span, TypeId, UnitId};
