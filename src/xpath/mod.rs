//! XPath 1.0 Engine
//!
//! XPath 1.0 over the arena tree:
//! - All tree axes (attribute steps yield attribute values)
//! - The core function library
//! - Per-step predicates evaluated in axis proximity order
//! - Compiled expression caching

pub mod axes;
pub mod cache;
pub mod compiler;
pub mod eval;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod value;

pub use cache::ExprCache;
pub use compiler::{compile, CompiledExpr};
pub use eval::{evaluate, evaluate_compiled_from, evaluate_from_node};
pub use value::XPathValue;
