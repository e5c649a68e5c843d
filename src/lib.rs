//! A tree-walking interpreter for ES3 with the KJS extensions: a parser
//! that specializes access shapes up front, a completion-based statement
//! executor and a source printer for every node.

pub mod ast;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod types;

pub use error::EngineError;
pub use interpreter::{Completion, EngineConfig, Interpreter, JsFunction};
pub use types::{JsObject, JsString, JsValue};
