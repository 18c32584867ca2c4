//! PEG-to-C recursive-descent parser compiler back end.
//!
//! A front end builds a [`ast::Grammar`] by declaring rules and filling
//! in their expression trees; [`driver::compile`] analyzes it, assigns
//! variable offsets, and emits one self-contained C translation unit
//! implementing a backtracking recursive-descent parser for it.
//!
//! ```text
//! Grammar  ->  analyzer::analyze  ->  variables::assign_offsets  ->  driver::compile  ->  C source
//! ```

pub mod analyzer;
pub mod ast;
pub mod charclass;
pub mod diagnostics;
pub mod driver;
pub mod emit;
pub mod error;
pub mod label;
pub mod runtime;
pub mod variables;
pub mod writer;

pub use ast::Grammar;
pub use diagnostics::Diagnostics;
pub use driver::{compile, DriverOptions};
pub use error::{FletchError, FletchResult};
