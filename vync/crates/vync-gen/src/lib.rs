//! vync-gen - LLVM IR generation for the Vyn compiler.
//!
//! Lowers a parsed (and preferably analyzed) module to LLVM IR through
//! inkwell. One [`CodeGenerator`] owns one LLVM context/module/builder
//! triple for the duration of a compilation unit and is never shared.
//!
//! - `types` - source-to-IR type mapping, type cache, user-type registry
//! - `llvm` - the visitor-driven lowering itself
//! - `error` - hard failure types (verification, output)
//!
//! # Example
//!
//! ```no_run
//! use inkwell::context::Context;
//! use vync_gen::CodeGenerator;
//! use vync_lex::tokenize;
//! use vync_par::Parser;
//! use vync_util::{FileId, Handler};
//!
//! let tokens = tokenize("fn main() -> Int { return 0 }", FileId::DUMMY).unwrap();
//! let module = Parser::new(tokens).parse_module().unwrap();
//!
//! let context = Context::create();
//! let handler = Handler::new();
//! let mut generator = CodeGenerator::new(&context, "main", &handler);
//! generator.compile_module(&module);
//! generator.verify().unwrap();
//! println!("{}", generator.emit_ir());
//! ```

mod error;
mod llvm;
mod types;

pub use error::{CodeGenError, Result};
pub use llvm::CodeGenerator;
pub use types::{TypeMapper, UserType};
