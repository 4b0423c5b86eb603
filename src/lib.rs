pub mod analysis;
pub mod ast;
pub mod builtins;
pub mod diagnostics;
pub mod interp;
pub mod parser;
pub mod runtime;
pub mod scanner;
pub mod token;
