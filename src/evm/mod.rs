//! Bundled EVM interpreter
//!
//! Executes a single contract's runtime bytecode in isolation. Opcodes that
//! need other accounts or sub-calls are reported as unsupported rather than
//! emulated.

pub mod assembler;
pub mod machine;
pub mod opcode;

#[cfg(test)]
mod tests;

pub use assembler::*;
pub use machine::*;
