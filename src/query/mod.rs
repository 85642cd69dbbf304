//! Contract queries
//!
//! Runs a contract's runtime bytecode against ABI-encoded calldata and
//! classifies reverts against known custom errors.

pub mod runner;


pub use runner::*;
