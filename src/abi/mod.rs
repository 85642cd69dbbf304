//! ABI (Application Binary Interface) module for Solidity/EVM contracts
//!
//! This module provides ABI encoding/decoding functionality:
//! - All Solidity types (uint, int, address, bool, bytes, string, arrays, tuples)
//! - Function call encoding and result decoding
//! - Custom error payloads and event log decoding
//! - Function selector calculation

pub mod types;
pub mod encoder;
pub mod decoder;
pub mod selector;


pub use types::*;
pub use encoder::*;
pub use decoder::*;
pub use selector::*;
