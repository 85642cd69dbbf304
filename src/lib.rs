//! EVM Query Core
//!
//! Typed access to EVM contracts without a node: ABI encoding and decoding,
//! selectors and custom errors, and a bundled interpreter that runs runtime
//! bytecode against calldata.
//!
//! # Architecture
//!
//! - **word**: 256-bit words with signed/unsigned conversions
//! - **hex_codec**: strict `0x` hex parsing and rendering
//! - **abi**: type system, encoder, decoder, selectors, error and event descriptors
//! - **evm**: interpreter, opcode table and a label-aware assembler
//! - **query**: runs a call and classifies reverts against known errors
//!
//! # Example
//!
//! ```rust,ignore
//! use evm_query_core::{AbiFunction, AbiType, AbiValue, QueryRunner, VmSettings};
//!
//! let sum = AbiFunction::from_signature("sum(uint256,uint256)", vec![AbiType::uint256()])?;
//! let runner = QueryRunner::new(VmSettings::standard());
//! let values = runner.call(&bytecode, &sum, &[AbiValue::uint256(3), AbiValue::uint256(4)], &[])?;
//! assert_eq!(values, vec![AbiValue::uint256(7)]);
//! ```

pub mod abi;
pub mod error;
pub mod evm;
pub mod hex_codec;
pub mod query;
pub mod serde_bytes;
pub mod utils;
pub mod word;

pub use abi::{
    AbiCustomError, AbiDecoder, AbiEncoder, AbiError, AbiEvent, AbiEventParam, AbiFunction, AbiParam,
    AbiSelector, AbiType, AbiValue,
};
pub use error::{CoreError, CoreResult, ErrorCode};
pub use evm::{Assembler, Execution, ExecutionOutcome, Executor, HaltReason, Interpreter, VmFault};
pub use hex_codec::{HexCodec, HexError, HexString};
pub use query::{QueryError, QueryOutcome, QueryRunner, Revert};
pub use utils::crypto::{keccak256, Hasher256, Keccak256};
pub use utils::vm_config::{BlockEnv, VmSettings};
pub use word::{Word, WordError};
