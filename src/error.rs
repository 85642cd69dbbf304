//! Crate-wide error type
//!
//! Module errors (`WordError`, `HexError`, `AbiError`, `VmFault`,
//! `AssemblerError`, `QueryError`) stay typed at their call sites and convert
//! into [`CoreError`] where a single serializable error is wanted.

use crate::abi::AbiError;
use crate::evm::{AssemblerError, VmFault};
use crate::hex_codec::HexError;
use crate::query::QueryError;
use crate::word::WordError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl CoreError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors
    pub fn malformed_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::MalformedInput, msg)
    }

    pub fn schema_mismatch(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::SchemaMismatch, msg)
    }

    pub fn decoding_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::DecodingFailed, msg)
    }

    pub fn execution_fault(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExecutionFault, msg)
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfig, msg)
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for CoreError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Input errors
    MalformedInput,
    InvalidHex,
    InvalidType,

    // ABI errors
    SchemaMismatch,
    EncodingOverflow,
    DecodingFailed,

    // Execution
    ExecutionRevert,
    ExecutionFault,

    // Configuration
    InvalidConfig,
    JsonError,
}

pub type CoreResult<T> = Result<T, CoreError>;

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::new(ErrorCode::JsonError, e.to_string())
    }
}

impl From<HexError> for CoreError {
    fn from(e: HexError) -> Self {
        CoreError::new(ErrorCode::InvalidHex, e.to_string())
    }
}

impl From<WordError> for CoreError {
    fn from(e: WordError) -> Self {
        match e {
            WordError::Hex(hex) => hex.into(),
            WordError::UnsignedOverflow | WordError::SignedOverflow => {
                CoreError::new(ErrorCode::EncodingOverflow, e.to_string())
            }
            other => CoreError::malformed_input(other.to_string()),
        }
    }
}

impl From<AbiError> for CoreError {
    fn from(e: AbiError) -> Self {
        let code = match &e {
            AbiError::InvalidType(_) | AbiError::InvalidSignature(_) => ErrorCode::InvalidType,
            AbiError::InvalidValue(_) => ErrorCode::MalformedInput,
            AbiError::Overflow { .. } => ErrorCode::EncodingOverflow,
            AbiError::TypeMismatch { .. } | AbiError::LengthMismatch { .. } => ErrorCode::SchemaMismatch,
            AbiError::DecodingError(_) | AbiError::OutOfBounds { .. } | AbiError::InvalidSelector { .. } => {
                ErrorCode::DecodingFailed
            }
        };
        CoreError::new(code, e.to_string())
    }
}

impl From<VmFault> for CoreError {
    fn from(e: VmFault) -> Self {
        CoreError::execution_fault(e.to_string())
    }
}

impl From<AssemblerError> for CoreError {
    fn from(e: AssemblerError) -> Self {
        CoreError::malformed_input(format!("Assembler error: {}", e))
    }
}

impl From<QueryError> for CoreError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::Fault(fault) => fault.into(),
            QueryError::Reverted(revert) => {
                CoreError::new(ErrorCode::ExecutionRevert, "Execution reverted").with_details(revert.to_string())
            }
            QueryError::Abi(abi) => abi.into(),
            QueryError::Hex(hex) => hex.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::AbiType;
    use crate::query::Revert;

    #[test]
    fn test_error_serialization() {
        let err = CoreError::schema_mismatch("Wrong argument type").with_details("expected uint256, got bool");

        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("schema_mismatch"));
        assert!(json.contains("Wrong argument type"));

        let back: CoreError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }

    #[test]
    fn test_display() {
        let err = CoreError::invalid_config("step_limit must be positive").with_details("step_limit = 0");
        assert_eq!(err.to_string(), "[InvalidConfig] step_limit must be positive (step_limit = 0)");
    }

    #[test]
    fn test_module_error_codes() {
        let err: CoreError = AbiError::TypeMismatch {
            expected: AbiType::uint256(),
            got: AbiType::Bool,
        }
        .into();
        assert_eq!(err.code, ErrorCode::SchemaMismatch);
        assert!(err.message.contains("expected uint256, got bool"));

        let err: CoreError = WordError::SignedOverflow.into();
        assert_eq!(err.code, ErrorCode::EncodingOverflow);

        let err: CoreError = QueryError::Fault(VmFault::StepLimitExceeded(5)).into();
        assert_eq!(err.code, ErrorCode::ExecutionFault);

        let revert = Revert::Unrecognized { data: vec![0xab], halt: None };
        let err: CoreError = QueryError::Reverted(revert).into();
        assert_eq!(err.code, ErrorCode::ExecutionRevert);
        assert_eq!(err.details.as_deref(), Some("unrecognized revert 0xab"));

        let err: CoreError = HexError::OddLength(3).into();
        assert_eq!(err.code, ErrorCode::InvalidHex);
    }
}
