//! Query runner
//!
//! Executes runtime bytecode against calldata and turns the result into
//! either the raw output or a classified revert. Runner faults (budgets,
//! unsupported opcodes) are errors, never reverts.

use crate::abi::{AbiCustomError, AbiDecoder, AbiEncoder, AbiError, AbiFunction, AbiValue};
use crate::evm::{Execution, ExecutionOutcome, Executor, HaltReason, Interpreter, VmFault};
use crate::hex_codec::{HexCodec, HexError};
use crate::utils::logging::{is_debug_enabled, LogEntry, LogLevel};
use crate::utils::vm_config::VmSettings;
use crate::log_debug;
use std::fmt;
use thiserror::Error;

const MODULE: &str = "query";

/// A revert after classification against the known errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revert {
    /// Selector matched a known error and its body decoded
    Known {
        error: AbiCustomError,
        values: Vec<AbiValue>,
    },
    /// Anything else; the payload is kept byte-for-byte
    Unrecognized {
        data: Vec<u8>,
        halt: Option<HaltReason>,
    },
}

impl Revert {
    pub fn is_known(&self) -> bool {
        matches!(self, Revert::Known { .. })
    }

    /// Name of the matched error
    pub fn error_name(&self) -> Option<&str> {
        match self {
            Revert::Known { error, .. } => Some(error.name()),
            Revert::Unrecognized { .. } => None,
        }
    }

    /// Raw payload of an unrecognized revert
    pub fn raw_data(&self) -> Option<&[u8]> {
        match self {
            Revert::Known { .. } => None,
            Revert::Unrecognized { data, .. } => Some(data),
        }
    }
}

impl fmt::Display for Revert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Revert::Known { error, values } => {
                write!(f, "{}", error.name())?;
                write!(f, "{}", AbiValue::Tuple(values.clone()))
            }
            Revert::Unrecognized { data, halt: Some(reason) } => {
                write!(f, "halted: {} (data {})", reason, HexCodec::serialize(data))
            }
            Revert::Unrecognized { data, halt: None } => {
                write!(f, "unrecognized revert {}", HexCodec::serialize(data))
            }
        }
    }
}

/// Result of a query that ran to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Success(Vec<u8>),
    Reverted(Revert),
}

impl QueryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, QueryOutcome::Success(_))
    }

    pub fn output(&self) -> Option<&[u8]> {
        match self {
            QueryOutcome::Success(output) => Some(output),
            QueryOutcome::Reverted(_) => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Execution fault: {0}")]
    Fault(#[from] VmFault),

    #[error("Execution reverted: {0}")]
    Reverted(Revert),

    #[error("ABI error: {0}")]
    Abi(#[from] AbiError),

    #[error("Hex error: {0}")]
    Hex(#[from] HexError),
}

/// Runs queries on an [`Executor`], the bundled interpreter by default
#[derive(Debug, Clone, Default)]
pub struct QueryRunner<E: Executor = Interpreter> {
    executor: E,
}

impl QueryRunner<Interpreter> {
    pub fn new(settings: VmSettings) -> Self {
        Self {
            executor: Interpreter::new(settings),
        }
    }
}

impl<E: Executor> QueryRunner<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Execute bytecode with calldata, classifying reverts against `known_errors`
    pub fn execute(
        &self,
        bytecode: &[u8],
        calldata: &[u8],
        known_errors: &[AbiCustomError],
    ) -> Result<QueryOutcome, QueryError> {
        if is_debug_enabled() {
            LogEntry::new(LogLevel::Debug, MODULE, "Executing query")
                .bytes_field("bytecode", bytecode)
                .bytes_field("calldata", calldata)
                .log();
        }

        let Execution { outcome, steps, logs } = match self.executor.execute(bytecode, calldata) {
            Ok(execution) => execution,
            Err(fault) => {
                log_debug!(MODULE, "Execution faulted", fault = fault);
                return Err(fault.into());
            }
        };

        let result = match outcome {
            ExecutionOutcome::Return(output) => {
                LogEntry::new(LogLevel::Debug, MODULE, "Execution returned")
                    .field("steps", steps)
                    .field("logs", logs.len())
                    .bytes_field("output", &output)
                    .log();
                QueryOutcome::Success(output)
            }
            ExecutionOutcome::Revert(data) => {
                LogEntry::new(LogLevel::Debug, MODULE, "Execution reverted")
                    .field("steps", steps)
                    .bytes_field("data", &data)
                    .log();
                QueryOutcome::Reverted(Self::classify_revert(&data, None, known_errors))
            }
            ExecutionOutcome::Halt(reason) => {
                log_debug!(MODULE, "Execution halted", steps = steps, reason = reason);
                QueryOutcome::Reverted(Self::classify_revert(&[], Some(reason), known_errors))
            }
        };

        Ok(result)
    }

    /// [`execute`](Self::execute) with hex-encoded bytecode and calldata
    pub fn execute_hex(
        &self,
        bytecode: &str,
        calldata: &str,
        known_errors: &[AbiCustomError],
    ) -> Result<QueryOutcome, QueryError> {
        let bytecode = HexCodec::parse(bytecode)?;
        let calldata = HexCodec::parse(calldata)?;
        self.execute(&bytecode, &calldata, known_errors)
    }

    /// Encode a call, execute it and decode the function's outputs
    ///
    /// Reverts surface as [`QueryError::Reverted`].
    pub fn call(
        &self,
        bytecode: &[u8],
        function: &AbiFunction,
        args: &[AbiValue],
        known_errors: &[AbiCustomError],
    ) -> Result<Vec<AbiValue>, QueryError> {
        let calldata = AbiEncoder::encode_function_call(function, args)?;

        match self.execute(bytecode, &calldata, known_errors)? {
            QueryOutcome::Success(output) => Ok(AbiDecoder::decode_function_result(function, &output)?),
            QueryOutcome::Reverted(revert) => Err(QueryError::Reverted(revert)),
        }
    }

    /// Match a revert payload against known errors by selector
    ///
    /// The first selector match wins. If its body does not decode, the revert
    /// is reported as unrecognized with the payload untouched.
    pub fn classify_revert(data: &[u8], halt: Option<HaltReason>, known_errors: &[AbiCustomError]) -> Revert {
        let unrecognized = |halt| Revert::Unrecognized {
            data: data.to_vec(),
            halt,
        };

        if data.len() < 4 {
            return unrecognized(halt);
        }

        let Some(error) = known_errors.iter().find(|e| data[..4] == e.selector()) else {
            return unrecognized(halt);
        };

        match AbiDecoder::decode_error(error, data) {
            Ok(values) => Revert::Known {
                error: error.clone(),
                values,
            },
            Err(err) => {
                LogEntry::new(LogLevel::Warn, MODULE, "Revert selector matched but body did not decode")
                    .field("error", error.signature())
                    .field("reason", err)
                    .bytes_field("data", data)
                    .log();
                unrecognized(halt)
            }
        }
    }
}
