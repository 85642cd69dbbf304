//! Interpreter configuration
//!
//! Resource limits for a single query execution plus the constant block
//! environment the interpreter serves to environment opcodes. Presets:
//! - `standard`: mainnet-like limits
//! - `strict`: small budgets for untrusted bytecode
//! - `relaxed`: large budgets for heavy read-only queries

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// EVM stack depth
pub const MAX_STACK_DEPTH: usize = 1024;

/// Runtime code size cap from EIP-170
pub const MAX_CODE_SIZE: usize = 24_576;

/// Limit presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VmProfile {
    Standard,
    Strict,
    Relaxed,
    /// Hand-tuned settings
    Custom,
}

/// Interpreter settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmSettings {
    pub profile: VmProfile,
    /// Maximum number of executed instructions
    pub step_limit: u64,
    /// Maximum memory size in bytes
    pub memory_limit: usize,
    pub stack_limit: usize,
    /// Maximum accepted bytecode size in bytes
    pub max_code_size: usize,
    pub block: BlockEnv,
}

impl Default for VmSettings {
    fn default() -> Self {
        Self::standard()
    }
}

impl VmSettings {
    pub fn standard() -> Self {
        Self {
            profile: VmProfile::Standard,
            step_limit: 10_000_000,
            memory_limit: 16 * 1024 * 1024,
            stack_limit: MAX_STACK_DEPTH,
            max_code_size: MAX_CODE_SIZE,
            block: BlockEnv::default(),
        }
    }

    pub fn strict() -> Self {
        Self {
            profile: VmProfile::Strict,
            step_limit: 1_000_000,
            memory_limit: 1024 * 1024,
            stack_limit: MAX_STACK_DEPTH,
            max_code_size: MAX_CODE_SIZE,
            block: BlockEnv::default(),
        }
    }

    pub fn relaxed() -> Self {
        Self {
            profile: VmProfile::Relaxed,
            step_limit: 100_000_000,
            memory_limit: 64 * 1024 * 1024,
            stack_limit: MAX_STACK_DEPTH,
            max_code_size: 2 * MAX_CODE_SIZE,
            block: BlockEnv::default(),
        }
    }

    /// Same limits with a different step budget
    pub fn with_step_limit(mut self, step_limit: u64) -> Self {
        self.step_limit = step_limit;
        self.profile = VmProfile::Custom;
        self
    }

    pub fn with_block(mut self, block: BlockEnv) -> Self {
        self.block = block;
        self
    }

    /// Reject settings no execution could run under
    pub fn validate(&self) -> CoreResult<()> {
        if self.step_limit == 0 {
            return Err(CoreError::invalid_config("step_limit must be positive"));
        }
        if self.memory_limit < 32 {
            return Err(CoreError::invalid_config("memory_limit must hold at least one word")
                .with_details(format!("memory_limit = {}", self.memory_limit)));
        }
        if self.stack_limit == 0 || self.stack_limit > MAX_STACK_DEPTH {
            return Err(CoreError::invalid_config(format!(
                "stack_limit must be in 1..={}",
                MAX_STACK_DEPTH
            ))
            .with_details(format!("stack_limit = {}", self.stack_limit)));
        }
        if self.max_code_size == 0 {
            return Err(CoreError::invalid_config("max_code_size must be positive"));
        }
        Ok(())
    }

    /// Settings that are valid but unusual
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.stack_limit < MAX_STACK_DEPTH {
            warnings.push(format!(
                "Warning: stack_limit {} is below the EVM depth of {}",
                self.stack_limit, MAX_STACK_DEPTH
            ));
        }

        if self.max_code_size > MAX_CODE_SIZE {
            warnings.push("Warning: max_code_size exceeds the EIP-170 limit".to_string());
        }

        if self.memory_limit % 32 != 0 {
            warnings.push("Warning: memory_limit is not a multiple of 32".to_string());
        }

        warnings
    }

    /// Parse settings from JSON; missing fields take the standard values
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let settings: VmSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }
}

/// Block and transaction context served to environment opcodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockEnv {
    pub chain_id: u64,
    pub number: u64,
    pub timestamp: u64,
    pub gas_limit: u64,
    pub base_fee: u64,
    #[serde(with = "crate::serde_bytes::hex20")]
    pub coinbase: [u8; 20],
    #[serde(with = "crate::serde_bytes::hex32")]
    pub prevrandao: [u8; 32],
    /// Address of the executing contract
    #[serde(with = "crate::serde_bytes::hex20")]
    pub address: [u8; 20],
    #[serde(with = "crate::serde_bytes::hex20")]
    pub caller: [u8; 20],
    #[serde(with = "crate::serde_bytes::hex20")]
    pub origin: [u8; 20],
}

impl Default for BlockEnv {
    fn default() -> Self {
        Self {
            chain_id: 1,
            number: 0,
            timestamp: 0,
            gas_limit: 30_000_000,
            base_fee: 0,
            coinbase: [0u8; 20],
            prevrandao: [0u8; 32],
            address: [0u8; 20],
            caller: [0u8; 20],
            origin: [0u8; 20],
        }
    }
}
