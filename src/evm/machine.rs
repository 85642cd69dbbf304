//! Bytecode interpreter
//!
//! Runs one contract's runtime code against calldata in a fresh machine:
//! stack, memory, storage and logs are created per execution and dropped
//! afterwards. Resource limits come from [`VmSettings`]; exhausting them is a
//! [`VmFault`], while contract-level failures (REVERT, invalid jumps, stack
//! errors) are ordinary outcomes.

use super::opcode as op;
use crate::utils::crypto::keccak256;
use crate::utils::vm_config::VmSettings;
use crate::word::Word;
use ethers_core::types::U256;
use num_bigint::BigUint;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Runner-level failures, distinct from anything the contract does
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VmFault {
    #[error("Step limit of {0} exceeded")]
    StepLimitExceeded(u64),

    #[error("Memory expansion to {requested} bytes exceeds limit of {limit}")]
    MemoryLimitExceeded { requested: usize, limit: usize },

    #[error("Opcode {name} (0x{opcode:02x}) needs state outside an isolated query")]
    UnsupportedOpcode { opcode: u8, name: &'static str },

    #[error("Bytecode of {size} bytes exceeds limit of {limit}")]
    CodeTooLarge { size: usize, limit: usize },
}

/// Why execution stopped abnormally
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HaltReason {
    #[error("invalid opcode 0x{0:02x}")]
    InvalidOpcode(u8),

    #[error("invalid jump destination {0}")]
    InvalidJump(usize),

    #[error("stack underflow")]
    StackUnderflow,

    #[error("stack overflow")]
    StackOverflow,

    #[error("return data out of bounds")]
    ReturnDataOutOfBounds,

    #[error("designated invalid instruction")]
    DesignatedInvalid,
}

/// How execution ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// RETURN, STOP or running off the end of the code
    Return(Vec<u8>),
    Revert(Vec<u8>),
    /// Exceptional halt; no output
    Halt(HaltReason),
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Return(_))
    }
}

/// Log emitted by LOG0..LOG4
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmLog {
    pub address: [u8; 20],
    pub topics: Vec<Word>,
    pub data: Vec<u8>,
}

/// Result of one execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub outcome: ExecutionOutcome,
    /// Instructions executed
    pub steps: u64,
    /// Logs emitted; discarded by the caller on revert
    pub logs: Vec<EvmLog>,
}

/// Something that can run runtime bytecode against calldata
pub trait Executor {
    fn execute(&self, code: &[u8], calldata: &[u8]) -> Result<Execution, VmFault>;
}

/// Bundled interpreter
#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    settings: VmSettings,
}

impl Interpreter {
    pub fn new(settings: VmSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &VmSettings {
        &self.settings
    }
}

impl Executor for Interpreter {
    fn execute(&self, code: &[u8], calldata: &[u8]) -> Result<Execution, VmFault> {
        if code.len() > self.settings.max_code_size {
            return Err(VmFault::CodeTooLarge {
                size: code.len(),
                limit: self.settings.max_code_size,
            });
        }
        Machine::new(&self.settings, code, calldata).run()
    }
}

/// Early exit from the step loop
enum Stop {
    Halt(HaltReason),
    Fault(VmFault),
}

impl From<HaltReason> for Stop {
    fn from(reason: HaltReason) -> Self {
        Stop::Halt(reason)
    }
}

impl From<VmFault> for Stop {
    fn from(fault: VmFault) -> Self {
        Stop::Fault(fault)
    }
}

enum Flow {
    Continue,
    Done(ExecutionOutcome),
}

fn sign_bit() -> U256 {
    U256::one() << 255
}

fn is_negative(x: U256) -> bool {
    x.bit(255)
}

/// Two's-complement negation
fn negate(x: U256) -> U256 {
    (!x).overflowing_add(U256::one()).0
}

fn abs(x: U256) -> U256 {
    if is_negative(x) {
        negate(x)
    } else {
        x
    }
}

fn to_usize(x: U256) -> Option<usize> {
    if x.bits() > 64 {
        return None;
    }
    usize::try_from(x.low_u64()).ok()
}

fn to_big(x: U256) -> BigUint {
    Word::from(x).to_unsigned()
}

/// Reduces modulo 2^256
fn from_big(x: &BigUint) -> U256 {
    let bytes = x.to_bytes_be();
    let start = bytes.len().saturating_sub(32);
    U256::from_big_endian(&bytes[start..])
}

fn address_word(addr: &[u8; 20]) -> U256 {
    U256::from_big_endian(addr)
}

/// Per-execution state
struct Machine<'a> {
    settings: &'a VmSettings,
    code: &'a [u8],
    calldata: &'a [u8],
    jumpdests: Vec<bool>,
    pc: usize,
    stack: Vec<U256>,
    memory: Vec<u8>,
    storage: HashMap<U256, U256>,
    transient: HashMap<U256, U256>,
    logs: Vec<EvmLog>,
    steps: u64,
}

impl<'a> fmt::Debug for Machine<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("pc", &self.pc)
            .field("stack_depth", &self.stack.len())
            .field("memory", &self.memory.len())
            .field("steps", &self.steps)
            .finish()
    }
}

impl<'a> Machine<'a> {
    fn new(settings: &'a VmSettings, code: &'a [u8], calldata: &'a [u8]) -> Self {
        Self {
            settings,
            code,
            calldata,
            jumpdests: Self::analyze_jumpdests(code),
            pc: 0,
            stack: Vec::with_capacity(64),
            memory: Vec::new(),
            storage: HashMap::new(),
            transient: HashMap::new(),
            logs: Vec::new(),
            steps: 0,
        }
    }

    /// Marks JUMPDEST bytes that are opcodes, not PUSH immediates
    fn analyze_jumpdests(code: &[u8]) -> Vec<bool> {
        let mut valid = vec![false; code.len()];
        let mut pc = 0;
        while pc < code.len() {
            let opcode = code[pc];
            if opcode == op::JUMPDEST {
                valid[pc] = true;
            }
            pc += 1 + op::push_size(opcode);
        }
        valid
    }

    fn run(mut self) -> Result<Execution, VmFault> {
        let outcome = loop {
            match self.step() {
                Ok(Flow::Continue) => {}
                Ok(Flow::Done(outcome)) => break outcome,
                Err(Stop::Halt(reason)) => break ExecutionOutcome::Halt(reason),
                Err(Stop::Fault(fault)) => return Err(fault),
            }
        };

        Ok(Execution {
            outcome,
            steps: self.steps,
            logs: self.logs,
        })
    }

    fn charge(&mut self) -> Result<(), Stop> {
        let next = self.steps.saturating_add(1);
        if next > self.settings.step_limit {
            return Err(VmFault::StepLimitExceeded(self.settings.step_limit).into());
        }
        self.steps = next;
        Ok(())
    }

    fn push(&mut self, value: U256) -> Result<(), Stop> {
        if self.stack.len() >= self.settings.stack_limit {
            return Err(HaltReason::StackOverflow.into());
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Result<U256, Stop> {
        self.stack.pop().ok_or(Stop::Halt(HaltReason::StackUnderflow))
    }

    fn pop2(&mut self) -> Result<(U256, U256), Stop> {
        let a = self.pop()?;
        let b = self.pop()?;
        Ok((a, b))
    }

    fn pop3(&mut self) -> Result<(U256, U256, U256), Stop> {
        let a = self.pop()?;
        let b = self.pop()?;
        let c = self.pop()?;
        Ok((a, b, c))
    }

    /// Grow memory to cover `offset..offset + len`, returning the range as usize
    ///
    /// Zero-length accesses never expand memory, whatever the offset.
    fn expand(&mut self, offset: U256, len: U256) -> Result<(usize, usize), Stop> {
        if len.is_zero() {
            return Ok((0, 0));
        }
        let limit = self.settings.memory_limit;
        let too_large = || VmFault::MemoryLimitExceeded {
            requested: usize::MAX,
            limit,
        };

        let offset = to_usize(offset).ok_or_else(too_large)?;
        let len = to_usize(len).ok_or_else(too_large)?;
        let end = offset.checked_add(len).ok_or_else(too_large)?;
        let rounded = end.checked_add(31).ok_or_else(too_large)? / 32 * 32;

        if rounded > limit {
            return Err(VmFault::MemoryLimitExceeded { requested: rounded, limit }.into());
        }
        if rounded > self.memory.len() {
            self.memory.resize(rounded, 0);
        }
        Ok((offset, len))
    }

    fn read_memory(&mut self, offset: U256, len: U256) -> Result<Vec<u8>, Stop> {
        let (start, len) = self.expand(offset, len)?;
        Ok(self.memory[start..start + len].to_vec())
    }

    /// Copy `source[src..src + len]` into memory at `dest`, zero-filling past the source end
    fn copy_to_memory(source: &[u8], memory: &mut [u8], dest: usize, src: U256, len: usize) {
        let target = &mut memory[dest..dest + len];
        target.fill(0);
        if let Some(src) = to_usize(src) {
            if src < source.len() {
                let available = (source.len() - src).min(len);
                target[..available].copy_from_slice(&source[src..src + available]);
            }
        }
    }

    /// 32 bytes of `source` starting at `offset`, zero-padded
    fn load_word(source: &[u8], offset: U256) -> U256 {
        let mut buf = [0u8; 32];
        if let Some(start) = to_usize(offset) {
            if start < source.len() {
                let available = (source.len() - start).min(32);
                buf[..available].copy_from_slice(&source[start..start + available]);
            }
        }
        U256::from_big_endian(&buf)
    }

    fn jump(&mut self, dest: U256) -> Result<(), Stop> {
        match to_usize(dest) {
            Some(target) if target < self.code.len() && self.jumpdests[target] => {
                self.pc = target;
                Ok(())
            }
            Some(target) => Err(HaltReason::InvalidJump(target).into()),
            None => Err(HaltReason::InvalidJump(usize::MAX).into()),
        }
    }

    fn step(&mut self) -> Result<Flow, Stop> {
        let Some(&opcode) = self.code.get(self.pc) else {
            // Running off the end is an implicit STOP
            return Ok(Flow::Done(ExecutionOutcome::Return(Vec::new())));
        };
        self.charge()?;
        self.pc += 1;

        let settings = self.settings;
        let block = &settings.block;

        match opcode {
            op::STOP => return Ok(Flow::Done(ExecutionOutcome::Return(Vec::new()))),

            op::ADD => {
                let (a, b) = self.pop2()?;
                self.push(a.overflowing_add(b).0)?;
            }
            op::MUL => {
                let (a, b) = self.pop2()?;
                self.push(a.overflowing_mul(b).0)?;
            }
            op::SUB => {
                let (a, b) = self.pop2()?;
                self.push(a.overflowing_sub(b).0)?;
            }
            op::DIV => {
                let (a, b) = self.pop2()?;
                self.push(a.checked_div(b).unwrap_or_default())?;
            }
            op::SDIV => {
                let (a, b) = self.pop2()?;
                let result = if b.is_zero() {
                    U256::zero()
                } else {
                    let q = abs(a) / abs(b);
                    if is_negative(a) != is_negative(b) {
                        negate(q)
                    } else {
                        q
                    }
                };
                self.push(result)?;
            }
            op::MOD => {
                let (a, b) = self.pop2()?;
                self.push(a.checked_rem(b).unwrap_or_default())?;
            }
            op::SMOD => {
                let (a, b) = self.pop2()?;
                let result = if b.is_zero() {
                    U256::zero()
                } else {
                    let r = abs(a) % abs(b);
                    if is_negative(a) {
                        negate(r)
                    } else {
                        r
                    }
                };
                self.push(result)?;
            }
            op::ADDMOD | op::MULMOD => {
                let (a, b, n) = self.pop3()?;
                let result = if n.is_zero() {
                    U256::zero()
                } else {
                    let (a, b, n) = (to_big(a), to_big(b), to_big(n));
                    let r = if opcode == op::ADDMOD { (a + b) % n } else { (a * b) % n };
                    from_big(&r)
                };
                self.push(result)?;
            }
            op::EXP => {
                let (base, exponent) = self.pop2()?;
                let modulus = BigUint::from(1u8) << 256u32;
                self.push(from_big(&to_big(base).modpow(&to_big(exponent), &modulus)))?;
            }
            op::SIGNEXTEND => {
                let (b, x) = self.pop2()?;
                let result = match to_usize(b) {
                    Some(b) if b < 31 => {
                        let sign = b * 8 + 7;
                        let mask = (U256::one() << sign) - U256::one();
                        if x.bit(sign) {
                            x | !mask
                        } else {
                            x & mask
                        }
                    }
                    _ => x,
                };
                self.push(result)?;
            }

            op::LT => {
                let (a, b) = self.pop2()?;
                self.push(U256::from((a < b) as u8))?;
            }
            op::GT => {
                let (a, b) = self.pop2()?;
                self.push(U256::from((a > b) as u8))?;
            }
            op::SLT => {
                let (a, b) = self.pop2()?;
                self.push(U256::from(((a ^ sign_bit()) < (b ^ sign_bit())) as u8))?;
            }
            op::SGT => {
                let (a, b) = self.pop2()?;
                self.push(U256::from(((a ^ sign_bit()) > (b ^ sign_bit())) as u8))?;
            }
            op::EQ => {
                let (a, b) = self.pop2()?;
                self.push(U256::from((a == b) as u8))?;
            }
            op::ISZERO => {
                let a = self.pop()?;
                self.push(U256::from(a.is_zero() as u8))?;
            }
            op::AND => {
                let (a, b) = self.pop2()?;
                self.push(a & b)?;
            }
            op::OR => {
                let (a, b) = self.pop2()?;
                self.push(a | b)?;
            }
            op::XOR => {
                let (a, b) = self.pop2()?;
                self.push(a ^ b)?;
            }
            op::NOT => {
                let a = self.pop()?;
                self.push(!a)?;
            }
            op::BYTE => {
                let (i, x) = self.pop2()?;
                let result = match to_usize(i) {
                    // byte() indexes from the least significant end
                    Some(i) if i < 32 => U256::from(x.byte(31 - i)),
                    _ => U256::zero(),
                };
                self.push(result)?;
            }
            op::SHL => {
                let (shift, value) = self.pop2()?;
                let result = match to_usize(shift) {
                    Some(s) if s < 256 => value << s,
                    _ => U256::zero(),
                };
                self.push(result)?;
            }
            op::SHR => {
                let (shift, value) = self.pop2()?;
                let result = match to_usize(shift) {
                    Some(s) if s < 256 => value >> s,
                    _ => U256::zero(),
                };
                self.push(result)?;
            }
            op::SAR => {
                let (shift, value) = self.pop2()?;
                let negative = is_negative(value);
                let result = match to_usize(shift) {
                    Some(s) if s < 256 => {
                        if negative {
                            !((!value) >> s)
                        } else {
                            value >> s
                        }
                    }
                    _ if negative => U256::MAX,
                    _ => U256::zero(),
                };
                self.push(result)?;
            }

            op::KECCAK256 => {
                let (offset, len) = self.pop2()?;
                let data = self.read_memory(offset, len)?;
                self.push(U256::from_big_endian(&keccak256(&data)))?;
            }

            op::ADDRESS => self.push(address_word(&block.address))?,
            op::BALANCE => {
                self.pop()?;
                self.push(U256::zero())?;
            }
            op::ORIGIN => self.push(address_word(&block.origin))?,
            op::CALLER => self.push(address_word(&block.caller))?,
            op::CALLVALUE => self.push(U256::zero())?,
            op::CALLDATALOAD => {
                let offset = self.pop()?;
                self.push(Self::load_word(self.calldata, offset))?;
            }
            op::CALLDATASIZE => self.push(U256::from(self.calldata.len()))?,
            op::CALLDATACOPY | op::CODECOPY => {
                let (dest, src, len) = self.pop3()?;
                let (dest, len) = self.expand(dest, len)?;
                let source = if opcode == op::CALLDATACOPY { self.calldata } else { self.code };
                Self::copy_to_memory(source, &mut self.memory, dest, src, len);
            }
            op::CODESIZE => self.push(U256::from(self.code.len()))?,
            op::GASPRICE => self.push(U256::from(block.base_fee))?,
            op::RETURNDATASIZE => self.push(U256::zero())?,
            op::RETURNDATACOPY => {
                let (dest, src, len) = self.pop3()?;
                // No sub-calls, so the return data buffer is always empty
                if !src.is_zero() || !len.is_zero() {
                    return Err(HaltReason::ReturnDataOutOfBounds.into());
                }
                self.expand(dest, len)?;
            }

            op::BLOCKHASH | op::BLOBHASH => {
                self.pop()?;
                self.push(U256::zero())?;
            }
            op::COINBASE => self.push(address_word(&block.coinbase))?,
            op::TIMESTAMP => self.push(U256::from(block.timestamp))?,
            op::NUMBER => self.push(U256::from(block.number))?,
            op::PREVRANDAO => self.push(U256::from_big_endian(&block.prevrandao))?,
            op::GASLIMIT => self.push(U256::from(block.gas_limit))?,
            op::CHAINID => self.push(U256::from(block.chain_id))?,
            op::SELFBALANCE => self.push(U256::zero())?,
            op::BASEFEE => self.push(U256::from(block.base_fee))?,
            // Minimum blob base fee
            op::BLOBBASEFEE => self.push(U256::one())?,

            op::POP => {
                self.pop()?;
            }
            op::MLOAD => {
                let offset = self.pop()?;
                let (start, _) = self.expand(offset, U256::from(32))?;
                self.push(U256::from_big_endian(&self.memory[start..start + 32]))?;
            }
            op::MSTORE => {
                let (offset, value) = self.pop2()?;
                let (start, _) = self.expand(offset, U256::from(32))?;
                value.to_big_endian(&mut self.memory[start..start + 32]);
            }
            op::MSTORE8 => {
                let (offset, value) = self.pop2()?;
                let (start, _) = self.expand(offset, U256::one())?;
                self.memory[start] = value.byte(0);
            }
            op::SLOAD => {
                let key = self.pop()?;
                let value = self.storage.get(&key).copied().unwrap_or_default();
                self.push(value)?;
            }
            op::SSTORE => {
                let (key, value) = self.pop2()?;
                self.storage.insert(key, value);
            }
            op::TLOAD => {
                let key = self.pop()?;
                let value = self.transient.get(&key).copied().unwrap_or_default();
                self.push(value)?;
            }
            op::TSTORE => {
                let (key, value) = self.pop2()?;
                self.transient.insert(key, value);
            }
            op::JUMP => {
                let dest = self.pop()?;
                self.jump(dest)?;
            }
            op::JUMPI => {
                let (dest, condition) = self.pop2()?;
                if !condition.is_zero() {
                    self.jump(dest)?;
                }
            }
            op::PC => self.push(U256::from(self.pc - 1))?,
            op::MSIZE => self.push(U256::from(self.memory.len()))?,
            // Remaining step budget stands in for gas
            op::GAS => self.push(U256::from(self.settings.step_limit - self.steps))?,
            op::JUMPDEST => {}
            op::MCOPY => {
                let (dest, src, len) = self.pop3()?;
                if !len.is_zero() {
                    let (dest, len) = self.expand(dest, len)?;
                    let (src, _) = self.expand(src, U256::from(len))?;
                    self.memory.copy_within(src..src + len, dest);
                }
            }

            op::PUSH0 => self.push(U256::zero())?,
            op::PUSH1..=op::PUSH32 => {
                let n = op::push_size(opcode);
                let mut buf = [0u8; 32];
                // Immediates cut off by the end of the code read as zero
                let available = self.code.len().saturating_sub(self.pc).min(n);
                buf[32 - n..32 - n + available].copy_from_slice(&self.code[self.pc..self.pc + available]);
                self.pc += n;
                self.push(U256::from_big_endian(&buf))?;
            }
            op::DUP1..=op::DUP16 => {
                let depth = (opcode - op::DUP1 + 1) as usize;
                if self.stack.len() < depth {
                    return Err(HaltReason::StackUnderflow.into());
                }
                let value = self.stack[self.stack.len() - depth];
                self.push(value)?;
            }
            op::SWAP1..=op::SWAP16 => {
                let depth = (opcode - op::SWAP1 + 1) as usize;
                let len = self.stack.len();
                if len <= depth {
                    return Err(HaltReason::StackUnderflow.into());
                }
                self.stack.swap(len - 1, len - 1 - depth);
            }
            op::LOG0..=op::LOG4 => {
                let topic_count = (opcode - op::LOG0) as usize;
                let (offset, len) = self.pop2()?;
                let mut topics = Vec::with_capacity(topic_count);
                for _ in 0..topic_count {
                    topics.push(Word::from(self.pop()?));
                }
                let data = self.read_memory(offset, len)?;
                self.logs.push(EvmLog {
                    address: self.settings.block.address,
                    topics,
                    data,
                });
            }

            op::RETURN => {
                let (offset, len) = self.pop2()?;
                let data = self.read_memory(offset, len)?;
                return Ok(Flow::Done(ExecutionOutcome::Return(data)));
            }
            op::REVERT => {
                let (offset, len) = self.pop2()?;
                let data = self.read_memory(offset, len)?;
                return Ok(Flow::Done(ExecutionOutcome::Revert(data)));
            }
            op::INVALID => return Err(HaltReason::DesignatedInvalid.into()),

            other if op::requires_external_state(other) => {
                return Err(VmFault::UnsupportedOpcode {
                    opcode: other,
                    name: op::name(other).unwrap_or("UNKNOWN"),
                }
                .into());
            }

            other => return Err(HaltReason::InvalidOpcode(other).into()),
        }

        Ok(Flow::Continue)
    }
}
