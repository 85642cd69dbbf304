//! Bytecode builder with labels
//!
//! Small programmatic assembler for hand-built test contracts and demos.
//! Labels emit a JUMPDEST where they are defined; references are PUSH2
//! placeholders patched in [`Assembler::build`].

use super::opcode as op;
use crate::word::Word;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssemblerError {
    #[error("Label '{0}' defined twice")]
    DuplicateLabel(String),

    #[error("Label '{0}' is referenced but never defined")]
    UndefinedLabel(String),

    #[error("Label '{label}' at offset {offset} does not fit in PUSH2")]
    LabelOutOfRange { label: String, offset: usize },

    #[error("PUSH immediate of {0} bytes (expected 1..=32)")]
    InvalidPushSize(usize),
}

#[derive(Debug, Default, Clone)]
pub struct Assembler {
    code: Vec<u8>,
    labels: HashMap<String, usize>,
    fixups: Vec<(usize, String)>,
    error: Option<AssemblerError>,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current code offset
    pub fn offset(&self) -> usize {
        self.code.len()
    }

    pub fn op(mut self, opcode: u8) -> Self {
        self.code.push(opcode);
        self
    }

    pub fn ops(mut self, opcodes: &[u8]) -> Self {
        self.code.extend_from_slice(opcodes);
        self
    }

    /// Append bytes verbatim
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.code.extend_from_slice(bytes);
        self
    }

    pub fn push_u64(self, value: u64) -> Self {
        self.push_word(Word::from_u64(value))
    }

    /// Shortest PUSH for the value; PUSH0 for zero
    pub fn push_word(self, value: Word) -> Self {
        let bytes = value.as_bytes();
        match bytes.iter().position(|b| *b != 0) {
            Some(first) => self.push_bytes(&bytes[first..]),
            None => self.op(op::PUSH0),
        }
    }

    /// PUSHn with exactly these immediate bytes
    pub fn push_bytes(mut self, bytes: &[u8]) -> Self {
        if bytes.is_empty() || bytes.len() > 32 {
            self.error.get_or_insert(AssemblerError::InvalidPushSize(bytes.len()));
            return self;
        }
        self.code.push(op::PUSH1 + (bytes.len() - 1) as u8);
        self.code.extend_from_slice(bytes);
        self
    }

    /// PUSH2 of a label's offset, resolved at build time
    pub fn push_label(mut self, label: &str) -> Self {
        self.code.push(op::PUSH2);
        self.fixups.push((self.code.len(), label.to_string()));
        self.code.extend_from_slice(&[0, 0]);
        self
    }

    /// Define a label here and emit its JUMPDEST
    pub fn label(mut self, label: &str) -> Self {
        if self.labels.contains_key(label) {
            self.error.get_or_insert(AssemblerError::DuplicateLabel(label.to_string()));
            return self;
        }
        self.labels.insert(label.to_string(), self.code.len());
        self.code.push(op::JUMPDEST);
        self
    }

    /// Jump to a label
    pub fn jump(self, label: &str) -> Self {
        self.push_label(label).op(op::JUMP)
    }

    /// Jump to a label if the top of the stack is nonzero
    pub fn jump_if(self, label: &str) -> Self {
        self.push_label(label).op(op::JUMPI)
    }

    pub fn build(self) -> Result<Vec<u8>, AssemblerError> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let mut code = self.code;
        for (at, label) in self.fixups {
            let target = *self
                .labels
                .get(&label)
                .ok_or_else(|| AssemblerError::UndefinedLabel(label.clone()))?;
            let target = u16::try_from(target).map_err(|_| AssemblerError::LabelOutOfRange {
                label: label.clone(),
                offset: target,
            })?;
            code[at..at + 2].copy_from_slice(&target.to_be_bytes());
        }
        Ok(code)
    }
}
