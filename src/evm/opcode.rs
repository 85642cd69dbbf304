//! Opcode table
//!
//! Single-byte opcodes are declared once in [`define_opcodes!`], which
//! generates the constants and the mnemonic table. The numbered families
//! (PUSHn, DUPn, SWAPn, LOGn) are ranges and get their mnemonics generated.

use lazy_static::lazy_static;

macro_rules! define_opcodes {
    ( $( $(#[$doc:meta])* $name:ident = $code:expr ),* $(,)? ) => {
        $(
            $(#[$doc])*
            pub const $name: u8 = $code;
        )*

        const NAMED: &[(u8, &str)] = &[
            $( ($code, stringify!($name)), )*
        ];
    };
}

define_opcodes! {
    STOP = 0x00,
    ADD = 0x01,
    MUL = 0x02,
    SUB = 0x03,
    DIV = 0x04,
    SDIV = 0x05,
    MOD = 0x06,
    SMOD = 0x07,
    ADDMOD = 0x08,
    MULMOD = 0x09,
    EXP = 0x0a,
    SIGNEXTEND = 0x0b,

    LT = 0x10,
    GT = 0x11,
    SLT = 0x12,
    SGT = 0x13,
    EQ = 0x14,
    ISZERO = 0x15,
    AND = 0x16,
    OR = 0x17,
    XOR = 0x18,
    NOT = 0x19,
    BYTE = 0x1a,
    SHL = 0x1b,
    SHR = 0x1c,
    SAR = 0x1d,

    KECCAK256 = 0x20,

    ADDRESS = 0x30,
    BALANCE = 0x31,
    ORIGIN = 0x32,
    CALLER = 0x33,
    CALLVALUE = 0x34,
    CALLDATALOAD = 0x35,
    CALLDATASIZE = 0x36,
    CALLDATACOPY = 0x37,
    CODESIZE = 0x38,
    CODECOPY = 0x39,
    GASPRICE = 0x3a,
    EXTCODESIZE = 0x3b,
    EXTCODECOPY = 0x3c,
    RETURNDATASIZE = 0x3d,
    RETURNDATACOPY = 0x3e,
    EXTCODEHASH = 0x3f,

    BLOCKHASH = 0x40,
    COINBASE = 0x41,
    TIMESTAMP = 0x42,
    NUMBER = 0x43,
    PREVRANDAO = 0x44,
    GASLIMIT = 0x45,
    CHAINID = 0x46,
    SELFBALANCE = 0x47,
    BASEFEE = 0x48,
    BLOBHASH = 0x49,
    BLOBBASEFEE = 0x4a,

    POP = 0x50,
    MLOAD = 0x51,
    MSTORE = 0x52,
    MSTORE8 = 0x53,
    SLOAD = 0x54,
    SSTORE = 0x55,
    JUMP = 0x56,
    JUMPI = 0x57,
    PC = 0x58,
    MSIZE = 0x59,
    GAS = 0x5a,
    JUMPDEST = 0x5b,
    TLOAD = 0x5c,
    TSTORE = 0x5d,
    MCOPY = 0x5e,
    PUSH0 = 0x5f,

    CREATE = 0xf0,
    CALL = 0xf1,
    CALLCODE = 0xf2,
    RETURN = 0xf3,
    DELEGATECALL = 0xf4,
    CREATE2 = 0xf5,
    STATICCALL = 0xfa,
    REVERT = 0xfd,
    /// Designated invalid instruction
    INVALID = 0xfe,
    SELFDESTRUCT = 0xff,
}

pub const PUSH1: u8 = 0x60;
pub const PUSH2: u8 = 0x61;
pub const PUSH4: u8 = 0x63;
pub const PUSH32: u8 = 0x7f;
pub const DUP1: u8 = 0x80;
pub const DUP16: u8 = 0x8f;
pub const SWAP1: u8 = 0x90;
pub const SWAP16: u8 = 0x9f;
pub const LOG0: u8 = 0xa0;
pub const LOG4: u8 = 0xa4;

lazy_static! {
    static ref MNEMONICS: Vec<Option<String>> = {
        let mut table: Vec<Option<String>> = vec![None; 256];
        for (code, name) in NAMED {
            table[*code as usize] = Some((*name).to_string());
        }
        for n in 1..=32u8 {
            table[(PUSH1 + n - 1) as usize] = Some(format!("PUSH{}", n));
        }
        for n in 1..=16u8 {
            table[(DUP1 + n - 1) as usize] = Some(format!("DUP{}", n));
            table[(SWAP1 + n - 1) as usize] = Some(format!("SWAP{}", n));
        }
        for n in 0..=4u8 {
            table[(LOG0 + n) as usize] = Some(format!("LOG{}", n));
        }
        table
    };
}

/// Mnemonic of a defined opcode
pub fn name(op: u8) -> Option<&'static str> {
    MNEMONICS[op as usize].as_deref()
}

/// Immediate bytes following a PUSH opcode (0 for everything else)
pub fn push_size(op: u8) -> usize {
    if (PUSH1..=PUSH32).contains(&op) {
        (op - PUSH1 + 1) as usize
    } else {
        0
    }
}

/// Opcodes that need state outside a single isolated contract
pub fn requires_external_state(op: u8) -> bool {
    matches!(
        op,
        CREATE | CALL | CALLCODE | DELEGATECALL | CREATE2 | STATICCALL | SELFDESTRUCT
            | EXTCODESIZE | EXTCODECOPY | EXTCODEHASH
    )
}
