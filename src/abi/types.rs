//! ABI type definitions for Solidity/EVM contracts

use super::selector::AbiSelector;
use crate::hex_codec::HexCodec;
use num_bigint::{BigInt, BigUint};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// All encodable Solidity types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AbiType {
    /// Unsigned integer of the given bit width (8..=256, multiple of 8)
    Uint(usize),
    /// Signed integer of the given bit width
    Int(usize),
    Address,
    Bool,
    /// bytes1 through bytes32
    FixedBytes(usize),
    Bytes,
    String,
    /// Dynamic array T[]
    Array(Box<AbiType>),
    /// Fixed-size array T[N]
    FixedArray(Box<AbiType>, usize),
    Tuple(Vec<AbiType>),
}

impl AbiType {
    pub fn uint256() -> Self {
        AbiType::Uint(256)
    }

    pub fn int256() -> Self {
        AbiType::Int(256)
    }

    pub fn bytes32() -> Self {
        AbiType::FixedBytes(32)
    }

    pub fn array(inner: AbiType) -> Self {
        AbiType::Array(Box::new(inner))
    }

    pub fn fixed_array(inner: AbiType, size: usize) -> Self {
        AbiType::FixedArray(Box::new(inner), size)
    }

    /// Check if the type is dynamic (requires offset encoding)
    pub fn is_dynamic(&self) -> bool {
        match self {
            AbiType::Bytes | AbiType::String | AbiType::Array(_) => true,
            AbiType::FixedArray(inner, _) => inner.is_dynamic(),
            AbiType::Tuple(components) => components.iter().any(|t| t.is_dynamic()),
            _ => false,
        }
    }

    /// Bytes occupied in the head: the full inline size for static types,
    /// one offset word for dynamic ones
    ///
    /// Saturates at `usize::MAX`; no buffer can hold a head that large, so
    /// bounds checks against it fail instead of wrapping.
    pub fn head_size(&self) -> usize {
        match self {
            AbiType::Tuple(components) if !self.is_dynamic() => components
                .iter()
                .fold(0usize, |total, t| total.saturating_add(t.head_size())),
            AbiType::FixedArray(inner, size) if !self.is_dynamic() => {
                inner.head_size().checked_mul(*size).unwrap_or(usize::MAX)
            }
            _ => 32,
        }
    }

    /// Reject widths the ABI does not define
    pub fn validate(&self) -> Result<(), AbiError> {
        match self {
            AbiType::Uint(bits) | AbiType::Int(bits) => {
                if *bits == 0 || *bits > 256 || bits % 8 != 0 {
                    return Err(AbiError::InvalidType(format!(
                        "integer width must be a multiple of 8 in 8..=256: {}",
                        bits
                    )));
                }
                Ok(())
            }
            AbiType::FixedBytes(size) => {
                if *size == 0 || *size > 32 {
                    return Err(AbiError::InvalidType(format!(
                        "bytes size must be 1-32: {}",
                        size
                    )));
                }
                Ok(())
            }
            AbiType::Array(inner) => inner.validate(),
            AbiType::FixedArray(inner, size) => {
                if *size == 0 {
                    return Err(AbiError::InvalidType("fixed array of size 0".to_string()));
                }
                inner.validate()
            }
            AbiType::Tuple(components) => {
                // An empty tuple encodes to nothing, so arrays of it would have no size bound
                if components.is_empty() {
                    return Err(AbiError::InvalidType("empty tuple".to_string()));
                }
                components.iter().try_for_each(|t| t.validate())
            }
            AbiType::Address | AbiType::Bool | AbiType::Bytes | AbiType::String => Ok(()),
        }
    }

    /// Parse tuple components handling nested parentheses
    fn parse_tuple_components(s: &str) -> Result<Vec<AbiType>, AbiError> {
        let mut components = Vec::new();
        let mut current = String::new();
        let mut depth: i32 = 0;

        for c in s.chars() {
            match c {
                '(' => {
                    depth += 1;
                    current.push(c);
                }
                ')' => {
                    depth -= 1;
                    if depth < 0 {
                        return Err(AbiError::InvalidType(format!("Unbalanced parentheses: {}", s)));
                    }
                    current.push(c);
                }
                ',' if depth == 0 => {
                    if current.trim().is_empty() {
                        return Err(AbiError::InvalidType(format!("Empty tuple component: ({})", s)));
                    }
                    components.push(current.trim().parse()?);
                    current.clear();
                }
                _ => current.push(c),
            }
        }

        if depth != 0 {
            return Err(AbiError::InvalidType(format!("Unbalanced parentheses: {}", s)));
        }
        if current.trim().is_empty() {
            return Err(AbiError::InvalidType(format!("Empty tuple component: ({})", s)));
        }
        components.push(current.trim().parse()?);

        Ok(components)
    }

    fn parse_width(digits: &str, kind: &str) -> Result<usize, AbiError> {
        Self::parse_decimal(digits).ok_or_else(|| AbiError::InvalidType(format!("Invalid {} size: {}", kind, digits)))
    }

    /// Plain decimal: ASCII digits only, no sign, no leading zero
    fn parse_decimal(digits: &str) -> Option<usize> {
        let canonical = !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
            && (digits == "0" || !digits.starts_with('0'));
        if !canonical {
            return None;
        }
        digits.parse().ok()
    }

    /// Canonical type string used in signatures
    pub fn canonical_type(&self) -> String {
        match self {
            AbiType::Uint(bits) => format!("uint{}", bits),
            AbiType::Int(bits) => format!("int{}", bits),
            AbiType::Address => "address".to_string(),
            AbiType::Bool => "bool".to_string(),
            AbiType::FixedBytes(size) => format!("bytes{}", size),
            AbiType::Bytes => "bytes".to_string(),
            AbiType::String => "string".to_string(),
            AbiType::Array(inner) => format!("{}[]", inner.canonical_type()),
            AbiType::FixedArray(inner, size) => format!("{}[{}]", inner.canonical_type(), size),
            AbiType::Tuple(components) => {
                let inner = components
                    .iter()
                    .map(|t| t.canonical_type())
                    .collect::<Vec<_>>()
                    .join(",");
                format!("({})", inner)
            }
        }
    }
}

impl FromStr for AbiType {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        // Arrays bind last, so strip the outermost suffix first
        if let Some(inner) = s.strip_suffix("[]") {
            return Ok(AbiType::Array(Box::new(inner.parse()?)));
        }

        if s.ends_with(']') {
            if let Some(idx) = s.rfind('[') {
                let size_str = &s[idx + 1..s.len() - 1];
                let size = Self::parse_decimal(size_str)
                    .ok_or_else(|| AbiError::InvalidType(format!("Invalid array size: {}", size_str)))?;
                let parsed = AbiType::FixedArray(Box::new(s[..idx].parse()?), size);
                parsed.validate()?;
                return Ok(parsed);
            }
        }

        if s.starts_with('(') && s.ends_with(')') {
            let inner = &s[1..s.len() - 1];
            if inner.trim().is_empty() {
                return Ok(AbiType::Tuple(vec![]));
            }
            return Ok(AbiType::Tuple(Self::parse_tuple_components(inner)?));
        }

        let parsed = match s {
            "uint" => AbiType::Uint(256),
            "int" => AbiType::Int(256),
            "address" => AbiType::Address,
            "bool" => AbiType::Bool,
            "bytes" => AbiType::Bytes,
            "string" => AbiType::String,
            s if s.starts_with("bytes") => AbiType::FixedBytes(Self::parse_width(&s[5..], "bytes")?),
            s if s.starts_with("uint") => AbiType::Uint(Self::parse_width(&s[4..], "uint")?),
            s if s.starts_with("int") => AbiType::Int(Self::parse_width(&s[3..], "int")?),
            _ => return Err(AbiError::InvalidType(format!("Unknown type: {}", s))),
        };
        parsed.validate()?;
        Ok(parsed)
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_type())
    }
}

impl Serialize for AbiType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical_type())
    }
}

impl<'de> Deserialize<'de> for AbiType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// ABI value - runtime representation of Solidity values
///
/// Every variant carries enough shape to name exactly one [`AbiType`]:
/// integers keep their declared width and arrays keep their element type,
/// so even an empty array knows what it is an array of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Uint { bits: usize, value: BigUint },
    Int { bits: usize, value: BigInt },
    Address([u8; 20]),
    Bool(bool),
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    String(String),
    Array { element: AbiType, items: Vec<AbiValue> },
    FixedArray { element: AbiType, items: Vec<AbiValue> },
    Tuple(Vec<AbiValue>),
}

impl AbiValue {
    /// Create a uint256 value from a u64
    pub fn uint256(value: u64) -> Self {
        AbiValue::Uint { bits: 256, value: BigUint::from(value) }
    }

    pub fn uint(bits: usize, value: impl Into<BigUint>) -> Self {
        AbiValue::Uint { bits, value: value.into() }
    }

    pub fn int256(value: i64) -> Self {
        AbiValue::Int { bits: 256, value: BigInt::from(value) }
    }

    pub fn int(bits: usize, value: impl Into<BigInt>) -> Self {
        AbiValue::Int { bits, value: value.into() }
    }

    /// Create a uint256 from decimal or 0x-prefixed hex text
    pub fn uint256_from_str(s: &str) -> Result<Self, AbiError> {
        let value = if s.starts_with("0x") || s.starts_with("0X") {
            let bytes = HexCodec::parse(s).map_err(|e| AbiError::InvalidValue(e.to_string()))?;
            BigUint::from_bytes_be(&bytes)
        } else {
            s.parse::<BigUint>()
                .map_err(|_| AbiError::InvalidValue(format!("Invalid decimal integer: {}", s)))?
        };
        Ok(AbiValue::Uint { bits: 256, value })
    }

    /// Create an Address value from a hex string
    pub fn address_from_str(s: &str) -> Result<Self, AbiError> {
        let bytes = HexCodec::parse(s).map_err(|e| AbiError::InvalidValue(e.to_string()))?;
        let addr: [u8; 20] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| AbiError::InvalidValue("Address must be 20 bytes".to_string()))?;
        Ok(AbiValue::Address(addr))
    }

    /// Create bytes value from hex string
    pub fn bytes_from_hex(s: &str) -> Result<Self, AbiError> {
        let bytes = HexCodec::parse(s).map_err(|e| AbiError::InvalidValue(e.to_string()))?;
        Ok(AbiValue::Bytes(bytes))
    }

    pub fn string(s: impl Into<String>) -> Self {
        AbiValue::String(s.into())
    }

    pub fn array(element: AbiType, items: Vec<AbiValue>) -> Self {
        AbiValue::Array { element, items }
    }

    pub fn fixed_array(element: AbiType, items: Vec<AbiValue>) -> Self {
        AbiValue::FixedArray { element, items }
    }

    /// The one schema this value decodes against
    pub fn abi_type(&self) -> AbiType {
        match self {
            AbiValue::Uint { bits, .. } => AbiType::Uint(*bits),
            AbiValue::Int { bits, .. } => AbiType::Int(*bits),
            AbiValue::Address(_) => AbiType::Address,
            AbiValue::Bool(_) => AbiType::Bool,
            AbiValue::FixedBytes(b) => AbiType::FixedBytes(b.len()),
            AbiValue::Bytes(_) => AbiType::Bytes,
            AbiValue::String(_) => AbiType::String,
            AbiValue::Array { element, .. } => AbiType::Array(Box::new(element.clone())),
            AbiValue::FixedArray { element, items } => {
                AbiType::FixedArray(Box::new(element.clone()), items.len())
            }
            AbiValue::Tuple(values) => AbiType::Tuple(values.iter().map(|v| v.abi_type()).collect()),
        }
    }

    pub fn as_uint(&self) -> Option<&BigUint> {
        match self {
            AbiValue::Uint { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<&BigInt> {
        match self {
            AbiValue::Int { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<&[u8; 20]> {
        match self {
            AbiValue::Address(addr) => Some(addr),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AbiValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Payload of `bytes` and `bytesN` values
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            AbiValue::Bytes(b) | AbiValue::FixedBytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AbiValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Elements of arrays and tuples
    pub fn as_slice(&self) -> Option<&[AbiValue]> {
        match self {
            AbiValue::Array { items, .. } | AbiValue::FixedArray { items, .. } => Some(items),
            AbiValue::Tuple(values) => Some(values),
            _ => None,
        }
    }
}

impl fmt::Display for AbiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, items: &[AbiValue]) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", item)?;
            }
            Ok(())
        }

        match self {
            AbiValue::Uint { value, .. } => write!(f, "{}", value),
            AbiValue::Int { value, .. } => write!(f, "{}", value),
            AbiValue::Address(addr) => f.write_str(&HexCodec::serialize(addr)),
            AbiValue::Bool(b) => write!(f, "{}", b),
            AbiValue::FixedBytes(b) | AbiValue::Bytes(b) => f.write_str(&HexCodec::serialize(b)),
            AbiValue::String(s) => write!(f, "{:?}", s),
            AbiValue::Array { items, .. } | AbiValue::FixedArray { items, .. } => {
                f.write_str("[")?;
                join(f, items)?;
                f.write_str("]")
            }
            AbiValue::Tuple(values) => {
                f.write_str("(")?;
                join(f, values)?;
                f.write_str(")")
            }
        }
    }
}

/// ABI parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiParam {
    /// Parameter name (can be empty)
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: AbiType,
}

impl AbiParam {
    pub fn new(name: impl Into<String>, param_type: AbiType) -> Self {
        Self { name: name.into(), param_type }
    }

    pub fn unnamed(param_type: AbiType) -> Self {
        Self { name: String::new(), param_type }
    }
}

/// Split `name(type1,type2,...)` into a name and its parameter types
pub fn parse_signature(signature: &str) -> Result<(String, Vec<AbiType>), AbiError> {
    let signature = signature.trim();
    let open = signature
        .find('(')
        .ok_or_else(|| AbiError::InvalidSignature(signature.to_string()))?;
    if !signature.ends_with(')') {
        return Err(AbiError::InvalidSignature(signature.to_string()));
    }

    let name = signature[..open].trim();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$') {
        return Err(AbiError::InvalidSignature(signature.to_string()));
    }

    // The parameter list parses exactly like a tuple type
    let types = match signature[open..].parse::<AbiType>()? {
        AbiType::Tuple(types) => types,
        _ => return Err(AbiError::InvalidSignature(signature.to_string())),
    };
    Ok((name.to_string(), types))
}

fn canonical_signature<'a>(name: &str, types: impl Iterator<Item = &'a AbiType>) -> String {
    let params = types.map(|t| t.canonical_type()).collect::<Vec<_>>().join(",");
    format!("{}({})", name, params)
}

/// Function descriptor
///
/// Immutable once built; the selector is derived from the canonical
/// signature at construction and cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FunctionRecord")]
pub struct AbiFunction {
    name: String,
    inputs: Vec<AbiParam>,
    outputs: Vec<AbiParam>,
    #[serde(skip_serializing)]
    selector: [u8; 4],
}

#[derive(Deserialize)]
struct FunctionRecord {
    name: String,
    #[serde(default)]
    inputs: Vec<AbiParam>,
    #[serde(default)]
    outputs: Vec<AbiParam>,
}

impl From<FunctionRecord> for AbiFunction {
    fn from(record: FunctionRecord) -> Self {
        AbiFunction::new(record.name, record.inputs, record.outputs)
    }
}

impl AbiFunction {
    pub fn new(name: impl Into<String>, inputs: Vec<AbiParam>, outputs: Vec<AbiParam>) -> Self {
        let name = name.into();
        let signature = canonical_signature(&name, inputs.iter().map(|p| &p.param_type));
        let selector = AbiSelector::selector_from_signature(&signature);
        Self { name, inputs, outputs, selector }
    }

    /// Build from bare types with unnamed parameters
    pub fn from_types(name: impl Into<String>, inputs: Vec<AbiType>, outputs: Vec<AbiType>) -> Self {
        Self::new(
            name,
            inputs.into_iter().map(AbiParam::unnamed).collect(),
            outputs.into_iter().map(AbiParam::unnamed).collect(),
        )
    }

    /// Build from `name(type1,...)` and a list of output types
    pub fn from_signature(signature: &str, outputs: Vec<AbiType>) -> Result<Self, AbiError> {
        let (name, inputs) = parse_signature(signature)?;
        Ok(Self::from_types(name, inputs, outputs))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &[AbiParam] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[AbiParam] {
        &self.outputs
    }

    pub fn selector(&self) -> [u8; 4] {
        self.selector
    }

    /// Canonical signature used for the selector
    pub fn signature(&self) -> String {
        canonical_signature(&self.name, self.inputs.iter().map(|p| &p.param_type))
    }

    pub fn input_types(&self) -> Vec<AbiType> {
        self.inputs.iter().map(|p| p.param_type.clone()).collect()
    }

    pub fn output_types(&self) -> Vec<AbiType> {
        self.outputs.iter().map(|p| p.param_type.clone()).collect()
    }
}

/// Custom error descriptor (`error Name(...)`), matched against revert payloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ErrorRecord")]
pub struct AbiCustomError {
    name: String,
    inputs: Vec<AbiParam>,
    #[serde(skip_serializing)]
    selector: [u8; 4],
}

#[derive(Deserialize)]
struct ErrorRecord {
    name: String,
    #[serde(default)]
    inputs: Vec<AbiParam>,
}

impl From<ErrorRecord> for AbiCustomError {
    fn from(record: ErrorRecord) -> Self {
        AbiCustomError::new(record.name, record.inputs)
    }
}

impl AbiCustomError {
    pub fn new(name: impl Into<String>, inputs: Vec<AbiParam>) -> Self {
        let name = name.into();
        let signature = canonical_signature(&name, inputs.iter().map(|p| &p.param_type));
        let selector = AbiSelector::selector_from_signature(&signature);
        Self { name, inputs, selector }
    }

    pub fn from_types(name: impl Into<String>, inputs: Vec<AbiType>) -> Self {
        Self::new(name, inputs.into_iter().map(AbiParam::unnamed).collect())
    }

    pub fn from_signature(signature: &str) -> Result<Self, AbiError> {
        let (name, inputs) = parse_signature(signature)?;
        Ok(Self::from_types(name, inputs))
    }

    /// `Error(string)`, emitted by `require` and `revert("...")`
    pub fn error_string() -> Self {
        Self::new("Error", vec![AbiParam::new("message", AbiType::String)])
    }

    /// `Panic(uint256)`, emitted on assertion failures and arithmetic faults
    pub fn panic() -> Self {
        Self::new("Panic", vec![AbiParam::new("code", AbiType::uint256())])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &[AbiParam] {
        &self.inputs
    }

    pub fn selector(&self) -> [u8; 4] {
        self.selector
    }

    pub fn signature(&self) -> String {
        canonical_signature(&self.name, self.inputs.iter().map(|p| &p.param_type))
    }

    pub fn input_types(&self) -> Vec<AbiType> {
        self.inputs.iter().map(|p| p.param_type.clone()).collect()
    }
}

/// ABI event definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiEvent {
    pub name: String,
    pub inputs: Vec<AbiEventParam>,
    /// Anonymous events carry no signature topic
    #[serde(default)]
    pub anonymous: bool,
}

impl AbiEvent {
    /// Event signature for topic calculation
    pub fn signature(&self) -> String {
        canonical_signature(&self.name, self.inputs.iter().map(|p| &p.param.param_type))
    }

    pub fn topic(&self) -> [u8; 32] {
        AbiSelector::topic_from_signature(&self.signature())
    }
}

/// ABI event parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiEventParam {
    #[serde(flatten)]
    pub param: AbiParam,
    #[serde(default)]
    pub indexed: bool,
}

impl AbiEventParam {
    pub fn new(name: impl Into<String>, param_type: AbiType, indexed: bool) -> Self {
        Self { param: AbiParam::new(name, param_type), indexed }
    }
}

/// ABI errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error("Invalid type: {0}")]
    InvalidType(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Value does not fit in {abi_type}: {detail}")]
    Overflow { abi_type: AbiType, detail: String },

    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: AbiType, got: AbiType },

    #[error("Length mismatch: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("Decoding error: {0}")]
    DecodingError(String),

    #[error("Read of {len} bytes at offset {offset} exceeds buffer of {available} bytes")]
    OutOfBounds { offset: usize, len: usize, available: usize },

    #[error("Selector mismatch: expected {expected}, got {got}")]
    InvalidSelector { expected: String, got: String },

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abi_type_from_str() {
        assert_eq!("uint256".parse::<AbiType>().unwrap(), AbiType::Uint(256));
        assert_eq!("uint".parse::<AbiType>().unwrap(), AbiType::Uint(256));
        assert_eq!("int".parse::<AbiType>().unwrap(), AbiType::Int(256));
        assert_eq!("uint24".parse::<AbiType>().unwrap(), AbiType::Uint(24));
        assert_eq!("address".parse::<AbiType>().unwrap(), AbiType::Address);
        assert_eq!("bool".parse::<AbiType>().unwrap(), AbiType::Bool);
        assert_eq!("bytes32".parse::<AbiType>().unwrap(), AbiType::FixedBytes(32));
        assert_eq!("bytes".parse::<AbiType>().unwrap(), AbiType::Bytes);
        assert_eq!("string".parse::<AbiType>().unwrap(), AbiType::String);
    }

    #[test]
    fn test_abi_type_rejects_bad_widths() {
        assert!("uint7".parse::<AbiType>().is_err());
        assert!("uint264".parse::<AbiType>().is_err());
        assert!("int0".parse::<AbiType>().is_err());
        assert!("bytes33".parse::<AbiType>().is_err());
        assert!("bytes0".parse::<AbiType>().is_err());
        assert!("uint256[0]".parse::<AbiType>().is_err());
        assert!("float".parse::<AbiType>().is_err());
    }

    #[test]
    fn test_width_must_be_plain_decimal() {
        assert!("uint+8".parse::<AbiType>().is_err());
        assert!("uint008".parse::<AbiType>().is_err());
        assert!("bytes 4".parse::<AbiType>().is_err());
        assert!("uint256[+2]".parse::<AbiType>().is_err());
        assert!("uint256[02]".parse::<AbiType>().is_err());
        assert!(parse_signature("f(uint+8)").is_err());
        assert_eq!("uint256[10]".parse::<AbiType>().unwrap(), AbiType::fixed_array(AbiType::uint256(), 10));
    }

    #[test]
    fn test_empty_tuple_rejected() {
        assert!(AbiType::Tuple(vec![]).validate().is_err());
        assert!("()[]".parse::<AbiType>().unwrap().validate().is_err());
        // An empty parameter list is still a valid signature
        assert_eq!(parse_signature("get()").unwrap(), ("get".to_string(), vec![]));
    }

    #[test]
    fn test_abi_type_arrays() {
        assert_eq!(
            "uint256[]".parse::<AbiType>().unwrap(),
            AbiType::array(AbiType::uint256())
        );
        assert_eq!(
            "address[5]".parse::<AbiType>().unwrap(),
            AbiType::fixed_array(AbiType::Address, 5)
        );
        assert_eq!(
            "uint8[2][]".parse::<AbiType>().unwrap(),
            AbiType::array(AbiType::fixed_array(AbiType::Uint(8), 2))
        );
    }

    #[test]
    fn test_abi_type_tuple() {
        assert_eq!(
            "(uint256,address,bool)".parse::<AbiType>().unwrap(),
            AbiType::Tuple(vec![AbiType::uint256(), AbiType::Address, AbiType::Bool])
        );
        assert_eq!(
            "(uint256,(bytes,string)[])".parse::<AbiType>().unwrap(),
            AbiType::Tuple(vec![
                AbiType::uint256(),
                AbiType::array(AbiType::Tuple(vec![AbiType::Bytes, AbiType::String])),
            ])
        );
        assert!("(uint256,".parse::<AbiType>().is_err());
        assert!("(uint256,,bool)".parse::<AbiType>().is_err());
    }

    #[test]
    fn test_abi_type_is_dynamic() {
        assert!(!AbiType::uint256().is_dynamic());
        assert!(!AbiType::Address.is_dynamic());
        assert!(!AbiType::bytes32().is_dynamic());

        assert!(AbiType::Bytes.is_dynamic());
        assert!(AbiType::String.is_dynamic());
        assert!(AbiType::array(AbiType::uint256()).is_dynamic());

        assert!(!AbiType::fixed_array(AbiType::uint256(), 5).is_dynamic());
        assert!(AbiType::fixed_array(AbiType::String, 5).is_dynamic());
    }

    #[test]
    fn test_head_size() {
        assert_eq!(AbiType::fixed_array(AbiType::uint256(), 3).head_size(), 96);
        assert_eq!(AbiType::Tuple(vec![AbiType::Bool, AbiType::Address]).head_size(), 64);
        assert_eq!(AbiType::Tuple(vec![AbiType::Bool, AbiType::Bytes]).head_size(), 32);
        assert_eq!(AbiType::fixed_array(AbiType::uint256(), usize::MAX).head_size(), usize::MAX);
    }

    #[test]
    fn test_canonical_type() {
        assert_eq!(AbiType::uint256().canonical_type(), "uint256");
        assert_eq!(AbiType::array(AbiType::Address).canonical_type(), "address[]");
        assert_eq!(
            AbiType::Tuple(vec![AbiType::uint256(), AbiType::Bool]).canonical_type(),
            "(uint256,bool)"
        );
    }

    #[test]
    fn test_abi_value_address() {
        let addr = AbiValue::address_from_str("0x1234567890123456789012345678901234567890").unwrap();
        let bytes = addr.as_address().unwrap();
        assert_eq!(bytes[0], 0x12);
        assert_eq!(bytes[19], 0x90);

        assert!(AbiValue::address_from_str("0x1234").is_err());
    }

    #[test]
    fn test_value_knows_its_type() {
        let empty = AbiValue::array(AbiType::Address, vec![]);
        assert_eq!(empty.abi_type(), AbiType::array(AbiType::Address));

        let small = AbiValue::uint(8, 3u8);
        assert_eq!(small.abi_type(), AbiType::Uint(8));
        assert_ne!(small.abi_type(), AbiValue::uint256(3).abi_type());
    }

    #[test]
    fn test_uint_from_str() {
        assert_eq!(AbiValue::uint256_from_str("12345").unwrap(), AbiValue::uint256(12345));
        assert_eq!(AbiValue::uint256_from_str("0xff").unwrap(), AbiValue::uint256(255));
        assert!(AbiValue::uint256_from_str("12a").is_err());
    }

    #[test]
    fn test_parse_signature() {
        let (name, types) = parse_signature("transfer(address,uint256)").unwrap();
        assert_eq!(name, "transfer");
        assert_eq!(types, vec![AbiType::Address, AbiType::uint256()]);

        let (name, types) = parse_signature("totalSupply()").unwrap();
        assert_eq!(name, "totalSupply");
        assert!(types.is_empty());

        assert!(parse_signature("noParens").is_err());
        assert!(parse_signature("(uint256)").is_err());
    }

    #[test]
    fn test_function_selector_cached() {
        let f = AbiFunction::from_signature("sum(uint256,uint256)", vec![AbiType::uint256()]).unwrap();
        assert_eq!(f.signature(), "sum(uint256,uint256)");
        assert_eq!(f.selector(), AbiSelector::selector_from_signature("sum(uint256,uint256)"));
    }

    #[test]
    fn test_argument_names_do_not_affect_selector() {
        let named = AbiFunction::new(
            "balanceOf",
            vec![AbiParam::new("owner", AbiType::Address)],
            vec![AbiParam::new("balance", AbiType::uint256())],
        );
        let bare = AbiFunction::from_types("balanceOf", vec![AbiType::Address], vec![]);
        assert_eq!(named.selector(), bare.selector());
        assert_eq!(named.selector(), [0x70, 0xa0, 0x82, 0x31]);
    }

    #[test]
    fn test_function_serde_recomputes_selector() {
        let json = r#"{"name":"transfer","inputs":[{"name":"to","type":"address"},{"type":"uint256"}]}"#;
        let f: AbiFunction = serde_json::from_str(json).unwrap();
        assert_eq!(f.selector(), [0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(f.inputs()[1].param_type, AbiType::uint256());
    }

    #[test]
    fn test_builtin_errors() {
        assert_eq!(AbiCustomError::error_string().selector(), [0x08, 0xc3, 0x79, 0xa0]);
        assert_eq!(AbiCustomError::panic().selector(), [0x4e, 0x48, 0x7b, 0x71]);
    }

    #[test]
    fn test_value_display() {
        let value = AbiValue::Tuple(vec![
            AbiValue::uint256(7),
            AbiValue::int256(-3),
            AbiValue::string("hi"),
            AbiValue::array(AbiType::Bool, vec![AbiValue::Bool(true)]),
        ]);
        assert_eq!(value.to_string(), "(7, -3, \"hi\", [true])");
    }
}
