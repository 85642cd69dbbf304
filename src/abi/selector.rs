//! Function selector and event topic calculation

use super::types::*;
use crate::hex_codec::HexCodec;
use crate::utils::crypto::{self, Hasher256, Keccak256};

/// ABI selector calculator
pub struct AbiSelector;

impl AbiSelector {
    /// First 4 bytes of keccak256(signature)
    pub fn selector_from_signature(signature: &str) -> [u8; 4] {
        Self::selector_with(&Keccak256, signature)
    }

    /// Selector derivation with a caller-chosen hash
    pub fn selector_with<H: Hasher256 + ?Sized>(hasher: &H, signature: &str) -> [u8; 4] {
        let hash = hasher.digest(signature.as_bytes());
        [hash[0], hash[1], hash[2], hash[3]]
    }

    /// Event topic (full keccak256(signature))
    pub fn topic_from_signature(signature: &str) -> [u8; 32] {
        Self::keccak256(signature.as_bytes())
    }

    pub fn keccak256(data: &[u8]) -> [u8; 32] {
        crypto::keccak256(data)
    }

    /// Selector as hex string (with 0x prefix)
    pub fn selector_hex(function: &AbiFunction) -> String {
        HexCodec::serialize(&function.selector())
    }

    pub fn topic_hex(event: &AbiEvent) -> String {
        HexCodec::serialize(&event.topic())
    }
}

/// Selectors of the revert payloads the compiler emits on its own
pub struct KnownSelectors;

impl KnownSelectors {
    pub const ERROR_STRING: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0]; // Error(string)
    pub const PANIC: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71]; // Panic(uint256)

    /// Identify a built-in error by its selector
    pub fn identify(selector: &[u8; 4]) -> Option<&'static str> {
        match *selector {
            Self::ERROR_STRING => Some("Error(string)"),
            Self::PANIC => Some("Panic(uint256)"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_selector() {
        let selector = AbiSelector::selector_from_signature("transfer(address,uint256)");
        assert_eq!(selector, [0xa9, 0x05, 0x9c, 0xbb]);
    }

    #[test]
    fn test_approve_selector() {
        let selector = AbiSelector::selector_from_signature("approve(address,uint256)");
        assert_eq!(selector, [0x09, 0x5e, 0xa7, 0xb3]);
    }

    #[test]
    fn test_transfer_event_topic() {
        let topic = AbiSelector::topic_from_signature("Transfer(address,address,uint256)");
        assert_eq!(
            HexCodec::serialize(&topic),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn test_known_selectors_match_derivation() {
        assert_eq!(
            AbiSelector::selector_from_signature("Error(string)"),
            KnownSelectors::ERROR_STRING
        );
        assert_eq!(
            AbiSelector::selector_from_signature("Panic(uint256)"),
            KnownSelectors::PANIC
        );
        assert_eq!(KnownSelectors::identify(&KnownSelectors::PANIC), Some("Panic(uint256)"));
        assert_eq!(KnownSelectors::identify(&[0, 0, 0, 0]), None);
    }

    #[test]
    fn test_selector_hex() {
        let function = AbiFunction::new(
            "transfer",
            vec![
                AbiParam::new("to", AbiType::Address),
                AbiParam::new("amount", AbiType::uint256()),
            ],
            vec![AbiParam::unnamed(AbiType::Bool)],
        );
        assert_eq!(AbiSelector::selector_hex(&function), "0xa9059cbb");
    }

    #[test]
    fn test_pluggable_hasher() {
        struct Fixed;
        impl Hasher256 for Fixed {
            fn digest(&self, _data: &[u8]) -> [u8; 32] {
                [0xab; 32]
            }
        }
        assert_eq!(AbiSelector::selector_with(&Fixed, "anything()"), [0xab; 4]);
    }

    #[test]
    fn test_selector_determinism() {
        let a = AbiSelector::selector_from_signature("foo((uint256,address),bytes32)");
        let b = AbiSelector::selector_from_signature("foo((uint256,address),bytes32)");
        assert_eq!(a, b);
    }
}
