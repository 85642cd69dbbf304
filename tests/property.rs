use evm_query_core::{AbiDecoder, AbiEncoder, AbiType, AbiValue, HexCodec, HexError, Word, WordError};
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::One;
use proptest::prelude::*;

fn any_int256() -> impl Strategy<Value = BigInt> {
    (any::<bool>(), prop::array::uniform32(any::<u8>())).prop_map(|(negative, mut bytes)| {
        // Clear the top bit so the magnitude stays below 2^255
        bytes[0] &= 0x7f;
        let magnitude = BigUint::from_bytes_be(&bytes);
        if negative {
            -BigInt::from_biguint(Sign::Plus, magnitude) - 1
        } else {
            BigInt::from_biguint(Sign::Plus, magnitude)
        }
    })
}

fn pow2(bits: u32) -> BigInt {
    BigInt::one() << bits
}

proptest! {
    #[test]
    fn word_bytes_roundtrip(bytes in prop::array::uniform32(any::<u8>())) {
        let word = Word::from_slice(&bytes).unwrap();
        prop_assert_eq!(word.as_bytes(), &bytes);
    }

    #[test]
    fn word_unsigned_roundtrip(bytes in prop::array::uniform32(any::<u8>())) {
        let value = BigUint::from_bytes_be(&bytes);
        let word = Word::from_unsigned(&value).unwrap();
        prop_assert_eq!(word.to_unsigned(), value);
    }

    #[test]
    fn word_signed_roundtrip(value in any_int256()) {
        let word = Word::from_signed(&value).unwrap();
        prop_assert_eq!(word.is_negative(), value.sign() == Sign::Minus);
        prop_assert_eq!(word.to_signed(), value);
    }

    #[test]
    fn word_signed_overflow_rejected(extra in any::<u64>()) {
        let too_big = pow2(255) + BigInt::from(extra);
        prop_assert_eq!(Word::from_signed(&too_big), Err(WordError::SignedOverflow));

        let too_small = -pow2(255) - BigInt::from(extra) - 1;
        prop_assert_eq!(Word::from_signed(&too_small), Err(WordError::SignedOverflow));
    }

    #[test]
    fn hex_roundtrip(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let text = HexCodec::serialize(&bytes);
        prop_assert!(text.starts_with("0x"));
        prop_assert_eq!(HexCodec::parse(&text).unwrap(), bytes.clone());
        prop_assert_eq!(HexCodec::parse(&text.to_uppercase().replacen("0X", "0x", 1)).unwrap(), bytes);
    }

    #[test]
    fn hex_odd_length_rejected(bytes in prop::collection::vec(any::<u8>(), 0..32)) {
        let text = format!("{}a", HexCodec::serialize(&bytes));
        prop_assert!(matches!(HexCodec::parse(&text), Err(HexError::OddLength(_))));
    }

    #[test]
    fn abi_uint_bytes_tuple_roundtrip(
        number in prop::array::uniform32(any::<u8>()),
        payload in prop::collection::vec(any::<u8>(), 0..100),
    ) {
        let types = vec![AbiType::Tuple(vec![AbiType::uint256(), AbiType::Bytes])];
        let values = vec![AbiValue::Tuple(vec![
            AbiValue::uint(256, BigUint::from_bytes_be(&number)),
            AbiValue::Bytes(payload),
        ])];

        let encoded = AbiEncoder::encode(&values, &types).unwrap();
        prop_assert_eq!(encoded.len() % 32, 0);
        prop_assert_eq!(AbiDecoder::decode(&encoded, &types).unwrap(), values);
    }

    #[test]
    fn abi_truncation_detected(
        items in prop::collection::vec(any::<u64>(), 1..8),
        cut in 1usize..32,
    ) {
        let types = vec![AbiType::array(AbiType::uint256())];
        let values = vec![AbiValue::array(
            AbiType::uint256(),
            items.into_iter().map(AbiValue::uint256).collect(),
        )];

        let encoded = AbiEncoder::encode(&values, &types).unwrap();
        let truncated = &encoded[..encoded.len() - cut];
        prop_assert!(AbiDecoder::decode(truncated, &types).is_err());
    }
}
