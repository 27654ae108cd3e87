//! Bech32 and hex address conversions.
//!
//! Account, operator and consensus addresses of one validator share the same
//! payload bytes and differ only in their human-readable part.

use bech32::{Bech32, Hrp};
use cosmex_types::Bech32Prefixes;

use crate::errors::{AddressError, Result};

/// Number of raw bytes in an account, operator or consensus address.
pub const ADDRESS_BYTES: usize = 20;
/// Length of the hex encoding of a consensus (proposer) address.
pub const HEX_ADDRESS_LENGTH: usize = ADDRESS_BYTES * 2;

/// Decode a bech32 string into its lowercase prefix and payload bytes.
pub fn decode_bech32(address: &str) -> Result<(String, Vec<u8>)> {
    let (hrp, data) = bech32::decode(address).map_err(|err| AddressError::InvalidBech32 {
        address: address.to_string(),
        reason: err.to_string(),
    })?;
    Ok((hrp.to_lowercase(), data))
}

/// Encode `data` under `prefix` with the classic bech32 checksum.
pub fn encode_bech32(prefix: &str, data: &[u8]) -> Result<String> {
    let hrp = Hrp::parse(prefix).map_err(|err| AddressError::Encode {
        prefix: prefix.to_string(),
        reason: err.to_string(),
    })?;
    bech32::encode::<Bech32>(hrp, data).map_err(|err| AddressError::Encode {
        prefix: prefix.to_string(),
        reason: err.to_string(),
    })
}

fn convert(address: &str, from: &str, to: &str) -> Result<String> {
    let (found, data) = decode_bech32(address)?;
    if found != from {
        return Err(AddressError::UnexpectedPrefix {
            address: address.to_string(),
            expected: from.to_string(),
            found,
        });
    }
    encode_bech32(to, &data)
}

/// `cosmos1...` -> `cosmosvaloper1...`
pub fn account_to_operator(account: &str, prefixes: &Bech32Prefixes) -> Result<String> {
    convert(account, &prefixes.account, &prefixes.validator_operator)
}

/// `cosmosvaloper1...` -> `cosmos1...`
pub fn operator_to_account(operator: &str, prefixes: &Bech32Prefixes) -> Result<String> {
    convert(operator, &prefixes.validator_operator, &prefixes.account)
}

/// Decode a `valcons` address into the uppercase hex form used in block headers.
pub fn consensus_address_to_hex(address: &str, prefixes: &Bech32Prefixes) -> Result<String> {
    let (found, data) = decode_bech32(address)?;
    if found != prefixes.consensus {
        return Err(AddressError::UnexpectedPrefix {
            address: address.to_string(),
            expected: prefixes.consensus.clone(),
            found,
        });
    }
    Ok(hex::encode_upper(data))
}

/// Encode a hex proposer address as a `valcons` bech32 address.
pub fn hex_to_consensus_address(hex_address: &str, prefixes: &Bech32Prefixes) -> Result<String> {
    if !is_hex_address(hex_address) {
        return Err(AddressError::InvalidHex {
            address: hex_address.to_string(),
        });
    }
    let data = hex::decode(hex_address).map_err(|_| AddressError::InvalidHex {
        address: hex_address.to_string(),
    })?;
    encode_bech32(&prefixes.consensus, &data)
}

/// Exactly 40 hex digits, any case.
pub fn is_hex_address(value: &str) -> bool {
    value.len() == HEX_ADDRESS_LENGTH && value.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefixes() -> Bech32Prefixes {
        Bech32Prefixes::default()
    }

    #[test]
    fn account_and_operator_share_payload() {
        let payload = [0x5Au8; ADDRESS_BYTES];
        let account = encode_bech32("cosmos", &payload).unwrap();

        let operator = account_to_operator(&account, &prefixes()).unwrap();
        assert!(operator.starts_with("cosmosvaloper1"));
        assert_eq!(decode_bech32(&operator).unwrap().1, payload.to_vec());
        assert_eq!(operator_to_account(&operator, &prefixes()).unwrap(), account);
    }

    #[test]
    fn wrong_prefix_is_reported() {
        let account = encode_bech32("osmo", &[1u8; ADDRESS_BYTES]).unwrap();
        let err = account_to_operator(&account, &prefixes()).unwrap_err();
        assert!(matches!(
            err,
            AddressError::UnexpectedPrefix { ref found, .. } if found == "osmo"
        ));
    }

    #[test]
    fn consensus_address_decodes_to_uppercase_hex() {
        let payload = [0xABu8; ADDRESS_BYTES];
        let valcons = encode_bech32("cosmosvalcons", &payload).unwrap();
        let hex_address = consensus_address_to_hex(&valcons, &prefixes()).unwrap();
        assert_eq!(hex_address, "AB".repeat(ADDRESS_BYTES));
        assert_eq!(
            hex_to_consensus_address(&hex_address.to_lowercase(), &prefixes()).unwrap(),
            valcons
        );
    }

    #[test]
    fn corrupted_checksum_is_rejected() {
        let mut account = encode_bech32("cosmos", &[7u8; ADDRESS_BYTES]).unwrap();
        let last = account.pop().unwrap();
        account.push(if last == 'q' { 'p' } else { 'q' });
        assert!(matches!(
            decode_bech32(&account),
            Err(AddressError::InvalidBech32 { .. })
        ));
    }

    #[test]
    fn hex_addresses_need_forty_hex_digits() {
        assert!(is_hex_address(&"d3".repeat(20)));
        assert!(is_hex_address(&"D3".repeat(20)));
        assert!(!is_hex_address(&"d3".repeat(19)));
        assert!(!is_hex_address(&"zz".repeat(20)));
    }

    proptest::proptest! {
        #[test]
        fn account_operator_conversion_is_lossless(payload in proptest::array::uniform20(proptest::prelude::any::<u8>())) {
            let account = encode_bech32("cosmos", &payload).unwrap();
            let operator = account_to_operator(&account, &prefixes()).unwrap();
            proptest::prop_assert_eq!(operator_to_account(&operator, &prefixes()).unwrap(), account);

            let hex_address = hex::encode_upper(payload);
            let valcons = hex_to_consensus_address(&hex_address, &prefixes()).unwrap();
            proptest::prop_assert_eq!(consensus_address_to_hex(&valcons, &prefixes()).unwrap(), hex_address);
        }
    }
}
