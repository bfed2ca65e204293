// src/blockchain/address.rs

//! Conversion between TRON base58check addresses and the 20-byte form used in ABI data.

use ethers_core::types::Address;

use crate::error::ProviderError;

/// Version byte prefixed to every TRON mainnet/testnet address.
pub const TRON_ADDRESS_PREFIX: u8 = 0x41;

/// Base58 form of the all-zero address.
pub const ZERO_ADDRESS: &str = "T9yD14Nj9j7xAB4dbGeiX9h8unkKHxuWwb";

/// Decodes a base58check (`T...`) or 21-byte hex (`41...`) address into its ABI form.
pub fn to_evm_address(address: &str) -> Result<Address, ProviderError> {
    let address = address.trim();
    let bytes = if address.starts_with('T') {
        bs58::decode(address)
            .with_check(Some(TRON_ADDRESS_PREFIX))
            .into_vec()
            .map_err(|e| ProviderError::InvalidAddress(format!("{}: {}", address, e)))?
    } else {
        let raw = address.strip_prefix("0x").unwrap_or(address);
        hex::decode(raw).map_err(|e| ProviderError::InvalidAddress(format!("{}: {}", address, e)))?
    };

    match bytes.len() {
        21 if bytes[0] == TRON_ADDRESS_PREFIX => Ok(Address::from_slice(&bytes[1..])),
        20 => Ok(Address::from_slice(&bytes)),
        n => Err(ProviderError::InvalidAddress(format!(
            "{}: expected 21 bytes, got {}",
            address, n
        ))),
    }
}

/// Encodes an ABI address as a TRON base58check address.
pub fn to_tron_address(address: &Address) -> String {
    let mut bytes = Vec::with_capacity(21);
    bytes.push(TRON_ADDRESS_PREFIX);
    bytes.extend_from_slice(address.as_bytes());
    bs58::encode(bytes).with_check().into_string()
}

/// Cheap shape check used before hitting the node.
pub fn is_valid_address(address: &str) -> bool {
    address.starts_with('T') && address.len() == 34 && to_evm_address(address).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const USDT: &str = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";
    const USDT_HEX: &str = "a614f803b6fd780986a42c78ec9c7f77e6ded13c";

    #[test]
    fn decodes_base58_address() {
        let evm = to_evm_address(USDT).unwrap();
        assert_eq!(hex::encode(evm.as_bytes()), USDT_HEX);
    }

    #[test]
    fn encodes_back_to_base58() {
        let evm = to_evm_address(USDT).unwrap();
        assert_eq!(to_tron_address(&evm), USDT);
        assert_eq!(to_tron_address(&Address::zero()), ZERO_ADDRESS);
    }

    #[test]
    fn accepts_hex_form() {
        let evm = to_evm_address(&format!("41{}", USDT_HEX)).unwrap();
        assert_eq!(to_tron_address(&evm), USDT);
    }

    #[test]
    fn rejects_bad_checksum() {
        let mut tampered = USDT.to_string();
        tampered.replace_range(33..34, "u");
        assert!(to_evm_address(&tampered).is_err());
        assert!(!is_valid_address("Tshort"));
        assert!(is_valid_address(USDT));
    }
}
