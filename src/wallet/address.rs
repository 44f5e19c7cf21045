use super::keys::PublicKey;
use crate::crypto::{EncodingError, base58check_decode, base58check_encode, hash160};

/// Version byte for main-network addresses.
pub const MAINNET_VERSION: u8 = 0x00;
/// Version byte for test-network addresses.
pub const TESTNET_VERSION: u8 = 0x6f;

/// `base58check(version ‖ hash160(compressed pubkey))`.
pub fn derive_address(public_key: &PublicKey, version: u8) -> String {
    base58check_encode(version, &hash160(&public_key.to_bytes()))
}

/// Decode an address back to its version byte and 20-byte key hash.
pub fn decode_address(address: &str) -> Result<(u8, [u8; 20]), EncodingError> {
    let (version, payload) = base58check_decode(address.trim())?;
    let key_hash: [u8; 20] = payload
        .try_into()
        .map_err(|p: Vec<u8>| EncodingError::InvalidLength(p.len()))?;
    Ok((version, key_hash))
}

/// True when `public_key` hashes to the key hash committed in `address`.
pub fn address_matches(address: &str, public_key: &PublicKey) -> bool {
    match decode_address(address) {
        Ok((version, _)) => derive_address(public_key, version) == address.trim(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::keys::{PrivateKey, generate_keypair};

    #[test]
    fn known_key_gives_known_address() {
        // Secret scalar 1: the generator point itself.
        let mut secret = [0u8; 32];
        secret[31] = 1;
        let pk = PrivateKey::from_bytes(&secret).unwrap().public_key();
        assert_eq!(
            derive_address(&pk, MAINNET_VERSION),
            "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH"
        );
    }

    #[test]
    fn decode_inverts_derive() {
        let (_, pk) = generate_keypair();
        let addr = derive_address(&pk, TESTNET_VERSION);
        let (version, key_hash) = decode_address(&addr).unwrap();
        assert_eq!(version, TESTNET_VERSION);
        assert_eq!(key_hash, hash160(&pk.to_bytes()));
        assert!(address_matches(&addr, &pk));
    }

    #[test]
    fn every_corrupted_position_is_rejected() {
        let (_, pk) = generate_keypair();
        let addr = derive_address(&pk, MAINNET_VERSION);
        for i in 0..addr.len() {
            let mut chars: Vec<char> = addr.chars().collect();
            chars[i] = if chars[i] == 'z' { 'y' } else { 'z' };
            let tampered: String = chars.into_iter().collect();
            assert!(decode_address(&tampered).is_err(), "position {i} accepted");
        }
    }

    #[test]
    fn every_flipped_byte_is_rejected() {
        let (_, pk) = generate_keypair();
        let raw = crate::crypto::base58_decode(&derive_address(&pk, MAINNET_VERSION)).unwrap();
        for i in 0..raw.len() {
            let mut bytes = raw.clone();
            bytes[i] ^= 0x01;
            let tampered = crate::crypto::base58_encode(&bytes);
            assert_eq!(
                decode_address(&tampered),
                Err(EncodingError::ChecksumMismatch),
                "byte {i} accepted"
            );
        }
    }

    #[test]
    fn foreign_key_does_not_match() {
        let (_, a) = generate_keypair();
        let (_, b) = generate_keypair();
        let addr = derive_address(&a, MAINNET_VERSION);
        assert!(!address_matches(&addr, &b));
        assert!(!address_matches("not-an-address", &a));
    }
}
