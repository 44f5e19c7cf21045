use std::fmt;

use rand::rngs::OsRng;
use secp256k1::{Message, PublicKey as SecpPublicKey, Secp256k1, SecretKey, ecdsa::Signature};

use crate::crypto::{EncodingError, base58check_decode, base58check_encode};

/// WIF version byte for private keys.
pub const WIF_VERSION: u8 = 0x80;
/// Suffix marking a WIF key whose public key is used compressed.
const WIF_COMPRESSED_FLAG: u8 = 0x01;

/// A secp256k1 secret scalar.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey(SecretKey);

/// A secp256k1 point, always serialized compressed (33 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(SecpPublicKey);

/// Draw a fresh keypair from the OS entropy source.
pub fn generate_keypair() -> (PrivateKey, PublicKey) {
    let secp = Secp256k1::new();
    let (sk, pk) = secp.generate_keypair(&mut OsRng);
    (PrivateKey(sk), PublicKey(pk))
}

impl PrivateKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EncodingError> {
        SecretKey::from_slice(bytes)
            .map(Self)
            .map_err(|_| EncodingError::InvalidLength(bytes.len()))
    }

    pub fn from_hex(s: &str) -> Result<Self, EncodingError> {
        let bytes = hex::decode(s.trim()).map_err(|_| EncodingError::InvalidHex)?;
        Self::from_bytes(&bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0.secret_bytes())
    }

    /// Wallet Import Format: base-58 check of `0x80 ‖ secret ‖ 0x01`.
    pub fn to_wif(&self) -> String {
        let mut payload = self.0.secret_bytes().to_vec();
        payload.push(WIF_COMPRESSED_FLAG);
        base58check_encode(WIF_VERSION, &payload)
    }

    pub fn from_wif(wif: &str) -> Result<Self, EncodingError> {
        let (version, mut payload) = base58check_decode(wif)?;
        if version != WIF_VERSION {
            return Err(EncodingError::InvalidVersion(version));
        }
        if payload.len() == 33 && payload[32] == WIF_COMPRESSED_FLAG {
            payload.truncate(32);
        }
        Self::from_bytes(&payload)
    }

    pub fn public_key(&self) -> PublicKey {
        let secp = Secp256k1::signing_only();
        PublicKey(SecpPublicKey::from_secret_key(&secp, &self.0))
    }

    /// ECDSA-sign a 32-byte digest. Returns the DER encoding.
    pub fn sign(&self, msg32: [u8; 32]) -> Vec<u8> {
        let secp = Secp256k1::signing_only();
        let msg = Message::from_digest(msg32);
        secp.sign_ecdsa(&msg, &self.0).serialize_der().to_vec()
    }
}

// Never print the secret.
impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

impl PublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EncodingError> {
        SecpPublicKey::from_slice(bytes)
            .map(Self)
            .map_err(|_| EncodingError::InvalidLength(bytes.len()))
    }

    pub fn from_hex(s: &str) -> Result<Self, EncodingError> {
        let bytes = hex::decode(s.trim()).map_err(|_| EncodingError::InvalidHex)?;
        Self::from_bytes(&bytes)
    }

    pub fn to_bytes(&self) -> [u8; 33] {
        self.0.serialize()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Check a DER signature over `msg32`. Malformed input is just `false`.
    pub fn verify(&self, msg32: [u8; 32], signature_der: &[u8]) -> bool {
        let Ok(sig) = Signature::from_der(signature_der) else {
            return false;
        };
        let secp = Secp256k1::verification_only();
        let msg = Message::from_digest(msg32);
        secp.verify_ecdsa(&msg, &sig, &self.0).is_ok()
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

/// Free-function form of [`PrivateKey::sign`].
pub fn sign(private_key: &PrivateKey, msg32: [u8; 32]) -> Vec<u8> {
    private_key.sign(msg32)
}

/// Free-function form of [`PublicKey::verify`].
pub fn verify(public_key: &PublicKey, msg32: [u8; 32], signature_der: &[u8]) -> bool {
    public_key.verify(msg32, signature_der)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::sha256;

    #[test]
    fn public_key_is_derived_deterministically() {
        let (sk, pk) = generate_keypair();
        assert_eq!(sk.public_key(), pk);
        assert_eq!(pk.to_bytes().len(), 33);
        assert!(matches!(pk.to_bytes()[0], 0x02 | 0x03));
    }

    #[test]
    fn sign_then_verify() {
        let (sk, pk) = generate_keypair();
        let msg = sha256(b"pay bob");
        let sig = sign(&sk, msg);
        assert!(verify(&pk, msg, &sig));
        assert!(!verify(&pk, sha256(b"pay eve"), &sig));
    }

    #[test]
    fn wrong_key_or_garbage_signature_is_false() {
        let (sk, _) = generate_keypair();
        let (_, other) = generate_keypair();
        let msg = sha256(b"x");
        let sig = sk.sign(msg);
        assert!(!other.verify(msg, &sig));
        assert!(!other.verify(msg, b"not a der signature"));
        assert!(!other.verify(msg, &[]));
    }

    #[test]
    fn hex_and_wif_roundtrip() {
        let (sk, _) = generate_keypair();
        assert_eq!(PrivateKey::from_hex(&sk.to_hex()).unwrap(), sk);
        let wif = sk.to_wif();
        assert!(wif.starts_with('K') || wif.starts_with('L'));
        assert_eq!(PrivateKey::from_wif(&wif).unwrap(), sk);
    }

    #[test]
    fn zero_scalar_is_not_a_key() {
        assert!(PrivateKey::from_bytes(&[0u8; 32]).is_err());
    }

    #[test]
    fn debug_hides_secret() {
        let (sk, _) = generate_keypair();
        assert_eq!(format!("{sk:?}"), "PrivateKey(..)");
    }
}
