pub mod encoding;
pub mod hash;

pub use encoding::{
    EncodingError, base58_decode, base58_encode, base58check_decode, base58check_encode,
};
pub use hash::{Hash256, double_sha256, hash160, sha256};
