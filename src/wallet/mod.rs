pub mod address;
pub mod keys;

pub use address::{
    MAINNET_VERSION, TESTNET_VERSION, address_matches, decode_address, derive_address,
};
pub use keys::{PrivateKey, PublicKey, generate_keypair, sign, verify};

use log::info;
use serde::{Deserialize, Serialize};

use crate::crypto::EncodingError;
use crate::error::Result;
use crate::transaction::{SpendableOutput, Transaction, build_transaction};

/// A keypair and the address it controls.
#[derive(Debug, Clone)]
pub struct Wallet {
    pub private_key: PrivateKey,
    pub public_key: PublicKey,
    pub address: String,
}

/// On-disk / over-the-wire shape of a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletRecord {
    pub private_key: String,
    pub public_key: String,
    pub address: String,
    #[serde(default)]
    pub wif: String,
}

impl Wallet {
    pub fn generate(version: u8) -> Self {
        let (private_key, _) = generate_keypair();
        Self::from_private_key(private_key, version)
    }

    pub fn from_private_key(private_key: PrivateKey, version: u8) -> Self {
        let public_key = private_key.public_key();
        let address = derive_address(&public_key, version);
        Self {
            private_key,
            public_key,
            address,
        }
    }

    pub fn from_private_key_hex(
        hex_key: &str,
        version: u8,
    ) -> std::result::Result<Self, EncodingError> {
        Ok(Self::from_private_key(PrivateKey::from_hex(hex_key)?, version))
    }

    pub fn from_wif(wif: &str, version: u8) -> std::result::Result<Self, EncodingError> {
        Ok(Self::from_private_key(PrivateKey::from_wif(wif)?, version))
    }

    /// Build a payment from `spendable` (first-fit, change back to this
    /// wallet) and sign every input.
    pub fn create_transaction(
        &self,
        spendable: &[SpendableOutput],
        recipient: &str,
        amount: u64,
        fee: u64,
    ) -> Result<Transaction> {
        let mut tx = build_transaction(spendable, recipient, amount, fee, &self.address)?;
        tx.sign_all(&self.private_key)?;
        info!(
            "wallet {} signed txid={} ({} inputs, amount={}, fee={})",
            self.address,
            tx.txid,
            tx.inputs.len(),
            amount,
            fee
        );
        Ok(tx)
    }

    pub fn to_record(&self) -> WalletRecord {
        WalletRecord {
            private_key: self.private_key.to_hex(),
            public_key: self.public_key.to_hex(),
            address: self.address.clone(),
            wif: self.private_key.to_wif(),
        }
    }

    /// Rebuild from a record. The address is re-derived with the record's own
    /// version byte; a record whose stored address disagrees is rejected.
    pub fn from_record(record: &WalletRecord) -> std::result::Result<Self, EncodingError> {
        let (version, _) = decode_address(&record.address)?;
        let wallet = Self::from_private_key_hex(&record.private_key, version)?;
        if wallet.address != record.address.trim() {
            return Err(EncodingError::AddressMismatch(record.address.clone()));
        }
        Ok(wallet)
    }
}
