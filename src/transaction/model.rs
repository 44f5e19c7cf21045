use serde::{Deserialize, Serialize};

use super::utxo::OutPoint;
use crate::crypto::Hash256;
use crate::error::{LedgerError, Result};
use crate::wallet::PrivateKey;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    /// References a previous unspent output (UTXO)
    pub outpoint: OutPoint,
    /// Hex-encoded compressed public key of the spender.
    #[serde(default)]
    pub pubkey: String,
    /// Hex-encoded DER ECDSA signature
    #[serde(default)]
    pub signature: String,
}

impl TxInput {
    /// An unsigned input spending `outpoint`.
    pub fn new(outpoint: OutPoint) -> Self {
        Self {
            outpoint,
            pubkey: String::new(),
            signature: String::new(),
        }
    }

    pub fn is_signed(&self) -> bool {
        !self.signature.is_empty() && !self.pubkey.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub address: String,
    /// Amount in guidos.
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Double-SHA-256 of the signature-stripped serialization, fixed at creation.
    pub txid: Hash256,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    /// Set only on coinbase transactions: the height of the block they reward.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coinbase_height: Option<u64>,
}

impl Transaction {
    /// Build a transaction and compute its txid from its content.
    pub fn new(inputs: Vec<TxInput>, outputs: Vec<TxOutput>) -> Self {
        let mut tx = Self {
            txid: Hash256::ZERO,
            inputs,
            outputs,
            coinbase_height: None,
        };
        tx.txid = tx.compute_txid();
        tx
    }

    /// The input-less reward transaction at the head of every block.
    pub fn coinbase(miner_address: &str, amount: u64, height: u64) -> Self {
        let mut tx = Self {
            txid: Hash256::ZERO,
            inputs: Vec::new(),
            outputs: vec![TxOutput {
                address: miner_address.to_string(),
                amount,
            }],
            coinbase_height: Some(height),
        };
        tx.txid = tx.compute_txid();
        tx
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn total_output_amount(&self) -> u128 {
        self.outputs.iter().map(|o| o.amount as u128).sum()
    }

    /// Canonical bytes covering everything except signatures and pubkeys:
    /// outpoints, outputs and the coinbase height. Every input signs these
    /// same bytes.
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(16 + self.inputs.len() * 36 + self.outputs.len() * 48);
        buf.extend_from_slice(&(self.inputs.len() as u32).to_le_bytes());
        for input in &self.inputs {
            buf.extend_from_slice(input.outpoint.txid.as_bytes());
            buf.extend_from_slice(&input.outpoint.vout.to_le_bytes());
        }
        buf.extend_from_slice(&(self.outputs.len() as u32).to_le_bytes());
        for output in &self.outputs {
            buf.extend_from_slice(&output.amount.to_le_bytes());
            buf.extend_from_slice(&(output.address.len() as u32).to_le_bytes());
            buf.extend_from_slice(output.address.as_bytes());
        }
        match self.coinbase_height {
            Some(h) => {
                buf.push(1);
                buf.extend_from_slice(&h.to_le_bytes());
            }
            None => buf.push(0),
        }
        buf
    }

    /// Recompute the txid from current content (ignores the stored `txid`).
    pub fn compute_txid(&self) -> Hash256 {
        Hash256::digest(&self.signing_payload())
    }

    /// The digest each input signs.
    pub fn sighash(&self) -> [u8; 32] {
        self.compute_txid().0
    }

    /// Sign input `index` with `private_key`, attaching the signature and
    /// the matching public key. The txid does not change.
    pub fn sign_input(&mut self, index: usize, private_key: &PrivateKey) -> Result<()> {
        if index >= self.inputs.len() {
            return Err(LedgerError::InputOutOfRange(index));
        }
        let sighash = self.sighash();
        let signature = private_key.sign(sighash);
        let input = &mut self.inputs[index];
        input.signature = hex::encode(signature);
        input.pubkey = private_key.public_key().to_hex();
        Ok(())
    }

    /// Sign every input with the same key.
    pub fn sign_all(&mut self, private_key: &PrivateKey) -> Result<()> {
        for i in 0..self.inputs.len() {
            self.sign_input(i, private_key)?;
        }
        Ok(())
    }
}

/// Free-function form of [`Transaction::sign_input`].
pub fn sign_input(
    tx: &mut Transaction,
    input_index: usize,
    private_key: &PrivateKey,
) -> Result<()> {
    tx.sign_input(input_index, private_key)
}
