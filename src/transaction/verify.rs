use std::collections::HashSet;

use super::model::Transaction;
use super::utxo::UtxoLookup;
use crate::error::{LedgerError, Result};
use crate::wallet::{PublicKey, address_matches, decode_address};

/// Check a non-coinbase transaction against the outputs it spends. Returns
/// the fee (inputs minus outputs) on success.
///
/// Per input, in order: the referenced output must exist (`UnknownOutput`),
/// the attached key must hash to the output's address and the signature must
/// verify over the sighash (`InvalidSignature`). Finally outputs may not
/// exceed inputs (`ValueMismatch`). Coinbase transactions are not checked
/// here; the ledger checks their amount against subsidy plus fees.
pub fn verify_transaction<L: UtxoLookup + ?Sized>(tx: &Transaction, utxos: &L) -> Result<u64> {
    check_structure(tx)?;

    let sighash = tx.sighash();
    let mut input_sum: u128 = 0;

    for (i, input) in tx.inputs.iter().enumerate() {
        let prev_out = utxos
            .lookup(&input.outpoint)
            .ok_or(LedgerError::UnknownOutput(input.outpoint))?;

        if !input_signature_valid(&input.pubkey, &input.signature, &prev_out.address, sighash) {
            return Err(LedgerError::InvalidSignature { input: i });
        }

        input_sum += prev_out.amount as u128;
    }

    let output_sum = tx.total_output_amount();
    if input_sum < output_sum {
        return Err(LedgerError::ValueMismatch {
            inputs: input_sum,
            outputs: output_sum,
        });
    }

    u64::try_from(input_sum - output_sum)
        .map_err(|_| LedgerError::MalformedTransaction("fee overflows u64"))
}

/// Shape rules that need no UTXO context. Every output must pay a
/// well-formed address (`Encoding`).
pub fn check_structure(tx: &Transaction) -> Result<()> {
    if tx.is_coinbase() {
        return Err(LedgerError::MalformedTransaction(
            "transaction must have at least one input",
        ));
    }
    if tx.outputs.is_empty() {
        return Err(LedgerError::MalformedTransaction(
            "transaction must have at least one output",
        ));
    }
    if tx.outputs.iter().any(|o| o.amount == 0) {
        return Err(LedgerError::MalformedTransaction("output amount must be > 0"));
    }
    for output in &tx.outputs {
        decode_address(&output.address)?;
    }
    if tx.coinbase_height.is_some() {
        return Err(LedgerError::MalformedTransaction(
            "only coinbase transactions carry a height",
        ));
    }
    if tx.txid != tx.compute_txid() {
        return Err(LedgerError::MalformedTransaction("txid does not match content"));
    }

    let mut seen = HashSet::with_capacity(tx.inputs.len());
    for input in &tx.inputs {
        if !seen.insert(input.outpoint) {
            return Err(LedgerError::DoubleSpend(input.outpoint));
        }
    }
    Ok(())
}

fn input_signature_valid(
    pubkey_hex: &str,
    sig_hex: &str,
    owner: &str,
    sighash: [u8; 32],
) -> bool {
    let Ok(pubkey) = PublicKey::from_hex(pubkey_hex) else {
        return false;
    };
    if !address_matches(owner, &pubkey) {
        return false;
    }
    match hex::decode(sig_hex) {
        Ok(sig) => pubkey.verify(sighash, &sig),
        Err(_) => false,
    }
}
