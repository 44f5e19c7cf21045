use log::debug;

use super::model::{Transaction, TxInput, TxOutput};
use super::utxo::SpendableOutput;
use crate::error::{LedgerError, Result};
use crate::wallet::decode_address;

/// Strategy for choosing which outputs fund a payment.
///
/// Given candidates in caller order and a `target` in guidos, return the chosen
/// outputs, or `None` if they cannot cover it. Implementations must be
/// deterministic: the same candidates in the same order give the same pick.
pub trait CoinSelector {
    fn select(&self, candidates: &[SpendableOutput], target: u128) -> Option<Vec<SpendableOutput>>;
}

/// Take candidates in order until the running total reaches the target.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstFit;

impl CoinSelector for FirstFit {
    fn select(&self, candidates: &[SpendableOutput], target: u128) -> Option<Vec<SpendableOutput>> {
        let mut picked = Vec::new();
        let mut total: u128 = 0;
        for c in candidates {
            if total >= target && !picked.is_empty() {
                break;
            }
            total += c.output.amount as u128;
            picked.push(c.clone());
        }
        (total >= target && !picked.is_empty()).then_some(picked)
    }
}

impl<F> CoinSelector for F
where
    F: Fn(&[SpendableOutput], u128) -> Option<Vec<SpendableOutput>>,
{
    fn select(&self, candidates: &[SpendableOutput], target: u128) -> Option<Vec<SpendableOutput>> {
        self(candidates, target)
    }
}

/// Build an unsigned payment of `amount` to `recipient` paying `fee`, funded
/// first-fit from `spendable`. Any remainder goes to `change_address` as a
/// single change output; no change output is emitted when it is zero.
pub fn build_transaction(
    spendable: &[SpendableOutput],
    recipient: &str,
    amount: u64,
    fee: u64,
    change_address: &str,
) -> Result<Transaction> {
    build_transaction_with(&FirstFit, spendable, recipient, amount, fee, change_address)
}

/// [`build_transaction`] with a caller-chosen selection strategy.
pub fn build_transaction_with<S: CoinSelector + ?Sized>(
    selector: &S,
    spendable: &[SpendableOutput],
    recipient: &str,
    amount: u64,
    fee: u64,
    change_address: &str,
) -> Result<Transaction> {
    decode_address(recipient)?;
    decode_address(change_address)?;
    if amount == 0 {
        return Err(LedgerError::MalformedTransaction("payment amount must be > 0"));
    }

    let required = amount as u128 + fee as u128;
    let selected = selector.select(spendable, required).ok_or_else(|| {
        LedgerError::InsufficientFunds {
            available: spendable.iter().map(|s| s.output.amount as u128).sum(),
            required,
        }
    })?;
    let selected_total: u128 = selected.iter().map(|s| s.output.amount as u128).sum();
    if selected_total < required {
        return Err(LedgerError::InsufficientFunds {
            available: selected_total,
            required,
        });
    }

    let inputs = selected.iter().map(|s| TxInput::new(s.outpoint)).collect();
    let mut outputs = vec![TxOutput {
        address: recipient.trim().to_string(),
        amount,
    }];
    let change = selected_total - required;
    if change > 0 {
        outputs.push(TxOutput {
            address: change_address.trim().to_string(),
            amount: u64::try_from(change)
                .map_err(|_| LedgerError::MalformedTransaction("change overflows u64"))?,
        });
    }

    let tx = Transaction::new(inputs, outputs);
    debug!(
        "built txid={} inputs={} outputs={} fee={}",
        tx.txid,
        tx.inputs.len(),
        tx.outputs.len(),
        fee
    );
    Ok(tx)
}
