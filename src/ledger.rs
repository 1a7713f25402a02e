use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::LedgerError;

/// Off-chain mirror of the assets the application holds on the base layer.
///
/// Balances live in ordered maps so that iteration and serialization are the
/// same on every machine replaying the inputs. A missing entry is a zero
/// balance, and entries that drop to zero are removed.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct AssetLedger {
    erc20: BTreeMap<Address, BTreeMap<Address, U256>>,
    ether: BTreeMap<Address, U256>,
}

impl AssetLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deposits can't fail: the tokens are already held by the application.
    /// The balance saturates rather than wrapping; no real token supply gets
    /// near 2^256.
    pub fn credit(&mut self, token: Address, holder: Address, amount: U256) {
        let balance = self.erc20.entry(token).or_default().entry(holder).or_default();
        *balance = balance.saturating_add(amount);
    }

    /// Removes `amount` from the holder's balance, or leaves the ledger
    /// untouched if the holder doesn't have that much.
    pub fn debit(
        &mut self,
        token: Address,
        holder: Address,
        amount: U256,
    ) -> Result<(), LedgerError> {
        let balance = self.balance_of(token, holder);
        let Some(remaining) = balance.checked_sub(amount) else {
            return Err(LedgerError::InsufficientBalance {
                token,
                holder,
                balance,
                requested: amount,
            });
        };
        let holders = self.erc20.entry(token).or_default();
        if remaining.is_zero() {
            holders.remove(&holder);
            if holders.is_empty() {
                self.erc20.remove(&token);
            }
        } else {
            holders.insert(holder, remaining);
        }
        Ok(())
    }

    pub fn balance_of(&self, token: Address, holder: Address) -> U256 {
        self.erc20
            .get(&token)
            .and_then(|holders| holders.get(&holder))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    pub fn credit_ether(&mut self, holder: Address, value: U256) {
        let balance = self.ether.entry(holder).or_default();
        *balance = balance.saturating_add(value);
    }

    pub fn ether_balance_of(&self, holder: Address) -> U256 {
        self.ether.get(&holder).copied().unwrap_or(U256::ZERO)
    }
}
