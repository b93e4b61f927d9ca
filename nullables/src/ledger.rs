//! Nullable ledger: in-memory bank with a dispute escrow and a bonded pool.

use layer_dispute::{CollaboratorError, LedgerAdapter};
use layer_types::{AccountAddress, Amount};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Balances {
    accounts: HashMap<AccountAddress, u128>,
    module: u128,
    bonded_pool: u128,
    supply: u128,
    burned: u128,
}

/// A bank that only ever holds what tests put into it.
///
/// Clones share state, so a [`crate::NullStakeRegistry`] built from a clone
/// moves tokens in the same pool the keeper sees.
#[derive(Clone, Default)]
pub struct NullLedger {
    state: Arc<Mutex<Balances>>,
}

impl NullLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint `amount` into an account.
    pub fn fund(&self, account: &AccountAddress, amount: u128) {
        let mut s = self.state.lock().unwrap();
        *s.accounts.entry(account.clone()).or_default() += amount;
        s.supply += amount;
    }

    /// Mint `amount` straight into the bonded pool, as staking would.
    pub fn mint_bonded(&self, amount: u128) {
        let mut s = self.state.lock().unwrap();
        s.bonded_pool += amount;
        s.supply += amount;
    }

    pub fn module_balance(&self) -> u128 {
        self.state.lock().unwrap().module
    }

    pub fn bonded_pool(&self) -> u128 {
        self.state.lock().unwrap().bonded_pool
    }

    pub fn burned(&self) -> u128 {
        self.state.lock().unwrap().burned
    }

    pub fn account_balance(&self, account: &AccountAddress) -> u128 {
        self.state
            .lock()
            .unwrap()
            .accounts
            .get(account)
            .copied()
            .unwrap_or(0)
    }

    /// Bonded pool → dispute escrow.
    pub(crate) fn pool_to_module(&self, amount: u128) -> Result<(), CollaboratorError> {
        let mut s = self.state.lock().unwrap();
        if s.bonded_pool < amount {
            return Err(CollaboratorError::InsufficientFunds(format!(
                "bonded pool holds {}, needs {amount}",
                s.bonded_pool
            )));
        }
        s.bonded_pool -= amount;
        s.module += amount;
        Ok(())
    }

    fn take_from_module(s: &mut Balances, amount: u128) -> Result<(), CollaboratorError> {
        if s.module < amount {
            return Err(CollaboratorError::InsufficientFunds(format!(
                "dispute escrow holds {}, needs {amount}",
                s.module
            )));
        }
        s.module -= amount;
        Ok(())
    }
}

impl LedgerAdapter for NullLedger {
    fn balance(&self, account: &AccountAddress) -> Result<Amount, CollaboratorError> {
        Ok(Amount::new(self.account_balance(account)))
    }

    fn send_to_module(&self, from: &AccountAddress, amount: Amount) -> Result<(), CollaboratorError> {
        let mut s = self.state.lock().unwrap();
        let balance = s.accounts.get(from).copied().unwrap_or(0);
        if balance < amount.raw() {
            return Err(CollaboratorError::InsufficientFunds(format!(
                "{from} holds {balance}, needs {amount}"
            )));
        }
        s.accounts.insert(from.clone(), balance - amount.raw());
        s.module += amount.raw();
        Ok(())
    }

    fn send_from_module(&self, to: &AccountAddress, amount: Amount) -> Result<(), CollaboratorError> {
        let mut s = self.state.lock().unwrap();
        Self::take_from_module(&mut s, amount.raw())?;
        *s.accounts.entry(to.clone()).or_default() += amount.raw();
        Ok(())
    }

    fn send_module_to_bonded_pool(&self, amount: Amount) -> Result<(), CollaboratorError> {
        let mut s = self.state.lock().unwrap();
        Self::take_from_module(&mut s, amount.raw())?;
        s.bonded_pool += amount.raw();
        Ok(())
    }

    fn burn_from_module(&self, amount: Amount) -> Result<(), CollaboratorError> {
        let mut s = self.state.lock().unwrap();
        Self::take_from_module(&mut s, amount.raw())?;
        s.supply -= amount.raw();
        s.burned += amount.raw();
        Ok(())
    }

    fn total_supply(&self) -> Result<Amount, CollaboratorError> {
        Ok(Amount::new(self.state.lock().unwrap().supply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AccountAddress {
        AccountAddress::new("tellor1alice")
    }

    #[test]
    fn escrow_round_trip_keeps_supply() {
        let ledger = NullLedger::new();
        ledger.fund(&alice(), 1_000);
        ledger.send_to_module(&alice(), Amount::new(400)).unwrap();
        assert_eq!(ledger.module_balance(), 400);
        ledger.send_from_module(&alice(), Amount::new(100)).unwrap();
        ledger.burn_from_module(Amount::new(300)).unwrap();
        assert_eq!(ledger.account_balance(&alice()), 700);
        assert_eq!(ledger.burned(), 300);
        assert_eq!(ledger.total_supply().unwrap(), Amount::new(700));
    }

    #[test]
    fn overdraft_is_rejected() {
        let ledger = NullLedger::new();
        assert!(matches!(
            ledger.send_to_module(&alice(), Amount::new(1)),
            Err(CollaboratorError::InsufficientFunds(_))
        ));
        assert!(ledger.burn_from_module(Amount::new(1)).is_err());
    }
}
