//! Nullable stake registry: reporters, selectors and escrowed slashes.

use crate::ledger::NullLedger;
use layer_dispute::{CollaboratorError, Delegation, StakeRegistry};
use layer_types::{AccountAddress, Amount, HashId, JailPolicy, Timestamp};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Stakes {
    /// Reporter → total bonded tokens, selectors included.
    reporters: HashMap<AccountAddress, u128>,
    /// Selector → delegation. Reporters select themselves.
    delegations: HashMap<AccountAddress, Delegation>,
    reporter_history: HashMap<AccountAddress, BTreeMap<u64, u128>>,
    delegator_history: HashMap<AccountAddress, BTreeMap<u64, u128>>,
    slash_escrow: HashMap<HashId, u128>,
    fee_escrow: HashMap<HashId, u128>,
    jailed: HashMap<AccountAddress, (JailPolicy, Timestamp)>,
}

/// Staking with explicit checkpoints standing in for historical queries.
///
/// Bonded tokens live in the shared [`NullLedger`]'s bonded pool.
#[derive(Clone)]
pub struct NullStakeRegistry {
    ledger: NullLedger,
    state: Arc<Mutex<Stakes>>,
}

impl NullStakeRegistry {
    pub fn new(ledger: NullLedger) -> Self {
        Self {
            ledger,
            state: Arc::default(),
        }
    }

    /// Register a reporter bonding `amount` of fresh tokens.
    pub fn add_reporter(&self, reporter: &AccountAddress, amount: u128) {
        self.ledger.mint_bonded(amount);
        let mut s = self.state.lock().unwrap();
        *s.reporters.entry(reporter.clone()).or_default() += amount;
        s.delegations.insert(
            reporter.clone(),
            Delegation {
                reporter: reporter.clone(),
                amount: Amount::new(amount),
            },
        );
    }

    /// Delegate `amount` of fresh tokens from `selector` to `reporter`.
    pub fn add_selector(&self, selector: &AccountAddress, reporter: &AccountAddress, amount: u128) {
        self.ledger.mint_bonded(amount);
        let mut s = self.state.lock().unwrap();
        *s.reporters.entry(reporter.clone()).or_default() += amount;
        s.delegations.insert(
            selector.clone(),
            Delegation {
                reporter: reporter.clone(),
                amount: Amount::new(amount),
            },
        );
    }

    /// Record every current stake as of `height`.
    pub fn checkpoint(&self, height: u64) {
        let mut s = self.state.lock().unwrap();
        let reporters: Vec<_> = s.reporters.iter().map(|(a, v)| (a.clone(), *v)).collect();
        for (addr, tokens) in reporters {
            s.reporter_history.entry(addr).or_default().insert(height, tokens);
        }
        let delegations: Vec<_> = s
            .delegations
            .iter()
            .map(|(a, d)| (a.clone(), d.amount.raw()))
            .collect();
        for (addr, tokens) in delegations {
            s.delegator_history.entry(addr).or_default().insert(height, tokens);
        }
    }

    pub fn stake_of(&self, reporter: &AccountAddress) -> u128 {
        self.state
            .lock()
            .unwrap()
            .reporters
            .get(reporter)
            .copied()
            .unwrap_or(0)
    }

    pub fn jail_status(&self, reporter: &AccountAddress) -> Option<JailPolicy> {
        self.state
            .lock()
            .unwrap()
            .jailed
            .get(reporter)
            .map(|(policy, _)| *policy)
    }

    pub fn escrowed_slash(&self, hash_id: &HashId) -> u128 {
        self.state
            .lock()
            .unwrap()
            .slash_escrow
            .get(hash_id)
            .copied()
            .unwrap_or(0)
    }

    fn take_stake(
        s: &mut Stakes,
        account: &AccountAddress,
        amount: u128,
    ) -> Result<(), CollaboratorError> {
        let stake = s
            .reporters
            .get_mut(account)
            .ok_or_else(|| CollaboratorError::NotFound(format!("reporter {account}")))?;
        if *stake < amount {
            return Err(CollaboratorError::InsufficientFunds(format!(
                "{account} has {stake} staked, needs {amount}"
            )));
        }
        *stake -= amount;
        Ok(())
    }
}

fn at_height(history: Option<&BTreeMap<u64, u128>>, height: u64) -> Option<u128> {
    history.and_then(|h| h.range(..=height).next_back().map(|(_, v)| *v))
}

impl StakeRegistry for NullStakeRegistry {
    fn reporter_total_tokens(&self, reporter: &AccountAddress) -> Result<Amount, CollaboratorError> {
        self.state
            .lock()
            .unwrap()
            .reporters
            .get(reporter)
            .map(|v| Amount::new(*v))
            .ok_or_else(|| CollaboratorError::NotFound(format!("reporter {reporter}")))
    }

    fn escrow_reporter_stake(
        &self,
        reporter: &AccountAddress,
        amount: Amount,
        hash_id: &HashId,
    ) -> Result<(), CollaboratorError> {
        let mut s = self.state.lock().unwrap();
        Self::take_stake(&mut s, reporter, amount.raw())?;
        self.ledger.pool_to_module(amount.raw())?;
        *s.slash_escrow.entry(*hash_id).or_default() += amount.raw();
        Ok(())
    }

    fn jail_reporter(
        &self,
        reporter: &AccountAddress,
        policy: JailPolicy,
        now: Timestamp,
    ) -> Result<(), CollaboratorError> {
        let mut s = self.state.lock().unwrap();
        if !s.reporters.contains_key(reporter) {
            return Err(CollaboratorError::NotFound(format!("reporter {reporter}")));
        }
        s.jailed.insert(reporter.clone(), (policy, now));
        Ok(())
    }

    fn delegation(&self, account: &AccountAddress) -> Result<Option<Delegation>, CollaboratorError> {
        Ok(self.state.lock().unwrap().delegations.get(account).cloned())
    }

    fn reporter_tokens_at_block(
        &self,
        reporter: &AccountAddress,
        height: u64,
    ) -> Result<Amount, CollaboratorError> {
        let s = self.state.lock().unwrap();
        let tokens = at_height(s.reporter_history.get(reporter), height)
            .or_else(|| s.reporters.get(reporter).copied())
            .unwrap_or(0);
        Ok(Amount::new(tokens))
    }

    fn delegator_tokens_at_block(
        &self,
        delegator: &AccountAddress,
        height: u64,
    ) -> Result<Amount, CollaboratorError> {
        let s = self.state.lock().unwrap();
        let tokens = at_height(s.delegator_history.get(delegator), height)
            .or_else(|| s.delegations.get(delegator).map(|d| d.amount.raw()))
            .unwrap_or(0);
        Ok(Amount::new(tokens))
    }

    fn fee_from_reporter_stake(
        &self,
        payer: &AccountAddress,
        amount: Amount,
        hash_id: &HashId,
    ) -> Result<(), CollaboratorError> {
        let mut s = self.state.lock().unwrap();
        Self::take_stake(&mut s, payer, amount.raw())?;
        self.ledger.pool_to_module(amount.raw())?;
        *s.fee_escrow.entry(*hash_id).or_default() += amount.raw();
        Ok(())
    }

    fn fee_refund(
        &self,
        payer: &AccountAddress,
        hash_id: &HashId,
        amount: Amount,
    ) -> Result<(), CollaboratorError> {
        let mut s = self.state.lock().unwrap();
        let escrowed = s.fee_escrow.entry(*hash_id).or_default();
        *escrowed = escrowed.saturating_sub(amount.raw());
        *s.reporters.entry(payer.clone()).or_default() += amount.raw();
        Ok(())
    }

    fn return_slashed_tokens(
        &self,
        reporter: &AccountAddress,
        amount: Amount,
        hash_id: &HashId,
    ) -> Result<(), CollaboratorError> {
        let mut s = self.state.lock().unwrap();
        let escrowed = s.slash_escrow.entry(*hash_id).or_default();
        *escrowed = escrowed.saturating_sub(amount.raw());
        *s.reporters.entry(reporter.clone()).or_default() += amount.raw();
        Ok(())
    }

    fn add_amount_to_stake(
        &self,
        account: &AccountAddress,
        amount: Amount,
    ) -> Result<(), CollaboratorError> {
        *self
            .state
            .lock()
            .unwrap()
            .reporters
            .entry(account.clone())
            .or_default() += amount.raw();
        Ok(())
    }

    fn total_reporter_power(&self) -> Result<u128, CollaboratorError> {
        Ok(self.state.lock().unwrap().reporters.values().sum::<u128>())
    }
}
