//! Nullable oracle: tips by height and a record of flagged reports.

use layer_dispute::{CollaboratorError, ReportingSubsystem};
use layer_types::{AccountAddress, Amount, MicroReport};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct OracleState {
    tips: HashMap<AccountAddress, BTreeMap<u64, u128>>,
    flagged: Vec<MicroReport>,
}

#[derive(Clone, Default)]
pub struct NullOracle {
    state: Arc<Mutex<OracleState>>,
}

impl NullOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a tip paid by `tipper` at `height`.
    pub fn tip(&self, tipper: &AccountAddress, amount: u128, height: u64) {
        *self
            .state
            .lock()
            .unwrap()
            .tips
            .entry(tipper.clone())
            .or_default()
            .entry(height)
            .or_default() += amount;
    }

    pub fn flagged(&self) -> Vec<MicroReport> {
        self.state.lock().unwrap().flagged.clone()
    }
}

impl ReportingSubsystem for NullOracle {
    fn tips_at_block_for_tipper(
        &self,
        tipper: &AccountAddress,
        height: u64,
    ) -> Result<Amount, CollaboratorError> {
        let s = self.state.lock().unwrap();
        let total = s
            .tips
            .get(tipper)
            .map(|h| h.range(..=height).map(|(_, v)| *v).sum::<u128>())
            .unwrap_or(0);
        Ok(Amount::new(total))
    }

    fn total_tips(&self) -> Result<Amount, CollaboratorError> {
        let s = self.state.lock().unwrap();
        Ok(Amount::new(
            s.tips.values().flat_map(|h| h.values()).sum::<u128>(),
        ))
    }

    fn flag_aggregate_report(&self, report: &MicroReport) -> Result<(), CollaboratorError> {
        self.state.lock().unwrap().flagged.push(report.clone());
        Ok(())
    }
}
