//! Team address rotation.

use crate::collaborators::{LedgerAdapter, ReportingSubsystem, StakeRegistry};
use crate::error::DisputeError;
use crate::events::DisputeEvent;
use crate::keeper::Keeper;
use layer_store::{DisputeStateStore, WriteBatch};
use layer_types::AccountAddress;

impl<S, L, R, O> Keeper<S, L, R, O>
where
    S: DisputeStateStore,
    L: LedgerAdapter,
    R: StakeRegistry,
    O: ReportingSubsystem,
{
    /// Hand the team seat to `new_team`. Only the current team may do this.
    ///
    /// Ballots the old address cast on open disputes move to the new address
    /// so the team cannot vote twice. A dispute the new address already voted
    /// on keeps the old ballot where it is. Returns how many ballots moved.
    pub fn update_team(
        &self,
        current: &AccountAddress,
        new_team: &AccountAddress,
    ) -> Result<usize, DisputeError> {
        let team = self
            .team_address()?
            .ok_or_else(|| DisputeError::not_found("team address", "unset"))?;
        if &team != current {
            return Err(DisputeError::Unauthorized(format!(
                "{current} is not the team address"
            )));
        }
        if new_team == current {
            return Err(DisputeError::Validation(
                "new team address equals the current one".into(),
            ));
        }

        let mut batch = WriteBatch::new();
        let mut moved = 0;
        for id in self.store.open_dispute_ids()? {
            if !self.store.has_voter(id, current)? {
                continue;
            }
            if self.store.has_voter(id, new_team)? {
                tracing::warn!(
                    dispute_id = id,
                    new_team = %new_team,
                    "new team address already voted; team ballot left in place"
                );
                continue;
            }
            let ballot = self.store.get_voter(id, current)?;
            let mut vote = self.store.get_vote(id)?;
            for addr in vote.voters.iter_mut().filter(|a| **a == *current) {
                *addr = new_team.clone();
            }
            batch.remove_voter(id, current);
            batch.put_voter(id, new_team, &ballot);
            batch.put_vote(&vote);
            moved += 1;
        }
        batch.put_team_address(new_team);
        self.commit(batch)?;

        tracing::info!(previous = %current, current = %new_team, moved, "team address updated");
        self.emit(DisputeEvent::TeamUpdated {
            previous: current.clone(),
            current: new_team.clone(),
        });
        Ok(moved)
    }
}
