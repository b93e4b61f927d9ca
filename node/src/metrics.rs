//! Prometheus metrics for the dispute node.
//!
//! [`NodeMetrics`] owns a dedicated [`Registry`]. Engine counters are fed by
//! [`NodeMetrics::observe`], which the node subscribes to the keeper's event
//! bus; the open-disputes gauge and block timings are set by the block
//! processor.

use layer_dispute::DisputeEvent;
use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, Histogram, HistogramOpts, IntCounter, IntGauge,
    Opts, Registry, TextEncoder,
};

use crate::NodeError;

pub struct NodeMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    pub disputes_proposed: IntCounter,
    pub rounds_added: IntCounter,
    pub votes_cast: IntCounter,
    pub disputes_executed: IntCounter,
    pub disputes_expired: IntCounter,
    pub refunds_withdrawn: IntCounter,
    pub rewards_claimed: IntCounter,
    /// Messages rejected by the engine; the block still commits.
    pub msgs_failed: IntCounter,
    /// Per-dispute failures skipped inside `begin_block`.
    pub hook_failures: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    pub open_disputes: IntGauge,
    pub block_height: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Wall time spent processing one block, in milliseconds.
    pub block_process_time_ms: Histogram,
}

fn counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter, NodeError> {
    Ok(register_int_counter_with_registry!(Opts::new(name, help), registry)?)
}

fn gauge(registry: &Registry, name: &str, help: &str) -> Result<IntGauge, NodeError> {
    Ok(register_int_gauge_with_registry!(Opts::new(name, help), registry)?)
}

impl NodeMetrics {
    pub fn new() -> Result<Self, NodeError> {
        let registry = Registry::new();

        let disputes_proposed = counter(
            &registry,
            "layer_disputes_proposed_total",
            "First-round disputes opened",
        )?;
        let rounds_added = counter(
            &registry,
            "layer_dispute_rounds_added_total",
            "Unresolved disputes escalated into a new round",
        )?;
        let votes_cast = counter(&registry, "layer_votes_cast_total", "Ballots cast")?;
        let disputes_executed = counter(
            &registry,
            "layer_disputes_executed_total",
            "Resolved disputes settled",
        )?;
        let disputes_expired = counter(
            &registry,
            "layer_disputes_expired_total",
            "Prevote disputes that failed to collect their fee in time",
        )?;
        let refunds_withdrawn = counter(
            &registry,
            "layer_refunds_withdrawn_total",
            "Fee refunds paid out",
        )?;
        let rewards_claimed = counter(
            &registry,
            "layer_rewards_claimed_total",
            "Voter rewards paid out",
        )?;
        let msgs_failed = counter(
            &registry,
            "layer_msgs_failed_total",
            "Dispute messages rejected by the engine",
        )?;
        let hook_failures = counter(
            &registry,
            "layer_begin_block_failures_total",
            "Disputes skipped by begin_block after an error",
        )?;

        let open_disputes = gauge(
            &registry,
            "layer_open_disputes",
            "Disputes currently in the open index",
        )?;
        let block_height = gauge(&registry, "layer_block_height", "Last processed height")?;

        let block_process_time_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "layer_block_process_time_ms",
                "Block processing time in milliseconds"
            )
            .buckets(prometheus::exponential_buckets(0.1, 2.0, 15)?),
            registry
        )?;

        Ok(Self {
            registry,
            disputes_proposed,
            rounds_added,
            votes_cast,
            disputes_executed,
            disputes_expired,
            refunds_withdrawn,
            rewards_claimed,
            msgs_failed,
            hook_failures,
            open_disputes,
            block_height,
            block_process_time_ms,
        })
    }

    /// Count one engine event.
    pub fn observe(&self, event: &DisputeEvent) {
        match event {
            DisputeEvent::Proposed { .. } => self.disputes_proposed.inc(),
            DisputeEvent::RoundAdded { .. } => self.rounds_added.inc(),
            DisputeEvent::Voted { .. } => self.votes_cast.inc(),
            DisputeEvent::Executed { .. } => self.disputes_executed.inc(),
            DisputeEvent::Expired { .. } => self.disputes_expired.inc(),
            DisputeEvent::FeeRefunded { .. } => self.refunds_withdrawn.inc(),
            DisputeEvent::RewardClaimed { .. } => self.rewards_claimed.inc(),
            DisputeEvent::FeeAdded { .. }
            | DisputeEvent::VotingStarted { .. }
            | DisputeEvent::Tallied { .. }
            | DisputeEvent::EvidenceAdded { .. }
            | DisputeEvent::TeamUpdated { .. } => {}
        }
    }

    /// Render every metric in the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, NodeError> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| NodeError::Config(format!("metrics output: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layer_types::{AccountAddress, Amount, DisputeCategory};

    #[test]
    fn events_feed_counters() {
        let metrics = NodeMetrics::new().unwrap();
        let reporter = AccountAddress::new("tellor1reporter");
        metrics.observe(&DisputeEvent::Proposed {
            dispute_id: 1,
            reporter,
            category: DisputeCategory::Warning,
            fee_paid: Amount::new(10),
        });
        metrics.observe(&DisputeEvent::Expired { dispute_id: 1 });
        metrics.observe(&DisputeEvent::EvidenceAdded {
            dispute_id: 1,
            reports: 1,
        });

        assert_eq!(metrics.disputes_proposed.get(), 1);
        assert_eq!(metrics.disputes_expired.get(), 1);
        assert_eq!(metrics.votes_cast.get(), 0);
    }

    #[test]
    fn encode_lists_registered_names() {
        let metrics = NodeMetrics::new().unwrap();
        metrics.open_disputes.set(3);
        let text = metrics.encode().unwrap();
        assert!(text.contains("layer_open_disputes 3"));
        assert!(text.contains("layer_msgs_failed_total 0"));
    }

    #[test]
    fn registries_are_independent() {
        let a = NodeMetrics::new().unwrap();
        let b = NodeMetrics::new().unwrap();
        a.votes_cast.inc();
        assert_eq!(b.votes_cast.get(), 0);
    }
}
