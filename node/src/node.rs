//! The dispute node: wires the LMDB store, the keeper and the ambient
//! services together.

use std::sync::Arc;

use layer_dispute::{DisputeEvent, Keeper, LedgerAdapter, ReportingSubsystem, StakeRegistry};
use layer_store_lmdb::LmdbEnvironment;
use serde_json::Value;

use crate::block_processor::{Block, BlockProcessor, BlockResult};
use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::message::DisputeMsg;
use crate::metrics::NodeMetrics;
use crate::query::{run_query, DisputeQuery};

/// A dispute engine over an LMDB store. The ledger, staking and oracle
/// modules are supplied by the host chain.
pub struct DisputeNode<L, R, O> {
    config: NodeConfig,
    keeper: Keeper<LmdbEnvironment, L, R, O>,
    processor: BlockProcessor,
    metrics: Option<Arc<NodeMetrics>>,
}

impl<L, R, O> DisputeNode<L, R, O>
where
    L: LedgerAdapter,
    R: StakeRegistry,
    O: ReportingSubsystem,
{
    pub fn open(config: NodeConfig, ledger: L, stake: R, oracle: O) -> Result<Self, NodeError> {
        let store = LmdbEnvironment::open(&config.data_dir, config.map_size)?;
        let mut keeper = Keeper::new(store, ledger, stake, oracle, config.dispute.clone())?;

        let metrics = if config.enable_metrics {
            let metrics = Arc::new(NodeMetrics::new()?);
            let sink = Arc::clone(&metrics);
            keeper.subscribe(Box::new(move |event: &DisputeEvent| sink.observe(event)));
            metrics.open_disputes.set(keeper.open_disputes()?.len() as i64);
            Some(metrics)
        } else {
            None
        };

        tracing::info!(
            data_dir = %config.data_dir.display(),
            metrics = config.enable_metrics,
            open_disputes = keeper.open_disputes()?.len(),
            "dispute node started"
        );
        Ok(Self {
            config,
            keeper,
            processor: BlockProcessor::new(),
            metrics,
        })
    }

    pub fn process_block(&mut self, block: &Block) -> Result<BlockResult, NodeError> {
        self.processor
            .process(&self.keeper, block, self.metrics.as_deref())
    }

    /// Decode a block of JSON messages and process it. A message that fails
    /// to decode rejects the whole block.
    pub fn process_json_block(
        &mut self,
        header: layer_types::BlockHeader,
        msgs: &[&str],
    ) -> Result<BlockResult, NodeError> {
        let msgs = msgs
            .iter()
            .map(|raw| DisputeMsg::from_json(raw))
            .collect::<Result<Vec<_>, _>>()?;
        self.process_block(&Block::new(header, msgs))
    }

    pub fn query(&self, query: &DisputeQuery) -> Result<Value, NodeError> {
        run_query(&self.keeper, query)
    }

    pub fn query_json(&self, raw: &str) -> Result<Value, NodeError> {
        self.query(&DisputeQuery::from_json(raw)?)
    }

    pub fn keeper(&self) -> &Keeper<LmdbEnvironment, L, R, O> {
        &self.keeper
    }

    pub fn keeper_mut(&mut self) -> &mut Keeper<LmdbEnvironment, L, R, O> {
        &mut self.keeper
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn metrics(&self) -> Option<&NodeMetrics> {
        self.metrics.as_deref()
    }

    pub fn last_header(&self) -> Option<layer_types::BlockHeader> {
        self.processor.last_header()
    }
}
