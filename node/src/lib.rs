//! Host for the dispute engine.
//!
//! The node owns the LMDB store and a [`layer_dispute::Keeper`], decodes
//! client messages, and drives each block through `begin_block`, the block's
//! messages and `end_block`. It also carries the ambient services: TOML
//! configuration, structured logging, Prometheus metrics and JSON queries.

pub mod block_processor;
pub mod config;
pub mod error;
pub mod logging;
pub mod message;
pub mod metrics;
pub mod node;
pub mod query;
pub mod tracing_spans;

pub use block_processor::{deliver_msg, Block, BlockProcessor, BlockResult, MsgOutcome};
pub use config::NodeConfig;
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use message::DisputeMsg;
pub use metrics::NodeMetrics;
pub use node::DisputeNode;
pub use query::{run_query, DisputeQuery};
