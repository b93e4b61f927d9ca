//! Span constructors for each block phase.
//!
//! Consistent names and fields make the phases easy to filter in JSON logs.

use tracing::{info_span, Span};

pub fn begin_block_span(height: u64) -> Span {
    info_span!("begin_block", height)
}

/// One client message inside a block.
pub fn deliver_msg_span(height: u64, index: usize, kind: &str) -> Span {
    info_span!("deliver_msg", height, index, kind = %kind)
}

pub fn end_block_span(height: u64) -> Span {
    info_span!("end_block", height)
}

pub fn query_span(name: &str) -> Span {
    info_span!("query", name = %name)
}
