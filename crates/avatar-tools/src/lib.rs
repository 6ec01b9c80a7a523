//! Tooling primitives for the avatar behavior tree.
//!
//! Everything here reads from or writes to the blackboard; nothing reaches into the tree itself.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod profile;
pub mod trace;

pub use profile::{all_durations, node_duration, tick_summary, TickSummary};
pub use trace::{emit, TraceEvent, TraceLog, TraceSink, TRACE_LOG, TRACE_SINK};
