//! Stream domain module - assistant run events and their accumulation.

mod accumulator;
mod event;

pub use accumulator::{ResponseAccumulator, RunOutcome};
pub use event::{StreamEvent, TokenUsage};
