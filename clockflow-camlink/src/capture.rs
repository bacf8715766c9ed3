//! Capture stage and flow control policies.
//!
//! The capture stage sits in the producer domain between the video source and the write side of the clock
//! crossing queue. It decides what happens to a sample offered while the queue is full.

use clockflow::*;
use serde::{Deserialize, Serialize};

use crate::sample::Sample;

/// Whether the producer is held while the queue is full.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Signal)]
#[serde(rename_all = "snake_case")]
pub enum Backpressure {
    /// The producer advances every cycle. A sample offered to a full queue is lost.
    #[default]
    Ignore,
    /// The producer holds its sample until the queue accepts it.
    Honor,
}

/// What to do with a sample lost to a full queue.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Signal)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Discard the sample, latch the overflow flag and count it.
    #[default]
    DropNewest,
    /// Latch the overflow alarm and stop capturing.
    Halt,
}

/// Whether the read port of the ring buffer honors the consumer's readiness.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumerMode {
    /// The read port is always ready. A word delivered while the consumer is not ready is lost.
    #[default]
    AlwaysReady,
    /// The consumer backpressures the ring buffer.
    Honor,
}

/// Capture stage's state.
#[derive(Debug, Default, Clone, PartialEq, Signal)]
pub struct CaptureState {
    /// Backpressure policy.
    pub backpressure: Backpressure,
    /// Overflow policy.
    pub overflow_policy: OverflowPolicy,
    /// Sticky overflow flag.
    pub overflow: bool,
    /// Overflow alarm under [`OverflowPolicy::Halt`].
    pub halted: bool,
    /// Samples lost to a full queue.
    pub dropped: u64,
}

/// Capture stage's logic.
pub type CaptureFn = fn(&Valid<Sample>, &Ready, &CaptureState) -> (Valid<Sample>, Ready, CaptureState);

/// Capture stage.
pub type Capture = Fsm<VrChannel<Sample>, VrChannel<Sample>, CaptureState, CaptureFn>;

fn logic(i_fwd: &Valid<Sample>, o_bwd: &Ready, state: &CaptureState) -> (Valid<Sample>, Ready, CaptureState) {
    let o_fwd = Valid::new(i_fwd.valid && !state.halted, i_fwd.inner);
    let i_bwd = Ready::new(o_bwd.ready && !state.halted);

    let mut state_next = state.clone();
    let lost = o_fwd.valid && !o_bwd.ready && state.backpressure == Backpressure::Ignore;
    if lost {
        state_next.overflow = true;
        state_next.dropped += 1;
        state_next.halted = state.overflow_policy == OverflowPolicy::Halt;
    }

    (o_fwd, i_bwd, state_next)
}

/// Creates a capture stage.
pub fn capture(backpressure: Backpressure, overflow_policy: OverflowPolicy) -> Capture {
    let init = CaptureState { backpressure, overflow_policy, ..CaptureState::default() };
    Fsm::new("capture", init, logic as CaptureFn)
}
