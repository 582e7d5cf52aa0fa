//! ==============================================================================
//! validator.rs - sequence-number watermark for sensor health
//! ==============================================================================
//!
//! purpose:
//!     the device stamps every sample with an increasing counter. a sample
//!     whose counter does not exceed the highest one accepted so far is
//!     stored but flagged as suspect (the sensor may have reset or be faulty).
//!
//! concurrency:
//!     requests are handled on many tokio tasks at once. the watermark is the
//!     only shared mutable state in the hub, so it lives in an AtomicI64 and
//!     advances through a single compare-and-set. two concurrent samples with
//!     the same counter can never both be accepted.
//!
//!     suspect samples never move the watermark, so one out-of-order sample
//!     does not invalidate the correctly ordered ones that follow it.
//!
//! ==============================================================================

use std::sync::atomic::{AtomicI64, Ordering};

/// classify a sequence number against the current watermark
///
/// returns (is_valid, new_watermark). any integer is accepted, including
/// negative and repeated values; they are classified, never rejected.
pub fn validate(sequence_num: i64, watermark: i64) -> (bool, i64) {
    if sequence_num > watermark {
        (true, sequence_num)
    } else {
        (false, watermark)
    }
}

#[derive(Debug, Default)]
pub struct SequenceWatermark {
    last: AtomicI64,
}

impl SequenceWatermark {
    pub fn new(initial: i64) -> Self {
        Self { last: AtomicI64::new(initial) }
    }

    /// accept `sequence_num` if it advances the watermark
    pub fn compare_and_advance(&self, sequence_num: i64) -> bool {
        self.last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                match validate(sequence_num, current) {
                    (true, next) => Some(next),
                    (false, _) => None,
                }
            })
            .is_ok()
    }

    /// highest sequence number accepted so far
    pub fn current(&self) -> i64 {
        self.last.load(Ordering::Acquire)
    }
}
