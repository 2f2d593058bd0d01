//! # Host Simulation Port
//!
//! Stand-in for `cortex_m4` when building off-target (`cargo test`, or
//! any non-`arm` host). There's no real NVIC, PendSV, or SysTick here —
//! just enough surface for the rest of the crate's pure logic to link and
//! run under the host test harness. Nothing in this module is meant to
//! run on real hardware.

use core::sync::atomic::{AtomicUsize, Ordering};

/// Counts calls to `trigger_pendsv` so host tests can assert a deferred
/// switch was requested without a real PendSV exception to observe.
static PENDSV_REQUESTS: AtomicUsize = AtomicUsize::new(0);

/// Host stand-in for `cortex_m4::trigger_pendsv`. Records the request
/// instead of setting a hardware pending-exception bit.
pub fn trigger_pendsv() {
    PENDSV_REQUESTS.fetch_add(1, Ordering::Relaxed);
}

/// Number of deferred-switch requests observed since the last reset.
/// Test-only instrumentation.
#[cfg(test)]
pub fn pendsv_request_count() -> usize {
    PENDSV_REQUESTS.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_pendsv_increments_the_request_counter() {
        let before = pendsv_request_count();
        trigger_pendsv();
        assert_eq!(pendsv_request_count(), before + 1);
    }
}
