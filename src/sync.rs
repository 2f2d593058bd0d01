//! # Critical Sections
//!
//! The kernel's only concurrency primitive below the scheduler itself:
//! every piece of shared mutable state (the scheduler, the heap, and
//! every semaphore/mutex/queue) is only ever touched from inside one of
//! these. On target, this disables interrupts for the duration of the
//! closure; on the host simulation port there are no real interrupts to
//! race against, so it's a direct call.

use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(target_arch = "arm")] {
        use cortex_m::interrupt;

        /// Run `f` with interrupts disabled.
        ///
        /// Keep critical sections short — this is the kernel's only source
        /// of interrupt latency, and it's used from the tick path.
        #[inline]
        pub fn critical_section<F, R>(f: F) -> R
        where
            F: FnOnce() -> R,
        {
            interrupt::free(|_cs| f())
        }
    } else {
        /// Host stand-in: the test harness is single-threaded, so there is
        /// nothing to exclude.
        #[inline]
        pub fn critical_section<F, R>(f: F) -> R
        where
            F: FnOnce() -> R,
        {
            f()
        }
    }
}
