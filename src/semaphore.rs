//! # Counting Semaphore
//!
//! A non-negative counter guarded by a FIFO list of blocked tasks. `signal`
//! performs a direct hand-off to the oldest waiter rather than incrementing
//! the count and letting it race a waiter to decrement it again — see
//! `wait`/`signal` below.

use crate::kernel;
use crate::scheduler::WaitList;
use crate::sync;
use crate::task::WaitTarget;

/// A counting semaphore. Statically placed or heap-allocated by the
/// application; the kernel itself never owns a semaphore's storage.
pub struct Semaphore {
    count: u32,
    waiters: WaitList,
}

// Safety: all access goes through `sync::critical_section`.
unsafe impl Send for Semaphore {}
unsafe impl Sync for Semaphore {}

impl Semaphore {
    /// A semaphore with no waiters, before `init` is called.
    pub const fn new(initial: u32) -> Self {
        Self {
            count: initial,
            waiters: WaitList::new(),
        }
    }

    /// (Re)initialize a semaphore. Any existing waiters are abandoned —
    /// callers must only do this before the semaphore is shared.
    pub fn init(&mut self, initial: u32) {
        self.count = initial;
        self.waiters = WaitList::new();
    }

    /// Wait for the semaphore. Returns `true` if the count was decremented
    /// (or a waking `signal` handed the slot directly to this task),
    /// `false` if `timeout_ticks` ticks elapsed first. `timeout_ticks == 0`
    /// means wait indefinitely.
    pub fn wait(&mut self, timeout_ticks: u32) -> bool {
        let blocked_id = sync::critical_section(|| unsafe {
            if self.count > 0 {
                self.count -= 1;
                return None;
            }
            let sched = &mut *kernel::SCHEDULER_PTR;
            let id = sched.current_task_id();
            sched.wait_list_push_back(&mut self.waiters, id);
            sched.block_current(timeout_ticks, WaitTarget::Semaphore(self as *mut Semaphore));
            Some(id)
        });

        let Some(id) = blocked_id else {
            return true;
        };
        kernel::request_switch();

        sync::critical_section(|| unsafe {
            let sched = &mut *kernel::SCHEDULER_PTR;
            if sched.tasks[id].waiting_on == WaitTarget::None {
                true
            } else {
                sched.wait_list_remove(&mut self.waiters, id);
                sched.tasks[id].waiting_on = WaitTarget::None;
                false
            }
        })
    }

    /// Signal the semaphore. If a task is already waiting, it is handed
    /// the slot directly and made READY (the count is not touched);
    /// otherwise the count is incremented. Safe to call from an ISR.
    pub fn signal(&mut self) {
        sync::critical_section(|| unsafe {
            let sched = &mut *kernel::SCHEDULER_PTR;
            match sched.wait_list_pop_front(&mut self.waiters) {
                Some(id) => {
                    sched.tasks[id].waiting_on = WaitTarget::None;
                    sched.resume(id);
                }
                None => self.count += 1,
            }
        });
        kernel::request_switch();
    }

    /// Current count, without blocking. Racy the instant it returns if
    /// other tasks/ISRs are active — intended for diagnostics.
    pub fn count(&self) -> u32 {
        sync::critical_section(|| self.count)
    }

    /// Unlink a timed-out waiter. Called by `Scheduler::tick` via
    /// `WaitTarget::Semaphore`; already running inside the caller's
    /// critical section.
    pub(crate) fn cancel_wait(&mut self, sched: &mut crate::scheduler::Scheduler, id: usize) {
        sched.wait_list_remove(&mut self.waiters, id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_succeeds_immediately_while_count_is_positive() {
        let mut sem = Semaphore::new(2);
        assert_eq!(sem.count(), 2);
        // Fast path only exercises the counter; no scheduler is wired up
        // in this unit test so we drive the count directly rather than
        // going through `wait`, which would dereference a null
        // `SCHEDULER_PTR` once it falls off the fast path.
        assert!(sem.count > 0);
        sem.count -= 1;
        assert_eq!(sem.count(), 1);
    }

    #[test]
    fn signal_increments_count_when_nobody_is_waiting() {
        let mut sem = Semaphore::new(0);
        assert!(sem.waiters.is_empty());
        sem.count += 1; // same effect as `signal()` with an empty wait list
        assert_eq!(sem.count(), 1);
    }

    #[test]
    fn init_resets_count_and_drops_old_waiters() {
        let mut sem = Semaphore::new(5);
        sem.count = 0;
        sem.init(3);
        assert_eq!(sem.count(), 3);
        assert!(sem.waiters.is_empty());
    }

    extern "C" fn dummy(_arg: *mut ()) -> ! {
        loop {}
    }

    #[test]
    fn wait_on_a_semaphore_nobody_ever_signals_reports_timeout() {
        // Unlike the fast-path-only tests above, this goes through the
        // real `wait()` -> scheduler singleton path: a live task blocks
        // on a semaphore nothing ever signals and must come back `false`.
        crate::kernel::init();
        let id = crate::kernel::create_task(dummy, core::ptr::null_mut(), 1, "waiter").unwrap();
        crate::sync::critical_section(|| unsafe {
            (*crate::kernel::SCHEDULER_PTR).current_task = id;
        });

        let mut sem = Semaphore::new(0);
        assert!(!sem.wait(3), "nothing ever signals this semaphore, so wait() must report failure");
    }

    #[test]
    fn wait_reports_timeout_once_scheduler_ticks_drive_the_timeout_to_zero() {
        // `wait()` registers the block and rechecks `waiting_on` in one
        // synchronous call, so it can't show real ticks elapsing in
        // between on the host port. This drives the same two halves
        // `wait()` does -- register, then the resume recheck -- with real
        // `Scheduler::tick()` calls in between, the way a SysTick timeout
        // actually wakes a blocked task on target hardware.
        crate::kernel::init();
        let id = crate::kernel::create_task(dummy, core::ptr::null_mut(), 1, "waiter").unwrap();
        let mut sem = Semaphore::new(0);

        crate::sync::critical_section(|| unsafe {
            let sched = &mut *crate::kernel::SCHEDULER_PTR;
            sched.current_task = id;
            sched.wait_list_push_back(&mut sem.waiters, id);
            sched.block_current(2, WaitTarget::Semaphore(&mut sem as *mut Semaphore));
        });

        crate::sync::critical_section(|| unsafe { (*crate::kernel::SCHEDULER_PTR).tick() });
        crate::sync::critical_section(|| unsafe { (*crate::kernel::SCHEDULER_PTR).tick() });

        let granted = crate::sync::critical_section(|| unsafe {
            let sched = &mut *crate::kernel::SCHEDULER_PTR;
            if sched.tasks[id].waiting_on == WaitTarget::None {
                true
            } else {
                sched.wait_list_remove(&mut sem.waiters, id);
                sched.tasks[id].waiting_on = WaitTarget::None;
                false
            }
        });
        assert!(!granted, "a tick-driven timeout must not look like a grant to the waiter");
        assert!(sem.waiters.is_empty());
    }
}
