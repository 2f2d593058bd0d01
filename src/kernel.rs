//! # Kernel
//!
//! Top-level initialization and the public call surface. Owns the global
//! scheduler singleton and wires the two timing-critical exception
//! handlers (`SysTick`, `PendSV`, in `arch::cortex_m4`) to it via a raw
//! pointer — everything else in the crate (semaphore, mutex, queue)
//! reaches the scheduler the same way, always from inside a critical
//! section.
//!
//! ## Startup sequence
//!
//! ```text
//! reset_handler (cortex-m-rt)
//!   └─► main()
//!         ├─► kernel::init()        ← zero the scheduler singleton
//!         ├─► kernel::create_task() ← register tasks (×N)
//!         └─► kernel::start()       ← launch the tick timer, never returns
//! ```

use crate::error::TaskCreateError;
use crate::scheduler::Scheduler;
use crate::sync;
use crate::task::TaskEntry;

/// Global scheduler instance. All access is through `SCHEDULER_PTR`, from
/// within a critical section or ISR context.
static mut SCHEDULER: Scheduler = Scheduler::new();

/// Raw pointer to the global scheduler, set once by `init()`. The arch
/// port's exception handlers and every synchronization primitive
/// dereference this directly rather than threading a reference through —
/// there is exactly one scheduler for the process lifetime, so a global
/// is the honest representation.
///
/// # Safety
/// Null until `init()` runs; every dereference happens from inside
/// `sync::critical_section` or from ISR context, both of which already
/// serialize access.
#[no_mangle]
pub static mut SCHEDULER_PTR: *mut Scheduler = core::ptr::null_mut();

/// Initialize the kernel. Must be called exactly once, before any other
/// kernel function, and before the scheduler starts.
pub fn init() {
    unsafe {
        SCHEDULER = Scheduler::new();
        SCHEDULER_PTR = &mut SCHEDULER as *mut Scheduler;
    }
}

/// Register a new task. See [`crate::scheduler::Scheduler::create_task`].
pub fn create_task(
    entry: TaskEntry,
    arg: *mut (),
    priority: u8,
    name: &'static str,
) -> Result<usize, TaskCreateError> {
    sync::critical_section(|| unsafe { (*SCHEDULER_PTR).create_task(entry, arg, priority, name) })
}

/// The currently running task's id.
pub fn current_task_id() -> usize {
    sync::critical_section(|| unsafe { (*SCHEDULER_PTR).current_task_id() })
}

/// Make a blocked task runnable again from task or ISR context. Idempotent.
pub fn resume(task_id: usize) {
    sync::critical_section(|| unsafe { (*SCHEDULER_PTR).resume(task_id) });
    request_switch();
}

/// Request a deferred context switch through the arch port. On target
/// this sets the real PendSV pending bit; off-target (`arch::host`) it
/// just increments a counter the test harness can observe, since there's
/// no real NVIC to preempt anything.
pub(crate) fn request_switch() {
    #[cfg(target_arch = "arm")]
    crate::arch::cortex_m4::trigger_pendsv();
    #[cfg(not(target_arch = "arm"))]
    crate::arch::host::trigger_pendsv();
}

#[cfg(target_arch = "arm")]
mod start_arm {
    use super::*;
    use crate::arch::cortex_m4;

    /// Start the scheduler. **Does not return.** Requires at least one
    /// task to have been created.
    ///
    /// Configures the tick timer, sets the tick/switch exceptions to the
    /// lowest interrupt priority (so neither ever preempts an
    /// application ISR), picks the highest-priority ready task, and
    /// transfers control to it via the first-task entry sequence.
    pub fn start(mut core_peripherals: cortex_m::Peripherals) -> ! {
        cortex_m4::configure_systick(&mut core_peripherals.SYST);
        cortex_m4::set_interrupt_priorities();

        let first_sp = sync::critical_section(|| unsafe {
            let scheduler = &mut *SCHEDULER_PTR;
            if scheduler.task_count == 0 {
                loop {
                    cortex_m::asm::wfi();
                }
            }
            let first = scheduler.schedule();
            scheduler.tasks[first].stack_pointer as *const u32
        });

        defmt::info!("scheduler starting");
        unsafe { cortex_m4::start_first_task(first_sp) };
    }
}

#[cfg(target_arch = "arm")]
pub use start_arm::start;

/// Host stand-in for `start()`: there's no real tick timer or PendSV to
/// wire up off-target, so this just runs `schedule()` once and returns
/// the chosen task id, for tests that want to exercise `kernel::init` →
/// `create_task` → `start` without a board.
#[cfg(not(target_arch = "arm"))]
pub fn start() -> usize {
    sync::critical_section(|| unsafe { (*SCHEDULER_PTR).schedule() })
}

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn dummy(_arg: *mut ()) -> ! {
        loop {}
    }

    #[test]
    fn init_then_create_task_then_start_picks_highest_priority() {
        init();
        create_task(dummy, core::ptr::null_mut(), 2, "low").unwrap();
        let high = create_task(dummy, core::ptr::null_mut(), 6, "high").unwrap();
        let chosen = start();
        assert_eq!(chosen, high);
        assert_eq!(current_task_id(), high);
    }
}
