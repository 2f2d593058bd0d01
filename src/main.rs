//! # Kernel Demo Firmware
//!
//! Four tasks exercising the three IPC primitives end to end:
//!
//! | Task | Priority | Demonstrates |
//! |------|----------|--------------|
//! | `event_source_task` | 3 | periodic `Semaphore::signal` |
//! | `high_priority_responder` | 6 | preemptive wake via `Semaphore::wait` |
//! | `producer_task` | 4 | blocking `Queue::send` into a bounded ring |
//! | `consumer_task` | 2 | blocking `Queue::receive`, mutex-guarded shared state |
//!
//! `high_priority_responder` outranks every other task, so each time
//! `event_source_task` signals the semaphore it preempts immediately —
//! the same dynamic `spec.md` §8 scenario 1 describes.

#![no_std]
#![no_main]

use cortex_m_rt::entry;
use panic_halt as _;

use flexos::kernel;
use flexos::mutex::Mutex;
use flexos::queue::Queue;
use flexos::semaphore::Semaphore;

// ---------------------------------------------------------------------------
// Shared kernel objects
// ---------------------------------------------------------------------------

/// Signaled by `event_source_task`, waited on by `high_priority_responder`.
static mut EVENT_SEM: Semaphore = Semaphore::new(0);

/// Guards `SHARED_TOTAL` against concurrent updates from the consumer and
/// (in a fuller application) any other task that tallies received items.
static mut TOTAL_MUTEX: Mutex = Mutex::new();
static mut SHARED_TOTAL: u32 = 0;

/// Set by `main` once the queue is created; tasks reach it through their
/// `arg` pointer rather than a second global, since `Queue`'s handle is
/// itself a heap pointer.
fn event_sem() -> &'static mut Semaphore {
    unsafe { &mut *core::ptr::addr_of_mut!(EVENT_SEM) }
}

fn total_mutex() -> &'static mut Mutex {
    unsafe { &mut *core::ptr::addr_of_mut!(TOTAL_MUTEX) }
}

// ---------------------------------------------------------------------------
// Task entry points
// ---------------------------------------------------------------------------

/// Periodic event source (priority 3). Simulates sensor sampling: does a
/// little work, then signals `EVENT_SEM` once per period.
extern "C" fn event_source_task(_arg: *mut ()) -> ! {
    loop {
        let mut busy: u32 = 0;
        for _ in 0..5_000 {
            busy = busy.wrapping_add(1);
        }
        let _ = busy;
        event_sem().signal();
    }
}

/// The system's highest-priority task. Blocks indefinitely on
/// `EVENT_SEM`; the scheduler preempts whatever is running the instant
/// `signal()` hands it the wakeup, services the event, then waits again.
extern "C" fn high_priority_responder(_arg: *mut ()) -> ! {
    loop {
        if event_sem().wait(0) {
            let mut work: u32 = 0;
            for _ in 0..500 {
                work = work.wrapping_add(1);
            }
            let _ = work;
        }
    }
}

/// Sends an incrementing counter into the queue passed as `arg`, blocking
/// up to 100 ticks if it's full.
extern "C" fn producer_task(arg: *mut ()) -> ! {
    let queue = arg as *mut Queue;
    let mut next: u32 = 0;
    loop {
        let item = next;
        unsafe {
            (*queue).send(&item as *const u32 as *const u8, 100);
        }
        next = next.wrapping_add(1);
    }
}

/// Drains the same queue, blocking up to 100 ticks if it's empty, and
/// tallies what it receives under `TOTAL_MUTEX`.
extern "C" fn consumer_task(arg: *mut ()) -> ! {
    let queue = arg as *mut Queue;
    loop {
        let mut item: u32 = 0;
        let status = unsafe { (*queue).receive(&mut item as *mut u32 as *mut u8, 100) };
        if status == flexos::error::QueueStatus::Ok {
            total_mutex().lock(0);
            unsafe {
                SHARED_TOTAL = SHARED_TOTAL.wrapping_add(item);
            }
            total_mutex().unlock();
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[entry]
fn main() -> ! {
    let cp = cortex_m::Peripherals::take().unwrap();

    kernel::init();

    let queue = Queue::create(core::mem::size_of::<u32>(), 4).expect("queue allocation failed");

    kernel::create_task(event_source_task, core::ptr::null_mut(), 3, "event_source")
        .expect("failed to create event_source_task");
    kernel::create_task(high_priority_responder, core::ptr::null_mut(), 6, "responder")
        .expect("failed to create high_priority_responder");
    kernel::create_task(producer_task, queue as *mut (), 4, "producer")
        .expect("failed to create producer_task");
    kernel::create_task(consumer_task, queue as *mut (), 2, "consumer")
        .expect("failed to create consumer_task");

    kernel::start(cp)
}
