//! # A fixed-capacity preemptive kernel core for Cortex-M
//!
//! A small real-time kernel core for a single-core Cortex-M microcontroller:
//! a priority-preemptive scheduler driven by a periodic tick, a deferred
//! context switch through PendSV, a best-fit heap allocator, and the
//! blocking synchronization/IPC primitives (semaphores, recursive mutexes,
//! bounded message queues) built on top of it.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                    Application Tasks                    │
//! ├────────────────────────────────────────────────────────┤
//! │                 Kernel API (kernel.rs)                  │
//! │       init() · create_task() · start() · resume()      │
//! ├──────────────┬───────────────┬───────────────┬────────┤
//! │  Scheduler   │  Semaphore /  │     Queue      │  Heap  │
//! │  scheduler.rs│  Mutex        │   queue.rs     │ heap.rs│
//! │  ─ tick()    │  semaphore.rs │  ─ ring buffer │        │
//! │  ─ schedule()│  mutex.rs     │  ─ wait arrays │        │
//! ├──────────────┴───────────────┴───────────────┴────────┤
//! │              Task Model (task.rs)                       │
//! │        TCB · TaskState · WaitTarget                     │
//! ├────────────────────────────────────────────────────────┤
//! │         Arch Port (arch/cortex_m4.rs, arch/host.rs)      │
//! │    PendSV · SysTick · Context Switch · Stack Init       │
//! ├────────────────────────────────────────────────────────┤
//! │         ARM Cortex-M4 Hardware (Thumb-2)                 │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency model
//!
//! Exactly one task runs at a time. A task suspends only inside
//! `Scheduler::block_current`, reached from `Semaphore::wait`,
//! `Mutex::lock`, `Queue::send`/`send_to_front`, and `Queue::receive` when
//! their fast path is unavailable and the caller passed a nonzero
//! timeout. All shared kernel state — the scheduler's task table, every
//! primitive's wait list, the heap's free list — is protected by a single
//! global critical section (`sync::critical_section`), which disables
//! interrupts for its duration. ISR-callable operations (`*_from_isr`,
//! `resume`, the tick handler) already run with interrupts disabled by
//! virtue of exception entry.
//!
//! Priority inheritance is **not implemented** — see `Mutex`'s docs and
//! `DESIGN.md` for the resulting unbounded-priority-inversion hazard.
//!
//! ## Memory model
//!
//! - Every task's stack is embedded in its `TaskControlBlock`, statically
//!   sized at `config::STACK_SIZE` words — no stack migrates once created.
//! - Kernel objects created after boot (queues; semaphores/mutexes may
//!   also be heap-allocated) come from a single fixed-size arena
//!   (`config::HEAP_SIZE`) managed by `heap`.
//! - No `alloc` crate: the allocator here is purpose-built for kernel
//!   objects, not a general-purpose global allocator.

#![cfg_attr(not(test), no_std)]

pub mod arch;
pub mod config;
pub mod error;
pub mod heap;
pub mod kernel;
pub mod mutex;
pub mod queue;
pub mod scheduler;
pub mod semaphore;
pub mod sync;
pub mod task;
