//! # Kernel Configuration
//!
//! Compile-time constants governing task, memory, and timing limits.
//! All limits are fixed at compile time — no dynamic resizing.

/// Maximum number of tasks the scheduler can manage simultaneously.
/// This bounds the static TCB array. Increase with care — each task
/// consumes `STACK_SIZE` words of RAM for its stack alone.
pub const MAX_TASKS: usize = 32;

/// Per-task stack size, in machine words (`u32`s), not bytes.
pub const STACK_SIZE: usize = 1024;

/// Heap arena size in bytes, backing [`crate::heap::alloc`]/[`crate::heap::free`].
pub const HEAP_SIZE: usize = 32 * 1024;

/// Maximum number of queues that may exist at once.
pub const MAX_QUEUES: usize = 16;

/// Maximum number of semaphores that may exist at once.
pub const MAX_SEMAPHORES: usize = 16;

/// Maximum number of mutexes that may exist at once.
pub const MAX_MUTEXES: usize = 16;

/// Lowest legal task priority. Higher numeric value means more urgent.
pub const LOWEST_PRIORITY: u8 = 0;

/// Highest legal task priority.
pub const HIGHEST_PRIORITY: u8 = 7;

/// Scheduler tick rate, in Hz. The port's tick timer is configured to
/// fire this often; each fire calls [`crate::kernel::tick`].
pub const TICKS_PER_SECOND: u32 = 1000;

/// Maximum number of tasks that may be queued on one side of a queue's
/// wait lists (senders or receivers). Matches `MAX_TASKS` since a task
/// can only ever occupy one waiter slot at a time.
pub const MAX_QUEUE_WAITERS: usize = MAX_TASKS;

/// System clock frequency in Hz, used to derive the SysTick reload value
/// for [`TICKS_PER_SECOND`]. Default matches an STM32F4 at its 16 MHz HSI.
pub const SYSTEM_CLOCK_HZ: u32 = 16_000_000;
