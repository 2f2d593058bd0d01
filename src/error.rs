//! # Error and status types
//!
//! Every fallible kernel operation returns a concrete, local value — there
//! is no panic-based error propagation anywhere in the hot paths. These
//! enums are the vocabulary shared across modules.

/// Failure reasons for [`crate::kernel::create_task`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskCreateError {
    /// The task table already holds `MAX_TASKS` entries.
    CapacityExceeded,
    /// `priority` is greater than `HIGHEST_PRIORITY`.
    InvalidPriority,
}

/// Outcome of a queue `send`/`receive` attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueStatus {
    /// The item was transferred (copied into the ring, or handed directly
    /// to a waiter).
    Ok,
    /// `send` found the queue full and the caller asked for a non-blocking
    /// or already-expired attempt.
    Full,
    /// `receive` found the queue empty under the same conditions.
    Empty,
    /// The blocking wait's timeout elapsed before the transfer completed.
    Timeout,
    /// Invalid argument: nil handle, nil buffer, zero capacity/item size,
    /// or an ISR variant called on a queue that isn't ISR-enabled.
    Error,
}

/// Failure reasons for heap-backed object creation (`queue::create`,
/// `heap::alloc`). Mutex unlock-by-non-owner is a silent no-op rather
/// than a returned error (§7), so there is no variant for it here;
/// queues, semaphores, and mutexes are heap- or statically-placed
/// objects with no central table to exhaust, matching
/// `original_source/`'s own `rtos_config.h`, which defines
/// `MAX_QUEUES`/`MAX_SEMAPHORES`/`MAX_MUTEXES` but never enforces them
/// against a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// No sufficiently large free block exists in the heap arena.
    OutOfMemory,
    /// `item_size` or `capacity` was zero.
    InvalidArgument,
}
