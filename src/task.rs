//! # Task Control Block
//!
//! Defines the per-task kernel data structure and the task state machine.
//! TCBs are stored inline in the scheduler's static array — no heap
//! allocation, no dynamic deletion.

use crate::config::STACK_SIZE;
use crate::mutex::Mutex;
use crate::queue::Queue;
use crate::semaphore::Semaphore;

// ---------------------------------------------------------------------------
// Task state machine
// ---------------------------------------------------------------------------

/// Execution state of a task.
///
/// ```text
///   ┌──────────┐   schedule picks it   ┌─────────┐
///   │  Ready   │ ─────────────────────►│ Running │
///   └──────────┘                       └─────────┘
///        ▲                                  │
///        │        resume()                  │ block_current()
///        └──────────────────────────────┌────┘
///                                        ▼
///                                  ┌──────────┐
///                                  │ Blocked  │
///                                  └──────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Runnable, waiting for the scheduler to pick it.
    Ready,
    /// Currently executing on the CPU. Exactly one task holds this state
    /// at a time, once the scheduler has started.
    Running,
    /// Blocked on a synchronization primitive or a timeout.
    Blocked,
    /// Not schedulable. Reserved for future use by application code;
    /// the kernel itself never places a task into this state.
    Suspended,
}

// ---------------------------------------------------------------------------
// Task entry point
// ---------------------------------------------------------------------------

/// Signature for a task's entry function. Tasks never return.
pub type TaskEntry = extern "C" fn(arg: *mut ()) -> !;

// ---------------------------------------------------------------------------
// Wait-list back-reference
// ---------------------------------------------------------------------------

/// Identifies the primitive a [`TaskControlBlock`] is currently blocked on.
///
/// `None` if the task isn't linked into any primitive's wait list. Tagged
/// by primitive kind (rather than an untyped pointer) so that
/// [`crate::scheduler::Scheduler::tick`] can unlink a timed-out task from
/// whichever wait list holds it without any primitive needing to register
/// itself anywhere else.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaitTarget {
    None,
    Semaphore(*mut Semaphore),
    Mutex(*mut Mutex),
    /// Blocked inside `queue::send`/`queue::send_to_front`.
    QueueSend(*mut Queue),
    /// Blocked inside `queue::receive`.
    QueueReceive(*mut Queue),
}

impl Default for WaitTarget {
    fn default() -> Self {
        WaitTarget::None
    }
}

// Safety: the raw pointers in `WaitTarget` only ever point at statically
// placed or heap-allocated kernel objects that outlive the tasks blocked on
// them, and are only ever dereferenced from within a critical section.
unsafe impl Send for WaitTarget {}

// ---------------------------------------------------------------------------
// Task Control Block
// ---------------------------------------------------------------------------

/// Task Control Block (TCB) — the central per-task kernel object.
///
/// The stack is embedded so the whole TCB table can be one static array
/// with no heap involvement. `#[repr(align(8))]` on the struct, with
/// `stack` as the first field, guarantees the stack buffer lands on an
/// 8-byte boundary, as required by the Arm AAPCS.
#[repr(align(8))]
pub struct TaskControlBlock {
    /// Per-task stack memory, full-descending.
    pub(crate) stack: [u32; STACK_SIZE],

    /// Saved stack pointer. Valid (points into `stack`) whenever the task
    /// is not RUNNING; updated by the context-switch exception while the
    /// task is suspended.
    pub(crate) stack_pointer: *mut u32,

    /// Current execution state.
    pub(crate) state: TaskState,

    /// Static priority, `[LOWEST_PRIORITY, HIGHEST_PRIORITY]`.
    pub(crate) priority: u8,

    /// Remaining ticks until a timed block expires. `0` while `BLOCKED`
    /// means "wait indefinitely"; the tick handler only counts down
    /// strictly positive values.
    pub(crate) blocked_timeout: u32,

    /// Entry function, `None` for an unallocated slot.
    pub(crate) entry: Option<TaskEntry>,

    /// Opaque argument passed to `entry`.
    pub(crate) arg: *mut (),

    /// Debug name, borrowed for the task's lifetime.
    pub(crate) name: &'static str,

    /// Back-reference to the primitive this task is blocked on.
    pub(crate) waiting_on: WaitTarget,

    /// Forward link used to chain this TCB onto exactly one wait list.
    /// `None` when not linked into any list.
    pub(crate) next: Option<usize>,

    /// Whether this slot holds a live task.
    pub(crate) active: bool,
}

// Safety: `stack_pointer` and `arg` are raw pointers, but all TCB access
// happens from within a critical section (see `crate::sync`), and
// `stack_pointer` always points into this TCB's own `stack` array.
unsafe impl Send for TaskControlBlock {}
unsafe impl Sync for TaskControlBlock {}

impl TaskControlBlock {
    /// An empty (unallocated) TCB, used to fill the static array.
    pub const EMPTY: Self = Self {
        stack: [0u32; STACK_SIZE],
        stack_pointer: core::ptr::null_mut(),
        state: TaskState::Suspended,
        priority: 0,
        blocked_timeout: 0,
        entry: None,
        arg: core::ptr::null_mut(),
        name: "",
        waiting_on: WaitTarget::None,
        next: None,
        active: false,
    };

    /// Populate a free slot with a new task, ready to run.
    pub(crate) fn init(
        &mut self,
        entry: TaskEntry,
        arg: *mut (),
        priority: u8,
        name: &'static str,
    ) {
        self.state = TaskState::Ready;
        self.priority = priority;
        self.blocked_timeout = 0;
        self.entry = Some(entry);
        self.arg = arg;
        self.name = name;
        self.waiting_on = WaitTarget::None;
        self.next = None;
        self.active = true;
    }

    /// Whether this task is eligible for ready-selection.
    #[inline]
    pub(crate) fn is_ready(&self) -> bool {
        self.active && self.state == TaskState::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn dummy_entry(_arg: *mut ()) -> ! {
        loop {}
    }

    #[test]
    fn empty_tcb_is_inactive_and_suspended() {
        let tcb = TaskControlBlock::EMPTY;
        assert!(!tcb.active);
        assert_eq!(tcb.state, TaskState::Suspended);
        assert!(!tcb.is_ready());
    }

    #[test]
    fn init_marks_slot_active_and_ready() {
        let mut tcb = TaskControlBlock::EMPTY;
        tcb.init(dummy_entry, core::ptr::null_mut(), 5, "demo");
        assert!(tcb.active);
        assert_eq!(tcb.state, TaskState::Ready);
        assert_eq!(tcb.priority, 5);
        assert_eq!(tcb.name, "demo");
        assert!(tcb.is_ready());
    }

    #[test]
    fn ready_requires_both_active_and_ready_state() {
        let mut tcb = TaskControlBlock::EMPTY;
        tcb.state = TaskState::Ready;
        assert!(!tcb.is_ready(), "inactive slot must never be selected");
        tcb.active = true;
        assert!(tcb.is_ready());
        tcb.state = TaskState::Blocked;
        assert!(!tcb.is_ready());
    }

    #[test]
    fn wait_target_defaults_to_none() {
        assert!(matches!(WaitTarget::default(), WaitTarget::None));
    }
}
