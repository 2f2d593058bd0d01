//! # Scheduler
//!
//! Fixed-capacity, priority-preemptive scheduler. At every tick (driven by
//! the port's tick timer, nominally 1 kHz) timed-out blocked tasks are woken
//! and the ready-selection policy is re-run: the strictly-greatest-priority
//! runnable task wins, ties are broken by keeping whichever task is already
//! running, and if none of the tied tasks is currently running the lowest
//! task index wins. There is no time-slicing between equal-priority tasks —
//! a task holds the CPU until it blocks, is preempted by something strictly
//! higher priority, or the system is stopped.
//!
//! Task identity is the TCB's index into the static table; ids are never
//! recycled within a single boot (slots are reused but the check that
//! matters — priority and active-ness — is driven off the stored state, not
//! the id).

use crate::config::{HIGHEST_PRIORITY, MAX_TASKS, STACK_SIZE};
use crate::error::TaskCreateError;
use crate::task::{TaskControlBlock, TaskEntry, TaskState, WaitTarget};

// ---------------------------------------------------------------------------
// Intrusive wait list
// ---------------------------------------------------------------------------

/// A FIFO list of blocked tasks, chained through each TCB's own `next`
/// field. Used by the semaphore and mutex (the queue uses its own fixed
/// arrays instead — see `crate::queue`). Holding only head/tail indices
/// here (rather than the links themselves) lets a `WaitList` live cheaply
/// inside a `Semaphore`/`Mutex` while the actual link storage lives in the
/// scheduler's task table, which is the only thing with mutable access to
/// every TCB at once.
#[derive(Clone, Copy)]
pub(crate) struct WaitList {
    head: Option<usize>,
    tail: Option<usize>,
}

impl WaitList {
    pub(crate) const fn new() -> Self {
        Self {
            head: None,
            tail: None,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.head.is_none()
    }
}

// ---------------------------------------------------------------------------
// Scheduler struct
// ---------------------------------------------------------------------------

/// The central scheduler state: every TCB, the currently running task, and
/// the monotonic tick count. Stored as a single global in `kernel.rs`.
pub struct Scheduler {
    /// Fixed-size TCB table.
    pub(crate) tasks: [TaskControlBlock; MAX_TASKS],

    /// Index of the currently running task. Meaningless until `task_count > 0`.
    pub(crate) current_task: usize,

    /// Number of allocated TCB slots.
    pub(crate) task_count: usize,

    /// Ticks elapsed since `start()`.
    pub(crate) tick_count: u64,

    /// Set when the ready-selection outcome no longer matches the running
    /// task; the port layer checks this after `tick()` to decide whether to
    /// request a deferred context switch.
    pub(crate) needs_reschedule: bool,
}

impl Scheduler {
    /// A scheduler with no tasks registered.
    pub const fn new() -> Self {
        Self {
            tasks: [TaskControlBlock::EMPTY; MAX_TASKS],
            current_task: 0,
            task_count: 0,
            tick_count: 0,
            needs_reschedule: false,
        }
    }

    /// Register a new task.
    ///
    /// The task starts in `Ready` state with a fully initialized stack
    /// frame so the first context switch into it looks like any other.
    pub fn create_task(
        &mut self,
        entry: TaskEntry,
        arg: *mut (),
        priority: u8,
        name: &'static str,
    ) -> Result<usize, TaskCreateError> {
        if priority > HIGHEST_PRIORITY {
            return Err(TaskCreateError::InvalidPriority);
        }
        if self.task_count >= MAX_TASKS {
            return Err(TaskCreateError::CapacityExceeded);
        }

        let id = self.task_count;
        self.tasks[id].init(entry, arg, priority, name);
        init_task_stack(&mut self.tasks[id], entry, arg);
        self.task_count += 1;

        defmt::info!("task {=usize} '{=str}' created at priority {=u8}", id, name, priority);
        Ok(id)
    }

    /// Called by the port's tick timer handler, nominally at 1 kHz.
    ///
    /// Counts down every blocked task's timeout, waking (and unlinking)
    /// any that reach zero, then re-runs ready-selection. Returns whether
    /// the outcome differs from the currently running task — the port
    /// layer uses this to decide whether to request a deferred switch.
    pub fn tick(&mut self) -> bool {
        self.tick_count += 1;

        for id in 0..self.task_count {
            if !self.tasks[id].active || self.tasks[id].state != TaskState::Blocked {
                continue;
            }
            if self.tasks[id].blocked_timeout == 0 {
                continue; // 0 means "wait indefinitely"
            }
            self.tasks[id].blocked_timeout -= 1;
            if self.tasks[id].blocked_timeout == 0 {
                self.timeout_task(id);
            }
        }

        let next = self.select_next();
        self.needs_reschedule = next != self.current_task || self.tasks[next].state != TaskState::Running;
        self.needs_reschedule
    }

    /// Unlink a timed-out task from whatever primitive it was blocked on
    /// and make it runnable again.
    ///
    /// Deliberately leaves `waiting_on` set to the primitive rather than
    /// clearing it: that field is the only signal the resumed caller
    /// (`Semaphore::wait`, `Mutex::lock`, `Queue::finish`) has to tell a
    /// timeout apart from a grant, since a grant clears `waiting_on` to
    /// `None` before resuming. The caller clears it once it has observed
    /// and acted on the non-`None` value.
    fn timeout_task(&mut self, id: usize) {
        match self.tasks[id].waiting_on {
            WaitTarget::Semaphore(ptr) => unsafe { (*ptr).cancel_wait(self, id) },
            WaitTarget::Mutex(ptr) => unsafe { (*ptr).cancel_wait(self, id) },
            WaitTarget::QueueSend(ptr) => unsafe { (*ptr).cancel_send_wait(id) },
            WaitTarget::QueueReceive(ptr) => unsafe { (*ptr).cancel_receive_wait(id) },
            WaitTarget::None => {}
        }
        defmt::warn!("task {=usize} timed out waiting", id);
        self.tasks[id].state = TaskState::Ready;
        self.tasks[id].blocked_timeout = 0;
    }

    /// Block the currently running task on `target` for up to
    /// `timeout_ticks` ticks (`0` = wait indefinitely). Returns the
    /// blocked task's id so the caller can link it into a wait list.
    pub(crate) fn block_current(&mut self, timeout_ticks: u32, target: WaitTarget) -> usize {
        let id = self.current_task;
        self.tasks[id].state = TaskState::Blocked;
        self.tasks[id].blocked_timeout = timeout_ticks;
        self.tasks[id].waiting_on = target;
        self.needs_reschedule = true;
        id
    }

    /// Make a blocked task runnable again. The caller is responsible for
    /// having already unlinked it from any wait list it was on.
    pub(crate) fn resume(&mut self, id: usize) {
        if id < self.task_count && self.tasks[id].state == TaskState::Blocked {
            self.tasks[id].state = TaskState::Ready;
            self.tasks[id].waiting_on = WaitTarget::None;
            self.tasks[id].blocked_timeout = 0;
            self.needs_reschedule = true;
        }
    }

    /// Index of the currently running task.
    pub(crate) fn current_task_id(&self) -> usize {
        self.current_task
    }

    /// Ready-selection: strictly-greatest priority wins; ties prefer the
    /// already-running task, then the lowest index.
    fn select_next(&self) -> usize {
        let current = self.current_task;
        let current_eligible = current < self.task_count
            && self.tasks[current].active
            && matches!(self.tasks[current].state, TaskState::Running | TaskState::Ready);

        let mut best = if current_eligible { Some(current) } else { None };
        let mut best_priority = if current_eligible {
            self.tasks[current].priority
        } else {
            0
        };

        for i in 0..self.task_count {
            if i == current || !self.tasks[i].is_ready() {
                continue;
            }
            let p = self.tasks[i].priority;
            if best.is_none() || p > best_priority {
                best = Some(i);
                best_priority = p;
            }
            // Equal priority never displaces an earlier-chosen candidate —
            // this is what gives ties to the running task, then to the
            // lowest index among the rest.
        }

        best.unwrap_or(0)
    }

    /// Run ready-selection and perform the resulting state transition.
    /// Called from the port's context-switch handler; returns the index
    /// of the task to switch to.
    pub(crate) fn schedule(&mut self) -> usize {
        let next = self.select_next();
        let prev = self.current_task;

        if prev < self.task_count && self.tasks[prev].state == TaskState::Running {
            self.tasks[prev].state = TaskState::Ready;
        }
        if next < self.task_count {
            self.tasks[next].state = TaskState::Running;
        }

        self.current_task = next;
        self.needs_reschedule = false;
        next
    }

    /// Link `id` onto the tail of `list`.
    pub(crate) fn wait_list_push_back(&mut self, list: &mut WaitList, id: usize) {
        self.tasks[id].next = None;
        match list.tail {
            Some(t) => self.tasks[t].next = Some(id),
            None => list.head = Some(id),
        }
        list.tail = Some(id);
    }

    /// Unlink and return the head of `list`, if any.
    pub(crate) fn wait_list_pop_front(&mut self, list: &mut WaitList) -> Option<usize> {
        let head = list.head?;
        list.head = self.tasks[head].next;
        if list.head.is_none() {
            list.tail = None;
        }
        self.tasks[head].next = None;
        Some(head)
    }

    /// Unlink `id` from `list` wherever it sits, if it's on the list at all.
    /// Used when a blocked wait times out.
    pub(crate) fn wait_list_remove(&mut self, list: &mut WaitList, id: usize) {
        let mut prev: Option<usize> = None;
        let mut cur = list.head;
        while let Some(c) = cur {
            if c == id {
                let next = self.tasks[c].next;
                match prev {
                    Some(p) => self.tasks[p].next = next,
                    None => list.head = next,
                }
                if list.tail == Some(c) {
                    list.tail = prev;
                }
                self.tasks[c].next = None;
                return;
            }
            prev = Some(c);
            cur = self.tasks[c].next;
        }
    }
}

// ---------------------------------------------------------------------------
// Stack initialization
// ---------------------------------------------------------------------------

/// Build the initial exception frame for a not-yet-run task so that the
/// first context switch into it is indistinguishable from a normal
/// PendSV return.
///
/// ## Stack layout (top = high address, growing down)
///
/// ```text
/// [hardware-stacked frame]   <- initial stack_pointer points here
///   xPSR  (0x0100_0000, Thumb bit set)
///   PC    (task entry point)
///   LR    (0xFFFFFFFD — thread mode, PSP, no FP state)
///   R12   (0)
///   R3    (0)
///   R2    (0)
///   R1    (0)
///   R0    (task argument)
/// [software-saved context]
///   R11..R4 (0)
/// ```
fn init_task_stack(tcb: &mut TaskControlBlock, entry: TaskEntry, arg: *mut ()) {
    let frame_start = STACK_SIZE - 16;

    for reg in &mut tcb.stack[frame_start..frame_start + 8] {
        *reg = 0; // R4..R11
    }
    tcb.stack[frame_start + 8] = arg as u32; // R0 — task argument
    tcb.stack[frame_start + 9] = 0; // R1
    tcb.stack[frame_start + 10] = 0; // R2
    tcb.stack[frame_start + 11] = 0; // R3
    tcb.stack[frame_start + 12] = 0; // R12
    tcb.stack[frame_start + 13] = 0xFFFF_FFFD; // LR
    tcb.stack[frame_start + 14] = entry as usize as u32; // PC
    tcb.stack[frame_start + 15] = 0x0100_0000; // xPSR

    tcb.stack_pointer = &mut tcb.stack[frame_start] as *mut u32;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semaphore::Semaphore;

    extern "C" fn dummy(_arg: *mut ()) -> ! {
        loop {}
    }

    fn new_task(sched: &mut Scheduler, priority: u8, name: &'static str) -> usize {
        sched.create_task(dummy, core::ptr::null_mut(), priority, name).unwrap()
    }

    #[test]
    fn create_task_assigns_sequential_ids() {
        let mut sched = Scheduler::new();
        let a = new_task(&mut sched, 1, "a");
        let b = new_task(&mut sched, 1, "b");
        assert_eq!(a, 0);
        assert_eq!(b, 1);
        assert_eq!(sched.task_count, 2);
    }

    #[test]
    fn create_task_rejects_out_of_range_priority() {
        let mut sched = Scheduler::new();
        let err = sched
            .create_task(dummy, core::ptr::null_mut(), HIGHEST_PRIORITY + 1, "bad")
            .unwrap_err();
        assert_eq!(err, TaskCreateError::InvalidPriority);
    }

    #[test]
    fn create_task_rejects_when_full() {
        let mut sched = Scheduler::new();
        for i in 0..MAX_TASKS {
            assert!(sched.create_task(dummy, core::ptr::null_mut(), 0, "t").is_ok(), "{i}");
        }
        let err = sched
            .create_task(dummy, core::ptr::null_mut(), 0, "overflow")
            .unwrap_err();
        assert_eq!(err, TaskCreateError::CapacityExceeded);
    }

    #[test]
    fn schedule_picks_strictly_highest_priority() {
        let mut sched = Scheduler::new();
        new_task(&mut sched, 2, "low");
        let high = new_task(&mut sched, 5, "high");
        let chosen = sched.schedule();
        assert_eq!(chosen, high);
        assert_eq!(sched.tasks[high].state, TaskState::Running);
    }

    #[test]
    fn schedule_tie_break_prefers_running_task() {
        let mut sched = Scheduler::new();
        let a = new_task(&mut sched, 3, "a");
        let b = new_task(&mut sched, 3, "b");
        sched.tasks[a].state = TaskState::Running;
        sched.current_task = a;
        let chosen = sched.schedule();
        assert_eq!(chosen, a, "equal-priority tie must not bump the running task");
        let _ = b;
    }

    #[test]
    fn schedule_tie_break_falls_back_to_lowest_index() {
        let mut sched = Scheduler::new();
        let a = new_task(&mut sched, 3, "a");
        let _b = new_task(&mut sched, 3, "b");
        // current task is blocked, so it's not eligible to win the tie.
        sched.tasks[sched.current_task].state = TaskState::Blocked;
        let chosen = sched.schedule();
        assert_eq!(chosen, a);
    }

    #[test]
    fn tick_wakes_task_whose_timeout_expires() {
        let mut sched = Scheduler::new();
        let id = new_task(&mut sched, 1, "waiter");
        sched.current_task = id;
        sched.tasks[id].state = TaskState::Blocked;
        sched.tasks[id].blocked_timeout = 2;

        sched.tick();
        assert_eq!(sched.tasks[id].state, TaskState::Blocked);
        sched.tick();
        assert_eq!(sched.tasks[id].state, TaskState::Ready);
    }

    #[test]
    fn tick_driven_timeout_leaves_waiting_on_set_for_the_caller_to_observe() {
        // `Semaphore::wait`/`Mutex::lock`/`Queue::finish` all resume and
        // then test `waiting_on == WaitTarget::None` to tell a grant (which
        // clears it) apart from a timeout. If `timeout_task` cleared it
        // too, every one of those calls would misreport a timeout as a
        // grant — this is the exact bug that was fixed here.
        let mut sched = Scheduler::new();
        let id = new_task(&mut sched, 1, "waiter");
        sched.current_task = id;
        let mut sem = Semaphore::new(0);
        sched.block_current(2, WaitTarget::Semaphore(&mut sem as *mut Semaphore));

        sched.tick();
        assert_eq!(sched.tasks[id].state, TaskState::Blocked);
        sched.tick();
        assert_eq!(sched.tasks[id].state, TaskState::Ready);
        assert_ne!(
            sched.tasks[id].waiting_on,
            WaitTarget::None,
            "a tick-driven timeout must not look like a grant to the resumed waiter"
        );
    }

    #[test]
    fn tick_never_counts_down_an_indefinite_wait() {
        let mut sched = Scheduler::new();
        let id = new_task(&mut sched, 1, "waiter");
        sched.tasks[id].state = TaskState::Blocked;
        sched.tasks[id].blocked_timeout = 0;
        for _ in 0..10 {
            sched.tick();
        }
        assert_eq!(sched.tasks[id].state, TaskState::Blocked);
    }

    #[test]
    fn wait_list_push_pop_is_fifo() {
        let mut sched = Scheduler::new();
        let a = new_task(&mut sched, 0, "a");
        let b = new_task(&mut sched, 0, "b");
        let c = new_task(&mut sched, 0, "c");
        let mut list = WaitList::new();
        sched.wait_list_push_back(&mut list, a);
        sched.wait_list_push_back(&mut list, b);
        sched.wait_list_push_back(&mut list, c);

        assert_eq!(sched.wait_list_pop_front(&mut list), Some(a));
        assert_eq!(sched.wait_list_pop_front(&mut list), Some(b));
        assert_eq!(sched.wait_list_pop_front(&mut list), Some(c));
        assert_eq!(sched.wait_list_pop_front(&mut list), None);
        assert!(list.is_empty());
    }

    #[test]
    fn wait_list_remove_from_middle_preserves_order() {
        let mut sched = Scheduler::new();
        let a = new_task(&mut sched, 0, "a");
        let b = new_task(&mut sched, 0, "b");
        let c = new_task(&mut sched, 0, "c");
        let mut list = WaitList::new();
        sched.wait_list_push_back(&mut list, a);
        sched.wait_list_push_back(&mut list, b);
        sched.wait_list_push_back(&mut list, c);

        sched.wait_list_remove(&mut list, b);
        assert_eq!(sched.wait_list_pop_front(&mut list), Some(a));
        assert_eq!(sched.wait_list_pop_front(&mut list), Some(c));
        assert!(list.is_empty());
    }
}
