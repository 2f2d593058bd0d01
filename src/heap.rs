//! # Heap Allocator
//!
//! Best-fit-by-smallest-suitable allocator over a single fixed byte array.
//! Free blocks form a singly linked list threaded through headers stored
//! inline in the arena (never off-heap), split on allocation when the
//! remainder is worth keeping, and coalesced with both neighbors on free.
//!
//! There is no external fragmentation bookkeeping beyond the free list
//! itself — `free_bytes()` walks it on demand, which is fine at this
//! scale (`HEAP_SIZE` bytes, checked rarely, never from a tick handler).

use crate::config::HEAP_SIZE;
use crate::error::KernelError;
use crate::sync;
use core::mem::size_of;

/// Minimum leftover (beyond a new header) required to bother splitting a
/// block rather than handing the whole thing over.
const MIN_SPLIT_REMAINDER: usize = 8;

#[derive(Clone, Copy)]
struct BlockHeader {
    /// Size of the data area following this header, in bytes. Always a
    /// multiple of 4.
    size: usize,
    is_free: bool,
    /// Byte offset (from the start of the arena) of the next block, or
    /// `None` at the end of the arena.
    next: Option<usize>,
}

const HEADER_SIZE: usize = size_of::<BlockHeader>();

pub struct Heap {
    arena: [u8; HEAP_SIZE],
    head: Option<usize>,
    initialized: bool,
    current_usage: usize,
    peak_usage: usize,
}

impl Heap {
    pub const fn new() -> Self {
        Self {
            arena: [0u8; HEAP_SIZE],
            head: None,
            initialized: false,
            current_usage: 0,
            peak_usage: 0,
        }
    }

    fn ensure_init(&mut self) {
        if self.initialized {
            return;
        }
        self.write_header(
            0,
            BlockHeader {
                size: HEAP_SIZE - HEADER_SIZE,
                is_free: true,
                next: None,
            },
        );
        self.head = Some(0);
        self.initialized = true;
    }

    fn read_header(&self, offset: usize) -> BlockHeader {
        unsafe { core::ptr::read_unaligned(self.arena.as_ptr().add(offset) as *const BlockHeader) }
    }

    fn write_header(&mut self, offset: usize, header: BlockHeader) {
        unsafe {
            core::ptr::write_unaligned(self.arena.as_mut_ptr().add(offset) as *mut BlockHeader, header)
        }
    }

    /// Allocate `size` bytes, returning a pointer into the arena on
    /// success. `None` if no free block is large enough.
    pub fn alloc(&mut self, size: usize) -> Option<*mut u8> {
        self.ensure_init();
        let size = align_up(size.max(1), 4);

        let mut best: Option<usize> = None;
        let mut best_size = usize::MAX;
        let mut cur = self.head;
        while let Some(off) = cur {
            let h = self.read_header(off);
            if h.is_free && h.size >= size && h.size < best_size {
                best = Some(off);
                best_size = h.size;
            }
            cur = h.next;
        }

        let off = best?;
        let mut h = self.read_header(off);

        if h.size >= size + HEADER_SIZE + MIN_SPLIT_REMAINDER {
            let new_off = off + HEADER_SIZE + size;
            self.write_header(
                new_off,
                BlockHeader {
                    size: h.size - size - HEADER_SIZE,
                    is_free: true,
                    next: h.next,
                },
            );
            h.next = Some(new_off);
            h.size = size;
        }
        h.is_free = false;
        self.write_header(off, h);

        self.current_usage += h.size;
        if self.current_usage > self.peak_usage {
            self.peak_usage = self.current_usage;
        }

        Some(unsafe { self.arena.as_mut_ptr().add(off + HEADER_SIZE) })
    }

    /// Free a pointer previously returned by `alloc`. Coalesces with the
    /// following block (via its own `next` link) and, failing that, with
    /// the preceding block (found by a linear scan from the head — there
    /// is no backward link).
    pub fn free(&mut self, ptr: *mut u8) {
        if ptr.is_null() {
            return;
        }
        let base = self.arena.as_ptr() as usize;
        let off = ptr as usize - base - HEADER_SIZE;

        let mut h = self.read_header(off);
        self.current_usage -= h.size;
        h.is_free = true;
        self.write_header(off, h);

        if let Some(next_off) = h.next {
            let next_h = self.read_header(next_off);
            if next_h.is_free {
                h.size += HEADER_SIZE + next_h.size;
                h.next = next_h.next;
                self.write_header(off, h);
            }
        }

        let mut prev: Option<usize> = None;
        let mut cur = self.head;
        while let Some(c) = cur {
            if c == off {
                break;
            }
            let ch = self.read_header(c);
            prev = Some(c);
            cur = ch.next;
        }

        if let Some(p) = prev {
            let mut ph = self.read_header(p);
            if ph.is_free {
                let h2 = self.read_header(off);
                ph.size += HEADER_SIZE + h2.size;
                ph.next = h2.next;
                self.write_header(p, ph);
            }
        }
    }

    /// Sum of every free block's data area, not counting header overhead.
    pub fn free_bytes(&self) -> usize {
        let mut total = 0;
        let mut cur = self.head;
        while let Some(off) = cur {
            let h = self.read_header(off);
            if h.is_free {
                total += h.size;
            }
            cur = h.next;
        }
        total
    }

    /// `(total arena bytes, bytes currently allocated, high-water mark)`.
    pub fn stats(&self) -> (usize, usize, usize) {
        (HEAP_SIZE, self.current_usage, self.peak_usage)
    }
}

fn align_up(size: usize, align: usize) -> usize {
    (size + align - 1) & !(align - 1)
}

// ---------------------------------------------------------------------------
// Global facade
// ---------------------------------------------------------------------------

static mut HEAP: Heap = Heap::new();

/// Allocate `size` bytes from the kernel heap.
pub fn alloc(size: usize) -> Result<*mut u8, KernelError> {
    sync::critical_section(|| unsafe { HEAP.alloc(size) }).ok_or(KernelError::OutOfMemory)
}

/// Free a pointer previously returned by `alloc`.
///
/// # Safety
/// `ptr` must have come from `alloc` on this heap and must not already
/// have been freed.
pub unsafe fn free(ptr: *mut u8) {
    sync::critical_section(|| HEAP.free(ptr));
}

/// Bytes currently free across the whole heap.
pub fn free_bytes() -> usize {
    sync::critical_section(|| unsafe { HEAP.free_bytes() })
}

/// `(total arena bytes, bytes currently allocated, high-water mark)`.
pub fn stats() -> (usize, usize, usize) {
    sync::critical_section(|| unsafe { HEAP.stats() })
}
