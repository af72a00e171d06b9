//! Counting allocator wrapper.
//!
//! `Meter` forwards every request to an inner `GlobalAlloc` and keeps track of the bytes that are
//! currently live, the highest value that count ever reached, and how many allocation calls were
//! made. It can also enforce a ceiling: an allocation that would push the live bytes above it
//! returns null, which the standard library turns into an allocation failure abort. That is the
//! same outcome the driver expects from a container memory limit.
//!
//! Note on alignment: an allocation of 1 byte with alignment greater than 1 takes more space
//! because of padding, but only 1 byte is counted. The numbers are close, not exact.
use std::alloc::{GlobalAlloc, Layout};
use std::ptr;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering::SeqCst;

pub struct Meter<A> {
    ceiling: usize,
    live: AtomicUsize,
    peak: AtomicUsize,
    allocations: AtomicUsize,
    alloc: A,
}

impl<A: GlobalAlloc> Meter<A> {
    /// A meter without a ceiling.
    pub const fn new(alloc: A) -> Self {
        Self::with_ceiling(usize::MAX, alloc)
    }

    /// A meter that refuses allocations once `ceiling` bytes are live.
    ///
    /// ```no_run
    /// use memhog::{Config, Driver, Meter, Sleep};
    /// use std::alloc::System;
    ///
    /// // Abort at 20 MB instead of waiting for a cgroup to kill the process
    /// #[global_allocator]
    /// static METER: Meter<System> = Meter::with_ceiling(20_000_000, System);
    ///
    /// fn main() {
    ///     let driver = Driver::new(Config::default()).unwrap();
    ///     driver.run(&mut std::io::stdout(), &Sleep).unwrap();
    /// }
    /// ```
    pub const fn with_ceiling(ceiling: usize, alloc: A) -> Self {
        Self {
            ceiling,
            live: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            allocations: AtomicUsize::new(0),
            alloc,
        }
    }

    /// Returns None if the ceiling would be crossed or the inner allocator failed.
    ///
    /// # Safety
    ///
    /// The same restrictions as `GlobalAlloc::alloc`.
    pub unsafe fn try_alloc(&self, layout: Layout) -> Option<*mut u8> {
        let ceiling = self.ceiling;
        let previous = self
            .live
            .fetch_update(SeqCst, SeqCst, |old| {
                old.checked_add(layout.size()).filter(|new| *new <= ceiling)
            })
            .ok()?;

        let ret = self.alloc.alloc(layout);
        if ret.is_null() {
            // Nothing was actually allocated, so take the size back out
            self.live.fetch_sub(layout.size(), SeqCst);
            return None;
        }

        self.allocations.fetch_add(1, SeqCst);
        self.peak.fetch_max(previous + layout.size(), SeqCst);
        Some(ret)
    }

    /// Bytes currently allocated through this meter.
    pub fn live(&self) -> usize {
        self.live.load(SeqCst)
    }

    /// Highest value `live` has reached.
    pub fn peak(&self) -> usize {
        self.peak.load(SeqCst)
    }

    /// Number of successful allocation calls, reallocations included.
    pub fn allocations(&self) -> usize {
        self.allocations.load(SeqCst)
    }

    /// Returns the headroom below the ceiling in bytes. This value does not guarantee that an
    /// allocation of x bytes will succeed.
    pub fn remaining(&self) -> usize {
        self.ceiling.saturating_sub(self.live())
    }
}

unsafe impl<A: GlobalAlloc> GlobalAlloc for Meter<A> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        self.try_alloc(layout).unwrap_or(ptr::null_mut())
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        self.alloc.dealloc(ptr, layout);
        self.live.fetch_sub(layout.size(), SeqCst);
    }
}
