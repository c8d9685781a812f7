use std::sync::atomic::{AtomicUsize, Ordering};

// Hands out IVP indices 0..total to workers on a first-come basis.
pub struct WorkQueue {
    next: AtomicUsize,
    total: usize,
}

impl WorkQueue {
    pub fn new(total: usize) -> Self {
        Self {
            next: AtomicUsize::new(0),
            total,
        }
    }

    pub fn next(&self) -> Option<usize> {
        let i = self.next.fetch_add(1, Ordering::Relaxed);
        if i < self.total {
            Some(i)
        } else {
            None
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }
}
