//! In-memory FIFO queue of pending jobs.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::core::{JobHandle, JobQueue};

/// In-memory queue storing pending jobs in submission order.
///
/// Push and pop are O(1); every operation takes the queue's own mutex, so
/// the queue is safe to share between the submission and dispatch paths.
#[derive(Default)]
pub struct InMemoryQueue {
    jobs: Mutex<VecDeque<JobHandle>>,
}

impl InMemoryQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty queue with room for `capacity` jobs.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            jobs: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }
}

impl JobQueue for InMemoryQueue {
    fn push(&self, job: JobHandle) {
        self.jobs.lock().push_back(job);
    }

    fn pop(&self) -> Option<JobHandle> {
        self.jobs.lock().pop_front()
    }

    fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    fn clear(&self) -> Vec<JobHandle> {
        self.jobs.lock().drain(..).collect()
    }

    fn snapshot(&self) -> Vec<JobHandle> {
        self.jobs.lock().iter().cloned().collect()
    }
}
