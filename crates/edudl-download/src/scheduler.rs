//! Admission scheduling.
//!
//! A pure state machine holding the FIFO queue of pending download ids and
//! the number of running transfer workers. No I/O is performed here; the
//! manager calls into it while holding its state lock, which is what makes
//! "pop the head and take a slot" a single atomic step.
//!
//! # Design
//!
//! - Pure synchronous state machine (no async, no IO, no tracing)
//! - An id leaves the queue the instant it is handed out for admission
//! - One slot is held per running worker until `release` is called

use std::collections::VecDeque;

use edudl_core::download::DownloadId;

/// FIFO admission queue with a concurrency bound.
///
/// This is a sync type with no internal locking; the caller
/// (`DownloadManagerImpl`) is responsible for synchronization.
#[derive(Debug)]
pub struct Scheduler {
    pending: VecDeque<DownloadId>,
    active: u32,
    max_concurrent: u32,
}

impl Scheduler {
    /// Create a scheduler allowing `max_concurrent` running workers.
    pub const fn new(max_concurrent: u32) -> Self {
        Self {
            pending: VecDeque::new(),
            active: 0,
            max_concurrent,
        }
    }

    /// Number of slots currently held by workers.
    pub const fn active_count(&self) -> u32 {
        self.active
    }

    /// Number of ids waiting in the queue.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Whether another worker may start right now.
    pub const fn has_capacity(&self) -> bool {
        self.active < self.max_concurrent
    }

    /// Check if an id is currently queued.
    pub fn is_queued(&self, id: &DownloadId) -> bool {
        self.pending.contains(id)
    }

    /// Append an id to the tail of the queue.
    ///
    /// Returns false (and leaves the queue untouched) if the id is already queued.
    pub fn enqueue(&mut self, id: DownloadId) -> bool {
        if self.is_queued(&id) {
            return false;
        }
        self.pending.push_back(id);
        true
    }

    /// Pop the head of the queue and take a worker slot for it.
    ///
    /// Returns `None` when the queue is empty or every slot is taken.
    pub fn next_admission(&mut self) -> Option<DownloadId> {
        if !self.has_capacity() {
            return None;
        }
        let id = self.pending.pop_front()?;
        self.active += 1;
        Some(id)
    }

    /// Give back a slot taken by `next_admission`.
    pub const fn release(&mut self) {
        self.active = self.active.saturating_sub(1);
    }

    /// Remove an id from the queue if present.
    pub fn dequeue_pending(&mut self, id: &DownloadId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|queued| queued != id);
        self.pending.len() < before
    }

    /// Ids in queue order.
    #[cfg(test)]
    pub fn queued_ids(&self) -> Vec<DownloadId> {
        self.pending.iter().copied().collect()
    }
}
