//! Priority queue of job ids.
//!
//! Highest priority first; among equal priorities, the job enqueued first
//! wins. Ties are broken by a monotonically increasing sequence number,
//! not by timestamps, so ordering is strict even within one clock tick.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::models::Priority;

#[derive(Debug, Clone, PartialEq, Eq)]
struct QueueEntry {
    priority: Priority,
    sequence: u64,
    job_id: String,
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Max-heap of queued job ids
#[derive(Debug, Default)]
pub struct JobQueue {
    heap: BinaryHeap<QueueEntry>,
    next_sequence: u64,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a job behind every job of the same priority
    pub fn push(&mut self, job_id: impl Into<String>, priority: Priority) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.heap.push(QueueEntry {
            priority,
            sequence,
            job_id: job_id.into(),
        });
    }

    /// Take the highest-ranked job
    pub fn pop(&mut self) -> Option<String> {
        self.heap.pop().map(|entry| entry.job_id)
    }

    /// Drop a job; returns whether it was queued
    pub fn remove(&mut self, job_id: &str) -> bool {
        let before = self.heap.len();
        self.heap.retain(|entry| entry.job_id != job_id);
        self.heap.len() != before
    }

    pub fn contains(&self, job_id: &str) -> bool {
        self.heap.iter().any(|entry| entry.job_id == job_id)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
