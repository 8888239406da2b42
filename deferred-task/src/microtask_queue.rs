//! A minimal, engine-supplied microtask queue implementation.
//!
//! This is intended for embeddings that do not have their own event loop but still need
//! continuation scheduling:
//! - FIFO job ordering
//! - "perform a microtask checkpoint" semantics (drain until empty, including jobs enqueued while
//!   running)
//! - an optional fuel limit that bounds self-sustaining job chains

use crate::Job;
use crate::TaskError;
use crate::TaskHostHooks;
use std::collections::VecDeque;

/// A FIFO job queue.
///
/// The queue stores jobs in a [`VecDeque`] and provides a microtask checkpoint runner that drains
/// the queue until empty (including jobs enqueued by jobs during execution).
#[derive(Default, Debug)]
pub struct MicrotaskQueue {
  queue: VecDeque<Job>,
}

impl MicrotaskQueue {
  pub fn new() -> Self {
    Self::default()
  }

  /// Enqueue a job.
  pub fn enqueue(&mut self, job: Job) {
    self.queue.push_back(job);
  }

  /// Dequeue the frontmost job, if any.
  ///
  /// Exposed so hosts that wrap this queue (e.g. to combine it with a rejection tracker) can run
  /// jobs with themselves as the hooks.
  pub fn pop(&mut self) -> Option<Job> {
    self.queue.pop_front()
  }

  /// Returns whether the queue is empty.
  pub fn is_empty(&self) -> bool {
    self.queue.is_empty()
  }

  /// Returns the number of queued jobs.
  pub fn len(&self) -> usize {
    self.queue.len()
  }

  /// Runs all queued jobs (and any jobs enqueued while running) until the queue is empty.
  pub fn perform_microtask_checkpoint(&mut self) {
    let mut ran = 0u64;
    while let Some(job) = self.queue.pop_front() {
      job.run(self);
      ran += 1;
    }
    tracing::trace!(jobs = ran, "microtask checkpoint complete");
  }

  /// Like [`MicrotaskQueue::perform_microtask_checkpoint`], but runs at most `fuel` jobs.
  ///
  /// A task graph that keeps deferring to freshly-created tasks sustains the queue indefinitely;
  /// the fuel limit is the practical guard against such chains. On exhaustion the remaining jobs
  /// stay queued and [`TaskError::OutOfFuel`] is returned; a later checkpoint may resume them.
  pub fn perform_microtask_checkpoint_with_fuel(&mut self, fuel: u64) -> Result<(), TaskError> {
    let mut spent = 0u64;
    while let Some(job) = self.queue.pop_front() {
      if spent == fuel {
        self.queue.push_front(job);
        tracing::debug!(fuel, queued = self.queue.len(), "microtask checkpoint out of fuel");
        return Err(TaskError::OutOfFuel { fuel });
      }
      spent += 1;
      job.run(self);
    }
    Ok(())
  }
}

impl TaskHostHooks for MicrotaskQueue {
  fn host_enqueue_job(&mut self, job: Job) {
    self.enqueue(job);
  }
}
