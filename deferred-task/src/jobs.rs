//! Jobs and host integration hooks.
//!
//! This module is intentionally **task-core-independent**: it defines the small, engine-owned
//! types a host needs before any task exists.
//!
//! ## Background
//!
//! The task core never runs a continuation itself. Whenever a settlement makes a continuation
//! runnable, the core wraps it in a [`Job`] and hands it to the host via
//! [`TaskHostHooks::host_enqueue_job`]. The host owns the actual queue and decides when queued
//! jobs run; [`crate::MicrotaskQueue`] is a minimal engine-supplied host for embeddings and tests
//! that do not have their own loop.
//!
//! This split mirrors how ECMA-262 requires Promise jobs to be scheduled through a host-defined
//! hook rather than run inline:
//! - <https://tc39.es/ecma262/#sec-hostenqueuepromisejob> (FIFO ordering requirement)
//! - <https://tc39.es/ecma262/#sec-host-promise-rejection-tracker>

use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

/// Opaque identifier for a task, handed to rejection-tracking hooks.
///
/// This type is an *opaque token*: hosts should treat it as an identifier to store and compare,
/// not something to interpret.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct TaskId(u64);

impl TaskId {
  pub(crate) fn next() -> Self {
    static NEXT: AtomicU64 = AtomicU64::new(0);
    Self(NEXT.fetch_add(1, Ordering::Relaxed))
  }

  /// Returns the underlying opaque numeric representation.
  ///
  /// The numeric representation is intentionally unspecified; it may change.
  #[inline]
  pub const fn to_raw(self) -> u64 {
    self.0
  }
}

impl fmt::Debug for TaskId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("TaskId").field(&self.0).finish()
  }
}

/// A coarse classification of host-scheduled work.
///
/// The host can use this to map work onto different queues (e.g. continuation jobs into a
/// microtask-style queue vs. timer callbacks into a task-style queue).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
  /// A continuation job produced by a settlement (a microtask in event-loop terms).
  Reaction,
  /// Generic work with no additional ordering constraints beyond FIFO.
  Generic,
  /// A timer callback fired by a timer host such as [`crate::TimerQueue`].
  Timer,
}

/// The operation reported to [`TaskHostHooks::host_rejection_tracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionOperation {
  /// A task was rejected with no failure continuation registered.
  Reject,
  /// A previously-rejected task gained a failure continuation.
  Handle,
}

/// A parameterless unit of deferred work.
///
/// A job is a boxed `FnOnce` that receives the host hooks at run time, so running one job can
/// enqueue further jobs (settlement chains propagate one queued hop at a time). Jobs are not
/// `Send`: the scheduling model is a single logical thread per task graph, and jobs capture
/// `Rc` task handles.
pub struct Job {
  kind: JobKind,
  run: Box<dyn FnOnce(&mut dyn TaskHostHooks) + 'static>,
}

impl Job {
  /// Create a new job of `kind` backed by `run`.
  pub fn new(kind: JobKind, run: impl FnOnce(&mut dyn TaskHostHooks) + 'static) -> Self {
    Self {
      kind,
      run: Box::new(run),
    }
  }

  /// Returns this job's kind.
  #[inline]
  pub fn kind(&self) -> JobKind {
    self.kind
  }

  /// Run the job, consuming it.
  #[inline]
  pub fn run(self, hooks: &mut dyn TaskHostHooks) {
    let Job { run, .. } = self;
    run(hooks)
  }
}

impl fmt::Debug for Job {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Job").field("kind", &self.kind).finish()
  }
}

/// Host hooks required by the task core; the embedding provides the implementation.
///
/// ## FIFO requirement
///
/// The core calls [`TaskHostHooks::host_enqueue_job`] in settlement/registration order;
/// hosts MUST preserve this ordering when running the queued jobs. Continuations registered
/// `r1, r2, …` on one task fire in that relative order only if the host is FIFO.
pub trait TaskHostHooks {
  /// Enqueue a job for later execution.
  ///
  /// The core never runs continuations inline: all synchronous code in the scope that registered
  /// a continuation (or triggered a settlement) runs before the continuation fires. Hosts must
  /// not run `job` from inside this call.
  fn host_enqueue_job(&mut self, job: Job);

  /// Rejection tracker hook (unobserved rejection reporting).
  ///
  /// Called with [`RejectionOperation::Reject`] when a task is rejected while no failure
  /// continuation has been registered, and with [`RejectionOperation::Handle`] when an
  /// already-rejected task gains one. An unobserved rejection is an inherent caller hazard the
  /// core surfaces but does not prevent; see [`crate::RejectionTracker`] for a reusable
  /// implementation of this hook's bookkeeping.
  ///
  /// This default implementation does nothing.
  fn host_rejection_tracker(&mut self, _task: TaskId, _operation: RejectionOperation) {}
}
