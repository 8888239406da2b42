//! Deferred task primitives for single-threaded, cooperatively-scheduled task graphs.
//!
//! This crate provides:
//! - A single-assignment task container with replayable outcomes ([`DeferredTask`],
//!   [`TaskCapability`], [`Settled`], [`Completion`])
//! - Continuation registration (`then` / `catch` / `then_or_else` / `finally`) returning derived
//!   tasks, with nested-task and [`Thenable`] adoption
//! - Combinators over task collections ([`all_of`], [`first_settled`])
//! - A host scheduling boundary ([`Job`], [`TaskHostHooks`]) plus engine-supplied hosts
//!   ([`MicrotaskQueue`], [`TimerQueue`])
//! - Unobserved-rejection bookkeeping ([`RejectionTracker`])
//!
//! # Settlement and ordering
//!
//! A task settles exactly once: `Pending → Fulfilled` or `Pending → Rejected`, and never leaves a
//! settled state. Every capability call after the first is a no-op.
//!
//! Continuations never run synchronously inside the call that registers them or the call that
//! settles their task; they run as discrete jobs the host dequeues later, in FIFO order. All
//! synchronous code in the registering scope runs before any continuation fires, and
//! continuations registered `r1, r2, …` on one task fire in that relative order.
//!
//! # Hazards, by design
//!
//! - A rejection that never gains a failure continuation is surfaced (via
//!   [`TaskHostHooks::host_rejection_tracker`] / [`RejectionTracker`]) but not prevented.
//! - There is no cancellation: racing via [`first_settled`] discards interest in the losers,
//!   never stops their work.
//! - `first_settled` of an empty collection never settles.

mod combinators;
mod error;
mod jobs;
mod microtask_queue;
mod rejection_tracker;
mod task;
mod timer_queue;

pub use crate::combinators::all_of;
pub use crate::combinators::first_settled;
pub use crate::error::TaskError;
pub use crate::jobs::Job;
pub use crate::jobs::JobKind;
pub use crate::jobs::RejectionOperation;
pub use crate::jobs::TaskHostHooks;
pub use crate::jobs::TaskId;
pub use crate::microtask_queue::MicrotaskQueue;
pub use crate::rejection_tracker::RejectionHandleAction;
pub use crate::rejection_tracker::RejectionTracker;
pub use crate::task::Completion;
pub use crate::task::DeferredTask;
pub use crate::task::Settled;
pub use crate::task::SubscribeFn;
pub use crate::task::TaskCapability;
pub use crate::task::TaskState;
pub use crate::task::Thenable;
pub use crate::timer_queue::TimerQueue;
