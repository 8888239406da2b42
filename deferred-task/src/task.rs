//! The deferred task core: a single-assignment container for the eventual result of an operation.
//!
//! A [`DeferredTask`] starts `Pending` and settles exactly once, to `Fulfilled(T)` or
//! `Rejected(E)`. Once settled its outcome never changes and is replayable to any number of
//! observers, including observers registered after settlement (hence the `Clone` bounds).
//!
//! Continuations never run synchronously inside the call that registers them (or inside the call
//! that settles the task): the core wraps each runnable continuation in a [`Job`] and hands it to
//! the host via [`TaskHostHooks::host_enqueue_job`]. Callers can rely on all synchronous code in
//! the registering scope running before any continuation fires.
//!
//! The algorithm structure follows the ECMA-262 Promise operations, generalized over `T`/`E`:
//! - `PerformPromiseThen`: <https://tc39.es/ecma262/#sec-performpromisethen>
//! - `PromiseReactionJob`: <https://tc39.es/ecma262/#sec-promisereactionjob>
//! - resolving functions + `alreadyResolved`: <https://tc39.es/ecma262/#sec-createresolvingfunctions>
//!
//! There is no cancellation operation: once created, a task's initiator always runs to
//! completion. Timeout-style cancellation is expressed by racing against a timer-backed task
//! (see [`crate::first_settled`]) and discarding interest in the loser's eventual result, never
//! by stopping the loser's underlying work.

use crate::Job;
use crate::JobKind;
use crate::RejectionOperation;
use crate::TaskHostHooks;
use crate::TaskId;
use std::cell::Cell;
use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::rc::Rc;

/// The observable phase of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
  Pending,
  Fulfilled,
  Rejected,
}

/// A terminal outcome: the value a task fulfilled with, or the error it rejected with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settled<T, E> {
  Fulfilled(T),
  Rejected(E),
}

/// What a continuation handler produces for the task returned by the registration call.
pub enum Completion<T, E> {
  /// Fulfill the derived task with a plain value.
  Value(T),
  /// Defer the derived task to another task's eventual outcome.
  ///
  /// Each registration flattens exactly one level; a chain of nested tasks resolves hop by hop
  /// through the job queue until a non-task terminal value or error is reached.
  Task(DeferredTask<T, E>),
  /// Reject the derived task (the handler's analogue of raising).
  Throw(E),
}

/// A continuation registered by one registration call: receives the source outcome and enqueues
/// the actual handler work as a job.
type Reaction<T, E> = Box<dyn FnOnce(Settled<T, E>, &mut dyn TaskHostHooks)>;

struct TaskInner<T, E> {
  state: State<T, E>,
  is_handled: bool,
  reactions: Vec<Reaction<T, E>>,
}

enum State<T, E> {
  Pending,
  Fulfilled(T),
  Rejected(E),
}

/// A single-assignment container for the eventual result of an operation.
///
/// Cloning is shallow: clones share settlement state and continuation list. The scheduling model
/// is a single logical thread per task graph, so the shared state is `Rc<RefCell<_>>` and the
/// settle-then-notify discipline (state transition and reaction-list take under one borrow, host
/// hooks only after the borrow ends) is what keeps continuations from observing a
/// partially-updated task.
pub struct DeferredTask<T, E> {
  id: TaskId,
  inner: Rc<RefCell<TaskInner<T, E>>>,
}

impl<T, E> Clone for DeferredTask<T, E> {
  fn clone(&self) -> Self {
    Self {
      id: self.id,
      inner: Rc::clone(&self.inner),
    }
  }
}

impl<T, E> fmt::Debug for DeferredTask<T, E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("DeferredTask")
      .field("id", &self.id)
      .field("state", &self.state())
      .finish()
  }
}

impl<T, E> DeferredTask<T, E> {
  /// Returns this task's opaque identifier (the token rejection-tracking hooks receive).
  #[inline]
  pub fn id(&self) -> TaskId {
    self.id
  }

  /// Returns the current phase without cloning the outcome.
  pub fn state(&self) -> TaskState {
    match self.inner.borrow().state {
      State::Pending => TaskState::Pending,
      State::Fulfilled(_) => TaskState::Fulfilled,
      State::Rejected(_) => TaskState::Rejected,
    }
  }

  /// Returns whether any continuation has ever been registered on this task.
  ///
  /// A handled task's rejection is considered observed and is not reported to the rejection
  /// tracker; a registration whose continuation cannot consume the rejection passes it on to the
  /// derived task, where the hazard resurfaces.
  pub fn is_handled(&self) -> bool {
    self.inner.borrow().is_handled
  }
}

impl<T, E> DeferredTask<T, E>
where
  T: Clone + 'static,
  E: Clone + 'static,
{
  pub(crate) fn pending_task() -> Self {
    Self {
      id: TaskId::next(),
      inner: Rc::new(RefCell::new(TaskInner {
        state: State::Pending,
        is_handled: false,
        reactions: Vec::new(),
      })),
    }
  }

  /// Create a pending task together with its settlement capability.
  pub fn with_capability() -> (Self, TaskCapability<T, E>) {
    let task = Self::pending_task();
    let capability = TaskCapability::new(&task);
    (task, capability)
  }

  /// Create a task settled by `initiator`.
  ///
  /// The initiator runs synchronously, fully, before `new` returns; it receives the settlement
  /// capability and the host hooks. Returning `Err` is the initiator's analogue of raising
  /// synchronously and rejects the task through the capability (so an initiator that settles and
  /// then errors does not double-settle).
  pub fn new<F>(hooks: &mut dyn TaskHostHooks, initiator: F) -> Self
  where
    F: FnOnce(&TaskCapability<T, E>, &mut dyn TaskHostHooks) -> Result<(), E>,
  {
    let (task, capability) = Self::with_capability();
    if let Err(error) = initiator(&capability, hooks) {
      capability.reject(hooks, error);
    }
    task
  }

  /// Returns an already-fulfilled task wrapping `value`.
  ///
  /// A [`DeferredTask`] is never re-wrapped: a task already has the task type, so there is no
  /// counterpart here to double-wrapping. To adopt a foreign continuation-registration interface
  /// instead, use [`DeferredTask::from_thenable`].
  pub fn fulfilled(value: T) -> Self {
    Self {
      id: TaskId::next(),
      inner: Rc::new(RefCell::new(TaskInner {
        state: State::Fulfilled(value),
        is_handled: false,
        reactions: Vec::new(),
      })),
    }
  }

  /// Returns an already-rejected task wrapping `error`.
  ///
  /// No failure continuation exists yet, so this reports [`RejectionOperation::Reject`] to the
  /// host's rejection tracker.
  pub fn rejected(hooks: &mut dyn TaskHostHooks, error: E) -> Self {
    let task = Self::pending_task();
    task.settle(hooks, Settled::Rejected(error));
    task
  }

  /// Returns a task adopting the eventual outcome of `thenable`.
  ///
  /// Subscription is deferred through a queued job, so a thenable that settles synchronously
  /// inside [`Thenable::subscribe`] still observes the usual ordering guarantee. A misbehaving
  /// thenable that invokes both continuations (or one of them twice) is tolerated: the first
  /// invocation wins and the rest are no-ops.
  pub fn from_thenable<Th>(hooks: &mut dyn TaskHostHooks, thenable: Th) -> Self
  where
    Th: Thenable<T, E> + 'static,
  {
    let (task, capability) = Self::with_capability();
    hooks.host_enqueue_job(Job::new(JobKind::Reaction, move |hooks| {
      let fulfill_capability = capability.clone();
      let reject_capability = capability;
      thenable.subscribe(
        hooks,
        Box::new(move |value, hooks| fulfill_capability.fulfill(hooks, value)),
        Box::new(move |error, hooks| reject_capability.reject(hooks, error)),
      );
    }));
    task
  }

  /// Returns the cloned terminal outcome, if settled.
  pub fn settled(&self) -> Option<Settled<T, E>> {
    match &self.inner.borrow().state {
      State::Pending => None,
      State::Fulfilled(value) => Some(Settled::Fulfilled(value.clone())),
      State::Rejected(error) => Some(Settled::Rejected(error.clone())),
    }
  }

  /// Register a success continuation; a rejection propagates to the returned task unchanged.
  ///
  /// If this task fulfills with `v`, the returned task takes the outcome of `on_fulfilled(v)`
  /// (see [`Completion`]).
  pub fn then<U, F>(&self, hooks: &mut dyn TaskHostHooks, on_fulfilled: F) -> DeferredTask<U, E>
  where
    U: Clone + 'static,
    F: FnOnce(T) -> Completion<U, E> + 'static,
  {
    self.mark_handled(hooks);
    let derived = DeferredTask::pending_task();
    let target = derived.clone();
    self.register_reaction(
      hooks,
      Box::new(move |outcome, hooks| {
        hooks.host_enqueue_job(Job::new(JobKind::Reaction, move |hooks| match outcome {
          Settled::Fulfilled(value) => target.apply_completion(hooks, on_fulfilled(value)),
          Settled::Rejected(error) => target.settle(hooks, Settled::Rejected(error)),
        }));
      }),
    );
    derived
  }

  /// Register a failure continuation; a fulfillment propagates to the returned task unchanged.
  ///
  /// If this task rejects with `e`, the returned task takes the outcome of `on_rejected(e)`;
  /// returning [`Completion::Value`] recovers the chain.
  pub fn catch<F>(&self, hooks: &mut dyn TaskHostHooks, on_rejected: F) -> DeferredTask<T, E>
  where
    F: FnOnce(E) -> Completion<T, E> + 'static,
  {
    self.mark_handled(hooks);
    let derived = DeferredTask::pending_task();
    let target = derived.clone();
    self.register_reaction(
      hooks,
      Box::new(move |outcome, hooks| {
        hooks.host_enqueue_job(Job::new(JobKind::Reaction, move |hooks| match outcome {
          Settled::Fulfilled(value) => target.settle(hooks, Settled::Fulfilled(value)),
          Settled::Rejected(error) => target.apply_completion(hooks, on_rejected(error)),
        }));
      }),
    );
    derived
  }

  /// Register a continuation pair: one registration, both outcomes covered.
  pub fn then_or_else<U, F, R>(
    &self,
    hooks: &mut dyn TaskHostHooks,
    on_fulfilled: F,
    on_rejected: R,
  ) -> DeferredTask<U, E>
  where
    U: Clone + 'static,
    F: FnOnce(T) -> Completion<U, E> + 'static,
    R: FnOnce(E) -> Completion<U, E> + 'static,
  {
    self.mark_handled(hooks);
    let derived = DeferredTask::pending_task();
    let target = derived.clone();
    self.register_reaction(
      hooks,
      Box::new(move |outcome, hooks| {
        hooks.host_enqueue_job(Job::new(JobKind::Reaction, move |hooks| match outcome {
          Settled::Fulfilled(value) => target.apply_completion(hooks, on_fulfilled(value)),
          Settled::Rejected(error) => target.apply_completion(hooks, on_rejected(error)),
        }));
      }),
    );
    derived
  }

  /// Register a continuation invoked on either outcome with no argument.
  ///
  /// The returned task settles identically to this one: `on_finally` cannot observe or alter the
  /// outcome. The one exception is `on_finally` returning `Err`, which supersedes the original
  /// outcome.
  pub fn finally<F>(&self, hooks: &mut dyn TaskHostHooks, on_finally: F) -> DeferredTask<T, E>
  where
    F: FnOnce() -> Result<(), E> + 'static,
  {
    self.mark_handled(hooks);
    let derived = DeferredTask::pending_task();
    let target = derived.clone();
    self.register_reaction(
      hooks,
      Box::new(move |outcome, hooks| {
        hooks.host_enqueue_job(Job::new(JobKind::Reaction, move |hooks| {
          match on_finally() {
            Ok(()) => target.settle(hooks, outcome),
            Err(error) => target.settle(hooks, Settled::Rejected(error)),
          }
        }));
      }),
    );
    derived
  }

  /// Marks this task as handled, reporting [`RejectionOperation::Handle`] if it is already
  /// rejected and was not handled before.
  pub(crate) fn mark_handled(&self, hooks: &mut dyn TaskHostHooks) {
    let notify = {
      let mut inner = self.inner.borrow_mut();
      let newly_handled = !inner.is_handled;
      inner.is_handled = true;
      newly_handled && matches!(inner.state, State::Rejected(_))
    };
    if notify {
      hooks.host_rejection_tracker(self.id, RejectionOperation::Handle);
    }
  }

  /// Registers `reaction`. On a pending task it is stored in registration order; on a settled
  /// task it runs immediately, which only *enqueues* the continuation job and so preserves the
  /// never-synchronous guarantee.
  pub(crate) fn register_reaction(&self, hooks: &mut dyn TaskHostHooks, reaction: Reaction<T, E>) {
    let settled = self.settled();
    match settled {
      Some(outcome) => reaction(outcome, hooks),
      None => self.inner.borrow_mut().reactions.push(reaction),
    }
  }

  /// The one-time `Pending → settled` transition. No-op on an already-settled task.
  ///
  /// The transition and the reaction-list take happen under a single borrow; hooks (rejection
  /// tracking, job enqueueing) run only after the borrow ends.
  pub(crate) fn settle(&self, hooks: &mut dyn TaskHostHooks, outcome: Settled<T, E>) {
    let (should_track, reactions) = {
      let mut inner = self.inner.borrow_mut();
      if !matches!(inner.state, State::Pending) {
        return;
      }
      let should_track = matches!(outcome, Settled::Rejected(_)) && !inner.is_handled;
      inner.state = match outcome.clone() {
        Settled::Fulfilled(value) => State::Fulfilled(value),
        Settled::Rejected(error) => State::Rejected(error),
      };
      (should_track, mem::take(&mut inner.reactions))
    };

    if should_track {
      hooks.host_rejection_tracker(self.id, RejectionOperation::Reject);
    }

    for reaction in reactions {
      reaction(outcome.clone(), hooks);
    }
  }

  /// Applies a handler's [`Completion`] to this (derived) task.
  fn apply_completion(&self, hooks: &mut dyn TaskHostHooks, completion: Completion<T, E>) {
    match completion {
      Completion::Value(value) => self.settle(hooks, Settled::Fulfilled(value)),
      Completion::Throw(error) => self.settle(hooks, Settled::Rejected(error)),
      Completion::Task(task) => {
        debug_assert!(
          !Rc::ptr_eq(&self.inner, &task.inner),
          "a task cannot defer to itself"
        );
        task.mark_handled(hooks);
        let target = self.clone();
        task.register_reaction(
          hooks,
          Box::new(move |outcome, hooks| {
            hooks.host_enqueue_job(Job::new(JobKind::Reaction, move |hooks| {
              target.settle(hooks, outcome);
            }));
          }),
        );
      }
    }
  }
}

/// The settlement capability pair for one task.
///
/// The first call to either capability wins; all subsequent calls to either are no-ops. That
/// arbitration is carried by a shared already-settled record distinct from the task state, so
/// that after [`TaskCapability::adopt`], which leaves the task pending until the adopted task
/// settles, later capability calls are still dead.
///
/// Clones share the already-settled record.
pub struct TaskCapability<T, E> {
  task: DeferredTask<T, E>,
  already_settled: Rc<Cell<bool>>,
}

impl<T, E> Clone for TaskCapability<T, E> {
  fn clone(&self) -> Self {
    Self {
      task: self.task.clone(),
      already_settled: Rc::clone(&self.already_settled),
    }
  }
}

impl<T, E> TaskCapability<T, E>
where
  T: Clone + 'static,
  E: Clone + 'static,
{
  fn new(task: &DeferredTask<T, E>) -> Self {
    Self {
      task: task.clone(),
      already_settled: Rc::new(Cell::new(false)),
    }
  }

  /// Returns a handle to the task this capability settles.
  pub fn task(&self) -> DeferredTask<T, E> {
    self.task.clone()
  }

  /// Settle the task as fulfilled with `value`. No-op after the first capability call.
  pub fn fulfill(&self, hooks: &mut dyn TaskHostHooks, value: T) {
    if self.already_settled.replace(true) {
      return;
    }
    self.task.settle(hooks, Settled::Fulfilled(value));
  }

  /// Settle the task as rejected with `error`. No-op after the first capability call.
  pub fn reject(&self, hooks: &mut dyn TaskHostHooks, error: E) {
    if self.already_settled.replace(true) {
      return;
    }
    self.task.settle(hooks, Settled::Rejected(error));
  }

  /// Defer the task to `source`'s eventual outcome. No-op after the first capability call.
  ///
  /// The task stays pending until `source` settles, but this counts as the capability's one
  /// settlement: later `fulfill`/`reject` calls are ignored. Adopting a task that (transitively)
  /// is this capability's own task can never settle; the direct case is a caller bug and is
  /// debug-asserted.
  pub fn adopt(&self, hooks: &mut dyn TaskHostHooks, source: DeferredTask<T, E>) {
    debug_assert!(
      !Rc::ptr_eq(&self.task.inner, &source.inner),
      "a task cannot adopt itself"
    );
    if self.already_settled.replace(true) {
      return;
    }
    source.mark_handled(hooks);
    let target = self.task.clone();
    source.register_reaction(
      hooks,
      Box::new(move |outcome, hooks| {
        hooks.host_enqueue_job(Job::new(JobKind::Reaction, move |hooks| {
          target.settle(hooks, outcome);
        }));
      }),
    );
  }
}

/// The continuation type handed to [`Thenable::subscribe`].
pub type SubscribeFn<V> = Box<dyn FnOnce(V, &mut dyn TaskHostHooks)>;

/// A value exposing a continuation-registration operation compatible with the task abstraction,
/// without being the task type itself.
///
/// Implementations should invoke at most one of the two continuations, at most once; adopters
/// tolerate violations by ignoring every invocation after the first.
pub trait Thenable<T, E> {
  /// Register the settlement continuations with this value.
  fn subscribe(
    self,
    hooks: &mut dyn TaskHostHooks,
    on_fulfilled: SubscribeFn<T>,
    on_rejected: SubscribeFn<E>,
  );
}

/// Tasks are themselves thenable: subscribing observes the task's eventual outcome.
impl<T, E> Thenable<T, E> for DeferredTask<T, E>
where
  T: Clone + 'static,
  E: Clone + 'static,
{
  fn subscribe(
    self,
    hooks: &mut dyn TaskHostHooks,
    on_fulfilled: SubscribeFn<T>,
    on_rejected: SubscribeFn<E>,
  ) {
    self.mark_handled(hooks);
    self.register_reaction(
      hooks,
      Box::new(move |outcome, hooks| {
        hooks.host_enqueue_job(Job::new(JobKind::Reaction, move |hooks| match outcome {
          Settled::Fulfilled(value) => on_fulfilled(value, hooks),
          Settled::Rejected(error) => on_rejected(error, hooks),
        }));
      }),
    );
  }
}
