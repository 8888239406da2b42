//! Combinators: tasks whose settlement is derived from a collection of input tasks.
//!
//! Neither combinator cancels its inputs. A combined task settling early only discards interest
//! in the remaining inputs; their initiators keep running and they settle normally.

use crate::DeferredTask;
use crate::Job;
use crate::JobKind;
use crate::Settled;
use crate::TaskHostHooks;
use std::cell::Cell;
use std::cell::RefCell;
use std::rc::Rc;

/// Returns a task that fulfills with every input's result, in input order, once every input has
/// fulfilled.
///
/// If any input rejects, the combined task rejects with the *first* rejection's error as soon as
/// that rejection occurs: it does not wait for the remaining inputs, and it does not cancel
/// them. An empty input fulfills immediately with an empty result sequence.
pub fn all_of<T, E>(
  hooks: &mut dyn TaskHostHooks,
  tasks: Vec<DeferredTask<T, E>>,
) -> DeferredTask<Vec<T>, E>
where
  T: Clone + 'static,
  E: Clone + 'static,
{
  if tasks.is_empty() {
    return DeferredTask::fulfilled(Vec::new());
  }

  let combined = DeferredTask::pending_task();
  let slots: Rc<RefCell<Vec<Option<T>>>> = Rc::new(RefCell::new(vec![None; tasks.len()]));
  let remaining = Rc::new(Cell::new(tasks.len()));

  for (index, task) in tasks.into_iter().enumerate() {
    let combined = combined.clone();
    let slots = Rc::clone(&slots);
    let remaining = Rc::clone(&remaining);
    task.mark_handled(hooks);
    task.register_reaction(
      hooks,
      Box::new(move |outcome, hooks| {
        hooks.host_enqueue_job(Job::new(JobKind::Reaction, move |hooks| match outcome {
          Settled::Fulfilled(value) => {
            slots.borrow_mut()[index] = Some(value);
            remaining.set(remaining.get() - 1);
            if remaining.get() == 0 {
              // Results are reported in input order, independent of completion order.
              let values: Option<Vec<T>> = slots.borrow_mut().iter_mut().map(Option::take).collect();
              match values {
                Some(values) => combined.settle(hooks, Settled::Fulfilled(values)),
                None => debug_assert!(false, "all_of slot empty after every input fulfilled"),
              }
            }
          }
          Settled::Rejected(error) => combined.settle(hooks, Settled::Rejected(error)),
        }));
      }),
    );
  }

  combined
}

/// Returns a task adopting the outcome (success or failure) of whichever input settles first in
/// scheduling order, ignoring all later settlements.
///
/// # Caller hazard
///
/// An empty input never settles: the returned task stays pending forever. This matches the
/// illustrated race semantics and is deliberately not special-cased.
pub fn first_settled<T, E>(
  hooks: &mut dyn TaskHostHooks,
  tasks: Vec<DeferredTask<T, E>>,
) -> DeferredTask<T, E>
where
  T: Clone + 'static,
  E: Clone + 'static,
{
  let combined = DeferredTask::pending_task();
  for task in tasks {
    let combined = combined.clone();
    task.mark_handled(hooks);
    task.register_reaction(
      hooks,
      Box::new(move |outcome, hooks| {
        hooks.host_enqueue_job(Job::new(JobKind::Reaction, move |hooks| {
          // Settlement is one-shot; every arrival after the first is a no-op.
          combined.settle(hooks, outcome);
        }));
      }),
    );
  }
  combined
}
