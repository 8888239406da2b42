use std::cell::RefCell;
use std::rc::Rc;

use deferred_task::{Completion, DeferredTask, MicrotaskQueue, Settled};
use proptest::collection::vec;
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum SettleOp {
  Fulfill(i64),
  Reject(i64),
}

fn settle_op() -> impl Strategy<Value = SettleOp> {
  prop_oneof![
    any::<i64>().prop_map(SettleOp::Fulfill),
    any::<i64>().prop_map(SettleOp::Reject),
  ]
}

fn expected_outcome(op: SettleOp) -> Settled<i64, i64> {
  match op {
    SettleOp::Fulfill(value) => Settled::Fulfilled(value),
    SettleOp::Reject(error) => Settled::Rejected(error),
  }
}

proptest! {
  #[test]
  fn the_first_settlement_wins_and_later_capability_calls_change_nothing(
    ops in vec(settle_op(), 1..8)
  ) {
    let mut queue = MicrotaskQueue::new();
    let (task, capability) = DeferredTask::<i64, i64>::with_capability();

    for op in &ops {
      match *op {
        SettleOp::Fulfill(value) => capability.fulfill(&mut queue, value),
        SettleOp::Reject(error) => capability.reject(&mut queue, error),
      }
    }

    let expected = expected_outcome(ops[0]);
    prop_assert_eq!(task.settled(), Some(expected.clone()));
    queue.perform_microtask_checkpoint();
    prop_assert_eq!(task.settled(), Some(expected));
  }

  #[test]
  fn every_observer_sees_the_same_outcome_including_late_registrants(
    ops in vec(settle_op(), 1..8),
    early_observers in 1usize..4,
    late_observers in 1usize..4
  ) {
    let mut queue = MicrotaskQueue::new();
    let (task, capability) = DeferredTask::<i64, i64>::with_capability();
    let seen: Rc<RefCell<Vec<Settled<i64, i64>>>> = Rc::new(RefCell::new(Vec::new()));

    let observe = |queue: &mut MicrotaskQueue, seen: &Rc<RefCell<Vec<Settled<i64, i64>>>>| {
      let on_fulfilled_log = Rc::clone(seen);
      let on_rejected_log = Rc::clone(seen);
      task.then_or_else(
        queue,
        move |value| {
          on_fulfilled_log.borrow_mut().push(Settled::Fulfilled(value));
          Completion::Value(())
        },
        move |error| {
          on_rejected_log.borrow_mut().push(Settled::Rejected(error));
          Completion::Value(())
        },
      );
    };

    for _ in 0..early_observers {
      observe(&mut queue, &seen);
    }

    for op in &ops {
      match *op {
        SettleOp::Fulfill(value) => capability.fulfill(&mut queue, value),
        SettleOp::Reject(error) => capability.reject(&mut queue, error),
      }
    }
    queue.perform_microtask_checkpoint();

    for _ in 0..late_observers {
      observe(&mut queue, &seen);
    }
    queue.perform_microtask_checkpoint();

    let expected = expected_outcome(ops[0]);
    let seen = seen.borrow();
    prop_assert_eq!(seen.len(), early_observers + late_observers);
    prop_assert!(seen.iter().all(|outcome| *outcome == expected));
  }
}
