//! Reusable bookkeeping for the unobserved-rejection hazard.
//!
//! A rejection with no failure continuation ever registered is a caller bug class this library
//! surfaces but does not prevent. The shape follows HTML's promise rejection tracking: two
//! per-host data structures,
//! - the **about-to-be-notified** rejections list, and
//! - the **outstanding rejected** set (rejections already reported as unobserved, with no
//!   late continuation yet),
//! driven by the `Reject`/`Handle` operations a host receives through
//! [`crate::TaskHostHooks::host_rejection_tracker`].
//!
//! See: <https://html.spec.whatwg.org/multipage/webappapis.html#the-hostpromiserejectiontracker-implementation>
//!
//! The tracker is independent of task internals: the embedding decides whether a rejection became
//! handled during its notification and passes that fact to
//! [`RejectionTracker::after_unhandled_notification`].

use crate::TaskId;
use std::collections::HashSet;
use std::mem;

/// The action requested when a previously-unobserved rejection becomes handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionHandleAction {
  /// No further action is required.
  None,
  /// Notify the embedding that `task`'s rejection, already reported as unobserved, now has a
  /// failure continuation.
  NotifyRejectionHandled { task: TaskId },
}

/// Tracks rejected tasks whose rejections have not been observed by any failure continuation.
#[derive(Debug, Default)]
pub struct RejectionTracker {
  /// Rejections awaiting an unobserved-rejection notification.
  about_to_be_notified: Vec<TaskId>,
  /// Rejections already reported as unobserved and not yet handled.
  outstanding_rejected: HashSet<TaskId>,
}

impl RejectionTracker {
  /// Creates a new empty tracker.
  pub fn new() -> Self {
    Self::default()
  }

  /// Called for [`crate::RejectionOperation::Reject`].
  pub fn on_reject(&mut self, task: TaskId) {
    self.about_to_be_notified.push(task);
  }

  /// Called for [`crate::RejectionOperation::Handle`].
  ///
  /// A rejection handled before its notification is silently dropped from the pending list; one
  /// handled after having been reported as unobserved requests a rejection-handled notification.
  pub fn on_handle(&mut self, task: TaskId) -> RejectionHandleAction {
    if let Some(index) = self.about_to_be_notified.iter().position(|t| *t == task) {
      self.about_to_be_notified.remove(index);
      return RejectionHandleAction::None;
    }
    if self.outstanding_rejected.remove(&task) {
      return RejectionHandleAction::NotifyRejectionHandled { task };
    }
    RejectionHandleAction::None
  }

  /// Returns whether any rejection is awaiting its unobserved-rejection notification.
  pub fn has_pending_notifications(&self) -> bool {
    !self.about_to_be_notified.is_empty()
  }

  /// Drains the about-to-be-notified list into a host-owned batch, in rejection order.
  ///
  /// Each drained rejection is logged as a warning: it reached a notification point with no
  /// failure continuation registered. The host should notify for each and report back through
  /// [`RejectionTracker::after_unhandled_notification`].
  pub fn drain_about_to_be_notified(&mut self) -> Vec<TaskId> {
    let batch = mem::take(&mut self.about_to_be_notified);
    for task in &batch {
      tracing::warn!(
        task = task.to_raw(),
        "task rejection was not observed by any failure continuation"
      );
    }
    batch
  }

  /// Called after the host notified for `task`.
  ///
  /// If the rejection is still unobserved, the task joins the outstanding set so that a late
  /// failure continuation can still trigger [`RejectionHandleAction::NotifyRejectionHandled`].
  pub fn after_unhandled_notification(&mut self, task: TaskId, is_handled_after_notification: bool) {
    if is_handled_after_notification {
      return;
    }
    self.outstanding_rejected.insert(task);
  }
}
