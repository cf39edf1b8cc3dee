//! Schedulers and actions.
//!
//! A [`Scheduler`] owns a queue of pending work and decides *when* that queue
//! is flushed. Every scheduler guards its flush with an `active` flag: work
//! scheduled while a flush is running is appended to the queue and drained by
//! that same flush instead of starting a nested one.
//!
//! Time is measured in `u64` ticks: milliseconds for the wall-clock
//! schedulers, frames for [`VirtualTimeScheduler`].

use std::{cell::RefCell, rc::Rc};

use crate::subscription::Subscription;

mod action_queue;
pub(crate) use action_queue::*;
mod queue_scheduler;
pub use queue_scheduler::QueueScheduler;
mod virtual_time_scheduler;
pub use virtual_time_scheduler::VirtualTimeScheduler;
#[cfg(feature = "timer")]
mod timer;
#[cfg(feature = "futures-scheduler")]
mod asap_scheduler;
#[cfg(feature = "futures-scheduler")]
pub use asap_scheduler::AsapScheduler;
#[cfg(feature = "futures-scheduler")]
mod async_scheduler;
#[cfg(feature = "futures-scheduler")]
pub use async_scheduler::AsyncScheduler;
#[cfg(feature = "futures-scheduler")]
mod event_loop;
#[cfg(feature = "futures-scheduler")]
pub use event_loop::EventLoop;

/// A queue of work plus a timing discipline.
pub trait Scheduler {
  /// The scheduler's notion of the current time.
  fn now(&self) -> u64;

  /// Queues `work` to run `work.delay()` ticks from now.
  fn enqueue(&self, work: ScheduledWork);

  /// Runs queued work that is due. Does nothing if a flush is already in
  /// progress.
  fn flush(&self);
}

/// One queued execution of an [`Action`].
///
/// The token is the cancellation handle of this single execution: once it is
/// closed the work is skipped.
pub struct ScheduledWork {
  delay: u64,
  token: Subscription,
  run: Box<dyn FnOnce()>,
}

impl ScheduledWork {
  pub fn new(delay: u64, token: Subscription, run: impl FnOnce() + 'static) -> Self {
    ScheduledWork { delay, token, run: Box::new(run) }
  }

  #[inline]
  pub fn delay(&self) -> u64 { self.delay }

  #[inline]
  pub fn token(&self) -> &Subscription { &self.token }

  /// Runs the work unless it was cancelled in the meantime.
  pub fn execute(self) {
    if !self.token.is_closed() {
      (self.run)()
    }
  }
}

/// Scheduling of stateful, re-schedulable work.
pub trait SchedulerExt: Scheduler + Clone + 'static {
  /// Schedules `work` to run with `state` after `delay` ticks.
  ///
  /// `work` receives the [`Action`] it runs in, so it can schedule itself
  /// again. The returned subscription cancels the action, including any
  /// execution it has rescheduled.
  fn schedule<S: 'static>(
    &self, work: impl FnMut(&Action<S>, S) + 'static, delay: u64, state: S,
  ) -> Subscription {
    let action = Action::new(Rc::new(self.clone()), work);
    action.schedule(state, delay);
    action.subscription().clone()
  }
}

impl<T: Scheduler + Clone + 'static> SchedulerExt for T {}

/// A schedulable unit of work bound to one scheduler.
///
/// Rescheduling from inside the work queues a new execution under the same
/// identity; unsubscribing the action cancels every execution still queued.
/// An action with nothing left queued after it ran is closed.
pub struct Action<S>(Rc<ActionInner<S>>);

struct ActionInner<S> {
  scheduler: Rc<dyn Scheduler>,
  work: RefCell<Box<dyn FnMut(&Action<S>, S)>>,
  subscription: Subscription,
}

impl<S: 'static> Action<S> {
  pub fn new(scheduler: Rc<dyn Scheduler>, work: impl FnMut(&Action<S>, S) + 'static) -> Self {
    Action(Rc::new(ActionInner {
      scheduler,
      work: RefCell::new(Box::new(work)),
      subscription: Subscription::new(),
    }))
  }

  /// Queues one execution of this action's work with `state`.
  ///
  /// The returned token cancels only this execution.
  pub fn schedule(&self, state: S, delay: u64) -> Subscription {
    if self.is_closed() {
      return Subscription::empty();
    }
    let token = Subscription::new();
    self.0.subscription.add(token.clone());

    let action = self.clone();
    let c_token = token.clone();
    let run = move || {
      action.0.subscription.remove(&c_token);
      c_token.unsubscribe();
      action.execute(state);
    };
    self
      .0
      .scheduler
      .enqueue(ScheduledWork::new(delay, token.clone(), run));
    token
  }

  fn execute(&self, state: S) {
    match self.0.work.try_borrow_mut() {
      Ok(mut work) => (*work)(self, state),
      Err(_) => tracing::warn!("action re-entered its own work, execution dropped"),
    }
    if self.0.subscription.teardown_size() == 0 {
      self.0.subscription.unsubscribe();
    }
  }
}

impl<S> Action<S> {
  #[inline]
  pub fn now(&self) -> u64 { self.0.scheduler.now() }

  #[inline]
  pub fn subscription(&self) -> &Subscription { &self.0.subscription }

  #[inline]
  pub fn is_closed(&self) -> bool { self.0.subscription.is_closed() }

  pub fn unsubscribe(&self) { self.0.subscription.unsubscribe() }
}

impl<S> Clone for Action<S> {
  #[inline]
  fn clone(&self) -> Self { Action(self.0.clone()) }
}
