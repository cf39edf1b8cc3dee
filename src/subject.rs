use std::convert::Infallible;

use crate::{
  notification::Notification,
  observable::{Observable, Subscribable},
  observer::Observer,
  rc::MutRc,
  subscriber::Subscriber,
  subscription::Subscription,
};

mod subscribers;
use subscribers::*;
mod async_subject;
pub use async_subject::AsyncSubject;
mod behavior_subject;
pub use behavior_subject::BehaviorSubject;
mod replay_subject;
pub use replay_subject::ReplaySubject;

/// The capabilities shared by every subject: an observable that is also an
/// observer and can tell whether it has stopped.
pub trait SubjectLike<Item: 'static, Err: 'static>:
  Observer<Item, Err> + Subscribable<Item, Err> + Clone + 'static
{
  fn is_stopped(&self) -> bool;
}

/// A multicast hub: every value pushed into the subject is delivered to all
/// of its current subscribers, in subscription order.
///
/// The first terminal notification wins and is stored. Later `next` calls
/// are ignored, and a subscriber arriving after the subject stopped receives
/// the stored terminal notification right away instead of being added.
pub struct Subject<Item, Err = Infallible>(MutRc<SubjectState<Item, Err>>);

struct SubjectState<Item, Err> {
  observers: Subscribers<Item, Err>,
  status: Status<Err>,
}

enum Status<Err> {
  Active,
  Errored(Err),
  Completed,
}

impl<Item, Err> Clone for Subject<Item, Err> {
  #[inline]
  fn clone(&self) -> Self { Subject(self.0.clone()) }
}

impl<Item: Clone + 'static, Err: Clone + 'static> Default for Subject<Item, Err> {
  fn default() -> Self { Self::new() }
}

impl<Item: Clone + 'static, Err: Clone + 'static> Subject<Item, Err> {
  pub fn new() -> Self {
    Subject(MutRc::own(SubjectState { observers: Subscribers::default(), status: Status::Active }))
  }

  pub fn next(&self, value: Item) {
    let snapshot = {
      let state = self.0.rc_deref();
      if !matches!(state.status, Status::Active) {
        return;
      }
      state.observers.snapshot()
    };
    broadcast_value(snapshot, value);
  }

  pub fn error(&self, err: Err) {
    let snapshot = {
      let mut state = self.0.rc_deref_mut();
      if !matches!(state.status, Status::Active) {
        return;
      }
      state.status = Status::Errored(err.clone());
      state.observers.take()
    };
    broadcast_error(snapshot, err);
  }

  pub fn complete(&self) {
    let snapshot = {
      let mut state = self.0.rc_deref_mut();
      if !matches!(state.status, Status::Active) {
        return;
      }
      state.status = Status::Completed;
      state.observers.take()
    };
    broadcast_complete(snapshot);
  }

  pub fn is_stopped(&self) -> bool { !matches!(self.0.rc_deref().status, Status::Active) }

  pub fn observer_count(&self) -> usize { self.0.rc_deref().observers.len() }

  pub fn has_observers(&self) -> bool { self.observer_count() > 0 }

  /// The stored terminal notification, if the subject has stopped.
  pub(crate) fn terminal(&self) -> Option<Notification<Item, Err>> {
    match &self.0.rc_deref().status {
      Status::Active => None,
      Status::Errored(err) => Some(Notification::Error(err.clone())),
      Status::Completed => Some(Notification::Complete),
    }
  }

  /// Adds `subscriber` to the fan-out list. Returns `false`, without adding,
  /// if the subject has stopped or the subscriber is already closed.
  pub(crate) fn add_observer(&self, subscriber: &Subscriber<Item, Err>) -> bool {
    if subscriber.is_closed() {
      return false;
    }
    let id = {
      let mut state = self.0.rc_deref_mut();
      if !matches!(state.status, Status::Active) {
        return false;
      }
      state.observers.add(subscriber.clone())
    };
    let weak = self.0.downgrade();
    subscriber.subscription().add_fn(move || {
      if let Some(state) = weak.upgrade() {
        state.rc_deref_mut().observers.remove(id);
      }
    });
    true
  }

  /// Delivers the stored terminal notification, if any, to `subscriber`.
  pub(crate) fn emit_terminal(&self, subscriber: &Subscriber<Item, Err>) {
    if let Some(terminal) = self.terminal() {
      terminal.observe(&mut subscriber.clone());
    }
  }
}

impl<Item: Clone + 'static, Err: Clone + 'static> Subscribable<Item, Err> for Subject<Item, Err> {
  fn subscribe_with(&self, subscriber: Subscriber<Item, Err>) -> Subscription {
    if !self.add_observer(&subscriber) {
      self.emit_terminal(&subscriber);
    }
    subscriber.subscription().clone()
  }

  fn as_observable(&self) -> Observable<Item, Err> {
    let subject = self.clone();
    Observable::new(move |subscriber| {
      subject.subscribe_with(subscriber);
    })
  }
}

impl<Item: Clone + 'static, Err: Clone + 'static> Observer<Item, Err> for Subject<Item, Err> {
  #[inline]
  fn next(&mut self, value: Item) { Subject::next(self, value) }

  #[inline]
  fn error(&mut self, err: Err) { Subject::error(self, err) }

  #[inline]
  fn complete(&mut self) { Subject::complete(self) }
}

impl<Item: Clone + 'static, Err: Clone + 'static> SubjectLike<Item, Err> for Subject<Item, Err> {
  #[inline]
  fn is_stopped(&self) -> bool { Subject::is_stopped(self) }
}
