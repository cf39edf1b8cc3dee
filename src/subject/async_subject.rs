use std::convert::Infallible;

use super::{Subject, SubjectLike};
use crate::{
  notification::Notification,
  observable::{Observable, Subscribable},
  observer::Observer,
  rc::MutRc,
  subscriber::Subscriber,
  subscription::Subscription,
};

/// A subject that only emits the last value it received, and only once it
/// completes. An error is forwarded without any value.
pub struct AsyncSubject<Item, Err = Infallible> {
  subject: Subject<Item, Err>,
  last: MutRc<Option<Item>>,
}

impl<Item, Err> Clone for AsyncSubject<Item, Err> {
  fn clone(&self) -> Self { AsyncSubject { subject: self.subject.clone(), last: self.last.clone() } }
}

impl<Item: Clone + 'static, Err: Clone + 'static> Default for AsyncSubject<Item, Err> {
  fn default() -> Self { Self::new() }
}

impl<Item: Clone + 'static, Err: Clone + 'static> AsyncSubject<Item, Err> {
  pub fn new() -> Self { AsyncSubject { subject: Subject::new(), last: MutRc::own(None) } }

  pub fn next(&self, value: Item) {
    if !self.subject.is_stopped() {
      *self.last.rc_deref_mut() = Some(value);
    }
  }

  #[inline]
  pub fn error(&self, err: Err) { self.subject.error(err) }

  pub fn complete(&self) {
    if self.subject.is_stopped() {
      return;
    }
    let last = self.last.rc_deref().clone();
    if let Some(value) = last {
      self.subject.next(value);
    }
    self.subject.complete();
  }

  #[inline]
  pub fn is_stopped(&self) -> bool { self.subject.is_stopped() }

  #[inline]
  pub fn observer_count(&self) -> usize { self.subject.observer_count() }
}

impl<Item: Clone + 'static, Err: Clone + 'static> Subscribable<Item, Err>
  for AsyncSubject<Item, Err>
{
  fn subscribe_with(&self, subscriber: Subscriber<Item, Err>) -> Subscription {
    if let Some(Notification::Complete) = self.subject.terminal() {
      let last = self.last.rc_deref().clone();
      if let Some(value) = last {
        subscriber.next(value);
      }
      subscriber.complete();
      return subscriber.subscription().clone();
    }
    self.subject.subscribe_with(subscriber)
  }

  fn as_observable(&self) -> Observable<Item, Err> {
    let subject = self.clone();
    Observable::new(move |subscriber| {
      subject.subscribe_with(subscriber);
    })
  }
}

impl<Item: Clone + 'static, Err: Clone + 'static> Observer<Item, Err> for AsyncSubject<Item, Err> {
  fn next(&mut self, value: Item) { AsyncSubject::next(self, value) }

  fn error(&mut self, err: Err) { AsyncSubject::error(self, err) }

  fn complete(&mut self) { AsyncSubject::complete(self) }
}

impl<Item: Clone + 'static, Err: Clone + 'static> SubjectLike<Item, Err>
  for AsyncSubject<Item, Err>
{
  fn is_stopped(&self) -> bool { self.subject.is_stopped() }
}
