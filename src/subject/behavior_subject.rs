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

/// A subject that always holds a current value.
///
/// Every new subscriber synchronously receives the current value, then every
/// value after it.
pub struct BehaviorSubject<Item, Err = Infallible> {
  subject: Subject<Item, Err>,
  value: MutRc<Item>,
}

impl<Item, Err> Clone for BehaviorSubject<Item, Err> {
  fn clone(&self) -> Self { BehaviorSubject { subject: self.subject.clone(), value: self.value.clone() } }
}

impl<Item: Clone + 'static, Err: Clone + 'static> BehaviorSubject<Item, Err> {
  pub fn new(value: Item) -> Self { BehaviorSubject { subject: Subject::new(), value: MutRc::own(value) } }

  /// The current value, or the error the subject stopped with.
  pub fn value(&self) -> Result<Item, Err> {
    match self.subject.terminal() {
      Some(Notification::Error(err)) => Err(err),
      _ => Ok(self.value.rc_deref().clone()),
    }
  }

  pub fn next(&self, value: Item) {
    if self.subject.is_stopped() {
      return;
    }
    *self.value.rc_deref_mut() = value.clone();
    self.subject.next(value);
  }

  #[inline]
  pub fn error(&self, err: Err) { self.subject.error(err) }

  #[inline]
  pub fn complete(&self) { self.subject.complete() }

  #[inline]
  pub fn is_stopped(&self) -> bool { self.subject.is_stopped() }

  #[inline]
  pub fn observer_count(&self) -> usize { self.subject.observer_count() }
}

impl<Item: Clone + 'static, Err: Clone + 'static> Subscribable<Item, Err>
  for BehaviorSubject<Item, Err>
{
  fn subscribe_with(&self, subscriber: Subscriber<Item, Err>) -> Subscription {
    let subscription = self.subject.subscribe_with(subscriber.clone());
    if !subscriber.is_stopped() {
      let current = self.value.rc_deref().clone();
      subscriber.next(current);
    }
    subscription
  }

  fn as_observable(&self) -> Observable<Item, Err> {
    let subject = self.clone();
    Observable::new(move |subscriber| {
      subject.subscribe_with(subscriber);
    })
  }
}

impl<Item: Clone + 'static, Err: Clone + 'static> Observer<Item, Err>
  for BehaviorSubject<Item, Err>
{
  fn next(&mut self, value: Item) { BehaviorSubject::next(self, value) }

  fn error(&mut self, err: Err) { BehaviorSubject::error(self, err) }

  fn complete(&mut self) { BehaviorSubject::complete(self) }
}

impl<Item: Clone + 'static, Err: Clone + 'static> SubjectLike<Item, Err>
  for BehaviorSubject<Item, Err>
{
  fn is_stopped(&self) -> bool { self.subject.is_stopped() }
}
