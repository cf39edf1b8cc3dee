use std::{collections::VecDeque, convert::Infallible, rc::Rc};

use super::{Subject, SubjectLike};
use crate::{
  observable::{Observable, Subscribable},
  observer::Observer,
  rc::MutRc,
  scheduler::Scheduler,
  subscriber::Subscriber,
  subscription::Subscription,
};

/// A subject that records values and replays them to every new subscriber
/// before live delivery.
///
/// The buffer keeps at most `buffer_size` values and, when a window is set,
/// only values younger than `window` ticks of the given scheduler. It is
/// trimmed on every emission and every new subscription. A subscriber that
/// arrives after the subject stopped gets the replay followed by the stored
/// terminal notification.
pub struct ReplaySubject<Item, Err = Infallible> {
  subject: Subject<Item, Err>,
  buffer: MutRc<ReplayBuffer<Item>>,
}

struct ReplayBuffer<Item> {
  values: VecDeque<(u64, Item)>,
  buffer_size: usize,
  window: Option<(u64, Rc<dyn Scheduler>)>,
}

impl<Item> ReplayBuffer<Item> {
  fn now(&self) -> u64 { self.window.as_ref().map_or(0, |(_, scheduler)| scheduler.now()) }

  fn trim(&mut self) {
    while self.values.len() > self.buffer_size {
      self.values.pop_front();
    }
    if let Some((window, scheduler)) = &self.window {
      let now = scheduler.now();
      while matches!(self.values.front(), Some((at, _)) if at.saturating_add(*window) <= now) {
        self.values.pop_front();
      }
    }
  }
}

impl<Item, Err> Clone for ReplaySubject<Item, Err> {
  fn clone(&self) -> Self { ReplaySubject { subject: self.subject.clone(), buffer: self.buffer.clone() } }
}

impl<Item: Clone + 'static, Err: Clone + 'static> ReplaySubject<Item, Err> {
  /// Replays up to `buffer_size` values (at least one).
  pub fn new(buffer_size: usize) -> Self { Self::build(buffer_size, None) }

  /// Replays up to `buffer_size` values that are younger than `window` ticks
  /// of `scheduler`.
  pub fn with_window(buffer_size: usize, window: u64, scheduler: impl Scheduler + 'static) -> Self {
    Self::build(buffer_size, Some((window, Rc::new(scheduler))))
  }

  fn build(buffer_size: usize, window: Option<(u64, Rc<dyn Scheduler>)>) -> Self {
    let buffer = ReplayBuffer { values: VecDeque::new(), buffer_size: buffer_size.max(1), window };
    ReplaySubject { subject: Subject::new(), buffer: MutRc::own(buffer) }
  }

  pub fn next(&self, value: Item) {
    if self.subject.is_stopped() {
      return;
    }
    {
      let mut buffer = self.buffer.rc_deref_mut();
      let now = buffer.now();
      buffer.values.push_back((now, value.clone()));
      buffer.trim();
    }
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
  for ReplaySubject<Item, Err>
{
  fn subscribe_with(&self, subscriber: Subscriber<Item, Err>) -> Subscription {
    let replay: Vec<Item> = {
      let mut buffer = self.buffer.rc_deref_mut();
      buffer.trim();
      buffer.values.iter().map(|(_, v)| v.clone()).collect()
    };
    let added = self.subject.add_observer(&subscriber);
    for value in replay {
      if subscriber.is_stopped() {
        break;
      }
      subscriber.next(value);
    }
    if !added {
      self.subject.emit_terminal(&subscriber);
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

impl<Item: Clone + 'static, Err: Clone + 'static> Observer<Item, Err> for ReplaySubject<Item, Err> {
  fn next(&mut self, value: Item) { ReplaySubject::next(self, value) }

  fn error(&mut self, err: Err) { ReplaySubject::error(self, err) }

  fn complete(&mut self) { ReplaySubject::complete(self) }
}

impl<Item: Clone + 'static, Err: Clone + 'static> SubjectLike<Item, Err>
  for ReplaySubject<Item, Err>
{
  fn is_stopped(&self) -> bool { self.subject.is_stopped() }
}
