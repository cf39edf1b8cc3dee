use crate::{
  observable::{ConnectableObservable, Observable},
  subject::{AsyncSubject, BehaviorSubject, ReplaySubject, Subject, SubjectLike},
};

impl<Item: Clone + 'static, Err: Clone + 'static> Observable<Item, Err> {
  /// Shares this observable through subjects made by `factory`. A fresh
  /// subject is made for every connection.
  pub fn multicast<S: SubjectLike<Item, Err>>(
    &self, factory: impl Fn() -> S + 'static,
  ) -> ConnectableObservable<Item, Err, S> {
    ConnectableObservable::new(self.clone(), factory)
  }

  pub fn publish(&self) -> ConnectableObservable<Item, Err> { self.multicast(Subject::new) }

  /// Like [`Observable::publish`], but subscribers first receive `value`, or
  /// the latest value once the source emitted.
  pub fn publish_behavior(
    &self, value: Item,
  ) -> ConnectableObservable<Item, Err, BehaviorSubject<Item, Err>> {
    self.multicast(move || BehaviorSubject::new(value.clone()))
  }

  /// Like [`Observable::publish`], but late subscribers receive the last
  /// `buffer_size` values first.
  pub fn publish_replay(
    &self, buffer_size: usize,
  ) -> ConnectableObservable<Item, Err, ReplaySubject<Item, Err>> {
    self.multicast(move || ReplaySubject::new(buffer_size))
  }

  /// Subscribers only receive the last value, once the source completes.
  pub fn publish_last(&self) -> ConnectableObservable<Item, Err, AsyncSubject<Item, Err>> {
    self.multicast(AsyncSubject::new)
  }

  /// Shorthand for `publish().ref_count()`.
  pub fn share(&self) -> Observable<Item, Err> { self.publish().ref_count() }
}
