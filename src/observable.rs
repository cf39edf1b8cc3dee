use std::{convert::Infallible, rc::Rc};

use crate::{
  observer::{FnObserver, Observer},
  ops::Operator,
  subscriber::Subscriber,
  subscription::Subscription,
};

mod connectable_observable;
pub use connectable_observable::*;
mod create;
pub use create::*;
mod from_iter;
pub use from_iter::*;
mod trivial;
pub use trivial::*;
mod interval;
pub use interval::*;
mod timer;
pub use timer::*;

/// A representation of any set of values over any amount of time. This is the
/// most basic building block of the crate.
///
/// An observable is a lazy description of how to produce values into a
/// [`Subscriber`]: nothing runs until it is subscribed to, and every
/// subscription runs the description again. Cloning is cheap.
pub struct Observable<Item, Err = Infallible> {
  subscribe: Rc<dyn Fn(Subscriber<Item, Err>)>,
}

impl<Item, Err> Clone for Observable<Item, Err> {
  #[inline]
  fn clone(&self) -> Self { Observable { subscribe: self.subscribe.clone() } }
}

impl<Item: 'static, Err: 'static> Observable<Item, Err> {
  /// param `subscribe`: the function that is called when the Observable is
  /// subscribed to. It is given a Subscriber, to which new values can be
  /// `next`ed, or an `error` method can be called to raise an error, or
  /// `complete` can be called to notify of a successful completion.
  pub fn new(subscribe: impl Fn(Subscriber<Item, Err>) + 'static) -> Self {
    Observable { subscribe: Rc::new(subscribe) }
  }

  /// Builds a new observable whose subscribers are produced by `operator`
  /// from the downstream subscriber, then fed into this observable.
  pub fn lift<Out: 'static>(
    &self, operator: impl Operator<Item, Out, Err> + 'static,
  ) -> Observable<Out, Err> {
    let source = self.clone();
    Observable::new(move |destination| {
      source.subscribe_with(operator.call(destination));
    })
  }
}

/// The capability of being subscribed to.
///
/// Implemented by [`Observable`], every subject and
/// [`ConnectableObservable`]. Every consumer shape (a raw [`Observer`], a
/// function triple, a single `next` callback) is normalized into a
/// [`Subscriber`] before it reaches [`Subscribable::subscribe_with`].
pub trait Subscribable<Item: 'static, Err: 'static> {
  /// Runs this source into `subscriber` and returns its subscription.
  fn subscribe_with(&self, subscriber: Subscriber<Item, Err>) -> Subscription;

  fn subscribe_observer(&self, observer: impl Observer<Item, Err> + 'static) -> Subscription {
    self.subscribe_with(Subscriber::new(observer))
  }

  fn subscribe(&self, next: impl FnMut(Item) + 'static) -> Subscription {
    self.subscribe_observer(FnObserver::new().on_next(next))
  }

  fn subscribe_err(
    &self, next: impl FnMut(Item) + 'static, error: impl FnMut(Err) + 'static,
  ) -> Subscription {
    self.subscribe_observer(FnObserver::new().on_next(next).on_error(error))
  }

  fn subscribe_complete(
    &self, next: impl FnMut(Item) + 'static, complete: impl FnMut() + 'static,
  ) -> Subscription {
    self.subscribe_observer(FnObserver::new().on_next(next).on_complete(complete))
  }

  fn subscribe_all(
    &self, next: impl FnMut(Item) + 'static, error: impl FnMut(Err) + 'static,
    complete: impl FnMut() + 'static,
  ) -> Subscription {
    self.subscribe_observer(
      FnObserver::new()
        .on_next(next)
        .on_error(error)
        .on_complete(complete),
    )
  }

  /// A plain observable view of this source.
  fn as_observable(&self) -> Observable<Item, Err>;
}

impl<Item: 'static, Err: 'static> Subscribable<Item, Err> for Observable<Item, Err> {
  fn subscribe_with(&self, subscriber: Subscriber<Item, Err>) -> Subscription {
    let subscription = subscriber.subscription().clone();
    if !subscription.is_closed() {
      (self.subscribe)(subscriber);
    }
    subscription
  }

  #[inline]
  fn as_observable(&self) -> Observable<Item, Err> { self.clone() }
}
