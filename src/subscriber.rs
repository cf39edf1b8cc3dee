use std::{
  cell::{Cell, RefCell},
  collections::VecDeque,
  convert::Infallible,
  rc::Rc,
};

use crate::{
  notification::Notification,
  observer::{BoxObserver, Observer},
  subscription::Subscription,
};

/// The protocol enforcer between a producer and an [`Observer`].
///
/// A subscriber forwards notifications to its destination only until it has
/// stopped. Delivering `error` or `complete` stops it and then unsubscribes
/// its [`Subscription`] exactly once; unsubscribing from outside stops it as
/// well.
///
/// A notification that arrives while the destination is still handling a
/// previous one (for example an observer that feeds the subject it listens
/// to) is queued and delivered in order once the in-flight call returns.
pub struct Subscriber<Item, Err = Infallible>(Rc<Inner<Item, Err>>);

struct Inner<Item, Err> {
  stopped: Cell<bool>,
  destination: RefCell<Option<BoxObserver<Item, Err>>>,
  backlog: RefCell<VecDeque<Notification<Item, Err>>>,
  subscription: Subscription,
}

impl<Item: 'static, Err: 'static> Subscriber<Item, Err> {
  /// Wraps `observer` into a subscriber owning a fresh subscription.
  pub fn new(observer: impl Observer<Item, Err> + 'static) -> Self {
    Self::with_subscription(observer, Subscription::new())
  }

  /// Wraps `observer` into a subscriber that owns `subscription`.
  pub fn with_subscription(
    observer: impl Observer<Item, Err> + 'static, subscription: Subscription,
  ) -> Self {
    let inner = Rc::new(Inner {
      stopped: Cell::new(subscription.is_closed()),
      destination: RefCell::new(Some(Box::new(observer))),
      backlog: RefCell::new(VecDeque::new()),
      subscription,
    });
    let weak = Rc::downgrade(&inner);
    inner.subscription.add_fn(move || {
      if let Some(inner) = weak.upgrade() {
        inner.stopped.set(true);
        inner.release();
      }
    });
    Subscriber(inner)
  }

  /// A subscriber forwarding into `observer`, whose subscription is a child of
  /// `destination`'s. Tearing the destination down stops it too.
  pub fn chained<Out, OutErr>(
    destination: &Subscriber<Out, OutErr>, observer: impl Observer<Item, Err> + 'static,
  ) -> Self {
    let subscriber = Self::new(observer);
    destination.subscription().add(subscriber.subscription().clone());
    subscriber
  }
}

impl<Item, Err> Subscriber<Item, Err> {
  pub fn next(&self, value: Item) {
    if !self.0.stopped.get() {
      self.0.deliver(Notification::Next(value));
    }
  }

  pub fn error(&self, err: Err) {
    if !self.0.stopped.replace(true) {
      self.0.deliver(Notification::Error(err));
    }
  }

  pub fn complete(&self) {
    if !self.0.stopped.replace(true) {
      self.0.deliver(Notification::Complete);
    }
  }

  /// Whether a terminal notification was delivered or the subscription was
  /// torn down.
  #[inline]
  pub fn is_stopped(&self) -> bool { self.0.stopped.get() }

  #[inline]
  pub fn is_closed(&self) -> bool { self.0.subscription.is_closed() }

  #[inline]
  pub fn subscription(&self) -> &Subscription { &self.0.subscription }

  /// Attaches a resource to this subscriber's lifetime.
  pub fn add(&self, teardown: Subscription) { self.0.subscription.add(teardown) }

  pub fn unsubscribe(&self) { self.0.subscription.unsubscribe() }
}

impl<Item, Err> Inner<Item, Err> {
  /// Delivers `notification` and everything queued behind it. Queued values
  /// are dropped once the subscription is closed; a terminal accepted before
  /// that is still delivered, and unsubscribes after it.
  fn deliver(&self, notification: Notification<Item, Err>) {
    let Ok(mut destination) = self.destination.try_borrow_mut() else {
      self.backlog.borrow_mut().push_back(notification);
      return;
    };
    let Some(observer) = destination.as_mut() else { return };
    let mut current = Some(notification);
    loop {
      let next = current.take().or_else(|| self.backlog.borrow_mut().pop_front());
      let Some(notification) = next else { break };
      let terminal = !matches!(notification, Notification::Next(_));
      if !terminal && self.subscription.is_closed() {
        continue;
      }
      notification.observe(observer);
      if terminal {
        self.subscription.unsubscribe();
      }
    }
    let released = if self.stopped.get() { destination.take() } else { None };
    drop(destination);
    drop(released);
  }

  fn release(&self) {
    let released = match self.destination.try_borrow_mut() {
      Ok(mut destination) => destination.take(),
      Err(_) => None,
    };
    drop(released);
  }
}

impl<Item, Err> Clone for Subscriber<Item, Err> {
  #[inline]
  fn clone(&self) -> Self { Subscriber(self.0.clone()) }
}

impl<Item, Err> Observer<Item, Err> for Subscriber<Item, Err> {
  #[inline]
  fn next(&mut self, value: Item) { Subscriber::next(self, value) }

  #[inline]
  fn error(&mut self, err: Err) { Subscriber::error(self, err) }

  #[inline]
  fn complete(&mut self) { Subscriber::complete(self) }
}
