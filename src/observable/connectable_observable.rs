use std::{convert::Infallible, rc::Rc};

use crate::{
  observable::{Observable, Subscribable},
  observer::Observer,
  rc::{MutRc, WeakMutRc},
  subject::{Subject, SubjectLike},
  subscriber::Subscriber,
  subscription::Subscription,
};

/// A cold observable made shareable through an explicit [`connect`].
///
/// Subscribers attach to an internal subject; nothing reaches them until
/// `connect` subscribes that subject to the source. One connection serves
/// every subscriber. When the source terminates or the connection is
/// unsubscribed the connectable resets, so the next `connect` starts a fresh
/// execution of the source with a fresh subject.
///
/// [`connect`]: ConnectableObservable::connect
pub struct ConnectableObservable<Item, Err = Infallible, S = Subject<Item, Err>> {
  source: Observable<Item, Err>,
  factory: Rc<dyn Fn() -> S>,
  pub(crate) state: MutRc<ConnectState<S>>,
}

pub(crate) struct ConnectState<S> {
  subject: Option<S>,
  connection: Option<Subscription>,
  pub(crate) ref_count: usize,
  /// Bumped on every reset, so releases from an older connection are ignored.
  pub(crate) generation: usize,
}

impl<Item, Err, S> Clone for ConnectableObservable<Item, Err, S> {
  fn clone(&self) -> Self {
    ConnectableObservable {
      source: self.source.clone(),
      factory: self.factory.clone(),
      state: self.state.clone(),
    }
  }
}

impl<Item, Err, S> ConnectableObservable<Item, Err, S>
where
  Item: 'static,
  Err: 'static,
  S: SubjectLike<Item, Err>,
{
  pub fn new(source: Observable<Item, Err>, factory: impl Fn() -> S + 'static) -> Self {
    ConnectableObservable {
      source,
      factory: Rc::new(factory),
      state: MutRc::own(ConnectState {
        subject: None,
        connection: None,
        ref_count: 0,
        generation: 0,
      }),
    }
  }

  /// Subscribes the subject to the source, unless already connected.
  ///
  /// Returns the connection; unsubscribing it disconnects every subscriber
  /// from the source.
  pub fn connect(&self) -> Subscription {
    let existing = self.state.rc_deref().connection.clone();
    if let Some(connection) = existing {
      return connection;
    }

    let subject = self.subject();
    let connection = Subscription::new();
    self.state.rc_deref_mut().connection = Some(connection.clone());
    tracing::debug!("connectable observable connecting to its source");

    let weak = self.state.downgrade();
    connection.add_fn(move || {
      if let Some(state) = weak.upgrade() {
        let mut state = state.rc_deref_mut();
        if state.connection.as_ref().is_some_and(Subscription::is_closed) {
          tracing::debug!("connection torn down, connectable observable reset");
          state.reset();
        }
      }
    });

    let observer =
      ConnectObserver { subject, state: self.state.downgrade(), connection: connection.clone() };
    self
      .source
      .subscribe_with(Subscriber::with_subscription(observer, connection.clone()));
    connection
  }

  /// Whether a connection is currently open.
  pub fn is_connected(&self) -> bool { self.state.rc_deref().connection.is_some() }

  /// The current subject, created on demand. A stopped subject is replaced.
  fn subject(&self) -> S {
    {
      let state = self.state.rc_deref();
      if let Some(subject) = state.subject.as_ref().filter(|s| !s.is_stopped()) {
        return subject.clone();
      }
    }
    let subject = (self.factory)();
    self.state.rc_deref_mut().subject = Some(subject.clone());
    subject
  }
}

impl<S> ConnectState<S> {
  pub(crate) fn reset(&mut self) -> Option<Subscription> {
    self.subject = None;
    self.ref_count = 0;
    self.generation += 1;
    self.connection.take()
  }
}

impl<Item, Err, S> Subscribable<Item, Err> for ConnectableObservable<Item, Err, S>
where
  Item: 'static,
  Err: 'static,
  S: SubjectLike<Item, Err>,
{
  fn subscribe_with(&self, subscriber: Subscriber<Item, Err>) -> Subscription {
    self.subject().subscribe_with(subscriber)
  }

  fn as_observable(&self) -> Observable<Item, Err> {
    let connectable = self.clone();
    Observable::new(move |subscriber| {
      connectable.subscribe_with(subscriber);
    })
  }
}

/// Forwards the source into the subject. A terminal notification detaches
/// the connection before it reaches the subject.
struct ConnectObserver<S> {
  subject: S,
  state: WeakMutRc<ConnectState<S>>,
  connection: Subscription,
}

impl<S> ConnectObserver<S> {
  fn detach(&self) {
    if let Some(state) = self.state.upgrade() {
      let mut state = state.rc_deref_mut();
      if state.connection.as_ref().is_some_and(|c| c.ptr_eq(&self.connection)) {
        tracing::debug!("source terminated, connectable observable reset");
        state.reset();
      }
    }
  }
}

impl<Item, Err, S> Observer<Item, Err> for ConnectObserver<S>
where
  S: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) { self.subject.next(value) }

  fn error(&mut self, err: Err) {
    self.detach();
    self.subject.error(err)
  }

  fn complete(&mut self) {
    self.detach();
    self.subject.complete()
  }
}

#[cfg(test)]
mod test {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  fn counted_source(runs: &Rc<RefCell<usize>>) -> Observable<i32> {
    let c_runs = runs.clone();
    Observable::new(move |subscriber| {
      *c_runs.borrow_mut() += 1;
      subscriber.next(1);
      subscriber.next(2);
      subscriber.complete();
    })
  }

  #[test]
  fn nothing_flows_before_connect() {
    let runs = Rc::new(RefCell::new(0));
    let connectable = counted_source(&runs).publish();
    let seen = Rc::new(RefCell::new(vec![]));
    let (c1, c2) = (seen.clone(), seen.clone());
    connectable.subscribe(move |v| c1.borrow_mut().push(("a", v)));
    connectable.subscribe(move |v| c2.borrow_mut().push(("b", v)));
    assert!(seen.borrow().is_empty());

    connectable.connect();
    assert_eq!(*runs.borrow(), 1);
    assert_eq!(*seen.borrow(), vec![("a", 1), ("b", 1), ("a", 2), ("b", 2)]);
  }

  #[test]
  fn connect_is_idempotent() {
    let subject = Subject::<i32>::new();
    let connectable = subject.as_observable().publish();
    let first = connectable.connect();
    let second = connectable.connect();
    assert!(first.ptr_eq(&second));
    assert_eq!(subject.observer_count(), 1);

    first.unsubscribe();
    assert!(!connectable.is_connected());
    assert_eq!(subject.observer_count(), 0);
  }

  #[test]
  fn source_termination_allows_fresh_connect() {
    let runs = Rc::new(RefCell::new(0));
    let connectable = counted_source(&runs).publish();
    let connection = connectable.connect();
    assert!(connection.is_closed());
    assert!(!connectable.is_connected());

    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    connectable.subscribe(move |v| c_seen.borrow_mut().push(v));
    connectable.connect();
    assert_eq!(*runs.borrow(), 2);
    assert_eq!(*seen.borrow(), vec![1, 2]);
  }

  #[test]
  fn error_reaches_subscribers() {
    let connectable = observable::throw_err::<i32, _>("bad").publish();
    let errors = Rc::new(RefCell::new(vec![]));
    let c_errors = errors.clone();
    connectable.subscribe_err(|_| {}, move |e| c_errors.borrow_mut().push(e));
    connectable.connect();
    assert_eq!(*errors.borrow(), vec!["bad"]);
    assert!(!connectable.is_connected());
  }
}
