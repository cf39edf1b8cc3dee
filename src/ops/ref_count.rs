use crate::{
  observable::{ConnectState, ConnectableObservable, Observable, Subscribable},
  rc::WeakMutRc,
  subject::SubjectLike,
};

impl<Item, Err, S> ConnectableObservable<Item, Err, S>
where
  Item: 'static,
  Err: 'static,
  S: SubjectLike<Item, Err>,
{
  /// An observable that connects automatically.
  ///
  /// The first subscriber connects the connectable; later subscribers share
  /// that connection. When the last subscriber leaves, the connection is torn
  /// down, and the next subscriber starts a fresh one.
  pub fn ref_count(&self) -> Observable<Item, Err> {
    let connectable = self.clone();
    Observable::new(move |subscriber| {
      let (first, generation) = {
        let mut state = connectable.state.rc_deref_mut();
        state.ref_count += 1;
        (state.ref_count == 1, state.generation)
      };
      let weak = connectable.state.downgrade();
      subscriber.subscription().add_fn(move || release(&weak, generation));

      connectable.subscribe_with(subscriber.clone());
      if first && !subscriber.is_closed() {
        connectable.connect();
      }
    })
  }
}

fn release<S>(state: &WeakMutRc<ConnectState<S>>, generation: usize) {
  let Some(state) = state.upgrade() else { return };
  let connection = {
    let mut state = state.rc_deref_mut();
    if state.generation != generation || state.ref_count == 0 {
      return;
    }
    state.ref_count -= 1;
    if state.ref_count > 0 {
      return;
    }
    tracing::debug!("last ref-counted subscriber left, disconnecting");
    state.reset()
  };
  if let Some(connection) = connection {
    connection.unsubscribe();
  }
}

#[cfg(test)]
mod test {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  /// A source that counts how often it is subscribed and is fed by `feed`.
  fn counted(feed: &Subject<i32>, runs: &Rc<RefCell<usize>>) -> Observable<i32> {
    let (feed, runs) = (feed.clone(), runs.clone());
    Observable::new(move |subscriber| {
      *runs.borrow_mut() += 1;
      feed.subscribe_with(subscriber);
    })
  }

  #[test]
  fn connects_once_for_many_subscribers() {
    let feed = Subject::new();
    let runs = Rc::new(RefCell::new(0));
    let shared = counted(&feed, &runs).publish().ref_count();

    let seen = Rc::new(RefCell::new(vec![]));
    let (c1, c2) = (seen.clone(), seen.clone());
    let first = shared.subscribe(move |v| c1.borrow_mut().push(("a", v)));
    let second = shared.subscribe(move |v| c2.borrow_mut().push(("b", v)));
    assert_eq!(*runs.borrow(), 1);

    feed.next(1);
    assert_eq!(*seen.borrow(), vec![("a", 1), ("b", 1)]);

    first.unsubscribe();
    assert_eq!(feed.observer_count(), 1);
    second.unsubscribe();
    assert_eq!(feed.observer_count(), 0);
  }

  #[test]
  fn reconnects_after_dropping_to_zero() {
    let feed = Subject::new();
    let runs = Rc::new(RefCell::new(0));
    let shared = counted(&feed, &runs).share();

    shared.subscribe(|_| {}).unsubscribe();
    assert_eq!(*runs.borrow(), 1);
    let again = shared.subscribe(|_| {});
    assert_eq!(*runs.borrow(), 2);
    assert_eq!(feed.observer_count(), 1);
    again.unsubscribe();
  }

  #[test]
  fn stale_release_keeps_new_connection() {
    let feed = Subject::new();
    let runs = Rc::new(RefCell::new(0));
    let connectable = counted(&feed, &runs).publish();
    let shared = connectable.ref_count();

    let old = shared.subscribe(|_| {});
    connectable.connect().unsubscribe();
    let fresh = shared.subscribe(|_| {});
    assert_eq!(*runs.borrow(), 2);

    old.unsubscribe();
    assert!(connectable.is_connected());
    assert_eq!(feed.observer_count(), 1);
    fresh.unsubscribe();
    assert!(!connectable.is_connected());
  }

  #[test]
  fn synchronous_source_restarts_per_subscriber() {
    let runs = Rc::new(RefCell::new(0));
    let c_runs = runs.clone();
    let shared = Observable::<i32>::new(move |subscriber| {
      *c_runs.borrow_mut() += 1;
      subscriber.next(7);
      subscriber.complete();
    })
    .share();

    let seen = Rc::new(RefCell::new(vec![]));
    let (c1, c2) = (seen.clone(), seen.clone());
    shared.subscribe(move |v| c1.borrow_mut().push(v));
    shared.subscribe(move |v| c2.borrow_mut().push(v));
    assert_eq!(*runs.borrow(), 2);
    assert_eq!(*seen.borrow(), vec![7, 7]);
  }
}
