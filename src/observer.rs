//! Observer trait and the function-triple observer.
//!
//! The Observer trait defines the consumer of data in the reactive pattern.
//! It provides three methods: next (for values), error (for errors), and
//! complete (for stream completion).

use crate::rc::MutRc;

/// Observer trait: The consumer of data in reactive programming
///
/// An Observer receives values, errors, and completion notifications from
/// an Observable. Raw observers make no promises about what happens after a
/// terminal call; wrap them in a [`Subscriber`](crate::subscriber::Subscriber)
/// to get terminal exclusivity.
pub trait Observer<Item, Err> {
  /// Receive the next value from the observable
  fn next(&mut self, value: Item);

  /// Handle an error from the observable
  fn error(&mut self, err: Err);

  /// Handle completion of the observable
  fn complete(&mut self);
}

/// Type-erased observer.
pub type BoxObserver<Item, Err> = Box<dyn Observer<Item, Err>>;

impl<Item, Err, O> Observer<Item, Err> for Box<O>
where
  O: Observer<Item, Err> + ?Sized,
{
  #[inline]
  fn next(&mut self, value: Item) { (**self).next(value) }

  #[inline]
  fn error(&mut self, err: Err) { (**self).error(err) }

  #[inline]
  fn complete(&mut self) { (**self).complete() }
}

impl<Item, Err, O> Observer<Item, Err> for MutRc<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) { self.rc_deref_mut().next(value) }

  fn error(&mut self, err: Err) { self.rc_deref_mut().error(err) }

  fn complete(&mut self) { self.rc_deref_mut().complete() }
}

// ============================================================================
// FnObserver
// ============================================================================

/// An observer built from up to three callbacks.
///
/// Missing callbacks ignore their notification, except `error`: an error that
/// reaches an observer without an error handler is reported as a warning.
pub struct FnObserver<Item, Err> {
  next: Option<Box<dyn FnMut(Item)>>,
  error: Option<Box<dyn FnMut(Err)>>,
  complete: Option<Box<dyn FnMut()>>,
}

impl<Item, Err> FnObserver<Item, Err> {
  pub fn new() -> Self { FnObserver { next: None, error: None, complete: None } }

  pub fn on_next(mut self, f: impl FnMut(Item) + 'static) -> Self {
    self.next = Some(Box::new(f));
    self
  }

  pub fn on_error(mut self, f: impl FnMut(Err) + 'static) -> Self {
    self.error = Some(Box::new(f));
    self
  }

  pub fn on_complete(mut self, f: impl FnMut() + 'static) -> Self {
    self.complete = Some(Box::new(f));
    self
  }
}

impl<Item, Err> Default for FnObserver<Item, Err> {
  fn default() -> Self { Self::new() }
}

impl<Item, Err> Observer<Item, Err> for FnObserver<Item, Err> {
  fn next(&mut self, value: Item) {
    if let Some(next) = self.next.as_mut() {
      next(value)
    }
  }

  fn error(&mut self, err: Err) {
    match self.error.as_mut() {
      Some(error) => error(err),
      None => tracing::warn!("error notification reached an observer without an error handler"),
    }
  }

  fn complete(&mut self) {
    if let Some(complete) = self.complete.as_mut() {
      complete()
    }
  }
}

#[cfg(test)]
mod test {
  use std::{cell::RefCell, rc::Rc};

  use super::*;

  #[test]
  fn fn_observer_dispatch() {
    let log = Rc::new(RefCell::new(vec![]));
    let (l1, l2, l3) = (log.clone(), log.clone(), log.clone());
    let mut observer = FnObserver::new()
      .on_next(move |v: i32| l1.borrow_mut().push(format!("next {v}")))
      .on_error(move |e: &str| l2.borrow_mut().push(format!("error {e}")))
      .on_complete(move || l3.borrow_mut().push("complete".to_string()));

    observer.next(1);
    observer.error("boom");
    observer.complete();
    assert_eq!(*log.borrow(), vec!["next 1", "error boom", "complete"]);
  }

  #[test]
  fn missing_callbacks_are_ignored() {
    let mut observer = FnObserver::<i32, &str>::new();
    observer.next(1);
    observer.error("ignored");
    observer.complete();
  }

  #[test]
  fn boxed_and_shared() {
    let hits = Rc::new(RefCell::new(0));
    let c_hits = hits.clone();
    let mut boxed: BoxObserver<i32, ()> =
      Box::new(FnObserver::new().on_next(move |v| *c_hits.borrow_mut() += v));
    boxed.next(2);

    let mut shared = MutRc::own(boxed);
    shared.next(3);
    assert_eq!(*hits.borrow(), 5);
  }
}
