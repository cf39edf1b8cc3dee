use std::{
  cell::RefCell,
  fmt::{Debug, Formatter},
  rc::Rc,
};

use smallvec::SmallVec;

use crate::error::{BoxError, UnsubscriptionError};

/// A composable, idempotent teardown tree.
///
/// `Subscription` is returned from every `subscribe` call to allow
/// cancellation, and is the place operators attach cleanup of the resources
/// they own (timers, inner subscriptions) without the caller knowing about
/// them. Cloning a `Subscription` yields another handle to the same node.
#[derive(Clone, Default)]
pub struct Subscription(Rc<RefCell<Inner>>);

#[derive(Default)]
struct Inner {
  closed: bool,
  initial: Option<Teardown>,
  teardowns: SmallVec<[Teardown; 1]>,
}

enum Teardown {
  Subscription(Subscription),
  Fn(Box<dyn FnOnce()>),
  Fallible(Box<dyn FnOnce() -> Result<(), BoxError>>),
}

impl Teardown {
  fn run(self, errors: &mut Vec<BoxError>) {
    match self {
      Teardown::Subscription(s) => {
        if let Err(err) = s.try_unsubscribe() {
          errors.extend(err.into_errors());
        }
      }
      Teardown::Fn(f) => f(),
      Teardown::Fallible(f) => {
        if let Err(err) = f() {
          errors.push(err);
        }
      }
    }
  }

  fn is_closed_subscription(&self) -> bool {
    matches!(self, Teardown::Subscription(s) if s.is_closed())
  }
}

impl Subscription {
  pub fn new() -> Self { Self::default() }

  /// Creates a subscription whose own teardown is `f`. It runs before any
  /// child added later.
  pub fn from_fn(f: impl FnOnce() + 'static) -> Self {
    let inner = Inner { initial: Some(Teardown::Fn(Box::new(f))), ..Inner::default() };
    Subscription(Rc::new(RefCell::new(inner)))
  }

  /// An already closed subscription. Adding it anywhere is a no-op.
  pub fn empty() -> Self {
    let inner = Inner { closed: true, ..Inner::default() };
    Subscription(Rc::new(RefCell::new(inner)))
  }

  #[inline]
  pub fn is_closed(&self) -> bool { self.0.borrow().closed }

  /// Number of teardowns still attached.
  pub fn teardown_size(&self) -> usize { self.0.borrow().teardowns.len() }

  pub fn ptr_eq(&self, other: &Subscription) -> bool { Rc::ptr_eq(&self.0, &other.0) }

  /// Attaches `child` so it is unsubscribed together with `self`.
  ///
  /// Adding `self` or an already closed subscription does nothing. If `self`
  /// is already closed, `child` is unsubscribed right away.
  pub fn add(&self, child: Subscription) {
    if self.ptr_eq(&child) || child.is_closed() {
      return;
    }
    let mut inner = self.0.borrow_mut();
    if inner.closed {
      drop(inner);
      child.unsubscribe();
    } else {
      inner.teardowns.retain(|t| !t.is_closed_subscription());
      inner.teardowns.push(Teardown::Subscription(child));
    }
  }

  /// Attaches a teardown callback.
  pub fn add_fn(&self, f: impl FnOnce() + 'static) {
    let mut inner = self.0.borrow_mut();
    if inner.closed {
      drop(inner);
      f();
    } else {
      inner.teardowns.push(Teardown::Fn(Box::new(f)));
    }
  }

  /// Attaches a teardown callback that can fail. Its error is reported in the
  /// [`UnsubscriptionError`] returned by [`Subscription::try_unsubscribe`].
  pub fn add_fallible(&self, f: impl FnOnce() -> Result<(), BoxError> + 'static) {
    let mut inner = self.0.borrow_mut();
    if inner.closed {
      drop(inner);
      if let Err(err) = f() {
        tracing::warn!(%err, "teardown added to a closed subscription failed");
      }
    } else {
      inner.teardowns.push(Teardown::Fallible(Box::new(f)));
    }
  }

  /// Detaches `child` without unsubscribing it. Closed children are pruned
  /// along the way.
  pub fn remove(&self, child: &Subscription) {
    self.0.borrow_mut().teardowns.retain(|t| match t {
      Teardown::Subscription(s) => !s.ptr_eq(child) && !s.is_closed(),
      _ => true,
    });
  }

  /// Tears the node down, running its own teardown first and then every
  /// child in the order it was added.
  ///
  /// Only the first call does any work. A failing teardown does not stop the
  /// remaining ones; all failures are returned together.
  pub fn try_unsubscribe(&self) -> Result<(), UnsubscriptionError> {
    let (initial, teardowns) = {
      let mut inner = self.0.borrow_mut();
      if inner.closed {
        return Ok(());
      }
      inner.closed = true;
      (inner.initial.take(), std::mem::take(&mut inner.teardowns))
    };

    let mut errors = vec![];
    for teardown in initial.into_iter().chain(teardowns) {
      teardown.run(&mut errors);
    }
    if errors.is_empty() { Ok(()) } else { Err(UnsubscriptionError::new(errors)) }
  }

  /// Same as [`Subscription::try_unsubscribe`], but failures are logged
  /// instead of returned.
  pub fn unsubscribe(&self) {
    if let Err(err) = self.try_unsubscribe() {
      tracing::warn!(%err, "subscription teardown failed");
    }
  }

  /// Activates "RAII" behavior for this subscription: `unsubscribe()` is
  /// called as soon as the returned guard goes out of scope.
  ///
  /// **Attention:** if the guard isn't bound to a variable it is dropped, and
  /// the subscription torn down, immediately.
  pub fn unsubscribe_when_dropped(self) -> SubscriptionGuard { SubscriptionGuard(self) }
}

impl Debug for Subscription {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let inner = self.0.borrow();
    f.debug_struct("Subscription")
      .field("closed", &inner.closed)
      .field("teardown_count", &inner.teardowns.len())
      .finish()
  }
}

/// An RAII implementation of a "scoped subscribed" of a subscription.
/// When this structure is dropped (falls out of scope), the subscription will
/// be unsubscribed.
#[derive(Debug)]
#[must_use]
pub struct SubscriptionGuard(Subscription);

impl SubscriptionGuard {
  pub fn new(subscription: Subscription) -> Self { SubscriptionGuard(subscription) }

  pub fn subscription(&self) -> &Subscription { &self.0 }
}

impl Drop for SubscriptionGuard {
  #[inline]
  fn drop(&mut self) { self.0.unsubscribe() }
}

#[cfg(test)]
mod test {
  use std::{cell::Cell, fmt};

  use super::*;

  #[derive(Debug)]
  struct Boom(&'static str);

  impl fmt::Display for Boom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.0) }
  }

  impl std::error::Error for Boom {}

  #[test]
  fn add_children() {
    let root = Subscription::new();
    root.add(Subscription::new());
    assert_eq!(root.teardown_size(), 1);
    root.add(Subscription::new());
    assert_eq!(root.teardown_size(), 2);
    root.add_fn(|| {});
    assert_eq!(root.teardown_size(), 3);
  }

  #[test]
  fn ignore_self_and_closed() {
    let root = Subscription::new();
    root.add(root.clone());
    root.add(Subscription::empty());
    assert_eq!(root.teardown_size(), 0);
  }

  #[test]
  fn prune_closed_children_on_add() {
    let root = Subscription::new();
    let child = Subscription::new();
    root.add(child.clone());
    child.unsubscribe();
    root.add(Subscription::new());
    assert_eq!(root.teardown_size(), 1);
  }

  #[test]
  fn unsubscribe_is_idempotent() {
    let hits = Rc::new(Cell::new(0));
    let c_hits = hits.clone();
    let root = Subscription::from_fn(move || c_hits.set(c_hits.get() + 1));
    root.unsubscribe();
    root.unsubscribe();
    assert!(root.try_unsubscribe().is_ok());
    assert_eq!(hits.get(), 1);
    assert!(root.is_closed());
  }

  #[test]
  fn teardown_order() {
    let order = Rc::new(RefCell::new(vec![]));
    let o = order.clone();
    let root = Subscription::from_fn(move || o.borrow_mut().push("own"));
    let o = order.clone();
    root.add_fn(move || o.borrow_mut().push("first"));
    let o = order.clone();
    let child = Subscription::from_fn(move || o.borrow_mut().push("child"));
    root.add(child.clone());
    let o = order.clone();
    root.add_fn(move || o.borrow_mut().push("last"));

    root.unsubscribe();
    assert_eq!(*order.borrow(), vec!["own", "first", "child", "last"]);
    assert!(child.is_closed());
  }

  #[test]
  fn add_to_closed_runs_immediately() {
    let root = Subscription::new();
    root.unsubscribe();

    let ran = Rc::new(Cell::new(false));
    let c_ran = ran.clone();
    root.add_fn(move || c_ran.set(true));
    assert!(ran.get());

    let child = Subscription::new();
    root.add(child.clone());
    assert!(child.is_closed());
  }

  #[test]
  fn remove_does_not_unsubscribe() {
    let root = Subscription::new();
    let child = Subscription::new();
    root.add(child.clone());
    root.remove(&child);
    assert_eq!(root.teardown_size(), 0);
    root.unsubscribe();
    assert!(!child.is_closed());
  }

  #[test]
  fn errors_are_aggregated() {
    let ran = Rc::new(Cell::new(0));
    let root = Subscription::new();
    root.add_fallible(|| Err(Box::new(Boom("a"))));
    let c_ran = ran.clone();
    root.add_fn(move || c_ran.set(c_ran.get() + 1));
    let nested = Subscription::new();
    nested.add_fallible(|| Err(Box::new(Boom("b"))));
    root.add(nested);
    let c_ran = ran.clone();
    root.add_fallible(move || {
      c_ran.set(c_ran.get() + 1);
      Ok(())
    });

    let err = root.try_unsubscribe().unwrap_err();
    assert_eq!(ran.get(), 2);
    let messages: Vec<_> = err.errors().iter().map(|e| e.to_string()).collect();
    assert_eq!(messages, vec!["a", "b"]);
    assert!(root.try_unsubscribe().is_ok());
  }

  #[test]
  fn reentrant_unsubscribe() {
    let root = Subscription::new();
    let c_root = root.clone();
    let hits = Rc::new(Cell::new(0));
    let c_hits = hits.clone();
    root.add_fn(move || {
      c_hits.set(c_hits.get() + 1);
      c_root.unsubscribe();
    });
    root.unsubscribe();
    assert_eq!(hits.get(), 1);
  }

  #[test]
  fn guard_unsubscribes_on_drop() {
    let root = Subscription::new();
    {
      let _guard = root.clone().unsubscribe_when_dropped();
      assert!(!root.is_closed());
    }
    assert!(root.is_closed());
  }
}
