use crate::{
  observable::{Observable, Subscribable},
  observer::Observer,
  ops::Either,
  rc::MutRc,
  subscriber::Subscriber,
};

/// Combines the latest value of every source.
///
/// Nothing is emitted until each source has emitted at least once. After that
/// every value from any source emits `project` applied to the latest values
/// of all sources, in source order. The result completes once every source
/// has completed; a completed source keeps its last value for later
/// combinations. An error from any source, or from `project`, terminates the
/// result. No sources at all complete immediately.
pub fn try_combine_latest<Item, Out, Err, F>(
  sources: Vec<Observable<Item, Err>>, project: F,
) -> Observable<Out, Err>
where
  Item: Clone + 'static,
  Out: 'static,
  Err: 'static,
  F: FnMut(Vec<Item>) -> Result<Out, Err> + Clone + 'static,
{
  Observable::new(move |destination: Subscriber<Out, Err>| {
    if sources.is_empty() {
      destination.complete();
      return;
    }
    let size = sources.len();
    let state = MutRc::own(CombineLatestState {
      values: vec![None; size],
      waiting: size,
      active: size,
    });
    let project = MutRc::own(project.clone());
    for (index, source) in sources.iter().enumerate() {
      if destination.is_closed() {
        return;
      }
      let observer = CombineLatestObserver {
        index,
        state: state.clone(),
        project: project.clone(),
        destination: destination.clone(),
      };
      source.subscribe_with(Subscriber::chained(&destination, observer));
    }
  })
}

/// [`try_combine_latest`] with an infallible projection.
pub fn combine_latest<Item, Out, Err, F>(
  sources: Vec<Observable<Item, Err>>, mut project: F,
) -> Observable<Out, Err>
where
  Item: Clone + 'static,
  Out: 'static,
  Err: 'static,
  F: FnMut(Vec<Item>) -> Out + Clone + 'static,
{
  try_combine_latest(sources, move |values| Ok(project(values)))
}

struct CombineLatestState<Item> {
  values: Vec<Option<Item>>,
  waiting: usize,
  active: usize,
}

pub struct CombineLatestObserver<Item, Out, Err, F> {
  index: usize,
  state: MutRc<CombineLatestState<Item>>,
  project: MutRc<F>,
  destination: Subscriber<Out, Err>,
}

impl<Item, Out, Err, F> Observer<Item, Err> for CombineLatestObserver<Item, Out, Err, F>
where
  Item: Clone,
  F: FnMut(Vec<Item>) -> Result<Out, Err>,
{
  fn next(&mut self, value: Item) {
    let values = {
      let mut state = self.state.rc_deref_mut();
      if state.values[self.index].is_none() {
        state.waiting -= 1;
      }
      state.values[self.index] = Some(value);
      if state.waiting > 0 {
        return;
      }
      state.values.iter().flatten().cloned().collect::<Vec<_>>()
    };

    let result = {
      let mut project = self.project.rc_deref_mut();
      (*project)(values)
    };
    match result {
      Ok(v) => self.destination.next(v),
      Err(err) => self.destination.error(err),
    }
  }

  fn error(&mut self, err: Err) { self.destination.error(err) }

  fn complete(&mut self) {
    let done = {
      let mut state = self.state.rc_deref_mut();
      state.active -= 1;
      state.active == 0
    };
    if done {
      self.destination.complete();
    }
  }
}

impl<Item: Clone + 'static, Err: 'static> Observable<Item, Err> {
  /// Combines the latest values of `self` and `other` through `func`.
  pub fn combine_latest_with<B, Out>(
    &self, other: Observable<B, Err>, mut func: impl FnMut(Item, B) -> Out + Clone + 'static,
  ) -> Observable<Out, Err>
  where
    B: Clone + 'static,
    Out: 'static,
  {
    let sources = vec![self.map(Either::Left), other.map(Either::Right)];
    combine_latest(sources, move |values| {
      let mut values = values.into_iter();
      match (values.next(), values.next()) {
        (Some(Either::Left(a)), Some(Either::Right(b))) => func(a, b),
        _ => unreachable!("combined values keep their source order"),
      }
    })
  }
}

#[cfg(test)]
mod test {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  #[test]
  fn waits_for_every_source() {
    let a = Subject::<i32>::new();
    let b = Subject::<i32>::new();
    let log = Rc::new(RefCell::new(vec![]));
    let (c_log, c_log2) = (log.clone(), log.clone());
    a.as_observable()
      .combine_latest_with(b.as_observable(), |a, b| a + b)
      .subscribe_complete(
        move |v| c_log.borrow_mut().push(v.to_string()),
        move || c_log2.borrow_mut().push("complete".to_string()),
      );

    a.next(1);
    assert!(log.borrow().is_empty());
    b.next(10);
    b.complete();
    a.next(2);
    assert_eq!(*log.borrow(), vec!["11", "12"]);
    a.complete();
    assert_eq!(*log.borrow(), vec!["11", "12", "complete"]);
  }

  #[test]
  fn latest_values_in_source_order() {
    let a = Subject::<&str>::new();
    let b = Subject::<&str>::new();
    let c = Subject::<&str>::new();
    let log = Rc::new(RefCell::new(vec![]));
    let c_log = log.clone();
    combine_latest(
      vec![a.as_observable(), b.as_observable(), c.as_observable()],
      |values| values.concat(),
    )
    .subscribe(move |v| c_log.borrow_mut().push(v));

    c.next("c");
    a.next("a");
    b.next("b");
    a.next("A");
    assert_eq!(*log.borrow(), vec!["abc", "Abc"]);
  }

  #[test]
  fn no_sources_completes() {
    let completed = Rc::new(RefCell::new(false));
    let c_completed = completed.clone();
    combine_latest(Vec::<Observable<i32>>::new(), |v| v.len())
      .subscribe_complete(|_| {}, move || *c_completed.borrow_mut() = true);
    assert!(*completed.borrow());
  }

  #[test]
  fn project_error_terminates() {
    let a = Subject::<i32, &str>::new();
    let b = Subject::<i32, &str>::new();
    let errors = Rc::new(RefCell::new(vec![]));
    let c_errors = errors.clone();
    try_combine_latest(vec![a.as_observable(), b.as_observable()], |values| {
      if values.iter().sum::<i32>() > 5 { Err("too big") } else { Ok(values) }
    })
    .subscribe_err(|_| {}, move |e| c_errors.borrow_mut().push(e));

    a.next(1);
    b.next(2);
    b.next(9);
    assert_eq!(*errors.borrow(), vec!["too big"]);
    assert_eq!(a.observer_count(), 0);
    assert_eq!(b.observer_count(), 0);
  }

  #[test]
  fn source_error_tears_down_others() {
    let a = Subject::<i32, &str>::new();
    let b = Subject::<i32, &str>::new();
    let errors = Rc::new(RefCell::new(vec![]));
    let c_errors = errors.clone();
    combine_latest(vec![a.as_observable(), b.as_observable()], |v| v)
      .subscribe_err(|_| {}, move |e| c_errors.borrow_mut().push(e));

    b.error("b failed");
    a.error("a failed");
    assert_eq!(*errors.borrow(), vec!["b failed"]);
    assert_eq!(a.observer_count(), 0);
  }
}
