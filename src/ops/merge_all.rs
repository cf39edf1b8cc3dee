use std::collections::VecDeque;

use crate::{
  observable::{Observable, Subscribable},
  observer::Observer,
  ops::Operator,
  rc::MutRc,
  subscriber::Subscriber,
  subscription::Subscription,
};

/// Flattens an observable of observables, running at most `concurrent` inner
/// observables at a time.
///
/// Inner observables arriving while the limit is reached wait in arrival
/// order. The result completes once the outer observable has completed, no
/// inner observable is running and none is waiting. Any error, outer or
/// inner, is forwarded immediately and tears everything else down.
#[derive(Clone)]
pub struct MergeAllOp {
  concurrent: usize,
}

struct ObserverData<Item, Err> {
  subscribe_tasks: VecDeque<Observable<Item, Err>>,
  outside_completed: bool,
  subscribed: usize,
  concurrent: usize,
  /// Set while a call of `drain` is starting buffered inner observables.
  draining: bool,
}

impl<Item, Err> ObserverData<Item, Err> {
  fn is_done(&self) -> bool {
    !self.draining
      && self.outside_completed
      && self.subscribed == 0
      && self.subscribe_tasks.is_empty()
  }

  fn take_startable(&mut self) -> Option<Observable<Item, Err>> {
    if self.subscribed >= self.concurrent {
      return None;
    }
    let next = self.subscribe_tasks.pop_front()?;
    self.subscribed += 1;
    Some(next)
  }
}

pub struct OutsideObserver<Item, Err> {
  data: MutRc<ObserverData<Item, Err>>,
  destination: Subscriber<Item, Err>,
}

pub struct InnerObserver<Item, Err> {
  data: MutRc<ObserverData<Item, Err>>,
  destination: Subscriber<Item, Err>,
  subscription: Subscription,
}

impl<Item: 'static, Err: 'static> Operator<Observable<Item, Err>, Item, Err> for MergeAllOp {
  fn call(&self, destination: Subscriber<Item, Err>) -> Subscriber<Observable<Item, Err>, Err> {
    let data = MutRc::own(ObserverData {
      subscribe_tasks: VecDeque::new(),
      outside_completed: false,
      subscribed: 0,
      concurrent: self.concurrent,
      draining: false,
    });
    let observer = OutsideObserver { data, destination: destination.clone() };
    Subscriber::chained(&destination, observer)
  }
}

/// Inner subscriptions belong to the destination, so they outlive the outer
/// subscriber once the outer observable completes.
fn subscribe_inner<Item: 'static, Err: 'static>(
  inner: Observable<Item, Err>, data: &MutRc<ObserverData<Item, Err>>,
  destination: &Subscriber<Item, Err>,
) {
  let subscription = Subscription::new();
  destination.add(subscription.clone());
  let observer = InnerObserver {
    data: data.clone(),
    destination: destination.clone(),
    subscription: subscription.clone(),
  };
  inner.subscribe_with(Subscriber::with_subscription(observer, subscription));
}

/// Starts buffered inner observables while there is capacity, then completes
/// the destination if everything is done.
///
/// Inner observables that complete synchronously while this runs only free
/// their slot; the outermost call picks up the next one, so the stack stays
/// flat however many are buffered.
fn drain<Item: 'static, Err: 'static>(
  data: &MutRc<ObserverData<Item, Err>>, destination: &Subscriber<Item, Err>,
) {
  {
    let mut data = data.rc_deref_mut();
    if data.draining {
      return;
    }
    data.draining = true;
  }
  while !destination.is_closed() {
    let next = data.rc_deref_mut().take_startable();
    match next {
      Some(inner) => subscribe_inner(inner, data, destination),
      None => break,
    }
  }
  let done = {
    let mut data = data.rc_deref_mut();
    data.draining = false;
    data.is_done()
  };
  if done {
    destination.complete();
  }
}

impl<Item: 'static, Err: 'static> Observer<Observable<Item, Err>, Err>
  for OutsideObserver<Item, Err>
{
  fn next(&mut self, inner: Observable<Item, Err>) {
    self.data.rc_deref_mut().subscribe_tasks.push_back(inner);
    drain(&self.data, &self.destination);
  }

  fn error(&mut self, err: Err) { self.destination.error(err) }

  fn complete(&mut self) {
    let done = {
      let mut data = self.data.rc_deref_mut();
      data.outside_completed = true;
      data.is_done()
    };
    if done {
      self.destination.complete();
    }
  }
}

impl<Item: 'static, Err: 'static> Observer<Item, Err> for InnerObserver<Item, Err> {
  fn next(&mut self, value: Item) { self.destination.next(value) }

  fn error(&mut self, err: Err) { self.destination.error(err) }

  fn complete(&mut self) {
    self.destination.subscription().remove(&self.subscription);
    self.data.rc_deref_mut().subscribed -= 1;
    drain(&self.data, &self.destination);
  }
}

/// An outer observable emitting `sources` in order, then completing.
fn sources_of<Item: 'static, Err: 'static>(
  sources: Vec<Observable<Item, Err>>,
) -> Observable<Observable<Item, Err>, Err> {
  Observable::new(move |subscriber| {
    for source in sources.iter() {
      if subscriber.is_stopped() {
        return;
      }
      subscriber.next(source.clone());
    }
    subscriber.complete();
  })
}

impl<Item: 'static, Err: 'static> Observable<Observable<Item, Err>, Err> {
  /// Flattens inner observables, at most `concurrent` at a time. A limit of
  /// `0` is treated as `1`; `usize::MAX` means no limit.
  pub fn merge_all(&self, concurrent: usize) -> Observable<Item, Err> {
    self.lift(MergeAllOp { concurrent: concurrent.max(1) })
  }

  /// Subscribes to inner observables one after another.
  pub fn concat_all(&self) -> Observable<Item, Err> { self.merge_all(1) }
}

impl<Item: 'static, Err: 'static> Observable<Item, Err> {
  /// Interleaves all `sources` as they emit.
  pub fn merge_all_of(sources: impl IntoIterator<Item = Observable<Item, Err>>) -> Self {
    sources_of(sources.into_iter().collect()).merge_all(usize::MAX)
  }

  /// Runs all `sources` one after another.
  pub fn concat_all_of(sources: impl IntoIterator<Item = Observable<Item, Err>>) -> Self {
    sources_of(sources.into_iter().collect()).concat_all()
  }

  pub fn merge(&self, other: Observable<Item, Err>) -> Self {
    Self::merge_all_of([self.clone(), other])
  }

  pub fn concat(&self, other: Observable<Item, Err>) -> Self {
    Self::concat_all_of([self.clone(), other])
  }

  /// Maps every value to an observable and flattens the results, at most
  /// `concurrent` of them at a time.
  pub fn merge_map<Out: 'static>(
    &self, func: impl FnMut(Item) -> Observable<Out, Err> + Clone + 'static, concurrent: usize,
  ) -> Observable<Out, Err> {
    self.map(func).merge_all(concurrent)
  }

  pub fn concat_map<Out: 'static>(
    &self, func: impl FnMut(Item) -> Observable<Out, Err> + Clone + 'static,
  ) -> Observable<Out, Err> {
    self.merge_map(func, 1)
  }
}

#[cfg(test)]
mod test {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  fn recorder<Item: std::fmt::Debug + 'static>(
    source: &Observable<Item, &'static str>,
  ) -> (Subscription, Rc<RefCell<Vec<String>>>) {
    let log = Rc::new(RefCell::new(vec![]));
    let (l1, l2, l3) = (log.clone(), log.clone(), log.clone());
    let subscription = source.subscribe_all(
      move |v| l1.borrow_mut().push(format!("{v:?}")),
      move |e| l2.borrow_mut().push(format!("error {e}")),
      move || l3.borrow_mut().push("complete".to_string()),
    );
    (subscription, log)
  }

  #[test]
  fn concat_of_sync_sources() {
    let a = observable::from_iter([1, 2]).map_err(|e| match e {});
    let b = observable::from_iter([3, 4]).map_err(|e| match e {});
    let (_, log) = recorder(&a.concat(b));
    assert_eq!(*log.borrow(), vec!["1", "2", "3", "4", "complete"]);
  }

  #[test]
  fn concurrency_limit_buffers_in_order() {
    let s1 = Subject::<i32, &str>::new();
    let s2 = Subject::<i32, &str>::new();
    let s3 = Subject::<i32, &str>::new();
    let outer = Subject::<Observable<i32, &str>, &str>::new();
    let (_, log) = recorder(&outer.as_observable().merge_all(2));

    outer.next(s1.as_observable());
    outer.next(s2.as_observable());
    outer.next(s3.as_observable());
    outer.complete();
    assert_eq!(s3.observer_count(), 0);

    s1.next(1);
    s2.next(2);
    s3.next(30);
    s1.complete();
    assert_eq!(s3.observer_count(), 1);
    s3.next(3);
    s3.complete();
    assert!(!log.borrow().contains(&"complete".to_string()));
    s2.complete();
    assert_eq!(*log.borrow(), vec!["1", "2", "3", "complete"]);
  }

  #[test]
  fn outer_completion_waits_for_buffer() {
    let s1 = Subject::<i32, &str>::new();
    let outer = Subject::<Observable<i32, &str>, &str>::new();
    let (_, log) = recorder(&outer.as_observable().concat_all());

    outer.next(s1.as_observable());
    outer.next(observable::from_iter([9]).map_err(|e| match e {}));
    outer.complete();
    s1.complete();
    assert_eq!(*log.borrow(), vec!["9", "complete"]);
  }

  #[test]
  fn inner_error_tears_down_siblings() {
    let s1 = Subject::<i32, &str>::new();
    let s2 = Subject::<i32, &str>::new();
    let merged = s1.as_observable().merge(s2.as_observable());
    let (subscription, log) = recorder(&merged);
    assert_eq!(s1.observer_count(), 1);

    s2.error("boom");
    s1.next(1);
    assert_eq!(*log.borrow(), vec!["error boom"]);
    assert_eq!(s1.observer_count(), 0);
    assert!(subscription.is_closed());
  }

  #[test]
  fn zero_concurrency_is_sequential() {
    let source = observable::from_iter([1, 2])
      .map_err(|e| match e {})
      .map(|v| observable::from_iter([v, v * 10]).map_err(|e| match e {}))
      .merge_all(0);
    let (_, log) = recorder(&source);
    assert_eq!(*log.borrow(), vec!["1", "10", "2", "20", "complete"]);
  }

  #[test]
  fn merge_interleaves() {
    let s1 = Subject::<&str, &str>::new();
    let s2 = Subject::<&str, &str>::new();
    let (_, log) = recorder(&s1.as_observable().merge(s2.as_observable()));
    s1.next("a");
    s2.next("b");
    s1.next("c");
    s1.complete();
    s2.complete();
    assert_eq!(*log.borrow(), vec!["\"a\"", "\"b\"", "\"c\"", "complete"]);
  }

  #[test]
  fn concat_map_keeps_order() {
    let scheduler = VirtualTimeScheduler::new();
    let c_scheduler = scheduler.clone();
    let source = observable::from_iter([30u64, 10])
      .concat_map(move |delay| {
        observable::timer(delay, c_scheduler.clone()).map(move |_| delay)
      })
      .map_err(|e| match e {});
    let (_, log) = recorder(&source);
    scheduler.flush();
    assert_eq!(*log.borrow(), vec!["30", "10", "complete"]);
    assert_eq!(scheduler.now(), 40);
  }

  #[test]
  fn long_buffer_of_sync_inners_keeps_the_stack_flat() {
    let gate = Subject::<usize, &str>::new();
    let outer = Subject::<Observable<usize, &str>, &str>::new();
    let count = Rc::new(RefCell::new(0));
    let completed = Rc::new(RefCell::new(false));
    let (c_count, c_completed) = (count.clone(), completed.clone());
    outer.as_observable().concat_all().subscribe_complete(
      move |_| *c_count.borrow_mut() += 1,
      move || *c_completed.borrow_mut() = true,
    );

    outer.next(gate.as_observable());
    for i in 0..100_000 {
      outer.next(observable::of(i).map_err(|e| match e {}));
    }
    outer.complete();
    assert_eq!(*count.borrow(), 0);

    gate.complete();
    assert_eq!(*count.borrow(), 100_000);
    assert!(*completed.borrow());
  }

  #[test]
  fn unsubscribe_stops_everything() {
    let s1 = Subject::<i32, &str>::new();
    let outer = Subject::<Observable<i32, &str>, &str>::new();
    let (subscription, _) = recorder(&outer.as_observable().merge_all(usize::MAX));
    outer.next(s1.as_observable());
    subscription.unsubscribe();
    assert_eq!(s1.observer_count(), 0);
    assert_eq!(outer.observer_count(), 0);
  }
}
