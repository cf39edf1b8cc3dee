use std::collections::VecDeque;

use crate::{
  observable::{Observable, Subscribable},
  observer::Observer,
  ops::Either,
  rc::MutRc,
  subscriber::Subscriber,
};

/// Pairs up the sources in lock-step.
///
/// Every source's values are buffered in arrival order. As soon as each
/// buffer holds a value, one value is taken from the front of every buffer
/// and `project` is applied to them. The result completes when a completed
/// source has nothing buffered, since no further combination is possible.
pub fn try_zip<Item, Out, Err, F>(sources: Vec<Observable<Item, Err>>, project: F) -> Observable<Out, Err>
where
  Item: 'static,
  Out: 'static,
  Err: 'static,
  F: FnMut(Vec<Item>) -> Result<Out, Err> + Clone + 'static,
{
  Observable::new(move |destination: Subscriber<Out, Err>| {
    if sources.is_empty() {
      destination.complete();
      return;
    }
    let state = MutRc::own(ZipState {
      buffers: sources.iter().map(|_| VecDeque::new()).collect(),
      completed: vec![false; sources.len()],
    });
    let project = MutRc::own(project.clone());
    for (index, source) in sources.iter().enumerate() {
      if destination.is_closed() {
        return;
      }
      let observer = ZipObserver {
        index,
        state: state.clone(),
        project: project.clone(),
        destination: destination.clone(),
      };
      source.subscribe_with(Subscriber::chained(&destination, observer));
    }
  })
}

/// [`try_zip`] with an infallible projection.
pub fn zip<Item, Out, Err, F>(sources: Vec<Observable<Item, Err>>, mut project: F) -> Observable<Out, Err>
where
  Item: 'static,
  Out: 'static,
  Err: 'static,
  F: FnMut(Vec<Item>) -> Out + Clone + 'static,
{
  try_zip(sources, move |values| Ok(project(values)))
}

struct ZipState<Item> {
  buffers: Vec<VecDeque<Item>>,
  completed: Vec<bool>,
}

impl<Item> ZipState<Item> {
  fn take_front(&mut self) -> Option<Vec<Item>> {
    if self.buffers.iter().any(VecDeque::is_empty) {
      return None;
    }
    self.buffers.iter_mut().map(VecDeque::pop_front).collect()
  }

  fn is_exhausted(&self) -> bool {
    self
      .completed
      .iter()
      .zip(self.buffers.iter())
      .any(|(completed, buffer)| *completed && buffer.is_empty())
  }
}

pub struct ZipObserver<Item, Out, Err, F> {
  index: usize,
  state: MutRc<ZipState<Item>>,
  project: MutRc<F>,
  destination: Subscriber<Out, Err>,
}

impl<Item, Out, Err, F> Observer<Item, Err> for ZipObserver<Item, Out, Err, F>
where
  F: FnMut(Vec<Item>) -> Result<Out, Err>,
{
  fn next(&mut self, value: Item) {
    let (values, exhausted) = {
      let mut state = self.state.rc_deref_mut();
      state.buffers[self.index].push_back(value);
      let values = state.take_front();
      (values, state.is_exhausted())
    };

    if let Some(values) = values {
      let result = {
        let mut project = self.project.rc_deref_mut();
        (*project)(values)
      };
      match result {
        Ok(v) => self.destination.next(v),
        Err(err) => {
          self.destination.error(err);
          return;
        }
      }
    }
    if exhausted {
      self.destination.complete();
    }
  }

  fn error(&mut self, err: Err) { self.destination.error(err) }

  fn complete(&mut self) {
    let exhausted = {
      let mut state = self.state.rc_deref_mut();
      state.completed[self.index] = true;
      state.buffers[self.index].is_empty()
    };
    if exhausted {
      self.destination.complete();
    }
  }
}

impl<Item: 'static, Err: 'static> Observable<Item, Err> {
  /// Pairs each value of `self` with the value of `other` at the same
  /// position.
  pub fn zip_with<B: 'static>(&self, other: Observable<B, Err>) -> Observable<(Item, B), Err> {
    let sources = vec![self.map(Either::Left), other.map(Either::Right)];
    zip(sources, |values| {
      let mut values = values.into_iter();
      match (values.next(), values.next()) {
        (Some(Either::Left(a)), Some(Either::Right(b))) => (a, b),
        _ => unreachable!("zipped values keep their source order"),
      }
    })
  }
}
