use std::{cell::Cell, rc::Rc};

use bencher::{benchmark_group, benchmark_main, Bencher};
use rxcore::prelude::*;

fn subject_fan_out(b: &mut Bencher) {
  let subject = Subject::<usize>::new();
  let total = Rc::new(Cell::new(0));
  for _ in 0..64 {
    let c_total = total.clone();
    subject.subscribe(move |v| c_total.set(c_total.get() + v));
  }
  b.iter(|| {
    for i in 0..100 {
      subject.next(i);
    }
    total.get()
  });
}

fn subject_subscribe_churn(b: &mut Bencher) {
  let subject = Subject::<usize>::new();
  b.iter(|| {
    let subscriptions: Vec<_> = (0..64).map(|_| subject.subscribe(|_| {})).collect();
    subject.next(1);
    for subscription in subscriptions {
      subscription.unsubscribe();
    }
    subject.observer_count()
  });
}

fn merge_all_sync_sources(b: &mut Bencher) {
  b.iter(|| {
    let count = Rc::new(Cell::new(0));
    let c_count = count.clone();
    observable::from_iter(0..100)
      .map(|i| observable::from_iter(i..i + 10))
      .merge_all(4)
      .subscribe(move |_| c_count.set(c_count.get() + 1));
    count.get()
  });
}

fn virtual_time_interval(b: &mut Bencher) {
  b.iter(|| {
    let scheduler = VirtualTimeScheduler::new();
    let count = Rc::new(Cell::new(0));
    let c_count = count.clone();
    observable::interval(1, scheduler.clone())
      .take(1000)
      .subscribe(move |_| c_count.set(c_count.get() + 1));
    scheduler.flush();
    count.get()
  });
}

benchmark_group!(
  benches,
  subject_fan_out,
  subject_subscribe_churn,
  merge_all_sync_sources,
  virtual_time_interval
);
benchmark_main!(benches);
