use crate::{observable::Observable, scheduler::SchedulerExt};

/// Creates an observable which emits `0` after `delay` ticks of `scheduler`
/// and then completes.
pub fn timer<S: SchedulerExt>(delay: u64, scheduler: S) -> Observable<usize> {
  Observable::new(move |subscriber| {
    let c_subscriber = subscriber.clone();
    let handle = scheduler.schedule(
      move |_, _: ()| {
        c_subscriber.next(0);
        c_subscriber.complete();
      },
      delay,
      (),
    );
    subscriber.add(handle);
  })
}

#[cfg(test)]
mod test {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  #[test]
  fn fires_once_after_delay() {
    let scheduler = VirtualTimeScheduler::new();
    let log = Rc::new(RefCell::new(vec![]));
    let (c_log, c_log2) = (log.clone(), log.clone());
    let (s1, s2) = (scheduler.clone(), scheduler.clone());
    observable::timer(50, scheduler.clone()).subscribe_complete(
      move |v| c_log.borrow_mut().push(format!("{v}@{}", s1.now())),
      move || c_log2.borrow_mut().push(format!("done@{}", s2.now())),
    );

    scheduler.advance_to(49);
    assert!(log.borrow().is_empty());
    scheduler.flush();
    assert_eq!(*log.borrow(), vec!["0@50", "done@50"]);
  }

  #[test]
  fn cancel_before_due() {
    let scheduler = VirtualTimeScheduler::new();
    let hit = Rc::new(RefCell::new(false));
    let c_hit = hit.clone();
    observable::timer(50, scheduler.clone())
      .subscribe(move |_| *c_hit.borrow_mut() = true)
      .unsubscribe();
    scheduler.flush();
    assert!(!*hit.borrow());
  }
}
