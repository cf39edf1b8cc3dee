//! Operators.
//!
//! Every operator here is a struct implementing [`Operator`] plus an observer
//! struct doing the per-subscription work; the `Observable` method that
//! builds it is declared next to them.

use crate::subscriber::Subscriber;

pub mod combine_latest;
pub mod filter;
pub mod map;
pub mod map_err;
pub mod merge_all;
pub mod observe_on;
pub mod publish;
pub mod ref_count;
pub mod take;
pub mod zip;

pub use combine_latest::{combine_latest, try_combine_latest};
pub use zip::{try_zip, zip};

/// A factory turning the downstream subscriber into the subscriber the
/// upstream source is subscribed with. Consumed by
/// [`Observable::lift`](crate::observable::Observable::lift).
pub trait Operator<In, Out, Err> {
  fn call(&self, destination: Subscriber<Out, Err>) -> Subscriber<In, Err>;
}

/// Values of two differently typed sources carried through one N-ary
/// combinator.
pub(crate) enum Either<A, B> {
  Left(A),
  Right(B),
}

impl<A: Clone, B: Clone> Clone for Either<A, B> {
  fn clone(&self) -> Self {
    match self {
      Either::Left(a) => Either::Left(a.clone()),
      Either::Right(b) => Either::Right(b.clone()),
    }
  }
}
