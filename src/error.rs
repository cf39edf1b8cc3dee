//! Error types surfaced by the runtime itself.
//!
//! Stream errors travel through the `Err` type parameter of an observable and
//! reach consumers only via `Observer::error`. The types here cover the one
//! place the runtime reports failures synchronously: tearing down a
//! [`Subscription`](crate::subscription::Subscription).

use std::{error::Error, fmt};

/// Error produced by a fallible teardown callback.
pub type BoxError = Box<dyn Error + 'static>;

/// Aggregate of every failure raised while running a subscription's teardown.
///
/// A failing teardown never prevents its siblings from running; all failures
/// are collected in the order the teardowns ran. Failures from nested
/// subscriptions are flattened into the same list.
#[derive(Debug)]
pub struct UnsubscriptionError {
  errors: Vec<BoxError>,
}

impl UnsubscriptionError {
  pub(crate) fn new(errors: Vec<BoxError>) -> Self { Self { errors } }

  pub fn errors(&self) -> &[BoxError] { &self.errors }

  pub fn into_errors(self) -> Vec<BoxError> { self.errors }

  pub fn len(&self) -> usize { self.errors.len() }

  pub fn is_empty(&self) -> bool { self.errors.is_empty() }
}

impl fmt::Display for UnsubscriptionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} errors occurred during unsubscription:", self.errors.len())?;
    for (i, err) in self.errors.iter().enumerate() {
      write!(f, "\n{}) {err}", i + 1)?;
    }
    Ok(())
  }
}

impl Error for UnsubscriptionError {}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn display_lists_every_error() {
    let err = UnsubscriptionError::new(vec!["first".into(), "second".into()]);
    assert_eq!(
      err.to_string(),
      "2 errors occurred during unsubscription:\n1) first\n2) second"
    );
    assert_eq!(err.len(), 2);
  }
}
