//! Soft failures.
//!
//! Inspecting an artifact can fail in two ways: the artifact is simply not
//! something we manage (skip it and carry on), or the bytes themselves are
//! broken (abort). [`SoftFailure::or_skip`] folds the first kind into
//! `Ok(None)` so callers only ever propagate the second.

use std::path::Path;

use tracing::warn;

use crate::archive::ArchiveError;

pub trait SoftFailure<T> {
  /// Turn a skippable error into `Ok(None)`, logging it against `subject`.
  fn or_skip(self, subject: &Path) -> Result<Option<T>, ArchiveError>;
}

impl<T> SoftFailure<T> for Result<T, ArchiveError> {
  fn or_skip(self, subject: &Path) -> Result<Option<T>, ArchiveError> {
    match self {
      Ok(value) => Ok(Some(value)),
      Err(e) if e.is_skippable() => {
        warn!(path = %subject.display(), reason = %e, "skipping artifact");
        Ok(None)
      }
      Err(e) => Err(e),
    }
  }
}
