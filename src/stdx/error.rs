//! Failures of assumptions about page markup.
//!
//! The site is third-party HTML that changes without notice, so a selector
//! that stops matching is expected rather than a bug. Extractors report such
//! a mismatch as an [`Assumption`] with `?`, and the page assemblers end the
//! error's life in [`degrade`], where it costs one field and is logged. It
//! never reaches [`ScrapeError`](crate::errors::ScrapeError).

use thiserror::Error;

/// Returns an [`Assumption`] from the enclosing extractor.
///
/// With a condition, returns only when the condition is false, and the
/// message is prefixed with the condition's source text.
macro_rules! assumption {
    ($msg:literal $(, $args:expr)* ) => {{
        return Err($crate::stdx::error::Assumption::from(format!($msg $(, $args)*)).into());
    }};
    ($cond:expr, $msg:literal $(, $args:expr)* ) => {{
        if !$cond {
            return Err($crate::stdx::error::Assumption::from(format!("`{}`, {}", stringify!($cond), format!($msg $(, $args)*))).into());
        }
    }};
}

pub(crate) use assumption;

/// Represents an assumption about the markup of a page that did not hold.
///
/// Field extractors return this when a page no longer looks the way the
/// extractor expects. It never crosses the public API: the page assemblers
/// log it and fall back to the field's sentinel value instead.
#[derive(Debug, Error)]
#[error("assumption violated: {0}")]
pub struct Assumption(String);

impl From<String> for Assumption {
    #[inline]
    fn from(msg: String) -> Self {
        Self(msg)
    }
}

/// Turns a missing element or a failed parse into an [`Assumption`].
///
/// The original error is dropped; the message should name the selector or
/// value that was expected, since that is what a log reader needs to update.
pub(crate) trait Assume<T> {
    type Output;

    fn assumption(self, msg: impl Into<String>) -> Self::Output;
}

impl<T> Assume<T> for Option<T> {
    type Output = Result<T, Assumption>;

    #[inline]
    fn assumption(self, msg: impl Into<String>) -> Self::Output {
        self.ok_or_else(|| Assumption(msg.into()))
    }
}

impl<T, E> Assume<T> for Result<T, E> {
    type Output = Result<T, Assumption>;

    #[inline]
    fn assumption(self, msg: impl Into<String>) -> Self::Output {
        self.map_err(|_err: _| Assumption(msg.into()))
    }
}

/// Unwraps a field extraction, degrading to `default` when it failed.
///
/// `field` names the record field in the log line.
pub(crate) fn degrade<T>(field: &'static str, result: Result<T, Assumption>, default: T) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(field, %err, "field extraction degraded to its default");
            default
        }
    }
}
