//! Assertion-failure error kind for testkit.
//!
//! This crate contains the pure domain types with no IO and minimal dependencies.
//! Assertion helpers construct an [`AssertionFailure`] when a check does not hold;
//! test harnesses match on it to tell a failed test from an errored one.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod state;
pub use state::{FailureState, StateError};

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::iter;
use thiserror::Error;

// ============================================================================
// AssertionFailure
// ============================================================================

/// An assertion did not hold.
///
/// The message is fixed at construction. There is no way to change it afterwards,
/// so every clone and every reconstructed copy reports the same text.
///
/// Serializes through [`FailureState`] as `{"kind": "assertion_failure", "message": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(try_from = "FailureState", into = "FailureState")]
#[error("{message}")]
pub struct AssertionFailure {
    message: String,
}

impl AssertionFailure {
    /// Tag stored under [`FailureState::KIND_KEY`] to identify this error kind.
    pub const KIND: &'static str = "assertion_failure";

    /// Create a failure carrying `message` verbatim. Never fails; empty messages are allowed.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn into_message(self) -> String {
        self.message
    }

    /// Capture this failure as a key/value carrier for crossing a process or
    /// persistence boundary.
    #[must_use]
    pub fn to_state(&self) -> FailureState {
        let mut state = FailureState::new();
        state.insert(FailureState::KIND_KEY, Self::KIND);
        state.insert(FailureState::MESSAGE_KEY, self.message.as_str());
        state
    }

    /// Rehydrate a failure from a carrier produced by [`to_state`](Self::to_state)
    /// or by any peer that writes the same keys.
    ///
    /// `message` is required. `kind` may be absent, but if present it must name
    /// this error kind. Other keys are ignored.
    pub fn from_state(state: &FailureState) -> Result<Self, StateError> {
        if let Some(kind) = state.optional_str(FailureState::KIND_KEY)?
            && kind != Self::KIND
        {
            return Err(StateError::KindMismatch {
                found: kind.to_string(),
            });
        }
        let message = state.require_str(FailureState::MESSAGE_KEY)?;
        Ok(Self::new(message))
    }
}

impl From<String> for AssertionFailure {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for AssertionFailure {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<AssertionFailure> for FailureState {
    fn from(failure: AssertionFailure) -> Self {
        failure.to_state()
    }
}

impl TryFrom<FailureState> for AssertionFailure {
    type Error = StateError;

    fn try_from(state: FailureState) -> Result<Self, Self::Error> {
        Self::from_state(&state)
    }
}

/// Result of an assertion-evaluating call.
pub type AssertResult<T = ()> = Result<T, AssertionFailure>;

// ============================================================================
// Kind Distinction
// ============================================================================

/// Find the first [`AssertionFailure`] in `err` or its `source()` chain.
///
/// Harnesses that only hold a boxed or wrapped error use this to decide whether
/// a test failed an assertion or errored for some other reason.
#[must_use]
pub fn find_assertion_failure<'a>(
    err: &'a (dyn Error + 'static),
) -> Option<&'a AssertionFailure> {
    iter::successors(Some(err), |&current| current.source())
        .find_map(|current| current.downcast_ref::<AssertionFailure>())
}

#[must_use]
pub fn is_assertion_failure(err: &(dyn Error + 'static)) -> bool {
    find_assertion_failure(err).is_some()
}

/// Return early with an [`AssertionFailure`] built from a format string.
///
/// Works in any function whose error type implements `From<AssertionFailure>`,
/// including [`AssertResult`], `Box<dyn Error>` and `anyhow::Error`.
///
/// ```
/// use testkit_types::{AssertResult, fail};
///
/// fn check(got: i32) -> AssertResult {
///     if got != 5 {
///         fail!("expected 5 but got {got}");
///     }
///     Ok(())
/// }
///
/// assert_eq!(check(3).unwrap_err().message(), "expected 5 but got 3");
/// ```
#[macro_export]
macro_rules! fail {
    ($($arg:tt)+) => {
        return ::core::result::Result::Err(
            $crate::AssertionFailure::new(::std::format!($($arg)+)).into(),
        )
    };
}
