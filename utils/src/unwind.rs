//! Unwinding-based propagation.
//!
//! [`raise`] carries an [`AssertionFailure`] up the stack as a panic payload so
//! intermediate frames need no `Result` plumbing. [`catch_failure`] turns it
//! back into a value at the harness boundary and lets every other panic through.
//! [`install_panic_hook`] makes a raise that nothing catches print its message.

use std::any::Any;
use std::panic::{self, UnwindSafe};
use std::sync::Once;
use std::thread;

use testkit_types::AssertionFailure;
use tracing::debug;

static PANIC_HOOK: Once = Once::new();

/// Unwind with `failure` as the panic payload.
///
/// The default panic hook prints `Box<dyn Any>` for this payload. Call
/// [`install_panic_hook`] once per process so an uncaught raise shows the message.
#[track_caller]
pub fn raise(failure: AssertionFailure) -> ! {
    debug!(failure = failure.message(), "Raising assertion failure");
    panic::panic_any(failure)
}

/// Run `f`, converting a raised [`AssertionFailure`] into `Err`.
///
/// Panics with any other payload are resumed unchanged.
pub fn catch_failure<F, R>(f: F) -> Result<R, AssertionFailure>
where
    F: FnOnce() -> R + UnwindSafe,
{
    let payload = match panic::catch_unwind(f) {
        Ok(value) => return Ok(value),
        Err(payload) => payload,
    };

    match failure_from_payload(payload) {
        Ok(failure) => {
            debug!(failure = failure.message(), "Caught assertion failure");
            Err(failure)
        }
        Err(payload) => {
            debug!("Resuming unwind that is not an assertion failure");
            panic::resume_unwind(payload)
        }
    }
}

/// Report uncaught raises on stderr with their message.
///
/// Installs at most once per process, chained onto whatever hook is current.
pub fn install_panic_hook() {
    PANIC_HOOK.call_once(|| install_panic_hook_with(|report: &str| eprintln!("{report}")));
}

/// Chain a panic hook that hands a report for every [`AssertionFailure`] panic to
/// `write`. Panics with any other payload go to the previously installed hook.
pub fn install_panic_hook_with<W>(write: W)
where
    W: Fn(&str) + Send + Sync + 'static,
{
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let Some(failure) = info.payload().downcast_ref::<AssertionFailure>() else {
            previous(info);
            return;
        };
        let current = thread::current();
        let name = current.name().unwrap_or("<unnamed>");
        let report = match info.location() {
            Some(location) => {
                format!("thread '{name}' failed an assertion at {location}:\n{failure}")
            }
            None => format!("thread '{name}' failed an assertion:\n{failure}"),
        };
        write(&report);
    }));
}

/// Classify a panic payload, e.g. one returned by `catch_unwind` or `JoinHandle::join`.
///
/// Hands the payload back untouched when it is not an [`AssertionFailure`].
pub fn failure_from_payload(
    payload: Box<dyn Any + Send>,
) -> Result<AssertionFailure, Box<dyn Any + Send>> {
    payload.downcast::<AssertionFailure>().map(|failure| *failure)
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::panic;
    use std::thread;

    use testkit_types::AssertionFailure;

    use super::{catch_failure, failure_from_payload, install_panic_hook, raise};

    fn deep(depth: u32) -> u32 {
        if depth == 0 {
            raise(AssertionFailure::new("bottom reached"));
        }
        deep(depth - 1) + 1
    }

    #[test]
    fn normal_return_is_ok() {
        assert_eq!(catch_failure(|| 40 + 2), Ok(42));
    }

    #[test]
    fn raised_failure_is_caught_through_frames() {
        let failure = catch_failure(|| deep(8)).unwrap_err();
        assert_eq!(failure.message(), "bottom reached");
    }

    #[test]
    fn empty_message_survives_unwind() {
        let result: Result<(), AssertionFailure> =
            catch_failure(|| raise(AssertionFailure::new("")));
        let failure = result.unwrap_err();
        assert_eq!(failure.message(), "");
    }

    #[test]
    fn other_panics_are_resumed() {
        let outer = panic::catch_unwind(|| catch_failure::<_, ()>(|| panic!("boom")));
        let payload = outer.unwrap_err();
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"boom"));
    }

    #[test]
    fn string_payload_is_not_a_failure() {
        let payload: Box<dyn Any + Send> = Box::new(String::from("expected 5 but got 3"));
        let payload = failure_from_payload(payload).unwrap_err();
        assert_eq!(
            payload.downcast_ref::<String>().map(String::as_str),
            Some("expected 5 but got 3")
        );
    }

    #[test]
    fn panic_hook_install_is_idempotent() {
        install_panic_hook();
        install_panic_hook();

        let result: Result<u32, AssertionFailure> = catch_failure(|| deep(2));
        assert_eq!(result.unwrap_err().message(), "bottom reached");
    }

    #[test]
    fn failure_crosses_thread_join() {
        let handle =
            thread::spawn::<_, ()>(|| raise(AssertionFailure::new("worker check failed")));
        let payload = handle.join().unwrap_err();
        let failure = failure_from_payload(payload).unwrap();
        assert_eq!(failure.message(), "worker check failed");
    }
}
