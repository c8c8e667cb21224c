//! Runtime helpers for testkit assertion failures.
//!
//! This crate provides the pieces that touch the runtime and so don't belong
//! in the domain-pure `testkit-types` crate:
//!
//! - **`unwind`**: Raise a failure as a panic payload and catch it at a harness boundary
//! - **`persist`**: Crash-safe persistence of a failure (temp + rename)

pub mod persist;
pub mod unwind;

pub use persist::{PersistError, read_failure, write_failure};
pub use unwind::{
    catch_failure, failure_from_payload, install_panic_hook, install_panic_hook_with, raise,
};
