//! Utility functions and helpers

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Extract a readable message from a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Run `f`, turning a panic into `Err(message)` when `catch_panics` is set
///
/// With `catch_panics` off the panic propagates to the caller untouched.
pub(crate) fn guarded<T>(catch_panics: bool, f: impl FnOnce() -> T) -> Result<T, String> {
    if !catch_panics {
        return Ok(f());
    }

    catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_message(payload.as_ref()))
}
