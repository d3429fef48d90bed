//! LSP request and notification handlers.
//!
//! Each handler has two layers: a `compute_*` engine function working on
//! byte offsets and a `handle_*` function converting to and from protocol
//! types. Engine functions are total: a panic inside one is logged and
//! turned into an empty result.

use std::panic::{catch_unwind, AssertUnwindSafe};

pub mod utils;

pub mod code_actions;
pub mod completion;
pub mod diagnostics;
pub mod hover;

/// Run an engine operation, replacing a panic with the empty result.
pub(crate) fn guarded<T: Default>(operation: &str, f: impl FnOnce() -> T) -> T {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|_| {
        tracing::error!("{operation} failed, returning an empty result");
        T::default()
    })
}
