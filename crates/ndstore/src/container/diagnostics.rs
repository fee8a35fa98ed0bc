//! Error reporting toggle for container failures.
//!
//! Container operations log their failures through `log::error!` while
//! reporting is enabled. Probing for objects that may be missing is done
//! under a `DiagnosticsGuard`, which turns reporting off for the current
//! thread and restores the previous setting when dropped.
use std::cell::Cell;

use super::ContainerError;

thread_local! {
    static REPORT_ERRORS: Cell<bool> = Cell::new(true);
}

pub fn diagnostics_enabled() -> bool {
    REPORT_ERRORS.with(|flag| flag.get())
}

/// Sets the reporting state and returns the previous one.
pub fn set_diagnostics(enabled: bool) -> bool {
    REPORT_ERRORS.with(|flag| flag.replace(enabled))
}

#[must_use = "diagnostics are restored as soon as the guard is dropped"]
pub struct DiagnosticsGuard {
    previous: bool,
}

pub fn silence_diagnostics() -> DiagnosticsGuard {
    DiagnosticsGuard {
        previous: set_diagnostics(false),
    }
}

impl Drop for DiagnosticsGuard {
    fn drop(&mut self) {
        set_diagnostics(self.previous);
    }
}

pub(crate) fn report(err: ContainerError) -> ContainerError {
    if diagnostics_enabled() {
        log::error!("container error: {}", err);
    }
    err
}
