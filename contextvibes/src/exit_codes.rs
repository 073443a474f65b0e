//! Stable process exit codes.

/// Command succeeded, or the user declined at a confirmation prompt.
pub const OK: i32 = 0;
/// A pre-check, step, configuration, or environment failure.
pub const FAILURE: i32 = 1;
/// Interrupted with Ctrl-C.
pub const CANCELED: i32 = 130;
