//! Stable exit codes for the provisioner CLI.

/// Fleet run completed. Individual hosts may still have failed; per-host
/// results are on stdout only.
pub const OK: i32 = 0;
/// Bad roster, bad config, or another local error before the fleet run
/// started.
pub const INVALID: i32 = 1;
