//! Workshop fleet provisioner.
//!
//! Walks a CSV roster of lab environments and brings each host to a
//! provisioned state over SSH: clone the lab repository, run the docker
//! install script, and kick off a background pull of the docker images the
//! lab needs. In check mode each step is gated by a verification of remote
//! state and remediated at most once when the check comes back negative;
//! setup mode runs every step unconditionally.
//!
//! - [`steps`] holds the fixed step sequence and each step's remote commands.
//! - [`verify`] holds the read-only predicates that decide whether a step's
//!   effect is already present on the host.
//! - [`session`] isolates all remote I/O behind [`session::RemoteSession`]
//!   and [`session::SessionFactory`] so workflows can run against scripted
//!   sessions in tests.
//! - [`provision`] is the per-host state machine; [`fleet`] drives the
//!   roster through it, one host at a time.

pub mod config;
pub mod exit_codes;
pub mod fleet;
pub mod logging;
pub mod provision;
pub mod roster;
pub mod session;
pub mod steps;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod verify;
