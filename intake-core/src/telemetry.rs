// SPDX-License-Identifier: Apache-2.0

//! Thin `tracing-subscriber` initializer for binaries and integration tests embedding this core.
//! The core itself never installs a global subscriber on its own (§6 "logging sinks" are a host
//! concern); this is offered for convenience, not invoked from library code.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a `fmt` subscriber reading its filter from `RUST_LOG`, defaulting to `info` when
/// unset. Safe to call more than once; later calls are no-ops if a subscriber is already set.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}
