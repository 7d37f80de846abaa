//! Process-wide socket-library lifecycle.
//!
//! Some platforms require one-time socket-library startup before any
//! socket call (WSAStartup on Windows). The Rust standard library
//! performs that startup implicitly, so [`init`] exists as the
//! explicit, idempotent hook: call it once at process start, or let
//! socket construction invoke it lazily. [`shutdown`] is the matching
//! teardown hook; both are safe to call any number of times from any
//! thread.

use std::sync::Once;

static INIT: Once = Once::new();

/// Performs process-wide socket-library initialization.
///
/// Idempotent; only the first call does work.
pub fn init() {
    INIT.call_once(|| {
        tracing::debug!(
            version = env!("CARGO_PKG_VERSION"),
            "socket layer initialized"
        );
    });
}

/// Process-wide teardown hook.
///
/// Idempotent no-op on platforms where the standard library owns the
/// socket-library lifetime.
pub fn shutdown() {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
        shutdown();
        shutdown();
    }
}
