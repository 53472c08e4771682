//! Structured logging init, adapted from `abetterworld::helpers::logging`
//! with the `profile-tracy` tracing layer dropped (GPU profiling is a
//! rendering concern, out of scope per spec §1).

use std::sync::Once;

static INIT: Once = Once::new();

/// Installs a `tracing_subscriber::fmt` subscriber for native binaries and
/// tests. Idempotent: safe to call from every test module.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .try_init();
    });
}
