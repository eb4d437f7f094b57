//! Shared test setup.
//!
//! Logging from the tree is only emitted with the `tracing` feature:
//!
//! ```bash
//! RUST_LOG=cordyceps_avl=trace cargo test --features tracing
//! ```

#![allow(dead_code)]

use std::sync::Once;

use tracing_subscriber::EnvFilter;

/// Ensures tracing is only initialized once across all tests.
static INIT: Once = Once::new();

/// Initialize a console subscriber filtered by `RUST_LOG`, defaulting to `warn`.
///
/// Safe to call multiple times - only the first call takes effect.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env();
        let filter = filter.unwrap_or_else(|_| EnvFilter::new("warn"));

        // Another harness may already have installed a subscriber.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_test_writer()
            .compact()
            .try_init();
    });
}

/// Returns the largest height an AVL tree with `len` elements may have.
///
/// Mirrors `cordyceps_avl::model::max_height`, which is only compiled with the `model` feature.
pub fn max_height(len: usize) -> f64 {
    1.44 * ((len + 2) as f64).log2() - 1.0
}
