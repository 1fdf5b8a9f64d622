#![cfg(test)]

//! Logging for unit tests.
//!
//! Installed once per test binary by the `ctor` hook in `lib.rs`. The filter
//! comes from `TEST_LOG`, then `RUST_LOG`, then `"warn"`; HTTP client
//! internals stay at `warn` unless the filter names them.
//!
//! ```bash
//! TEST_LOG=gateway=debug cargo test -p gateway
//! ```

use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

static INITIALIZED: OnceCell<()> = OnceCell::new();

pub fn init() {
    INITIALIZED.get_or_init(|| {
        let directives = std::env::var("TEST_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| "warn".to_string());

        let mut filter = EnvFilter::new(&directives);
        for noisy in ["hyper", "reqwest", "wiremock"] {
            if !directives.contains(noisy) {
                if let Ok(directive) = format!("{noisy}=warn").parse() {
                    filter = filter.add_directive(directive);
                }
            }
        }

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .without_time()
            .try_init()
            .ok();
    });
}
