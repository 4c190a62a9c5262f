//! Unit-test bootstrap helpers. Only compiled for `cfg(test)`.

pub mod logging {
    use std::sync::Once;

    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    static INIT: Once = Once::new();

    /// Initialize a compact test logger once per process. Quiet by default;
    /// raise with RUST_LOG when debugging a test.
    pub fn init() {
        INIT.call_once(|| {
            let env_filter =
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

            let fmt_layer = fmt::layer().with_target(false).with_test_writer();

            let _ = tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init();
        });
    }
}
