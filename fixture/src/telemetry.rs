use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Installs a `tracing` subscriber for test binaries.
///
/// Filters come from `RUST_LOG` and default to `info`. Output goes through
/// the test harness capture. Calling it more than once is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_test_writer())
        .with(filter)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice() {
        init_tracing();
        init_tracing();
        tracing::info!("subscriber installed");
    }
}
