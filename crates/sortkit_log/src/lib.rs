//! Logging init shared by sortkit binaries: `tracing` to stderr.

use tracing_subscriber::EnvFilter;

/// Default directive when `RUST_LOG` is unset or invalid.
pub const C_FILTER_DEFAULT: &str = "info";

fn build_env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(C_FILTER_DEFAULT))
}

/// Install a stderr fmt subscriber filtered by `RUST_LOG`.
///
/// Returns `false` if a global subscriber was already installed; the existing
/// one is kept.
pub fn init_logging() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(build_env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::init_logging;

    #[test]
    fn init_logging_is_idempotent() {
        let b_first = init_logging();
        let b_second = init_logging();
        assert!(!b_second);
        tracing::info!(b_first, "logging initialized");
    }
}
