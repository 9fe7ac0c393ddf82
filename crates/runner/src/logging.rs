//! Subscriber setup for the `aave-borrow` binary. Logs go to stderr so the
//! report on stdout stays machine-readable.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Crate targets that log at the requested level; everything else stays quiet
const TARGETS: [&str; 3] = ["aave_borrow", "aave_borrow_runner", "aave_borrow_sdk"];

/// Filter used when `RUST_LOG` is not set
pub fn default_directives(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    let mut directives: Vec<String> = TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect();
    directives.push("alloy=warn".to_string());
    directives.join(",")
}

pub fn init_logging(verbose: bool) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directives(verbose).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_cover_binary_target() {
        let directives = default_directives(false);
        assert!(directives.split(',').any(|d| d == "aave_borrow=info"));
        assert!(directives.contains("aave_borrow_runner=info"));
        assert!(directives.contains("aave_borrow_sdk=info"));

        let verbose = default_directives(true);
        assert!(verbose.split(',').any(|d| d == "aave_borrow=debug"));
        assert!(EnvFilter::try_new(verbose).is_ok());
    }
}
