pub use tracing::{debug, error, info, instrument, trace, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
};

fn subscriber_parts(default_level: &str) -> (EnvFilter, bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let is_debug = env_filter.to_string().contains("debug")
        || std::env::var("RUST_LOG").unwrap_or_default().contains("debug");

    (env_filter, is_debug)
}

/// Installs the global subscriber. Panics if one is already set.
pub fn init() {
    init_with_level("info");
}

/// Same as `init`, with `default_level` used when `RUST_LOG` is unset.
pub fn init_with_level(default_level: &str) {
    if !try_init(default_level) {
        panic!("a global tracing subscriber is already installed");
    }
}

/// Installs the global subscriber unless one exists. Returns false if one was already set.
pub fn try_init(default_level: &str) -> bool {
    let (env_filter, is_debug) = subscriber_parts(default_level);

    // cycle spans close every period, so only show them when debugging
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_thread_names(true)
        .with_timer(fmt::time::uptime())
        .with_span_events(if is_debug {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_rejected() {
        try_init("warn");
        assert!(!try_init("warn"));
    }
}
