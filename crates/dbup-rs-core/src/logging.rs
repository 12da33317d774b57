//! Logging setup for dbup-rs.
//!
//! The engine reports migration progress through [`tracing`] events; this
//! module installs a global fmt subscriber so the CLI (or any embedding
//! application that has not already configured tracing) can see them.

/// Sets up the global tracing subscriber with the given level filter.
///
/// `level` is an `EnvFilter` directive such as `"info"` or `"dbup=debug"`.
/// Installation is best-effort: if a subscriber is already set (e.g. by an
/// embedding application or a test harness), this is a no-op.
pub fn setup_logging(level: &str) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_logging_accepts_bad_filter() {
        // Falls back to "info" rather than panicking.
        setup_logging("not a ((( filter");
        setup_logging("debug");
    }
}
