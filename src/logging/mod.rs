use tracing_subscriber::{fmt, EnvFilter};

/// Maps the `-v` count to a filter directive. Without flags only warnings
/// and errors are logged; a configured level replaces that default.
pub fn level_for(verbose: u8, configured: Option<&str>) -> String {
    match verbose {
        0 => configured
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or("warn")
            .to_string(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over the
/// verbosity flags. Logs go to stderr so rendered output stays clean.
pub fn init_logging(verbose: u8, configured: Option<&str>, no_color: bool) {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(level_for(verbose, configured)),
    };

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .try_init();
}
