use tracing_subscriber::EnvFilter;

/// Install the stderr tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `verbose` turns on debug output for
/// this crate and everything else stays at warnings.
pub fn init(verbose: bool) {
    let default_directive = if verbose {
        "warn,rb_keeper=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
