//! Install a global [tracing] subscriber filtered by `RUST_LOG`.
//!
//! Events are written to stderr so that stdout stays free for the documents
//! and text the command-line tools produce.

use time::{UtcOffset, format_description::well_known::Iso8601};
use tracing_subscriber::{
    fmt::{self, time::OffsetTime},
    layer::SubscriberExt,
};

struct Guard {}

impl Drop for Guard {
    fn drop(&mut self) {}
}

/// Start logging to stderr.
///
/// If a global subscriber is already installed (as happens when several
/// tests in one process call this), the existing one is kept.
pub fn init() -> impl Drop {
    if let Err(e) = initiate_logging() {
        eprintln!("logging not initialized: {e}");
    }
    Guard {}
}

/// Start logging to stderr, returning an error if a subscriber is already set.
pub fn initiate_logging() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    // Fixed offset from the timezone at the time this runs.
    let timer = OffsetTime::new(
        UtcOffset::from_whole_seconds(chrono::Local::now().offset().local_minus_utc())?,
        Iso8601::DEFAULT,
    );

    let with_ansi = !cfg!(windows);
    let stderr_layer = fmt::layer()
        .with_timer(timer)
        .with_writer(std::io::stderr)
        .with_ansi(with_ansi)
        .with_file(true)
        .with_line_number(true);

    let collector = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(tracing_subscriber::filter::EnvFilter::from_default_env());
    tracing::subscriber::set_global_default(collector)?;

    let log_var = if let Ok(var) = std::env::var("RUST_LOG") {
        format!(" with RUST_LOG=\"{var}\".")
    } else {
        ".".to_string()
    };
    tracing::debug!("Logging initiated to stderr{log_var}");
    Ok(())
}
