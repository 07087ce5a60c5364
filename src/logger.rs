use std::sync::Once;

use tracing_subscriber::{fmt::format::FmtSpan, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Map a `-v` count to a default filter level.
fn level_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// A simple logger writing to stderr.
///
/// `RUST_LOG` takes precedence over `verbosity` when set.
pub fn setup_logger(verbosity: u8) {
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level_for_verbosity(verbosity)));

        tracing_subscriber::fmt::Subscriber::builder()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_env_filter(env_filter)
            .with_span_events(FmtSpan::CLOSE)
            .finish()
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_for_verbosity(0), "warn");
        assert_eq!(level_for_verbosity(1), "info");
        assert_eq!(level_for_verbosity(2), "debug");
        assert_eq!(level_for_verbosity(9), "trace");
    }

    #[test]
    fn test_setup_twice() {
        setup_logger(1);
        setup_logger(2);
    }
}
