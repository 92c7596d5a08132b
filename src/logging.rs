use tracing_subscriber::EnvFilter;

/// Initialize tracing based on CLI verbosity level.
///
/// Mapping:
/// - 0 (none) -> warn, except request lines which stay at info
/// - 1 (-v)   -> info
/// - 2 (-vv)  -> debug
/// - 3+ (-vvv)-> trace (includes rendered SQL)
///
/// `RUST_LOG` env var overrides the CLI flag if set.
pub fn init(verbosity: u8) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn default_filter(verbosity: u8) -> String {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    if verbosity == 0 {
        format!("surfsup={level},surfsup::endpoint=info")
    } else {
        format!("surfsup={level}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_levels() {
        assert_eq!(default_filter(0), "surfsup=warn,surfsup::endpoint=info");
        assert_eq!(default_filter(1), "surfsup=info");
        assert_eq!(default_filter(2), "surfsup=debug");
        assert_eq!(default_filter(7), "surfsup=trace");
    }
}
