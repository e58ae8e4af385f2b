use tracing_subscriber::{fmt, EnvFilter};

/// Default filter without `--verbose`.
const LOG_LEVEL: &str = "info";

/// Filter with `--verbose`: our crates at debug, the HTTP stack kept quiet.
const VERBOSE_LOG_LEVEL: &str = "debug,hyper=info,hyper_util=info,reqwest=info,rustls=info";

/// Install the global subscriber. `RUST_LOG` wins over both defaults.
pub fn init_logging(verbose: bool) {
    let default = if verbose { VERBOSE_LOG_LEVEL } else { LOG_LEVEL };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .compact()
        .with_writer(std::io::stdout)
        .init();
}
