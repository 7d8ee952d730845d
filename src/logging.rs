use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Send diagnostics to stderr so tables on stdout stay pipeable.
/// `RUST_LOG` wins over the default level.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "caisse=debug" } else { "caisse=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
