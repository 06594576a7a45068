//! Log subscriber setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter variable checked before `RUST_LOG`.
pub const LOG_VAR: &str = "TABFORGE_LOG";

/// Builds the filter: `TABFORGE_LOG`, then `RUST_LOG`, then a default level
/// raised to debug by `verbose`.
pub fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "tabforge=debug,tabforge_spec=debug,tabforge_chat=debug,tabforge_backend_midi=debug,tabforge_cli=debug"
    } else {
        "warn"
    }
}

/// Installs the global subscriber, writing to stderr so stdout stays clean
/// for `--json` output. Later calls are ignored.
pub fn init(verbose: bool) {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose),
        )
        .with(filter(verbose))
        .try_init();
}
