//! Logging initialization utilities.

use env_logger::Env;

/// Initialize logging with a default filter level.
///
/// `RUST_LOG` still overrides the default when set.
pub fn init(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let env = Env::default().default_filter_or(default_filter);
    // Already installed when run in-process.
    env_logger::Builder::from_env(env).try_init().ok();
}
