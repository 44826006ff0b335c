//! Logger set-up shared by the simulator binary and tests.
use env_logger::{Builder, Env};
use log::{debug, LevelFilter};

/// Log target of the `critter_sim` binary.
const SIMULATOR_TARGET: &str = "critter_sim";

/// Filter used when `RUST_LOG` is unset: this crate and the simulator at
/// Info (Debug when `verbose`), every other crate at Warn.
#[must_use]
pub fn default_filter(verbose: bool) -> String {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    format!(
        "warn,{}={level},{SIMULATOR_TARGET}={level}",
        env!("CARGO_CRATE_NAME")
    )
}

/// Initialises the global logger. `RUST_LOG` overrides the default filter.
///
/// Repeated calls are ignored so tests may initialise freely.
pub fn init(verbose: bool) {
    let env = Env::default().default_filter_or(default_filter(verbose));
    if Builder::from_env(env).try_init().is_err() {
        debug!("logger already initialised");
    }
}
