//! Diagnostic logging setup.
//!
//! Engine internals report through `tracing`; the learner-facing histories
//! (register changes, simulation log) are domain data and live in the
//! engines themselves.

use tracing_subscriber::EnvFilter;

use crate::error::{LabError, LabResult};

/// Install a compact console subscriber.
///
/// `RUST_LOG` wins over `default_filter`. Returns `false` when a global
/// subscriber was already installed, which makes repeated calls from tests
/// harmless.
///
/// # Errors
///
/// Returns `LabError::Config` if `default_filter` is not a valid filter
/// directive.
pub fn init_tracing(default_filter: &str) -> LabResult<bool> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| LabError::config(format!("invalid log filter '{default_filter}': {e}")))?;

    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .try_init()
        .is_ok();
    Ok(installed)
}
