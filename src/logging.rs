//! Log output for the command-line host and for C hosts.
//!
//! The library itself only emits `tracing` events; nothing is printed until
//! a subscriber is installed with [`init`] or `question_bank_init_logging`.

use std::env;
use std::ffi::{CStr, c_char, c_int};

use tracing_subscriber::EnvFilter;

/// Filter used when nothing else is configured.
pub const DEFAULT_FILTER: &str = "question_bank=warn";

/// Pick the filter directive with precedence: explicit filter, then a
/// crate-scoped level, then `RUST_LOG`, then [`DEFAULT_FILTER`].
pub fn compute_spec(log_level: Option<&str>, log_filter: Option<&str>) -> String {
    if let Some(spec) = log_filter {
        return spec.to_string();
    }
    if let Some(level) = log_level {
        return format!("question_bank={}", level.to_ascii_lowercase());
    }
    env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_string())
}

/// Install a stderr subscriber using `spec` as the filter. Returns `false`
/// if a subscriber was already installed.
pub fn init(spec: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(spec))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}

/// Install a stderr subscriber for a C host. `filter` is a tracing filter
/// directive such as `"question_bank=debug"`; null uses `RUST_LOG` or the
/// default. Returns `0` if installed, `1` if a subscriber already existed.
///
/// # Safety
///
/// `filter` must be null or a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn question_bank_init_logging(filter: *const c_char) -> c_int {
    let explicit = if filter.is_null() {
        None
    } else {
        unsafe { CStr::from_ptr(filter) }.to_str().ok()
    };
    let spec = compute_spec(None, explicit);
    if init(&spec) { 0 } else { 1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_filter_wins() {
        assert_eq!(
            compute_spec(Some("debug"), Some("question_bank=trace")),
            "question_bank=trace"
        );
        assert_eq!(compute_spec(Some("DEBUG"), None), "question_bank=debug");
    }
}
