//! Tracing/logging setup shared by every process embedding the ledger.

/// Initialize process-wide tracing with the `RUST_LOG` filter (default `info`).
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(None);
}

/// Initialize tracing with an explicit fallback filter used when `RUST_LOG` is unset.
pub fn init_with_filter(filter: &str) {
    tracing::init(Some(filter));
}

/// Tracing configuration (filters, layers).
pub mod tracing;
