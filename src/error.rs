//! Shared error-code contract for errors surfaced to the host page.

/// Grepable error code and retryable flag for host-facing errors.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}
