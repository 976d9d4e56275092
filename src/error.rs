//! Error classification shared by every layer.
//!
//! Each error enum exposes a stable machine code for structured logs and a
//! `retryable` hint. Neither ever reaches the HTTP caller verbatim; the
//! routes layer maps errors to a generic `{detail}` body.

pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}
