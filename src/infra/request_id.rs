//! Correlation id of the inbound request, visible to outbound upstream calls.
//!
//! The HTTP middleware scopes the id around the handler future; anything the
//! handler awaits on the same task (including `tokio::join!` branches) reads it
//! back with [`current`].

use std::future::Future;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest inbound id that is reused instead of replaced.
const MAX_INBOUND_LEN: usize = 128;

tokio::task_local! {
    static REQUEST_ID: String;
}

/// Run `future` with `id` as the current request id.
pub async fn scope<F: Future>(id: String, future: F) -> F::Output {
    REQUEST_ID.scope(id, future).await
}

/// Id of the request being served, if any.
pub fn current() -> Option<String> {
    REQUEST_ID.try_with(Clone::clone).ok()
}

/// Whether a caller-supplied id is safe to propagate as-is.
pub fn is_acceptable(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate.len() <= MAX_INBOUND_LEN
        && candidate
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}
