//! Process-wide transport client.
//!
//! Every [`HttpClient`](super::HttpClient) dispatches through a single
//! shared `reqwest::Client` so all connections reuse one connection pool.
//! The client is created on first use rather than in a static initializer,
//! and [`shutdown`] exists as an explicit teardown hook: dropping the pooled
//! client lets reqwest drain its idle connections. A later request simply
//! re-initializes the pool.

use std::sync::RwLock;

use reqwest::Client;

static SHARED: RwLock<Option<Client>> = RwLock::new(None);

/// Returns a handle to the shared transport client, creating it on first
/// use. Cloning a `reqwest::Client` is cheap (it is reference-counted).
///
/// A poisoned lock is recovered rather than re-panicked: the `Option` it
/// guards is valid in either state, and the only code that can panic while
/// holding the lock is `Client::new` itself.
pub(crate) fn shared_client() -> Client {
    if let Some(client) = SHARED.read().unwrap_or_else(|e| e.into_inner()).as_ref() {
        return client.clone();
    }

    let mut guard = SHARED.write().unwrap_or_else(|e| e.into_inner());
    guard.get_or_insert_with(Client::new).clone()
}

/// Tears down the shared transport client.
///
/// In-flight requests keep their own handle and finish normally; the pooled
/// idle connections are dropped. Any subsequent request re-creates the
/// client, so this is safe to call at any point (typically process exit).
pub fn shutdown() {
    SHARED.write().unwrap_or_else(|e| e.into_inner()).take();
}
