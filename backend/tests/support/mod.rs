//! Shared helpers for the persistence integration tests.
//!
//! Integration tests compile as separate crates under `backend/tests/`; this
//! module opens each backing store the contract suite runs against.

pub mod cluster_skip;

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use playlister::domain::ports::Persistence;
use playlister::outbound::persistence::{DieselPersistence, MongoPersistence, PoolConfig};
use playlister::test_support::memory::InMemoryPersistence;

pub use cluster_skip::handle_cluster_setup_failure;

const MONGO_URI_VAR: &str = "PLAYLISTER_TEST_MONGO_URI";
const POSTGRES_URL_VAR: &str = "PLAYLISTER_TEST_POSTGRES_URL";
const MONGO_TEST_DATABASE: &str = "playlister_contract";

/// Backing stores the contract suite knows how to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Memory,
    Mongo,
    Postgres,
}

/// Open and connect `backend`.
///
/// Returns `None` when the live store is not configured, or when it cannot be
/// reached and `SKIP_TEST_CLUSTER` allows skipping.
pub async fn open(backend: Backend) -> Option<Arc<dyn Persistence>> {
    let driver: Arc<dyn Persistence> = match backend {
        Backend::Memory => Arc::new(InMemoryPersistence::new()),
        Backend::Mongo => {
            let uri = configured(MONGO_URI_VAR)?;
            Arc::new(MongoPersistence::new(uri, MONGO_TEST_DATABASE))
        }
        Backend::Postgres => {
            let url = configured(POSTGRES_URL_VAR)?;
            Arc::new(DieselPersistence::new(PoolConfig::new(url).with_max_size(2)))
        }
    };

    match driver.connect().await {
        Ok(()) => Some(driver),
        Err(error) => handle_cluster_setup_failure(format!("{backend:?}: {error}")),
    }
}

fn configured(var: &str) -> Option<String> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => {
            eprintln!("{var} not set; skipping live store");
            None
        }
    }
}

/// Suffix keeping emails and names distinct across runs against a shared
/// store.
pub fn unique_suffix() -> String {
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    format!("{nanos}-{}", COUNTER.fetch_add(1, Ordering::Relaxed))
}
