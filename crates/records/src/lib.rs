//! `tg-records`: write side of the storage collaborator.
//!
//! The gateway never reads these records back; it only produces crisis
//! alerts, completed-session transcripts and daily usage ticks. The
//! [`RecordStore`] trait is that contract.
//!
//! | `storage.backend` | Implementation       | Best for                    |
//! |-------------------|----------------------|-----------------------------|
//! | `memory`          | [`MemoryRecordStore`] | tests, throwaway dev runs   |
//! | `jsonl`           | [`JsonlRecordStore`]  | single-host deployments     |
//! | `rest`            | [`RestRecordStore`]   | shared storage service      |

pub mod jsonl;
pub mod memory;
pub mod rest;
pub mod store;

pub use jsonl::JsonlRecordStore;
pub use memory::MemoryRecordStore;
pub use rest::RestRecordStore;
pub use store::RecordStore;

use std::sync::Arc;

use tg_domain::config::{StorageBackend, StorageConfig};
use tg_domain::error::Result;

/// Build the configured [`RecordStore`].
pub fn create_store(cfg: &StorageConfig) -> Result<Arc<dyn RecordStore>> {
    match cfg.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryRecordStore::new())),
        StorageBackend::Jsonl => {
            let store = JsonlRecordStore::open(&cfg.path)?;
            tracing::info!(path = %cfg.path.display(), "jsonl record store ready");
            Ok(Arc::new(store))
        }
        StorageBackend::Rest => {
            let store = RestRecordStore::new(&cfg.rest)?;
            tracing::info!(url = %cfg.rest.base_url, "rest record store ready");
            Ok(Arc::new(store))
        }
    }
}
