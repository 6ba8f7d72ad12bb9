//! RocksDB-backed record store.
//!
//! Provides:
//! - Database open with one column family per collection
//! - Create-once writes keyed by the derived frame key
//! - Key lookups checked against the identity fields

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rocksdb::{Options, DB};
use serde_json::Value;
use tracing::{debug, info};

use autoss_types::{Collection, FrameId};

use crate::column_families::{build_cf_descriptors, cf_for};
use crate::error::StoreError;
use crate::store::{matches_frame, DocumentStore};

/// Local record store holding every collection.
pub struct RocksStore {
    db: Arc<DB>,
    /// Serializes existence check + put so creates stay create-once
    write_lock: Arc<Mutex<()>>,
}

impl RocksStore {
    /// Open storage at the given path, creating if necessary
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        info!("Opening record store at {:?}", path);

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let db = DB::open_cf_descriptors(&db_opts, path, build_cf_descriptors())?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Handle on one collection.
    pub fn collection(&self, collection: Collection) -> RocksCollection {
        RocksCollection {
            db: Arc::clone(&self.db),
            write_lock: Arc::clone(&self.write_lock),
            cf_name: cf_for(collection),
        }
    }
}

/// One collection (column family) of a [`RocksStore`].
pub struct RocksCollection {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
    cf_name: &'static str,
}

impl RocksCollection {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let cf = self
            .db
            .cf_handle(self.cf_name)
            .ok_or_else(|| StoreError::ColumnFamilyNotFound(self.cf_name.to_string()))?;
        Ok(self.db.get_cf(cf, key.as_bytes())?)
    }
}

#[async_trait]
impl DocumentStore for RocksCollection {
    fn name(&self) -> &str {
        self.cf_name
    }

    async fn insert(&self, id: &str, document: &Value) -> Result<Value, StoreError> {
        let bytes = serde_json::to_vec(document)?;
        let cf = self
            .db
            .cf_handle(self.cf_name)
            .ok_or_else(|| StoreError::ColumnFamilyNotFound(self.cf_name.to_string()))?;

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StoreError::Unavailable("write lock poisoned".to_string()))?;

        if self.db.get_cf(cf, id.as_bytes())?.is_some() {
            return Err(StoreError::Conflict(id.to_string()));
        }
        self.db.put_cf(cf, id.as_bytes(), &bytes)?;
        debug!(cf = self.cf_name, key = id, bytes = bytes.len(), "Stored record");

        Ok(document.clone())
    }

    async fn find(&self, frame: &FrameId) -> Result<Option<Value>, StoreError> {
        let Some(bytes) = self.get(&frame.key())? else {
            return Ok(None);
        };
        let document: Value = serde_json::from_slice(&bytes)?;
        // Key lookup, then exact equality on the identity fields
        if matches_frame(&document, frame) {
            Ok(Some(document))
        } else {
            Ok(None)
        }
    }
}
