//! Typed record gateway.
//!
//! Wraps a [`DocumentStore`] for one record type. Every store failure is
//! logged here and turned into `None`, so callers only decide what a
//! missing record means for them.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, error, warn};

use autoss_types::{FrameId, Record};

use crate::store::DocumentStore;

pub struct RecordGateway<R> {
    store: Arc<dyn DocumentStore>,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for RecordGateway<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _record: PhantomData,
        }
    }
}

impl<R: Record + Clone> RecordGateway<R> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    /// Collection name of the underlying store.
    pub fn name(&self) -> &str {
        self.store.name()
    }

    /// Persist a new record. Returns the stored record, or `None` if the
    /// write failed (already logged).
    pub async fn create(&self, record: &R) -> Option<R> {
        let document = match serde_json::to_value(record) {
            Ok(doc) => doc,
            Err(e) => {
                error!(key = record.id(), error = %e, "Failed to serialize record");
                return None;
            }
        };

        match self.store.insert(record.id(), &document).await {
            Ok(stored) => {
                debug!(collection = self.name(), key = record.id(), "Stored record");
                match serde_json::from_value(stored) {
                    Ok(stored) => Some(stored),
                    Err(e) => {
                        debug!(key = record.id(), error = %e, "Stored document not decodable, using submitted record");
                        Some(record.clone())
                    }
                }
            }
            Err(e) => {
                error!(
                    collection = self.name(),
                    key = record.id(),
                    error = %e,
                    "Record store create error"
                );
                None
            }
        }
    }

    /// Look up the record for `frame`. Store errors and undecodable
    /// documents are logged and reported as not found.
    pub async fn find_by_key(&self, frame: &FrameId) -> Option<R> {
        let document = match self.store.find(frame).await {
            Ok(Some(doc)) => doc,
            Ok(None) => return None,
            Err(e) => {
                error!(
                    collection = self.name(),
                    key = %frame,
                    error = %e,
                    "Record store find error"
                );
                return None;
            }
        };

        match serde_json::from_value(document) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(collection = self.name(), key = %frame, error = %e, "Malformed record");
                None
            }
        }
    }
}
