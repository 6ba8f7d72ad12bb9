//! In-process document store.
//!
//! Keeps documents in insertion order; `find` returns the earliest match.
//! Reads and writes can be switched to fail for exercising error paths.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use autoss_types::FrameId;

use crate::error::StoreError;
use crate::store::{matches_frame, DocumentStore};

#[derive(Debug)]
pub struct MemoryStore {
    name: String,
    documents: Mutex<Vec<(String, Value)>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: Mutex::new(Vec::new()),
            fail_writes: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.lock().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of stored documents in insertion order.
    pub fn documents(&self) -> Vec<Value> {
        self.lock()
            .map(|docs| docs.iter().map(|(_, doc)| doc.clone()).collect())
            .unwrap_or_default()
    }

    /// Stored document ids in insertion order.
    pub fn ids(&self) -> Vec<String> {
        self.lock()
            .map(|docs| docs.iter().map(|(id, _)| id.clone()).collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<(String, Value)>>, StoreError> {
        self.documents
            .lock()
            .map_err(|_| StoreError::Unavailable(format!("{} lock poisoned", self.name)))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert(&self, id: &str, document: &Value) -> Result<Value, StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("{} rejects writes", self.name)));
        }
        let mut docs = self.lock()?;
        if docs.iter().any(|(existing, _)| existing == id) {
            return Err(StoreError::Conflict(id.to_string()));
        }
        docs.push((id.to_string(), document.clone()));
        Ok(document.clone())
    }

    async fn find(&self, frame: &FrameId) -> Result<Option<Value>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("{} rejects reads", self.name)));
        }
        let docs = self.lock()?;
        Ok(docs
            .iter()
            .find(|(_, doc)| matches_frame(doc, frame))
            .map(|(_, doc)| doc.clone()))
    }
}
