//! In-process append-only sale log, used when no durable store is configured.
//! A single mutex covers id assignment and the append so concurrent saves
//! never lose entries or reuse ids.

use async_trait::async_trait;
use attribution_core::error::EngineResult;
use attribution_core::types::{AnalysisResult, StoredSale};
use attribution_core::SaleStore;
use chrono::Utc;
use parking_lot::Mutex;

#[derive(Default)]
struct SaleLog {
    next_id: u64,
    entries: Vec<StoredSale>,
}

/// Append-only log. Starts empty and lives for the whole process.
#[derive(Default)]
pub struct MemorySaleStore {
    log: Mutex<SaleLog>,
}

impl MemorySaleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.log.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.lock().entries.is_empty()
    }
}

#[async_trait]
impl SaleStore for MemorySaleStore {
    async fn save(&self, result: &AnalysisResult) -> EngineResult<String> {
        let mut log = self.log.lock();
        log.next_id += 1;
        let id = log.next_id.to_string();
        log.entries.push(StoredSale {
            id: id.clone(),
            saved_at: Utc::now(),
            result: result.clone(),
        });
        Ok(id)
    }

    async fn recent(&self, limit: usize) -> EngineResult<Vec<StoredSale>> {
        let log = self.log.lock();
        Ok(log.entries.iter().rev().take(limit).cloned().collect())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
