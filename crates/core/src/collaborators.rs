//! Seams to the external systems the engine depends on. Each trait is
//! resolved to a single implementation at process start and shared as
//! `Arc<dyn …>` across requests.

use crate::error::EngineResult;
use crate::types::{
    AnalysisResult, AttributionEvent, CampaignCandidate, RegistrationStatus, SaleRecord,
    StoredSale,
};
use async_trait::async_trait;
use chrono::NaiveDateTime;

/// Source of click/pageview events around a point in time.
#[async_trait]
pub trait EventWindowSource: Send + Sync {
    /// Events in `[center - margin_minutes, center + margin_minutes]`, inclusive.
    async fn query(
        &self,
        center: NaiveDateTime,
        margin_minutes: u32,
    ) -> EngineResult<Vec<AttributionEvent>>;
}

/// Persistence for finished analyses.
#[async_trait]
pub trait SaleStore: Send + Sync {
    /// Persist an analysis and return its identifier.
    async fn save(&self, result: &AnalysisResult) -> EngineResult<String>;

    /// Most recently saved analyses first.
    async fn recent(&self, limit: usize) -> EngineResult<Vec<StoredSale>>;

    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;
}

/// Downstream conversion-tracking registration.
#[async_trait]
pub trait SaleRegistrar: Send + Sync {
    /// Never fails hard: the outcome, including "not configured", is the status.
    async fn register(
        &self,
        sale: &SaleRecord,
        top: Option<&CampaignCandidate>,
    ) -> RegistrationStatus;
}
