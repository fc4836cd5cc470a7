//! Analysis pipeline: parse → completeness check → estimate click instant →
//! query event window → rank → persist and register.

use crate::estimator::{format_click_instant, ClickTimeEstimator};
use crate::parser::MessageParser;
use crate::ranker::AttributionRanker;
use attribution_core::config::AppConfig;
use attribution_core::error::{AttributionError, EngineResult};
use attribution_core::types::{
    AnalysisReport, AnalysisResult, EventSourceStatus, PersistenceStatus,
};
use attribution_core::{EventWindowSource, SaleRegistrar, SaleStore};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs one analysis per call. Holds no per-request state, so a single
/// instance is shared across concurrent requests.
pub struct AnalysisOrchestrator {
    parser: MessageParser,
    estimator: ClickTimeEstimator,
    ranker: AttributionRanker,
    events: Arc<dyn EventWindowSource>,
    store: Arc<dyn SaleStore>,
    registrar: Arc<dyn SaleRegistrar>,
    margin_minutes: u32,
}

impl AnalysisOrchestrator {
    pub fn new(
        config: &AppConfig,
        events: Arc<dyn EventWindowSource>,
        store: Arc<dyn SaleStore>,
        registrar: Arc<dyn SaleRegistrar>,
    ) -> Self {
        Self {
            parser: MessageParser::new(),
            estimator: ClickTimeEstimator::new(),
            ranker: AttributionRanker::new(&config.ranking),
            events,
            store,
            registrar,
            margin_minutes: config.events.margin_minutes,
        }
    }

    pub fn store(&self) -> &Arc<dyn SaleStore> {
        &self.store
    }

    /// Full analysis. Only client-input errors (and unexpected faults) are
    /// returned as `Err`; collaborator failures are reported in the report.
    pub async fn analyze(&self, raw_text: &str) -> EngineResult<AnalysisReport> {
        let start = Instant::now();
        metrics::counter!("analysis.requests").increment(1);

        let result = match self.attribute(raw_text).await {
            Ok(result) => result,
            Err(e) => {
                metrics::counter!("analysis.rejected").increment(1);
                warn!(error = %e, "Sale notification rejected");
                return Err(e);
            }
        };

        let (persistence, registration) = tokio::join!(
            self.persist(&result),
            self.registrar
                .register(&result.sale, result.top_candidate()),
        );

        info!(
            client_id = ?result.sale.client_id,
            estimated_click = %format_click_instant(&result.estimated_click),
            events = result.events_examined,
            candidates = result.candidates.len(),
            persisted = persistence.success,
            latency_ms = start.elapsed().as_millis() as u64,
            "Analysis complete"
        );

        Ok(AnalysisReport {
            result,
            persistence,
            registration,
        })
    }

    /// Core attribution without persistence or registration.
    pub async fn attribute(&self, raw_text: &str) -> EngineResult<AnalysisResult> {
        let sale = self.parser.parse(raw_text);

        let (token, duration) = match (&sale.purchase_date_time, &sale.conversion_duration) {
            (Some(token), Some(duration)) => (token.clone(), *duration),
            _ => {
                return Err(AttributionError::IncompleteSaleData {
                    missing: sale.missing_required(),
                })
            }
        };

        let estimated_click = self.estimator.estimate(&token, &duration)?;

        let (events, event_source) = match self
            .events
            .query(estimated_click, self.margin_minutes)
            .await
        {
            Ok(events) => (events, EventSourceStatus::Ok),
            Err(e) => {
                metrics::counter!("events.source_errors").increment(1);
                warn!(error = %e, "Event source failed, ranking with no events");
                (
                    Vec::new(),
                    EventSourceStatus::Unavailable {
                        message: e.to_string(),
                    },
                )
            }
        };

        debug!(count = events.len(), margin = self.margin_minutes, "Events in window");
        metrics::histogram!("analysis.events_examined").record(events.len() as f64);

        let candidates = self.ranker.rank(&events);

        Ok(AnalysisResult {
            sale,
            estimated_click,
            candidates,
            events_examined: events.len(),
            event_source,
        })
    }

    async fn persist(&self, result: &AnalysisResult) -> PersistenceStatus {
        match self.store.save(result).await {
            Ok(id) => {
                metrics::counter!("store.saves").increment(1);
                PersistenceStatus::saved(id)
            }
            Err(e) => {
                metrics::counter!("store.errors").increment(1);
                warn!(error = %e, backend = self.store.backend(), "Failed to persist analysis");
                PersistenceStatus::failed(e.to_string())
            }
        }
    }
}
