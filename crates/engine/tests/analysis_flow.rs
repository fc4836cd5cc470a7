//! End-to-end attribution flow against in-process collaborators.

use async_trait::async_trait;
use attribution_core::config::AppConfig;
use attribution_core::error::EngineResult;
use attribution_core::types::{
    AttributionEvent, CampaignCandidate, Confidence, RegistrationStatus, SaleRecord,
};
use attribution_core::{EventWindowSource, SaleRegistrar, SaleStore};
use attribution_engine::estimator::format_click_instant;
use attribution_engine::AnalysisOrchestrator;
use attribution_store::MemorySaleStore;
use chrono::{Duration, NaiveDateTime};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

/// Serves fixed raw events, but only when the requested window contains
/// `click_at`.
struct WindowedEvents {
    click_at: NaiveDateTime,
    raw: Vec<serde_json::Value>,
}

#[async_trait]
impl EventWindowSource for WindowedEvents {
    async fn query(
        &self,
        center: NaiveDateTime,
        margin_minutes: u32,
    ) -> EngineResult<Vec<AttributionEvent>> {
        let margin = Duration::minutes(i64::from(margin_minutes));
        if self.click_at < center - margin || self.click_at > center + margin {
            return Ok(Vec::new());
        }
        Ok(self.raw.iter().cloned().map(AttributionEvent::from_raw).collect())
    }
}

#[derive(Default)]
struct RecordingRegistrar {
    calls: Mutex<Vec<(Option<String>, Option<String>)>>,
}

#[async_trait]
impl SaleRegistrar for RecordingRegistrar {
    async fn register(
        &self,
        sale: &SaleRecord,
        top: Option<&CampaignCandidate>,
    ) -> RegistrationStatus {
        self.calls
            .lock()
            .push((sale.client_id.clone(), top.map(|c| c.campaign.clone())));
        RegistrationStatus::Registered {
            order_id: "order-1".to_string(),
        }
    }
}

fn raw_events() -> Vec<serde_json::Value> {
    let mut raw = Vec::new();
    let groups = [("A", 12), ("B", 25), ("C", 5), ("D", 12)];
    // Interleave so first occurrence order is A, B, C, D.
    for i in 0..25 {
        for (campaign, n) in groups {
            if i < n {
                raw.push(json!({
                    "utm_campaign": campaign,
                    "utm_content": "creative-1",
                    "utm_source": "instagram",
                    "utm_medium": "paid_social"
                }));
            }
        }
    }
    raw.push(json!({ "path": "/obrigado" }));
    raw
}

fn message(client: &str) -> String {
    format!(
        "Venda aprovada\nClient ID: {client}\nPlan Anual\nValor: R$ 1.497,00\n\
         Conversion time: 2d 3h 4m 0s\nPurchase date/time: 02/03/2024 03:14"
    )
}

fn click_at() -> NaiveDateTime {
    NaiveDateTime::parse_from_str("29/02/2024 00:10", "%d/%m/%Y %H:%M").unwrap()
}

fn build(
    store: Arc<MemorySaleStore>,
    registrar: Arc<RecordingRegistrar>,
) -> AnalysisOrchestrator {
    AnalysisOrchestrator::new(
        &AppConfig::default(),
        Arc::new(WindowedEvents {
            click_at: click_at(),
            raw: raw_events(),
        }),
        store,
        registrar,
    )
}

#[tokio::test]
async fn test_full_flow_ranks_and_persists() {
    let store = Arc::new(MemorySaleStore::new());
    let registrar = Arc::new(RecordingRegistrar::default());
    let orchestrator = build(store.clone(), registrar.clone());

    let report = orchestrator.analyze(&message("9001")).await.unwrap();
    let result = &report.result;

    assert_eq!(format_click_instant(&result.estimated_click), "29/02/2024 00:10");
    assert_eq!(result.events_examined, 55);
    let ranked: Vec<_> = result
        .candidates
        .iter()
        .map(|c| (c.campaign.as_str(), c.count, c.confidence))
        .collect();
    assert_eq!(
        ranked,
        vec![
            ("B", 25, Confidence::High),
            ("A", 12, Confidence::Medium),
            ("D", 12, Confidence::Medium),
        ]
    );
    assert_eq!(result.candidates[0].source, "instagram");
    assert_eq!(result.sale.value.map(|v| v.to_string()), Some("1497.00".to_string()));

    assert!(report.persistence.success);
    let stored = store.recent(10).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(&stored[0].result, result);

    assert_eq!(
        registrar.calls.lock().as_slice(),
        &[(Some("9001".to_string()), Some("B".to_string()))]
    );
}

#[tokio::test]
async fn test_click_outside_window_yields_no_candidates() {
    let store = Arc::new(MemorySaleStore::new());
    let registrar = Arc::new(RecordingRegistrar::default());
    let orchestrator = build(store, registrar.clone());

    let text = message("1").replace("2d 3h 4m 0s", "2d 3h 10m 0s");
    let report = orchestrator.analyze(&text).await.unwrap();

    assert!(report.result.candidates.is_empty());
    assert_eq!(registrar.calls.lock()[0].1, None);
}

#[tokio::test]
async fn test_missing_purchase_time_is_rejected_without_side_effects() {
    let store = Arc::new(MemorySaleStore::new());
    let registrar = Arc::new(RecordingRegistrar::default());
    let orchestrator = build(store.clone(), registrar.clone());

    let err = orchestrator
        .analyze("Client ID: 5\nConversion time: 0d 0h 1m 0s")
        .await
        .unwrap_err();

    assert!(err.is_client_error());
    assert!(store.is_empty());
    assert!(registrar.calls.lock().is_empty());
}

#[tokio::test]
async fn test_concurrent_analyses_share_the_log() {
    let store = Arc::new(MemorySaleStore::new());
    let registrar = Arc::new(RecordingRegistrar::default());
    let orchestrator = Arc::new(build(store.clone(), registrar));

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.analyze(&message(&i.to_string())).await })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().unwrap().persistence.success);
    }
    assert_eq!(store.len(), 20);
}
