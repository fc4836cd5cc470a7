use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Label substituted for any campaign/creative/source/medium the upstream
/// event does not carry.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Upper bound on ranked candidates carried by an [`AnalysisResult`].
pub const MAX_CANDIDATES: usize = 3;

/// Day-first, 24-hour, minute-precision format of the purchase token.
pub const PURCHASE_FORMAT: &str = "%d/%m/%Y %H:%M";

/// `YYYY-MM-DD HH:MM:SS`, used by the event API window and the registration
/// payload dates.
pub const API_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Elapsed time between the ad click and the purchase.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversionDuration {
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl ConversionDuration {
    pub fn new(days: u32, hours: u32, minutes: u32, seconds: u32) -> Self {
        Self {
            days,
            hours,
            minutes,
            seconds,
        }
    }

    pub fn total_seconds(&self) -> i64 {
        i64::from(self.days) * 86_400
            + i64::from(self.hours) * 3_600
            + i64::from(self.minutes) * 60
            + i64::from(self.seconds)
    }
}

/// Fields extracted from a free-text sale notification. Every field except
/// `raw_text` may be absent; completeness is checked by the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SaleRecord {
    pub client_id: Option<String>,
    pub plan: Option<String>,
    pub value: Option<Decimal>,
    /// Combined `DD/MM/YYYY HH:MM` token, parsed later by the estimator.
    pub purchase_date_time: Option<String>,
    pub conversion_duration: Option<ConversionDuration>,
    pub raw_text: String,
}

impl SaleRecord {
    /// Names of the fields required to continue past parsing that are absent.
    pub fn missing_required(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.purchase_date_time.is_none() {
            missing.push("purchase_date_time".to_string());
        }
        if self.conversion_duration.is_none() {
            missing.push("conversion_duration".to_string());
        }
        missing
    }
}

/// A click/pageview event returned by the event window source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttributionEvent {
    pub campaign: String,
    pub creative: String,
    pub source: String,
    pub medium: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl AttributionEvent {
    pub fn new(
        campaign: impl Into<String>,
        creative: impl Into<String>,
        source: impl Into<String>,
        medium: impl Into<String>,
    ) -> Self {
        Self {
            campaign: campaign.into(),
            creative: creative.into(),
            source: source.into(),
            medium: medium.into(),
            payload: serde_json::Value::Null,
        }
    }

    /// Build an event from an upstream JSON object. Bare keys win over their
    /// `utm_*` equivalents; anything missing becomes [`UNKNOWN_LABEL`].
    pub fn from_raw(raw: serde_json::Value) -> Self {
        let label = |keys: &[&str]| -> String {
            keys.iter()
                .filter_map(|k| raw.get(*k))
                .filter_map(|v| match v {
                    serde_json::Value::String(s) => Some(s.trim().to_string()),
                    serde_json::Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .find(|s| !s.is_empty())
                .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
        };

        Self {
            campaign: label(&["campaign", "utm_campaign"]),
            creative: label(&["creative", "utm_content"]),
            source: label(&["source", "utm_source"]),
            medium: label(&["medium", "utm_medium"]),
            payload: raw,
        }
    }
}

/// Coarse confidence bucket derived from the click count of a candidate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// `count > high` → high, `count > medium` → medium, otherwise low.
    pub fn from_count(count: usize, high: usize, medium: usize) -> Self {
        if count > high {
            Self::High
        } else if count > medium {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Aggregate over events sharing a (campaign, creative) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CampaignCandidate {
    pub campaign: String,
    pub creative: String,
    pub source: String,
    pub medium: String,
    pub count: usize,
    pub confidence: Confidence,
}

/// Outcome of the event window query as seen by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EventSourceStatus {
    Ok,
    Unavailable { message: String },
}

/// Core analysis handed to the persistence collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub sale: SaleRecord,
    pub estimated_click: NaiveDateTime,
    pub candidates: Vec<CampaignCandidate>,
    pub events_examined: usize,
    pub event_source: EventSourceStatus,
}

impl AnalysisResult {
    pub fn top_candidate(&self) -> Option<&CampaignCandidate> {
        self.candidates.first()
    }
}

/// Result of handing an analysis to the persistence collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistenceStatus {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PersistenceStatus {
    pub fn saved(id: String) -> Self {
        Self {
            success: true,
            id: Some(id),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            id: None,
            error: Some(error.into()),
        }
    }
}

/// Result of the downstream conversion registration call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegistrationStatus {
    Registered { order_id: String },
    NotConfigured,
    Failed { message: String },
}

/// Analysis plus the auxiliary collaborator outcomes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisReport {
    pub result: AnalysisResult,
    pub persistence: PersistenceStatus,
    pub registration: RegistrationStatus,
}

/// An analysis as listed back by a sale store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredSale {
    pub id: String,
    pub saved_at: DateTime<Utc>,
    pub result: AnalysisResult,
}
