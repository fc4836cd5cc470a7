//! Conversion-tracking registration of an attributed sale.

use async_trait::async_trait;
use attribution_core::config::RegistrationConfig;
use attribution_core::types::{
    CampaignCandidate, RegistrationStatus, SaleRecord, API_TIMESTAMP_FORMAT, PURCHASE_FORMAT,
};
use attribution_core::SaleRegistrar;
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrderPayload {
    pub order_id: String,
    pub platform: String,
    pub status: String,
    pub created_at: String,
    pub approved_date: String,
    pub customer: Customer,
    pub products: Vec<Product>,
    pub tracking_parameters: TrackingParameters,
    pub commission: Commission,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Customer {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub quantity: u32,
    pub price_in_cents: i64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TrackingParameters {
    pub utm_campaign: Option<String>,
    pub utm_content: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Commission {
    pub total_price_in_cents: i64,
    pub gateway_fee_in_cents: i64,
    pub user_commission_in_cents: i64,
    pub currency: String,
}

/// Posts the order payload with an `x-api-token` header. Without an endpoint
/// and token every call reports `NotConfigured`.
pub struct ConversionRegistrar {
    client: reqwest::Client,
    config: RegistrationConfig,
}

impl ConversionRegistrar {
    pub fn new(config: &RegistrationConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config: config.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credentials().is_some()
    }

    fn credentials(&self) -> Option<(&str, &str)> {
        let endpoint = self.config.endpoint.as_deref().filter(|s| !s.is_empty())?;
        let token = self.config.api_token.as_deref().filter(|s| !s.is_empty())?;
        Some((endpoint, token))
    }

    /// Build the order payload; `now` drives the order id and stands in for
    /// an unparseable purchase time. Fails when the amount does not fit in
    /// minor units.
    pub fn build_payload(
        &self,
        sale: &SaleRecord,
        top: Option<&CampaignCandidate>,
        now: DateTime<Utc>,
    ) -> anyhow::Result<OrderPayload> {
        let client = sale.client_id.clone().unwrap_or_else(|| "anon".to_string());
        let value = sale.value.unwrap_or_default();
        let total = to_minor_units(value)
            .ok_or_else(|| anyhow::anyhow!("sale value {value} exceeds the minor-unit range"))?;
        let fee = gateway_fee(total, self.config.fee_ratio).ok_or_else(|| {
            anyhow::anyhow!("invalid gateway fee ratio {}", self.config.fee_ratio)
        })?;
        let date = sale
            .purchase_date_time
            .as_deref()
            .and_then(|token| NaiveDateTime::parse_from_str(token, PURCHASE_FORMAT).ok())
            .unwrap_or_else(|| now.naive_utc())
            .format(API_TIMESTAMP_FORMAT)
            .to_string();
        let plan = sale.plan.clone().unwrap_or_else(|| "unknown".to_string());

        Ok(OrderPayload {
            order_id: format!("{client}-{}", now.timestamp_millis()),
            platform: self.config.platform.clone(),
            status: "paid".to_string(),
            created_at: date.clone(),
            approved_date: date,
            customer: Customer {
                id: sale.client_id.clone(),
            },
            products: vec![Product {
                id: plan.to_lowercase(),
                name: plan,
                quantity: 1,
                price_in_cents: total,
            }],
            tracking_parameters: top
                .map(|c| TrackingParameters {
                    utm_campaign: Some(c.campaign.clone()),
                    utm_content: Some(c.creative.clone()),
                    utm_source: Some(c.source.clone()),
                    utm_medium: Some(c.medium.clone()),
                })
                .unwrap_or_default(),
            commission: Commission {
                total_price_in_cents: total,
                gateway_fee_in_cents: fee,
                user_commission_in_cents: total - fee,
                currency: self.config.currency.clone(),
            },
        })
    }

    async fn send(&self, endpoint: &str, token: &str, payload: &OrderPayload) -> anyhow::Result<()> {
        let response = self
            .client
            .post(endpoint)
            .header("x-api-token", token)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("HTTP {status}: {body}");
        }
        Ok(())
    }
}

/// Currency amount to minor units, rounding half away from zero. `None` when
/// the amount does not fit in an `i64` of cents.
pub fn to_minor_units(value: Decimal) -> Option<i64> {
    value
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Gateway share of `total_cents`, rounded half away from zero.
pub fn gateway_fee(total_cents: i64, fee_ratio: f64) -> Option<i64> {
    let ratio = Decimal::from_f64(fee_ratio)?;
    Decimal::from(total_cents)
        .checked_mul(ratio)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

#[async_trait]
impl SaleRegistrar for ConversionRegistrar {
    async fn register(
        &self,
        sale: &SaleRecord,
        top: Option<&CampaignCandidate>,
    ) -> RegistrationStatus {
        let Some((endpoint, token)) = self.credentials() else {
            return RegistrationStatus::NotConfigured;
        };

        let payload = match self.build_payload(sale, top, Utc::now()) {
            Ok(payload) => payload,
            Err(e) => {
                metrics::counter!("registration.errors").increment(1);
                warn!(error = %e, "Sale registration payload rejected");
                return RegistrationStatus::Failed {
                    message: e.to_string(),
                };
            }
        };
        match self.send(endpoint, token, &payload).await {
            Ok(()) => {
                metrics::counter!("registration.sent").increment(1);
                info!(order_id = %payload.order_id, "Sale registered");
                RegistrationStatus::Registered {
                    order_id: payload.order_id,
                }
            }
            Err(e) => {
                metrics::counter!("registration.errors").increment(1);
                warn!(error = %e, order_id = %payload.order_id, "Sale registration failed");
                RegistrationStatus::Failed {
                    message: e.to_string(),
                }
            }
        }
    }
}
