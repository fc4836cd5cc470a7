//! Click instant estimation: purchase instant minus conversion duration.

use attribution_core::error::{AttributionError, EngineResult};
use attribution_core::types::{ConversionDuration, PURCHASE_FORMAT};
use chrono::{Duration, NaiveDateTime};

/// Format of the estimated click time in API output.
pub const CLICK_DISPLAY_FORMAT: &str = "%d/%m/%Y %H:%M";

#[derive(Debug, Clone, Copy, Default)]
pub struct ClickTimeEstimator;

impl ClickTimeEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Parse the purchase token and step back days, hours, minutes, then
    /// seconds, rolling over calendar boundaries.
    pub fn estimate(
        &self,
        purchase_token: &str,
        duration: &ConversionDuration,
    ) -> EngineResult<NaiveDateTime> {
        let purchase = parse_purchase_instant(purchase_token)?;
        let steps = [
            Duration::days(i64::from(duration.days)),
            Duration::hours(i64::from(duration.hours)),
            Duration::minutes(i64::from(duration.minutes)),
            Duration::seconds(i64::from(duration.seconds)),
        ];

        steps.iter().try_fold(purchase, |instant, step| {
            instant
                .checked_sub_signed(*step)
                .ok_or_else(|| out_of_range(purchase_token))
        })
    }

    /// Same instant as [`estimate`](Self::estimate), computed as one
    /// elapsed-seconds offset.
    pub fn estimate_by_offset(
        &self,
        purchase_token: &str,
        duration: &ConversionDuration,
    ) -> EngineResult<NaiveDateTime> {
        let purchase = parse_purchase_instant(purchase_token)?;
        purchase
            .checked_sub_signed(Duration::seconds(duration.total_seconds()))
            .ok_or_else(|| out_of_range(purchase_token))
    }
}

/// Parse a `DD/MM/YYYY HH:MM` token; seconds are zero.
pub fn parse_purchase_instant(token: &str) -> EngineResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(token.trim(), PURCHASE_FORMAT).map_err(|e| {
        AttributionError::MalformedTimestamp(format!("'{token}' is not DD/MM/YYYY HH:MM: {e}"))
    })
}

pub fn format_click_instant(instant: &NaiveDateTime) -> String {
    instant.format(CLICK_DISPLAY_FORMAT).to_string()
}

fn out_of_range(token: &str) -> AttributionError {
    AttributionError::MalformedTimestamp(format!(
        "'{token}' minus the conversion duration is out of range"
    ))
}
