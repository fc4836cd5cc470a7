//! HTTP client for the click/pageview event API.

use async_trait::async_trait;
use attribution_core::config::EventSourceConfig;
use attribution_core::error::{AttributionError, EngineResult};
use attribution_core::types::{AttributionEvent, API_TIMESTAMP_FORMAT};
use attribution_core::EventWindowSource;
use chrono::{Duration, NaiveDateTime};
use serde_json::Value;
use tracing::debug;

/// Queries `GET {base_url}{path}?start=..&end=..&event_type=..` with a
/// bearer token. One request per analysis.
pub struct HttpEventWindowSource {
    client: reqwest::Client,
    base_url: Option<String>,
    api_token: Option<String>,
    path: String,
    event_type: String,
}

impl HttpEventWindowSource {
    pub fn new(config: &EventSourceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config
                .base_url
                .as_ref()
                .map(|u| u.trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty()),
            api_token: config.api_token.clone(),
            path: config.path.clone(),
            event_type: config.event_type.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    async fn fetch(&self, base_url: &str, start: String, end: String) -> anyhow::Result<Value> {
        let url = format!("{base_url}{}", self.path);
        let mut request = self.client.get(&url).query(&[
            ("start", start.as_str()),
            ("end", end.as_str()),
            ("event_type", self.event_type.as_str()),
        ]);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|body| error_message(&body).map(str::to_string))
                .unwrap_or(text);
            anyhow::bail!("HTTP {status}: {message}");
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Inclusive `[center - margin, center + margin]` bounds in API format.
pub fn window_bounds(center: NaiveDateTime, margin_minutes: u32) -> (String, String) {
    let margin = Duration::minutes(i64::from(margin_minutes));
    (
        (center - margin).format(API_TIMESTAMP_FORMAT).to_string(),
        (center + margin).format(API_TIMESTAMP_FORMAT).to_string(),
    )
}

/// Accepts a bare array, a `{ "data": [...] }` wrapper, or an error envelope.
pub fn parse_events_body(body: Value) -> Result<Vec<AttributionEvent>, String> {
    if let Some(message) = error_message(&body) {
        return Err(message.to_string());
    }
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => return Err("response has no event list".to_string()),
        },
        _ => return Err("response has no event list".to_string()),
    };
    Ok(items.into_iter().map(AttributionEvent::from_raw).collect())
}

fn error_message(body: &Value) -> Option<&str> {
    match body.get("error")? {
        Value::String(s) => Some(s.as_str()),
        Value::Object(obj) => obj.get("message").and_then(Value::as_str),
        Value::Null => None,
        _ => Some("unknown error"),
    }
}

#[async_trait]
impl EventWindowSource for HttpEventWindowSource {
    async fn query(
        &self,
        center: NaiveDateTime,
        margin_minutes: u32,
    ) -> EngineResult<Vec<AttributionEvent>> {
        let base_url = self.base_url.as_deref().ok_or_else(|| {
            AttributionError::CollaboratorUnavailable("event source not configured".to_string())
        })?;

        let (start, end) = window_bounds(center, margin_minutes);
        debug!(start = %start, end = %end, event_type = %self.event_type, "Querying event window");

        let body = self
            .fetch(base_url, start, end)
            .await
            .map_err(|e| AttributionError::CollaboratorUnavailable(format!("event source: {e}")))?;

        parse_events_body(body)
            .map_err(|e| AttributionError::CollaboratorUnavailable(format!("event source: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attribution_core::types::UNKNOWN_LABEL;
    use chrono::NaiveDate;
    use httpmock::prelude::*;
    use serde_json::json;

    fn center() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 2, 0)
            .unwrap()
    }

    fn source(base_url: Option<String>) -> HttpEventWindowSource {
        HttpEventWindowSource::new(&EventSourceConfig {
            base_url,
            api_token: Some("secret".to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn test_window_bounds_cross_midnight() {
        let (start, end) = window_bounds(center(), 5);
        assert_eq!(start, "2024-02-29 23:57:00");
        assert_eq!(end, "2024-03-01 00:07:00");
    }

    #[test]
    fn test_parse_wrapped_and_bare_bodies() {
        let bare = parse_events_body(json!([{ "utm_campaign": "a" }])).unwrap();
        assert_eq!(bare[0].campaign, "a");
        assert_eq!(bare[0].creative, UNKNOWN_LABEL);

        let wrapped = parse_events_body(json!({ "data": [{ "campaign": "b" }, {}] })).unwrap();
        assert_eq!(wrapped.len(), 2);
        assert_eq!(wrapped[1].campaign, UNKNOWN_LABEL);
    }

    #[test]
    fn test_parse_error_envelope() {
        let err = parse_events_body(json!({ "error": "token expired" })).unwrap_err();
        assert_eq!(err, "token expired");
        let err = parse_events_body(json!({ "error": { "message": "quota" } })).unwrap_err();
        assert_eq!(err, "quota");
        assert!(parse_events_body(json!({ "rows": [] })).is_err());
    }

    #[tokio::test]
    async fn test_query_sends_window_and_token() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/events")
                    .query_param("start", "2024-02-29 23:57:00")
                    .query_param("end", "2024-03-01 00:07:00")
                    .query_param("event_type", "click")
                    .header("authorization", "Bearer secret");
                then.status(200).json_body(json!([
                    { "utm_campaign": "spring", "utm_content": "video", "utm_source": "meta" },
                    { "utm_campaign": "spring", "utm_content": "video" }
                ]));
            })
            .await;

        let events = source(Some(server.base_url())).query(center(), 5).await.unwrap();
        mock.assert_async().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].source, "meta");
        assert_eq!(events[1].source, UNKNOWN_LABEL);
    }

    #[tokio::test]
    async fn test_query_http_error_is_collaborator_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/events");
                then.status(401).json_body(json!({ "error": "invalid token" }));
            })
            .await;

        let err = source(Some(server.base_url())).query(center(), 5).await.unwrap_err();
        assert!(matches!(err, AttributionError::CollaboratorUnavailable(_)));
        assert!(err.to_string().contains("invalid token"));
    }

    #[tokio::test]
    async fn test_unconfigured_source_fails_softly() {
        let source = source(None);
        assert!(!source.is_configured());
        let err = source.query(center(), 5).await.unwrap_err();
        assert!(matches!(err, AttributionError::CollaboratorUnavailable(_)));
    }
}
