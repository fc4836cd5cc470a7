use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `SALE_ATTRIBUTION__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub events: EventSourceConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub registration: RegistrationConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default = "default_max_message_len")]
    pub max_message_len: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

/// Remote click/pageview event API.
#[derive(Debug, Clone, Deserialize)]
pub struct EventSourceConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_events_path")]
    pub path: String,
    #[serde(default = "default_event_type")]
    pub event_type: String,
    #[serde(default = "default_margin_minutes")]
    pub margin_minutes: u32,
}

/// Persistence backend. Without `redis_url` the in-memory log is used.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,
}

/// Downstream conversion-tracking API.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_platform")]
    pub platform: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_fee_ratio")]
    pub fee_ratio: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_high_threshold")]
    pub high_threshold: usize,
    #[serde(default = "default_medium_threshold")]
    pub medium_threshold: usize,
}

// Default functions
fn default_node_id() -> String {
    "node-01".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_max_message_len() -> usize {
    10_000
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_events_path() -> String {
    "/events".to_string()
}
fn default_event_type() -> String {
    "click".to_string()
}
fn default_margin_minutes() -> u32 {
    5
}
fn default_key_prefix() -> String {
    "sale_attribution".to_string()
}
fn default_list_limit() -> usize {
    100
}
fn default_platform() -> String {
    "SaleAttribution".to_string()
}
fn default_currency() -> String {
    "BRL".to_string()
}
fn default_fee_ratio() -> f64 {
    0.15
}
fn default_top_n() -> usize {
    3
}
fn default_high_threshold() -> usize {
    20
}
fn default_medium_threshold() -> usize {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
            max_message_len: default_max_message_len(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: default_metrics_port(),
        }
    }
}

impl Default for EventSourceConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_token: None,
            path: default_events_path(),
            event_type: default_event_type(),
            margin_minutes: default_margin_minutes(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            key_prefix: default_key_prefix(),
            list_limit: default_list_limit(),
        }
    }
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_token: None,
            platform: default_platform(),
            currency: default_currency(),
            fee_ratio: default_fee_ratio(),
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            high_threshold: default_high_threshold(),
            medium_threshold: default_medium_threshold(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            events: EventSourceConfig::default(),
            store: StoreConfig::default(),
            registration: RegistrationConfig::default(),
            ranking: RankingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("SALE_ATTRIBUTION")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
