use std::collections::HashMap;

/// The configured symbol universe: dashboard symbol -> provider symbol
/// (NSE listings need the ".NS" suffix on Yahoo).
const SYMBOL_UNIVERSE: &[(&str, &str)] = &[
    ("TCS", "TCS.NS"),
    ("INFY", "INFY.NS"),
    ("RELIANCE", "RELIANCE.NS"),
    ("HDFCBANK", "HDFCBANK.NS"),
    ("ICICIBANK", "ICICIBANK.NS"),
    ("WIPRO", "WIPRO.NS"),
    ("HCLTECH", "HCLTECH.NS"),
];

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub cors_allow_all: bool,
    /// Minimum stored row count below which a live fetch is triggered.
    pub sufficiency_threshold: usize,
    /// Days of history requested from the bar source on a cache miss.
    /// Generous on purpose, so later 252-row window queries stay cacheable.
    pub lookback_days: u32,
    pub fetch_timeout_secs: u64,
    pub symbols: Vec<String>,
    /// Dashboard symbol -> provider symbol spelling.
    pub provider_symbols: HashMap<String, String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:8000,http://127.0.0.1:8000".to_string())
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://stock_data.db?mode=rwc".to_string()),
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10000),
            allowed_origins,
            cors_allow_all: std::env::var("CORS_ALLOW_ALL")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            sufficiency_threshold: std::env::var("SUFFICIENCY_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(50),
            lookback_days: std::env::var("LOOKBACK_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(365),
            fetch_timeout_secs: std::env::var("FETCH_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15),
            symbols: SYMBOL_UNIVERSE.iter().map(|(s, _)| s.to_string()).collect(),
            provider_symbols: SYMBOL_UNIVERSE
                .iter()
                .map(|(s, p)| (s.to_string(), p.to_string()))
                .collect(),
        }
    }

    pub fn is_known_symbol(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol)
    }
}
