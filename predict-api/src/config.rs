/// Default listen address
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: String,
}

impl ApiConfig {
    /// Reads `PREDICT_BIND_ADDR`.
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("PREDICT_BIND_ADDR")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
        }
    }
}
