use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub backend: BackendConfig,
    pub workflow: WorkflowConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

/// Connection settings for the report backend (storage, listing, generation endpoints)
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL every report endpoint is resolved against, e.g. `http://localhost:8080/v1`
    pub base_url: String,
    /// Per-request timeout applied by the HTTP client
    pub request_timeout: Duration,
}

/// Reconciliation settings for the generate step
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Wait before each listing refresh that looks for a freshly generated report
    pub settle_delay: Duration,
    /// Number of refreshes attempted before giving up on seeing the new report
    pub max_settle_attempts: u32,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            backend: BackendConfig::from_env()?,
            workflow: WorkflowConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
        })
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl BackendConfig {
    const DEFAULT_BASE_URL: &'static str = "http://localhost:8080/v1";
    const DEFAULT_TIMEOUT_SECS: u64 = 30;

    pub fn from_env() -> Result<Self, String> {
        let base_url = env::var("REPORT_BACKEND_URL")
            .unwrap_or_else(|_| Self::DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(format!(
                "REPORT_BACKEND_URL must be an http(s) URL, got '{}'",
                base_url
            ));
        }

        let timeout_secs = env::var("BACKEND_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "BACKEND_TIMEOUT_SECS must be a valid number".to_string())?;

        Ok(Self {
            base_url,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl WorkflowConfig {
    // The backend writes the listing row after streaming the document back
    const DEFAULT_SETTLE_DELAY_MS: u64 = 2000;
    const DEFAULT_MAX_SETTLE_ATTEMPTS: u32 = 3;

    pub fn from_env() -> Result<Self, String> {
        let settle_delay_ms = env::var("REPORT_SETTLE_DELAY_MS")
            .unwrap_or_else(|_| Self::DEFAULT_SETTLE_DELAY_MS.to_string())
            .parse::<u64>()
            .map_err(|_| "REPORT_SETTLE_DELAY_MS must be a valid number".to_string())?;

        let max_settle_attempts = env::var("REPORT_MAX_SETTLE_ATTEMPTS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_SETTLE_ATTEMPTS.to_string())
            .parse::<u32>()
            .map_err(|_| "REPORT_MAX_SETTLE_ATTEMPTS must be a valid number".to_string())?;

        if max_settle_attempts == 0 {
            return Err("REPORT_MAX_SETTLE_ATTEMPTS must be at least 1".to_string());
        }

        Ok(Self {
            settle_delay: Duration::from_millis(settle_delay_ms),
            max_settle_attempts,
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "BMS Report Desk API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION").unwrap_or_else(|_| {
            "Generate, list, view and review stored alarm and audit reports".to_string()
        });

        Ok(Self {
            title,
            version,
            description,
        })
    }
}
