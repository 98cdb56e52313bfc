use async_trait::async_trait;
use serde_json::json;

use crate::core::config::BackendConfig;
use crate::features::reports::errors::BackendError;
use crate::features::reports::models::{DateRange, Identity, Report, ReportCategory};

/// URL layout of the report backend
#[derive(Debug, Clone)]
pub struct ReportEndpoints {
    base_url: String,
}

impl ReportEndpoints {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Generation request. Opening it makes the backend render and store a new report.
    pub fn download_url(
        &self,
        category: ReportCategory,
        range: &DateRange,
        requester: &Identity,
    ) -> String {
        let mut url = format!(
            "{}/{}-report/download?startDate={}&endDate={}",
            self.base_url,
            category,
            urlencoding::encode(&range.query_from()),
            urlencoding::encode(&range.query_to()),
        );
        if category.sends_username() {
            url.push_str("&username=");
            url.push_str(&urlencoding::encode(requester.as_str()));
        }
        url
    }

    pub fn list_url(&self, category: ReportCategory) -> String {
        format!("{}/stored-{}-report/list", self.base_url, category)
    }

    pub fn view_url(&self, category: ReportCategory, report_id: i64) -> String {
        format!("{}/{}-report/view/{}", self.base_url, category, report_id)
    }

    pub fn review_url(&self, category: ReportCategory, report_id: i64) -> String {
        format!("{}/{}-report/review/{}", self.base_url, category, report_id)
    }
}

/// Listing and review endpoints of the report backend
#[async_trait]
pub trait ReportBackend: Send + Sync {
    /// Stored reports of one category, in the backend's order (newest first)
    async fn list_reports(&self, category: ReportCategory) -> Result<Vec<Report>, BackendError>;

    /// Commit a review. No response body beyond success or failure.
    async fn commit_review(
        &self,
        category: ReportCategory,
        report_id: i64,
        reviewer: &Identity,
    ) -> Result<(), BackendError>;
}

/// Client for the report backend's HTTP API
pub struct HttpReportBackend {
    endpoints: ReportEndpoints,
    http_client: reqwest::Client,
}

impl HttpReportBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            endpoints: ReportEndpoints::new(&config.base_url),
            http_client,
        })
    }

    pub fn endpoints(&self) -> &ReportEndpoints {
        &self.endpoints
    }

    pub fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    /// The two deployed review endpoints differ in verb and body field
    fn review_request(
        &self,
        category: ReportCategory,
        report_id: i64,
        reviewer: &Identity,
    ) -> reqwest::RequestBuilder {
        let url = self.endpoints.review_url(category, report_id);
        match category {
            ReportCategory::Alarm => self
                .http_client
                .put(url)
                .json(&json!({ "username": reviewer.as_str() })),
            ReportCategory::Audit => self
                .http_client
                .post(url)
                .json(&json!({ "reviewedBy": reviewer.as_str() })),
        }
    }
}

/// Turn a non-2xx response into a [`BackendError::Status`]
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::error!("Report backend error: HTTP {} - {}", status, body);
    Err(BackendError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl ReportBackend for HttpReportBackend {
    async fn list_reports(&self, category: ReportCategory) -> Result<Vec<Report>, BackendError> {
        let url = self.endpoints.list_url(category);
        tracing::debug!("Fetching stored {} reports: {}", category, url);

        let response = self.http_client.get(&url).send().await.map_err(|e| {
            tracing::error!("Failed to fetch stored {} reports: {}", category, e);
            BackendError::from(e)
        })?;

        let reports = ensure_success(response)
            .await?
            .json::<Vec<Report>>()
            .await
            .map_err(|e| {
                tracing::error!("Failed to parse stored {} report listing: {}", category, e);
                BackendError::Decode(e.to_string())
            })?;

        tracing::debug!("Fetched {} stored {} reports", reports.len(), category);
        Ok(reports)
    }

    async fn commit_review(
        &self,
        category: ReportCategory,
        report_id: i64,
        reviewer: &Identity,
    ) -> Result<(), BackendError> {
        let request = self.review_request(category, report_id, reviewer);

        tracing::debug!("Committing review of {} report {}", category, report_id);

        let response = request.send().await.map_err(|e| {
            tracing::error!("Failed to commit review of {} report {}: {}", category, report_id, e);
            BackendError::from(e)
        })?;
        ensure_success(response).await?;

        tracing::info!("{} report {} reviewed by {}", category, report_id, reviewer);
        Ok(())
    }
}
