use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::reports::models::{
    DateRangeForm, Identity, Report, ReportCategory, ReportStatus, ViewerReference,
};
use crate::features::reports::services::{can_review, ReviewOutcome};

/// Request DTO for generating a report over a date range
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GenerateReportDto {
    /// Start of the range, e.g. `2024-01-01T00:00`
    #[serde(default)]
    pub from: String,
    /// End of the range, e.g. `2024-01-31T00:00`
    #[serde(default)]
    pub to: String,
}

impl From<GenerateReportDto> for DateRangeForm {
    fn from(dto: GenerateReportDto) -> Self {
        DateRangeForm::new(dto.from, dto.to)
    }
}

/// Response DTO for a stored report
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoredReportResponseDto {
    pub id: i64,
    pub category: ReportCategory,
    pub report_name: Option<String>,
    pub generated_on: Option<DateTime<Utc>>,
    pub generated_by: Option<String>,
    pub reviewed_by: Option<String>,
    pub review_date: Option<DateTime<Utc>>,
    /// Range the report was generated for, as sent to the backend
    pub date_range_covered: Option<DateRangeForm>,
    pub status: ReportStatus,
    /// Whether the requesting operator may review this report
    pub can_review: bool,
}

impl StoredReportResponseDto {
    pub fn new(category: ReportCategory, report: Report, operator: Option<&Identity>) -> Self {
        let can_review = can_review(Some(&report), operator);
        Self {
            id: report.id,
            category,
            status: report.status(),
            report_name: report.report_name,
            generated_on: report.generated_on,
            generated_by: report.generated_by.map(|i| i.to_string()),
            reviewed_by: report.reviewed_by.map(|i| i.to_string()),
            review_date: report.review_date,
            date_range_covered: report.date_range_covered.map(DateRangeForm::from),
            can_review,
        }
    }
}

/// Response DTO for a document handed to the viewer
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ViewerReferenceResponseDto {
    pub category: ReportCategory,
    pub report_id: i64,
    pub url: String,
}

impl From<ViewerReference> for ViewerReferenceResponseDto {
    fn from(r: ViewerReference) -> Self {
        Self {
            category: r.category,
            report_id: r.report_id,
            url: r.url,
        }
    }
}

/// Response DTO for closing the operator's open view
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CloseViewResponseDto {
    pub closed: bool,
}

/// Response DTO for a committed review
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcomeResponseDto {
    pub report_id: i64,
    pub reviewed_by: String,
    pub report: Option<StoredReportResponseDto>,
    /// The listing could not be refreshed after the review; list again to catch up
    pub registry_stale: bool,
}

impl ReviewOutcomeResponseDto {
    pub fn new(category: ReportCategory, outcome: ReviewOutcome) -> Self {
        let report = outcome
            .report
            .map(|r| StoredReportResponseDto::new(category, r, Some(&outcome.reviewed_by)));
        Self {
            report_id: outcome.report_id,
            reviewed_by: outcome.reviewed_by.to_string(),
            report,
            registry_stale: outcome.registry_stale,
        }
    }
}
