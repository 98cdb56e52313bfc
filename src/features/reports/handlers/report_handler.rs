use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::core::error::Result;
use crate::core::extractor::{AppJson, Operator};
use crate::features::reports::dtos::{
    CloseViewResponseDto, GenerateReportDto, ReviewOutcomeResponseDto, StoredReportResponseDto,
    ViewerReferenceResponseDto,
};
use crate::features::reports::errors::{ValidationError, WorkflowError};
use crate::features::reports::models::{DateRangeForm, ReportCategory};
use crate::features::reports::services::{date_range_validator, ReportWorkflow};
use crate::shared::types::{ApiResponse, Meta};

/// State for report handlers: one workflow per category
#[derive(Clone)]
pub struct ReportState {
    pub alarm: Arc<ReportWorkflow>,
    pub audit: Arc<ReportWorkflow>,
}

impl ReportState {
    pub fn workflow(&self, category: ReportCategory) -> &ReportWorkflow {
        match category {
            ReportCategory::Alarm => &self.alarm,
            ReportCategory::Audit => &self.audit,
        }
    }
}

/// List stored reports, flagging which ones the caller may review.
///
/// When the backend is unreachable the previously fetched listing is
/// returned with a 502 so the caller can keep showing it.
#[utoipa::path(
    get,
    path = "/api/{category}/reports",
    params(
        ("category" = ReportCategory, Path, description = "Report category")
    ),
    security((), ("operator" = [])),
    responses(
        (status = 200, description = "Stored reports, newest first", body = ApiResponse<Vec<StoredReportResponseDto>>),
        (status = 502, description = "Backend unavailable, previous listing returned", body = ApiResponse<Vec<StoredReportResponseDto>>)
    ),
    tag = "reports"
)]
pub async fn list_reports(
    operator: Option<Operator>,
    State(state): State<ReportState>,
    Path(category): Path<ReportCategory>,
) -> Result<Response> {
    let workflow = state.workflow(category);
    let operator = operator.map(|Operator(identity)| identity);
    let to_dtos = |reports: Vec<_>| -> Vec<StoredReportResponseDto> {
        reports
            .into_iter()
            .map(|r| StoredReportResponseDto::new(category, r, operator.as_ref()))
            .collect()
    };

    match workflow.list().await {
        Ok(reports) => {
            let dtos = to_dtos(reports);
            let meta = Meta {
                total: dtos.len() as i64,
            };
            Ok(Json(ApiResponse::success(Some(dtos), None, Some(meta))).into_response())
        }
        Err(WorkflowError::Fetch(e)) => {
            let stale = to_dtos(workflow.registry().snapshot().await);
            let message = e.to_string();
            let body = ApiResponse::error_with_data(stale, Some(message.clone()), Some(vec![message]));
            Ok((StatusCode::BAD_GATEWAY, Json(body)).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Generate a report for a date range and return it once it is listed.
///
/// A bound with an out-of-range year comes back cleared in `data` so the
/// form can re-prompt for it.
#[utoipa::path(
    post,
    path = "/api/{category}/reports/generate",
    params(
        ("category" = ReportCategory, Path, description = "Report category")
    ),
    security(("operator" = [])),
    request_body = GenerateReportDto,
    responses(
        (status = 201, description = "Report generated", body = ApiResponse<StoredReportResponseDto>),
        (status = 400, description = "Invalid date range", body = ApiResponse<DateRangeForm>),
        (status = 401, description = "Missing operator"),
        (status = 502, description = "Generation request failed"),
        (status = 504, description = "Generated report not listed in time")
    ),
    tag = "reports"
)]
pub async fn generate_report(
    Operator(operator): Operator,
    State(state): State<ReportState>,
    Path(category): Path<ReportCategory>,
    AppJson(dto): AppJson<GenerateReportDto>,
) -> Result<Response> {
    let mut form = DateRangeForm::from(dto);
    let range = match date_range_validator::validate(&mut form) {
        Ok(range) => range,
        Err(e @ ValidationError::YearOutOfRange { .. }) => {
            let message = e.to_string();
            let body = ApiResponse::error_with_data(form, Some(message.clone()), Some(vec![message]));
            return Ok((StatusCode::BAD_REQUEST, Json(body)).into_response());
        }
        Err(e) => return Err(WorkflowError::from(e).into()),
    };

    let report = state.workflow(category).generate(&range, &operator).await?;
    let dto = StoredReportResponseDto::new(category, report, Some(&operator));

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(dto),
            Some("Report generated".to_string()),
            None,
        )),
    )
        .into_response())
}

/// Hand a stored report to the document viewer
#[utoipa::path(
    get,
    path = "/api/{category}/reports/{id}/view",
    params(
        ("category" = ReportCategory, Path, description = "Report category"),
        ("id" = i64, Path, description = "Report ID")
    ),
    security(("operator" = [])),
    responses(
        (status = 200, description = "Viewer reference", body = ApiResponse<ViewerReferenceResponseDto>),
        (status = 401, description = "Missing operator")
    ),
    tag = "reports"
)]
pub async fn view_report(
    Operator(operator): Operator,
    State(state): State<ReportState>,
    Path((category, id)): Path<(ReportCategory, i64)>,
) -> Result<Json<ApiResponse<ViewerReferenceResponseDto>>> {
    let reference = state.workflow(category).view(id, &operator).await;
    Ok(Json(ApiResponse::success(Some(reference.into()), None, None)))
}

/// Get the caller's open report view, if any
#[utoipa::path(
    get,
    path = "/api/{category}/reports/view",
    params(
        ("category" = ReportCategory, Path, description = "Report category")
    ),
    security(("operator" = [])),
    responses(
        (status = 200, description = "Open view, `data` is null when none is open", body = ApiResponse<ViewerReferenceResponseDto>),
        (status = 401, description = "Missing operator")
    ),
    tag = "reports"
)]
pub async fn get_open_view(
    Operator(operator): Operator,
    State(state): State<ReportState>,
    Path(category): Path<ReportCategory>,
) -> Result<Json<ApiResponse<ViewerReferenceResponseDto>>> {
    let reference = state.workflow(category).open_view(&operator).await;
    Ok(Json(ApiResponse::success(
        reference.map(ViewerReferenceResponseDto::from),
        None,
        None,
    )))
}

/// Close the caller's open report view
#[utoipa::path(
    delete,
    path = "/api/{category}/reports/view",
    params(
        ("category" = ReportCategory, Path, description = "Report category")
    ),
    security(("operator" = [])),
    responses(
        (status = 200, description = "View closed (or none was open)", body = ApiResponse<CloseViewResponseDto>),
        (status = 401, description = "Missing operator")
    ),
    tag = "reports"
)]
pub async fn close_view(
    Operator(operator): Operator,
    State(state): State<ReportState>,
    Path(category): Path<ReportCategory>,
) -> Result<Json<ApiResponse<CloseViewResponseDto>>> {
    let closed = state.workflow(category).close_view(&operator).await;
    Ok(Json(ApiResponse::success(
        Some(CloseViewResponseDto { closed }),
        None,
        None,
    )))
}

/// Review a stored report
#[utoipa::path(
    post,
    path = "/api/{category}/reports/{id}/review",
    params(
        ("category" = ReportCategory, Path, description = "Report category"),
        ("id" = i64, Path, description = "Report ID")
    ),
    security((), ("operator" = [])),
    responses(
        (status = 200, description = "Report reviewed", body = ApiResponse<ReviewOutcomeResponseDto>),
        (status = 403, description = "Review not permitted for this operator"),
        (status = 502, description = "Backend rejected the review")
    ),
    tag = "reports"
)]
pub async fn review_report(
    operator: Option<Operator>,
    State(state): State<ReportState>,
    Path((category, id)): Path<(ReportCategory, i64)>,
) -> Result<Json<ApiResponse<ReviewOutcomeResponseDto>>> {
    let operator = operator.map(|Operator(identity)| identity);
    let outcome = state
        .workflow(category)
        .review(id, operator.as_ref())
        .await?;

    Ok(Json(ApiResponse::success(
        Some(ReviewOutcomeResponseDto::new(category, outcome)),
        Some("Report reviewed successfully".to_string()),
        None,
    )))
}
