use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::reports::handlers::{self, ReportState};
use crate::features::reports::services::ReportWorkflow;

/// Create routes for the reports feature
///
/// `{category}` is `alarm` or `audit`; anything else is rejected by the path extractor.
pub fn routes(alarm: Arc<ReportWorkflow>, audit: Arc<ReportWorkflow>) -> Router {
    let state = ReportState { alarm, audit };

    Router::new()
        .route("/api/{category}/reports", get(handlers::list_reports))
        .route(
            "/api/{category}/reports/generate",
            post(handlers::generate_report),
        )
        .route(
            "/api/{category}/reports/view",
            get(handlers::get_open_view).delete(handlers::close_view),
        )
        .route(
            "/api/{category}/reports/{id}/view",
            get(handlers::view_report),
        )
        .route(
            "/api/{category}/reports/{id}/review",
            post(handlers::review_report),
        )
        .with_state(state)
}
