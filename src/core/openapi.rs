use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::reports::{
    dtos as reports_dtos, handlers as reports_handlers, models as reports_models,
};
use crate::shared::constants::OPERATOR_HEADER;
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        reports_handlers::report_handler::list_reports,
        reports_handlers::report_handler::generate_report,
        reports_handlers::report_handler::view_report,
        reports_handlers::report_handler::get_open_view,
        reports_handlers::report_handler::close_view,
        reports_handlers::report_handler::review_report,
    ),
    components(
        schemas(
            Meta,
            reports_models::ReportCategory,
            reports_models::ReportStatus,
            reports_models::Bound,
            reports_models::DateRangeForm,
            reports_dtos::GenerateReportDto,
            reports_dtos::StoredReportResponseDto,
            reports_dtos::ViewerReferenceResponseDto,
            reports_dtos::CloseViewResponseDto,
            reports_dtos::ReviewOutcomeResponseDto,
            ApiResponse<Vec<reports_dtos::StoredReportResponseDto>>,
            ApiResponse<reports_dtos::StoredReportResponseDto>,
            ApiResponse<reports_dtos::ViewerReferenceResponseDto>,
            ApiResponse<reports_dtos::CloseViewResponseDto>,
            ApiResponse<reports_dtos::ReviewOutcomeResponseDto>,
            ApiResponse<reports_models::DateRangeForm>,
        )
    ),
    tags(
        (name = "reports", description = "Stored alarm and audit reports: generation, viewing and review"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "BMS Report Desk API",
        version = "0.1.0",
        description = "API documentation for the BMS report desk",
    )
)]
pub struct ApiDoc;

/// Adds the operator header security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "operator",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(OPERATOR_HEADER))),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
