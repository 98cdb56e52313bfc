use serde::Serialize;

use super::ReportCategory;

/// Something the document viewer can display: a URL the backend serves the
/// stored document from. Never holds the document bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewerReference {
    pub category: ReportCategory,
    pub report_id: i64,
    pub url: String,
}
