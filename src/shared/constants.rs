/// Request header carrying the operator's username.
///
/// Identity is established upstream; this service trusts the header as-is.
pub const OPERATOR_HEADER: &str = "x-operator";

// =============================================================================
// DATE RANGE CONSTANTS
// =============================================================================

/// Earliest calendar year accepted in a report date range
pub const MIN_REPORT_YEAR: i32 = 1000;

/// Latest calendar year accepted in a report date range
pub const MAX_REPORT_YEAR: i32 = 9999;

/// Timestamp layout expected by the report backend's `startDate`/`endDate` parameters
pub const BACKEND_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
