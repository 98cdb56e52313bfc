use thiserror::Error;

use crate::features::reports::models::{Bound, ReportCategory};
use crate::features::reports::services::ReviewDenial;

/// Rejections of an operator-supplied date range
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please select both From Date and To Date ({bound} is empty)")]
    MissingBound { bound: Bound },

    #[error("{bound} is not a valid date and time: '{value}'")]
    UnparseableBound { bound: Bound, value: String },

    #[error("{} must have a 4-digit year", describe_bounds(.offending))]
    YearOutOfRange { offending: Vec<Bound> },

    #[error("To Date must be after From Date")]
    InvalidOrder,
}

fn describe_bounds(bounds: &[Bound]) -> String {
    bounds
        .iter()
        .map(Bound::to_string)
        .collect::<Vec<_>>()
        .join(" and ")
}

/// Errors raised by the report backend client
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("backend returned no document")]
    EmptyDocument,

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            BackendError::Decode(e.to_string())
        } else {
            BackendError::Transport(e.to_string())
        }
    }
}

/// A listing refresh that did not complete; the previously held listing stays in place
#[derive(Debug, Error)]
#[error("Failed to fetch stored {category} reports: {source}")]
pub struct FetchError {
    pub category: ReportCategory,
    #[source]
    pub source: BackendError,
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Review not permitted: {0}")]
    NotAuthorized(ReviewDenial),

    #[error("Failed to review {category} report {report_id}: {source}")]
    ReviewCommit {
        category: ReportCategory,
        report_id: i64,
        #[source]
        source: BackendError,
    },

    #[error("Failed to request {category} report generation: {source}")]
    GenerationRequestFailed {
        category: ReportCategory,
        #[source]
        source: BackendError,
    },

    #[error("Generated {category} report not visible in the listing after {attempts} refresh attempts")]
    GenerationNotYetVisible {
        category: ReportCategory,
        attempts: u32,
    },
}
