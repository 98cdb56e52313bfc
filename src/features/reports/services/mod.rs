pub mod date_range_validator;
pub mod review_authorizer;
mod report_registry;
mod report_workflow;

pub use report_registry::ReportRegistry;
pub use report_workflow::{ReportWorkflow, ReviewOutcome};
pub use review_authorizer::{can_review, review_decision, ReviewDecision, ReviewDenial};
