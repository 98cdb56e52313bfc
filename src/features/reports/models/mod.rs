mod date_range;
mod report;
mod viewer;

pub use date_range::{Bound, DateRange, DateRangeForm};
pub use report::{Identity, Report, ReportCategory, ReportStatus};
pub use viewer::ViewerReference;
