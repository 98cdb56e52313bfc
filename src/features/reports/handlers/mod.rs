pub mod report_handler;

pub use report_handler::{
    __path_close_view, __path_generate_report, __path_get_open_view, __path_list_reports,
    __path_review_report, __path_view_report, close_view, generate_report, get_open_view,
    list_reports, review_report, view_report, ReportState,
};
