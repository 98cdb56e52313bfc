mod document_viewer;
mod report_backend;

pub use document_viewer::{DocumentRetriever, DocumentViewer, HttpDocumentRetriever, LinkViewer};
pub use report_backend::{HttpReportBackend, ReportBackend, ReportEndpoints};
