//! In-memory stand-ins for the report backend and document collaborators.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::features::reports::clients::{DocumentRetriever, DocumentViewer, ReportBackend};
use crate::features::reports::errors::BackendError;
use crate::features::reports::models::{Identity, Report, ReportCategory, ViewerReference};

pub fn identity(name: &str) -> Identity {
    Identity::new(name).expect("test identity must not be blank")
}

pub fn stored_report(id: i64, generated_by: Option<&str>, reviewed_by: Option<&str>) -> Report {
    Report {
        id,
        report_name: Some(format!("Report_{}", id)),
        generated_on: None,
        generated_by: generated_by.map(identity),
        reviewed_by: reviewed_by.map(identity),
        review_date: None,
        date_range_covered: None,
    }
}

fn unavailable() -> BackendError {
    BackendError::Status {
        status: 503,
        body: "backend unavailable".to_string(),
    }
}

/// Report backend holding its listing in memory, newest first
#[derive(Default)]
pub struct FakeBackend {
    reports: Mutex<Vec<Report>>,
    next_id: AtomicI64,
    listing_fails: AtomicBool,
    review_fails: AtomicBool,
    list_calls: AtomicUsize,
    review_calls: Mutex<Vec<(ReportCategory, i64, Identity)>>,
    listing_hold: Mutex<Option<ListingHold>>,
}

/// Pauses one listing call after it has read the listing.
///
/// `parked` fires once the call holds its copy; it answers after `release`.
#[derive(Clone, Default)]
pub struct ListingHold {
    pub parked: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl FakeBackend {
    pub fn with_reports(reports: Vec<Report>) -> Self {
        let next_id = reports.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        Self {
            reports: Mutex::new(reports),
            next_id: AtomicI64::new(next_id),
            ..Default::default()
        }
    }

    pub fn replace_reports(&self, reports: Vec<Report>) {
        *self.reports.lock().unwrap() = reports;
    }

    /// Store a freshly generated report, as the backend does on download
    pub fn store_generated(&self, generated_by: Option<Identity>) -> i64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut report = stored_report(id, None, None);
        report.generated_by = generated_by;
        report.generated_on = Some(chrono::Utc::now());
        self.reports.lock().unwrap().insert(0, report);
        id
    }

    pub fn set_listing_fails(&self, fails: bool) {
        self.listing_fails.store(fails, Ordering::SeqCst);
    }

    pub fn set_review_fails(&self, fails: bool) {
        self.review_fails.store(fails, Ordering::SeqCst);
    }

    /// Hold the next listing call until the returned `release` is notified
    pub fn hold_next_listing(&self) -> ListingHold {
        let hold = ListingHold::default();
        *self.listing_hold.lock().unwrap() = Some(hold.clone());
        hold
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn review_calls(&self) -> Vec<(ReportCategory, i64, Identity)> {
        self.review_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReportBackend for FakeBackend {
    async fn list_reports(&self, _category: ReportCategory) -> Result<Vec<Report>, BackendError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.listing_fails.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let reports = self.reports.lock().unwrap().clone();

        let hold = self.listing_hold.lock().unwrap().take();
        if let Some(hold) = hold {
            hold.parked.notify_one();
            hold.release.notified().await;
        }
        Ok(reports)
    }

    async fn commit_review(
        &self,
        category: ReportCategory,
        report_id: i64,
        reviewer: &Identity,
    ) -> Result<(), BackendError> {
        self.review_calls
            .lock()
            .unwrap()
            .push((category, report_id, reviewer.clone()));
        if self.review_fails.load(Ordering::SeqCst) {
            return Err(unavailable());
        }

        let mut reports = self.reports.lock().unwrap();
        let report = reports
            .iter_mut()
            .find(|r| r.id == report_id)
            .ok_or_else(|| BackendError::Status {
                status: 500,
                body: "Report not found".to_string(),
            })?;
        report.reviewed_by = Some(reviewer.clone());
        report.review_date = Some(chrono::Utc::now());
        Ok(())
    }
}

/// Retriever that stores a report in the fake backend for every generation URL it opens
pub struct FakeRetriever {
    backend: Arc<FakeBackend>,
    opened: Mutex<Vec<String>>,
    stores_report: AtomicBool,
    fails: AtomicBool,
    generated_by_override: Mutex<Option<Identity>>,
}

impl FakeRetriever {
    pub fn new(backend: Arc<FakeBackend>) -> Self {
        Self {
            backend,
            opened: Mutex::new(Vec::new()),
            stores_report: AtomicBool::new(true),
            fails: AtomicBool::new(false),
            generated_by_override: Mutex::new(None),
        }
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    pub fn set_stores_report(&self, stores: bool) {
        self.stores_report.store(stores, Ordering::SeqCst);
    }

    pub fn set_fails(&self, fails: bool) {
        self.fails.store(fails, Ordering::SeqCst);
    }

    pub fn set_generated_by_override(&self, generated_by: Option<Identity>) {
        *self.generated_by_override.lock().unwrap() = generated_by;
    }

    fn username_param(url: &str) -> Option<Identity> {
        let raw = url.split("username=").nth(1)?.split('&').next()?;
        let decoded = urlencoding::decode(raw).ok()?;
        Identity::new(decoded.as_ref())
    }
}

#[async_trait]
impl DocumentRetriever for FakeRetriever {
    async fn open(&self, url: &str) -> Result<(), BackendError> {
        self.opened.lock().unwrap().push(url.to_string());
        if self.fails.load(Ordering::SeqCst) {
            return Err(BackendError::EmptyDocument);
        }
        if self.stores_report.load(Ordering::SeqCst) {
            let generated_by = self
                .generated_by_override
                .lock()
                .unwrap()
                .clone()
                .or_else(|| Self::username_param(url));
            self.backend.store_generated(generated_by);
        }
        Ok(())
    }
}

/// Viewer that remembers what it was asked to show and release
#[derive(Default)]
pub struct RecordingViewer {
    shown: Mutex<Vec<ViewerReference>>,
    released: Mutex<Vec<ViewerReference>>,
}

impl RecordingViewer {
    pub fn shown(&self) -> Vec<ViewerReference> {
        self.shown.lock().unwrap().clone()
    }

    pub fn released(&self) -> Vec<ViewerReference> {
        self.released.lock().unwrap().clone()
    }
}

impl DocumentViewer for RecordingViewer {
    fn show(&self, reference: &ViewerReference) {
        self.shown.lock().unwrap().push(reference.clone());
    }

    fn release(&self, reference: &ViewerReference) {
        self.released.lock().unwrap().push(reference.clone());
    }
}
