use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::features::reports::clients::ReportBackend;
use crate::features::reports::errors::FetchError;
use crate::features::reports::models::{Identity, Report, ReportCategory};

/// Read-through projection of one category's stored-report listing.
///
/// Holds whatever the last successful refresh returned. Every refresh is a
/// full replace; a failed refresh keeps the previous listing. Overlapping
/// refreshes are not sequenced against each other: whichever completes last
/// wins. A refresh that started before a locally recorded review never
/// replaces the listing, so a recorded review cannot be undone.
pub struct ReportRegistry {
    category: ReportCategory,
    backend: Arc<dyn ReportBackend>,
    reports: RwLock<Vec<Report>>,
    /// Bumped by every recorded review, under the `reports` write lock
    reviews_recorded: AtomicU64,
}

impl ReportRegistry {
    pub fn new(category: ReportCategory, backend: Arc<dyn ReportBackend>) -> Self {
        Self {
            category,
            backend,
            reports: RwLock::new(Vec::new()),
            reviews_recorded: AtomicU64::new(0),
        }
    }

    pub fn category(&self) -> ReportCategory {
        self.category
    }

    /// Replace the held listing with the backend's current one.
    ///
    /// The fetched listing is always returned to the caller, even when it is
    /// too old to be held.
    pub async fn refresh(&self) -> Result<Vec<Report>, FetchError> {
        let stamp = self.reviews_recorded.load(Ordering::SeqCst);
        let fetched = self
            .backend
            .list_reports(self.category)
            .await
            .map_err(|source| {
                tracing::warn!(
                    "Keeping previous {} report listing, refresh failed: {}",
                    self.category,
                    source
                );
                FetchError {
                    category: self.category,
                    source,
                }
            })?;

        let mut held = self.reports.write().await;
        if self.reviews_recorded.load(Ordering::SeqCst) != stamp {
            tracing::debug!(
                "Discarding {} report listing fetched before a recorded review",
                self.category
            );
            return Ok(fetched);
        }
        *held = fetched.clone();
        drop(held);
        tracing::debug!(
            "{} report registry refreshed with {} entries",
            self.category,
            fetched.len()
        );
        Ok(fetched)
    }

    pub async fn find_by_id(&self, id: i64) -> Option<Report> {
        self.reports
            .read()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    pub async fn snapshot(&self) -> Vec<Report> {
        self.reports.read().await.clone()
    }

    /// Mark a held entry reviewed after the backend accepted the review.
    ///
    /// Keeps the one-way transition visible even if the follow-up refresh
    /// fails. Returns false when the entry is missing or already reviewed.
    pub async fn record_review(&self, id: i64, reviewer: &Identity) -> bool {
        let mut reports = self.reports.write().await;
        match reports.iter_mut().find(|r| r.id == id) {
            Some(report) if report.reviewed_by.is_none() => {
                report.reviewed_by = Some(reviewer.clone());
                report.review_date = Some(chrono::Utc::now());
                self.reviews_recorded.fetch_add(1, Ordering::SeqCst);
                true
            }
            _ => false,
        }
    }
}
