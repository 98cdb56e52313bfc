use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::core::config::WorkflowConfig;
use crate::features::reports::clients::{
    DocumentRetriever, DocumentViewer, ReportBackend, ReportEndpoints,
};
use crate::features::reports::errors::WorkflowError;
use crate::features::reports::models::{
    DateRange, Identity, Report, ReportCategory, ViewerReference,
};
use crate::features::reports::services::review_authorizer::{
    review_decision, ReviewDecision, ReviewDenial,
};
use crate::features::reports::services::ReportRegistry;

/// Result of a committed review
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub report_id: i64,
    pub reviewed_by: Identity,
    /// The report as listed after the review
    pub report: Option<Report>,
    /// True when the follow-up refresh failed; the next successful listing corrects it
    pub registry_stale: bool,
}

/// Generate, list, view and review flow for one report category
pub struct ReportWorkflow {
    registry: Arc<ReportRegistry>,
    backend: Arc<dyn ReportBackend>,
    endpoints: ReportEndpoints,
    retriever: Arc<dyn DocumentRetriever>,
    viewer: Arc<dyn DocumentViewer>,
    settings: WorkflowConfig,
    open_views: Mutex<HashMap<Identity, ViewerReference>>,
    review_gate: Mutex<()>,
}

impl ReportWorkflow {
    pub fn new(
        registry: Arc<ReportRegistry>,
        backend: Arc<dyn ReportBackend>,
        endpoints: ReportEndpoints,
        retriever: Arc<dyn DocumentRetriever>,
        viewer: Arc<dyn DocumentViewer>,
        settings: WorkflowConfig,
    ) -> Self {
        Self {
            registry,
            backend,
            endpoints,
            retriever,
            viewer,
            settings,
            open_views: Mutex::new(HashMap::new()),
            review_gate: Mutex::new(()),
        }
    }

    pub fn category(&self) -> ReportCategory {
        self.registry.category()
    }

    pub fn registry(&self) -> &ReportRegistry {
        &self.registry
    }

    /// Request a new report for `range` and wait until it shows up in the listing.
    ///
    /// The backend stores the listing row after answering the generation
    /// request, so the listing is polled with a settling delay before each
    /// attempt, bounded by `max_settle_attempts`.
    pub async fn generate(
        &self,
        range: &DateRange,
        requester: &Identity,
    ) -> Result<Report, WorkflowError> {
        let category = self.category();
        let known_ids: HashSet<i64> = match self.registry.refresh().await {
            Ok(reports) => reports.iter().map(|r| r.id).collect(),
            Err(_) => self.registry.snapshot().await.iter().map(|r| r.id).collect(),
        };

        let url = self.endpoints.download_url(category, range, requester);
        tracing::info!(
            "{} requested {} report for {} .. {}",
            requester,
            category,
            range.query_from(),
            range.query_to()
        );

        self.retriever
            .open(&url)
            .await
            .map_err(|source| WorkflowError::GenerationRequestFailed { category, source })?;

        for attempt in 1..=self.settings.max_settle_attempts {
            tokio::time::sleep(self.settings.settle_delay).await;

            match self.registry.refresh().await {
                Ok(reports) => {
                    if let Some(mut report) = reports
                        .into_iter()
                        .find(|r| self.is_new_generation(r, &known_ids, requester))
                    {
                        // The listing does not carry the range; it is known only here
                        report.date_range_covered = Some(*range);
                        tracing::info!(
                            "Generated {} report {} visible after {} refresh(es)",
                            category,
                            report.id,
                            attempt
                        );
                        return Ok(report);
                    }
                    tracing::debug!(
                        "Generated {} report not listed yet (attempt {}/{})",
                        category,
                        attempt,
                        self.settings.max_settle_attempts
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "Refresh after generation failed (attempt {}/{}): {}",
                        attempt,
                        self.settings.max_settle_attempts,
                        e
                    );
                }
            }
        }

        Err(WorkflowError::GenerationNotYetVisible {
            category,
            attempts: self.settings.max_settle_attempts,
        })
    }

    fn is_new_generation(
        &self,
        report: &Report,
        known_ids: &HashSet<i64>,
        requester: &Identity,
    ) -> bool {
        if known_ids.contains(&report.id) {
            return false;
        }
        !self.category().sends_username() || report.is_generated_by(requester)
    }

    /// Refresh and return the listing. Failures are surfaced, never retried.
    pub async fn list(&self) -> Result<Vec<Report>, WorkflowError> {
        Ok(self.registry.refresh().await?)
    }

    /// Hand the stored document of `report_id` to the viewer on behalf of `operator`.
    ///
    /// A view the operator already had open is released first.
    pub async fn view(&self, report_id: i64, operator: &Identity) -> ViewerReference {
        let reference = ViewerReference {
            category: self.category(),
            report_id,
            url: self.endpoints.view_url(self.category(), report_id),
        };

        let previous = self
            .open_views
            .lock()
            .await
            .insert(operator.clone(), reference.clone());
        if let Some(previous) = previous {
            self.viewer.release(&previous);
        }

        self.viewer.show(&reference);
        reference
    }

    /// Release and forget the operator's open view. Returns whether one was open.
    pub async fn close_view(&self, operator: &Identity) -> bool {
        let open = self.open_views.lock().await.remove(operator);
        match open {
            Some(reference) => {
                self.viewer.release(&reference);
                true
            }
            None => false,
        }
    }

    pub async fn open_view(&self, operator: &Identity) -> Option<ViewerReference> {
        self.open_views.lock().await.get(operator).cloned()
    }

    /// Review `report_id` as `reviewer`.
    ///
    /// The review gate is re-checked against the held listing before any
    /// backend call. After a successful commit the operator's view is closed
    /// and the listing refreshed; a failed refresh does not undo the review.
    pub async fn review(
        &self,
        report_id: i64,
        reviewer: Option<&Identity>,
    ) -> Result<ReviewOutcome, WorkflowError> {
        let category = self.category();
        let gate = self.review_gate.lock().await;

        let held = self.registry.find_by_id(report_id).await;
        if let ReviewDecision::Denied(denial) = review_decision(held.as_ref(), reviewer) {
            tracing::warn!(
                "Rejected review of {} report {} by {}: {}",
                category,
                report_id,
                reviewer.map_or("<anonymous>", Identity::as_str),
                denial
            );
            return Err(WorkflowError::NotAuthorized(denial));
        }
        let reviewer = reviewer.ok_or(WorkflowError::NotAuthorized(ReviewDenial::MissingIdentity))?;

        self.backend
            .commit_review(category, report_id, reviewer)
            .await
            .map_err(|source| WorkflowError::ReviewCommit {
                category,
                report_id,
                source,
            })?;

        self.registry.record_review(report_id, reviewer).await;
        drop(gate);

        self.close_view(reviewer).await;

        let (report, registry_stale) = match self.list().await {
            Ok(reports) => (reports.into_iter().find(|r| r.id == report_id), false),
            Err(e) => {
                tracing::warn!(
                    "{} report {} reviewed but listing refresh failed: {}",
                    category,
                    report_id,
                    e
                );
                (self.registry.find_by_id(report_id).await, true)
            }
        };

        Ok(ReviewOutcome {
            report_id,
            reviewed_by: reviewer.clone(),
            report,
            registry_stale,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reports::models::DateRangeForm;
    use crate::features::reports::services::date_range_validator;
    use crate::shared::test_helpers::{
        identity, stored_report, FakeBackend, FakeRetriever, RecordingViewer,
    };
    use std::time::Duration;

    struct Harness {
        backend: Arc<FakeBackend>,
        retriever: Arc<FakeRetriever>,
        viewer: Arc<RecordingViewer>,
        workflow: ReportWorkflow,
    }

    fn harness(category: ReportCategory, reports: Vec<Report>) -> Harness {
        let backend = Arc::new(FakeBackend::with_reports(reports));
        let retriever = Arc::new(FakeRetriever::new(backend.clone()));
        let viewer = Arc::new(RecordingViewer::default());
        let registry = Arc::new(ReportRegistry::new(category, backend.clone()));
        let workflow = ReportWorkflow::new(
            registry,
            backend.clone(),
            ReportEndpoints::new("http://bms.local/v1"),
            retriever.clone(),
            viewer.clone(),
            WorkflowConfig {
                settle_delay: Duration::ZERO,
                max_settle_attempts: 3,
            },
        );
        Harness {
            backend,
            retriever,
            viewer,
            workflow,
        }
    }

    fn january() -> DateRange {
        let mut form = DateRangeForm::new("2024-01-01T00:00", "2024-01-31T00:00");
        date_range_validator::validate(&mut form).unwrap()
    }

    #[tokio::test]
    async fn test_end_to_end_generate_review_and_rejections() {
        let h = harness(ReportCategory::Alarm, vec![]);
        let alice = identity("alice");
        let bob = identity("bob");

        let generated = h.workflow.generate(&january(), &alice).await.unwrap();
        assert_eq!(generated.generated_by, Some(alice.clone()));
        assert_eq!(generated.date_range_covered, Some(january()));
        assert!(generated.reviewed_by.is_none());
        assert!(h.workflow.registry().find_by_id(generated.id).await.is_some());

        let opened = h.retriever.opened();
        assert_eq!(opened.len(), 1);
        assert!(opened[0].contains("/alarm-report/download?"));
        assert!(opened[0].contains("username=alice"));

        let outcome = h.workflow.review(generated.id, Some(&bob)).await.unwrap();
        assert_eq!(outcome.reviewed_by, bob);
        assert!(!outcome.registry_stale);
        assert_eq!(outcome.report.unwrap().reviewed_by, Some(bob.clone()));

        let again = h.workflow.review(generated.id, Some(&bob)).await;
        assert!(matches!(
            again,
            Err(WorkflowError::NotAuthorized(ReviewDenial::AlreadyReviewed { .. }))
        ));

        let fresh = h.workflow.generate(&january(), &alice).await.unwrap();
        assert_ne!(fresh.id, generated.id);
        let own = h.workflow.review(fresh.id, Some(&alice)).await;
        assert!(matches!(
            own,
            Err(WorkflowError::NotAuthorized(ReviewDenial::SelfReview))
        ));

        assert_eq!(h.backend.review_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_denied_review_makes_no_backend_call() {
        let h = harness(
            ReportCategory::Alarm,
            vec![stored_report(1, Some("alice"), None)],
        );
        h.workflow.list().await.unwrap();

        let anonymous = h.workflow.review(1, None).await;
        assert!(matches!(
            anonymous,
            Err(WorkflowError::NotAuthorized(ReviewDenial::MissingIdentity))
        ));

        let unknown = h.workflow.review(404, Some(&identity("bob"))).await;
        assert!(matches!(
            unknown,
            Err(WorkflowError::NotAuthorized(ReviewDenial::UnknownReport))
        ));

        assert!(h.backend.review_calls().is_empty());
    }

    #[tokio::test]
    async fn test_review_commit_failure_leaves_state_unchanged() {
        let h = harness(
            ReportCategory::Audit,
            vec![stored_report(1, Some("alice"), None)],
        );
        let bob = identity("bob");
        h.workflow.list().await.unwrap();
        h.workflow.view(1, &bob).await;

        h.backend.set_review_fails(true);
        let result = h.workflow.review(1, Some(&bob)).await;
        assert!(matches!(
            result,
            Err(WorkflowError::ReviewCommit { report_id: 1, .. })
        ));

        assert!(h.workflow.registry().find_by_id(1).await.unwrap().reviewed_by.is_none());
        assert!(h.workflow.open_view(&bob).await.is_some());
        assert!(h.viewer.released().is_empty());

        // still usable after the failure
        h.backend.set_review_fails(false);
        assert!(h.workflow.review(1, Some(&bob)).await.is_ok());
    }

    #[tokio::test]
    async fn test_review_survives_failed_refresh_and_blocks_second_review() {
        let h = harness(
            ReportCategory::Alarm,
            vec![stored_report(1, Some("alice"), None)],
        );
        h.workflow.list().await.unwrap();

        h.backend.set_listing_fails(true);
        let outcome = h.workflow.review(1, Some(&identity("bob"))).await.unwrap();
        assert!(outcome.registry_stale);
        assert_eq!(outcome.report.unwrap().reviewed_by, Some(identity("bob")));

        let second = h.workflow.review(1, Some(&identity("carol"))).await;
        assert!(matches!(
            second,
            Err(WorkflowError::NotAuthorized(ReviewDenial::AlreadyReviewed { .. }))
        ));
        assert_eq!(h.backend.review_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_listing_in_flight_during_review_cannot_reopen_it() {
        let h = harness(
            ReportCategory::Alarm,
            vec![stored_report(1, Some("alice"), None)],
        );
        let workflow = Arc::new(h.workflow);
        workflow.list().await.unwrap();

        let hold = h.backend.hold_next_listing();
        let slow_list = tokio::spawn({
            let workflow = workflow.clone();
            async move { workflow.list().await }
        });
        hold.parked.notified().await;

        workflow.review(1, Some(&identity("bob"))).await.unwrap();
        hold.release.notify_one();

        let stale = slow_list.await.unwrap().unwrap();
        assert!(stale[0].reviewed_by.is_none());

        let second = workflow.review(1, Some(&identity("carol"))).await;
        assert!(matches!(
            second,
            Err(WorkflowError::NotAuthorized(ReviewDenial::AlreadyReviewed { .. }))
        ));
        assert_eq!(
            h.backend.review_calls(),
            vec![(ReportCategory::Alarm, 1, identity("bob"))]
        );
    }

    #[tokio::test]
    async fn test_successful_review_closes_reviewers_view() {
        let h = harness(
            ReportCategory::Alarm,
            vec![stored_report(1, Some("alice"), None)],
        );
        let bob = identity("bob");
        h.workflow.list().await.unwrap();

        let reference = h.workflow.view(1, &bob).await;
        assert_eq!(reference.url, "http://bms.local/v1/alarm-report/view/1");

        h.workflow.review(1, Some(&bob)).await.unwrap();
        assert!(h.workflow.open_view(&bob).await.is_none());
        assert_eq!(h.viewer.released(), vec![reference]);
    }

    #[tokio::test]
    async fn test_view_releases_previous_reference() {
        let h = harness(ReportCategory::Audit, vec![]);
        let bob = identity("bob");

        let first = h.workflow.view(1, &bob).await;
        let second = h.workflow.view(2, &bob).await;

        assert_eq!(h.viewer.shown(), vec![first.clone(), second.clone()]);
        assert_eq!(h.viewer.released(), vec![first]);
        assert_eq!(h.workflow.open_view(&bob).await, Some(second.clone()));

        assert!(h.workflow.close_view(&bob).await);
        assert!(!h.workflow.close_view(&bob).await);
        assert_eq!(h.viewer.released().len(), 2);
    }

    #[tokio::test]
    async fn test_generate_gives_up_when_report_never_appears() {
        let h = harness(ReportCategory::Alarm, vec![]);
        h.retriever.set_stores_report(false);

        let result = h.workflow.generate(&january(), &identity("alice")).await;
        assert!(matches!(
            result,
            Err(WorkflowError::GenerationNotYetVisible { attempts: 3, .. })
        ));
        // one baseline refresh plus one per attempt
        assert_eq!(h.backend.list_calls(), 4);
    }

    #[tokio::test]
    async fn test_generate_surfaces_failed_generation_request() {
        let h = harness(ReportCategory::Alarm, vec![]);
        h.retriever.set_fails(true);

        let result = h.workflow.generate(&january(), &identity("alice")).await;
        assert!(matches!(
            result,
            Err(WorkflowError::GenerationRequestFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_generate_ignores_reports_by_other_operators() {
        let h = harness(ReportCategory::Alarm, vec![]);
        // someone else's report lands between baseline and reconciliation
        h.retriever.set_generated_by_override(Some(identity("carol")));

        let result = h.workflow.generate(&january(), &identity("alice")).await;
        assert!(matches!(
            result,
            Err(WorkflowError::GenerationNotYetVisible { .. })
        ));
    }

    #[tokio::test]
    async fn test_audit_generate_accepts_anonymous_listing_row() {
        let h = harness(
            ReportCategory::Audit,
            vec![stored_report(1, None, Some("bob"))],
        );

        let generated = h.workflow.generate(&january(), &identity("alice")).await.unwrap();
        assert_ne!(generated.id, 1);
        assert!(generated.generated_by.is_none());
        assert!(!h.retriever.opened()[0].contains("username"));
    }

    #[tokio::test]
    async fn test_list_surfaces_fetch_error() {
        let h = harness(ReportCategory::Alarm, vec![]);
        h.backend.set_listing_fails(true);

        let result = h.workflow.list().await;
        assert!(matches!(result, Err(WorkflowError::Fetch(_))));
        assert_eq!(h.backend.list_calls(), 1);
    }
}
