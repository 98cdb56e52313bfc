//! The single review gate.
//!
//! Listing rows use it to decide whether to offer the review action; the
//! review commit path uses it to enforce. There is no other copy.

use crate::features::reports::models::{Identity, Report};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewDenial {
    UnknownReport,
    MissingIdentity,
    AlreadyReviewed { reviewer: Identity },
    SelfReview,
}

impl std::fmt::Display for ReviewDenial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReviewDenial::UnknownReport => write!(f, "report not found"),
            ReviewDenial::MissingIdentity => write!(f, "operator identity required"),
            ReviewDenial::AlreadyReviewed { reviewer } => {
                write!(f, "report already reviewed by {}", reviewer)
            }
            ReviewDenial::SelfReview => write!(f, "operators cannot review reports they generated"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewDecision {
    Permitted,
    Denied(ReviewDenial),
}

impl ReviewDecision {
    pub fn is_permitted(&self) -> bool {
        matches!(self, ReviewDecision::Permitted)
    }
}

/// Decide whether `acting_user` may review `report`. Fails closed when
/// either is unknown.
pub fn review_decision(report: Option<&Report>, acting_user: Option<&Identity>) -> ReviewDecision {
    let Some(report) = report else {
        return ReviewDecision::Denied(ReviewDenial::UnknownReport);
    };
    let Some(user) = acting_user else {
        return ReviewDecision::Denied(ReviewDenial::MissingIdentity);
    };

    if let Some(reviewer) = &report.reviewed_by {
        return ReviewDecision::Denied(ReviewDenial::AlreadyReviewed {
            reviewer: reviewer.clone(),
        });
    }

    if report.is_generated_by(user) {
        return ReviewDecision::Denied(ReviewDenial::SelfReview);
    }

    ReviewDecision::Permitted
}

pub fn can_review(report: Option<&Report>, acting_user: Option<&Identity>) -> bool {
    review_decision(report, acting_user).is_permitted()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{identity, stored_report};

    #[test]
    fn test_absent_report_or_user_fails_closed() {
        let report = stored_report(1, Some("alice"), None);
        let bob = identity("bob");

        assert!(!can_review(None, Some(&bob)));
        assert!(!can_review(Some(&report), None));
        assert!(!can_review(None, None));
        assert_eq!(
            review_decision(None, Some(&bob)),
            ReviewDecision::Denied(ReviewDenial::UnknownReport)
        );
        assert_eq!(
            review_decision(Some(&report), None),
            ReviewDecision::Denied(ReviewDenial::MissingIdentity)
        );
    }

    #[test]
    fn test_reviewed_report_is_never_reviewable() {
        let report = stored_report(1, Some("alice"), Some("bob"));
        for user in ["alice", "bob", "carol"] {
            assert!(!can_review(Some(&report), Some(&identity(user))));
        }
        assert_eq!(
            review_decision(Some(&report), Some(&identity("carol"))),
            ReviewDecision::Denied(ReviewDenial::AlreadyReviewed {
                reviewer: identity("bob")
            })
        );
    }

    #[test]
    fn test_generator_cannot_review_own_report() {
        let report = stored_report(1, Some("alice"), None);
        assert_eq!(
            review_decision(Some(&report), Some(&identity("alice"))),
            ReviewDecision::Denied(ReviewDenial::SelfReview)
        );
    }

    #[test]
    fn test_other_operator_can_review_unreviewed_report() {
        let report = stored_report(1, Some("alice"), None);
        assert!(can_review(Some(&report), Some(&identity("bob"))));
    }

    #[test]
    fn test_can_review_truth_table() {
        let generators = [Some("alice"), None];
        let reviewers = [None, Some("alice"), Some("bob")];
        let users = [None, Some("alice"), Some("bob"), Some("carol")];

        for generated_by in generators {
            for reviewed_by in reviewers {
                let report = stored_report(9, generated_by, reviewed_by);
                for user in users {
                    let acting = user.map(identity);
                    let expected = reviewed_by.is_none()
                        && acting.is_some()
                        && user != generated_by;
                    assert_eq!(
                        can_review(Some(&report), acting.as_ref()),
                        expected,
                        "generated_by={:?} reviewed_by={:?} user={:?}",
                        generated_by,
                        reviewed_by,
                        user
                    );
                }
            }
        }
    }
}
