use std::sync::Arc;

use jansetu_domain::auth::Role;
use jansetu_domain::identity::Session;
use jansetu_domain::issues::{IssueCategory, IssueCreate, IssueService, TimelineEntryKind};
use jansetu_domain::sla::{IssueStatus, Priority, SlaClassification, SlaPolicy};
use jansetu_infra::repositories::InMemoryIssueRepository;

const HOUR_MS: i64 = 3_600_000;

fn manager_session() -> Session {
    Session {
        user_id: "mgr-1".to_string(),
        username: "operations.manager".to_string(),
        role: Role::Manager,
        permissions: Role::Manager.default_permissions(),
        ulb_id: Some("ulb_adi".to_string()),
    }
}

fn issue_service() -> IssueService {
    IssueService::new(
        Arc::new(InMemoryIssueRepository::new()),
        SlaPolicy::default(),
    )
}

fn water_main_report(priority: Priority) -> IssueCreate {
    IssueCreate {
        ulb_id: None,
        title: "Water main burst".to_string(),
        description: "Flooding near the vegetable market".to_string(),
        category: IssueCategory::Utilities,
        priority,
        address: "Main Road, Ward 4".to_string(),
    }
}

// Default policy: critical window 4h, at-risk threshold 2h. Each
// classification change surfaces exactly once; repeat passes at the same
// classification stay quiet.
#[tokio::test]
async fn critical_issue_escalates_once_per_classification_change() {
    let service = issue_service();
    let session = manager_session();
    let issue = service
        .report(&session, water_main_report(Priority::Critical), 0)
        .await
        .unwrap();

    // Fresh issue is on track, nothing to surface.
    assert!(service.sweep(0).await.unwrap().is_empty());

    // 1h remaining: newly at risk on a critical issue.
    let escalations = service.sweep(3 * HOUR_MS).await.unwrap();
    assert_eq!(escalations.len(), 1);
    assert_eq!(escalations[0].issue_id, issue.issue_id);
    assert_eq!(escalations[0].classification, SlaClassification::AtRisk);

    // Still at risk on the next pass: already recorded.
    assert!(
        service
            .sweep(3 * HOUR_MS + HOUR_MS / 2)
            .await
            .unwrap()
            .is_empty()
    );

    // Past the deadline: one overdue escalation, then quiet again.
    let escalations = service.sweep(5 * HOUR_MS).await.unwrap();
    assert_eq!(escalations.len(), 1);
    assert_eq!(escalations[0].classification, SlaClassification::Overdue);
    assert!(escalations[0].hours_remaining < 0.0);
    assert!(service.sweep(6 * HOUR_MS).await.unwrap().is_empty());
}

#[tokio::test]
async fn crossing_the_deadline_writes_one_timeline_entry() {
    let service = issue_service();
    let session = manager_session();
    let issue = service
        .report(&session, water_main_report(Priority::Medium), 0)
        .await
        .unwrap();

    // Medium window is 24h; both passes land past the deadline.
    assert_eq!(service.sweep(25 * HOUR_MS).await.unwrap().len(), 1);
    assert!(service.sweep(26 * HOUR_MS).await.unwrap().is_empty());

    let timeline = service.timeline(&session, &issue.issue_id).await.unwrap();
    let deadline_entries: Vec<_> = timeline
        .iter()
        .filter(|entry| entry.actor.user_id == "system")
        .collect();
    assert_eq!(deadline_entries.len(), 1);
    assert_eq!(deadline_entries[0].kind, TimelineEntryKind::StatusChange);
    assert_eq!(
        deadline_entries[0].note.as_deref(),
        Some("SLA deadline passed")
    );
}

// Only critical issues are urgent at risk; lower priorities stay silent until
// they actually cross the deadline, but the observed state is still recorded.
#[tokio::test]
async fn non_critical_at_risk_is_recorded_without_escalation() {
    let service = issue_service();
    let session = manager_session();
    let issue = service
        .report(&session, water_main_report(Priority::High), 0)
        .await
        .unwrap();

    // High window 8h, threshold 4h: at risk at 5h but not escalation-worthy.
    assert!(service.sweep(5 * HOUR_MS).await.unwrap().is_empty());

    let escalations = service.sweep(9 * HOUR_MS).await.unwrap();
    assert_eq!(escalations.len(), 1);
    assert_eq!(escalations[0].issue_id, issue.issue_id);
    assert_eq!(escalations[0].classification, SlaClassification::Overdue);
}

#[tokio::test]
async fn terminal_issues_are_skipped_by_the_sweep() {
    let service = issue_service();
    let session = manager_session();
    let issue = service
        .report(&session, water_main_report(Priority::Medium), 0)
        .await
        .unwrap();
    service
        .transition(&session, &issue.issue_id, IssueStatus::InProgress, None, HOUR_MS)
        .await
        .unwrap();
    service
        .transition(&session, &issue.issue_id, IssueStatus::Resolved, None, 2 * HOUR_MS)
        .await
        .unwrap();

    // Way past the deadline: resolved issues never escalate.
    assert!(service.sweep(30 * HOUR_MS).await.unwrap().is_empty());
    let timeline = service.timeline(&session, &issue.issue_id).await.unwrap();
    assert!(timeline.iter().all(|entry| entry.actor.user_id != "system"));
}
