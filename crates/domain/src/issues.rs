use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::identity::Session;
use crate::ports::issues::IssueRepository;
use crate::sla::{
    self, IssueStatus, Priority, SlaClassification, SlaPolicy, SlaSnapshot, SlaWindow,
};
use crate::ulbs::UlbScope;
use crate::util::uuid_v7_without_dashes;

const MAX_TITLE_LENGTH: usize = 200;
const MAX_DESCRIPTION_LENGTH: usize = 2_000;
const MAX_ADDRESS_LENGTH: usize = 300;
const MAX_NOTE_LENGTH: usize = 1_000;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    Infrastructure,
    Sanitation,
    Utilities,
    Safety,
    Environment,
}

impl IssueCategory {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "infrastructure" => Some(IssueCategory::Infrastructure),
            "sanitation" => Some(IssueCategory::Sanitation),
            "utilities" => Some(IssueCategory::Utilities),
            "safety" => Some(IssueCategory::Safety),
            "environment" => Some(IssueCategory::Environment),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCategory::Infrastructure => "infrastructure",
            IssueCategory::Sanitation => "sanitation",
            IssueCategory::Utilities => "utilities",
            IssueCategory::Safety => "safety",
            IssueCategory::Environment => "environment",
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimelineEntryKind {
    StatusChange,
    Assignment,
    Comment,
    Resolution,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimelineActorSnapshot {
    pub user_id: String,
    pub username: String,
    pub role: String,
}

impl TimelineActorSnapshot {
    pub fn from_session(session: &Session) -> Self {
        Self {
            user_id: session.user_id.clone(),
            username: session.username.clone(),
            role: session.role.as_str().to_string(),
        }
    }

    /// Attribution for entries the service writes on its own, such as sweep
    /// escalations.
    pub fn system() -> Self {
        Self {
            user_id: "system".to_string(),
            username: "system".to_string(),
            role: "system".to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimelineEntry {
    pub entry_id: String,
    pub kind: TimelineEntryKind,
    pub actor: TimelineActorSnapshot,
    pub note: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub occurred_at_ms: i64,
}

impl TimelineEntry {
    fn new(kind: TimelineEntryKind, actor: TimelineActorSnapshot, occurred_at_ms: i64) -> Self {
        Self {
            entry_id: uuid_v7_without_dashes(),
            kind,
            actor,
            note: None,
            old_value: None,
            new_value: None,
            occurred_at_ms,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Issue {
    pub issue_id: String,
    pub ulb_id: String,
    pub title: String,
    pub description: String,
    pub category: IssueCategory,
    pub priority: Priority,
    pub status: IssueStatus,
    pub address: String,
    pub reported_by: String,
    pub assigned_to: Option<String>,
    pub reported_at_ms: i64,
    pub sla_deadline_ms: i64,
    pub updated_at_ms: i64,
    pub resolved_at_ms: Option<i64>,
    /// Last classification observed by the SLA sweep; drives escalation
    /// de-duplication.
    pub sla_state: Option<SlaClassification>,
}

impl Issue {
    pub fn sla_window(&self) -> DomainResult<SlaWindow> {
        SlaWindow::new(self.reported_at_ms, self.sla_deadline_ms)
    }

    pub fn sla_snapshot(&self, now_ms: i64) -> DomainResult<SlaSnapshot> {
        Ok(sla::evaluate(
            &self.sla_window()?,
            self.status,
            self.priority,
            now_ms,
        ))
    }
}

/// Legal lifecycle moves. Terminal statuses accept nothing.
pub fn legal_transition(from: IssueStatus, to: IssueStatus) -> bool {
    matches!(
        (from, to),
        (IssueStatus::New, IssueStatus::InProgress)
            | (IssueStatus::New, IssueStatus::Rejected)
            | (IssueStatus::InProgress, IssueStatus::Resolved)
            | (IssueStatus::InProgress, IssueStatus::Rejected)
    )
}

#[derive(Clone, Debug)]
pub struct IssueCreate {
    pub ulb_id: Option<String>,
    pub title: String,
    pub description: String,
    pub category: IssueCategory,
    pub priority: Priority,
    pub address: String,
}

#[derive(Clone, Debug, Default)]
pub struct IssueListFilter {
    pub status: Option<IssueStatus>,
    pub priority: Option<Priority>,
    pub category: Option<IssueCategory>,
    pub assigned_to: Option<String>,
}

impl IssueListFilter {
    fn matches(&self, issue: &Issue) -> bool {
        self.status.is_none_or(|status| issue.status == status)
            && self.priority.is_none_or(|priority| issue.priority == priority)
            && self
                .category
                .is_none_or(|category| issue.category == category)
            && self
                .assigned_to
                .as_deref()
                .is_none_or(|assignee| issue.assigned_to.as_deref() == Some(assignee))
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SlaEscalation {
    pub issue_id: String,
    pub ulb_id: String,
    pub priority: Priority,
    pub classification: SlaClassification,
    pub hours_remaining: f64,
}

#[derive(Clone)]
pub struct IssueService {
    repository: Arc<dyn IssueRepository>,
    policy: SlaPolicy,
}

impl IssueService {
    pub fn new(repository: Arc<dyn IssueRepository>, policy: SlaPolicy) -> Self {
        Self { repository, policy }
    }

    pub fn policy(&self) -> &SlaPolicy {
        &self.policy
    }

    pub async fn report(
        &self,
        session: &Session,
        input: IssueCreate,
        now_ms: i64,
    ) -> DomainResult<Issue> {
        let input = validate_issue_create(input)?;
        let scope = UlbScope::for_session(session)?;
        let ulb_id = scope.resolve_target(input.ulb_id.as_deref())?;

        let window = self.policy.window_for(input.priority, now_ms)?;
        let issue = Issue {
            issue_id: uuid_v7_without_dashes(),
            ulb_id,
            title: input.title,
            description: input.description,
            category: input.category,
            priority: input.priority,
            status: IssueStatus::New,
            address: input.address,
            reported_by: session.user_id.clone(),
            assigned_to: None,
            reported_at_ms: window.reported_at_ms(),
            sla_deadline_ms: window.deadline_ms(),
            updated_at_ms: now_ms,
            resolved_at_ms: None,
            sla_state: None,
        };
        let issue = self.repository.create(&issue).await?;

        let mut entry = TimelineEntry::new(
            TimelineEntryKind::StatusChange,
            TimelineActorSnapshot::from_session(session),
            now_ms,
        );
        entry.note = Some("Issue reported".to_string());
        entry.new_value = Some(IssueStatus::New.as_str().to_string());
        self.repository.append_timeline(&issue.issue_id, &entry).await?;

        Ok(issue)
    }

    pub async fn get(&self, session: &Session, issue_id: &str) -> DomainResult<Issue> {
        let scope = UlbScope::for_session(session)?;
        let issue = self
            .repository
            .get(issue_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        if !scope.permits(&issue.ulb_id) {
            return Err(DomainError::Forbidden);
        }
        Ok(issue)
    }

    pub async fn list(
        &self,
        session: &Session,
        filter: &IssueListFilter,
    ) -> DomainResult<Vec<Issue>> {
        let scope = UlbScope::for_session(session)?;
        let issues = self.repository.list(scope.filter()).await?;
        Ok(issues
            .into_iter()
            .filter(|issue| filter.matches(issue))
            .collect())
    }

    pub async fn timeline(
        &self,
        session: &Session,
        issue_id: &str,
    ) -> DomainResult<Vec<TimelineEntry>> {
        // Scope check rides on the issue lookup.
        self.get(session, issue_id).await?;
        self.repository.timeline(issue_id).await
    }

    pub async fn assign(
        &self,
        session: &Session,
        issue_id: &str,
        assignee_id: &str,
        note: Option<String>,
        now_ms: i64,
    ) -> DomainResult<Issue> {
        if assignee_id.trim().is_empty() {
            return Err(DomainError::Validation(
                "assignee id must not be empty".to_string(),
            ));
        }
        validate_note(&note)?;

        let mut issue = self.get(session, issue_id).await?;
        if issue.status.is_terminal() {
            return Err(DomainError::Conflict);
        }

        let previous = issue.assigned_to.clone();
        issue.assigned_to = Some(assignee_id.to_string());
        issue.updated_at_ms = now_ms;
        let issue = self.repository.update(&issue).await?;

        let mut entry = TimelineEntry::new(
            TimelineEntryKind::Assignment,
            TimelineActorSnapshot::from_session(session),
            now_ms,
        );
        entry.note = note;
        entry.old_value = previous;
        entry.new_value = Some(assignee_id.to_string());
        self.repository.append_timeline(issue_id, &entry).await?;

        Ok(issue)
    }

    pub async fn transition(
        &self,
        session: &Session,
        issue_id: &str,
        to: IssueStatus,
        note: Option<String>,
        now_ms: i64,
    ) -> DomainResult<Issue> {
        validate_note(&note)?;

        let mut issue = self.get(session, issue_id).await?;
        if !legal_transition(issue.status, to) {
            return Err(DomainError::Validation(format!(
                "illegal status transition {} -> {}",
                issue.status.as_str(),
                to.as_str()
            )));
        }

        let from = issue.status;
        issue.status = to;
        issue.updated_at_ms = now_ms;
        if to == IssueStatus::Resolved {
            issue.resolved_at_ms = Some(now_ms);
        }
        let issue = self.repository.update(&issue).await?;

        let kind = if to == IssueStatus::Resolved {
            TimelineEntryKind::Resolution
        } else {
            TimelineEntryKind::StatusChange
        };
        let mut entry = TimelineEntry::new(
            kind,
            TimelineActorSnapshot::from_session(session),
            now_ms,
        );
        entry.note = note;
        entry.old_value = Some(from.as_str().to_string());
        entry.new_value = Some(to.as_str().to_string());
        self.repository.append_timeline(issue_id, &entry).await?;

        Ok(issue)
    }

    pub async fn comment(
        &self,
        session: &Session,
        issue_id: &str,
        body: String,
        now_ms: i64,
    ) -> DomainResult<TimelineEntry> {
        if body.trim().is_empty() || body.len() > MAX_NOTE_LENGTH {
            return Err(DomainError::Validation(format!(
                "comment must be 1..={MAX_NOTE_LENGTH} characters"
            )));
        }
        self.get(session, issue_id).await?;

        let mut entry = TimelineEntry::new(
            TimelineEntryKind::Comment,
            TimelineActorSnapshot::from_session(session),
            now_ms,
        );
        entry.note = Some(body);
        self.repository.append_timeline(issue_id, &entry).await
    }

    /// Re-evaluate every non-terminal issue and surface state changes worth
    /// acting on: anything newly overdue, and critical issues newly at risk.
    /// The observed classification is persisted so each escalation fires once.
    pub async fn sweep(&self, now_ms: i64) -> DomainResult<Vec<SlaEscalation>> {
        let issues = self.repository.list(None).await?;
        let mut escalations = Vec::new();

        for mut issue in issues {
            if issue.status.is_terminal() {
                continue;
            }
            let snapshot = issue.sla_snapshot(now_ms)?;
            if issue.sla_state == Some(snapshot.classification) {
                continue;
            }

            let newly_overdue = snapshot.classification == SlaClassification::Overdue;
            let newly_urgent = snapshot.is_urgent();
            issue.sla_state = Some(snapshot.classification);
            let issue = self.repository.update(&issue).await?;

            if newly_overdue {
                let mut entry = TimelineEntry::new(
                    TimelineEntryKind::StatusChange,
                    TimelineActorSnapshot::system(),
                    now_ms,
                );
                entry.note = Some("SLA deadline passed".to_string());
                self.repository
                    .append_timeline(&issue.issue_id, &entry)
                    .await?;
            }

            if newly_overdue || newly_urgent {
                escalations.push(SlaEscalation {
                    issue_id: issue.issue_id.clone(),
                    ulb_id: issue.ulb_id.clone(),
                    priority: issue.priority,
                    classification: snapshot.classification,
                    hours_remaining: snapshot.hours_remaining,
                });
            }
        }

        Ok(escalations)
    }
}

fn validate_issue_create(input: IssueCreate) -> DomainResult<IssueCreate> {
    let title = input.title.trim();
    if title.is_empty() || title.len() > MAX_TITLE_LENGTH {
        return Err(DomainError::Validation(format!(
            "title must be 1..={MAX_TITLE_LENGTH} characters"
        )));
    }
    if input.description.len() > MAX_DESCRIPTION_LENGTH {
        return Err(DomainError::Validation(format!(
            "description must be at most {MAX_DESCRIPTION_LENGTH} characters"
        )));
    }
    let address = input.address.trim();
    if address.is_empty() || address.len() > MAX_ADDRESS_LENGTH {
        return Err(DomainError::Validation(format!(
            "address must be 1..={MAX_ADDRESS_LENGTH} characters"
        )));
    }
    Ok(IssueCreate {
        title: title.to_string(),
        address: address.to_string(),
        ..input
    })
}

fn validate_note(note: &Option<String>) -> DomainResult<()> {
    if let Some(note) = note {
        if note.len() > MAX_NOTE_LENGTH {
            return Err(DomainError::Validation(format!(
                "note must be at most {MAX_NOTE_LENGTH} characters"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_issue_can_start_or_be_rejected() {
        assert!(legal_transition(IssueStatus::New, IssueStatus::InProgress));
        assert!(legal_transition(IssueStatus::New, IssueStatus::Rejected));
        assert!(!legal_transition(IssueStatus::New, IssueStatus::Resolved));
    }

    #[test]
    fn in_progress_issue_can_close_either_way() {
        assert!(legal_transition(IssueStatus::InProgress, IssueStatus::Resolved));
        assert!(legal_transition(IssueStatus::InProgress, IssueStatus::Rejected));
        assert!(!legal_transition(IssueStatus::InProgress, IssueStatus::New));
    }

    #[test]
    fn terminal_statuses_accept_nothing() {
        for to in [
            IssueStatus::New,
            IssueStatus::InProgress,
            IssueStatus::Resolved,
            IssueStatus::Rejected,
        ] {
            assert!(!legal_transition(IssueStatus::Resolved, to));
            assert!(!legal_transition(IssueStatus::Rejected, to));
        }
    }

    #[test]
    fn create_validation_trims_and_bounds() {
        let base = IssueCreate {
            ulb_id: None,
            title: "  Pothole on Main Street  ".to_string(),
            description: "Large pothole near the city center".to_string(),
            category: IssueCategory::Infrastructure,
            priority: Priority::High,
            address: " Main Street, Block A ".to_string(),
        };
        let cleaned = validate_issue_create(base.clone()).expect("valid");
        assert_eq!(cleaned.title, "Pothole on Main Street");
        assert_eq!(cleaned.address, "Main Street, Block A");

        let blank = IssueCreate {
            title: "   ".to_string(),
            ..base.clone()
        };
        assert!(validate_issue_create(blank).is_err());

        let oversized = IssueCreate {
            title: "x".repeat(MAX_TITLE_LENGTH + 1),
            ..base
        };
        assert!(validate_issue_create(oversized).is_err());
    }

    #[test]
    fn filter_matches_on_every_requested_axis() {
        let issue = Issue {
            issue_id: "i-1".to_string(),
            ulb_id: "ulb_adi".to_string(),
            title: "t".to_string(),
            description: "d".to_string(),
            category: IssueCategory::Sanitation,
            priority: Priority::Medium,
            status: IssueStatus::InProgress,
            address: "a".to_string(),
            reported_by: "u-1".to_string(),
            assigned_to: Some("staff-1".to_string()),
            reported_at_ms: 0,
            sla_deadline_ms: 1,
            updated_at_ms: 0,
            resolved_at_ms: None,
            sla_state: None,
        };

        assert!(IssueListFilter::default().matches(&issue));
        assert!(IssueListFilter {
            status: Some(IssueStatus::InProgress),
            assigned_to: Some("staff-1".to_string()),
            ..Default::default()
        }
        .matches(&issue));
        assert!(!IssueListFilter {
            priority: Some(Priority::Critical),
            ..Default::default()
        }
        .matches(&issue));
    }
}
