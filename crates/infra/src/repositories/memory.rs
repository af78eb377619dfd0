//! In-memory repository implementations backing the `memory` data backend.
//! State lives for the lifetime of the process; the port traits keep the seam
//! for a persistent backend.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use jansetu_domain::DomainResult;
use jansetu_domain::error::DomainError;
use jansetu_domain::events::CommunityEvent;
use jansetu_domain::issues::{Issue, TimelineEntry};
use jansetu_domain::ports::BoxFuture;
use jansetu_domain::ports::events::EventRepository;
use jansetu_domain::ports::issues::IssueRepository;
use jansetu_domain::ports::ulbs::UlbRepository;
use jansetu_domain::ports::users::UserRepository;
use jansetu_domain::ulbs::Ulb;
use jansetu_domain::users::UserAccount;

#[derive(Default)]
pub struct InMemoryIssueRepository {
    issues: Arc<RwLock<HashMap<String, Issue>>>,
    timelines: Arc<RwLock<HashMap<String, Vec<TimelineEntry>>>>,
}

impl InMemoryIssueRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IssueRepository for InMemoryIssueRepository {
    fn create(&self, issue: &Issue) -> BoxFuture<'_, DomainResult<Issue>> {
        let issue = issue.clone();
        let issues = self.issues.clone();
        Box::pin(async move {
            let mut issues = issues.write().await;
            if issues.contains_key(&issue.issue_id) {
                return Err(DomainError::Conflict);
            }
            issues.insert(issue.issue_id.clone(), issue.clone());
            Ok(issue)
        })
    }

    fn get(&self, issue_id: &str) -> BoxFuture<'_, DomainResult<Option<Issue>>> {
        let issue_id = issue_id.to_string();
        let issues = self.issues.clone();
        Box::pin(async move { Ok(issues.read().await.get(&issue_id).cloned()) })
    }

    fn update(&self, issue: &Issue) -> BoxFuture<'_, DomainResult<Issue>> {
        let issue = issue.clone();
        let issues = self.issues.clone();
        Box::pin(async move {
            let mut issues = issues.write().await;
            if !issues.contains_key(&issue.issue_id) {
                return Err(DomainError::NotFound);
            }
            issues.insert(issue.issue_id.clone(), issue.clone());
            Ok(issue)
        })
    }

    fn list(&self, ulb_id: Option<&str>) -> BoxFuture<'_, DomainResult<Vec<Issue>>> {
        let ulb_id = ulb_id.map(str::to_string);
        let issues = self.issues.clone();
        Box::pin(async move {
            let issues = issues.read().await;
            let mut matched: Vec<Issue> = issues
                .values()
                .filter(|issue| {
                    ulb_id
                        .as_deref()
                        .is_none_or(|ulb_id| issue.ulb_id == ulb_id)
                })
                .cloned()
                .collect();
            matched.sort_by(|a, b| b.reported_at_ms.cmp(&a.reported_at_ms));
            Ok(matched)
        })
    }

    fn append_timeline(
        &self,
        issue_id: &str,
        entry: &TimelineEntry,
    ) -> BoxFuture<'_, DomainResult<TimelineEntry>> {
        let issue_id = issue_id.to_string();
        let entry = entry.clone();
        let issues = self.issues.clone();
        let timelines = self.timelines.clone();
        Box::pin(async move {
            if !issues.read().await.contains_key(&issue_id) {
                return Err(DomainError::NotFound);
            }
            let mut timelines = timelines.write().await;
            timelines.entry(issue_id).or_default().push(entry.clone());
            Ok(entry)
        })
    }

    fn timeline(&self, issue_id: &str) -> BoxFuture<'_, DomainResult<Vec<TimelineEntry>>> {
        let issue_id = issue_id.to_string();
        let timelines = self.timelines.clone();
        Box::pin(async move {
            Ok(timelines
                .read()
                .await
                .get(&issue_id)
                .cloned()
                .unwrap_or_default())
        })
    }
}

#[derive(Default)]
pub struct InMemoryUlbRepository {
    store: Arc<RwLock<HashMap<String, Ulb>>>,
}

impl InMemoryUlbRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UlbRepository for InMemoryUlbRepository {
    fn upsert(&self, ulb: &Ulb) -> BoxFuture<'_, DomainResult<Ulb>> {
        let ulb = ulb.clone();
        let store = self.store.clone();
        Box::pin(async move {
            store.write().await.insert(ulb.ulb_id.clone(), ulb.clone());
            Ok(ulb)
        })
    }

    fn get(&self, ulb_id: &str) -> BoxFuture<'_, DomainResult<Option<Ulb>>> {
        let ulb_id = ulb_id.to_string();
        let store = self.store.clone();
        Box::pin(async move { Ok(store.read().await.get(&ulb_id).cloned()) })
    }

    fn list(&self) -> BoxFuture<'_, DomainResult<Vec<Ulb>>> {
        let store = self.store.clone();
        Box::pin(async move {
            let mut ulbs: Vec<Ulb> = store.read().await.values().cloned().collect();
            ulbs.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(ulbs)
        })
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<String, UserAccount>>>,
    by_email: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for InMemoryUserRepository {
    fn create(&self, user: &UserAccount) -> BoxFuture<'_, DomainResult<UserAccount>> {
        let user = user.clone();
        let users = self.users.clone();
        let by_email = self.by_email.clone();
        Box::pin(async move {
            let mut users = users.write().await;
            let mut by_email = by_email.write().await;
            if users.contains_key(&user.user_id) || by_email.contains_key(&user.email) {
                return Err(DomainError::Conflict);
            }
            by_email.insert(user.email.clone(), user.user_id.clone());
            users.insert(user.user_id.clone(), user.clone());
            Ok(user)
        })
    }

    fn update(&self, user: &UserAccount) -> BoxFuture<'_, DomainResult<UserAccount>> {
        let user = user.clone();
        let users = self.users.clone();
        Box::pin(async move {
            let mut users = users.write().await;
            if !users.contains_key(&user.user_id) {
                return Err(DomainError::NotFound);
            }
            users.insert(user.user_id.clone(), user.clone());
            Ok(user)
        })
    }

    fn get(&self, user_id: &str) -> BoxFuture<'_, DomainResult<Option<UserAccount>>> {
        let user_id = user_id.to_string();
        let users = self.users.clone();
        Box::pin(async move { Ok(users.read().await.get(&user_id).cloned()) })
    }

    fn find_by_email(&self, email: &str) -> BoxFuture<'_, DomainResult<Option<UserAccount>>> {
        let email = email.to_ascii_lowercase();
        let users = self.users.clone();
        let by_email = self.by_email.clone();
        Box::pin(async move {
            let by_email = by_email.read().await;
            let Some(user_id) = by_email.get(&email) else {
                return Ok(None);
            };
            Ok(users.read().await.get(user_id).cloned())
        })
    }

    fn list(&self, ulb_id: Option<&str>) -> BoxFuture<'_, DomainResult<Vec<UserAccount>>> {
        let ulb_id = ulb_id.map(str::to_string);
        let users = self.users.clone();
        Box::pin(async move {
            let users = users.read().await;
            let mut matched: Vec<UserAccount> = users
                .values()
                .filter(|user| {
                    ulb_id
                        .as_deref()
                        .is_none_or(|ulb_id| user.ulb_id.as_deref() == Some(ulb_id))
                })
                .cloned()
                .collect();
            matched.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(matched)
        })
    }
}

#[derive(Default)]
pub struct InMemoryEventRepository {
    store: Arc<RwLock<HashMap<String, CommunityEvent>>>,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventRepository for InMemoryEventRepository {
    fn create(&self, event: &CommunityEvent) -> BoxFuture<'_, DomainResult<CommunityEvent>> {
        let event = event.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let mut store = store.write().await;
            if store.contains_key(&event.event_id) {
                return Err(DomainError::Conflict);
            }
            store.insert(event.event_id.clone(), event.clone());
            Ok(event)
        })
    }

    fn update(&self, event: &CommunityEvent) -> BoxFuture<'_, DomainResult<CommunityEvent>> {
        let event = event.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let mut store = store.write().await;
            if !store.contains_key(&event.event_id) {
                return Err(DomainError::NotFound);
            }
            store.insert(event.event_id.clone(), event.clone());
            Ok(event)
        })
    }

    fn get(&self, event_id: &str) -> BoxFuture<'_, DomainResult<Option<CommunityEvent>>> {
        let event_id = event_id.to_string();
        let store = self.store.clone();
        Box::pin(async move { Ok(store.read().await.get(&event_id).cloned()) })
    }

    fn list(&self, ulb_id: Option<&str>) -> BoxFuture<'_, DomainResult<Vec<CommunityEvent>>> {
        let ulb_id = ulb_id.map(str::to_string);
        let store = self.store.clone();
        Box::pin(async move {
            let store = store.read().await;
            let mut matched: Vec<CommunityEvent> = store
                .values()
                .filter(|event| {
                    ulb_id
                        .as_deref()
                        .is_none_or(|ulb_id| event.ulb_id == ulb_id)
                })
                .cloned()
                .collect();
            matched.sort_by(|a, b| a.starts_at_ms.cmp(&b.starts_at_ms));
            Ok(matched)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jansetu_domain::auth::Role;
    use jansetu_domain::issues::{IssueCategory, TimelineActorSnapshot, TimelineEntryKind};
    use jansetu_domain::sla::{IssueStatus, Priority};

    fn sample_issue(id: &str, ulb_id: &str) -> Issue {
        Issue {
            issue_id: id.to_string(),
            ulb_id: ulb_id.to_string(),
            title: "t".to_string(),
            description: "d".to_string(),
            category: IssueCategory::Utilities,
            priority: Priority::Medium,
            status: IssueStatus::New,
            address: "a".to_string(),
            reported_by: "u-1".to_string(),
            assigned_to: None,
            reported_at_ms: 0,
            sla_deadline_ms: 1,
            updated_at_ms: 0,
            resolved_at_ms: None,
            sla_state: None,
        }
    }

    #[tokio::test]
    async fn issue_create_is_unique_and_listable_by_ulb() {
        let repo = InMemoryIssueRepository::new();
        repo.create(&sample_issue("i-1", "ulb_adi")).await.unwrap();
        repo.create(&sample_issue("i-2", "ulb_bar")).await.unwrap();
        assert!(matches!(
            repo.create(&sample_issue("i-1", "ulb_adi")).await,
            Err(DomainError::Conflict)
        ));

        assert_eq!(repo.list(None).await.unwrap().len(), 2);
        let scoped = repo.list(Some("ulb_adi")).await.unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].issue_id, "i-1");
    }

    #[tokio::test]
    async fn timeline_requires_an_existing_issue() {
        let repo = InMemoryIssueRepository::new();
        let entry = TimelineEntry {
            entry_id: "e-1".to_string(),
            kind: TimelineEntryKind::Comment,
            actor: TimelineActorSnapshot::system(),
            note: Some("n".to_string()),
            old_value: None,
            new_value: None,
            occurred_at_ms: 0,
        };
        assert!(matches!(
            repo.append_timeline("missing", &entry).await,
            Err(DomainError::NotFound)
        ));

        repo.create(&sample_issue("i-1", "ulb_adi")).await.unwrap();
        repo.append_timeline("i-1", &entry).await.unwrap();
        assert_eq!(repo.timeline("i-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn user_email_lookup_is_case_insensitive_on_query() {
        let repo = InMemoryUserRepository::new();
        let user = UserAccount {
            user_id: "u-1".to_string(),
            email: "admin@jharkhandmc.gov.in".to_string(),
            name: "Municipal Administrator".to_string(),
            role: Role::Admin,
            department: None,
            ulb_id: Some("ulb_adi".to_string()),
            extra_permissions: vec![],
            password_digest: "digest".to_string(),
            is_active: true,
            last_login_ms: None,
        };
        repo.create(&user).await.unwrap();
        let found = repo
            .find_by_email("Admin@JharkhandMC.gov.in")
            .await
            .unwrap();
        assert!(found.is_some());
    }
}
