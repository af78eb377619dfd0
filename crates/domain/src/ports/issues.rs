use crate::DomainResult;
use crate::issues::{Issue, TimelineEntry};
use crate::ports::BoxFuture;

pub trait IssueRepository: Send + Sync {
    fn create(&self, issue: &Issue) -> BoxFuture<'_, DomainResult<Issue>>;

    fn get(&self, issue_id: &str) -> BoxFuture<'_, DomainResult<Option<Issue>>>;

    /// Full-record replace; errors with `NotFound` when the issue is missing.
    fn update(&self, issue: &Issue) -> BoxFuture<'_, DomainResult<Issue>>;

    /// All issues, optionally restricted to one ULB, newest first.
    fn list(&self, ulb_id: Option<&str>) -> BoxFuture<'_, DomainResult<Vec<Issue>>>;

    fn append_timeline(
        &self,
        issue_id: &str,
        entry: &TimelineEntry,
    ) -> BoxFuture<'_, DomainResult<TimelineEntry>>;

    fn timeline(&self, issue_id: &str) -> BoxFuture<'_, DomainResult<Vec<TimelineEntry>>>;
}
