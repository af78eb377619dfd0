use crate::DomainResult;
use crate::events::CommunityEvent;
use crate::ports::BoxFuture;

pub trait EventRepository: Send + Sync {
    fn create(&self, event: &CommunityEvent) -> BoxFuture<'_, DomainResult<CommunityEvent>>;

    fn update(&self, event: &CommunityEvent) -> BoxFuture<'_, DomainResult<CommunityEvent>>;

    fn get(&self, event_id: &str) -> BoxFuture<'_, DomainResult<Option<CommunityEvent>>>;

    fn list(&self, ulb_id: Option<&str>) -> BoxFuture<'_, DomainResult<Vec<CommunityEvent>>>;
}
