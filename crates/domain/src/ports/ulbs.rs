use crate::DomainResult;
use crate::ports::BoxFuture;
use crate::ulbs::Ulb;

pub trait UlbRepository: Send + Sync {
    fn upsert(&self, ulb: &Ulb) -> BoxFuture<'_, DomainResult<Ulb>>;

    fn get(&self, ulb_id: &str) -> BoxFuture<'_, DomainResult<Option<Ulb>>>;

    /// Every registered ULB, ordered by name.
    fn list(&self) -> BoxFuture<'_, DomainResult<Vec<Ulb>>>;
}
