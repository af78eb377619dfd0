use crate::DomainResult;
use crate::ports::BoxFuture;
use crate::users::UserAccount;

pub trait UserRepository: Send + Sync {
    fn create(&self, user: &UserAccount) -> BoxFuture<'_, DomainResult<UserAccount>>;

    fn update(&self, user: &UserAccount) -> BoxFuture<'_, DomainResult<UserAccount>>;

    fn get(&self, user_id: &str) -> BoxFuture<'_, DomainResult<Option<UserAccount>>>;

    fn find_by_email(&self, email: &str) -> BoxFuture<'_, DomainResult<Option<UserAccount>>>;

    fn list(&self, ulb_id: Option<&str>) -> BoxFuture<'_, DomainResult<Vec<UserAccount>>>;
}
