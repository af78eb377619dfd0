use std::sync::Arc;

use jansetu_domain::analytics::AnalyticsService;
use jansetu_domain::events::EventService;
use jansetu_domain::issues::IssueService;
use jansetu_domain::ports::events::EventRepository;
use jansetu_domain::ports::issues::IssueRepository;
use jansetu_domain::ports::ulbs::UlbRepository;
use jansetu_domain::ports::users::UserRepository;
use jansetu_domain::ulbs::UlbService;
use jansetu_domain::users::UserService;
use jansetu_infra::auth::TokenService;
use jansetu_infra::config::AppConfig;
use jansetu_infra::repositories::{
    InMemoryEventRepository, InMemoryIssueRepository, InMemoryUlbRepository,
    InMemoryUserRepository,
};
use jansetu_infra::seed;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub tokens: TokenService,
    pub issues: IssueService,
    pub users: UserService,
    pub ulbs: UlbService,
    pub events: EventService,
    pub analytics: AnalyticsService,
}

pub struct Repositories {
    pub issues: Arc<dyn IssueRepository>,
    pub users: Arc<dyn UserRepository>,
    pub ulbs: Arc<dyn UlbRepository>,
    pub events: Arc<dyn EventRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            issues: Arc::new(InMemoryIssueRepository::new()),
            users: Arc::new(InMemoryUserRepository::new()),
            ulbs: Arc::new(InMemoryUlbRepository::new()),
            events: Arc::new(InMemoryEventRepository::new()),
        }
    }
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        // Surface a misconfigured SLA policy at startup, not per request.
        config.sla_policy().validate()?;
        // "memory" is the only backend today; the match keeps the seam
        // explicit for a persistent one.
        let repositories = match config.data_backend.as_str() {
            "memory" => Repositories::in_memory(),
            other => anyhow::bail!("unknown data backend: {other}"),
        };
        if config.seed_demo_data {
            seed::seed(&repositories.ulbs, &repositories.users).await?;
        }
        Ok(Self::with_repositories(config, repositories))
    }

    pub fn with_repositories(config: AppConfig, repositories: Repositories) -> Self {
        let policy = config.sla_policy();
        let tokens = TokenService::new(&config.jwt_secret, config.token_ttl_secs);
        Self {
            config,
            tokens,
            issues: IssueService::new(repositories.issues.clone(), policy),
            users: UserService::new(repositories.users),
            ulbs: UlbService::new(repositories.ulbs),
            events: EventService::new(repositories.events),
            analytics: AnalyticsService::new(repositories.issues),
        }
    }
}
