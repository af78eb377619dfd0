use jansetu_domain::sla::SlaPolicy;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_env: String,
    pub port: u16,
    pub log_level: String,
    pub data_backend: String,
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
    pub auth_dev_bypass_enabled: bool,
    pub seed_demo_data: bool,
    pub sla_window_critical_hours: f64,
    pub sla_window_high_hours: f64,
    pub sla_window_medium_hours: f64,
    pub sla_window_low_hours: f64,
    pub sla_sweep_interval_ms: u64,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let cfg = config::Config::builder()
            .set_default("app_env", "development")?
            .set_default("port", 3000)?
            .set_default("log_level", "info")?
            .set_default("data_backend", "memory")?
            .set_default("jwt_secret", "dev-secret")?
            .set_default("token_ttl_secs", 3600)?
            .set_default("auth_dev_bypass_enabled", false)?
            .set_default("seed_demo_data", true)?
            .set_default("sla_window_critical_hours", 4.0)?
            .set_default("sla_window_high_hours", 8.0)?
            .set_default("sla_window_medium_hours", 24.0)?
            .set_default("sla_window_low_hours", 72.0)?
            .set_default("sla_sweep_interval_ms", 60_000)?
            .add_source(config::Environment::default().separator("__"))
            .build()?;
        cfg.try_deserialize()
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    pub fn sla_policy(&self) -> SlaPolicy {
        SlaPolicy {
            critical_hours: self.sla_window_critical_hours,
            high_hours: self.sla_window_high_hours,
            medium_hours: self.sla_window_medium_hours,
            low_hours: self.sla_window_low_hours,
        }
    }
}
