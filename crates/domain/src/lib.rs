pub mod access;
pub mod analytics;
pub mod auth;
pub mod error;
pub mod events;
pub mod identity;
pub mod issues;
pub mod ports;
pub mod sla;
pub mod ulbs;
pub mod users;
pub mod util;

pub type DomainResult<T> = Result<T, error::DomainError>;
