use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::identity::Session;
use crate::ports::events::EventRepository;
use crate::ulbs::UlbScope;
use crate::util::uuid_v7_without_dashes;

const MAX_TITLE_LENGTH: usize = 200;
const MAX_DESCRIPTION_LENGTH: usize = 2_000;
const MAX_ATTENDEES_CAP: u32 = 100_000;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Upcoming,
    Ongoing,
    Completed,
    Cancelled,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CommunityEvent {
    pub event_id: String,
    pub ulb_id: String,
    pub title: String,
    pub description: String,
    pub starts_at_ms: i64,
    pub location: String,
    pub attendees: u32,
    pub max_attendees: u32,
    pub status: EventStatus,
    pub organizer: String,
}

impl CommunityEvent {
    pub fn is_full(&self) -> bool {
        self.attendees >= self.max_attendees
    }
}

#[derive(Clone, Debug)]
pub struct EventCreate {
    pub ulb_id: Option<String>,
    pub title: String,
    pub description: String,
    pub starts_at_ms: i64,
    pub location: String,
    pub max_attendees: u32,
}

#[derive(Clone)]
pub struct EventService {
    repository: Arc<dyn EventRepository>,
}

impl EventService {
    pub fn new(repository: Arc<dyn EventRepository>) -> Self {
        Self { repository }
    }

    pub async fn create(&self, session: &Session, input: EventCreate) -> DomainResult<CommunityEvent> {
        let input = validate_event_create(input)?;
        let scope = UlbScope::for_session(session)?;
        let ulb_id = scope.resolve_target(input.ulb_id.as_deref())?;

        let event = CommunityEvent {
            event_id: uuid_v7_without_dashes(),
            ulb_id,
            title: input.title,
            description: input.description,
            starts_at_ms: input.starts_at_ms,
            location: input.location,
            attendees: 0,
            max_attendees: input.max_attendees,
            status: EventStatus::Upcoming,
            organizer: session.username.clone(),
        };
        self.repository.create(&event).await
    }

    pub async fn list(&self, session: &Session) -> DomainResult<Vec<CommunityEvent>> {
        let scope = UlbScope::for_session(session)?;
        self.repository.list(scope.filter()).await
    }

    /// Register one attendee. Only upcoming events accept registrations, and
    /// a full event rejects with `Conflict`.
    pub async fn register(&self, session: &Session, event_id: &str) -> DomainResult<CommunityEvent> {
        let scope = UlbScope::for_session(session)?;
        let mut event = self
            .repository
            .get(event_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        if !scope.permits(&event.ulb_id) {
            return Err(DomainError::Forbidden);
        }
        if event.status != EventStatus::Upcoming {
            return Err(DomainError::Validation(
                "registration is only open for upcoming events".to_string(),
            ));
        }
        if event.is_full() {
            return Err(DomainError::Conflict);
        }
        event.attendees += 1;
        self.repository.update(&event).await
    }
}

fn validate_event_create(input: EventCreate) -> DomainResult<EventCreate> {
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
    if input.max_attendees == 0 || input.max_attendees > MAX_ATTENDEES_CAP {
        return Err(DomainError::Validation(format!(
            "max_attendees must be 1..={MAX_ATTENDEES_CAP}"
        )));
    }
    if input.location.trim().is_empty() {
        return Err(DomainError::Validation("location is required".to_string()));
    }
    Ok(EventCreate {
        title: title.to_string(),
        ..input
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_input() -> EventCreate {
        EventCreate {
            ulb_id: None,
            title: "Community Clean-up Drive".to_string(),
            description: "Ward 12 riverbank clean-up".to_string(),
            starts_at_ms: 1_700_000_000_000,
            location: "Riverbank Park".to_string(),
            max_attendees: 100,
        }
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let input = EventCreate {
            max_attendees: 0,
            ..create_input()
        };
        assert!(validate_event_create(input).is_err());
    }

    #[test]
    fn full_event_reports_full() {
        let event = CommunityEvent {
            event_id: "e-1".to_string(),
            ulb_id: "ulb_adi".to_string(),
            title: "t".to_string(),
            description: "d".to_string(),
            starts_at_ms: 0,
            location: "l".to_string(),
            attendees: 30,
            max_attendees: 30,
            status: EventStatus::Upcoming,
            organizer: "o".to_string(),
        };
        assert!(event.is_full());
    }
}
