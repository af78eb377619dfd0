use std::time::{SystemTime, UNIX_EPOCH};

use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

pub fn uuid_v7_without_dashes() -> String {
    Uuid::now_v7().simple().to_string()
}

pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

pub fn format_ms_rfc3339(epoch_ms: i64) -> String {
    let fallback = OffsetDateTime::from_unix_timestamp(0).unwrap_or(OffsetDateTime::UNIX_EPOCH);
    let value =
        OffsetDateTime::from_unix_timestamp_nanos(epoch_ms as i128 * 1_000_000).unwrap_or(fallback);
    value
        .format(&Rfc3339)
        .unwrap_or("1970-01-01T00:00:00Z".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_ms_rfc3339_renders_epoch() {
        assert_eq!(format_ms_rfc3339(0), "1970-01-01T00:00:00Z");
    }

    #[test]
    fn uuid_v7_ids_are_dashless_and_sortable() {
        let a = uuid_v7_without_dashes();
        let b = uuid_v7_without_dashes();
        assert_eq!(a.len(), 32);
        assert!(!a.contains('-'));
        assert!(a <= b);
    }
}
