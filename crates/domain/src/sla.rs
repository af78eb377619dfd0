//! SLA deadline tracking for one issue at one instant.
//!
//! Everything here is a pure computation over caller-supplied timestamps; the
//! caller provides `now`, nothing schedules anything. Windows are built
//! through a smart constructor so a record with `deadline <= reported_at`
//! cannot exist.

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;

const MS_PER_HOUR: f64 = 3_600_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            "critical" => Some(Priority::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }

    /// Hours remaining at or below which an unresolved issue is at risk.
    pub fn at_risk_threshold_hours(&self) -> f64 {
        match self {
            Priority::Critical => 2.0,
            Priority::High => 4.0,
            Priority::Medium => 12.0,
            Priority::Low => 24.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    New,
    InProgress,
    Resolved,
    Rejected,
}

impl IssueStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "new" => Some(IssueStatus::New),
            "in_progress" => Some(IssueStatus::InProgress),
            "resolved" => Some(IssueStatus::Resolved),
            "rejected" => Some(IssueStatus::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::New => "new",
            IssueStatus::InProgress => "in_progress",
            IssueStatus::Resolved => "resolved",
            IssueStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, IssueStatus::Resolved | IssueStatus::Rejected)
    }
}

/// Validated `[reported_at, deadline)` window. `deadline > reported_at` is an
/// invariant of the type, not a hope about the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaWindow {
    reported_at_ms: i64,
    deadline_ms: i64,
}

impl SlaWindow {
    pub fn new(reported_at_ms: i64, deadline_ms: i64) -> DomainResult<Self> {
        if deadline_ms <= reported_at_ms {
            return Err(DomainError::Validation(format!(
                "sla deadline ({deadline_ms}) must be after report time ({reported_at_ms})"
            )));
        }
        Ok(Self {
            reported_at_ms,
            deadline_ms,
        })
    }

    pub fn reported_at_ms(&self) -> i64 {
        self.reported_at_ms
    }

    pub fn deadline_ms(&self) -> i64 {
        self.deadline_ms
    }

    pub fn total_ms(&self) -> i64 {
        self.deadline_ms - self.reported_at_ms
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlaClassification {
    OnTrack,
    AtRisk,
    Overdue,
    Resolved,
}

impl SlaClassification {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlaClassification::OnTrack => "on_track",
            SlaClassification::AtRisk => "at_risk",
            SlaClassification::Overdue => "overdue",
            SlaClassification::Resolved => "resolved",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlaSnapshot {
    pub classification: SlaClassification,
    /// Elapsed fraction of the window, clamped to `[0, 1]`.
    pub progress_fraction: f64,
    /// Hours until the deadline; negative once overdue.
    pub hours_remaining: f64,
    pub priority: Priority,
}

impl SlaSnapshot {
    /// Urgent visual treatment: critical-priority issue inside its at-risk
    /// threshold.
    pub fn is_urgent(&self) -> bool {
        self.classification == SlaClassification::AtRisk && self.priority == Priority::Critical
    }

    /// Remaining-time text as the dashboard renders it, ceiling arithmetic.
    pub fn display_remaining(&self) -> String {
        match self.classification {
            SlaClassification::Resolved => "Resolved".to_string(),
            SlaClassification::Overdue => {
                format!("{}h overdue", (-self.hours_remaining).ceil() as i64)
            }
            _ if self.hours_remaining < 1.0 => {
                format!("{}m remaining", (self.hours_remaining * 60.0).ceil() as i64)
            }
            _ => format!("{}h remaining", self.hours_remaining.ceil() as i64),
        }
    }
}

/// Classify one issue's SLA standing at `now_ms`.
///
/// A resolved issue is always `Resolved`; past the deadline is always
/// `Overdue` regardless of priority; otherwise the priority threshold decides
/// between `AtRisk` and `OnTrack`.
pub fn evaluate(
    window: &SlaWindow,
    status: IssueStatus,
    priority: Priority,
    now_ms: i64,
) -> SlaSnapshot {
    let hours_remaining = (window.deadline_ms() - now_ms) as f64 / MS_PER_HOUR;

    if status == IssueStatus::Resolved {
        return SlaSnapshot {
            classification: SlaClassification::Resolved,
            progress_fraction: 1.0,
            hours_remaining,
            priority,
        };
    }

    let elapsed = (now_ms - window.reported_at_ms()) as f64;
    let progress_fraction = (elapsed / window.total_ms() as f64).clamp(0.0, 1.0);

    let classification = if now_ms > window.deadline_ms() {
        SlaClassification::Overdue
    } else if hours_remaining <= priority.at_risk_threshold_hours() {
        SlaClassification::AtRisk
    } else {
        SlaClassification::OnTrack
    };

    SlaSnapshot {
        classification,
        progress_fraction,
        hours_remaining,
        priority,
    }
}

/// Priority to initial deadline window, in hours. The mapping is deployment
/// configuration, not a product constant; defaults keep each window wider
/// than the matching at-risk threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlaPolicy {
    pub critical_hours: f64,
    pub high_hours: f64,
    pub medium_hours: f64,
    pub low_hours: f64,
}

impl Default for SlaPolicy {
    fn default() -> Self {
        Self {
            critical_hours: 4.0,
            high_hours: 8.0,
            medium_hours: 24.0,
            low_hours: 72.0,
        }
    }
}

impl SlaPolicy {
    pub fn window_hours(&self, priority: Priority) -> f64 {
        match priority {
            Priority::Critical => self.critical_hours,
            Priority::High => self.high_hours,
            Priority::Medium => self.medium_hours,
            Priority::Low => self.low_hours,
        }
    }

    pub fn window_for(&self, priority: Priority, reported_at_ms: i64) -> DomainResult<SlaWindow> {
        let span_ms = (self.window_hours(priority) * MS_PER_HOUR) as i64;
        SlaWindow::new(reported_at_ms, reported_at_ms + span_ms)
    }

    /// A window that does not clear the priority's at-risk threshold would
    /// classify freshly reported issues at risk before anyone could act, so
    /// such a configuration is rejected outright.
    pub fn validate(&self) -> DomainResult<()> {
        for (priority, hours) in [
            (Priority::Critical, self.critical_hours),
            (Priority::High, self.high_hours),
            (Priority::Medium, self.medium_hours),
            (Priority::Low, self.low_hours),
        ] {
            if hours <= 0.0 {
                return Err(DomainError::Validation(format!(
                    "sla window for {} must be positive",
                    priority.as_str()
                )));
            }
            let threshold = priority.at_risk_threshold_hours();
            if hours <= threshold {
                return Err(DomainError::Validation(format!(
                    "sla window for {} ({hours}h) must exceed its {threshold}h at-risk threshold",
                    priority.as_str()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR_MS: i64 = 3_600_000;

    fn window(reported: i64, deadline: i64) -> SlaWindow {
        SlaWindow::new(reported, deadline).expect("valid window")
    }

    #[test]
    fn rejects_deadline_at_or_before_report_time() {
        assert!(SlaWindow::new(1_000, 1_000).is_err());
        assert!(SlaWindow::new(1_000, 999).is_err());
        assert!(SlaWindow::new(1_000, 1_001).is_ok());
    }

    #[test]
    fn resolved_status_wins_regardless_of_timestamps() {
        let w = window(0, 2 * HOUR_MS);
        // Far past the deadline, still resolved.
        let snapshot = evaluate(&w, IssueStatus::Resolved, Priority::Low, 100 * HOUR_MS);
        assert_eq!(snapshot.classification, SlaClassification::Resolved);
        assert_eq!(snapshot.progress_fraction, 1.0);
    }

    #[test]
    fn overdue_takes_precedence_over_priority_threshold() {
        let w = window(0, 2 * HOUR_MS);
        let snapshot = evaluate(&w, IssueStatus::New, Priority::Low, 3 * HOUR_MS);
        assert_eq!(snapshot.classification, SlaClassification::Overdue);
        assert!(snapshot.hours_remaining < 0.0);
    }

    #[test]
    fn critical_issue_half_hour_from_deadline_is_at_risk() {
        // reported = T, deadline = T+2h, now = T+1h30m.
        let w = window(0, 2 * HOUR_MS);
        let snapshot = evaluate(&w, IssueStatus::New, Priority::Critical, HOUR_MS + HOUR_MS / 2);
        assert_eq!(snapshot.classification, SlaClassification::AtRisk);
        assert!((snapshot.hours_remaining - 0.5).abs() < 1e-9);
        assert!((snapshot.progress_fraction - 0.75).abs() < 1e-9);
        assert!(snapshot.is_urgent());
    }

    #[test]
    fn same_issue_an_hour_past_deadline_is_overdue() {
        let w = window(0, 2 * HOUR_MS);
        let snapshot = evaluate(&w, IssueStatus::New, Priority::Critical, 3 * HOUR_MS);
        assert_eq!(snapshot.classification, SlaClassification::Overdue);
        assert!(!snapshot.is_urgent());
    }

    #[test]
    fn low_priority_with_wide_margin_is_on_track() {
        let w = window(0, 72 * HOUR_MS);
        let snapshot = evaluate(&w, IssueStatus::InProgress, Priority::Low, HOUR_MS);
        assert_eq!(snapshot.classification, SlaClassification::OnTrack);
    }

    #[test]
    fn progress_is_monotone_and_clamped() {
        let w = window(0, 10 * HOUR_MS);
        let mut last = -1.0;
        // Sample from before the report time to well past the deadline.
        for now in (-2..=15).map(|h| h * HOUR_MS) {
            let snapshot = evaluate(&w, IssueStatus::New, Priority::Medium, now);
            assert!(snapshot.progress_fraction >= last);
            assert!((0.0..=1.0).contains(&snapshot.progress_fraction));
            last = snapshot.progress_fraction;
        }
    }

    #[test]
    fn at_deadline_boundary_is_at_risk_not_overdue() {
        // now == deadline: zero hours remaining, within every threshold, but
        // the strict `now > deadline` comparison has not tripped yet.
        let w = window(0, 2 * HOUR_MS);
        let snapshot = evaluate(&w, IssueStatus::New, Priority::Low, 2 * HOUR_MS);
        assert_eq!(snapshot.classification, SlaClassification::AtRisk);
        assert_eq!(snapshot.hours_remaining, 0.0);
    }

    #[test]
    fn display_remaining_matches_dashboard_text() {
        let w = window(0, 2 * HOUR_MS);

        let overdue = evaluate(&w, IssueStatus::New, Priority::High, 4 * HOUR_MS);
        assert_eq!(overdue.display_remaining(), "2h overdue");

        let minutes = evaluate(&w, IssueStatus::New, Priority::High, HOUR_MS + HOUR_MS / 2);
        assert_eq!(minutes.display_remaining(), "30m remaining");

        let hours = evaluate(&w, IssueStatus::New, Priority::High, HOUR_MS / 2);
        assert_eq!(hours.display_remaining(), "2h remaining");

        let resolved = evaluate(&w, IssueStatus::Resolved, Priority::High, HOUR_MS);
        assert_eq!(resolved.display_remaining(), "Resolved");
    }

    #[test]
    fn policy_windows_sit_above_at_risk_thresholds() {
        let policy = SlaPolicy::default();
        for priority in [
            Priority::Critical,
            Priority::High,
            Priority::Medium,
            Priority::Low,
        ] {
            assert!(policy.window_hours(priority) > priority.at_risk_threshold_hours());
        }
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn policy_rejects_non_positive_windows() {
        let policy = SlaPolicy {
            critical_hours: 0.0,
            ..SlaPolicy::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn policy_rejects_window_inside_at_risk_threshold() {
        // A 1h critical window sits under the 2h threshold: without
        // validation a fresh critical issue would start out at risk and
        // urgent, never having been on track.
        let narrow = SlaPolicy {
            critical_hours: 1.0,
            ..SlaPolicy::default()
        };
        let w = narrow.window_for(Priority::Critical, 0).expect("window");
        let fresh = evaluate(&w, IssueStatus::New, Priority::Critical, 0);
        assert_eq!(fresh.classification, SlaClassification::AtRisk);
        assert!(fresh.is_urgent());
        assert!(narrow.validate().is_err());

        // Equal to the threshold is still too tight.
        let boundary = SlaPolicy {
            critical_hours: 2.0,
            ..SlaPolicy::default()
        };
        assert!(boundary.validate().is_err());
    }

    #[test]
    fn policy_builds_valid_windows() {
        let policy = SlaPolicy::default();
        let w = policy.window_for(Priority::Critical, 1_000).expect("window");
        assert_eq!(w.reported_at_ms(), 1_000);
        assert_eq!(w.total_ms(), 4 * HOUR_MS);
    }
}
