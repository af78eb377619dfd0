use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::identity::Session;
use crate::issues::Issue;
use crate::ports::issues::IssueRepository;
use crate::sla::{IssueStatus, Priority, SlaClassification};
use crate::ulbs::UlbScope;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Dashboard KPI roll-up for one ULB (or all of them) at one instant.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct KpiSnapshot {
    pub total_issues: usize,
    pub resolved_issues: usize,
    pub pending_issues: usize,
    pub critical_open_issues: usize,
    pub overdue_issues: usize,
    pub at_risk_issues: usize,
    /// Mean report-to-resolution time; `None` until something has resolved.
    pub avg_resolution_hours: Option<f64>,
    /// Share of resolved issues that closed inside their SLA window.
    pub sla_compliance_rate: Option<f64>,
}

/// Pure aggregation over a set of issues. Malformed windows are impossible by
/// construction, so the per-issue evaluation cannot fail here.
pub fn compute_kpis(issues: &[Issue], now_ms: i64) -> DomainResult<KpiSnapshot> {
    let mut snapshot = KpiSnapshot {
        total_issues: issues.len(),
        resolved_issues: 0,
        pending_issues: 0,
        critical_open_issues: 0,
        overdue_issues: 0,
        at_risk_issues: 0,
        avg_resolution_hours: None,
        sla_compliance_rate: None,
    };

    let mut resolution_hours_sum = 0.0;
    let mut resolved_in_sla = 0usize;

    for issue in issues {
        match issue.status {
            IssueStatus::Resolved => {
                snapshot.resolved_issues += 1;
                if let Some(resolved_at) = issue.resolved_at_ms {
                    resolution_hours_sum +=
                        (resolved_at - issue.reported_at_ms) as f64 / MS_PER_HOUR;
                    if resolved_at <= issue.sla_deadline_ms {
                        resolved_in_sla += 1;
                    }
                }
            }
            IssueStatus::Rejected => {}
            IssueStatus::New | IssueStatus::InProgress => {
                snapshot.pending_issues += 1;
                if issue.priority == Priority::Critical {
                    snapshot.critical_open_issues += 1;
                }
                match issue.sla_snapshot(now_ms)?.classification {
                    SlaClassification::Overdue => snapshot.overdue_issues += 1,
                    SlaClassification::AtRisk => snapshot.at_risk_issues += 1,
                    _ => {}
                }
            }
        }
    }

    if snapshot.resolved_issues > 0 {
        snapshot.avg_resolution_hours =
            Some(resolution_hours_sum / snapshot.resolved_issues as f64);
        snapshot.sla_compliance_rate =
            Some(resolved_in_sla as f64 / snapshot.resolved_issues as f64);
    }

    Ok(snapshot)
}

#[derive(Clone)]
pub struct AnalyticsService {
    repository: Arc<dyn IssueRepository>,
}

impl AnalyticsService {
    pub fn new(repository: Arc<dyn IssueRepository>) -> Self {
        Self { repository }
    }

    pub async fn summary(&self, session: &Session, now_ms: i64) -> DomainResult<KpiSnapshot> {
        let scope = UlbScope::for_session(session)?;
        let issues = self.repository.list(scope.filter()).await?;
        compute_kpis(&issues, now_ms)
    }
}
