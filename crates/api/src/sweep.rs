use std::time::Duration;

use jansetu_domain::util::now_ms;

use crate::observability;
use crate::state::AppState;

/// Background loop that re-classifies open issues against their SLA
/// deadlines. Escalations are logged and counted; the timeline entry for a
/// newly overdue issue is written by the domain service.
pub async fn run(state: AppState) {
    let mut ticker = tokio::time::interval(Duration::from_millis(
        state.config.sla_sweep_interval_ms.max(1_000),
    ));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        match state.issues.sweep(now_ms()).await {
            Ok(escalations) => {
                for escalation in &escalations {
                    observability::register_sla_escalation(
                        &escalation.ulb_id,
                        escalation.priority.as_str(),
                        escalation.classification.as_str(),
                    );
                    tracing::warn!(
                        issue_id = %escalation.issue_id,
                        ulb_id = %escalation.ulb_id,
                        priority = %escalation.priority.as_str(),
                        classification = %escalation.classification.as_str(),
                        hours_remaining = escalation.hours_remaining,
                        "sla escalation"
                    );
                }
                if !escalations.is_empty() {
                    tracing::info!(count = escalations.len(), "sla sweep finished");
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "sla sweep failed");
            }
        }
    }
}
