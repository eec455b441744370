//! Aggregates agent reports and surfaces a human-readable summary of one
//! swarm run (§4.4).

use std::fmt::Write as _;

use tokio::sync::RwLock;

use crate::domain::models::{AgentReport, AgentRuntime, AgentStatus, ReportType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceConflict {
    pub agent_a: String,
    pub agent_b: String,
    pub resource: String,
}

#[derive(Default)]
struct State {
    log: Vec<AgentReport>,
    conflicts: Vec<ResourceConflict>,
}

/// Collects reports emitted over the course of one `SwarmScheduler::execute`
/// call and produces the final aggregated output string.
#[derive(Default)]
pub struct Coordinator {
    state: RwLock<State>,
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn receive(&self, report: AgentReport) {
        let mut state = self.state.write().await;
        if report.report_type == ReportType::Conflict {
            if let (Some(agent_b), Some(resource)) = (
                report.data.get("other_agent_id").and_then(|v| v.as_str()),
                report.data.get("resource").and_then(|v| v.as_str()),
            ) {
                state.conflicts.push(ResourceConflict {
                    agent_a: report.agent_id.clone(),
                    agent_b: agent_b.to_string(),
                    resource: resource.to_string(),
                });
            }
        }
        state.log.push(report);
    }

    /// Concatenates completed runtimes in ascending `end_time` order, then
    /// appends a failed-agents summary.
    pub async fn aggregate(&self, runtimes: &[AgentRuntime]) -> String {
        let mut completed: Vec<&AgentRuntime> = runtimes.iter().filter(|r| r.status == AgentStatus::Completed).collect();
        completed.sort_by(|a, b| a.end_time.cmp(&b.end_time).then_with(|| a.agent_id.cmp(&b.agent_id)));

        let mut out = String::new();
        for runtime in &completed {
            let _ = write!(
                out,
                "## {}\n\n{}\n\n",
                runtime.agent_name,
                runtime.output.as_deref().unwrap_or_default()
            );
        }

        let failed: Vec<&AgentRuntime> = runtimes.iter().filter(|r| r.status == AgentStatus::Failed).collect();
        if !failed.is_empty() {
            out.push_str("## Failed Agents\n\n");
            for runtime in failed {
                let _ = writeln!(
                    out,
                    "- {}: {}",
                    runtime.agent_name,
                    runtime.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
        out
    }

    pub async fn conflicts(&self) -> Vec<ResourceConflict> {
        self.state.read().await.conflicts.clone()
    }

    /// Clears accumulated state. Invoked at the start of every `execute`.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        state.log.clear();
        state.conflicts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn runtime(id: &str, name: &str, status: AgentStatus, end_offset_secs: i64) -> AgentRuntime {
        let mut rt = AgentRuntime::new(id, name, vec![]);
        rt.status = status;
        rt.end_time = Some(Utc::now() + Duration::seconds(end_offset_secs));
        rt
    }

    #[tokio::test]
    async fn aggregate_orders_by_ascending_end_time() {
        let coordinator = Coordinator::new();
        let mut early = runtime("id-1", "first", AgentStatus::Completed, 1);
        early.output = Some("early output".to_string());
        let mut late = runtime("id-2", "second", AgentStatus::Completed, 100);
        late.output = Some("late output".to_string());

        let out = coordinator.aggregate(&[late, early]).await;
        let first_idx = out.find("## first").unwrap();
        let second_idx = out.find("## second").unwrap();
        assert!(first_idx < second_idx);
    }

    #[tokio::test]
    async fn aggregate_appends_failed_block() {
        let coordinator = Coordinator::new();
        let mut failed = runtime("id-3", "broken", AgentStatus::Failed, 5);
        failed.error = Some("boom".to_string());
        let out = coordinator.aggregate(&[failed]).await;
        assert!(out.contains("## Failed Agents"));
        assert!(out.contains("broken: boom"));
    }

    #[tokio::test]
    async fn conflict_reports_are_recorded() {
        let coordinator = Coordinator::new();
        let report = AgentReport::new("agent-a", "a", ReportType::Conflict)
            .with_data(json!({"other_agent_id": "agent-b", "resource": "file.rs"}));
        coordinator.receive(report).await;
        let conflicts = coordinator.conflicts().await;
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].resource, "file.rs");
    }

    #[tokio::test]
    async fn reset_clears_conflicts_and_log() {
        let coordinator = Coordinator::new();
        let report = AgentReport::new("agent-a", "a", ReportType::Conflict)
            .with_data(json!({"other_agent_id": "agent-b", "resource": "file.rs"}));
        coordinator.receive(report).await;
        coordinator.reset().await;
        assert!(coordinator.conflicts().await.is_empty());
    }
}
