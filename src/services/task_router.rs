//! Routes an analyzed task to a core role, an ad-hoc dynamic spec set, or a
//! parallel swarm (§4.3).

use std::time::Duration;

use crate::domain::errors::RoutingError;
use crate::domain::models::{
    AgentSpec, Complexity, ConflictResolution, CoreRole, ExecutionMode, ReportingMode, RoutingContext,
    RoutingDecision, SwarmConfig, TaskAnalysis,
};
use crate::domain::ports::Profiler;

use super::{core_roles, task_analyzer};

const KNOWN_CORE_ROLES: [(&str, CoreRole); 4] = [
    ("coder", CoreRole::Coder),
    ("reviewer", CoreRole::Reviewer),
    ("explore", CoreRole::Explore),
    ("plan", CoreRole::Plan),
];

fn parse_core_role(id: &str) -> Option<CoreRole> {
    KNOWN_CORE_ROLES.iter().find(|(name, _)| *name == id).map(|(_, role)| *role)
}

/// One of the three cascade outcomes from §4.3 step 3, before a `core` result
/// is resolved to an actual role.
enum Classification {
    Core,
    Swarm,
    Dynamic,
}

fn classify(analysis: &TaskAnalysis) -> Classification {
    if analysis.complexity == Complexity::Simple
        || (analysis.complexity == Complexity::Moderate && analysis.specialization_count() <= 1)
        || analysis.parallelism <= 1
    {
        return Classification::Core;
    }
    if analysis.parallelism >= 3
        || (analysis.complexity == Complexity::Complex && analysis.specialization_count() >= 2)
        || analysis.estimated_steps >= 15
    {
        return Classification::Swarm;
    }
    Classification::Dynamic
}

/// Stateless router: holds only an optional profiler to consult for core-role
/// selection. No mutable state of its own.
pub struct TaskRouter {
    profiler: Option<Box<dyn Profiler>>,
}

impl Default for TaskRouter {
    fn default() -> Self {
        Self::new(None)
    }
}

impl TaskRouter {
    pub fn new(profiler: Option<Box<dyn Profiler>>) -> Self {
        Self { profiler }
    }

    pub async fn route(&self, ctx: &RoutingContext) -> Result<RoutingDecision, RoutingError> {
        let analysis = task_analyzer::analyze(&ctx.task);

        if let Some(forced) = &ctx.forced_agent_id {
            let role = parse_core_role(forced).ok_or_else(|| RoutingError::UnknownForcedAgent(forced.clone()))?;
            return Ok(RoutingDecision::Core {
                role,
                profiler_score: None,
            });
        }

        match classify(&analysis) {
            Classification::Core => Ok(self.route_core(&analysis).await),
            Classification::Swarm => Ok(route_swarm(&analysis)),
            Classification::Dynamic => Ok(route_dynamic(&analysis)),
        }
    }

    async fn route_core(&self, analysis: &TaskAnalysis) -> RoutingDecision {
        if let Some(profiler) = &self.profiler {
            if let Some(rec) = profiler.recommend(analysis.task_type).await {
                return RoutingDecision::Core {
                    role: rec.role,
                    profiler_score: Some(rec.wilson_score),
                };
            }
        }
        RoutingDecision::Core {
            role: core_roles::static_role_for_task_type(analysis.task_type),
            profiler_score: None,
        }
    }
}

fn route_dynamic(analysis: &TaskAnalysis) -> RoutingDecision {
    let specs = if analysis.specializations.is_empty() {
        vec![AgentSpec::new("worker", "carry out the requested task")]
    } else {
        analysis
            .specializations
            .iter()
            .map(|s| AgentSpec::new(format!("{}-worker", s.as_str()), format!("handle the {} aspects of the task", s.as_str())))
            .collect()
    };
    RoutingDecision::Dynamic { specs }
}

fn route_swarm(analysis: &TaskAnalysis) -> RoutingDecision {
    let mut specs = vec![AgentSpec::new("task-planner", "break the task down and coordinate the specialists").sequential()];

    for spec in &analysis.specializations {
        let name = format!("{}-worker", spec.as_str());
        specs.push(
            AgentSpec::new(&name, format!("handle the {} aspects of the task", spec.as_str()))
                .with_dependencies(["task-planner"]),
        );
    }

    let target_parallelism = analysis.parallelism as usize;
    let mut filler_idx = 1;
    while specs.len() - 1 < target_parallelism && filler_idx <= 5 {
        let name = format!("worker-{filler_idx}");
        specs.push(AgentSpec::new(&name, "assist with remaining subtasks").with_dependencies(["task-planner"]));
        filler_idx += 1;
    }

    let max_agents = (target_parallelism * 2).clamp(1, 50);
    let config = SwarmConfig {
        max_agents,
        reporting_mode: ReportingMode::Sparse,
        conflict_resolution: ConflictResolution::Coordinator,
        timeout: Duration::from_secs(u64::from(analysis.estimated_steps) * 60),
        enable_peer_communication: false,
    };

    let execution_mode = if specs.iter().any(|s| !s.dependencies.is_empty()) {
        ExecutionMode::Dag
    } else {
        ExecutionMode::Optimistic
    };

    RoutingDecision::Swarm {
        specs,
        config,
        execution_mode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(task: &str) -> RoutingContext {
        RoutingContext {
            task: task.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn simple_task_routes_to_core() {
        let router = TaskRouter::default();
        let decision = router.route(&ctx("fix this typo")).await.unwrap();
        assert_eq!(decision.kind(), "core");
    }

    #[tokio::test]
    async fn forced_agent_bypasses_classification() {
        let router = TaskRouter::default();
        let mut c = ctx("a massive multi-part migration across the entire system 1. 2. 3. 4.");
        c.forced_agent_id = Some("reviewer".to_string());
        let decision = router.route(&c).await.unwrap();
        match decision {
            RoutingDecision::Core { role, profiler_score } => {
                assert_eq!(role, CoreRole::Reviewer);
                assert!(profiler_score.is_none());
            }
            _ => panic!("expected core decision"),
        }
    }

    #[tokio::test]
    async fn unknown_forced_agent_is_an_error() {
        let router = TaskRouter::default();
        let mut c = ctx("do something");
        c.forced_agent_id = Some("ghost-role".to_string());
        let result = router.route(&c).await;
        assert!(matches!(result, Err(RoutingError::UnknownForcedAgent(_))));
    }

    #[tokio::test]
    async fn high_parallelism_routes_to_swarm() {
        let router = TaskRouter::default();
        let decision = router
            .route(&ctx(
                "update the database schema, the frontend component, and the backend api concurrently",
            ))
            .await
            .unwrap();
        assert_eq!(decision.kind(), "swarm");
        if let RoutingDecision::Swarm { specs, config, .. } = decision {
            assert_eq!(specs[0].name, "task-planner");
            assert!(!specs[0].parallelizable);
            assert!(config.max_agents <= 50);
        }
    }

    #[tokio::test]
    async fn swarm_execution_mode_is_dag_when_specs_have_dependencies() {
        let router = TaskRouter::default();
        let decision = router
            .route(&ctx(
                "redesign the database and frontend and backend in parallel across the whole system",
            ))
            .await
            .unwrap();
        if let RoutingDecision::Swarm { execution_mode, .. } = decision {
            assert_eq!(execution_mode, ExecutionMode::Dag);
        } else {
            panic!("expected swarm decision");
        }
    }

    #[tokio::test]
    async fn moderate_single_specialization_routes_to_core() {
        let router = TaskRouter::default();
        let decision = router.route(&ctx("please clean up this database query")).await.unwrap();
        assert_eq!(decision.kind(), "core");
    }
}
