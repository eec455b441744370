//! End-to-end scenarios spanning router -> factory -> scheduler, and the
//! recovery/learning feedback loop, matching the six scenarios this core is
//! expected to satisfy.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use swarmcore::domain::models::{
    AgentConfig, AgentReport, AgentSpec, AgentStatus, AgentTtl, CoreRole, ExecutionMode, RecoveryStatus,
    RoutingContext, RoutingDecision, SwarmConfig,
};
use swarmcore::domain::ports::{AgentExecutor, ExecutorOutcome, NullEventSink, NullSolutionStore};
use swarmcore::services::recovery_engine::RecoveryContext;
use swarmcore::services::{AgentFactory, FactoryContext, LearningStrategy, RecoveryLearner, SwarmScheduler, TaskRouter};

fn ctx(task: &str) -> RoutingContext {
    RoutingContext {
        task: task.to_string(),
        ..RoutingContext::default()
    }
}

fn factory_ctx(timestamp_millis: i64) -> FactoryContext {
    FactoryContext {
        timestamp_millis,
        parent_task_id: None,
        ttl: AgentTtl::Task,
    }
}

/// Succeeds instantly with no artificial delay.
struct ImmediateSuccess;

#[async_trait]
impl AgentExecutor for ImmediateSuccess {
    async fn execute(
        &self,
        config: &AgentConfig,
        on_report: &(dyn Fn(AgentReport) + Send + Sync),
    ) -> anyhow::Result<ExecutorOutcome> {
        on_report(AgentReport::new(&config.id, &config.spec.name, swarmcore::domain::models::ReportType::Progress));
        Ok(ExecutorOutcome {
            success: true,
            output: format!("ok: {}", config.spec.name),
            error: None,
            iterations: 1,
        })
    }
}

/// Delays by whatever this agent's spec name maps to, then always succeeds.
struct DelayedByName {
    delays: HashMap<String, Duration>,
}

#[async_trait]
impl AgentExecutor for DelayedByName {
    async fn execute(
        &self,
        config: &AgentConfig,
        _on_report: &(dyn Fn(AgentReport) + Send + Sync),
    ) -> anyhow::Result<ExecutorOutcome> {
        if let Some(delay) = self.delays.get(&config.spec.name) {
            tokio::time::sleep(*delay).await;
        }
        Ok(ExecutorOutcome {
            success: true,
            output: config.spec.name.clone(),
            error: None,
            iterations: 1,
        })
    }
}

/// Never returns on its own; used to prove the scheduler's timeout fires
/// without waiting on the agent.
struct NeverFinishes;

#[async_trait]
impl AgentExecutor for NeverFinishes {
    async fn execute(
        &self,
        _config: &AgentConfig,
        _on_report: &(dyn Fn(AgentReport) + Send + Sync),
    ) -> anyhow::Result<ExecutorOutcome> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(ExecutorOutcome {
            success: true,
            output: String::new(),
            error: None,
            iterations: 1,
        })
    }
}

/// Scenario 1: a narrow, single-specialization task is handled by a core role
/// with no swarm involved at all.
#[tokio::test]
async fn simple_task_routes_to_core_and_skips_the_scheduler() {
    let router = TaskRouter::default();
    let decision = router.route(&ctx("Find the definition of foo")).await.unwrap();
    match decision {
        RoutingDecision::Core { role, .. } => assert_eq!(role, CoreRole::Explore),
        other => panic!("expected a core decision, got {other:?}"),
    }
}

/// Scenario 2: a task naming two specializations and explicit parallelism
/// routes to a swarm with a sequential planner plus specialists that all
/// depend on it, and reaches a parallel peak of at least 3 once the planner
/// finishes.
#[tokio::test]
async fn three_parallel_specialists_reach_peak_parallelism() {
    let router = TaskRouter::default();
    let decision = router
        .route(&ctx("update the database schema and the frontend component in parallel"))
        .await
        .unwrap();

    let (specs, config, execution_mode) = match decision {
        RoutingDecision::Swarm { specs, config, execution_mode } => (specs, config, execution_mode),
        other => panic!("expected a swarm decision, got {other:?}"),
    };
    assert_eq!(specs[0].name, "task-planner");
    assert!(!specs[0].parallelizable);
    assert_eq!(config.max_agents, 6);
    assert!(specs.len() >= 3, "expected the planner plus at least 2 specialists");

    let factory = AgentFactory::new();
    let (agents, _) = factory.create_from_specs(&specs, &factory_ctx(1)).await.unwrap();

    let scheduler = SwarmScheduler::new();
    let result = scheduler
        .execute(agents, config, execution_mode, Arc::new(ImmediateSuccess), Arc::new(NullEventSink))
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.statistics.completed, result.statistics.total);
    assert!(
        result.statistics.parallel_peak >= 3,
        "expected at least 3 concurrent agents once the planner finished, got {}",
        result.statistics.parallel_peak
    );
}

/// Scenario 3: a dependent agent never starts before its dependency ends.
#[tokio::test]
async fn dag_dependency_gating_orders_dependent_after_dependency() {
    let specs = vec![
        AgentSpec::new("a", "go first"),
        AgentSpec::new("b", "go second").with_dependencies(["a"]),
    ];
    let factory = AgentFactory::new();
    let (agents, _) = factory.create_from_specs(&specs, &factory_ctx(2)).await.unwrap();

    let mut delays = HashMap::new();
    delays.insert("a".to_string(), Duration::from_millis(50));
    let executor = Arc::new(DelayedByName { delays });

    let scheduler = SwarmScheduler::new();
    let result = scheduler
        .execute(agents, SwarmConfig::default(), ExecutionMode::Dag, executor, Arc::new(NullEventSink))
        .await
        .unwrap();

    assert!(result.success);
    let a = result.agents.iter().find(|r| r.agent_name == "a").unwrap();
    let b = result.agents.iter().find(|r| r.agent_name == "b").unwrap();
    assert_eq!(a.status, AgentStatus::Completed);
    assert_eq!(b.status, AgentStatus::Completed);
    assert!(b.start_time.unwrap() >= a.end_time.unwrap());
}

/// Scenario 4: more independent tasks than the concurrency cap all complete,
/// and the observed parallelism never exceeds that cap.
#[tokio::test]
async fn optimistic_claim_drains_every_task_within_the_concurrency_cap() {
    let specs: Vec<AgentSpec> = (0..5).map(|i| AgentSpec::new(format!("worker-{i}"), "do a unit of work")).collect();
    let factory = AgentFactory::new();
    let (agents, _) = factory.create_from_specs(&specs, &factory_ctx(3)).await.unwrap();

    let config = SwarmConfig {
        max_agents: 3,
        ..SwarmConfig::default()
    };
    let scheduler = SwarmScheduler::new();
    let result = scheduler
        .execute(agents, config, ExecutionMode::Optimistic, Arc::new(ImmediateSuccess), Arc::new(NullEventSink))
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.statistics.completed, 5);
    assert!(result.statistics.parallel_peak <= 3);
}

struct AlwaysRetry;

#[async_trait]
impl RecoveryContext for AlwaysRetry {
    async fn on_retry(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Scenario 5: repeated identical rate-limit errors for the same tool teach
/// `LearningStrategy` a high-confidence solution, and `RecoveryLearner`
/// switches from the static pattern table to the learned override once that
/// confidence clears 0.6.
#[tokio::test(start_paused = true)]
async fn rate_limit_errors_cross_the_learned_confidence_threshold() {
    let learning = Arc::new(LearningStrategy::new(Box::new(NullSolutionStore)));
    let learner = RecoveryLearner::new(learning);
    let ctx = AlwaysRetry;

    let mut learned_override_used = Vec::with_capacity(10);
    for i in 0..10 {
        let event = learner
            .handle_error(&format!("err-{i}"), "429 rate limit exceeded", Some(&ctx), "bash")
            .await;
        assert_eq!(event.status, RecoveryStatus::Succeeded);
        learned_override_used.push(event.provenance.is_some());
    }

    assert!(
        learned_override_used.iter().any(|&used| used),
        "expected the learned action to override the pattern table within 10 identical successes"
    );
    // Once confidence clears the threshold it only keeps climbing on further
    // successes, so every override after the first stays an override.
    let first_override = learned_override_used.iter().position(|&used| used).unwrap();
    assert!(learned_override_used[first_override..].iter().all(|&used| used));
}

/// Scenario 6: a short timeout cancels every agent still in flight even
/// though the executor itself never finishes, because the scheduler races
/// `config.timeout` directly rather than waiting for the next periodic tick.
#[tokio::test(start_paused = true)]
async fn timeout_cancels_all_agents_still_in_flight() {
    let specs = vec![AgentSpec::new("slow", "take forever")];
    let factory = AgentFactory::new();
    let (agents, _) = factory.create_from_specs(&specs, &factory_ctx(4)).await.unwrap();

    let config = SwarmConfig {
        timeout: Duration::from_millis(100),
        ..SwarmConfig::default()
    };
    let scheduler = SwarmScheduler::new();
    let result = scheduler
        .execute(agents, config, ExecutionMode::Dag, Arc::new(NeverFinishes), Arc::new(NullEventSink))
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.statistics.cancelled, 1);
    assert_eq!(result.statistics.completed, 0);
}
