//! Thin process entry point: owns the singletons the core describes as
//! process-wide (factory, scheduler, router, learning strategy) for the
//! duration of one process, wired through an explicit context struct rather
//! than statics.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use swarmcore::domain::models::{AgentConfig, AgentReport, AgentTtl, ExecutionMode, RoutingContext, RoutingDecision};
use swarmcore::domain::ports::{AgentExecutor, ExecutorOutcome, NullEventSink, NullSolutionStore};
use swarmcore::infrastructure::config::ConfigLoader;
use swarmcore::infrastructure::logging;
use swarmcore::services::{AgentFactory, FactoryContext, LearningStrategy, SwarmScheduler, TaskRouter};

/// Stand-in for the real, out-of-scope agent runner: echoes the prompt back
/// as its output and always succeeds. A production caller supplies its own
/// `AgentExecutor`.
struct EchoExecutor;

#[async_trait]
impl AgentExecutor for EchoExecutor {
    async fn execute(
        &self,
        config: &AgentConfig,
        on_report: &(dyn Fn(AgentReport) + Send + Sync),
    ) -> Result<ExecutorOutcome> {
        on_report(AgentReport::new(&config.id, &config.spec.name, swarmcore::domain::models::ReportType::Progress));
        Ok(ExecutorOutcome {
            success: true,
            output: format!("{}: {}", config.spec.name, config.prompt),
            error: None,
            iterations: 1,
        })
    }
}

/// Owns the core's process-wide singletons for one run.
struct CoreContext {
    factory: AgentFactory,
    router: TaskRouter,
    scheduler: SwarmScheduler,
    #[allow(dead_code)]
    learning: Arc<LearningStrategy>,
}

impl CoreContext {
    fn new() -> Self {
        Self {
            factory: AgentFactory::new(),
            router: TaskRouter::new(None),
            scheduler: SwarmScheduler::new(),
            learning: Arc::new(LearningStrategy::new(Box::new(NullSolutionStore))),
        }
    }

    async fn run_task(&self, task: &str) -> Result<()> {
        let ctx = RoutingContext { task: task.to_string(), ..RoutingContext::default() };
        let decision = self.router.route(&ctx).await.context("routing failed")?;
        info!(kind = decision.kind(), "task routed");

        match decision {
            RoutingDecision::Core { role, .. } => {
                info!(role = role.as_str(), "handled by a core role agent, no swarm needed");
            }
            RoutingDecision::Dynamic { specs } => {
                self.execute_specs(specs, ExecutionMode::Dag).await?;
            }
            RoutingDecision::Swarm { specs, config, execution_mode } => {
                let (agents, _) = self
                    .factory
                    .create_from_specs(
                        &specs,
                        &FactoryContext { timestamp_millis: 0, parent_task_id: None, ttl: AgentTtl::Task },
                    )
                    .await
                    .context("agent synthesis failed")?;
                let result = self
                    .scheduler
                    .execute(agents, config, execution_mode, Arc::new(EchoExecutor), Arc::new(NullEventSink))
                    .await
                    .context("swarm execution failed")?;
                info!(success = result.success, completed = result.statistics.completed, "swarm finished");
            }
        }

        Ok(())
    }

    async fn execute_specs(&self, specs: Vec<swarmcore::domain::models::AgentSpec>, mode: ExecutionMode) -> Result<()> {
        let (agents, _) = self
            .factory
            .create_from_specs(&specs, &FactoryContext { timestamp_millis: 0, parent_task_id: None, ttl: AgentTtl::Task })
            .await
            .context("agent synthesis failed")?;
        let result = self
            .scheduler
            .execute(
                agents,
                swarmcore::domain::models::SwarmConfig::default(),
                mode,
                Arc::new(EchoExecutor),
                Arc::new(NullEventSink),
            )
            .await
            .context("execution failed")?;
        info!(success = result.success, completed = result.statistics.completed, "dynamic run finished");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ConfigLoader::load().context("failed to load configuration")?;
    let _guard = logging::logger::init(&config.logging).context("failed to initialize logging")?;

    info!(max_agents = config.max_agents, "swarmcore starting");

    let core = CoreContext::new();
    core.run_task("Research the auth module and refactor the frontend in parallel").await?;

    Ok(())
}
