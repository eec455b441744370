//! `SwarmScheduler`: drives a batch of agents to completion, either over a
//! dependency DAG or an optimistic shared task pool (§4.6).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{info, instrument, warn};

use crate::domain::errors::SchedulerError;
use crate::domain::models::{
    AgentConfig, AgentReport, AgentRuntime, AgentStatus, ExecutionMode, ReportType, SwarmConfig, SwarmResult,
    SwarmStatistics,
};
use crate::domain::ports::{AgentExecutor, EventSink, SwarmEvent};

use super::coordinator::Coordinator;
use super::resource_lock_manager::ResourceLockManager;
use super::task_claim_service::TaskClaimService;

const TICK_INTERVAL: Duration = Duration::from_secs(5);
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Cooperative cancellation handle: a flag plus a `Notify` so the scheduler's
/// `select!` loop wakes immediately instead of waiting for the next tick.
#[derive(Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent: calling this more than once has no additional effect.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

pub struct SwarmScheduler {
    coordinator: Arc<Coordinator>,
    lock_manager: Arc<ResourceLockManager>,
    claim_service: Arc<TaskClaimService>,
    token: CancellationToken,
}

impl Default for SwarmScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl SwarmScheduler {
    pub fn new() -> Self {
        Self {
            coordinator: Arc::new(Coordinator::new()),
            lock_manager: Arc::new(ResourceLockManager::new()),
            claim_service: Arc::new(TaskClaimService::new()),
            token: CancellationToken::new(),
        }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    #[instrument(skip_all, fields(agent_count = agents.len()))]
    pub async fn execute(
        &self,
        agents: Vec<AgentConfig>,
        config: SwarmConfig,
        execution_mode: ExecutionMode,
        executor: Arc<dyn AgentExecutor>,
        event_sink: Arc<dyn EventSink>,
    ) -> Result<SwarmResult, SchedulerError> {
        let ids: std::collections::HashSet<&str> = agents.iter().map(|a| a.id.as_str()).collect();
        for agent in &agents {
            for dep in &agent.dependencies {
                if !ids.contains(dep.as_str()) {
                    return Err(SchedulerError::UnknownDependency(agent.id.clone(), dep.clone()));
                }
            }
        }

        self.coordinator.reset().await;
        self.lock_manager.reset().await;

        let mut runtimes: HashMap<String, AgentRuntime> = agents
            .iter()
            .map(|a| (a.id.clone(), AgentRuntime::new(a.id.clone(), a.spec.name.clone(), a.dependencies.clone())))
            .collect();
        let configs: HashMap<String, AgentConfig> = agents.into_iter().map(|a| (a.id.clone(), a)).collect();

        event_sink.emit(SwarmEvent::Started { agent_count: configs.len() });
        for config_entry in configs.values() {
            event_sink.emit(SwarmEvent::AgentAdded {
                id: config_entry.id.clone(),
                name: config_entry.spec.name.clone(),
                role: None,
            });
        }

        if execution_mode == ExecutionMode::Optimistic {
            let claimable = configs
                .values()
                .map(|c| crate::domain::models::ClaimableTask::new(c.id.clone(), c.prompt.clone(), 0))
                .collect();
            self.claim_service.publish(claimable).await;
        }

        let mut statistics = SwarmStatistics {
            total: configs.len(),
            ..SwarmStatistics::default()
        };

        let start = Instant::now();
        // `config.timeout` is raced directly in the select below (not just
        // checked at the top of the loop) so a timeout lands promptly even
        // while an agent is running, instead of waiting for the next 5 s tick.
        let deadline = start + config.timeout;
        let mut running: FuturesUnordered<_> = FuturesUnordered::new();
        let mut tick = tokio::time::interval(TICK_INTERVAL);
        tick.tick().await; // first tick fires immediately; consume it.
        // Finer-grained poll used only while no agent is running, so a stuck
        // DAG (every remaining runtime blocked on a failed dependency) still
        // reaches its timeout promptly instead of waiting a full tick.
        let mut idle_poll = tokio::time::interval(IDLE_POLL_INTERVAL);
        idle_poll.tick().await;

        loop {
            if self.token.is_cancelled() {
                cancel_non_terminal(&mut runtimes, &event_sink);
                break;
            }
            if Instant::now() >= deadline {
                warn!("swarm execution timed out");
                cancel_non_terminal(&mut runtimes, &event_sink);
                break;
            }
            if is_complete(&runtimes) {
                break;
            }

            if execution_mode == ExecutionMode::Dag {
                let ready_ids: Vec<String> = runtimes
                    .values()
                    .filter(|r| r.status == AgentStatus::Ready)
                    .map(|r| r.agent_id.clone())
                    .collect();
                let slots = config.max_agents.saturating_sub(running.len());
                for id in ready_ids.into_iter().take(slots) {
                    if self.token.is_cancelled() {
                        break;
                    }
                    let config_entry = configs[&id].clone();
                    self.launch(&mut runtimes, &event_sink, config_entry.clone());
                    running.push(run_one_agent(config_entry, Arc::clone(&executor)));
                }
            } else {
                let slots = config.max_agents.saturating_sub(running.len());
                for _ in 0..slots {
                    if self.token.is_cancelled() || self.claim_service.is_all_done().await {
                        break;
                    }
                    let Some(task) = self.claim_service.claim_next("scheduler", &[]).await else {
                        break;
                    };
                    let config_entry = configs[&task.id].clone();
                    self.launch(&mut runtimes, &event_sink, config_entry.clone());
                    running.push(run_one_agent(config_entry, Arc::clone(&executor)));
                }
            }

            statistics.parallel_peak = statistics.parallel_peak.max(running.len());

            if running.is_empty() {
                tokio::select! {
                    _ = idle_poll.tick() => {}
                    () = self.token_notified() => {}
                    () = tokio::time::sleep_until(deadline) => {}
                }
                continue;
            }

            tokio::select! {
                Some((id, outcome, reports)) = running.next() => {
                    self.finish_agent(&mut runtimes, &event_sink, &id, outcome, reports, execution_mode, config.reporting_mode).await;
                }
                _ = tick.tick() => {}
                () = self.token_notified() => {}
                () = tokio::time::sleep_until(deadline) => {}
            }
        }

        let final_runtimes: Vec<AgentRuntime> = {
            let mut values: Vec<AgentRuntime> = runtimes.into_values().collect();
            values.sort_by(|a, b| a.agent_id.cmp(&b.agent_id));
            values
        };

        statistics.completed = final_runtimes.iter().filter(|r| r.status == AgentStatus::Completed).count();
        statistics.failed = final_runtimes.iter().filter(|r| r.status == AgentStatus::Failed).count();
        statistics.cancelled = final_runtimes.iter().filter(|r| r.status == AgentStatus::Cancelled).count();
        statistics.total_iterations = final_runtimes.iter().map(|r| u64::from(r.iterations)).sum();

        let aggregated_output = self.coordinator.aggregate(&final_runtimes).await;
        let success = statistics.failed == 0 && statistics.cancelled == 0;

        event_sink.emit(SwarmEvent::Completed { statistics: statistics.clone() });
        info!(success, total = statistics.total, completed = statistics.completed, "swarm execution finished");

        Ok(SwarmResult {
            success,
            agents: final_runtimes,
            aggregated_output,
            total_time: start.elapsed(),
            statistics,
        })
    }

    async fn token_notified(&self) {
        if self.token.is_cancelled() {
            return;
        }
        self.token.notify.notified().await;
    }

    fn launch(&self, runtimes: &mut HashMap<String, AgentRuntime>, event_sink: &Arc<dyn EventSink>, config: AgentConfig) {
        let runtime = runtimes.get_mut(&config.id).expect("runtime exists for every config");
        runtime.status = AgentStatus::Running;
        runtime.start_time = Some(chrono::Utc::now());
        runtime
            .reports
            .push(AgentReport::new(config.id.clone(), config.spec.name.clone(), ReportType::Started));
        event_sink.emit(SwarmEvent::AgentUpdated {
            id: config.id.clone(),
            status: AgentStatus::Running,
            start_time: runtime.start_time,
            iterations: None,
        });
    }

    #[allow(clippy::too_many_arguments)]
    async fn finish_agent(
        &self,
        runtimes: &mut HashMap<String, AgentRuntime>,
        event_sink: &Arc<dyn EventSink>,
        id: &str,
        outcome: anyhow::Result<crate::domain::ports::ExecutorOutcome>,
        reports: Vec<AgentReport>,
        execution_mode: ExecutionMode,
        reporting_mode: crate::domain::models::ReportingMode,
    ) {
        for report in reports {
            let relevant = match reporting_mode {
                crate::domain::models::ReportingMode::Full => true,
                crate::domain::models::ReportingMode::Sparse => report.report_type.is_sparse_relevant(),
            };
            if relevant {
                self.coordinator.receive(report.clone()).await;
            }
            if let Some(runtime) = runtimes.get_mut(id) {
                runtime.reports.push(report);
            }
        }

        let runtime = runtimes.get_mut(id).expect("runtime exists for every config");
        runtime.end_time = Some(chrono::Utc::now());
        match outcome {
            Ok(result) => {
                runtime.iterations = result.iterations;
                runtime.output = Some(result.output.clone());
                runtime.error = result.error.clone();
                if result.success {
                    runtime.status = AgentStatus::Completed;
                    runtime
                        .reports
                        .push(AgentReport::new(id, runtime.agent_name.clone(), ReportType::Completed));
                    event_sink.emit(SwarmEvent::AgentCompleted {
                        id: id.to_string(),
                        output: result.output,
                    });
                } else {
                    runtime.status = AgentStatus::Failed;
                    let error = result.error.unwrap_or_else(|| "agent reported failure".to_string());
                    runtime
                        .reports
                        .push(AgentReport::new(id, runtime.agent_name.clone(), ReportType::Failed));
                    event_sink.emit(SwarmEvent::AgentFailed { id: id.to_string(), error });
                }
            }
            Err(err) => {
                runtime.status = AgentStatus::Failed;
                runtime.error = Some(err.to_string());
                runtime
                    .reports
                    .push(AgentReport::new(id, runtime.agent_name.clone(), ReportType::Failed));
                event_sink.emit(SwarmEvent::AgentFailed {
                    id: id.to_string(),
                    error: err.to_string(),
                });
            }
        }

        self.lock_manager.release_all(id).await;

        match execution_mode {
            ExecutionMode::Dag => update_dependents(runtimes, id),
            ExecutionMode::Optimistic => {
                let runtime = &runtimes[id];
                if runtime.status == AgentStatus::Completed {
                    self.claim_service.complete(id, "scheduler").await;
                } else {
                    self.claim_service.fail(id, "scheduler", runtime.error.as_deref().unwrap_or("")).await;
                }
            }
        }
    }
}

/// Walks pending runtimes and promotes any whose unmet-dependency list has
/// gone empty to `ready`. A dependency that finished non-completed
/// (`failed`/`cancelled`) stays in the unmet list forever — it is never
/// removed — so dependents of a failed agent never become ready on their own.
fn update_dependents(runtimes: &mut HashMap<String, AgentRuntime>, finished: &str) {
    let finished_status = runtimes.get(finished).map(|r| r.status);
    if finished_status != Some(AgentStatus::Completed) {
        return;
    }
    for runtime in runtimes.values_mut() {
        if runtime.status != AgentStatus::Pending {
            continue;
        }
        runtime.pending_dependencies.retain(|dep| dep != finished);
        if runtime.pending_dependencies.is_empty() {
            runtime.status = AgentStatus::Ready;
        }
    }
}

fn is_complete(runtimes: &HashMap<String, AgentRuntime>) -> bool {
    runtimes.values().all(|r| r.status.is_terminal())
}

fn cancel_non_terminal(runtimes: &mut HashMap<String, AgentRuntime>, event_sink: &Arc<dyn EventSink>) {
    for runtime in runtimes.values_mut() {
        if !runtime.status.is_terminal() {
            runtime.status = AgentStatus::Cancelled;
            runtime.end_time = Some(chrono::Utc::now());
            runtime
                .reports
                .push(AgentReport::new(runtime.agent_id.clone(), runtime.agent_name.clone(), ReportType::Failed));
            event_sink.emit(SwarmEvent::AgentFailed {
                id: runtime.agent_id.clone(),
                error: "cancelled".to_string(),
            });
        }
    }
    event_sink.emit(SwarmEvent::Cancelled);
}

type AgentRunOutcome = (String, anyhow::Result<crate::domain::ports::ExecutorOutcome>, Vec<AgentReport>);

async fn run_one_agent(config: AgentConfig, executor: Arc<dyn AgentExecutor>) -> AgentRunOutcome {
    let reports: Arc<StdMutex<Vec<AgentReport>>> = Arc::new(StdMutex::new(Vec::new()));
    let sink = Arc::clone(&reports);
    let on_report = move |report: AgentReport| {
        sink.lock().expect("report buffer mutex is never poisoned").push(report);
    };
    let outcome = executor.execute(&config, &on_report).await;
    let collected = std::mem::take(&mut *reports.lock().expect("report buffer mutex is never poisoned"));
    (config.id, outcome, collected)
}
