//! Synthesizes worker specs into executable `AgentConfig`s on demand (§4.2).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::warn;

use crate::domain::errors::FactoryError;
use crate::domain::models::{AgentConfig, AgentSpec, AgentTtl, ExecutionOrder, ModelTier};

/// Tools every agent gets regardless of its spec, per §4.2 step 5.
const BASELINE_TOOLS: [&str; 2] = ["read_file", "glob"];

/// The known tool registry configs are filtered against.
const KNOWN_TOOLS: [&str; 9] = [
    "read_file",
    "glob",
    "grep",
    "write_file",
    "edit_file",
    "bash",
    "web_search",
    "list_dir",
    "run_tests",
];

/// Context passed alongside a batch of specs.
///
/// `timestamp_millis` is supplied by the caller (rather than read from the
/// wall clock inside the factory) so `createFromSpecs` stays a deterministic,
/// pure function of its inputs (§8 testable property 7).
#[derive(Debug, Clone)]
pub struct FactoryContext {
    pub timestamp_millis: i64,
    pub parent_task_id: Option<String>,
    pub ttl: AgentTtl,
}

fn pick_model_tier(responsibility: &str) -> ModelTier {
    let lower = responsibility.to_lowercase();
    let write_verbs = ["design", "architect", "implement", "refactor", "build", "create"];
    if write_verbs.iter().any(|v| lower.contains(v)) {
        return ModelTier::Powerful;
    }
    let read_only_verbs = ["search", "find", "list", "inspect", "read", "locate"];
    let has_write_verb = ["write", "edit", "modify", "delete", "update"]
        .iter()
        .any(|v| lower.contains(v));
    if read_only_verbs.iter().any(|v| lower.contains(v)) && !has_write_verb {
        return ModelTier::Fast;
    }
    ModelTier::Balanced
}

fn estimate_max_iterations(responsibility: &str) -> u32 {
    let lower = responsibility.to_lowercase();
    if ["search", "list"].iter().any(|v| lower.contains(v)) {
        8
    } else if ["implement", "design", "refactor"].iter().any(|v| lower.contains(v)) {
        15
    } else if ["test", "verify"].iter().any(|v| lower.contains(v)) {
        10
    } else {
        12
    }
}

fn recommended_tools(responsibility: &str) -> Vec<&'static str> {
    let lower = responsibility.to_lowercase();
    let mut tools: Vec<&'static str> = BASELINE_TOOLS.to_vec();
    if ["search", "find", "grep"].iter().any(|v| lower.contains(v)) {
        tools.push("grep");
    }
    if ["write", "edit", "implement", "refactor"].iter().any(|v| lower.contains(v)) {
        tools.push("write_file");
        tools.push("edit_file");
    }
    if ["run", "build", "compile", "install"].iter().any(|v| lower.contains(v)) {
        tools.push("bash");
    }
    if ["test", "verify"].iter().any(|v| lower.contains(v)) {
        tools.push("run_tests");
    }
    tools
}

/// Synthesizes `AgentConfig`s from `AgentSpec`s and retains them, process-wide
/// in spirit but owned here via an explicit `Arc`, keyed by id.
pub struct AgentFactory {
    known_tools: HashSet<&'static str>,
    active: Arc<RwLock<HashMap<String, AgentConfig>>>,
}

impl Default for AgentFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentFactory {
    pub fn new() -> Self {
        Self {
            known_tools: KNOWN_TOOLS.into_iter().collect(),
            active: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// §4.2: assign ids, resolve dependency names, pick model tier/iteration
    /// budget/tools, and classify the batch's execution order.
    pub async fn create_from_specs(
        &self,
        specs: &[AgentSpec],
        ctx: &FactoryContext,
    ) -> Result<(Vec<AgentConfig>, ExecutionOrder), FactoryError> {
        let mut seen = HashSet::new();
        for spec in specs {
            if !seen.insert(spec.name.as_str()) {
                return Err(FactoryError::DuplicateSpecName(spec.name.clone()));
            }
        }

        // Core-role configs are synthesized directly by the router with their
        // own `core-<role>-<ts>` id scheme; everything reaching the factory
        // is a dynamic/swarm spec batch.
        let prefix = "dynamic";
        let name_to_id: HashMap<&str, String> = specs
            .iter()
            .enumerate()
            .map(|(idx, spec)| {
                (
                    spec.name.as_str(),
                    format!("{prefix}-{}-{}-{idx}", spec.name, ctx.timestamp_millis),
                )
            })
            .collect();

        let mut configs = Vec::with_capacity(specs.len());
        for spec in specs {
            let mut dependencies = Vec::with_capacity(spec.dependencies.len());
            for dep_name in &spec.dependencies {
                match name_to_id.get(dep_name.as_str()) {
                    Some(id) => dependencies.push(id.clone()),
                    None => warn!(
                        spec = %spec.name,
                        dependency = %dep_name,
                        "dropping dependency name not present in this batch"
                    ),
                }
            }

            let model_tier = pick_model_tier(&spec.responsibility);
            let max_iterations = estimate_max_iterations(&spec.responsibility);
            let timeout = Duration::from_secs(u64::from(max_iterations) * 30 + 60);

            let mut tools: Vec<String> = recommended_tools(&spec.responsibility)
                .into_iter()
                .map(str::to_string)
                .collect();
            for tool in &spec.tools {
                if self.known_tools.contains(tool.as_str()) && !tools.contains(tool) {
                    tools.push(tool.clone());
                }
            }

            let id = name_to_id[spec.name.as_str()].clone();
            configs.push(AgentConfig {
                id,
                prompt: spec.responsibility.clone(),
                tools,
                model_tier,
                max_iterations,
                timeout,
                parent_task_id: ctx.parent_task_id.clone(),
                dependencies,
                ttl: ctx.ttl,
                spec: spec.clone(),
            });
        }

        let execution_order = classify_execution_order(specs);

        {
            let mut active = self.active.write().await;
            for config in &configs {
                active.insert(config.id.clone(), config.clone());
            }
        }

        Ok((configs, execution_order))
    }

    pub async fn destroy_agent(&self, id: &str) {
        self.active.write().await.remove(id);
    }

    pub async fn destroy_task_agents(&self, parent_task_id: &str) {
        self.active
            .write()
            .await
            .retain(|_, config| config.parent_task_id.as_deref() != Some(parent_task_id));
    }

    pub async fn active_count(&self) -> usize {
        self.active.read().await.len()
    }
}

fn classify_execution_order(specs: &[AgentSpec]) -> ExecutionOrder {
    let all_parallel_no_deps = specs.iter().all(|s| s.parallelizable && s.dependencies.is_empty());
    if all_parallel_no_deps {
        return ExecutionOrder::Parallel;
    }
    let none_parallel_or_has_dep = specs.iter().all(|s| !s.parallelizable) || specs.iter().any(|s| !s.dependencies.is_empty());
    if none_parallel_or_has_dep {
        return ExecutionOrder::Sequential;
    }
    ExecutionOrder::Mixed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> FactoryContext {
        FactoryContext {
            timestamp_millis: 1_700_000_000_000,
            parent_task_id: Some("task-1".into()),
            ttl: AgentTtl::Task,
        }
    }

    #[tokio::test]
    async fn deterministic_for_same_input_and_timestamp() {
        let factory = AgentFactory::new();
        let specs = vec![AgentSpec::new("worker-a", "search the codebase")];
        let (first, _) = factory.create_from_specs(&specs, &ctx()).await.unwrap();
        let (second, _) = factory.create_from_specs(&specs, &ctx()).await.unwrap();
        assert_eq!(first[0].id, second[0].id);
    }

    #[tokio::test]
    async fn unresolved_dependency_name_is_dropped_not_fatal() {
        let factory = AgentFactory::new();
        let specs = vec![AgentSpec::new("worker-a", "implement the feature")
            .with_dependencies(["ghost-spec"])];
        let (configs, _) = factory.create_from_specs(&specs, &ctx()).await.unwrap();
        assert!(configs[0].dependencies.is_empty());
    }

    #[tokio::test]
    async fn resolved_dependency_ids_refer_to_batch() {
        let factory = AgentFactory::new();
        let specs = vec![
            AgentSpec::new("planner", "plan the work").sequential(),
            AgentSpec::new("worker-a", "implement the feature").with_dependencies(["planner"]),
        ];
        let (configs, order) = factory.create_from_specs(&specs, &ctx()).await.unwrap();
        let planner_id = &configs[0].id;
        assert_eq!(&configs[1].dependencies[0], planner_id);
        // Any dependency present forces sequential, regardless of individual
        // parallelizable flags.
        assert_eq!(order, ExecutionOrder::Sequential);
    }

    #[tokio::test]
    async fn execution_order_mixed_when_flags_differ_and_no_deps() {
        let factory = AgentFactory::new();
        let specs = vec![
            AgentSpec::new("planner", "plan the work").sequential(),
            AgentSpec::new("worker-a", "implement the feature"),
        ];
        let (_, order) = factory.create_from_specs(&specs, &ctx()).await.unwrap();
        assert_eq!(order, ExecutionOrder::Mixed);
    }

    #[tokio::test]
    async fn model_tier_selection() {
        let factory = AgentFactory::new();
        let specs = vec![
            AgentSpec::new("a", "design the new architecture"),
            AgentSpec::new("b", "search for usages of this symbol"),
            AgentSpec::new("c", "write the release notes"),
        ];
        let (configs, _) = factory.create_from_specs(&specs, &ctx()).await.unwrap();
        assert_eq!(configs[0].model_tier, ModelTier::Powerful);
        assert_eq!(configs[1].model_tier, ModelTier::Fast);
        assert_eq!(configs[2].model_tier, ModelTier::Balanced);
    }

    #[tokio::test]
    async fn timeout_derives_from_max_iterations() {
        let factory = AgentFactory::new();
        let specs = vec![AgentSpec::new("a", "search for the bug")];
        let (configs, _) = factory.create_from_specs(&specs, &ctx()).await.unwrap();
        assert_eq!(configs[0].max_iterations, 8);
        assert_eq!(configs[0].timeout, Duration::from_secs(8 * 30 + 60));
    }

    #[tokio::test]
    async fn execution_order_parallel_when_uniform_and_dep_free() {
        let factory = AgentFactory::new();
        let specs = vec![
            AgentSpec::new("a", "search one thing"),
            AgentSpec::new("b", "search another thing"),
        ];
        let (_, order) = factory.create_from_specs(&specs, &ctx()).await.unwrap();
        assert_eq!(order, ExecutionOrder::Parallel);
    }

    #[tokio::test]
    async fn execution_order_sequential_when_none_parallelizable() {
        let factory = AgentFactory::new();
        let specs = vec![
            AgentSpec::new("a", "search one thing").sequential(),
            AgentSpec::new("b", "search another thing").sequential(),
        ];
        let (_, order) = factory.create_from_specs(&specs, &ctx()).await.unwrap();
        assert_eq!(order, ExecutionOrder::Sequential);
    }

    #[tokio::test]
    async fn duplicate_spec_names_are_rejected() {
        let factory = AgentFactory::new();
        let specs = vec![AgentSpec::new("a", "x"), AgentSpec::new("a", "y")];
        let result = factory.create_from_specs(&specs, &ctx()).await;
        assert!(matches!(result, Err(FactoryError::DuplicateSpecName(_))));
    }

    #[tokio::test]
    async fn destroy_task_agents_removes_only_that_parent() {
        let factory = AgentFactory::new();
        let specs = vec![AgentSpec::new("a", "search")];
        factory.create_from_specs(&specs, &ctx()).await.unwrap();
        assert_eq!(factory.active_count().await, 1);
        factory.destroy_task_agents("task-1").await;
        assert_eq!(factory.active_count().await, 0);
    }

    #[tokio::test]
    async fn unknown_requested_tools_are_filtered() {
        let factory = AgentFactory::new();
        let specs = vec![AgentSpec::new("a", "search").with_tools(["teleport"])];
        let (configs, _) = factory.create_from_specs(&specs, &ctx()).await.unwrap();
        assert!(!configs[0].tools.contains(&"teleport".to_string()));
    }
}
