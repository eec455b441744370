//! Fixed prompts/tool sets for the four predefined core role archetypes, and
//! the static task-type -> role fallback map the router uses when no
//! `Profiler` recommendation is available.

use crate::domain::models::{CoreRole, TaskType};

pub struct CoreRoleDefinition {
    pub role: CoreRole,
    pub prompt: &'static str,
    pub tools: &'static [&'static str],
}

pub fn definition(role: CoreRole) -> CoreRoleDefinition {
    match role {
        CoreRole::Coder => CoreRoleDefinition {
            role,
            prompt: "You write and modify code to satisfy the user's request.",
            tools: &["read_file", "glob", "grep", "write_file", "edit_file", "bash"],
        },
        CoreRole::Reviewer => CoreRoleDefinition {
            role,
            prompt: "You review a diff or codebase for correctness and quality issues.",
            tools: &["read_file", "glob", "grep"],
        },
        CoreRole::Explore => CoreRoleDefinition {
            role,
            prompt: "You locate and explain relevant code without modifying it.",
            tools: &["read_file", "glob", "grep"],
        },
        CoreRole::Plan => CoreRoleDefinition {
            role,
            prompt: "You produce a step-by-step plan for how the work should be done.",
            tools: &["read_file", "glob", "grep"],
        },
    }
}

/// Static fallback used when no `Profiler` recommendation exists for a task
/// type.
pub fn static_role_for_task_type(task_type: TaskType) -> CoreRole {
    match task_type {
        TaskType::Search => CoreRole::Explore,
        TaskType::Review => CoreRole::Reviewer,
        TaskType::Plan => CoreRole::Plan,
        TaskType::Test | TaskType::Data | TaskType::Ppt | TaskType::Document | TaskType::Image | TaskType::Code => {
            CoreRole::Coder
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_maps_to_explore() {
        assert_eq!(static_role_for_task_type(TaskType::Search), CoreRole::Explore);
    }

    #[test]
    fn default_maps_to_coder() {
        assert_eq!(static_role_for_task_type(TaskType::Code), CoreRole::Coder);
    }
}
