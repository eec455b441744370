//! Types produced by `TaskAnalyzer::analyze`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specialization {
    Database,
    Frontend,
    Backend,
    Devops,
    Security,
    Performance,
}

impl Specialization {
    pub const ALL: [Specialization; 6] = [
        Specialization::Database,
        Specialization::Frontend,
        Specialization::Backend,
        Specialization::Devops,
        Specialization::Security,
        Specialization::Performance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::Frontend => "frontend",
            Self::Backend => "backend",
            Self::Devops => "devops",
            Self::Security => "security",
            Self::Performance => "performance",
        }
    }
}

/// First-matching-category classification of what kind of work a task is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Review,
    Search,
    Plan,
    Test,
    Data,
    Ppt,
    Document,
    Image,
    Code,
}

impl TaskType {
    /// Priority order used when more than one category's patterns match.
    pub const PRIORITY: [TaskType; 9] = [
        TaskType::Review,
        TaskType::Search,
        TaskType::Plan,
        TaskType::Test,
        TaskType::Data,
        TaskType::Ppt,
        TaskType::Document,
        TaskType::Image,
        TaskType::Code,
    ];
}

/// Heuristic classification of a natural-language task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskAnalysis {
    pub complexity: Complexity,
    pub specializations: BTreeSet<Specialization>,
    pub parallelism: u32,
    pub estimated_steps: u32,
    pub task_type: TaskType,
    pub confidence: f64,
}

impl TaskAnalysis {
    pub fn specialization_count(&self) -> usize {
        self.specializations.len()
    }
}
