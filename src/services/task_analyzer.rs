//! Heuristic classification of a natural-language task (§4.1).
//!
//! Pure function, no state: `analyze` always returns the same result for the
//! same input string. Classification is ordered-rule based rather than a
//! learned model, the same way the teacher's `model_router.rs` picks a model
//! tier from keyword families in the task's `responsibility` text.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::models::{Complexity, Specialization, TaskAnalysis, TaskType};

struct Family {
    patterns: Vec<Regex>,
}

impl Family {
    fn new(words: &[&str]) -> Self {
        let patterns = words
            .iter()
            .map(|w| Regex::new(&format!(r"(?i)\b{w}\b")).expect("static pattern is valid regex"))
            .collect();
        Self { patterns }
    }

    fn matches(&self, task: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(task))
    }
}

static SIMPLE_FAMILY: LazyLock<Family> =
    LazyLock::new(|| Family::new(&["fix", "typo", "rename", "small", "quick", "tweak", "simple"]));
static COMPLEX_FAMILY: LazyLock<Family> = LazyLock::new(|| {
    Family::new(&[
        "architecture",
        "redesign",
        "migrate",
        "migration",
        "overhaul",
        "rewrite",
        "system-wide",
        "end-to-end",
    ])
});
static ENUMERATED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.").expect("static pattern is valid regex"));
static PARALLELISM_WORDS: LazyLock<Family> = LazyLock::new(|| {
    Family::new(&["parallel", "concurrently", "simultaneously", "in tandem"])
});
static CHINESE_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*[个份批]").expect("static pattern is valid regex"));

fn specialization_family(spec: Specialization) -> &'static Family {
    static DATABASE: LazyLock<Family> =
        LazyLock::new(|| Family::new(&["database", "sql", "query", "schema", "migration", "postgres", "mysql"]));
    static FRONTEND: LazyLock<Family> =
        LazyLock::new(|| Family::new(&["frontend", "ui", "component", "react", "css", "button", "page"]));
    static BACKEND: LazyLock<Family> =
        LazyLock::new(|| Family::new(&["backend", "api", "endpoint", "server", "service", "route"]));
    static DEVOPS: LazyLock<Family> =
        LazyLock::new(|| Family::new(&["devops", "deploy", "docker", "kubernetes", "ci/cd", "pipeline", "infra"]));
    static SECURITY: LazyLock<Family> =
        LazyLock::new(|| Family::new(&["security", "auth", "vulnerability", "encrypt", "exploit", "credential"]));
    static PERFORMANCE: LazyLock<Family> =
        LazyLock::new(|| Family::new(&["performance", "latency", "optimi[sz]e", "benchmark", "throughput", "cache"]));

    match spec {
        Specialization::Database => &DATABASE,
        Specialization::Frontend => &FRONTEND,
        Specialization::Backend => &BACKEND,
        Specialization::Devops => &DEVOPS,
        Specialization::Security => &SECURITY,
        Specialization::Performance => &PERFORMANCE,
    }
}

fn task_type_family(t: TaskType) -> &'static Family {
    static REVIEW: LazyLock<Family> = LazyLock::new(|| Family::new(&["review", "audit", "critique"]));
    static SEARCH: LazyLock<Family> =
        LazyLock::new(|| Family::new(&["find", "search", "locate", "where is", "grep"]));
    static PLAN: LazyLock<Family> = LazyLock::new(|| Family::new(&["plan", "design", "outline", "roadmap"]));
    static TEST: LazyLock<Family> = LazyLock::new(|| Family::new(&["test", "verify", "validate", "qa"]));
    static DATA: LazyLock<Family> = LazyLock::new(|| Family::new(&["dataset", "csv", "etl", "data pipeline"]));
    static PPT: LazyLock<Family> = LazyLock::new(|| Family::new(&["slide", "presentation", "powerpoint", "deck"]));
    static DOCUMENT: LazyLock<Family> =
        LazyLock::new(|| Family::new(&["document", "docx", "report", "write-up", "readme"]));
    static IMAGE: LazyLock<Family> = LazyLock::new(|| Family::new(&["image", "screenshot", "diagram", "icon"]));
    static CODE: LazyLock<Family> = LazyLock::new(|| Family::new(&["implement", "code", "function", "bug", "feature"]));

    match t {
        TaskType::Review => &REVIEW,
        TaskType::Search => &SEARCH,
        TaskType::Plan => &PLAN,
        TaskType::Test => &TEST,
        TaskType::Data => &DATA,
        TaskType::Ppt => &PPT,
        TaskType::Document => &DOCUMENT,
        TaskType::Image => &IMAGE,
        TaskType::Code => &CODE,
    }
}

/// Pure classification entry point.
pub fn analyze(task: &str) -> TaskAnalysis {
    let enumerated_items = ENUMERATED_ITEM.find_iter(task).count();

    let mut complexity = if SIMPLE_FAMILY.matches(task) {
        Complexity::Simple
    } else {
        Complexity::Moderate
    };
    // Complex indicators override simple ones (§4.1 "ties" rule).
    if COMPLEX_FAMILY.matches(task) || task.len() > 500 || enumerated_items >= 3 {
        complexity = Complexity::Complex;
    }

    let specializations: BTreeSet<Specialization> = Specialization::ALL
        .into_iter()
        .filter(|s| specialization_family(*s).matches(task))
        .collect();

    let mut parallelism = (specializations.len() as u32).max(1);
    if PARALLELISM_WORDS.matches(task) {
        parallelism = parallelism.max(3);
    }
    if let Some(caps) = CHINESE_COUNT.captures(task) {
        if let Ok(n) = caps[1].parse::<u32>() {
            if n > 5 {
                parallelism = n.div_ceil(10).clamp(1, 10);
            }
        }
    }

    let mut estimated_steps = match complexity {
        Complexity::Simple => 3,
        Complexity::Moderate => 5,
        Complexity::Complex => 15,
    };
    estimated_steps = estimated_steps.max(enumerated_items as u32 * 3);

    let task_type = TaskType::PRIORITY
        .into_iter()
        .find(|t| task_type_family(*t).matches(task))
        .unwrap_or(TaskType::Code);

    let mut confidence = 0.5;
    if !specializations.is_empty() {
        confidence += 0.1 * specializations.len() as f64;
    }
    if SIMPLE_FAMILY.matches(task) || COMPLEX_FAMILY.matches(task) {
        confidence += 0.1;
    }
    let confidence = confidence.min(1.0);

    TaskAnalysis {
        complexity,
        specializations,
        parallelism,
        estimated_steps,
        task_type,
        confidence,
    }
}
