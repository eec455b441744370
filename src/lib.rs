//! Hybrid agent orchestration core: task routing, agent synthesis, DAG and
//! optimistic-claim swarm scheduling, and learning-guided failure recovery.
//!
//! This crate owns the decision logic only. Callers supply the actual agent
//! runner (`AgentExecutor`), event transport (`EventSink`), and solution
//! persistence (`SolutionStore`) behind the ports in `domain::ports`.

pub mod domain;
pub mod infrastructure;
pub mod services;

pub use domain::errors;
pub use domain::models;
pub use domain::ports;
