//! Application services: the orchestration core's business logic, each
//! grounded on one [MODULE] of the specification.

pub mod agent_factory;
pub mod coordinator;
pub mod core_roles;
pub mod error_classifier;
pub mod learning_strategy;
pub mod recovery_engine;
pub mod recovery_learner;
pub mod resource_lock_manager;
pub mod scheduler;
pub mod task_analyzer;
pub mod task_claim_service;
pub mod task_router;

pub use agent_factory::{AgentFactory, FactoryContext};
pub use coordinator::{Coordinator, ResourceConflict};
pub use error_classifier::ErrorClassifier;
pub use learning_strategy::LearningStrategy;
pub use recovery_engine::RecoveryEngine;
pub use recovery_learner::RecoveryLearner;
pub use resource_lock_manager::ResourceLockManager;
pub use scheduler::{CancellationToken, SwarmScheduler};
pub use task_claim_service::TaskClaimService;
pub use task_router::TaskRouter;
