//! Ports: traits the domain/services depend on, implemented by callers.

pub mod event_sink;
pub mod executor;
pub mod profiler;
pub mod solution_store;

pub use event_sink::{EventSink, NullEventSink, SwarmEvent};
pub use executor::{AgentExecutor, ExecutorOutcome};
pub use profiler::{Profiler, ProfilerRecommendation};
pub use solution_store::{NullSolutionStore, SolutionStore};
