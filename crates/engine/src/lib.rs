//! ClimateCompass engine — the supervisor workflow runtime.
//!
//! Ties the graph executor, the supervisor and specialist nodes, the
//! intelligence modules, and the state store into the turn API:
//! [`Orchestrator::run_turn`] / [`Orchestrator::resume_turn`].

pub mod cancel;
pub mod cli;
pub mod events;
pub mod graph;
pub mod recovery;
pub mod review;
pub mod specialist;
pub mod supervisor;
pub mod turn;

pub use cancel::{CancelMap, CancelToken};
pub use events::{EventSink, TurnEvent};
pub use graph::{
    specialist_edge, supervisor_edge, AgentNode, EdgeTarget, GotoTarget, GraphExecutor,
    NodeContext, NodeResult, TurnOutcome, SUPERVISOR,
};
pub use review::{PendingReview, ReviewDecision, ReviewRequest, ReviewStore};
pub use specialist::{profiles_from_config, SpecialistNode, SpecialistProfile};
pub use supervisor::SupervisorNode;
pub use turn::{Orchestrator, OrchestratorBuilder, TurnResult};
