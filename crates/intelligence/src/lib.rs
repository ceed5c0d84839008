//! Deterministic per-turn intelligence: identity recognition, specialist
//! routing, response quality scoring, completion detection, human-loop
//! evaluation, and per-session performance tracking.
//!
//! Every component is a pure function of its inputs and the immutable
//! startup configuration — reproducible on replay, no I/O, no clocks.

pub mod completion;
pub mod human_loop;
pub mod identity;
pub mod performance;
pub mod quality;
pub mod routing;

pub use completion::{CompletionChecker, CompletionStatus, RecommendedAction};
pub use human_loop::{HumanLoopCoordinator, InterventionAssessment, ReviewPriority};
pub use identity::IdentityRecognizer;
pub use performance::{NextAction, PerformanceTracker, SessionSnapshot};
pub use quality::QualityAnalyzer;
pub use routing::RoutingEngine;
