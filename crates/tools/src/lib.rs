//! Tools consumed by the supervisor loop: the registry that builds tool
//! definitions and dispatches calls, the delegation tools that trigger
//! specialist handoffs, the best-effort resource search, and the
//! fire-and-forget analytics sink.

pub mod analytics;
pub mod delegation;
pub mod registry;
pub mod resource_search;

pub use analytics::{AnalyticsSink, TracingSink};
pub use delegation::{delegation_target, delegation_tools, DelegationTool};
pub use registry::{Tool, ToolCommand, ToolOutcome, ToolRegistry};
pub use resource_search::{ResourceSearch, StaticResourceSearch};
