//! Shared domain types for ClimateCompass.
//!
//! Everything that crosses a crate boundary lives here: the conversation
//! state and its patch/merge rules, message records, the intelligence
//! assessment types (identity, routing, quality), the shared error enum,
//! and the immutable process-wide configuration.

pub mod assessment;
pub mod config;
pub mod error;
pub mod message;
pub mod state;

pub use assessment::{
    IdentityProfile, IntelligenceLevel, QualityMetrics, RoutingConfidence, RoutingDecision,
};
pub use error::{Error, Result};
pub use message::{Message, MessageMeta, Role, ToolCall, ToolDefinition};
pub use state::{
    ConversationState, CoordinationMetadata, ErrorRecord, HandoffRecord, ReflectionEntry,
    ResourceRecommendation, StatePatch, WorkflowState,
};
