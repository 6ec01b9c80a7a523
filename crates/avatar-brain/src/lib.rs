//! The penguin's brain.
//!
//! Domain leaves for the behavior tree (animation, motion, mood and LLM-driven commands), the
//! tree that wires them together, and [`AvatarBrain`], the adapter a host calls once per frame.
//! Everything talks to the host through well-known blackboard keys (see [`keys`]); nothing here
//! knows how the avatar is rendered.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

mod board;

pub mod animation;
pub mod brain;
pub mod config;
pub mod conversation;
pub mod keys;
pub mod llm;
pub mod mood;
pub mod motion;
pub mod penguin;
pub mod types;

pub use animation::{ExecuteActionSequence, PlayAnimationAction, PlayExpressionAction};
pub use brain::{AvatarBrain, FrameOutput};
pub use config::{BrainConfig, MoodConfig, MotionConfig};
pub use conversation::{
    DropCommandNode, FunctionExecNode, LlmCall, LlmCallNode, ProactiveLlm, ProactiveLlmNode,
};
pub use llm::{KeywordLlm, LlmClient, LlmError, SharedLlm};
pub use mood::UpdateInternalStatesAction;
pub use motion::{FollowPointerNode, MoveTarget, MoveToTargetAction, ReturnToOriginAction};
pub use penguin::{build_penguin_tree, penguin_registry, register_brain_nodes, BrainDeps};
pub use types::{
    ChatMessage, LlmProvider, LlmResponse, LlmSettings, PointerPosition, Role, ToolResult, Vec3,
};
