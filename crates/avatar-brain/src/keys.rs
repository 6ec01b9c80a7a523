//! Blackboard keys shared with the host.
//!
//! Inputs and outputs live in global scope. Working keys that only the tree reads live in the
//! tree's scope.

// Written by the host.
pub const IS_DRAGGING: &str = "isDragging";
pub const IS_CLICKED: &str = "isClicked";
pub const POINTER_POSITION: &str = "pointerPosition";
pub const LAST_USER_INPUT: &str = "lastUserInput";
pub const HAS_NEW_INPUT: &str = "hasNewInput";
pub const LLM_SETTINGS: &str = "llmSettings";
pub const PENGUIN_POSITION: &str = "penguinPosition";
pub const CHAT_HISTORY: &str = "chatHistory";
/// The animation the host is actually playing, which may lag behind `bt_output_action`.
pub const CURRENT_ACTION: &str = "currentAction";

// Mood, global so the host can display it.
pub const ENERGY: &str = "energy";
pub const BOREDOM: &str = "boredom";

// Tree scope.
pub const PENDING_ACTIONS: &str = "pendingActions";
pub const PENDING_EMOTION: &str = "pendingEmotion";
pub const LAST_LLM_RESULT: &str = "lastLLMResult";
pub const LAST_STATE_TICK: &str = "lastStateTick";

// Written by the tree.
pub const OUTPUT_ACTION: &str = "bt_output_action";
pub const OUTPUT_EXPRESSION: &str = "bt_output_expression";
pub const OUTPUT_POSITION: &str = "bt_output_position";
pub const OUTPUT_CHAT_MESSAGES: &str = "bt_output_chat_messages";

// Node-scope status keys of the two LLM leaves.
pub const LLM_STATUS: &str = "llm_status";
pub const PROACTIVE_LLM_STATUS: &str = "proactive_llm_status";
