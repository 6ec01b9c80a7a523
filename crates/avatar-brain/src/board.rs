//! Shorthand for the global and tree scoped reads every domain leaf does.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use avatar_bt::Tick;
use avatar_core::Scope;

use crate::keys;
use crate::types::ChatMessage;

pub(crate) fn global<'t>(tick: &'t Tick<'_>, key: &str) -> Option<&'t Value> {
    tick.blackboard().get(key, Scope::Global)
}

pub(crate) fn global_bool(tick: &Tick<'_>, key: &str) -> bool {
    tick.blackboard().get_bool(key, Scope::Global)
}

pub(crate) fn global_f64(tick: &Tick<'_>, key: &str) -> Option<f64> {
    tick.blackboard().get_f64(key, Scope::Global)
}

pub(crate) fn global_str<'t>(tick: &'t Tick<'_>, key: &str) -> Option<&'t str> {
    tick.blackboard().get_str(key, Scope::Global)
}

pub(crate) fn global_as<T: DeserializeOwned>(tick: &Tick<'_>, key: &str) -> Option<T> {
    tick.blackboard().get_as(key, Scope::Global)
}

pub(crate) fn set_global(tick: &mut Tick<'_>, key: &str, value: impl Into<Value>) {
    tick.blackboard_mut().set(key, value, Scope::Global);
}

pub(crate) fn tree_as<T: DeserializeOwned>(tick: &Tick<'_>, key: &str) -> Option<T> {
    tick.blackboard().get_as(key, tick.tree_scope())
}

pub(crate) fn set_tree(tick: &mut Tick<'_>, key: &str, value: impl Into<Value>) {
    let scope = tick.tree_scope();
    tick.blackboard_mut().set(key, value, scope);
}

pub(crate) fn set_tree_as<T: Serialize>(
    tick: &mut Tick<'_>,
    key: &str,
    value: &T,
) -> Result<(), serde_json::Error> {
    let scope = tick.tree_scope();
    tick.blackboard_mut().set_as(key, value, scope)
}

/// Queues a chat record for the host to append to its history.
pub(crate) fn push_chat(tick: &mut Tick<'_>, message: ChatMessage) {
    let mut outbox: Vec<Value> = global_as(tick, keys::OUTPUT_CHAT_MESSAGES).unwrap_or_default();
    match serde_json::to_value(&message) {
        Ok(value) => outbox.push(value),
        Err(err) => {
            tracing::warn!(error = %err, "dropping unserializable chat message");
            return;
        }
    }
    set_global(tick, keys::OUTPUT_CHAT_MESSAGES, outbox);
}
