//! Engine-agnostic primitives shared by the avatar behavior tree crates.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod blackboard;
pub mod clock;
pub mod id;
pub mod keys;
pub mod spawn;
pub mod status;

pub use blackboard::{BbKey, Blackboard, Scope};
pub use clock::{Clock, ManualClock, SystemClock};
pub use id::{NodeId, TreeId};
pub use spawn::TokioSpawner;
pub use status::Status;
