use serde::{Deserialize, Serialize};

/// Result of ticking a node.
///
/// The integer codes are stable; they are what `StatusToBlackboard` writes into the
/// [`Blackboard`](crate::Blackboard) and what the tree stores under `nodeStatuses`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Status {
    Success = 1,
    Failure = 2,
    Running = 3,
    Error = 4,
}

impl Status {
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Status::Success),
            2 => Some(Status::Failure),
            3 => Some(Status::Running),
            4 => Some(Status::Error),
            _ => None,
        }
    }

    pub const fn is_running(self) -> bool {
        matches!(self, Status::Running)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::Failure => "failure",
            Status::Running => "running",
            Status::Error => "error",
        }
    }
}

impl From<Status> for u8 {
    fn from(status: Status) -> Self {
        status.code()
    }
}

impl TryFrom<u8> for Status {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, String> {
        Status::from_code(code).ok_or_else(|| format!("unknown status code {code}"))
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
