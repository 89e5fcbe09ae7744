//! Apple lifecycle status

use serde::{Deserialize, Serialize};

/// Where an apple is in its lifecycle.
///
/// Progression is monotonic: `OnTree` -> `OnGround` -> `Rotten`. The derived
/// ordering follows that progression.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AppleStatus {
    OnTree,
    OnGround,
    Rotten,
}

impl AppleStatus {
    pub const ALL: [AppleStatus; 3] = [
        AppleStatus::OnTree,
        AppleStatus::OnGround,
        AppleStatus::Rotten,
    ];

    /// Numeric code stored in the `status` column
    pub fn code(&self) -> i16 {
        match self {
            AppleStatus::OnTree => 1,
            AppleStatus::OnGround => 2,
            AppleStatus::Rotten => 3,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(AppleStatus::OnTree),
            2 => Some(AppleStatus::OnGround),
            3 => Some(AppleStatus::Rotten),
            _ => None,
        }
    }
}

impl std::fmt::Display for AppleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppleStatus::OnTree => write!(f, "On tree"),
            AppleStatus::OnGround => write!(f, "On ground"),
            AppleStatus::Rotten => write!(f, "Rotten"),
        }
    }
}
