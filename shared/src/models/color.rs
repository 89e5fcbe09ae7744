//! Apple colors

use rand::Rng;
use serde::{Deserialize, Serialize};

/// The fixed palette an apple can be grown in.
///
/// Colors are persisted and serialized by their hex code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AppleColor {
    #[serde(rename = "#FF0000")]
    Red,
    #[serde(rename = "#00FF00")]
    Green,
    #[serde(rename = "#0000FF")]
    Blue,
    #[serde(rename = "#FFFF00")]
    Yellow,
    #[serde(rename = "#FFA500")]
    Orange,
    #[serde(rename = "#800080")]
    Purple,
    #[serde(rename = "#A52A2A")]
    Brown,
    #[serde(rename = "#FFC0CB")]
    Pink,
    #[serde(rename = "#FFFFFF")]
    White,
    #[serde(rename = "#000000")]
    Black,
}

impl AppleColor {
    pub const ALL: [AppleColor; 10] = [
        AppleColor::Red,
        AppleColor::Green,
        AppleColor::Blue,
        AppleColor::Yellow,
        AppleColor::Orange,
        AppleColor::Purple,
        AppleColor::Brown,
        AppleColor::Pink,
        AppleColor::White,
        AppleColor::Black,
    ];

    /// Hex code used for storage and on the wire
    pub fn hex(&self) -> &'static str {
        match self {
            AppleColor::Red => "#FF0000",
            AppleColor::Green => "#00FF00",
            AppleColor::Blue => "#0000FF",
            AppleColor::Yellow => "#FFFF00",
            AppleColor::Orange => "#FFA500",
            AppleColor::Purple => "#800080",
            AppleColor::Brown => "#A52A2A",
            AppleColor::Pink => "#FFC0CB",
            AppleColor::White => "#FFFFFF",
            AppleColor::Black => "#000000",
        }
    }

    /// Parse a stored hex code (case-insensitive)
    pub fn from_hex(hex: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|color| color.hex().eq_ignore_ascii_case(hex.trim()))
    }

    /// Pick a color uniformly at random
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

impl std::fmt::Display for AppleColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppleColor::Red => write!(f, "Red"),
            AppleColor::Green => write!(f, "Green"),
            AppleColor::Blue => write!(f, "Blue"),
            AppleColor::Yellow => write!(f, "Yellow"),
            AppleColor::Orange => write!(f, "Orange"),
            AppleColor::Purple => write!(f, "Purple"),
            AppleColor::Brown => write!(f, "Brown"),
            AppleColor::Pink => write!(f, "Pink"),
            AppleColor::White => write!(f, "White"),
            AppleColor::Black => write!(f, "Black"),
        }
    }
}
