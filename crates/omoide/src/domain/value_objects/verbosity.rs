//! Verbosity bands
//!
//! The verbosity ratio (0-100) selects one of five fixed response-length instructions.

use serde::{Deserialize, Serialize};

/// Response length band derived from a persona's verbosity ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerbosityBand {
    /// 0-20
    Terse,
    /// 21-40
    Brief,
    /// 41-60
    Moderate,
    /// 61-80
    Elaborate,
    /// 81-100
    Detailed,
}

impl VerbosityBand {
    /// Pick the band for a ratio. Ratios above 100 are treated as 100.
    pub fn from_ratio(ratio: u8) -> Self {
        match ratio.min(100) {
            0..=20 => Self::Terse,
            21..=40 => Self::Brief,
            41..=60 => Self::Moderate,
            61..=80 => Self::Elaborate,
            _ => Self::Detailed,
        }
    }

    /// Fixed instruction text for the band
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::Terse => "Reply in exactly one sentence. Be as terse as possible.",
            Self::Brief => "Reply in 2-3 sentences.",
            Self::Moderate => "Reply in 3-5 sentences.",
            Self::Elaborate => "Reply in 5-8 sentences.",
            Self::Detailed => "Reply in 8 or more sentences with rich, specific detail.",
        }
    }
}
