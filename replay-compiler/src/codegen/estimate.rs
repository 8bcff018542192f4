//! Runtime Estimation
//!
//! Heuristic replay duration from a fixed cost per interaction kind plus a
//! per-character typing cost. An estimate, never a measurement.

use crate::trace::{Interaction, InteractionTrace};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const NAVIGATION_COST_MS: u64 = 3_000;
pub const CLICK_COST_MS: u64 = 500;
pub const SCROLL_COST_MS: u64 = 300;
/// Cost of a recorded explicit wait
pub const WAIT_COST_MS: u64 = 2_000;
/// Cost of every other kind
pub const DEFAULT_COST_MS: u64 = 200;
pub const TYPE_COST_PER_CHAR_MS: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeEstimate {
    pub total_ms: u64,
    /// `total_ms` in whole seconds, rounded up
    pub seconds: u64,
}

impl fmt::Display for RuntimeEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "~{}s (estimate)", self.seconds)
    }
}

/// Cost of a single interaction
pub fn interaction_cost_ms(interaction: &Interaction) -> u64 {
    match interaction {
        Interaction::Navigation(_) => NAVIGATION_COST_MS,
        Interaction::Click(_) => CLICK_COST_MS,
        Interaction::Scroll(_) => SCROLL_COST_MS,
        Interaction::Type(typed) => TYPE_COST_PER_CHAR_MS * typed.text().chars().count() as u64,
        Interaction::Unknown(unknown) if unknown.kind == "wait" => WAIT_COST_MS,
        Interaction::Submit(_) | Interaction::KeyPress(_) | Interaction::Unknown(_) => DEFAULT_COST_MS,
    }
}

/// Estimate how long a replay of `trace` takes
pub fn estimate_runtime(trace: &InteractionTrace) -> RuntimeEstimate {
    let total_ms: u64 = trace.iter().map(interaction_cost_ms).sum();
    RuntimeEstimate {
        total_ms,
        seconds: total_ms.div_ceil(1000),
    }
}
