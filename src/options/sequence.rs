use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::align::kabsch::{
    KabschSolver, DEFAULT_MIN_PAIRS, DEFAULT_POWER_ITERATIONS, DEFAULT_SEED,
};
use crate::align::normalize::DEFAULT_SCALE_CAP;

/// What to do with atoms the topological correspondence left unmatched
/// when a transition maps slots between two entries.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum SlotFallback {
    /// Pair an unmatched atom `i` with target atom `i` when that index exists
    /// and is still free, regardless of element.
    #[default]
    RawIndex,
    /// Leave unmatched atoms unmatched; they fade out and the target atoms
    /// fade in.
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Sequence", inline)]
#[serde(default)]
/// Sequence building: alignment and normalization parameters.
pub struct SequenceOptions {
    /// Largest bounding-box dimension after normalization.
    #[schemars(title = "Scale Cap", range(min = 0.1, max = 10.0), extend("step" = 0.1))]
    pub scale_cap: f32,
    /// Matched pairs required before a rigid fit is attempted.
    #[schemars(title = "Minimum Alignment Pairs", range(min = 1, max = 16))]
    pub min_alignment_pairs: usize,
    /// Fallback for atoms without a topological partner.
    #[schemars(title = "Slot Fallback")]
    pub slot_fallback: SlotFallback,
    /// Power iterations per eigenvector.
    #[schemars(skip)]
    pub power_iterations: usize,
    /// Seed for the power-iteration start vectors.
    #[schemars(skip)]
    pub seed: u64,
}

impl Default for SequenceOptions {
    fn default() -> Self {
        Self {
            scale_cap: DEFAULT_SCALE_CAP,
            min_alignment_pairs: DEFAULT_MIN_PAIRS,
            slot_fallback: SlotFallback::RawIndex,
            power_iterations: DEFAULT_POWER_ITERATIONS,
            seed: DEFAULT_SEED,
        }
    }
}

impl SequenceOptions {
    /// Kabsch solver configured from these options.
    #[must_use]
    pub fn solver(&self) -> KabschSolver {
        KabschSolver {
            min_pairs: self.min_alignment_pairs,
            iterations: self.power_iterations,
            seed: self.seed,
        }
    }
}
