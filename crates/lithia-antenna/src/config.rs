use serde::{Deserialize, Serialize};

/// Tunable knobs of the repair engines.
///
/// The jumper sizing factors are empirically tuned; validate repairs by
/// re-checking the ratio rather than by exact tile counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairConfig {
    /// Percentage by which every ratio limit is tightened at check time,
    /// leaving slack for later routing changes.
    pub ratio_margin: f64,
    /// Bound on the diode legalization search; guarantees termination.
    pub max_legalize_iterations: usize,
    /// Fraction of the naive required cut length actually used, to avoid
    /// over-cutting.
    pub jumper_scale: f64,
    /// Additional shrink applied when both segment ends carry gates.
    pub jumper_split_scale: f64,
    /// Legalizer padding around placed cells, in sites.
    pub pad_left: i64,
    pub pad_right: i64,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            ratio_margin: 0.0,
            max_legalize_iterations: 50,
            jumper_scale: 0.8,
            jumper_split_scale: 0.15,
            pad_left: 0,
            pad_right: 0,
        }
    }
}
