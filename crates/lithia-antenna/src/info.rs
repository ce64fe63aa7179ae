use std::ops::AddAssign;

use lithia_core::design::ITermId;

/// Per-group accumulator for one routing level: raw areas, the derived
/// ratios, and the gate terminals contributing to the group. Reset per
/// net, per check pass.
#[derive(Debug, Clone, Default)]
pub struct LayerInfo {
    pub par: f64,
    pub psr: f64,
    pub diff_par: f64,
    pub diff_psr: f64,

    /// Wire conductor area on the level, square microns.
    pub area: f64,
    /// Perimeter (side) area contribution, square microns.
    pub side_area: f64,
    /// Via cut area feeding this group, square microns.
    pub via_area: f64,

    pub iterm_gate_area: f64,
    pub iterm_diff_area: f64,

    pub car: f64,
    pub csr: f64,
    pub diff_car: f64,
    pub diff_csr: f64,

    /// Gate terminals reachable below this group without crossing a
    /// segment root.
    pub iterms: Vec<ITermId>,
}

/// Folds a lower group's conductor contribution into a cumulative
/// accumulator. Gate/diffusion areas and the cumulative ratios are
/// per-group and never merged.
impl AddAssign<&LayerInfo> for LayerInfo {
    fn add_assign(&mut self, other: &LayerInfo) {
        self.par += other.par;
        self.psr += other.psr;
        self.diff_par += other.diff_par;
        self.diff_psr += other.diff_psr;
        self.area += other.area;
        self.side_area += other.side_area;
        self.via_area += other.via_area;
    }
}

/// A single antenna violation on one routing level of a net.
///
/// Immutable once emitted to the orchestrator; `diode_count_per_gate` is
/// zero when no diode cell was supplied at check time (the repair engine
/// then records a repair failure for it).
#[derive(Debug, Clone)]
pub struct Violation {
    pub routing_level: usize,
    /// Distinct offending gate terminals at this level.
    pub gates: Vec<ITermId>,
    pub diode_count_per_gate: usize,
    /// Worst achieved-ratio / limit factor across the failed checks;
    /// consumed by jumper sizing.
    pub ratio: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulator_merge() {
        let mut a = LayerInfo {
            par: 1.0,
            area: 10.0,
            side_area: 4.0,
            ..Default::default()
        };
        let b = LayerInfo {
            par: 0.5,
            area: 2.0,
            side_area: 1.0,
            via_area: 3.0,
            iterm_gate_area: 7.0,
            ..Default::default()
        };
        a += &b;
        assert!((a.par - 1.5).abs() < 1e-12);
        assert!((a.area - 12.0).abs() < 1e-12);
        assert!((a.side_area - 5.0).abs() < 1e-12);
        assert!((a.via_area - 3.0).abs() < 1e-12);
        // gate contributions are per-group, not merged
        assert_eq!(a.iterm_gate_area, 0.0);
    }
}
