use serde::{Deserialize, Serialize};

/// A single antenna ratio limit: a flat ceiling plus an optional
/// piecewise-linear table keyed by the diffusion-area reference value.
///
/// A limit is "diffusion dependent" when the PWL table is non-empty; the
/// flat value then acts as the default outside the table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RatioLimit {
    pub flat: f64,
    /// (reference value, ratio limit) pairs, sorted by reference value.
    pub diff_pwl: Vec<(f64, f64)>,
}

impl RatioLimit {
    pub fn flat(limit: f64) -> Self {
        Self {
            flat: limit,
            diff_pwl: Vec::new(),
        }
    }

    pub fn is_diff_dependent(&self) -> bool {
        !self.diff_pwl.is_empty()
    }

    /// Interpolate the ratio limit for `ref_val`, clamping to the table
    /// endpoints outside its domain. Falls back to `default` when the
    /// table is empty or degenerate.
    pub fn pwl_factor(&self, ref_val: f64, default: f64) -> f64 {
        if self.diff_pwl.is_empty() {
            return default;
        }
        let first = self.diff_pwl[0];
        let last = self.diff_pwl[self.diff_pwl.len() - 1];
        if ref_val <= first.0 {
            return first.1;
        }
        if ref_val >= last.0 {
            return last.1;
        }
        for pair in self.diff_pwl.windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            if ref_val >= x0 && ref_val <= x1 {
                if x1 == x0 {
                    return y0;
                }
                let slope = (y1 - y0) / (x1 - x0);
                return y0 + slope * (ref_val - x0);
            }
        }
        default
    }
}

/// Per-layer antenna rule: the four ratio limit tables plus the
/// diode reduction factor (ratio units recovered per square micron of
/// diode diffusion area, normalized by gate area downstream).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AntennaRule {
    pub level: usize,
    pub par: RatioLimit,
    pub psr: RatioLimit,
    pub car: RatioLimit,
    pub csr: RatioLimit,
    pub diode_reduction: f64,
}

impl AntennaRule {
    pub fn new(level: usize) -> Self {
        Self {
            level,
            par: RatioLimit::default(),
            psr: RatioLimit::default(),
            car: RatioLimit::default(),
            csr: RatioLimit::default(),
            diode_reduction: 0.0,
        }
    }

    pub fn with_par(mut self, limit: RatioLimit) -> Self {
        self.par = limit;
        self
    }

    pub fn with_psr(mut self, limit: RatioLimit) -> Self {
        self.psr = limit;
        self
    }

    pub fn with_car(mut self, limit: RatioLimit) -> Self {
        self.car = limit;
        self
    }

    pub fn with_csr(mut self, limit: RatioLimit) -> Self {
        self.csr = limit;
        self
    }

    pub fn with_diode_reduction(mut self, factor: f64) -> Self {
        self.diode_reduction = factor;
        self
    }
}

/// Antenna model attached to a master terminal: gate and diffusion areas
/// per routing level, in square microns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AntennaPinModel {
    pub gate_areas: Vec<(usize, f64)>,
    pub diff_areas: Vec<(usize, f64)>,
}

impl AntennaPinModel {
    /// Largest gate area across layers; zero when the pin drives no gate.
    pub fn max_gate_area(&self) -> f64 {
        self.gate_areas
            .iter()
            .map(|&(_, a)| a)
            .fold(0.0, f64::max)
    }

    /// Largest diffusion area across layers.
    pub fn max_diff_area(&self) -> f64 {
        self.diff_areas
            .iter()
            .map(|&(_, a)| a)
            .fold(0.0, f64::max)
    }

    pub fn is_gate(&self) -> bool {
        self.max_gate_area() > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pwl_interpolation() {
        let limit = RatioLimit {
            flat: 400.0,
            diff_pwl: vec![(0.0, 400.0), (1.0, 800.0)],
        };
        assert!((limit.pwl_factor(0.5, 400.0) - 600.0).abs() < 1e-9);
    }

    #[test]
    fn test_pwl_clamps_at_endpoints() {
        let limit = RatioLimit {
            flat: 400.0,
            diff_pwl: vec![(0.1, 400.0), (1.0, 800.0)],
        };
        assert!((limit.pwl_factor(-5.0, 0.0) - 400.0).abs() < 1e-9);
        assert!((limit.pwl_factor(99.0, 0.0) - 800.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_pwl_uses_default() {
        let limit = RatioLimit::flat(400.0);
        assert!(!limit.is_diff_dependent());
        assert!((limit.pwl_factor(0.5, 123.0) - 123.0).abs() < 1e-9);
    }

    #[test]
    fn test_pin_model_max_areas() {
        let model = AntennaPinModel {
            gate_areas: vec![(1, 0.3), (2, 0.7)],
            diff_areas: vec![],
        };
        assert!((model.max_gate_area() - 0.7).abs() < 1e-12);
        assert_eq!(model.max_diff_area(), 0.0);
        assert!(model.is_gate());
    }
}
