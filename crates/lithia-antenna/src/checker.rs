use std::collections::{HashMap, HashSet};

use lithia_core::design::{Design, ITermId, MasterId, NetId};
use lithia_core::tech::{AntennaRule, RatioLimit};

use crate::error::AntennaError;
use crate::graph::{NodeId, WireGraph};
use crate::info::{LayerInfo, Violation};

/// Hard cap on diodes prescribed for a single gate.
pub const MAX_DIODE_COUNT_PER_GATE: usize = 10;

/// Reference to a diode master terminal used for repair sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiodeRef {
    pub master: MasterId,
    pub mterm: usize,
}

/// One ratio-accumulation group: a maximal same-level wire component
/// anchored at its traversal seed (a segment root, or the via entry
/// node of a component fed from below).
#[derive(Debug)]
struct Group {
    root: NodeId,
    level: usize,
    info: LayerInfo,
}

/// Per-design antenna checker. Holds only read access to the design;
/// safe to run over many nets in parallel.
pub struct AntennaChecker<'d> {
    design: &'d Design,
}

impl<'d> AntennaChecker<'d> {
    pub fn new(design: &'d Design) -> Self {
        Self { design }
    }

    /// Check one net, or every net, and return the number of violated
    /// nets. Diode sizing is skipped; this is the pure reporting entry.
    pub fn check_antennas(&self, net: Option<NetId>) -> Result<usize, AntennaError> {
        let nets: Vec<NetId> = match net {
            Some(id) => vec![id],
            None => self.design.all_nets().map(|(id, _)| id).collect(),
        };

        let mut net_violation_count = 0;
        let mut pin_violation_count = 0;
        for id in nets {
            let violations = self.get_antenna_violations(id, None, 0.0)?;
            if !violations.is_empty() {
                net_violation_count += 1;
                pin_violation_count += violations.iter().map(|v| v.gates.len()).sum::<usize>();
            }
        }
        log::info!(
            "found {} net antenna violations, {} pin violations",
            net_violation_count,
            pin_violation_count
        );
        Ok(net_violation_count)
    }

    /// Full evaluation of one net: graph walk, PAR/PSR/CAR/CSR
    /// accumulation, rule comparison, and diode-count sizing.
    ///
    /// `ratio_margin` is a percentage that tightens every limit, leaving
    /// slack for later routing changes.
    pub fn get_antenna_violations(
        &self,
        net: NetId,
        diode: Option<DiodeRef>,
        ratio_margin: f64,
    ) -> Result<Vec<Violation>, AntennaError> {
        if self.design.net(net).special || !self.design.net(net).has_route() {
            return Ok(Vec::new());
        }
        let graph = WireGraph::build(self.design, net)?;
        let groups = self.build_groups(&graph)?;
        self.evaluate_groups(&groups, diode, ratio_margin)
    }

    // ── Group construction (wire graph walker output) ────────────────

    fn build_groups(&self, graph: &WireGraph) -> Result<Vec<Group>, AntennaError> {
        let mut groups: Vec<Group> = Vec::new();
        let seeds = graph.group_seeds();

        for level in graph.wire_levels() {
            let layer = self
                .design
                .layer_stack
                .routing_layer(level)
                .ok_or(AntennaError::UnknownLayer(level))?;
            let width = self.design.dbu_to_microns(layer.width);

            let mut component_visited: HashSet<NodeId> = HashSet::new();
            let mut iterm_visited: HashSet<ITermId> = HashSet::new();
            let mut below_visited: HashSet<NodeId> = HashSet::new();

            for &root in seeds.iter().filter(|&&r| graph.nodes[r].level == level) {
                if component_visited.contains(&root) {
                    continue;
                }
                let (nodes, wires, up_vias) =
                    graph.same_level_component(root, &mut component_visited);

                let mut info = LayerInfo::default();
                for &eid in &wires {
                    let edge = &graph.edges[eid];
                    let length = self.design.dbu_to_microns(
                        graph.nodes[edge.a]
                            .point
                            .manhattan_distance(&graph.nodes[edge.b].point),
                    );
                    info.area += width * length;
                    info.side_area += 2.0 * (width + length);
                }
                if !up_vias.is_empty() {
                    // via arrays get no special casing beyond area summation
                    let via = self
                        .design
                        .layer_stack
                        .default_via(level)
                        .ok_or(AntennaError::UnknownLayer(level))?;
                    let cut_area = self.design.dbu_area_to_sq_microns(via.cut_area_dbu());
                    info.via_area += cut_area * up_vias.len() as f64;
                }

                let (gate_area, diff_area, gates) = graph.find_wire_below_iterms(
                    self.design,
                    &nodes,
                    level,
                    &mut iterm_visited,
                    &mut below_visited,
                );
                info.iterm_gate_area = gate_area;
                info.iterm_diff_area = diff_area;
                info.iterms = gates;

                if gate_area > 0.0 {
                    info.par = info.area / gate_area;
                    info.psr = info.side_area / gate_area;
                    info.diff_par = info.area / (gate_area + diff_area);
                    info.diff_psr = info.side_area / (gate_area + diff_area);
                }

                groups.push(Group { root, level, info });
            }
        }

        self.accumulate_cumulative_ratios(graph, &mut groups);
        Ok(groups)
    }

    /// CAR/CSR: fold the conductor area of every lower-level group
    /// electrically below a group into its cumulative ratios. The CAR
    /// path search disambiguates which via stack feeds which group.
    fn accumulate_cumulative_ratios(&self, graph: &WireGraph, groups: &mut Vec<Group>) {
        let contributions: Vec<LayerInfo> = groups
            .iter()
            .map(|g| {
                let mut folded = g.info.clone();
                for lower in groups.iter().filter(|l| l.level < g.level) {
                    if graph.find_car_path(lower.root, g.level, g.root).is_some() {
                        folded += &lower.info;
                    }
                }
                folded
            })
            .collect();

        for (g, folded) in groups.iter_mut().zip(contributions) {
            let gate = g.info.iterm_gate_area;
            if gate > 0.0 {
                let diff = g.info.iterm_diff_area;
                let cum_area = folded.area + folded.via_area;
                g.info.car = cum_area / gate;
                g.info.csr = folded.side_area / gate;
                g.info.diff_car = cum_area / (gate + diff);
                g.info.diff_csr = folded.side_area / (gate + diff);
            }
        }
    }

    // ── Rule evaluation ───────────────────────────────────────────────

    fn evaluate_groups(
        &self,
        groups: &[Group],
        diode: Option<DiodeRef>,
        ratio_margin: f64,
    ) -> Result<Vec<Violation>, AntennaError> {
        // per-level aggregation: gates, worst excess factor, diode count
        let mut by_level: HashMap<usize, (Vec<ITermId>, f64, usize)> = HashMap::new();

        for group in groups {
            if group.info.iterms.is_empty() {
                continue;
            }
            let Some(rule) = self.design.antenna_rule(group.level) else {
                continue;
            };

            let info = &group.info;
            let checks = [
                (&rule.par, info.par, info.diff_par),
                (&rule.psr, info.psr, info.diff_psr),
                (&rule.car, info.car, info.diff_car),
                (&rule.csr, info.csr, info.diff_csr),
            ];

            let mut worst: Option<(f64, f64)> = None; // (achieved, limit)
            for (limit, ratio, diff_ratio) in checks {
                if let Some(hit) =
                    check_ratio(limit, ratio, diff_ratio, info.iterm_diff_area, ratio_margin)
                {
                    let factor = hit.0 / hit.1;
                    if worst.map_or(true, |(a, l)| factor > a / l) {
                        worst = Some(hit);
                    }
                }
            }

            if let Some((achieved, limit)) = worst {
                let count = self.required_diode_count(
                    rule,
                    achieved - limit,
                    info.iterm_gate_area,
                    diode,
                );
                let entry = by_level
                    .entry(group.level)
                    .or_insert_with(|| (Vec::new(), 0.0, 0));
                for &gate in &info.iterms {
                    if !entry.0.contains(&gate) {
                        entry.0.push(gate);
                    }
                }
                entry.1 = entry.1.max(achieved / limit);
                entry.2 = entry.2.max(count);
            }
        }

        let mut violations: Vec<Violation> = by_level
            .into_iter()
            .map(|(level, (gates, ratio, count))| Violation {
                routing_level: level,
                gates,
                diode_count_per_gate: count,
                ratio,
            })
            .collect();
        violations.sort_by_key(|v| v.routing_level);
        Ok(violations)
    }

    /// Diodes needed to absorb `excess` ratio units at this gate area.
    /// Zero when no diode cell is available (repair then records a
    /// failure for the violation).
    fn required_diode_count(
        &self,
        rule: &AntennaRule,
        excess: f64,
        gate_area: f64,
        diode: Option<DiodeRef>,
    ) -> usize {
        let Some(diode) = diode else {
            return 0;
        };
        if gate_area <= 0.0 || rule.diode_reduction <= 0.0 {
            return 0;
        }
        let diode_diff = self.design.master(diode.master).mterms[diode.mterm]
            .pin_model
            .max_diff_area();
        let per_diode = diode_diff * rule.diode_reduction / gate_area;
        if per_diode <= 0.0 {
            return 0;
        }
        ((excess / per_diode).ceil() as usize)
            .max(1)
            .min(MAX_DIODE_COUNT_PER_GATE)
    }
}

/// Compare one ratio against its limit table. Diff-dependent rules use
/// the PWL table keyed by diffusion area and the diffusion-normalized
/// ratio; flat rules compare the plain ratio. Returns (achieved, limit)
/// on violation.
fn check_ratio(
    limit: &RatioLimit,
    ratio: f64,
    diff_ratio: f64,
    diff_area: f64,
    ratio_margin: f64,
) -> Option<(f64, f64)> {
    let margin_scale = 1.0 - ratio_margin / 100.0;
    if limit.is_diff_dependent() {
        let lim = limit.pwl_factor(diff_area, limit.flat) * margin_scale;
        if lim > 0.0 && diff_ratio > lim {
            return Some((diff_ratio, lim));
        }
    } else {
        let lim = limit.flat * margin_scale;
        if lim > 0.0 && ratio > lim {
            return Some((ratio, lim));
        }
    }
    None
}
