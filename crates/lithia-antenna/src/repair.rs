use std::collections::BTreeMap;

use rayon::prelude::*;

use lithia_core::design::{
    Design, ITermId, InstanceId, MasterType, NetId, Orient, PlacementStatus,
};
use lithia_core::geometry::{Point, Rect};
use lithia_core::spatial::ObstacleIndex;

use crate::checker::{AntennaChecker, DiodeRef};
use crate::config::RepairConfig;
use crate::error::AntennaError;
use crate::info::Violation;

/// Seam to the external detailed-placement legalizer, invoked after
/// repair to settle diodes that could not be placed legally.
pub trait PlacementLegalizer {
    fn detailed_placement(&mut self, design: &mut Design);
}

/// Aggregate result of one diode repair pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct RepairOutcome {
    pub diode_count: usize,
    pub illegal_placement_count: usize,
}

/// Orchestrates antenna checking and repair across the nets of a design.
///
/// Checking runs in parallel per net; repair is serialized because one
/// net's diode placement constrains spatial legality for the next.
pub struct AntennaRepair {
    pub(crate) violations: BTreeMap<NetId, Vec<Violation>>,
    pub(crate) config: RepairConfig,
    diode_insts: Vec<InstanceId>,
    unique_diode_index: usize,
    illegal_diode_placement_count: usize,
}

impl AntennaRepair {
    pub fn new(design: &Design, config: RepairConfig) -> Self {
        // skip diode names already present in the design
        let mut unique_diode_index = 1;
        while design
            .find_instance_by_name(&format!("ANTENNA_{unique_diode_index}"))
            .is_some()
        {
            unique_diode_index += 1;
        }
        Self {
            violations: BTreeMap::new(),
            config,
            diode_insts: Vec::new(),
            unique_diode_index,
            illegal_diode_placement_count: 0,
        }
    }

    pub fn violations(&self) -> &BTreeMap<NetId, Vec<Violation>> {
        &self.violations
    }

    /// Check `nets_to_repair` in parallel and collect their violations.
    /// The merge into the shared map is single-threaded, and nets with
    /// zero violations are never entered into it. Returns whether any
    /// violations were found.
    pub fn check_antenna_violations(
        &mut self,
        design: &Design,
        nets_to_repair: &[NetId],
        diode: Option<DiodeRef>,
    ) -> Result<bool, AntennaError> {
        let ratio_margin = self.config.ratio_margin;
        let results: Vec<(NetId, Result<Vec<Violation>, AntennaError>)> = nets_to_repair
            .par_iter()
            .map(|&net| {
                let checker = AntennaChecker::new(design);
                (net, checker.get_antenna_violations(net, diode, ratio_margin))
            })
            .collect();

        let mut first_error = None;
        for (net, result) in results {
            match result {
                Ok(violations) if !violations.is_empty() => {
                    log::debug!("antenna violations on net {}", design.net(net).name);
                    self.violations.insert(net, violations);
                }
                Ok(_) => {}
                Err(e) => {
                    log::warn!("antenna check failed for net {}: {e}", design.net(net).name);
                    first_error.get_or_insert(e);
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        log::info!("found {} antenna violations", self.violations.len());
        Ok(!self.violations.is_empty())
    }

    /// The diode master terminal to repair with: an ANTENNACELL master
    /// with positive diffusion area.
    pub fn find_diode_mterm(design: &Design) -> Result<DiodeRef, AntennaError> {
        for (master_id, master) in design.all_masters() {
            if master.master_type != MasterType::AntennaCell {
                continue;
            }
            for (mterm_idx, mterm) in master.mterms.iter().enumerate() {
                if mterm.pin_model.max_diff_area() > 0.0 {
                    return Ok(DiodeRef {
                        master: master_id,
                        mterm: mterm_idx,
                    });
                }
            }
        }
        Err(AntennaError::MissingDiodeCell)
    }

    /// Insert and legalize protection diodes for every recorded
    /// violation. Exhausted legalization attempts still leave the diode
    /// placed (at the last tried offset) and are counted, not undone.
    pub fn repair_antennas(
        &mut self,
        design: &mut Design,
        diode: DiodeRef,
    ) -> Result<RepairOutcome, AntennaError> {
        let site_width = design.site_width().unwrap_or_else(|| {
            design.master(diode.master).width
        });

        self.illegal_diode_placement_count = 0;
        self.diode_insts.clear();

        self.set_insts_placement_status(design, PlacementStatus::Firm);
        let mut fixed_insts = Self::fixed_instances(design);

        let work: Vec<(NetId, Vec<Violation>)> = self
            .violations
            .iter()
            .map(|(&net, v)| (net, v.clone()))
            .collect();

        let mut repair_failures = false;
        for (net, violations) in work {
            let mut inserted_diodes = false;
            for violation in &violations {
                log::debug!(
                    "net {}: inserting {} diodes",
                    design.net(net).name,
                    violation.diode_count_per_gate * violation.gates.len()
                );
                if violation.diode_count_per_gate > 0 {
                    for &gate in &violation.gates {
                        for _ in 0..violation.diode_count_per_gate {
                            self.insert_diode(
                                design,
                                net,
                                diode,
                                gate,
                                site_width,
                                violation.routing_level,
                                &mut fixed_insts,
                            )?;
                            inserted_diodes = true;
                        }
                    }
                } else {
                    repair_failures = true;
                }
            }
            if inserted_diodes {
                design.mark_dirty(net);
            }
        }
        if repair_failures {
            log::warn!("unable to repair antennas on net with diodes");
        }

        Ok(RepairOutcome {
            diode_count: self.diode_insts.len(),
            illegal_placement_count: self.illegal_diode_placement_count,
        })
    }

    /// Run the external legalizer, then relax everything this pass
    /// pinned: diodes and violated instances no longer need to be FIRM.
    pub fn legalize_placed_cells(
        &mut self,
        design: &mut Design,
        legalizer: &mut dyn PlacementLegalizer,
    ) {
        legalizer.detailed_placement(design);
        self.set_insts_placement_status(design, PlacementStatus::Placed);
    }

    fn fixed_instances(design: &Design) -> ObstacleIndex {
        let boxes: Vec<Rect> = design
            .all_instances()
            .filter(|(_, inst)| {
                inst.status == PlacementStatus::Firm || inst.status == PlacementStatus::Locked
            })
            .map(|(id, _)| design.instance_bbox(id))
            .collect();
        ObstacleIndex::build(boxes)
    }

    fn set_insts_placement_status(&self, design: &mut Design, status: PlacementStatus) {
        let mut insts: Vec<InstanceId> = Vec::new();
        for violations in self.violations.values() {
            for violation in violations {
                for &gate in &violation.gates {
                    let inst = design.iterm(gate).inst;
                    if !design.master(design.instance(inst).master).is_block() {
                        insts.push(inst);
                    }
                }
            }
        }
        insts.extend(&self.diode_insts);
        for inst in insts {
            design.instance_mut(inst).status = status;
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn insert_diode(
        &mut self,
        design: &mut Design,
        net: NetId,
        diode: DiodeRef,
        gate: ITermId,
        site_width: i64,
        violation_level: usize,
        fixed_insts: &mut ObstacleIndex,
    ) -> Result<(), AntennaError> {
        let name = format!("ANTENNA_{}", self.unique_diode_index);
        self.unique_diode_index += 1;
        let diode_inst = design.create_instance(diode.master, &name);

        let place_vertically = design
            .layer_stack
            .routing_layer(violation_level)
            .ok_or(AntennaError::UnknownLayer(violation_level))?
            .direction
            == lithia_core::layer::LayerDir::Vertical;

        let mut legally_placed =
            self.set_diode_loc(design, diode_inst, gate, site_width, place_vertically, fixed_insts);

        let inst_rect = design.instance_bbox(diode_inst);
        legally_placed = legally_placed && diode_in_row(design, &inst_rect);
        if !legally_placed {
            self.illegal_diode_placement_count += 1;
        }

        // leave the diode movable when it sits outside the core, next to
        // a macro pin, or could not be placed legally
        let sink_inst = design.iterm(gate).inst;
        let sink_is_block = design.master(design.instance(sink_inst).master).is_block();
        let status = if design.core_area.contains(&inst_rect) && !sink_is_block && legally_placed {
            PlacementStatus::Firm
        } else {
            PlacementStatus::Placed
        };
        design.instance_mut(diode_inst).status = status;

        design.connect_pin(diode_inst, diode.mterm, net);
        self.diode_insts.push(diode_inst);

        // later diodes in this pass must avoid it
        fixed_insts.insert(inst_rect);
        Ok(())
    }

    /// Alternating outward offset search around the offending instance.
    /// Always terminates within the configured attempt bound and always
    /// leaves the diode located at the last tried offset.
    fn set_diode_loc(
        &self,
        design: &mut Design,
        diode_inst: InstanceId,
        gate: ITermId,
        site_width: i64,
        place_vertically: bool,
        fixed_insts: &ObstacleIndex,
    ) -> bool {
        let mut place_at_left = true;
        let mut place_at_top = false;
        let mut left_offset: i64 = 0;
        let mut right_offset: i64 = 0;
        let mut top_offset: i64 = 0;
        let mut bottom_offset: i64 = 0;
        let mut horizontal_offset: i64 = 0;
        let mut vertical_offset: i64 = 0;

        let sink_inst = design.iterm(gate).inst;
        let sink_rect = gate_instance_rect(design, gate);
        let inst_orient = design.instance(sink_inst).orient;
        let sink_is_block_or_pad = matches!(
            design.master(design.instance(sink_inst).master).master_type,
            MasterType::Block | MasterType::Pad
        );
        let inst_width = sink_rect.width();
        let inst_height = sink_rect.height();

        let (diode_width, diode_height) = {
            let master = design.master(design.instance(diode_inst).master);
            (master.width, master.height)
        };

        let mut legally_placed = false;
        let mut legalize_itr = 0;
        while !legally_placed && legalize_itr < self.config.max_legalize_iterations {
            if place_vertically {
                vertical_offset = compute_vertical_offset(
                    inst_height,
                    &mut top_offset,
                    &mut bottom_offset,
                    &mut place_at_top,
                );
            } else {
                horizontal_offset = compute_horizontal_offset(
                    diode_width,
                    inst_width,
                    site_width,
                    &mut left_offset,
                    &mut right_offset,
                    &mut place_at_left,
                );
            }

            let mut orient = inst_orient;
            if sink_is_block_or_pad || place_vertically {
                let center = Point::new(
                    sink_rect.min.x + horizontal_offset + diode_width / 2,
                    sink_rect.min.y + vertical_offset + diode_height / 2,
                );
                orient = row_orient(design, &center);
            }
            let inst = design.instance_mut(diode_inst);
            inst.orient = orient;
            inst.origin = Point::new(
                sink_rect.min.x + horizontal_offset,
                sink_rect.min.y + vertical_offset,
            );

            legally_placed = self.check_diode_loc(design, diode_inst, site_width, fixed_insts);
            legalize_itr += 1;
        }

        legally_placed
    }

    /// Legal iff the padding-expanded box misses every fixed instance
    /// and the diode sits inside the core area.
    fn check_diode_loc(
        &self,
        design: &Design,
        diode_inst: InstanceId,
        site_width: i64,
        fixed_insts: &ObstacleIndex,
    ) -> bool {
        let bbox = design.instance_bbox(diode_inst);
        let pad = (self.config.pad_left + self.config.pad_right) * site_width;
        let query = Rect::new(
            bbox.min.x - pad + 1,
            bbox.min.y + 1,
            bbox.max.x + pad - 1,
            bbox.max.y - 1,
        );
        !fixed_insts.intersects_any(&query) && design.core_area.contains(&bbox)
    }
}

fn compute_horizontal_offset(
    diode_width: i64,
    inst_width: i64,
    site_width: i64,
    left_offset: &mut i64,
    right_offset: &mut i64,
    place_at_left: &mut bool,
) -> i64 {
    if *place_at_left {
        let offset = -(diode_width + *left_offset * site_width);
        *left_offset += 1;
        *place_at_left = false;
        offset
    } else {
        let offset = inst_width + *right_offset * site_width;
        *right_offset += 1;
        *place_at_left = true;
        offset
    }
}

fn compute_vertical_offset(
    inst_height: i64,
    top_offset: &mut i64,
    bottom_offset: &mut i64,
    place_at_top: &mut bool,
) -> i64 {
    if *place_at_top {
        let offset = *top_offset * inst_height;
        *top_offset += 1;
        *place_at_top = false;
        offset
    } else {
        let offset = -(*bottom_offset * inst_height);
        *bottom_offset += 1;
        *place_at_top = true;
        offset
    }
}

/// Anchor rectangle for placing next to a gate: the whole instance for
/// standard cells, the transformed pin geometry for macro blocks.
pub(crate) fn gate_instance_rect(design: &Design, gate: ITermId) -> Rect {
    let inst = design.iterm(gate).inst;
    if design.master(design.instance(inst).master).is_block() {
        let shapes = design.iterm_shapes(gate);
        if let Some((_, first)) = shapes.first() {
            return shapes.iter().skip(1).fold(*first, |acc, (_, r)| acc.union(r));
        }
    }
    design.instance_bbox(inst)
}

fn diode_in_row(design: &Design, diode_rect: &Rect) -> bool {
    design.rows.iter().any(|row| {
        let row_rect = row.bbox();
        row_rect.contains(diode_rect) && diode_rect.height() == row.height
    })
}

fn row_orient(design: &Design, point: &Point) -> Orient {
    design
        .rows
        .iter()
        .find(|row| row.bbox().contains_point(point))
        .map(|row| row.orient)
        .unwrap_or(Orient::R0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lithia_core::design::{Master, MTerm, Row, RouteSegment};
    use lithia_core::layer::{LayerDir, RoutingLayer, ViaDef};
    use lithia_core::tech::{AntennaPinModel, AntennaRule, RatioLimit};

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    // 1 dbu per micron so areas read directly in square units.
    fn floorplanned_design() -> Design {
        let mut design = Design::new("repair_test", 1);
        design
            .layer_stack
            .add_layer(RoutingLayer::new(1, "met1", LayerDir::Horizontal, 1, 2));
        design
            .layer_stack
            .add_layer(RoutingLayer::new(2, "met2", LayerDir::Vertical, 1, 2));
        design.layer_stack.add_via(ViaDef {
            name: "via1".to_string(),
            bottom_level: 1,
            cut_width: 1,
            cut_height: 1,
            cut_count: 1,
        });
        design.set_antenna_rule(
            AntennaRule::new(1)
                .with_par(RatioLimit::flat(10.0))
                .with_diode_reduction(400.0),
        );
        design.core_area = Rect::new(-200, -200, 400, 200);
        for i in 0..10 {
            design.rows.push(Row {
                origin: Point::new(-200, -1 + (i - 5) * 8),
                site_width: 4,
                site_count: 150,
                height: 8,
                orient: Orient::R0,
            });
        }
        design
    }

    fn add_violating_net(design: &mut Design, limit: RatioLimit) -> NetId {
        design.set_antenna_rule(
            AntennaRule::new(1)
                .with_par(limit)
                .with_diode_reduction(400.0),
        );
        let mut master = Master::new("m_inv", MasterType::Core, 4, 8);
        master.add_mterm(
            MTerm::new("A")
                .with_pin_model(AntennaPinModel {
                    gate_areas: vec![(1, 5.0)],
                    diff_areas: vec![],
                })
                .with_shape(1, Rect::new(0, 0, 2, 2)),
        );
        let master_id = design.add_master(master);
        let inst = design.create_instance(master_id, "u1");
        design.instance_mut(inst).origin = Point::new(-1, -1);
        design.instance_mut(inst).status = PlacementStatus::Placed;

        let net = design.create_net("n1");
        design.connect_pin(inst, 0, net);
        // PAR = 200 / 5 = 40 against a limit of 10
        design.extend_net_route(
            net,
            [RouteSegment::wire(Point::new(0, 0), Point::new(200, 0), 1)],
        );
        net
    }

    fn add_diode_master(design: &mut Design) -> DiodeRef {
        let mut master = Master::new("antenna_diode", MasterType::AntennaCell, 4, 8);
        master.add_mterm(
            MTerm::new("DIODE")
                .with_pin_model(AntennaPinModel {
                    gate_areas: vec![],
                    diff_areas: vec![(1, 0.5)],
                })
                .with_shape(1, Rect::new(0, 0, 4, 8)),
        );
        let master_id = design.add_master(master);
        DiodeRef {
            master: master_id,
            mterm: 0,
        }
    }

    #[test]
    fn test_check_then_repair_inserts_connected_diode() {
        init_logs();
        let mut design = floorplanned_design();
        let net = add_violating_net(&mut design, RatioLimit::flat(10.0));
        let diode = add_diode_master(&mut design);

        let mut repair = AntennaRepair::new(&design, RepairConfig::default());
        let found = repair
            .check_antenna_violations(&design, &[net], Some(diode))
            .unwrap();
        assert!(found);

        let outcome = repair.repair_antennas(&mut design, diode).unwrap();
        // excess 30 ratio units, one diode absorbs 0.5 * 400 / 5 = 40
        assert_eq!(outcome.diode_count, 1);
        assert_eq!(outcome.illegal_placement_count, 0);

        let diode_inst = design.find_instance_by_name("ANTENNA_1").unwrap();
        assert_eq!(design.instance(diode_inst).status, PlacementStatus::Firm);
        assert_eq!(design.net(net).iterms.len(), 2);
        assert!(design.net(net).dirty);

        // legally placed: apart from the gate and inside the core
        let diode_bbox = design.instance_bbox(diode_inst);
        let gate_bbox = design.instance_bbox(0);
        assert!(!diode_bbox.expanded(-1).overlaps(&gate_bbox));
        assert!(design.core_area.contains(&diode_bbox));
    }

    #[test]
    fn test_repair_clears_violation_on_recheck() {
        init_logs();
        let mut design = floorplanned_design();
        // diff-dependent limit so a connected diode's diffusion area
        // raises the limit past the achieved ratio
        let net = add_violating_net(
            &mut design,
            RatioLimit {
                flat: 10.0,
                diff_pwl: vec![(0.0, 10.0), (0.5, 1000.0)],
            },
        );
        let diode = add_diode_master(&mut design);

        let mut repair = AntennaRepair::new(&design, RepairConfig::default());
        assert!(repair
            .check_antenna_violations(&design, &[net], Some(diode))
            .unwrap());
        repair.repair_antennas(&mut design, diode).unwrap();

        // stand-in for the re-route that wires the diode pin in
        let diode_inst = design.find_instance_by_name("ANTENNA_1").unwrap();
        let pin_center = design.instance_bbox(diode_inst).center();
        design.extend_net_route(
            net,
            [RouteSegment::wire(Point::new(0, 0), Point::new(pin_center.x, 0), 1)],
        );

        let mut recheck = AntennaRepair::new(&design, RepairConfig::default());
        assert!(!recheck
            .check_antenna_violations(&design, &[net], Some(diode))
            .unwrap());
    }

    #[test]
    fn test_later_diodes_avoid_earlier_ones() {
        let mut design = floorplanned_design();
        let net = add_violating_net(&mut design, RatioLimit::flat(10.0));
        // tiny reduction so one violation prescribes several diodes
        design.set_antenna_rule(
            AntennaRule::new(1)
                .with_par(RatioLimit::flat(10.0))
                .with_diode_reduction(10.0),
        );
        let diode = add_diode_master(&mut design);

        let mut repair = AntennaRepair::new(&design, RepairConfig::default());
        assert!(repair
            .check_antenna_violations(&design, &[net], Some(diode))
            .unwrap());
        let outcome = repair.repair_antennas(&mut design, diode).unwrap();
        assert!(outcome.diode_count > 1);
        assert_eq!(outcome.illegal_placement_count, 0);

        // pairwise disjoint interiors
        let boxes: Vec<Rect> = (1..=outcome.diode_count)
            .map(|i| {
                let inst = design
                    .find_instance_by_name(&format!("ANTENNA_{i}"))
                    .unwrap();
                design.instance_bbox(inst)
            })
            .collect();
        for (i, a) in boxes.iter().enumerate() {
            for b in boxes.iter().skip(i + 1) {
                assert!(!a.expanded(-1).overlaps(b));
            }
        }
    }

    /// A core too small to ever hold the diode: the offset search runs
    /// out of attempts, but the diode is still placed (movable, counted
    /// illegal) rather than dropped.
    #[test]
    fn test_exhausted_legalization_still_places_diode() {
        init_logs();
        let mut design = floorplanned_design();
        let net = add_violating_net(&mut design, RatioLimit::flat(10.0));
        let diode = add_diode_master(&mut design);
        design.core_area = Rect::new(0, 0, 1, 1);

        let mut repair = AntennaRepair::new(&design, RepairConfig::default());
        assert!(repair
            .check_antenna_violations(&design, &[net], Some(diode))
            .unwrap());
        let outcome = repair.repair_antennas(&mut design, diode).unwrap();

        assert_eq!(outcome.diode_count, 1);
        assert_eq!(outcome.illegal_placement_count, 1);
        let diode_inst = design.find_instance_by_name("ANTENNA_1").unwrap();
        // left at the last tried offset for the downstream legalizer
        assert_eq!(design.instance(diode_inst).status, PlacementStatus::Placed);
        assert_eq!(design.net(net).iterms.len(), 2);
        assert!(design.net(net).dirty);
    }

    #[test]
    fn test_missing_diode_cell_is_an_error() {
        let design = floorplanned_design();
        assert!(matches!(
            AntennaRepair::find_diode_mterm(&design),
            Err(AntennaError::MissingDiodeCell)
        ));
    }

    #[test]
    fn test_zero_diode_count_counts_as_repair_failure() {
        let mut design = floorplanned_design();
        // no diode reduction factor published for this layer
        let net = add_violating_net(&mut design, RatioLimit::flat(10.0));
        design.set_antenna_rule(AntennaRule::new(1).with_par(RatioLimit::flat(10.0)));
        let diode = add_diode_master(&mut design);

        let mut repair = AntennaRepair::new(&design, RepairConfig::default());
        assert!(repair
            .check_antenna_violations(&design, &[net], Some(diode))
            .unwrap());
        let outcome = repair.repair_antennas(&mut design, diode).unwrap();
        assert_eq!(outcome.diode_count, 0);
    }

    struct NoopLegalizer;
    impl PlacementLegalizer for NoopLegalizer {
        fn detailed_placement(&mut self, _design: &mut Design) {}
    }

    #[test]
    fn test_legalize_relaxes_placement_status() {
        let mut design = floorplanned_design();
        let net = add_violating_net(&mut design, RatioLimit::flat(10.0));
        let diode = add_diode_master(&mut design);

        let mut repair = AntennaRepair::new(&design, RepairConfig::default());
        repair
            .check_antenna_violations(&design, &[net], Some(diode))
            .unwrap();
        repair.repair_antennas(&mut design, diode).unwrap();

        repair.legalize_placed_cells(&mut design, &mut NoopLegalizer);
        let diode_inst = design.find_instance_by_name("ANTENNA_1").unwrap();
        assert_eq!(design.instance(diode_inst).status, PlacementStatus::Placed);
        // the violated gate instance is released too
        assert_eq!(design.instance(0).status, PlacementStatus::Placed);
    }

    #[test]
    fn test_horizontal_offsets_alternate_and_grow() {
        let mut left = 0;
        let mut right = 0;
        let mut at_left = true;
        let diode_w = 10;
        let inst_w = 40;
        let site_w = 5;

        let o1 = compute_horizontal_offset(diode_w, inst_w, site_w, &mut left, &mut right, &mut at_left);
        let o2 = compute_horizontal_offset(diode_w, inst_w, site_w, &mut left, &mut right, &mut at_left);
        let o3 = compute_horizontal_offset(diode_w, inst_w, site_w, &mut left, &mut right, &mut at_left);
        let o4 = compute_horizontal_offset(diode_w, inst_w, site_w, &mut left, &mut right, &mut at_left);
        assert_eq!(o1, -10); // flush left
        assert_eq!(o2, 40); // flush right
        assert_eq!(o3, -15); // one site further left
        assert_eq!(o4, 45); // one site further right
    }

    #[test]
    fn test_vertical_offsets_alternate_and_grow() {
        let mut top = 0;
        let mut bottom = 0;
        let mut at_top = false;
        let h = 8;

        let o1 = compute_vertical_offset(h, &mut top, &mut bottom, &mut at_top);
        let o2 = compute_vertical_offset(h, &mut top, &mut bottom, &mut at_top);
        let o3 = compute_vertical_offset(h, &mut top, &mut bottom, &mut at_top);
        assert_eq!(o1, 0); // first try below at offset 0
        assert_eq!(o2, 0); // then above
        assert_eq!(o3, -8); // one row further down
    }
}
