use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};
use crate::layer::LayerStack;
use crate::tech::{AntennaPinModel, AntennaRule};

pub type MasterId = usize;
pub type InstanceId = usize;
pub type ITermId = usize;
pub type NetId = usize;

/// Library cell classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MasterType {
    Core,
    Block,
    Pad,
    /// Protection diode cell.
    AntennaCell,
}

/// A terminal definition on a master, with its antenna model and pin
/// shapes (level, rect) relative to the master origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MTerm {
    pub name: String,
    pub pin_model: AntennaPinModel,
    pub shapes: Vec<(usize, Rect)>,
}

impl MTerm {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            pin_model: AntennaPinModel::default(),
            shapes: Vec::new(),
        }
    }

    pub fn with_pin_model(mut self, model: AntennaPinModel) -> Self {
        self.pin_model = model;
        self
    }

    pub fn with_shape(mut self, level: usize, rect: Rect) -> Self {
        self.shapes.push((level, rect));
        self
    }
}

/// A library cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Master {
    pub name: String,
    pub master_type: MasterType,
    pub width: i64,
    pub height: i64,
    pub mterms: Vec<MTerm>,
}

impl Master {
    pub fn new(name: &str, master_type: MasterType, width: i64, height: i64) -> Self {
        Self {
            name: name.to_string(),
            master_type,
            width,
            height,
            mterms: Vec::new(),
        }
    }

    pub fn add_mterm(&mut self, mterm: MTerm) -> usize {
        self.mterms.push(mterm);
        self.mterms.len() - 1
    }

    pub fn is_block(&self) -> bool {
        self.master_type == MasterType::Block
    }
}

/// Placement state of an instance. FIRM and LOCKED instances are treated
/// as immovable obstacles during repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementStatus {
    None,
    Placed,
    Firm,
    Locked,
}

/// Instance orientation (row flip only; rotations are not used by the
/// repair flow).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orient {
    R0,
    MX,
}

/// A placed (or pending) instance of a master.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub name: String,
    pub master: MasterId,
    pub origin: Point,
    pub orient: Orient,
    pub status: PlacementStatus,
}

/// An instance terminal, possibly connected to a net.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ITerm {
    pub inst: InstanceId,
    pub mterm: usize,
    pub net: Option<NetId>,
}

/// A placement row. Sites run left to right from the origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    pub origin: Point,
    pub site_width: i64,
    pub site_count: usize,
    pub height: i64,
    pub orient: Orient,
}

impl Row {
    pub fn bbox(&self) -> Rect {
        Rect::new(
            self.origin.x,
            self.origin.y,
            self.origin.x + self.site_width * self.site_count as i64,
            self.origin.y + self.height,
        )
    }
}

/// One piece of routed geometry: a planar wire when both levels match,
/// a via otherwise. Via-ness is this predicate, never inferred from
/// naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteSegment {
    pub init: Point,
    pub init_level: usize,
    pub fin: Point,
    pub fin_level: usize,
}

impl RouteSegment {
    pub fn wire(init: Point, fin: Point, level: usize) -> Self {
        Self {
            init,
            init_level: level,
            fin,
            fin_level: level,
        }
    }

    pub fn via(at: Point, from_level: usize, to_level: usize) -> Self {
        Self {
            init: at,
            init_level: from_level,
            fin: at,
            fin_level: to_level,
        }
    }

    pub fn is_via(&self) -> bool {
        self.init_level != self.fin_level
    }

    pub fn bottom_level(&self) -> usize {
        self.init_level.min(self.fin_level)
    }

    pub fn top_level(&self) -> usize {
        self.init_level.max(self.fin_level)
    }

    /// Manhattan run length; zero for vias.
    pub fn length(&self) -> i64 {
        self.init.manhattan_distance(&self.fin)
    }

    /// Footprint of the segment expanded by half the wire width.
    pub fn rect(&self, half_width: i64) -> Rect {
        Rect::new(self.init.x, self.init.y, self.fin.x, self.fin.y).expanded(half_width)
    }
}

/// A signal net: its connected instance terminals and routed geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Net {
    pub name: String,
    pub iterms: Vec<ITermId>,
    pub route: Vec<RouteSegment>,
    /// Marked after repair mutations so the router re-routes the net.
    pub dirty: bool,
    /// Special nets (power/ground) are never antenna-checked.
    pub special: bool,
}

impl Net {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            iterms: Vec::new(),
            route: Vec::new(),
            dirty: false,
            special: false,
        }
    }

    pub fn has_route(&self) -> bool {
        !self.route.is_empty()
    }
}

/// The in-memory design database: technology, library, placement, and
/// connectivity. All entities are arena-indexed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Design {
    pub name: String,
    /// Database units per micron.
    pub dbu_per_micron: i64,
    pub layer_stack: LayerStack,
    antenna_rules: HashMap<usize, AntennaRule>,
    masters: Vec<Master>,
    instances: Vec<Instance>,
    iterms: Vec<ITerm>,
    nets: Vec<Net>,
    pub rows: Vec<Row>,
    pub core_area: Rect,
}

impl Design {
    pub fn new(name: &str, dbu_per_micron: i64) -> Self {
        Self {
            name: name.to_string(),
            dbu_per_micron,
            layer_stack: LayerStack::new(),
            antenna_rules: HashMap::new(),
            masters: Vec::new(),
            instances: Vec::new(),
            iterms: Vec::new(),
            nets: Vec::new(),
            rows: Vec::new(),
            core_area: Rect::new(0, 0, 0, 0),
        }
    }

    /// Serialize the whole design to pretty JSON, the snapshot format
    /// used by save files and golden tests.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn dbu_to_microns(&self, value: i64) -> f64 {
        value as f64 / self.dbu_per_micron as f64
    }

    pub fn dbu_area_to_sq_microns(&self, area: i64) -> f64 {
        let dbu = self.dbu_per_micron as f64;
        area as f64 / (dbu * dbu)
    }

    // ── Technology ───────────────────────────────────────────────────

    pub fn set_antenna_rule(&mut self, rule: AntennaRule) {
        self.antenna_rules.insert(rule.level, rule);
    }

    pub fn antenna_rule(&self, level: usize) -> Option<&AntennaRule> {
        self.antenna_rules.get(&level)
    }

    // ── Library ──────────────────────────────────────────────────────

    pub fn add_master(&mut self, master: Master) -> MasterId {
        self.masters.push(master);
        self.masters.len() - 1
    }

    pub fn master(&self, id: MasterId) -> &Master {
        &self.masters[id]
    }

    pub fn all_masters(&self) -> impl Iterator<Item = (MasterId, &Master)> {
        self.masters.iter().enumerate()
    }

    // ── Instances ────────────────────────────────────────────────────

    pub fn create_instance(&mut self, master: MasterId, name: &str) -> InstanceId {
        self.instances.push(Instance {
            name: name.to_string(),
            master,
            origin: Point::new(0, 0),
            orient: Orient::R0,
            status: PlacementStatus::None,
        });
        self.instances.len() - 1
    }

    pub fn instance(&self, id: InstanceId) -> &Instance {
        &self.instances[id]
    }

    pub fn instance_mut(&mut self, id: InstanceId) -> &mut Instance {
        &mut self.instances[id]
    }

    pub fn find_instance_by_name(&self, name: &str) -> Option<InstanceId> {
        self.instances.iter().position(|i| i.name == name)
    }

    pub fn all_instances(&self) -> impl Iterator<Item = (InstanceId, &Instance)> {
        self.instances.iter().enumerate()
    }

    pub fn instance_bbox(&self, id: InstanceId) -> Rect {
        let inst = &self.instances[id];
        let master = &self.masters[inst.master];
        Rect::new(
            inst.origin.x,
            inst.origin.y,
            inst.origin.x + master.width,
            inst.origin.y + master.height,
        )
    }

    // ── Terminals ────────────────────────────────────────────────────

    /// Create a terminal on `inst` for `mterm` and connect it to `net`.
    pub fn connect_pin(&mut self, inst: InstanceId, mterm: usize, net: NetId) -> ITermId {
        let id = self.iterms.len();
        self.iterms.push(ITerm {
            inst,
            mterm,
            net: Some(net),
        });
        self.nets[net].iterms.push(id);
        id
    }

    pub fn iterm(&self, id: ITermId) -> &ITerm {
        &self.iterms[id]
    }

    /// Pin shapes of a terminal in world coordinates.
    pub fn iterm_shapes(&self, id: ITermId) -> Vec<(usize, Rect)> {
        let iterm = &self.iterms[id];
        let inst = &self.instances[iterm.inst];
        let master = &self.masters[inst.master];
        let mterm = &master.mterms[iterm.mterm];
        mterm
            .shapes
            .iter()
            .map(|&(level, rect)| {
                let r = match inst.orient {
                    Orient::R0 => rect,
                    Orient::MX => Rect::new(
                        rect.min.x,
                        master.height - rect.max.y,
                        rect.max.x,
                        master.height - rect.min.y,
                    ),
                };
                (
                    level,
                    Rect::new(
                        inst.origin.x + r.min.x,
                        inst.origin.y + r.min.y,
                        inst.origin.x + r.max.x,
                        inst.origin.y + r.max.y,
                    ),
                )
            })
            .collect()
    }

    pub fn iterm_pin_model(&self, id: ITermId) -> &AntennaPinModel {
        let iterm = &self.iterms[id];
        let inst = &self.instances[iterm.inst];
        &self.masters[inst.master].mterms[iterm.mterm].pin_model
    }

    /// Full name `inst/mterm` for diagnostics.
    pub fn iterm_name(&self, id: ITermId) -> String {
        let iterm = &self.iterms[id];
        let inst = &self.instances[iterm.inst];
        let master = &self.masters[inst.master];
        format!("{}/{}", inst.name, master.mterms[iterm.mterm].name)
    }

    // ── Nets ─────────────────────────────────────────────────────────

    pub fn create_net(&mut self, name: &str) -> NetId {
        self.nets.push(Net::new(name));
        self.nets.len() - 1
    }

    pub fn net(&self, id: NetId) -> &Net {
        &self.nets[id]
    }

    pub fn net_mut(&mut self, id: NetId) -> &mut Net {
        &mut self.nets[id]
    }

    pub fn net_count(&self) -> usize {
        self.nets.len()
    }

    pub fn all_nets(&self) -> impl Iterator<Item = (NetId, &Net)> {
        self.nets.iter().enumerate()
    }

    /// Append routed geometry to a net. The route list is append-only
    /// except for the in-place endpoint truncation done by jumper repair.
    pub fn extend_net_route(&mut self, net: NetId, segments: impl IntoIterator<Item = RouteSegment>) {
        self.nets[net].route.extend(segments);
    }

    pub fn mark_dirty(&mut self, net: NetId) {
        self.nets[net].dirty = true;
    }

    // ── Rows / floorplan ─────────────────────────────────────────────

    /// Common site width across rows; pads are ignored. Returns `None`
    /// for a rowless floorplan.
    pub fn site_width(&self) -> Option<i64> {
        let mut width = None;
        for row in &self.rows {
            match width {
                None => width = Some(row.site_width),
                Some(w) if w != row.site_width => {
                    log::warn!("design has rows with different site widths");
                }
                _ => {}
            }
        }
        width
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tech::AntennaPinModel;

    fn small_design() -> Design {
        let mut design = Design::new("unit", 1000);
        let mut master = Master::new("sky_inv", MasterType::Core, 460, 2720);
        master.add_mterm(MTerm::new("A").with_pin_model(AntennaPinModel {
            gate_areas: vec![(1, 0.5)],
            diff_areas: vec![],
        }));
        let master_id = design.add_master(master);
        let inst = design.create_instance(master_id, "u1");
        design.instance_mut(inst).origin = Point::new(1000, 2000);
        design
    }

    #[test]
    fn test_segment_via_predicate() {
        let wire = RouteSegment::wire(Point::new(0, 0), Point::new(200, 0), 1);
        let via = RouteSegment::via(Point::new(0, 0), 1, 2);
        assert!(!wire.is_via());
        assert!(via.is_via());
        assert_eq!(wire.length(), 200);
        assert_eq!(via.length(), 0);
        assert_eq!(via.bottom_level(), 1);
        assert_eq!(via.top_level(), 2);
    }

    #[test]
    fn test_instance_bbox_and_lookup() {
        let design = small_design();
        let inst = design.find_instance_by_name("u1").unwrap();
        let bbox = design.instance_bbox(inst);
        assert_eq!(bbox.min, Point::new(1000, 2000));
        assert_eq!(bbox.max, Point::new(1460, 4720));
        assert!(design.find_instance_by_name("u2").is_none());
    }

    #[test]
    fn test_connect_pin_links_both_sides() {
        let mut design = small_design();
        let net = design.create_net("n1");
        let iterm = design.connect_pin(0, 0, net);
        assert_eq!(design.net(net).iterms, vec![iterm]);
        assert_eq!(design.iterm(iterm).net, Some(net));
        assert_eq!(design.iterm_name(iterm), "u1/A");
    }

    #[test]
    fn test_dbu_conversion() {
        let design = small_design();
        assert!((design.dbu_to_microns(500) - 0.5).abs() < 1e-12);
        assert!((design.dbu_area_to_sq_microns(1_000_000) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_json_snapshot_preserves_connectivity() {
        let mut design = small_design();
        let net = design.create_net("n1");
        design.connect_pin(0, 0, net);
        design.extend_net_route(
            net,
            [RouteSegment::wire(Point::new(0, 0), Point::new(200, 0), 1)],
        );

        let restored = Design::from_json(&design.to_json().unwrap()).unwrap();
        assert_eq!(restored.net(net).iterms, design.net(net).iterms);
        assert_eq!(restored.net(net).route, design.net(net).route);
        assert_eq!(restored.iterm_name(0), "u1/A");
    }
}
