use std::collections::{HashMap, HashSet};

use lithia_core::design::{Design, ITermId, NetId};
use lithia_core::geometry::Point;

use crate::error::AntennaError;

pub type NodeId = usize;
pub type EdgeId = usize;

/// A point in a net's routed geometry: a (position, level) pair with the
/// pin terminals whose shapes overlap it.
#[derive(Debug)]
pub struct GraphNode {
    pub point: Point,
    pub level: usize,
    pub iterms: Vec<ITermId>,
}

/// Edge classification. A via connects adjacent levels; a wire stays on
/// one level. Decided by the segment's level predicate, never by naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Wire,
    Via,
}

#[derive(Debug)]
pub struct GraphEdge {
    pub kind: EdgeKind,
    pub a: NodeId,
    pub b: NodeId,
    /// Index of the originating segment in the net's route list.
    pub seg: usize,
}

/// Transient per-net wire/via connectivity graph; rebuilt on every check.
#[derive(Debug)]
pub struct WireGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    adj: Vec<Vec<EdgeId>>,
}

impl WireGraph {
    /// Build the graph from a net's routed segments and attach the pin
    /// terminals overlapping each node.
    pub fn build(design: &Design, net_id: NetId) -> Result<WireGraph, AntennaError> {
        let net = design.net(net_id);
        let mut graph = WireGraph {
            nodes: Vec::new(),
            edges: Vec::new(),
            adj: Vec::new(),
        };
        let mut node_map: HashMap<(i64, i64, usize), NodeId> = HashMap::new();

        let mut node_at = |graph: &mut WireGraph, point: Point, level: usize| -> NodeId {
            *node_map.entry((point.x, point.y, level)).or_insert_with(|| {
                graph.nodes.push(GraphNode {
                    point,
                    level,
                    iterms: Vec::new(),
                });
                graph.adj.push(Vec::new());
                graph.nodes.len() - 1
            })
        };

        for (seg_idx, seg) in net.route.iter().enumerate() {
            if seg.is_via() {
                let bottom = seg.bottom_level();
                let top = seg.top_level();
                if top - bottom != 1 {
                    return Err(AntennaError::NonAdjacentVia {
                        net: net.name.clone(),
                        bottom,
                        top,
                    });
                }
                for level in [bottom, top] {
                    if design.layer_stack.routing_layer(level).is_none() {
                        return Err(AntennaError::DanglingVia {
                            net: net.name.clone(),
                            level,
                            x: seg.init.x,
                            y: seg.init.y,
                        });
                    }
                }
                let a = node_at(&mut graph, seg.init, bottom);
                let b = node_at(&mut graph, seg.init, top);
                graph.add_edge(EdgeKind::Via, a, b, seg_idx);
            } else {
                let level = seg.init_level;
                if design.layer_stack.routing_layer(level).is_none() {
                    return Err(AntennaError::UnknownLayer(level));
                }
                let a = node_at(&mut graph, seg.init, level);
                if seg.length() > 0 {
                    let b = node_at(&mut graph, seg.fin, level);
                    graph.add_edge(EdgeKind::Wire, a, b, seg_idx);
                }
            }
        }

        for &iterm in &net.iterms {
            for (level, rect) in design.iterm_shapes(iterm) {
                for node in graph.nodes.iter_mut() {
                    if node.level == level && rect.contains_point(&node.point) {
                        node.iterms.push(iterm);
                    }
                }
            }
        }

        Ok(graph)
    }

    fn add_edge(&mut self, kind: EdgeKind, a: NodeId, b: NodeId, seg: usize) {
        let id = self.edges.len();
        self.edges.push(GraphEdge { kind, a, b, seg });
        self.adj[a].push(id);
        if b != a {
            self.adj[b].push(id);
        }
    }

    pub fn incident(&self, node: NodeId) -> &[EdgeId] {
        &self.adj[node]
    }

    pub fn other_end(&self, edge: EdgeId, node: NodeId) -> NodeId {
        let e = &self.edges[edge];
        if e.a == node {
            e.b
        } else {
            e.a
        }
    }

    fn has_via_below(&self, node: NodeId) -> bool {
        self.adj[node].iter().any(|&eid| {
            let e = &self.edges[eid];
            e.kind == EdgeKind::Via && self.nodes[self.other_end(eid, node)].level < self.nodes[node].level
        })
    }

    fn has_wire_at_level(&self, node: NodeId) -> bool {
        self.adj[node]
            .iter()
            .any(|&eid| self.edges[eid].kind == EdgeKind::Wire)
    }

    /// A segment root anchors a fresh ratio accumulation: a wire node at
    /// the bottom of its local via stack. The test is component-wide: a
    /// same-level wire component entered by a via from below has no
    /// roots, because charge there accumulates onto the stack beneath
    /// it rather than restarting.
    pub fn is_segment_root(&self, node: NodeId) -> bool {
        if !self.has_wire_at_level(node) {
            return false;
        }
        let mut visited = HashSet::new();
        let (members, _, _) = self.same_level_component(node, &mut visited);
        members.iter().all(|&m| !self.has_via_below(m))
    }

    /// All segment roots, ordered bottom level first.
    pub fn wire_roots(&self) -> Vec<NodeId> {
        let mut roots: Vec<NodeId> = Vec::new();
        let mut visited: HashSet<NodeId> = HashSet::new();
        for n in 0..self.nodes.len() {
            if visited.contains(&n) || !self.has_wire_at_level(n) {
                continue;
            }
            let (members, _, _) = self.same_level_component(n, &mut visited);
            if members.iter().all(|&m| !self.has_via_below(m)) {
                roots.extend(members);
            }
        }
        roots.sort_by_key(|&n| (self.nodes[n].level, n));
        roots
    }

    /// One traversal seed per same-level wire component, whether or not
    /// the component holds a segment root: a via-fed component anchors
    /// at its lowest via entry node, a rooted component at its lowest
    /// member. Group accumulation walks from these, so components above
    /// via stacks still get their ratios evaluated.
    pub fn group_seeds(&self) -> Vec<NodeId> {
        let mut seeds: Vec<NodeId> = Vec::new();
        let mut visited: HashSet<NodeId> = HashSet::new();
        for n in 0..self.nodes.len() {
            if visited.contains(&n) || !self.has_wire_at_level(n) {
                continue;
            }
            let (members, _, _) = self.same_level_component(n, &mut visited);
            let entry = members
                .iter()
                .copied()
                .filter(|&m| self.has_via_below(m))
                .min();
            seeds.push(entry.unwrap_or_else(|| members.iter().copied().min().unwrap_or(n)));
        }
        seeds.sort_by_key(|&n| (self.nodes[n].level, n));
        seeds
    }

    /// Distinct levels carrying wire geometry, ascending.
    pub fn wire_levels(&self) -> Vec<usize> {
        let mut levels: Vec<usize> = self
            .edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Wire)
            .map(|e| self.nodes[e.a].level)
            .collect();
        levels.sort_unstable();
        levels.dedup();
        levels
    }

    /// The maximal same-level wire component reachable from `root`.
    /// Returns the member nodes, the wire edges traversed, and the via
    /// edges leaving the component upward (the stacked vias whose charge
    /// feeds this group). A shared `visited` set keeps every node in
    /// exactly one group per traversal pass.
    pub fn same_level_component(
        &self,
        root: NodeId,
        visited: &mut HashSet<NodeId>,
    ) -> (Vec<NodeId>, Vec<EdgeId>, Vec<EdgeId>) {
        let level = self.nodes[root].level;
        let mut nodes = Vec::new();
        let mut wires = Vec::new();
        let mut up_vias = Vec::new();
        let mut stack = vec![root];
        let mut seen_edges: HashSet<EdgeId> = HashSet::new();

        while let Some(n) = stack.pop() {
            if !visited.insert(n) {
                continue;
            }
            nodes.push(n);
            for &eid in &self.adj[n] {
                let edge = &self.edges[eid];
                let m = self.other_end(eid, n);
                match edge.kind {
                    EdgeKind::Wire if self.nodes[m].level == level => {
                        if seen_edges.insert(eid) {
                            wires.push(eid);
                        }
                        if !visited.contains(&m) {
                            stack.push(m);
                        }
                    }
                    EdgeKind::Via if self.nodes[m].level > level => {
                        if seen_edges.insert(eid) {
                            up_vias.push(eid);
                        }
                    }
                    _ => {}
                }
            }
        }
        (nodes, wires, up_vias)
    }

    /// Collect the gate terminals reachable from `group` going down
    /// through vias and along wires strictly below `level`, without
    /// re-counting terminals or nodes already visited at this level pass.
    /// Returns (gate area, diffusion area, gate terminals).
    pub fn find_wire_below_iterms(
        &self,
        design: &Design,
        group: &[NodeId],
        level: usize,
        visited_iterms: &mut HashSet<ITermId>,
        visited_nodes: &mut HashSet<NodeId>,
    ) -> (f64, f64, Vec<ITermId>) {
        let mut gate_area = 0.0;
        let mut diff_area = 0.0;
        let mut gates = Vec::new();
        let mut stack: Vec<NodeId> = group.to_vec();

        while let Some(n) = stack.pop() {
            if !visited_nodes.insert(n) {
                continue;
            }
            for &iterm in &self.nodes[n].iterms {
                if !visited_iterms.insert(iterm) {
                    continue;
                }
                let model = design.iterm_pin_model(iterm);
                if model.is_gate() {
                    gate_area += model.max_gate_area();
                    gates.push(iterm);
                }
                diff_area += model.max_diff_area();
            }
            for &eid in &self.adj[n] {
                let m = self.other_end(eid, n);
                if self.nodes[m].level <= level && !visited_nodes.contains(&m) {
                    // descend via stacks and lower wires only
                    if self.nodes[m].level < level || self.edges[eid].kind == EdgeKind::Wire {
                        stack.push(m);
                    }
                }
            }
        }
        (gate_area, diff_area, gates)
    }

    /// Bounded iterative DFS from `start` to `goal` over nodes at or
    /// below `level`, with an explicit current-path stack and
    /// backtracking on dead ends. Returns the first path found; no
    /// shortest-path guarantee, downstream use only tests membership.
    pub fn find_car_path(&self, start: NodeId, level: usize, goal: NodeId) -> Option<Vec<NodeId>> {
        let mut current_path: Vec<(NodeId, usize)> = vec![(start, 0)];
        let mut visited: HashSet<NodeId> = HashSet::new();
        visited.insert(start);

        while let Some(&(node, edge_pos)) = current_path.last() {
            if node == goal {
                return Some(current_path.iter().map(|&(n, _)| n).collect());
            }
            let mut advanced = false;
            let incident = &self.adj[node];
            let mut pos = edge_pos;
            while pos < incident.len() {
                let m = self.other_end(incident[pos], node);
                pos += 1;
                if self.nodes[m].level <= level && visited.insert(m) {
                    current_path.last_mut().unwrap().1 = pos;
                    current_path.push((m, 0));
                    advanced = true;
                    break;
                }
            }
            if !advanced {
                current_path.pop();
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lithia_core::design::{Design, Master, MasterType, MTerm, RouteSegment};
    use lithia_core::layer::{LayerDir, RoutingLayer};
    use lithia_core::tech::AntennaPinModel;
    use lithia_core::geometry::Rect;

    fn design_with_layers() -> Design {
        let mut design = Design::new("graph_test", 1000);
        for (level, name, dir) in [
            (1, "met1", LayerDir::Horizontal),
            (2, "met2", LayerDir::Vertical),
            (3, "met3", LayerDir::Horizontal),
        ] {
            design
                .layer_stack
                .add_layer(RoutingLayer::new(level, name, dir, 140, 280));
        }
        design
    }

    fn gate_master(design: &mut Design) -> usize {
        let mut master = Master::new("inv", MasterType::Core, 460, 2720);
        master.add_mterm(
            MTerm::new("A")
                .with_pin_model(AntennaPinModel {
                    gate_areas: vec![(1, 0.5)],
                    diff_areas: vec![],
                })
                .with_shape(1, Rect::new(-70, -70, 70, 70)),
        );
        design.add_master(master)
    }

    #[test]
    fn test_build_classifies_edges() {
        let mut design = design_with_layers();
        let net = design.create_net("n1");
        design.extend_net_route(
            net,
            [
                RouteSegment::wire(Point::new(0, 0), Point::new(2000, 0), 1),
                RouteSegment::via(Point::new(2000, 0), 1, 2),
                RouteSegment::wire(Point::new(2000, 0), Point::new(2000, 3000), 2),
            ],
        );
        let graph = WireGraph::build(&design, net).unwrap();
        assert_eq!(graph.nodes.len(), 4);
        let wires = graph.edges.iter().filter(|e| e.kind == EdgeKind::Wire).count();
        let vias = graph.edges.iter().filter(|e| e.kind == EdgeKind::Via).count();
        assert_eq!((wires, vias), (2, 1));
        assert_eq!(graph.wire_levels(), vec![1, 2]);
    }

    #[test]
    fn test_non_adjacent_via_is_fatal() {
        let mut design = design_with_layers();
        let net = design.create_net("bad");
        design.extend_net_route(net, [RouteSegment::via(Point::new(0, 0), 1, 3)]);
        let err = WireGraph::build(&design, net).unwrap_err();
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn test_segment_roots() {
        let mut design = design_with_layers();
        let net = design.create_net("n1");
        design.extend_net_route(
            net,
            [
                RouteSegment::wire(Point::new(0, 0), Point::new(2000, 0), 1),
                RouteSegment::via(Point::new(2000, 0), 1, 2),
                RouteSegment::wire(Point::new(2000, 0), Point::new(2000, 3000), 2),
            ],
        );
        let graph = WireGraph::build(&design, net).unwrap();
        let roots = graph.wire_roots();
        // both met1 endpoints are roots; the met2 component is fed by a
        // via from below, so none of its nodes restarts accumulation,
        // the far endpoint included
        assert_eq!(
            roots
                .iter()
                .filter(|&&r| graph.nodes[r].level == 1)
                .count(),
            2
        );
        assert_eq!(
            roots
                .iter()
                .filter(|&&r| graph.nodes[r].level == 2)
                .count(),
            0
        );
    }

    #[test]
    fn test_via_fed_component_seeds_at_via_entry() {
        let mut design = design_with_layers();
        let net = design.create_net("n1");
        design.extend_net_route(
            net,
            [
                RouteSegment::wire(Point::new(0, 0), Point::new(2000, 0), 1),
                RouteSegment::via(Point::new(2000, 0), 1, 2),
                RouteSegment::wire(Point::new(2000, 0), Point::new(2000, 3000), 2),
            ],
        );
        let graph = WireGraph::build(&design, net).unwrap();
        let seeds = graph.group_seeds();
        // one seed per same-level component, so the rootless met2 run is
        // still walked for its ratios
        assert_eq!(seeds.len(), 2);
        let met2_seed = seeds
            .iter()
            .copied()
            .find(|&n| graph.nodes[n].level == 2)
            .unwrap();
        assert_eq!(graph.nodes[met2_seed].point, Point::new(2000, 0));
        assert!(!graph.is_segment_root(met2_seed));
        assert!(graph.is_segment_root(seeds[0]));
    }

    #[test]
    fn test_gate_collection_below_level() {
        let mut design = design_with_layers();
        let master = gate_master(&mut design);
        let inst = design.create_instance(master, "u1");
        let net = design.create_net("n1");
        let iterm = design.connect_pin(inst, 0, net);
        design.extend_net_route(
            net,
            [
                RouteSegment::wire(Point::new(0, 0), Point::new(2000, 0), 1),
                RouteSegment::via(Point::new(2000, 0), 1, 2),
                RouteSegment::wire(Point::new(2000, 0), Point::new(2000, 3000), 2),
            ],
        );
        let graph = WireGraph::build(&design, net).unwrap();

        // walk the met2 group and look below it
        let met2_root = (0..graph.nodes.len())
            .find(|&n| graph.nodes[n].level == 2)
            .unwrap();
        let mut visited = HashSet::new();
        let (group, _, _) = graph.same_level_component(met2_root, &mut visited);
        let mut vi = HashSet::new();
        let mut vn = HashSet::new();
        let (gate_area, _, gates) =
            graph.find_wire_below_iterms(&design, &group, 2, &mut vi, &mut vn);
        assert_eq!(gates, vec![iterm]);
        assert!((gate_area - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_find_car_path_membership() {
        let mut design = design_with_layers();
        let net = design.create_net("n1");
        design.extend_net_route(
            net,
            [
                RouteSegment::wire(Point::new(0, 0), Point::new(2000, 0), 1),
                RouteSegment::via(Point::new(2000, 0), 1, 2),
                RouteSegment::wire(Point::new(2000, 0), Point::new(2000, 3000), 2),
            ],
        );
        let graph = WireGraph::build(&design, net).unwrap();
        let start = (0..graph.nodes.len())
            .find(|&n| graph.nodes[n].level == 2 && graph.nodes[n].point == Point::new(2000, 3000))
            .unwrap();
        let goal = (0..graph.nodes.len())
            .find(|&n| graph.nodes[n].level == 1 && graph.nodes[n].point == Point::new(0, 0))
            .unwrap();
        let path = graph.find_car_path(start, 2, goal).unwrap();
        assert_eq!(*path.first().unwrap(), start);
        assert_eq!(*path.last().unwrap(), goal);
        // path above the allowed level is never taken
        assert!(path.iter().all(|&n| graph.nodes[n].level <= 2));
    }
}
