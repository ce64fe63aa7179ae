use std::collections::{BTreeMap, HashMap, HashSet};

use lithia_core::design::{Design, ITermId, NetId, RouteSegment};
use lithia_core::geometry::{Point, Rect};
use lithia_core::layer::LayerDir;

use crate::dsu::Dsu;
use crate::info::Violation;
use crate::repair::{gate_instance_rect, AntennaRepair};

/// One DSU participant: a routed segment's footprint on one layer.
/// Vias contribute synthetic entries on both wire layers they touch so
/// that stacked vias bridge components; synthetic entries carry no route
/// index and are never cut candidates.
#[derive(Debug)]
struct SegInfo {
    id: usize,
    /// Index into the net's route list; `None` for synthetic entries.
    seg: Option<usize>,
    rect: Rect,
    /// (level, index-in-level) of overlapping entries on this and the
    /// next lower level.
    low_adj: Vec<(usize, usize)>,
}

impl AntennaRepair {
    /// Split violating runs with layer-hopping jumpers. Returns the
    /// number of jumpers inserted. Nets whose routes were mutated are
    /// marked dirty.
    pub fn jumper_insertion(&mut self, design: &mut Design, tile_size: i64) -> usize {
        let work: Vec<(NetId, Vec<Violation>)> = self
            .violations
            .iter()
            .map(|(&net, v)| (net, v.clone()))
            .collect();

        let mut total_jumpers = 0;
        for (net, violations) in work {
            // violations repairable by a jumper need a routing layer two
            // levels up for the bridge
            let mut layer_with_violation: BTreeMap<usize, usize> = BTreeMap::new();
            let mut max_layer = 1;
            for (violation_id, violation) in violations.iter().enumerate() {
                let level = violation.routing_level;
                if design.layer_stack.routing_layer(level).is_some()
                    && design.layer_stack.routing_layer(level + 2).is_some()
                {
                    layer_with_violation.insert(level, violation_id);
                    max_layer = max_layer.max(level + 2);
                }
            }
            if layer_with_violation.is_empty() {
                continue;
            }

            let segments_by_violation = segments_with_violation(
                design,
                net,
                &violations,
                max_layer,
                &layer_with_violation,
            );

            let mut net_jumpers = 0;
            for (&level, &violation_id) in &layer_with_violation {
                let seg_idxs = segments_by_violation[violation_id].clone();
                if seg_idxs.is_empty() {
                    log::debug!(
                        "net {}: no segment reachable from violating gates on level {}",
                        design.net(net).name,
                        level
                    );
                    continue;
                }
                let (init_c, final_c, init_area, final_area) = pin_count_near_endpoints(
                    design,
                    net,
                    &seg_idxs,
                    &violations[violation_id].gates,
                );
                net_jumpers += self.divide_segment(
                    design,
                    net,
                    seg_idxs,
                    level,
                    tile_size,
                    violations[violation_id].ratio,
                    init_c,
                    final_c,
                    init_area,
                    final_area,
                );
            }
            if net_jumpers > 0 {
                design.mark_dirty(net);
            }
            total_jumpers += net_jumpers;
        }
        log::info!("inserted {} jumpers", total_jumpers);
        total_jumpers
    }

    /// Cut the accumulated run so that at most the required tile count
    /// stays connected to the violating gates, biased toward whichever
    /// end carries more gate area when both are implicated.
    #[allow(clippy::too_many_arguments)]
    fn divide_segment(
        &self,
        design: &mut Design,
        net: NetId,
        mut seg_idxs: Vec<usize>,
        level: usize,
        tile_size: i64,
        ratio: f64,
        init_c: usize,
        final_c: usize,
        init_area: f64,
        final_area: f64,
    ) -> usize {
        let is_horizontal = design
            .layer_stack
            .routing_layer(level)
            .map(|l| l.direction == LayerDir::Horizontal)
            .unwrap_or(true);

        let length: i64 = {
            let route = &design.net(net).route;
            seg_idxs.iter().map(|&i| route[i].length()).sum()
        };
        let n_tiles = length / tile_size;
        let mut req_tiles = ((n_tiles as f64 / ratio) * self.config.jumper_scale) as i64;
        if init_c != 0 && final_c != 0 {
            req_tiles = 2.max((req_tiles as f64 * self.config.jumper_split_scale) as i64);
        }
        let bridge_size = 2 * tile_size;

        let mut jumper_count = 0;

        // cut near the segment start
        if final_c == 0 || (init_c != 0 && final_c != 0 && init_area > 0.0) {
            let req_size = req_tiles * tile_size;
            let route = &mut design.net_mut(net).route;
            match segment_cut_position(route, &mut seg_idxs, req_size, bridge_size, is_horizontal, true)
            {
                Some((pos, offset)) => {
                    let idx = seg_idxs[pos];
                    insert_jumper(route, idx, level, offset, bridge_size, is_horizontal, true);
                    jumper_count += 1;
                }
                None => log::debug!("no segment long enough for a start-side jumper cut"),
            }
        }
        // and/or near the segment end
        if init_c == 0 || (init_c != 0 && final_c != 0 && final_area > 0.0) {
            let req_size = req_tiles * tile_size;
            let route = &mut design.net_mut(net).route;
            match segment_cut_position(route, &mut seg_idxs, req_size, bridge_size, is_horizontal, false)
            {
                Some((pos, offset)) => {
                    let idx = seg_idxs[pos];
                    insert_jumper(route, idx, level, offset, bridge_size, is_horizontal, false);
                    jumper_count += 1;
                }
                None => log::debug!("no segment long enough for an end-side jumper cut"),
            }
        }
        jumper_count
    }
}

/// For each violation, the route indices of the physical segments on the
/// violating layer electrically connected to its gates, discovered with
/// a bottom-up union-find over all segments at or below `max_layer`.
fn segments_with_violation(
    design: &Design,
    net: NetId,
    violations: &[Violation],
    max_layer: usize,
    layer_with_violation: &BTreeMap<usize, usize>,
) -> Vec<Vec<usize>> {
    let route = &design.net(net).route;

    // per-layer segment footprints
    let mut segment_by_layer: HashMap<usize, Vec<SegInfo>> = HashMap::new();
    let mut seg_count = 0;
    for (idx, seg) in route.iter().enumerate() {
        if seg.top_level() > max_layer {
            continue;
        }
        let half_width = design
            .layer_stack
            .routing_layer(seg.bottom_level())
            .map(|l| l.width / 2)
            .unwrap_or(0);
        let rect = seg.rect(half_width);
        if seg.is_via() {
            // one synthetic entry per touched wire layer, so stacked
            // vias union through the shared footprint
            for level in [seg.bottom_level(), seg.top_level()] {
                segment_by_layer.entry(level).or_default().push(SegInfo {
                    id: seg_count,
                    seg: None,
                    rect,
                    low_adj: Vec::new(),
                });
                seg_count += 1;
            }
        } else {
            segment_by_layer
                .entry(seg.init_level)
                .or_default()
                .push(SegInfo {
                    id: seg_count,
                    seg: Some(idx),
                    rect,
                    low_adj: Vec::new(),
                });
            seg_count += 1;
        }
    }

    // adjacency: overlaps on the same level and with the level below
    let levels: Vec<usize> = segment_by_layer.keys().copied().collect();
    for &level in &levels {
        let same: Vec<(usize, Rect)> = segment_by_layer[&level]
            .iter()
            .map(|s| (s.id, s.rect))
            .collect();
        let below: Vec<(usize, Rect)> = level
            .checked_sub(1)
            .and_then(|l| segment_by_layer.get(&l))
            .map(|v| v.iter().map(|s| (s.id, s.rect)).collect())
            .unwrap_or_default();
        let entries = segment_by_layer.get_mut(&level).unwrap();
        for info in entries.iter_mut() {
            for (pos, &(other_id, other_rect)) in same.iter().enumerate() {
                if other_id != info.id && info.rect.overlaps(&other_rect) {
                    info.low_adj.push((level, pos));
                }
            }
            for (pos, &(_, other_rect)) in below.iter().enumerate() {
                if info.rect.overlaps(&other_rect) {
                    info.low_adj.push((level - 1, pos));
                }
            }
        }
    }

    // which DSU ids each gate pin touches, tested once per pin
    let mut seg_connected: HashMap<ITermId, HashSet<usize>> = HashMap::new();
    for &iterm in &design.net(net).iterms {
        for (level, pin_rect) in design.iterm_shapes(iterm) {
            for probe in [Some(level), level.checked_sub(1), Some(level + 1)].into_iter().flatten()
            {
                if let Some(entries) = segment_by_layer.get(&probe) {
                    for info in entries {
                        if info.rect.overlaps(&pin_rect) {
                            seg_connected.entry(iterm).or_default().insert(info.id);
                        }
                    }
                }
            }
        }
    }

    let mut result: Vec<Vec<usize>> = vec![Vec::new(); violations.len()];
    let mut dsu = Dsu::new(seg_count);

    // union bottom-up; the connectivity invariant only holds for layers
    // processed so far
    for level in 1..=max_layer {
        let Some(entries) = segment_by_layer.get(&level) else {
            continue;
        };
        let unions: Vec<(usize, usize)> = entries
            .iter()
            .flat_map(|info| {
                info.low_adj
                    .iter()
                    .map(|&(l, pos)| (info.id, segment_by_layer[&l][pos].id))
                    .collect::<Vec<_>>()
            })
            .collect();
        for (u, v) in unions {
            if !dsu.same(u, v) {
                dsu.union_set(u, v);
            }
        }

        if let Some(&violation_id) = layer_with_violation.get(&level) {
            for info in segment_by_layer[&level].iter() {
                let Some(route_idx) = info.seg else {
                    continue;
                };
                let connected = violations[violation_id].gates.iter().any(|gate| {
                    seg_connected
                        .get(gate)
                        .map(|ids| ids.iter().any(|&nbr| dsu.same(info.id, nbr)))
                        .unwrap_or(false)
                });
                if connected {
                    result[violation_id].push(route_idx);
                }
            }
        }
    }
    result
}

/// Count the gates (and their gate area) nearest to each end of the
/// collected run, used to decide which side to cut and how to bias it.
fn pin_count_near_endpoints(
    design: &Design,
    net: NetId,
    seg_idxs: &[usize],
    gates: &[ITermId],
) -> (usize, usize, f64, f64) {
    let route = &design.net(net).route;
    let mut run_min = Point::new(i64::MAX, i64::MAX);
    let mut run_max = Point::new(i64::MIN, i64::MIN);
    for &idx in seg_idxs {
        let seg = &route[idx];
        run_min.x = run_min.x.min(seg.init.x.min(seg.fin.x));
        run_min.y = run_min.y.min(seg.init.y.min(seg.fin.y));
        run_max.x = run_max.x.max(seg.init.x.max(seg.fin.x));
        run_max.y = run_max.y.max(seg.init.y.max(seg.fin.y));
    }

    let mut init_c = 0;
    let mut final_c = 0;
    let mut init_area = 0.0;
    let mut final_area = 0.0;
    for &gate in gates {
        let rect = gate_instance_rect(design, gate);
        let corners = [
            rect.min,
            rect.max,
            Point::new(rect.min.x, rect.max.y),
            Point::new(rect.max.x, rect.min.y),
        ];
        let dist_init = corners
            .iter()
            .map(|c| c.manhattan_distance(&run_min))
            .min()
            .unwrap_or(i64::MAX);
        let dist_final = corners
            .iter()
            .map(|c| c.manhattan_distance(&run_max))
            .min()
            .unwrap_or(i64::MAX);
        let gate_area = design.iterm_pin_model(gate).max_gate_area();
        if dist_init < dist_final {
            init_c += 1;
            init_area += gate_area;
        } else {
            final_c += 1;
            final_area += gate_area;
        }
    }
    (init_c, final_c, init_area, final_area)
}

/// Prefix-sum search for the segment holding the cut position. Sorts the
/// run along the dominant direction, then walks from the chosen end until
/// the accumulated length covers the required size plus the bridge.
/// Returns the position in the sorted run and the offset of the cut
/// inside that segment, measured from the walked-from end.
fn segment_cut_position(
    route: &[RouteSegment],
    seg_idxs: &mut [usize],
    req_size: i64,
    bridge_size: i64,
    is_horizontal: bool,
    at_start: bool,
) -> Option<(usize, i64)> {
    if is_horizontal {
        seg_idxs.sort_by_key(|&i| route[i].init.x);
    } else {
        seg_idxs.sort_by_key(|&i| route[i].init.y);
    }

    let mut size_accum = 0;
    let positions: Vec<usize> = if at_start {
        (0..seg_idxs.len()).collect()
    } else {
        (0..seg_idxs.len()).rev().collect()
    };
    for pos in positions {
        let seg_len = route[seg_idxs[pos]].length();
        size_accum += seg_len;
        if size_accum > req_size && size_accum >= req_size + bridge_size {
            return Some((pos, req_size - (size_accum - seg_len)));
        }
    }
    None
}

/// Splice a jumper into `route[idx]`: vias up two levels at both cut
/// boundaries, the bridge wire two levels above, and a stub reconnecting
/// the truncated original segment. The original endpoint is moved in
/// place.
fn insert_jumper(
    route: &mut Vec<RouteSegment>,
    idx: usize,
    level: usize,
    offset: i64,
    bridge_size: i64,
    is_horizontal: bool,
    at_start: bool,
) {
    let seg = route[idx];
    if is_horizontal {
        let bridge_init_x = if at_start {
            seg.init.x + offset
        } else {
            seg.fin.x - offset - bridge_size
        };
        let bridge_final_x = bridge_init_x + bridge_size;
        let bridge_init = Point::new(bridge_init_x, seg.init.y);
        let bridge_final = Point::new(bridge_final_x, seg.fin.y);
        add_bridge_segments(route, bridge_init, bridge_final, level);
        // stub keeping the left remainder connected
        route.push(RouteSegment::wire(
            seg.init,
            Point::new(bridge_init_x, seg.init.y),
            level,
        ));
        route[idx].init.x = bridge_final_x;
    } else {
        let bridge_init_y = if at_start {
            seg.init.y + offset
        } else {
            seg.fin.y - offset - bridge_size
        };
        let bridge_final_y = bridge_init_y + bridge_size;
        let bridge_init = Point::new(seg.init.x, bridge_init_y);
        let bridge_final = Point::new(seg.fin.x, bridge_final_y);
        add_bridge_segments(route, bridge_init, bridge_final, level);
        route.push(RouteSegment::wire(
            seg.init,
            Point::new(seg.init.x, bridge_init_y),
            level,
        ));
        route[idx].init.y = bridge_final_y;
    }
}

/// Vias up two levels at both bridge ends plus the bridging wire.
fn add_bridge_segments(route: &mut Vec<RouteSegment>, init: Point, fin: Point, level: usize) {
    route.push(RouteSegment::via(init, level, level + 1));
    route.push(RouteSegment::via(init, level + 1, level + 2));
    route.push(RouteSegment::via(fin, level, level + 1));
    route.push(RouteSegment::via(fin, level + 1, level + 2));
    route.push(RouteSegment::wire(init, fin, level + 2));
}
