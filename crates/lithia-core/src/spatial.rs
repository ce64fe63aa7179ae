use rstar::{RTree, RTreeObject, AABB};

use crate::geometry::Rect;

/// An entry in the obstacle R-tree: the padded bounding box of a fixed or
/// locked instance (or of a diode inserted earlier in the same pass).
#[derive(Debug, Clone)]
pub struct Obstacle {
    pub id: usize,
    pub bbox: Rect,
}

impl RTreeObject for Obstacle {
    type Envelope = AABB<[i64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bbox.min.x, self.bbox.min.y],
            [self.bbox.max.x, self.bbox.max.y],
        )
    }
}

/// Read-mostly index of immovable instance bounding boxes, queried during
/// diode legalization. Lifetime is one repair pass.
pub struct ObstacleIndex {
    tree: RTree<Obstacle>,
    next_id: usize,
}

impl ObstacleIndex {
    pub fn new() -> Self {
        Self {
            tree: RTree::new(),
            next_id: 0,
        }
    }

    /// Bulk-load the index from obstacle boxes.
    pub fn build(boxes: Vec<Rect>) -> Self {
        let next_id = boxes.len();
        let entries = boxes
            .into_iter()
            .enumerate()
            .map(|(id, bbox)| Obstacle { id, bbox })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
            next_id,
        }
    }

    /// Insert one obstacle, e.g. a freshly placed diode.
    pub fn insert(&mut self, bbox: Rect) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        self.tree.insert(Obstacle { id, bbox });
        id
    }

    /// True when `query` intersects any indexed obstacle.
    pub fn intersects_any(&self, query: &Rect) -> bool {
        let envelope = AABB::from_corners([query.min.x, query.min.y], [query.max.x, query.max.y]);
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .next()
            .is_some()
    }

    /// All obstacles intersecting `query`.
    pub fn query(&self, query: &Rect) -> Vec<&Obstacle> {
        let envelope = AABB::from_corners([query.min.x, query.min.y], [query.max.x, query.max.y]);
        self.tree.locate_in_envelope_intersecting(&envelope).collect()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for ObstacleIndex {
    fn default() -> Self {
        Self::new()
    }
}
