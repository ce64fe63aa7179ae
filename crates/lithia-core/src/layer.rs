use serde::{Deserialize, Serialize};

/// Preferred routing direction of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerDir {
    Horizontal,
    Vertical,
}

/// A routing layer in the technology stack.
///
/// Routing levels are 1-based and dense: level 1 is the lowest routing
/// layer, level `n+1` sits directly above level `n` with one cut layer
/// between them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingLayer {
    pub level: usize,
    pub name: String,
    pub direction: LayerDir,
    /// Default wire width, in dbu.
    pub width: i64,
    /// Routing pitch, in dbu.
    pub pitch: i64,
}

impl RoutingLayer {
    pub fn new(level: usize, name: &str, direction: LayerDir, width: i64, pitch: i64) -> Self {
        Self {
            level,
            name: name.to_string(),
            direction,
            width,
            pitch,
        }
    }
}

/// Descriptor of the default via connecting level `bottom_level` to the
/// level directly above it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViaDef {
    pub name: String,
    pub bottom_level: usize,
    /// Cut dimensions, in dbu.
    pub cut_width: i64,
    pub cut_height: i64,
    pub cut_count: usize,
}

impl ViaDef {
    /// Total cut area of the via, in square dbu.
    pub fn cut_area_dbu(&self) -> i64 {
        self.cut_width * self.cut_height * self.cut_count as i64
    }
}

/// The ordered collection of routing layers and default vias.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayerStack {
    layers: Vec<RoutingLayer>,
    vias: Vec<ViaDef>,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_layer(&mut self, layer: RoutingLayer) {
        self.layers.push(layer);
        self.layers.sort_by_key(|l| l.level);
    }

    pub fn add_via(&mut self, via: ViaDef) {
        self.vias.push(via);
    }

    pub fn routing_layer(&self, level: usize) -> Option<&RoutingLayer> {
        self.layers.iter().find(|l| l.level == level)
    }

    pub fn layer_by_name(&self, name: &str) -> Option<&RoutingLayer> {
        self.layers.iter().find(|l| l.name == name)
    }

    pub fn upper_layer(&self, level: usize) -> Option<&RoutingLayer> {
        self.routing_layer(level + 1)
    }

    pub fn lower_layer(&self, level: usize) -> Option<&RoutingLayer> {
        if level <= 1 {
            None
        } else {
            self.routing_layer(level - 1)
        }
    }

    /// Default via whose bottom landing pad is on `bottom_level`.
    pub fn default_via(&self, bottom_level: usize) -> Option<&ViaDef> {
        self.vias.iter().find(|v| v.bottom_level == bottom_level)
    }

    pub fn max_routing_level(&self) -> usize {
        self.layers.iter().map(|l| l.level).max().unwrap_or(0)
    }

    pub fn all_layers(&self) -> &[RoutingLayer] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }
}
