//! # Lithia Core
//!
//! In-memory layout design database, routing layer stack, antenna rule
//! tables, and the fixed-obstacle spatial index used during repair.
//!
//! This crate is the data substrate the antenna check/repair engine
//! (`lithia-antenna`) operates on.

pub mod geometry;
pub mod layer;
pub mod tech;
pub mod design;
pub mod spatial;

pub use design::{Design, Instance, InstanceId, ITermId, Master, MasterId, Net, NetId, RouteSegment};
pub use geometry::{BBox, Point, Rect};
pub use layer::{LayerDir, LayerStack, RoutingLayer};
pub use tech::{AntennaPinModel, AntennaRule, RatioLimit};
