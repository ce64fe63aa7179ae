use thiserror::Error;

/// Fatal conditions raised while checking or repairing a net.
///
/// Heuristic failures (legalization exhausted, jumper cut not found) are
/// deliberately not represented here; they are counted and logged because
/// they are best-effort sub-goals, not contract violations.
#[derive(Error, Debug)]
pub enum AntennaError {
    #[error("route segment for net {net} is not valid: levels {bottom} and {top} are not adjacent")]
    NonAdjacentVia {
        net: String,
        bottom: usize,
        top: usize,
    },

    #[error("net {net} has a dangling via at ({x}, {y}) with no routing layer for level {level}")]
    DanglingVia {
        net: String,
        level: usize,
        x: i64,
        y: i64,
    },

    #[error("unknown routing layer level {0}")]
    UnknownLayer(usize),

    #[error("no diode cell with positive diffusion area found in the library")]
    MissingDiodeCell,
}
