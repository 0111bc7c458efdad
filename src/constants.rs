//! Shared application-wide constants.
//! Centralizes tweakable values used across hit-testing, rendering and interactions.

// Grid/drawing
/// Minor grid cell size in world units.
pub const GRID_SIZE: f32 = 20.0;
/// Number of minor cells between major grid lines.
pub const MAJOR_GRID_EVERY: f32 = 5.0;

// Ports
/// Radius of a drawn port circle (world units, scaled by zoom).
pub const PORT_RADIUS: f32 = 10.0;
/// Lower bound applied to every nearest-port search radius.
pub const MIN_PORT_SNAP_DISTANCE: f32 = 25.0;
/// Radius requested when looking for the target port of a connection on release.
pub const CONNECTION_RELEASE_SNAP: f32 = 15.0;
/// Radius around a port anchor that still counts as clicking its node.
pub const NODE_SNAP_RADIUS: f32 = 20.0;

// Connectors
/// Upper bound for the horizontal handle length of connector curves.
pub const MAX_CURVATURE: f32 = 100.0;
/// Distance from the tip to the base of a connector arrow head.
pub const ARROW_LENGTH: f32 = 10.0;
/// Half width of a connector arrow head.
pub const ARROW_HALF_WIDTH: f32 = 5.0;

// Interaction
/// Maximum time between two clicks on the same node to count as a double click.
pub const DOUBLE_CLICK_SECONDS: f64 = 0.3;
/// Zoom limits for the canvas.
pub const MIN_ZOOM: f32 = 0.25;
/// Zoom limits for the canvas.
pub const MAX_ZOOM: f32 = 3.0;
/// Zoom change per mouse wheel notch.
pub const ZOOM_STEP: f32 = 0.1;

// Undo/redo
/// Maximum number of undo history entries to retain.
pub const MAX_UNDO_HISTORY: usize = 100;
