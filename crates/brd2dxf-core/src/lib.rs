//! # brd2dxf Core
//!
//! Geometry primitives and the EAGLE board data model for brd2dxf.
//! Provides the stroke/circle reconstruction math, the validated board
//! model, and extraction of that model from `.brd` XML documents.

pub mod error;
pub mod extract;
pub mod geometry;
pub mod model;

pub use error::{BoardError, Result};
pub use extract::parse_board;
pub use geometry::{
    angle_of_line, approximate_circle, rotate_point, stroke_outline, Point, Ring, CIRCLE_STEPS,
    OCTAGON_STEPS,
};
pub use model::{
    BoardModel, ContactRef, Element, LayerDef, Library, Package, Pad, PadShape, PackageCircle,
    PackageRectangle, Rotation, Signal, SignalPolygon, SmdPad, Via, Wire,
};
