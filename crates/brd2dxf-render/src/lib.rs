//! # brd2dxf Render
//!
//! Rasterization and output for brd2dxf: turns an extracted board model
//! into per-layer polygon accumulators, composites them into merged
//! outlines, and writes the result through an [`OutputSink`] such as the
//! buffering DXF writer.

pub mod compose;
pub mod error;
pub mod raster;
pub mod sink;

pub use compose::{compose, MASK_MARGIN};
pub use error::{RenderError, Result};
pub use raster::{Rasterizer, BOTTOM, DRILLS, TOP};
pub use sink::{
    simplification_groups, DxfWriter, OutputOptions, OutputSink, RecordingSink,
    SimplificationGroup,
};

use brd2dxf_core::BoardModel;

/// Runs the full conversion pipeline: rasterize every board primitive,
/// then composite the accumulated layers into the sink.
pub fn render_board(board: &BoardModel, sink: &mut impl OutputSink) -> Result<()> {
    let mut raster = Rasterizer::new(board);
    raster.raster_board(sink)?;
    compose(&raster, sink);
    Ok(())
}
