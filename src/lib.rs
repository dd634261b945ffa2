//! # brd2dxf
//!
//! Converts EAGLE CAD board files (`.brd` XML) to DXF vector drawings:
//! copper traces, pads, vias and pours are reconstructed as filled regions,
//! merged per layer, and emitted as closed outlines suitable for CNC
//! isolation milling or documentation.
//!
//! The workspace is organized as two library crates plus this binary:
//!
//! 1. **brd2dxf-core** - geometry primitives, board model, XML extraction
//! 2. **brd2dxf-render** - rasterization, compositing, DXF output
//! 3. **brd2dxf** - the command-line frontend

pub use brd2dxf_core::{parse_board, BoardModel};
pub use brd2dxf_render::{
    render_board, simplification_groups, DxfWriter, OutputOptions, RenderError,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output on stderr (the DXF may go to stdout-adjacent paths)
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    Ok(())
}
