//! Error types for rasterization and DXF output.

use thiserror::Error;

/// Errors raised while rasterizing a board or writing the DXF output.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A primitive referenced a layer number absent from the layer table.
    #[error("Unknown layer number {number}")]
    UnknownLayer {
        /// The unresolved layer number.
        number: u32,
    },

    /// I/O error while writing the output file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// DXF serialization error.
    #[error("DXF write error: {0}")]
    Dxf(#[from] dxf::DxfError),
}

/// Result type alias for rendering operations.
pub type Result<T> = std::result::Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_layer_display() {
        let err = RenderError::UnknownLayer { number: 42 };
        assert_eq!(err.to_string(), "Unknown layer number 42");
    }
}
