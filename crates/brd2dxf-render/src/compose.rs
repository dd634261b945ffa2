//! Layer compositing: accumulated rings to merged outlines.
//!
//! The rasterizer produces overlapping rings per output layer; this module
//! unions them into disjoint regions and emits each region's exterior
//! outline as closed polylines. The outer copper layers additionally get an
//! expanded variant on `<layer>_inner` approximating the soldermask opening.
//!
//! Interior holes of a merged region are dropped: only exterior boundaries
//! are drawn.

use csgrs::sketch::Sketch;
use csgrs::traits::CSG;
use tracing::debug;

use brd2dxf_core::{approximate_circle, stroke_outline, Point, Ring, CIRCLE_STEPS};

use crate::raster::{Rasterizer, BOTTOM, TOP};
use crate::sink::OutputSink;

/// Expansion margin (board units) for the soldermask view of the outer
/// copper layers.
pub const MASK_MARGIN: f64 = 0.1;

/// Converts a ring to a sketch polygon. Consecutive duplicate points and
/// the repeated closing point are removed first; rings that degenerate to
/// fewer than three distinct points produce an empty sketch.
fn ring_to_sketch(ring: &[Point]) -> Sketch<()> {
    let mut points: Vec<[f64; 2]> = Vec::with_capacity(ring.len());
    for p in ring {
        if points
            .last()
            .is_none_or(|last| last[0] != p.x || last[1] != p.y)
        {
            points.push([p.x, p.y]);
        }
    }
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    if points.len() < 3 {
        return Sketch::new();
    }
    Sketch::polygon(&points, None)
}

/// Unions a set of rings into one sketch.
fn union_rings(rings: &[Ring]) -> Sketch<()> {
    rings
        .iter()
        .fold(Sketch::new(), |acc, ring| acc.union(&ring_to_sketch(ring)))
}

/// Exterior rings of every disjoint region in the sketch.
fn exterior_rings(sketch: &Sketch<()>) -> Vec<Ring> {
    sketch
        .to_multipolygon()
        .0
        .iter()
        .map(|poly| {
            poly.exterior()
                .0
                .iter()
                .map(|coord| Point::new(coord.x, coord.y))
                .collect()
        })
        .collect()
}

/// Clips a pour polygon to the board outline frame.
///
/// The frame is the point sequence collected from outline wires; with
/// fewer than three points there is no usable boundary and the raw pour is
/// kept unclipped.
pub fn clip_to_frame(vertices: &[Point], frame: &[Point]) -> Vec<Ring> {
    if frame.len() < 3 {
        return vec![vertices.to_vec()];
    }
    let clipped = ring_to_sketch(vertices).intersection(&ring_to_sketch(frame));
    exterior_rings(&clipped)
}

/// Expands a ring outward by `margin`: the ring itself, unioned with a
/// capsule along each edge and a circle at each vertex. Equivalent to a
/// Minkowski sum with a disc, up to the N-gon circle approximation.
fn buffer_ring(ring: &[Point], margin: f64) -> Sketch<()> {
    let mut sketch = ring_to_sketch(ring);
    for p in ring {
        sketch = sketch.union(&ring_to_sketch(&approximate_circle(*p, margin, CIRCLE_STEPS)));
    }
    for pair in ring.windows(2) {
        if pair[0].distance_to(&pair[1]) < 1e-9 {
            continue;
        }
        sketch = sketch.union(&ring_to_sketch(&stroke_outline(
            pair[0],
            pair[1],
            margin * 2.0,
        )));
    }
    sketch
}

/// Emits a closed ring as line segments, starting from the last vertex so
/// the outline closes. Zero-length segments are skipped.
fn emit_closed_polyline(ring: &[Point], layer: &str, sink: &mut impl OutputSink) {
    let Some(&last) = ring.last() else {
        return;
    };
    let mut prev = last;
    for &p in ring {
        if prev.distance_to(&p) > 1e-12 {
            sink.add_line(prev, p, layer, None);
        }
        prev = p;
    }
}

/// Merges every accumulated layer and writes the outlines to the sink.
///
/// The outer copper layers are emitted twice: once expanded by
/// [`MASK_MARGIN`] on `<layer>_inner`, then plain on the layer itself.
pub fn compose(raster: &Rasterizer, sink: &mut impl OutputSink) {
    for (layer, rings) in raster.polygons() {
        if layer == TOP || layer == BOTTOM {
            let expanded = rings
                .iter()
                .fold(Sketch::new(), |acc, ring| acc.union(&buffer_ring(ring, MASK_MARGIN)));
            let inner = format!("{layer}_inner");
            for outline in exterior_rings(&expanded) {
                emit_closed_polyline(&outline, &inner, sink);
            }
        }

        let merged = union_rings(rings);
        let outlines = exterior_rings(&merged);
        debug!(layer = %layer, rings = rings.len(), regions = outlines.len(), "layer composited");
        for outline in outlines {
            emit_closed_polyline(&outline, layer, sink);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordingSink;

    fn circle_ring(cx: f64, cy: f64, radius: f64) -> Ring {
        approximate_circle(Point::new(cx, cy), radius, CIRCLE_STEPS)
    }

    #[test]
    fn test_overlapping_circles_merge_to_one_region() {
        let merged = union_rings(&[circle_ring(0.0, 0.0, 1.0), circle_ring(1.0, 0.0, 1.0)]);
        assert_eq!(exterior_rings(&merged).len(), 1);
    }

    #[test]
    fn test_disjoint_circles_stay_separate() {
        let merged = union_rings(&[circle_ring(0.0, 0.0, 1.0), circle_ring(10.0, 0.0, 1.0)]);
        assert_eq!(exterior_rings(&merged).len(), 2);
    }

    #[test]
    fn test_degenerate_ring_is_empty() {
        let ring = vec![Point::new(1.0, 1.0), Point::new(1.0, 1.0)];
        assert!(exterior_rings(&ring_to_sketch(&ring)).is_empty());
    }

    #[test]
    fn test_clip_to_frame_without_frame_keeps_raw() {
        let vertices = vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 4.0),
        ];
        let clipped = clip_to_frame(&vertices, &[]);
        assert_eq!(clipped, vec![vertices]);
    }

    #[test]
    fn test_clip_to_frame_trims_overhang() {
        // Unit-height pour sticking out past a 2x2 frame.
        let vertices = vec![
            Point::new(1.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(5.0, 1.0),
            Point::new(1.0, 1.0),
        ];
        let frame = vec![
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(0.0, 2.0),
        ];
        let clipped = clip_to_frame(&vertices, &frame);
        assert_eq!(clipped.len(), 1);
        for p in &clipped[0] {
            assert!(p.x <= 2.0 + 1e-9);
        }
    }

    #[test]
    fn test_buffer_ring_grows_outline() {
        let ring = circle_ring(0.0, 0.0, 1.0);
        let expanded = buffer_ring(&ring, 0.5);
        let outlines = exterior_rings(&expanded);
        assert_eq!(outlines.len(), 1);
        let center = Point::new(0.0, 0.0);
        let max = outlines[0]
            .iter()
            .map(|p| p.distance_to(&center))
            .fold(0.0, f64::max);
        assert!(max > 1.3, "expanded radius {max} should exceed the original");
    }

    #[test]
    fn test_emit_closed_polyline_closes_ring() {
        let mut sink = RecordingSink::new();
        let ring = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
        ];
        emit_closed_polyline(&ring, "Top", &mut sink);
        let lines: Vec<_> = sink.lines_on("Top").collect();
        assert_eq!(lines.len(), 3);
        // First segment runs from the last vertex back to the first.
        assert!((lines[0].0.x - 1.0).abs() < 1e-12);
        assert!((lines[0].0.y - 1.0).abs() < 1e-12);
    }
}
