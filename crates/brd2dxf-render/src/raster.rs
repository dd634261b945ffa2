//! Layer rasterization: board primitives to per-layer polygon rings.
//!
//! Each rasterizer turns one primitive into direct sink output (board
//! outline, drill holes, package drawing) and/or filled rings appended to a
//! per-layer accumulator. Accumulation is append-only; the compositor
//! consumes the accumulators read-only once every signal and element has
//! been rasterized.

use std::collections::{BTreeMap, HashMap};

use brd2dxf_core::{
    approximate_circle, rotate_point, stroke_outline, BoardModel, Element, Pad, PadShape,
    PackageCircle, PackageRectangle, Point, Ring, SignalPolygon, SmdPad, Via, Wire, CIRCLE_STEPS,
    OCTAGON_STEPS,
};
use tracing::{debug, warn};

use crate::compose::clip_to_frame;
use crate::error::{RenderError, Result};
use crate::sink::OutputSink;

/// Name of the top copper layer.
pub const TOP: &str = "Top";
/// Name of the bottom copper layer.
pub const BOTTOM: &str = "Bottom";
/// Output layer receiving every drilled hole.
pub const DRILLS: &str = "Drills";

fn area_key(layer: &str, signal: &str) -> String {
    format!("{layer}_{signal}")
}

/// All mutable conversion state for one run: the per-layer ring
/// accumulators, the per-(layer, signal) pour registry, and the board
/// outline frame. Owned by the top-level run function; never ambient.
pub struct Rasterizer<'a> {
    board: &'a BoardModel,
    /// Filled rings awaiting compositing, keyed by output layer name.
    polygons: BTreeMap<String, Vec<Ring>>,
    /// Raw pour vertices keyed by `<layer>_<signal>`. Presence of a key
    /// suppresses pad/via geometry for that signal on that layer;
    /// suppression is by name, not by geometric containment.
    pour_areas: HashMap<String, Vec<Ring>>,
    /// Board outline points accumulated from plain wires, used to clip
    /// copper pours to the board boundary.
    frame: Vec<Point>,
}

impl<'a> Rasterizer<'a> {
    pub fn new(board: &'a BoardModel) -> Self {
        Self {
            board,
            polygons: BTreeMap::new(),
            pour_areas: HashMap::new(),
            frame: Vec::new(),
        }
    }

    /// The per-layer ring accumulators, for the compositor.
    pub fn polygons(&self) -> &BTreeMap<String, Vec<Ring>> {
        &self.polygons
    }

    /// Whether a pour polygon already claims this (layer, signal) pair.
    pub fn has_pour(&self, layer: &str, signal: &str) -> bool {
        self.pour_areas.contains_key(&area_key(layer, signal))
    }

    /// Rasterizes the whole board in pipeline order: outline first (the
    /// frame must exist before pours are clipped), then signals in
    /// document order, then placed elements.
    pub fn raster_board(&mut self, sink: &mut impl OutputSink) -> Result<()> {
        for wire in &self.board.plain_wires {
            self.raster_outline_wire(wire, sink)?;
        }
        for signal in &self.board.signals {
            let name = signal.name.clone();
            for polygon in &signal.polygons {
                self.raster_signal_polygon(polygon, &name)?;
            }
            for via in &signal.vias {
                self.raster_via(via, &name, sink);
            }
            for wire in &signal.wires {
                self.raster_signal_wire(wire)?;
            }
        }
        for element in &self.board.elements {
            self.raster_element(element, sink)?;
        }
        debug!(
            layers = self.polygons.len(),
            pours = self.pour_areas.len(),
            "board rasterized"
        );
        Ok(())
    }

    fn layer_name(&self, number: u32) -> Result<String> {
        self.board
            .layer(number)
            .map(|layer| layer.name.clone())
            .ok_or(RenderError::UnknownLayer { number })
    }

    /// Board outline wire: a direct output line, also accumulated into the
    /// clipping frame.
    pub fn raster_outline_wire(&mut self, wire: &Wire, sink: &mut impl OutputSink) -> Result<()> {
        let layer = self.layer_name(wire.layer)?;
        sink.add_line(wire.from(), wire.to(), &layer, Some(wire.width * 100.0));
        self.frame.push(wire.from());
        self.frame.push(wire.to());
        Ok(())
    }

    /// Signal wire: two round end caps plus the capsule body, appended to
    /// the wire's layer accumulator. Wires always draw; they are never
    /// signal-filtered.
    pub fn raster_signal_wire(&mut self, wire: &Wire) -> Result<()> {
        let layer = self.layer_name(wire.layer)?;
        let radius = wire.width / 2.0;
        let rings = self.polygons.entry(layer).or_default();
        rings.push(approximate_circle(wire.from(), radius, CIRCLE_STEPS));
        rings.push(approximate_circle(wire.to(), radius, CIRCLE_STEPS));
        rings.push(stroke_outline(wire.from(), wire.to(), wire.width).to_vec());
        Ok(())
    }

    /// Via: the drill hole always goes straight to the output; the
    /// external annular circle lands on each outer copper layer unless a
    /// pour of the same signal already claims that layer.
    pub fn raster_via(&mut self, via: &Via, signal: &str, sink: &mut impl OutputSink) {
        let center = Point::new(via.x, via.y);
        sink.add_circle(center, via.drill / 2.0, DRILLS);

        let size = via
            .diameter
            .or_else(|| via.extent.map(|pct| via.drill / 2.0 + pct / 100.0))
            .unwrap_or(1.0);
        for layer in [TOP, BOTTOM] {
            if !self.has_pour(layer, signal) {
                self.polygons
                    .entry(layer.to_string())
                    .or_default()
                    .push(approximate_circle(center, size / 2.0, CIRCLE_STEPS));
            }
        }
    }

    /// Signal pour polygon: clipped to the board frame and accumulated on
    /// the separate `<Layer>Poly` accumulator; the raw vertices are
    /// recorded in the area registry so later pad/via geometry for the
    /// same (layer, signal) is suppressed.
    pub fn raster_signal_polygon(&mut self, polygon: &SignalPolygon, signal: &str) -> Result<()> {
        let layer = self.layer_name(polygon.layer)?;

        let clipped = clip_to_frame(&polygon.vertices, &self.frame);
        self.polygons
            .entry(format!("{layer}Poly"))
            .or_default()
            .extend(clipped);

        self.pour_areas
            .entry(area_key(&layer, signal))
            .or_default()
            .push(polygon.vertices.clone());
        Ok(())
    }

    fn raster_element(&mut self, element: &Element, sink: &mut impl OutputSink) -> Result<()> {
        let Some(package) = self.board.package(&element.library, &element.package) else {
            warn!(
                element = %element.name,
                library = %element.library,
                package = %element.package,
                "package definition not found, skipping element"
            );
            return Ok(());
        };
        let side = if element.rotation.mirrored { BOTTOM } else { TOP };

        // Package geometry is borrowed from the board while `self` mutates
        // the accumulators, so clone the primitive lists up front.
        let package = package.clone();
        for smd in &package.smds {
            self.raster_smd(smd, element, side);
        }
        for pad in &package.pads {
            self.raster_pad(pad, element, sink);
        }
        for rectangle in &package.rectangles {
            self.raster_package_rectangle(rectangle, element, sink)?;
        }
        for wire in &package.wires {
            self.raster_package_wire(wire, element, sink)?;
        }
        for circle in &package.circles {
            self.raster_package_circle(circle, element, sink)?;
        }
        Ok(())
    }

    /// Transforms a package-local point to board coordinates: mirrored x
    /// negation, element translation, element rotation about the element
    /// origin.
    fn place_local(&self, local: Point, element: &Element) -> Point {
        let x = if element.rotation.mirrored {
            -local.x
        } else {
            local.x
        };
        let mut placed = Point::new(element.x + x, element.y + local.y);
        if element.rotation.degrees != 0.0 {
            placed = rotate_point(
                Point::new(element.x, element.y),
                placed,
                element.rotation.radians(),
            );
        }
        placed
    }

    /// Through-hole pad: drill hole always emitted; the copper body lands
    /// on both outer layers unless suppressed by the area registry.
    pub fn raster_pad(&mut self, pad: &Pad, element: &Element, sink: &mut impl OutputSink) {
        let center = self.place_local(Point::new(pad.x, pad.y), element);
        sink.add_circle(center, pad.drill / 2.0, DRILLS);

        if let PadShape::Other(shape) = &pad.shape {
            warn!(
                pad = %pad.name,
                element = %element.name,
                shape = %shape,
                "unsupported pad shape, emitting drill hole only"
            );
            return;
        }

        let signal = self
            .board
            .signal_for_contact(&element.name, &pad.name)
            .to_string();

        if let Some(diameter) = pad.diameter {
            let steps = if pad.shape == PadShape::Octagon {
                OCTAGON_STEPS
            } else {
                CIRCLE_STEPS
            };
            for layer in [TOP, BOTTOM] {
                if !self.has_pour(layer, &signal) {
                    self.polygons
                        .entry(layer.to_string())
                        .or_default()
                        .push(approximate_circle(center, diameter / 2.0, steps));
                }
            }
        } else {
            self.raster_long_pad(pad, element, center, &signal);
        }
    }

    /// Elongated capsule pad: two round caps at +/- size plus the
    /// rectangular body. The cap/corner offsets rotate with the pad's own
    /// rotation about the pad center; the element rotation is applied on
    /// top only when the pad carries its own rotation attribute.
    fn raster_long_pad(&mut self, pad: &Pad, element: &Element, center: Point, signal: &str) {
        let size = pad.drill / 3.0 * 2.0;
        let place = |p: Point| -> Point {
            let mut p = p;
            if let Some(rotation) = pad.rotation {
                if rotation.degrees != 0.0 {
                    p = rotate_point(center, p, rotation.radians());
                }
                if element.rotation.degrees != 0.0 {
                    p = rotate_point(center, p, element.rotation.radians());
                }
            }
            p
        };

        let cap1 = place(Point::new(center.x + size, center.y));
        let cap2 = place(Point::new(center.x - size, center.y));
        let c1 = place(Point::new(center.x + size, center.y - size));
        let c2 = place(Point::new(center.x - size, center.y - size));
        let c3 = place(Point::new(center.x + size, center.y + size));
        let c4 = place(Point::new(center.x - size, center.y + size));

        for layer in [TOP, BOTTOM] {
            if !self.has_pour(layer, signal) {
                let rings = self.polygons.entry(layer.to_string()).or_default();
                rings.push(approximate_circle(cap1, size, CIRCLE_STEPS));
                rings.push(approximate_circle(cap2, size, CIRCLE_STEPS));
                rings.push(vec![c1, c2, c4, c3]);
            }
        }
    }

    /// SMD pad: element rotation about the element origin first, then the
    /// pad's own rotation about the rectangle center (the reverse order of
    /// through-hole pads). The rectangle joins the side's plain
    /// accumulator only when not suppressed, and always joins the
    /// `<side>SMD` accumulator.
    pub fn raster_smd(&mut self, smd: &SmdPad, element: &Element, side: &str) {
        let center = {
            let x = if element.rotation.mirrored { -smd.x } else { smd.x };
            Point::new(element.x + x, element.y + smd.y)
        };
        let mut c1 = Point::new(center.x - smd.dx / 2.0, center.y - smd.dy / 2.0);
        let mut c2 = Point::new(center.x + smd.dx / 2.0, center.y + smd.dy / 2.0);

        if element.rotation.degrees != 0.0 {
            let origin = Point::new(element.x, element.y);
            c1 = rotate_point(origin, c1, element.rotation.radians());
            c2 = rotate_point(origin, c2, element.rotation.radians());
        }
        if let Some(rotation) = smd.rotation {
            if rotation.degrees != 0.0 {
                let rect_center =
                    Point::new(c1.x + (c2.x - c1.x) / 2.0, c1.y + (c2.y - c1.y) / 2.0);
                c1 = rotate_point(rect_center, c1, rotation.radians());
                c2 = rotate_point(rect_center, c2, rotation.radians());
            }
        }

        let ring = vec![
            Point::new(c1.x, c1.y),
            Point::new(c1.x, c2.y),
            Point::new(c2.x, c2.y),
            Point::new(c2.x, c1.y),
        ];

        let signal = self
            .board
            .signal_for_contact(&element.name, &smd.name)
            .to_string();
        if !self.has_pour(side, &signal) {
            self.polygons
                .entry(side.to_string())
                .or_default()
                .push(ring.clone());
        }
        self.polygons
            .entry(format!("{side}SMD"))
            .or_default()
            .push(ring);
    }

    /// Package wire: documentation geometry, emitted directly as an
    /// output line on its own resolved layer.
    pub fn raster_package_wire(
        &mut self,
        wire: &Wire,
        element: &Element,
        sink: &mut impl OutputSink,
    ) -> Result<()> {
        let layer = self.layer_name(wire.layer)?;
        let p1 = self.place_local(wire.from(), element);
        let p2 = self.place_local(wire.to(), element);
        sink.add_line(p1, p2, &layer, Some(wire.width * 100.0));
        Ok(())
    }

    /// Package circle: documentation geometry, emitted directly.
    pub fn raster_package_circle(
        &mut self,
        circle: &PackageCircle,
        element: &Element,
        sink: &mut impl OutputSink,
    ) -> Result<()> {
        let layer = self.layer_name(circle.layer)?;
        let center = self.place_local(Point::new(circle.x, circle.y), element);
        sink.add_circle(center, circle.radius, &layer);
        Ok(())
    }

    /// Package rectangle: four output lines through the two transformed
    /// corner points.
    pub fn raster_package_rectangle(
        &mut self,
        rectangle: &PackageRectangle,
        element: &Element,
        sink: &mut impl OutputSink,
    ) -> Result<()> {
        let layer = self.layer_name(rectangle.layer)?;
        let c1 = self.place_local(Point::new(rectangle.x1, rectangle.y1), element);
        let c2 = self.place_local(Point::new(rectangle.x2, rectangle.y2), element);
        sink.add_line(c1, Point::new(c1.x, c2.y), &layer, None);
        sink.add_line(Point::new(c1.x, c2.y), c2, &layer, None);
        sink.add_line(c2, Point::new(c2.x, c1.y), &layer, None);
        sink.add_line(Point::new(c2.x, c1.y), c1, &layer, None);
        Ok(())
    }
}
