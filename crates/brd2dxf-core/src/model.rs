//! Data model of an EAGLE board.
//!
//! Primitives are plain tagged records with validated numeric fields; every
//! attribute is parsed once at extraction time and never re-interpreted
//! downstream. Layer references are kept as raw layer numbers and resolved
//! against the layer table during rasterization.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{BoardError, Result};
use crate::geometry::Point;

/// A rotation/mirror placement flag, parsed from the string form
/// ("R90", "MR180", "M180").
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    /// Placed mirrored (on the bottom side of the board).
    pub mirrored: bool,
    /// Rotation angle in degrees, counter-clockwise.
    pub degrees: f64,
}

impl Rotation {
    /// Parses an EAGLE rotation string.
    ///
    /// The mirror flag is a leading `M`; the angle follows an optional `S`
    /// (spin) flag and an optional `R` prefix.
    pub fn parse(value: &str) -> Result<Self> {
        let mut rest = value;
        let mirrored = rest.starts_with('M');
        if mirrored {
            rest = &rest[1..];
        }
        rest = rest.strip_prefix('S').unwrap_or(rest);
        rest = rest.strip_prefix('R').unwrap_or(rest);
        let degrees = rest
            .parse::<f64>()
            .map_err(|_| BoardError::InvalidRotation(value.to_string()))?;
        Ok(Self { mirrored, degrees })
    }

    /// The rotation angle in radians.
    pub fn radians(&self) -> f64 {
        self.degrees.to_radians()
    }
}

/// A layer definition from the board's layer table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDef {
    pub number: u32,
    pub name: String,
    /// Display color index.
    pub color: i32,
    /// Fill style index.
    pub fill: i32,
}

/// A stroked straight segment, used both for signal traces and for
/// package outline drawing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wire {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub width: f64,
    pub layer: u32,
}

impl Wire {
    pub fn from(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    pub fn to(&self) -> Point {
        Point::new(self.x2, self.y2)
    }
}

/// A plated through-hole connecting the outer copper layers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Via {
    pub x: f64,
    pub y: f64,
    pub drill: f64,
    /// External diameter, when given explicitly.
    pub diameter: Option<f64>,
    /// Outer value of the layer-extent attribute ("1-16" keeps 16).
    pub extent: Option<f64>,
}

/// A copper pour polygon belonging to one signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalPolygon {
    pub width: f64,
    pub layer: u32,
    pub vertices: Vec<Point>,
}

/// Through-hole pad shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PadShape {
    /// Circular pad (the default when no shape attribute is present).
    Round,
    Octagon,
    /// Elongated capsule pad.
    Long,
    /// Any shape this converter does not reconstruct.
    Other(String),
}

impl PadShape {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            None | Some("round") => PadShape::Round,
            Some("octagon") => PadShape::Octagon,
            Some("long") => PadShape::Long,
            Some(other) => PadShape::Other(other.to_string()),
        }
    }
}

/// A through-hole pad in package-local coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pad {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub drill: f64,
    pub diameter: Option<f64>,
    pub shape: PadShape,
    pub rotation: Option<Rotation>,
}

/// A surface-mount pad in package-local coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmdPad {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub dx: f64,
    pub dy: f64,
    pub layer: u32,
    pub rotation: Option<Rotation>,
}

/// A drawn circle in a package (documentation/outline geometry).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PackageCircle {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub width: f64,
    pub layer: u32,
}

/// A drawn rectangle in a package (documentation/outline geometry).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PackageRectangle {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub layer: u32,
}

/// A package definition: a template of primitives in local coordinates,
/// instantiated once per element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub pads: Vec<Pad>,
    pub smds: Vec<SmdPad>,
    pub wires: Vec<Wire>,
    pub circles: Vec<PackageCircle>,
    pub rectangles: Vec<PackageRectangle>,
}

/// A library of package definitions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Library {
    pub name: String,
    pub packages: Vec<Package>,
}

/// A placed component referencing a package by library and name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub name: String,
    pub library: String,
    pub package: String,
    pub x: f64,
    pub y: f64,
    pub rotation: Rotation,
}

/// A reference from a signal to one pad of one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRef {
    pub element: String,
    pub pad: String,
}

/// An electrical net with its copper primitives and contact references.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub name: String,
    pub contacts: Vec<ContactRef>,
    pub wires: Vec<Wire>,
    pub vias: Vec<Via>,
    pub polygons: Vec<SignalPolygon>,
}

/// The fully extracted board: layer table, outline, signals and placed
/// components. Read once, held in memory for the duration of one
/// conversion run.
#[derive(Debug, Clone, Default)]
pub struct BoardModel {
    /// Layer definitions in document order.
    pub layers: Vec<LayerDef>,
    /// Board outline ("plain") wires.
    pub plain_wires: Vec<Wire>,
    /// Signals in document order.
    pub signals: Vec<Signal>,
    pub libraries: Vec<Library>,
    pub elements: Vec<Element>,
    layer_index: HashMap<u32, usize>,
}

impl BoardModel {
    pub fn new(
        layers: Vec<LayerDef>,
        plain_wires: Vec<Wire>,
        signals: Vec<Signal>,
        libraries: Vec<Library>,
        elements: Vec<Element>,
    ) -> Self {
        let layer_index = layers
            .iter()
            .enumerate()
            .map(|(i, layer)| (layer.number, i))
            .collect();
        Self {
            layers,
            plain_wires,
            signals,
            libraries,
            elements,
            layer_index,
        }
    }

    /// Looks up a layer definition by number.
    pub fn layer(&self, number: u32) -> Option<&LayerDef> {
        self.layer_index.get(&number).map(|i| &self.layers[*i])
    }

    /// Looks up a layer definition by name.
    pub fn layer_by_name(&self, name: &str) -> Option<&LayerDef> {
        self.layers.iter().find(|layer| layer.name == name)
    }

    /// Finds a package definition by library and package name.
    pub fn package(&self, library: &str, package: &str) -> Option<&Package> {
        self.libraries
            .iter()
            .find(|lib| lib.name == library)?
            .packages
            .iter()
            .find(|pkg| pkg.name == package)
    }

    /// Resolves the signal owning a given (element, pad) contact.
    ///
    /// Signals are scanned in document order and the first matching contact
    /// reference wins; an unmatched contact yields the empty signal name.
    /// O(signals x contacts) per lookup, which is fine for typical boards.
    pub fn signal_for_contact(&self, element: &str, pad: &str) -> &str {
        for signal in &self.signals {
            for contact in &signal.contacts {
                if contact.element == element && contact.pad == pad {
                    return &signal.name;
                }
            }
        }
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_parse_plain() {
        let rot = Rotation::parse("R90").unwrap();
        assert!(!rot.mirrored);
        assert_eq!(rot.degrees, 90.0);
    }

    #[test]
    fn test_rotation_parse_mirrored() {
        let rot = Rotation::parse("MR180").unwrap();
        assert!(rot.mirrored);
        assert_eq!(rot.degrees, 180.0);

        // Bare mirror form without the R prefix.
        let rot = Rotation::parse("M180").unwrap();
        assert!(rot.mirrored);
        assert_eq!(rot.degrees, 180.0);
    }

    #[test]
    fn test_rotation_parse_fractional() {
        let rot = Rotation::parse("R22.5").unwrap();
        assert!((rot.degrees - 22.5).abs() < 1e-12);
        assert!((rot.radians() - 22.5_f64.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn test_rotation_parse_invalid() {
        assert!(Rotation::parse("Rabc").is_err());
        assert!(Rotation::parse("").is_err());
    }

    #[test]
    fn test_pad_shape_parse() {
        assert_eq!(PadShape::parse(None), PadShape::Round);
        assert_eq!(PadShape::parse(Some("round")), PadShape::Round);
        assert_eq!(PadShape::parse(Some("octagon")), PadShape::Octagon);
        assert_eq!(PadShape::parse(Some("long")), PadShape::Long);
        assert_eq!(
            PadShape::parse(Some("offset")),
            PadShape::Other("offset".to_string())
        );
    }

    fn signal_with_contact(name: &str, element: &str, pad: &str) -> Signal {
        Signal {
            name: name.to_string(),
            contacts: vec![ContactRef {
                element: element.to_string(),
                pad: pad.to_string(),
            }],
            ..Signal::default()
        }
    }

    #[test]
    fn test_signal_for_contact_first_match_wins() {
        let board = BoardModel::new(
            Vec::new(),
            Vec::new(),
            vec![
                signal_with_contact("GND", "U1", "1"),
                signal_with_contact("VCC", "U1", "1"),
            ],
            Vec::new(),
            Vec::new(),
        );
        assert_eq!(board.signal_for_contact("U1", "1"), "GND");
        assert_eq!(board.signal_for_contact("U1", "2"), "");
    }

    #[test]
    fn test_layer_lookup() {
        let board = BoardModel::new(
            vec![LayerDef {
                number: 1,
                name: "Top".to_string(),
                color: 4,
                fill: 1,
            }],
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );
        assert_eq!(board.layer(1).unwrap().name, "Top");
        assert!(board.layer(16).is_none());
        assert_eq!(board.layer_by_name("Top").unwrap().number, 1);
    }
}
