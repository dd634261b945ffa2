//! Board model extraction from EAGLE `.brd` XML.
//!
//! Walks the parsed document in a single pass per section and validates
//! every attribute up front: malformed numbers and missing required
//! attributes are fatal here, before any geometry work starts. Sections a
//! minimal board may omit (plain, signals, libraries, elements) extract as
//! empty collections.

use roxmltree::{Document, Node};
use tracing::debug;

use crate::error::{BoardError, Result};
use crate::geometry::Point;
use crate::model::{
    BoardModel, ContactRef, Element, LayerDef, Library, Package, Pad, PadShape, PackageCircle,
    PackageRectangle, Rotation, Signal, SignalPolygon, SmdPad, Via, Wire,
};

/// Parses an EAGLE board document into a [`BoardModel`].
pub fn parse_board(xml: &str) -> Result<BoardModel> {
    let doc = Document::parse(xml)?;
    let root = doc.root_element();
    if root.tag_name().name() != "eagle" {
        return Err(BoardError::InvalidStructure(format!(
            "expected root element 'eagle', found '{}'",
            root.tag_name().name()
        )));
    }

    let drawing = child_element(&root, "drawing").ok_or(BoardError::MissingElement("drawing"))?;
    let layers_node =
        child_element(&drawing, "layers").ok_or(BoardError::MissingElement("layers"))?;
    let board = child_element(&drawing, "board").ok_or(BoardError::MissingElement("board"))?;

    let layers = parse_layers(&layers_node)?;

    let mut plain_wires = Vec::new();
    let mut signals = Vec::new();
    let mut libraries = Vec::new();
    let mut elements = Vec::new();

    for section in board.children().filter(|n| n.is_element()) {
        match section.tag_name().name() {
            "plain" => {
                for node in section.children().filter(|n| n.has_tag_name("wire")) {
                    plain_wires.push(parse_wire(&node)?);
                }
            }
            "signals" => {
                for node in section.children().filter(|n| n.has_tag_name("signal")) {
                    signals.push(parse_signal(&node)?);
                }
            }
            "libraries" => {
                for node in section.children().filter(|n| n.has_tag_name("library")) {
                    libraries.push(parse_library(&node)?);
                }
            }
            "elements" => {
                for node in section.children().filter(|n| n.has_tag_name("element")) {
                    elements.push(parse_element(&node)?);
                }
            }
            _ => {}
        }
    }

    debug!(
        layers = layers.len(),
        plain_wires = plain_wires.len(),
        signals = signals.len(),
        libraries = libraries.len(),
        elements = elements.len(),
        "board extracted"
    );

    Ok(BoardModel::new(
        layers,
        plain_wires,
        signals,
        libraries,
        elements,
    ))
}

fn parse_layers(node: &Node) -> Result<Vec<LayerDef>> {
    let mut layers = Vec::new();
    for layer in node.children().filter(|n| n.has_tag_name("layer")) {
        layers.push(LayerDef {
            number: required_u32(&layer, "number", "layer")?,
            name: required_attr(&layer, "name", "layer")?.to_string(),
            color: required_i32(&layer, "color", "layer")?,
            fill: required_i32(&layer, "fill", "layer")?,
        });
    }
    Ok(layers)
}

fn parse_signal(node: &Node) -> Result<Signal> {
    let mut signal = Signal {
        name: node.attribute("name").unwrap_or_default().to_string(),
        ..Signal::default()
    };
    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "contactref" => signal.contacts.push(ContactRef {
                element: required_attr(&child, "element", "contactref")?.to_string(),
                pad: required_attr(&child, "pad", "contactref")?.to_string(),
            }),
            "wire" => signal.wires.push(parse_wire(&child)?),
            "via" => signal.vias.push(parse_via(&child)?),
            "polygon" => signal.polygons.push(parse_polygon(&child)?),
            _ => {}
        }
    }
    Ok(signal)
}

fn parse_wire(node: &Node) -> Result<Wire> {
    Ok(Wire {
        x1: required_f64(node, "x1", "wire")?,
        y1: required_f64(node, "y1", "wire")?,
        x2: required_f64(node, "x2", "wire")?,
        y2: required_f64(node, "y2", "wire")?,
        width: required_f64(node, "width", "wire")?,
        layer: required_u32(node, "layer", "wire")?,
    })
}

fn parse_via(node: &Node) -> Result<Via> {
    Ok(Via {
        x: required_f64(node, "x", "via")?,
        y: required_f64(node, "y", "via")?,
        drill: required_f64(node, "drill", "via")?,
        diameter: optional_f64(node, "diameter", "via")?,
        extent: parse_extent(node)?,
    })
}

/// The extent attribute spans layers ("1-16"); the outer value is kept for
/// sizing vias without an explicit diameter.
fn parse_extent(node: &Node) -> Result<Option<f64>> {
    let Some(raw) = node.attribute("extent") else {
        return Ok(None);
    };
    let outer = raw.split('-').nth(1).unwrap_or(raw);
    outer
        .parse::<f64>()
        .map(Some)
        .map_err(|_| BoardError::InvalidNumber {
            element: "via",
            attr: "extent",
            value: raw.to_string(),
        })
}

fn parse_polygon(node: &Node) -> Result<SignalPolygon> {
    let mut vertices = Vec::new();
    for vertex in node.children().filter(|n| n.has_tag_name("vertex")) {
        vertices.push(Point::new(
            required_f64(&vertex, "x", "vertex")?,
            required_f64(&vertex, "y", "vertex")?,
        ));
    }
    Ok(SignalPolygon {
        width: required_f64(node, "width", "polygon")?,
        layer: required_u32(node, "layer", "polygon")?,
        vertices,
    })
}

fn parse_library(node: &Node) -> Result<Library> {
    let mut library = Library {
        name: required_attr(node, "name", "library")?.to_string(),
        ..Library::default()
    };
    if let Some(packages) = child_element(node, "packages") {
        for package in packages.children().filter(|n| n.has_tag_name("package")) {
            library.packages.push(parse_package(&package)?);
        }
    }
    Ok(library)
}

fn parse_package(node: &Node) -> Result<Package> {
    let mut package = Package {
        name: required_attr(node, "name", "package")?.to_string(),
        ..Package::default()
    };
    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "pad" => package.pads.push(parse_pad(&child)?),
            "smd" => package.smds.push(parse_smd(&child)?),
            "wire" => package.wires.push(parse_wire(&child)?),
            "circle" => package.circles.push(PackageCircle {
                x: required_f64(&child, "x", "circle")?,
                y: required_f64(&child, "y", "circle")?,
                radius: required_f64(&child, "radius", "circle")?,
                width: required_f64(&child, "width", "circle")?,
                layer: required_u32(&child, "layer", "circle")?,
            }),
            "rectangle" => package.rectangles.push(PackageRectangle {
                x1: required_f64(&child, "x1", "rectangle")?,
                y1: required_f64(&child, "y1", "rectangle")?,
                x2: required_f64(&child, "x2", "rectangle")?,
                y2: required_f64(&child, "y2", "rectangle")?,
                layer: required_u32(&child, "layer", "rectangle")?,
            }),
            _ => {}
        }
    }
    Ok(package)
}

fn parse_pad(node: &Node) -> Result<Pad> {
    Ok(Pad {
        name: required_attr(node, "name", "pad")?.to_string(),
        x: required_f64(node, "x", "pad")?,
        y: required_f64(node, "y", "pad")?,
        drill: required_f64(node, "drill", "pad")?,
        diameter: optional_f64(node, "diameter", "pad")?,
        shape: PadShape::parse(node.attribute("shape")),
        rotation: parse_rotation(node)?,
    })
}

fn parse_smd(node: &Node) -> Result<SmdPad> {
    Ok(SmdPad {
        name: required_attr(node, "name", "smd")?.to_string(),
        x: required_f64(node, "x", "smd")?,
        y: required_f64(node, "y", "smd")?,
        dx: required_f64(node, "dx", "smd")?,
        dy: required_f64(node, "dy", "smd")?,
        layer: required_u32(node, "layer", "smd")?,
        rotation: parse_rotation(node)?,
    })
}

fn parse_element(node: &Node) -> Result<Element> {
    Ok(Element {
        name: required_attr(node, "name", "element")?.to_string(),
        library: required_attr(node, "library", "element")?.to_string(),
        package: required_attr(node, "package", "element")?.to_string(),
        x: required_f64(node, "x", "element")?,
        y: required_f64(node, "y", "element")?,
        rotation: parse_rotation(node)?.unwrap_or_default(),
    })
}

fn parse_rotation(node: &Node) -> Result<Option<Rotation>> {
    node.attribute("rot").map(Rotation::parse).transpose()
}

fn child_element<'a, 'input>(
    node: &Node<'a, 'input>,
    name: &str,
) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(name))
}

fn required_attr<'a>(node: &Node<'a, '_>, attr: &'static str, element: &'static str) -> Result<&'a str> {
    node.attribute(attr)
        .ok_or(BoardError::MissingAttribute { element, attr })
}

fn required_f64(node: &Node, attr: &'static str, element: &'static str) -> Result<f64> {
    let raw = required_attr(node, attr, element)?;
    raw.parse::<f64>().map_err(|_| BoardError::InvalidNumber {
        element,
        attr,
        value: raw.to_string(),
    })
}

fn optional_f64(node: &Node, attr: &'static str, element: &'static str) -> Result<Option<f64>> {
    let Some(raw) = node.attribute(attr) else {
        return Ok(None);
    };
    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| BoardError::InvalidNumber {
            element,
            attr,
            value: raw.to_string(),
        })
}

fn required_u32(node: &Node, attr: &'static str, element: &'static str) -> Result<u32> {
    let raw = required_attr(node, attr, element)?;
    raw.parse::<u32>().map_err(|_| BoardError::InvalidNumber {
        element,
        attr,
        value: raw.to_string(),
    })
}

fn required_i32(node: &Node, attr: &'static str, element: &'static str) -> Result<i32> {
    let raw = required_attr(node, attr, element)?;
    raw.parse::<i32>().map_err(|_| BoardError::InvalidNumber {
        element,
        attr,
        value: raw.to_string(),
    })
}
