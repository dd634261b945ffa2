//! Output sink abstraction and the DXF writer behind it.
//!
//! The rasterizer and compositor only ever talk to [`OutputSink`]; the DXF
//! writer buffers everything it receives and builds the drawing once, so
//! layer filtering and simplification never have to mutate a live document.

use std::collections::BTreeSet;
use std::path::Path;

use brd2dxf_core::{BoardModel, Point};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Receives the converter's output geometry, tagged by layer name.
pub trait OutputSink {
    /// Adds a straight line segment. `lineweight` follows the DXF
    /// convention of hundredths of a millimeter.
    fn add_line(&mut self, p1: Point, p2: Point, layer: &str, lineweight: Option<f64>);

    /// Adds a full circle.
    fn add_circle(&mut self, center: Point, radius: f64, layer: &str);
}

/// A named layer-merging preset: source layers collapsed into one output
/// layer with a fixed display color.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplificationGroup {
    pub name: String,
    /// AutoCAD color index for the merged layer.
    pub color: u8,
    /// Source layer names merged into this group.
    pub layers: Vec<String>,
}

/// The built-in simplification profiles applied by `--simple`.
pub fn simplification_groups() -> Vec<SimplificationGroup> {
    let group = |name: &str, color: u8, layers: &[&str]| SimplificationGroup {
        name: name.to_string(),
        color,
        layers: layers.iter().map(|s| s.to_string()).collect(),
    };
    vec![
        group("top_copper", 1, &["Top"]),
        group("bottom_copper", 5, &["Bottom"]),
        group("all_drills", 2, &["Drills"]),
        group("top_print", 9, &["tDocu", "tPlace"]),
        group("bottom_print", 9, &["bDocu", "bPlace"]),
        group("top_glue", 7, &["tGlue"]),
        group("bottom_glue", 7, &["bGlue"]),
        group("board", 3, &["Dimension"]),
        group("top_smd", 3, &["TopSMD"]),
        group("bottom_smd", 3, &["BottomSMD"]),
    ]
}

/// Preferred AutoCAD color index for well-known board layers; layers not
/// listed here fall back to the color from the board's layer table.
fn preset_color(layer: &str) -> Option<u8> {
    match layer {
        "Top" | "TopPoly" | "TopSMD" => Some(1),
        "Drills" => Some(2),
        "Pads" | "Vias" => Some(3),
        "Dimension" => Some(4),
        "Bottom" | "BottomPoly" | "BottomSMD" => Some(5),
        "tDocu" | "bDocu" => Some(7),
        "tKeepout" | "bKeepout" => Some(8),
        "tPlace" | "bPlace" => Some(9),
        _ => None,
    }
}

/// Post-hoc output shaping owned by the caller.
#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    /// Merge layers into the named simplification groups; entities on
    /// layers outside every group are dropped.
    pub simple: bool,
    /// Keep only these layers (empty keeps everything).
    pub layer_filter: Vec<String>,
}

#[derive(Debug, Clone)]
enum EntityShape {
    Line {
        p1: Point,
        p2: Point,
        lineweight: Option<f64>,
    },
    Circle {
        center: Point,
        radius: f64,
    },
}

#[derive(Debug, Clone)]
struct PendingEntity {
    layer: String,
    shape: EntityShape,
}

/// Buffering DXF writer implementing [`OutputSink`].
#[derive(Debug, Default)]
pub struct DxfWriter {
    entities: Vec<PendingEntity>,
}

impl OutputSink for DxfWriter {
    fn add_line(&mut self, p1: Point, p2: Point, layer: &str, lineweight: Option<f64>) {
        self.entities.push(PendingEntity {
            layer: layer.to_string(),
            shape: EntityShape::Line { p1, p2, lineweight },
        });
    }

    fn add_circle(&mut self, center: Point, radius: f64, layer: &str) {
        self.entities.push(PendingEntity {
            layer: layer.to_string(),
            shape: EntityShape::Circle { center, radius },
        });
    }
}

impl DxfWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of buffered entities (before filtering).
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Layer names currently carrying entities.
    pub fn used_layers(&self) -> BTreeSet<String> {
        self.entities.iter().map(|e| e.layer.clone()).collect()
    }

    /// Applies output options and writes the DXF file.
    pub fn finish(mut self, board: &BoardModel, options: &OutputOptions, path: &Path) -> Result<()> {
        if options.simple {
            self.apply_simplification();
        }
        if !options.layer_filter.is_empty() {
            self.entities
                .retain(|e| options.layer_filter.iter().any(|l| *l == e.layer));
        }

        let used = self.used_layers();
        debug!(entities = self.entities.len(), layers = used.len(), "writing dxf");

        let mut drawing = dxf::Drawing::new();
        // Lineweights (group code 370) are only serialized for R2000+.
        drawing.header.version = dxf::enums::AcadVersion::R2000;

        let groups = simplification_groups();
        for name in &used {
            let color = preset_color(name)
                .or_else(|| groups.iter().find(|g| g.name == *name).map(|g| g.color))
                .or_else(|| {
                    board
                        .layer_by_name(name)
                        .map(|l| l.color.clamp(0, 255) as u8)
                })
                .unwrap_or(7);
            let mut layer = dxf::tables::Layer::default();
            layer.name = name.clone();
            layer.color = dxf::Color::from_index(color);
            drawing.add_layer(layer);
        }

        // The composited pour and SMD layers are always declared, matching
        // the converter's fixed output layer set.
        for (name, color) in [
            ("TopPoly", 1u8),
            ("BottomPoly", 5),
            ("TopSMD", 1),
            ("BottomSMD", 5),
        ] {
            if !used.contains(name) && !options.simple && options.layer_filter.is_empty() {
                let mut layer = dxf::tables::Layer::default();
                layer.name = name.to_string();
                layer.color = dxf::Color::from_index(color);
                drawing.add_layer(layer);
            }
        }

        for pending in &self.entities {
            let mut lineweight = None;
            let specific = match &pending.shape {
                EntityShape::Line { p1, p2, lineweight: lw } => {
                    lineweight = *lw;
                    let mut line = dxf::entities::Line::default();
                    line.p1 = dxf::Point::new(p1.x, p1.y, 0.0);
                    line.p2 = dxf::Point::new(p2.x, p2.y, 0.0);
                    dxf::entities::EntityType::Line(line)
                }
                EntityShape::Circle { center, radius } => {
                    let mut circle = dxf::entities::Circle::default();
                    circle.center = dxf::Point::new(center.x, center.y, 0.0);
                    circle.radius = *radius;
                    dxf::entities::EntityType::Circle(circle)
                }
            };
            let mut entity = dxf::entities::Entity::new(specific);
            entity.common.layer = pending.layer.clone();
            if let Some(lw) = lineweight {
                entity.common.lineweight_enum_value = lw.round() as i16;
            }
            drawing.add_entity(entity);
        }

        drawing.save_file(path)?;
        Ok(())
    }

    /// Retargets every entity to its simplification group, dropping
    /// entities on layers outside every group.
    fn apply_simplification(&mut self) {
        let groups = simplification_groups();
        self.entities.retain_mut(|entity| {
            for group in &groups {
                if group.layers.iter().any(|l| *l == entity.layer) {
                    entity.layer = group.name.clone();
                    return true;
                }
            }
            false
        });
    }
}

/// A sink that records calls for tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub lines: Vec<(Point, Point, String, Option<f64>)>,
    pub circles: Vec<(Point, f64, String)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines_on<'a>(
        &'a self,
        layer: &'a str,
    ) -> impl Iterator<Item = &'a (Point, Point, String, Option<f64>)> {
        self.lines.iter().filter(move |(_, _, l, _)| l == layer)
    }

    pub fn circles_on<'a>(&'a self, layer: &'a str) -> impl Iterator<Item = &'a (Point, f64, String)> {
        self.circles.iter().filter(move |(_, _, l)| l == layer)
    }
}

impl OutputSink for RecordingSink {
    fn add_line(&mut self, p1: Point, p2: Point, layer: &str, lineweight: Option<f64>) {
        self.lines.push((p1, p2, layer.to_string(), lineweight));
    }

    fn add_circle(&mut self, center: Point, radius: f64, layer: &str) {
        self.circles.push((center, radius, layer.to_string()));
    }
}
