//! Full pipeline tests: board XML in, composited outlines (or a DXF file)
//! out.

use brd2dxf_core::{parse_board, Point};
use brd2dxf_render::{render_board, DxfWriter, OutputOptions, RecordingSink, BOTTOM, DRILLS, TOP};

fn board_xml(body: &str) -> String {
    format!(
        r#"<eagle version="9.6.2"><drawing>
  <layers>
   <layer number="1" name="Top" color="4" fill="1"/>
   <layer number="16" name="Bottom" color="1" fill="1"/>
   <layer number="20" name="Dimension" color="15" fill="1"/>
  </layers>
  <board>{body}</board>
</drawing></eagle>"#
    )
}

#[test]
fn test_via_produces_drill_and_annular_outlines() {
    let xml = board_xml(
        r#"<signals><signal name="GND">
            <via x="5" y="5" extent="1-16" drill="0.8" diameter="2"/>
        </signal></signals>"#,
    );
    let board = parse_board(&xml).unwrap();
    let mut sink = RecordingSink::new();
    render_board(&board, &mut sink).unwrap();

    let drills: Vec<_> = sink.circles_on(DRILLS).collect();
    assert_eq!(drills.len(), 1);
    assert!((drills[0].1 - 0.4).abs() < 1e-9);

    // Diameter 2 becomes a radius-1 annular outline on both outer layers.
    let center = Point::new(5.0, 5.0);
    for layer in [TOP, BOTTOM] {
        let lines: Vec<_> = sink.lines_on(layer).collect();
        assert!(!lines.is_empty(), "no outline on {layer}");
        for (p1, p2, _, _) in &lines {
            assert!((p1.distance_to(&center) - 1.0).abs() < 1e-6);
            assert!((p2.distance_to(&center) - 1.0).abs() < 1e-6);
        }
    }
}

#[test]
fn test_pour_suppresses_matching_via_annulus() {
    // GND pour on Top declared before the via of the same signal.
    let xml = board_xml(
        r#"<signals><signal name="GND">
            <polygon width="0.2" layer="1">
              <vertex x="0" y="0"/>
              <vertex x="10" y="0"/>
              <vertex x="10" y="10"/>
              <vertex x="0" y="10"/>
            </polygon>
            <via x="5" y="5" extent="1-16" drill="0.8" diameter="2"/>
        </signal></signals>"#,
    );
    let board = parse_board(&xml).unwrap();
    let mut sink = RecordingSink::new();
    render_board(&board, &mut sink).unwrap();

    // Drill hole still present, Top annulus swallowed by the pour
    // (which itself lands on TopPoly), Bottom annulus still drawn.
    assert_eq!(sink.circles_on(DRILLS).count(), 1);
    assert_eq!(sink.lines_on(TOP).count(), 0);
    assert!(sink.lines_on("TopPoly").count() > 0);
    assert!(sink.lines_on(BOTTOM).count() > 0);
}

#[test]
fn test_signal_wire_becomes_capsule_outline() {
    let xml = board_xml(
        r#"<signals><signal name="N$1">
            <wire x1="0" y1="0" x2="10" y2="0" width="1" layer="1"/>
        </signal></signals>"#,
    );
    let board = parse_board(&xml).unwrap();
    let mut sink = RecordingSink::new();
    render_board(&board, &mut sink).unwrap();

    // No drills for a plain trace.
    assert_eq!(sink.circles_on(DRILLS).count(), 0);

    // The two end caps and the body merge into one outline spanning
    // [-0.5, 10.5] x [-0.5, 0.5].
    let lines: Vec<_> = sink.lines_on(TOP).collect();
    assert!(!lines.is_empty());
    for (p1, p2, _, _) in &lines {
        for p in [p1, p2] {
            assert!(p.x >= -0.5 - 1e-6 && p.x <= 10.5 + 1e-6);
            assert!(p.y.abs() <= 0.5 + 1e-6);
        }
    }
    let max_x = lines
        .iter()
        .flat_map(|(p1, p2, _, _)| [p1.x, p2.x])
        .fold(f64::MIN, f64::max);
    assert!(max_x > 10.0, "outline should extend past the wire end");

    // Expanded soldermask variant on Top_inner reaches further out.
    let inner_max_x = sink
        .lines_on("Top_inner")
        .flat_map(|(p1, p2, _, _)| [p1.x, p2.x])
        .fold(f64::MIN, f64::max);
    assert!(inner_max_x > max_x);
}

#[test]
fn test_outline_wires_pass_through_with_lineweight() {
    let xml = board_xml(
        r#"<plain>
            <wire x1="0" y1="0" x2="40" y2="0" width="0.1" layer="20"/>
            <wire x1="40" y1="0" x2="40" y2="30" width="0.1" layer="20"/>
        </plain>"#,
    );
    let board = parse_board(&xml).unwrap();
    let mut sink = RecordingSink::new();
    render_board(&board, &mut sink).unwrap();

    // Width 0.1 arrives as a 10-hundredths-of-a-millimeter lineweight.
    let lines: Vec<_> = sink.lines_on("Dimension").collect();
    assert_eq!(lines.len(), 2);
    for (_, _, _, lineweight) in &lines {
        let lw = lineweight.expect("outline wires carry a lineweight");
        assert!((lw - 10.0).abs() < 1e-9);
    }
}

#[test]
fn test_mirrored_element_pad_lands_on_negated_x() {
    let xml = board_xml(
        r#"<libraries><library name="lib">
            <packages><package name="P">
              <pad name="1" x="1" y="0" drill="0.6" diameter="1.2"/>
            </package></packages>
        </library></libraries>
        <elements>
            <element name="U1" library="lib" package="P" x="10" y="10" rot="MR0"/>
        </elements>"#,
    );
    let board = parse_board(&xml).unwrap();
    let mut sink = RecordingSink::new();
    render_board(&board, &mut sink).unwrap();

    let drill = sink.circles_on(DRILLS).next().unwrap();
    assert!((drill.0.x - 9.0).abs() < 1e-9);
    assert!((drill.0.y - 10.0).abs() < 1e-9);
}

#[test]
fn test_full_conversion_writes_dxf_file() {
    let xml = board_xml(
        r#"<plain>
            <wire x1="0" y1="0" x2="20" y2="0" width="0.1" layer="20"/>
        </plain>
        <signals><signal name="GND">
            <wire x1="2" y1="2" x2="18" y2="2" width="0.6" layer="1"/>
            <via x="10" y="2" extent="1-16" drill="0.6" diameter="1.2"/>
        </signal></signals>"#,
    );
    let board = parse_board(&xml).unwrap();
    let mut writer = DxfWriter::new();
    render_board(&board, &mut writer).unwrap();
    assert!(writer.entity_count() > 0);
    assert!(writer.used_layers().contains("Drills"));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.dxf");
    writer
        .finish(&board, &OutputOptions::default(), &path)
        .unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("ENTITIES"));
}

#[test]
fn test_simplified_output_collapses_layers() {
    let xml = board_xml(
        r#"<signals><signal name="GND">
            <wire x1="0" y1="0" x2="5" y2="0" width="0.5" layer="1"/>
            <via x="2" y="0" extent="1-16" drill="0.6" diameter="1.2"/>
        </signal></signals>"#,
    );
    let board = parse_board(&xml).unwrap();
    let mut writer = DxfWriter::new();
    render_board(&board, &mut writer).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("simple.dxf");
    let options = OutputOptions {
        simple: true,
        layer_filter: Vec::new(),
    };
    writer.finish(&board, &options, &path).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("top_copper"));
    assert!(written.contains("all_drills"));
    // Soldermask helper layers are outside every group.
    assert!(!written.contains("Top_inner"));
}
