use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use brd2dxf::{
    init_logging, parse_board, render_board, simplification_groups, DxfWriter, OutputOptions,
};

/// Convert EAGLE CAD board files to DXF drawings.
#[derive(Debug, Parser)]
#[command(name = "brd2dxf", version, about)]
struct Args {
    /// The EAGLE board file (.brd) to convert
    filename: PathBuf,

    /// Output DXF file (defaults to the input path with ".dxf" appended)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keep only this output layer (repeatable)
    #[arg(short, long)]
    layer: Vec<String>,

    /// List the output layers of this board and exit
    #[arg(long)]
    list: bool,

    /// Merge layers into simplified groups (top_copper, all_drills, ...)
    #[arg(short, long)]
    simple: bool,
}

fn main() -> anyhow::Result<()> {
    init_logging()?;
    let args = Args::parse();

    if args.list && args.simple {
        for group in simplification_groups() {
            println!("{}", group.name);
        }
        return Ok(());
    }

    let xml = std::fs::read_to_string(&args.filename)
        .with_context(|| format!("reading {}", args.filename.display()))?;
    let board =
        parse_board(&xml).with_context(|| format!("parsing {}", args.filename.display()))?;

    if args.list {
        for layer in &board.layers {
            println!("{}", layer.name);
        }
        return Ok(());
    }

    let mut writer = DxfWriter::new();
    render_board(&board, &mut writer)?;

    let output = args.output.unwrap_or_else(|| {
        let mut path = args.filename.clone().into_os_string();
        path.push(".dxf");
        PathBuf::from(path)
    });

    let options = OutputOptions {
        simple: args.simple,
        layer_filter: args.layer,
    };
    let entities = writer.entity_count();
    writer
        .finish(&board, &options, &output)
        .with_context(|| format!("writing {}", output.display()))?;

    info!(entities, output = %output.display(), "conversion finished");
    Ok(())
}
