//! Headless molmorph driver.
//!
//! Builds an aligned sequence from structure files or PubChem compound
//! names, runs the morph animation on a simulated frame clock and writes
//! every frame's scene as one JSON object per line.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use molmorph::options::Options;
use molmorph::scene::JsonLinesSink;
use molmorph::sequence::{
    DirectorySource, PubChemSource, SequenceBuilder, StructureSource,
};
use molmorph::viewer::MorphViewer;
use web_time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "molmorph", version, about)]
struct Cli {
    /// Structure files, file stems under --dir, or compound names with
    /// --pubchem, in sequence order.
    #[arg(required_unless_present = "print_schema")]
    inputs: Vec<String>,

    /// Options preset (TOML).
    #[arg(short, long)]
    options: Option<PathBuf>,

    /// Directory searched for `<input>.sdf`.
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Resolve inputs as compound names through PubChem.
    #[arg(long)]
    pubchem: bool,

    /// Cache directory for PubChem downloads.
    #[arg(long, default_value = "assets/structures")]
    cache: PathBuf,

    /// Frames to simulate. Defaults to one full auto-advance cycle.
    #[arg(long)]
    frames: Option<usize>,

    /// Simulated frame rate.
    #[arg(long, default_value_t = 60.0)]
    fps: f32,

    /// Output file (stdout when omitted).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print the options JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    if cli.print_schema {
        let schema = serde_json::to_string_pretty(&Options::json_schema())?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{schema}")?;
        return Ok(());
    }

    let options = match &cli.options {
        Some(path) => Options::load(path).with_context(|| {
            format!("failed to load options from {}", path.display())
        })?,
        None => Options::default(),
    };

    let source: Box<dyn StructureSource + Send> = if cli.pubchem {
        Box::new(PubChemSource::new().with_cache_dir(&cli.cache))
    } else {
        Box::new(DirectorySource::new(&cli.dir))
    };

    let builder = SequenceBuilder::new(options.sequence.clone());
    let (sequence, skipped) = builder.build_from_source(&source, &cli.inputs);
    if sequence.is_empty() {
        bail!("none of the {} inputs could be loaded", cli.inputs.len());
    }
    if !skipped.is_empty() {
        log::warn!(
            "{} of {} inputs skipped",
            skipped.len(),
            cli.inputs.len()
        );
    }

    let fps = cli.fps.max(1.0);
    let frames = cli.frames.unwrap_or_else(|| {
        let cycle = options.animation.advance_interval().as_secs_f32()
            * sequence.len() as f32;
        (cycle * fps).ceil() as usize + 1
    });

    let t0 = Instant::now();
    let mut viewer = MorphViewer::with_clock(options, t0);
    for entry in sequence.entries() {
        let _ = viewer.push_entry(entry.clone());
    }

    let writer: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(File::create(path).with_context(
            || format!("failed to create {}", path.display()),
        )?)),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };
    let mut sink = JsonLinesSink::new(writer);

    let frame_time = Duration::from_secs_f32(1.0 / fps);
    for i in 0..frames {
        viewer.render_frame(t0 + frame_time * i as u32, &mut sink);
    }
    let written = sink.frames();
    let _ = sink.finish().context("failed to write scene output")?;

    log::info!(
        "wrote {written} frames for {} entries ({} atom slots)",
        viewer.sequence().len(),
        viewer.controller().slot_count()
    );
    Ok(())
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}
