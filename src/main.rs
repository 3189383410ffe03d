use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use beamgrid::config::EngineConfig;
use beamgrid::engine::BeamEngine;
use beamgrid::simulation;
use beamgrid::wav;
use beamgrid::{BeamParams, EnergyMap};

/// Beamgrid demo: steer beams on a simulated microphone array and watch
/// the direction-of-arrival energy map track a far-field source.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Optional TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Render beams offline from a multichannel WAV instead of simulating
    #[arg(long)]
    input_wav: Option<PathBuf>,

    /// Output WAV for the rendered beams (offline mode)
    #[arg(long, default_value = "beams.wav")]
    output_wav: PathBuf,

    /// Simulated source direction along the horizontal axis, in [-1, 1]
    #[arg(long, default_value_t = 0.6)]
    source_x: f32,

    /// Simulated source direction along the vertical axis, in [-1, 1]
    #[arg(long, default_value_t = 0.0)]
    source_y: f32,

    /// Gaussian noise level added to the simulated capture
    #[arg(long, default_value_t = 0.01)]
    noise: f32,

    /// Seconds of simulated capture
    #[arg(long, default_value_t = 5.0)]
    duration: f32,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::from_toml_file(path)?,
        None => EngineConfig::default(),
    };

    println!("=== Beamgrid - array beamforming / DOA demo ===");
    println!(
        "Array: {}x{} mics, {:.0}/{:.0} mm pitch",
        config.geometry.rows,
        config.geometry.cols,
        config.geometry.spacing_x_m * 1000.0,
        config.geometry.spacing_y_m * 1000.0
    );
    println!("Sample rate: {} Hz", config.geometry.sample_rate);
    println!("Block size: {} samples", config.block_size);
    println!(
        "DOA grid: {}x{} at {:.1} Hz",
        config.doa.grid_rows, config.doa.grid_cols, config.doa.scan_rate_hz
    );
    println!();

    match &args.input_wav {
        Some(path) => render_offline(&args, config, path),
        None => run_simulation(&args, config),
    }
}

/// Offline mode: beamform a recorded array capture into a WAV of beams.
fn render_offline(args: &Args, mut config: EngineConfig, path: &PathBuf) -> anyhow::Result<()> {
    let (channels, sample_rate) = wav::read_wav_channels(path)?;
    config.geometry.sample_rate = sample_rate;

    let block = config.block_size;
    let num_beams = config.num_beams;
    let mut engine = BeamEngine::new(config)?;

    let frames = channels.first().map_or(0, |c| c.len());
    let mut beams = vec![vec![0.0f32; frames]; num_beams];

    let mut offset = 0;
    while offset + block <= frames {
        let input: Vec<&[f32]> = channels.iter().map(|c| &c[offset..offset + block]).collect();
        let mut output: Vec<&mut [f32]> = beams
            .iter_mut()
            .map(|b| &mut b[offset..offset + block])
            .collect();
        engine.render_block(&input, &mut output)?;
        offset += block;
    }

    wav::save_wav_channels(&args.output_wav, &beams, sample_rate)?;
    println!(
        "Rendered {} beams ({} frames) to {}",
        num_beams,
        offset,
        args.output_wav.display()
    );
    Ok(())
}

/// Live mode: simulate the array capture of a far-field source and let
/// the scanner track it in real time.
fn run_simulation(args: &Args, config: EngineConfig) -> anyhow::Result<()> {
    let geometry = config.geometry.clone();
    let block = config.block_size;
    let sample_rate = geometry.sample_rate;

    let mut engine = BeamEngine::new(config)?;
    engine.set_beam_parameters(0, BeamParams::new(args.source_x, args.source_y, 0.0), 1.0)?;
    let handle = engine.make_scanner().spawn();
    let map = handle.map();

    let total = (args.duration * sample_rate as f32) as usize;
    let source = simulation::multitone(total, sample_rate, &[440.0, 980.0, 1730.0, 2600.0]);
    let mut capture =
        simulation::capture_far_field(&geometry, &source, args.source_x, args.source_y);
    simulation::add_gaussian_noise(&mut capture, args.noise);

    println!(
        "Simulating source at steer ({:+.2}, {:+.2}) for {:.1}s...",
        args.source_x, args.source_y, args.duration
    );

    let block_period = Duration::from_secs_f32(block as f32 / sample_rate as f32);
    let mut beam_out = vec![vec![0.0f32; block]; engine.config().num_beams];
    let mut last_print = Instant::now();

    let mut offset = 0;
    while offset + block <= total {
        let input: Vec<&[f32]> = capture.iter().map(|c| &c[offset..offset + block]).collect();
        let mut output: Vec<&mut [f32]> =
            beam_out.iter_mut().map(|b| b.as_mut_slice()).collect();
        engine.render_block(&input, &mut output)?;
        offset += block;

        if last_print.elapsed() >= Duration::from_millis(500) {
            let grid = map.snapshot();
            if grid.generation() > 0 {
                let (row, col, db) = grid.peak();
                println!(
                    "DOA peak: steer ({:+.2}, {:+.2})  {:>6.1} dB  beam level {:>6.1} dB",
                    grid_steer(col, grid.cols()),
                    grid_steer(row, grid.rows()),
                    db,
                    engine.beam_meters()[0].level_db()
                );
            }
            last_print = Instant::now();
        }

        std::thread::sleep(block_period);
    }

    println!();
    print_map(&map.snapshot());
    Ok(())
}

fn grid_steer(index: usize, count: usize) -> f32 {
    if count <= 1 {
        0.0
    } else {
        -1.0 + 2.0 * index as f32 / (count - 1) as f32
    }
}

fn print_map(map: &EnergyMap) {
    let (min, max) = map
        .cells()
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &db| {
            (lo.min(db), hi.max(db))
        });
    let span = (max - min).max(1e-3);
    let glyphs = [' ', '.', ':', '-', '=', '+', '*', '#', '@'];

    println!("Energy map ({}x{}, {:.1}..{:.1} dB):", map.rows(), map.cols(), min, max);
    for row in 0..map.rows() {
        let line: String = (0..map.cols())
            .map(|col| {
                let level = (map.get(row, col) - min) / span;
                glyphs[(level * (glyphs.len() - 1) as f32).round() as usize]
            })
            .collect();
        println!("  [{}]", line);
    }
}
