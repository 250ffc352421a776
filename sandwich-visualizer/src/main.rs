use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Builder;
use image::{Rgb, RgbImage};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn, LevelFilter};
use palette::{LinSrgb, Mix, Srgb};
use rayon::prelude::*;
use sandwich_common::{Lattice, SimulationRecord};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Command-line arguments for the visualizer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input run record (.json, .bin or .msgpack)
    #[arg(short, long)]
    input: PathBuf,

    /// Directory the PNG frames are written to
    #[arg(short, long, default_value = "frames")]
    output_dir: PathBuf,

    /// Pixels per lattice site
    #[arg(long, default_value_t = 6)]
    scale: u32,

    /// Cell densities below this are floored before log-scale colouring
    #[arg(long, default_value_t = 1e-5)]
    cell_floor: f64,

    /// Render only the final lattice
    #[arg(long)]
    final_only: bool,

    /// Chunk size for parallel processing
    #[arg(long, default_value_t = 4)]
    chunk_size: usize,
}

const MARGIN: u32 = 12;
const BAR_GAP: u32 = 6;
const BAR_WIDTH: u32 = 14;
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

// Samples of matplotlib's viridis at 0, 1/8, ..., 1.
const VIRIDIS: [(f32, f32, f32); 9] = [
    (0.267004, 0.004874, 0.329415),
    (0.282623, 0.140926, 0.457517),
    (0.253935, 0.265254, 0.529983),
    (0.206756, 0.371758, 0.553117),
    (0.163625, 0.471133, 0.558148),
    (0.127568, 0.566949, 0.550556),
    (0.134692, 0.658636, 0.517649),
    (0.266941, 0.748751, 0.440573),
    (0.993248, 0.906157, 0.143936),
];

/// Piecewise-linear colour map, interpolated in linear RGB.
struct ColorMap {
    stops: Vec<LinSrgb>,
    reversed: bool,
}

impl ColorMap {
    fn viridis(reversed: bool) -> Self {
        let stops = VIRIDIS
            .iter()
            .map(|&(r, g, b)| Srgb::new(r, g, b).into_linear())
            .collect();
        ColorMap { stops, reversed }
    }

    /// Colour at `t` in `[0, 1]`; out-of-range values are clamped, NaN maps to 0.
    fn sample(&self, t: f64) -> Rgb<u8> {
        let t = (if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) }) as f32;
        let t = if self.reversed { 1.0 - t } else { t };
        let last = self.stops.len() - 1;
        let pos = t * last as f32;
        let i = (pos.floor() as usize).min(last.saturating_sub(1));
        let frac = pos - i as f32;
        let mixed = self.stops[i].mix(self.stops[(i + 1).min(last)], frac);
        let srgb: Srgb<u8> = Srgb::<f32>::from_linear(mixed).into_format();
        Rgb([srgb.red, srgb.green, srgb.blue])
    }
}

/// Maps a value onto `[0, 1]` for colouring.
#[derive(Debug, Copy, Clone)]
enum Norm {
    Linear { min: f64, max: f64 },
    Log { min: f64, max: f64 },
}

impl Norm {
    fn apply(&self, value: f64) -> f64 {
        match *self {
            Norm::Linear { min, max } => {
                if max > min { (value - min) / (max - min) } else { 0.0 }
            }
            Norm::Log { min, max } => {
                if max > min && value > 0.0 {
                    (value.ln() - min.ln()) / (max.ln() - min.ln())
                } else {
                    0.0
                }
            }
        }
    }

    /// Log normalization spanning the observed positive range of `values`.
    fn log_autoscale(values: impl Iterator<Item = f64>) -> Self {
        let (min, max) = values
            .filter(|v| *v > 0.0 && v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if min.is_finite() && max.is_finite() {
            Norm::Log { min, max }
        } else {
            Norm::Log { min: 1.0, max: 1.0 }
        }
    }
}

/// Paints one lattice channel as a heatmap with `x` horizontal and `y` vertical
/// (largest `y` at the top), followed by a vertical colour bar.
fn draw_heatmap(
    image: &mut RgbImage,
    origin_x: u32,
    lattice: &Lattice,
    scale: u32,
    channel: impl Fn(usize, usize) -> f64,
    norm: Norm,
    cmap: &ColorMap,
) {
    let side = lattice.side() as u32;
    for x in 1..=side {
        for y in 1..=side {
            let color = cmap.sample(norm.apply(channel(x as usize, y as usize)));
            let px0 = origin_x + (x - 1) * scale;
            let py0 = MARGIN + (side - y) * scale;
            for dx in 0..scale {
                for dy in 0..scale {
                    image.put_pixel(px0 + dx, py0 + dy, color);
                }
            }
        }
    }

    let bar_x = origin_x + side * scale + BAR_GAP;
    let height = side * scale;
    for row in 0..height {
        let t = if height > 1 { 1.0 - row as f64 / (height - 1) as f64 } else { 0.0 };
        let color = cmap.sample(t);
        for col in 0..BAR_WIDTH {
            image.put_pixel(bar_x + col, MARGIN + row, color);
        }
    }
}

/// Renders the ECM channel (linear 0..1, reversed viridis) next to the cell
/// density channel (log scale, viridis). The lattice itself is not modified;
/// the display floor is applied to a copy.
fn render_lattice(lattice: &Lattice, scale: u32, cell_floor: f64) -> RgbImage {
    let side = lattice.side() as u32;
    let panel = side * scale + BAR_GAP + BAR_WIDTH;
    let width = MARGIN * 3 + panel * 2;
    let height = MARGIN * 2 + side * scale;
    let mut image = RgbImage::from_pixel(width, height, BACKGROUND);

    draw_heatmap(
        &mut image,
        MARGIN,
        lattice,
        scale,
        |x, y| lattice.get(x, y).ecm_density,
        Norm::Linear { min: 0.0, max: 1.0 },
        &ColorMap::viridis(true),
    );

    let floored = lattice.floored_for_display(cell_floor);
    let norm = Norm::log_autoscale(floored.interior().map(|(_, _, c)| c.cell_density));
    draw_heatmap(
        &mut image,
        MARGIN * 2 + panel,
        &floored,
        scale,
        |x, y| floored.get(x, y).cell_density,
        norm,
        &ColorMap::viridis(false),
    );
    image
}

/// Reads a run record, choosing the decoder from the file extension.
fn read_record(path: &Path) -> Result<SimulationRecord> {
    let file = File::open(path).with_context(|| format!("Failed to open input file: {}", path.display()))?;
    let reader = BufReader::new(file);
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
    let record = match extension {
        "bin" => bincode::deserialize_from(reader).context("Failed to decode bincode record")?,
        "msgpack" => rmp_serde::from_read(reader).context("Failed to decode MessagePack record")?,
        "json" => serde_json::from_reader(reader).context("Failed to decode JSON record")?,
        other => {
            warn!("Unknown record extension '{}', trying JSON.", other);
            serde_json::from_reader(reader).context("Failed to decode JSON record")?
        }
    };
    Ok(record)
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    run_with_args(args)
}

fn run_with_args(args: Args) -> Result<()> {
    // Initialize logger
    let _ = Builder::from_default_env()
        .filter(None, LevelFilter::Info)
        .try_init();

    info!("Starting Sandwich Visualizer...");
    info!("Input file: {}", args.input.display());
    info!("Output directory: {}", args.output_dir.display());

    if args.scale == 0 {
        anyhow::bail!("scale must be at least 1 pixel per site");
    }

    let record = read_record(&args.input)?;
    info!(
        "Loaded run: lattice side {}, {} steps, {} snapshots.",
        record.params.lattice_side,
        record.params.steps,
        record.snapshots.len()
    );
    match (&record.migration_ratio, &record.ratio_error) {
        (Some(ratio), _) => info!("Recorded migration ratio: {}", ratio),
        (None, Some(e)) => warn!("Run has no migration ratio: {}", e),
        (None, None) => warn!("Run has no migration ratio."),
    }

    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create output directory: {}", args.output_dir.display()))?;

    // Frames as (file name, lattice)
    let mut frames: Vec<(String, &Lattice)> = Vec::new();
    if !args.final_only {
        for snapshot in &record.snapshots {
            frames.push((format!("frame_{:05}.png", snapshot.step), &snapshot.lattice));
        }
    }
    frames.push(("final.png".to_string(), &record.final_lattice));

    let progress_bar = ProgressBar::new(frames.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} frames ({percent}%) [{eta}]")
            .context("Invalid progress bar template")?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let chunk_size = args.chunk_size.max(1);
    frames
        .par_chunks(chunk_size)
        .try_for_each(|chunk| -> Result<()> {
            for (name, lattice) in chunk {
                let image = render_lattice(lattice, args.scale, args.cell_floor);
                let path = args.output_dir.join(name);
                image
                    .save(&path)
                    .with_context(|| format!("Failed to save frame {}", path.display()))?;
                debug!("Wrote {}", path.display());
                progress_bar.inc(1);
            }
            Ok(())
        })?;
    progress_bar.finish_with_message("Frames rendered");

    info!(
        "Rendered {} frames in {:.2} s to {}",
        frames.len(),
        start.elapsed().as_secs_f64(),
        args.output_dir.display()
    );
    Ok(())
}
