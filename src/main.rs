use anyhow::Result;
use clap::Parser;
use log::{debug, error, info, trace, warn};
use sandwich_common::SandwichConfig;
use sandwich_engine::output::{save_record, write_lattice_csv};
use sandwich_engine::SandwichSimulation;
use std::path::PathBuf;
use std::time::Instant;

/// Command-line arguments for the engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the config.toml file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();
    let args = Args::parse();

    info!("Starting Sandwich Invasion Engine (CPU Parallel)...");

    // --- Load Configuration ---
    let config = SandwichConfig::load(&args.config)?;

    info!("Using {} Rayon threads.", rayon::current_num_threads());

    // --- Initialize Simulation ---
    info!("Initializing lattice...");
    let mut sim = SandwichSimulation::new(config)?;
    info!(
        "Lattice initialized: {}x{} sites (system size {}), initial radius {}.",
        sim.params().lattice_side,
        sim.params().lattice_side,
        sim.params().system_size,
        sim.params().initial_radius
    );
    debug!("Simulation Parameters: {:#?}", sim.params());

    // --- Simulation Loop ---
    let total_steps = sim.params().steps;
    info!("Starting simulation loop for {} steps...", total_steps);
    let start_time = Instant::now();
    let mut previous_print_time = start_time;

    sim.record_snapshot();

    for step in 0..total_steps {
        let step_start_time = Instant::now();
        if let Err(e) = sim.step() {
            error!("Error during simulation step {}: {}", step + 1, e);
            anyhow::bail!("Simulation step failed.");
        }
        let step_duration = step_start_time.elapsed();

        let current_time = Instant::now();
        let print_interval_secs = 5.0;
        let should_print_status = current_time.duration_since(previous_print_time).as_secs_f64() >= print_interval_secs;
        let is_record_step = sim.is_record_step(step + 1);
        let is_last_step = step == total_steps - 1;

        if should_print_status || is_record_step || is_last_step {
            info!(
                "Step [{}/{}] | Negative ECM sites: {} | Step Time: {:6.2} ms | Elapsed: {:.2} s",
                step + 1,
                total_steps,
                sim.negative_ecm_sites(),
                step_duration.as_secs_f64() * 1000.0,
                start_time.elapsed().as_secs_f64()
            );
            previous_print_time = current_time;

            if is_record_step {
                sim.record_snapshot();
            }
        } else {
            trace!(
                "Step [{}/{}] completed in {:.2} ms",
                step + 1,
                total_steps,
                step_duration.as_secs_f64() * 1000.0
            );
        }
    }

    let total_duration = start_time.elapsed();
    info!("Simulation finished in {:.3} seconds.", total_duration.as_secs_f64());

    // --- Report Migration Ratio ---
    let analysis = sim.analyze();
    match &analysis {
        Ok(migration) => {
            debug!(
                "Outside-sphere density {:.4} over {} sites, wedge density {:.4} over {} sites.",
                migration.outside_sphere_total,
                migration.outside_sphere_sites,
                migration.wedge_total,
                migration.wedge_sites
            );
            println!("the ratio between interface migration and total migration = {}", migration.ratio);
        }
        Err(e) => warn!("Migration ratio could not be computed: {}", e),
    }

    // --- Save Recorded Data ---
    let output = sim.config().output.clone();
    if output.save_csv {
        let path = PathBuf::from(format!("{}_final_lattice.csv", output.base_filename));
        if let Err(e) = write_lattice_csv(sim.lattice(), &path) {
            error!("Error saving CSV file '{}': {}", path.display(), e);
        }
    } else {
        info!("Skipping saving final lattice CSV as per config.");
    }

    if output.save_record {
        let record = sim.into_record();
        if let Err(e) = save_record(&record, &output) {
            error!("Error saving run record: {}", e);
        }
    } else {
        info!("Skipping saving run record as per config (save_record is false).");
    }

    analysis?;
    info!("Simulation Complete.");
    Ok(())
}
