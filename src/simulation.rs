use crate::init::initial_conditions;
use crate::migration::{analyze_migration, MigrationAnalysis};
use crate::neighbors::NeighborField;
use crate::state::LatticeState;
use crate::update::{inspect_interior, update_interior, ReactionKinetics};
use log::{debug, warn};
use sandwich_common::{
    Lattice, LatticeSnapshot, Region, RegionMap, SandwichConfig, SandwichError, SimParams,
    SimulationRecord, SpheroidGeometry,
};

/// Manages the state and execution of the sandwich invasion model.
pub struct SandwichSimulation {
    /// The simulation configuration, including initial conditions and parameters.
    config: SandwichConfig,
    params: SimParams,
    geometry: SpheroidGeometry,
    kinetics: ReactionKinetics,
    /// Initial region of every site, never mutated.
    regions: RegionMap,
    /// Ping-pong lattice buffers.
    state: LatticeState,
    /// Number of completed update steps.
    current_step: u32,
    /// Sites with negative ECM after the last step.
    negative_ecm_sites: usize,
    negative_ecm_reported: bool,
    /// Stores collected snapshots at record intervals.
    recorded_snapshots: Vec<LatticeSnapshot>,
}

/// Final lattice and migration measurement of a completed run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub lattice: Lattice,
    /// Undefined ratios (nothing left the initial sphere) are kept as errors.
    pub migration: Result<MigrationAnalysis, SandwichError>,
}

impl RunOutcome {
    pub fn migration_ratio(&self) -> Result<f64, SandwichError> {
        self.migration.as_ref().map(|m| m.ratio).map_err(Clone::clone)
    }
}

impl SandwichSimulation {
    /// Validates the configuration and seeds the lattice.
    pub fn new(config: SandwichConfig) -> Result<Self, SandwichError> {
        config.validate()?;
        let params = config.get_sim_params();
        let geometry = SpheroidGeometry::new(params.lattice_side, params.initial_radius);
        if !geometry.fits() {
            warn!(
                "Initial radius {} does not fit a lattice of side {}; the spheroid wraps around the torus.",
                params.initial_radius, params.lattice_side
            );
        }

        let (mut lattice, regions) = initial_conditions(&params);
        lattice.apply_periodic_boundary();
        debug!(
            "Seeded {} spheroid sites, {} interface channel sites.",
            regions.count(Region::Spheroid),
            regions.count(Region::InterfaceChannel)
        );

        Ok(Self {
            kinetics: ReactionKinetics::from_params(&params),
            config,
            params,
            geometry,
            regions,
            state: LatticeState::new(lattice),
            current_step: 0,
            negative_ecm_sites: 0,
            negative_ecm_reported: false,
            recorded_snapshots: Vec::new(),
        })
    }

    /// Advances the lattice by one synchronous update.
    pub fn step(&mut self) -> Result<(), SandwichError> {
        // --- 1. Refresh ghost ring and gather neighbours from the frozen state ---
        self.state.current.apply_periodic_boundary();
        let neighbors = NeighborField::gather(&self.state.current);

        // --- 2. Reaction update into the output buffer ---
        update_interior(&mut self.state, &neighbors, &self.kinetics);

        // --- Swap Buffers: Output becomes Input for next step ---
        self.state.swap_buffers();
        self.current_step += 1;

        // --- 3. Inspect the new state ---
        let report = inspect_interior(&self.state, self.current_step)?;
        self.negative_ecm_sites = report.negative_ecm_sites;
        if report.negative_ecm_sites > 0 && !self.negative_ecm_reported {
            warn!(
                "ECM density became negative at {} sites after step {} (degradation_rate = {}); values are left unclamped.",
                report.negative_ecm_sites, self.current_step, self.params.degradation_rate
            );
            self.negative_ecm_reported = true;
        }
        Ok(())
    }

    /// Whether the snapshot schedule asks for a record after `step` completed steps.
    pub fn is_record_step(&self, step: u32) -> bool {
        let interval = self.params.record_interval_steps;
        step == 0 || step == self.params.steps || (interval > 0 && step % interval == 0)
    }

    /// Collects the summary metrics of the current lattice as a snapshot.
    pub fn record_snapshot(&mut self) {
        self.state.current.apply_periodic_boundary();
        let lattice = self.state.current.clone();

        let mut total_cell_density = 0.0;
        let mut total_ecm_density = 0.0;
        let mut interface_cell_density = 0.0;
        let mut bulk_cell_density = 0.0;
        for (x, y, cell) in lattice.interior() {
            total_cell_density += cell.cell_density;
            total_ecm_density += cell.ecm_density;
            match self.regions.get(x, y) {
                Region::InterfaceChannel => interface_cell_density += cell.cell_density,
                Region::Bulk => bulk_cell_density += cell.cell_density,
                _ => {}
            }
        }
        let sites = (lattice.side() * lattice.side()).max(1) as f64;

        debug!(
            "Recording snapshot at step {}: total cell density {:.4}, interface {:.4}, bulk {:.4}",
            self.current_step, total_cell_density, interface_cell_density, bulk_cell_density
        );

        self.recorded_snapshots.push(LatticeSnapshot {
            step: self.current_step,
            lattice,
            total_cell_density,
            mean_ecm_density: total_ecm_density / sites,
            interface_cell_density,
            bulk_cell_density,
            negative_ecm_sites: self.negative_ecm_sites,
        });
    }

    /// Refreshes the ghost ring and measures the migration ratio of the current lattice.
    pub fn analyze(&mut self) -> Result<MigrationAnalysis, SandwichError> {
        self.state.current.apply_periodic_boundary();
        analyze_migration(&self.state.current, &self.geometry)
    }

    /// Consumes the simulation into the record persisted by the engine.
    /// An undefined migration ratio is kept as its error message.
    pub fn into_record(mut self) -> SimulationRecord {
        let (migration_ratio, ratio_error) = match self.analyze() {
            Ok(analysis) => (Some(analysis.ratio), None),
            Err(e) => (None, Some(e.to_string())),
        };
        SimulationRecord {
            params: self.params,
            snapshots: self.recorded_snapshots,
            final_lattice: self.state.current,
            migration_ratio,
            ratio_error,
        }
    }

    pub fn lattice(&self) -> &Lattice {
        &self.state.current
    }

    pub fn regions(&self) -> &RegionMap {
        &self.regions
    }

    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn config(&self) -> &SandwichConfig {
        &self.config
    }

    pub fn negative_ecm_sites(&self) -> usize {
        self.negative_ecm_sites
    }

    /// Provides access to the recorded snapshots.
    pub fn recorded_snapshots(&self) -> &[LatticeSnapshot] {
        &self.recorded_snapshots
    }
}

/// Runs exactly `timing.steps` updates and returns the final lattice with its
/// migration measurement. Invalid parameters and non-finite states fail the
/// run; an undefined ratio is reported inside the outcome.
pub fn run(config: &SandwichConfig) -> Result<RunOutcome, SandwichError> {
    let mut sim = SandwichSimulation::new(config.clone())?;
    for _ in 0..sim.params().steps {
        sim.step()?;
    }
    let migration = sim.analyze();
    Ok(RunOutcome {
        lattice: sim.state.current,
        migration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(steps: u32) -> SandwichConfig {
        let mut config = SandwichConfig::default();
        config.geometry.system_size = 10;
        config.geometry.initial_radius = 3;
        config.timing.steps = steps;
        config
    }

    #[test]
    fn step_counter_advances() {
        let mut sim = SandwichSimulation::new(small_config(3)).unwrap();
        sim.step().unwrap();
        sim.step().unwrap();
        assert_eq!(sim.current_step(), 2);
    }

    #[test]
    fn record_schedule_includes_first_and_last() {
        let mut config = small_config(10);
        config.timing.record_interval_steps = 4;
        let sim = SandwichSimulation::new(config).unwrap();
        let steps: Vec<u32> = (0..=10).filter(|&s| sim.is_record_step(s)).collect();
        assert_eq!(steps, vec![0, 4, 8, 10]);
    }

    #[test]
    fn snapshot_splits_interface_and_bulk_mass() {
        let mut sim = SandwichSimulation::new(small_config(5)).unwrap();
        for _ in 0..5 {
            sim.step().unwrap();
        }
        sim.record_snapshot();
        let snapshot = &sim.recorded_snapshots()[0];
        assert_eq!(snapshot.step, 5);
        assert!(snapshot.interface_cell_density > 0.0);
        assert!(snapshot.total_cell_density >= snapshot.interface_cell_density + snapshot.bulk_cell_density);
        let side = snapshot.lattice.side();
        assert_eq!(snapshot.lattice.get(0, 3), snapshot.lattice.get(side, 3));
    }

    #[test]
    fn cell_density_never_exceeds_one() {
        let mut config = small_config(30);
        config.kinetics.growth_rate = 0.5;
        config.kinetics.degradation_rate = 0.2;
        let outcome = run(&config).unwrap();
        for (_, _, cell) in outcome.lattice.interior() {
            assert!(cell.cell_density <= 1.0);
        }
    }

    #[test]
    fn ecm_does_not_increase_under_degradation() {
        let mut config = small_config(0);
        config.kinetics.degradation_rate = 0.3;
        config.kinetics.growth_rate = 0.05;
        let mut sim = SandwichSimulation::new(config).unwrap();
        for _ in 0..10 {
            let before = sim.lattice().clone();
            sim.step().unwrap();
            for (x, y, cell) in sim.lattice().interior() {
                let old = before.get(x, y);
                if old.cell_density > 0.0 && old.ecm_density >= 0.0 {
                    assert!(cell.ecm_density <= old.ecm_density);
                }
            }
        }
    }

    #[test]
    fn runaway_degradation_is_reported_not_hidden() {
        let mut config = small_config(0);
        config.kinetics.degradation_rate = 50.0;
        let mut sim = SandwichSimulation::new(config).unwrap();
        let mut outcome = Ok(());
        for _ in 0..40 {
            outcome = sim.step();
            if outcome.is_err() {
                break;
            }
        }
        assert!(sim.negative_ecm_sites() > 0 || matches!(outcome, Err(SandwichError::NonFiniteState { .. })));
    }

    #[test]
    fn record_keeps_ratio_or_its_error() {
        let mut config = small_config(2);
        config.geometry.initial_radius = 20;
        let mut sim = SandwichSimulation::new(config).unwrap();
        sim.step().unwrap();
        sim.step().unwrap();
        let record = sim.into_record();
        assert!(record.migration_ratio.is_none());
        assert!(record.ratio_error.is_some());
    }
}
