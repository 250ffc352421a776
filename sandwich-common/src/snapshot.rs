use serde::{Serialize, Deserialize};
use crate::lattice::Lattice;
use crate::sim_params::SimParams;

/// A snapshot of the lattice and summary metrics at a specific step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatticeSnapshot {
    /// Number of completed update steps.
    pub step: u32,
    /// Full padded lattice, ghost ring refreshed.
    pub lattice: Lattice,
    /// Sum of cell density over the interior.
    pub total_cell_density: f64,
    /// Mean ECM density over the interior.
    pub mean_ecm_density: f64,
    /// Cell density summed over the interface column outside the initial spheroid.
    pub interface_cell_density: f64,
    /// Cell density summed over the bulk outside the initial spheroid.
    pub bulk_cell_density: f64,
    /// Interior sites whose ECM density has been driven below zero.
    pub negative_ecm_sites: usize,
}

/// Everything a finished run leaves behind, as written to disk by the engine
/// and read back by the visualizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRecord {
    pub params: SimParams,
    pub snapshots: Vec<LatticeSnapshot>,
    pub final_lattice: Lattice,
    /// `None` when the ratio is undefined; see `ratio_error`.
    pub migration_ratio: Option<f64>,
    pub ratio_error: Option<String>,
}
