use serde::{Deserialize, Serialize};

/// Cell doubling time in steps (tau). One step is taken as one hour of
/// culture and 48 h is the assumed spheroid doubling time.
pub const DEFAULT_DOUBLING_TIME_STEPS: f64 = 48.0;

/// Ratio `d2 / d1` between neighbour-driven and local ECM degradation.
pub const DEFAULT_NEIGHBOR_DEGRADATION_RATIO: f64 = 0.1;

/// Simulation parameters derived from the configuration, used frequently during simulation steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimParams {
    // Geometry
    pub system_size: u32,
    pub lattice_side: usize, // system_size + 1, so the centre column is integral for even sizes
    pub initial_radius: u32,

    // Initial densities
    pub initial_cell_density: f64,
    pub interface_ecm_density: f64,
    pub bulk_ecm_density: f64,

    // Kinetics
    pub degradation_rate: f64,          // d1
    pub neighbor_degradation_rate: f64, // d2
    pub growth_rate: f64,               // m
    pub critical_ecm_density: f64,      // f_c
    pub doubling_time_steps: f64,       // tau
    pub growth_factor: f64,             // 2^(1/tau)

    // Time
    pub steps: u32,
    pub record_interval_steps: u32,
}
