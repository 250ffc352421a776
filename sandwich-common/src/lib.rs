pub mod config;
pub mod error;
pub mod geometry;
pub mod lattice;
pub mod sim_params;
pub mod snapshot;

// Re-export key types for easier use by dependent crates
pub use config::{SandwichConfig, GeometryConfig, DensityConfig, KineticsConfig, TimingConfig, OutputConfig};
pub use error::SandwichError;
pub use geometry::{Region, RegionMap, SpheroidGeometry};
pub use lattice::{apply_periodic_boundary, wrap_index, CellState, Lattice};
pub use sim_params::{SimParams, DEFAULT_DOUBLING_TIME_STEPS, DEFAULT_NEIGHBOR_DEGRADATION_RATIO};
pub use snapshot::{LatticeSnapshot, SimulationRecord};
